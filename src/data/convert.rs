//! Moving sample matrices between ndarray and tch
//!
//! The regressions and the loader work on `Array2<f64>`; the networks take
//! single-precision tensors. Rows stay rows in both directions.

use ndarray::Array2;
use tch::{Device, Kind, Tensor};

use super::DataError;

/// Copy a (rows, features) matrix into a float tensor on `device`
pub fn to_tensor(array: &Array2<f64>, device: Device) -> Tensor {
    let (rows, cols) = array.dim();
    let values: Vec<f64> = array.iter().copied().collect();
    Tensor::from_slice(&values)
        .reshape([rows as i64, cols as i64])
        .to_kind(Kind::Float)
        .to_device(device)
}

/// Copy a 2-D tensor back into a matrix, dropping any autograd history
pub fn to_array(tensor: &Tensor) -> Result<Array2<f64>, DataError> {
    let size = tensor.size();
    let (rows, cols) = match size.as_slice() {
        &[rows, cols] => (rows as usize, cols as usize),
        _ => return Err(DataError::TensorRank(size.clone())),
    };

    let flat = tensor
        .detach()
        .to_device(Device::Cpu)
        .to_kind(Kind::Double)
        .contiguous()
        .reshape([-1]);
    let values = Vec::<f64>::try_from(&flat)?;
    Ok(Array2::from_shape_vec((rows, cols), values)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_matrix_survives_the_trip() {
        let matrix = array![[1.0, 2.5], [-3.0, 0.25], [8.0, 16.0]];
        let tensor = to_tensor(&matrix, Device::Cpu);
        assert_eq!(tensor.size(), vec![3, 2]);
        assert_eq!(tensor.kind(), Kind::Float);
        assert_eq!(to_array(&tensor).unwrap(), matrix);
    }

    #[test]
    fn test_rows_keep_their_order() {
        let matrix = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let tensor = to_tensor(&matrix, Device::Cpu);
        assert_eq!(tensor.double_value(&[1, 0]), 4.0);
        assert_eq!(tensor.double_value(&[0, 2]), 3.0);
    }

    #[test]
    fn test_rejects_non_matrix() {
        let err = to_array(&Tensor::zeros([2, 2, 2], (Kind::Float, Device::Cpu))).unwrap_err();
        assert!(matches!(err, DataError::TensorRank(size) if size == vec![2, 2, 2]));
    }
}
