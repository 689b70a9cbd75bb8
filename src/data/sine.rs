//! Synthetic sine-curve samples for the toy GAN

use std::f64::consts::PI;

use ndarray::{Array1, Array2};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;

/// Points `(x, sin x)` with `x` uniform in `[0, 2π)`
#[derive(Debug, Clone)]
pub struct SineDataset {
    /// Sample matrix of shape (num_samples, 2)
    pub samples: Array2<f64>,
    /// Dummy zero labels, one per sample
    pub labels: Array1<f64>,
}

impl SineDataset {
    pub fn generate(num_samples: usize, rng: &mut StdRng) -> Self {
        let angles = Array1::random_using(num_samples, Uniform::new(0.0, 2.0 * PI), rng);
        let mut samples = Array2::zeros((num_samples, 2));
        for (i, &angle) in angles.iter().enumerate() {
            samples[[i, 0]] = angle;
            samples[[i, 1]] = angle.sin();
        }

        Self {
            samples,
            labels: Array1::zeros(num_samples),
        }
    }

    pub fn len(&self) -> usize {
        self.samples.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.nrows() == 0
    }
}
