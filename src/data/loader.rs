//! Mini-batches over a sample matrix
//!
//! Each epoch visits every row once, in a seeded random order when shuffling
//! is on. With `drop_last` a short trailing batch is skipped, which the WGAN
//! generator needs because batch normalisation cannot train on one row.

use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

pub struct DataLoader {
    /// Rows are samples, columns are features
    samples: Array2<f64>,
    batch_size: usize,
    shuffle: bool,
    drop_last: bool,
    /// Row order of the current epoch
    order: Vec<usize>,
    cursor: usize,
    rng: StdRng,
}

impl DataLoader {
    /// Wrap `samples` in batches of `batch_size` rows (at least 1)
    ///
    /// `seed` fixes the sequence of epoch orders, so two loaders built with
    /// the same arguments yield the same batches.
    pub fn new(samples: Array2<f64>, batch_size: usize, shuffle: bool, drop_last: bool, seed: u64) -> Self {
        let order = (0..samples.nrows()).collect();
        let mut loader = Self {
            samples,
            batch_size: batch_size.max(1),
            shuffle,
            drop_last,
            order,
            cursor: 0,
            rng: StdRng::seed_from_u64(seed),
        };
        loader.reset();
        loader
    }

    pub fn num_batches(&self) -> usize {
        let rows = self.num_samples();
        let full = rows / self.batch_size;
        if self.drop_last || rows % self.batch_size == 0 {
            full
        } else {
            full + 1
        }
    }

    pub fn num_samples(&self) -> usize {
        self.samples.nrows()
    }

    pub fn num_features(&self) -> usize {
        self.samples.ncols()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Rewind to the first batch, drawing a new order when shuffling
    pub fn reset(&mut self) {
        self.cursor = 0;
        if self.shuffle {
            self.order.shuffle(&mut self.rng);
        }
    }

    /// The next batch of the epoch, `None` once the epoch is used up
    pub fn next_batch(&mut self) -> Option<Array2<f64>> {
        let remaining = self.order.len().saturating_sub(self.cursor);
        let take = remaining.min(self.batch_size);
        if take == 0 || (self.drop_last && take < self.batch_size) {
            return None;
        }

        let rows = &self.order[self.cursor..self.cursor + take];
        self.cursor += take;
        Some(self.samples.select(Axis(0), rows))
    }

    /// Start a fresh epoch and walk its batches
    pub fn iter(&mut self) -> Batches<'_> {
        self.reset();
        Batches { loader: self }
    }
}

/// Borrowing iterator over one epoch
pub struct Batches<'a> {
    loader: &'a mut DataLoader,
}

impl Iterator for Batches<'_> {
    type Item = Array2<f64>;

    fn next(&mut self) -> Option<Self::Item> {
        self.loader.next_batch()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(rows: usize) -> Array2<f64> {
        Array2::from_shape_fn((rows, 2), |(i, j)| (i * 2 + j) as f64)
    }

    #[test]
    fn test_trailing_partial_batch() {
        let mut loader = DataLoader::new(numbered(10), 3, false, false, 0);
        assert_eq!(loader.num_batches(), 4);
        assert_eq!(loader.num_samples(), 10);
        assert_eq!(loader.num_features(), 2);

        let sizes: Vec<usize> = loader.iter().map(|b| b.nrows()).collect();
        assert_eq!(sizes, vec![3, 3, 3, 1]);
    }

    #[test]
    fn test_drop_last_skips_partial_batch() {
        let mut loader = DataLoader::new(numbered(10), 3, false, true, 0);
        assert_eq!(loader.num_batches(), 3);

        let sizes: Vec<usize> = loader.iter().map(|b| b.nrows()).collect();
        assert_eq!(sizes, vec![3, 3, 3]);
    }

    #[test]
    fn test_unshuffled_order_is_row_order() {
        let mut loader = DataLoader::new(numbered(4), 4, false, false, 0);
        let batch = loader.iter().next().unwrap();
        assert_eq!(batch, numbered(4));
    }

    #[test]
    fn test_shuffle_keeps_every_row() {
        let mut loader = DataLoader::new(numbered(32), 8, true, false, 42);
        let mut firsts: Vec<f64> = loader.iter().flat_map(|b| b.column(0).to_vec()).collect();
        firsts.sort_by(|a, b| a.total_cmp(b));
        let expected: Vec<f64> = (0..32).map(|i| (i * 2) as f64).collect();
        assert_eq!(firsts, expected);
    }

    #[test]
    fn test_seeded_shuffle_is_reproducible() {
        let mut a = DataLoader::new(numbered(20), 5, true, false, 9);
        let mut b = DataLoader::new(numbered(20), 5, true, false, 9);
        for _ in 0..3 {
            let ea: Vec<_> = a.iter().collect();
            let eb: Vec<_> = b.iter().collect();
            assert_eq!(ea, eb);
        }
    }
}
