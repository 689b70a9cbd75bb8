//! Per-epoch loss history for both GAN trainers

use std::path::Path;

/// Metrics collected during training
#[derive(Debug, Clone, Default)]
pub struct TrainingMetrics {
    /// Mean generator loss per epoch
    pub gen_losses: Vec<f64>,
    /// Mean discriminator (or critic) loss per epoch
    pub disc_losses: Vec<f64>,
    /// Mean gradient penalty per epoch, empty for the toy GAN
    pub gradient_penalties: Vec<f64>,
}

impl TrainingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record epoch metrics
    pub fn record_epoch(&mut self, gen_loss: f64, disc_loss: f64, gradient_penalty: Option<f64>) {
        self.gen_losses.push(gen_loss);
        self.disc_losses.push(disc_loss);
        if let Some(penalty) = gradient_penalty {
            self.gradient_penalties.push(penalty);
        }
    }

    /// Get number of recorded epochs
    pub fn num_epochs(&self) -> usize {
        self.gen_losses.len()
    }

    pub fn latest_gen_loss(&self) -> Option<f64> {
        self.gen_losses.last().copied()
    }

    pub fn latest_disc_loss(&self) -> Option<f64> {
        self.disc_losses.last().copied()
    }

    /// Save metrics to CSV file; the penalty column is only written when recorded
    pub fn save_csv<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        let with_penalty = self.gradient_penalties.len() == self.num_epochs() && self.num_epochs() > 0;

        if with_penalty {
            writer.write_record(["epoch", "gen_loss", "disc_loss", "gradient_penalty"])?;
        } else {
            writer.write_record(["epoch", "gen_loss", "disc_loss"])?;
        }

        for i in 0..self.num_epochs() {
            let mut record = vec![
                (i + 1).to_string(),
                self.gen_losses[i].to_string(),
                self.disc_losses[i].to_string(),
            ];
            if with_penalty {
                record.push(self.gradient_penalties[i].to_string());
            }
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    }
}
