//! Toy GAN wrapper combining Generator and Discriminator

use tch::{nn, nn::OptimizerConfig, nn::VarStore, Device, TchError};

use super::discriminator::{Discriminator, DiscriminatorConfig};
use super::generator::{Generator, GeneratorConfig};

/// Generator/discriminator pair with one variable store each
pub struct SineGan {
    pub generator: Generator,
    pub discriminator: Discriminator,
    pub gen_vs: VarStore,
    pub disc_vs: VarStore,
    pub device: Device,
}

impl SineGan {
    pub fn new(gen_config: GeneratorConfig, disc_config: DiscriminatorConfig, device: Device) -> Self {
        let gen_vs = VarStore::new(device);
        let disc_vs = VarStore::new(device);

        let generator = Generator::new(&gen_vs.root(), gen_config);
        let discriminator = Discriminator::new(&disc_vs.root(), disc_config);

        Self {
            generator,
            discriminator,
            gen_vs,
            disc_vs,
            device,
        }
    }

    /// Adam with the library defaults (β = 0.9, 0.999)
    pub fn gen_optimizer(&self, lr: f64) -> Result<nn::Optimizer, TchError> {
        nn::Adam::default().build(&self.gen_vs, lr)
    }

    pub fn disc_optimizer(&self, lr: f64) -> Result<nn::Optimizer, TchError> {
        nn::Adam::default().build(&self.disc_vs, lr)
    }

    pub fn latent_dim(&self) -> i64 {
        self.generator.config().latent_dim
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sine_gan_creation() {
        let gan = SineGan::new(GeneratorConfig::default(), DiscriminatorConfig::default(), Device::Cpu);
        assert_eq!(gan.latent_dim(), 2);
        // Linear(2,16) Linear(16,32) Linear(32,2)
        assert_eq!(gan.gen_vs.trainable_variables().len(), 6);
        assert!(gan.gen_optimizer(1e-3).is_ok());
        assert!(gan.disc_optimizer(1e-3).is_ok());
    }
}
