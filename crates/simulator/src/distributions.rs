//! Arrival and service time sampling.
//!
//! Every sample draws from the run's own `ChaCha8Rng`, so a run replays
//! exactly from its seed.

use crate::computer::Computer;
use crate::config::DistributionConfig;
use crate::error::SimulatorError;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Exp, Normal, Triangular, Uniform};

/// Ready-to-sample distributions of the message system.
#[derive(Debug, Clone)]
pub struct Distributions {
    worker_interarrival: Exp<f64>,
    lazy_interarrival: Triangular<f64>,
    worker_service: Uniform<f64>,
    lazy_service: (f64, f64),
    master_service: Normal<f64>,
    reject_probability: f64,
}

impl Distributions {
    /// Build the samplers. The config must have passed
    /// [`DistributionConfig::validate`].
    pub fn from_config(config: &DistributionConfig) -> Result<Self, SimulatorError> {
        config.validate()?;

        let worker_interarrival = Exp::new(1.0 / config.worker_mean_interarrival)
            .map_err(|e| SimulatorError::InvalidConfig(format!("worker interarrival: {e}")))?;

        let (min, mode, max) = config.lazy_interarrival;
        let lazy_interarrival = Triangular::new(min, max, mode)
            .map_err(|e| SimulatorError::InvalidConfig(format!("lazy interarrival: {e}")))?;

        let (low, high) = config.worker_service;
        let worker_service = Uniform::new_inclusive(low, high);

        let (mean, std_dev) = config.master_service;
        let master_service = Normal::new(mean, std_dev)
            .map_err(|e| SimulatorError::InvalidConfig(format!("master service: {e}")))?;

        Ok(Self {
            worker_interarrival,
            lazy_interarrival,
            worker_service,
            lazy_service: config.lazy_service,
            master_service,
            reject_probability: config.reject_probability,
        })
    }

    /// Seconds until the next external arrival at `computer`.
    ///
    /// The master has no external stream.
    pub fn interarrival(&self, computer: Computer, rng: &mut ChaCha8Rng) -> Option<f64> {
        match computer {
            Computer::Worker => Some(self.worker_interarrival.sample(rng)),
            Computer::Lazy => Some(self.lazy_interarrival.sample(rng)),
            Computer::Master => None,
        }
    }

    /// Seconds `computer` spends on one message.
    pub fn service(&self, computer: Computer, rng: &mut ChaCha8Rng) -> f64 {
        match computer {
            Computer::Worker => self.worker_service.sample(rng),
            Computer::Lazy => {
                let (low, high) = self.lazy_service;
                sample_quadratic(low, high, rng)
            }
            // Normal tails below zero would schedule into the past.
            Computer::Master => self.master_service.sample(rng).max(0.0),
        }
    }

    /// Whether the lazy computer throws away the message it just processed.
    pub fn lazy_rejects(&self, rng: &mut ChaCha8Rng) -> bool {
        rng.gen::<f64>() < self.reject_probability
    }
}

/// Acceptance-rejection sample from the density proportional to `x^2` on
/// `[low, high]` (`3x^2/98` on `[3, 5]`).
pub fn sample_quadratic(low: f64, high: f64, rng: &mut ChaCha8Rng) -> f64 {
    loop {
        let candidate = low + (high - low) * rng.gen::<f64>();
        let ratio = candidate / high;
        if rng.gen::<f64>() <= ratio * ratio {
            return candidate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    fn mean(samples: &[f64]) -> f64 {
        samples.iter().sum::<f64>() / samples.len() as f64
    }

    #[test]
    fn test_samples_stay_in_range() {
        let distributions = Distributions::from_config(&DistributionConfig::default()).unwrap();
        let mut rng = rng();

        for _ in 0..2_000 {
            let worker = distributions.service(Computer::Worker, &mut rng);
            assert!((5.0..=10.0).contains(&worker));

            let lazy = distributions.service(Computer::Lazy, &mut rng);
            assert!((3.0..=5.0).contains(&lazy));

            assert!(distributions.service(Computer::Master, &mut rng) >= 0.0);

            let arrival = distributions.interarrival(Computer::Lazy, &mut rng).unwrap();
            assert!((2.0..=10.0).contains(&arrival));
        }
        assert_eq!(distributions.interarrival(Computer::Master, &mut rng), None);
    }

    #[test]
    fn test_quadratic_density_mean() {
        // E[X] for 3x^2/98 on [3, 5] is 3 * (5^4 - 3^4) / (4 * 98) = 4.163...
        let mut rng = rng();
        let samples: Vec<f64> = (0..20_000).map(|_| sample_quadratic(3.0, 5.0, &mut rng)).collect();
        assert!((mean(&samples) - 4.163).abs() < 0.02, "mean {}", mean(&samples));
    }

    #[test]
    fn test_worker_interarrival_mean() {
        let distributions = Distributions::from_config(&DistributionConfig::default()).unwrap();
        let mut rng = rng();
        let samples: Vec<f64> = (0..20_000)
            .filter_map(|_| distributions.interarrival(Computer::Worker, &mut rng))
            .collect();
        assert!((mean(&samples) - 15.0).abs() < 0.5, "mean {}", mean(&samples));
    }

    #[test]
    fn test_reject_probability_extremes() {
        let mut rng = rng();
        let with_probability = |p| {
            Distributions::from_config(&DistributionConfig::default().with_reject_probability(p))
                .unwrap()
        };
        let never = with_probability(0.0);
        let always = with_probability(1.0);
        for _ in 0..100 {
            assert!(!never.lazy_rejects(&mut rng));
            assert!(always.lazy_rejects(&mut rng));
        }
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = DistributionConfig::default().with_worker_mean_interarrival(-1.0);
        assert!(Distributions::from_config(&config).is_err());
    }
}
