//! Distributions to draw branch values in randomly grown trees
//!

use rand_distr::{Distribution, Uniform};
use thiserror::Error;

/// Errors that can occur when setting up a branch value distribution
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DistrError {
    /// The bounds of a range are not finite or not ordered
    #[error("Invalid range [{0}, {1}]: bounds must be finite with the lower one first")]
    InvalidRange(f64, f64),
}

/// Source of branch lengths and supports for new branches
#[derive(Debug, Clone)]
pub(crate) enum Sampler {
    /// Every branch gets the same value
    Constant(f64),
    /// Values are drawn uniformly in a closed range
    Uniform(Uniform<f64>),
}

impl Sampler {
    /// Creates a sampler over `[low, high]` if `random` is set, otherwise
    /// one that always returns 1.
    pub(crate) fn new(random: bool, (low, high): (f64, f64)) -> Result<Self, DistrError> {
        if !random {
            return Ok(Self::Constant(1.0));
        }
        if !low.is_finite() || !high.is_finite() || low > high {
            return Err(DistrError::InvalidRange(low, high));
        }

        Ok(Self::Uniform(Uniform::new_inclusive(low, high)))
    }
}

impl Distribution<f64> for Sampler {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            Sampler::Constant(value) => *value,
            Sampler::Uniform(u) => u.sample(rng),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn constant_values() {
        let sampler = Sampler::new(false, (5.0, 2.0)).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(sampler.sample(&mut rng), 1.0);
    }

    #[test]
    fn values_in_range() {
        let sampler = Sampler::new(true, (0.5, 0.75)).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        for value in sampler.sample_iter(&mut rng).take(1000) {
            assert!((0.5..=0.75).contains(&value));
        }

        let point = Sampler::new(true, (0.3, 0.3)).unwrap();
        assert_eq!(point.sample(&mut StdRng::seed_from_u64(0)), 0.3);
    }

    #[test]
    fn invalid_ranges() {
        assert_eq!(
            Sampler::new(true, (1.0, 0.0)).unwrap_err(),
            DistrError::InvalidRange(1.0, 0.0)
        );
        assert!(Sampler::new(true, (0.0, f64::INFINITY)).is_err());
        assert!(Sampler::new(true, (f64::NAN, 1.0)).is_err());
    }
}
