//! Stochastic GDP estimate: `population × m / rate` with `m` drawn per country.
//!
//! The random source is always passed in by the caller so one refresh cycle
//! owns one generator; nothing here keeps global RNG state.

use crate::error::{Error, FieldError, Result};
use rand::RngExt;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MULTIPLIER_MIN: f64 = 1000.0;
pub const DEFAULT_MULTIPLIER_MAX: f64 = 2000.0;

/// How the per-country multiplier is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Multiplier {
    /// Uniform over the half-open range `[min, max)`.
    Uniform { min: f64, max: f64 },
    /// Always the same value.
    Fixed { value: f64 },
}

impl Default for Multiplier {
    fn default() -> Self {
        Multiplier::Uniform {
            min: DEFAULT_MULTIPLIER_MIN,
            max: DEFAULT_MULTIPLIER_MAX,
        }
    }
}

impl Multiplier {
    pub fn validate(&self) -> Result<()> {
        let ok = match *self {
            Multiplier::Uniform { min, max } => {
                min.is_finite() && max.is_finite() && min > 0.0 && min < max
            }
            Multiplier::Fixed { value } => value.is_finite() && value > 0.0,
        };
        if ok {
            Ok(())
        } else {
            Err(Error::ValidationFailed(vec![FieldError::new(
                "gdp_multiplier",
                "must be positive with min < max",
            )]))
        }
    }

    pub fn draw<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match *self {
            Multiplier::Uniform { min, max } => rng.random_range(min..max),
            Multiplier::Fixed { value } => value,
        }
    }
}

/// Computes estimated GDP for one country.
///
/// Only built through [`GdpEstimator::new`] (or `Default`), so the multiplier
/// range is always valid:
///
/// ```compile_fail
/// use country_atlas::estimate::{GdpEstimator, Multiplier};
/// let _ = GdpEstimator { multiplier: Multiplier::Uniform { min: 2.0, max: 1.0 } };
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GdpEstimator {
    multiplier: Multiplier,
}

impl GdpEstimator {
    pub fn new(multiplier: Multiplier) -> Result<Self> {
        multiplier.validate()?;
        Ok(Self { multiplier })
    }

    pub fn multiplier(&self) -> Multiplier {
        self.multiplier
    }

    /// `rate` must already be known to be positive.
    pub fn estimate<R: rand::Rng + ?Sized>(&self, population: u64, rate: f64, rng: &mut R) -> f64 {
        let m = self.multiplier.draw(rng);
        population as f64 * m / rate
    }
}
