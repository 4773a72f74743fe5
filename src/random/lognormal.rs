//! Log-normal helpers.
//!
//! Durations are configured as a `(mode, dispersion)` pair in days and turned
//! into log-normal parameters with `sigma = ln(dispersion)` and
//! `mu = sigma^2 + ln(mode)`, which places the distribution's mode at `mode`.
//! Sampled durations are converted to whole seconds.

use rand_distr::{Distribution, LogNormal};
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::rand::Rng;
use crate::tier::Tier;

pub const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Converts a duration in days to whole seconds, rounding down.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn days_to_seconds(days: f64) -> u64 {
    // Float to int casts saturate, so huge draws pin at u64::MAX.
    (days * SECONDS_PER_DAY as f64).floor() as u64
}

/// A log-normal duration described by its mode and dispersion, in days.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModeDispersion {
    pub mode: f64,
    pub dispersion: f64,
}

impl ModeDispersion {
    #[must_use]
    pub const fn new(mode: f64, dispersion: f64) -> Self {
        ModeDispersion { mode, dispersion }
    }

    /// Returns `(mu, sigma)`.
    ///
    /// A dispersion below one gives a negative `ln`; a normal distribution is
    /// symmetric in the sign of its scale, so the magnitude is used.
    #[must_use]
    pub fn log_normal_parameters(&self) -> (f64, f64) {
        let sigma = self.dispersion.ln().abs();
        let mu = sigma * sigma + self.mode.ln();
        (mu, sigma)
    }

    /// # Errors
    ///
    /// Returns `InvalidParameter` unless both mode and dispersion are finite
    /// and strictly positive.
    pub fn validate(&self, name: &'static str) -> Result<(), SimError> {
        if !(self.mode.is_finite() && self.mode > 0.0) {
            return Err(SimError::invalid(
                name,
                format!("mode must be positive and finite, got {}", self.mode),
            ));
        }
        if !(self.dispersion.is_finite() && self.dispersion > 0.0) {
            return Err(SimError::invalid(
                name,
                format!(
                    "dispersion must be positive and finite, got {}",
                    self.dispersion
                ),
            ));
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `InvalidParameter` if the pair does not describe a valid
    /// log-normal distribution.
    pub fn wait_time(&self, name: &'static str) -> Result<WaitTime, SimError> {
        self.validate(name)?;
        let (mu, sigma) = self.log_normal_parameters();
        let days = LogNormal::new(mu, sigma).map_err(|e| SimError::invalid(name, e.to_string()))?;
        Ok(WaitTime { days })
    }
}

/// Samples a waiting time in whole seconds.
#[derive(Copy, Clone, Debug)]
pub struct WaitTime {
    days: LogNormal<f64>,
}

impl Distribution<u64> for WaitTime {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        days_to_seconds(self.days.sample(rng))
    }
}

/// Case severity for one tier: a log-normal draw divided by `scale`,
/// redrawn while the result exceeds one.
#[derive(Copy, Clone, Debug)]
pub struct SeverityDistribution {
    tier: Tier,
    raw: LogNormal<f64>,
    scale: f64,
    max_draws: usize,
}

impl SeverityDistribution {
    /// # Errors
    ///
    /// Returns `InvalidParameter` for a non-positive scale, a zero draw cap,
    /// or `(mu, sigma)` that do not describe a log-normal distribution.
    pub fn new(
        tier: Tier,
        mu: f64,
        sigma: f64,
        scale: f64,
        max_draws: usize,
    ) -> Result<Self, SimError> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(SimError::invalid(
                "severity.scale",
                format!("must be positive and finite, got {scale}"),
            ));
        }
        if max_draws == 0 {
            return Err(SimError::invalid("severity.max_draws", "must be at least 1"));
        }
        let raw = LogNormal::new(mu, sigma)
            .map_err(|e| SimError::invalid("severity", format!("{tier}: {e}")))?;
        Ok(SeverityDistribution {
            tier,
            raw,
            scale,
            max_draws,
        })
    }

    /// # Errors
    ///
    /// Returns `SeverityRejection` if `max_draws` consecutive draws all
    /// exceed one after scaling.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64, SimError> {
        for _ in 0..self.max_draws {
            let severity = self.raw.sample(rng) / self.scale;
            if severity <= 1.0 {
                return Ok(severity);
            }
        }
        Err(SimError::SeverityRejection {
            tier: self.tier,
            attempts: self.max_draws,
        })
    }
}
