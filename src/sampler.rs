//! Triangular distribution sampling for bounded counts and sizes
//!
//! Every structural count in a synthetic tree (sub-projects, files, types,
//! fields, methods) and every line-size draw goes through [`Triangular`].
//! Draws use inverse-transform sampling of one uniform value from the
//! caller's random source, so a seeded source reproduces a whole tree.
//!
//! # Count profile
//!
//! | Parameter | Value |
//! |-----------|-------|
//! | min       | 1 |
//! | mode      | `max / 2 + 1` (integer division) |
//! | max       | configured maximum |

use crate::error::{Result, VerifierError};
use rand::Rng;

/// Triangular distribution over `[min, max]` peaking at `mode`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangular {
    min: f64,
    mode: f64,
    max: f64,
}

impl Triangular {
    /// Create a distribution, rejecting `min > mode` or `mode > max`
    pub fn new(min: f64, mode: f64, max: f64) -> Result<Self> {
        let finite = min.is_finite() && mode.is_finite() && max.is_finite();
        if !finite || min > mode || mode > max {
            return Err(VerifierError::InvalidDistribution { min, mode, max });
        }
        Ok(Triangular { min, mode, max })
    }

    /// Count distribution for a configured maximum: `(1, max / 2 + 1, max)`
    ///
    /// A maximum of zero yields `InvalidDistribution`.
    pub fn for_count(max: u32) -> Result<Self> {
        Self::new(1.0, f64::from(max / 2 + 1), f64::from(max))
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn mode(&self) -> f64 {
        self.mode
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Draw a real value in `[min, max]`
    pub fn sample_f64<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let width = self.max - self.min;
        if width <= 0.0 {
            return self.min;
        }

        let u: f64 = rng.gen();
        let fc = (self.mode - self.min) / width;
        let value = if u < fc {
            self.min + (u * width * (self.mode - self.min)).sqrt()
        } else {
            self.max - ((1.0 - u) * width * (self.max - self.mode)).sqrt()
        };
        value.clamp(self.min, self.max)
    }

    /// Draw an integer, truncated toward zero and never below `min`
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        let floor = self.min.ceil() as u32;
        (self.sample_f64(rng).trunc() as u32).max(floor)
    }
}
