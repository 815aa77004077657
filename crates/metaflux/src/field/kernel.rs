//! Falloff kernels mapping squared distance to a ball's contribution.
use glam::Vec3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default softening term of [`FieldKernel::InverseSquare`].
pub const DEFAULT_EPSILON: f32 = 0.01;

/// Distance falloff of a single ball.
///
/// Both kernels are continuously differentiable and strictly decreasing with distance for
/// non-negative power, so `value >= iso` carves out a well defined inside region.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FieldKernel {
    /// `power / (d² + epsilon)`.
    InverseSquare { epsilon: f32 },
    /// `power * exp(-d² / (2 sigma²))`.
    Gaussian { sigma: f32 },
}

impl Default for FieldKernel {
    fn default() -> Self {
        FieldKernel::InverseSquare {
            epsilon: DEFAULT_EPSILON,
        }
    }
}

impl FieldKernel {
    pub fn inverse_square(epsilon: f32) -> Self {
        FieldKernel::InverseSquare { epsilon }
    }

    pub fn gaussian(sigma: f32) -> Self {
        FieldKernel::Gaussian { sigma }
    }

    /// Validates the kernel parameters, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        match *self {
            FieldKernel::InverseSquare { epsilon } => {
                if !(epsilon.is_finite() && epsilon > 0.0) {
                    return Err(Error::InvalidConfig(
                        "inverse-square epsilon must be finite and > 0".into(),
                    ));
                }
            }
            FieldKernel::Gaussian { sigma } => {
                if !(sigma.is_finite() && sigma > 0.0) {
                    return Err(Error::InvalidConfig(
                        "gaussian sigma must be finite and > 0".into(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Contribution of a ball of `power` at offset `delta = point - center`.
    #[inline]
    pub fn value(&self, power: f32, delta: Vec3) -> f32 {
        let d2 = delta.length_squared();
        match *self {
            FieldKernel::InverseSquare { epsilon } => power / (d2 + epsilon),
            FieldKernel::Gaussian { sigma } => power * (-d2 / (2.0 * sigma * sigma)).exp(),
        }
    }

    /// Gradient of [`FieldKernel::value`] with respect to the sample point.
    #[inline]
    pub fn gradient(&self, power: f32, delta: Vec3) -> Vec3 {
        let d2 = delta.length_squared();
        match *self {
            FieldKernel::InverseSquare { epsilon } => {
                let denom = d2 + epsilon;
                delta * (-2.0 * power / (denom * denom))
            }
            FieldKernel::Gaussian { sigma } => {
                let s2 = sigma * sigma;
                delta * (-power / s2 * (-d2 / (2.0 * s2)).exp())
            }
        }
    }
}
