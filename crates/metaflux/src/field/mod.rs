//! Scalar field model: a weighted sum of metaball influences.
//!
//! [`BallSet`] holds up to [`BCOUNT`] sources supplied per frame by the animation driver,
//! [`FieldModel`] pairs it with a [`FieldKernel`] and evaluates the field value, its
//! analytic gradient and the outward surface normal at arbitrary points.
use glam::{Vec3, Vec4};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::stream::TVertex;

pub mod kernel;

pub use kernel::FieldKernel;

/// Maximum number of metaballs contributing to the field.
pub const BCOUNT: usize = 12;

/// Normal used when the field gradient vanishes.
pub const FALLBACK_NORMAL: Vec3 = Vec3::Y;

/// Literal color of the per-ball position markers.
pub const BALL_MARKER_COLOR: Vec4 = Vec4::new(1.0, 0.0, 0.0, 1.0);

/// One field source.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BallData {
    /// Center in world space.
    pub pos: Vec3,
    /// Strength; zero disables the ball.
    pub power: f32,
}

impl BallData {
    pub fn new(pos: Vec3, power: f32) -> Self {
        Self { pos, power }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.power != 0.0
    }
}

/// Fixed-size ball collection; unused slots carry zero power.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BallSet {
    slots: [BallData; BCOUNT],
}

impl BallSet {
    /// Creates a set with every slot inactive.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a set from up to [`BCOUNT`] balls; remaining slots stay inactive.
    pub fn try_from_slice(balls: &[BallData]) -> Result<Self> {
        if balls.len() > BCOUNT {
            return Err(Error::InvalidBalls(format!(
                "{} balls supplied, at most {BCOUNT} are supported",
                balls.len()
            )));
        }
        let mut set = Self::empty();
        for (i, ball) in balls.iter().enumerate() {
            set.set(i, *ball)?;
        }
        Ok(set)
    }

    /// Replaces the ball in `slot`.
    pub fn set(&mut self, slot: usize, ball: BallData) -> Result<()> {
        if slot >= BCOUNT {
            return Err(Error::InvalidBalls(format!(
                "slot {slot} out of range (BCOUNT = {BCOUNT})"
            )));
        }
        if !ball.pos.is_finite() {
            return Err(Error::InvalidBalls(format!(
                "ball {slot} has a non-finite position"
            )));
        }
        if !(ball.power.is_finite() && ball.power >= 0.0) {
            return Err(Error::InvalidBalls(format!(
                "ball {slot} power must be finite and >= 0, got {}",
                ball.power
            )));
        }
        self.slots[slot] = ball;
        Ok(())
    }

    pub fn get(&self, slot: usize) -> Option<&BallData> {
        self.slots.get(slot)
    }

    pub fn slots(&self) -> &[BallData; BCOUNT] {
        &self.slots
    }

    /// Balls with non-zero power.
    pub fn active(&self) -> impl Iterator<Item = &BallData> + '_ {
        self.slots.iter().filter(|b| b.is_active())
    }

    pub fn active_count(&self) -> usize {
        self.active().count()
    }

    /// One point vertex at the center of each active ball, for drawing in
    /// [`DrawStyle::Point`](crate::frame::DrawStyle::Point).
    pub fn marker_vertices(&self) -> Vec<TVertex> {
        self.active()
            .map(|b| TVertex {
                pos: b.pos,
                nrm: FALLBACK_NORMAL,
                tex_color: BALL_MARKER_COLOR,
                flux: 0.0,
                inside: true,
            })
            .collect()
    }
}

/// Field value and gradient at a lattice node.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FieldSample {
    pub value: f32,
    pub gradient: Vec3,
}

/// The scalar field for one frame. Pure and shareable across threads.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FieldModel {
    pub balls: BallSet,
    pub kernel: FieldKernel,
}

impl FieldModel {
    pub fn new(balls: BallSet, kernel: FieldKernel) -> Self {
        Self { balls, kernel }
    }

    /// Field value at `point`.
    pub fn evaluate(&self, point: Vec3) -> f32 {
        self.balls
            .active()
            .map(|b| self.kernel.value(b.power, point - b.pos))
            .sum()
    }

    /// Analytic gradient at `point`.
    pub fn gradient(&self, point: Vec3) -> Vec3 {
        self.balls
            .active()
            .map(|b| self.kernel.gradient(b.power, point - b.pos))
            .fold(Vec3::ZERO, |acc, g| acc + g)
    }

    /// Unit normal pointing away from the inside region (down the gradient).
    ///
    /// Falls back to [`FALLBACK_NORMAL`] where the gradient vanishes.
    pub fn surface_normal(&self, point: Vec3) -> Vec3 {
        let g = self.gradient(point);
        let len = g.length();
        if len.is_finite() && len > f32::EPSILON {
            -g / len
        } else {
            FALLBACK_NORMAL
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_balls() -> BallSet {
        BallSet::try_from_slice(&[
            BallData::new(Vec3::new(-2.0, 0.0, 0.0), 1.0),
            BallData::new(Vec3::new(2.0, 0.0, 0.0), 1.0),
        ])
        .expect("valid balls")
    }

    #[test]
    fn try_from_slice_rejects_too_many_balls() {
        let balls = vec![BallData::new(Vec3::ZERO, 1.0); BCOUNT + 1];
        assert!(matches!(
            BallSet::try_from_slice(&balls),
            Err(Error::InvalidBalls(_))
        ));
    }

    #[test]
    fn set_rejects_negative_or_nan_power() {
        let mut set = BallSet::empty();
        assert!(set.set(0, BallData::new(Vec3::ZERO, -1.0)).is_err());
        assert!(set.set(0, BallData::new(Vec3::ZERO, f32::NAN)).is_err());
        assert!(set
            .set(0, BallData::new(Vec3::new(f32::INFINITY, 0.0, 0.0), 1.0))
            .is_err());
        assert!(set.set(BCOUNT, BallData::new(Vec3::ZERO, 1.0)).is_err());
    }

    #[test]
    fn markers_sit_on_active_ball_centers() {
        let mut set = two_balls();
        set.set(5, BallData::new(Vec3::new(0.0, 3.0, 1.0), 0.5)).unwrap();
        set.set(1, BallData::new(Vec3::new(2.0, 0.0, 0.0), 0.0)).unwrap();

        let markers = set.marker_vertices();
        assert_eq!(markers.len(), set.active_count());
        assert_eq!(markers.len(), 2);
        let centers: Vec<Vec3> = set.active().map(|b| b.pos).collect();
        assert_eq!(markers.iter().map(|v| v.pos).collect::<Vec<_>>(), centers);
        for v in &markers {
            assert_eq!(v.tex_color, BALL_MARKER_COLOR);
            assert_eq!(v.tex_color.w, 1.0);
            assert!(!v.is_textured());
        }
        assert!(BallSet::empty().marker_vertices().is_empty());
    }

    #[test]
    fn unused_slots_contribute_nothing() {
        let model = FieldModel::new(BallSet::empty(), FieldKernel::default());
        assert_eq!(model.evaluate(Vec3::new(0.3, 0.1, -2.0)), 0.0);
        assert_eq!(model.gradient(Vec3::ONE), Vec3::ZERO);
    }

    #[test]
    fn evaluate_sums_ball_contributions() {
        let kernel = FieldKernel::default();
        let model = FieldModel::new(two_balls(), kernel);
        let p = Vec3::new(0.5, 1.0, 0.0);
        let expected = kernel.value(1.0, p - Vec3::new(-2.0, 0.0, 0.0))
            + kernel.value(1.0, p - Vec3::new(2.0, 0.0, 0.0));
        assert!((model.evaluate(p) - expected).abs() < 1e-6);
    }

    #[test]
    fn surface_normal_points_away_from_ball() {
        let balls = BallSet::try_from_slice(&[BallData::new(Vec3::ZERO, 1.0)]).unwrap();
        let model = FieldModel::new(balls, FieldKernel::default());
        let n = model.surface_normal(Vec3::new(3.0, 0.0, 0.0));
        assert!((n - Vec3::X).length() < 1e-5);
        assert!((n.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn surface_normal_falls_back_on_zero_gradient() {
        let model = FieldModel::new(two_balls(), FieldKernel::default());
        // Midpoint of two equal balls: gradients cancel.
        assert_eq!(model.surface_normal(Vec3::ZERO), FALLBACK_NORMAL);
        let empty = FieldModel::default();
        assert_eq!(empty.surface_normal(Vec3::ONE), FALLBACK_NORMAL);
    }
}
