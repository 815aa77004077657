//! Ball animation driver.
//!
//! Owns the per-frame mutation of [`FrameControl`] phases and derives the [`BallSet`] for
//! the next pass from them. Each ball follows its own Lissajous orbit around the lattice
//! center; orbit parameters are drawn once from a seeded RNG so runs are reproducible.
use glam::{Vec2, Vec3};
use rand::rngs::StdRng;
use rand::{Rng as RngCore, SeedableRng};

use crate::error::{Error, Result};
use crate::field::{BallData, BallSet, BCOUNT};
use crate::frame::FrameControl;

/// Phase speed multiplier applied by [`BallAnimator::advance`].
pub const DEFAULT_SPEED: f32 = 0.04;
/// Power given to every animated ball.
pub const DEFAULT_POWER: f32 = 0.5;
/// Lattice spin per frame when spinning is enabled.
pub const ROTATION_STEP: Vec2 = Vec2::new(0.006, 0.0075);

const MOVEMENT_STEP: f32 = 0.01;
const MOVEMENT2_STEP: f32 = 0.02;
const MIN_FREQUENCY: f32 = 20.0;
const MAX_FREQUENCY: f32 = 60.0;
const MIN_AMPLITUDE: f32 = 0.3;

#[derive(Clone, Copy, Debug)]
struct Orbit {
    amplitude: Vec3,
    frequency: Vec3,
    phase: Vec3,
}

impl Orbit {
    fn random(rng: &mut dyn RngCore) -> Self {
        let mut unit3 = |lo: f32, hi: f32| {
            Vec3::new(
                lo + rand01(rng) * (hi - lo),
                lo + rand01(rng) * (hi - lo),
                lo + rand01(rng) * (hi - lo),
            )
        };
        let amplitude = unit3(MIN_AMPLITUDE, 1.0);
        let frequency = unit3(MIN_FREQUENCY, MAX_FREQUENCY);
        let phase = unit3(0.0, std::f32::consts::TAU);
        Self {
            amplitude,
            frequency,
            phase,
        }
    }

    /// Offset from the orbit center, each component within `[-1, 1]`.
    fn offset(&self, movement: f32, movement2: f32) -> Vec3 {
        Vec3::new(
            self.amplitude.x * (self.frequency.x * movement + self.phase.x).sin(),
            self.amplitude.y * (self.frequency.y * movement + self.phase.y).cos(),
            self.amplitude.z * (self.frequency.z * movement2 + self.phase.z).sin(),
        )
    }
}

/// Drives ball motion and lattice spin from frame to frame.
#[derive(Clone, Debug)]
pub struct BallAnimator {
    orbits: Vec<Orbit>,
    /// Half-extent of the region the balls roam, in world units.
    pub radius: f32,
    /// Multiplier on the per-frame phase step.
    pub speed: f32,
    /// Power assigned to every ball.
    pub power: f32,
    /// Whether [`BallAnimator::advance`] also spins the lattice.
    pub spin: bool,
}

impl BallAnimator {
    /// Creates an animator for `count` balls roaming within `radius` of the lattice center.
    pub fn seeded(count: usize, radius: f32, seed: u64) -> Result<Self> {
        if count > BCOUNT {
            return Err(Error::InvalidBalls(format!(
                "{count} animated balls requested, at most {BCOUNT} are supported"
            )));
        }
        if !(radius.is_finite() && radius >= 0.0) {
            return Err(Error::InvalidConfig(
                "animation radius must be finite and >= 0".into(),
            ));
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let orbits = (0..count).map(|_| Orbit::random(&mut rng)).collect();
        Ok(Self {
            orbits,
            radius,
            speed: DEFAULT_SPEED,
            power: DEFAULT_POWER,
            spin: false,
        })
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_power(mut self, power: f32) -> Self {
        self.power = power;
        self
    }

    pub fn with_spin(mut self, spin: bool) -> Self {
        self.spin = spin;
        self
    }

    pub fn ball_count(&self) -> usize {
        self.orbits.len()
    }

    /// Steps the animation phases (and lattice spin) by one frame.
    pub fn advance(&self, control: &mut FrameControl) {
        control.movement += MOVEMENT_STEP * self.speed;
        control.movement2 += MOVEMENT2_STEP * self.speed;
        if self.spin {
            control.rot += ROTATION_STEP;
        }
    }

    /// Ball positions for the phases in `control`, centered on `control.base`.
    pub fn balls(&self, control: &FrameControl) -> Result<BallSet> {
        let mut set = BallSet::empty();
        for (slot, orbit) in self.orbits.iter().enumerate() {
            let pos = control.base + orbit.offset(control.movement, control.movement2) * self.radius;
            set.set(slot, BallData::new(pos, self.power))?;
        }
        Ok(set)
    }
}

/// Random float in `[0, 1]`.
#[inline]
pub(crate) fn rand01(rng: &mut dyn RngCore) -> f32 {
    (rng.next_u32() as f32) / ((u32::MAX as f32) + 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_rejects_too_many_balls() {
        assert!(BallAnimator::seeded(BCOUNT + 1, 3.0, 1).is_err());
        assert!(BallAnimator::seeded(2, f32::NAN, 1).is_err());
    }

    #[test]
    fn same_seed_gives_same_balls() {
        let control = FrameControl::default().with_movement(0.3, 0.7);
        let a = BallAnimator::seeded(5, 4.0, 99).unwrap();
        let b = BallAnimator::seeded(5, 4.0, 99).unwrap();
        assert_eq!(a.balls(&control).unwrap(), b.balls(&control).unwrap());
    }

    #[test]
    fn balls_stay_within_radius_of_base() {
        let base = Vec3::new(10.0, -3.0, 2.0);
        let mut control = FrameControl::default().with_base(base);
        let animator = BallAnimator::seeded(BCOUNT, 4.0, 7).unwrap();
        for _ in 0..200 {
            animator.advance(&mut control);
            let set = animator.balls(&control).unwrap();
            assert_eq!(set.active_count(), BCOUNT);
            for ball in set.active() {
                let d = (ball.pos - base).abs();
                assert!(d.max_element() <= 4.0 + 1e-4, "ball escaped: {d}");
                assert_eq!(ball.power, DEFAULT_POWER);
            }
        }
    }

    #[test]
    fn advance_steps_phases_and_spin() {
        let animator = BallAnimator::seeded(1, 1.0, 0)
            .unwrap()
            .with_speed(1.0)
            .with_spin(true);
        let mut control = FrameControl::default();
        animator.advance(&mut control);
        assert!((control.movement - 0.01).abs() < 1e-7);
        assert!((control.movement2 - 0.02).abs() < 1e-7);
        assert_eq!(control.rot, ROTATION_STEP);
    }

    #[test]
    fn unused_slots_stay_inactive() {
        let animator = BallAnimator::seeded(3, 2.0, 5).unwrap();
        let set = animator.balls(&FrameControl::default()).unwrap();
        assert_eq!(set.active_count(), 3);
        assert!(set.slots()[3..].iter().all(|b| !b.is_active()));
    }
}
