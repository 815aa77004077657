//! Per-frame control state and draw-pass uniforms.
//!
//! [`FrameControl`] is produced once per frame by the driver and borrowed immutably by the
//! compute pass. [`Uniforms`] only parameterize the external draw pass.
use glam::{Mat4, Vec2, Vec3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub mod animation;

pub use animation::BallAnimator;

/// Lower bound applied by [`FrameControl::adjust_iso`].
pub const ISO_MIN: f32 = 0.01;
/// Upper bound applied by [`FrameControl::adjust_iso`].
pub const ISO_MAX: f32 = 0.5;
/// Iso-value a fresh [`FrameControl`] starts with.
pub const DEFAULT_ISO_VALUE: f32 = 0.02;

/// Distance of the orbiting light from the lattice axis.
pub const LIGHT_ORBIT_RADIUS: f32 = 15.0;
/// Per-frame advance of the orbiting light angle.
pub const LIGHT_ANGLE_STEP: f32 = 0.03;

/// How the streamed vertices are meant to be assembled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DrawStyle {
    /// Point list, literal colors.
    Point,
    /// Line list (triangle edges), literal colors.
    Line,
    /// Triangle list, texture coordinates.
    #[default]
    Triangle,
}

impl DrawStyle {
    /// Worst-case vertices a single cell emits in this style.
    pub const fn max_vertices_per_cell(self) -> usize {
        match self {
            DrawStyle::Point | DrawStyle::Triangle => 15,
            DrawStyle::Line => 30,
        }
    }

    pub const fn as_u32(self) -> u32 {
        match self {
            DrawStyle::Point => 0,
            DrawStyle::Line => 1,
            DrawStyle::Triangle => 2,
        }
    }

    pub const fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(DrawStyle::Point),
            1 => Some(DrawStyle::Line),
            2 => Some(DrawStyle::Triangle),
            _ => None,
        }
    }

    /// Point → Line → Triangle → Point.
    pub const fn next(self) -> Self {
        match self {
            DrawStyle::Point => DrawStyle::Line,
            DrawStyle::Line => DrawStyle::Triangle,
            DrawStyle::Triangle => DrawStyle::Point,
        }
    }
}

/// Values that parameterize one frame's compute pass.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrameControl {
    /// Threshold separating inside (`value >= iso_value`) from outside.
    pub iso_value: f32,
    /// Primary animation phase.
    pub movement: f32,
    /// Secondary animation phase.
    pub movement2: f32,
    pub draw_style: DrawStyle,
    /// World-space center of the lattice.
    pub base: Vec3,
    /// Lattice orientation: yaw about Y, then pitch about X (radians).
    pub rot: Vec2,
}

impl Default for FrameControl {
    fn default() -> Self {
        Self {
            iso_value: DEFAULT_ISO_VALUE,
            movement: 0.0,
            movement2: 0.0,
            draw_style: DrawStyle::Triangle,
            base: Vec3::ZERO,
            rot: Vec2::ZERO,
        }
    }
}

impl FrameControl {
    pub fn new(iso_value: f32) -> Self {
        Self {
            iso_value,
            ..Default::default()
        }
    }

    pub fn with_iso_value(mut self, iso_value: f32) -> Self {
        self.iso_value = iso_value;
        self
    }

    pub fn with_draw_style(mut self, draw_style: DrawStyle) -> Self {
        self.draw_style = draw_style;
        self
    }

    pub fn with_base(mut self, base: Vec3) -> Self {
        self.base = base;
        self
    }

    pub fn with_rot(mut self, rot: Vec2) -> Self {
        self.rot = rot;
        self
    }

    pub fn with_movement(mut self, movement: f32, movement2: f32) -> Self {
        self.movement = movement;
        self.movement2 = movement2;
        self
    }

    /// Nudges the iso-value, keeping it within `[ISO_MIN, ISO_MAX]`.
    pub fn adjust_iso(&mut self, delta: f32) {
        self.iso_value = (self.iso_value + delta).clamp(ISO_MIN, ISO_MAX);
    }

    pub fn cycle_draw_style(&mut self) {
        self.draw_style = self.draw_style.next();
    }

    /// Validates the control block, returning an error if any value is non-finite.
    pub fn validate(&self) -> Result<()> {
        if !self.iso_value.is_finite() {
            return Err(Error::InvalidControl("iso_value must be finite".into()));
        }
        if !(self.movement.is_finite() && self.movement2.is_finite()) {
            return Err(Error::InvalidControl("movement phases must be finite".into()));
        }
        if !self.base.is_finite() {
            return Err(Error::InvalidControl("base must be finite".into()));
        }
        if !self.rot.is_finite() {
            return Err(Error::InvalidControl("rot must be finite".into()));
        }
        Ok(())
    }
}

/// Rendering-only parameters for the draw pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Uniforms {
    pub mvp: Mat4,
    pub point_size: f32,
    /// Light position or direction, interpreted by the renderer.
    pub light: Vec3,
}

impl Default for Uniforms {
    fn default() -> Self {
        Self {
            mvp: Mat4::IDENTITY,
            point_size: 2.0,
            light: Vec3::new(0.0, LIGHT_ORBIT_RADIUS, LIGHT_ORBIT_RADIUS),
        }
    }
}

impl Uniforms {
    pub fn new(mvp: Mat4) -> Self {
        Self {
            mvp,
            ..Default::default()
        }
    }

    pub fn with_point_size(mut self, point_size: f32) -> Self {
        self.point_size = point_size;
        self
    }

    /// Places the light on a horizontal circle above the lattice at `angle` radians.
    pub fn with_orbiting_light(mut self, angle: f32) -> Self {
        self.light = Vec3::new(
            angle.sin() * LIGHT_ORBIT_RADIUS,
            LIGHT_ORBIT_RADIUS,
            angle.cos() * LIGHT_ORBIT_RADIUS,
        );
        self
    }
}
