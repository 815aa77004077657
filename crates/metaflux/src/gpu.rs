//! Fixed binary layouts shared verbatim between the compute stage and its consumers.
//!
//! Every type here is `#[repr(C)]` and [`bytemuck::Pod`], so slices of them can be uploaded
//! to a graphics API without conversion. Field order and size are part of the contract.
use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3, Vec4};

use crate::field::{BallData, BallSet, BCOUNT};
use crate::frame::{DrawStyle, FrameControl, Uniforms};
use crate::stream::TVertex;

/// Number of 32-bit words in one [`GpuVertex`].
pub const VERTEX_WORDS: usize = std::mem::size_of::<GpuVertex>() / 4;

/// Streamed mesh vertex (48 bytes).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuVertex {
    pub pos: [f32; 3],
    pub nrm: [f32; 3],
    /// Alpha 0 marks a texture coordinate in `xy`, anything else a color.
    pub tex_color: [f32; 4],
    pub flux: f32,
    /// 0 or 1.
    pub inside: u32,
}

/// One metaball (16 bytes).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuBall {
    pub pos: [f32; 3],
    pub power: f32,
}

/// Per-frame control block (48 bytes).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuFrameControl {
    pub iso_value: f32,
    pub movement: f32,
    pub movement2: f32,
    pub draw_style: u32,
    pub base: [f32; 3],
    pub _pad0: f32,
    pub rot: [f32; 2],
    pub _pad1: [f32; 2],
}

/// Vertex counter read back after a pass.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct GpuCounter {
    pub count: u32,
}

/// Draw-pass uniforms (80 bytes).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuUniforms {
    pub mvp: [[f32; 4]; 4],
    pub light: [f32; 3],
    pub point_size: f32,
}

impl From<TVertex> for GpuVertex {
    fn from(v: TVertex) -> Self {
        Self {
            pos: v.pos.to_array(),
            nrm: v.nrm.to_array(),
            tex_color: v.tex_color.to_array(),
            flux: v.flux,
            inside: u32::from(v.inside),
        }
    }
}

impl From<GpuVertex> for TVertex {
    fn from(v: GpuVertex) -> Self {
        Self {
            pos: Vec3::from_array(v.pos),
            nrm: Vec3::from_array(v.nrm),
            tex_color: Vec4::from_array(v.tex_color),
            flux: v.flux,
            inside: v.inside != 0,
        }
    }
}

impl From<BallData> for GpuBall {
    fn from(b: BallData) -> Self {
        Self {
            pos: b.pos.to_array(),
            power: b.power,
        }
    }
}

impl From<&BallSet> for [GpuBall; BCOUNT] {
    fn from(set: &BallSet) -> Self {
        (*set.slots()).map(GpuBall::from)
    }
}

impl From<&FrameControl> for GpuFrameControl {
    fn from(c: &FrameControl) -> Self {
        Self {
            iso_value: c.iso_value,
            movement: c.movement,
            movement2: c.movement2,
            draw_style: c.draw_style.as_u32(),
            base: c.base.to_array(),
            _pad0: 0.0,
            rot: c.rot.to_array(),
            _pad1: [0.0; 2],
        }
    }
}

impl From<&GpuFrameControl> for FrameControl {
    fn from(c: &GpuFrameControl) -> Self {
        Self {
            iso_value: c.iso_value,
            movement: c.movement,
            movement2: c.movement2,
            draw_style: DrawStyle::from_u32(c.draw_style).unwrap_or_default(),
            base: Vec3::from_array(c.base),
            rot: Vec2::from_array(c.rot),
        }
    }
}

impl From<&Uniforms> for GpuUniforms {
    fn from(u: &Uniforms) -> Self {
        Self {
            mvp: u.mvp.to_cols_array_2d(),
            light: u.light.to_array(),
            point_size: u.point_size,
        }
    }
}
