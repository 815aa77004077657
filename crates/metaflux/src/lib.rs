#![forbid(unsafe_code)]
//! metaflux: Animated metaball isosurfaces on the CPU with a GPU-shaped data contract.
//!
//! Modules:
//! - field: metaball sources, falloff kernels, field value/gradient/normal evaluation
//! - grid: lattice spec and placement, parallel node sampling, lattice cache
//! - extract: marching-cubes tables and per-cell polygonisation in three draw styles
//! - stream: atomic fetch-add vertex stream and double buffering
//! - frame: per-frame control state, draw uniforms, ball animation
//! - gpu: `#[repr(C)]` layouts for upload to a graphics API
//! - pass: the per-frame compute pass and its events
//!
//! For examples, see the `metaflux_examples` crate.
pub mod error;
pub mod extract;
pub mod field;
pub mod frame;
pub mod gpu;
pub mod grid;
pub mod pass;
pub mod stream;

/// Convenient re-exports for common types. Import with `use metaflux::prelude::*;`.
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::extract::{count_vertices, flux_color, LINE_COLOR};
    pub use crate::field::{
        BallData, BallSet, FieldKernel, FieldModel, FieldSample, BALL_MARKER_COLOR, BCOUNT,
    };
    pub use crate::frame::{
        BallAnimator, DrawStyle, FrameControl, Uniforms, DEFAULT_ISO_VALUE, ISO_MAX, ISO_MIN,
        LIGHT_ANGLE_STEP,
    };
    pub use crate::gpu::{GpuBall, GpuCounter, GpuFrameControl, GpuUniforms, GpuVertex};
    pub use crate::grid::{sample_grid, GridSamples, GridSpec, Lattice, LatticeCache, GSPAN};
    pub use crate::pass::events::{
        EventSink, FnSink, MultiSink, PassEvent, PassEventKind, VecSink,
    };
    pub use crate::pass::{run_pass, Execution, IsoPass, PassConfig, PassResult};
    pub use crate::stream::{worst_case_vertices, Counter, FrameBuffers, TVertex, VertexStream};
}
