//! Isosurface Extractor.
//!
//! Marching cubes over a sampled lattice. Each cell is classified into one of 256 cases;
//! crossed edges get an interpolated vertex and the case's triangles are emitted in the
//! vertex layout selected by the frame's [`DrawStyle`]:
//!
//! - [`DrawStyle::Triangle`]: one vertex per triangle corner, `tex_color` carries a
//!   lattice-parametric texture coordinate (alpha 0).
//! - [`DrawStyle::Line`]: each triangle becomes its three edges, literal white.
//! - [`DrawStyle::Point`]: one vertex per triangle corner, literal color from the flux ramp.
use glam::Vec4;

use crate::frame::DrawStyle;
use crate::grid::GridSamples;

pub mod cell;
pub mod tables;

pub use cell::{cell_case, corner_nodes, polygonise_cell, CellContext, CellVertices};

/// Literal color of [`DrawStyle::Line`] vertices.
pub const LINE_COLOR: Vec4 = Vec4::ONE;

const FLUX_LOW: Vec4 = Vec4::new(0.2, 0.4, 1.0, 1.0);
const FLUX_HIGH: Vec4 = Vec4::new(1.0, 0.35, 0.2, 1.0);

/// Maps a flux magnitude to an opaque color, cool for weak and warm for strong gradients.
pub fn flux_color(flux: f32) -> Vec4 {
    let f = flux.max(0.0);
    let s = if f.is_finite() { f / (f + 1.0) } else { 1.0 };
    let mut c = FLUX_LOW.lerp(FLUX_HIGH, s);
    c.w = 1.0;
    c
}

/// Vertices emitted per triangle in `style`.
pub const fn vertices_per_triangle(style: DrawStyle) -> usize {
    match style {
        DrawStyle::Line => 6,
        DrawStyle::Point | DrawStyle::Triangle => 3,
    }
}

/// Cells whose corners do not all share one classification.
pub fn active_cells(samples: &GridSamples) -> usize {
    (0..samples.spec().cell_count())
        .filter(|&cell| !matches!(cell_case(samples, cell), 0 | 255))
        .count()
}

/// Scalar reference count of the vertices a pass emits, from the case table alone.
pub fn count_vertices(samples: &GridSamples, style: DrawStyle) -> usize {
    let triangles: usize = (0..samples.spec().cell_count())
        .map(|cell| tables::triangles(cell_case(samples, cell)).count())
        .sum();
    triangles * vertices_per_triangle(style)
}
