//! Per-cell polygonisation.
use glam::{Vec3, Vec4};

use crate::extract::tables::{triangles, CORNER_OFFSETS, EDGE_CORNERS, EDGE_TABLE};
use crate::extract::{flux_color, LINE_COLOR};
use crate::field::FieldModel;
use crate::frame::DrawStyle;
use crate::grid::{CellId, GridSamples, GridSpec, Lattice, NodeId};
use crate::stream::TVertex;

/// Largest number of vertices any cell emits in any style.
pub const MAX_CELL_VERTICES: usize = 30;

/// Everything a cell task reads. Shared immutably by all tasks of a pass.
#[derive(Clone, Copy)]
pub struct CellContext<'a> {
    pub model: &'a FieldModel,
    pub lattice: &'a Lattice,
    pub samples: &'a GridSamples,
    pub style: DrawStyle,
}

/// Fixed scratch buffer holding one cell's output.
#[derive(Clone, Debug)]
pub struct CellVertices {
    buf: [TVertex; MAX_CELL_VERTICES],
    len: usize,
}

impl Default for CellVertices {
    fn default() -> Self {
        Self::new()
    }
}

impl CellVertices {
    pub fn new() -> Self {
        Self {
            buf: [TVertex::default(); MAX_CELL_VERTICES],
            len: 0,
        }
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    #[inline]
    fn push(&mut self, v: TVertex) {
        debug_assert!(self.len < MAX_CELL_VERTICES);
        self.buf[self.len] = v;
        self.len += 1;
    }

    pub fn as_slice(&self) -> &[TVertex] {
        &self.buf[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Global node indices of the eight corners of `cell`.
#[inline]
pub fn corner_nodes(spec: &GridSpec, cell: CellId) -> [NodeId; 8] {
    let [x, y, z] = spec.cell_coords(cell);
    CORNER_OFFSETS.map(|[dx, dy, dz]| spec.node_index(x + dx, y + dy, z + dz))
}

/// Case index of `cell`: bit `i` set when corner `i` is outside.
pub fn cell_case(samples: &GridSamples, cell: CellId) -> u8 {
    case_of(samples, &corner_nodes(samples.spec(), cell))
}

#[inline]
fn case_of(samples: &GridSamples, nodes: &[NodeId; 8]) -> u8 {
    nodes
        .iter()
        .enumerate()
        .filter(|&(_, &n)| !samples.is_inside(n))
        .fold(0u8, |case, (i, _)| case | (1 << i))
}

/// Polygonises `cell` into `out`, replacing its contents. Returns the vertex count.
pub fn polygonise_cell(ctx: &CellContext<'_>, cell: CellId, out: &mut CellVertices) -> usize {
    out.clear();
    let nodes = corner_nodes(ctx.samples.spec(), cell);
    let case = case_of(ctx.samples, &nodes);
    if case == 0 || case == 255 {
        return 0;
    }

    let crossed = EDGE_TABLE[case as usize];
    let mut edge_vertices = [TVertex::default(); 12];
    for (e, [ca, cb]) in EDGE_CORNERS.iter().enumerate() {
        if crossed & (1 << e) != 0 {
            edge_vertices[e] = edge_vertex(ctx, nodes[*ca], nodes[*cb]);
        }
    }

    for [e1, e2, e3] in triangles(case) {
        let (v1, v2, v3) = (edge_vertices[e1], edge_vertices[e2], edge_vertices[e3]);
        match ctx.style {
            DrawStyle::Triangle | DrawStyle::Point => {
                out.push(v1);
                out.push(v2);
                out.push(v3);
            }
            DrawStyle::Line => {
                for v in [v1, v2, v1, v3, v2, v3] {
                    out.push(v);
                }
            }
        }
    }
    out.len()
}

/// Interpolated vertex on the edge joining nodes `n0` and `n1`.
///
/// Endpoints are ordered by node index first so both cells sharing the edge produce
/// bit-identical vertices.
fn edge_vertex(ctx: &CellContext<'_>, n0: NodeId, n1: NodeId) -> TVertex {
    let (a, b) = if n0 < n1 { (n0, n1) } else { (n1, n0) };
    let samples = ctx.samples;
    let (fa, fb) = (samples.field_sample(a), samples.field_sample(b));
    let t = (samples.iso_value() - fa.value) / (fb.value - fa.value);
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.5 };

    let pos = ctx.lattice.position(a).lerp(ctx.lattice.position(b), t);
    let nrm = ctx.model.surface_normal(pos);
    let flux = lerp(fa.gradient.length(), fb.gradient.length(), t);
    let inside = if t < 0.5 {
        samples.is_inside(a)
    } else {
        samples.is_inside(b)
    };
    let tex_color = match ctx.style {
        DrawStyle::Triangle => {
            let uv: Vec3 = ctx
                .lattice
                .parametric_node(a)
                .lerp(ctx.lattice.parametric_node(b), t);
            Vec4::new(uv.x, uv.y, 0.0, 0.0)
        }
        DrawStyle::Line => LINE_COLOR,
        DrawStyle::Point => flux_color(flux),
    };

    TVertex {
        pos,
        nrm,
        tex_color,
        flux,
        inside,
    }
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
