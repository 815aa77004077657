//! The per-frame compute pass.
//!
//! A pass validates its inputs, samples the field on the lattice, polygonises every cell
//! and streams the result into a [`VertexStream`]. Cells are independent tasks; the only
//! shared mutable state is the stream's atomic counter.
use rayon::prelude::*;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::extract::{polygonise_cell, CellContext, CellVertices};
use crate::field::{BallSet, FieldKernel, FieldModel};
use crate::frame::{DrawStyle, FrameControl};
use crate::grid::{sample_grid, GridSpec, LatticeCache};
use crate::pass::events::{EventSink, PassEvent, PassEventKind};
use crate::stream::{worst_case_vertices, VertexStream};

pub mod events;

/// How node evaluation and cell dispatch are scheduled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Execution {
    /// One rayon task per node and per cell.
    #[default]
    Parallel,
    /// Scalar reference on the calling thread.
    Sequential,
}

/// Configuration for running compute passes.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PassConfig {
    /// Lattice resolution and spacing.
    pub grid: GridSpec,
    /// Ball falloff kernel.
    pub kernel: FieldKernel,
    /// Scheduling of the pass.
    pub execution: Execution,
}

impl PassConfig {
    /// Creates a new [`PassConfig`] for the given lattice.
    pub fn new(grid: GridSpec) -> Self {
        Self {
            grid,
            ..Default::default()
        }
    }

    /// Sets the lattice.
    pub fn with_grid(mut self, grid: GridSpec) -> Self {
        self.grid = grid;
        self
    }

    /// Sets the falloff kernel.
    pub fn with_kernel(mut self, kernel: FieldKernel) -> Self {
        self.kernel = kernel;
        self
    }

    /// Sets the scheduling.
    pub fn with_execution(mut self, execution: Execution) -> Self {
        self.execution = execution;
        self
    }

    /// Validates the configuration, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        self.grid.validate()?;
        self.kernel.validate()
    }
}

/// Summary of one pass.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassResult {
    /// Final counter value.
    pub vertex_count: u32,
    /// Cells whose corners were not uniformly classified.
    pub active_cells: usize,
    /// Nodes classified inside.
    pub inside_nodes: usize,
    /// Layout of the streamed vertices.
    pub draw_style: DrawStyle,
    /// Whether node positions were rebuilt for this pass.
    pub lattice_rebuilt: bool,
}

/// Owns a pass configuration and the lattice cache reused across frames.
pub struct IsoPass {
    /// Pass configuration applied to every run.
    pub config: PassConfig,
    cache: LatticeCache,
}

impl IsoPass {
    pub fn try_new(config: PassConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cache: LatticeCache::new(),
        })
    }

    pub fn new(config: PassConfig) -> Self {
        debug_assert!(config.grid.span >= 2, "span must be >= 2");
        debug_assert!(config.grid.spacing > 0.0, "spacing must be > 0");
        Self {
            config,
            cache: LatticeCache::new(),
        }
    }

    pub fn cache(&self) -> &LatticeCache {
        &self.cache
    }

    /// Stream sized for the worst case of this pass in `style`.
    pub fn stream_for(&self, style: DrawStyle) -> VertexStream {
        VertexStream::for_grid(&self.config.grid, style)
    }

    /// Runs one pass, writing into `stream`.
    pub fn run(
        &mut self,
        balls: &BallSet,
        control: &FrameControl,
        stream: &VertexStream,
    ) -> Result<PassResult> {
        run_pass(&self.config, &mut self.cache, balls, control, stream, None)
    }

    pub fn run_with_events(
        &mut self,
        balls: &BallSet,
        control: &FrameControl,
        stream: &VertexStream,
        sink: &mut dyn EventSink,
    ) -> Result<PassResult> {
        run_pass(
            &self.config,
            &mut self.cache,
            balls,
            control,
            stream,
            Some(sink),
        )
    }
}

/// Runs one compute pass.
///
/// Fails before touching `stream` if the configuration or control state is invalid or if
/// `stream` cannot hold the worst-case output.
pub fn run_pass(
    config: &PassConfig,
    cache: &mut LatticeCache,
    balls: &BallSet,
    control: &FrameControl,
    stream: &VertexStream,
    sink: Option<&mut dyn EventSink>,
) -> Result<PassResult> {
    if let Some(s) = sink {
        run_pass_internal(config, cache, balls, control, stream, s)
    } else {
        run_pass_internal(config, cache, balls, control, stream, &mut ())
    }
}

fn run_pass_internal(
    config: &PassConfig,
    cache: &mut LatticeCache,
    balls: &BallSet,
    control: &FrameControl,
    stream: &VertexStream,
    sink: &mut dyn EventSink,
) -> Result<PassResult> {
    config.validate()?;
    control.validate()?;

    let required = worst_case_vertices(&config.grid, control.draw_style);
    if required > stream.capacity() {
        return Err(Error::Capacity {
            required,
            capacity: stream.capacity(),
        });
    }
    stream.reset();

    let active_balls = balls.active_count();
    if sink.wants(PassEventKind::PassStarted) {
        sink.send(PassEvent::PassStarted {
            config: *config,
            control: *control,
            active_balls,
        });
    }
    if active_balls == 0 {
        warn!("No active balls; the field is zero everywhere.");
        if sink.wants(PassEventKind::Warning) {
            sink.send(PassEvent::Warning {
                context: "field".into(),
                message: "No active balls; the field is zero everywhere".into(),
            });
        }
    }
    if control.iso_value <= 0.0 {
        warn!(
            "iso_value {} <= 0 classifies every node inside; no surface can be extracted.",
            control.iso_value
        );
        if sink.wants(PassEventKind::Warning) {
            sink.send(PassEvent::Warning {
                context: "control".into(),
                message: format!(
                    "iso_value {} <= 0 classifies every node inside",
                    control.iso_value
                ),
            });
        }
    }

    let (lattice, lattice_rebuilt) = cache.get_or_build(config.grid, control.base, control.rot);
    if lattice_rebuilt {
        info!(
            "Rebuilt lattice: span {} base {} rot {}.",
            config.grid.span, control.base, control.rot
        );
        if sink.wants(PassEventKind::LatticeRebuilt) {
            sink.send(PassEvent::LatticeRebuilt {
                span: config.grid.span,
                base: control.base,
                rot: control.rot,
            });
        }
    }

    let model = FieldModel::new(*balls, config.kernel);
    let samples = sample_grid(&model, lattice, control.iso_value, config.execution);
    let inside_nodes = samples.inside_count();
    if sink.wants(PassEventKind::GridSampled) {
        sink.send(PassEvent::GridSampled {
            nodes: config.grid.node_count(),
            inside_nodes,
        });
    }

    let ctx = CellContext {
        model: &model,
        lattice,
        samples: &samples,
        style: control.draw_style,
    };
    let cells = config.grid.cell_count();
    let active_cells: usize = match config.execution {
        Execution::Parallel => (0..cells)
            .into_par_iter()
            .map_init(CellVertices::new, |out, cell| {
                emit_cell(&ctx, cell, out, stream)
            })
            .sum(),
        Execution::Sequential => {
            let mut out = CellVertices::new();
            (0..cells)
                .map(|cell| emit_cell(&ctx, cell, &mut out, stream))
                .sum()
        }
    };

    if stream.overflowed() {
        return Err(Error::Capacity {
            required,
            capacity: stream.capacity(),
        });
    }

    let result = PassResult {
        vertex_count: stream.counter().count,
        active_cells,
        inside_nodes,
        draw_style: control.draw_style,
        lattice_rebuilt,
    };
    debug!(
        "Pass finished: {} vertices from {} active cells ({} inside nodes).",
        result.vertex_count, result.active_cells, result.inside_nodes
    );
    if sink.wants(PassEventKind::PassFinished) {
        sink.send(PassEvent::PassFinished { result });
    }
    Ok(result)
}

/// Polygonises one cell and appends its output. Returns 1 if the cell emitted anything.
#[inline]
fn emit_cell(
    ctx: &CellContext<'_>,
    cell: usize,
    out: &mut CellVertices,
    stream: &VertexStream,
) -> usize {
    if polygonise_cell(ctx, cell, out) == 0 {
        return 0;
    }
    stream.append(out.as_slice());
    1
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};

    use glam::{Vec2, Vec3};

    use super::*;
    use crate::extract::{active_cells, count_vertices};
    use crate::field::BallData;
    use crate::grid::Lattice;
    use crate::pass::events::VecSink;
    use crate::stream::TVertex;

    fn balls(list: &[(Vec3, f32)]) -> BallSet {
        let data: Vec<BallData> = list.iter().map(|&(p, w)| BallData::new(p, w)).collect();
        BallSet::try_from_slice(&data).unwrap()
    }

    fn run(
        span: usize,
        set: &BallSet,
        control: &FrameControl,
        execution: Execution,
    ) -> (PassResult, Vec<TVertex>) {
        let config = PassConfig::new(GridSpec::new(span)).with_execution(execution);
        let mut pass = IsoPass::try_new(config).unwrap();
        let stream = pass.stream_for(control.draw_style);
        let result = pass.run(set, control, &stream).unwrap();
        (result, stream.vertices())
    }

    /// Triangles over welded vertex ids.
    fn weld(vertices: &[TVertex]) -> (usize, Vec<[usize; 3]>) {
        let mut ids: HashMap<[u32; 3], usize> = HashMap::new();
        let mut id_of = |v: &TVertex| {
            let key = v.pos.to_array().map(f32::to_bits);
            let next = ids.len();
            *ids.entry(key).or_insert(next)
        };
        let triangles = vertices
            .chunks_exact(3)
            .map(|t| [id_of(&t[0]), id_of(&t[1]), id_of(&t[2])])
            .collect();
        (ids.len(), triangles)
    }

    struct Topology {
        euler: i64,
        components: usize,
        closed: bool,
    }

    fn topology(vertices: &[TVertex]) -> Topology {
        let (vertex_count, triangles) = weld(vertices);
        let mut edges: HashMap<(usize, usize), usize> = HashMap::new();
        for t in &triangles {
            for (a, b) in [(t[0], t[1]), (t[1], t[2]), (t[2], t[0])] {
                *edges.entry((a.min(b), a.max(b))).or_default() += 1;
            }
        }
        let closed = edges.values().all(|&n| n == 2);

        let mut parent: Vec<usize> = (0..vertex_count).collect();
        fn find(parent: &mut [usize], x: usize) -> usize {
            let mut r = x;
            while parent[r] != r {
                r = parent[r];
            }
            parent[x] = r;
            r
        }
        for &(a, b) in edges.keys() {
            let (ra, rb) = (find(&mut parent, a), find(&mut parent, b));
            parent[ra] = rb;
        }
        let components = (0..vertex_count)
            .map(|v| find(&mut parent, v))
            .collect::<HashSet<_>>()
            .len();

        Topology {
            euler: vertex_count as i64 - edges.len() as i64 + triangles.len() as i64,
            components,
            closed,
        }
    }

    #[test]
    fn single_ball_yields_closed_sphere() {
        let set = balls(&[(Vec3::ZERO, 4.0)]);
        let control = FrameControl::new(0.25);
        let (result, vertices) = run(20, &set, &control, Execution::Parallel);
        assert!(result.vertex_count > 0);
        assert_eq!(result.vertex_count as usize, vertices.len());
        let topo = topology(&vertices);
        assert!(topo.closed, "every welded edge must be shared by two triangles");
        assert_eq!(topo.euler, 2);
        assert_eq!(topo.components, 1);
    }

    #[test]
    fn no_balls_yield_no_vertices() {
        let control = FrameControl::new(0.02);
        let config = PassConfig::new(GridSpec::new(10));
        let mut pass = IsoPass::try_new(config).unwrap();
        let stream = pass.stream_for(control.draw_style);
        let mut sink = VecSink::new();
        let result = pass
            .run_with_events(&BallSet::empty(), &control, &stream, &mut sink)
            .unwrap();
        assert_eq!(result.vertex_count, 0);
        assert_eq!(result.active_cells, 0);
        assert!(stream.is_empty());
        assert!(sink.kinds().contains(&PassEventKind::Warning));
    }

    #[test]
    fn distant_balls_yield_two_closed_components() {
        let set = balls(&[
            (Vec3::new(-5.0, 0.3, 0.2), 1.0),
            (Vec3::new(5.0, -0.2, 0.1), 1.0),
        ]);
        let control = FrameControl::new(0.25);
        let (_, vertices) = run(20, &set, &control, Execution::Sequential);
        let topo = topology(&vertices);
        assert!(topo.closed);
        assert_eq!(topo.components, 2);
        assert_eq!(topo.euler, 4);
    }

    #[test]
    fn parallel_sequential_and_reference_counts_agree() {
        let set = balls(&[
            (Vec3::new(-1.5, 0.0, 0.5), 0.5),
            (Vec3::new(1.0, 1.0, -0.5), 0.5),
            (Vec3::new(0.0, -1.5, 0.0), 0.5),
        ]);
        for style in [DrawStyle::Point, DrawStyle::Line, DrawStyle::Triangle] {
            let control = FrameControl::new(0.1)
                .with_draw_style(style)
                .with_rot(Vec2::new(0.3, 0.1));
            let (par, par_vertices) = run(16, &set, &control, Execution::Parallel);
            let (seq, seq_vertices) = run(16, &set, &control, Execution::Sequential);
            assert_eq!(par.vertex_count, seq.vertex_count);
            assert_eq!(par.active_cells, seq.active_cells);

            let lattice = Lattice::build(GridSpec::new(16), control.base, control.rot);
            let model = FieldModel::new(set, FieldKernel::default());
            let samples = sample_grid(&model, &lattice, 0.1, Execution::Sequential);
            assert_eq!(par.vertex_count as usize, count_vertices(&samples, style));
            assert_eq!(par.active_cells, active_cells(&samples));

            // Same multiset of vertices, whatever the task order.
            let key = |v: &TVertex| v.pos.to_array().map(f32::to_bits);
            let mut a: Vec<_> = par_vertices.iter().map(key).collect();
            let mut b: Vec<_> = seq_vertices.iter().map(key).collect();
            a.sort_unstable();
            b.sort_unstable();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn normals_are_unit_length() {
        let set = balls(&[(Vec3::new(0.2, -0.1, 0.3), 1.0), (Vec3::new(1.5, 0.5, 0.0), 0.7)]);
        let control = FrameControl::new(0.3);
        let (_, vertices) = run(12, &set, &control, Execution::Parallel);
        assert!(!vertices.is_empty());
        for v in &vertices {
            assert!((v.nrm.length() - 1.0).abs() < 1e-4);
            assert!(v.pos.is_finite() && v.flux.is_finite());
        }
    }

    #[test]
    fn triangle_winding_faces_outward() {
        let set = balls(&[(Vec3::ZERO, 4.0)]);
        let control = FrameControl::new(0.25);
        let (_, vertices) = run(20, &set, &control, Execution::Parallel);
        for t in vertices.chunks_exact(3) {
            let face = (t[1].pos - t[0].pos).cross(t[2].pos - t[0].pos);
            if face.length() < 1e-6 {
                continue;
            }
            let n = t[0].nrm + t[1].nrm + t[2].nrm;
            assert!(face.dot(n) > 0.0);
        }
    }

    #[test]
    fn more_power_never_shrinks_inside_volume() {
        let control = FrameControl::new(0.2);
        let mut previous = 0;
        for power in [0.25, 0.5, 1.0, 2.0, 4.0] {
            let set = balls(&[(Vec3::new(0.1, 0.0, -0.2), power)]);
            let (result, _) = run(12, &set, &control, Execution::Parallel);
            assert!(result.inside_nodes >= previous);
            previous = result.inside_nodes;
        }
        assert!(previous > 0);
    }

    #[test]
    fn undersized_stream_is_rejected_before_dispatch() {
        let config = PassConfig::new(GridSpec::new(6));
        let mut pass = IsoPass::new(config);
        let stream = VertexStream::with_capacity(10);
        let set = balls(&[(Vec3::ZERO, 1.0)]);
        let control = FrameControl::new(0.2).with_draw_style(DrawStyle::Line);
        let err = pass.run(&set, &control, &stream).unwrap_err();
        assert!(matches!(
            err,
            Error::Capacity {
                required: 6480,
                capacity: 10
            }
        ));
        assert!(stream.is_empty());
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        assert!(IsoPass::try_new(PassConfig::new(GridSpec::new(1))).is_err());
        assert!(IsoPass::try_new(
            PassConfig::default().with_kernel(FieldKernel::inverse_square(0.0))
        )
        .is_err());
        let mut pass = IsoPass::new(PassConfig::new(GridSpec::new(4)));
        let stream = pass.stream_for(DrawStyle::Triangle);
        let control = FrameControl::new(f32::NAN);
        assert!(matches!(
            pass.run(&BallSet::empty(), &control, &stream),
            Err(Error::InvalidControl(_))
        ));
    }

    #[test]
    fn events_follow_pass_order_and_lattice_is_cached() {
        let mut pass = IsoPass::new(PassConfig::new(GridSpec::new(8)));
        let set = balls(&[(Vec3::ZERO, 1.0)]);
        let control = FrameControl::new(0.25);
        let stream = pass.stream_for(control.draw_style);

        let mut sink = VecSink::new();
        let first = pass
            .run_with_events(&set, &control, &stream, &mut sink)
            .unwrap();
        assert!(first.lattice_rebuilt);
        assert_eq!(
            sink.kinds(),
            vec![
                PassEventKind::PassStarted,
                PassEventKind::LatticeRebuilt,
                PassEventKind::GridSampled,
                PassEventKind::PassFinished
            ]
        );

        sink.clear();
        let second = pass
            .run_with_events(&set, &control, &stream, &mut sink)
            .unwrap();
        assert!(!second.lattice_rebuilt);
        assert!(!sink.kinds().contains(&PassEventKind::LatticeRebuilt));
        assert_eq!(first.vertex_count, second.vertex_count);
        assert_eq!(pass.cache().rebuilds(), 1);
    }

    #[test]
    fn repeated_passes_reset_the_counter() {
        let mut pass = IsoPass::new(PassConfig::new(GridSpec::new(8)));
        let set = balls(&[(Vec3::ZERO, 1.0)]);
        let stream = pass.stream_for(DrawStyle::Triangle);
        let a = pass.run(&set, &FrameControl::new(0.25), &stream).unwrap();
        let b = pass.run(&set, &FrameControl::new(0.25), &stream).unwrap();
        assert_eq!(a.vertex_count, b.vertex_count);
        assert_eq!(stream.len(), b.vertex_count as usize);
    }
}
