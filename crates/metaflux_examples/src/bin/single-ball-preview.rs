use glam::Vec3;
use metaflux::prelude::*;
use metaflux_examples::{init_tracing, orbit_camera, render_vertices_to_png, RenderConfig};

fn main() -> anyhow::Result<()> {
    init_tracing();

    // One ball at the lattice center; the surface is a closed sphere.
    let grid = GridSpec::new(GSPAN).with_spacing(0.4);
    let balls = BallSet::try_from_slice(&[BallData::new(Vec3::ZERO, 4.0)])?;
    let control = FrameControl::new(0.25);

    let mut pass = IsoPass::try_new(PassConfig::new(grid))?;
    let stream = pass.stream_for(control.draw_style);
    let result = pass.run(&balls, &control, &stream)?;
    tracing::info!(
        "{} vertices from {} active cells",
        result.vertex_count,
        result.active_cells
    );

    let rc = RenderConfig::new((800, 800));
    let uniforms = Uniforms::new(orbit_camera(grid.extent(), 0.6, rc.aspect()))
        .with_orbiting_light(0.6);
    let cage = Lattice::build(grid, control.base, control.rot).cage_vertices();
    render_vertices_to_png(
        &stream.vertices(),
        control.draw_style,
        &cage,
        &uniforms,
        &rc,
        "single-ball-preview.png",
    )?;
    Ok(())
}
