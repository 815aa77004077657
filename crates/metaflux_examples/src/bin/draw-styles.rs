use glam::Vec3;
use metaflux::prelude::*;
use metaflux_examples::{init_tracing, orbit_camera, render_vertices_to_png, RenderConfig};

fn main() -> anyhow::Result<()> {
    init_tracing();

    let grid = GridSpec::new(30).with_spacing(0.5);
    let balls = BallSet::try_from_slice(&[
        BallData::new(Vec3::new(-1.5, 0.0, 0.0), 0.5),
        BallData::new(Vec3::new(1.5, 0.5, 0.0), 0.5),
        BallData::new(Vec3::new(0.0, -1.0, 1.5), 0.5),
    ])?;

    let mut pass = IsoPass::try_new(PassConfig::new(grid))?;
    // One buffer large enough for every style.
    let buffers = FrameBuffers::for_grid(&grid);
    let rc = RenderConfig::new((700, 700)).with_background([10, 10, 16]);
    let uniforms = Uniforms::new(orbit_camera(grid.extent(), 0.8, rc.aspect()))
        .with_point_size(3.0)
        .with_orbiting_light(0.8);

    let mut control = FrameControl::new(0.12);
    for _ in 0..3 {
        let result = pass.run(&balls, &control, buffers.back())?;
        tracing::info!("{:?}: {} vertices", control.draw_style, result.vertex_count);
        let name = format!("draw-styles-{:?}.png", control.draw_style).to_lowercase();
        render_vertices_to_png(
            &buffers.back().vertices(),
            control.draw_style,
            &[],
            &uniforms,
            &rc,
            name,
        )?;
        control.cycle_draw_style();
    }
    Ok(())
}
