use glam::Vec3;
use metaflux::prelude::*;
use metaflux_examples::{init_tracing, orbit_camera, render_vertices_to_png, RenderConfig};

fn main() -> anyhow::Result<()> {
    init_tracing();

    // Two balls far enough apart that their surfaces never touch.
    let grid = GridSpec::new(40).with_spacing(0.5);
    let balls = BallSet::try_from_slice(&[
        BallData::new(Vec3::new(-4.5, 0.0, 0.0), 1.0),
        BallData::new(Vec3::new(4.5, 0.5, 0.0), 1.0),
    ])?;

    let mut pass = IsoPass::try_new(PassConfig::new(grid))?;
    let rc = RenderConfig::new((900, 600)).with_surface_color([90, 150, 230]);
    let uniforms = Uniforms::new(orbit_camera(grid.extent(), 0.0, rc.aspect()));

    // Lower iso-values grow the blobs until they merge.
    for (i, iso) in [0.25f32, 0.1, 0.06].into_iter().enumerate() {
        let control = FrameControl::new(iso);
        let stream = pass.stream_for(control.draw_style);
        let result = pass.run(&balls, &control, &stream)?;
        tracing::info!("iso {iso}: {} vertices", result.vertex_count);
        render_vertices_to_png(
            &stream.vertices(),
            control.draw_style,
            &[],
            &uniforms,
            &rc,
            format!("two-balls-disjoint-{i}.png"),
        )?;
    }
    Ok(())
}
