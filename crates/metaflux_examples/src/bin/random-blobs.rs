use glam::Vec3;
use metaflux::prelude::*;
use metaflux_examples::{init_tracing, orbit_camera, render_vertices_to_png, RenderConfig};
use rand::rngs::StdRng;
use rand::{Rng as RngCore, SeedableRng};

fn main() -> anyhow::Result<()> {
    init_tracing();

    let grid = GridSpec::new(40).with_spacing(0.4);
    let mut rng = StdRng::seed_from_u64(42);
    let half = grid.extent() * 0.3;

    let balls: Vec<BallData> = (0..BCOUNT)
        .map(|_| {
            let pos = Vec3::new(
                signed_unit(&mut rng) * half,
                signed_unit(&mut rng) * half,
                signed_unit(&mut rng) * half,
            );
            BallData::new(pos, 0.2 + unit(&mut rng) * 0.6)
        })
        .collect();
    let balls = BallSet::try_from_slice(&balls)?;

    // Gaussian falloff gives softer blends than the default kernel.
    let config = PassConfig::new(grid).with_kernel(FieldKernel::gaussian(1.2));
    let mut pass = IsoPass::try_new(config)?;
    let control = FrameControl::new(0.3).with_draw_style(DrawStyle::Point);
    let stream = pass.stream_for(control.draw_style);

    let mut logged = 0usize;
    let mut sink = FnSink::new(|event| {
        if let PassEvent::PassFinished { result } = event {
            tracing::info!("pass finished with {} vertices", result.vertex_count);
        }
        logged += 1;
    });
    pass.run_with_events(&balls, &control, &stream, &mut sink)?;
    tracing::info!("{logged} events observed");

    let rc = RenderConfig::new((800, 800));
    let uniforms = Uniforms::new(orbit_camera(grid.extent(), 1.2, rc.aspect()))
        .with_point_size(2.0)
        .with_orbiting_light(1.2);
    render_vertices_to_png(
        &stream.vertices(),
        control.draw_style,
        &[],
        &uniforms,
        &rc,
        "random-blobs.png",
    )?;
    Ok(())
}

fn unit(rng: &mut StdRng) -> f32 {
    rng.next_u32() as f32 / u32::MAX as f32
}

fn signed_unit(rng: &mut StdRng) -> f32 {
    unit(rng) * 2.0 - 1.0
}
