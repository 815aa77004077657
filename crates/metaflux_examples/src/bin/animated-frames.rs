use metaflux::prelude::*;
use metaflux_examples::{init_tracing, orbit_camera, Canvas, RenderConfig};

const FRAMES: usize = 12;
const STEPS_PER_FRAME: usize = 25;

fn main() -> anyhow::Result<()> {
    init_tracing();

    let grid = GridSpec::new(GSPAN).with_spacing(0.3);
    let animator = BallAnimator::seeded(BCOUNT, grid.extent() * 0.3, 7)?.with_spin(true);
    let mut pass = IsoPass::try_new(PassConfig::new(grid))?;
    let mut buffers = FrameBuffers::for_grid(&grid);
    let rc = RenderConfig::new((640, 640));

    let mut control = FrameControl::default();
    let mut light_angle = 0.0f32;
    let mut events = VecSink::new();

    for frame in 0..FRAMES {
        for _ in 0..STEPS_PER_FRAME {
            animator.advance(&mut control);
            light_angle += LIGHT_ANGLE_STEP;
        }
        // Sweep the iso-value up and down within its allowed range.
        control.adjust_iso(if frame < FRAMES / 2 { 0.01 } else { -0.01 });

        let balls = animator.balls(&control)?;
        let result = pass.run_with_events(&balls, &control, buffers.back(), &mut events)?;
        buffers.swap();

        let uniforms = Uniforms::new(orbit_camera(grid.extent(), 0.5, rc.aspect()))
            .with_orbiting_light(light_angle);
        let cage = pass
            .cache()
            .get()
            .map(Lattice::cage_vertices)
            .unwrap_or_default();
        let mut canvas = Canvas::new(rc.clone());
        canvas.draw(&buffers.front().vertices(), result.draw_style, &uniforms);
        canvas.draw(&cage, DrawStyle::Line, &uniforms);
        canvas.draw(
            &balls.marker_vertices(),
            DrawStyle::Point,
            &uniforms.with_point_size(6.0),
        );
        canvas.save(format!("animated-frame-{frame:02}.png"))?;
    }

    let rebuilds = events
        .as_slice()
        .iter()
        .filter(|e| matches!(e, PassEvent::LatticeRebuilt { .. }))
        .count();
    tracing::info!(
        "{} frames, {} events, {} lattice rebuilds",
        buffers.frames(),
        events.len(),
        rebuilds
    );
    Ok(())
}
