use std::fs;

use glam::Vec3;
use metaflux::prelude::*;
use metaflux_examples::init_tracing;

fn main() -> anyhow::Result<()> {
    init_tracing();

    // Produces the exact byte images a graphics backend would upload.
    let grid = GridSpec::new(20).with_spacing(0.5);
    let balls = BallSet::try_from_slice(&[
        BallData::new(Vec3::new(-1.0, 0.0, 0.0), 0.5),
        BallData::new(Vec3::new(1.0, 0.0, 0.0), 0.5),
    ])?;
    let control = FrameControl::new(0.2);

    let mut pass = IsoPass::try_new(PassConfig::new(grid))?;
    let stream = pass.stream_for(control.draw_style);
    pass.run(&balls, &control, &stream)?;

    let vertices = stream.gpu_vertices();
    let counter = stream.counter();
    let gpu_balls: [GpuBall; BCOUNT] = (&balls).into();
    let gpu_control = GpuFrameControl::from(&control);
    let gpu_uniforms = GpuUniforms::from(&Uniforms::default());

    fs::write("vertices.bin", bytemuck::cast_slice::<GpuVertex, u8>(&vertices))?;
    fs::write("counter.bin", bytemuck::bytes_of(&counter))?;
    fs::write("balls.bin", bytemuck::cast_slice::<GpuBall, u8>(&gpu_balls))?;
    fs::write("control.bin", bytemuck::bytes_of(&gpu_control))?;
    fs::write("uniforms.bin", bytemuck::bytes_of(&gpu_uniforms))?;

    tracing::info!(
        "wrote {} vertices ({} bytes)",
        counter.count,
        vertices.len() * std::mem::size_of::<GpuVertex>()
    );
    Ok(())
}
