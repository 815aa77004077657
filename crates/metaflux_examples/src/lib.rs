#![forbid(unsafe_code)]

mod rendering;

pub use rendering::{
    init_tracing, orbit_camera, render_vertices_to_png, Canvas, RenderConfig,
};
