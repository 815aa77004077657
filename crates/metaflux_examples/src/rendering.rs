use std::path::Path;

use glam::{Mat4, Vec2, Vec3, Vec4};
use image::{Rgb, RgbImage};
use metaflux::frame::{DrawStyle, Uniforms};
use metaflux::stream::TVertex;
use tracing_subscriber::EnvFilter;

/// Installs a stderr subscriber honouring `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// View-projection looking at the origin from a camera circling at `yaw`.
///
/// `extent` is the lattice edge length; the camera backs off far enough to frame it.
pub fn orbit_camera(extent: f32, yaw: f32, aspect: f32) -> Mat4 {
    let distance = extent * 1.6;
    let eye = Vec3::new(yaw.sin() * distance, extent * 0.6, yaw.cos() * distance);
    let view = Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y);
    let proj = Mat4::perspective_rh(45f32.to_radians(), aspect, 0.1, distance * 4.0);
    proj * view
}

#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub image_size: (u32, u32),
    pub background: [u8; 3],
    /// Base color of textured surfaces, alternated with a darker tone in a checker pattern.
    pub surface_color: [u8; 3],
    pub checker_cells: f32,
}

impl RenderConfig {
    pub fn new(image_size: (u32, u32)) -> Self {
        Self {
            image_size,
            background: [18, 20, 26],
            surface_color: [230, 190, 120],
            checker_cells: 8.0,
        }
    }

    pub fn with_background(mut self, background: [u8; 3]) -> Self {
        self.background = background;
        self
    }

    pub fn with_surface_color(mut self, surface_color: [u8; 3]) -> Self {
        self.surface_color = surface_color;
        self
    }

    pub fn aspect(&self) -> f32 {
        self.image_size.0 as f32 / self.image_size.1.max(1) as f32
    }
}

struct Projected {
    px: Vec2,
    depth: f32,
}

/// Depth-tested RGB target for the three draw styles.
pub struct Canvas {
    image: RgbImage,
    depth: Vec<f32>,
    config: RenderConfig,
}

impl Canvas {
    pub fn new(config: RenderConfig) -> Self {
        let (w, h) = config.image_size;
        let image = RgbImage::from_pixel(w, h, Rgb(config.background));
        Self {
            image,
            depth: vec![f32::INFINITY; (w * h) as usize],
            config,
        }
    }

    /// Draws `vertices` assembled as `style` primitives.
    pub fn draw(&mut self, vertices: &[TVertex], style: DrawStyle, uniforms: &Uniforms) {
        match style {
            DrawStyle::Triangle => {
                for tri in vertices.chunks_exact(3) {
                    self.triangle(tri, uniforms);
                }
            }
            DrawStyle::Line => {
                for seg in vertices.chunks_exact(2) {
                    self.line(&seg[0], &seg[1], uniforms);
                }
            }
            DrawStyle::Point => {
                for v in vertices {
                    self.point(v, uniforms);
                }
            }
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        self.image.save(path.as_ref())?;
        Ok(())
    }

    fn project(&self, pos: Vec3, mvp: &Mat4) -> Option<Projected> {
        let clip = *mvp * pos.extend(1.0);
        if clip.w <= 1e-6 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        let (w, h) = self.config.image_size;
        Some(Projected {
            px: Vec2::new(
                (ndc.x * 0.5 + 0.5) * w as f32,
                (0.5 - ndc.y * 0.5) * h as f32,
            ),
            depth: ndc.z,
        })
    }

    fn plot(&mut self, x: i64, y: i64, depth: f32, color: [u8; 3]) {
        let (w, h) = self.config.image_size;
        if x < 0 || y < 0 || x >= w as i64 || y >= h as i64 {
            return;
        }
        let idx = (y as u32 * w + x as u32) as usize;
        if depth < self.depth[idx] {
            self.depth[idx] = depth;
            self.image.put_pixel(x as u32, y as u32, Rgb(color));
        }
    }

    fn shade(&self, base: Vec3, pos: Vec3, nrm: Vec3, light: Vec3) -> [u8; 3] {
        let l = (light - pos).normalize_or_zero();
        let lambert = nrm.dot(l).max(0.0);
        let c = base * (0.25 + 0.75 * lambert);
        to_rgb(c.extend(1.0))
    }

    fn textured_base(&self, uv: Vec2) -> Vec3 {
        let n = self.config.checker_cells;
        let checker = ((uv.x * n).floor() + (uv.y * n).floor()) as i64 % 2 == 0;
        let [r, g, b] = self.config.surface_color;
        let base = Vec3::new(r as f32, g as f32, b as f32) / 255.0;
        if checker {
            base
        } else {
            base * 0.7
        }
    }

    fn triangle(&mut self, tri: &[TVertex], uniforms: &Uniforms) {
        let Some(p) = tri
            .iter()
            .map(|v| self.project(v.pos, &uniforms.mvp))
            .collect::<Option<Vec<_>>>()
        else {
            return;
        };
        let area = edge(p[0].px, p[1].px, p[2].px);
        if area.abs() < 1e-8 {
            return;
        }
        let min = p[0].px.min(p[1].px).min(p[2].px).floor();
        let max = p[0].px.max(p[1].px).max(p[2].px).ceil();
        let (w, h) = self.config.image_size;
        let (x0, y0) = (min.x.max(0.0) as i64, min.y.max(0.0) as i64);
        let (x1, y1) = (
            max.x.min(w as f32 - 1.0) as i64,
            max.y.min(h as f32 - 1.0) as i64,
        );
        for y in y0..=y1 {
            for x in x0..=x1 {
                let c = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let b0 = edge(p[1].px, p[2].px, c) / area;
                let b1 = edge(p[2].px, p[0].px, c) / area;
                let b2 = 1.0 - b0 - b1;
                if b0 < 0.0 || b1 < 0.0 || b2 < 0.0 {
                    continue;
                }
                let depth = b0 * p[0].depth + b1 * p[1].depth + b2 * p[2].depth;
                let pos = tri[0].pos * b0 + tri[1].pos * b1 + tri[2].pos * b2;
                let nrm = (tri[0].nrm * b0 + tri[1].nrm * b1 + tri[2].nrm * b2).normalize_or_zero();
                let base = if tri[0].is_textured() {
                    let uv = tri[0].tex_color.truncate().truncate() * b0
                        + tri[1].tex_color.truncate().truncate() * b1
                        + tri[2].tex_color.truncate().truncate() * b2;
                    self.textured_base(uv)
                } else {
                    tri[0].tex_color.truncate()
                };
                let color = self.shade(base, pos, nrm, uniforms.light);
                self.plot(x, y, depth, color);
            }
        }
    }

    fn line(&mut self, a: &TVertex, b: &TVertex, uniforms: &Uniforms) {
        let (Some(pa), Some(pb)) = (
            self.project(a.pos, &uniforms.mvp),
            self.project(b.pos, &uniforms.mvp),
        ) else {
            return;
        };
        let steps = (pb.px - pa.px).abs().max_element().ceil().max(1.0) as usize;
        let color = to_rgb(a.tex_color);
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let px = pa.px.lerp(pb.px, t);
            let depth = pa.depth + (pb.depth - pa.depth) * t;
            self.plot(px.x as i64, px.y as i64, depth, color);
        }
    }

    fn point(&mut self, v: &TVertex, uniforms: &Uniforms) {
        let Some(p) = self.project(v.pos, &uniforms.mvp) else {
            return;
        };
        let color = self.shade(v.tex_color.truncate(), v.pos, v.nrm, uniforms.light);
        let r = (uniforms.point_size * 0.5).max(0.5) as i64;
        let (cx, cy) = (p.px.x as i64, p.px.y as i64);
        for y in cy - r..=cy + r {
            for x in cx - r..=cx + r {
                self.plot(x, y, p.depth, color);
            }
        }
    }
}

/// Rasterizes `vertices` (plus optional `overlay` line list) and writes a PNG.
pub fn render_vertices_to_png(
    vertices: &[TVertex],
    style: DrawStyle,
    overlay: &[TVertex],
    uniforms: &Uniforms,
    config: &RenderConfig,
    out_path: impl AsRef<Path>,
) -> anyhow::Result<()> {
    let mut canvas = Canvas::new(config.clone());
    canvas.draw(vertices, style, uniforms);
    canvas.draw(overlay, DrawStyle::Line, uniforms);
    canvas.save(out_path)
}

fn edge(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (b - a).perp_dot(c - a)
}

fn to_rgb(c: Vec4) -> [u8; 3] {
    let c = (c.truncate().clamp(Vec3::ZERO, Vec3::ONE) * 255.0).round();
    [c.x as u8, c.y as u8, c.z as u8]
}
