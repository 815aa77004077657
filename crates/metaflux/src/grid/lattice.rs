//! World-space placement of the sampling lattice.
//!
//! The lattice is a cube of `span³` nodes centred on `base`. Its local frame is rotated by
//! yaw `rot.x` about Y followed by pitch `rot.y` about X.
use glam::{Quat, Vec2, Vec3, Vec4};

use crate::field::FALLBACK_NORMAL;
use crate::grid::{GridSpec, NodeId};
use crate::stream::TVertex;

/// Literal color of the bounding cage.
pub const CAGE_COLOR: Vec4 = Vec4::new(0.4, 0.5, 0.4, 1.0);

/// Node positions for one placement of a [`GridSpec`].
#[derive(Clone, Debug, PartialEq)]
pub struct Lattice {
    spec: GridSpec,
    base: Vec3,
    rot: Vec2,
    rotation: Quat,
    positions: Vec<Vec3>,
}

/// Rotation applied to the lattice's local frame for `rot`.
#[inline]
pub fn lattice_rotation(rot: Vec2) -> Quat {
    Quat::from_rotation_y(rot.x) * Quat::from_rotation_x(rot.y)
}

impl Lattice {
    pub fn build(spec: GridSpec, base: Vec3, rot: Vec2) -> Self {
        let rotation = lattice_rotation(rot);
        let half = spec.cells_per_axis() as f32 * 0.5;
        let mut positions = Vec::with_capacity(spec.node_count());
        for z in 0..spec.span {
            for y in 0..spec.span {
                for x in 0..spec.span {
                    let local = (Vec3::new(x as f32, y as f32, z as f32) - Vec3::splat(half))
                        * spec.spacing;
                    positions.push(base + rotation * local);
                }
            }
        }
        Self {
            spec,
            base,
            rot,
            rotation,
            positions,
        }
    }

    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    pub fn base(&self) -> Vec3 {
        self.base
    }

    pub fn rot(&self) -> Vec2 {
        self.rot
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// World positions in node-index order.
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    #[inline]
    pub fn position(&self, node: NodeId) -> Vec3 {
        self.positions[node]
    }

    /// Lattice-parametric coordinate of `node`, each component in `[0, 1]`.
    #[inline]
    pub fn parametric_node(&self, node: NodeId) -> Vec3 {
        let [x, y, z] = self.spec.node_coords(node);
        Vec3::new(x as f32, y as f32, z as f32) / self.spec.cells_per_axis() as f32
    }

    /// Line-list outline of the lattice: the 12 box edges plus the two mid-lines of
    /// each z face.
    pub fn cage_vertices(&self) -> Vec<TVertex> {
        let h = 0.5;
        let corner = |x: f32, y: f32, z: f32| Vec3::new(x, y, z);
        let segments = [
            // z = -h face
            (corner(-h, -h, -h), corner(h, -h, -h)),
            (corner(h, -h, -h), corner(h, h, -h)),
            (corner(h, h, -h), corner(-h, h, -h)),
            (corner(-h, h, -h), corner(-h, -h, -h)),
            // z = +h face
            (corner(-h, -h, h), corner(h, -h, h)),
            (corner(h, -h, h), corner(h, h, h)),
            (corner(h, h, h), corner(-h, h, h)),
            (corner(-h, h, h), corner(-h, -h, h)),
            // connecting edges
            (corner(-h, -h, -h), corner(-h, -h, h)),
            (corner(h, -h, -h), corner(h, -h, h)),
            (corner(h, h, -h), corner(h, h, h)),
            (corner(-h, h, -h), corner(-h, h, h)),
            // mid-lines
            (corner(0.0, -h, -h), corner(0.0, h, -h)),
            (corner(-h, 0.0, -h), corner(h, 0.0, -h)),
            (corner(0.0, -h, h), corner(0.0, h, h)),
            (corner(-h, 0.0, h), corner(h, 0.0, h)),
        ];
        let extent = self.spec.extent();
        let to_world = |unit: Vec3| self.base + self.rotation * (unit * extent);
        segments
            .iter()
            .flat_map(|&(a, b)| [a, b])
            .map(|unit| TVertex {
                pos: to_world(unit),
                nrm: FALLBACK_NORMAL,
                tex_color: CAGE_COLOR,
                flux: 0.0,
                inside: false,
            })
            .collect()
    }
}
