//! Grid Sampler: evaluates the field at every lattice node.
use glam::{Quat, Vec3};
use rayon::prelude::*;

use crate::field::{FieldModel, FieldSample};
use crate::grid::{GridSpec, Lattice, NodeId};
use crate::pass::Execution;

/// Field values and inside/outside classification for every node of a lattice.
#[derive(Clone, Debug, PartialEq)]
pub struct GridSamples {
    spec: GridSpec,
    rotation: Quat,
    iso_value: f32,
    values: Vec<f32>,
    inside: Vec<bool>,
}

impl GridSamples {
    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    pub fn iso_value(&self) -> f32 {
        self.iso_value
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    #[inline]
    pub fn value(&self, node: NodeId) -> f32 {
        self.values[node]
    }

    /// `value >= iso_value`; ties count as inside.
    #[inline]
    pub fn is_inside(&self, node: NodeId) -> bool {
        self.inside[node]
    }

    pub fn inside_count(&self) -> usize {
        self.inside.iter().filter(|&&b| b).count()
    }

    /// Finite-difference field gradient at `node` in world space.
    ///
    /// Central differences in the interior, one-sided on the lattice border.
    pub fn gradient(&self, node: NodeId) -> Vec3 {
        let coords = self.spec.node_coords(node);
        let mut local = [0.0f32; 3];
        for (axis, g) in local.iter_mut().enumerate() {
            let (lo, hi) = self.axis_neighbours(coords, axis);
            let lo_node = self.neighbour(coords, axis, lo);
            let hi_node = self.neighbour(coords, axis, hi);
            let steps = (hi - lo) as f32;
            *g = (self.values[hi_node] - self.values[lo_node]) / (steps * self.spec.spacing);
        }
        self.rotation * Vec3::from_array(local)
    }

    /// Sampled value and finite-difference gradient at `node`.
    pub fn field_sample(&self, node: NodeId) -> FieldSample {
        FieldSample {
            value: self.values[node],
            gradient: self.gradient(node),
        }
    }

    fn axis_neighbours(&self, coords: [usize; 3], axis: usize) -> (usize, usize) {
        let c = coords[axis];
        let lo = c.saturating_sub(1);
        let hi = (c + 1).min(self.spec.span - 1);
        (lo, hi)
    }

    fn neighbour(&self, coords: [usize; 3], axis: usize, at: usize) -> NodeId {
        let mut c = coords;
        c[axis] = at;
        self.spec.node_index(c[0], c[1], c[2])
    }
}

/// Evaluates `model` at every node of `lattice` and classifies against `iso_value`.
pub fn sample_grid(
    model: &FieldModel,
    lattice: &Lattice,
    iso_value: f32,
    execution: Execution,
) -> GridSamples {
    let values: Vec<f32> = match execution {
        Execution::Parallel => lattice
            .positions()
            .par_iter()
            .map(|&p| model.evaluate(p))
            .collect(),
        Execution::Sequential => lattice
            .positions()
            .iter()
            .map(|&p| model.evaluate(p))
            .collect(),
    };
    let inside = values.iter().map(|&v| v >= iso_value).collect();
    GridSamples {
        spec: *lattice.spec(),
        rotation: lattice.rotation(),
        iso_value,
        values,
        inside,
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::field::{BallData, BallSet, FieldKernel};

    fn one_ball_model(center: Vec3) -> FieldModel {
        let balls = BallSet::try_from_slice(&[BallData::new(center, 1.0)]).unwrap();
        FieldModel::new(balls, FieldKernel::default())
    }

    #[test]
    fn parallel_and_sequential_sampling_agree() {
        let lattice = Lattice::build(GridSpec::new(9), Vec3::ZERO, Vec2::new(0.3, 0.2));
        let model = one_ball_model(Vec3::new(0.5, -0.25, 1.0));
        let a = sample_grid(&model, &lattice, 0.1, Execution::Parallel);
        let b = sample_grid(&model, &lattice, 0.1, Execution::Sequential);
        assert_eq!(a, b);
    }

    #[test]
    fn ties_classify_as_inside() {
        let lattice = Lattice::build(GridSpec::new(3), Vec3::ZERO, Vec2::ZERO);
        let model = one_ball_model(Vec3::ZERO);
        let center = lattice.spec().node_index(1, 1, 1);
        let probe = sample_grid(&model, &lattice, 0.0, Execution::Sequential);
        let exact = probe.value(center);
        let samples = sample_grid(&model, &lattice, exact, Execution::Sequential);
        assert!(samples.is_inside(center));
        assert_eq!(samples.inside_count(), 1);
    }

    #[test]
    fn empty_field_is_all_outside_for_positive_iso() {
        let lattice = Lattice::build(GridSpec::new(4), Vec3::ZERO, Vec2::ZERO);
        let samples = sample_grid(&FieldModel::default(), &lattice, 0.02, Execution::Parallel);
        assert_eq!(samples.inside_count(), 0);
        assert!(samples.values().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn gradient_points_toward_ball() {
        let spec = GridSpec::new(11);
        let lattice = Lattice::build(spec, Vec3::ZERO, Vec2::ZERO);
        let model = one_ball_model(Vec3::ZERO);
        let samples = sample_grid(&model, &lattice, 0.02, Execution::Sequential);
        // Node (8,5,5) sits at x = +3; the field increases toward the origin.
        let g = samples.gradient(spec.node_index(8, 5, 5));
        assert!(g.x < 0.0);
        assert!(g.y.abs() < 1e-6 && g.z.abs() < 1e-6);
        let analytic = model.gradient(lattice.position(spec.node_index(8, 5, 5)));
        assert!((g.x - analytic.x).abs() / analytic.x.abs() < 0.3);
        // Border nodes use one-sided differences and stay finite.
        assert!(samples.gradient(0).is_finite());
    }

    #[test]
    fn field_sample_pairs_value_with_gradient() {
        let spec = GridSpec::new(7);
        let lattice = Lattice::build(spec, Vec3::ZERO, Vec2::ZERO);
        let samples = sample_grid(&one_ball_model(Vec3::ZERO), &lattice, 0.02, Execution::Sequential);
        for node in [0, spec.node_index(3, 3, 3), spec.node_index(5, 2, 4)] {
            let s = samples.field_sample(node);
            assert_eq!(s.value, samples.value(node));
            assert_eq!(s.gradient, samples.gradient(node));
        }
    }

    #[test]
    fn gradient_follows_lattice_rotation() {
        let spec = GridSpec::new(11);
        let model = one_ball_model(Vec3::ZERO);
        let rot = Vec2::new(std::f32::consts::FRAC_PI_2, 0.0);
        let lattice = Lattice::build(spec, Vec3::ZERO, rot);
        let samples = sample_grid(&model, &lattice, 0.02, Execution::Sequential);
        let node = spec.node_index(8, 5, 5);
        let g = samples.gradient(node);
        let to_ball = (-lattice.position(node)).normalize();
        assert!(g.normalize().dot(to_ball) > 0.99);
    }
}
