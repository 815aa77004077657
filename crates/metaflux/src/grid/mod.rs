//! Cubic sampling lattice.
//!
//! [`GridSpec`] fixes the per-axis node count (GSPAN) and node spacing. Nodes and cells are
//! addressed by flat indices in x-fastest order; [`lattice::Lattice`] places them in world
//! space, [`sampler`] evaluates the field on them and [`cache::LatticeCache`] avoids
//! rebuilding node positions while placement is unchanged.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub mod cache;
pub mod lattice;
pub mod sampler;

pub use cache::LatticeCache;
pub use lattice::Lattice;
pub use sampler::{sample_grid, GridSamples};

/// Default nodes per axis.
pub const GSPAN: usize = 50;

/// Spans the design went through, smallest first.
pub const GSPAN_HISTORY: [usize; 3] = [10, 30, 50];

/// Flat node index.
pub type NodeId = usize;

/// Flat cell index.
pub type CellId = usize;

/// Lattice resolution and node spacing.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GridSpec {
    /// Nodes per axis.
    pub span: usize,
    /// Distance between neighbouring nodes in world units.
    pub spacing: f32,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            span: GSPAN,
            spacing: 1.0,
        }
    }
}

impl GridSpec {
    pub fn new(span: usize) -> Self {
        Self {
            span,
            ..Default::default()
        }
    }

    /// Sets the node spacing.
    pub fn with_spacing(mut self, spacing: f32) -> Self {
        self.spacing = spacing;
        self
    }

    /// Validates the grid, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.span < 2 {
            return Err(Error::InvalidConfig(format!(
                "span must be >= 2, got {}",
                self.span
            )));
        }
        // Indices are streamed as u32.
        if self.span > 1024 {
            return Err(Error::InvalidConfig(format!(
                "span must be <= 1024, got {}",
                self.span
            )));
        }
        if !(self.spacing.is_finite() && self.spacing > 0.0) {
            return Err(Error::InvalidConfig(
                "spacing must be finite and > 0".into(),
            ));
        }
        Ok(())
    }

    /// Cells per axis.
    #[inline]
    pub fn cells_per_axis(&self) -> usize {
        self.span.saturating_sub(1)
    }

    pub fn node_count(&self) -> usize {
        self.span * self.span * self.span
    }

    pub fn cell_count(&self) -> usize {
        let c = self.cells_per_axis();
        c * c * c
    }

    /// Edge length of the lattice cube.
    pub fn extent(&self) -> f32 {
        self.cells_per_axis() as f32 * self.spacing
    }

    /// Flat index of node `(x, y, z)`.
    #[inline]
    pub fn node_index(&self, x: usize, y: usize, z: usize) -> NodeId {
        debug_assert!(x < self.span && y < self.span && z < self.span);
        x + y * self.span + z * self.span * self.span
    }

    /// Inverse of [`GridSpec::node_index`].
    #[inline]
    pub fn node_coords(&self, node: NodeId) -> [usize; 3] {
        let s = self.span;
        [node % s, (node / s) % s, node / (s * s)]
    }

    /// Lattice coordinates of the lowest corner of `cell`.
    #[inline]
    pub fn cell_coords(&self, cell: CellId) -> [usize; 3] {
        let c = self.cells_per_axis();
        [cell % c, (cell / c) % c, cell / (c * c)]
    }

    /// Node index of the lowest corner of `cell`.
    #[inline]
    pub fn cell_origin(&self, cell: CellId) -> NodeId {
        let [x, y, z] = self.cell_coords(cell);
        self.node_index(x, y, z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_follow_span() {
        let spec = GridSpec::new(10);
        assert_eq!(spec.node_count(), 1000);
        assert_eq!(spec.cell_count(), 729);
        assert_eq!(spec.cells_per_axis(), 9);
        assert_eq!(spec.extent(), 9.0);
    }

    #[test]
    fn node_index_roundtrip() {
        let spec = GridSpec::new(7);
        let idx = spec.node_index(3, 5, 6);
        assert_eq!(idx, 3 + 5 * 7 + 6 * 49);
        assert_eq!(spec.node_coords(idx), [3, 5, 6]);
    }

    #[test]
    fn cell_origin_skips_last_node_of_each_row() {
        let spec = GridSpec::new(4);
        // Cell 3 is the first cell of the second row (3 cells per axis).
        assert_eq!(spec.cell_coords(3), [0, 1, 0]);
        assert_eq!(spec.cell_origin(3), spec.node_index(0, 1, 0));
        assert_eq!(spec.cell_origin(spec.cell_count() - 1), spec.node_index(2, 2, 2));
    }

    #[test]
    fn validate_rejects_degenerate_specs() {
        assert!(GridSpec::new(1).validate().is_err());
        assert!(GridSpec::new(10).with_spacing(0.0).validate().is_err());
        assert!(GridSpec::new(10).with_spacing(f32::NAN).validate().is_err());
        for span in GSPAN_HISTORY {
            assert!(GridSpec::new(span).validate().is_ok());
        }
    }
}
