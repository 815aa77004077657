//! Cache for built lattices.
//!
//! Node placement only depends on the grid spec and the frame's `base`/`rot`. The cache
//! keeps the last built [`Lattice`] and rebuilds it when that fingerprint changes, so a
//! static camera-less scene pays for placement once.
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use glam::{Vec2, Vec3};

use crate::grid::{GridSpec, Lattice};

struct LatticeEntry {
    lattice: Lattice,
    fingerprint: u64,
}

/// Single-entry lattice cache invalidated by placement fingerprint.
#[derive(Default)]
pub struct LatticeCache {
    entry: Option<LatticeEntry>,
    rebuilds: u64,
}

impl LatticeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached lattice if it matches, building it otherwise.
    ///
    /// The flag is `true` when the lattice was (re)built by this call.
    pub fn get_or_build(&mut self, spec: GridSpec, base: Vec3, rot: Vec2) -> (&Lattice, bool) {
        let fp = fingerprint(&spec, base, rot);
        let rebuilt = match &self.entry {
            Some(entry) => entry.fingerprint != fp,
            None => true,
        };
        if rebuilt {
            self.rebuilds += 1;
        }
        let entry = match self.entry.take() {
            Some(entry) if !rebuilt => entry,
            _ => LatticeEntry {
                lattice: Lattice::build(spec, base, rot),
                fingerprint: fp,
            },
        };
        let entry = self.entry.insert(entry);
        (&entry.lattice, rebuilt)
    }

    /// Cached lattice, if any.
    pub fn get(&self) -> Option<&Lattice> {
        self.entry.as_ref().map(|e| &e.lattice)
    }

    /// Total builds performed.
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    pub fn clear(&mut self) {
        self.entry = None;
    }
}

fn fingerprint(spec: &GridSpec, base: Vec3, rot: Vec2) -> u64 {
    let mut hasher = DefaultHasher::new();
    spec.span.hash(&mut hasher);
    spec.spacing.to_bits().hash(&mut hasher);
    for c in base.to_array() {
        c.to_bits().hash(&mut hasher);
    }
    for c in rot.to_array() {
        c.to_bits().hash(&mut hasher);
    }
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reuses_lattice_while_placement_is_unchanged() {
        let mut cache = LatticeCache::new();
        let spec = GridSpec::new(4);
        let (_, built) = cache.get_or_build(spec, Vec3::ZERO, Vec2::ZERO);
        assert!(built);
        let (_, built) = cache.get_or_build(spec, Vec3::ZERO, Vec2::ZERO);
        assert!(!built);
        assert_eq!(cache.rebuilds(), 1);
    }

    #[test]
    fn rebuilds_when_rotation_or_spec_change() {
        let mut cache = LatticeCache::new();
        let spec = GridSpec::new(4);
        cache.get_or_build(spec, Vec3::ZERO, Vec2::ZERO);
        let (lattice, built) = cache.get_or_build(spec, Vec3::ZERO, Vec2::new(0.006, 0.0075));
        assert!(built);
        assert_eq!(lattice.rot(), Vec2::new(0.006, 0.0075));
        let (lattice, built) = cache.get_or_build(GridSpec::new(5), Vec3::ZERO, Vec2::ZERO);
        assert!(built);
        assert_eq!(lattice.positions().len(), 125);
        assert_eq!(cache.rebuilds(), 3);
    }

    #[test]
    fn clear_forces_rebuild() {
        let mut cache = LatticeCache::new();
        cache.get_or_build(GridSpec::new(3), Vec3::ONE, Vec2::ZERO);
        cache.clear();
        assert!(cache.get().is_none());
        let (_, built) = cache.get_or_build(GridSpec::new(3), Vec3::ONE, Vec2::ZERO);
        assert!(built);
    }
}
