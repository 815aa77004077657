//! Vertex Stream Writer.
//!
//! Concurrent producers reserve a contiguous range of output slots with a single atomic
//! fetch-and-add on the shared [`Counter`], then fill that range without further
//! synchronization. Storage is a flat buffer of `AtomicU32` words laid out as consecutive
//! [`GpuVertex`] records, so the contents can be uploaded to a graphics API as is.
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use glam::{Vec3, Vec4};

use crate::frame::DrawStyle;
use crate::gpu::{GpuCounter, GpuVertex, VERTEX_WORDS};
use crate::grid::GridSpec;

pub mod buffers;

pub use buffers::FrameBuffers;

/// One streamed mesh vertex.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TVertex {
    pub pos: Vec3,
    /// Unit outward normal.
    pub nrm: Vec3,
    /// Texture coordinate in `xy` when `w == 0`, literal RGBA otherwise.
    pub tex_color: Vec4,
    /// Visual-only gradient magnitude.
    pub flux: f32,
    /// Whether the vertex lies on the inside side of its edge.
    pub inside: bool,
}

impl TVertex {
    /// `true` when `tex_color` carries a texture coordinate rather than a color.
    #[inline]
    pub fn is_textured(&self) -> bool {
        self.tex_color.w == 0.0
    }
}

/// Number of vertices emitted so far in the current pass.
#[derive(Debug, Default)]
pub struct Counter(AtomicU32);

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn load(&self) -> u32 {
        self.0.load(Ordering::Acquire)
    }

    pub fn reset(&self) {
        self.0.store(0, Ordering::Release);
    }

    /// Reserves `n` slots, returning the first reserved index.
    #[inline]
    pub fn fetch_add(&self, n: u32) -> u32 {
        self.0.fetch_add(n, Ordering::Relaxed)
    }
}

/// Worst-case vertex count for one pass over `spec` in `style`.
pub fn worst_case_vertices(spec: &GridSpec, style: DrawStyle) -> usize {
    spec.node_count()
        .saturating_mul(style.max_vertices_per_cell())
}

/// Fixed-capacity, append-only vertex buffer shared by all tasks of a pass.
#[derive(Debug)]
pub struct VertexStream {
    words: Box<[AtomicU32]>,
    capacity: usize,
    counter: Counter,
    /// End of the highest range written so far.
    committed: AtomicU32,
    overflowed: AtomicBool,
}

impl VertexStream {
    /// Largest capacity addressable through the 32-bit counter.
    pub const MAX_CAPACITY: usize = u32::MAX as usize;

    /// Allocates room for `capacity` vertices (clamped to [`Self::MAX_CAPACITY`]).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.min(Self::MAX_CAPACITY);
        let words = (0..capacity * VERTEX_WORDS)
            .map(|_| AtomicU32::new(0))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            words,
            capacity,
            counter: Counter::new(),
            committed: AtomicU32::new(0),
            overflowed: AtomicBool::new(false),
        }
    }

    /// Allocates the worst case for a pass over `spec` in `style`.
    pub fn for_grid(spec: &GridSpec, style: DrawStyle) -> Self {
        Self::with_capacity(worst_case_vertices(spec, style))
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Vertices written.
    ///
    /// Refused reservations still advance the reservation counter but are never counted
    /// here. Ranges that fit are always a prefix of the reservation order, so once all
    /// producers have returned this equals the number of records in the buffer.
    pub fn len(&self) -> usize {
        self.committed.load(Ordering::Acquire) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slots reserved since the last reset, refused reservations included.
    pub fn reserved(&self) -> usize {
        self.counter.load() as usize
    }

    /// Whether a reservation was refused since the last reset.
    pub fn overflowed(&self) -> bool {
        self.overflowed.load(Ordering::Acquire)
    }

    /// Rewinds the counter. Stale vertex data is left in place and overwritten by later appends.
    pub fn reset(&self) {
        self.counter.reset();
        self.committed.store(0, Ordering::Release);
        self.overflowed.store(false, Ordering::Release);
    }

    /// Reserves a contiguous range and writes `vertices` into it.
    ///
    /// Returns the base index of the range, or `None` if it does not fit. A refused
    /// reservation writes nothing and marks the stream overflowed.
    pub fn append(&self, vertices: &[TVertex]) -> Option<u32> {
        if vertices.is_empty() {
            return Some(self.committed.load(Ordering::Acquire));
        }
        let Ok(n) = u32::try_from(vertices.len()) else {
            self.overflowed.store(true, Ordering::Release);
            return None;
        };
        let base = self.counter.fetch_add(n);
        let end = base as usize + vertices.len();
        if end > self.capacity {
            self.overflowed.store(true, Ordering::Release);
            return None;
        }
        for (i, v) in vertices.iter().enumerate() {
            let record: [u32; VERTEX_WORDS] = bytemuck::cast(GpuVertex::from(*v));
            let offset = (base as usize + i) * VERTEX_WORDS;
            for (slot, word) in self.words[offset..offset + VERTEX_WORDS].iter().zip(record) {
                slot.store(word, Ordering::Relaxed);
            }
        }
        self.committed.fetch_max(end as u32, Ordering::Release);
        Some(base)
    }

    /// Raw record at `index`, if written.
    pub fn gpu_vertex(&self, index: usize) -> Option<GpuVertex> {
        if index >= self.len() {
            return None;
        }
        let offset = index * VERTEX_WORDS;
        let mut record = [0u32; VERTEX_WORDS];
        for (dst, src) in record.iter_mut().zip(&self.words[offset..offset + VERTEX_WORDS]) {
            *dst = src.load(Ordering::Relaxed);
        }
        Some(bytemuck::cast(record))
    }

    pub fn get(&self, index: usize) -> Option<TVertex> {
        self.gpu_vertex(index).map(TVertex::from)
    }

    /// Copies out the written records in GPU layout.
    pub fn gpu_vertices(&self) -> Vec<GpuVertex> {
        (0..self.len()).filter_map(|i| self.gpu_vertex(i)).collect()
    }

    /// Copies out the written vertices.
    pub fn vertices(&self) -> Vec<TVertex> {
        (0..self.len()).filter_map(|i| self.get(i)).collect()
    }

    /// Counter value in GPU layout.
    pub fn counter(&self) -> GpuCounter {
        GpuCounter {
            count: self.len() as u32,
        }
    }
}
