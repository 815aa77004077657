//! Double-buffered vertex output.
//!
//! The compute pass fills [`FrameBuffers::back`] while the renderer consumes
//! [`FrameBuffers::front`]; [`FrameBuffers::swap`] flips the roles once a pass completes.
use crate::frame::DrawStyle;
use crate::grid::GridSpec;
use crate::stream::{worst_case_vertices, VertexStream};

#[derive(Debug)]
pub struct FrameBuffers {
    streams: [VertexStream; 2],
    front: usize,
    frames: u64,
}

impl FrameBuffers {
    /// Two streams of `capacity` vertices each.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            streams: [
                VertexStream::with_capacity(capacity),
                VertexStream::with_capacity(capacity),
            ],
            front: 0,
            frames: 0,
        }
    }

    /// Sized for the worst case of any draw style over `spec`.
    pub fn for_grid(spec: &GridSpec) -> Self {
        let capacity = [DrawStyle::Point, DrawStyle::Line, DrawStyle::Triangle]
            .into_iter()
            .map(|style| worst_case_vertices(spec, style))
            .max()
            .unwrap_or(0);
        Self::with_capacity(capacity)
    }

    /// Stream holding the last completed frame.
    pub fn front(&self) -> &VertexStream {
        &self.streams[self.front]
    }

    /// Stream the next pass writes into.
    pub fn back(&self) -> &VertexStream {
        &self.streams[1 - self.front]
    }

    /// Publishes the back stream as the new front.
    pub fn swap(&mut self) {
        self.front = 1 - self.front;
        self.frames += 1;
    }

    /// Number of swaps performed.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn capacity(&self) -> usize {
        self.streams[0].capacity()
    }
}
