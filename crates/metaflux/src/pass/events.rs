//! Event types and sinks for observing compute passes.
//!
//! This module defines [`PassEvent`] and a set of sinks to emit, collect, or forward events
//! while executing a pass via [`crate::pass::IsoPass`] or [`crate::pass::run_pass`].
use glam::{Vec2, Vec3};

use crate::frame::FrameControl;
use crate::pass::{PassConfig, PassResult};

/// Describes events emitted by a compute pass.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum PassEvent {
    /// Emitted when a pass starts.
    PassStarted {
        /// The pass configuration used.
        config: PassConfig,
        /// Control state for this frame.
        control: FrameControl,
        /// Balls with non-zero power.
        active_balls: usize,
    },

    /// Emitted when node positions had to be rebuilt for a new placement.
    LatticeRebuilt {
        /// Nodes per axis.
        span: usize,
        /// Lattice center.
        base: Vec3,
        /// Lattice orientation.
        rot: Vec2,
    },

    /// Emitted once every node has been evaluated and classified.
    GridSampled {
        /// Total nodes evaluated.
        nodes: usize,
        /// Nodes classified inside.
        inside_nodes: usize,
    },

    /// Emitted when all cells have been dispatched and the counter is final.
    PassFinished {
        /// Summary of the pass.
        result: PassResult,
    },

    /// Non-fatal warning generated during a pass.
    Warning {
        /// Context string (e.g. the pass stage).
        context: String,
        /// Human-readable message.
        message: String,
    },
}

/// Discriminant of [`PassEvent`], used to filter before constructing an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassEventKind {
    PassStarted,
    LatticeRebuilt,
    GridSampled,
    PassFinished,
    Warning,
}

impl PassEvent {
    pub fn kind(&self) -> PassEventKind {
        match self {
            PassEvent::PassStarted { .. } => PassEventKind::PassStarted,
            PassEvent::LatticeRebuilt { .. } => PassEventKind::LatticeRebuilt,
            PassEvent::GridSampled { .. } => PassEventKind::GridSampled,
            PassEvent::PassFinished { .. } => PassEventKind::PassFinished,
            PassEvent::Warning { .. } => PassEventKind::Warning,
        }
    }
}

/// A generic event sink that accepts [`PassEvent`]s.
pub trait EventSink {
    fn send(&mut self, event: PassEvent);

    /// Whether events of `kind` should be built and sent at all.
    #[inline]
    fn wants(&self, _kind: PassEventKind) -> bool {
        true
    }

    fn send_many<I>(&mut self, events: I)
    where
        Self: Sized,
        I: IntoIterator<Item = PassEvent>,
    {
        for e in events {
            self.send(e);
        }
    }
}

/// A no-op event sink.
impl EventSink for () {
    #[inline]
    fn send(&mut self, _event: PassEvent) {}

    #[inline]
    fn wants(&self, _kind: PassEventKind) -> bool {
        false
    }
}

/// An event sink that forwards to a user-provided closure.
pub struct FnSink<F>
where
    F: FnMut(PassEvent),
{
    f: F,
}

impl<F> FnSink<F>
where
    F: FnMut(PassEvent),
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> EventSink for FnSink<F>
where
    F: FnMut(PassEvent),
{
    #[inline]
    fn send(&mut self, event: PassEvent) {
        (self.f)(event);
    }
}

/// An event sink that collects all events in a `Vec`.
#[derive(Default)]
pub struct VecSink {
    events: Vec<PassEvent>,
}

impl VecSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            events: Vec::with_capacity(cap),
        }
    }

    pub fn into_inner(self) -> Vec<PassEvent> {
        self.events
    }

    pub fn as_slice(&self) -> &[PassEvent] {
        &self.events
    }

    /// Kinds of the collected events, in order.
    pub fn kinds(&self) -> Vec<PassEventKind> {
        self.events.iter().map(PassEvent::kind).collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSink for VecSink {
    #[inline]
    fn send(&mut self, event: PassEvent) {
        self.events.push(event);
    }
}

/// Fan-out sink that forwards each event to all contained sinks.
pub struct MultiSink<S: EventSink> {
    pub(crate) sinks: Vec<S>,
}

impl<S: EventSink> MultiSink<S> {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn with_sinks(sinks: Vec<S>) -> Self {
        Self { sinks }
    }

    pub fn push(&mut self, sink: S) {
        self.sinks.push(sink);
    }

    pub fn sinks(&self) -> &[S] {
        &self.sinks
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }
}

impl<S: EventSink> Default for MultiSink<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: EventSink> EventSink for MultiSink<S> {
    fn send(&mut self, event: PassEvent) {
        let Some(last_idx) = self.sinks.len().checked_sub(1) else {
            return;
        };
        for i in 0..last_idx {
            if self.sinks[i].wants(event.kind()) {
                self.sinks[i].send(event.clone());
            }
        }
        if self.sinks[last_idx].wants(event.kind()) {
            self.sinks[last_idx].send(event);
        }
    }

    fn wants(&self, kind: PassEventKind) -> bool {
        self.sinks.iter().any(|s| s.wants(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warning(context: &str) -> PassEvent {
        PassEvent::Warning {
            context: context.into(),
            message: "msg".into(),
        }
    }

    #[test]
    fn vec_sink_collects_events() {
        let mut sink = VecSink::with_capacity(2);
        assert!(sink.is_empty());
        sink.send(warning("a"));
        sink.send(PassEvent::GridSampled {
            nodes: 8,
            inside_nodes: 1,
        });
        assert_eq!(sink.len(), 2);
        assert_eq!(
            sink.kinds(),
            vec![PassEventKind::Warning, PassEventKind::GridSampled]
        );
        sink.clear();
        assert!(sink.is_empty());
    }

    #[test]
    fn multi_sink_fans_out_events() {
        let mut multi = MultiSink::with_sinks(vec![VecSink::new(), VecSink::new()]);
        multi.send(warning("ctx"));
        assert_eq!(multi.len(), 2);
        assert_eq!(multi.sinks()[0].len(), 1);
        assert_eq!(multi.sinks()[1].len(), 1);
        assert!(matches!(
            multi.sinks()[0].as_slice()[0],
            PassEvent::Warning { .. }
        ));
    }

    #[test]
    fn empty_multi_sink_drops_events() {
        let mut multi: MultiSink<VecSink> = MultiSink::default();
        multi.send(warning("ctx"));
        assert!(multi.is_empty());
        assert!(!multi.wants(PassEventKind::Warning));
    }

    #[test]
    fn unit_sink_wants_nothing() {
        assert!(!().wants(PassEventKind::PassFinished));
    }

    #[test]
    fn fn_sink_invokes_callback() {
        let mut count = 0;
        let mut sink = FnSink::new(|_event| {
            count += 1;
        });
        sink.send_many([warning("a"), warning("b")]);
        assert_eq!(count, 2);
    }
}
