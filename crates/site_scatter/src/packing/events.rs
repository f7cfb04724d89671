//! Event types and sinks for observing packing runs.
//!
//! A [`crate::packing::runner::PackingLoop`] reports its progress as [`PackingEvent`]s.
//! Sinks can skip events they have no use for through [`EventSink::wants`]; the loop
//! then does not compute them, which matters for the region areas of
//! [`PackingEvent::RegionShrunk`].
use geo::Coord;

use crate::packing::config::PackingConfig;
use crate::packing::state::{AcceptedPoint, Termination};

/// Describes events emitted by the packing loop.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum PackingEvent {
    /// Emitted once before the first sampling step.
    RunStarted {
        /// The configuration used.
        config: PackingConfig,
        /// Number of layers in the initial region.
        layer_count: usize,
        /// Total area of the initial region.
        area: f64,
    },

    /// Emitted when the configured start point lies outside the region and is skipped.
    StartPointRejected { position: Coord<f64> },

    /// Emitted when a candidate is accepted.
    PointAccepted {
        /// The accepted point.
        point: AcceptedPoint,
        /// Random draws spent to find it; zero for the start point.
        attempts: usize,
    },

    /// Emitted after the region was shrunk around a new point.
    RegionShrunk {
        /// Region area before the exclusion disk was removed.
        area_before: f64,
        /// Region area afterwards.
        area_after: f64,
        /// Layers left in the region.
        layer_count: usize,
    },

    /// Emitted when the sampler gave up.
    SamplingFailed {
        /// Random draws spent before giving up.
        attempts: usize,
    },

    /// Emitted when the loop reaches a terminal state.
    RunFinished {
        accepted: usize,
        termination: Termination,
        /// Sampling steps performed.
        iterations: usize,
    },
}

/// Discriminant of [`PackingEvent`], used by sinks to opt out of costly events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackingEventKind {
    RunStarted,
    StartPointRejected,
    PointAccepted,
    RegionShrunk,
    SamplingFailed,
    RunFinished,
}

impl PackingEvent {
    pub fn kind(&self) -> PackingEventKind {
        match self {
            PackingEvent::RunStarted { .. } => PackingEventKind::RunStarted,
            PackingEvent::StartPointRejected { .. } => PackingEventKind::StartPointRejected,
            PackingEvent::PointAccepted { .. } => PackingEventKind::PointAccepted,
            PackingEvent::RegionShrunk { .. } => PackingEventKind::RegionShrunk,
            PackingEvent::SamplingFailed { .. } => PackingEventKind::SamplingFailed,
            PackingEvent::RunFinished { .. } => PackingEventKind::RunFinished,
        }
    }
}

/// Receives [`PackingEvent`]s from a running loop.
pub trait EventSink {
    fn send(&mut self, event: PackingEvent);

    /// Whether events of `kind` should be built and sent at all.
    fn wants(&self, _kind: PackingEventKind) -> bool {
        true
    }
}

/// The unit sink discards everything and asks for nothing.
impl EventSink for () {
    #[inline]
    fn send(&mut self, _event: PackingEvent) {}

    #[inline]
    fn wants(&self, _kind: PackingEventKind) -> bool {
        false
    }
}

/// Forwards events to a closure.
pub struct FnSink<F>
where
    F: FnMut(PackingEvent),
{
    f: F,
}

impl<F> FnSink<F>
where
    F: FnMut(PackingEvent),
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> EventSink for FnSink<F>
where
    F: FnMut(PackingEvent),
{
    #[inline]
    fn send(&mut self, event: PackingEvent) {
        (self.f)(event);
    }
}

/// Collects events in order.
#[derive(Default)]
pub struct VecSink {
    events: Vec<PackingEvent>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_inner(self) -> Vec<PackingEvent> {
        self.events
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
    fn send(&mut self, event: PackingEvent) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use geo::coord;

    use super::*;

    fn rejected() -> PackingEvent {
        PackingEvent::StartPointRejected {
            position: coord! { x: 1.0, y: 2.0 },
        }
    }

    #[test]
    fn event_kind_matches_variant() {
        assert_eq!(rejected().kind(), PackingEventKind::StartPointRejected);
        let finished = PackingEvent::RunFinished {
            accepted: 3,
            termination: Termination::TargetReached,
            iterations: 3,
        };
        assert_eq!(finished.kind(), PackingEventKind::RunFinished);
    }

    #[test]
    fn unit_sink_wants_nothing() {
        assert!(!().wants(PackingEventKind::RegionShrunk));
    }

    #[test]
    fn vec_sink_keeps_order() {
        let mut sink = VecSink::new();
        assert!(sink.is_empty());
        sink.send(rejected());
        sink.send(PackingEvent::SamplingFailed { attempts: 7 });
        assert_eq!(sink.len(), 2);
        let kinds: Vec<_> = sink.into_inner().iter().map(PackingEvent::kind).collect();
        assert_eq!(
            kinds,
            vec![
                PackingEventKind::StartPointRejected,
                PackingEventKind::SamplingFailed
            ]
        );
    }

    #[test]
    fn fn_sink_invokes_callback() {
        let mut failed_attempts = 0;
        let mut sink = FnSink::new(|event| {
            if let PackingEvent::SamplingFailed { attempts } = event {
                failed_attempts += attempts;
            }
        });
        sink.send(PackingEvent::SamplingFailed { attempts: 4 });
        sink.send(rejected());
        assert_eq!(failed_attempts, 4);
    }
}
