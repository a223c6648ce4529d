use crate::{Event, EventEnvelope};

/// A projection builds a read model from the append-only event log.
///
/// Read models are disposable: they can be dropped and rebuilt by replaying the
/// log from the first envelope. `apply` must be deterministic; feeding the same
/// envelopes in the same order must produce the same read model.
///
/// Ordering and machine pinning are enforced by `ProjectionRunner`, so
/// implementations only describe how one envelope changes the view. Events a
/// projection does not care about are ignored.
pub trait Projection {
    type Ev: Event;

    fn apply(&mut self, envelope: &EventEnvelope<Self::Ev>);
}
