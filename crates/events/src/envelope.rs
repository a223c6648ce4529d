use serde::{Deserialize, Serialize};
use uuid::Uuid;

use vending_core::MachineId;

/// Envelope for an event, carrying the log metadata around the payload.
///
/// This is the unit appended to the machine's event log and handed to sinks.
///
/// Notes:
/// - `machine_id` names the machine that emitted the event; read models pin
///   themselves to one machine.
/// - **Append-only**: `sequence_number` starts at 1 and increases by one per
///   emitted event of the machine, in commit order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    machine_id: MachineId,

    /// Monotonically increasing position in the machine's log.
    sequence_number: u64,

    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(event_id: Uuid, machine_id: MachineId, sequence_number: u64, payload: E) -> Self {
        Self {
            event_id,
            machine_id,
            sequence_number,
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn machine_id(&self) -> MachineId {
        self.machine_id
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }
}
