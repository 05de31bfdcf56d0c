use serde::{Deserialize, Serialize};
use uuid::Uuid;

use vendo_core::MachineId;

/// Envelope for an event, carrying the emitting machine and journal position.
///
/// Notes:
/// - `sequence_number` is monotonically increasing per machine, starting at 1.
/// - `payload` is the domain event itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    machine_id: MachineId,

    /// Position in the machine journal.
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
