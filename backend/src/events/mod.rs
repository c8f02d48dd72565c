//! Engine audit event log
//!
//! Every mutating engine operation appends one event after it commits.
//! The log is append-only and strictly ordered by sequence number, so a
//! consumer can reconstruct the order of business actions even when
//! wall-clock timestamps collide.
//!
//! # Design Principles
//!
//! 1. **Post-commit**: an event is appended only for an operation that
//!    succeeded; failures leave no trace here
//! 2. **Money is i64**: all monetary values are the smallest currency unit
//! 3. **Self-contained**: events carry the ids and amounts needed to read
//!    the log without the state it describes

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A business action the engine performed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    StudentRegistered {
        student_id: String,
    },

    FloorCreated {
        floor_id: String,
        number: u32,
    },

    RoomCreated {
        room_id: String,
        floor_id: String,
        number: u32,
    },

    BedCreated {
        bed_id: String,
        room_id: String,
        number: u32,
    },

    BedMaintenanceSet {
        bed_id: String,
        maintenance: bool,
    },

    /// Floor, room, or bed taken out of service (with its children)
    UnitDeactivated {
        unit_id: String,
    },

    ContractCreated {
        contract_id: String,
        contract_number: String,
        student_id: String,
        bed_id: String,
        total_price: i64,
    },

    ContractSigned {
        contract_id: String,
    },

    BedReassigned {
        contract_id: String,
        from_bed_id: String,
        to_bed_id: String,
    },

    ContractTerminated {
        contract_id: String,
        date: NaiveDate,
    },

    ContractDeleted {
        contract_id: String,
    },

    PaymentRecorded {
        payment_id: String,
        contract_id: String,
        amount: i64,
    },

    PaymentRefunded {
        payment_id: String,
        contract_id: String,
        amount: i64,
    },

    PaymentDeleted {
        payment_id: String,
        contract_id: String,
    },
}

/// An event with its position in the log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedEvent {
    /// Strictly increasing, starting at 1
    pub seq: u64,

    /// Wall-clock time of the append; ordering authority is `seq`
    pub at: DateTime<Utc>,

    pub event: EngineEvent,
}

/// Append-only audit log
#[derive(Debug, Default)]
pub struct EventLog {
    entries: Vec<RecordedEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event, assigning the next sequence number
    pub fn append(&mut self, event: EngineEvent) {
        let seq = self.entries.len() as u64 + 1;
        self.entries.push(RecordedEvent {
            seq,
            at: Utc::now(),
            event,
        });
    }

    pub fn entries(&self) -> &[RecordedEvent] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
