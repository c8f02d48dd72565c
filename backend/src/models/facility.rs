//! Facility inventory models
//!
//! The physical dormitory hierarchy: Floor owns Rooms, Room owns Beds.
//! A Bed is the unit of allocation. Inventory is append/deactivate-only:
//! nothing is ever hard-deleted, so historical contracts stay resolvable.
//!
//! # Critical Invariants
//!
//! 1. A bed is `Occupied` iff exactly one non-terminated contract references it
//! 2. Floor numbers are globally unique; room numbers unique within a floor;
//!    bed numbers unique within a room
//! 3. An inactive or maintenance bed never participates in allocation
//!
//! CRITICAL: All money values elsewhere in the crate are i64 (smallest
//! currency unit); the facility tree itself carries no money.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during bed state transitions
#[derive(Debug, Error, PartialEq)]
pub enum BedStateError {
    #[error("Bed is not available for allocation (status: {status:?})")]
    NotAvailable { status: BedStatus },

    #[error("Bed is inactive")]
    Inactive,

    #[error("Bed is occupied by contract {contract_id}")]
    Occupied { contract_id: String },
}

/// Capacity class of a room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomType {
    Single,
    Double,
    Triple,
    Quad,
}

impl RoomType {
    /// Nominal bed capacity for this room class
    pub fn capacity(&self) -> u32 {
        match self {
            RoomType::Single => 1,
            RoomType::Double => 2,
            RoomType::Triple => 3,
            RoomType::Quad => 4,
        }
    }
}

/// Physical position of a bed within a bunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BedType {
    Top,
    Bottom,
}

/// Occupancy status of a bed
///
/// `Free → Occupied → Free` is the only allocation cycle. `Maintenance` is
/// set administratively and blocks allocation until cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BedStatus {
    /// Available for allocation
    Free,

    /// Bound to exactly one non-terminated contract
    Occupied,

    /// Administratively withheld from allocation
    Maintenance,
}

/// A dormitory floor
///
/// Top level of the inventory tree. Owns rooms by back-reference
/// (rooms carry `floor_id`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Floor {
    /// Unique floor identifier (UUID)
    id: String,

    /// Floor number, unique across the facility (active or not)
    number: u32,

    /// Deactivated floors are retained for history
    active: bool,
}

impl Floor {
    /// Create a new active floor
    pub fn new(number: u32) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            number,
            active: true,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Deactivate this floor (idempotent)
    pub fn deactivate(&mut self) {
        self.active = false;
    }
}

/// A room on a floor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    /// Unique room identifier (UUID)
    id: String,

    /// Parent floor id (back-reference, not ownership)
    floor_id: String,

    /// Room number, unique within the floor
    number: u32,

    /// Capacity class
    room_type: RoomType,

    /// Deactivated rooms are retained for history
    active: bool,
}

impl Room {
    /// Create a new active room on the given floor
    pub fn new(floor_id: String, number: u32, room_type: RoomType) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            floor_id,
            number,
            room_type,
            active: true,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn floor_id(&self) -> &str {
        &self.floor_id
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn room_type(&self) -> RoomType {
        self.room_type
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Deactivate this room (idempotent)
    pub fn deactivate(&mut self) {
        self.active = false;
    }
}

/// A bed inside a room — the smallest allocatable unit
///
/// # Example
/// ```
/// use dormitory_core_rs::models::facility::{Bed, BedStatus, BedType};
///
/// let mut bed = Bed::new("room-1".to_string(), 1, BedType::Bottom);
/// assert_eq!(*bed.status(), BedStatus::Free);
///
/// bed.occupy("contract-1".to_string()).unwrap();
/// assert_eq!(*bed.status(), BedStatus::Occupied);
/// assert_eq!(bed.occupied_by(), Some("contract-1"));
///
/// bed.release();
/// assert_eq!(*bed.status(), BedStatus::Free);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bed {
    /// Unique bed identifier (UUID)
    id: String,

    /// Parent room id (back-reference, not ownership)
    room_id: String,

    /// Bed number, unique within the room
    number: u32,

    /// Physical bunk position
    bed_type: BedType,

    /// Occupancy status
    status: BedStatus,

    /// Contract currently occupying this bed, if any
    ///
    /// Always `Some` when status is `Occupied` and `None` otherwise.
    occupied_by: Option<String>,

    /// Deactivated beds are retained for history
    active: bool,
}

impl Bed {
    /// Create a new active, free bed in the given room
    pub fn new(room_id: String, number: u32, bed_type: BedType) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            room_id,
            number,
            bed_type,
            status: BedStatus::Free,
            occupied_by: None,
            active: true,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn bed_type(&self) -> BedType {
        self.bed_type
    }

    pub fn status(&self) -> &BedStatus {
        &self.status
    }

    /// Contract id currently bound to this bed
    pub fn occupied_by(&self) -> Option<&str> {
        self.occupied_by.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether this bed can be allocated right now
    pub fn is_free(&self) -> bool {
        self.active && self.status == BedStatus::Free
    }

    /// Bind this bed to a contract (check-and-set)
    ///
    /// Fails without mutating state unless the bed is active and `Free`.
    /// Exhaustive on status so a newly added status value cannot slip
    /// through allocation unnoticed.
    pub fn occupy(&mut self, contract_id: String) -> Result<(), BedStateError> {
        if !self.active {
            return Err(BedStateError::Inactive);
        }
        match self.status {
            BedStatus::Free => {
                self.status = BedStatus::Occupied;
                self.occupied_by = Some(contract_id);
                Ok(())
            }
            BedStatus::Occupied | BedStatus::Maintenance => Err(BedStateError::NotAvailable {
                status: self.status.clone(),
            }),
        }
    }

    /// Release this bed back to `Free` (idempotent)
    ///
    /// Termination may be retried after a partial failure, so releasing an
    /// already-free bed is a no-op, not an error. A maintenance bed stays
    /// in maintenance.
    pub fn release(&mut self) {
        match self.status {
            BedStatus::Occupied | BedStatus::Free => {
                self.status = BedStatus::Free;
                self.occupied_by = None;
            }
            BedStatus::Maintenance => {
                self.occupied_by = None;
            }
        }
    }

    /// Put the bed into maintenance, or bring it back to `Free`
    ///
    /// Fails on an occupied bed: the occupant's contract must be moved or
    /// terminated first.
    pub fn set_maintenance(&mut self, on: bool) -> Result<(), BedStateError> {
        match (&self.status, on) {
            (BedStatus::Occupied, _) => Err(BedStateError::Occupied {
                contract_id: self.occupied_by.clone().unwrap_or_default(),
            }),
            (_, true) => {
                self.status = BedStatus::Maintenance;
                Ok(())
            }
            (_, false) => {
                self.status = BedStatus::Free;
                Ok(())
            }
        }
    }

    /// Deactivate this bed (idempotent)
    pub fn deactivate(&mut self) {
        self.active = false;
    }
}
