//! Facility Catalog
//!
//! Exposes the floor → room → bed tree: creation with uniqueness checks,
//! the read-only floor-plan projection consumed by the allocation UI, and
//! the deactivation cascade. There are no hard deletes — historical
//! contracts snapshot their location but the inventory row itself must also
//! stay resolvable.
//!
//! # Critical Invariants
//!
//! - Floor numbers are unique facility-wide, counting deactivated floors
//! - Room numbers are unique within their floor; bed numbers within their room
//! - Every failure happens before any mutation: a rejected creation or
//!   deactivation leaves the state byte-identical

use crate::models::facility::{Bed, BedStatus, BedType, Floor, Room, RoomType};
use crate::models::state::EngineState;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during catalog operations
#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("Floor number {number} already exists")]
    DuplicateFloorNumber { number: u32 },

    #[error("Room number {number} already exists on this floor")]
    DuplicateRoomNumber { number: u32 },

    #[error("Bed number {number} already exists in this room")]
    DuplicateBedNumber { number: u32 },

    #[error("Floor {id} not found")]
    FloorNotFound { id: String },

    #[error("Room {id} not found")]
    RoomNotFound { id: String },

    #[error("Bed {id} not found")]
    BedNotFound { id: String },

    #[error("Bed {id} is occupied by contract {contract_id}")]
    BedOccupied { id: String, contract_id: String },
}

/// Create a new floor
///
/// Fails with `DuplicateFloorNumber` if a floor with that number exists,
/// active or not.
///
/// # Example
/// ```
/// use dormitory_core_rs::catalog;
/// use dormitory_core_rs::models::state::EngineState;
///
/// let mut state = EngineState::new();
/// let floor = catalog::create_floor(&mut state, 1).unwrap();
/// assert_eq!(floor.number(), 1);
/// assert!(catalog::create_floor(&mut state, 1).is_err());
/// ```
pub fn create_floor(state: &mut EngineState, number: u32) -> Result<Floor, CatalogError> {
    if state.floor_by_number(number).is_some() {
        return Err(CatalogError::DuplicateFloorNumber { number });
    }
    let floor = Floor::new(number);
    state.add_floor(floor.clone());
    Ok(floor)
}

/// Create a new room on a floor
pub fn create_room(
    state: &mut EngineState,
    floor_id: &str,
    number: u32,
    room_type: RoomType,
) -> Result<Room, CatalogError> {
    if state.get_floor(floor_id).is_none() {
        return Err(CatalogError::FloorNotFound {
            id: floor_id.to_string(),
        });
    }
    if state
        .rooms_on_floor(floor_id)
        .iter()
        .any(|r| r.number() == number)
    {
        return Err(CatalogError::DuplicateRoomNumber { number });
    }
    let room = Room::new(floor_id.to_string(), number, room_type);
    state.add_room(room.clone());
    Ok(room)
}

/// Create a new bed in a room; new beds start `Free`
pub fn create_bed(
    state: &mut EngineState,
    room_id: &str,
    number: u32,
    bed_type: BedType,
) -> Result<Bed, CatalogError> {
    if state.get_room(room_id).is_none() {
        return Err(CatalogError::RoomNotFound {
            id: room_id.to_string(),
        });
    }
    if state
        .beds_in_room(room_id)
        .iter()
        .any(|b| b.number() == number)
    {
        return Err(CatalogError::DuplicateBedNumber { number });
    }
    let bed = Bed::new(room_id.to_string(), number, bed_type);
    state.add_bed(bed.clone());
    Ok(bed)
}

/// Toggle a bed's maintenance state
///
/// Fails with `BedOccupied` on an occupied bed: the occupant must be moved
/// or terminated first.
pub fn set_bed_maintenance(
    state: &mut EngineState,
    bed_id: &str,
    on: bool,
) -> Result<(), CatalogError> {
    let bed = state
        .get_bed_mut(bed_id)
        .ok_or_else(|| CatalogError::BedNotFound {
            id: bed_id.to_string(),
        })?;
    bed.set_maintenance(on)
        .map_err(|_| CatalogError::BedOccupied {
            id: bed_id.to_string(),
            contract_id: bed.occupied_by().unwrap_or_default().to_string(),
        })
}

/// Deactivate a bed
///
/// Fails with `BedOccupied` while a contract holds it.
pub fn deactivate_bed(state: &mut EngineState, bed_id: &str) -> Result<(), CatalogError> {
    let bed = state
        .get_bed_mut(bed_id)
        .ok_or_else(|| CatalogError::BedNotFound {
            id: bed_id.to_string(),
        })?;
    if *bed.status() == BedStatus::Occupied {
        return Err(CatalogError::BedOccupied {
            id: bed_id.to_string(),
            contract_id: bed.occupied_by().unwrap_or_default().to_string(),
        });
    }
    bed.deactivate();
    Ok(())
}

/// Deactivate a room and cascade to its beds
///
/// Fails with `BedOccupied` (and changes nothing) if any bed in the room is
/// occupied.
pub fn deactivate_room(state: &mut EngineState, room_id: &str) -> Result<(), CatalogError> {
    if state.get_room(room_id).is_none() {
        return Err(CatalogError::RoomNotFound {
            id: room_id.to_string(),
        });
    }
    if let Some(bed) = state
        .beds_in_room(room_id)
        .iter()
        .find(|b| *b.status() == BedStatus::Occupied)
    {
        return Err(CatalogError::BedOccupied {
            id: bed.id().to_string(),
            contract_id: bed.occupied_by().unwrap_or_default().to_string(),
        });
    }
    for bed_id in state.bed_ids_in_room(room_id) {
        if let Some(bed) = state.get_bed_mut(&bed_id) {
            bed.deactivate();
        }
    }
    if let Some(room) = state.get_room_mut(room_id) {
        room.deactivate();
    }
    Ok(())
}

/// Deactivate a floor and cascade to its rooms and beds
///
/// Fails with `BedOccupied` (and changes nothing) if any bed under the
/// floor is occupied.
pub fn deactivate_floor(state: &mut EngineState, floor_id: &str) -> Result<(), CatalogError> {
    if state.get_floor(floor_id).is_none() {
        return Err(CatalogError::FloorNotFound {
            id: floor_id.to_string(),
        });
    }
    let room_ids = state.room_ids_on_floor(floor_id);
    for room_id in &room_ids {
        if let Some(bed) = state
            .beds_in_room(room_id)
            .iter()
            .find(|b| *b.status() == BedStatus::Occupied)
        {
            return Err(CatalogError::BedOccupied {
                id: bed.id().to_string(),
                contract_id: bed.occupied_by().unwrap_or_default().to_string(),
            });
        }
    }
    for room_id in &room_ids {
        // Beds first so a partially applied cascade is never observable
        for bed_id in state.bed_ids_in_room(room_id) {
            if let Some(bed) = state.get_bed_mut(&bed_id) {
                bed.deactivate();
            }
        }
        if let Some(room) = state.get_room_mut(room_id) {
            room.deactivate();
        }
    }
    if let Some(floor) = state.get_floor_mut(floor_id) {
        floor.deactivate();
    }
    Ok(())
}

// ============================================================================
// Floor-plan projection
// ============================================================================

/// Bed node in the floor-plan projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BedView {
    pub id: String,
    pub number: u32,
    pub bed_type: BedType,
    pub status: BedStatus,
    pub active: bool,
    pub occupied_by: Option<String>,
}

/// Room node in the floor-plan projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomView {
    pub id: String,
    pub number: u32,
    pub room_type: RoomType,
    pub active: bool,
    pub beds: Vec<BedView>,
}

/// Floor node in the floor-plan projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorView {
    pub id: String,
    pub number: u32,
    pub active: bool,
    pub rooms: Vec<RoomView>,
}

/// The full facility tree with live bed statuses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorPlan {
    pub floors: Vec<FloorView>,
}

impl FloorPlan {
    /// Count of beds currently free for allocation
    pub fn free_beds(&self) -> usize {
        self.floors
            .iter()
            .flat_map(|f| &f.rooms)
            .flat_map(|r| &r.beds)
            .filter(|b| b.active && b.status == BedStatus::Free)
            .count()
    }
}

/// Build the full floor-plan projection, ordered by number at every level
///
/// Read-only: no side effects, safe to call concurrently with writers under
/// the engine's lock discipline.
pub fn list_floor_plan(state: &EngineState) -> FloorPlan {
    let floors = state
        .floors_sorted()
        .into_iter()
        .map(|floor| FloorView {
            id: floor.id().to_string(),
            number: floor.number(),
            active: floor.is_active(),
            rooms: state
                .rooms_on_floor(floor.id())
                .into_iter()
                .map(|room| RoomView {
                    id: room.id().to_string(),
                    number: room.number(),
                    room_type: room.room_type(),
                    active: room.is_active(),
                    beds: state
                        .beds_in_room(room.id())
                        .into_iter()
                        .map(|bed| BedView {
                            id: bed.id().to_string(),
                            number: bed.number(),
                            bed_type: bed.bed_type(),
                            status: bed.status().clone(),
                            active: bed.is_active(),
                            occupied_by: bed.occupied_by().map(str::to_string),
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect();

    FloorPlan { floors }
}
