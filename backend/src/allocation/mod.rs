//! Bed Allocation State Machine
//!
//! Governs the `Free → Occupied → Free` cycle and the binding of a bed to
//! at most one active contract. Allocation is the concurrency-critical
//! operation of the engine: under the engine's write lock it is a single
//! atomic check-and-set, so two contract creations racing for the same bed
//! can never both succeed — first committer wins, the loser gets
//! `BedNotAvailable` and must re-fetch the floor plan.
//!
//! # Critical Invariants
//!
//! - A failed allocation mutates nothing
//! - `release` is idempotent: releasing a free bed is a successful no-op,
//!   because termination may be retried after a partial failure

use crate::models::facility::BedStateError;
use crate::models::state::EngineState;
use thiserror::Error;

/// Errors that can occur during bed allocation
#[derive(Debug, Error, PartialEq)]
pub enum AllocationError {
    #[error("Bed {id} not found")]
    BedNotFound { id: String },

    #[error("Bed {id} is not available")]
    BedNotAvailable { id: String },
}

/// Atomically bind a free bed to a contract
///
/// Checks that the bed exists, is active, and is `Free`; on success the bed
/// becomes `Occupied` and records the owning contract id. Any other state
/// fails with `BedNotAvailable` and leaves the bed untouched.
///
/// # Example
/// ```
/// use dormitory_core_rs::allocation::{self, AllocationError};
/// use dormitory_core_rs::catalog;
/// use dormitory_core_rs::models::facility::{BedType, RoomType};
/// use dormitory_core_rs::models::state::EngineState;
///
/// let mut state = EngineState::new();
/// let floor = catalog::create_floor(&mut state, 1).unwrap();
/// let room = catalog::create_room(&mut state, floor.id(), 101, RoomType::Double).unwrap();
/// let bed = catalog::create_bed(&mut state, room.id(), 1, BedType::Bottom).unwrap();
///
/// allocation::try_allocate(&mut state, bed.id(), "contract-1").unwrap();
/// let second = allocation::try_allocate(&mut state, bed.id(), "contract-2");
/// assert_eq!(
///     second,
///     Err(AllocationError::BedNotAvailable { id: bed.id().to_string() })
/// );
/// ```
pub fn try_allocate(
    state: &mut EngineState,
    bed_id: &str,
    contract_id: &str,
) -> Result<(), AllocationError> {
    let bed = state
        .get_bed_mut(bed_id)
        .ok_or_else(|| AllocationError::BedNotFound {
            id: bed_id.to_string(),
        })?;

    bed.occupy(contract_id.to_string()).map_err(|err| match err {
        BedStateError::Inactive
        | BedStateError::NotAvailable { .. }
        | BedStateError::Occupied { .. } => AllocationError::BedNotAvailable {
            id: bed_id.to_string(),
        },
    })
}

/// Release a bed back to `Free` and clear its owner
///
/// Idempotent: releasing an already-free bed succeeds without change.
pub fn release(state: &mut EngineState, bed_id: &str) -> Result<(), AllocationError> {
    let bed = state
        .get_bed_mut(bed_id)
        .ok_or_else(|| AllocationError::BedNotFound {
            id: bed_id.to_string(),
        })?;
    bed.release();
    Ok(())
}
