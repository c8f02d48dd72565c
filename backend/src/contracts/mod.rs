//! Contract Lifecycle Manager
//!
//! Creates, signs, reassigns, terminates, and (narrowly) deletes contracts,
//! coordinating the bed allocation state machine and the payment plan
//! generator so the three never disagree.
//!
//! # Critical Invariants
//!
//! - Contract, bed flip, and plan are created in one atomic unit: a failed
//!   allocation persists nothing
//! - A terminated contract is immutable except for reads; its bed is free
//! - `delete` is a data-entry-error correction path only: it is refused the
//!   moment any payment exists

use crate::allocation::{self, AllocationError};
use crate::models::contract::{BedLocation, Contract, ContractStateError};
use crate::models::state::EngineState;
use crate::plan::generate_plan;
use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur during contract lifecycle operations
#[derive(Debug, Error, PartialEq)]
pub enum ContractError {
    #[error("Contract {id} not found")]
    ContractNotFound { id: String },

    #[error("Student {id} not found")]
    StudentNotFound { id: String },

    #[error("Invalid date range: end {end} must be after start {start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Monthly fee must be positive, got {fee}")]
    InvalidMonthlyFee { fee: i64 },

    #[error("Contract {id} is terminated")]
    ContractTerminated { id: String },

    #[error("Contract {id} has recorded payments and cannot be deleted")]
    ContractHasPayments { id: String },

    #[error("Allocation error: {0}")]
    Allocation(#[from] AllocationError),
}

impl From<ContractStateError> for ContractError {
    fn from(err: ContractStateError) -> Self {
        match err {
            ContractStateError::Terminated { id } => ContractError::ContractTerminated { id },
        }
    }
}

/// Snapshot the physical address of a bed for the contract record
fn location_snapshot(state: &EngineState, bed_id: &str) -> Result<BedLocation, ContractError> {
    let bed = state
        .get_bed(bed_id)
        .ok_or_else(|| AllocationError::BedNotFound {
            id: bed_id.to_string(),
        })?;
    let room = state
        .get_room(bed.room_id())
        .ok_or_else(|| AllocationError::BedNotFound {
            id: bed_id.to_string(),
        })?;
    let floor = state
        .get_floor(room.floor_id())
        .ok_or_else(|| AllocationError::BedNotFound {
            id: bed_id.to_string(),
        })?;
    Ok(BedLocation {
        floor_number: floor.number(),
        room_number: room.number(),
        bed_number: bed.number(),
    })
}

/// Create a contract: validate, allocate the bed, generate the plan
///
/// All-or-nothing. Validation and the bed check-and-set run before any
/// insertion, so a failure of any step leaves no partial contract, no
/// occupied bed, and no plan.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use dormitory_core_rs::catalog;
/// use dormitory_core_rs::contracts;
/// use dormitory_core_rs::models::facility::{BedType, RoomType};
/// use dormitory_core_rs::models::state::EngineState;
/// use dormitory_core_rs::models::student::Student;
///
/// let mut state = EngineState::new();
/// let floor = catalog::create_floor(&mut state, 1).unwrap();
/// let room = catalog::create_room(&mut state, floor.id(), 101, RoomType::Double).unwrap();
/// let bed = catalog::create_bed(&mut state, room.id(), 1, BedType::Bottom).unwrap();
/// let student = Student::new("Ada".into(), "AB123".into(), "MIT".into(), None);
/// let student_id = student.id().to_string();
/// state.add_student(student);
///
/// let contract = contracts::create_contract(
///     &mut state,
///     &student_id,
///     bed.id(),
///     NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
///     NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
///     500_000,
/// )
/// .unwrap();
/// assert_eq!(contract.total_price(), 6_000_000);
/// assert_eq!(state.plan(contract.id()).unwrap().len(), 12);
/// ```
pub fn create_contract(
    state: &mut EngineState,
    student_id: &str,
    bed_id: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
    monthly_fee: i64,
) -> Result<Contract, ContractError> {
    if end_date <= start_date {
        return Err(ContractError::InvalidDateRange {
            start: start_date,
            end: end_date,
        });
    }
    if monthly_fee <= 0 {
        return Err(ContractError::InvalidMonthlyFee { fee: monthly_fee });
    }
    if state.get_student(student_id).is_none() {
        return Err(ContractError::StudentNotFound {
            id: student_id.to_string(),
        });
    }

    let location = location_snapshot(state, bed_id)?;
    let months = crate::core::dates::number_of_months(start_date, end_date);
    let number = state.next_contract_number();
    let contract = Contract::new(
        number,
        student_id.to_string(),
        bed_id.to_string(),
        location,
        start_date,
        end_date,
        monthly_fee,
        months,
    );

    // The concurrency-critical check-and-set; loser gets BedNotAvailable
    // and nothing has been persisted yet.
    allocation::try_allocate(state, bed_id, contract.id())?;

    let plan = generate_plan(&contract);
    state.add_contract(contract.clone());
    state.set_plan(contract.id().to_string(), plan);
    Ok(contract)
}

/// Mark a contract as signed
pub fn sign_contract(state: &mut EngineState, contract_id: &str) -> Result<Contract, ContractError> {
    let contract = state
        .get_contract_mut(contract_id)
        .ok_or_else(|| ContractError::ContractNotFound {
            id: contract_id.to_string(),
        })?;
    contract.sign()?;
    Ok(contract.clone())
}

/// Move a live contract onto a different bed
///
/// Allocates the new bed first, so a failed allocation leaves the contract
/// on its original bed with nothing mutated. The monthly fee is unchanged,
/// so remaining installments keep their due dates and amounts; paid history
/// is never altered. The location snapshot is refreshed.
pub fn reassign_bed(
    state: &mut EngineState,
    contract_id: &str,
    new_bed_id: &str,
) -> Result<Contract, ContractError> {
    let (old_bed_id, terminated) = match state.get_contract(contract_id) {
        Some(c) => (c.bed_id().to_string(), c.is_terminated()),
        None => {
            return Err(ContractError::ContractNotFound {
                id: contract_id.to_string(),
            })
        }
    };
    if terminated {
        return Err(ContractError::ContractTerminated {
            id: contract_id.to_string(),
        });
    }

    let location = location_snapshot(state, new_bed_id)?;
    allocation::try_allocate(state, new_bed_id, contract_id)?;
    allocation::release(state, &old_bed_id)?;

    let contract = state
        .get_contract_mut(contract_id)
        .ok_or_else(|| ContractError::ContractNotFound {
            id: contract_id.to_string(),
        })?;
    contract.rebind_bed(new_bed_id.to_string(), location)?;
    Ok(contract.clone())
}

/// Terminate a contract, releasing its bed
///
/// A second termination is reported as `ContractTerminated`, not silently
/// accepted, to surface double-submission bugs. Installments are retained
/// for historical reporting.
pub fn terminate_contract(
    state: &mut EngineState,
    contract_id: &str,
    reason: &str,
    date: NaiveDate,
) -> Result<Contract, ContractError> {
    let contract = state
        .get_contract_mut(contract_id)
        .ok_or_else(|| ContractError::ContractNotFound {
            id: contract_id.to_string(),
        })?;
    contract.terminate(reason.to_string(), date)?;
    let bed_id = contract.bed_id().to_string();
    let snapshot = contract.clone();

    allocation::release(state, &bed_id)?;
    Ok(snapshot)
}

/// Hard-delete a contract recorded in error
///
/// Refused with `ContractHasPayments` once any payment exists; business
/// closure goes through `terminate_contract` instead. Releases the bed if
/// the contract was still live.
pub fn delete_contract(state: &mut EngineState, contract_id: &str) -> Result<(), ContractError> {
    let (bed_id, terminated) = match state.get_contract(contract_id) {
        Some(c) => (c.bed_id().to_string(), c.is_terminated()),
        None => {
            return Err(ContractError::ContractNotFound {
                id: contract_id.to_string(),
            })
        }
    };
    if state.contract_has_payments(contract_id) {
        return Err(ContractError::ContractHasPayments {
            id: contract_id.to_string(),
        });
    }

    if !terminated {
        allocation::release(state, &bed_id)?;
    }
    state.remove_contract(contract_id);
    Ok(())
}
