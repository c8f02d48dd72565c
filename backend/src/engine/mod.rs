//! Engine Facade
//!
//! The single entry point callers hold: a thread-safe wrapper over
//! [`EngineState`] that routes every operation through one writer lock,
//! appends to the audit log after each successful mutation, and exposes
//! the read-side projections.
//!
//! # Concurrency model
//!
//! All mutations take the state write lock for their full duration, so
//! each operation observes and commits a consistent state; the bed
//! check-and-set inside contract creation is atomic by construction.
//! Reads take the read lock and clone what they return, so a caller never
//! holds a reference into guarded state. A poisoned lock surfaces as
//! [`EngineError::StatePoisoned`], the engine's transient storage failure
//! class.

pub mod checkpoint;

use crate::allocation::AllocationError;
use crate::catalog::{self, CatalogError, FloorPlan};
use crate::contracts::{self, ContractError};
use crate::events::{EngineEvent, EventLog, RecordedEvent};
use crate::ledger::{self, LedgerError};
use crate::models::contract::{Contract, ContractPaymentStatus};
use crate::models::facility::{Bed, BedType, Floor, Room, RoomType};
use crate::models::installment::Installment;
use crate::models::payment::{Payment, PaymentMethod};
use crate::models::state::EngineState;
use crate::models::student::Student;
use crate::plan::{self, PlanStatistics};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use tracing::{info, warn};

/// Errors surfaced by the engine facade
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Allocation error: {0}")]
    Allocation(#[from] AllocationError),

    #[error("Contract error: {0}")]
    Contract(#[from] ContractError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Student {id} not found")]
    StudentNotFound { id: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Snapshot rejected: {0}")]
    SnapshotInvalid(String),

    /// A lock was poisoned by a panicking writer; retryable by the caller
    /// once the process is healthy again
    #[error("Engine state lock poisoned")]
    StatePoisoned,
}

/// Everything the contract page shows, assembled under one read lock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractDetail {
    pub contract: Contract,
    pub installments: Vec<Installment>,
    pub payments: Vec<Payment>,
    pub statistics: PlanStatistics,
    pub payment_status: ContractPaymentStatus,
}

/// Thread-safe dormitory engine
///
/// # Example
/// ```
/// use dormitory_core_rs::engine::Engine;
/// use dormitory_core_rs::models::facility::RoomType;
///
/// let engine = Engine::new();
/// let floor = engine.create_floor(1).unwrap();
/// let room = engine.create_room(floor.id(), 101, RoomType::Double).unwrap();
/// assert_eq!(engine.floor_plan().unwrap().floors.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct Engine {
    state: RwLock<EngineState>,
    events: Mutex<EventLog>,
}

impl Engine {
    /// Create an engine with empty state
    pub fn new() -> Self {
        Self::default()
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, EngineState>, EngineError> {
        self.state.write().map_err(|_| EngineError::StatePoisoned)
    }

    fn read_state(&self) -> Result<RwLockReadGuard<'_, EngineState>, EngineError> {
        self.state.read().map_err(|_| EngineError::StatePoisoned)
    }

    /// Append to the audit log; best-effort, never fails the operation
    fn log_event(&self, event: EngineEvent) {
        match self.events.lock() {
            Ok(mut log) => log.append(event),
            Err(_) => warn!("event log lock poisoned, dropping audit event"),
        }
    }

    // ------------------------------------------------------------------
    // Students
    // ------------------------------------------------------------------

    pub fn register_student(
        &self,
        full_name: String,
        passport: String,
        university: String,
        phone: Option<String>,
    ) -> Result<Student, EngineError> {
        let student = Student::new(full_name, passport, university, phone);
        {
            let mut state = self.write_state()?;
            state.add_student(student.clone());
        }
        info!(student_id = %student.id(), "student registered");
        self.log_event(EngineEvent::StudentRegistered {
            student_id: student.id().to_string(),
        });
        Ok(student)
    }

    pub fn student(&self, student_id: &str) -> Result<Student, EngineError> {
        let state = self.read_state()?;
        state
            .get_student(student_id)
            .cloned()
            .ok_or_else(|| EngineError::StudentNotFound {
                id: student_id.to_string(),
            })
    }

    // ------------------------------------------------------------------
    // Facility catalog
    // ------------------------------------------------------------------

    pub fn create_floor(&self, number: u32) -> Result<Floor, EngineError> {
        let floor = {
            let mut state = self.write_state()?;
            catalog::create_floor(&mut state, number)?
        };
        info!(floor_id = %floor.id(), number, "floor created");
        self.log_event(EngineEvent::FloorCreated {
            floor_id: floor.id().to_string(),
            number,
        });
        Ok(floor)
    }

    pub fn create_room(
        &self,
        floor_id: &str,
        number: u32,
        room_type: RoomType,
    ) -> Result<Room, EngineError> {
        let room = {
            let mut state = self.write_state()?;
            catalog::create_room(&mut state, floor_id, number, room_type)?
        };
        info!(room_id = %room.id(), floor_id, number, "room created");
        self.log_event(EngineEvent::RoomCreated {
            room_id: room.id().to_string(),
            floor_id: floor_id.to_string(),
            number,
        });
        Ok(room)
    }

    pub fn create_bed(
        &self,
        room_id: &str,
        number: u32,
        bed_type: BedType,
    ) -> Result<Bed, EngineError> {
        let bed = {
            let mut state = self.write_state()?;
            catalog::create_bed(&mut state, room_id, number, bed_type)?
        };
        info!(bed_id = %bed.id(), room_id, number, "bed created");
        self.log_event(EngineEvent::BedCreated {
            bed_id: bed.id().to_string(),
            room_id: room_id.to_string(),
            number,
        });
        Ok(bed)
    }

    pub fn set_bed_maintenance(&self, bed_id: &str, on: bool) -> Result<(), EngineError> {
        {
            let mut state = self.write_state()?;
            catalog::set_bed_maintenance(&mut state, bed_id, on)?;
        }
        info!(bed_id, maintenance = on, "bed maintenance toggled");
        self.log_event(EngineEvent::BedMaintenanceSet {
            bed_id: bed_id.to_string(),
            maintenance: on,
        });
        Ok(())
    }

    pub fn deactivate_bed(&self, bed_id: &str) -> Result<(), EngineError> {
        {
            let mut state = self.write_state()?;
            catalog::deactivate_bed(&mut state, bed_id)?;
        }
        info!(bed_id, "bed deactivated");
        self.log_event(EngineEvent::UnitDeactivated {
            unit_id: bed_id.to_string(),
        });
        Ok(())
    }

    pub fn deactivate_room(&self, room_id: &str) -> Result<(), EngineError> {
        {
            let mut state = self.write_state()?;
            catalog::deactivate_room(&mut state, room_id)?;
        }
        info!(room_id, "room deactivated");
        self.log_event(EngineEvent::UnitDeactivated {
            unit_id: room_id.to_string(),
        });
        Ok(())
    }

    pub fn deactivate_floor(&self, floor_id: &str) -> Result<(), EngineError> {
        {
            let mut state = self.write_state()?;
            catalog::deactivate_floor(&mut state, floor_id)?;
        }
        info!(floor_id, "floor deactivated");
        self.log_event(EngineEvent::UnitDeactivated {
            unit_id: floor_id.to_string(),
        });
        Ok(())
    }

    /// The full facility tree with live bed statuses
    pub fn floor_plan(&self) -> Result<FloorPlan, EngineError> {
        let state = self.read_state()?;
        Ok(catalog::list_floor_plan(&state))
    }

    // ------------------------------------------------------------------
    // Contract lifecycle
    // ------------------------------------------------------------------

    pub fn create_contract(
        &self,
        student_id: &str,
        bed_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        monthly_fee: i64,
    ) -> Result<Contract, EngineError> {
        let contract = {
            let mut state = self.write_state()?;
            contracts::create_contract(
                &mut state,
                student_id,
                bed_id,
                start_date,
                end_date,
                monthly_fee,
            )?
        };
        info!(
            contract_id = %contract.id(),
            number = %contract.number(),
            bed_id,
            total_price = contract.total_price(),
            "contract created"
        );
        self.log_event(EngineEvent::ContractCreated {
            contract_id: contract.id().to_string(),
            contract_number: contract.number().to_string(),
            student_id: student_id.to_string(),
            bed_id: bed_id.to_string(),
            total_price: contract.total_price(),
        });
        Ok(contract)
    }

    pub fn sign_contract(&self, contract_id: &str) -> Result<Contract, EngineError> {
        let contract = {
            let mut state = self.write_state()?;
            contracts::sign_contract(&mut state, contract_id)?
        };
        info!(contract_id, "contract signed");
        self.log_event(EngineEvent::ContractSigned {
            contract_id: contract_id.to_string(),
        });
        Ok(contract)
    }

    pub fn reassign_bed(
        &self,
        contract_id: &str,
        new_bed_id: &str,
    ) -> Result<Contract, EngineError> {
        let (contract, from_bed_id) = {
            let mut state = self.write_state()?;
            let from = state
                .get_contract(contract_id)
                .map(|c| c.bed_id().to_string())
                .unwrap_or_default();
            let contract = contracts::reassign_bed(&mut state, contract_id, new_bed_id)?;
            (contract, from)
        };
        info!(contract_id, from_bed_id = %from_bed_id, to_bed_id = new_bed_id, "bed reassigned");
        self.log_event(EngineEvent::BedReassigned {
            contract_id: contract_id.to_string(),
            from_bed_id,
            to_bed_id: new_bed_id.to_string(),
        });
        Ok(contract)
    }

    pub fn terminate_contract(
        &self,
        contract_id: &str,
        reason: &str,
        date: NaiveDate,
    ) -> Result<Contract, EngineError> {
        let contract = {
            let mut state = self.write_state()?;
            contracts::terminate_contract(&mut state, contract_id, reason, date)?
        };
        info!(contract_id, %date, reason, "contract terminated");
        self.log_event(EngineEvent::ContractTerminated {
            contract_id: contract_id.to_string(),
            date,
        });
        Ok(contract)
    }

    pub fn delete_contract(&self, contract_id: &str) -> Result<(), EngineError> {
        {
            let mut state = self.write_state()?;
            contracts::delete_contract(&mut state, contract_id)?;
        }
        warn!(contract_id, "contract deleted");
        self.log_event(EngineEvent::ContractDeleted {
            contract_id: contract_id.to_string(),
        });
        Ok(())
    }

    /// Everything known about one contract, consistent under one read lock
    pub fn contract_detail(&self, contract_id: &str) -> Result<ContractDetail, EngineError> {
        let state = self.read_state()?;
        let contract = state
            .get_contract(contract_id)
            .cloned()
            .ok_or_else(|| ContractError::ContractNotFound {
                id: contract_id.to_string(),
            })?;
        let installments: Vec<Installment> =
            state.plan(contract_id).unwrap_or_default().to_vec();
        let payments: Vec<Payment> = state
            .payments_for_contract(contract_id)
            .into_iter()
            .cloned()
            .collect();
        let statistics = plan::statistics(&installments);
        let payment_status = plan::contract_payment_status(&installments);
        Ok(ContractDetail {
            contract,
            installments,
            payments,
            statistics,
            payment_status,
        })
    }

    // ------------------------------------------------------------------
    // Ledger
    // ------------------------------------------------------------------

    pub fn record_payment(
        &self,
        contract_id: &str,
        payment_date: NaiveDate,
        amount: i64,
        method: PaymentMethod,
        comment: Option<String>,
    ) -> Result<Payment, EngineError> {
        let payment = {
            let mut state = self.write_state()?;
            ledger::record_payment(&mut state, contract_id, payment_date, amount, method, comment)?
        };
        info!(payment_id = %payment.id(), contract_id, amount, "payment recorded");
        self.log_event(EngineEvent::PaymentRecorded {
            payment_id: payment.id().to_string(),
            contract_id: contract_id.to_string(),
            amount,
        });
        Ok(payment)
    }

    pub fn refund_payment(
        &self,
        payment_id: &str,
        amount: i64,
        date: NaiveDate,
        comment: Option<String>,
    ) -> Result<Payment, EngineError> {
        let payment = {
            let mut state = self.write_state()?;
            ledger::refund_payment(&mut state, payment_id, amount, date, comment)?
        };
        info!(payment_id, amount, "payment refunded");
        self.log_event(EngineEvent::PaymentRefunded {
            payment_id: payment_id.to_string(),
            contract_id: payment.contract_id().to_string(),
            amount,
        });
        Ok(payment)
    }

    pub fn delete_payment(&self, payment_id: &str) -> Result<(), EngineError> {
        let contract_id = {
            let mut state = self.write_state()?;
            let contract_id = state
                .get_payment(payment_id)
                .map(|p| p.contract_id().to_string())
                .unwrap_or_default();
            ledger::delete_payment(&mut state, payment_id)?;
            contract_id
        };
        warn!(payment_id, contract_id = %contract_id, "payment deleted and ledger resweeped");
        self.log_event(EngineEvent::PaymentDeleted {
            payment_id: payment_id.to_string(),
            contract_id,
        });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Audit log and checkpointing
    // ------------------------------------------------------------------

    /// A copy of the audit log entries, in sequence order
    pub fn events(&self) -> Result<Vec<RecordedEvent>, EngineError> {
        let log = self.events.lock().map_err(|_| EngineError::StatePoisoned)?;
        Ok(log.entries().to_vec())
    }

    /// Capture a validated snapshot of the current state
    pub fn snapshot(&self) -> Result<checkpoint::StateSnapshot, EngineError> {
        let state = self.read_state()?;
        checkpoint::capture(&state)
    }

    /// Replace the engine state with a snapshot's content
    ///
    /// The snapshot is fully validated (hash and state invariants) before
    /// the running state is touched; a rejected snapshot changes nothing.
    pub fn restore(&self, snapshot: &checkpoint::StateSnapshot) -> Result<(), EngineError> {
        let restored = checkpoint::restore(snapshot)?;
        let mut state = self.write_state()?;
        *state = restored;
        info!("engine state restored from snapshot");
        Ok(())
    }
}
