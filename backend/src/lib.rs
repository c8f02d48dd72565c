//! Dormitory Core - Rust Engine
//!
//! In-memory dormitory occupancy and contract-payment reconciliation
//! engine: facility catalog, bed allocation, contract lifecycle, payment
//! plan generation, and the payment reconciliation ledger.
//!
//! # Architecture
//!
//! - **core**: Calendar month arithmetic
//! - **models**: Domain types (Floor, Room, Bed, Student, Contract,
//!   Installment, Payment, State)
//! - **catalog**: Facility tree, uniqueness rules, floor-plan projection
//! - **allocation**: Bed occupancy state machine
//! - **contracts**: Contract lifecycle (create, sign, reassign, terminate)
//! - **plan**: Payment plan generation and statistics
//! - **ledger**: Payment recording, refunds, deletion resweep
//! - **events**: Append-only audit log
//! - **engine**: Thread-safe facade and checkpointing
//!
//! # Critical Invariants
//!
//! 1. All money values are i64 (smallest currency unit)
//! 2. A bed is Occupied iff exactly one non-terminated contract holds it
//! 3. Per contract, applied installment money equals net payment receipts

// Module declarations
pub mod allocation;
pub mod catalog;
pub mod contracts;
pub mod core;
pub mod engine;
pub mod events;
pub mod ledger;
pub mod models;
pub mod plan;

// Re-exports for convenience
pub use allocation::AllocationError;
pub use catalog::{CatalogError, FloorPlan};
pub use contracts::ContractError;
pub use engine::{checkpoint::StateSnapshot, ContractDetail, Engine, EngineError};
pub use events::{EngineEvent, EventLog, RecordedEvent};
pub use ledger::LedgerError;
pub use models::{
    contract::{Contract, ContractPaymentStatus, ContractStatus},
    facility::{Bed, BedStatus, BedType, Floor, Room, RoomType},
    installment::{Installment, InstallmentStatus},
    payment::{Payment, PaymentMethod},
    state::EngineState,
    student::Student,
};
pub use plan::{contract_payment_status, generate_plan, statistics, PlanStatistics};
