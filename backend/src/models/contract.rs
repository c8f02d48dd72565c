//! Contract model
//!
//! A contract binds exactly one student to exactly one bed for a date range
//! at a fixed monthly fee. The referenced floor/room/bed numbers are
//! snapshotted at creation so historical contracts stay readable even if
//! inventory numbering changes later.
//!
//! # Status model
//!
//! - `status` (`Unsigned`/`Signed`) is an orthogonal sub-state of a live
//!   contract, tracked independently of termination.
//! - `termination` is a terminal overlay: once set, the contract is
//!   immutable except for reads, and its bed reverts to `Free`.
//!
//! CRITICAL: All money values are i64 (smallest currency unit)

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from contract-local state transitions
#[derive(Debug, Error, PartialEq)]
pub enum ContractStateError {
    #[error("Contract {id} is terminated")]
    Terminated { id: String },
}

/// Signing sub-state of a live contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    /// Created but not yet signed by the student
    Unsigned,

    /// Signed and fully in force
    Signed,
}

/// Derived payment progress of a contract's plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractPaymentStatus {
    /// No money received yet
    Unpaid,

    /// Some installments covered, not all
    PartiallyPaid,

    /// Every installment is fully paid
    FullyPaid,
}

/// Snapshot of the bed's physical address at contract-creation time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BedLocation {
    pub floor_number: u32,
    pub room_number: u32,
    pub bed_number: u32,
}

/// Termination overlay: why and when a contract was closed early
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Termination {
    pub reason: String,
    pub date: NaiveDate,
}

/// A bed-occupancy contract
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use dormitory_core_rs::models::contract::Contract;
/// use dormitory_core_rs::models::contract::BedLocation;
///
/// let contract = Contract::new(
///     "C-000001".to_string(),
///     "student-1".to_string(),
///     "bed-1".to_string(),
///     BedLocation { floor_number: 2, room_number: 204, bed_number: 1 },
///     NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
///     NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
///     500_000,
///     12,
/// );
///
/// assert_eq!(contract.total_price(), 6_000_000);
/// assert!(!contract.is_terminated());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    /// Unique contract identifier (UUID)
    id: String,

    /// Human-facing contract number, unique across the facility
    number: String,

    /// Referenced student (not owned)
    student_id: String,

    /// Currently bound bed (not owned)
    bed_id: String,

    /// Floor/room/bed numbers frozen at creation (or last reassignment)
    location: BedLocation,

    /// First day of the term
    start_date: NaiveDate,

    /// Last day of the term (exclusive for proration purposes)
    end_date: NaiveDate,

    /// Monthly fee in smallest currency unit
    monthly_fee: i64,

    /// `monthly_fee × number_of_months` (partial final month rounds up)
    total_price: i64,

    /// Signing sub-state
    status: ContractStatus,

    /// Terminal overlay; `Some` means the contract is closed
    termination: Option<Termination>,

    created_at: DateTime<Utc>,
}

impl Contract {
    /// Create a new live, unsigned contract
    ///
    /// `number_of_months` is the ceiling month count of the term; the
    /// caller (the lifecycle manager) derives it from the dates.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        number: String,
        student_id: String,
        bed_id: String,
        location: BedLocation,
        start_date: NaiveDate,
        end_date: NaiveDate,
        monthly_fee: i64,
        number_of_months: u32,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            number,
            student_id,
            bed_id,
            location,
            start_date,
            end_date,
            monthly_fee,
            total_price: monthly_fee * number_of_months as i64,
            status: ContractStatus::Unsigned,
            termination: None,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn student_id(&self) -> &str {
        &self.student_id
    }

    pub fn bed_id(&self) -> &str {
        &self.bed_id
    }

    pub fn location(&self) -> BedLocation {
        self.location
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    /// Monthly fee (smallest currency unit)
    pub fn monthly_fee(&self) -> i64 {
        self.monthly_fee
    }

    /// Headline contract price (smallest currency unit)
    pub fn total_price(&self) -> i64 {
        self.total_price
    }

    pub fn status(&self) -> ContractStatus {
        self.status
    }

    pub fn termination(&self) -> Option<&Termination> {
        self.termination.as_ref()
    }

    pub fn is_terminated(&self) -> bool {
        self.termination.is_some()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Mark the contract as signed
    ///
    /// Fails on a terminated contract; signing twice is a no-op.
    pub fn sign(&mut self) -> Result<(), ContractStateError> {
        if self.is_terminated() {
            return Err(ContractStateError::Terminated {
                id: self.id.clone(),
            });
        }
        self.status = ContractStatus::Signed;
        Ok(())
    }

    /// Close the contract with a reason and date
    ///
    /// A second call is reported, not silently accepted: double submission
    /// of a termination is a caller bug worth surfacing.
    pub fn terminate(&mut self, reason: String, date: NaiveDate) -> Result<(), ContractStateError> {
        if self.is_terminated() {
            return Err(ContractStateError::Terminated {
                id: self.id.clone(),
            });
        }
        self.termination = Some(Termination { reason, date });
        Ok(())
    }

    /// Rebind this contract to a different bed, refreshing the snapshot
    ///
    /// Only the lifecycle manager calls this, after the new bed has been
    /// successfully allocated.
    pub(crate) fn rebind_bed(
        &mut self,
        bed_id: String,
        location: BedLocation,
    ) -> Result<(), ContractStateError> {
        if self.is_terminated() {
            return Err(ContractStateError::Terminated {
                id: self.id.clone(),
            });
        }
        self.bed_id = bed_id;
        self.location = location;
        Ok(())
    }
}
