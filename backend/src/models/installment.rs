//! Payment plan installment model
//!
//! One installment per calendar month of a contract's term, due on the
//! start date's day-of-month (clamped in short months). Installments are
//! owned by their contract and never outlive it.
//!
//! CRITICAL: All money values are i64 (smallest currency unit)

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from installment-local mutations
#[derive(Debug, Error, PartialEq)]
pub enum InstallmentError {
    #[error("Amount must be positive")]
    InvalidAmount,

    #[error("Reversal {amount} exceeds amount paid {paid}")]
    ReversalExceedsPaid { amount: i64, paid: i64 },
}

/// Payment status of a single installment
///
/// Derived from the amounts: `Paid` iff `amount_paid >= amount_due`,
/// `PartiallyPaid` iff `0 < amount_paid < amount_due`, `Unpaid` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallmentStatus {
    Unpaid,
    PartiallyPaid,
    Paid,
}

/// One calendar month's due amount within a contract's plan
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use dormitory_core_rs::models::installment::{Installment, InstallmentStatus};
///
/// let mut inst = Installment::new(
///     "contract-1".to_string(),
///     NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
///     100_000,
/// );
/// assert_eq!(inst.status(), InstallmentStatus::Unpaid);
///
/// let applied = inst.apply(60_000).unwrap();
/// assert_eq!(applied, 60_000);
/// assert_eq!(inst.status(), InstallmentStatus::PartiallyPaid);
///
/// inst.apply(40_000).unwrap();
/// assert_eq!(inst.status(), InstallmentStatus::Paid);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    /// Unique installment identifier (UUID)
    id: String,

    /// Owning contract
    contract_id: String,

    /// Due date (start day-of-month, clamped)
    due_date: NaiveDate,

    /// Amount due for this month; the final month of a mid-month term is
    /// prorated and may be smaller than the monthly fee
    amount_due: i64,

    /// Cumulative amount applied against this installment
    ///
    /// The final installment of a plan may be overfilled past `amount_due`
    /// when a contract is overpaid; see the ledger's overpayment policy.
    amount_paid: i64,

    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Installment {
    /// Create a new unpaid installment
    pub fn new(contract_id: String, due_date: NaiveDate, amount_due: i64) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            contract_id,
            due_date,
            amount_due,
            amount_paid: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn contract_id(&self) -> &str {
        &self.contract_id
    }

    pub fn due_date(&self) -> NaiveDate {
        self.due_date
    }

    /// Amount due (smallest currency unit)
    pub fn amount_due(&self) -> i64 {
        self.amount_due
    }

    /// Amount applied so far (smallest currency unit)
    pub fn amount_paid(&self) -> i64 {
        self.amount_paid
    }

    /// Amount still owed; zero when paid or overfilled
    pub fn outstanding(&self) -> i64 {
        (self.amount_due - self.amount_paid).max(0)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Derived payment status
    pub fn status(&self) -> InstallmentStatus {
        if self.amount_paid >= self.amount_due {
            InstallmentStatus::Paid
        } else if self.amount_paid > 0 {
            InstallmentStatus::PartiallyPaid
        } else {
            InstallmentStatus::Unpaid
        }
    }

    /// Apply money up to the outstanding amount; returns the amount consumed
    ///
    /// Never overfills: the ledger decides separately where overpayment
    /// lands (see `apply_overfill`).
    pub fn apply(&mut self, amount: i64) -> Result<i64, InstallmentError> {
        if amount <= 0 {
            return Err(InstallmentError::InvalidAmount);
        }
        let consumed = amount.min(self.outstanding());
        if consumed > 0 {
            self.amount_paid += consumed;
            self.updated_at = Utc::now();
        }
        Ok(consumed)
    }

    /// Apply money past the due amount (overpayment landing spot)
    ///
    /// Used by the ledger only for the final installment of a plan so that
    /// ledger conservation holds exactly.
    pub fn apply_overfill(&mut self, amount: i64) -> Result<(), InstallmentError> {
        if amount <= 0 {
            return Err(InstallmentError::InvalidAmount);
        }
        self.amount_paid += amount;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Reverse previously applied money (refund path)
    pub fn reverse(&mut self, amount: i64) -> Result<(), InstallmentError> {
        if amount <= 0 {
            return Err(InstallmentError::InvalidAmount);
        }
        if amount > self.amount_paid {
            return Err(InstallmentError::ReversalExceedsPaid {
                amount,
                paid: self.amount_paid,
            });
        }
        self.amount_paid -= amount;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Zero the paid amount (full resweep after a payment deletion)
    pub(crate) fn reset_paid(&mut self) {
        if self.amount_paid != 0 {
            self.amount_paid = 0;
            self.updated_at = Utc::now();
        }
    }
}
