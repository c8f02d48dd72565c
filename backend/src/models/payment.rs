//! Payment model
//!
//! A payment is immutable once recorded, except for a single optional
//! refund overlay. The ledger records, at application time, exactly how the
//! payment was spread across installments; that allocation trail is what a
//! refund reverses (newest-touched-first).
//!
//! CRITICAL: All money values are i64 (smallest currency unit)

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from payment-local mutations
#[derive(Debug, Error, PartialEq)]
pub enum PaymentStateError {
    #[error("Payment {id} already has a refund")]
    AlreadyRefunded { id: String },

    #[error("Refund {refund} exceeds payment amount {amount}")]
    RefundExceedsPayment { refund: i64, amount: i64 },

    #[error("Amount must be positive")]
    InvalidAmount,
}

/// How the money arrived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    CardTransfer,
    BankTransfer,
}

/// One slice of a payment applied to one installment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub installment_id: String,
    pub amount: i64,
}

/// Refund overlay on a payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Refund {
    pub amount: i64,
    pub date: NaiveDate,
    pub comment: Option<String>,
}

/// A recorded payment against a contract
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use dormitory_core_rs::models::payment::{Payment, PaymentMethod};
///
/// let payment = Payment::new(
///     "contract-1".to_string(),
///     NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
///     150_000,
///     PaymentMethod::Cash,
///     None,
///     1,
/// );
/// assert_eq!(payment.net_amount(), 150_000);
/// assert!(payment.refund().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    /// Unique payment identifier (UUID)
    id: String,

    /// Contract this payment reconciles against
    contract_id: String,

    /// Calendar date the money was received
    payment_date: NaiveDate,

    /// Gross amount received (smallest currency unit)
    amount: i64,

    method: PaymentMethod,

    comment: Option<String>,

    /// How this payment was spread across installments, in application
    /// order (oldest installment first)
    allocations: Vec<Allocation>,

    /// At most one refund per payment
    refund: Option<Refund>,

    /// Insertion sequence, used to order same-date payments on replay
    seq: u64,

    created_at: DateTime<Utc>,
}

impl Payment {
    /// Record a new payment (allocations filled in by the ledger)
    pub fn new(
        contract_id: String,
        payment_date: NaiveDate,
        amount: i64,
        method: PaymentMethod,
        comment: Option<String>,
        seq: u64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            contract_id,
            payment_date,
            amount,
            method,
            comment,
            allocations: Vec::new(),
            refund: None,
            seq,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn contract_id(&self) -> &str {
        &self.contract_id
    }

    pub fn payment_date(&self) -> NaiveDate {
        self.payment_date
    }

    /// Gross amount (smallest currency unit)
    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn method(&self) -> PaymentMethod {
        self.method
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn allocations(&self) -> &[Allocation] {
        &self.allocations
    }

    pub fn refund(&self) -> Option<&Refund> {
        self.refund.as_ref()
    }

    pub fn is_refunded(&self) -> bool {
        self.refund.is_some()
    }

    /// Amount net of any refund (smallest currency unit)
    pub fn net_amount(&self) -> i64 {
        self.amount - self.refund.as_ref().map_or(0, |r| r.amount)
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Record where the ledger put this payment's money
    pub(crate) fn set_allocations(&mut self, allocations: Vec<Allocation>) {
        self.allocations = allocations;
    }

    /// Attach the refund overlay
    ///
    /// Validates amount bounds and single-refund rule; the ledger reverses
    /// the installment side before calling this.
    pub(crate) fn set_refund(
        &mut self,
        amount: i64,
        date: NaiveDate,
        comment: Option<String>,
    ) -> Result<(), PaymentStateError> {
        if self.refund.is_some() {
            return Err(PaymentStateError::AlreadyRefunded {
                id: self.id.clone(),
            });
        }
        if amount <= 0 {
            return Err(PaymentStateError::InvalidAmount);
        }
        if amount > self.amount {
            return Err(PaymentStateError::RefundExceedsPayment {
                refund: amount,
                amount: self.amount,
            });
        }
        self.refund = Some(Refund {
            amount,
            date,
            comment,
        });
        Ok(())
    }
}
