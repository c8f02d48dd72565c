//! Payment Reconciliation Ledger
//!
//! Records payments against a contract and reconciles them into the
//! payment plan: money sweeps oldest-due-first across installments, and
//! every payment keeps an allocation trail saying exactly where its money
//! landed. Refunds reverse that trail; deletions trigger a full resweep.
//!
//! # Critical Invariants
//!
//! 1. **Conservation**: per contract,
//!    `sum(installment.amount_paid) == sum(payment.amount) - sum(refund.amount)`
//!    after every ledger operation
//! 2. Overpayment lands as overfill on the final installment, never lost
//! 3. At most one refund per payment; a refund reverses only that
//!    payment's own allocations, newest-touched-first
//!
//! CRITICAL: All money values are i64 (smallest currency unit)

use crate::models::installment::{Installment, InstallmentError};
use crate::models::payment::{Allocation, Payment, PaymentMethod, PaymentStateError};
use crate::models::state::EngineState;
use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur during ledger operations
#[derive(Debug, Error, PartialEq)]
pub enum LedgerError {
    #[error("Contract {id} not found")]
    ContractNotFound { id: String },

    #[error("Contract {id} has no payment plan")]
    PlanNotFound { id: String },

    #[error("Payment {id} not found")]
    PaymentNotFound { id: String },

    #[error("Amount must be positive")]
    InvalidAmount,

    #[error("Contract {id} was terminated on {terminated_on}")]
    ContractTerminated {
        id: String,
        terminated_on: NaiveDate,
    },

    #[error("Payment {id} already has a refund")]
    AlreadyRefunded { id: String },

    #[error("Refund {refund} exceeds payment amount {amount}")]
    RefundExceedsPayment { refund: i64, amount: i64 },

    #[error("Reversal {amount} exceeds amount paid {paid}")]
    ReversalExceedsPaid { amount: i64, paid: i64 },
}

impl From<PaymentStateError> for LedgerError {
    fn from(err: PaymentStateError) -> Self {
        match err {
            PaymentStateError::AlreadyRefunded { id } => LedgerError::AlreadyRefunded { id },
            PaymentStateError::RefundExceedsPayment { refund, amount } => {
                LedgerError::RefundExceedsPayment { refund, amount }
            }
            PaymentStateError::InvalidAmount => LedgerError::InvalidAmount,
        }
    }
}

impl From<InstallmentError> for LedgerError {
    fn from(err: InstallmentError) -> Self {
        match err {
            InstallmentError::InvalidAmount => LedgerError::InvalidAmount,
            InstallmentError::ReversalExceedsPaid { amount, paid } => {
                LedgerError::ReversalExceedsPaid { amount, paid }
            }
        }
    }
}

/// Sweep an amount through a plan, oldest due date first
///
/// Fills outstanding installments in order; anything left after the last
/// installment is satisfied overfills the final one so the contract-level
/// conservation sum stays exact. Consecutive slices landing on the same
/// installment are merged into one allocation entry.
fn sweep(plan: &mut [Installment], amount: i64) -> Result<Vec<Allocation>, LedgerError> {
    let mut remaining = amount;
    let mut allocations: Vec<Allocation> = Vec::new();

    let mut push = |allocations: &mut Vec<Allocation>, installment_id: &str, amount: i64| {
        match allocations.last_mut() {
            Some(last) if last.installment_id == installment_id => last.amount += amount,
            _ => allocations.push(Allocation {
                installment_id: installment_id.to_string(),
                amount,
            }),
        }
    };

    for installment in plan.iter_mut() {
        if remaining == 0 {
            break;
        }
        let consumed = installment.apply(remaining)?;
        if consumed > 0 {
            push(&mut allocations, installment.id(), consumed);
            remaining -= consumed;
        }
    }

    if remaining > 0 {
        if let Some(last) = plan.last_mut() {
            last.apply_overfill(remaining)?;
            push(&mut allocations, last.id(), remaining);
        }
    }

    Ok(allocations)
}

/// Record a payment and reconcile it into the contract's plan
///
/// The money sweeps oldest-due-first; overpayment overfills the final
/// installment. Payments against a terminated contract are accepted only
/// when dated on or before the termination date (settling arrears), and
/// rejected otherwise.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use dormitory_core_rs::catalog;
/// use dormitory_core_rs::contracts;
/// use dormitory_core_rs::ledger;
/// use dormitory_core_rs::models::facility::{BedType, RoomType};
/// use dormitory_core_rs::models::payment::PaymentMethod;
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
/// let contract = contracts::create_contract(
///     &mut state,
///     &student_id,
///     bed.id(),
///     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
///     100_000,
/// )
/// .unwrap();
///
/// let payment = ledger::record_payment(
///     &mut state,
///     contract.id(),
///     NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
///     150_000,
///     PaymentMethod::Cash,
///     None,
/// )
/// .unwrap();
/// assert_eq!(payment.allocations().len(), 2);
/// assert_eq!(state.applied_total(contract.id()), 150_000);
/// ```
pub fn record_payment(
    state: &mut EngineState,
    contract_id: &str,
    payment_date: NaiveDate,
    amount: i64,
    method: PaymentMethod,
    comment: Option<String>,
) -> Result<Payment, LedgerError> {
    if amount <= 0 {
        return Err(LedgerError::InvalidAmount);
    }
    let contract = state
        .get_contract(contract_id)
        .ok_or_else(|| LedgerError::ContractNotFound {
            id: contract_id.to_string(),
        })?;
    if let Some(termination) = contract.termination() {
        if payment_date > termination.date {
            return Err(LedgerError::ContractTerminated {
                id: contract_id.to_string(),
                terminated_on: termination.date,
            });
        }
    }

    let plan = state
        .plan_mut(contract_id)
        .ok_or_else(|| LedgerError::PlanNotFound {
            id: contract_id.to_string(),
        })?;
    let allocations = sweep(plan, amount)?;

    let seq = state.next_payment_seq();
    let mut payment = Payment::new(
        contract_id.to_string(),
        payment_date,
        amount,
        method,
        comment,
        seq,
    );
    payment.set_allocations(allocations);
    state.add_payment(payment.clone());
    Ok(payment)
}

/// Refund part or all of a payment
///
/// Reverses the payment's own allocation trail newest-touched-first for
/// exactly the refunded amount, then attaches the refund overlay. A second
/// refund of the same payment is rejected.
pub fn refund_payment(
    state: &mut EngineState,
    payment_id: &str,
    amount: i64,
    date: NaiveDate,
    comment: Option<String>,
) -> Result<Payment, LedgerError> {
    let (contract_id, allocations, gross, refunded) = match state.get_payment(payment_id) {
        Some(p) => (
            p.contract_id().to_string(),
            p.allocations().to_vec(),
            p.amount(),
            p.is_refunded(),
        ),
        None => {
            return Err(LedgerError::PaymentNotFound {
                id: payment_id.to_string(),
            })
        }
    };

    // Validate before touching any installment, so a rejected refund
    // mutates nothing.
    if refunded {
        return Err(LedgerError::AlreadyRefunded {
            id: payment_id.to_string(),
        });
    }
    if amount <= 0 {
        return Err(LedgerError::InvalidAmount);
    }
    if amount > gross {
        return Err(LedgerError::RefundExceedsPayment {
            refund: amount,
            amount: gross,
        });
    }

    let plan = state
        .plan_mut(&contract_id)
        .ok_or_else(|| LedgerError::PlanNotFound {
            id: contract_id.clone(),
        })?;
    let mut remaining = amount;
    for allocation in allocations.iter().rev() {
        if remaining == 0 {
            break;
        }
        let slice = remaining.min(allocation.amount);
        let installment = plan
            .iter_mut()
            .find(|i| i.id() == allocation.installment_id)
            .ok_or(LedgerError::ReversalExceedsPaid {
                amount: slice,
                paid: 0,
            })?;
        installment.reverse(slice)?;
        remaining -= slice;
    }

    let payment = state
        .get_payment_mut(payment_id)
        .ok_or_else(|| LedgerError::PaymentNotFound {
            id: payment_id.to_string(),
        })?;
    payment.set_refund(amount, date, comment)?;
    Ok(payment.clone())
}

/// Delete a payment recorded in error and resweep the whole contract
///
/// Removing a payment from the middle of the history invalidates every
/// later allocation, so the ledger replays all surviving payments (net of
/// refunds) in `(payment_date, seq)` order from a zeroed plan and rebuilds
/// their allocation trails.
pub fn delete_payment(state: &mut EngineState, payment_id: &str) -> Result<(), LedgerError> {
    let contract_id = match state.get_payment(payment_id) {
        Some(p) => p.contract_id().to_string(),
        None => {
            return Err(LedgerError::PaymentNotFound {
                id: payment_id.to_string(),
            })
        }
    };
    state.remove_payment(payment_id);
    reconcile_contract(state, &contract_id)
}

/// Replay a contract's surviving payments from a zeroed plan
fn reconcile_contract(state: &mut EngineState, contract_id: &str) -> Result<(), LedgerError> {
    let payment_ids: Vec<String> = state
        .payments_for_contract(contract_id)
        .iter()
        .map(|p| p.id().to_string())
        .collect();

    {
        let plan = state
            .plan_mut(contract_id)
            .ok_or_else(|| LedgerError::PlanNotFound {
                id: contract_id.to_string(),
            })?;
        for installment in plan.iter_mut() {
            installment.reset_paid();
        }
    }

    for payment_id in payment_ids {
        let net = match state.get_payment(&payment_id) {
            Some(p) => p.net_amount(),
            None => continue,
        };
        let allocations = if net > 0 {
            let plan = state
                .plan_mut(contract_id)
                .ok_or_else(|| LedgerError::PlanNotFound {
                    id: contract_id.to_string(),
                })?;
            sweep(plan, net)?
        } else {
            Vec::new()
        };
        if let Some(payment) = state.get_payment_mut(&payment_id) {
            payment.set_allocations(allocations);
        }
    }
    Ok(())
}
