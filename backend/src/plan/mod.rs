//! Payment Plan Generator
//!
//! Derives the monthly amortization schedule from a contract's term and
//! fee, and computes the aggregate statistics the presentation layer shows
//! (paid/unpaid months, totals, completion percentage).
//!
//! # Schedule rules
//!
//! - One installment per calendar month from the start date, due on the
//!   start's day-of-month, clamped to the last valid day in short months
//! - A term that ends mid-month gets a final installment prorated by
//!   elapsed days over the nominal month length (integer division)
//!
//! CRITICAL: All money values are i64 (smallest currency unit); the only
//! float is `completion_percentage`, a display metric.

use crate::core::dates::{add_months, full_months_between, has_partial_tail};
use crate::models::contract::{Contract, ContractPaymentStatus};
use crate::models::installment::{Installment, InstallmentStatus};
use serde::{Deserialize, Serialize};

/// Generate the full installment schedule for a contract
///
/// Pure: reads the contract's dates and fee, allocates nothing in state.
/// The lifecycle manager stores the result in the same atomic unit as the
/// contract itself.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use dormitory_core_rs::models::contract::{BedLocation, Contract};
/// use dormitory_core_rs::plan::generate_plan;
///
/// let contract = Contract::new(
///     "C-000001".to_string(),
///     "s1".to_string(),
///     "b1".to_string(),
///     BedLocation { floor_number: 1, room_number: 101, bed_number: 1 },
///     NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
///     NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
///     500_000,
///     12,
/// );
///
/// let plan = generate_plan(&contract);
/// assert_eq!(plan.len(), 12);
/// assert!(plan.iter().all(|i| i.amount_due() == 500_000));
/// ```
pub fn generate_plan(contract: &Contract) -> Vec<Installment> {
    let start = contract.start_date();
    let end = contract.end_date();
    let fee = contract.monthly_fee();

    let full = full_months_between(start, end);
    let mut installments = Vec::with_capacity(full as usize + 1);

    for i in 0..full {
        installments.push(Installment::new(
            contract.id().to_string(),
            add_months(start, i),
            fee,
        ));
    }

    if has_partial_tail(start, end) {
        let period_start = add_months(start, full);
        let nominal_end = add_months(start, full + 1);
        let nominal_days = (nominal_end - period_start).num_days();
        let elapsed_days = (end - period_start).num_days();
        // Integer proration; a very short tail can round down to zero due
        let due = fee * elapsed_days / nominal_days;
        installments.push(Installment::new(
            contract.id().to_string(),
            period_start,
            due,
        ));
    }

    installments
}

/// Aggregate statistics over a contract's plan
///
/// Recomputed on read from the installments; never stored independently,
/// so it can not drift from the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStatistics {
    /// Number of installments in the plan
    pub total_months: u32,

    /// Installments fully paid
    pub paid_months: u32,

    /// Installments not yet fully paid
    pub unpaid_months: u32,

    /// Sum of amounts due (smallest currency unit)
    pub total_fee: i64,

    /// Sum of amounts applied (smallest currency unit)
    pub total_paid: i64,

    /// `total_fee - total_paid`; negative when overpaid
    pub remaining_amount: i64,

    /// `total_paid / total_fee * 100`, clamped to [0, 100]; 0 for an empty fee
    pub completion_percentage: f64,
}

/// Compute plan statistics from the installments
pub fn statistics(installments: &[Installment]) -> PlanStatistics {
    let total_months = installments.len() as u32;
    let paid_months = installments
        .iter()
        .filter(|i| i.status() == InstallmentStatus::Paid)
        .count() as u32;
    let total_fee: i64 = installments.iter().map(|i| i.amount_due()).sum();
    let total_paid: i64 = installments.iter().map(|i| i.amount_paid()).sum();

    let completion_percentage = if total_fee == 0 {
        0.0
    } else {
        (total_paid as f64 / total_fee as f64 * 100.0).clamp(0.0, 100.0)
    };

    PlanStatistics {
        total_months,
        paid_months,
        unpaid_months: total_months - paid_months,
        total_fee,
        total_paid,
        remaining_amount: total_fee - total_paid,
        completion_percentage,
    }
}

/// Derive the contract-level payment status from its installments
///
/// `FullyPaid` iff every installment is paid; `Unpaid` iff nothing has been
/// received; `PartiallyPaid` otherwise. An all-paid plan wins over the
/// zero-received check so a zero-fee plan reads as fully paid.
pub fn contract_payment_status(installments: &[Installment]) -> ContractPaymentStatus {
    let all_paid = installments
        .iter()
        .all(|i| i.status() == InstallmentStatus::Paid);
    if all_paid {
        return ContractPaymentStatus::FullyPaid;
    }
    let total_paid: i64 = installments.iter().map(|i| i.amount_paid()).sum();
    if total_paid == 0 {
        ContractPaymentStatus::Unpaid
    } else {
        ContractPaymentStatus::PartiallyPaid
    }
}
