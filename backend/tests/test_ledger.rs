//! Tests for the payment reconciliation ledger
//!
//! Conservation invariant checked throughout: per contract, the sum of
//! installment amounts paid equals gross payments minus refunds.

use chrono::NaiveDate;
use dormitory_core_rs::catalog;
use dormitory_core_rs::contracts;
use dormitory_core_rs::ledger::{self, LedgerError};
use dormitory_core_rs::models::facility::{BedType, RoomType};
use dormitory_core_rs::models::installment::InstallmentStatus;
use dormitory_core_rs::models::payment::PaymentMethod;
use dormitory_core_rs::models::state::EngineState;
use dormitory_core_rs::models::student::Student;
use dormitory_core_rs::plan;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// Three-month contract at 100_000/month
fn state_with_contract() -> (EngineState, String) {
    let mut state = EngineState::new();
    let floor = catalog::create_floor(&mut state, 1).unwrap();
    let room = catalog::create_room(&mut state, floor.id(), 101, RoomType::Single).unwrap();
    let bed = catalog::create_bed(&mut state, room.id(), 1, BedType::Bottom).unwrap();
    let student = Student::new("Ada".into(), "AB123".into(), "MIT".into(), None);
    let student_id = student.id().to_string();
    state.add_student(student);
    let contract = contracts::create_contract(
        &mut state,
        &student_id,
        bed.id(),
        d(2024, 1, 1),
        d(2024, 4, 1),
        100_000,
    )
    .unwrap();
    (state, contract.id().to_string())
}

fn assert_conserved(state: &EngineState, contract_id: &str) {
    assert_eq!(
        state.applied_total(contract_id),
        state.net_receipts(contract_id),
        "ledger conservation broken"
    );
    assert!(state.invariant_violations().is_empty());
}

#[test]
fn test_single_payment_spans_installments() {
    let (mut state, cid) = state_with_contract();
    ledger::record_payment(&mut state, &cid, d(2024, 1, 5), 150_000, PaymentMethod::Cash, None)
        .unwrap();

    let plan = state.plan(&cid).unwrap();
    assert_eq!(plan[0].status(), InstallmentStatus::Paid);
    assert_eq!(plan[1].status(), InstallmentStatus::PartiallyPaid);
    assert_eq!(plan[1].amount_paid(), 50_000);
    assert_eq!(plan[2].status(), InstallmentStatus::Unpaid);
    assert_eq!(plan::statistics(plan).completion_percentage, 50.0);
    assert_conserved(&state, &cid);
}

#[test]
fn test_payments_accumulate_in_order() {
    let (mut state, cid) = state_with_contract();
    for _ in 0..3 {
        ledger::record_payment(
            &mut state,
            &cid,
            d(2024, 1, 5),
            60_000,
            PaymentMethod::BankTransfer,
            None,
        )
        .unwrap();
    }

    let plan = state.plan(&cid).unwrap();
    assert_eq!(plan[0].amount_paid(), 100_000);
    assert_eq!(plan[1].amount_paid(), 80_000);
    assert_eq!(plan[2].amount_paid(), 0);
    assert_conserved(&state, &cid);
}

#[test]
fn test_overpayment_is_never_lost() {
    let (mut state, cid) = state_with_contract();
    ledger::record_payment(&mut state, &cid, d(2024, 1, 5), 500_000, PaymentMethod::Cash, None)
        .unwrap();

    let plan = state.plan(&cid).unwrap();
    assert_eq!(plan[0].amount_paid(), 100_000);
    assert_eq!(plan[1].amount_paid(), 100_000);
    // 200_000 of overpayment lands on the final installment
    assert_eq!(plan[2].amount_paid(), 300_000);

    let stats = plan::statistics(plan);
    assert_eq!(stats.remaining_amount, -200_000);
    assert_eq!(stats.completion_percentage, 100.0);
    assert_conserved(&state, &cid);
}

#[test]
fn test_refund_restores_one_third_completion() {
    let (mut state, cid) = state_with_contract();
    let payment =
        ledger::record_payment(&mut state, &cid, d(2024, 1, 5), 150_000, PaymentMethod::Cash, None)
            .unwrap();

    ledger::refund_payment(&mut state, payment.id(), 50_000, d(2024, 1, 20), Some("overcharged".into()))
        .unwrap();

    let plan = state.plan(&cid).unwrap();
    assert_eq!(plan[0].amount_paid(), 100_000);
    assert_eq!(plan[1].amount_paid(), 0);
    let stats = plan::statistics(plan);
    assert!((stats.completion_percentage - 100.0 / 3.0).abs() < 1e-9);

    let refunded = state.get_payment(payment.id()).unwrap();
    assert_eq!(refunded.net_amount(), 100_000);
    let refund = refunded.refund().unwrap();
    assert_eq!(refund.amount, 50_000);
    assert_eq!(refund.date, d(2024, 1, 20));
    assert_conserved(&state, &cid);
}

#[test]
fn test_full_refund_zeroes_the_trail() {
    let (mut state, cid) = state_with_contract();
    let payment =
        ledger::record_payment(&mut state, &cid, d(2024, 1, 5), 250_000, PaymentMethod::Cash, None)
            .unwrap();

    ledger::refund_payment(&mut state, payment.id(), 250_000, d(2024, 1, 20), None).unwrap();

    let plan = state.plan(&cid).unwrap();
    assert!(plan.iter().all(|i| i.amount_paid() == 0));
    assert_conserved(&state, &cid);
}

#[test]
fn test_refund_of_overfilled_payment() {
    let (mut state, cid) = state_with_contract();
    let payment =
        ledger::record_payment(&mut state, &cid, d(2024, 1, 5), 400_000, PaymentMethod::Cash, None)
            .unwrap();

    // Reverses the overfill slice first
    ledger::refund_payment(&mut state, payment.id(), 100_000, d(2024, 1, 20), None).unwrap();

    let plan = state.plan(&cid).unwrap();
    assert_eq!(plan[2].amount_paid(), 100_000);
    assert_eq!(plan::statistics(plan).remaining_amount, 0);
    assert_conserved(&state, &cid);
}

#[test]
fn test_delete_middle_payment_resweeps_later_ones() {
    let (mut state, cid) = state_with_contract();
    let p1 =
        ledger::record_payment(&mut state, &cid, d(2024, 1, 5), 100_000, PaymentMethod::Cash, None)
            .unwrap();
    ledger::record_payment(&mut state, &cid, d(2024, 2, 5), 100_000, PaymentMethod::Cash, None)
        .unwrap();
    ledger::record_payment(&mut state, &cid, d(2024, 3, 5), 50_000, PaymentMethod::Cash, None)
        .unwrap();

    ledger::delete_payment(&mut state, p1.id()).unwrap();

    // Survivors (100_000 + 50_000) resweep from the first installment
    let plan = state.plan(&cid).unwrap();
    assert_eq!(plan[0].amount_paid(), 100_000);
    assert_eq!(plan[1].amount_paid(), 50_000);
    assert_eq!(plan[2].amount_paid(), 0);
    assert_conserved(&state, &cid);
}

#[test]
fn test_same_date_payments_replay_in_insertion_order() {
    let (mut state, cid) = state_with_contract();
    let p1 =
        ledger::record_payment(&mut state, &cid, d(2024, 1, 5), 30_000, PaymentMethod::Cash, None)
            .unwrap();
    let p2 =
        ledger::record_payment(&mut state, &cid, d(2024, 1, 5), 70_000, PaymentMethod::Cash, None)
            .unwrap();
    ledger::record_payment(&mut state, &cid, d(2024, 1, 5), 20_000, PaymentMethod::Cash, None)
        .unwrap();

    ledger::delete_payment(&mut state, p1.id()).unwrap();

    // p2 replays before the third payment (same date, lower seq)
    let survivors = state.payments_for_contract(&cid);
    assert_eq!(survivors[0].id(), p2.id());
    assert_eq!(survivors[0].allocations()[0].amount, 70_000);
    assert_conserved(&state, &cid);
}

#[test]
fn test_arrears_payment_allowed_until_termination_date() {
    let (mut state, cid) = state_with_contract();
    contracts::terminate_contract(&mut state, &cid, "moved out", d(2024, 2, 15)).unwrap();

    ledger::record_payment(&mut state, &cid, d(2024, 2, 15), 100_000, PaymentMethod::Cash, None)
        .unwrap();
    assert_eq!(
        ledger::record_payment(&mut state, &cid, d(2024, 2, 16), 1, PaymentMethod::Cash, None),
        Err(LedgerError::ContractTerminated {
            id: cid.clone(),
            terminated_on: d(2024, 2, 15)
        })
    );
    assert_conserved(&state, &cid);
}

#[test]
fn test_invalid_amounts_rejected() {
    let (mut state, cid) = state_with_contract();
    for bad in [0, -100] {
        assert_eq!(
            ledger::record_payment(&mut state, &cid, d(2024, 1, 5), bad, PaymentMethod::Cash, None),
            Err(LedgerError::InvalidAmount)
        );
    }
    let payment =
        ledger::record_payment(&mut state, &cid, d(2024, 1, 5), 100_000, PaymentMethod::Cash, None)
            .unwrap();
    assert_eq!(
        ledger::refund_payment(&mut state, payment.id(), 0, d(2024, 1, 6), None),
        Err(LedgerError::InvalidAmount)
    );
    assert_conserved(&state, &cid);
}
