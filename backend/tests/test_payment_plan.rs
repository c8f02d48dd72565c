//! Tests for payment plan generation and statistics

use chrono::{Datelike, NaiveDate};
use dormitory_core_rs::models::contract::{BedLocation, Contract, ContractPaymentStatus};
use dormitory_core_rs::models::installment::InstallmentStatus;
use dormitory_core_rs::plan::{contract_payment_status, generate_plan, statistics};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn contract(start: NaiveDate, end: NaiveDate, fee: i64, months: u32) -> Contract {
    Contract::new(
        "C-000001".to_string(),
        "student-1".to_string(),
        "bed-1".to_string(),
        BedLocation {
            floor_number: 1,
            room_number: 101,
            bed_number: 1,
        },
        start,
        end,
        fee,
        months,
    )
}

#[test]
fn test_year_contract_produces_twelve_equal_installments() {
    let c = contract(d(2024, 1, 15), d(2025, 1, 15), 500_000, 12);
    let plan = generate_plan(&c);

    assert_eq!(plan.len(), 12);
    for (i, inst) in plan.iter().enumerate() {
        assert_eq!(inst.amount_due(), 500_000);
        assert_eq!(inst.due_date().day(), 15, "installment {}", i);
        assert_eq!(inst.contract_id(), c.id());
        assert_eq!(inst.status(), InstallmentStatus::Unpaid);
    }
    assert_eq!(plan[0].due_date(), d(2024, 1, 15));
    assert_eq!(plan[11].due_date(), d(2024, 12, 15));
    assert_eq!(c.total_price(), 6_000_000);
}

#[test]
fn test_due_dates_clamp_in_short_months() {
    let c = contract(d(2024, 10, 31), d(2025, 3, 31), 200_000, 5);
    let plan = generate_plan(&c);

    let dates: Vec<NaiveDate> = plan.iter().map(|i| i.due_date()).collect();
    assert_eq!(
        dates,
        vec![
            d(2024, 10, 31),
            d(2024, 11, 30),
            d(2024, 12, 31),
            d(2025, 1, 31),
            d(2025, 2, 28),
        ]
    );
}

#[test]
fn test_mid_month_end_prorates_the_tail() {
    // Sep 1 .. Dec 16: three whole months plus 15 days of a 31-day period
    let c = contract(d(2024, 9, 1), d(2024, 12, 16), 310_000, 4);
    let plan = generate_plan(&c);

    assert_eq!(plan.len(), 4);
    assert_eq!(plan[3].due_date(), d(2024, 12, 1));
    // Dec 1 -> Jan 1 is 31 days, 15 elapsed
    assert_eq!(plan[3].amount_due(), 310_000 * 15 / 31);

    // total_price uses the ceiling month count, so it is >= the plan total
    let plan_total: i64 = plan.iter().map(|i| i.amount_due()).sum();
    assert_eq!(c.total_price(), 310_000 * 4);
    assert!(plan_total < c.total_price());
}

#[test]
fn test_statistics_track_partial_progress() {
    let c = contract(d(2024, 1, 1), d(2024, 4, 1), 100_000, 3);
    let mut plan = generate_plan(&c);
    plan[0].apply(100_000).unwrap();
    plan[1].apply(50_000).unwrap();

    let stats = statistics(&plan);
    assert_eq!(stats.total_months, 3);
    assert_eq!(stats.paid_months, 1);
    assert_eq!(stats.unpaid_months, 2);
    assert_eq!(stats.total_fee, 300_000);
    assert_eq!(stats.total_paid, 150_000);
    assert_eq!(stats.remaining_amount, 150_000);
    assert_eq!(stats.completion_percentage, 50.0);
    assert_eq!(contract_payment_status(&plan), ContractPaymentStatus::PartiallyPaid);
}

#[test]
fn test_fully_paid_contract_status() {
    let c = contract(d(2024, 1, 1), d(2024, 3, 1), 100_000, 2);
    let mut plan = generate_plan(&c);
    plan[0].apply(100_000).unwrap();
    plan[1].apply(100_000).unwrap();

    assert_eq!(contract_payment_status(&plan), ContractPaymentStatus::FullyPaid);
    assert_eq!(statistics(&plan).completion_percentage, 100.0);
}
