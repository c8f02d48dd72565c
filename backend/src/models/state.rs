//! Engine State
//!
//! The authoritative store behind the whole engine: facility inventory,
//! students, contracts, payment plans and payments, all in flat id-keyed
//! maps. The presentation layer is a pure read/refresh consumer of this
//! state, never a source of truth.
//!
//! # Critical Invariants
//!
//! 1. **Occupancy**: a bed is `Occupied` iff exactly one non-terminated
//!    contract references it
//! 2. **Ledger Conservation**: per contract,
//!    `sum(installment.amount_paid) == sum(payment.amount) - sum(refund.amount)`
//! 3. **Plan Ownership**: every contract has a plan; installments never
//!    outlive their contract
//! 4. **Referential Integrity**: contracts reference existing students and
//!    beds; payments reference existing contracts

use crate::models::contract::Contract;
use crate::models::facility::{Bed, BedStatus, Floor, Room};
use crate::models::installment::Installment;
use crate::models::payment::Payment;
use crate::models::student::Student;
use std::collections::HashMap;

/// Complete engine state
///
/// # Example
///
/// ```rust
/// use dormitory_core_rs::models::facility::Floor;
/// use dormitory_core_rs::models::state::EngineState;
///
/// let mut state = EngineState::new();
/// let floor = Floor::new(1);
/// state.add_floor(floor);
/// assert_eq!(state.num_floors(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EngineState {
    /// All floors, indexed by id
    floors: HashMap<String, Floor>,

    /// All rooms, indexed by id
    rooms: HashMap<String, Room>,

    /// All beds, indexed by id
    beds: HashMap<String, Bed>,

    /// All registered students, indexed by id
    students: HashMap<String, Student>,

    /// All contracts (live and terminated), indexed by id
    contracts: HashMap<String, Contract>,

    /// Payment plan per contract, sorted by due date
    plans: HashMap<String, Vec<Installment>>,

    /// All payments, indexed by id
    payments: HashMap<String, Payment>,

    /// Monotonic counter behind human-facing contract numbers
    contract_counter: u64,

    /// Monotonic counter ordering same-date payments on replay
    payment_counter: u64,
}

impl EngineState {
    /// Create an empty state
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Facility
    // ------------------------------------------------------------------

    pub fn add_floor(&mut self, floor: Floor) {
        self.floors.insert(floor.id().to_string(), floor);
    }

    pub fn get_floor(&self, id: &str) -> Option<&Floor> {
        self.floors.get(id)
    }

    pub fn get_floor_mut(&mut self, id: &str) -> Option<&mut Floor> {
        self.floors.get_mut(id)
    }

    pub fn floors(&self) -> &HashMap<String, Floor> {
        &self.floors
    }

    /// Find a floor by its number, active or not
    pub fn floor_by_number(&self, number: u32) -> Option<&Floor> {
        self.floors.values().find(|f| f.number() == number)
    }

    /// Floors sorted by number (projection order)
    pub fn floors_sorted(&self) -> Vec<&Floor> {
        let mut floors: Vec<&Floor> = self.floors.values().collect();
        floors.sort_by_key(|f| f.number());
        floors
    }

    pub fn add_room(&mut self, room: Room) {
        self.rooms.insert(room.id().to_string(), room);
    }

    pub fn get_room(&self, id: &str) -> Option<&Room> {
        self.rooms.get(id)
    }

    pub fn get_room_mut(&mut self, id: &str) -> Option<&mut Room> {
        self.rooms.get_mut(id)
    }

    pub fn rooms(&self) -> &HashMap<String, Room> {
        &self.rooms
    }

    /// Rooms on a floor, sorted by room number
    pub fn rooms_on_floor(&self, floor_id: &str) -> Vec<&Room> {
        let mut rooms: Vec<&Room> = self
            .rooms
            .values()
            .filter(|r| r.floor_id() == floor_id)
            .collect();
        rooms.sort_by_key(|r| r.number());
        rooms
    }

    /// Ids of rooms on a floor (for cascading mutations)
    pub fn room_ids_on_floor(&self, floor_id: &str) -> Vec<String> {
        self.rooms
            .values()
            .filter(|r| r.floor_id() == floor_id)
            .map(|r| r.id().to_string())
            .collect()
    }

    pub fn add_bed(&mut self, bed: Bed) {
        self.beds.insert(bed.id().to_string(), bed);
    }

    pub fn get_bed(&self, id: &str) -> Option<&Bed> {
        self.beds.get(id)
    }

    pub fn get_bed_mut(&mut self, id: &str) -> Option<&mut Bed> {
        self.beds.get_mut(id)
    }

    pub fn beds(&self) -> &HashMap<String, Bed> {
        &self.beds
    }

    /// Beds in a room, sorted by bed number
    pub fn beds_in_room(&self, room_id: &str) -> Vec<&Bed> {
        let mut beds: Vec<&Bed> = self
            .beds
            .values()
            .filter(|b| b.room_id() == room_id)
            .collect();
        beds.sort_by_key(|b| b.number());
        beds
    }

    /// Ids of beds in a room (for cascading mutations)
    pub fn bed_ids_in_room(&self, room_id: &str) -> Vec<String> {
        self.beds
            .values()
            .filter(|b| b.room_id() == room_id)
            .map(|b| b.id().to_string())
            .collect()
    }

    // ------------------------------------------------------------------
    // Students
    // ------------------------------------------------------------------

    pub fn add_student(&mut self, student: Student) {
        self.students.insert(student.id().to_string(), student);
    }

    pub fn get_student(&self, id: &str) -> Option<&Student> {
        self.students.get(id)
    }

    pub fn students(&self) -> &HashMap<String, Student> {
        &self.students
    }

    // ------------------------------------------------------------------
    // Contracts and plans
    // ------------------------------------------------------------------

    pub fn add_contract(&mut self, contract: Contract) {
        self.contracts.insert(contract.id().to_string(), contract);
    }

    pub fn get_contract(&self, id: &str) -> Option<&Contract> {
        self.contracts.get(id)
    }

    pub fn get_contract_mut(&mut self, id: &str) -> Option<&mut Contract> {
        self.contracts.get_mut(id)
    }

    pub fn remove_contract(&mut self, id: &str) -> Option<Contract> {
        self.plans.remove(id);
        self.contracts.remove(id)
    }

    pub fn contracts(&self) -> &HashMap<String, Contract> {
        &self.contracts
    }

    /// The one non-terminated contract occupying a bed, if any
    pub fn active_contract_for_bed(&self, bed_id: &str) -> Option<&Contract> {
        self.contracts
            .values()
            .find(|c| c.bed_id() == bed_id && !c.is_terminated())
    }

    /// Next human-facing contract number (monotonic, never reused)
    pub fn next_contract_number(&mut self) -> String {
        self.contract_counter += 1;
        format!("C-{:06}", self.contract_counter)
    }

    /// Next payment insertion sequence
    pub fn next_payment_seq(&mut self) -> u64 {
        self.payment_counter += 1;
        self.payment_counter
    }

    /// Counters, exposed for checkpointing
    pub fn counters(&self) -> (u64, u64) {
        (self.contract_counter, self.payment_counter)
    }

    /// Restore counters from a checkpoint
    pub(crate) fn set_counters(&mut self, contract_counter: u64, payment_counter: u64) {
        self.contract_counter = contract_counter;
        self.payment_counter = payment_counter;
    }

    pub fn set_plan(&mut self, contract_id: String, mut installments: Vec<Installment>) {
        installments.sort_by_key(|i| i.due_date());
        self.plans.insert(contract_id, installments);
    }

    /// The contract's installments, oldest due date first
    pub fn plan(&self, contract_id: &str) -> Option<&[Installment]> {
        self.plans.get(contract_id).map(|p| p.as_slice())
    }

    pub fn plan_mut(&mut self, contract_id: &str) -> Option<&mut Vec<Installment>> {
        self.plans.get_mut(contract_id)
    }

    // ------------------------------------------------------------------
    // Payments
    // ------------------------------------------------------------------

    pub fn add_payment(&mut self, payment: Payment) {
        self.payments.insert(payment.id().to_string(), payment);
    }

    pub fn get_payment(&self, id: &str) -> Option<&Payment> {
        self.payments.get(id)
    }

    pub fn get_payment_mut(&mut self, id: &str) -> Option<&mut Payment> {
        self.payments.get_mut(id)
    }

    pub fn remove_payment(&mut self, id: &str) -> Option<Payment> {
        self.payments.remove(id)
    }

    pub fn payments(&self) -> &HashMap<String, Payment> {
        &self.payments
    }

    /// Payments against a contract, ordered by payment date then insertion
    pub fn payments_for_contract(&self, contract_id: &str) -> Vec<&Payment> {
        let mut payments: Vec<&Payment> = self
            .payments
            .values()
            .filter(|p| p.contract_id() == contract_id)
            .collect();
        payments.sort_by_key(|p| (p.payment_date(), p.seq()));
        payments
    }

    /// Whether any payment (refunded or not) exists against a contract
    pub fn contract_has_payments(&self, contract_id: &str) -> bool {
        self.payments
            .values()
            .any(|p| p.contract_id() == contract_id)
    }

    /// Net receipts for a contract (gross payments minus refunds)
    pub fn net_receipts(&self, contract_id: &str) -> i64 {
        self.payments
            .values()
            .filter(|p| p.contract_id() == contract_id)
            .map(|p| p.net_amount())
            .sum()
    }

    /// Sum of amount_paid across a contract's installments
    pub fn applied_total(&self, contract_id: &str) -> i64 {
        self.plans
            .get(contract_id)
            .map(|plan| plan.iter().map(|i| i.amount_paid()).sum())
            .unwrap_or(0)
    }

    // ------------------------------------------------------------------
    // Invariant checking
    // ------------------------------------------------------------------

    pub fn num_floors(&self) -> usize {
        self.floors.len()
    }

    pub fn num_beds(&self) -> usize {
        self.beds.len()
    }

    pub fn num_contracts(&self) -> usize {
        self.contracts.len()
    }

    /// Collect every invariant violation in the current state
    ///
    /// Empty result means the state is consistent. Used by checkpoint
    /// validation and by tests; mutation paths are expected to keep this
    /// empty at all times.
    pub fn invariant_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();

        // Occupancy: Occupied bed <-> exactly one non-terminated contract
        for bed in self.beds.values() {
            let holders: Vec<&Contract> = self
                .contracts
                .values()
                .filter(|c| c.bed_id() == bed.id() && !c.is_terminated())
                .collect();

            match bed.status() {
                BedStatus::Occupied => {
                    if holders.len() != 1 {
                        violations.push(format!(
                            "bed {} is Occupied but has {} active contracts",
                            bed.id(),
                            holders.len()
                        ));
                    } else if bed.occupied_by() != Some(holders[0].id()) {
                        violations.push(format!(
                            "bed {} owner mismatch: recorded {:?}, actual {}",
                            bed.id(),
                            bed.occupied_by(),
                            holders[0].id()
                        ));
                    }
                }
                BedStatus::Free | BedStatus::Maintenance => {
                    if !holders.is_empty() {
                        violations.push(format!(
                            "bed {} is {:?} but contract {} references it",
                            bed.id(),
                            bed.status(),
                            holders[0].id()
                        ));
                    }
                }
            }
        }

        // Ledger conservation per contract
        for contract in self.contracts.values() {
            let applied = self.applied_total(contract.id());
            let receipts = self.net_receipts(contract.id());
            if applied != receipts {
                violations.push(format!(
                    "contract {} ledger drift: applied {} != net receipts {}",
                    contract.id(),
                    applied,
                    receipts
                ));
            }
        }

        // Every contract has a plan
        for contract in self.contracts.values() {
            if !self.plans.contains_key(contract.id()) {
                violations.push(format!("contract {} has no payment plan", contract.id()));
            }
        }

        // Payments reference existing contracts
        for payment in self.payments.values() {
            if !self.contracts.contains_key(payment.contract_id()) {
                violations.push(format!(
                    "payment {} references missing contract {}",
                    payment.id(),
                    payment.contract_id()
                ));
            }
        }

        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::facility::{BedType, RoomType};

    #[test]
    fn test_empty_state_is_consistent() {
        let state = EngineState::new();
        assert!(state.invariant_violations().is_empty());
    }

    #[test]
    fn test_contract_numbers_are_monotonic() {
        let mut state = EngineState::new();
        assert_eq!(state.next_contract_number(), "C-000001");
        assert_eq!(state.next_contract_number(), "C-000002");
    }

    #[test]
    fn test_rooms_on_floor_sorted_by_number() {
        let mut state = EngineState::new();
        let floor = Floor::new(1);
        let floor_id = floor.id().to_string();
        state.add_floor(floor);

        state.add_room(Room::new(floor_id.clone(), 103, RoomType::Double));
        state.add_room(Room::new(floor_id.clone(), 101, RoomType::Single));
        state.add_room(Room::new(floor_id.clone(), 102, RoomType::Quad));

        let numbers: Vec<u32> = state
            .rooms_on_floor(&floor_id)
            .iter()
            .map(|r| r.number())
            .collect();
        assert_eq!(numbers, vec![101, 102, 103]);
    }

    #[test]
    fn test_beds_in_room_sorted_by_number() {
        let mut state = EngineState::new();
        state.add_bed(Bed::new("room-1".to_string(), 2, BedType::Top));
        state.add_bed(Bed::new("room-1".to_string(), 1, BedType::Bottom));
        state.add_bed(Bed::new("room-2".to_string(), 1, BedType::Bottom));

        let numbers: Vec<u32> = state
            .beds_in_room("room-1")
            .iter()
            .map(|b| b.number())
            .collect();
        assert_eq!(numbers, vec![1, 2]);
    }
}
