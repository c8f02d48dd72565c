//! Checkpoint - Save/Load Engine State
//!
//! Serializes the complete engine state for backup and migration, with a
//! content hash and invariant validation so a corrupt or tampered snapshot
//! is rejected instead of loaded.
//!
//! # Critical Invariants
//!
//! - **Determinism**: the same state always produces the same snapshot
//!   JSON and the same hash, regardless of HashMap iteration order
//! - **Validation**: a snapshot only restores if its hash matches and the
//!   rebuilt state passes every state invariant

use crate::engine::EngineError;
use crate::models::contract::Contract;
use crate::models::facility::{Bed, Floor, Room};
use crate::models::installment::Installment;
use crate::models::payment::Payment;
use crate::models::state::EngineState;
use crate::models::student::Student;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Complete engine state snapshot
///
/// Entity lists are sorted on capture so the serialized form is canonical.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub floors: Vec<Floor>,
    pub rooms: Vec<Room>,
    pub beds: Vec<Bed>,
    pub students: Vec<Student>,
    pub contracts: Vec<Contract>,

    /// All installments, flat; regrouped per contract on restore
    pub installments: Vec<Installment>,

    pub payments: Vec<Payment>,

    /// Monotonic counters behind contract numbers and payment sequences
    pub contract_counter: u64,
    pub payment_counter: u64,

    /// SHA256 over the canonical JSON of everything above
    pub state_hash: String,
}

/// Capture a validated snapshot of the state
pub fn capture(state: &EngineState) -> Result<StateSnapshot, EngineError> {
    let mut floors: Vec<Floor> = state.floors().values().cloned().collect();
    floors.sort_by_key(|f| f.number());
    let mut rooms: Vec<Room> = state.rooms().values().cloned().collect();
    rooms.sort_by(|a, b| a.id().cmp(b.id()));
    let mut beds: Vec<Bed> = state.beds().values().cloned().collect();
    beds.sort_by(|a, b| a.id().cmp(b.id()));
    let mut students: Vec<Student> = state.students().values().cloned().collect();
    students.sort_by(|a, b| a.id().cmp(b.id()));
    let mut contracts: Vec<Contract> = state.contracts().values().cloned().collect();
    contracts.sort_by(|a, b| a.number().cmp(b.number()));

    let mut installments: Vec<Installment> = Vec::new();
    for contract in &contracts {
        if let Some(plan) = state.plan(contract.id()) {
            installments.extend(plan.iter().cloned());
        }
    }

    let mut payments: Vec<Payment> = state.payments().values().cloned().collect();
    payments.sort_by_key(|p| p.seq());

    let (contract_counter, payment_counter) = state.counters();
    let mut snapshot = StateSnapshot {
        floors,
        rooms,
        beds,
        students,
        contracts,
        installments,
        payments,
        contract_counter,
        payment_counter,
        state_hash: String::new(),
    };
    snapshot.state_hash = compute_state_hash(&snapshot)?;
    Ok(snapshot)
}

/// Rebuild an engine state from a snapshot
///
/// Rejects the snapshot if its hash does not match its content or if the
/// rebuilt state violates any state invariant.
pub fn restore(snapshot: &StateSnapshot) -> Result<EngineState, EngineError> {
    let expected = compute_state_hash(snapshot)?;
    if expected != snapshot.state_hash {
        return Err(EngineError::SnapshotInvalid(format!(
            "state hash mismatch: recorded {}, computed {}",
            snapshot.state_hash, expected
        )));
    }

    let mut state = EngineState::new();
    for floor in &snapshot.floors {
        state.add_floor(floor.clone());
    }
    for room in &snapshot.rooms {
        state.add_room(room.clone());
    }
    for bed in &snapshot.beds {
        state.add_bed(bed.clone());
    }
    for student in &snapshot.students {
        state.add_student(student.clone());
    }

    // Every contract gets a plan entry, even if the flat list has no
    // installments for it; the invariant check below will flag the gap.
    let mut plans: HashMap<String, Vec<Installment>> = snapshot
        .contracts
        .iter()
        .map(|c| (c.id().to_string(), Vec::new()))
        .collect();
    for installment in &snapshot.installments {
        plans
            .entry(installment.contract_id().to_string())
            .or_default()
            .push(installment.clone());
    }
    for contract in &snapshot.contracts {
        state.add_contract(contract.clone());
    }
    for (contract_id, plan) in plans {
        state.set_plan(contract_id, plan);
    }
    for payment in &snapshot.payments {
        state.add_payment(payment.clone());
    }
    state.set_counters(snapshot.contract_counter, snapshot.payment_counter);

    let violations = state.invariant_violations();
    if !violations.is_empty() {
        return Err(EngineError::SnapshotInvalid(format!(
            "snapshot violates state invariants: {}",
            violations.join("; ")
        )));
    }
    Ok(state)
}

/// Compute the deterministic SHA256 hash of a snapshot's content
///
/// Uses canonical JSON with recursively sorted object keys, ignoring the
/// recorded `state_hash` field itself.
fn compute_state_hash(snapshot: &StateSnapshot) -> Result<String, EngineError> {
    use serde_json::Value;
    use std::collections::BTreeMap;

    let mut value = serde_json::to_value(snapshot)
        .map_err(|e| EngineError::Serialization(format!("snapshot serialization failed: {}", e)))?;
    if let Value::Object(ref mut map) = value {
        map.remove("state_hash");
    }

    fn canonicalize(value: Value) -> Value {
        match value {
            Value::Object(map) => {
                let sorted: BTreeMap<String, Value> =
                    map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
                Value::Object(sorted.into_iter().collect())
            }
            Value::Array(arr) => Value::Array(arr.into_iter().map(canonicalize).collect()),
            other => other,
        }
    }

    let canonical = canonicalize(value);
    let json = serde_json::to_string(&canonical)
        .map_err(|e| EngineError::Serialization(format!("snapshot serialization failed: {}", e)))?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}
