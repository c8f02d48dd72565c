//! Tests for the bed allocation state machine

use dormitory_core_rs::allocation::{self, AllocationError};
use dormitory_core_rs::catalog;
use dormitory_core_rs::models::facility::{BedStatus, BedType, RoomType};
use dormitory_core_rs::models::state::EngineState;

fn state_with_beds(count: u32) -> (EngineState, Vec<String>) {
    let mut state = EngineState::new();
    let floor = catalog::create_floor(&mut state, 1).unwrap();
    let room = catalog::create_room(&mut state, floor.id(), 101, RoomType::Quad).unwrap();
    let bed_ids = (1..=count)
        .map(|n| {
            catalog::create_bed(&mut state, room.id(), n, BedType::Bottom)
                .unwrap()
                .id()
                .to_string()
        })
        .collect();
    (state, bed_ids)
}

#[test]
fn test_allocate_release_cycle() {
    let (mut state, beds) = state_with_beds(1);

    allocation::try_allocate(&mut state, &beds[0], "c1").unwrap();
    assert_eq!(*state.get_bed(&beds[0]).unwrap().status(), BedStatus::Occupied);
    assert_eq!(state.get_bed(&beds[0]).unwrap().occupied_by(), Some("c1"));

    allocation::release(&mut state, &beds[0]).unwrap();
    assert_eq!(*state.get_bed(&beds[0]).unwrap().status(), BedStatus::Free);
    assert_eq!(state.get_bed(&beds[0]).unwrap().occupied_by(), None);

    // Re-allocatable after release
    allocation::try_allocate(&mut state, &beds[0], "c2").unwrap();
    assert_eq!(state.get_bed(&beds[0]).unwrap().occupied_by(), Some("c2"));
}

#[test]
fn test_second_claim_loses_and_first_owner_survives() {
    let (mut state, beds) = state_with_beds(1);
    allocation::try_allocate(&mut state, &beds[0], "c1").unwrap();

    assert_eq!(
        allocation::try_allocate(&mut state, &beds[0], "c2"),
        Err(AllocationError::BedNotAvailable {
            id: beds[0].clone()
        })
    );
    assert_eq!(state.get_bed(&beds[0]).unwrap().occupied_by(), Some("c1"));
}

#[test]
fn test_unavailable_states_all_report_bed_not_available() {
    let (mut state, beds) = state_with_beds(3);

    allocation::try_allocate(&mut state, &beds[0], "c1").unwrap();
    catalog::set_bed_maintenance(&mut state, &beds[1], true).unwrap();
    catalog::deactivate_bed(&mut state, &beds[2]).unwrap();

    for bed_id in &beds {
        let result = allocation::try_allocate(&mut state, bed_id, "claimant");
        assert_eq!(
            result,
            Err(AllocationError::BedNotAvailable { id: bed_id.clone() }),
            "bed {}",
            bed_id
        );
    }
}

#[test]
fn test_release_of_free_bed_is_noop() {
    let (mut state, beds) = state_with_beds(1);
    allocation::release(&mut state, &beds[0]).unwrap();
    assert_eq!(*state.get_bed(&beds[0]).unwrap().status(), BedStatus::Free);
}

#[test]
fn test_maintenance_survives_release() {
    let (mut state, beds) = state_with_beds(1);
    catalog::set_bed_maintenance(&mut state, &beds[0], true).unwrap();

    // Releasing a maintenance bed must not silently free it
    allocation::release(&mut state, &beds[0]).unwrap();
    assert_eq!(
        *state.get_bed(&beds[0]).unwrap().status(),
        BedStatus::Maintenance
    );
}

#[test]
fn test_missing_bed() {
    let mut state = EngineState::new();
    assert_eq!(
        allocation::try_allocate(&mut state, "nope", "c1"),
        Err(AllocationError::BedNotFound {
            id: "nope".to_string()
        })
    );
}
