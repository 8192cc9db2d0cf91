//! Journal replay specs
//!
//! Verify a recorded journal rebuilds the same recorder state.

use crate::prelude::*;
use weave_journal::{replay_records, verify_journal, Divergence};

fn busy_kitchen(world: &World) -> Handle<Kitchen> {
    let kitchen = world.kitchen();
    world.call(&kitchen, "spam", CallInput::new().arg("beans"));
    world.call(&kitchen, "with_bacon", CallInput::new().arg("eggs"));
    world.call(&kitchen, "with_toast", CallInput::new().arg(3));
    let chain = world.call(&kitchen, "async_spam", CallInput::new().arg("ham"));
    world.drive(chain).unwrap();
    kitchen
}

#[test]
fn verify_round_trip_is_consistent() {
    let world = World::new();
    let kitchen = busy_kitchen(&world);
    let before = kitchen.state().servings.clone();

    let report = verify_journal(&*world.keeper).unwrap();

    assert!(report.is_consistent(), "{:?}", report.divergences);
    assert_eq!(report.replayed, 5);
    similar_asserts::assert_eq!(kitchen.state().servings, before);
    assert_eq!(kitchen.state().bacon_fried, 1);
}

#[test]
fn exported_lines_replay_into_a_new_process() {
    let world = World::new();
    let kitchen = busy_kitchen(&world);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("journal.jsonl");
    std::fs::write(&path, world.keeper.export_lines().unwrap().join("\n")).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let keeper = Rc::new(InMemoryJournalKeeper::from_lines(text.lines()).unwrap());
    let root = RecorderRoot::new(keeper.clone(), Some("spec"));
    let twin = Handle::new(&root, Kitchen::default()).unwrap();
    let report = replay_records(&*keeper).unwrap();

    assert!(report.is_consistent(), "{:?}", report.divergences);
    similar_asserts::assert_eq!(twin.state().servings, kitchen.state().servings);
    assert_eq!(twin.state().bacon_fried, 0);
}

#[test]
fn edited_journal_is_detected() {
    let world = World::new();
    busy_kitchen(&world);
    let mut records = world.records();
    records[0].input = CallInput::new().arg("eggs");

    let keeper = Rc::new(InMemoryJournalKeeper::with_records(records));
    let root = RecorderRoot::new(keeper.clone(), Some("spec"));
    Handle::new(&root, Kitchen::default()).unwrap();
    let report = replay_records(&*keeper).unwrap();

    assert!(matches!(
        report.divergences.first(),
        Some(Divergence::Output { sequence: 1, .. })
    ));
}

#[test]
fn corrupted_line_is_rejected() {
    let world = World::new();
    busy_kitchen(&world);
    let lines = world.keeper.export_lines().unwrap();
    let broken = lines[0].replace("beans", "beens");

    let err = InMemoryJournalKeeper::from_lines([broken.as_str()]).err().unwrap();
    assert!(matches!(err, JournalError::Corrupt { sequence: 1 }));
}
