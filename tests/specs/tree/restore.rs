//! Recorder tree specs
//!
//! Verify journal ids, restore and child numbering.

use crate::prelude::*;

#[test]
fn ids_follow_the_tree() {
    let world = World::new();
    let kitchen = world.kitchen();
    let inner = Handle::new(&kitchen, Kitchen::default()).unwrap();
    let innermost = Handle::new(&inner, Kitchen::default()).unwrap();

    assert_eq!(kitchen.journal_id().to_string(), "spec.1");
    assert_eq!(inner.journal_id().to_string(), "spec.1.1");
    assert_eq!(innermost.journal_id().to_string(), "spec.1.1.1");
    assert!(kitchen.journal_id().is_parent_of(inner.journal_id()));
}

#[test]
fn restored_node_hands_out_fresh_child_ids() {
    let world = World::new();
    let kitchen = world.kitchen();
    let before = Handle::new(&kitchen, Kitchen::default()).unwrap();

    let snapshot = kitchen.snapshot().unwrap();
    drop(kitchen);
    let restored = Handle::restore(&snapshot, Kitchen::default()).unwrap();
    let after = Handle::new(&restored, Kitchen::default()).unwrap();

    assert_eq!(restored.journal_id().to_string(), "spec.1");
    assert_ne!(after.journal_id(), before.journal_id());
    assert_eq!(after.journal_id().to_string(), "spec.1.2");
}

#[test]
fn restored_node_is_the_one_the_keeper_resolves() {
    let world = World::new();
    let kitchen = world.kitchen();
    let snapshot = kitchen.snapshot().unwrap();
    let restored = Handle::restore(&snapshot, Kitchen::default()).unwrap();

    world.call(&restored, "spam", CallInput::new().arg("beans"));
    let found = world.keeper.lookup(kitchen.journal_id()).unwrap();
    let found = Handle::<Kitchen>::from_dyn(found).unwrap();

    assert_eq!(found.state().servings, vec!["spam and beans"]);
    assert!(kitchen.state().servings.is_empty());
}

#[test]
fn children_inherit_the_parent_mode() {
    let world = World::new();
    world.root.set_journal_mode(JournalMode::Replay);
    let kitchen = world.kitchen();
    let inner = Handle::new(&kitchen, Kitchen::default()).unwrap();
    assert_eq!(inner.journal_mode(), JournalMode::Replay);
}
