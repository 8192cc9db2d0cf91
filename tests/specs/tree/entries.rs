//! Entry table specs
//!
//! Verify entry id registration, collisions and inheritance.

use crate::prelude::*;

struct Doubled;

impl Recorder for Doubled {
    fn declare(entries: &mut EntryTable<Self>) {
        entries
            .recorded_as(EntrySpec::method("one").with_id("dup"), |_, _, _| {
                Ok(Outcome::none())
            })
            .recorded_as(EntrySpec::method("two").with_id("dup"), |_, _, _| {
                Ok(Outcome::none())
            });
    }
}

#[derive(Default)]
struct Cafe {
    kitchen: Kitchen,
}

impl Cafe {
    fn kitchen(&mut self) -> &mut Kitchen {
        &mut self.kitchen
    }
}

impl Recorder for Cafe {
    fn declare(entries: &mut EntryTable<Self>) {
        entries.inherit(Cafe::kitchen);
    }

    fn snapshot_state(&self) -> Value {
        self.kitchen.snapshot_state()
    }
}

#[test]
fn colliding_entry_ids_fail_registration() {
    let world = World::new();
    let err = Handle::new(&world.root, Doubled).unwrap_err();
    assert!(matches!(err, JournalError::DuplicateEntry { ref entry_id, .. } if entry_id == "dup"));
}

#[test]
fn explicit_entry_id_is_used_in_the_journal() {
    let world = World::new();
    let kitchen = world.kitchen();
    assert_eq!(kitchen.entries().entry_id_of("async_spam"), Some("bacon"));
    assert_eq!(kitchen.entries().entry_id_of("spam"), Some(spam_entry().as_str()));
}

#[test]
fn inherited_entries_record_under_the_base_ids() {
    let world = World::new();
    let cafe = Handle::new(&world.root, Cafe::default()).unwrap();

    let served = world.call(&cafe, "spam", CallInput::new().arg("chips"));

    assert_eq!(served.into_value().unwrap(), json!("spam and chips"));
    assert_eq!(world.records()[0].entry_id, spam_entry());
    assert_eq!(cafe.state().kitchen.servings, vec!["spam and chips"]);
}

#[test]
fn unknown_entry_is_an_error() {
    let world = World::new();
    let kitchen = world.kitchen();
    let err = kitchen
        .record(&mut Context::new(), "no-such-entry", CallInput::new())
        .unwrap_err();
    assert!(matches!(err, JournalError::UnknownEntry { .. }));
}
