//! Side effect specs
//!
//! Verify side effects are captured while recording and served from the
//! journal, without running, on replay.

use crate::prelude::*;

#[test]
fn bacon_side_effect_is_recorded_with_the_call() {
    let world = World::new();
    let kitchen = world.kitchen();

    world.call(&kitchen, "with_bacon", CallInput::new().arg("beans"));

    let record = world.records().remove(0);
    assert_eq!(record.side_effects.len(), 1);
    let effect = &record.side_effects[0];
    assert_eq!(effect.effect_id, "bacon");
    assert_eq!(effect.input, CallInput::new().arg("beans"));
    assert_eq!(effect.result, json!("bacon and beans"));
    assert_eq!(kitchen.state().bacon_fried, 1);
}

#[test]
fn replaying_bacon_does_not_fry_again() {
    let world = World::new();
    let kitchen = world.kitchen();
    world.call(&kitchen, "with_bacon", CallInput::new().arg("beans"));
    let record = world.records().remove(0);

    let replayed = kitchen
        .replay(&record.entry_id, record.input.clone(), record.side_effects.clone())
        .unwrap();

    assert_eq!(replayed.output, record.output);
    assert_eq!(kitchen.state().bacon_fried, 1);
}

#[test]
fn wrapped_free_function_is_recorded_under_its_id() {
    let world = World::new();
    let kitchen = world.kitchen();

    let served = world.call(&kitchen, "with_toast", CallInput::new().arg(2));

    assert_eq!(served.into_value().unwrap(), json!("spam with 2 slices of toast"));
    let record = world.records().remove(0);
    assert_eq!(record.side_effects[0].effect_id, TOAST.id());
    assert_eq!(record.side_effects[0].result, json!("2 slices of toast"));
}

#[test]
fn journaled_identifier_is_identical_on_replay() {
    let world = World::new();
    let kitchen = world.kitchen();
    let live = world.call(&kitchen, "stamped", CallInput::new()).into_value().unwrap();
    let record = world.records().remove(0);

    let replayed = kitchen
        .replay(&record.entry_id, CallInput::new(), record.side_effects)
        .unwrap();

    assert_eq!(replayed.output, CallOutput::Value { value: live });
}

#[test]
fn side_effect_outside_a_recorded_call_just_runs() {
    let mut cx = Context::new();
    let toast = TOAST.call(&mut cx, CallInput::new().arg(1)).unwrap();
    assert_eq!(toast, json!("1 slices of toast"));
    assert!(cx.side_effects().is_empty());
}

#[test]
fn replay_with_mismatched_effect_fails() {
    let world = World::new();
    let kitchen = world.kitchen();
    world.call(&kitchen, "with_toast", CallInput::new().arg(2));
    let record = world.records().remove(0);
    let with_bacon = kitchen.entries().entry_id_of("with_bacon").unwrap().to_string();

    let err = kitchen
        .replay(&with_bacon, CallInput::new().arg("beans"), record.side_effects)
        .unwrap_err();

    assert!(matches!(err, JournalError::Replay(_)));
    assert_eq!(kitchen.state().bacon_fried, 0);
}
