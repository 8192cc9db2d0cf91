//! Continuation chain specs
//!
//! Verify fiber identity, depth and flush timing for chained calls.

use crate::prelude::*;

#[test]
fn async_spam_records_both_sections_on_one_fiber() {
    let world = World::new();
    let kitchen = world.kitchen();

    let chain = world.call(&kitchen, "async_spam", CallInput::new().arg("beans"));
    assert!(world.records().is_empty());
    let served = world.drive(chain).unwrap();

    assert_eq!(served, json!("spam and beans"));
    let records = world.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].entry_id, "bacon");
    assert_eq!(records[1].entry_id, spam_entry());
    assert_eq!(records[0].fiber_id, records[1].fiber_id);
    assert_eq!(
        (records[0].fiber_depth, records[1].fiber_depth),
        (0, 1)
    );
}

#[test]
fn chained_calls_deepen_per_chain() {
    let world = World::new();
    let kitchen = world.kitchen();

    let chain = world.call(&kitchen, "rush", CallInput::new().arg(2));
    assert_eq!(world.drive(chain).unwrap(), json!("served"));

    let records = world.records();
    let depths: Vec<u32> = records.iter().map(|r| r.fiber_depth).collect();
    assert_eq!(depths, vec![0, 1, 2]);
    let inputs: Vec<CallInput> = records.iter().map(|r| r.input.clone()).collect();
    assert_eq!(
        inputs,
        vec![
            CallInput::new().arg(2),
            CallInput::new().arg(1),
            CallInput::new().arg(0),
        ]
    );
    assert!(records.iter().all(|r| r.fiber_id == records[0].fiber_id));
}

#[test]
fn chain_records_flush_innermost_first() {
    let world = World::new();
    let kitchen = world.kitchen();

    let chain = world.call(&kitchen, "rush", CallInput::new().arg(2));
    world.drive(chain).unwrap();

    assert_eq!(world.keeper.flush_order(), vec![3, 2, 1]);
}

#[test]
fn chain_output_describes_trigger_and_stages() {
    let world = World::new();
    let kitchen = world.kitchen();

    let chain = world.call(&kitchen, "async_spam", CallInput::new().arg("beans"));
    world.drive(chain).unwrap();

    let CallOutput::Fiber {
        disposition,
        value,
        stages,
    } = world.records()[0].output.clone()
    else {
        panic!("expected fiber output");
    };
    assert_eq!(disposition, Disposition::Succeed);
    assert_eq!(value, json!("beans"));
    let names: Vec<String> = stages
        .iter()
        .filter_map(|s| s.callback.as_ref().map(|c| c.name.clone()))
        .collect();
    assert_eq!(names, vec!["weave::suspend".to_string(), spam_entry()]);
}

#[test]
fn interleaved_chains_keep_their_own_fibers() {
    let world = World::new();
    let kitchen = world.kitchen();

    let beans = world
        .call(&kitchen, "async_spam", CallInput::new().arg("beans"))
        .into_fiber()
        .unwrap()
        .start(&world.reactor);
    let eggs = world
        .call(&kitchen, "async_spam", CallInput::new().arg("eggs"))
        .into_fiber()
        .unwrap()
        .start(&world.reactor);
    world.reactor.run();

    assert!(beans.is_resolved() && eggs.is_resolved());
    let records = world.records();
    assert_eq!(records.len(), 4);
    let fiber_of = |side: &str| {
        records
            .iter()
            .find(|r| r.entry_id == spam_entry() && r.input == CallInput::new().arg(side))
            .map(|r| r.fiber_id.clone())
            .unwrap()
    };
    assert_eq!(fiber_of("beans"), records[0].fiber_id);
    assert_eq!(fiber_of("eggs"), records[1].fiber_id);
    assert_ne!(records[0].fiber_id, records[1].fiber_id);
}

#[test]
fn abandoned_chain_leaves_no_record() {
    let world = World::new();
    let kitchen = world.kitchen();

    let chain = world.call(&kitchen, "async_spam", CallInput::new().arg("beans"));
    drop(chain);
    world.reactor.run();

    assert!(world.records().is_empty());
}
