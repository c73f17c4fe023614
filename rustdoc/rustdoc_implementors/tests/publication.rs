//! How the batch of a data loader becomes visible in the registry of a page,
//! depending on when the loader runs.
use rustdoc_implementors::{
    DataLoader, ImplementorBatch, ImplementorRecord, PageController, PendingPolicy,
};

fn r1() -> ImplementorRecord {
    ImplementorRecord::new("impl Foo for Bar")
}

fn r2() -> ImplementorRecord {
    ImplementorRecord::new("impl&lt;T&gt; Foo for Baz&lt;T&gt;")
        .synthetic(true)
        .types(["Baz"])
}

fn batch(subject: &str, records: Vec<ImplementorRecord>) -> ImplementorBatch {
    std::iter::once((subject, records)).collect()
}

#[test]
fn direct_publish_registers_every_subject_in_order() {
    let mut controller = PageController::default();
    controller.initialize();

    let mut contributed = ImplementorBatch::new();
    contributed.insert("X", vec![r1(), r2()]);
    contributed.insert("Y", vec![r2()]);
    DataLoader::new(contributed.clone()).publish(&mut controller);

    for (subject, records) in contributed.iter() {
        assert_eq!(controller.registry().get(subject), Some(records));
    }
    assert!(controller.pending().is_empty());
}

#[test]
fn a_loader_that_runs_first_is_drained_on_initialization() {
    let mut controller = PageController::default();
    DataLoader::new(batch("X", vec![r1(), r2()])).publish(&mut controller);
    assert!(controller.registry().is_empty());
    assert_eq!(controller.pending().len(), 1);

    controller.initialize();

    assert_eq!(controller.registry().get("X").unwrap(), &[r1(), r2()]);
    assert!(controller.pending().is_empty());
}

#[test]
fn registering_an_empty_batch_never_mutates_the_registry() {
    let mut controller = PageController::default();
    controller.initialize();
    DataLoader::new(batch("X", vec![r1()])).publish(&mut controller);
    let before = controller.registry().clone();

    controller
        .registration()
        .expect("The controller is ready")
        .register_implementors(ImplementorBatch::new());

    assert_eq!(controller.registry(), &before);
}

#[test]
fn records_survive_either_path_unchanged() {
    let record = ImplementorRecord::new("impl Foo for Bar");

    for loader_first in [false, true] {
        let mut controller = PageController::default();
        let loader = DataLoader::new(batch("X", vec![r2(), record.clone(), r1()]));
        if loader_first {
            loader.publish(&mut controller);
            controller.initialize();
        } else {
            controller.initialize();
            loader.publish(&mut controller);
        }

        let registered = controller.registry().get("X").unwrap();
        assert_eq!(registered[1], record);
        assert_eq!(registered[1].text(), "impl Foo for Bar");
        assert!(!registered[1].is_synthetic());
        assert!(registered[1].referenced_types().is_empty());
        assert_eq!(registered, &[r2(), record.clone(), r1()]);
    }
}

#[test]
fn early_loaders_are_all_kept_by_default() {
    let mut controller = PageController::default();
    DataLoader::new(batch("X", vec![r1()])).publish(&mut controller);
    DataLoader::new(batch("Y", vec![r2()])).publish(&mut controller);

    controller.initialize();

    assert_eq!(controller.registry().subjects().collect::<Vec<_>>(), vec!["X", "Y"]);
}

#[test]
fn a_single_pending_slot_loses_all_but_the_last_early_batch() {
    let mut controller = PageController::new(PendingPolicy::LastWriteWins);
    DataLoader::new(batch("X", vec![r1()])).publish(&mut controller);
    DataLoader::new(batch("Y", vec![r2()])).publish(&mut controller);

    controller.initialize();

    // The batch for `X` was overwritten before the controller became ready.
    assert_eq!(controller.registry().len(), 1);
    assert!(!controller.registry().contains("X"));
    assert_eq!(controller.registry().get("Y").unwrap(), &[r2()]);
}

#[test]
fn loaders_after_initialization_extend_the_registry() {
    let mut controller = PageController::new(PendingPolicy::LastWriteWins);
    DataLoader::new(batch("X", vec![r1()])).publish(&mut controller);
    controller.initialize();
    DataLoader::new(batch("Y", vec![r2()])).publish(&mut controller);
    DataLoader::new(batch("Z", vec![r1()])).publish(&mut controller);

    assert_eq!(
        controller.registry().subjects().collect::<Vec<_>>(),
        vec!["X", "Y", "Z"]
    );
}
