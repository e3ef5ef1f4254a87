//! End-to-end tests for grouping, execution and resumption.

use altsim::alternative::Alternative;
use altsim::config::Settings;
use altsim::manager::AlternativeSimulationManager;
use altsim::steps::{step_fn, ParamType, Params, Step, StepCatalog};
use altsim::AltSimError;
use serde_json::{json, Value};
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

fn params(pairs: &[(&str, Value)]) -> Params {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

struct Study {
    manager: AlternativeSimulationManager,
    s1_calls: Arc<AtomicUsize>,
    s2_calls: Arc<AtomicUsize>,
}

/// S1 needs `x: int`; S2 needs `y: int` with an optional `z: float` and
/// consumes S1's output. P1 and P2 share S1 and differ in `y`.
fn study() -> Study {
    let s1_calls = Arc::new(AtomicUsize::new(0));
    let s2_calls = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&s1_calls);
    let s1 = Step::builder(
        "S1",
        step_fn("S1", move |inputs| {
            counter.fetch_add(1, Ordering::SeqCst);
            let x = inputs.param("x").and_then(Value::as_i64).unwrap_or(0);
            Ok(json!({ "mesh": x * 100 }))
        }),
    )
    .param("x", ParamType::Int)
    .build()
    .unwrap();

    let counter = Arc::clone(&s2_calls);
    let s2 = Step::builder(
        "S2",
        step_fn("S2", move |inputs| {
            counter.fetch_add(1, Ordering::SeqCst);
            let mesh = inputs.upstream[0]["mesh"].as_i64().unwrap_or(0);
            let y = inputs.param("y").and_then(Value::as_i64).unwrap_or(0);
            Ok(json!(mesh + y))
        }),
    )
    .param("y", ParamType::Int)
    .optional_param("z", ParamType::Float)
    .depends_on("S1")
    .build()
    .unwrap();

    let mut manager = AlternativeSimulationManager::new();
    for (id, y) in [("P1", 2), ("P2", 3)] {
        let first = s1
            .generate_input_data("x1", params(&[("x", json!(1))]))
            .unwrap();
        let second = s2
            .generate_input_data(format!("y{}", y), params(&[("y", json!(y))]))
            .unwrap();
        manager
            .add_alternative(
                Alternative::with_steps(id, [(s1.clone(), first), (s2.clone(), second)]).unwrap(),
            )
            .unwrap();
    }

    Study {
        manager,
        s1_calls,
        s2_calls,
    }
}

#[test]
fn shared_first_step_splits_on_second() {
    let study = study();
    let tree = study
        .manager
        .group_alternatives_to_tree(&["P1", "P2"])
        .unwrap();

    assert_eq!(tree.roots.len(), 1);
    let root = &tree.roots[0];
    assert_eq!(root.depth, 0);
    assert_eq!(root.members, vec!["P1", "P2"]);
    assert_eq!(root.children.len(), 2);
    assert_eq!(root.children[0].members, vec!["P1"]);
    assert_eq!(root.children[1].members, vec!["P2"]);
    assert_eq!(tree.saved_step_count(), 1);
}

#[test]
fn run_computes_shared_step_once_and_records_progress() {
    let project = TempDir::new().unwrap();
    let study = study();

    let mut executor = study
        .manager
        .set_up(project.path(), &Settings::default(), &["P1", "P2"])
        .unwrap();
    let report = executor.run().unwrap();

    assert_eq!(study.s1_calls.load(Ordering::SeqCst), 1);
    assert_eq!(study.s2_calls.load(Ordering::SeqCst), 2);
    assert_eq!(report.outputs["P1"], json!(102));
    assert_eq!(report.outputs["P2"], json!(103));

    let raw: Value = serde_json::from_str(
        &fs::read_to_string(project.path().join("simulations/P2/progress.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(raw["0"]["step_id"], "S1");
    assert_eq!(raw["0"]["input_data_id"], "x1");
    assert_eq!(raw["0"]["has_run"], true);
    assert_eq!(raw["0"]["parent_alternative"], "P1");
    assert!(raw["0"]["duration"].is_null());
    assert_eq!(raw["1"]["has_run"], true);
    assert!(raw["1"]["parent_alternative"].is_null());
}

#[test]
fn rerun_after_completion_does_no_work() {
    let project = TempDir::new().unwrap();
    let study = study();

    for _ in 0..2 {
        study
            .manager
            .set_up(project.path(), &Settings::default(), &["P1", "P2"])
            .unwrap()
            .run()
            .unwrap();
    }

    assert_eq!(study.s1_calls.load(Ordering::SeqCst), 1);
    assert_eq!(study.s2_calls.load(Ordering::SeqCst), 2);
}

#[test]
fn adding_an_alternative_only_runs_what_is_new() {
    let project = TempDir::new().unwrap();
    let mut study = study();
    study
        .manager
        .set_up(project.path(), &Settings::default(), &[] as &[&str])
        .unwrap()
        .run()
        .unwrap();

    let p1 = study.manager.get("P1").unwrap();
    let (s1, x1) = p1.step_at(0).unwrap();
    let (s2, _) = p1.step_at(1).unwrap();
    let y9 = s2
        .generate_input_data("y9", params(&[("y", json!(9)), ("z", json!(0.5))]))
        .unwrap();
    let p3 = Alternative::with_steps("P3", [(s1.clone(), x1.clone()), (s2.clone(), y9)]).unwrap();
    assert!(study.manager.add_alternative(p3).unwrap());

    let report = study
        .manager
        .set_up(project.path(), &Settings::default(), &[] as &[&str])
        .unwrap()
        .run()
        .unwrap();

    // S1 comes back from the persisted results; only S2 for P3 runs.
    assert_eq!(study.s1_calls.load(Ordering::SeqCst), 1);
    assert_eq!(study.s2_calls.load(Ordering::SeqCst), 3);
    assert_eq!(report.executed, 1);
    assert_eq!(report.outputs["P3"], json!(109));
}

#[test]
fn unknown_alternative_is_rejected_before_any_io() {
    let project = TempDir::new().unwrap();
    let study = study();

    let err = study
        .manager
        .set_up(project.path(), &Settings::default(), &["P1", "P9"])
        .unwrap_err();

    match err {
        AltSimError::UnknownAlternatives { ids } => assert_eq!(ids, vec!["P9"]),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!project.path().join("simulations").exists());
}

#[test]
fn saved_registry_restores_equal_pipelines() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("registry.json");
    let study = study();
    study.manager.save(&path).unwrap();

    // Functions are resolved by name, so the restored steps compare equal.
    let mut catalog = StepCatalog::new();
    catalog
        .register(step_fn("S1", |_| Ok(json!(null))))
        .register(step_fn("S2", |_| Ok(json!(null))));
    let restored = AlternativeSimulationManager::load(&path, &catalog).unwrap();

    assert_eq!(restored.num_alternatives(), 2);
    assert_eq!(restored.get("P1"), study.manager.get("P1"));
    assert_eq!(
        restored.group_all().unwrap().node_count(),
        study.manager.group_all().unwrap().node_count()
    );
}
