// tests/graph_validation.rs

use migradag::dag::{StageSpec, WorkflowGraph};
use migradag::errors::MigradagError;

#[test]
fn cycle_is_rejected() {
    let err = WorkflowGraph::new(vec![
        StageSpec::new("a"),
        StageSpec::new("b").after("a").after("c"),
        StageSpec::new("c").after("b"),
    ])
    .unwrap_err();

    assert!(matches!(err, MigradagError::DagCycle(_)), "{err}");
}

#[test]
fn cycle_through_start_edge_is_rejected() {
    let err = WorkflowGraph::new(vec![
        StageSpec::new("a"),
        StageSpec::new("b").after("a").after("c"),
        StageSpec::new("c").starts_with("b"),
    ])
    .unwrap_err();

    assert!(matches!(err, MigradagError::DagCycle(_)), "{err}");
}

#[test]
fn two_entries_are_rejected() {
    let err = WorkflowGraph::new(vec![
        StageSpec::new("a"),
        StageSpec::new("b"),
        StageSpec::new("c").after("a").after("b"),
    ])
    .unwrap_err();

    match err {
        MigradagError::InvalidGraph(msg) => assert!(msg.contains("exactly one entry"), "{msg}"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unknown_dependency_is_rejected() {
    let err = WorkflowGraph::new(vec![StageSpec::new("a"), StageSpec::new("b").after("ghost")])
        .unwrap_err();
    assert!(matches!(err, MigradagError::StageNotFound(_)), "{err}");

    let err = WorkflowGraph::new(vec![StageSpec::new("a"), StageSpec::new("b").starts_with("ghost")])
        .unwrap_err();
    assert!(matches!(err, MigradagError::StageNotFound(_)), "{err}");
}

#[test]
fn self_dependency_is_rejected() {
    let err = WorkflowGraph::new(vec![StageSpec::new("a"), StageSpec::new("b").after("a").after("b")])
        .unwrap_err();
    assert!(matches!(err, MigradagError::InvalidGraph(_)), "{err}");
}

#[test]
fn duplicate_and_malformed_names_are_rejected() {
    let err = WorkflowGraph::new(vec![StageSpec::new("a"), StageSpec::new("a")]).unwrap_err();
    assert!(matches!(err, MigradagError::InvalidGraph(_)), "{err}");

    let err = WorkflowGraph::new(vec![StageSpec::new("Data Migration")]).unwrap_err();
    assert!(matches!(err, MigradagError::InvalidGraph(_)), "{err}");
}

#[test]
fn empty_workflow_is_rejected() {
    assert!(matches!(
        WorkflowGraph::new(Vec::new()),
        Err(MigradagError::InvalidGraph(_))
    ));
}

#[test]
fn single_stage_is_both_entry_and_terminal() {
    let graph = WorkflowGraph::new(vec![StageSpec::new("only")]).unwrap();
    assert_eq!(graph.entry(), "only");
    assert_eq!(graph.terminals(), vec!["only"]);
}
