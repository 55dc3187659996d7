//! Tests for variable lineage binding.
mod common;
use flowdeck::binder::{Producer, VariableBinder, placeholders_in};
use flowdeck::endpoint::{EndpointTemplate, HostTemplate};
use flowdeck::prelude::*;

/// A bare step on a literal host, with lineage declared through the
/// script-consumes list so the test controls references exactly.
fn bare_step(name: &str, produces: &[&str], consumes: &[&str]) -> StepTemplate {
    StepTemplate::new(
        name,
        StepKind::Generic,
        Method::Post,
        EndpointTemplate {
            host: HostTemplate::Literal(vec!["example".to_string(), "test".to_string()]),
            path: Vec::new(),
            query: Vec::new(),
        },
    )
    .produces(produces)
    .script_consumes(consumes)
}

#[test]
fn test_references_resolve_to_seed_and_producer() {
    let binder = VariableBinder::new(vec!["seeded".to_string()]);
    let steps = vec![
        bare_step("first", &["token"], &["seeded"]),
        bare_step("second", &[], &["token", "seeded"]),
    ];

    let report = binder.bind("flow", &steps);
    assert!(report.is_clean());

    assert_eq!(report.steps[0].resolved[0].producer, Producer::Seed);
    assert_eq!(
        report.steps[1].resolved[0].producer,
        Producer::Step {
            index: 0,
            name: "first".to_string(),
        }
    );
}

#[test]
fn test_unresolved_reference_names_step_and_variable() {
    let binder = VariableBinder::new(Vec::new());
    let steps = vec![
        bare_step("first", &["token"], &[]),
        bare_step("second", &[], &["missing"]),
    ];

    let report = binder.bind("flow", &steps);
    assert_eq!(report.unresolved.len(), 1);
    match &report.unresolved[0].kind {
        DiagnosticKind::UnresolvedVariable { step, variable } => {
            assert_eq!(step, "second");
            assert_eq!(variable, "missing");
        }
        other => panic!("unexpected diagnostic: {:?}", other),
    }
}

#[test]
fn test_a_step_cannot_consume_its_own_produces() {
    // The live set accumulates a step's produces only after the step.
    let binder = VariableBinder::new(Vec::new());
    let steps = vec![bare_step("only", &["token"], &["token"])];

    let report = binder.bind("flow", &steps);
    assert_eq!(report.unresolved.len(), 1);
}

#[test]
fn test_branch_local_producers_stay_branch_local() {
    let binder = VariableBinder::new(Vec::new());
    let steps = vec![
        bare_step("create-a", &["user"], &[]).with_branch("a"),
        bare_step("create-b", &["user"], &[]).with_branch("b"),
        bare_step("use-in-a", &[], &["user"]).with_branch("a"),
        bare_step("use-across", &[], &["user"]),
    ];

    let report = binder.bind("flow", &steps);
    // Same-branch reference resolves; the unbranched cross-reference does not.
    assert_eq!(report.unresolved.len(), 1);
    match &report.unresolved[0].kind {
        DiagnosticKind::UnresolvedVariable { step, .. } => assert_eq!(step, "use-across"),
        other => panic!("unexpected diagnostic: {:?}", other),
    }
    assert_eq!(
        report.steps[2].resolved[0].producer,
        Producer::Step {
            index: 0,
            name: "create-a".to_string(),
        }
    );
}

#[test]
fn test_shared_producers_are_visible_inside_branches() {
    let binder = VariableBinder::new(Vec::new());
    let steps = vec![
        bare_step("shared", &["token"], &[]),
        bare_step("branched", &[], &["token"]).with_branch("a"),
    ];

    let report = binder.bind("flow", &steps);
    assert!(report.is_clean());
}

#[test]
fn test_placeholder_scanning_skips_builtin_dynamics() {
    let vars = placeholders_in("Bearer {{api_access_token}} {{$guid}} {{user_id}}");
    assert_eq!(vars, vec!["api_access_token", "user_id"]);
}
