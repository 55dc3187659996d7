//! Tests for flow assembly: step selection, ordering, and the protocol
//! scenarios from the design brief.
mod common;
use common::*;
use flowdeck::flow::{FlowAssembler, StepCatalog};
use flowdeck::prelude::*;

fn kinds(steps: &[StepTemplate]) -> Vec<StepKind> {
    steps.iter().map(|s| s.kind).collect()
}

fn query_keys(step: &StepTemplate) -> Vec<&str> {
    step.endpoint
        .query
        .iter()
        .map(|param| param.key.as_str())
        .collect()
}

fn body_field_names(step: &StepTemplate) -> Vec<&str> {
    step.body
        .as_ref()
        .map(|body| body.fields.iter().map(|f| f.name.as_str()).collect())
        .unwrap_or_default()
}

#[test]
fn test_pkce_authorization_code_sequence() {
    let variant = FlowVariant::authorization_code(ProtocolBaseline::OAuth2)
        .with_pkce(PkceMode::Required)
        .with_client_auth(ClientAuthMethod::Basic);
    let steps = assemble_variant(&variant);

    assert_eq!(
        kinds(&steps),
        vec![
            StepKind::GeneratePkce,
            StepKind::Authorize,
            StepKind::TokenExchange,
        ]
    );

    let generate = &steps[0];
    let authorize = &steps[1];
    let exchange = &steps[2];

    assert!(generate.produces.contains(&"code_verifier".to_string()));
    assert!(generate.produces.contains(&"code_challenge".to_string()));

    let authorize_keys = query_keys(authorize);
    assert!(authorize_keys.contains(&"code_challenge"));
    assert!(authorize_keys.contains(&"code_challenge_method"));

    assert!(body_field_names(exchange).contains(&"code_verifier"));
    // The challenge and verifier both trace back to the generate step.
    assert!(authorize.consumes().contains(&"code_challenge".to_string()));
    assert!(exchange.consumes().contains(&"code_verifier".to_string()));
}

#[test]
fn test_device_code_flow_variables() {
    let variant = FlowVariant::device_code(ProtocolBaseline::OAuth2);
    let steps = assemble_variant(&variant);

    assert_eq!(
        kinds(&steps),
        vec![StepKind::DeviceAuthorize, StepKind::DevicePoll]
    );

    for expected in ["device_code", "user_code", "verification_uri", "interval"] {
        assert!(
            steps[0].produces.contains(&expected.to_string()),
            "device-authorize should produce {}",
            expected
        );
    }
    assert!(steps[1].consumes().contains(&"device_code".to_string()));

    // user_code is for human display only.
    for step in &steps {
        assert!(!step.consumes().contains(&"user_code".to_string()));
    }
}

#[test]
fn test_pushed_authorization_request_ordering_and_query() {
    let variant = FlowVariant::authorization_code(ProtocolBaseline::Oidc)
        .with_par(true)
        .with_pkce(PkceMode::Required);
    let steps = assemble_variant(&variant);

    assert_eq!(
        kinds(&steps),
        vec![
            StepKind::GeneratePkce,
            StepKind::Par,
            StepKind::Authorize,
            StepKind::TokenExchange,
        ]
    );

    let par = &steps[1];
    let authorize = &steps[2];

    // The challenge travels inside the pushed request, not the redirect.
    assert!(body_field_names(par).contains(&"code_challenge"));
    assert!(par.produces.contains(&"request_uri".to_string()));

    let authorize_keys = query_keys(authorize);
    assert!(authorize_keys.contains(&"request_uri"));
    assert!(!authorize_keys.contains(&"code_challenge"));
    assert!(!authorize_keys.contains(&"code_challenge_method"));
    assert!(authorize.consumes().contains(&"request_uri".to_string()));
}

#[test]
fn test_hybrid_flow_response_type_and_produces() {
    let steps = assemble_variant(&FlowVariant::hybrid());

    assert_eq!(
        kinds(&steps),
        vec![StepKind::Authorize, StepKind::TokenExchange]
    );
    let authorize = &steps[0];
    let response_type = authorize
        .endpoint
        .query
        .iter()
        .find(|p| p.key == "response_type")
        .expect("missing response_type");
    assert_eq!(response_type.value.render(), "code id_token");
    assert!(authorize.produces.contains(&"id_token".to_string()));
}

#[test]
fn test_client_credentials_is_a_single_step() {
    let variant = FlowVariant::client_credentials(ProtocolBaseline::OAuth2);
    let steps = assemble_variant(&variant);
    assert_eq!(kinds(&steps), vec![StepKind::ClientCredentials]);
}

#[test]
fn test_follow_up_toggles_append_steps() {
    let variant = FlowVariant::authorization_code(ProtocolBaseline::Oidc)
        .with_pkce(PkceMode::Required)
        .with_refresh(true)
        .with_introspection(true)
        .with_userinfo(true);
    let steps = assemble_variant(&variant);

    assert_eq!(
        kinds(&steps),
        vec![
            StepKind::GeneratePkce,
            StepKind::Authorize,
            StepKind::TokenExchange,
            StepKind::TokenRefresh,
            StepKind::Introspect,
            StepKind::UserInfo,
        ]
    );
}

#[test]
fn test_mandatory_pkce_baseline_forces_generation_step() {
    let variant = FlowVariant::authorization_code(ProtocolBaseline::OidcPkceMandatory);
    let steps = assemble_variant(&variant);
    assert_eq!(steps[0].kind, StepKind::GeneratePkce);
}

#[test]
fn test_ordering_constraints_hold_for_every_flag_combination() {
    for variant in variant_matrix() {
        let steps = assemble_variant(&variant);
        let kinds = kinds(&steps);
        assert!(!kinds.is_empty());

        let position = |kind: StepKind| kinds.iter().position(|k| *k == kind);
        if let (Some(pkce), Some(authorize)) =
            (position(StepKind::GeneratePkce), position(StepKind::Authorize))
        {
            assert!(pkce < authorize);
        }
        if let (Some(pkce), Some(exchange)) = (
            position(StepKind::GeneratePkce),
            position(StepKind::TokenExchange),
        ) {
            assert!(pkce < exchange);
        }
        if let (Some(par), Some(authorize)) =
            (position(StepKind::Par), position(StepKind::Authorize))
        {
            assert!(par < authorize);
        }
    }
}

#[test]
fn test_empty_catalog_reports_unknown_step_kind() {
    let catalog = StepCatalog::empty();
    let assembler = FlowAssembler::new(&catalog);
    let result = assembler.assemble(&FlowVariant::authorization_code(ProtocolBaseline::OAuth2));

    assert!(matches!(result, Err(AssemblyError::UnknownStepKind(_))));
}

