//! Tests for endpoint normalization and templating round-trips.
mod common;
use common::*;
use flowdeck::endpoint::{
    EndpointNormalizer, HostClass, HostTemplate, PathSegment, TemplateValue,
};
use flowdeck::prelude::*;

#[test]
fn test_regional_auth_host_collapses_to_placeholder() {
    let normalizer = EndpointNormalizer::default();
    let (template, diagnostics) = normalizer.normalize(
        "token",
        "https://auth.eu.uniqid.io/f81d4fae-7dec-11d0-a765-00a0c91e6bf6/oauth2/token",
    );

    assert!(diagnostics.is_empty());
    assert_eq!(template.host, HostTemplate::Class(HostClass::Auth));
    assert_eq!(
        template.path,
        vec![
            PathSegment::Var("tenantId".to_string()),
            PathSegment::Literal("oauth2".to_string()),
            PathSegment::Literal("token".to_string()),
        ]
    );
}

#[test]
fn test_api_host_and_query_parsing() {
    let normalizer = EndpointNormalizer::default();
    let (template, diagnostics) = normalizer.normalize(
        "users",
        "https://api.uniqid.io/v1/tenants/{{tenantId}}/users?limit=10&cursor={{cursor}}",
    );

    assert!(diagnostics.is_empty());
    assert_eq!(template.host, HostTemplate::Class(HostClass::Api));
    assert_eq!(template.query.len(), 2);
    assert_eq!(
        template.query[0].value,
        TemplateValue::Literal("10".to_string())
    );
    assert_eq!(
        template.query[1].value,
        TemplateValue::Var("cursor".to_string())
    );
}

#[test]
fn test_single_brace_placeholders_are_normalized() {
    let normalizer = EndpointNormalizer::default();
    let (template, diagnostics) =
        normalizer.normalize("authorize", "https://auth.uniqid.io/{tenantId}/oauth2/authorize");

    assert!(diagnostics.is_empty());
    assert_eq!(template.path[0], PathSegment::Var("tenantId".to_string()));
}

#[test]
fn test_unknown_host_falls_back_to_literal_with_warning() {
    let normalizer = EndpointNormalizer::default();
    let (template, diagnostics) =
        normalizer.normalize("partner", "https://idp.partner.example/authorize?a=1");

    assert_eq!(diagnostics.len(), 1);
    assert!(matches!(
        diagnostics[0].kind,
        DiagnosticKind::UnrecognizedEndpointShape { .. }
    ));
    assert_eq!(
        template.host,
        HostTemplate::Literal(vec![
            "idp".to_string(),
            "partner".to_string(),
            "example".to_string(),
        ])
    );
    assert_eq!(template.query.len(), 1);
}

#[test]
fn test_malformed_url_never_fails() {
    let normalizer = EndpointNormalizer::default();
    let (template, diagnostics) = normalizer.normalize("broken", "not even close to a url");

    // One warning for the unrecognizable host, but a usable template.
    assert_eq!(diagnostics.len(), 1);
    assert!(matches!(template.host, HostTemplate::Literal(_)));
}

#[test]
fn test_normalize_round_trips_assembled_endpoints() {
    let normalizer = EndpointNormalizer::default();

    let mut variants = FlowVariant::builtin_matrix();
    variants.push(
        FlowVariant::authorization_code(ProtocolBaseline::Oidc)
            .with_par(true)
            .with_pkce(PkceMode::Required),
    );

    for variant in &variants {
        for step in assemble_variant(variant) {
            let raw = step.endpoint.raw();
            let (reparsed, diagnostics) = normalizer.normalize(&step.name, &raw);
            assert!(
                diagnostics.is_empty(),
                "unexpected diagnostics for '{}'",
                raw
            );
            assert_eq!(reparsed, step.endpoint, "round-trip changed '{}'", raw);
        }
    }

    for scenario in Scenario::all() {
        let flow = scenario.assemble("t01");
        for step in flow.steps() {
            let raw = step.endpoint.raw();
            let (reparsed, diagnostics) = normalizer.normalize(&step.name, &raw);
            assert!(diagnostics.is_empty());
            assert_eq!(reparsed, step.endpoint, "round-trip changed '{}'", raw);
        }
    }
}
