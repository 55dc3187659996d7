//! Tests for the body/header wire-encoding policy.
mod common;
use flowdeck::codec::{self, FORM_MEDIA_TYPE, JSON_MEDIA_TYPE, WireBody};
use flowdeck::endpoint::{EndpointTemplate, HostClass, TemplateValue};
use flowdeck::prelude::*;

fn post_step(kind: StepKind, body: BodyShape) -> StepTemplate {
    StepTemplate::new(
        "step",
        kind,
        Method::Post,
        EndpointTemplate::on(HostClass::Auth, Vec::new()),
    )
    .with_body(body)
}

fn flat_body() -> BodyShape {
    BodyShape::new(vec![
        BodyField::new("grant_type", FieldValue::Literal("password".to_string())),
        BodyField::new("username", FieldValue::Var("username".to_string())),
    ])
}

fn nested_body() -> BodyShape {
    BodyShape::new(vec![
        BodyField::new("action", FieldValue::Literal("sign-in".to_string())),
        BodyField::new(
            "context",
            FieldValue::Json(serde_json::json!({ "channel": "web" })),
        ),
    ])
}

fn content_type(encoded: &codec::EncodedRequest) -> Option<&str> {
    encoded
        .headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("content-type"))
        .map(|(_, value)| value.as_str())
}

#[test]
fn test_flat_bodies_form_encode_by_default() {
    let (encoded, diagnostics) = codec::encode(&post_step(StepKind::Generic, flat_body()));

    assert!(diagnostics.is_empty());
    assert_eq!(content_type(&encoded), Some(FORM_MEDIA_TYPE));
    match encoded.body {
        Some(WireBody::Form(params)) => {
            assert_eq!(params[0], ("grant_type".to_string(), "password".to_string()));
            assert_eq!(params[1].1, "{{username}}");
        }
        other => panic!("expected form body, got {:?}", other),
    }
}

#[test]
fn test_nested_bodies_choose_json() {
    let (encoded, diagnostics) = codec::encode(&post_step(StepKind::Generic, nested_body()));

    assert!(diagnostics.is_empty());
    assert_eq!(content_type(&encoded), Some(JSON_MEDIA_TYPE));
    assert!(matches!(encoded.body, Some(WireBody::Json(_))));
}

#[test]
fn test_explicit_json_override_wins_over_flat_heuristic() {
    let step = post_step(StepKind::Generic, flat_body()).with_encoding(Encoding::Json);
    let (encoded, diagnostics) = codec::encode(&step);

    assert!(diagnostics.is_empty());
    assert_eq!(content_type(&encoded), Some(JSON_MEDIA_TYPE));
}

#[test]
fn test_forced_form_on_nested_body_degrades_to_json_with_warning() {
    let step = post_step(StepKind::Generic, nested_body()).with_encoding(Encoding::Form);
    let (encoded, diagnostics) = codec::encode(&step);

    assert_eq!(diagnostics.len(), 1);
    assert!(matches!(
        diagnostics[0].kind,
        DiagnosticKind::UnsupportedBodyShape { .. }
    ));
    assert_eq!(content_type(&encoded), Some(JSON_MEDIA_TYPE));
    assert!(matches!(encoded.body, Some(WireBody::Json(_))));
}

#[test]
fn test_vendor_media_type_takes_precedence() {
    let (encoded, diagnostics) = codec::encode(&post_step(StepKind::MfaSelectDevice, flat_body()));

    assert!(diagnostics.is_empty());
    assert_eq!(
        content_type(&encoded),
        Some("application/vnd.uniqid.mfa-selection+json")
    );
    assert!(matches!(encoded.body, Some(WireBody::Json(_))));
}

#[test]
fn test_declared_content_type_is_not_overridden() {
    let step = post_step(StepKind::Generic, flat_body()).with_header(Header::new(
        "Content-Type",
        TemplateValue::Literal("application/x-www-form-urlencoded; charset=utf-8".to_string()),
    ));
    let (encoded, _) = codec::encode(&step);

    let content_types: Vec<_> = encoded
        .headers
        .iter()
        .filter(|(name, _)| name.eq_ignore_ascii_case("content-type"))
        .collect();
    assert_eq!(content_types.len(), 1);
    assert!(content_types[0].1.contains("charset"));
}

#[test]
fn test_get_and_delete_never_carry_body_or_content_type() {
    for method in [Method::Get, Method::Delete] {
        let step = StepTemplate::new(
            "step",
            StepKind::Generic,
            method,
            EndpointTemplate::on(HostClass::Api, Vec::new()),
        )
        .with_body(flat_body());
        let (encoded, diagnostics) = codec::encode(&step);

        assert!(diagnostics.is_empty());
        assert!(encoded.body.is_none());
        assert!(content_type(&encoded).is_none());
    }
}
