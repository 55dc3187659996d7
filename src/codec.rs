//! Wire-encoding policy: JSON vs. form-urlencoded vs. vendor media types.

use crate::error::{Diagnostic, DiagnosticKind};
use crate::flow::{BodyShape, Encoding, FieldValue, StepTemplate};
use tracing::warn;

pub const FORM_MEDIA_TYPE: &str = "application/x-www-form-urlencoded";
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// A rendered body, ready to drop into the collection document.
#[derive(Debug, Clone, PartialEq)]
pub enum WireBody {
    Form(Vec<(String, String)>),
    Json(String),
}

/// Headers plus rendered body for one step.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EncodedRequest {
    pub headers: Vec<(String, String)>,
    pub body: Option<WireBody>,
}

/// Decides the wire encoding for a step and renders headers accordingly.
///
/// Decision order: vendor media types selected by step kind, then an
/// explicit encoding override, then the scalar-fields heuristic. GET and
/// DELETE steps never receive a body or a content-type header.
pub fn encode(step: &StepTemplate) -> (EncodedRequest, Vec<Diagnostic>) {
    let mut headers: Vec<(String, String)> = step
        .headers
        .iter()
        .map(|h| (h.name.clone(), h.value.render()))
        .collect();
    let mut diagnostics = Vec::new();

    let body = match &step.body {
        Some(shape) if step.method.allows_body() => shape,
        _ => {
            return (
                EncodedRequest {
                    headers,
                    body: None,
                },
                diagnostics,
            );
        }
    };

    let chosen = match (step.kind.vendor_media_type(), step.encoding) {
        (Some(media), _) => (WireBody::Json(render_json(body)), media),
        (None, Some(Encoding::Json)) => (WireBody::Json(render_json(body)), JSON_MEDIA_TYPE),
        (None, Some(Encoding::Form)) if !body.is_flat() => {
            warn!(step = %step.name, "form encoding forced on a non-flat body");
            diagnostics.push(Diagnostic::unscoped(DiagnosticKind::UnsupportedBodyShape {
                step: step.name.clone(),
            }));
            (WireBody::Json(render_json(body)), JSON_MEDIA_TYPE)
        }
        (None, Some(Encoding::Form)) => (WireBody::Form(render_form(body)), FORM_MEDIA_TYPE),
        (None, None) if body.is_flat() => (WireBody::Form(render_form(body)), FORM_MEDIA_TYPE),
        (None, None) => (WireBody::Json(render_json(body)), JSON_MEDIA_TYPE),
    };

    let (wire_body, media_type) = chosen;
    if !has_content_type(&headers) {
        headers.push(("Content-Type".to_string(), media_type.to_string()));
    }

    (
        EncodedRequest {
            headers,
            body: Some(wire_body),
        },
        diagnostics,
    )
}

fn has_content_type(headers: &[(String, String)]) -> bool {
    headers
        .iter()
        .any(|(name, _)| name.eq_ignore_ascii_case("content-type"))
}

fn render_form(body: &BodyShape) -> Vec<(String, String)> {
    body.fields
        .iter()
        .map(|field| (field.name.clone(), render_scalar(&field.value)))
        .collect()
}

fn render_scalar(value: &FieldValue) -> String {
    match value {
        FieldValue::Literal(s) => s.clone(),
        FieldValue::Var(name) => format!("{{{{{}}}}}", name),
        FieldValue::Json(serde_json::Value::String(s)) => s.clone(),
        FieldValue::Json(other) => other.to_string(),
    }
}

fn render_json(body: &BodyShape) -> String {
    let mut object = serde_json::Map::new();
    for field in &body.fields {
        let value = match &field.value {
            FieldValue::Literal(s) => serde_json::Value::String(s.clone()),
            FieldValue::Var(name) => serde_json::Value::String(format!("{{{{{}}}}}", name)),
            FieldValue::Json(value) => value.clone(),
        };
        object.insert(field.name.clone(), value);
    }
    // Two-space indentation matches what the collection tooling exports.
    serde_json::to_string_pretty(&serde_json::Value::Object(object))
        .unwrap_or_else(|_| "{}".to_string())
}
