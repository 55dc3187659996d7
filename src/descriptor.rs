//! Recorded call descriptors and their conversion into flow plans.
//!
//! Callers that track live traffic hand the compiler an ordered list of
//! observed calls; the conversion here runs each one through the endpoint
//! normalizer and produces the same `StepTemplate`s the assembler builds
//! for synthesized flows.

use crate::binder::Variable;
use crate::endpoint::{EndpointNormalizer, TENANT_VAR, TemplateValue, looks_like_uuid};
use crate::error::{DescriptorError, Diagnostic};
use crate::flow::{
    AssembledFlow, BodyField, BodyShape, Encoding, FieldValue, FlowSection, Header, Method,
    StepKind, StepTemplate,
};
use serde::{Deserialize, Serialize};

/// One observed or declared API call, as handed over by the tracking layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallDescriptor {
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub headers: Vec<DescriptorHeader>,
    #[serde(default)]
    pub body: Option<serde_json::Value>,
    pub label: String,
    #[serde(default, alias = "kind")]
    pub kind_hint: Option<StepKind>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptorHeader {
    pub name: String,
    pub value: String,
}

/// A flow ready for composition, built from recorded descriptors.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowPlan {
    pub name: String,
    pub steps: Vec<StepTemplate>,
    /// Seed defaults observed in the recording (e.g. the concrete tenant id
    /// that was collapsed to a placeholder).
    pub seed_defaults: Vec<Variable>,
}

/// Conversion from a caller's own capture format into a [`FlowPlan`].
pub trait IntoFlowPlan {
    fn into_flow_plan(self) -> Result<FlowPlan, DescriptorError>;
}

impl FlowPlan {
    /// Builds a plan from raw descriptors. Returns the plan together with
    /// the normalization diagnostics it accumulated.
    pub fn from_descriptors(
        name: impl Into<String>,
        descriptors: Vec<CallDescriptor>,
        normalizer: &EndpointNormalizer,
    ) -> Result<(FlowPlan, Vec<Diagnostic>), DescriptorError> {
        let name = name.into();
        if descriptors.is_empty() {
            return Err(DescriptorError::EmptyRecording);
        }

        let mut steps = Vec::with_capacity(descriptors.len());
        let mut seed_defaults: Vec<Variable> = Vec::new();
        let mut diagnostics = Vec::new();

        for descriptor in descriptors {
            let method = Method::parse(&descriptor.method).ok_or_else(|| {
                DescriptorError::InvalidMethod {
                    label: descriptor.label.clone(),
                    method: descriptor.method.clone(),
                }
            })?;

            let (endpoint, endpoint_diags) =
                normalizer.normalize(&descriptor.label, &descriptor.url);
            diagnostics.extend(endpoint_diags.into_iter().map(|d| d.for_flow(&name)));

            if let Some(tenant) = observed_tenant(&descriptor.url) {
                let already = seed_defaults.iter().any(|v| v.name == TENANT_VAR);
                if !already {
                    seed_defaults.push(Variable::seed(
                        TENANT_VAR,
                        tenant,
                        "Tenant identifier observed in the recording",
                    ));
                }
            }

            let kind = descriptor
                .kind_hint
                .unwrap_or_else(|| infer_kind(&descriptor.url));

            let mut step = StepTemplate::new(descriptor.label, kind, method, endpoint)
                .produces(
                    &kind
                        .default_produces()
                        .iter()
                        .map(String::as_str)
                        .collect::<Vec<_>>(),
                );
            for header in descriptor.headers {
                step = step.with_header(Header::new(
                    header.name,
                    TemplateValue::Literal(header.value),
                ));
            }
            if let Some(body) = descriptor.body {
                let (shape, encoding) = convert_body(body);
                step = step.with_body(shape);
                if let Some(encoding) = encoding {
                    step = step.with_encoding(encoding);
                }
            }
            steps.push(step);
        }

        Ok((
            FlowPlan {
                name,
                steps,
                seed_defaults,
            },
            diagnostics,
        ))
    }

    pub fn into_assembled(self) -> AssembledFlow {
        AssembledFlow {
            name: self.name,
            description: None,
            baseline: None,
            sections: vec![FlowSection::anonymous(self.steps)],
            seed_defaults: self.seed_defaults,
        }
    }
}

/// The concrete tenant id a recorded URL carried, if any.
fn observed_tenant(url: &str) -> Option<String> {
    url.split(['/', '?'])
        .find(|segment| looks_like_uuid(segment))
        .map(str::to_string)
}

/// Best-effort kind classification for descriptors without a hint.
fn infer_kind(url: &str) -> StepKind {
    let path = url.split('?').next().unwrap_or(url);
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let has = |name: &str| segments.iter().any(|s| s.eq_ignore_ascii_case(name));
    if has("device_authorization") {
        StepKind::DeviceAuthorize
    } else if has("par") {
        StepKind::Par
    } else if has("authorize") {
        StepKind::Authorize
    } else if has("token") {
        StepKind::TokenExchange
    } else if has("introspect") {
        StepKind::Introspect
    } else if has("revoke") {
        StepKind::Revoke
    } else if has("userinfo") {
        StepKind::UserInfo
    } else if has("logout") {
        StepKind::Logout
    } else {
        StepKind::Generic
    }
}

/// Maps an observed JSON body onto a body shape, along with the encoding
/// override implied by its structure.
fn convert_body(body: serde_json::Value) -> (BodyShape, Option<Encoding>) {
    match body {
        serde_json::Value::Object(map) => {
            let fields = map
                .into_iter()
                .map(|(name, value)| {
                    let field = match value {
                        serde_json::Value::String(s) => FieldValue::Literal(s),
                        serde_json::Value::Number(n) => FieldValue::Literal(n.to_string()),
                        serde_json::Value::Bool(b) => FieldValue::Literal(b.to_string()),
                        other => FieldValue::Json(other),
                    };
                    BodyField::new(name, field)
                })
                .collect();
            (BodyShape::new(fields), None)
        }
        other => (
            BodyShape::new(vec![BodyField::new("payload", FieldValue::Json(other))]),
            Some(Encoding::Json),
        ),
    }
}
