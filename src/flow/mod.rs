//! The step model: one HTTP interaction in a multi-step protocol exchange,
//! with declared variable inputs and outputs.

mod assembler;
mod catalog;
mod scenario;
mod variant;

pub use assembler::{AssembledFlow, FlowAssembler, FlowSection};
pub use catalog::{StepCatalog, StepContext, StepFactory};
pub use scenario::Scenario;
pub use variant::{
    ClientAuthMethod, FlowVariant, GrantShape, PkceMode, ProtocolBaseline, ResponseDelivery,
};

use crate::endpoint::{EndpointTemplate, TemplateValue};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Some(Method::Get),
            "POST" => Some(Method::Post),
            "PUT" => Some(Method::Put),
            "PATCH" => Some(Method::Patch),
            "DELETE" => Some(Method::Delete),
            _ => None,
        }
    }

    /// GET and DELETE steps never carry a body or a content-type header.
    pub fn allows_body(&self) -> bool {
        !matches!(self, Method::Get | Method::Delete)
    }
}

/// The protocol role of a step. Drives script synthesis, status
/// expectations, and content-type selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepKind {
    GeneratePkce,
    Par,
    Authorize,
    TokenExchange,
    DeviceAuthorize,
    DevicePoll,
    ClientCredentials,
    TokenRefresh,
    Introspect,
    #[serde(rename = "userinfo")]
    UserInfo,
    Revoke,
    UserCreate,
    UserDelete,
    PasswordSet,
    PasswordLogin,
    OtpSend,
    OtpCheck,
    MfaEnroll,
    MfaSelectDevice,
    MfaVerify,
    PasswordResetStart,
    PasswordResetComplete,
    RecoveryStart,
    RecoveryComplete,
    SocialStart,
    RiskEvaluate,
    Logout,
    SessionsRevoke,
    /// A recorded call with no recognizable protocol role.
    Generic,
}

impl StepKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::GeneratePkce => "generate-pkce",
            StepKind::Par => "par",
            StepKind::Authorize => "authorize",
            StepKind::TokenExchange => "token-exchange",
            StepKind::DeviceAuthorize => "device-authorize",
            StepKind::DevicePoll => "device-poll",
            StepKind::ClientCredentials => "client-credentials",
            StepKind::TokenRefresh => "token-refresh",
            StepKind::Introspect => "introspect",
            StepKind::UserInfo => "userinfo",
            StepKind::Revoke => "revoke",
            StepKind::UserCreate => "user-create",
            StepKind::UserDelete => "user-delete",
            StepKind::PasswordSet => "password-set",
            StepKind::PasswordLogin => "password-login",
            StepKind::OtpSend => "otp-send",
            StepKind::OtpCheck => "otp-check",
            StepKind::MfaEnroll => "mfa-enroll",
            StepKind::MfaSelectDevice => "mfa-select-device",
            StepKind::MfaVerify => "mfa-verify",
            StepKind::PasswordResetStart => "password-reset-start",
            StepKind::PasswordResetComplete => "password-reset-complete",
            StepKind::RecoveryStart => "recovery-start",
            StepKind::RecoveryComplete => "recovery-complete",
            StepKind::SocialStart => "social-start",
            StepKind::RiskEvaluate => "risk-evaluate",
            StepKind::Logout => "logout",
            StepKind::SessionsRevoke => "sessions-revoke",
            StepKind::Generic => "generic",
        }
    }

    /// The status code the post-script asserts for this kind of step.
    pub fn expected_status(&self) -> u16 {
        match self {
            StepKind::Par | StepKind::UserCreate | StepKind::MfaEnroll => 201,
            StepKind::Authorize | StepKind::SocialStart | StepKind::Logout => 302,
            StepKind::SessionsRevoke | StepKind::UserDelete => 204,
            _ => 200,
        }
    }

    /// Vendor media types that take precedence over the generic JSON/form
    /// rule for these endpoints.
    pub fn vendor_media_type(&self) -> Option<&'static str> {
        match self {
            StepKind::MfaSelectDevice => Some("application/vnd.uniqid.mfa-selection+json"),
            StepKind::RiskEvaluate => Some("application/vnd.uniqid.risk+json"),
            _ => None,
        }
    }

    /// Variables a recorded step of this kind is expected to publish when
    /// the descriptor does not say otherwise.
    pub fn default_produces(&self) -> Vec<String> {
        let names: &[&str] = match self {
            StepKind::GeneratePkce => &["code_verifier", "code_challenge"],
            StepKind::Par => &["request_uri"],
            StepKind::Authorize => &["auth_code"],
            StepKind::TokenExchange | StepKind::DevicePoll | StepKind::TokenRefresh => {
                &["access_token", "refresh_token"]
            }
            StepKind::ClientCredentials => &["access_token"],
            StepKind::DeviceAuthorize => {
                &["device_code", "user_code", "verification_uri", "interval"]
            }
            StepKind::UserCreate => &["user_id"],
            StepKind::PasswordLogin | StepKind::OtpCheck => &["session_token"],
            StepKind::MfaEnroll => &["mfa_device_id"],
            StepKind::MfaSelectDevice => &["mfa_challenge_id"],
            StepKind::PasswordResetStart => &["reset_token"],
            StepKind::RecoveryStart => &["recovery_token"],
            StepKind::RiskEvaluate => &["risk_id"],
            _ => &[],
        };
        names.iter().map(|n| n.to_string()).collect()
    }

    /// One-sentence summary used when generating documentation strings.
    pub fn summary(&self) -> &'static str {
        match self {
            StepKind::GeneratePkce => "Generates a PKCE verifier/challenge pair for the steps that follow.",
            StepKind::Par => "Pushes the authorization parameters to the server ahead of the redirect.",
            StepKind::Authorize => "Builds the front-channel authorization request.",
            StepKind::TokenExchange => "Exchanges the authorization code for tokens.",
            StepKind::DeviceAuthorize => "Starts the device authorization grant.",
            StepKind::DevicePoll => "Polls the token endpoint until the device login completes.",
            StepKind::ClientCredentials => "Obtains a token using the client credentials grant.",
            StepKind::TokenRefresh => "Rotates the token pair using the refresh token grant.",
            StepKind::Introspect => "Introspects the current access token.",
            StepKind::UserInfo => "Fetches the OpenID Connect userinfo document.",
            StepKind::Revoke => "Revokes the current access token.",
            StepKind::UserCreate => "Creates the test user this scenario operates on.",
            StepKind::UserDelete => "Deletes the test user created by this scenario.",
            StepKind::PasswordSet => "Sets a known password on the test user.",
            StepKind::PasswordLogin => "Signs the test user in with username and password.",
            StepKind::OtpSend => "Sends a one-time passcode to the test user.",
            StepKind::OtpCheck => "Validates the one-time passcode entered by the operator.",
            StepKind::MfaEnroll => "Registers a new MFA device for the test user.",
            StepKind::MfaSelectDevice => "Selects which enrolled MFA device to challenge.",
            StepKind::MfaVerify => "Verifies the MFA challenge response.",
            StepKind::PasswordResetStart => "Starts the password reset workflow.",
            StepKind::PasswordResetComplete => "Completes the password reset with the emailed token.",
            StepKind::RecoveryStart => "Starts account recovery for a locked-out user.",
            StepKind::RecoveryComplete => "Completes account recovery and restores access.",
            StepKind::SocialStart => "Redirects to the federated identity provider.",
            StepKind::RiskEvaluate => "Submits an action for risk evaluation.",
            StepKind::Logout => "Ends the OpenID Connect session.",
            StepKind::SessionsRevoke => "Revokes every active session for the test user.",
            StepKind::Generic => "Replays a recorded API call.",
        }
    }
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared header on a step template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub value: TemplateValue,
}

impl Header {
    pub fn new(name: impl Into<String>, value: TemplateValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// One field of a request body: literal, placeholder, or an embedded JSON
/// fragment for the endpoints that want structured payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Literal(String),
    Var(String),
    Json(serde_json::Value),
}

impl FieldValue {
    pub fn is_scalar(&self) -> bool {
        match self {
            FieldValue::Literal(_) | FieldValue::Var(_) => true,
            FieldValue::Json(value) => !(value.is_object() || value.is_array()),
        }
    }

    pub fn referenced_vars(&self) -> Vec<String> {
        match self {
            FieldValue::Literal(s) => crate::binder::placeholders_in(s),
            FieldValue::Var(name) => vec![name.clone()],
            FieldValue::Json(value) => {
                let mut vars = Vec::new();
                collect_json_vars(value, &mut vars);
                vars
            }
        }
    }
}

fn collect_json_vars(value: &serde_json::Value, out: &mut Vec<String>) {
    match value {
        serde_json::Value::String(s) => out.extend(crate::binder::placeholders_in(s)),
        serde_json::Value::Array(items) => items.iter().for_each(|v| collect_json_vars(v, out)),
        serde_json::Value::Object(map) => map.values().for_each(|v| collect_json_vars(v, out)),
        _ => {}
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BodyField {
    pub name: String,
    pub value: FieldValue,
}

impl BodyField {
    pub fn new(name: impl Into<String>, value: FieldValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// The declared request-body shape of a step, before wire encoding.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BodyShape {
    pub fields: Vec<BodyField>,
}

impl BodyShape {
    pub fn new(fields: Vec<BodyField>) -> Self {
        Self { fields }
    }

    /// True when every field is a scalar, making the shape a candidate for
    /// form encoding.
    pub fn is_flat(&self) -> bool {
        self.fields.iter().all(|f| f.value.is_scalar())
    }

    pub fn referenced_vars(&self) -> Vec<String> {
        self.fields
            .iter()
            .flat_map(|f| f.value.referenced_vars())
            .collect()
    }
}

/// Wire-encoding override a step may declare, trumping the scalar-fields
/// heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Form,
    Json,
}

/// The abstract description of one protocol interaction. Instantiated by
/// the flow assembler and immutable afterward.
#[derive(Debug, Clone, PartialEq)]
pub struct StepTemplate {
    pub name: String,
    pub kind: StepKind,
    pub method: Method,
    pub endpoint: EndpointTemplate,
    pub headers: Vec<Header>,
    pub body: Option<BodyShape>,
    pub encoding: Option<Encoding>,
    /// Mutually exclusive alternatives carry a branch label; producers in a
    /// branch are invisible to sibling branches.
    pub branch: Option<String>,
    /// Variables this step's scripts publish.
    pub produces: Vec<String>,
    /// Variables referenced only from synthesized scripts (not visible in
    /// the request template itself).
    pub script_consumes: Vec<String>,
    pub description: String,
}

impl StepTemplate {
    pub fn new(
        name: impl Into<String>,
        kind: StepKind,
        method: Method,
        endpoint: EndpointTemplate,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            method,
            endpoint,
            headers: Vec::new(),
            body: None,
            encoding: None,
            branch: None,
            produces: Vec::new(),
            script_consumes: Vec::new(),
            description: String::new(),
        }
    }

    pub fn with_body(mut self, body: BodyShape) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_header(mut self, header: Header) -> Self {
        self.headers.push(header);
        self
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn produces(mut self, names: &[&str]) -> Self {
        self.produces = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn script_consumes(mut self, names: &[&str]) -> Self {
        self.script_consumes = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Every variable name this step's request template or scripts
    /// reference, in first-appearance order.
    pub fn consumes(&self) -> Vec<String> {
        let mut vars = self.endpoint.referenced_vars();
        for header in &self.headers {
            vars.extend(header.value.referenced_vars());
        }
        if let Some(body) = &self.body {
            vars.extend(body.referenced_vars());
        }
        vars.extend(self.script_consumes.iter().cloned());
        vars.into_iter().unique().collect()
    }
}
