//! Multi-actor business scenarios.
//!
//! Unlike protocol flows, these are fixed step sequences with named
//! sub-groupings; their branching is per-business-step, so they are not
//! expressed as variant-flag combinations.

use super::assembler::{AssembledFlow, FlowSection};
use super::catalog::{api_endpoint, auth_endpoint};
use super::{BodyField, BodyShape, Encoding, FieldValue, Header, Method, StepKind, StepTemplate};
use crate::endpoint::{EndpointTemplate, PathSegment, QueryParam, TemplateValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    Registration,
    SignIn,
    MfaEnrollment,
    MfaChallenge,
    PasswordReset,
    AccountRecovery,
    SocialLogin,
    RiskEvaluation,
    SessionManagement,
}

impl Scenario {
    pub fn all() -> Vec<Scenario> {
        vec![
            Scenario::Registration,
            Scenario::SignIn,
            Scenario::MfaEnrollment,
            Scenario::MfaChallenge,
            Scenario::PasswordReset,
            Scenario::AccountRecovery,
            Scenario::SocialLogin,
            Scenario::RiskEvaluation,
            Scenario::SessionManagement,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Scenario::Registration => "User registration",
            Scenario::SignIn => "Password sign-in",
            Scenario::MfaEnrollment => "MFA enrollment",
            Scenario::MfaChallenge => "MFA challenge",
            Scenario::PasswordReset => "Password reset",
            Scenario::AccountRecovery => "Account recovery",
            Scenario::SocialLogin => "Social login",
            Scenario::RiskEvaluation => "Risk evaluation",
            Scenario::SessionManagement => "Logout & session management",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Scenario::Registration => {
                "Creates a user and verifies ownership with a one-time passcode."
            }
            Scenario::SignIn => "Signs a prepared test user in with username and password.",
            Scenario::MfaEnrollment => "Registers an MFA device on a prepared test user.",
            Scenario::MfaChallenge => {
                "Runs a full second-factor challenge against an enrolled device."
            }
            Scenario::PasswordReset => {
                "Walks the forgot-password loop and signs in with the new password."
            }
            Scenario::AccountRecovery => "Recovers a locked-out account.",
            Scenario::SocialLogin => {
                "Delegates login to a federated provider and exchanges the returned code."
            }
            Scenario::RiskEvaluation => "Submits a sign-in action for risk evaluation.",
            Scenario::SessionManagement => {
                "Signs in, revokes every session, ends the OIDC session, and cleans up."
            }
        }
    }

    /// Builds the scenario's fixed step sequence. `uniq` is the
    /// compile-time uniqueness suffix woven into test-subject names.
    pub fn assemble(&self, uniq: &str) -> AssembledFlow {
        let sections = match self {
            Scenario::Registration => vec![
                setup_section(),
                FlowSection::named(
                    "Exercise workflow",
                    vec![create_user(uniq), otp_send(), otp_check()],
                ),
            ],
            Scenario::SignIn => vec![
                setup_section(),
                subject_section(vec![create_user(uniq), set_password()]),
                FlowSection::named("Exercise workflow", vec![password_login(uniq)]),
            ],
            Scenario::MfaEnrollment => vec![
                setup_section(),
                subject_section(vec![create_user(uniq), set_password()]),
                FlowSection::named("Exercise workflow", vec![mfa_enroll(uniq)]),
            ],
            Scenario::MfaChallenge => vec![
                setup_section(),
                subject_section(vec![create_user(uniq), set_password(), mfa_enroll(uniq)]),
                FlowSection::named(
                    "Exercise workflow",
                    vec![password_login(uniq), mfa_select_device(), mfa_verify()],
                ),
            ],
            Scenario::PasswordReset => vec![
                setup_section(),
                subject_section(vec![create_user(uniq), set_password()]),
                FlowSection::named(
                    "Exercise workflow",
                    vec![
                        password_reset_start(uniq),
                        password_reset_complete(),
                        password_login(uniq),
                    ],
                ),
            ],
            Scenario::AccountRecovery => vec![
                setup_section(),
                subject_section(vec![create_user(uniq), set_password()]),
                FlowSection::named(
                    "Exercise workflow",
                    vec![recovery_start(uniq), recovery_complete()],
                ),
            ],
            Scenario::SocialLogin => vec![FlowSection::named(
                "Exercise workflow",
                vec![social_start(), social_exchange()],
            )],
            Scenario::RiskEvaluation => vec![
                setup_section(),
                subject_section(vec![create_user(uniq)]),
                FlowSection::named("Exercise workflow", vec![risk_evaluate()]),
            ],
            Scenario::SessionManagement => vec![
                setup_section(),
                subject_section(vec![create_user(uniq), set_password()]),
                FlowSection::named(
                    "Exercise workflow",
                    vec![password_login(uniq), sessions_revoke(), oidc_logout()],
                ),
                FlowSection::named("Clean up", vec![user_delete()]),
            ],
        };

        AssembledFlow {
            name: self.name().to_string(),
            description: Some(self.description().to_string()),
            baseline: None,
            sections,
            seed_defaults: Vec::new(),
        }
    }
}

fn setup_section() -> FlowSection {
    FlowSection::named("Environment setup", vec![bootstrap_token()])
}

fn subject_section(steps: Vec<StepTemplate>) -> FlowSection {
    FlowSection::named("Configure test subject", steps)
}

fn lit(s: &str) -> FieldValue {
    FieldValue::Literal(s.to_string())
}

fn var(name: &str) -> FieldValue {
    FieldValue::Var(name.to_string())
}

fn bearer_api_header() -> Header {
    Header::new(
        "Authorization",
        TemplateValue::Literal("Bearer {{api_access_token}}".to_string()),
    )
}

fn subject_username(uniq: &str) -> String {
    format!("qa-user-{}@flowdeck.test", uniq)
}

/// `/v1/tenants/{{tenantId}}/users/{{user_id}}/<path...>`
fn api_user_endpoint(path: &[&str]) -> EndpointTemplate {
    let mut endpoint = api_endpoint(&["users"]);
    endpoint.path.push(PathSegment::Var("user_id".to_string()));
    endpoint
        .path
        .extend(path.iter().map(|s| PathSegment::Literal(s.to_string())));
    endpoint
}

/// Management-API bootstrap: every scenario that touches the API starts by
/// acquiring its own bearer token.
fn bootstrap_token() -> StepTemplate {
    StepTemplate::new(
        "Get management API token",
        StepKind::ClientCredentials,
        Method::Post,
        auth_endpoint(&["oauth2", "token"]),
    )
    .with_body(BodyShape::new(vec![
        BodyField::new("grant_type", lit("client_credentials")),
        BodyField::new("client_id", var("clientId")),
        BodyField::new("client_secret", var("clientSecret")),
        BodyField::new("scope", lit("uid.manage")),
    ]))
    .produces(&["api_access_token"])
}

fn create_user(uniq: &str) -> StepTemplate {
    StepTemplate::new(
        "Create test user",
        StepKind::UserCreate,
        Method::Post,
        api_endpoint(&["users"]),
    )
    .with_header(bearer_api_header())
    .with_encoding(Encoding::Json)
    .with_body(BodyShape::new(vec![
        BodyField::new("username", lit(&subject_username(uniq))),
        BodyField::new("display_name", lit(&format!("Flowdeck QA ({})", uniq))),
    ]))
    .produces(&["user_id"])
}

fn set_password() -> StepTemplate {
    StepTemplate::new(
        "Set known password",
        StepKind::PasswordSet,
        Method::Put,
        api_user_endpoint(&["password"]),
    )
    .with_header(bearer_api_header())
    .with_encoding(Encoding::Json)
    .with_body(BodyShape::new(vec![BodyField::new(
        "password",
        var("testPassword"),
    )]))
}

fn password_login(uniq: &str) -> StepTemplate {
    StepTemplate::new(
        "Sign in with password",
        StepKind::PasswordLogin,
        Method::Post,
        auth_endpoint(&["auth", "password", "login"]),
    )
    .with_encoding(Encoding::Json)
    .with_body(BodyShape::new(vec![
        BodyField::new("username", lit(&subject_username(uniq))),
        BodyField::new("password", var("testPassword")),
    ]))
    .produces(&["session_token"])
}

fn otp_send() -> StepTemplate {
    StepTemplate::new(
        "Send registration passcode",
        StepKind::OtpSend,
        Method::Post,
        auth_endpoint(&["auth", "otp", "send"]),
    )
    .with_encoding(Encoding::Json)
    .with_body(BodyShape::new(vec![
        BodyField::new("user_id", var("user_id")),
        BodyField::new("channel", lit("email")),
    ]))
}

fn otp_check() -> StepTemplate {
    StepTemplate::new(
        "Check registration passcode",
        StepKind::OtpCheck,
        Method::Post,
        auth_endpoint(&["auth", "otp", "check"]),
    )
    .with_encoding(Encoding::Json)
    .with_body(BodyShape::new(vec![
        BodyField::new("user_id", var("user_id")),
        BodyField::new("otp", var("otpCode")),
    ]))
    .produces(&["session_token"])
}

fn mfa_enroll(uniq: &str) -> StepTemplate {
    StepTemplate::new(
        "Enroll MFA device",
        StepKind::MfaEnroll,
        Method::Post,
        api_user_endpoint(&["mfa", "devices"]),
    )
    .with_header(bearer_api_header())
    .with_encoding(Encoding::Json)
    .with_body(BodyShape::new(vec![
        BodyField::new("type", lit("totp")),
        BodyField::new("label", lit(&format!("qa-device-{}", uniq))),
    ]))
    .produces(&["mfa_device_id"])
}

fn mfa_select_device() -> StepTemplate {
    StepTemplate::new(
        "Select MFA device",
        StepKind::MfaSelectDevice,
        Method::Post,
        auth_endpoint(&["auth", "mfa", "select"]),
    )
    .with_body(BodyShape::new(vec![
        BodyField::new("session_token", var("session_token")),
        BodyField::new("device_id", var("mfa_device_id")),
    ]))
    .produces(&["mfa_challenge_id"])
}

fn mfa_verify() -> StepTemplate {
    StepTemplate::new(
        "Verify MFA challenge",
        StepKind::MfaVerify,
        Method::Post,
        auth_endpoint(&["auth", "mfa", "verify"]),
    )
    .with_encoding(Encoding::Json)
    .with_body(BodyShape::new(vec![
        BodyField::new("challenge_id", var("mfa_challenge_id")),
        BodyField::new("otp", var("otpCode")),
    ]))
    .produces(&["access_token"])
}

fn password_reset_start(uniq: &str) -> StepTemplate {
    StepTemplate::new(
        "Start password reset",
        StepKind::PasswordResetStart,
        Method::Post,
        auth_endpoint(&["auth", "password", "reset", "start"]),
    )
    .with_encoding(Encoding::Json)
    .with_body(BodyShape::new(vec![BodyField::new(
        "username",
        lit(&subject_username(uniq)),
    )]))
    .produces(&["reset_token"])
}

fn password_reset_complete() -> StepTemplate {
    StepTemplate::new(
        "Complete password reset",
        StepKind::PasswordResetComplete,
        Method::Post,
        auth_endpoint(&["auth", "password", "reset", "complete"]),
    )
    .with_encoding(Encoding::Json)
    .with_body(BodyShape::new(vec![
        BodyField::new("reset_token", var("reset_token")),
        BodyField::new("new_password", var("testPassword")),
    ]))
}

fn recovery_start(uniq: &str) -> StepTemplate {
    StepTemplate::new(
        "Start account recovery",
        StepKind::RecoveryStart,
        Method::Post,
        auth_endpoint(&["auth", "recovery", "start"]),
    )
    .with_encoding(Encoding::Json)
    .with_body(BodyShape::new(vec![BodyField::new(
        "username",
        lit(&subject_username(uniq)),
    )]))
    .produces(&["recovery_token"])
}

fn recovery_complete() -> StepTemplate {
    StepTemplate::new(
        "Complete account recovery",
        StepKind::RecoveryComplete,
        Method::Post,
        auth_endpoint(&["auth", "recovery", "complete"]),
    )
    .with_encoding(Encoding::Json)
    .with_body(BodyShape::new(vec![
        BodyField::new("recovery_token", var("recovery_token")),
        BodyField::new("new_password", var("testPassword")),
    ]))
}

fn social_start() -> StepTemplate {
    StepTemplate::new(
        "Redirect to federated provider",
        StepKind::SocialStart,
        Method::Get,
        auth_endpoint(&["oauth2", "authorize"]).with_query(vec![
            QueryParam::new("client_id", TemplateValue::Var("clientId".to_string())),
            QueryParam::new("redirect_uri", TemplateValue::Var("redirectUri".to_string())),
            QueryParam::new("response_type", TemplateValue::Literal("code".to_string())),
            QueryParam::new("scope", TemplateValue::Var("scope".to_string())),
            QueryParam::new("state", TemplateValue::Var("state".to_string())),
            QueryParam::new("idp", TemplateValue::Literal("google".to_string())),
        ]),
    )
    .produces(&["auth_code"])
}

fn social_exchange() -> StepTemplate {
    StepTemplate::new(
        "Exchange social login code",
        StepKind::TokenExchange,
        Method::Post,
        auth_endpoint(&["oauth2", "token"]),
    )
    .with_body(BodyShape::new(vec![
        BodyField::new("grant_type", lit("authorization_code")),
        BodyField::new("code", var("auth_code")),
        BodyField::new("redirect_uri", var("redirectUri")),
        BodyField::new("client_id", var("clientId")),
        BodyField::new("client_secret", var("clientSecret")),
    ]))
    .produces(&["access_token"])
}

fn risk_evaluate() -> StepTemplate {
    StepTemplate::new(
        "Evaluate sign-in risk",
        StepKind::RiskEvaluate,
        Method::Post,
        api_endpoint(&["risk", "evaluate"]),
    )
    .with_header(bearer_api_header())
    .with_body(BodyShape::new(vec![
        BodyField::new("user_id", var("user_id")),
        BodyField::new("action", lit("sign-in")),
        BodyField::new(
            "context",
            FieldValue::Json(serde_json::json!({
                "channel": "web",
                "ip_address": "203.0.113.7",
            })),
        ),
    ]))
    .produces(&["risk_id"])
}

fn sessions_revoke() -> StepTemplate {
    StepTemplate::new(
        "Revoke all sessions",
        StepKind::SessionsRevoke,
        Method::Delete,
        api_user_endpoint(&["sessions"]),
    )
    .with_header(bearer_api_header())
}

fn oidc_logout() -> StepTemplate {
    StepTemplate::new(
        "End OIDC session",
        StepKind::Logout,
        Method::Get,
        auth_endpoint(&["oidc", "logout"]).with_query(vec![QueryParam::new(
            "post_logout_redirect_uri",
            TemplateValue::Var("redirectUri".to_string()),
        )]),
    )
}

fn user_delete() -> StepTemplate {
    StepTemplate::new(
        "Delete test user",
        StepKind::UserDelete,
        Method::Delete,
        api_user_endpoint(&[]),
    )
    .with_header(bearer_api_header())
}
