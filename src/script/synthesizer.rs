use super::{AssertionMethod, ScriptStatement};
use crate::binder::StepBinding;
use crate::flow::{ClientAuthMethod, FlowVariant, ResponseDelivery, StepKind, StepTemplate};

/// The pre- and post-script statement sequences for one step.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SynthesizedScripts {
    pub pre: Vec<ScriptStatement>,
    pub post: Vec<ScriptStatement>,
}

/// Generates scripts from step kind, variant flags, and binder state.
/// Performs no I/O and no live cryptography.
pub struct ScriptSynthesizer;

impl ScriptSynthesizer {
    pub fn synthesize(
        step: &StepTemplate,
        variant: Option<&FlowVariant>,
        binding: &StepBinding,
    ) -> SynthesizedScripts {
        SynthesizedScripts {
            pre: pre_statements(step, variant),
            post: post_statements(step, variant, binding),
        }
    }
}

fn pre_statements(step: &StepTemplate, variant: Option<&FlowVariant>) -> Vec<ScriptStatement> {
    let mut statements = Vec::new();

    match step.kind {
        StepKind::GeneratePkce => {
            statements.push(ScriptStatement::GeneratePkce {
                verifier_var: produced_like(step, "verifier", "code_verifier"),
                challenge_var: produced_like(step, "challenge", "code_challenge"),
            });
        }
        StepKind::Authorize | StepKind::SocialStart | StepKind::Par => {
            let consumed = step.consumes();
            let vars: Vec<String> = ["state", "nonce"]
                .iter()
                .filter(|name| consumed.iter().any(|c| c == *name))
                .map(|name| name.to_string())
                .collect();
            if !vars.is_empty() {
                statements.push(ScriptStatement::RefreshStateValues { vars });
            }
        }
        StepKind::DevicePoll => {
            statements.push(ScriptStatement::Note {
                text: "Re-send this request at the pace 'interval' suggests until the \
                       device login finishes."
                    .to_string(),
            });
        }
        _ => {}
    }

    if let Some(variant) = variant {
        if authenticates_as_client(step.kind) {
            match variant.client_auth {
                ClientAuthMethod::Post => {}
                ClientAuthMethod::Basic => statements.push(ScriptStatement::BasicAuthHeader {
                    id_var: "clientId".to_string(),
                    secret_var: "clientSecret".to_string(),
                }),
                ClientAuthMethod::ClientSecretJwt => {
                    statements.push(ScriptStatement::SignClientAssertion {
                        method: AssertionMethod::ClientSecretHmac,
                        var: "client_assertion".to_string(),
                        audience: step.endpoint.raw(),
                    });
                }
                ClientAuthMethod::PrivateKeyJwt => {
                    statements.push(ScriptStatement::SignClientAssertion {
                        method: AssertionMethod::PrivateKeyExternal,
                        var: "client_assertion".to_string(),
                        audience: step.endpoint.raw(),
                    });
                }
            }
        }
    }

    statements
}

fn post_statements(
    step: &StepTemplate,
    variant: Option<&FlowVariant>,
    binding: &StepBinding,
) -> Vec<ScriptStatement> {
    let mut statements = vec![ScriptStatement::AssertStatus {
        expected: step.kind.expected_status(),
    }];

    match step.kind {
        // PKCE values are published by the pre-script, not the response.
        StepKind::GeneratePkce => {}
        StepKind::Authorize | StepKind::SocialStart => {
            let delivery = variant.map_or(ResponseDelivery::Query, |v| v.delivery);
            for var in &binding.produces {
                statements.push(ScriptStatement::ExtractRedirectParam {
                    param: redirect_param(var),
                    var: var.clone(),
                    delivery,
                });
            }
        }
        _ => {
            for var in &binding.produces {
                statements.push(ScriptStatement::ExtractField {
                    path: response_path(step.kind, var),
                    var: var.clone(),
                });
            }
        }
    }

    statements
}

/// Step kinds that authenticate as the OAuth client and therefore carry the
/// variant's client-auth method.
fn authenticates_as_client(kind: StepKind) -> bool {
    matches!(
        kind,
        StepKind::Par
            | StepKind::TokenExchange
            | StepKind::ClientCredentials
            | StepKind::DevicePoll
            | StepKind::TokenRefresh
            | StepKind::Introspect
            | StepKind::Revoke
    )
}

fn produced_like(step: &StepTemplate, fragment: &str, fallback: &str) -> String {
    step.produces
        .iter()
        .find(|name| name.contains(fragment))
        .cloned()
        .unwrap_or_else(|| fallback.to_string())
}

fn redirect_param(var: &str) -> String {
    match var {
        "auth_code" => "code".to_string(),
        other => other.to_string(),
    }
}

/// Response-body path for a produced variable. The vendor's business
/// endpoints wrap their payloads in a `result` envelope; protocol endpoints
/// answer flat.
fn response_path(kind: StepKind, var: &str) -> Vec<String> {
    let nested: Option<&[&str]> = match (kind, var) {
        // Scenario bootstrap stores the plain token response under its own
        // variable name.
        (StepKind::ClientCredentials, "api_access_token") => Some(&["access_token"]),
        (StepKind::UserCreate, "user_id") => Some(&["result", "id"]),
        (StepKind::PasswordLogin | StepKind::OtpCheck, "session_token") => {
            Some(&["result", "session_token"])
        }
        (StepKind::MfaEnroll, "mfa_device_id") => Some(&["result", "device_id"]),
        (StepKind::MfaSelectDevice, "mfa_challenge_id") => Some(&["result", "challenge_id"]),
        (StepKind::PasswordResetStart, "reset_token") => Some(&["result", "reset_token"]),
        (StepKind::RecoveryStart, "recovery_token") => Some(&["result", "recovery_token"]),
        (StepKind::RiskEvaluate, "risk_id") => Some(&["result", "risk_id"]),
        _ => None,
    };
    match nested {
        Some(path) => path.iter().map(|p| p.to_string()).collect(),
        None => vec![var.to_string()],
    }
}
