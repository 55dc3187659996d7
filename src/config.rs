//! Credential/configuration input consumed by the compiler.
//!
//! The profile is read-only: it seeds the environment document and the
//! collection's variable defaults, and the compiler never writes back to it.

/// Tenant- and client-level settings that parameterize every compiled flow.
#[derive(Debug, Clone)]
pub struct CredentialProfile {
    /// Tenant (environment) identifier substituted for `{{tenantId}}`.
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    /// Default redirect URI for browser-delivered flows.
    pub redirect_uri: String,
    /// Default scopes, joined with spaces when rendered.
    pub scopes: Vec<String>,
}

impl Default for CredentialProfile {
    fn default() -> Self {
        Self {
            tenant_id: "00000000-0000-0000-0000-000000000000".to_string(),
            client_id: "your-client-id".to_string(),
            client_secret: String::new(),
            redirect_uri: "https://localhost:8443/callback".to_string(),
            scopes: vec!["openid".to_string(), "offline_access".to_string()],
        }
    }
}

impl CredentialProfile {
    pub fn scope_string(&self) -> String {
        self.scopes.join(" ")
    }
}
