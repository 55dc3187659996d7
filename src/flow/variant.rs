//! Flow variants: the flag combinations that select and parameterize step
//! templates. A variant is built per requested flow and discarded after
//! assembly.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantShape {
    AuthorizationCode,
    DeviceCode,
    ClientCredentials,
    Hybrid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolBaseline {
    OAuth2,
    Oidc,
    /// OIDC profile where the server rejects non-PKCE clients.
    OidcPkceMandatory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PkceMode {
    Required,
    Optional,
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientAuthMethod {
    /// Credentials in the request body.
    Post,
    /// HTTP Basic header built by a pre-script.
    Basic,
    /// `client_assertion` signed with the client secret (HS256).
    ClientSecretJwt,
    /// `client_assertion` signed with the registered private key (RS256).
    PrivateKeyJwt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseDelivery {
    Query,
    Fragment,
    FormPost,
}

/// A named combination of protocol-flag choices.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowVariant {
    pub grant: GrantShape,
    pub baseline: ProtocolBaseline,
    pub pkce: PkceMode,
    pub par: bool,
    pub client_auth: ClientAuthMethod,
    pub delivery: ResponseDelivery,
    pub refresh: bool,
    pub introspect: bool,
    pub userinfo: bool,
}

impl FlowVariant {
    pub fn authorization_code(baseline: ProtocolBaseline) -> Self {
        Self {
            grant: GrantShape::AuthorizationCode,
            baseline,
            pkce: PkceMode::Off,
            par: false,
            client_auth: ClientAuthMethod::Post,
            delivery: ResponseDelivery::Query,
            refresh: false,
            introspect: false,
            userinfo: false,
        }
    }

    pub fn device_code(baseline: ProtocolBaseline) -> Self {
        Self {
            grant: GrantShape::DeviceCode,
            ..Self::authorization_code(baseline)
        }
    }

    pub fn client_credentials(baseline: ProtocolBaseline) -> Self {
        Self {
            grant: GrantShape::ClientCredentials,
            ..Self::authorization_code(baseline)
        }
    }

    pub fn hybrid() -> Self {
        Self {
            grant: GrantShape::Hybrid,
            delivery: ResponseDelivery::Fragment,
            ..Self::authorization_code(ProtocolBaseline::Oidc)
        }
    }

    pub fn with_pkce(mut self, pkce: PkceMode) -> Self {
        self.pkce = pkce;
        self
    }

    pub fn with_par(mut self, par: bool) -> Self {
        self.par = par;
        self
    }

    pub fn with_client_auth(mut self, client_auth: ClientAuthMethod) -> Self {
        self.client_auth = client_auth;
        self
    }

    pub fn with_delivery(mut self, delivery: ResponseDelivery) -> Self {
        self.delivery = delivery;
        self
    }

    pub fn with_refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }

    pub fn with_introspection(mut self, introspect: bool) -> Self {
        self.introspect = introspect;
        self
    }

    pub fn with_userinfo(mut self, userinfo: bool) -> Self {
        self.userinfo = userinfo;
        self
    }

    /// The PKCE mode after the baseline has its say: the mandatory-PKCE
    /// profile upgrades anything to `Required`.
    pub fn effective_pkce(&self) -> PkceMode {
        if self.baseline == ProtocolBaseline::OidcPkceMandatory {
            PkceMode::Required
        } else {
            self.pkce
        }
    }

    pub fn uses_pkce(&self) -> bool {
        self.effective_pkce() != PkceMode::Off
    }

    pub fn is_openid(&self) -> bool {
        self.baseline != ProtocolBaseline::OAuth2
    }

    /// Human-readable flow name derived from the flag combination.
    pub fn name(&self) -> String {
        let grant = match self.grant {
            GrantShape::AuthorizationCode => "Authorization Code",
            GrantShape::DeviceCode => "Device Code",
            GrantShape::ClientCredentials => "Client Credentials",
            GrantShape::Hybrid => "Hybrid",
        };
        let mut qualifiers: Vec<&str> = Vec::new();
        if self.uses_pkce() {
            qualifiers.push("PKCE");
        }
        if self.par {
            qualifiers.push("PAR");
        }
        match self.client_auth {
            ClientAuthMethod::Post => {}
            ClientAuthMethod::Basic => qualifiers.push("Basic auth"),
            ClientAuthMethod::ClientSecretJwt => qualifiers.push("client-secret JWT"),
            ClientAuthMethod::PrivateKeyJwt => qualifiers.push("private-key JWT"),
        }
        let default_delivery = match self.grant {
            GrantShape::Hybrid => ResponseDelivery::Fragment,
            _ => ResponseDelivery::Query,
        };
        if self.delivery != default_delivery {
            match self.delivery {
                ResponseDelivery::Query => qualifiers.push("query delivery"),
                ResponseDelivery::Fragment => qualifiers.push("fragment delivery"),
                ResponseDelivery::FormPost => qualifiers.push("form-post delivery"),
            }
        }
        if qualifiers.is_empty() {
            grant.to_string()
        } else {
            format!("{} ({})", grant, qualifiers.join(", "))
        }
    }

    /// The variants compiled into the default collection.
    pub fn builtin_matrix() -> Vec<FlowVariant> {
        vec![
            Self::authorization_code(ProtocolBaseline::OAuth2),
            Self::authorization_code(ProtocolBaseline::OAuth2)
                .with_pkce(PkceMode::Required)
                .with_client_auth(ClientAuthMethod::Basic)
                .with_refresh(true),
            Self::client_credentials(ProtocolBaseline::OAuth2)
                .with_client_auth(ClientAuthMethod::Basic)
                .with_introspection(true),
            Self::device_code(ProtocolBaseline::OAuth2).with_refresh(true),
            Self::authorization_code(ProtocolBaseline::Oidc)
                .with_pkce(PkceMode::Required)
                .with_client_auth(ClientAuthMethod::Basic)
                .with_refresh(true)
                .with_userinfo(true),
            Self::authorization_code(ProtocolBaseline::Oidc)
                .with_client_auth(ClientAuthMethod::ClientSecretJwt)
                .with_delivery(ResponseDelivery::FormPost),
            Self::hybrid(),
            Self::authorization_code(ProtocolBaseline::OidcPkceMandatory)
                .with_par(true)
                .with_client_auth(ClientAuthMethod::PrivateKeyJwt)
                .with_introspection(true)
                .with_userinfo(true),
        ]
    }
}
