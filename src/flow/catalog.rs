use super::variant::{ClientAuthMethod, FlowVariant, GrantShape, ResponseDelivery};
use super::{BodyField, BodyShape, FieldValue, Header, Method, StepKind, StepTemplate};
use crate::endpoint::{EndpointTemplate, HostClass, PathSegment, QueryParam, TENANT_VAR, TemplateValue};
use crate::error::AssemblyError;
use ahash::AHashMap;

/// Everything a step factory may condition on.
pub struct StepContext<'a> {
    pub variant: &'a FlowVariant,
}

/// Defines the contract for instantiating one step kind for a variant.
pub trait StepFactory: Send + Sync {
    fn kind(&self) -> StepKind;
    fn build(&self, ctx: &StepContext<'_>) -> StepTemplate;
}

/// Read-only registry of step factories, keyed by kind. Looked up by the
/// flow assembler; adding a flow shape is a registry entry, not a new code
/// path.
pub struct StepCatalog {
    registry: AHashMap<StepKind, Box<dyn StepFactory>>,
}

impl StepCatalog {
    pub fn empty() -> Self {
        Self {
            registry: AHashMap::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut catalog = Self::empty();
        register_default_factories(&mut catalog);
        catalog
    }

    pub fn register(&mut self, factory: Box<dyn StepFactory>) {
        self.registry.insert(factory.kind(), factory);
    }

    pub fn build(
        &self,
        kind: StepKind,
        ctx: &StepContext<'_>,
    ) -> Result<StepTemplate, AssemblyError> {
        self.registry
            .get(&kind)
            .map(|factory| factory.build(ctx))
            .ok_or(AssemblyError::UnknownStepKind(kind))
    }
}

impl Default for StepCatalog {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn register_default_factories(catalog: &mut StepCatalog) {
    catalog.register(Box::new(GeneratePkceFactory));
    catalog.register(Box::new(ParFactory));
    catalog.register(Box::new(AuthorizeFactory));
    catalog.register(Box::new(TokenExchangeFactory));
    catalog.register(Box::new(DeviceAuthorizeFactory));
    catalog.register(Box::new(DevicePollFactory));
    catalog.register(Box::new(ClientCredentialsFactory));
    catalog.register(Box::new(TokenRefreshFactory));
    catalog.register(Box::new(IntrospectFactory));
    catalog.register(Box::new(UserInfoFactory));
    catalog.register(Box::new(RevokeFactory));
}

// Construction shorthands shared by the factories.

fn lit(s: &str) -> TemplateValue {
    TemplateValue::Literal(s.to_string())
}

fn var(name: &str) -> TemplateValue {
    TemplateValue::Var(name.to_string())
}

fn field_lit(name: &str, value: &str) -> BodyField {
    BodyField::new(name, FieldValue::Literal(value.to_string()))
}

fn field_var(name: &str, variable: &str) -> BodyField {
    BodyField::new(name, FieldValue::Var(variable.to_string()))
}

/// `https://{{authHost}}/{{tenantId}}/<path...>`
pub(super) fn auth_endpoint(path: &[&str]) -> EndpointTemplate {
    let mut segments = vec![PathSegment::Var(TENANT_VAR.to_string())];
    segments.extend(path.iter().map(|s| PathSegment::Literal(s.to_string())));
    EndpointTemplate::on(HostClass::Auth, segments)
}

/// `https://{{apiHost}}/v1/tenants/{{tenantId}}/<path...>`
pub(super) fn api_endpoint(path: &[&str]) -> EndpointTemplate {
    let mut segments = vec![
        PathSegment::Literal("v1".to_string()),
        PathSegment::Literal("tenants".to_string()),
        PathSegment::Var(TENANT_VAR.to_string()),
    ];
    segments.extend(path.iter().map(|s| PathSegment::Literal(s.to_string())));
    EndpointTemplate::on(HostClass::Api, segments)
}

/// Body fields carrying the variant's client authentication, for endpoints
/// that authenticate the client in the request body.
fn client_auth_fields(variant: &FlowVariant) -> Vec<BodyField> {
    match variant.client_auth {
        ClientAuthMethod::Post => vec![
            field_var("client_id", "clientId"),
            field_var("client_secret", "clientSecret"),
        ],
        ClientAuthMethod::Basic => Vec::new(),
        ClientAuthMethod::ClientSecretJwt | ClientAuthMethod::PrivateKeyJwt => vec![
            field_lit(
                "client_assertion_type",
                "urn:ietf:params:oauth:client-assertion-type:jwt-bearer",
            ),
            field_var("client_assertion", "client_assertion"),
        ],
    }
}

/// Variables the client-auth pre-script reads that the request template
/// itself does not mention.
fn client_auth_script_consumes(variant: &FlowVariant) -> &'static [&'static str] {
    match variant.client_auth {
        ClientAuthMethod::Post => &[],
        ClientAuthMethod::Basic => &["clientId", "clientSecret"],
        ClientAuthMethod::ClientSecretJwt => &["clientId", "clientSecret"],
        ClientAuthMethod::PrivateKeyJwt => &["signedAssertion"],
    }
}

/// The query parameters of a front-channel authorization request, minus
/// anything a pushed request already carries.
fn authorize_query(variant: &FlowVariant) -> Vec<QueryParam> {
    if variant.par {
        return vec![
            QueryParam::new("client_id", var("clientId")),
            QueryParam::new("request_uri", var("request_uri")),
        ];
    }
    let mut query = vec![
        QueryParam::new("client_id", var("clientId")),
        QueryParam::new("redirect_uri", var("redirectUri")),
        QueryParam::new("response_type", lit(response_type(variant))),
        QueryParam::new("scope", var("scope")),
        QueryParam::new("state", var("state")),
    ];
    if variant.is_openid() {
        query.push(QueryParam::new("nonce", var("nonce")));
    }
    if variant.uses_pkce() {
        query.push(QueryParam::new("code_challenge", var("code_challenge")));
        query.push(QueryParam::new("code_challenge_method", lit("S256")));
    }
    if let Some(mode) = explicit_response_mode(variant) {
        query.push(QueryParam::new("response_mode", lit(mode)));
    }
    query
}

fn response_type(variant: &FlowVariant) -> &'static str {
    match variant.grant {
        GrantShape::Hybrid => "code id_token",
        _ => "code",
    }
}

/// `response_mode` is only sent when it differs from the protocol default
/// for the chosen response type.
fn explicit_response_mode(variant: &FlowVariant) -> Option<&'static str> {
    let default = match variant.grant {
        GrantShape::Hybrid => ResponseDelivery::Fragment,
        _ => ResponseDelivery::Query,
    };
    if variant.delivery == default {
        return None;
    }
    Some(match variant.delivery {
        ResponseDelivery::Query => "query",
        ResponseDelivery::Fragment => "fragment",
        ResponseDelivery::FormPost => "form_post",
    })
}

fn token_produces(variant: &FlowVariant) -> Vec<String> {
    let mut produces = vec!["access_token".to_string()];
    if variant.refresh {
        produces.push("refresh_token".to_string());
    }
    // In the hybrid flow the id_token already arrived on the redirect; the
    // authorize step is its one producer.
    if variant.is_openid()
        && !matches!(
            variant.grant,
            GrantShape::ClientCredentials | GrantShape::Hybrid
        )
    {
        produces.push("id_token".to_string());
    }
    produces
}

struct GeneratePkceFactory;
impl StepFactory for GeneratePkceFactory {
    fn kind(&self) -> StepKind {
        StepKind::GeneratePkce
    }
    fn build(&self, _ctx: &StepContext<'_>) -> StepTemplate {
        // The discovery document is a harmless carrier request; the PKCE
        // pair itself comes out of the pre-script.
        StepTemplate::new(
            "Generate PKCE pair",
            StepKind::GeneratePkce,
            Method::Get,
            auth_endpoint(&[".well-known", "openid-configuration"]),
        )
        .produces(&["code_verifier", "code_challenge"])
    }
}

struct ParFactory;
impl StepFactory for ParFactory {
    fn kind(&self) -> StepKind {
        StepKind::Par
    }
    fn build(&self, ctx: &StepContext<'_>) -> StepTemplate {
        let variant = ctx.variant;
        let mut fields = vec![
            field_var("client_id", "clientId"),
            field_var("redirect_uri", "redirectUri"),
            field_lit("response_type", response_type(variant)),
            field_var("scope", "scope"),
            field_var("state", "state"),
        ];
        if variant.is_openid() {
            fields.push(field_var("nonce", "nonce"));
        }
        if variant.uses_pkce() {
            fields.push(field_var("code_challenge", "code_challenge"));
            fields.push(field_lit("code_challenge_method", "S256"));
        }
        if let Some(mode) = explicit_response_mode(variant) {
            fields.push(field_lit("response_mode", mode));
        }
        fields.extend(client_auth_fields(variant));
        StepTemplate::new(
            "Push authorization request",
            StepKind::Par,
            Method::Post,
            auth_endpoint(&["oauth2", "par"]),
        )
        .with_body(BodyShape::new(fields))
        .script_consumes(client_auth_script_consumes(variant))
        .produces(&["request_uri"])
    }
}

struct AuthorizeFactory;
impl StepFactory for AuthorizeFactory {
    fn kind(&self) -> StepKind {
        StepKind::Authorize
    }
    fn build(&self, ctx: &StepContext<'_>) -> StepTemplate {
        let variant = ctx.variant;
        let produces: &[&str] = match variant.grant {
            GrantShape::Hybrid => &["auth_code", "id_token"],
            _ => &["auth_code"],
        };
        StepTemplate::new(
            "Build authorize URL",
            StepKind::Authorize,
            Method::Get,
            auth_endpoint(&["oauth2", "authorize"]).with_query(authorize_query(variant)),
        )
        .produces(produces)
    }
}

struct TokenExchangeFactory;
impl StepFactory for TokenExchangeFactory {
    fn kind(&self) -> StepKind {
        StepKind::TokenExchange
    }
    fn build(&self, ctx: &StepContext<'_>) -> StepTemplate {
        let variant = ctx.variant;
        let mut fields = vec![
            field_lit("grant_type", "authorization_code"),
            field_var("code", "auth_code"),
            field_var("redirect_uri", "redirectUri"),
        ];
        if variant.uses_pkce() {
            fields.push(field_var("code_verifier", "code_verifier"));
        }
        fields.extend(client_auth_fields(variant));
        let produces = token_produces(variant);
        StepTemplate::new(
            "Exchange code for tokens",
            StepKind::TokenExchange,
            Method::Post,
            auth_endpoint(&["oauth2", "token"]),
        )
        .with_body(BodyShape::new(fields))
        .script_consumes(client_auth_script_consumes(variant))
        .produces(&produces.iter().map(String::as_str).collect::<Vec<_>>())
    }
}

struct DeviceAuthorizeFactory;
impl StepFactory for DeviceAuthorizeFactory {
    fn kind(&self) -> StepKind {
        StepKind::DeviceAuthorize
    }
    fn build(&self, _ctx: &StepContext<'_>) -> StepTemplate {
        StepTemplate::new(
            "Start device authorization",
            StepKind::DeviceAuthorize,
            Method::Post,
            auth_endpoint(&["oauth2", "device_authorization"]),
        )
        .with_body(BodyShape::new(vec![
            field_var("client_id", "clientId"),
            field_var("scope", "scope"),
        ]))
        .produces(&["device_code", "user_code", "verification_uri", "interval"])
    }
}

struct DevicePollFactory;
impl StepFactory for DevicePollFactory {
    fn kind(&self) -> StepKind {
        StepKind::DevicePoll
    }
    fn build(&self, ctx: &StepContext<'_>) -> StepTemplate {
        let variant = ctx.variant;
        let mut fields = vec![
            field_lit("grant_type", "urn:ietf:params:oauth:grant-type:device_code"),
            field_var("device_code", "device_code"),
        ];
        fields.extend(client_auth_fields(variant));
        let produces = token_produces(variant);
        StepTemplate::new(
            "Poll for device tokens",
            StepKind::DevicePoll,
            Method::Post,
            auth_endpoint(&["oauth2", "token"]),
        )
        .with_body(BodyShape::new(fields))
        .script_consumes(client_auth_script_consumes(variant))
        .produces(&produces.iter().map(String::as_str).collect::<Vec<_>>())
    }
}

struct ClientCredentialsFactory;
impl StepFactory for ClientCredentialsFactory {
    fn kind(&self) -> StepKind {
        StepKind::ClientCredentials
    }
    fn build(&self, ctx: &StepContext<'_>) -> StepTemplate {
        let variant = ctx.variant;
        let mut fields = vec![
            field_lit("grant_type", "client_credentials"),
            field_var("scope", "scope"),
        ];
        fields.extend(client_auth_fields(variant));
        StepTemplate::new(
            "Request client-credentials token",
            StepKind::ClientCredentials,
            Method::Post,
            auth_endpoint(&["oauth2", "token"]),
        )
        .with_body(BodyShape::new(fields))
        .script_consumes(client_auth_script_consumes(variant))
        .produces(&["access_token"])
    }
}

struct TokenRefreshFactory;
impl StepFactory for TokenRefreshFactory {
    fn kind(&self) -> StepKind {
        StepKind::TokenRefresh
    }
    fn build(&self, ctx: &StepContext<'_>) -> StepTemplate {
        let variant = ctx.variant;
        let mut fields = vec![
            field_lit("grant_type", "refresh_token"),
            field_var("refresh_token", "refresh_token"),
        ];
        fields.extend(client_auth_fields(variant));
        StepTemplate::new(
            "Refresh tokens",
            StepKind::TokenRefresh,
            Method::Post,
            auth_endpoint(&["oauth2", "token"]),
        )
        .with_body(BodyShape::new(fields))
        .script_consumes(client_auth_script_consumes(variant))
        .produces(&["access_token", "refresh_token"])
    }
}

struct IntrospectFactory;
impl StepFactory for IntrospectFactory {
    fn kind(&self) -> StepKind {
        StepKind::Introspect
    }
    fn build(&self, ctx: &StepContext<'_>) -> StepTemplate {
        let variant = ctx.variant;
        let mut fields = vec![
            field_var("token", "access_token"),
            field_lit("token_type_hint", "access_token"),
        ];
        fields.extend(client_auth_fields(variant));
        StepTemplate::new(
            "Introspect access token",
            StepKind::Introspect,
            Method::Post,
            auth_endpoint(&["oauth2", "introspect"]),
        )
        .with_body(BodyShape::new(fields))
        .script_consumes(client_auth_script_consumes(variant))
    }
}

struct UserInfoFactory;
impl StepFactory for UserInfoFactory {
    fn kind(&self) -> StepKind {
        StepKind::UserInfo
    }
    fn build(&self, _ctx: &StepContext<'_>) -> StepTemplate {
        StepTemplate::new(
            "Fetch userinfo",
            StepKind::UserInfo,
            Method::Get,
            auth_endpoint(&["oidc", "userinfo"]),
        )
        .with_header(Header::new(
            "Authorization",
            lit("Bearer {{access_token}}"),
        ))
    }
}

struct RevokeFactory;
impl StepFactory for RevokeFactory {
    fn kind(&self) -> StepKind {
        StepKind::Revoke
    }
    fn build(&self, ctx: &StepContext<'_>) -> StepTemplate {
        let variant = ctx.variant;
        let mut fields = vec![field_var("token", "access_token")];
        fields.extend(client_auth_fields(variant));
        StepTemplate::new(
            "Revoke access token",
            StepKind::Revoke,
            Method::Post,
            auth_endpoint(&["oauth2", "revoke"]),
        )
        .with_body(BodyShape::new(fields))
        .script_consumes(client_auth_script_consumes(variant))
    }
}
