//! Parameterized endpoint templates.
//!
//! A concrete vendor URL like
//! `https://auth.eu.uniqid.io/f81d4fae-.../oauth2/token` is rewritten into a
//! host-class placeholder, templated path segments, and structured query
//! pairs, so the rendered collection stays routable against any region or
//! tenant once the seed variables are filled in.

mod normalizer;

pub use normalizer::{EndpointNormalizer, HostCatalog, HostRule};
pub(crate) use normalizer::looks_like_uuid;

use crate::binder::placeholders_in;

/// Variable name substituted for recognized authorization hosts.
pub const AUTH_HOST_VAR: &str = "authHost";
/// Variable name substituted for recognized management API hosts.
pub const API_HOST_VAR: &str = "apiHost";
/// Variable name substituted for UUID-shaped tenant path segments.
pub const TENANT_VAR: &str = "tenantId";

/// Host classes the normalizer knows how to collapse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostClass {
    Auth,
    Api,
}

/// The host part of an endpoint template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostTemplate {
    /// A recognized host class, rendered as its placeholder.
    Class(HostClass),
    /// An already-templated host, e.g. `{{authHost}}` from recorded input.
    Var(String),
    /// No recognizable pattern; kept literally, split on dots.
    Literal(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Literal(String),
    Var(String),
}

/// A single literal-or-placeholder value inside a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateValue {
    Literal(String),
    Var(String),
}

impl TemplateValue {
    pub fn render(&self) -> String {
        match self {
            TemplateValue::Literal(s) => s.clone(),
            TemplateValue::Var(name) => format!("{{{{{}}}}}", name),
        }
    }

    /// Variable names this value references once rendered.
    pub fn referenced_vars(&self) -> Vec<String> {
        match self {
            TemplateValue::Var(name) => vec![name.clone()],
            TemplateValue::Literal(s) => placeholders_in(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParam {
    pub key: String,
    pub value: TemplateValue,
}

impl QueryParam {
    pub fn new(key: impl Into<String>, value: TemplateValue) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// A normalized endpoint: host class, path segments, ordered query pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointTemplate {
    pub host: HostTemplate,
    pub path: Vec<PathSegment>,
    pub query: Vec<QueryParam>,
}

impl EndpointTemplate {
    /// Shorthand for a templated endpoint on a known host class.
    pub fn on(host: HostClass, path: Vec<PathSegment>) -> Self {
        Self {
            host: HostTemplate::Class(host),
            path,
            query: Vec::new(),
        }
    }

    pub fn with_query(mut self, query: Vec<QueryParam>) -> Self {
        self.query = query;
        self
    }

    /// Host rendered as the segment list used by the collection schema.
    pub fn host_segments(&self) -> Vec<String> {
        match &self.host {
            HostTemplate::Class(HostClass::Auth) => {
                vec![format!("{{{{{}}}}}", AUTH_HOST_VAR)]
            }
            HostTemplate::Class(HostClass::Api) => {
                vec![format!("{{{{{}}}}}", API_HOST_VAR)]
            }
            HostTemplate::Var(name) => vec![format!("{{{{{}}}}}", name)],
            HostTemplate::Literal(segments) => segments.clone(),
        }
    }

    pub fn path_segments(&self) -> Vec<String> {
        self.path
            .iter()
            .map(|segment| match segment {
                PathSegment::Literal(s) => s.clone(),
                PathSegment::Var(name) => format!("{{{{{}}}}}", name),
            })
            .collect()
    }

    /// The fully rendered URL, placeholders included.
    pub fn raw(&self) -> String {
        let mut out = format!("https://{}", self.host_segments().join("."));
        for segment in self.path_segments() {
            out.push('/');
            out.push_str(&segment);
        }
        let mut first = true;
        for param in &self.query {
            out.push(if first { '?' } else { '&' });
            first = false;
            out.push_str(&param.key);
            out.push('=');
            out.push_str(&param.value.render());
        }
        out
    }

    /// Every variable name the rendered URL references.
    pub fn referenced_vars(&self) -> Vec<String> {
        let mut vars = Vec::new();
        match &self.host {
            HostTemplate::Class(HostClass::Auth) => vars.push(AUTH_HOST_VAR.to_string()),
            HostTemplate::Class(HostClass::Api) => vars.push(API_HOST_VAR.to_string()),
            HostTemplate::Var(name) => vars.push(name.clone()),
            HostTemplate::Literal(_) => {}
        }
        for segment in &self.path {
            if let PathSegment::Var(name) = segment {
                vars.push(name.clone());
            }
        }
        for param in &self.query {
            vars.extend(param.value.referenced_vars());
        }
        vars
    }
}
