use super::{
    API_HOST_VAR, AUTH_HOST_VAR, EndpointTemplate, HostClass, HostTemplate, PathSegment,
    QueryParam, TENANT_VAR, TemplateValue,
};
use crate::error::{Diagnostic, DiagnosticKind};
use tracing::warn;

/// One recognizable vendor host shape: `<label>.<zone>` plus regional
/// variants `<label>.<region>.<zone>`.
#[derive(Debug, Clone)]
pub struct HostRule {
    pub class: HostClass,
    pub label: String,
    pub zone: String,
}

impl HostRule {
    pub fn new(class: HostClass, label: impl Into<String>, zone: impl Into<String>) -> Self {
        Self {
            class,
            label: label.into(),
            zone: zone.into(),
        }
    }

    fn matches(&self, host: &str) -> bool {
        if host == format!("{}.{}", self.label, self.zone) {
            return true;
        }
        // Regional variant: auth.eu.uniqid.io, api.us-east.uniqid.io, ...
        host.strip_prefix(&format!("{}.", self.label))
            .and_then(|rest| rest.strip_suffix(&format!(".{}", self.zone)))
            .is_some_and(|region| !region.is_empty() && !region.contains('.'))
    }
}

/// Registry of host rules consulted by the normalizer. Read-only after the
/// compiler is built; extensible through the compiler builder.
#[derive(Debug, Clone)]
pub struct HostCatalog {
    rules: Vec<HostRule>,
}

impl HostCatalog {
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// The built-in vendor hosts: regional auth and management API origins.
    pub fn vendor_defaults() -> Self {
        Self {
            rules: vec![
                HostRule::new(HostClass::Auth, "auth", "uniqid.io"),
                HostRule::new(HostClass::Api, "api", "uniqid.io"),
            ],
        }
    }

    pub fn with_rule(mut self, rule: HostRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn classify(&self, host: &str) -> Option<HostClass> {
        self.rules
            .iter()
            .find(|rule| rule.matches(host))
            .map(|rule| rule.class)
    }
}

impl Default for HostCatalog {
    fn default() -> Self {
        Self::vendor_defaults()
    }
}

/// Rewrites concrete absolute URLs into parameterized endpoint templates.
pub struct EndpointNormalizer {
    hosts: HostCatalog,
}

impl EndpointNormalizer {
    pub fn new(hosts: HostCatalog) -> Self {
        Self { hosts }
    }

    /// Normalizes a raw URL. Never fails: unrecognizable shapes degrade to
    /// literal splitting and a warning diagnostic tied to `step`.
    pub fn normalize(&self, step: &str, raw: &str) -> (EndpointTemplate, Vec<Diagnostic>) {
        let canonical = normalize_brace_style(raw);
        let (host, path, query) = if canonical.contains("{{") {
            // Already-templated URLs never survive strict URL parsing;
            // the naive splitter leaves their placeholders untouched.
            naive_split(&canonical)
        } else {
            match url::Url::parse(&canonical) {
                Ok(parsed) if parsed.host_str().is_some() => {
                    let host = parsed.host_str().unwrap_or_default().to_string();
                    let path = parsed
                        .path_segments()
                        .map(|segments| {
                            segments
                                .filter(|s| !s.is_empty())
                                .map(str::to_string)
                                .collect()
                        })
                        .unwrap_or_default();
                    let query = parsed
                        .query_pairs()
                        .map(|(k, v)| (k.into_owned(), v.into_owned()))
                        .collect();
                    (host, path, query)
                }
                _ => naive_split(&canonical),
            }
        };

        let mut diagnostics = Vec::new();
        let host = match whole_placeholder(&host) {
            Some(name) if name == AUTH_HOST_VAR => HostTemplate::Class(HostClass::Auth),
            Some(name) if name == API_HOST_VAR => HostTemplate::Class(HostClass::Api),
            Some(name) => HostTemplate::Var(name),
            None => match self.hosts.classify(&host) {
                Some(class) => HostTemplate::Class(class),
                None => {
                    warn!(step, url = raw, "no recognizable host pattern");
                    diagnostics.push(Diagnostic::unscoped(
                        DiagnosticKind::UnrecognizedEndpointShape {
                            step: step.to_string(),
                            url: raw.to_string(),
                        },
                    ));
                    HostTemplate::Literal(host.split('.').map(str::to_string).collect())
                }
            },
        };

        let path = path
            .into_iter()
            .map(|segment| match whole_placeholder(&segment) {
                Some(name) => PathSegment::Var(name),
                None if looks_like_uuid(&segment) => PathSegment::Var(TENANT_VAR.to_string()),
                None => PathSegment::Literal(segment),
            })
            .collect();

        let query = query
            .into_iter()
            .map(|(key, value)| {
                let value = match whole_placeholder(&value) {
                    Some(name) => TemplateValue::Var(name),
                    None => TemplateValue::Literal(value),
                };
                QueryParam::new(key, value)
            })
            .collect();

        (EndpointTemplate { host, path, query }, diagnostics)
    }
}

impl Default for EndpointNormalizer {
    fn default() -> Self {
        Self::new(HostCatalog::vendor_defaults())
    }
}

/// Splits a URL-ish string without validating it. Used for templated and
/// malformed inputs; the compiler must always terminate with some template.
fn naive_split(raw: &str) -> (String, Vec<String>, Vec<(String, String)>) {
    let rest = raw.split_once("://").map_or(raw, |(_, rest)| rest);
    let rest = rest.split_once('#').map_or(rest, |(before, _)| before);
    let (location, query_str) = match rest.split_once('?') {
        Some((location, query)) => (location, Some(query)),
        None => (rest, None),
    };
    let mut segments = location.split('/').filter(|s| !s.is_empty());
    let host = segments.next().unwrap_or_default().to_string();
    let path = segments.map(str::to_string).collect();
    let query = query_str
        .map(|q| {
            q.split('&')
                .filter(|pair| !pair.is_empty())
                .map(|pair| match pair.split_once('=') {
                    Some((k, v)) => (k.to_string(), v.to_string()),
                    None => (pair.to_string(), String::new()),
                })
                .collect()
        })
        .unwrap_or_default();
    (host, path, query)
}

/// Returns the variable name when the whole string is one `{{name}}`.
fn whole_placeholder(s: &str) -> Option<String> {
    let inner = s.strip_prefix("{{")?.strip_suffix("}}")?;
    if !inner.is_empty() && inner.chars().all(is_ident_char) {
        Some(inner.to_string())
    } else {
        None
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '$' || c == '.'
}

pub(crate) fn looks_like_uuid(s: &str) -> bool {
    if s.len() != 36 {
        return false;
    }
    s.char_indices().all(|(i, c)| match i {
        8 | 13 | 18 | 23 => c == '-',
        _ => c.is_ascii_hexdigit(),
    })
}

/// Rewrites single-brace `{name}` placeholders to the target `{{name}}`
/// style, leaving already-doubled braces untouched.
fn normalize_brace_style(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 8);
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '{' {
            out.push(c);
            continue;
        }
        if chars.peek() == Some(&'{') {
            chars.next();
            out.push_str("{{");
            // Copy the already-templated body through its closing braces.
            while let Some(inner) = chars.next() {
                out.push(inner);
                if inner == '}' && chars.peek() == Some(&'}') {
                    chars.next();
                    out.push('}');
                    break;
                }
            }
            continue;
        }
        let mut name = String::new();
        let mut closed = false;
        while let Some(&next) = chars.peek() {
            if next == '}' {
                chars.next();
                closed = true;
                break;
            }
            if next == '{' {
                break;
            }
            name.push(next);
            chars.next();
        }
        if closed && !name.is_empty() && name.chars().all(is_ident_char) {
            out.push_str("{{");
            out.push_str(&name);
            out.push_str("}}");
        } else {
            out.push('{');
            out.push_str(&name);
            if closed {
                out.push('}');
            }
        }
    }
    out
}
