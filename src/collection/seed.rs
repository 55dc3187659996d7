//! The companion variable-seed (environment) document.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedDocument {
    pub id: String,
    pub name: String,
    pub values: Vec<SeedValue>,
    #[serde(rename = "_postman_variable_scope")]
    pub scope: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedValue {
    pub key: String,
    pub value: String,
    #[serde(rename = "type")]
    pub value_type: String,
    pub enabled: bool,
}

impl SeedDocument {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: slug(&name),
            name,
            values: Vec::new(),
            scope: "environment".to_string(),
        }
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>, secret: bool) {
        self.values.push(SeedValue {
            key: key.into(),
            value: value.into(),
            value_type: if secret { "secret" } else { "default" }.to_string(),
            enabled: true,
        });
    }
}

/// Deterministic document id derived from the name; the importing tool only
/// needs it to be stable and unique per environment.
fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}
