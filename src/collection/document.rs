//! Serde model of the emitted collection document (collection v2.1 schema
//! family).

use serde::{Deserialize, Serialize};

pub const COLLECTION_SCHEMA: &str =
    "https://schema.getpostman.com/json/collection/v2.1.0/collection.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionDocument {
    pub info: CollectionInfo,
    pub variable: Vec<CollectionVariable>,
    pub item: Vec<CollectionNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub name: String,
    pub description: String,
    pub schema: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionVariable {
    pub key: String,
    pub value: String,
    #[serde(rename = "type")]
    pub variable_type: String,
}

/// A node in the output tree: a folder of children or a request item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CollectionNode {
    Folder(Folder),
    Request(RequestItem),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub item: Vec<CollectionNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub event: Vec<Event>,
    pub request: RequestSpec,
    #[serde(default)]
    pub response: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestSpec {
    pub method: String,
    pub header: Vec<HeaderSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<BodySpec>,
    pub url: UrlSpec,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderSpec {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodySpec {
    pub mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urlencoded: Option<Vec<FormParamSpec>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<BodyOptions>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormParamSpec {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyOptions {
    pub raw: RawBodyOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBodyOptions {
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlSpec {
    pub raw: String,
    pub protocol: String,
    pub host: Vec<String>,
    pub path: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub query: Vec<QuerySpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySpec {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub listen: String,
    pub script: ScriptSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptSpec {
    #[serde(rename = "type")]
    pub script_type: String,
    pub exec: Vec<String>,
}

impl Event {
    pub fn prerequest(exec: Vec<String>) -> Self {
        Self {
            listen: "prerequest".to_string(),
            script: ScriptSpec {
                script_type: "text/javascript".to_string(),
                exec,
            },
        }
    }

    pub fn test(exec: Vec<String>) -> Self {
        Self {
            listen: "test".to_string(),
            script: ScriptSpec {
                script_type: "text/javascript".to_string(),
                exec,
            },
        }
    }
}
