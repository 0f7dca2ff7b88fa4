use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::auth::Token;

/// A GitLab CI/CD pipeline as returned by the REST API (v4).
///
/// Each API response yields a fresh snapshot; the `id` stays stable across
/// polls while every other field may change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    /// Numeric pipeline ID
    pub id: u64,
    /// Project the pipeline belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<u64>,
    /// Link to the pipeline page
    #[serde(default, deserialize_with = "null_as_default")]
    pub web_url: String,
    /// Pipeline status (e.g., "pending", "running", "success")
    pub status: String,
    /// Git reference the pipeline runs for
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub ref_: Option<String>,
    /// What created the pipeline (e.g., "trigger", "push")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Whether the ref is a tag
    #[serde(default, deserialize_with = "null_as_default")]
    pub tag: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sha: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub before_sha: String,
    /// User the pipeline runs as
    #[serde(default, deserialize_with = "null_as_default")]
    pub user: User,
    /// ISO-8601 timestamp, kept as sent by the server
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,
    /// ISO-8601 timestamp, absent until a runner picks the pipeline up
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    /// Coverage percentage as a decimal string (e.g., "87.50")
    #[serde(default)]
    pub coverage: Option<String>,
    /// Run time in seconds
    #[serde(default)]
    pub duration: Option<u64>,
}

/// The GitLab user a pipeline was triggered by.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub username: String,
    /// Account state (e.g., "active", "blocked")
    #[serde(default, deserialize_with = "null_as_default")]
    pub state: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub avatar_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub web_url: String,
}

/// Form payload for the pipeline trigger endpoint.
#[derive(Debug, Clone)]
pub struct TriggerRequest {
    pub token: Token,
    pub ref_: String,
    /// Extra form fields, sent verbatim after `token` and `ref`
    pub variables: IndexMap<String, String>,
}

impl TriggerRequest {
    pub fn new(token: Token, ref_: impl Into<String>) -> Self {
        Self {
            token,
            ref_: ref_.into(),
            variables: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn with_variables(mut self, variables: IndexMap<String, String>) -> Self {
        self.variables = variables;
        self
    }

    /// Key/value pairs in the order they are encoded into the request body.
    pub fn form_fields(&self) -> Vec<(&str, &str)> {
        let mut fields = Vec::with_capacity(self.variables.len() + 2);
        fields.push(("token", self.token.as_str()));
        fields.push(("ref", self.ref_.as_str()));
        fields.extend(
            self.variables
                .iter()
                .map(|(key, value)| (key.as_str(), value.as_str())),
        );
        fields
    }
}

/// GitLab sends `null` for some fields that are otherwise always present.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
