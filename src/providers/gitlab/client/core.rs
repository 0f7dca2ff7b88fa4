use log::{debug, warn};
use reqwest::{Client, Response, StatusCode};
use url::Url;

use crate::auth::Token;
use crate::error::{Result, TriggerError};

const USER_AGENT: &str = concat!("gitlab-trigger/", env!("CARGO_PKG_VERSION"));
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Client for the GitLab REST API (v4).
///
/// Holds the instance host, the API token used for read calls (public
/// projects can be read without one), and a single
/// `reqwest::Client` whose connection pool is shared by every request.
pub struct GitLabClient {
    client: Client,
    host: String,
    api_token: Option<Token>,
}

impl GitLabClient {
    /// Creates a client for the GitLab instance at `host`.
    ///
    /// No request is sent here.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `host` is not an absolute URL or the
    /// HTTP client cannot be built.
    pub fn new(host: &str, api_token: Option<Token>) -> Result<Self> {
        let parsed = Url::parse(host)
            .map_err(|e| TriggerError::Config(format!("Invalid host URL '{host}': {e}")))?;
        if parsed.cannot_be_a_base() {
            return Err(TriggerError::Config(format!(
                "Host URL '{host}' cannot be used as a base URL"
            )));
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TriggerError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            host: host.trim_end_matches('/').to_string(),
            api_token,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub(super) fn client(&self) -> &Client {
        &self.client
    }

    /// Attaches the API token as the `PRIVATE-TOKEN` header
    pub(super) fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(token) = &self.api_token {
            request.header("PRIVATE-TOKEN", token.as_str())
        } else {
            request
        }
    }

    /// `<host>/api/v4/projects/<project_id>/trigger/pipeline`
    pub fn trigger_url(&self, project_id: u64) -> String {
        format!("{}/api/v4/projects/{project_id}/trigger/pipeline", self.host)
    }

    /// `<host>/api/v4/projects/<project_id>/pipelines/<pipeline_id>`
    pub fn pipeline_url(&self, project_id: u64, pipeline_id: u64) -> String {
        format!(
            "{}/api/v4/projects/{project_id}/pipelines/{pipeline_id}",
            self.host
        )
    }
}

/// Reads the full response body so the connection goes back to the pool.
pub(super) async fn read_body(response: Response) -> Result<(StatusCode, Vec<u8>)> {
    let status = response.status();
    let url = response.url().clone();
    let body = response.bytes().await?;
    debug!("{} {} ({} bytes)", status.as_u16(), url, body.len());
    Ok((status, body.to_vec()))
}

/// GitLab answers successful calls with 200/201; anything from 300 up is an error.
pub(super) fn is_success(status: StatusCode) -> bool {
    status.as_u16() < 300
}

/// Builds an HTTP status error, preferring GitLab's own error message.
pub(super) fn status_error(status: StatusCode, body: &[u8]) -> TriggerError {
    let message = extract_error_message(body);
    warn!("GitLab API returned status {}: {message}", status.as_u16());
    TriggerError::HttpStatus {
        status: status.as_u16(),
        message,
    }
}

fn extract_error_message(body: &[u8]) -> String {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) {
        for key in ["message", "error"] {
            match value.get(key) {
                Some(serde_json::Value::String(text)) => return text.clone(),
                Some(serde_json::Value::Null) | None => {}
                Some(other) => return other.to_string(),
            }
        }
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        "empty response body".to_string()
    } else {
        text.chars().take(MAX_ERROR_BODY_CHARS).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(host: &str) -> GitLabClient {
        GitLabClient::new(host, Some(Token::from("api-token"))).unwrap()
    }

    #[test]
    fn test_trigger_url() {
        assert_eq!(
            client("https://gitlab.com").trigger_url(42),
            "https://gitlab.com/api/v4/projects/42/trigger/pipeline"
        );
    }

    #[test]
    fn test_pipeline_url() {
        let client = client("https://gitlab.example.com");
        for (project_id, pipeline_id) in [(1, 1), (42, 287), (9_999_999, 123_456_789)] {
            assert_eq!(
                client.pipeline_url(project_id, pipeline_id),
                format!(
                    "https://gitlab.example.com/api/v4/projects/{project_id}/pipelines/{pipeline_id}"
                )
            );
        }
    }

    #[test]
    fn test_trailing_slash_is_dropped_from_host() {
        let client = client("https://gitlab.example.com/");
        assert_eq!(client.host(), "https://gitlab.example.com");
        assert_eq!(
            client.pipeline_url(5, 6),
            "https://gitlab.example.com/api/v4/projects/5/pipelines/6"
        );
    }

    #[test]
    fn test_host_with_path_prefix() {
        let client = client("https://example.com/gitlab");
        assert_eq!(
            client.trigger_url(3),
            "https://example.com/gitlab/api/v4/projects/3/trigger/pipeline"
        );
    }

    #[test]
    fn test_invalid_host_is_config_error() {
        let result = GitLabClient::new("gitlab.com", Some(Token::from("t")));
        assert!(matches!(result, Err(TriggerError::Config(_))));

        let result = GitLabClient::new("mailto:ci@example.com", Some(Token::from("t")));
        assert!(matches!(result, Err(TriggerError::Config(_))));
    }

    #[test]
    fn test_extract_error_message() {
        assert_eq!(extract_error_message(br#"{"message":"404 Not found"}"#), "404 Not found");
        assert_eq!(
            extract_error_message(br#"{"message":{"base":["Reference not found"]}}"#),
            r#"{"base":["Reference not found"]}"#
        );
        assert_eq!(extract_error_message(br#"{"error":"insufficient_scope"}"#), "insufficient_scope");
        assert_eq!(extract_error_message(b"<html>Bad Gateway</html>"), "<html>Bad Gateway</html>");
        assert_eq!(extract_error_message(b""), "empty response body");
    }

    #[test]
    fn test_success_range() {
        assert!(is_success(StatusCode::OK));
        assert!(is_success(StatusCode::CREATED));
        assert!(!is_success(StatusCode::MULTIPLE_CHOICES));
        assert!(!is_success(StatusCode::NOT_FOUND));
    }
}
