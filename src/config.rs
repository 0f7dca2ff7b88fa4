use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::auth::Token;
use crate::error::TriggerError;
use crate::providers::gitlab::{TriggerRequest, DEFAULT_POLL_INTERVAL};

const CONFIG_CANDIDATES: [&str; 4] = [
    "gitlab-trigger.toml",
    "gitlab-trigger.json",
    "gitlab-trigger.yaml",
    "gitlab-trigger.yml",
];

/// Configuration file structure.
///
/// Lets users keep the instance, tokens and default variables out of the
/// command line. Every value can still be overridden by a flag.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub gitlab: GitLabConfig,

    /// Polling behaviour
    #[serde(default)]
    pub wait: WaitConfig,

    /// Pipeline variables sent with every trigger
    #[serde(default)]
    pub variables: IndexMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GitLabConfig {
    /// GitLab instance base URL
    #[serde(default = "default_host")]
    pub host: String,

    /// Personal/project access token used to read pipeline status
    pub api_token: Option<String>,

    /// Pipeline trigger token
    pub trigger_token: Option<String>,

    /// Numeric project ID
    pub project_id: Option<u64>,

    /// Branch or tag to run the pipeline for
    #[serde(default = "default_branch")]
    pub branch: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WaitConfig {
    /// Wait for the pipeline to finish
    #[serde(default)]
    pub enabled: bool,

    /// Seconds between status checks
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Give up waiting after this many seconds
    pub timeout_secs: Option<u64>,
}

impl Default for GitLabConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            api_token: None,
            trigger_token: None,
            project_id: None,
            branch: default_branch(),
        }
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: default_interval_secs(),
            timeout_secs: None,
        }
    }
}

fn default_host() -> String {
    "https://gitlab.com".to_string()
}

fn default_branch() -> String {
    "master".to_string()
}

fn default_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL.as_secs()
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./gitlab-trigger.{toml,json,yaml,yml}
    /// 3. `<config dir>/gitlab-trigger/config.toml`
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let user_config = dirs::config_dir().map(|dir| dir.join("gitlab-trigger").join("config.toml"));
        let candidates = CONFIG_CANDIDATES
            .iter()
            .map(PathBuf::from)
            .chain(user_config);

        for candidate in candidates {
            if candidate.exists() {
                return Self::load_from_path(&candidate);
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => toml::from_str(&contents)
                .or_else(|_| serde_json::from_str(&contents))
                .or_else(|_| serde_yaml::from_str(&contents))
                .with_context(|| format!("Failed to parse config file: {}", path.display())),
        }
    }
}

/// Values given on the command line; `None` falls back to the config file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub api_token: Option<String>,
    pub trigger_token: Option<String>,
    pub branch: Option<String>,
    pub project_id: Option<u64>,
    /// `Some(false)` turns off waiting enabled in the file
    pub wait: Option<bool>,
    pub interval_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub variables: Vec<(String, String)>,
}

/// Validated settings for one trigger run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub api_token: Option<Token>,
    pub trigger_token: Token,
    pub target_branch: String,
    pub project_id: u64,
    pub wait: bool,
    pub poll_interval: Duration,
    pub timeout: Option<Duration>,
    /// Variable names as the user wrote them, without form wrapping
    pub variables: IndexMap<String, String>,
}

impl Settings {
    /// Merges command-line overrides over the file configuration and validates
    /// the result. Nothing here touches the network.
    pub fn resolve(overrides: Overrides, config: Config) -> Result<Self, TriggerError> {
        let Config {
            gitlab,
            wait,
            mut variables,
        } = config;

        let host = overrides.host.unwrap_or(gitlab.host);
        let api_token = non_blank(overrides.api_token.or(gitlab.api_token)).map(Token::from);
        let trigger_token = non_blank(overrides.trigger_token.or(gitlab.trigger_token))
            .map(Token::from)
            .ok_or_else(|| {
                config_error("please set the trigger token, pass -t $TRIGGER_TOKEN on the command line")
            })?;
        let project_id = overrides
            .project_id
            .or(gitlab.project_id)
            .filter(|id| *id > 0)
            .ok_or_else(|| config_error("please set the project ID, pass -p $PROJECT_ID on the command line"))?;

        let target_branch = overrides.branch.unwrap_or(gitlab.branch);
        if target_branch.trim().is_empty() {
            return Err(config_error("target branch must not be empty"));
        }

        let wait_enabled = overrides.wait.unwrap_or(wait.enabled);
        if wait_enabled && api_token.is_none() {
            return Err(config_error(
                "please set the API token to wait for the pipeline, pass -a $API_TOKEN on the command line",
            ));
        }

        let interval_secs = overrides.interval_secs.unwrap_or(wait.interval_secs);
        if interval_secs == 0 {
            return Err(config_error("poll interval must be at least one second"));
        }
        let timeout = overrides
            .timeout_secs
            .or(wait.timeout_secs)
            .map(Duration::from_secs);

        for (key, value) in overrides.variables {
            variables.insert(key, value);
        }
        if let Some(key) = variables.keys().find(|key| key.trim().is_empty()) {
            return Err(config_error(format!("invalid variable name '{key}'")));
        }

        Ok(Self {
            host,
            api_token,
            trigger_token,
            target_branch,
            project_id,
            wait: wait_enabled,
            poll_interval: Duration::from_secs(interval_secs),
            timeout,
            variables,
        })
    }

    /// Builds the trigger payload, wrapping each variable as `variables[NAME]`.
    pub fn trigger_request(&self) -> TriggerRequest {
        let variables = self
            .variables
            .iter()
            .map(|(name, value)| (format!("variables[{name}]"), value.clone()))
            .collect();

        TriggerRequest::new(self.trigger_token.clone(), self.target_branch.clone())
            .with_variables(variables)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn config_error(message: impl Into<String>) -> TriggerError {
    TriggerError::Config(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn overrides() -> Overrides {
        Overrides {
            trigger_token: Some("trigger-tok".to_string()),
            project_id: Some(42),
            ..Overrides::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.gitlab.host, "https://gitlab.com");
        assert_eq!(config.gitlab.branch, "master");
        assert_eq!(config.wait.interval_secs, 5);
        assert!(!config.wait.enabled);
        assert!(config.variables.is_empty());
    }

    #[test]
    fn test_load_toml_config() {
        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        let toml_content = r#"
[gitlab]
host = "https://gitlab.example.com"
api-token = "glpat-test-token"
trigger-token = "glptt-trigger"
project-id = 1234

[wait]
enabled = true
timeout-secs = 900

[variables]
DEPLOY_ENV = "staging"
RELEASE = "1.2.3"
"#;
        write!(temp_file, "{}", toml_content).unwrap();

        let config = Config::load_from_path(temp_file.path()).unwrap();
        assert_eq!(config.gitlab.host, "https://gitlab.example.com");
        assert_eq!(config.gitlab.api_token.as_deref(), Some("glpat-test-token"));
        assert_eq!(config.gitlab.project_id, Some(1234));
        assert_eq!(config.gitlab.branch, "master");
        assert!(config.wait.enabled);
        assert_eq!(config.wait.interval_secs, 5);
        assert_eq!(config.wait.timeout_secs, Some(900));
        let names: Vec<_> = config.variables.keys().map(String::as_str).collect();
        assert_eq!(names, ["DEPLOY_ENV", "RELEASE"]);
    }

    #[test]
    fn test_load_json_config() {
        let mut temp_file = NamedTempFile::with_suffix(".json").unwrap();
        let json_content = r#"{
  "gitlab": {
    "trigger-token": "glptt-json",
    "project-id": 7,
    "branch": "develop"
  },
  "wait": { "interval-secs": 10 }
}"#;
        write!(temp_file, "{}", json_content).unwrap();

        let config = Config::load_from_path(temp_file.path()).unwrap();
        assert_eq!(config.gitlab.trigger_token.as_deref(), Some("glptt-json"));
        assert_eq!(config.gitlab.branch, "develop");
        assert_eq!(config.wait.interval_secs, 10);
    }

    #[test]
    fn test_load_yaml_config() {
        let mut temp_file = NamedTempFile::with_suffix(".yml").unwrap();
        let yaml_content = "gitlab:\n  project-id: 99\nvariables:\n  FOO: bar\n";
        write!(temp_file, "{}", yaml_content).unwrap();

        let config = Config::load_from_path(temp_file.path()).unwrap();
        assert_eq!(config.gitlab.project_id, Some(99));
        assert_eq!(config.variables.get("FOO").map(String::as_str), Some("bar"));
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let result = Config::load(Some(Path::new("does-not-exist.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_toml_fails() {
        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        write!(temp_file, "[gitlab\nhost = ").unwrap();

        let err = Config::load_from_path(temp_file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse TOML config"));
    }

    #[test]
    fn test_resolve_defaults() {
        let settings = Settings::resolve(overrides(), Config::default()).unwrap();
        assert_eq!(settings.host, "https://gitlab.com");
        assert_eq!(settings.target_branch, "master");
        assert_eq!(settings.project_id, 42);
        assert_eq!(settings.trigger_token.as_str(), "trigger-tok");
        assert!(settings.api_token.is_none());
        assert!(!settings.wait);
        assert_eq!(settings.poll_interval, Duration::from_secs(5));
        assert_eq!(settings.timeout, None);
    }

    #[test]
    fn test_resolve_cli_wins_over_file() {
        let mut config = Config::default();
        config.gitlab.host = "https://file.example.com".to_string();
        config.gitlab.branch = "file-branch".to_string();
        config.gitlab.project_id = Some(1);
        config.variables.insert("A".to_string(), "from-file".to_string());
        config.variables.insert("B".to_string(), "file-only".to_string());

        let settings = Settings::resolve(
            Overrides {
                host: Some("https://cli.example.com".to_string()),
                branch: Some("main".to_string()),
                variables: vec![
                    ("A".to_string(), "from-cli".to_string()),
                    ("C".to_string(), "cli-only".to_string()),
                ],
                ..overrides()
            },
            config,
        )
        .unwrap();

        assert_eq!(settings.host, "https://cli.example.com");
        assert_eq!(settings.target_branch, "main");
        assert_eq!(settings.project_id, 42);
        let variables: Vec<_> = settings
            .variables
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(variables, [("A", "from-cli"), ("B", "file-only"), ("C", "cli-only")]);
    }

    #[test]
    fn test_resolve_requires_trigger_token() {
        let err = Settings::resolve(
            Overrides {
                trigger_token: Some("  ".to_string()),
                ..overrides()
            },
            Config::default(),
        )
        .unwrap_err();
        assert!(matches!(err, TriggerError::Config(ref msg) if msg.contains("trigger token")));
    }

    #[test]
    fn test_resolve_requires_project_id() {
        for project_id in [None, Some(0)] {
            let err = Settings::resolve(
                Overrides {
                    project_id,
                    ..overrides()
                },
                Config::default(),
            )
            .unwrap_err();
            assert!(matches!(err, TriggerError::Config(ref msg) if msg.contains("project ID")));
        }
    }

    #[test]
    fn test_resolve_wait_requires_api_token() {
        let err = Settings::resolve(
            Overrides {
                wait: Some(true),
                ..overrides()
            },
            Config::default(),
        )
        .unwrap_err();
        assert!(matches!(err, TriggerError::Config(ref msg) if msg.contains("API token")));

        let settings = Settings::resolve(
            Overrides {
                wait: Some(true),
                api_token: Some("glpat".to_string()),
                timeout_secs: Some(120),
                ..overrides()
            },
            Config::default(),
        )
        .unwrap();
        assert!(settings.wait);
        assert_eq!(settings.timeout, Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_resolve_wait_flag_overrides_file() {
        let mut config = Config::default();
        config.wait.enabled = true;

        let settings = Settings::resolve(
            Overrides {
                wait: Some(false),
                ..overrides()
            },
            config.clone(),
        )
        .unwrap();
        assert!(!settings.wait);

        let err = Settings::resolve(overrides(), config).unwrap_err();
        assert!(matches!(err, TriggerError::Config(ref msg) if msg.contains("API token")));
    }

    #[test]
    fn test_resolve_rejects_zero_interval() {
        let err = Settings::resolve(
            Overrides {
                interval_secs: Some(0),
                ..overrides()
            },
            Config::default(),
        )
        .unwrap_err();
        assert!(matches!(err, TriggerError::Config(_)));
    }

    #[test]
    fn test_trigger_request_wraps_variables() {
        let settings = Settings::resolve(
            Overrides {
                branch: Some("release/1.0".to_string()),
                variables: vec![
                    ("DEPLOY_ENV".to_string(), "prod".to_string()),
                    ("ARGS".to_string(), "--flag=1".to_string()),
                ],
                ..overrides()
            },
            Config::default(),
        )
        .unwrap();

        let request = settings.trigger_request();
        assert_eq!(
            request.form_fields(),
            vec![
                ("token", "trigger-tok"),
                ("ref", "release/1.0"),
                ("variables[DEPLOY_ENV]", "prod"),
                ("variables[ARGS]", "--flag=1"),
            ]
        );
    }
}
