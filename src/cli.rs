use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;

use crate::config::{Config, Overrides, Settings};
use crate::output::{print_outcome, print_triggered, PollProgress};
use crate::providers::gitlab::{stop_signal, GitLabClient, Pipeline, Poller};

#[derive(Parser)]
#[command(name = "gitlab-trigger")]
#[command(author, version, about = "Trigger a GitLab pipeline and wait for its result", long_about = None)]
pub struct Cli {
    /// GitLab host URL [default: https://gitlab.com]
    #[arg(short = 'H', long, env = "GITLAB_HOST")]
    host: Option<String>,

    /// API token, needed to check the pipeline status
    #[arg(short, long, env = "GITLAB_API_TOKEN", hide_env_values = true)]
    api_token: Option<String>,

    /// Pipeline trigger token
    #[arg(short, long, env = "GITLAB_TRIGGER_TOKEN", hide_env_values = true)]
    trigger_token: Option<String>,

    /// Branch or tag to run the pipeline for [default: master]
    #[arg(short, long)]
    branch: Option<String>,

    /// Numeric project ID
    #[arg(short, long, env = "GITLAB_PROJECT_ID")]
    project_id: Option<u64>,

    /// Wait for the pipeline to finish
    #[arg(short, long, default_value_t = false)]
    wait: bool,

    /// Do not wait, even if the config file enables waiting
    #[arg(long, default_value_t = false, conflicts_with = "wait")]
    no_wait: bool,

    /// Seconds between status checks [default: 5]
    #[arg(long)]
    interval: Option<u64>,

    /// Give up waiting after this many seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Configuration file (TOML, JSON or YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the final pipeline as JSON instead of tables
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Write the final pipeline as JSON to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long, default_value_t = false)]
    pretty: bool,

    /// Pipeline variables as KEY=VALUE
    #[arg(value_name = "KEY=VALUE", value_parser = parse_variable)]
    variables: Vec<(String, String)>,
}

/// Splits `KEY=VALUE` on the first `=`, so values may contain `=`.
fn parse_variable(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("failed to parse argument {raw}, use syntax: key=value")),
    }
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            host: self.host.clone(),
            api_token: self.api_token.clone(),
            trigger_token: self.trigger_token.clone(),
            branch: self.branch.clone(),
            project_id: self.project_id,
            wait: match (self.wait, self.no_wait) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            },
            interval_secs: self.interval,
            timeout_secs: self.timeout,
            variables: self.variables.clone(),
        }
    }

    pub async fn execute(&self) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;
        let settings = Settings::resolve(self.overrides(), config)?;

        let client = GitLabClient::new(&settings.host, settings.api_token.clone())?;

        info!(
            "Triggering pipeline for project {} on '{}' at {}",
            settings.project_id,
            settings.target_branch,
            client.host()
        );
        let pipeline = match client
            .trigger_pipeline(settings.project_id, &settings.trigger_request())
            .await
        {
            Ok(pipeline) => pipeline,
            Err(e) if e.status() == Some(404) => {
                return Err(anyhow::Error::from(e).context(format!(
                    "Project {} not found, or the trigger token does not belong to it",
                    settings.project_id
                )));
            }
            Err(e) => return Err(e.into()),
        };

        if !self.json {
            print_triggered(&pipeline);
        }

        if !settings.wait {
            return self.emit(&pipeline);
        }

        self.wait_for_pipeline(&client, &settings, pipeline).await
    }

    async fn wait_for_pipeline(
        &self,
        client: &GitLabClient,
        settings: &Settings,
        pipeline: Pipeline,
    ) -> Result<()> {
        let (stop, signal) = stop_signal();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, no longer waiting for the pipeline");
                stop.stop();
            }
        });

        let mut poller = Poller::new(client)
            .interval(settings.poll_interval)
            .stop_signal(signal);
        if let Some(timeout) = settings.timeout {
            poller = poller.timeout(timeout);
        }

        let mut progress = PollProgress::start(pipeline.id, settings.poll_interval);
        let outcome = match poller
            .wait_for(settings.project_id, pipeline.id, &mut progress)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                progress.abandon(&e.to_string());
                return Err(e.into());
            }
        };
        progress.finish(outcome.status);

        if !self.json {
            print_outcome(&outcome);
        }
        self.emit(&outcome.pipeline)?;

        if !outcome.status.is_success() {
            bail!("pipeline {} {}", outcome.pipeline.id, outcome.status);
        }

        Ok(())
    }

    /// Writes the pipeline as JSON to `--output` and/or stdout (`--json`).
    fn emit(&self, pipeline: &Pipeline) -> Result<()> {
        if !self.json && self.output.is_none() {
            return Ok(());
        }

        let json_output = render_json(pipeline, self.pretty)?;

        if let Some(output_path) = &self.output {
            std::fs::write(output_path, &json_output)
                .with_context(|| format!("Failed to write {}", output_path.display()))?;
            info!("Pipeline written to: {}", output_path.display());
        }
        if self.json {
            println!("{json_output}");
        }

        Ok(())
    }
}

fn render_json(pipeline: &Pipeline, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(pipeline)
    } else {
        serde_json::to_string(pipeline)
    }
}
