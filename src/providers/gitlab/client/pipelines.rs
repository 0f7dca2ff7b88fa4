use log::{debug, info};

use super::core::{is_success, read_body, status_error, GitLabClient};
use crate::error::Result;
use crate::providers::gitlab::types::{Pipeline, TriggerRequest};

impl GitLabClient {
    /// Starts a new pipeline through the project's trigger endpoint.
    ///
    /// The trigger token travels in the form body, so no API token is sent.
    ///
    /// # Errors
    ///
    /// - `Network` if GitLab cannot be reached or the body cannot be read
    /// - `HttpStatus` if GitLab answers with a status of 300 or above
    /// - `Json` if the body is not a pipeline
    pub async fn trigger_pipeline(
        &self,
        project_id: u64,
        request: &TriggerRequest,
    ) -> Result<Pipeline> {
        let url = self.trigger_url(project_id);
        debug!(
            "Triggering pipeline on ref '{}' with {} extra field(s)",
            request.ref_,
            request.variables.len()
        );

        let response = self
            .client()
            .post(&url)
            .form(&request.form_fields())
            .send()
            .await?;

        let (status, body) = read_body(response).await?;
        if !is_success(status) {
            return Err(status_error(status, &body));
        }

        let pipeline: Pipeline = serde_json::from_slice(&body)?;
        info!("Triggered pipeline {} ({})", pipeline.id, pipeline.status);

        Ok(pipeline)
    }

    /// Fetches the current state of a pipeline.
    ///
    /// The body is decoded before the status is checked; a status of 300 or
    /// above wins over the decode result either way.
    ///
    /// # Errors
    ///
    /// - `Network` if GitLab cannot be reached or the body cannot be read
    /// - `HttpStatus` if GitLab answers with a status of 300 or above
    /// - `Json` if a successful response does not hold a pipeline
    pub async fn pipeline_status(&self, pipeline_id: u64, project_id: u64) -> Result<Pipeline> {
        let url = self.pipeline_url(project_id, pipeline_id);

        let response = self.auth_request(self.client().get(&url)).send().await?;

        let (status, body) = read_body(response).await?;
        let decoded = serde_json::from_slice::<Pipeline>(&body);
        if !is_success(status) {
            return Err(status_error(status, &body));
        }

        let pipeline = decoded?;
        debug!("Pipeline {} is {}", pipeline.id, pipeline.status);

        Ok(pipeline)
    }
}
