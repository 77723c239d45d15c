//! Artifact deletion against a container registry API.

use super::Operation;
use crate::config::secrets::auth_header;
use crate::error::{Error, Result};
use crate::telemetry::metrics;
use async_trait::async_trait;
use opentelemetry::KeyValue;
use opentelemetry_semantic_conventions::attribute::{
    HTTP_REQUEST_METHOD, HTTP_RESPONSE_STATUS_CODE,
};
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use secrecy::SecretString;
use tracing::debug;

/// Deletes one artifact, identified by digest, per call.
pub struct DeleteArtifact {
    client: reqwest::Client,
    base_url: String,
    project: String,
    repository: String,
    auth: HeaderValue,
}

impl DeleteArtifact {
    /// `base_url` is the registry root, e.g. `https://registry.example.com`.
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        project: &str,
        repository: &str,
        auth_token: &SecretString,
    ) -> Result<Self> {
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            project: project.to_string(),
            repository: repository.to_string(),
            auth: auth_header(auth_token)?,
        })
    }

    pub fn artifact_url(&self, digest: &str) -> String {
        format!(
            "{}/api/v2.0/projects/{}/repositories/{}/artifacts/{}",
            self.base_url, self.project, self.repository, digest
        )
    }
}

#[async_trait]
impl Operation for DeleteArtifact {
    type Item = String;

    async fn call(&self, digest: &String) -> Result<()> {
        let url = self.artifact_url(digest);
        debug!(%url, "deleting artifact");

        let response = self
            .client
            .delete(&url)
            .header(AUTHORIZATION, self.auth.clone())
            .header(CONTENT_TYPE, "application/json")
            .body("{}")
            .send()
            .await
            .map_err(Error::request("error calling delete endpoint"))?;

        let status = response.status();
        metrics::http_calls().add(
            1,
            &[
                KeyValue::new(HTTP_REQUEST_METHOD, "DELETE"),
                KeyValue::new(HTTP_RESPONSE_STATUS_CODE, i64::from(status.as_u16())),
            ],
        );

        if status != StatusCode::OK {
            let body = response
                .text()
                .await
                .map_err(Error::request("error reading response body"))?;
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}
