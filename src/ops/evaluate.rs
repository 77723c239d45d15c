//! Bulk feature-flag evaluation requests, used as synthetic load.
//!
//! Each work item is a request number; the request body is the same for
//! every call unless fresh ids are requested.

use super::Operation;
use crate::config::secrets::auth_header;
use crate::error::{Error, Result};
use crate::ids::unique_id;
use crate::telemetry::metrics;
use async_trait::async_trait;
use opentelemetry::KeyValue;
use opentelemetry_semantic_conventions::attribute::{
    HTTP_REQUEST_METHOD, HTTP_RESPONSE_STATUS_CODE,
};
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default endpoint of a locally running evaluation service.
pub const DEFAULT_EVALUATE_URL: &str =
    "http://localhost:9400/twirp/rzp.splitz.evaluate.v1.EvaluateAPI/EvaluateBulk";

/// Body of a bulk evaluation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkEvaluateRequest {
    pub bulk_evaluate: Vec<EvaluateEntry>,
}

/// One experiment to evaluate for one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluateEntry {
    pub id: String,
    pub experiment_id: String,
    /// JSON-encoded evaluation context, sent as a string.
    pub request_data: String,
}

impl BulkEvaluateRequest {
    /// Five experiments evaluated for the same merchant.
    pub fn sample() -> Self {
        const MERCHANT: &str = "FMaYlTExdA4BC5";
        let experiments = [
            "L68rF6Mfo0O1Vx",
            "L9B4AnIzOyq72u",
            "L9B8ohUXQW9A03",
            "L9BdlVmHAmJ3E4",
            "L9BODCF8OWDsm1",
        ];
        let request_data =
            serde_json::json!({ "attempts": 5, "merchant_id": MERCHANT }).to_string();

        Self {
            bulk_evaluate: experiments
                .iter()
                .map(|experiment_id| EvaluateEntry {
                    id: MERCHANT.to_string(),
                    experiment_id: experiment_id.to_string(),
                    request_data: request_data.clone(),
                })
                .collect(),
        }
    }

    /// Load a request body from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Copy of this request with every entry id replaced by a new unique id.
    pub fn with_fresh_ids(&self) -> Result<Self> {
        let bulk_evaluate = self
            .bulk_evaluate
            .iter()
            .map(|entry| {
                Ok(EvaluateEntry {
                    id: unique_id()?,
                    ..entry.clone()
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { bulk_evaluate })
    }
}

/// POSTs a bulk evaluation per call.
pub struct EvaluateBulk {
    client: reqwest::Client,
    url: String,
    auth: HeaderValue,
    payload: BulkEvaluateRequest,
    fresh_ids: bool,
}

impl EvaluateBulk {
    pub fn new(
        client: reqwest::Client,
        url: &str,
        auth_token: &SecretString,
        payload: BulkEvaluateRequest,
    ) -> Result<Self> {
        Ok(Self {
            client,
            url: url.to_string(),
            auth: auth_header(auth_token)?,
            payload,
            fresh_ids: false,
        })
    }

    /// Generate new entry ids for every request.
    pub fn fresh_ids(mut self, enabled: bool) -> Self {
        self.fresh_ids = enabled;
        self
    }
}

#[async_trait]
impl Operation for EvaluateBulk {
    type Item = u64;

    async fn call(&self, _request_number: &u64) -> Result<()> {
        let fresh;
        let payload = if self.fresh_ids {
            fresh = self.payload.with_fresh_ids()?;
            &fresh
        } else {
            &self.payload
        };

        let response = self
            .client
            .post(&self.url)
            .header(AUTHORIZATION, self.auth.clone())
            .json(payload)
            .send()
            .await
            .map_err(Error::request("error calling evaluate"))?;

        let status = response.status();
        metrics::http_calls().add(
            1,
            &[
                KeyValue::new(HTTP_REQUEST_METHOD, "POST"),
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
