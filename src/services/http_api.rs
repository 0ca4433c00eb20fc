//! HTTP Configuration API
//!
//! reqwest client for the console REST backend.
//!
//! | operation        | request                         |
//! |------------------|---------------------------------|
//! | `get_config`     | `GET  {base}/config/{key}`      |
//! | `put_config`     | `PUT  {base}/config/{key}`      |
//! | `list_sla_rows`  | `GET  {base}/sla`               |
//! | `put_sla_row`    | `PUT  {base}/sla/{stage}`       |
//! | `list_templates` | `GET  {base}/templates`         |
//! | `job_status`     | `GET  {base}/jobs/{id}/status`  |
//!
//! Status handling lives in the `decode_*` functions, which only see the
//! status code and the body text.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use super::api::{ConfigApi, ConfigVersion, JobStatusSource, VersionedValue};
use crate::domain::config::ApiConfig;
use crate::domain::{JobSnapshot, TemplateSummary};
use crate::error::{Error, Result};

const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Serialize)]
struct PutConfigBody<'a> {
    value: &'a Value,
    expected_version: ConfigVersion,
}

#[derive(Deserialize)]
struct PutConfigResponse {
    #[serde(default)]
    version: ConfigVersion,
}

/// REST implementation of [`ConfigApi`]
pub struct HttpConfigApi {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpConfigApi {
    /// Build a client from the API section of the app config
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let base_url = Url::parse(config.base_url.trim_end_matches('/')).map_err(|e| {
            Error::Invalid {
                message: format!("Invalid API base URL {:?}: {e}", config.base_url),
            }
        })?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Invalid {
                message: format!("API base URL {:?} cannot carry a path", config.base_url),
            });
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url,
            token: config.token.clone().filter(|t| !t.is_empty()),
        })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Base URL with `segments` appended, each percent-encoded as one
    /// path segment
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::Invalid {
                message: format!("API base URL {} cannot carry a path", self.base_url),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a request and read the status and body text
    async fn exchange(&self, request: RequestBuilder) -> Result<(StatusCode, String)> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }
}

/// Message the server put in a failed response: the JSON `message` or
/// `error` field, else the raw body, else the status reason
fn server_message(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| {
            json.get("message")
                .or_else(|| json.get("error"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .or_else(|| (!body.is_empty()).then(|| body.to_string()))
        .unwrap_or_else(|| status.to_string())
}

fn transport_error(status: StatusCode, body: &str) -> Error {
    Error::Transport {
        message: format!("{} (HTTP {})", server_message(status, body), status.as_u16()),
    }
}

/// Any 2xx body parsed as `T`; everything else is a transport error
fn decode_json<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T> {
    if !status.is_success() {
        return Err(transport_error(status, body));
    }
    Ok(serde_json::from_str(body)?)
}

/// `GET config/{key}`: 404 means the key was never stored
fn decode_get_config(status: StatusCode, body: &str) -> Result<Option<VersionedValue>> {
    if status == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    decode_json(status, body).map(Some)
}

/// `PUT config/{key}`: 409 is a version conflict
fn decode_put_config(key: &str, status: StatusCode, body: &str) -> Result<ConfigVersion> {
    if status == StatusCode::CONFLICT {
        return Err(Error::Conflict {
            key: key.to_string(),
        });
    }
    if status.is_success() && body.trim().is_empty() {
        return Ok(None);
    }
    decode_json::<PutConfigResponse>(status, body).map(|response| response.version)
}

/// Status-only check for writes whose body is ignored
fn decode_empty(status: StatusCode, body: &str) -> Result<()> {
    if status.is_success() {
        Ok(())
    } else {
        Err(transport_error(status, body))
    }
}

#[async_trait]
impl ConfigApi for HttpConfigApi {
    async fn get_config(&self, key: &str) -> Result<Option<VersionedValue>> {
        tracing::debug!("GET config {}", key);
        let url = self.endpoint(&["config", key])?;
        let (status, body) = self.exchange(self.client.get(url)).await?;
        decode_get_config(status, &body)
    }

    async fn put_config(
        &self,
        key: &str,
        value: &Value,
        expected_version: ConfigVersion,
        request_id: &str,
    ) -> Result<ConfigVersion> {
        tracing::debug!("PUT config {} (expected version {:?})", key, expected_version);
        let request = self
            .client
            .put(self.endpoint(&["config", key])?)
            .header(REQUEST_ID_HEADER, request_id)
            .json(&PutConfigBody {
                value,
                expected_version,
            });
        let (status, body) = self.exchange(request).await?;
        decode_put_config(key, status, &body)
    }

    async fn list_sla_rows(&self) -> Result<Vec<Value>> {
        let (status, body) = self.exchange(self.client.get(self.endpoint(&["sla"])?)).await?;
        decode_json(status, &body)
    }

    async fn put_sla_row(&self, row: &Value, request_id: &str) -> Result<()> {
        let Some(stage) = row.get("stage").and_then(Value::as_str) else {
            return Err(Error::Invalid {
                message: "SLA row has no stage".to_string(),
            });
        };

        tracing::debug!("PUT sla row {}", stage);
        let request = self
            .client
            .put(self.endpoint(&["sla", stage])?)
            .header(REQUEST_ID_HEADER, request_id)
            .json(row);
        let (status, body) = self.exchange(request).await?;
        decode_empty(status, &body)
    }

    async fn list_templates(&self) -> Result<Vec<TemplateSummary>> {
        let (status, body) = self
            .exchange(self.client.get(self.endpoint(&["templates"])?))
            .await?;
        decode_json(status, &body)
    }
}

#[async_trait]
impl JobStatusSource for HttpConfigApi {
    async fn job_status(&self, job_id: &str) -> Result<JobSnapshot> {
        let url = self.endpoint(&["jobs", job_id, "status"])?;
        let (status, body) = self.exchange(self.client.get(url)).await?;
        decode_json(status, &body)
    }
}

impl std::fmt::Debug for HttpConfigApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpConfigApi")
            .field("base_url", &self.base_url.as_str())
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}
