//! Camunda Platform 7 REST API client
//!
//! A small typed client covering the endpoints the report pipeline and the
//! completion helpers need. Requests are issued one at a time, without retries
//! or caching; any failure is returned to the caller as an [`Error`].

pub mod models;

pub use models::{
    ActivityRecord, HistoricProcessInstance, Incident, IncidentKind, ProcessDefinitionDiagram,
    UserTask,
};

use crate::config::GlobalOptions;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use snafu::prelude::*;
use tracing::debug;
use url::Url;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Invalid engine URL '{url}': {source}"))]
    InvalidUrl { url: String, source: url::ParseError },

    #[snafu(display("Engine URL '{url}' cannot be used as a base for API paths"))]
    NotABaseUrl { url: String },

    #[snafu(display("Invalid Authorization header value: {source}"))]
    InvalidAuthorization {
        source: reqwest::header::InvalidHeaderValue,
    },

    #[snafu(display("Failed to create HTTP client: {source}"))]
    ClientBuild { source: reqwest::Error },

    #[snafu(display("Request to {endpoint} failed: {source}"))]
    Request {
        endpoint: String,
        source: reqwest::Error,
    },

    #[snafu(display("Engine returned HTTP {status} for {endpoint}: {message}"))]
    Status {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[snafu(display("Failed to decode response from {endpoint}: {source}"))]
    Decode {
        endpoint: String,
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Response representation requested through the `Accept` header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Json,
    PlainText,
}

impl ContentType {
    #[must_use]
    pub fn mime(self) -> &'static str {
        match self {
            ContentType::Json => "application/json",
            ContentType::PlainText => "text/plain",
        }
    }
}

/// Camunda error body, e.g. `{"type": "InvalidRequestException", "message": "..."}`
#[derive(Debug, serde::Deserialize)]
struct EngineErrorBody {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    message: String,
}

/// Typed client for the Camunda engine REST API
#[derive(Debug, Clone)]
pub struct EngineClient {
    http: reqwest::Client,
    base_url: Url,
}

impl EngineClient {
    /// Create a client for the engine described by `options`
    ///
    /// # Errors
    /// Returns an error if the URL cannot be parsed or the authorization value
    /// is not a valid header value.
    pub fn new(options: &GlobalOptions) -> Result<Self> {
        let base_url = Url::parse(&options.url).context(InvalidUrlSnafu {
            url: options.url.clone(),
        })?;
        ensure!(
            !base_url.cannot_be_a_base(),
            NotABaseUrlSnafu {
                url: options.url.clone()
            }
        );

        let mut headers = HeaderMap::new();
        if let Some(authorization) = &options.authorization {
            let mut value =
                HeaderValue::from_str(authorization).context(InvalidAuthorizationSnafu)?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!("cmndseven/", env!("CARGO_PKG_VERSION")))
            .build()
            .context(ClientBuildSnafu)?;

        Ok(Self { http, base_url })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build an endpoint URL from path segments; each segment is percent-encoded.
    fn endpoint(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                NotABaseUrlSnafu {
                    url: self.base_url.to_string(),
                }
                .build()
            })?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    async fn request(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
        accept: ContentType,
    ) -> Result<String> {
        let url = self.endpoint(segments, query)?;
        let endpoint = url.to_string();
        debug!("GET {endpoint} ({})", accept.mime());

        let response = self
            .http
            .get(url)
            .header(ACCEPT, accept.mime())
            .send()
            .await
            .context(RequestSnafu {
                endpoint: endpoint.clone(),
            })?;

        let status = response.status();
        let body = response.text().await.context(RequestSnafu {
            endpoint: endpoint.clone(),
        })?;

        if !status.is_success() {
            let message = match serde_json::from_str::<EngineErrorBody>(&body) {
                Ok(EngineErrorBody {
                    kind: Some(kind),
                    message,
                }) => format!("{kind}: {message}"),
                Ok(EngineErrorBody {
                    kind: None,
                    message,
                }) => message,
                Err(_) => body,
            };
            return StatusSnafu {
                endpoint,
                status: status.as_u16(),
                message,
            }
            .fail();
        }

        Ok(body)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<T> {
        let endpoint = self.endpoint(segments, query)?.to_string();
        let body = self.request(segments, query, ContentType::Json).await?;
        serde_json::from_str(&body).context(DecodeSnafu { endpoint })
    }

    /// Fetch a historic process instance by id
    pub async fn historic_process_instance(&self, id: &str) -> Result<HistoricProcessInstance> {
        self.get_json(&["history", "process-instance", id], &[])
            .await
    }

    /// Fetch the BPMN 2.0 XML of a process definition
    pub async fn process_definition_xml(&self, id: &str) -> Result<ProcessDefinitionDiagram> {
        self.get_json(&["process-definition", id, "xml"], &[]).await
    }

    /// Fetch all historic activity instances of a process instance, oldest first
    pub async fn historic_activity_instances(
        &self,
        process_instance_id: &str,
    ) -> Result<Vec<ActivityRecord>> {
        self.get_json(
            &["history", "activity-instance"],
            &[
                ("processInstanceId", process_instance_id),
                ("sortBy", "startTime"),
                ("sortOrder", "asc"),
            ],
        )
        .await
    }

    /// Fetch open incidents of a process instance
    pub async fn incidents(&self, process_instance_id: &str) -> Result<Vec<Incident>> {
        self.get_json(&["incident"], &[("processInstanceId", process_instance_id)])
            .await
    }

    /// Fetch the exception stack trace of a failed job as plain text
    pub async fn job_stacktrace(&self, job_id: &str) -> Result<String> {
        self.request(&["job", job_id, "stacktrace"], &[], ContentType::PlainText)
            .await
    }

    /// Fetch the error details of a failed external task as plain text
    pub async fn external_task_error_details(&self, external_task_id: &str) -> Result<String> {
        self.request(
            &["external-task", external_task_id, "errorDetails"],
            &[],
            ContentType::PlainText,
        )
        .await
    }

    /// List open user tasks, optionally restricted to one process instance
    pub async fn tasks(&self, process_instance_id: Option<&str>) -> Result<Vec<UserTask>> {
        match process_instance_id {
            Some(id) => {
                self.get_json(&["task"], &[("processInstanceId", id)])
                    .await
            }
            None => self.get_json(&["task"], &[]).await,
        }
    }
}
