//! Stateless HTTP gateway to the Apps Script sheet endpoint.
//!
//! Two logical operations -- fetch everything, overwrite everything --
//! plus board listing and board creation for multi-board deployments.
//! Transport results are normalized into typed results here; nothing
//! above this layer ever sees a raw HTTP response. There is no retry
//! and no backoff: re-issuing writes is the sync controller's business.
//!
//! POST bodies go out as `text/plain;charset=utf-8` even though they
//! are JSON. Apps Script web apps reject preflighted content types, so
//! this mismatch is part of the endpoint contract.

use std::time::Duration;

use reqwest::Url;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use thiserror::Error;

use sheetboard_proto::{CreateSheetRequest, Envelope, SaveTasksRequest, Task, action};

/// Content type the Apps Script endpoint accepts without preflight.
const POST_CONTENT_TYPE: &str = "text/plain;charset=utf-8";

/// Errors from remote-store calls.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The HTTP request itself failed (connect, timeout, decode).
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered, but with a failure envelope. Carries the
    /// endpoint's own message, or a generic fallback when it sent none.
    #[error("{0}")]
    Api(String),

    /// The request body could not be serialized.
    #[error("failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),

    /// The configured endpoint is not a valid URL.
    #[error("invalid endpoint URL: {0}")]
    Endpoint(#[from] url::ParseError),
}

/// Configuration for gateway HTTP behavior.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Overall per-request timeout.
    pub timeout: Duration,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Request/response wrapper around the sheet endpoint.
#[derive(Debug)]
pub struct SheetGateway {
    http: reqwest::Client,
    endpoint: Url,
}

impl SheetGateway {
    /// Creates a gateway for the given Apps Script web-app URL.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Endpoint`] for an unparseable URL and
    /// [`GatewayError::Transport`] if the HTTP client cannot be built.
    pub fn new(endpoint: &str, config: &GatewayConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self {
            http,
            endpoint: Url::parse(endpoint)?,
        })
    }

    /// Fetches the full task collection of one board sheet.
    ///
    /// # Errors
    ///
    /// Transport failures and failure envelopes both surface as
    /// [`GatewayError`]; the caller treats them identically.
    pub async fn fetch_tasks(&self, board: Option<&str>) -> Result<Vec<Task>, GatewayError> {
        tracing::debug!(board = board.unwrap_or("<default>"), "fetching tasks");
        let mut request = self
            .http
            .get(self.endpoint.clone())
            .query(&[("action", action::GET_TASKS)]);
        if let Some(name) = board {
            request = request.query(&[("sheetName", name)]);
        }
        let envelope: Envelope<Vec<Task>> = request.send().await?.json().await?;
        envelope.into_data().map_err(GatewayError::Api)
    }

    /// Lists the names of all board sheets.
    ///
    /// # Errors
    ///
    /// Same failure normalization as [`Self::fetch_tasks`].
    pub async fn list_boards(&self) -> Result<Vec<String>, GatewayError> {
        tracing::debug!("listing board sheets");
        let envelope: Envelope<Vec<String>> = self
            .http
            .get(self.endpoint.clone())
            .query(&[("action", action::GET_SHEET_NAMES)])
            .send()
            .await?
            .json()
            .await?;
        envelope.into_data().map_err(GatewayError::Api)
    }

    /// Overwrites one board sheet's task collection wholesale.
    ///
    /// Success requires the explicit `status: "success"` marker in the
    /// response body; a clean HTTP 200 wrapping a failure envelope is
    /// still an error.
    ///
    /// # Errors
    ///
    /// See [`GatewayError`].
    pub async fn save_tasks(&self, board: Option<&str>, tasks: &[Task]) -> Result<(), GatewayError> {
        tracing::debug!(
            board = board.unwrap_or("<default>"),
            count = tasks.len(),
            "saving tasks"
        );
        self.post_ack(&SaveTasksRequest::new(board, tasks)).await
    }

    /// Creates a new, empty board sheet.
    ///
    /// # Errors
    ///
    /// See [`GatewayError`].
    pub async fn create_board(&self, name: &str) -> Result<(), GatewayError> {
        tracing::debug!(board = name, "creating board sheet");
        self.post_ack(&CreateSheetRequest::new(name)).await
    }

    async fn post_ack<B: Serialize>(&self, body: &B) -> Result<(), GatewayError> {
        // Writes return no data worth keeping; accept anything.
        let envelope: Envelope<serde_json::Value> = self
            .http
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, POST_CONTENT_TYPE)
            .body(serde_json::to_string(body)?)
            .send()
            .await?
            .json()
            .await?;
        envelope.into_ack().map_err(GatewayError::Api)
    }
}
