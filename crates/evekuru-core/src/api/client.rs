//! API client for the remote event-reception endpoint.
//!
//! This module provides the `ApiClient` struct for sending action
//! payloads to the deployed web app and for the login exchange that
//! yields the organizer's session fields.

use anyhow::{Context, Result};
use reqwest::{header, Client};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::auth::SessionRecord;

use super::ApiError;

/// Content type for request payloads.
/// The endpoint only accepts simple requests, so JSON bodies are sent
/// as plain text to avoid a CORS preflight it cannot answer.
const CONTENT_TYPE_PLAIN: &str = "text/plain;charset=UTF-8";

/// Envelope status reported by the endpoint on success
const STATUS_SUCCESS: &str = "success";

/// API client for the event endpoint.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    api_url: String,
}

impl ApiClient {
    /// Create a client for the given deployment URL. No request timeout
    /// is set; the transport default applies.
    pub fn new(api_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder().build()?;

        Ok(Self {
            client,
            api_url: api_url.into(),
        })
    }

    /// Send one action payload and parse the JSON response.
    pub async fn call<T: DeserializeOwned, B: Serialize>(&self, payload: &B) -> Result<T> {
        let body =
            serde_json::to_string(payload).context("Failed to serialize request payload")?;

        let response = self
            .client
            .post(&self.api_url)
            .header(header::CONTENT_TYPE, CONTENT_TYPE_PLAIN)
            .body(body)
            .send()
            .await
            .map_err(ApiError::NetworkError)
            .with_context(|| format!("Failed to send request to {}", self.api_url))?;

        let response = Self::check_response(response).await?;
        debug!(url = %self.api_url, "Response received");

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", self.api_url))
    }

    /// Authenticate an organizer and return the session identity fields.
    pub async fn login(&self, event_id: &str, passcode: &str) -> Result<SessionRecord> {
        let payload = LoginRequest {
            action: "login",
            event_id,
            passcode,
        };
        let envelope: LoginResponse = self.call(&payload).await?;

        if envelope.status != STATUS_SUCCESS {
            let message = envelope
                .message
                .unwrap_or_else(|| "login failed".to_string());
            return Err(ApiError::Rejected(message).into());
        }

        let sheet_id = envelope.sheet_id.unwrap_or_default();
        if sheet_id.is_empty() {
            return Err(
                ApiError::InvalidResponse("login response carried no sheetId".to_string()).into(),
            );
        }

        Ok(SessionRecord {
            sheet_id,
            event_name: envelope.event_name.unwrap_or_default(),
            export_id: envelope.export_id.unwrap_or_default(),
        })
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }
}

// Internal API request/response types

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    action: &'static str,
    #[serde(rename = "eventId")]
    event_id: &'a str,
    passcode: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    status: String,
    message: Option<String>,
    #[serde(rename = "sheetId")]
    sheet_id: Option<String>,
    #[serde(rename = "eventName")]
    event_name: Option<String>,
    #[serde(rename = "exportId")]
    export_id: Option<String>,
}
