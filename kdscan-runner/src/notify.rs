//! Delivery of the rendered report.
//!
//! The scanner hands the finished text to a [`Notifier`]. A failed delivery
//! is logged by the scanner and never fails the scan.

use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the LINE channel access token.
pub const LINE_TOKEN_ENV: &str = "LINE_ACCESS_TOKEN";
/// Environment variable holding the LINE recipient id.
pub const LINE_USER_ENV: &str = "LINE_USER_ID";

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("missing credentials: {0} is not set")]
    MissingCredentials(&'static str),

    #[error("push rejected with HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),
}

/// Destination for the finished report.
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    fn notify(&self, text: &str) -> Result<(), NotifyError>;
}

/// LINE Messaging API push to a single recipient.
pub struct LinePushNotifier {
    client: reqwest::blocking::Client,
    token: String,
    user_id: String,
    endpoint: String,
}

impl LinePushNotifier {
    pub const ENDPOINT: &'static str = "https://api.line.me/v2/bot/message/push";

    pub fn new(token: impl Into<String>, user_id: impl Into<String>) -> Result<Self, NotifyError> {
        let token = token.into();
        let user_id = user_id.into();
        if token.trim().is_empty() {
            return Err(NotifyError::MissingCredentials(LINE_TOKEN_ENV));
        }
        if user_id.trim().is_empty() {
            return Err(NotifyError::MissingCredentials(LINE_USER_ENV));
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            token,
            user_id,
            endpoint: Self::ENDPOINT.to_string(),
        })
    }

    /// Read `LINE_ACCESS_TOKEN` and `LINE_USER_ID` from the environment.
    pub fn from_env() -> Result<Self, NotifyError> {
        let token = std::env::var(LINE_TOKEN_ENV)
            .map_err(|_| NotifyError::MissingCredentials(LINE_TOKEN_ENV))?;
        let user_id = std::env::var(LINE_USER_ENV)
            .map_err(|_| NotifyError::MissingCredentials(LINE_USER_ENV))?;
        Self::new(token, user_id)
    }

    /// Point at a different push endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn payload(&self, text: &str) -> serde_json::Value {
        json!({
            "to": self.user_id,
            "messages": [{ "type": "text", "text": text }],
        })
    }
}

impl Notifier for LinePushNotifier {
    fn name(&self) -> &str {
        "line_push"
    }

    fn notify(&self, text: &str) -> Result<(), NotifyError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&self.payload(text))
            .send()
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().unwrap_or_default();
        Err(NotifyError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

/// Prints the report to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutNotifier;

impl Notifier for StdoutNotifier {
    fn name(&self) -> &str {
        "stdout"
    }

    fn notify(&self, text: &str) -> Result<(), NotifyError> {
        println!("{text}");
        Ok(())
    }
}
