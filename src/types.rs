use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::{RequestError, Result};

/// A fully received HTTP response.
///
/// The body is read before the response leaves the transport, so a
/// response can be inspected any number of times after the attempt that
/// produced it has finished.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub status: StatusCode,
    pub url: String,
    pub body: String,
}

impl Response {
    /// Builds a response from its parts.
    pub fn new(status: StatusCode, url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            status,
            url: url.into(),
            body: body.into(),
        }
    }

    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Canonical reason phrase for the status code, or an empty string.
    pub fn status_text(&self) -> &'static str {
        self.status.canonical_reason().unwrap_or("")
    }

    /// Decodes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|err| {
            RequestError::Decode(format!(
                "invalid response JSON from {}: {err}; body: {}",
                self.url, self.body
            ))
        })
    }

    /// Converts a non-success status into [`RequestError::Http`].
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(RequestError::Http {
                status: self.status.as_u16(),
                body: self.body,
            })
        }
    }
}
