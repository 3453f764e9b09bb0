use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header;

use crate::{pipeline::RequestDescriptor, ClientOptions, RequestError, Response, Result};

/// Sends a single attempt of a request.
///
/// Implementations must return `Ok` for every response that was received,
/// whatever its status, and an error for which
/// [`RequestError::is_transport`] holds when no response was obtained.
/// The attempt's cancellation token is available through
/// [`RequestDescriptor::cancellation`] and must abort the call when fired.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &RequestDescriptor) -> Result<Response>;
}

/// [`Transport`] backed by a shared `reqwest::Client`.
#[derive(Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
    timeout: Duration,
}

impl fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ReqwestTransport {
    /// Builds the underlying client from `options`.
    pub fn new(options: &ClientOptions) -> Result<Self> {
        let http = reqwest::Client::builder()
            .cookie_store(options.include_credentials)
            .build()
            .map_err(|err| RequestError::Config(format!("http client build failed: {err}")))?;
        Ok(Self::from_client(http, options))
    }

    /// Wraps an existing client. Cookie handling is whatever `http` was built with.
    pub fn from_client(http: reqwest::Client, options: &ClientOptions) -> Self {
        Self {
            http,
            timeout: Duration::from_millis(options.timeout_ms),
        }
    }

    async fn execute(&self, request: &RequestDescriptor) -> Result<Response> {
        let mut builder = self
            .http
            .request(request.method.clone(), &request.url)
            .header(header::ACCEPT, "application/json")
            .timeout(self.timeout);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(RequestError::Transport)?;
        let status = response.status();
        let url = response.url().to_string();
        let body = response.text().await.map_err(RequestError::Transport)?;
        Ok(Response { status, url, body })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &RequestDescriptor) -> Result<Response> {
        let Some(token) = request.cancellation() else {
            return self.execute(request).await;
        };

        tokio::select! {
            biased;
            _ = token.cancelled() => Err(RequestError::Cancelled),
            result = self.execute(request) => result,
        }
    }
}
