use std::fmt;
use std::sync::Arc;

use reqwest::Method;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::{
    notify::{Notification, Notifier, TracingNotifier},
    pipeline::{RequestDescriptor, Step, DEFAULT_STEPS},
    retry::send_with_retry,
    ClientOptions, ReqwestTransport, RequestOptions, Response, Result, Transport,
};

/// HTTP client that retries transport failures and reports errors to a [`Notifier`].
///
/// Responses are returned whatever their status; non-success ones are
/// reported to the notifier first. Transport failures are retried per the
/// call's [`RequestOptions`] and reported once retries are exhausted.
pub struct RequestClient<T = ReqwestTransport> {
    transport: Arc<T>,
    options: ClientOptions,
    notifier: Arc<dyn Notifier>,
    steps: Vec<Step>,
}

impl<T> Clone for RequestClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            options: self.options.clone(),
            notifier: Arc::clone(&self.notifier),
            steps: self.steps.clone(),
        }
    }
}

impl<T> fmt::Debug for RequestClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestClient")
            .field("options", &self.options)
            .field("steps", &self.steps.len())
            .finish()
    }
}

impl RequestClient<ReqwestTransport> {
    /// Creates a client with default options: cookies included, no retries.
    pub fn new() -> Result<Self> {
        Self::with_options(ClientOptions::default())
    }

    /// Creates a client from explicit options.
    pub fn with_options(options: ClientOptions) -> Result<Self> {
        let transport = ReqwestTransport::new(&options)?;
        Ok(Self::with_transport(transport, options))
    }

    /// Creates a client from `REQUEST_*` environment variables.
    ///
    /// See [`ClientOptions::from_env`] for the variables read.
    pub fn from_env() -> Result<Self> {
        Self::with_options(ClientOptions::from_env()?)
    }
}

impl<T: Transport> RequestClient<T> {
    /// Creates a client over a custom transport.
    pub fn with_transport(transport: T, options: ClientOptions) -> Self {
        Self {
            transport: Arc::new(transport),
            options,
            notifier: Arc::new(TracingNotifier),
            steps: DEFAULT_STEPS.to_vec(),
        }
    }

    /// Replaces the notifier that receives error notifications.
    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Arc::new(notifier);
        self
    }

    /// Appends a transform step that runs after the default steps on every attempt.
    pub fn with_step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Options the client was built with.
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// GET with the client's default retry options.
    pub async fn get(&self, url: &str) -> Result<Response> {
        self.get_with(url, self.options.request_defaults).await
    }

    /// GET with explicit retry options.
    pub async fn get_with(&self, url: &str, options: RequestOptions) -> Result<Response> {
        self.send(RequestDescriptor::new(Method::GET, url, options)).await
    }

    /// POST a JSON body.
    ///
    /// Transport failures are retried like any other verb unless
    /// `options.idempotent_only` is set.
    pub async fn post(
        &self,
        url: &str,
        body: serde_json::Value,
        options: RequestOptions,
    ) -> Result<Response> {
        self.send(RequestDescriptor::new(Method::POST, url, options).with_body(body))
            .await
    }

    /// Sends any method with an optional JSON body.
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<serde_json::Value>,
        options: RequestOptions,
    ) -> Result<Response> {
        self.request_with_cancel(method, url, body, options, CancellationToken::new())
            .await
    }

    /// Like [`RequestClient::request`], aborting every attempt once `cancel` fires.
    pub async fn request_with_cancel(
        &self,
        method: Method,
        url: &str,
        body: Option<serde_json::Value>,
        options: RequestOptions,
        cancel: CancellationToken,
    ) -> Result<Response> {
        let mut descriptor = RequestDescriptor::new(method, url, options).with_parent(cancel);
        if let Some(body) = body {
            descriptor = descriptor.with_body(body);
        }
        self.send(descriptor).await
    }

    /// GET and decode a JSON body. Non-success statuses become [`crate::RequestError::Http`].
    pub async fn get_json<D: DeserializeOwned>(
        &self,
        url: &str,
        options: RequestOptions,
    ) -> Result<D> {
        self.get_with(url, options).await?.error_for_status()?.json()
    }

    /// Sends a prepared descriptor through the retry loop and the notifier.
    pub async fn send(&self, descriptor: RequestDescriptor) -> Result<Response> {
        match send_with_retry(self.transport.as_ref(), descriptor, &self.steps).await {
            Ok(response) => {
                if !response.is_success() {
                    self.notifier.notify(Notification::for_response(&response));
                }
                Ok(response)
            }
            Err(err) => {
                if err.is_transport() {
                    self.notifier.notify(Notification::network_failure());
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RequestClient;
    use crate::{ClientOptions, RequestOptions};

    #[test]
    fn debug_lists_options_and_step_count() {
        let client = RequestClient::with_options(ClientOptions::default())
            .expect("client must build")
            .with_step(|descriptor| descriptor);
        let debug = format!("{client:?}");
        assert!(debug.contains("RequestClient"));
        assert!(debug.contains("steps: 3"));
    }

    #[test]
    fn get_uses_request_defaults() {
        let defaults = RequestOptions::new(4).with_retry_interval_ms(10);
        let client = RequestClient::with_options(
            ClientOptions::default().with_request_defaults(defaults),
        )
        .expect("client must build");
        assert_eq!(client.options().request_defaults, defaults);
    }
}
