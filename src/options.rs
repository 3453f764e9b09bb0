use crate::{RequestError, Result};

/// Configures the HTTP client shared by every request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientOptions {
    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: u64,
    /// Keep a cookie store and send cookies with every request.
    pub include_credentials: bool,
    /// Retry options used when a call does not supply its own.
    pub request_defaults: RequestOptions,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            include_credentials: true,
            request_defaults: RequestOptions::default(),
        }
    }
}

impl ClientOptions {
    /// Reads options from environment variables, falling back to defaults.
    ///
    /// Reads:
    /// - `REQUEST_TIMEOUT_MS`
    /// - `REQUEST_INCLUDE_CREDENTIALS` (`true`/`false`/`1`/`0`)
    /// - `REQUEST_RETRY_COUNT`
    /// - `REQUEST_RETRY_INTERVAL_MS`
    ///
    /// Returns an error if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientOptions::from_env`], reading values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut options = Self::default();

        if let Some(value) = non_empty(lookup("REQUEST_TIMEOUT_MS")) {
            options.timeout_ms = parse_number("REQUEST_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = non_empty(lookup("REQUEST_INCLUDE_CREDENTIALS")) {
            options.include_credentials = parse_flag("REQUEST_INCLUDE_CREDENTIALS", &value)?;
        }
        if let Some(value) = non_empty(lookup("REQUEST_RETRY_COUNT")) {
            options.request_defaults.retry_count = parse_number("REQUEST_RETRY_COUNT", &value)?;
        }
        if let Some(value) = non_empty(lookup("REQUEST_RETRY_INTERVAL_MS")) {
            options.request_defaults.retry_interval_ms =
                Some(parse_number("REQUEST_RETRY_INTERVAL_MS", &value)?);
        }

        Ok(options)
    }

    /// Replaces the per-attempt timeout.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Replaces the default retry options.
    pub fn with_request_defaults(mut self, defaults: RequestOptions) -> Self {
        self.request_defaults = defaults;
        self
    }
}

/// Retry behavior for a single call.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RequestOptions {
    /// Number of retries allowed after the first attempt.
    pub retry_count: u32,
    /// Fixed delay before each retry. Exponential backoff is used when unset.
    pub retry_interval_ms: Option<u64>,
    /// Only retry methods that are idempotent (GET, HEAD, PUT, DELETE, OPTIONS, TRACE).
    pub idempotent_only: bool,
}

impl RequestOptions {
    /// Allows `retry_count` retries with exponential backoff.
    pub fn new(retry_count: u32) -> Self {
        Self {
            retry_count,
            ..Self::default()
        }
    }

    /// Waits a fixed `interval_ms` before each retry instead of backing off.
    pub fn with_retry_interval_ms(mut self, interval_ms: u64) -> Self {
        self.retry_interval_ms = Some(interval_ms);
        self
    }

    /// Stops retrying methods that are not idempotent.
    pub fn idempotent_only(mut self) -> Self {
        self.idempotent_only = true;
        self
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn parse_number<N: std::str::FromStr>(key: &str, value: &str) -> Result<N> {
    value
        .parse()
        .map_err(|_| RequestError::Config(format!("{key} must be a non-negative integer, got '{value}'")))
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(RequestError::Config(format!(
            "{key} must be a boolean, got '{value}'"
        ))),
    }
}
