//! `retry-request` is an async HTTP request helper built on `reqwest`.
//!
//! Every call goes through a small pipeline:
//! - [`pipeline`] steps attach a fresh cancellation token and compute the
//!   backoff for each attempt
//! - transport failures are retried up to [`RequestOptions::retry_count`]
//!   times, cancelling the failed attempt before the next one is sent
//! - error statuses and exhausted failures are reported to a [`Notifier`]
//!
//! [`page::IndexPage`] is a small view component built on
//! [`RequestClient::get_with`].

mod client;
mod error;
mod options;
mod retry;
mod transport;
mod types;

pub mod notify;
pub mod page;
pub mod pipeline;

pub use client::RequestClient;
pub use error::RequestError;
pub use notify::{MemoryNotifier, Notification, Notifier, TracingNotifier};
pub use options::{ClientOptions, RequestOptions};
pub use transport::{ReqwestTransport, Transport};
pub use types::Response;

pub use reqwest::{Method, StatusCode};
pub use tokio_util::sync::CancellationToken;

pub type Result<T> = std::result::Result<T, RequestError>;
