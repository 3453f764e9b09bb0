//! Error notifications for failed requests.
//!
//! Non-success responses and exhausted transport failures are turned into a
//! [`Notification`] and handed to a [`Notifier`]. Notifying never fails.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Deserialize;

use crate::Response;

/// Message used when no response was received at all.
pub const NETWORK_FAILURE_MESSAGE: &str = "网络异常";
/// Description used when no response was received at all.
pub const NETWORK_FAILURE_DESCRIPTION: &str = "您的网络发生异常，无法连接服务器";

/// Short human-readable description for the status codes agreed with the backend.
pub fn code_message(status: u16) -> Option<&'static str> {
    match status {
        200 => Some("服务器成功返回请求的数据。"),
        400 => Some("发出的请求有错误，服务器没有进行新建或修改数据的操作。"),
        500 => Some("服务器发生错误，请检查服务器。"),
        _ => None,
    }
}

/// A user-facing notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub description: String,
}

impl Notification {
    /// Notification for a response with an error status.
    ///
    /// A JSON body with a non-empty `msg` string overrides the default
    /// description.
    pub fn for_response(response: &Response) -> Self {
        let default_text = code_message(response.status.as_u16())
            .unwrap_or_else(|| response.status_text());
        let description = backend_message(&response.body).unwrap_or_else(|| default_text.to_owned());
        Self {
            message: format!("请求错误 {}: {}", response.status.as_u16(), response.url),
            description,
        }
    }

    /// Notification for a request that never got a response.
    pub fn network_failure() -> Self {
        Self {
            message: NETWORK_FAILURE_MESSAGE.to_owned(),
            description: NETWORK_FAILURE_DESCRIPTION.to_owned(),
        }
    }
}

#[derive(Deserialize)]
struct BackendError {
    #[serde(default)]
    msg: Option<serde_json::Value>,
}

fn backend_message(body: &str) -> Option<String> {
    let parsed: BackendError = serde_json::from_str(body).ok()?;
    match parsed.msg? {
        serde_json::Value::String(text) if !text.is_empty() => Some(text),
        _ => None,
    }
}

/// Receives notifications. Implementations must not panic.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Emits notifications as `tracing` error events.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        tracing::error!(
            title = %notification.message,
            description = %notification.description,
            "request failed"
        );
    }
}

/// Keeps every notification in memory, for UIs that render them later.
#[derive(Clone, Debug, Default)]
pub struct MemoryNotifier {
    inner: Arc<Mutex<Vec<Notification>>>,
}

impl MemoryNotifier {
    /// Empty notifier. Clones share the same list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything received so far.
    pub fn snapshot(&self) -> Vec<Notification> {
        self.lock().clone()
    }

    /// Removes and returns everything received so far.
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Notification>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notification: Notification) {
        self.lock().push(notification);
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::{code_message, MemoryNotifier, Notification, Notifier};
    use crate::Response;

    fn response(status: StatusCode, body: &str) -> Response {
        Response::new(status, "http://api.test/items", body)
    }

    #[test]
    fn backend_msg_overrides_table_text() {
        let notification =
            Notification::for_response(&response(StatusCode::BAD_REQUEST, r#"{"msg":"bad field"}"#));
        assert_eq!(notification.description, "bad field");
        assert_eq!(notification.message, "请求错误 400: http://api.test/items");
    }

    #[test]
    fn missing_body_uses_table_text() {
        let notification = Notification::for_response(&response(StatusCode::BAD_REQUEST, ""));
        assert_eq!(
            notification.description,
            "发出的请求有错误，服务器没有进行新建或修改数据的操作。"
        );
    }

    #[test]
    fn body_without_msg_uses_table_text() {
        let notification = Notification::for_response(&response(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"error":"boom","msg":""}"#,
        ));
        assert_eq!(notification.description, "服务器发生错误，请检查服务器。");
    }

    #[test]
    fn unmapped_status_falls_back_to_status_text() {
        assert_eq!(code_message(404), None);
        let notification = Notification::for_response(&response(StatusCode::NOT_FOUND, "<html/>"));
        assert_eq!(notification.description, "Not Found");
    }

    #[test]
    fn memory_notifier_drains_in_order() {
        let notifier = MemoryNotifier::new();
        notifier.notify(Notification::network_failure());
        notifier.notify(Notification::for_response(&response(StatusCode::BAD_REQUEST, "")));

        assert_eq!(notifier.snapshot().len(), 2);
        let drained = notifier.drain();
        assert_eq!(drained[0], Notification::network_failure());
        assert!(notifier.snapshot().is_empty());
    }
}
