//! Request descriptors and the transform steps applied before each attempt.
//!
//! A descriptor is never mutated in place: every step takes one by value
//! and returns the next, and a retry starts from [`RequestDescriptor::next_attempt`].

use std::time::Duration;

use reqwest::Method;
use tokio_util::sync::CancellationToken;

use crate::RequestOptions;

/// Upper bound for computed exponential backoff.
pub const MAX_BACKOFF_MS: u64 = 30_000;

const BASE_BACKOFF_MS: u64 = 1_000;

/// A transform applied to a descriptor before it is sent.
pub type Step = fn(RequestDescriptor) -> RequestDescriptor;

/// Steps run, in order, before every attempt.
pub const DEFAULT_STEPS: &[Step] = &[attach_cancellation, compute_backoff];

/// Everything needed to issue one attempt of a request.
#[derive(Clone, Debug)]
pub struct RequestDescriptor {
    pub method: Method,
    pub url: String,
    pub body: Option<serde_json::Value>,
    pub options: RequestOptions,
    /// Attempt number, starting at 1.
    pub current_count: u32,
    /// Delay to wait before this attempt is sent. Only honored for retries.
    pub backoff: Duration,
    parent: CancellationToken,
    attempt: Option<CancellationToken>,
}

impl RequestDescriptor {
    /// Descriptor for the first attempt, with its own caller token.
    pub fn new(method: Method, url: impl Into<String>, options: RequestOptions) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
            options,
            current_count: 1,
            backoff: Duration::ZERO,
            parent: CancellationToken::new(),
            attempt: None,
        }
    }

    /// Attaches a JSON body, sent unchanged on every attempt.
    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Ties every attempt of this request to the caller's token.
    pub fn with_parent(mut self, parent: CancellationToken) -> Self {
        self.parent = parent;
        self
    }

    /// The caller-owned token. Cancelling it cancels every attempt.
    pub fn parent(&self) -> &CancellationToken {
        &self.parent
    }

    /// The token owned by this attempt, once [`attach_cancellation`] has run.
    pub fn cancellation(&self) -> Option<&CancellationToken> {
        self.attempt.as_ref()
    }

    /// Descriptor for the attempt that supersedes this one.
    ///
    /// Consumes one retry and advances the attempt number. The new
    /// descriptor carries no attempt token.
    pub fn next_attempt(&self) -> Self {
        Self {
            method: self.method.clone(),
            url: self.url.clone(),
            body: self.body.clone(),
            options: RequestOptions {
                retry_count: self.options.retry_count.saturating_sub(1),
                ..self.options
            },
            current_count: self.current_count.saturating_add(1),
            backoff: Duration::ZERO,
            parent: self.parent.clone(),
            attempt: None,
        }
    }

    /// Whether the method may be repeated without changing server state twice.
    pub fn is_idempotent(&self) -> bool {
        matches!(
            self.method,
            Method::GET | Method::HEAD | Method::PUT | Method::DELETE | Method::OPTIONS | Method::TRACE
        )
    }
}

/// Runs `steps` over `descriptor` in order.
pub fn prepare(descriptor: RequestDescriptor, steps: &[Step]) -> RequestDescriptor {
    steps.iter().fold(descriptor, |descriptor, step| step(descriptor))
}

/// Gives the attempt its own token, a child of the caller's token.
pub fn attach_cancellation(descriptor: RequestDescriptor) -> RequestDescriptor {
    let attempt = descriptor.parent.child_token();
    RequestDescriptor {
        attempt: Some(attempt),
        ..descriptor
    }
}

/// Sets the delay that precedes this attempt.
pub fn compute_backoff(descriptor: RequestDescriptor) -> RequestDescriptor {
    let backoff = backoff_for(&descriptor.options, descriptor.current_count);
    RequestDescriptor {
        backoff,
        ..descriptor
    }
}

/// `retry_interval_ms` if set, otherwise `min(1000 * 2^current_count, 30000)` ms.
pub fn backoff_for(options: &RequestOptions, current_count: u32) -> Duration {
    if let Some(interval) = options.retry_interval_ms {
        return Duration::from_millis(interval);
    }
    let multiplier = 1u64.checked_shl(current_count).unwrap_or(u64::MAX);
    Duration::from_millis(BASE_BACKOFF_MS.saturating_mul(multiplier).min(MAX_BACKOFF_MS))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use reqwest::Method;
    use tokio_util::sync::CancellationToken;

    use super::{backoff_for, prepare, RequestDescriptor, DEFAULT_STEPS};
    use crate::RequestOptions;

    #[test]
    fn exponential_backoff_doubles_and_caps() {
        let options = RequestOptions::new(5);
        assert_eq!(backoff_for(&options, 1), Duration::from_millis(2_000));
        assert_eq!(backoff_for(&options, 2), Duration::from_millis(4_000));
        assert_eq!(backoff_for(&options, 4), Duration::from_millis(16_000));
        assert_eq!(backoff_for(&options, 5), Duration::from_millis(30_000));
        assert_eq!(backoff_for(&options, 200), Duration::from_millis(30_000));
    }

    #[test]
    fn fixed_interval_wins_over_exponential() {
        let options = RequestOptions::new(2).with_retry_interval_ms(1);
        assert_eq!(backoff_for(&options, 1), Duration::from_millis(1));
        assert_eq!(backoff_for(&options, 9), Duration::from_millis(1));
    }

    #[test]
    fn next_attempt_consumes_retry_and_leaves_original_untouched() {
        let first = prepare(
            RequestDescriptor::new(Method::GET, "http://x", RequestOptions::new(2)),
            DEFAULT_STEPS,
        );
        let second = first.next_attempt();

        assert_eq!(first.options.retry_count, 2);
        assert_eq!(first.current_count, 1);
        assert_eq!(second.options.retry_count, 1);
        assert_eq!(second.current_count, 2);
        assert!(first.cancellation().is_some());
        assert!(second.cancellation().is_none());
    }

    #[test]
    fn each_attempt_gets_a_fresh_child_token() {
        let parent = CancellationToken::new();
        let first = prepare(
            RequestDescriptor::new(Method::GET, "http://x", RequestOptions::new(1))
                .with_parent(parent.clone()),
            DEFAULT_STEPS,
        );
        let second = prepare(first.next_attempt(), DEFAULT_STEPS);

        let first_token = first.cancellation().expect("token attached").clone();
        let second_token = second.cancellation().expect("token attached").clone();

        first_token.cancel();
        assert!(!second_token.is_cancelled());
        assert!(!parent.is_cancelled());

        parent.cancel();
        assert!(second_token.is_cancelled());
    }

    #[test]
    fn only_safe_methods_are_idempotent() {
        let get = RequestDescriptor::new(Method::GET, "http://x", RequestOptions::default());
        let post = RequestDescriptor::new(Method::POST, "http://x", RequestOptions::default());
        assert!(get.is_idempotent());
        assert!(!post.is_idempotent());
    }
}
