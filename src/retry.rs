use tokio::time::sleep;
use tracing::debug;

use crate::{
    pipeline::{prepare, RequestDescriptor, Step},
    RequestError, Response, Result, Transport,
};

/// Sends `descriptor`, retrying transport failures while retries remain.
///
/// Before a retry the failed attempt's token is cancelled, then the next
/// attempt is prepared and its backoff is awaited. Responses are returned
/// as-is whatever their status. Cancellation by the caller is never retried.
pub(crate) async fn send_with_retry<T>(
    transport: &T,
    descriptor: RequestDescriptor,
    steps: &[Step],
) -> Result<Response>
where
    T: Transport + ?Sized,
{
    let mut attempt = prepare(descriptor, steps);
    loop {
        debug!(
            method = %attempt.method,
            url = %attempt.url,
            attempt = attempt.current_count,
            retries_left = attempt.options.retry_count,
            "sending request"
        );

        let err = match transport.send(&attempt).await {
            Ok(response) => {
                debug!(
                    url = %attempt.url,
                    attempt = attempt.current_count,
                    status = %response.status,
                    "received response"
                );
                return Ok(response);
            }
            Err(err) => err,
        };

        if attempt.parent().is_cancelled() {
            debug!(url = %attempt.url, "request cancelled by caller");
            return Err(RequestError::Cancelled);
        }
        if !should_retry(&attempt, &err) {
            debug!(url = %attempt.url, attempt = attempt.current_count, error = %err, "giving up");
            return Err(err);
        }

        if let Some(token) = attempt.cancellation() {
            token.cancel();
        }

        let next = prepare(attempt.next_attempt(), steps);
        debug!(
            url = %next.url,
            attempt = next.current_count,
            backoff = ?next.backoff,
            error = %err,
            "retrying request"
        );

        tokio::select! {
            _ = next.parent().cancelled() => return Err(RequestError::Cancelled),
            _ = sleep(next.backoff) => {}
        }
        attempt = next;
    }
}

fn should_retry(attempt: &RequestDescriptor, err: &RequestError) -> bool {
    err.is_transport()
        && attempt.options.retry_count > 0
        && (!attempt.options.idempotent_only || attempt.is_idempotent())
}
