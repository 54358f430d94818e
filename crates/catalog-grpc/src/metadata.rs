//! Per-call context derived from request metadata.

use std::time::Duration;

use catalog::CallContext;
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, DropGuard};
use tonic::metadata::MetadataMap;

const GRPC_TIMEOUT_HEADER: &str = "grpc-timeout";

/// Build the context for a call, honouring the client's `grpc-timeout`.
///
/// A missing or malformed header leaves the call without a deadline. The
/// context is cancelled along with `shutdown`.
pub(crate) fn call_context(metadata: &MetadataMap, shutdown: &CancellationToken) -> CallContext {
    let timeout = metadata
        .get(GRPC_TIMEOUT_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_grpc_timeout);

    let ctx = match timeout {
        Some(timeout) => CallContext::with_timeout(timeout),
        None => CallContext::new(),
    };
    ctx.linked_to(shutdown)
}

/// Parse a `grpc-timeout` value: at most eight digits followed by a unit.
pub(crate) fn parse_grpc_timeout(value: &str) -> Option<Duration> {
    let unit = value.chars().last()?;
    let digits = &value[..value.len() - unit.len_utf8()];
    if digits.is_empty() || digits.len() > 8 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let amount: u64 = digits.parse().ok()?;

    let timeout = match unit {
        'H' => Duration::from_secs(amount * 60 * 60),
        'M' => Duration::from_secs(amount * 60),
        'S' => Duration::from_secs(amount),
        'm' => Duration::from_millis(amount),
        'u' => Duration::from_micros(amount),
        'n' => Duration::from_nanos(amount),
        _ => return None,
    };
    Some(timeout)
}

/// Cancel `ctx` once the receiving half of `tx` goes away.
///
/// Tonic drops the response stream when the client stops listening, which
/// closes the channel. The watcher stops when the returned guard is dropped.
pub(crate) fn cancel_on_disconnect<T>(ctx: &CallContext, tx: &mpsc::Sender<T>) -> DropGuard
where
    T: Send + 'static,
{
    let finished = CancellationToken::new();
    let guard = finished.clone().drop_guard();
    let token = ctx.cancellation_token();
    let tx = tx.clone();

    tokio::spawn(async move {
        tokio::select! {
            _ = tx.closed() => {
                tracing::debug!("client went away, cancelling call");
                token.cancel();
            }
            _ = finished.cancelled() => {}
        }
    });

    guard
}
