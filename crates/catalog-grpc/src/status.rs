//! Mapping from catalog errors to gRPC status codes.

use catalog::{CollectError, ContextError, ImageStoreError, StoreError};
use tokio::task::JoinError;
use tonic::Status;

pub(crate) fn context_status(err: ContextError) -> Status {
    match err {
        ContextError::Canceled => Status::cancelled(err.to_string()),
        ContextError::DeadlineExceeded => Status::deadline_exceeded(err.to_string()),
    }
}

pub(crate) fn store_status(err: StoreError) -> Status {
    match err {
        StoreError::InvalidId { .. } => Status::invalid_argument(err.to_string()),
        StoreError::AlreadyExists { .. } => Status::already_exists(err.to_string()),
        StoreError::LockPoisoned(_) | StoreError::Aborted(_) => Status::internal(err.to_string()),
    }
}

pub(crate) fn image_store_status(err: ImageStoreError) -> Status {
    Status::internal(format!("cannot save image to the store: {err}"))
}

pub(crate) fn receive_status(status: &Status) -> Status {
    Status::unknown(format!("cannot receive stream request: {}", status.message()))
}

pub(crate) fn send_status() -> Status {
    Status::unknown("cannot send stream response")
}

/// Chunks arrive as `Status` results: either transport failures or a
/// message of the wrong kind.
pub(crate) fn collect_status(err: CollectError<Status>) -> Status {
    match err {
        CollectError::TooLarge(err) => Status::invalid_argument(err.to_string()),
        CollectError::Context(err) => context_status(err),
        CollectError::Receive(status) => {
            Status::unknown(format!("cannot receive chunk data: {}", status.message()))
        }
    }
}

pub(crate) fn join_status(err: JoinError) -> Status {
    Status::internal(format!("store task failed: {err}"))
}

/// Log a status that ends a call.
pub(crate) fn log_status(status: &Status) {
    match status.code() {
        tonic::Code::Internal | tonic::Code::Unknown => {
            tracing::error!(code = ?status.code(), message = status.message(), "call failed");
        }
        _ => {
            tracing::warn!(code = ?status.code(), message = status.message(), "call failed");
        }
    }
}
