//! File conversion for records: protobuf binary and JSON.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Errors from reading or writing serialized records.
#[derive(Debug, Error)]
pub enum SerializeError {
    /// The file could not be read or written.
    #[error("cannot access {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
    /// The bytes are not a valid protobuf message.
    #[error("cannot unmarshal binary to message: {0}")]
    Decode(#[from] prost::DecodeError),
    /// JSON conversion failed.
    #[error("cannot convert message to or from JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience type alias for serializer operations.
pub type Result<T> = std::result::Result<T, SerializeError>;

fn io_error(path: &Path, source: std::io::Error) -> SerializeError {
    SerializeError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Write `message` to `path` in protobuf wire format.
pub fn write_binary_file<M: prost::Message>(message: &M, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, message.encode_to_vec()).map_err(|e| io_error(path, e))
}

/// Read a protobuf-encoded message from `path`.
pub fn read_binary_file<M: prost::Message + Default>(path: impl AsRef<Path>) -> Result<M> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|e| io_error(path, e))?;
    Ok(M::decode(data.as_slice())?)
}

/// Pretty-printed JSON for `message`.
pub fn to_json<M: Serialize>(message: &M) -> Result<String> {
    Ok(serde_json::to_string_pretty(message)?)
}

/// Write `message` to `path` as pretty-printed JSON.
pub fn write_json_file<M: Serialize>(message: &M, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, to_json(message)?).map_err(|e| io_error(path, e))
}

/// Read a JSON message from `path`.
pub fn read_json_file<M: DeserializeOwned>(path: impl AsRef<Path>) -> Result<M> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|e| io_error(path, e))?;
    Ok(serde_json::from_slice(&data)?)
}
