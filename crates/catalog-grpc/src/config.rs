//! Server configuration.

use std::net::{Ipv6Addr, SocketAddr};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Address the server listens on unless told otherwise.
pub const DEFAULT_ADDR: &str = "[::1]:50051";

/// Folder uploaded images are written to unless told otherwise.
pub const DEFAULT_IMAGE_DIR: &str = "img";

/// Settings for [`CatalogServer`](crate::CatalogServer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on
    pub addr: SocketAddr,
    /// Folder for uploaded images
    pub image_dir: PathBuf,
    /// Largest accepted image, in bytes
    pub max_image_size: usize,
}

/// A [`ServerConfig`] the server cannot run with.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Upload responses report image sizes as 32-bit values.
    #[error("max image size {0} does not fit in 32 bits")]
    ImageSizeTooLarge(usize),
}

impl ServerConfig {
    /// Check the settings before the server starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if u32::try_from(self.max_image_size).is_err() {
            return Err(ConfigError::ImageSizeTooLarge(self.max_image_size));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from((Ipv6Addr::LOCALHOST, 50051)),
            image_dir: PathBuf::from(DEFAULT_IMAGE_DIR),
            max_image_size: catalog::MAX_IMAGE_SIZE,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_constants() {
        let config = ServerConfig::default();
        assert_eq!(config.addr, DEFAULT_ADDR.parse::<SocketAddr>().unwrap());
        assert_eq!(config.image_dir, PathBuf::from("img"));
        assert_eq!(config.max_image_size, 1 << 20);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_validate_rejects_image_size_above_u32() {
        let limit = u32::MAX as usize;
        let mut config = ServerConfig {
            max_image_size: limit,
            ..Default::default()
        };
        assert_eq!(config.validate(), Ok(()));

        config.max_image_size = limit + 1;
        assert_eq!(
            config.validate(),
            Err(ConfigError::ImageSizeTooLarge(limit + 1))
        );
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: ServerConfig = serde_json::from_str(r#"{"max_image_size": 4096}"#).unwrap();
        assert_eq!(config.max_image_size, 4096);
        assert_eq!(config.addr, ServerConfig::default().addr);
        assert_eq!(config.image_dir, PathBuf::from(DEFAULT_IMAGE_DIR));
    }
}
