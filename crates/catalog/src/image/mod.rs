//! Image upload support.
//!
//! - [`ImageCollector`] assembles a chunked upload under a size ceiling,
//!   without knowing anything about the transport delivering the chunks.
//! - [`ImageStore`] persists a finished image; [`DiskImageStore`] writes it
//!   to a folder.

mod collector;
mod store;

pub use collector::{CollectError, CollectedImage, ImageCollector, ImageTooLarge, MAX_IMAGE_SIZE};
pub use store::{DiskImageStore, ImageInfo, ImageStore, ImageStoreError};
