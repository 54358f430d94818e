//! Catalog: concurrent in-memory laptop store
//!
//! This crate holds everything the catalog service needs that does not depend
//! on a transport: the record model, a thread-safe [`LaptopStore`] with
//! filtered search, the chunked [`ImageCollector`] plus the [`ImageStore`]
//! collaborator, and the per-call [`RatingAggregator`].
//!
//! Every record crossing the store boundary is an owned copy, so callers can
//! never alias stored state. Long-running operations take a [`CallContext`]
//! and stop early once the caller cancels or its deadline passes.

mod context;
mod filter;
mod image;
mod model;
mod rating;
mod store;

pub mod sample;
pub mod serializer;

pub use context::{CallContext, ContextError};
pub use filter::{is_qualified, to_bits};
pub use image::{
    CollectError, CollectedImage, DiskImageStore, ImageCollector, ImageInfo, ImageStore,
    ImageStoreError, ImageTooLarge, MAX_IMAGE_SIZE,
};
pub use model::{
    Cpu, Filter, Gpu, Keyboard, Laptop, Memory, Resolution, Screen, Storage, keyboard, laptop,
    memory, screen, storage,
};
pub use rating::{Rating, RatingAggregator};
pub use store::{InMemoryLaptopStore, LaptopStore, StoreError, StoreResult, validate_id};
