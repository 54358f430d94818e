//! Laptop record storage.
//!
//! The [`LaptopStore`] trait is the capability set the service layer depends
//! on. [`InMemoryLaptopStore`] is the default backend; anything else (a
//! database, a file) only has to implement the same three operations.
//!
//! Records always cross this boundary by value: `save` copies what the caller
//! passed in, `find` and `search` hand out copies of what is stored.

mod error;
mod memory;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryLaptopStore;

use uuid::Uuid;

use crate::context::CallContext;
use crate::model::{Filter, Laptop};

/// Storage backend for laptop records.
///
/// Implementations must be thread-safe; a single store is shared by every
/// concurrent call.
pub trait LaptopStore: Send + Sync {
    /// Store a copy of `laptop` and return its ID.
    ///
    /// An empty ID is replaced by a fresh random UUID. A non-empty ID must be
    /// a valid UUID. Fails with [`StoreError::AlreadyExists`] if the ID is
    /// taken; a failed save leaves the store untouched.
    fn save(&self, laptop: &Laptop) -> StoreResult<String>;

    /// Find a laptop by ID.
    ///
    /// Returns `Ok(None)` if no laptop has this ID.
    fn find(&self, id: &str) -> StoreResult<Option<Laptop>>;

    /// Call `found` with a copy of every laptop that passes `filter`.
    ///
    /// `ctx` is checked before each candidate; once it is done the search
    /// stops and returns `Ok(())`. An error from `found` stops the search and
    /// is returned as is.
    fn search(
        &self,
        ctx: &CallContext,
        filter: &Filter,
        found: &mut dyn FnMut(Laptop) -> StoreResult<()>,
    ) -> StoreResult<()>;
}

/// Check that a caller-supplied ID is a well-formed UUID.
pub fn validate_id(id: &str) -> StoreResult<()> {
    Uuid::parse_str(id)
        .map(|_| ())
        .map_err(|source| StoreError::InvalidId {
            id: id.to_string(),
            source,
        })
}

/// The ID a save will use: the caller's, once validated, or a new one.
fn assign_id(id: &str) -> StoreResult<String> {
    if id.is_empty() {
        Ok(Uuid::new_v4().to_string())
    } else {
        validate_id(id)?;
        Ok(id.to_string())
    }
}
