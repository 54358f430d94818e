//! In-memory laptop store.
//!
//! [`InMemoryLaptopStore`] keeps every record in a `HashMap` behind a
//! `RwLock`. Data is lost when the store is dropped.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use super::{LaptopStore, StoreError, StoreResult, assign_id};
use crate::context::CallContext;
use crate::filter::is_qualified;
use crate::model::{Filter, Laptop};

/// An in-memory implementation of [`LaptopStore`].
///
/// `save` takes the write lock; `find` and `search` take the read lock.
/// `search` keeps its read lock for the whole scan, so a slow consumer on one
/// search holds back every writer until it finishes. Readers still proceed
/// concurrently.
#[derive(Debug, Default)]
pub struct InMemoryLaptopStore {
    laptops: RwLock<HashMap<String, Laptop>>,
}

impl InMemoryLaptopStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of laptops currently stored.
    pub fn len(&self) -> StoreResult<usize> {
        let laptops = self.laptops.read().map_err(poisoned)?;
        Ok(laptops.len())
    }

    /// Returns `true` if the store holds no laptops.
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }
}

fn poisoned<T>(e: PoisonError<T>) -> StoreError {
    StoreError::LockPoisoned(e.to_string())
}

impl LaptopStore for InMemoryLaptopStore {
    fn save(&self, laptop: &Laptop) -> StoreResult<String> {
        let id = assign_id(&laptop.id)?;

        let mut laptops = self.laptops.write().map_err(poisoned)?;
        if laptops.contains_key(&id) {
            return Err(StoreError::AlreadyExists { id });
        }

        let mut stored = laptop.clone();
        stored.id.clone_from(&id);
        laptops.insert(id.clone(), stored);
        Ok(id)
    }

    fn find(&self, id: &str) -> StoreResult<Option<Laptop>> {
        let laptops = self.laptops.read().map_err(poisoned)?;
        Ok(laptops.get(id).cloned())
    }

    fn search(
        &self,
        ctx: &CallContext,
        filter: &Filter,
        found: &mut dyn FnMut(Laptop) -> StoreResult<()>,
    ) -> StoreResult<()> {
        let laptops = self.laptops.read().map_err(poisoned)?;

        for laptop in laptops.values() {
            if let Some(err) = ctx.err() {
                tracing::debug!("search stopped early: {}", err);
                return Ok(());
            }

            if is_qualified(filter, laptop) {
                found(laptop.clone())?;
            }
        }

        Ok(())
    }
}
