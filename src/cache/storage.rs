//! Catalog of named cache generations.
//!
//! [`CacheStorage`] is the seam for alternative backends; [`MemoryStorage`]
//! is the in-process implementation. A generation is only visible under its
//! name once it has been committed, which lets install populate a generation
//! off to the side and publish it in one step.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::Generation;
use crate::Result;

/// Named collection of generations.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open a generation, creating an empty one if it does not exist.
    async fn open(&self, name: &str) -> Result<Arc<Generation>>;

    /// Fetch an existing generation without creating it.
    async fn lookup(&self, name: &str) -> Result<Option<Arc<Generation>>>;

    /// Publish a fully populated generation under its name, replacing any
    /// generation already registered with that name.
    async fn commit(&self, generation: Arc<Generation>) -> Result<()>;

    /// Names of all generations, sorted.
    async fn keys(&self) -> Result<Vec<String>>;

    /// Delete a generation and all its entries. Returns whether it existed.
    async fn delete(&self, name: &str) -> Result<bool>;

    /// Whether a generation with this name exists.
    async fn has(&self, name: &str) -> Result<bool> {
        Ok(self.lookup(name).await?.is_some())
    }
}

/// In-memory [`CacheStorage`].
#[derive(Default)]
pub struct MemoryStorage {
    generations: RwLock<BTreeMap<String, Arc<Generation>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, name: &str) -> Result<Arc<Generation>> {
        if let Some(existing) = self.generations.read().await.get(name) {
            return Ok(existing.clone());
        }
        let mut generations = self.generations.write().await;
        Ok(generations
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Generation::new(name)))
            .clone())
    }

    async fn lookup(&self, name: &str) -> Result<Option<Arc<Generation>>> {
        Ok(self.generations.read().await.get(name).cloned())
    }

    async fn commit(&self, generation: Arc<Generation>) -> Result<()> {
        self.generations
            .write()
            .await
            .insert(generation.name().to_string(), generation);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.generations.read().await.keys().cloned().collect())
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        Ok(self.generations.write().await.remove(name).is_some())
    }
}
