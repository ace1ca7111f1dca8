//! Storage handle
//!
//! A [`Connection`] is opened once by the process entry point and cloned into
//! every service and validator that needs storage. Closing it closes the
//! shared backend for all clones.

use std::ops::Deref;
use std::sync::Arc;

use tracing::info;

use super::errors::StorageResult;
use super::memory::MemoryStorage;
use super::traits::Storage;
use crate::schema::EntityRegistry;

#[derive(Clone)]
pub struct Connection {
    inner: Arc<dyn Storage>,
    registry: Arc<EntityRegistry>,
}

impl Connection {
    pub fn new(storage: Arc<dyn Storage>, registry: Arc<EntityRegistry>) -> Self {
        Self {
            inner: storage,
            registry,
        }
    }

    /// Opens an in-process backend over `registry`
    pub fn open_memory(registry: Arc<EntityRegistry>) -> Self {
        let storage = MemoryStorage::open(Arc::clone(&registry));
        info!(entities = registry.len(), "memory storage opened");
        Self::new(Arc::new(storage), registry)
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub async fn close(&self) -> StorageResult<()> {
        self.inner.close().await?;
        info!("storage connection closed");
        Ok(())
    }
}

impl Deref for Connection {
    type Target = dyn Storage;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("open", &self.inner.is_open())
            .field("entities", &self.registry.len())
            .finish()
    }
}
