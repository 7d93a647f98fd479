use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{model::ActiveVersion, traits::*};

/// Process-local store. Does not survive restarts; meant for tests and
/// throwaway dev runs.
#[derive(Debug, Default)]
pub struct MemoryVersionStore {
    value: RwLock<Option<ActiveVersion>>,
}

impl MemoryVersionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_version(version: ActiveVersion) -> Self {
        Self {
            value: RwLock::new(Some(version)),
        }
    }
}

#[async_trait]
impl VersionStore for MemoryVersionStore {
    async fn load(&self) -> StorageResult<Option<ActiveVersion>> {
        Ok(*self.value.read().await)
    }

    async fn store(&self, version: ActiveVersion) -> StorageResult<()> {
        *self.value.write().await = Some(version);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
