use std::sync::Arc;

use bgd_state_storage::{
    VersionStore, file::FileVersionStore, memory::MemoryVersionStore,
};

use crate::config::{StorageConfig, StoreType};

pub fn create_version_store(config: &StorageConfig) -> Arc<dyn VersionStore> {
    match config.store_type {
        StoreType::File => Arc::new(FileVersionStore::new(&config.state_file)),
        StoreType::Memory => Arc::new(MemoryVersionStore::new()),
    }
}
