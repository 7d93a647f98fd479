use async_trait::async_trait;

use crate::{error::StorageError, model::ActiveVersion};

pub type StorageResult<T> = Result<T, StorageError>;

/// Durable home of the active-version record.
///
/// Implementations must make `store` atomic: a concurrent `load` observes
/// either the previous value or the new one, never a torn or missing record.
#[async_trait]
pub trait VersionStore: Send + Sync {
    /// Returns `Ok(None)` only when the record is provably absent. Any read
    /// failure is an error, never an implicit default.
    async fn load(&self) -> StorageResult<Option<ActiveVersion>>;

    async fn store(&self, version: ActiveVersion) -> StorageResult<()>;

    /// Short human-readable description used in startup logs.
    fn describe(&self) -> String;
}
