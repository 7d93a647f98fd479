pub mod log_storage;

pub use log_storage::LogStorageClient;
