//! SQLite-backed planner storage
//!
//! A local single-file database behind the `PlannerStore` trait. All
//! rusqlite calls run on the blocking thread pool so the pipeline's
//! drain loop never stalls on disk I/O.

pub mod planner;
pub mod schema;

pub use planner::SqlitePlannerStore;

use thiserror::Error;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::QueryReturnedNoRows => {
                StorageError::NotFound("row not found".to_string())
            }
            other => StorageError::Database(other.to_string()),
        }
    }
}

impl From<StorageError> for pocket_core::Error {
    fn from(err: StorageError) -> Self {
        pocket_core::Error::Storage(err.to_string())
    }
}
