#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{InMemoryStorage, ProgressStorage, StorageError, progress_key};
pub use sqlite::{SqliteInitError, SqliteRepository};
