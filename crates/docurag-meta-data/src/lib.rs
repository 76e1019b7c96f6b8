//! Durable bookkeeping for documents, ingestion batches, and ingestion tasks
//!
//! Backed by `PostgreSQL` (`sqlx`), using a `FOR UPDATE SKIP LOCKED` dequeue
//! so multiple ingestion workers can pull tasks from the same queue without
//! double-processing one.

pub mod client;
pub mod error;
pub mod mock;
pub mod models;
pub mod pool;
pub mod pool_manager;
pub mod repository;
pub mod traits;

pub use client::DataClient;
pub use error::{MetaDataError, MetaDataResult};
pub use mock::MockMetaDataRepository;
pub use models::{
    Batch, Document, DocumentSortField, SortOrder, Task, TaskStatus, hash_content,
};
pub use pool::initialize_database;
pub use pool_manager::PoolManager;
pub use repository::PgMetaDataRepository;
pub use traits::MetaDataRepository;
