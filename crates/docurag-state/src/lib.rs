//! Process-local, TTL-bounded keyed state: batch/task progress for
//! polling and the SSE progress stream, and per-session chat memory for
//! the conversational query engine. Both stores share one `DashMap` +
//! background-sweeper mechanism; durable bookkeeping lives in
//! `docurag-meta-data`, not here.

pub mod memory;
pub mod progress;
mod ttl;

pub use memory::{ChatMemoryStore, ChatMessage, MessageRole};
pub use progress::{BatchRecord, ProgressStore, TaskProgressStatus, TaskState};
