//! HTTP surface for the document retrieval chat engine (4.N/6): wires the
//! core crates' services into `axum` handlers behind a shared
//! [`state::AppState`], plus the fixed startup sequence that constructs
//! them.

pub mod bootstrap;
pub mod error;
pub mod openapi;
pub mod routes;
pub mod state;

#[cfg(test)]
pub mod test_utils;

pub use error::{Error, Result};
