//! Shared test infrastructure for integration tests across every crate in
//! the workspace: one persistent Tokio runtime and one monotonic counter,
//! so Qdrant collection names and storage-root directories never collide
//! between tests running concurrently in different crates.
//!
//! ## Usage
//!
//! In your test crate's `Cargo.toml`:
//! ```toml
//! [dev-dependencies]
//! docurag-test-utils = { path = "../docurag-test-utils" }
//! ```
//!
//! In your tests:
//! ```no_run
//! #[test]
//! fn my_integration_test() {
//!     docurag_test_utils::get_test_runtime().block_on(async {
//!         let collection = docurag_test_utils::unique_collection_name("ingest_test");
//!         // ... test logic ...
//!     })
//! }
//! ```

use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Shared Tokio runtime for ALL integration tests across ALL crates
///
/// Persists for the entire test suite lifetime, preventing "Tokio context
/// is being shutdown" errors and premature disposal of shared connection
/// pools when spawned tasks outlive their originating test.
static TEST_RUNTIME: OnceLock<tokio::runtime::Runtime> = OnceLock::new();

/// Global atomic counter used to derive unique test identifiers (Qdrant
/// collection names, storage-root directories) across all test crates.
static TEST_ID_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Get the shared test runtime (creates on first call, reuses thereafter)
///
/// **Configuration:**
/// - Workers default to CPU count for optimal parallelism
/// - Override with `TEST_RUNTIME_WORKERS` environment variable
///
/// # Panics
/// Panics if the runtime cannot be created (should never happen in normal conditions)
#[allow(clippy::expect_used)]
pub fn get_test_runtime() -> &'static tokio::runtime::Runtime {
    TEST_RUNTIME.get_or_init(|| {
        let workers = std::env::var("TEST_RUNTIME_WORKERS")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(std::num::NonZero::get)
                    .unwrap_or(4)
            });

        eprintln!(
            "creating shared test runtime with {workers} workers (override with TEST_RUNTIME_WORKERS)"
        );

        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("test-runtime")
            .worker_threads(workers)
            .build()
            .expect("failed to create test runtime")
    })
}

/// Get the next unique test id, monotonically increasing across ALL test
/// crates sharing this process.
pub fn next_test_id() -> usize {
    TEST_ID_COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Derive a Qdrant collection name that won't collide with one from a
/// concurrently-running test in another crate: `{prefix}_{pid}_{counter}`.
pub fn unique_collection_name(prefix: &str) -> String {
    format!("{prefix}_{}_{}", std::process::id(), next_test_id())
}

/// Derive a storage-root directory under the OS temp dir, scoped the same
/// way as [`unique_collection_name`], for tests that exercise
/// `docurag-ingest`'s on-disk document persistence without a shared
/// fixture stepping on another test's files.
pub fn unique_storage_root(prefix: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(unique_collection_name(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_is_reusable() {
        let rt1 = get_test_runtime();
        let rt2 = get_test_runtime();
        assert!(std::ptr::eq(rt1, rt2));
    }

    #[test]
    fn test_id_increments() {
        let start = next_test_id();
        let next = next_test_id();
        assert_eq!(next, start + 1);
    }

    #[test]
    fn collection_names_are_unique_across_calls() {
        let a = unique_collection_name("ingest");
        let b = unique_collection_name("ingest");
        assert_ne!(a, b);
        assert!(a.starts_with("ingest_"));
    }

    #[test]
    fn storage_roots_live_under_the_temp_dir() {
        let root = unique_storage_root("docurag");
        assert!(root.starts_with(std::env::temp_dir()));
    }

    #[test]
    fn test_runtime_executes_async() {
        let result = get_test_runtime().block_on(async {
            tokio::time::sleep(tokio::time::Duration::from_millis(1)).await;
            42
        });
        assert_eq!(result, 42);
    }
}
