pub mod bm25;
pub mod index;

pub use bm25::{Bm25Index, SparseMatch};
pub use index::SparseIndex;
