pub mod http;
pub mod service;
pub mod traits;

pub use http::HttpEmbeddingProvider;
pub use service::DefaultEmbeddingService;
pub use traits::{EmbeddingProvider, EmbeddingService, EmbeddingStats};
