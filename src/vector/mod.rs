//! Pinecone vector index integration.

pub mod client;
pub mod types;

pub use client::{PineconeService, VectorIndex};
pub use types::{DEFAULT_TOP_K, VectorIndexError};
