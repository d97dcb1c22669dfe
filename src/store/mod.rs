//! Metadata store (C5) and vector store (C6) implementations.

pub mod metadata;
pub mod vector;

pub use metadata::MetadataStore;
pub use vector::{QueryHit, SqliteVectorStore, VectorItem, VectorStore};
