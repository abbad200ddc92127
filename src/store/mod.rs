// file: src/store/mod.rs
// description: vector store operations module exports
// reference: internal module structure

pub mod client;
pub mod manager;
pub mod manifest;
pub mod schema;
pub mod vector_store;

pub use client::LanceDbClient;
pub use manager::{StoreStats, VectorStoreManager, VectorStores};
pub use manifest::{IndexManifest, IndexSettings};
pub use vector_store::{SearchFilter, VectorStore};
