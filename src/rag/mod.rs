//! Retrieval module.
//!
//! This module provides:
//! - `Retriever`: abstract interface over the vector index
//! - `PineconeRetriever`: managed Pinecone index over REST

mod pinecone;
mod store;

pub use pinecone::PineconeRetriever;
pub use store::{rank_passages, Retriever};
