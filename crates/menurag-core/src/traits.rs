use async_trait::async_trait;

use crate::corpus::UnitTable;
use crate::error::Result;
use crate::types::{GenerationRequest, RetrievedSet};

pub trait Embedder: Send + Sync {
    /// Stable identifier for the model (e.g. `fake:d1024`); part of the
    /// persisted index fingerprint.
    fn embedder_id(&self) -> String;
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// A retrieval strategy over a fixed unit population.
#[async_trait]
pub trait Retriever: Send + Sync {
    fn unit_table(&self) -> &UnitTable;

    /// `k` bounds ranked strategies; exhaustive strategies may ignore it.
    async fn retrieve(&self, query: &str, k: usize) -> Result<RetrievedSet>;
}

/// The external text-generation service.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}

#[async_trait]
impl<R: Retriever + ?Sized> Retriever for Box<R> {
    fn unit_table(&self) -> &UnitTable {
        (**self).unit_table()
    }

    async fn retrieve(&self, query: &str, k: usize) -> Result<RetrievedSet> {
        (**self).retrieve(query, k).await
    }
}
