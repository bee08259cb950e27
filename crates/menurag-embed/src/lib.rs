//! menurag-embed
//!
//! `Embedder` implementations: a local BGE-M3 model on candle and a
//! deterministic hashing fake. `APP_USE_FAKE_EMBEDDINGS=1` (or
//! `embedding.use_fake`) selects the fake.
use anyhow::Result;
use std::sync::Arc;

use menurag_core::config::EmbeddingSettings;
use menurag_core::traits::Embedder;

pub mod fake;
pub mod model;
pub mod pool;
pub mod tokenize;

pub use fake::FakeEmbedder;
pub use model::EmbeddingModel;
pub use pool::masked_mean_l2;

pub fn fake_requested() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

pub fn get_default_embedder(settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>> {
    if settings.use_fake || fake_requested() {
        tracing::info!(dim = settings.fake_dim, "using FakeEmbedder");
        return Ok(Arc::new(FakeEmbedder::new(settings.fake_dim)));
    }
    let dir = model::resolve_model_dir(settings.model_dir.as_deref())?;
    Ok(Arc::new(EmbeddingModel::load(&dir, settings.max_len, settings.batch_size)?))
}
