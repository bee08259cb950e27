//! Wiring from [`Settings`] to a ready [`QueryPipeline`].
use std::path::Path;
use std::sync::Arc;

use menurag_answer::AnswerExtractor;
use menurag_core::aggregator::ResultAggregator;
use menurag_core::chunker::DocumentChunker;
use menurag_core::config::{RetrievalStrategy, Settings};
use menurag_core::corpus::{load_documents, UnitTable};
use menurag_core::error::{Error, Result};
use menurag_core::traits::{Embedder, Retriever, TextGenerator};
use menurag_core::vocabulary::CanonicalVocabulary;
use menurag_index::{BatchScanIndex, NeighborExpander, SemanticIndex};

use crate::query::{QueryOptions, QueryPipeline};

/// Loads and chunks the menu corpus.
pub fn load_units(settings: &Settings, limit: Option<usize>) -> Result<UnitTable> {
    let documents = load_documents(&settings.data.menu_dir, limit)?;
    let chunker = DocumentChunker::new(settings.chunking.clone())?;
    Ok(UnitTable::from_documents(&documents, &chunker))
}

pub fn default_embedder(settings: &Settings) -> Result<Arc<dyn Embedder>> {
    menurag_embed::get_default_embedder(&settings.embedding)
        .map_err(|e| Error::InvalidConfig(format!("embedding model: {e:#}")))
}

/// Builds (or reuses) the persisted semantic index for `units`. Only the
/// indexer builds; the query path opens the artifact with [`open_retriever`].
pub async fn semantic_index(
    settings: &Settings,
    index_dir: &Path,
    units: UnitTable,
    embedder: Arc<dyn Embedder>,
) -> Result<SemanticIndex> {
    SemanticIndex::open_or_build(index_dir, units, embedder, settings.retrieval.ann_min_units).await
}

/// Wraps an opened index in neighbor expansion when configured.
pub fn semantic_retriever(settings: &Settings, index: SemanticIndex) -> Box<dyn Retriever> {
    if settings.retrieval.expand_neighbors {
        let shared = index.shared_units();
        Box::new(NeighborExpander::new(index, shared))
    } else {
        Box::new(index)
    }
}

pub fn batch_scan_retriever(settings: &Settings, units: UnitTable) -> Box<dyn Retriever> {
    if settings.retrieval.expand_neighbors {
        tracing::debug!("batch scan already covers every unit; neighbor expansion skipped");
    }
    Box::new(BatchScanIndex::new(Arc::new(units), settings.retrieval.max_batch_words))
}

/// The configured retrieval strategy, read-only for the rest of the run.
///
/// Semantic retrieval opens the persisted index strictly and serves units
/// from its side table, so `menu_dir` is not read. Batch scan loads and
/// chunks the corpus, honouring `corpus_limit`. `embedder` is only consulted
/// for the semantic strategy; `None` loads the configured one.
pub async fn open_retriever(
    settings: &Settings,
    embedder: Option<Arc<dyn Embedder>>,
    corpus_limit: Option<usize>,
) -> Result<Box<dyn Retriever>> {
    match settings.retrieval.strategy {
        RetrievalStrategy::Semantic => {
            if corpus_limit.is_some() {
                tracing::warn!("corpus limit ignored; the semantic index covers what the indexer loaded");
            }
            let embedder = match embedder {
                Some(e) => e,
                None => default_embedder(settings)?,
            };
            let index = SemanticIndex::open(&settings.data.index_dir, embedder).await?;
            tracing::info!(units = index.manifest().unit_count, dir = %settings.data.index_dir.display(), "opened semantic index");
            Ok(semantic_retriever(settings, index))
        }
        RetrievalStrategy::BatchScan => Ok(batch_scan_retriever(settings, load_units(settings, corpus_limit)?)),
    }
}

pub fn build_pipeline(
    settings: &Settings,
    retriever: Box<dyn Retriever>,
    vocabulary: Arc<CanonicalVocabulary>,
    generator: Arc<dyn TextGenerator>,
) -> QueryPipeline {
    let extractor = AnswerExtractor::new(
        generator,
        &vocabulary,
        &settings.extractor,
        settings.generation.temperature,
        settings.generation.max_tokens,
    );
    QueryPipeline::new(
        retriever,
        extractor,
        vocabulary,
        ResultAggregator::new(settings.aggregator.max_results),
        QueryOptions::from_settings(settings),
    )
}

/// Corpus, retriever and vocabulary from `settings`, assembled around the
/// given generation service.
pub async fn pipeline_from_settings(
    settings: &Settings,
    generator: Arc<dyn TextGenerator>,
    corpus_limit: Option<usize>,
) -> Result<QueryPipeline> {
    let vocabulary = Arc::new(CanonicalVocabulary::load(&settings.data.vocabulary_path)?);
    let retriever = open_retriever(settings, None, corpus_limit).await?;
    Ok(build_pipeline(settings, retriever, vocabulary, generator))
}
