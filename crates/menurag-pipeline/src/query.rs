use futures::stream::{self, Stream, StreamExt, TryStreamExt};
use std::sync::Arc;

use menurag_answer::{AnswerExtractor, Extraction};
use menurag_core::aggregator::ResultAggregator;
use menurag_core::config::Settings;
use menurag_core::error::Result;
use menurag_core::resolver::{NameResolver, ResolutionStats};
use menurag_core::traits::Retriever;
use menurag_core::types::{ContextBatch, FinalResult, MatchKind, MatchedDish, Query};
use menurag_core::vocabulary::CanonicalVocabulary;

/// Everything the pipeline learned while answering one query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryReport {
    pub result: FinalResult,
    pub stats: ResolutionStats,
    pub batches: usize,
    pub failed_calls: usize,
    pub retrieval_failed: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct QueryOptions {
    pub top_k: usize,
    pub cutoff: f64,
    pub query_concurrency: usize,
    pub batch_concurrency: usize,
}

impl QueryOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            top_k: settings.retrieval.top_k,
            cutoff: settings.resolver.cutoff,
            query_concurrency: settings.pipeline.query_concurrency.max(1),
            batch_concurrency: settings.pipeline.batch_concurrency.max(1),
        }
    }
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// Retrieve, extract, resolve and aggregate, one query at a time or as an
/// ordered stream.
pub struct QueryPipeline {
    retriever: Box<dyn Retriever>,
    extractor: AnswerExtractor,
    vocabulary: Arc<CanonicalVocabulary>,
    aggregator: ResultAggregator,
    options: QueryOptions,
}

impl QueryPipeline {
    pub fn new(
        retriever: Box<dyn Retriever>,
        extractor: AnswerExtractor,
        vocabulary: Arc<CanonicalVocabulary>,
        aggregator: ResultAggregator,
        options: QueryOptions,
    ) -> Self {
        Self { retriever, extractor, vocabulary, aggregator, options }
    }

    pub fn retriever(&self) -> &dyn Retriever {
        self.retriever.as_ref()
    }

    /// Recoverable retrieval and service errors are logged and the row
    /// degrades to whatever the surviving batches produced. Only fatal error
    /// kinds are returned.
    pub async fn answer(&self, query: &Query) -> Result<QueryReport> {
        let retrieved = match self.retriever.retrieve(&query.text, self.options.top_k).await {
            Ok(set) => set,
            Err(e) if e.is_recoverable() => {
                tracing::warn!(row_id = query.row_id, error = %e, "retrieval failed");
                return Ok(QueryReport {
                    result: FinalResult::no_match(query.row_id),
                    stats: ResolutionStats::default(),
                    batches: 0,
                    failed_calls: 0,
                    retrieval_failed: true,
                });
            }
            Err(e) => return Err(e),
        };
        let batches: Vec<&ContextBatch> = retrieved.batches.iter().filter(|b| !b.unit_ids.is_empty()).collect();
        tracing::debug!(row_id = query.row_id, batches = batches.len(), units = retrieved.unit_count(), "retrieved");

        let extractions: Vec<Extraction> = stream::iter(batches.iter())
            .map(|batch| self.extract_batch(batch, &query.text))
            .buffered(self.options.batch_concurrency)
            .try_collect()
            .await?;

        let resolver = NameResolver::new(&self.vocabulary, self.options.cutoff);
        let mut stats = ResolutionStats::default();
        let mut matches: Vec<MatchedDish> = Vec::new();
        for candidate in extractions.iter().flat_map(|e| e.candidates()) {
            let matched = resolver.resolve(candidate);
            stats.record(&matched);
            if matched.match_kind == MatchKind::None {
                tracing::warn!(row_id = query.row_id, candidate = %candidate, "candidate not in vocabulary");
            } else {
                matches.push(matched);
            }
        }
        let failed_calls = extractions.iter().filter(|e| e.is_failed()).count();
        let result = self.aggregator.aggregate(query.row_id, &matches);
        tracing::info!(
            row_id = query.row_id,
            ids = result.identifiers().len(),
            exact = stats.exact,
            fuzzy = stats.fuzzy,
            misses = stats.misses,
            failed_calls,
            "answered"
        );
        Ok(QueryReport { result, stats, batches: batches.len(), failed_calls, retrieval_failed: false })
    }

    async fn extract_batch(&self, batch: &ContextBatch, question: &str) -> Result<Extraction> {
        let texts = self.retriever.unit_table().texts(&batch.unit_ids);
        self.extractor.extract(&texts, question).await
    }

    /// Reports in input order, with at most `query_concurrency` queries in
    /// flight.
    pub fn answer_stream<'a>(&'a self, queries: &'a [Query]) -> impl Stream<Item = Result<QueryReport>> + 'a {
        stream::iter(queries.iter()).map(move |q| self.answer(q)).buffered(self.options.query_concurrency)
    }

    pub async fn answer_all(&self, queries: &[Query]) -> Result<Vec<QueryReport>> {
        self.answer_stream(queries).try_collect().await
    }
}
