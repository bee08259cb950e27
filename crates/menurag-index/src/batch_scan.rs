use async_trait::async_trait;
use std::sync::Arc;

use menurag_core::corpus::UnitTable;
use menurag_core::error::Result;
use menurag_core::traits::Retriever;
use menurag_core::types::{ContextBatch, RetrievedSet, Unit};

/// Partitions units, in id order, into batches of at most `max_words`
/// whitespace-separated words.
///
/// Units are never split. A unit larger than the budget becomes a batch on
/// its own; no batch is empty.
pub fn partition_units(units: &[Unit], max_words: usize) -> Vec<ContextBatch> {
    let mut batches = Vec::new();
    let mut current = Vec::new();
    let mut current_words = 0usize;
    for unit in units {
        let words = unit.word_count();
        if !current.is_empty() && current_words + words > max_words {
            batches.push(ContextBatch::new(std::mem::take(&mut current)));
            current_words = 0;
        }
        current.push(unit.unit_id);
        current_words += words;
    }
    if !current.is_empty() {
        batches.push(ContextBatch::new(current));
    }
    batches
}

/// Exhaustive retrieval: every query sees the whole corpus, one batch at a
/// time.
pub struct BatchScanIndex {
    units: Arc<UnitTable>,
    batches: Vec<ContextBatch>,
    max_words: usize,
}

impl BatchScanIndex {
    pub fn new(units: Arc<UnitTable>, max_words: usize) -> Self {
        let batches = partition_units(units.units(), max_words);
        tracing::info!(units = units.len(), batches = batches.len(), max_words, "partitioned corpus for batch scan");
        Self { units, batches, max_words }
    }

    pub fn batches(&self) -> &[ContextBatch] {
        &self.batches
    }

    pub fn max_words(&self) -> usize {
        self.max_words
    }

    pub fn shared_units(&self) -> Arc<UnitTable> {
        Arc::clone(&self.units)
    }

    pub fn batch_word_counts(&self) -> Vec<usize> {
        self.batches
            .iter()
            .map(|b| b.unit_ids.iter().filter_map(|id| self.units.get(*id)).map(Unit::word_count).sum())
            .collect()
    }
}

#[async_trait]
impl Retriever for BatchScanIndex {
    fn unit_table(&self) -> &UnitTable {
        &self.units
    }

    async fn retrieve(&self, _query: &str, _k: usize) -> Result<RetrievedSet> {
        Ok(RetrievedSet { batches: self.batches.clone() })
    }
}
