use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

use menurag_core::corpus::UnitTable;
use menurag_core::error::Result;
use menurag_core::traits::Retriever;
use menurag_core::types::{ContextBatch, RetrievedSet, UnitId};

/// Widens every retrieved unit with its predecessor and successor in the
/// same source.
pub struct NeighborExpander<R> {
    inner: R,
    units: Arc<UnitTable>,
}

impl<R: Retriever> NeighborExpander<R> {
    pub fn new(inner: R, units: Arc<UnitTable>) -> Self {
        Self { inner, units }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    pub fn expand(&self, set: RetrievedSet) -> RetrievedSet {
        RetrievedSet {
            batches: set.batches.iter().map(|b| expand_batch(&self.units, &b.unit_ids)).collect(),
        }
    }
}

/// For each id emits `prev, self, next` when present, keeping the first
/// occurrence of every id.
pub fn expand_batch(units: &UnitTable, ids: &[UnitId]) -> ContextBatch {
    let mut seen = HashSet::with_capacity(ids.len() * 3);
    let mut out = Vec::with_capacity(ids.len() * 3);
    for id in ids {
        let Some(unit) = units.get(*id) else {
            continue;
        };
        let window = [units.neighbor(unit, -1), Some(unit), units.neighbor(unit, 1)];
        for candidate in window.into_iter().flatten() {
            if seen.insert(candidate.unit_id) {
                out.push(candidate.unit_id);
            }
        }
    }
    ContextBatch::new(out)
}

#[async_trait]
impl<R: Retriever> Retriever for NeighborExpander<R> {
    fn unit_table(&self) -> &UnitTable {
        &self.units
    }

    async fn retrieve(&self, query: &str, k: usize) -> Result<RetrievedSet> {
        let base = self.inner.retrieve(query, k).await?;
        let expanded = self.expand(base);
        tracing::debug!(units = expanded.unit_count(), "expanded with neighbors");
        Ok(expanded)
    }
}
