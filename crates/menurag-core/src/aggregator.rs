use std::collections::HashSet;

use crate::types::{DishId, FinalResult, MatchedDish, Outcome};

pub const DEFAULT_MAX_RESULTS: usize = 7;

/// Unions resolved ids across every batch of one query.
///
/// First-seen order is kept, duplicates dropped, and the list capped at
/// `max_results`. An empty union becomes `Outcome::NoMatch`; a single id is
/// reported as itself.
#[derive(Debug, Clone)]
pub struct ResultAggregator {
    max_results: usize,
}

impl Default for ResultAggregator {
    fn default() -> Self {
        Self { max_results: DEFAULT_MAX_RESULTS }
    }
}

impl ResultAggregator {
    pub fn new(max_results: usize) -> Self {
        Self { max_results: max_results.max(1) }
    }

    pub fn aggregate<'a, I>(&self, row_id: i64, matches: I) -> FinalResult
    where
        I: IntoIterator<Item = &'a MatchedDish>,
    {
        let mut seen: HashSet<DishId> = HashSet::new();
        let mut ids: Vec<DishId> = Vec::new();
        for id in matches.into_iter().filter_map(|m| m.canonical_id) {
            if seen.insert(id) {
                ids.push(id);
            }
        }
        if ids.is_empty() {
            return FinalResult::no_match(row_id);
        }
        if ids.len() > self.max_results {
            tracing::debug!(row_id, resolved = ids.len(), cap = self.max_results, "truncating result");
            ids.truncate(self.max_results);
        }
        FinalResult { row_id, outcome: Outcome::Matched(ids) }
    }
}
