//! Domain types shared by the chunker, the retrievers and the answer path.

use serde::{Deserialize, Serialize};

pub type UnitId = u64;
pub type DishId = i64;

/// Plain text of one source document, as produced by the external extractor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    pub source_id: String,
    pub raw_text: String,
}

/// An indexable slice of a source document.
///
/// - `unit_id`: globally unique, contiguous in corpus order
/// - `source_id`: the document the unit was cut from
/// - `sequence_index`: position within the source, starting at 0
/// - `text`: the unit payload, including its overlap with neighbours
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Unit {
    pub unit_id: UnitId,
    pub source_id: String,
    pub sequence_index: u32,
    pub text: String,
}

impl Unit {
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub row_id: i64,
    pub text: String,
}

/// One group of units handed to a single generation call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextBatch {
    pub unit_ids: Vec<UnitId>,
}

impl ContextBatch {
    pub fn new(unit_ids: Vec<UnitId>) -> Self {
        Self { unit_ids }
    }
}

/// What a retrieval strategy returns for one query.
///
/// The semantic strategy yields a single batch in relevance order; the
/// exhaustive scan yields one batch per budgeted partition, in batch order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetrievedSet {
    pub batches: Vec<ContextBatch>,
}

impl RetrievedSet {
    pub fn single(unit_ids: Vec<UnitId>) -> Self {
        Self { batches: vec![ContextBatch::new(unit_ids)] }
    }

    pub fn unit_count(&self) -> usize {
        self.batches.iter().map(|b| b.unit_ids.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.unit_count() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MatchKind {
    Exact,
    Fuzzy { score: f64 },
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchedDish {
    pub candidate_name: String,
    pub canonical_id: Option<DishId>,
    pub match_kind: MatchKind,
}

impl MatchedDish {
    pub fn miss(candidate_name: impl Into<String>) -> Self {
        Self { candidate_name: candidate_name.into(), canonical_id: None, match_kind: MatchKind::None }
    }
}

/// Aggregated answer for one query.
///
/// `NoMatch` and a single real identifier are distinct variants; only
/// rendering maps `NoMatch` onto the configured fallback token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Matched(Vec<DishId>),
    NoMatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalResult {
    pub row_id: i64,
    pub outcome: Outcome,
}

impl FinalResult {
    pub fn no_match(row_id: i64) -> Self {
        Self { row_id, outcome: Outcome::NoMatch }
    }

    pub fn identifiers(&self) -> &[DishId] {
        match &self.outcome {
            Outcome::Matched(ids) => ids,
            Outcome::NoMatch => &[],
        }
    }

    /// Output cell: comma-joined ids with no whitespace, or `fallback`.
    pub fn render(&self, fallback: &str) -> String {
        match &self.outcome {
            Outcome::Matched(ids) if !ids.is_empty() => {
                ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(",")
            }
            _ => fallback.to_string(),
        }
    }
}

/// Prompt pair sent to the text-generation service.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
}
