//! Candidate name → canonical id resolution.
//!
//! Exact key lookup first; otherwise the closest key by the Ratcliff/Obershelp
//! ratio `2*M / (|a| + |b|)`, where `M` counts characters in the recursively
//! found longest common blocks. A fuzzy match is accepted at `score >= cutoff`.
use crate::types::{MatchKind, MatchedDish};
use crate::vocabulary::CanonicalVocabulary;

pub const DEFAULT_CUTOFF: f64 = 0.8;

pub struct NameResolver<'a> {
    vocabulary: &'a CanonicalVocabulary,
    cutoff: f64,
}

impl<'a> NameResolver<'a> {
    pub fn new(vocabulary: &'a CanonicalVocabulary, cutoff: f64) -> Self {
        Self { vocabulary, cutoff }
    }

    pub fn resolve(&self, candidate: &str) -> MatchedDish {
        if let Some(id) = self.vocabulary.get(candidate) {
            return MatchedDish {
                candidate_name: candidate.to_string(),
                canonical_id: Some(id),
                match_kind: MatchKind::Exact,
            };
        }
        let candidate_chars: Vec<char> = candidate.chars().collect();
        let mut best: Option<(f64, i64, &str)> = None;
        for (name, id) in self.vocabulary.iter() {
            let score = ratio_chars(&candidate_chars, &name.chars().collect::<Vec<_>>());
            // Equal scores go to the greater key.
            if best.map_or(true, |(s, _, best_name)| score > s || (score == s && name > best_name)) {
                best = Some((score, id, name));
            }
        }
        match best {
            Some((score, id, name)) if score >= self.cutoff => {
                tracing::debug!(candidate, matched = name, score, "fuzzy match");
                MatchedDish {
                    candidate_name: candidate.to_string(),
                    canonical_id: Some(id),
                    match_kind: MatchKind::Fuzzy { score },
                }
            }
            _ => {
                tracing::debug!(candidate, best = ?best.map(|(s, _, n)| (n, s)), "no vocabulary match");
                MatchedDish::miss(candidate)
            }
        }
    }
}

/// Per-query counters for resolution outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolutionStats {
    pub exact: usize,
    pub fuzzy: usize,
    pub misses: usize,
}

impl ResolutionStats {
    pub fn record(&mut self, matched: &MatchedDish) {
        match matched.match_kind {
            MatchKind::Exact => self.exact += 1,
            MatchKind::Fuzzy { .. } => self.fuzzy += 1,
            MatchKind::None => self.misses += 1,
        }
    }

    pub fn merge(&mut self, other: &ResolutionStats) {
        self.exact += other.exact;
        self.fuzzy += other.fuzzy;
        self.misses += other.misses;
    }
}

/// Normalized similarity in `[0, 1]`; two empty strings score 1.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    ratio_chars(&a, &b)
}

fn ratio_chars(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matched_chars(a, b) as f64 / total as f64
}

fn matched_chars(a: &[char], b: &[char]) -> usize {
    let mut matched = 0usize;
    let mut pending = vec![(0usize, a.len(), 0usize, b.len())];
    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, k) = longest_match(&a[alo..ahi], &b[blo..bhi]);
        if k == 0 {
            continue;
        }
        matched += k;
        let (i, j) = (alo + i, blo + j);
        pending.push((alo, i, blo, j));
        pending.push((i + k, ahi, j + k, bhi));
    }
    matched
}

/// Longest common block as `(start_a, start_b, len)`; earliest in `a`, then
/// earliest in `b`, on ties.
fn longest_match(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        for (j, cb) in b.iter().enumerate() {
            cur[j + 1] = if ca == cb { prev[j] + 1 } else { 0 };
            let k = cur[j + 1];
            if k > best.2 {
                best = (i + 1 - k, j + 1 - k, k);
            }
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    best
}
