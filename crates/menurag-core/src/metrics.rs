//! Offline scoring of results against a ground-truth answer set.
use std::collections::{BTreeMap, HashSet};

use crate::error::{Error, Result};
use crate::types::DishId;

/// Jaccard similarity of two id sets. Two empty sets score 1.
pub fn jaccard(predicted: &[DishId], expected: &[DishId]) -> f64 {
    let p: HashSet<DishId> = predicted.iter().copied().collect();
    let e: HashSet<DishId> = expected.iter().copied().collect();
    if p.is_empty() && e.is_empty() {
        return 1.0;
    }
    let union = p.union(&e).count();
    p.intersection(&e).count() as f64 / union as f64
}

/// Parse a result cell (`"12,40,7"`) into ids. Blank cells are empty.
pub fn parse_result_cell(cell: &str) -> Result<Vec<DishId>> {
    let cell = cell.trim().trim_matches('"');
    if cell.is_empty() {
        return Ok(Vec::new());
    }
    cell.split(',')
        .map(|part| {
            part.trim()
                .parse::<DishId>()
                .map_err(|e| Error::Parse(format!("result cell '{}': {}", cell, e)))
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub questions: usize,
    pub mean_score: f64,
    pub perfect: usize,
    pub zero: usize,
    pub missing_rows: Vec<i64>,
}

/// Score every expected row; rows absent from `predicted` score zero.
pub fn evaluate(predicted: &BTreeMap<i64, Vec<DishId>>, expected: &BTreeMap<i64, Vec<DishId>>) -> Evaluation {
    let mut total = 0.0;
    let mut perfect = 0;
    let mut zero = 0;
    let mut missing_rows = Vec::new();
    for (row_id, truth) in expected {
        let score = match predicted.get(row_id) {
            Some(p) => jaccard(p, truth),
            None => {
                missing_rows.push(*row_id);
                0.0
            }
        };
        if score >= 1.0 {
            perfect += 1;
        } else if score <= 0.0 {
            zero += 1;
        }
        total += score;
    }
    let questions = expected.len();
    let mean_score = if questions == 0 { 0.0 } else { total / questions as f64 };
    Evaluation { questions, mean_score, perfect, zero, missing_rows }
}
