use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::DishId;

/// Dish name (exact surface form) → canonical id.
///
/// Backed by a `BTreeMap` so prompt listings and fuzzy tie-breaks are
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalVocabulary {
    entries: BTreeMap<String, DishId>,
}

impl CanonicalVocabulary {
    /// Load a flat JSON object `{ "dish name": id, ... }`.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::NotFound(format!("vocabulary {}: {}", path.display(), e)))?;
        let vocabulary = Self::from_json(&raw)?;
        tracing::info!(path = %path.display(), dishes = vocabulary.len(), "loaded vocabulary");
        Ok(vocabulary)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let entries: BTreeMap<String, DishId> =
            serde_json::from_str(raw).map_err(|e| Error::Parse(format!("vocabulary JSON: {}", e)))?;
        Ok(Self { entries })
    }

    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, DishId)>,
        S: Into<String>,
    {
        Self { entries: pairs.into_iter().map(|(name, id)| (name.into(), id)).collect() }
    }

    pub fn get(&self, name: &str) -> Option<DishId> {
        self.entries.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, DishId)> {
        self.entries.iter().map(|(name, id)| (name.as_str(), *id))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
