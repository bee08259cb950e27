//! Corpus loading and the unit arena.
//!
//! Documents are the extractor's `.txt` output, one file per source. Units
//! are numbered in sorted file order so ids are stable between runs over the
//! same corpus.
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::chunker::DocumentChunker;
use crate::error::{Error, Result};
use crate::types::{Document, Unit, UnitId};

pub fn load_documents(data_dir: &Path, limit: Option<usize>) -> Result<Vec<Document>> {
    if !data_dir.is_dir() {
        return Err(Error::NotFound(format!("corpus directory {}", data_dir.display())));
    }
    let mut files = list_txt_files(data_dir);
    if files.is_empty() {
        tracing::warn!(dir = %data_dir.display(), "no .txt files found");
        return Ok(vec![]);
    }
    if let Some(limit) = limit {
        if files.len() > limit {
            files.truncate(limit);
            tracing::info!(limit, "limited corpus to first files");
        }
    }
    let mut documents = Vec::with_capacity(files.len());
    for (file_index, file_path) in files.iter().enumerate() {
        tracing::debug!(file = %file_path.display(), "reading {}/{}", file_index + 1, files.len());
        let source_id = file_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .ok_or_else(|| Error::NotFound(format!("file stem of {}", file_path.display())))?;
        documents.push(Document { source_id, raw_text: read_file_content(file_path)? });
    }
    tracing::info!(documents = documents.len(), dir = %data_dir.display(), "loaded corpus");
    Ok(documents)
}

fn read_file_content(file_path: &Path) -> Result<String> {
    match fs::read_to_string(file_path) {
        Ok(content) => Ok(content),
        Err(_) => Ok(String::from_utf8_lossy(&fs::read(file_path)?).to_string()),
    }
}

fn list_txt_files(root: &Path) -> Vec<PathBuf> {
    let mut txt_files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().to_path_buf())
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("txt"))
        .collect();
    txt_files.sort();
    txt_files
}

/// Append-only arena of units indexed by `unit_id`.
///
/// Invariants checked on construction: `units[i].unit_id == i`, and within a
/// source `sequence_index` runs 0, 1, 2... over consecutive ids. Together
/// these make `unit_id ± 1` the adjacent unit whenever the source matches.
#[derive(Debug, Clone, Default)]
pub struct UnitTable {
    units: Vec<Unit>,
    by_position: HashMap<(String, u32), UnitId>,
}

impl UnitTable {
    pub fn from_documents(documents: &[Document], chunker: &DocumentChunker) -> Self {
        let mut units = Vec::new();
        for doc in documents {
            let next_id = units.len() as UnitId;
            units.extend(chunker.chunk_document(doc, next_id));
        }
        tracing::info!(documents = documents.len(), units = units.len(), "chunked corpus");
        Self::indexed(units)
    }

    fn indexed(units: Vec<Unit>) -> Self {
        let by_position = units.iter().map(|u| ((u.source_id.clone(), u.sequence_index), u.unit_id)).collect();
        Self { units, by_position }
    }

    pub fn from_units(units: Vec<Unit>) -> Result<Self> {
        for (position, unit) in units.iter().enumerate() {
            if unit.unit_id != position as UnitId {
                return Err(Error::IndexLoad(format!(
                    "unit ids are not contiguous: expected {}, found {}",
                    position, unit.unit_id
                )));
            }
            let expected_seq = match position.checked_sub(1).map(|p| &units[p]) {
                Some(prev) if prev.source_id == unit.source_id => prev.sequence_index + 1,
                _ => 0,
            };
            if unit.sequence_index != expected_seq {
                return Err(Error::IndexLoad(format!(
                    "unit {} of '{}' has sequence index {}, expected {}",
                    unit.unit_id, unit.source_id, unit.sequence_index, expected_seq
                )));
            }
        }
        Ok(Self::indexed(units))
    }

    pub fn get(&self, id: UnitId) -> Option<&Unit> {
        usize::try_from(id).ok().and_then(|i| self.units.get(i))
    }

    /// Id of the unit at `sequence_index` within `source_id`.
    pub fn find(&self, source_id: &str, sequence_index: u32) -> Option<UnitId> {
        self.by_position.get(&(source_id.to_string(), sequence_index)).copied()
    }

    /// The unit `delta` positions away within the same source, if any.
    pub fn neighbor(&self, unit: &Unit, delta: i64) -> Option<&Unit> {
        let target = i64::try_from(unit.unit_id).ok()?.checked_add(delta)?;
        let candidate = self.get(UnitId::try_from(target).ok()?)?;
        let expected_seq = i64::from(unit.sequence_index) + delta;
        (candidate.source_id == unit.source_id && i64::from(candidate.sequence_index) == expected_seq)
            .then_some(candidate)
    }

    /// Texts of the given units in order; unknown ids are skipped.
    pub fn texts(&self, ids: &[UnitId]) -> Vec<&str> {
        ids.iter().filter_map(|id| self.get(*id)).map(|u| u.text.as_str()).collect()
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn total_words(&self) -> usize {
        self.units.iter().map(Unit::word_count).sum()
    }
}
