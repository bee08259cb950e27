use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{Document, Unit, UnitId};

/// Window size and overlap, both counted in characters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChunkingConfig {
    pub unit_size: usize,
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { unit_size: 900, overlap: 200 }
    }
}

/// Splits document text into overlapping, sequence-indexed units.
///
/// Consecutive units share exactly `overlap` characters, so dropping the
/// first `overlap` characters of every unit after the first and concatenating
/// gives back the source text.
#[derive(Debug, Clone)]
pub struct DocumentChunker {
    config: ChunkingConfig,
}

impl DocumentChunker {
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        if config.unit_size <= config.overlap {
            return Err(Error::Chunking(format!(
                "unit size {} must be greater than overlap {}",
                config.unit_size, config.overlap
            )));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        // Byte offset of every char start, plus the end of the text.
        let bounds: Vec<usize> = text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect();
        let char_len = bounds.len() - 1;
        if char_len == 0 {
            return Vec::new();
        }
        let step = self.config.unit_size - self.config.overlap;
        let mut pieces = Vec::new();
        let mut start = 0usize;
        loop {
            let end = (start + self.config.unit_size).min(char_len);
            pieces.push(text[bounds[start]..bounds[end]].to_string());
            if end == char_len {
                break;
            }
            start += step;
        }
        pieces
    }

    /// Chunk one document, numbering units from `first_unit_id`.
    pub fn chunk_document(&self, doc: &Document, first_unit_id: UnitId) -> Vec<Unit> {
        self.split(&doc.raw_text)
            .into_iter()
            .enumerate()
            .map(|(i, text)| Unit {
                unit_id: first_unit_id + i as UnitId,
                source_id: doc.source_id.clone(),
                sequence_index: i as u32,
                text,
            })
            .collect()
    }
}
