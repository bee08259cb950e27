use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use menurag_core::corpus::UnitTable;
use menurag_core::error::{Error, Result};

pub const MANIFEST_FILE: &str = "manifest.json";

/// Build record written last, so its presence marks a complete artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub corpus_fingerprint: String,
    pub embedder_id: String,
    pub dim: usize,
    pub unit_count: usize,
    pub built_at: DateTime<Utc>,
}

impl IndexManifest {
    pub fn new(embedder_id: &str, dim: usize, units: &UnitTable) -> Self {
        Self {
            corpus_fingerprint: corpus_fingerprint(embedder_id, dim, units),
            embedder_id: embedder_id.to_string(),
            dim,
            unit_count: units.len(),
            built_at: Utc::now(),
        }
    }

    pub fn write(&self, index_dir: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| Error::Storage(format!("serialize manifest: {e}")))?;
        fs::write(index_dir.join(MANIFEST_FILE), json)?;
        Ok(())
    }

    pub fn read(index_dir: &Path) -> Result<Self> {
        let path = index_dir.join(MANIFEST_FILE);
        let raw = fs::read_to_string(&path)
            .map_err(|e| Error::IndexLoad(format!("manifest {} unreadable: {e}", path.display())))?;
        serde_json::from_str(&raw).map_err(|e| Error::IndexLoad(format!("manifest {} is corrupt: {e}", path.display())))
    }
}

/// blake3 over the embedder identity and every unit, length-prefixed so
/// field boundaries cannot collide.
pub fn corpus_fingerprint(embedder_id: &str, dim: usize, units: &UnitTable) -> String {
    let mut hasher = blake3::Hasher::new();
    let mut field = |bytes: &[u8]| {
        hasher.update(&(bytes.len() as u64).to_le_bytes());
        hasher.update(bytes);
    };
    field(embedder_id.as_bytes());
    field(&(dim as u64).to_le_bytes());
    for unit in units.iter() {
        field(&unit.unit_id.to_le_bytes());
        field(unit.source_id.as_bytes());
        field(&unit.sequence_index.to_le_bytes());
        field(unit.text.as_bytes());
    }
    hasher.finalize().to_hex().to_string()
}
