//! `units.json`: the id-addressable text table persisted next to the vectors.
//!
//! One record per unit id, keyed by the decimal id:
//! `{"17": {"text": "...", "metadata": {"source_id": "menu_03", "sequence_index": 4}}}`.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use menurag_core::corpus::UnitTable;
use menurag_core::error::{Error, Result};
use menurag_core::types::Unit;

pub const SIDE_TABLE_FILE: &str = "units.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UnitRecord {
    text: String,
    metadata: UnitMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UnitMetadata {
    source_id: String,
    sequence_index: u32,
}

pub fn write_side_table(index_dir: &Path, units: &UnitTable) -> Result<()> {
    fs::create_dir_all(index_dir)?;
    let records: BTreeMap<String, UnitRecord> = units
        .iter()
        .map(|u| {
            (
                u.unit_id.to_string(),
                UnitRecord {
                    text: u.text.clone(),
                    metadata: UnitMetadata { source_id: u.source_id.clone(), sequence_index: u.sequence_index },
                },
            )
        })
        .collect();
    let json = serde_json::to_string(&records).map_err(|e| Error::Storage(format!("serialize side table: {e}")))?;
    let path = index_dir.join(SIDE_TABLE_FILE);
    let tmp = index_dir.join(format!("{SIDE_TABLE_FILE}.tmp"));
    fs::write(&tmp, json)?;
    fs::rename(&tmp, &path)?;
    tracing::debug!(path = %path.display(), units = units.len(), "wrote side table");
    Ok(())
}

pub fn read_side_table(index_dir: &Path) -> Result<UnitTable> {
    let path = index_dir.join(SIDE_TABLE_FILE);
    let raw = fs::read_to_string(&path)
        .map_err(|e| Error::IndexLoad(format!("side table {} unreadable: {e}", path.display())))?;
    let records: BTreeMap<String, UnitRecord> = serde_json::from_str(&raw)
        .map_err(|e| Error::IndexLoad(format!("side table {} is corrupt: {e}", path.display())))?;
    let mut units = Vec::with_capacity(records.len());
    for (key, record) in records {
        let unit_id = key
            .parse()
            .map_err(|_| Error::IndexLoad(format!("side table key {key:?} is not a unit id")))?;
        units.push(Unit {
            unit_id,
            source_id: record.metadata.source_id,
            sequence_index: record.metadata.sequence_index,
            text: record.text,
        });
    }
    units.sort_by_key(|u| u.unit_id);
    UnitTable::from_units(units)
}
