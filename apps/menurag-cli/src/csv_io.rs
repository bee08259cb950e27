//! Question and result tables.
//!
//! Questions: header row required. The question text is read from `domanda`,
//! else `question`, else the second column (the only one, for single-column
//! files). Row ids come from `row_id` when present, else the 1-based ordinal.
//!
//! Results: `row_id,result`, one row per question, in question order.
use anyhow::{bail, Context, Result};
use arrow_array::{Array, Int64Array, RecordBatch, StringArray};
use arrow_csv::reader::Format;
use arrow_csv::{ReaderBuilder, WriterBuilder};
use arrow_schema::{DataType, Field, Schema};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;

use menurag_core::metrics::parse_result_cell;
use menurag_core::types::{DishId, FinalResult, Query};

const QUESTION_COLUMNS: [&str; 2] = ["domanda", "question"];
const ROW_ID_COLUMN: &str = "row_id";

/// Reads every column as text; returns header names and rows.
fn read_string_table(path: &Path) -> Result<(Vec<String>, Vec<Vec<Option<String>>>)> {
    let mut file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let (inferred, _) = Format::default()
        .with_header(true)
        .infer_schema(&mut file, Some(1))
        .with_context(|| format!("read header of {}", path.display()))?;
    let names: Vec<String> = inferred.fields().iter().map(|f| f.name().clone()).collect();
    if names.is_empty() {
        bail!("{} has no columns", path.display());
    }
    file.seek(SeekFrom::Start(0))?;

    let schema = Arc::new(Schema::new(
        names.iter().map(|n| Field::new(n, DataType::Utf8, true)).collect::<Vec<_>>(),
    ));
    let reader = ReaderBuilder::new(schema).with_header(true).build(file)?;
    let mut rows = Vec::new();
    for batch in reader {
        let batch = batch.with_context(|| format!("parse {}", path.display()))?;
        let columns: Vec<&StringArray> = batch
            .columns()
            .iter()
            .map(|c| c.as_any().downcast_ref::<StringArray>().context("non-text column"))
            .collect::<Result<_>>()?;
        for i in 0..batch.num_rows() {
            rows.push(columns.iter().map(|c| (!c.is_null(i)).then(|| c.value(i).to_string())).collect());
        }
    }
    Ok((names, rows))
}

fn question_column(names: &[String]) -> usize {
    QUESTION_COLUMNS
        .iter()
        .find_map(|wanted| names.iter().position(|n| n.trim().eq_ignore_ascii_case(wanted)))
        .unwrap_or(if names.len() > 1 { 1 } else { 0 })
}

pub fn read_questions(path: &Path) -> Result<Vec<Query>> {
    let (names, rows) = read_string_table(path)?;
    let text_col = question_column(&names);
    let id_col = names.iter().position(|n| n.trim() == ROW_ID_COLUMN);
    tracing::debug!(column = %names[text_col], row_ids = id_col.is_some(), "question table layout");

    rows.into_iter()
        .enumerate()
        .map(|(i, mut row)| -> Result<Query> {
            let row_id = match id_col.and_then(|c| row[c].as_deref()) {
                Some(raw) => raw.trim().parse().with_context(|| format!("row {}: bad row_id {raw:?}", i + 1))?,
                None => i as i64 + 1,
            };
            let text = row[text_col].take().unwrap_or_default();
            Ok(Query { row_id, text })
        })
        .collect()
}

pub fn write_results(path: &Path, results: &[FinalResult], fallback: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let schema = Arc::new(Schema::new(vec![
        Field::new(ROW_ID_COLUMN, DataType::Int64, false),
        Field::new("result", DataType::Utf8, false),
    ]));
    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from(results.iter().map(|r| r.row_id).collect::<Vec<_>>())),
            Arc::new(StringArray::from(results.iter().map(|r| r.render(fallback)).collect::<Vec<_>>())),
        ],
    )?;
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut writer = WriterBuilder::new().with_header(true).build(file);
    writer.write(&batch)?;
    Ok(())
}

/// Reads a `row_id,result` table into id sets keyed by row.
pub fn read_result_table(path: &Path) -> Result<BTreeMap<i64, Vec<DishId>>> {
    let (names, rows) = read_string_table(path)?;
    let id_col = names.iter().position(|n| n.trim() == ROW_ID_COLUMN).unwrap_or(0);
    let result_col = names
        .iter()
        .position(|n| n.trim() == "result")
        .unwrap_or(if names.len() > 1 { 1 } else { 0 });
    let mut table = BTreeMap::new();
    for (i, row) in rows.iter().enumerate() {
        let Some(raw_id) = row[id_col].as_deref() else {
            continue;
        };
        let row_id: i64 = raw_id.trim().parse().with_context(|| format!("row {}: bad row_id {raw_id:?}", i + 1))?;
        let ids = parse_result_cell(row[result_col].as_deref().unwrap_or_default())
            .with_context(|| format!("row {}: bad result cell", i + 1))?;
        table.insert(row_id, ids);
    }
    Ok(table)
}
