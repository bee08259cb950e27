use anyhow::{ensure, Result};
use arrow_array::{FixedSizeListArray, Int32Array, Int64Array, RecordBatch, RecordBatchIterator, StringArray};
use indicatif::{ProgressBar, ProgressStyle};
use lancedb::Connection;
use std::sync::Arc;

use menurag_core::traits::Embedder;
use menurag_core::types::Unit;

use crate::schema::build_units_schema;
use crate::table::table_exists;

const INSERT_BATCH: usize = 1000;

/// Embeds units and writes them with their vectors into the `units` table.
pub struct UnitWriter<'a> {
    db: &'a Connection,
    table_name: &'a str,
    embedder: &'a dyn Embedder,
    dim: usize,
}

impl<'a> UnitWriter<'a> {
    pub fn new(db: &'a Connection, table_name: &'a str, embedder: &'a dyn Embedder) -> Self {
        Self { db, table_name, dim: embedder.dim(), embedder }
    }

    pub async fn write(&self, units: &[Unit]) -> Result<usize> {
        let pb = ProgressBar::new(units.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} units {msg}")?
                .progress_chars("#>-"),
        );
        let mut written = 0usize;
        for batch in units.chunks(INSERT_BATCH) {
            pb.set_message("embedding");
            let texts: Vec<String> = batch.iter().map(|u| u.text.clone()).collect();
            let vectors = self.embedder.embed_batch(&texts)?;
            ensure!(vectors.len() == batch.len(), "embedder returned {} vectors for {} units", vectors.len(), batch.len());
            pb.set_message("writing");
            self.insert_batch(batch, &vectors).await?;
            written += batch.len();
            pb.set_position(written as u64);
        }
        pb.finish_with_message("written");
        tracing::info!(units = written, table = self.table_name, "wrote unit vectors");
        Ok(written)
    }

    async fn insert_batch(&self, units: &[Unit], vectors: &[Vec<f32>]) -> Result<()> {
        let record_batch = self.to_record_batch(units, vectors)?;
        let schema = record_batch.schema();
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(record_batch)].into_iter(), schema));
        if table_exists(self.db, self.table_name).await? {
            self.db.open_table(self.table_name).execute().await?.add(reader).execute().await?;
        } else {
            self.db.create_table(self.table_name, reader).execute().await?;
        }
        Ok(())
    }

    fn to_record_batch(&self, units: &[Unit], vectors: &[Vec<f32>]) -> Result<RecordBatch> {
        let dim = i32::try_from(self.dim)?;
        let mut ids = Vec::with_capacity(units.len());
        let mut sources = Vec::with_capacity(units.len());
        let mut sequence = Vec::with_capacity(units.len());
        let mut texts = Vec::with_capacity(units.len());
        let mut vecs: Vec<Option<Vec<Option<f32>>>> = Vec::with_capacity(units.len());
        for (unit, vector) in units.iter().zip(vectors) {
            ensure!(vector.len() == self.dim, "unit {} has dim {}, expected {}", unit.unit_id, vector.len(), self.dim);
            ids.push(i64::try_from(unit.unit_id)?);
            sources.push(unit.source_id.clone());
            sequence.push(i32::try_from(unit.sequence_index)?);
            texts.push(unit.text.clone());
            vecs.push(Some(vector.iter().map(|&x| Some(x)).collect()));
        }
        Ok(RecordBatch::try_new(
            build_units_schema(dim),
            vec![
                Arc::new(Int64Array::from(ids)),
                Arc::new(StringArray::from(sources)),
                Arc::new(Int32Array::from(sequence)),
                Arc::new(StringArray::from(texts)),
                Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vecs.into_iter(), dim)),
            ],
        )?)
    }
}
