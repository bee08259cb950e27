//! Vector retrieval over a persisted LanceDB artifact.
//!
//! Layout under `index_dir`:
//! - `lancedb/`: the `units` table with one embedded row per unit
//! - `units.json`: id-addressable side table (see [`crate::side_table`])
//! - `manifest.json`: fingerprint of the corpus and embedder that built it
//!
//! The three are written in that order and must be present together.
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase, Select};
use lancedb::{DistanceType, Table};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use menurag_core::corpus::UnitTable;
use menurag_core::error::{Error, Result};
use menurag_core::traits::{Embedder, Retriever};
use menurag_core::types::{RetrievedSet, UnitId};

use crate::ann::{build_ivfpq_index, compute_ivfpq_params};
use crate::manifest::{corpus_fingerprint, IndexManifest, MANIFEST_FILE};
use crate::schema::{build_units_schema, UNITS_TABLE};
use crate::side_table::{read_side_table, write_side_table, SIDE_TABLE_FILE};
use crate::table::{ensure_table, open_db};
use crate::writer::UnitWriter;

const LANCEDB_DIR: &str = "lancedb";

pub struct SemanticIndex {
    table: Table,
    units: Arc<UnitTable>,
    embedder: Arc<dyn Embedder>,
    manifest: IndexManifest,
}

struct ArtifactPaths {
    lancedb: PathBuf,
    side_table: PathBuf,
    manifest: PathBuf,
}

impl ArtifactPaths {
    fn new(index_dir: &Path) -> Self {
        Self {
            lancedb: index_dir.join(LANCEDB_DIR),
            side_table: index_dir.join(SIDE_TABLE_FILE),
            manifest: index_dir.join(MANIFEST_FILE),
        }
    }

    fn present(&self) -> [(&'static str, bool); 3] {
        [
            (LANCEDB_DIR, self.lancedb.exists()),
            (SIDE_TABLE_FILE, self.side_table.exists()),
            (MANIFEST_FILE, self.manifest.exists()),
        ]
    }

    fn none_present(&self) -> bool {
        self.present().iter().all(|(_, p)| !p)
    }

    /// Errors when the artifact is partially present.
    fn require_complete(&self) -> Result<()> {
        let missing: Vec<&str> = self.present().iter().filter(|(_, p)| !p).map(|(name, _)| *name).collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::IndexLoad(format!("incomplete index artifact, missing: {}", missing.join(", "))))
        }
    }

    fn clear(&self) -> Result<()> {
        if self.lancedb.exists() {
            std::fs::remove_dir_all(&self.lancedb)?;
        }
        for file in [&self.side_table, &self.manifest] {
            if file.exists() {
                std::fs::remove_file(file)?;
            }
        }
        Ok(())
    }
}

fn storage(e: anyhow::Error) -> Error {
    Error::Storage(format!("{e:#}"))
}

fn lancedb_uri(index_dir: &Path) -> String {
    index_dir.join(LANCEDB_DIR).to_string_lossy().to_string()
}

impl SemanticIndex {
    /// Reuses the artifact in `index_dir` when it was built from exactly
    /// these units with this embedder, otherwise rebuilds it from scratch.
    pub async fn open_or_build(
        index_dir: &Path,
        units: UnitTable,
        embedder: Arc<dyn Embedder>,
        ann_min_units: usize,
    ) -> Result<Self> {
        let paths = ArtifactPaths::new(index_dir);
        if paths.none_present() {
            return Self::build(index_dir, units, embedder, ann_min_units).await;
        }
        paths.require_complete()?;
        let persisted = IndexManifest::read(index_dir)?;
        let expected = corpus_fingerprint(&embedder.embedder_id(), embedder.dim(), &units);
        if persisted.corpus_fingerprint != expected {
            tracing::warn!(
                dir = %index_dir.display(),
                built_with = %persisted.embedder_id,
                "corpus or embedder changed since last build; rebuilding index"
            );
            paths.clear()?;
            return Self::build(index_dir, units, embedder, ann_min_units).await;
        }
        let index = Self::open(index_dir, embedder).await?;
        tracing::info!(units = index.units.len(), dir = %index_dir.display(), "reusing persisted index");
        Ok(index)
    }

    /// Strict load: any missing, corrupt or inconsistent part is an error.
    pub async fn open(index_dir: &Path, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let paths = ArtifactPaths::new(index_dir);
        if paths.none_present() {
            return Err(Error::IndexLoad(format!("no index in {}; run menurag-indexer first", index_dir.display())));
        }
        paths.require_complete()?;
        let manifest = IndexManifest::read(index_dir)?;
        if manifest.embedder_id != embedder.embedder_id() || manifest.dim != embedder.dim() {
            return Err(Error::IndexLoad(format!(
                "index built with {} (dim {}), current embedder is {} (dim {})",
                manifest.embedder_id,
                manifest.dim,
                embedder.embedder_id(),
                embedder.dim()
            )));
        }
        let units = read_side_table(index_dir)?;
        if units.len() != manifest.unit_count {
            return Err(Error::IndexLoad(format!(
                "side table holds {} units, manifest records {}",
                units.len(),
                manifest.unit_count
            )));
        }
        if corpus_fingerprint(&manifest.embedder_id, manifest.dim, &units) != manifest.corpus_fingerprint {
            return Err(Error::IndexLoad("side table does not match the manifest fingerprint".into()));
        }
        let db = open_db(&lancedb_uri(index_dir))
            .await
            .map_err(|e| Error::IndexLoad(format!("open lancedb: {e:#}")))?;
        let table = db
            .open_table(UNITS_TABLE)
            .execute()
            .await
            .map_err(|e| Error::IndexLoad(format!("open table '{UNITS_TABLE}': {e}")))?;
        Ok(Self { table, units: Arc::new(units), embedder, manifest })
    }

    pub async fn build(
        index_dir: &Path,
        units: UnitTable,
        embedder: Arc<dyn Embedder>,
        ann_min_units: usize,
    ) -> Result<Self> {
        std::fs::create_dir_all(index_dir)?;
        tracing::info!(units = units.len(), embedder = %embedder.embedder_id(), dir = %index_dir.display(), "building semantic index");
        let db = open_db(&lancedb_uri(index_dir)).await.map_err(storage)?;
        let dim = i32::try_from(embedder.dim()).map_err(|_| Error::InvalidConfig("embedding dim out of range".into()))?;
        UnitWriter::new(&db, UNITS_TABLE, embedder.as_ref())
            .write(units.units())
            .await
            .map_err(storage)?;
        ensure_table(&db, UNITS_TABLE, build_units_schema(dim)).await.map_err(storage)?;
        if !units.is_empty() && units.len() >= ann_min_units {
            let params = compute_ivfpq_params(units.len(), embedder.dim());
            build_ivfpq_index(&db, UNITS_TABLE, &params).await.map_err(storage)?;
        }
        write_side_table(index_dir, &units)?;
        let manifest = IndexManifest::new(&embedder.embedder_id(), embedder.dim(), &units);
        manifest.write(index_dir)?;
        let table = db.open_table(UNITS_TABLE).execute().await.map_err(|e| Error::Storage(format!("open table '{UNITS_TABLE}': {e}")))?;
        tracing::info!(units = units.len(), fingerprint = %manifest.corpus_fingerprint, "semantic index ready");
        Ok(Self { table, units: Arc::new(units), embedder, manifest })
    }

    pub fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    /// Shared handle to the unit arena, for decorators such as
    /// [`crate::neighbors::NeighborExpander`].
    pub fn shared_units(&self) -> Arc<UnitTable> {
        Arc::clone(&self.units)
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        let embedder = Arc::clone(&self.embedder);
        let text = vec![query.to_string()];
        let mut vectors = tokio::task::spawn_blocking(move || embedder.embed_batch(&text))
            .await
            .map_err(|e| Error::ServiceCall(format!("embedding task: {e}")))?
            .map_err(|e| Error::ServiceCall(format!("embed query: {e:#}")))?;
        vectors.pop().ok_or_else(|| Error::ServiceCall("embedder returned no vector".into()))
    }
}

#[async_trait]
impl Retriever for SemanticIndex {
    fn unit_table(&self) -> &UnitTable {
        &self.units
    }

    async fn retrieve(&self, query: &str, k: usize) -> Result<RetrievedSet> {
        if self.units.is_empty() || k == 0 {
            return Ok(RetrievedSet::single(vec![]));
        }
        let vector = self.embed_query(query).await?;
        let search = |e: lancedb::Error| Error::ServiceCall(format!("vector search: {e}"));
        let mut stream = self
            .table
            .vector_search(vector)
            .map_err(search)?
            .distance_type(DistanceType::Cosine)
            .select(Select::columns(&["unit_id"]))
            .limit(k)
            .execute()
            .await
            .map_err(search)?;
        let mut hits: Vec<(f32, UnitId)> = Vec::with_capacity(k);
        while let Some(batch) = stream.try_next().await.map_err(|e| Error::ServiceCall(format!("vector search: {e}")))? {
            let ids = batch
                .column_by_name("unit_id")
                .and_then(|c| c.as_any().downcast_ref::<arrow_array::Int64Array>())
                .ok_or_else(|| Error::ServiceCall("search result lacks unit_id".into()))?;
            let distances = batch
                .column_by_name("_distance")
                .and_then(|c| c.as_any().downcast_ref::<arrow_array::Float32Array>());
            for i in 0..batch.num_rows() {
                let distance = distances.map(|d| d.value(i)).unwrap_or(f32::MAX);
                hits.push((distance, ids.value(i) as UnitId));
            }
        }
        hits.sort_by(|a, b| a.0.total_cmp(&b.0));
        let unit_ids: Vec<UnitId> = hits.into_iter().map(|(_, id)| id).filter(|id| self.units.get(*id).is_some()).collect();
        tracing::debug!(hits = unit_ids.len(), k, "vector search");
        Ok(RetrievedSet::single(unit_ids))
    }
}
