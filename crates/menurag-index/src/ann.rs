//! IVF_PQ index for large corpora.
//!
//! Small corpora are served by the flat scan lancedb falls back to when a
//! table has no vector index; past `ann_min_units` rows we train IVF_PQ.
use anyhow::Result;
use lancedb::index::{vector::IvfPqIndexBuilder, Index};
use lancedb::query::ExecutableQuery;
use lancedb::{Connection, DistanceType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IvfPqParams {
    pub nlist: usize,
    pub m: usize,
    pub nbits: usize,
}

pub fn compute_ivfpq_params(total: usize, dim: usize) -> IvfPqParams {
    let sqrt_n = (total as f64).sqrt() as usize;
    let mut nlist = (2 * sqrt_n).clamp(1, 4096);
    // Each partition needs a few rows to train on
    if total > 1 {
        nlist = nlist.min(total - 1);
    } else {
        nlist = 1;
    }
    let m = if dim >= 1024 && dim % 32 == 0 {
        32
    } else if dim % 16 == 0 {
        16
    } else {
        1
    };
    IvfPqParams { nlist, m, nbits: 8 }
}

pub async fn build_ivfpq_index(conn: &Connection, table_name: &str, params: &IvfPqParams) -> Result<()> {
    let table = conn.open_table(table_name).execute().await?;
    table
        .create_index(
            &["vector"],
            Index::IvfPq(
                IvfPqIndexBuilder::default()
                    .distance_type(DistanceType::Cosine)
                    .num_partitions(params.nlist as u32)
                    .num_sub_vectors(params.m as u32),
            ),
        )
        .execute()
        .await?;
    tracing::info!(table = table_name, nlist = params.nlist, m = params.m, "built IVF_PQ index");
    Ok(())
}
