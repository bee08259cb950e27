//! Candidate retrieval for menurag.
//!
//! Two strategies implement [`menurag_core::traits::Retriever`]:
//! - [`SemanticIndex`]: embeds units into LanceDB and answers top-k vector
//!   searches; the artifact is reused across runs when its fingerprint matches
//! - [`BatchScanIndex`]: no embeddings; hands the whole corpus over in
//!   word-budgeted batches
//!
//! [`NeighborExpander`] wraps either one to add each hit's adjacent units.
pub mod ann;
pub mod batch_scan;
pub mod manifest;
pub mod neighbors;
pub mod schema;
pub mod semantic;
pub mod side_table;
pub mod table;
pub mod writer;

pub use batch_scan::{partition_units, BatchScanIndex};
pub use manifest::{corpus_fingerprint, IndexManifest};
pub use neighbors::{expand_batch, NeighborExpander};
pub use semantic::SemanticIndex;
