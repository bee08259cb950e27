//! End-to-end question answering over the menu corpus.
pub mod query;
pub mod setup;

pub use query::{QueryOptions, QueryPipeline, QueryReport};
pub use setup::{batch_scan_retriever, build_pipeline, load_units, open_retriever, pipeline_from_settings, semantic_retriever};
