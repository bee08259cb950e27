//! menurag-core
//!
//! Data model, error kinds, configuration and the pure parts of the
//! question → dish-id pipeline: chunking, the unit arena, the canonical
//! vocabulary, name resolution and result aggregation.

pub mod aggregator;
pub mod chunker;
pub mod config;
pub mod corpus;
pub mod error;
pub mod metrics;
pub mod resolver;
pub mod traits;
pub mod types;
pub mod vocabulary;
