//! Constrained-vocabulary answer extraction: prompt rendering, the chat
//! completions client and response parsing.
pub mod client;
pub mod extractor;
pub mod parse;
pub mod prompt;

pub use client::OpenAiClient;
pub use extractor::{AnswerExtractor, Extraction};
pub use parse::parse_candidates;
pub use prompt::PromptBuilder;
