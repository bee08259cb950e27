use std::sync::Arc;

use menurag_core::config::ExtractorSettings;
use menurag_core::error::Result;
use menurag_core::traits::TextGenerator;
use menurag_core::vocabulary::CanonicalVocabulary;

use crate::parse::parse_candidates;
use crate::prompt::PromptBuilder;

/// Result of one generation call over one context batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Parsed(Vec<String>),
    Failed(String),
}

impl Extraction {
    /// Candidate names, empty for a failed call.
    pub fn candidates(&self) -> &[String] {
        match self {
            Extraction::Parsed(names) => names,
            Extraction::Failed(_) => &[],
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Extraction::Failed(_))
    }
}

pub struct AnswerExtractor {
    generator: Arc<dyn TextGenerator>,
    prompt: PromptBuilder,
    sentinel: String,
    max_answers: usize,
}

impl AnswerExtractor {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        vocabulary: &CanonicalVocabulary,
        settings: &ExtractorSettings,
        temperature: f32,
        max_tokens: u32,
    ) -> Self {
        Self {
            generator,
            prompt: PromptBuilder::new(vocabulary, settings, temperature, max_tokens),
            sentinel: settings.none_sentinel.clone(),
            max_answers: settings.max_answers,
        }
    }

    pub fn prompt(&self) -> &PromptBuilder {
        &self.prompt
    }

    /// One generation call. Recoverable service errors come back as
    /// [`Extraction::Failed`]; any other error kind is returned.
    pub async fn extract<S: AsRef<str> + Sync>(&self, context: &[S], question: &str) -> Result<Extraction> {
        let request = self.prompt.build(context, question);
        match self.generator.generate(&request).await {
            Ok(response) => {
                let names = parse_candidates(&response, &self.sentinel, self.max_answers);
                tracing::debug!(candidates = names.len(), "parsed answer");
                Ok(Extraction::Parsed(names))
            }
            Err(e) if e.is_recoverable() => {
                tracing::warn!(error = %e, "generation call failed; batch contributes no candidates");
                Ok(Extraction::Failed(e.to_string()))
            }
            Err(e) => Err(e),
        }
    }
}
