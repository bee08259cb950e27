use menurag_core::config::{ExtractorSettings, VocabularyMode};
use menurag_core::types::GenerationRequest;
use menurag_core::vocabulary::CanonicalVocabulary;

/// Renders the constrained-vocabulary prompt for one context batch.
///
/// The vocabulary listing is rendered once and reused for every call.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    system: String,
    temperature: f32,
    max_tokens: u32,
}

impl PromptBuilder {
    pub fn new(vocabulary: &CanonicalVocabulary, settings: &ExtractorSettings, temperature: f32, max_tokens: u32) -> Self {
        let listing = match settings.vocabulary_mode {
            VocabularyMode::Names => vocabulary.names().map(|n| format!("- {n}")).collect::<Vec<_>>(),
            VocabularyMode::NamesWithIds => vocabulary.iter().map(|(n, id)| format!("- {n} ({id})")).collect(),
        };
        let system = format!(
            "You select dishes from a fixed list of canonical dish names.\n\
             Use the menu excerpts in the user message to decide which dishes answer the question.\n\
             Answer with between 0 and {max} names copied exactly as they appear in the list, separated by commas.\n\
             Do not invent, translate or rephrase names and do not add any other text.\n\
             If no dish in the list answers the question, reply with exactly: {sentinel}\n\n\
             Dish list:\n{listing}",
            max = settings.max_answers,
            sentinel = settings.none_sentinel,
            listing = listing.join("\n"),
        );
        Self { system, temperature, max_tokens }
    }

    pub fn system(&self) -> &str {
        &self.system
    }

    pub fn build<S: AsRef<str>>(&self, context: &[S], question: &str) -> GenerationRequest {
        let context = context.iter().map(|s| s.as_ref()).collect::<Vec<_>>().join("\n\n");
        GenerationRequest {
            system: self.system.clone(),
            user: format!("Menu excerpts:\n{context}\n\nQuestion: {question}"),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}
