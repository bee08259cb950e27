//! Configuration loader, typed settings and path helpers.
//!
//! Uses Figment to merge built-in defaults, `config.toml`, `config.<env>.toml`
//! and `APP_*` env vars (`__` separates sections, e.g.
//! `APP_RETRIEVAL__TOP_K=20`). Path settings expand `~` and `${VAR}` and are
//! resolved against the directory the config was loaded from.
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::chunker::ChunkingConfig;
use crate::error::Error;

pub struct Config {
    figment: Figment,
    base_dir: PathBuf,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(Path::new("."))
    }

    pub fn load_from(dir: &Path) -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(dir.join("config.toml")));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file(dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(dir.join("config.test.toml"))),
            other => tracing::warn!(env = other, "unknown RUST_ENV, using config.toml only"),
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        Ok(Self { figment, base_dir: dir.to_path_buf() })
    }

    /// Wrap an already assembled figment, e.g. one built in a test.
    pub fn from_figment(figment: Figment, base_dir: &Path) -> Self {
        Self { figment, base_dir: base_dir.to_path_buf() }
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Extract, resolve and validate the full typed settings.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let mut settings: Settings = self
            .figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to extract settings: {}", e))?;
        settings.data = settings.data.resolved(&self.base_dir);
        if let Some(dir) = settings.embedding.model_dir.take() {
            settings.embedding.model_dir = Some(resolve_with_base(&self.base_dir, dir.to_string_lossy()));
        }
        if settings.generation.api_key.is_none() {
            settings.generation.api_key = env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty());
        }
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalSettings,
    pub embedding: EmbeddingSettings,
    pub generation: GenerationSettings,
    pub extractor: ExtractorSettings,
    pub resolver: ResolverSettings,
    pub aggregator: AggregatorSettings,
    pub pipeline: PipelineSettings,
}

impl Settings {
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.chunking.unit_size <= self.chunking.overlap {
            return Err(Error::InvalidConfig(format!(
                "chunking.unit_size ({}) must exceed chunking.overlap ({})",
                self.chunking.unit_size, self.chunking.overlap
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::InvalidConfig("retrieval.top_k must be at least 1".into()));
        }
        if self.retrieval.max_batch_words == 0 {
            return Err(Error::InvalidConfig("retrieval.max_batch_words must be at least 1".into()));
        }
        if !(self.resolver.cutoff > 0.0 && self.resolver.cutoff <= 1.0) {
            return Err(Error::InvalidConfig(format!("resolver.cutoff must be in (0, 1], got {}", self.resolver.cutoff)));
        }
        if self.aggregator.max_results == 0 || self.extractor.max_answers == 0 {
            return Err(Error::InvalidConfig("aggregator.max_results and extractor.max_answers must be at least 1".into()));
        }
        if self.aggregator.fallback_token.trim().is_empty() {
            return Err(Error::InvalidConfig("aggregator.fallback_token must not be empty".into()));
        }
        if self.pipeline.query_concurrency == 0 || self.pipeline.batch_concurrency == 0 {
            return Err(Error::InvalidConfig("pipeline concurrency limits must be at least 1".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub menu_dir: PathBuf,
    pub vocabulary_path: PathBuf,
    pub questions_path: PathBuf,
    pub output_path: PathBuf,
    pub index_dir: PathBuf,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            menu_dir: PathBuf::from("data/menu_txt"),
            vocabulary_path: PathBuf::from("data/dish_mapping.json"),
            questions_path: PathBuf::from("data/questions.csv"),
            output_path: PathBuf::from("results.csv"),
            index_dir: PathBuf::from("data/index"),
        }
    }
}

impl DataSettings {
    fn resolved(self, base: &Path) -> Self {
        let r = |p: PathBuf| resolve_with_base(base, p.to_string_lossy());
        Self {
            menu_dir: r(self.menu_dir),
            vocabulary_path: r(self.vocabulary_path),
            questions_path: r(self.questions_path),
            output_path: r(self.output_path),
            index_dir: r(self.index_dir),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalStrategy {
    Semantic,
    BatchScan,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub strategy: RetrievalStrategy,
    pub top_k: usize,
    pub expand_neighbors: bool,
    pub max_batch_words: usize,
    /// Below this many units the vector table is searched exhaustively.
    pub ann_min_units: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            strategy: RetrievalStrategy::Semantic,
            top_k: 10,
            expand_neighbors: true,
            max_batch_words: 2500,
            ann_min_units: 5000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub use_fake: bool,
    pub model_dir: Option<PathBuf>,
    pub max_len: usize,
    pub batch_size: usize,
    pub fake_dim: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self { use_fake: false, model_dir: None, max_len: 256, batch_size: 16, fake_dim: 1024 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o".to_string(),
            api_key: None,
            timeout_secs: 60,
            max_tokens: 150,
            temperature: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VocabularyMode {
    Names,
    NamesWithIds,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorSettings {
    pub max_answers: usize,
    pub none_sentinel: String,
    pub vocabulary_mode: VocabularyMode,
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        Self { max_answers: 7, none_sentinel: "none".to_string(), vocabulary_mode: VocabularyMode::Names }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverSettings {
    pub cutoff: f64,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self { cutoff: 0.8 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorSettings {
    pub max_results: usize,
    pub fallback_token: String,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self { max_results: 7, fallback_token: "1".to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub query_concurrency: usize,
    pub batch_concurrency: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self { query_concurrency: 1, batch_concurrency: 1 }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
