use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaModel};
use tokenizers::Tokenizer;

use menurag_core::traits::Embedder;

use crate::pool::masked_mean_l2;
use crate::tokenize::tokenize_batch;

/// BGE-M3 (XLM-RoBERTa) dense embedder loaded from local files.
///
/// The model directory must hold `tokenizer.json`, `config.json` and either
/// `model.safetensors` or `pytorch_model.bin`.
pub struct EmbeddingModel {
    model: XLMRobertaModel,
    tokenizer: Tokenizer,
    device: Device,
    dim: usize,
    max_len: usize,
    batch_size: usize,
    id: String,
}

impl EmbeddingModel {
    pub fn load(model_dir: &Path, max_len: usize, batch_size: usize) -> Result<Self> {
        let device = select_device();
        tracing::info!(dir = %model_dir.display(), "loading embedding model");

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;

        let config_path = model_dir.join("config.json");
        let config: XLMRobertaConfig = serde_json::from_str(&std::fs::read_to_string(&config_path)?)?;
        let dim = config.hidden_size;

        let safetensors = model_dir.join("model.safetensors");
        let vb = if safetensors.exists() {
            // SAFETY: the weights file is not modified while mapped.
            unsafe { VarBuilder::from_mmaped_safetensors(&[safetensors], DType::F32, &device)? }
        } else {
            let weights = candle_core::pickle::read_all(model_dir.join("pytorch_model.bin"))?;
            let weights_map: HashMap<String, Tensor> = weights.into_iter().collect();
            VarBuilder::from_tensors(weights_map, DType::F32, &device)
        };
        let model = XLMRobertaModel::new(&config, vb)?;
        let name = model_dir.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_else(|| "model".into());
        tracing::info!(dim, max_len, "embedding model ready");
        Ok(Self { model, tokenizer, device, dim, max_len, batch_size: batch_size.max(1), id: format!("local:{}:d{}", name, dim) })
    }

    fn embed_chunk(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let (input_ids, attention_mask) = tokenize_batch(&self.tokenizer, texts, self.max_len, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self.model.forward(&input_ids, &attention_mask, &token_type_ids, None, None, None)?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        Ok(pooled.to_device(&Device::Cpu)?.to_vec2()?)
    }
}

impl Embedder for EmbeddingModel {
    fn embedder_id(&self) -> String { self.id.clone() }
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { self.max_len }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let start = Instant::now();
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size) {
            out.extend(self.embed_chunk(chunk)?);
        }
        tracing::debug!(texts = texts.len(), elapsed_ms = start.elapsed().as_millis() as u64, "embedded batch");
        Ok(out)
    }
}

/// Locate the model directory: explicit setting, then `APP_MODEL_DIR` /
/// `MODEL_DIR`, then `models/bge-m3` relative to the working directory or
/// its parent.
pub fn resolve_model_dir(configured: Option<&Path>) -> Result<PathBuf> {
    let env_dirs = ["APP_MODEL_DIR", "MODEL_DIR"].into_iter().filter_map(|v| std::env::var(v).ok()).map(PathBuf::from);
    let candidates = configured
        .map(Path::to_path_buf)
        .into_iter()
        .chain(env_dirs)
        .chain([PathBuf::from("models/bge-m3"), PathBuf::from("../models/bge-m3")]);
    for dir in candidates {
        if dir.exists() {
            return Ok(dir);
        }
        tracing::debug!(dir = %dir.display(), "model dir candidate missing");
    }
    Err(anyhow!("Could not locate BGE-M3 model directory"))
}

/// Metal when built with the `metal` feature and a GPU is present, else CPU.
fn select_device() -> Device {
    #[cfg(feature = "metal")]
    if let Ok(dev) = Device::new_metal(0) {
        tracing::info!("embedding on Metal");
        return dev;
    }
    tracing::info!("embedding on CPU");
    Device::Cpu
}
