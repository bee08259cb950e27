use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

use menurag_cli::logging::init_tracing;
use menurag_core::config::Config;
use menurag_pipeline::load_units;
use menurag_pipeline::setup::{default_embedder, semantic_index};

/// Build (or refresh) the persisted semantic index over the menu corpus.
#[derive(Parser)]
#[command(name = "menurag-indexer")]
struct Args {
    /// Menu text directory; defaults to `data.menu_dir`
    data_dir: Option<PathBuf>,

    /// Index directory; defaults to `data.index_dir`
    #[arg(long)]
    index_dir: Option<PathBuf>,

    /// Only index the first N files (sorted by path)
    #[arg(long)]
    limit: Option<usize>,

    /// Discard any existing artifact before building
    #[arg(long)]
    force: bool,

    /// Use the hashing embedder instead of the local model
    #[arg(long)]
    fake_embeddings: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    let mut settings = Config::load()?.settings()?;
    if let Some(dir) = args.data_dir {
        settings.data.menu_dir = dir;
    }
    if let Some(dir) = args.index_dir {
        settings.data.index_dir = dir;
    }
    settings.embedding.use_fake |= args.fake_embeddings;

    let index_dir = settings.data.index_dir.clone();
    if args.force && index_dir.exists() {
        tracing::info!(dir = %index_dir.display(), "removing existing index");
        std::fs::remove_dir_all(&index_dir).with_context(|| format!("remove {}", index_dir.display()))?;
    }

    let units = load_units(&settings, args.limit).context("load corpus")?;
    if units.is_empty() {
        tracing::warn!(dir = %settings.data.menu_dir.display(), "corpus is empty");
    }
    let embedder = default_embedder(&settings)?;
    let index = semantic_index(&settings, &index_dir, units, embedder).await.context("build semantic index")?;

    let manifest = index.manifest();
    println!("Index ready at {}", index_dir.display());
    println!("  units:       {}", manifest.unit_count);
    println!("  embedder:    {} (dim {})", manifest.embedder_id, manifest.dim);
    println!("  fingerprint: {}", manifest.corpus_fingerprint);
    println!("  built at:    {}", manifest.built_at.to_rfc3339());
    Ok(())
}
