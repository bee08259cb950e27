use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;

use menurag_answer::OpenAiClient;
use menurag_cli::csv_io::{read_questions, read_result_table, write_results};
use menurag_cli::logging::init_tracing;
use menurag_core::config::{Config, RetrievalStrategy, Settings};
use menurag_core::metrics::evaluate;
use menurag_core::resolver::ResolutionStats;
use menurag_core::types::Query;
use menurag_pipeline::{pipeline_from_settings, QueryPipeline};

#[derive(Parser)]
#[command(name = "menurag")]
#[command(about = "Answer dish questions over a corpus of restaurant menus")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Strategy {
    Semantic,
    BatchScan,
}

impl From<Strategy> for RetrievalStrategy {
    fn from(s: Strategy) -> Self {
        match s {
            Strategy::Semantic => RetrievalStrategy::Semantic,
            Strategy::BatchScan => RetrievalStrategy::BatchScan,
        }
    }
}

#[derive(clap::Args)]
struct RunOpts {
    /// Retrieval strategy; defaults to `retrieval.strategy`
    #[arg(long, value_enum)]
    strategy: Option<Strategy>,

    /// Only load the first N menu files (batch scan; the semantic index is
    /// fixed by the indexer)
    #[arg(long)]
    limit: Option<usize>,

    /// Use the hashing embedder instead of the local model
    #[arg(long)]
    fake_embeddings: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer every question in a CSV and write `row_id,result`
    Answer {
        #[arg(long)]
        questions: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
        /// Questions in flight at once
        #[arg(long)]
        concurrency: Option<usize>,
        #[command(flatten)]
        run: RunOpts,
    },

    /// Answer a single question and print the ids
    Ask {
        question: String,
        #[command(flatten)]
        run: RunOpts,
    },

    /// Score a result file against ground truth (mean Jaccard)
    Score {
        #[arg(long)]
        predicted: PathBuf,
        #[arg(long)]
        expected: PathBuf,
    },
}

fn apply(settings: &mut Settings, run: &RunOpts) {
    if let Some(strategy) = run.strategy {
        settings.retrieval.strategy = strategy.into();
    }
    settings.embedding.use_fake |= run.fake_embeddings;
}

async fn pipeline(settings: &Settings, run: &RunOpts) -> anyhow::Result<QueryPipeline> {
    let generator = Arc::new(OpenAiClient::from_settings(&settings.generation)?);
    tracing::info!(model = generator.model(), strategy = ?settings.retrieval.strategy, "starting pipeline");
    Ok(pipeline_from_settings(settings, generator, run.limit).await?)
}

async fn answer(settings: Settings, run: RunOpts) -> anyhow::Result<()> {
    let questions_path = &settings.data.questions_path;
    let queries = read_questions(questions_path).with_context(|| format!("read questions {}", questions_path.display()))?;
    tracing::info!(questions = queries.len(), "loaded questions");
    let pipeline = pipeline(&settings, &run).await?;

    let pb = ProgressBar::new(queries.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} questions ({eta}) {msg}")?
            .progress_chars("#>-"),
    );
    let mut results = Vec::with_capacity(queries.len());
    let mut stats = ResolutionStats::default();
    let mut failed_calls = 0usize;
    let mut reports = std::pin::pin!(pipeline.answer_stream(&queries));
    while let Some(report) = reports.next().await {
        let report = report?;
        stats.merge(&report.stats);
        failed_calls += report.failed_calls;
        pb.set_message(format!("row {}", report.result.row_id));
        pb.inc(1);
        results.push(report.result);
    }
    pb.finish_with_message("done");

    let fallback = &settings.aggregator.fallback_token;
    write_results(&settings.data.output_path, &results, fallback)?;
    let unmatched = results.iter().filter(|r| r.identifiers().is_empty()).count();
    println!("Wrote {} rows to {}", results.len(), settings.data.output_path.display());
    println!(
        "  resolved: {} exact, {} fuzzy, {} misses; {} rows without a match; {} failed calls",
        stats.exact, stats.fuzzy, stats.misses, unmatched, failed_calls
    );
    Ok(())
}

async fn ask(settings: Settings, question: String, run: RunOpts) -> anyhow::Result<()> {
    let pipeline = pipeline(&settings, &run).await?;
    let report = pipeline.answer(&Query { row_id: 1, text: question }).await?;
    println!("{}", report.result.render(&settings.aggregator.fallback_token));
    Ok(())
}

fn score(predicted: PathBuf, expected: PathBuf) -> anyhow::Result<()> {
    let predicted = read_result_table(&predicted).with_context(|| format!("read {}", predicted.display()))?;
    let expected = read_result_table(&expected).with_context(|| format!("read {}", expected.display()))?;
    let eval = evaluate(&predicted, &expected);
    println!("Questions:      {}", eval.questions);
    println!("Mean Jaccard:   {:.4}", eval.mean_score);
    println!("Perfect (1.0):  {}", eval.perfect);
    println!("Zero (0.0):     {}", eval.zero);
    if !eval.missing_rows.is_empty() {
        println!("Missing rows:   {:?}", eval.missing_rows);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let load_settings = || -> anyhow::Result<Settings> { Config::load()?.settings() };
    match cli.command {
        Commands::Answer { questions, output, concurrency, run } => {
            let mut settings = load_settings()?;
            apply(&mut settings, &run);
            if let Some(path) = questions {
                settings.data.questions_path = path;
            }
            if let Some(path) = output {
                settings.data.output_path = path;
            }
            if let Some(n) = concurrency {
                settings.pipeline.query_concurrency = n.max(1);
            }
            answer(settings, run).await
        }
        Commands::Ask { question, run } => {
            let mut settings = load_settings()?;
            apply(&mut settings, &run);
            ask(settings, question, run).await
        }
        Commands::Score { predicted, expected } => score(predicted, expected),
    }
}
