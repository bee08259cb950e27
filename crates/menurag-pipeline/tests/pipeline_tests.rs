use std::fs;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use menurag_core::config::{RetrievalStrategy, Settings};
use menurag_core::corpus::UnitTable;
use menurag_core::error::{Error, Result};
use menurag_core::traits::TextGenerator;
use menurag_core::types::{GenerationRequest, Outcome, Query, Unit};
use menurag_core::vocabulary::CanonicalVocabulary;
use menurag_index::IndexManifest;
use menurag_pipeline::setup::{default_embedder, semantic_index};
use menurag_pipeline::{batch_scan_retriever, build_pipeline, load_units, pipeline_from_settings};

/// Pops one scripted reply per call, in call order.
struct Scripted {
    replies: Mutex<Vec<Result<String>>>,
    calls: Mutex<usize>,
}

impl Scripted {
    fn new(mut replies: Vec<Result<String>>) -> Arc<Self> {
        replies.reverse();
        Arc::new(Self { replies: Mutex::new(replies), calls: Mutex::new(0) })
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl TextGenerator for Scripted {
    async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
        *self.calls.lock().unwrap() += 1;
        self.replies.lock().unwrap().pop().unwrap_or_else(|| Ok("none".into()))
    }
}

fn ok(s: &str) -> Result<String> {
    Ok(s.to_string())
}

fn vocabulary() -> Arc<CanonicalVocabulary> {
    Arc::new(CanonicalVocabulary::from_pairs([
        ("DishA", 1001),
        ("DishB", 1002),
        ("DishC", 1003),
        ("Margherita", 101),
        ("Margherita Speciale", 102),
    ]))
}

/// One unit per source so the batch scan puts each in its own batch.
fn three_units() -> UnitTable {
    let units = (0..3)
        .map(|i| Unit {
            unit_id: i,
            source_id: format!("menu{i}"),
            sequence_index: 0,
            text: format!("menu {i} page text"),
        })
        .collect();
    UnitTable::from_units(units).unwrap()
}

fn batch_scan_settings() -> Settings {
    let mut settings = Settings::default();
    settings.retrieval.strategy = RetrievalStrategy::BatchScan;
    settings.retrieval.max_batch_words = 4;
    settings
}

async fn run(replies: Vec<Result<String>>, query: &str) -> (menurag_pipeline::QueryReport, Arc<Scripted>) {
    let settings = batch_scan_settings();
    let generator = Scripted::new(replies);
    let retriever = batch_scan_retriever(&settings, three_units());
    let pipeline = build_pipeline(&settings, retriever, vocabulary(), generator.clone());
    let report = pipeline.answer(&Query { row_id: 7, text: query.to_string() }).await.unwrap();
    (report, generator)
}

#[tokio::test]
async fn ids_are_unioned_across_batches() {
    let (report, generator) = run(vec![ok("DishA"), ok("DishA, DishB"), ok("none")], "q").await;
    assert_eq!(generator.calls(), 3);
    assert_eq!(report.batches, 3);
    assert_eq!(report.result.outcome, Outcome::Matched(vec![1001, 1002]));
    assert_eq!(report.result.render("1"), "1001,1002");
}

#[tokio::test]
async fn failed_batch_does_not_sink_the_query() {
    let (report, _) = run(
        vec![ok("DishA"), Err(Error::ServiceCall("timeout".into())), ok("DishC")],
        "q",
    )
    .await;
    assert_eq!(report.failed_calls, 1);
    assert_eq!(report.result.outcome, Outcome::Matched(vec![1001, 1003]));
}

#[tokio::test]
async fn all_failures_still_produce_a_row() {
    let failures = (0..3).map(|_| Err(Error::ServiceCall("down".into()))).collect();
    let (report, _) = run(failures, "q").await;
    assert_eq!(report.failed_calls, 3);
    assert_eq!(report.result.outcome, Outcome::NoMatch);
    assert_eq!(report.result.render("1"), "1");
}

#[tokio::test]
async fn candidates_resolve_exactly_then_fuzzily() {
    let (report, _) = run(vec![ok("Margherita"), ok("Margerita, Unknown Dish"), ok("none")], "q").await;
    assert_eq!(report.stats.exact, 1);
    assert_eq!(report.stats.fuzzy, 1);
    assert_eq!(report.stats.misses, 1);
    assert_eq!(report.result.outcome, Outcome::Matched(vec![101]));
}

#[tokio::test]
async fn result_is_capped_at_seven() {
    let names: Vec<String> = (0..10).map(|i| format!("Dish{i:02}")).collect();
    let vocab = Arc::new(CanonicalVocabulary::from_pairs(names.iter().enumerate().map(|(i, n)| (n.clone(), i as i64 + 1))));
    let mut settings = batch_scan_settings();
    settings.extractor.max_answers = 10;
    let generator = Scripted::new(vec![ok(&names.join(", "))]);
    let retriever = batch_scan_retriever(&settings, three_units());
    let pipeline = build_pipeline(&settings, retriever, vocab, generator);

    let report = pipeline.answer(&Query { row_id: 1, text: "q".into() }).await.unwrap();
    assert_eq!(report.result.identifiers(), &[1, 2, 3, 4, 5, 6, 7]);
}

#[tokio::test]
async fn answer_all_keeps_input_order() {
    let mut settings = batch_scan_settings();
    settings.retrieval.max_batch_words = 1000;
    settings.pipeline.query_concurrency = 4;
    let generator = Scripted::new(vec![]);
    let retriever = batch_scan_retriever(&settings, three_units());
    let pipeline = build_pipeline(&settings, retriever, vocabulary(), generator);

    let queries: Vec<Query> = (1..=5).map(|i| Query { row_id: i, text: format!("q{i}") }).collect();
    let reports = pipeline.answer_all(&queries).await.unwrap();
    assert_eq!(reports.iter().map(|r| r.result.row_id).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
    assert!(reports.iter().all(|r| r.result.outcome == Outcome::NoMatch));
}

#[tokio::test]
async fn fatal_generation_error_aborts_the_query() {
    let settings = batch_scan_settings();
    let generator = Scripted::new(vec![ok("DishA"), Err(Error::InvalidConfig("no api key".into()))]);
    let pipeline = build_pipeline(&settings, batch_scan_retriever(&settings, three_units()), vocabulary(), generator);

    let err = pipeline.answer(&Query { row_id: 1, text: "q".into() }).await.unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)), "{err}");
}

/// Menu directory, vocabulary and index directory under `root`, set up for
/// the fake embedder.
fn semantic_settings(root: &std::path::Path) -> anyhow::Result<Settings> {
    let menus = root.join("menus");
    fs::create_dir_all(&menus)?;
    fs::write(menus.join("a.txt"), "Pizza Margherita with tomato, mozzarella and basil.")?;
    fs::write(menus.join("b.txt"), "Tiramisu with mascarpone and coffee.")?;
    let vocab_path = root.join("dishes.json");
    fs::write(&vocab_path, r#"{"Margherita": 101, "Tiramisu": 7}"#)?;

    let mut settings = Settings::default();
    settings.data.menu_dir = menus;
    settings.data.vocabulary_path = vocab_path;
    settings.data.index_dir = root.join("index");
    settings.embedding.use_fake = true;
    settings.embedding.fake_dim = 256;
    Ok(settings)
}

async fn build_index(settings: &Settings) -> anyhow::Result<IndexManifest> {
    let units = load_units(settings, None)?;
    let index = semantic_index(settings, &settings.data.index_dir, units, default_embedder(settings)?).await?;
    Ok(index.manifest().clone())
}

#[tokio::test]
async fn semantic_pipeline_from_settings() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let settings = semantic_settings(tmp.path())?;
    build_index(&settings).await?;

    let generator = Scripted::new(vec![ok("Tiramisu")]);
    let pipeline = pipeline_from_settings(&settings, generator.clone(), None).await?;
    let report = pipeline.answer(&Query { row_id: 3, text: "mascarpone dessert".into() }).await?;

    assert_eq!(generator.calls(), 1);
    assert_eq!(report.result.outcome, Outcome::Matched(vec![7]));
    assert_eq!(pipeline.retriever().unit_table().len(), 2);
    Ok(())
}

#[tokio::test]
async fn query_path_serves_units_without_the_corpus() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let mut settings = semantic_settings(tmp.path())?;
    let built = build_index(&settings).await?;

    settings.data.menu_dir = tmp.path().join("gone");
    let pipeline = pipeline_from_settings(&settings, Scripted::new(vec![]), Some(1)).await?;

    let units = pipeline.retriever().unit_table();
    assert_eq!(units.len(), 2);
    assert!(units.units().iter().any(|u| u.text.contains("mascarpone")));
    assert_eq!(IndexManifest::read(&settings.data.index_dir)?, built);
    Ok(())
}

#[tokio::test]
async fn query_path_does_not_build_a_missing_index() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let settings = semantic_settings(tmp.path())?;

    let err = pipeline_from_settings(&settings, Scripted::new(vec![]), None).await.err().expect("no index yet");
    assert!(matches!(err, Error::IndexLoad(_)), "{err}");
    assert!(!settings.data.index_dir.exists());
    Ok(())
}

#[tokio::test]
async fn query_path_rejects_other_embedder_and_keeps_index() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let mut settings = semantic_settings(tmp.path())?;
    let built = build_index(&settings).await?;

    settings.embedding.fake_dim = 128;
    let err = pipeline_from_settings(&settings, Scripted::new(vec![]), None).await.err().expect("dim mismatch");
    assert!(matches!(err, Error::IndexLoad(_)), "{err}");
    assert_eq!(IndexManifest::read(&settings.data.index_dir)?, built);
    Ok(())
}
