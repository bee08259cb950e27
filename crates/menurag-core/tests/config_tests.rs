use figment::providers::{Format, Serialized, Toml};
use figment::Figment;
use std::path::Path;

use menurag_core::config::{Config, RetrievalStrategy, Settings, VocabularyMode};

fn config_from(toml: &str) -> Config {
    let figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::string(toml));
    Config::from_figment(figment, Path::new("/srv/menurag"))
}

#[test]
fn defaults_are_valid() {
    let settings = config_from("").settings().expect("settings");
    assert_eq!(settings.chunking.unit_size, 900);
    assert_eq!(settings.chunking.overlap, 200);
    assert_eq!(settings.retrieval.strategy, RetrievalStrategy::Semantic);
    assert_eq!(settings.retrieval.max_batch_words, 2500);
    assert_eq!(settings.resolver.cutoff, 0.8);
    assert_eq!(settings.aggregator.max_results, 7);
    assert_eq!(settings.extractor.vocabulary_mode, VocabularyMode::Names);
}

#[test]
fn sections_override_defaults_and_paths_resolve_against_base() {
    let config = config_from(
        r#"
        [data]
        menu_dir = "menus"
        index_dir = "/var/lib/menurag"

        [retrieval]
        strategy = "batch_scan"
        max_batch_words = 1200

        [resolver]
        cutoff = 0.9
        "#,
    );
    let settings = config.settings().expect("settings");
    assert_eq!(settings.retrieval.strategy, RetrievalStrategy::BatchScan);
    assert_eq!(settings.retrieval.max_batch_words, 1200);
    assert_eq!(settings.resolver.cutoff, 0.9);
    assert_eq!(settings.data.menu_dir, Path::new("/srv/menurag/menus"));
    assert_eq!(settings.data.index_dir, Path::new("/var/lib/menurag"));
    let top_k: usize = config.get("retrieval.top_k").expect("top_k");
    assert_eq!(top_k, 10);
}

#[test]
fn degenerate_values_are_rejected() {
    for toml in [
        "[chunking]\nunit_size = 100\noverlap = 100",
        "[resolver]\ncutoff = 0.0",
        "[resolver]\ncutoff = 1.5",
        "[aggregator]\nmax_results = 0",
        "[aggregator]\nfallback_token = \" \"",
        "[pipeline]\nquery_concurrency = 0",
    ] {
        assert!(config_from(toml).settings().is_err(), "accepted: {toml}");
    }
}
