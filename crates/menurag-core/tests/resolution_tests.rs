use menurag_core::aggregator::ResultAggregator;
use menurag_core::resolver::{similarity, NameResolver, ResolutionStats, DEFAULT_CUTOFF};
use menurag_core::types::{MatchKind, MatchedDish, Outcome};
use menurag_core::vocabulary::CanonicalVocabulary;

fn margherita_vocab() -> CanonicalVocabulary {
    CanonicalVocabulary::from_pairs([("Margherita", 101), ("Margherita Speciale", 102)])
}

fn matched(id: i64) -> MatchedDish {
    MatchedDish { candidate_name: format!("dish {id}"), canonical_id: Some(id), match_kind: MatchKind::Exact }
}

#[test]
fn exact_name_resolves_exactly() {
    let vocab = margherita_vocab();
    let resolver = NameResolver::new(&vocab, DEFAULT_CUTOFF);
    let m = resolver.resolve("Margherita");
    assert_eq!(m.canonical_id, Some(101));
    assert_eq!(m.match_kind, MatchKind::Exact);
}

#[test]
fn dropped_character_resolves_fuzzily_to_closest_key() {
    let vocab = margherita_vocab();
    let resolver = NameResolver::new(&vocab, DEFAULT_CUTOFF);
    let m = resolver.resolve("Margerita");
    assert_eq!(m.canonical_id, Some(101));
    match m.match_kind {
        MatchKind::Fuzzy { score } => assert!((score - 18.0 / 19.0).abs() < 1e-9),
        other => panic!("expected fuzzy match, got {other:?}"),
    }
}

#[test]
fn equal_scores_resolve_to_the_greater_key() {
    let vocab = CanonicalVocabulary::from_pairs([("abcX", 1), ("abcY", 2)]);
    assert_eq!(similarity("abc", "abcX"), similarity("abc", "abcY"));
    let m = NameResolver::new(&vocab, DEFAULT_CUTOFF).resolve("abc");
    assert_eq!(m.canonical_id, Some(2));
}

#[test]
fn cutoff_boundary_is_inclusive() {
    // 2 * 4 / (4 + 6) == 0.8 exactly.
    assert_eq!(similarity("abcd", "abcdxy"), 0.8);
    let vocab = CanonicalVocabulary::from_pairs([("abcdxy", 7)]);
    let resolver = NameResolver::new(&vocab, 0.8);
    assert_eq!(resolver.resolve("abcd").canonical_id, Some(7));

    // 2 * 4 / (4 + 7) < 0.8
    let vocab = CanonicalVocabulary::from_pairs([("abcdxyz", 7)]);
    let resolver = NameResolver::new(&vocab, 0.8);
    let m = resolver.resolve("abcd");
    assert_eq!(m.canonical_id, None);
    assert_eq!(m.match_kind, MatchKind::None);
}

#[test]
fn acceptance_is_monotonic_in_cutoff() {
    let vocab = margherita_vocab();
    let score = similarity("Margerita", "Margherita");
    for cutoff in [0.5, 0.8, score] {
        assert!(NameResolver::new(&vocab, cutoff).resolve("Margerita").canonical_id.is_some());
    }
    assert!(NameResolver::new(&vocab, score + 1e-9).resolve("Margerita").canonical_id.is_none());
}

#[test]
fn unrelated_name_is_a_miss_and_counted() {
    let vocab = margherita_vocab();
    let resolver = NameResolver::new(&vocab, DEFAULT_CUTOFF);
    let mut stats = ResolutionStats::default();
    for name in ["Margherita", "Margerita", "Sushi Galattico"] {
        stats.record(&resolver.resolve(name));
    }
    assert_eq!(stats, ResolutionStats { exact: 1, fuzzy: 1, misses: 1 });
}

#[test]
fn aggregation_caps_at_seven_in_first_seen_order() {
    let matches: Vec<MatchedDish> = (1..=10).map(matched).collect();
    let result = ResultAggregator::default().aggregate(3, &matches);
    assert_eq!(result.outcome, Outcome::Matched(vec![1, 2, 3, 4, 5, 6, 7]));
    assert_eq!(result.render("1"), "1,2,3,4,5,6,7");
}

#[test]
fn aggregation_deduplicates_and_skips_misses() {
    let matches = vec![matched(5), MatchedDish::miss("???"), matched(9), matched(5)];
    let result = ResultAggregator::new(7).aggregate(1, &matches);
    assert_eq!(result.identifiers(), &[5, 9]);
}

#[test]
fn empty_union_falls_back_and_never_renders_empty() {
    let result = ResultAggregator::default().aggregate(4, &[MatchedDish::miss("x")]);
    assert_eq!(result.outcome, Outcome::NoMatch);
    assert_eq!(result.render("1"), "1");
    assert!(!result.render("1").is_empty());
}

#[test]
fn single_match_is_reported_as_itself() {
    let result = ResultAggregator::default().aggregate(2, &[matched(42)]);
    assert_eq!(result.outcome, Outcome::Matched(vec![42]));
    assert_eq!(result.render("1"), "42");
}
