use std::fs;
use std::io::Write;
use tempfile::TempDir;

use menurag_core::chunker::{ChunkingConfig, DocumentChunker};
use menurag_core::corpus::{load_documents, UnitTable};
use menurag_core::error::Error;
use menurag_core::types::{Document, Unit};
use menurag_core::vocabulary::CanonicalVocabulary;

fn chunker(unit_size: usize, overlap: usize) -> DocumentChunker {
    DocumentChunker::new(ChunkingConfig { unit_size, overlap }).expect("chunker")
}

#[test]
fn load_documents_single_small_file() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    let mut f = fs::File::create(dir.join("trattoria.txt")).unwrap();
    writeln!(f, "Pizza Margherita").unwrap();

    let docs = load_documents(dir, None).expect("load");

    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].source_id, "trattoria");
    assert_eq!(docs[0].raw_text.trim(), "Pizza Margherita");
}

#[test]
fn load_documents_sorted_and_limited() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::write(dir.join("b.txt"), "charlie delta").unwrap();
    fs::write(dir.join("a.txt"), "alpha bravo").unwrap();
    fs::write(dir.join("notes.md"), "ignored").unwrap();

    let all = load_documents(dir, None).expect("load");
    assert_eq!(all.iter().map(|d| d.source_id.as_str()).collect::<Vec<_>>(), vec!["a", "b"]);

    let limited = load_documents(dir, Some(1)).expect("load limited");
    assert_eq!(limited.len(), 1, "limited to one source document");
    assert_eq!(limited[0].source_id, "a");
}

#[test]
fn load_documents_empty_dir_is_not_an_error() {
    let tmp = TempDir::new().unwrap();
    assert!(load_documents(tmp.path(), None).unwrap().is_empty());
}

#[test]
fn load_documents_missing_dir_is_not_found() {
    let tmp = TempDir::new().unwrap();
    let err = load_documents(&tmp.path().join("absent"), None).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)), "{err}");
}

#[test]
fn degenerate_chunking_is_rejected() {
    for (unit_size, overlap) in [(10, 10), (5, 9), (0, 0)] {
        let err = DocumentChunker::new(ChunkingConfig { unit_size, overlap }).unwrap_err();
        assert!(matches!(err, Error::Chunking(_)), "{unit_size}/{overlap} -> {err}");
    }
}

#[test]
fn chunker_windows_and_sequence_indices() {
    let c = chunker(4, 1);
    let doc = Document { source_id: "m".into(), raw_text: "abcdefghij".into() };
    let units = c.chunk_document(&doc, 10);
    let texts: Vec<&str> = units.iter().map(|u| u.text.as_str()).collect();
    assert_eq!(texts, vec!["abcd", "defg", "ghij"]);
    assert_eq!(units.iter().map(|u| u.unit_id).collect::<Vec<_>>(), vec![10, 11, 12]);
    assert_eq!(units.iter().map(|u| u.sequence_index).collect::<Vec<_>>(), vec![0, 1, 2]);
}

#[test]
fn chunker_handles_multibyte_text() {
    let c = chunker(3, 1);
    let pieces = c.split("pàstà già");
    assert_eq!(pieces[0], "pàs");
    assert_eq!(pieces[1], "stà");
    assert!(pieces.iter().all(|p| p.chars().count() <= 3));
}

#[test]
fn chunker_short_and_empty_text() {
    let c = chunker(900, 200);
    assert!(c.split("").is_empty());
    assert_eq!(c.split("Tiramisu"), vec!["Tiramisu".to_string()]);
}

#[test]
fn unit_table_neighbors_stay_within_source() {
    let c = chunker(4, 1);
    let docs = vec![
        Document { source_id: "a".into(), raw_text: "abcdefg".into() },
        Document { source_id: "b".into(), raw_text: "hijklmn".into() },
    ];
    let table = UnitTable::from_documents(&docs, &c);
    assert_eq!(table.len(), 4);
    let last_a = table.get(1).unwrap();
    let first_b = table.get(2).unwrap();
    assert_eq!(last_a.source_id, "a");
    assert_eq!(first_b.source_id, "b");
    assert!(table.neighbor(last_a, 1).is_none(), "no cross-source neighbour");
    assert!(table.neighbor(first_b, -1).is_none());
    assert_eq!(table.neighbor(last_a, -1).map(|u| u.unit_id), Some(0));
    assert!(table.neighbor(table.get(0).unwrap(), -1).is_none());
    assert_eq!(table.find("b", 1), Some(3));
    assert_eq!(table.find("b", 2), None);
}

#[test]
fn unit_table_rejects_gaps() {
    let unit = |id, seq| Unit { unit_id: id, source_id: "s".into(), sequence_index: seq, text: "x".into() };
    assert!(UnitTable::from_units(vec![unit(0, 0), unit(1, 1)]).is_ok());
    assert!(matches!(UnitTable::from_units(vec![unit(0, 0), unit(2, 1)]), Err(Error::IndexLoad(_))));
    assert!(matches!(UnitTable::from_units(vec![unit(0, 0), unit(1, 2)]), Err(Error::IndexLoad(_))));
}

#[test]
fn vocabulary_loads_flat_json() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("dish_mapping.json");
    fs::write(&path, r#"{"Margherita": 101, "Margherita Speciale": 102}"#).unwrap();
    let vocab = CanonicalVocabulary::load(&path).unwrap();
    assert_eq!(vocab.len(), 2);
    assert_eq!(vocab.get("Margherita Speciale"), Some(102));
    assert_eq!(vocab.names().collect::<Vec<_>>(), vec!["Margherita", "Margherita Speciale"]);

    fs::write(&path, r#"["not", "a", "map"]"#).unwrap();
    assert!(matches!(CanonicalVocabulary::load(&path), Err(Error::Parse(_))));
    assert!(matches!(CanonicalVocabulary::load(&tmp.path().join("missing.json")), Err(Error::NotFound(_))));
}
