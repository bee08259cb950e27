use menurag_core::chunker::{ChunkingConfig, DocumentChunker};
use proptest::prelude::*;

fn reconstruct(pieces: &[String], overlap: usize) -> String {
    let mut out = String::new();
    for (i, piece) in pieces.iter().enumerate() {
        if i == 0 {
            out.push_str(piece);
        } else {
            out.extend(piece.chars().skip(overlap));
        }
    }
    out
}

fn sizes() -> impl Strategy<Value = (usize, usize)> {
    (1usize..60).prop_flat_map(|unit_size| (Just(unit_size), 0..unit_size))
}

proptest! {
    #[test]
    fn concatenation_without_overlap_reproduces_text(text in "\\PC{0,400}", (unit_size, overlap) in sizes()) {
        let chunker = DocumentChunker::new(ChunkingConfig { unit_size, overlap }).unwrap();
        let pieces = chunker.split(&text);
        prop_assert_eq!(reconstruct(&pieces, overlap), text);
    }

    #[test]
    fn consecutive_units_share_exactly_overlap(text in "[a-z ]{0,300}", (unit_size, overlap) in sizes()) {
        let chunker = DocumentChunker::new(ChunkingConfig { unit_size, overlap }).unwrap();
        let pieces = chunker.split(&text);
        for pair in pieces.windows(2) {
            let left: Vec<char> = pair[0].chars().collect();
            let right: Vec<char> = pair[1].chars().collect();
            prop_assert_eq!(left.len(), unit_size, "every unit but the last is full");
            prop_assert!(right.len() > overlap, "next unit extends past the shared region");
            prop_assert_eq!(&left[unit_size - overlap..], &right[..overlap]);
        }
    }

    #[test]
    fn units_never_exceed_size(text in "\\PC{0,200}", (unit_size, overlap) in sizes()) {
        let chunker = DocumentChunker::new(ChunkingConfig { unit_size, overlap }).unwrap();
        for piece in chunker.split(&text) {
            prop_assert!(!piece.is_empty());
            prop_assert!(piece.chars().count() <= unit_size);
        }
    }
}
