use std::collections::HashSet;

const BULLETS: &[&str] = &["- ", "* ", "• "];

/// Removes a wrapping markdown code fence, with or without a language tag.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(inner) = inner.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the info string ("```text") when the fence opens on its own line
    match inner.split_once('\n') {
        Some((tag, rest)) if !tag.trim().contains(',') => rest.trim(),
        _ => inner.trim(),
    }
}

/// Drops a leading list bullet, then surrounding whitespace and double
/// quotes. Everything else is part of the name.
fn clean_entry(part: &str) -> &str {
    let part = part.trim();
    let part = BULLETS.iter().find_map(|b| part.strip_prefix(*b)).unwrap_or(part);
    part.trim().trim_matches('"').trim()
}

/// Splits a comma- or line-separated answer into candidate names.
///
/// Entries lose a leading bullet and surrounding whitespace and quotes.
/// Empties and the sentinel (case-insensitive) are dropped, duplicates keep
/// their first position and at most `max_answers` survive.
pub fn parse_candidates(response: &str, sentinel: &str, max_answers: usize) -> Vec<String> {
    let body = strip_code_fence(response);
    let mut seen = HashSet::new();
    body.split([',', '\n'])
        .map(clean_entry)
        .filter(|part| !part.is_empty())
        .filter(|part| !part.eq_ignore_ascii_case(sentinel))
        .filter(|part| seen.insert(part.to_string()))
        .take(max_answers)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fence_with_language_tag() {
        assert_eq!(strip_code_fence("```text\nA, B\n```"), "A, B");
        assert_eq!(strip_code_fence("```A, B```"), "A, B");
        assert_eq!(strip_code_fence("A, B"), "A, B");
    }

    #[test]
    fn names_keep_their_own_punctuation() {
        assert_eq!(clean_entry("'Nduja Pizza"), "'Nduja Pizza");
        assert_eq!(clean_entry(" \"Crema Cat. 2.\" "), "Crema Cat. 2.");
        assert_eq!(clean_entry("- Pasta al-dente*"), "Pasta al-dente*");
        assert_eq!(clean_entry("-Bruschetta"), "-Bruschetta");
    }

    #[test]
    fn unterminated_fence_is_left_alone() {
        assert_eq!(strip_code_fence("```A, B"), "```A, B");
    }
}
