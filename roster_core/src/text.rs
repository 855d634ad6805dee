//! Text normalization shared by the dictionary, the matcher and the n-gram
//! generator. Every comparison in the crate goes through [`normalize`] so
//! that dictionary keys, n-grams and search queries live in the same space.

use regex::Regex;
use std::sync::OnceLock;

static ALNUM_RUN: OnceLock<Regex> = OnceLock::new();
static WORD_RUN: OnceLock<Regex> = OnceLock::new();

fn alnum_run() -> &'static Regex {
    ALNUM_RUN.get_or_init(|| Regex::new(r"[a-z0-9]+").expect("static regex"))
}

fn word_run() -> &'static Regex {
    WORD_RUN.get_or_init(|| Regex::new(r"\w+").expect("static regex"))
}

/// Normalize a string for matching: lowercase, keep `[a-z0-9]+` runs only,
/// join runs with single spaces.
///
/// Accented characters fall outside the ASCII alphanumeric scan and are
/// dropped rather than transliterated; callers that need accent folding
/// must do it before matching.
pub fn normalize(text: &str) -> String {
    let lower = text.to_lowercase();
    let parts: Vec<&str> = alnum_run().find_iter(&lower).map(|m| m.as_str()).collect();
    parts.join(" ")
}

/// Split a raw transcript into word tokens (`\w+` runs), the same shape the
/// speech engine emits when only plain text is available.
pub fn word_tokens(text: &str) -> Vec<String> {
    word_run()
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Final whitespace-delimited token of a name, or the name itself when it
/// has no spaces.
pub fn last_name(name: &str) -> &str {
    name.split_whitespace().last().unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_punctuation() {
        assert_eq!(normalize("Kylian Mbappé!"), "kylian mbapp");
        assert_eq!(normalize("  O'Neil,  JR. "), "o neil jr");
        assert_eq!(normalize("ronaldo"), "ronaldo");
    }

    #[test]
    fn test_normalize_idempotent() {
        for s in ["Lionel Messi", "  ", "N'Golo Kanté", "a1 b2-c3", ""] {
            let once = normalize(s);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("!!!"), "");
    }

    #[test]
    fn test_word_tokens() {
        assert_eq!(
            word_tokens("Messi, Ronaldo. Neymar"),
            vec!["Messi", "Ronaldo", "Neymar"]
        );
    }

    #[test]
    fn test_last_name() {
        assert_eq!(last_name("Lionel Messi"), "Messi");
        assert_eq!(last_name("Pele"), "Pele");
        assert_eq!(last_name(""), "");
    }
}
