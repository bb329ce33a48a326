//! Finds a meeting time mentioned in free text.

use chrono::{DateTime, FixedOffset};
use interim::{Dialect, parse_date_string};

/// Resolves the first date/time phrase in `text` relative to `now`.
pub trait TimeRecognizer {
    fn recognize(&self, text: &str, now: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>>;
}

/// Longest run of words tried as a single expression.
const MAX_PHRASE_WORDS: usize = 4;

/// Connectives skipped while scanning, so "tomorrow at 3pm" is read as
/// "tomorrow 3pm".
const FILLER_WORDS: &[&str] = &["at", "on", "by", "around", "@"];

/// English date/time expressions, parsed by `interim`.
///
/// `interim` reads a whole string as one expression, so the text is scanned
/// word by word: at each position the longest run of words that parses
/// wins, and the earliest position with any match is returned. Numeric
/// dates are read month first. Past results are returned as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhraseRecognizer;

impl TimeRecognizer for PhraseRecognizer {
    fn recognize(&self, text: &str, now: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
        first_expression(text, |phrase| {
            parse_date_string(phrase, now, Dialect::Us).ok()
        })
    }
}

fn first_expression<T>(text: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
    let words = words(text);
    (0..words.len()).find_map(|start| {
        let longest = (start + MAX_PHRASE_WORDS).min(words.len());
        (start + 1..=longest)
            .rev()
            .find_map(|end| parse(&words[start..end].join(" ")))
    })
}

fn words(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| matches!(c, ',' | '.' | '?' | '!' | ';' | ':' | '(' | ')' | '"' | '\'')))
        .filter(|w| !w.is_empty())
        .filter(|w| !FILLER_WORDS.iter().any(|f| w.eq_ignore_ascii_case(f)))
        .collect()
}
