//! Cleans raw backend output into a reply body.
//!
//! Rules run in a fixed order:
//! 1. echo stripping: keep what follows the last closing marker (and the
//!    echoed body right after it), or else what follows the literal prompt;
//! 2. first-line stripping, applied once: a marker line or a restated
//!    instruction is dropped, and a `Here is the summary:` style opener is
//!    cut through its colon;
//! 3. trim, and fall back to a fixed message when nothing usable is left.

use crate::generate::prompt::{INSTRUCTION_END, INSTRUCTION_START};

/// Phrases from our own instructions. A first line starting with one of
/// them restates the prompt and is dropped whole.
const RESTATED_INSTRUCTIONS: &[&str] = &[
    "summarize the following",
    "write a single polite",
    "reply with the bullet points only",
    "reply with the acknowledgment only",
];

/// Openers and labels a model puts before the answer. Only the
/// `<opener> ...:` form is stripped, up to and including the colon.
const ANSWER_LEAD_INS: &[&str] = &[
    "here is",
    "here's",
    "here are",
    "sure",
    "certainly",
    "of course",
    "summary",
    "acknowledgment",
    "acknowledgement",
    "response",
];

/// Text that, if still leading the output, means the backend only echoed us.
const ECHO_PREFIXES: &[&str] = &[
    INSTRUCTION_START,
    INSTRUCTION_END,
    "summarize the following",
    "write a single polite",
];

/// Apply the whole chain. The result is never empty and never echoes the
/// prompt; already-clean text comes back unchanged.
pub fn sanitize(raw: &str, prompt: &str, fallback: &str) -> String {
    let text = strip_echo(raw, prompt);
    let text = strip_leading_line(text).trim();

    if text.is_empty() || is_echo(text) {
        return fallback.to_string();
    }
    text.to_string()
}

fn strip_echo<'a>(raw: &'a str, prompt: &str) -> &'a str {
    if let Some(pos) = raw.rfind(INSTRUCTION_END) {
        let after = &raw[pos + INSTRUCTION_END.len()..];
        return strip_echoed_body(after, prompt);
    }
    if !prompt.is_empty()
        && let Some(pos) = raw.find(prompt)
    {
        return &raw[pos + prompt.len()..];
    }
    raw
}

/// The prompt's own text after its closing marker is the email body; a
/// backend that echoes the whole prompt repeats it right after the marker.
fn strip_echoed_body<'a>(after: &'a str, prompt: &str) -> &'a str {
    let Some(pos) = prompt.rfind(INSTRUCTION_END) else {
        return after;
    };
    let body = &prompt[pos + INSTRUCTION_END.len()..];
    if body.trim().is_empty() {
        return after;
    }
    if let Some(rest) = after.strip_prefix(body) {
        return rest;
    }
    after
        .trim_start()
        .strip_prefix(body.trim())
        .unwrap_or(after)
}

fn strip_leading_line(text: &str) -> &str {
    let trimmed = text.trim_start();
    let (first, remainder) = trimmed.split_once('\n').unwrap_or((trimmed, ""));
    let line = first.trim();

    if is_marker_line(line) || is_restated_instruction(line) {
        return remainder;
    }
    if is_answer_lead_in(line)
        && let Some(colon) = label_colon(first)
    {
        // "Here is the summary: X" keeps X; "Here is the summary:" goes away.
        return if first[colon + 1..].trim().is_empty() {
            remainder
        } else {
            &trimmed[colon + 1..]
        };
    }
    trimmed
}

/// The first colon that ends a label, i.e. one followed by whitespace or
/// the end of the line. The colon in `3:30` does not count.
fn label_colon(line: &str) -> Option<usize> {
    line.match_indices(':')
        .map(|(at, _)| at)
        .find(|&at| line[at + 1..].chars().next().is_none_or(char::is_whitespace))
}

fn is_marker_line(line: &str) -> bool {
    line.starts_with("[INST") || line.starts_with("[/INST")
}

fn is_restated_instruction(line: &str) -> bool {
    RESTATED_INSTRUCTIONS.iter().any(|p| starts_with_word(line, p))
}

fn is_answer_lead_in(line: &str) -> bool {
    ANSWER_LEAD_INS.iter().any(|p| starts_with_word(line, p))
}

fn is_echo(text: &str) -> bool {
    text.contains(INSTRUCTION_START) || ECHO_PREFIXES.iter().any(|p| starts_with_word(text, p))
}

/// Case-insensitive prefix match that does not split a word.
fn starts_with_word(text: &str, prefix: &str) -> bool {
    let Some(head) = text.get(..prefix.len()) else {
        return false;
    };
    if !head.eq_ignore_ascii_case(prefix) {
        return false;
    }
    let ends_in_word = prefix.chars().last().is_some_and(char::is_alphanumeric);
    !ends_in_word
        || !text[prefix.len()..]
            .chars()
            .next()
            .is_some_and(char::is_alphanumeric)
}
