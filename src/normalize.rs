//! Text Normalizer: flattens scraped section text into one line with uniform
//! bullets and a sentence-final mark. Pure, total and idempotent.
//!
//! List markers are only recognised at the start of an input line (after any
//! markers already stripped there), so `2) next` or `5 * 3` in running text
//! stays as written.

use once_cell::sync::Lazy;
use regex::Regex;

pub const BULLET: char = '•';

const SENTENCE_FINAL: [char; 7] = ['.', '!', '?', '。', '！', '？', '…'];
const NULL_LIKE: [&str; 4] = ["", "nan", "none", "null"];

static HORIZONTAL_SPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\S\r\n\x0B\x0C]+").expect("static regex"));
static LINE_BREAKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\r\n\x0B\x0C\u{2028}\u{2029}]+").expect("static regex"));
// A numbered marker needs a separator after it so "3.5년" is left alone.
static LEADING_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\d{1,2}[.)](?:\s|[■*·•])|[■*·•])").expect("static regex"));
static AROUND_BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*•\s*").expect("static regex"));
static BULLET_NO_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"•(\S)").expect("static regex"));
static SPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r" {2,}").expect("static regex"));

pub fn is_null_like(text: &str) -> bool {
    let lowered = text.trim().to_lowercase();
    NULL_LIKE.contains(&lowered.as_str())
}

/// Runs the cleanup pass until it stops changing the text. A pass can expose
/// a new leading marker (`1.•x` only reads as a numbered item once the bullet
/// is split off), so the fixpoint is what makes a second call a no-op.
pub fn normalize(text: &str) -> String {
    let mut current = normalize_pass(text);
    loop {
        let next = normalize_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn normalize_pass(text: &str) -> String {
    if is_null_like(text) {
        return String::new();
    }

    let lines = LINE_BREAKS
        .split(text)
        .filter_map(|line| bulleted_line(&HORIZONTAL_SPACE.replace_all(line, " ")))
        .collect::<Vec<_>>();
    let text = lines.join(" ");
    let text = AROUND_BULLET.replace_all(&text, " • ");
    let text = BULLET_NO_SPACE.replace_all(&text, "• $1");
    let text = SPACE_RUN.replace_all(&text, " ");

    let mut out = text.trim().to_string();
    if !out.is_empty() && !out.ends_with(SENTENCE_FINAL) && !out.ends_with(BULLET) {
        out.push('.');
    }
    out
}

// Strips every leading marker of one line. A line holding nothing but markers
// carries no content and is dropped.
fn bulleted_line(line: &str) -> Option<String> {
    let mut rest = line.trim();
    let mut marked = false;
    while let Some(found) = LEADING_MARKER.find(rest) {
        rest = rest[found.end()..].trim_start();
        marked = true;
    }
    if rest.is_empty() {
        None
    } else if marked {
        Some(format!("{BULLET} {rest}"))
    } else {
        Some(rest.to_string())
    }
}
