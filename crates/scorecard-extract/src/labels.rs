// Label-line scanning over the rendered body text.
//
// The detail fields (developer, publisher, release date, genres, player
// count) sit in markup too irregular for tag lookups, but the rendered
// text is stable: a fixed label line followed by the value line(s).
// Everything here is a pure function over the line list with an explicit
// "label not found" outcome, so callers can tell a missing field from a
// malformed page.

use scraper::{Html, Selector};
use unicode_normalization::UnicodeNormalization;

/// The rendered body text as trimmed, non-empty, NFC-normalized lines.
pub fn body_lines(doc: &Html) -> Vec<String> {
    let body_sel = Selector::parse("body").expect("valid selector");
    let Some(body) = doc.select(&body_sel).next() else {
        return Vec::new();
    };

    let text: String = body.text().collect();
    text.lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .map(|line| line.nfc().collect())
        .collect()
}

/// The line directly after an exact label line.
pub fn value_after<'a>(lines: &'a [String], label: &str) -> Option<&'a str> {
    let i = lines.iter().position(|l| l == label)?;
    lines.get(i + 1).map(String::as_str)
}

/// All lines between a start label and an end label, concatenated.
///
/// The publisher can span several lines (co-publishers, regional names)
/// and runs until the next known label.
pub fn join_between(lines: &[String], start_label: &str, end_label: &str) -> Option<String> {
    let i = lines.iter().position(|l| l == start_label)?;
    let j = lines.iter().position(|l| l == end_label)?;
    if j <= i {
        return None;
    }
    Some(lines[i + 1..j].join(""))
}

/// Genre tokens from the "Genre(s):" line.
///
/// The site renders the genre list in one line with run-together spacing
/// ("Role-Playing,  PC-style  RPG"); stripping every space yields clean
/// comma-separated tokens.
pub fn genres(lines: &[String]) -> Vec<String> {
    let Some(line) = lines.iter().find(|l| l.starts_with("Genre(s):")) else {
        return Vec::new();
    };
    line.trim_start_matches("Genre(s):")
        .replace(' ', "")
        .split(',')
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}
