// FILE: crates/library/src/extract.rs
//! Best-guess author/series/title extraction from folder and file names
//!
//! Everything here is heuristic and total: no input panics or errors, and a
//! name that matches nothing yields empty fields. Recognized shapes:
//!
//! - `Author - Series - Title`, `Author - Title`, `Title`
//! - a series segment with a number: `Mistborn 01`, `Mistborn #1`, `Mistborn, Book 1`
//! - a trailing part number: `Title - 03`, `Title - Part 3`
//! - noise in brackets such as `[Unabridged]`, `(2019)`, `(64kbps)`

use regex::Regex;
use std::sync::LazyLock;

macro_rules! static_regex {
    ($name:ident, $re:expr) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($re).unwrap());
    };
}

static_regex!(AUDIO_EXTENSION, r"(?i)\.(mp3|m4b|m4a|flac)$");
static_regex!(
    BRACKET_NOISE,
    r"(?i)[\[\(\{][^\]\)\}]*?(unabridged|abridged|retail|audiobook|mp3|m4b|aac|flac|\d+\s*k(bps)?|\b(19|20)\d{2}\b)[^\]\)\}]*[\]\)\}]"
);
static_regex!(LEADING_TRACK, r"^\d{1,3}\s*(?:[-.]\s*|\s+)(?P<rest>\D.*)$");
static_regex!(
    TRAILING_PART,
    r"(?i)^(?P<rest>.+?)\s+-\s+(?:(?:part|pt|disc|cd|track|chapter|ch)\.?\s*)?(?P<num>\d{1,3}(?:\.\d+)?)$"
);
static_regex!(
    SERIES_BOOK,
    r"(?i)^(?P<series>.+?),?\s+(?:book|bk\.?|vol\.?|volume|part|no\.?)\s*(?P<num>\d+(?:\.\d+)?)$"
);
static_regex!(SERIES_HASH, r"^(?P<series>.+?)\s*#\s*(?P<num>\d+(?:\.\d+)?)$");
static_regex!(SERIES_NUMBER, r"^(?P<series>.*\D)\s+(?P<num>\d{1,3}(?:\.\d+)?)$");

/// Best-guess name parts; empty strings when nothing was recognized
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NameGuess {
    pub author: String,
    pub series: String,
    pub title: String,
    pub series_part: Option<f32>,
}

impl NameGuess {
    pub fn is_empty(&self) -> bool {
        self.author.is_empty() && self.series.is_empty() && self.title.is_empty()
    }
}

/// Extracts a guess from a folder name or file name
pub fn extract_guess(raw: &str) -> NameGuess {
    let cleaned = clean(raw);
    let mut guess = NameGuess::default();
    if cleaned.is_empty() {
        return guess;
    }

    let mut body = cleaned.as_str();
    if let Some(caps) = LEADING_TRACK.captures(body) {
        if let Some(rest) = caps.name("rest") {
            body = rest.as_str();
        }
    }

    let mut trailing_part = None;
    let without_part;
    if let Some(caps) = TRAILING_PART.captures(body) {
        trailing_part = caps.name("num").and_then(|m| m.as_str().parse::<f32>().ok());
        without_part = caps.name("rest").map(|m| m.as_str().to_string());
        if let Some(rest) = &without_part {
            body = rest.as_str();
        }
    }

    let segments: Vec<&str> = body
        .split(" - ")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    match segments.as_slice() {
        [] => {}
        [title] => guess.title = title.to_string(),
        [author, title] => {
            guess.author = author.to_string();
            guess.title = title.to_string();
        }
        [author, series, rest @ ..] => {
            guess.author = author.to_string();
            guess.title = rest.join(" - ");
            let (name, part) = split_series(series, true);
            guess.series = name;
            guess.series_part = part;
        }
    }

    if guess.series.is_empty() {
        let (name, part) = split_series(&guess.title, false);
        if part.is_some() {
            guess.series = name;
            guess.series_part = part;
        }
    }

    if guess.series_part.is_none() {
        guess.series_part = trailing_part;
    }

    guess
}

/// Normalized filename stem used for similarity grouping
///
/// Lower-cased, extension dropped, separators turned into spaces, and
/// track/part numbering removed so that `BookA - 01.mp3` and `BookA - 02.mp3`
/// reduce to the same stem.
pub fn grouping_stem(file_name: &str) -> String {
    let without_ext = AUDIO_EXTENSION.replace(file_name, "");
    let lowered = without_ext.to_lowercase();

    lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty() && !is_numbering(token))
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_numbering(token: &str) -> bool {
    const MARKERS: &[&str] = &["part", "pt", "cd", "disc", "disk", "track", "chapter", "ch"];

    if token.chars().all(|c| c.is_ascii_digit()) {
        return true;
    }
    MARKERS.iter().any(|marker| {
        token
            .strip_prefix(marker)
            .is_some_and(|rest| rest.is_empty() || rest.chars().all(|c| c.is_ascii_digit()))
    })
}

fn clean(raw: &str) -> String {
    let without_ext = AUDIO_EXTENSION.replace(raw.trim(), "");
    let spaced = without_ext.replace('_', " ");
    let denoised = BRACKET_NOISE.replace_all(&spaced, " ");
    denoised
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c == '-' || c == '.' || c.is_whitespace())
        .to_string()
}

/// Splits `Series 3`, `Series #3` or `Series, Book 3`
///
/// With `bare_number` off, a plain trailing number is not treated as a part,
/// since titles like `Catch 22` are common.
fn split_series(segment: &str, bare_number: bool) -> (String, Option<f32>) {
    let mut patterns: Vec<&Regex> = vec![&*SERIES_BOOK, &*SERIES_HASH];
    if bare_number {
        patterns.push(&*SERIES_NUMBER);
    }

    for pattern in patterns {
        if let Some(caps) = pattern.captures(segment) {
            let series = caps
                .name("series")
                .map(|m| m.as_str().trim().trim_end_matches(',').trim().to_string())
                .unwrap_or_default();
            let part = caps.name("num").and_then(|m| m.as_str().parse::<f32>().ok());
            if !series.is_empty() {
                return (series, part);
            }
        }
    }
    (segment.trim().to_string(), None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guess(author: &str, series: &str, title: &str, part: Option<f32>) -> NameGuess {
        NameGuess {
            author: author.to_string(),
            series: series.to_string(),
            title: title.to_string(),
            series_part: part,
        }
    }

    #[test]
    fn test_author_series_title() {
        assert_eq!(
            extract_guess("J. Smith - Series X - Book One"),
            guess("J. Smith", "Series X", "Book One", None)
        );
        assert_eq!(
            extract_guess("Brandon Sanderson - Mistborn 01 - The Final Empire"),
            guess("Brandon Sanderson", "Mistborn", "The Final Empire", Some(1.0))
        );
        assert_eq!(
            extract_guess("Author - Saga #2.5 - Novella"),
            guess("Author", "Saga", "Novella", Some(2.5))
        );
    }

    #[test]
    fn test_author_title() {
        assert_eq!(
            extract_guess("Frank Herbert - Dune"),
            guess("Frank Herbert", "", "Dune", None)
        );
    }

    #[test]
    fn test_series_in_title() {
        assert_eq!(
            extract_guess("Book Title, Book 3"),
            guess("", "Book Title", "Book Title, Book 3", Some(3.0))
        );
        assert_eq!(
            extract_guess("Author - The Expanse Vol. 4"),
            guess("Author", "The Expanse", "The Expanse Vol. 4", Some(4.0))
        );
    }

    #[test]
    fn test_bare_number_in_title_is_not_a_part() {
        assert_eq!(extract_guess("Catch 22"), guess("", "", "Catch 22", None));
    }

    #[test]
    fn test_trailing_part() {
        assert_eq!(extract_guess("BookA - 01.mp3"), guess("", "", "BookA", Some(1.0)));
        assert_eq!(
            extract_guess("Author - Title - Part 3.m4b"),
            guess("Author", "", "Title", Some(3.0))
        );
    }

    #[test]
    fn test_noise_and_underscores() {
        assert_eq!(
            extract_guess("Frank_Herbert - Dune [Unabridged] (2019) (64kbps)"),
            guess("Frank Herbert", "", "Dune", None)
        );
    }

    #[test]
    fn test_leading_track_number() {
        assert_eq!(extract_guess("01 - Dune.mp3"), guess("", "", "Dune", None));
        assert_eq!(extract_guess("03. Chapter Three.mp3").title, "Chapter Three");
    }

    #[test]
    fn test_garbage_is_empty_not_error() {
        assert!(extract_guess("").is_empty());
        assert!(extract_guess("   ").is_empty());
        assert!(extract_guess(" - - - ").is_empty());
        assert!(extract_guess("[Unabridged]").is_empty());
        let odd = extract_guess("#### ,,, ###");
        assert!(odd.author.is_empty());
    }

    #[test]
    fn test_grouping_stem() {
        assert_eq!(grouping_stem("BookA - 01.mp3"), "booka");
        assert_eq!(grouping_stem("BookA - 02.mp3"), "booka");
        assert_eq!(grouping_stem("Dune_Part2.m4b"), "dune");
        assert_eq!(grouping_stem("Dune CD1 Track03.flac"), "dune");
        assert_eq!(grouping_stem("Unrelated.mp3"), "unrelated");
        assert_eq!(grouping_stem("07.mp3"), "");
    }
}
