//! Text search over positioned characters.
//!
//! Finds literal or regex patterns in a page's character sequence and returns
//! each match with the union rectangle of its characters.

use regex::Regex;

use crate::error::PageError;
use crate::geometry::Rect;
use crate::text::Char;

/// Options controlling text search behavior.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchOptions {
    /// Interpret the pattern as a regex (default: `false`).
    pub regex: bool,
    /// Case-sensitive matching (default: `false`).
    pub case_sensitive: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            regex: false,
            case_sensitive: false,
        }
    }
}

/// A single match with its page-point rectangle.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchMatch {
    /// The matched text.
    pub text: String,
    /// Union of the constituent character boxes.
    pub rect: Rect,
    /// Indices into the searched char slice.
    pub char_indices: Vec<usize>,
}

/// Search `chars` for `pattern`.
///
/// 1. Concatenate all char texts, tracking byte offset → char index.
/// 2. Run the pattern (regex or escaped literal) over the concatenation.
/// 3. For each match, union the boxes of the contributing chars.
///
/// Matches come back in content order. An empty pattern or empty input
/// yields no matches.
///
/// # Errors
///
/// [`PageError::InvalidParameter`] if `options.regex` is set and `pattern`
/// does not compile, whether or not there is text to search.
pub fn search_chars(
    chars: &[Char],
    pattern: &str,
    options: &SearchOptions,
) -> Result<Vec<SearchMatch>, PageError> {
    if pattern.is_empty() {
        return Ok(Vec::new());
    }

    let body = if options.regex {
        pattern.to_string()
    } else {
        regex::escape(pattern)
    };
    let regex_pattern = if options.case_sensitive {
        body
    } else {
        format!("(?i){body}")
    };

    let re = Regex::new(&regex_pattern)
        .map_err(|e| PageError::invalid(format!("invalid search pattern '{pattern}': {e}")))?;
    if chars.is_empty() {
        return Ok(Vec::new());
    }

    let mut full_text = String::new();
    let mut byte_to_char_idx: Vec<usize> = Vec::new();
    for (i, ch) in chars.iter().enumerate() {
        full_text.push_str(&ch.text);
        byte_to_char_idx.resize(full_text.len(), i);
    }

    let mut results = Vec::new();
    for m in re.find_iter(&full_text) {
        let mut char_indices: Vec<usize> = Vec::new();
        for &idx in &byte_to_char_idx[m.start()..m.end()] {
            if char_indices.last() != Some(&idx) {
                char_indices.push(idx);
            }
        }
        let Some((&first, rest)) = char_indices.split_first() else {
            continue;
        };

        let rect = rest
            .iter()
            .fold(chars[first].rect, |acc, &idx| acc.union(&chars[idx].rect));

        results.push(SearchMatch {
            text: m.as_str().to_string(),
            rect,
            char_indices,
        });
    }

    Ok(results)
}
