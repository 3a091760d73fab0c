//! Shortcut detection over flat text.
//!
//! Offsets are character offsets (not bytes). The same functions serve plain
//! form-control values and the text projection of a contenteditable tree.

use serde::{Deserialize, Serialize};

/// Characters (besides whitespace) that may sit directly before or after a shortcut.
pub const BOUNDARY_CHARS: &str = ".,;:!?()[]{}\"'`~@#$%^&*+=|\\/<>-";

/// A shortcut token located in a text, as a half-open `[start, end)` char span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortcutMatch {
    pub token: String,
    pub start: usize,
    pub end: usize,
}

impl ShortcutMatch {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

pub fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

pub fn is_token_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

pub fn is_boundary_char(c: char) -> bool {
    c.is_whitespace() || BOUNDARY_CHARS.contains(c)
}

/// Find the shortcut token ending at `cursor`.
///
/// A single whitespace character directly before the cursor is stepped over,
/// since the trigger key may already have landed in the text. The cursor must
/// not sit inside a word.
pub fn find_shortcut_at_cursor(text: &str, cursor: usize) -> Option<ShortcutMatch> {
    let chars: Vec<char> = text.chars().collect();
    find_shortcut_in_chars(&chars, cursor)
}

/// [`find_shortcut_at_cursor`] over pre-split characters.
pub fn find_shortcut_in_chars(chars: &[char], cursor: usize) -> Option<ShortcutMatch> {
    let cursor = cursor.min(chars.len());

    let mut end = cursor;
    if end > 0 && chars[end - 1].is_whitespace() {
        end -= 1;
    } else if end < chars.len() && is_token_char(chars[end]) {
        return None;
    }

    let mut start = end;
    while start > 0 && is_token_char(chars[start - 1]) {
        start -= 1;
    }

    if start == end || !is_token_start(chars[start]) {
        return None;
    }

    if start > 0 && !is_boundary_char(chars[start - 1]) {
        return None;
    }

    Some(ShortcutMatch {
        token: chars[start..end].iter().collect(),
        start,
        end,
    })
}

/// Find the last occurrence of `token` that ends at or before `limit`
/// (the whole text when `None`), with a boundary on both sides.
///
/// Comparison ignores ASCII case, since shortcuts are stored lowercase.
pub fn find_last_occurrence(text: &str, token: &str, limit: Option<usize>) -> Option<ShortcutMatch> {
    let chars: Vec<char> = text.chars().collect();
    find_last_in_chars(&chars, token, limit)
}

/// [`find_last_occurrence`] over pre-split characters.
pub fn find_last_in_chars(chars: &[char], token: &str, limit: Option<usize>) -> Option<ShortcutMatch> {
    let needle: Vec<char> = token.chars().collect();
    if needle.is_empty() || needle.len() > chars.len() {
        return None;
    }

    let limit = limit.unwrap_or(chars.len()).min(chars.len());
    if limit < needle.len() {
        return None;
    }

    let mut start = limit - needle.len();
    loop {
        if occurrence_at(chars, &needle, start) {
            let end = start + needle.len();
            return Some(ShortcutMatch {
                token: chars[start..end].iter().collect(),
                start,
                end,
            });
        }
        if start == 0 {
            return None;
        }
        start -= 1;
    }
}

/// Whether `needle` sits at `start` with boundaries on both sides, ignoring ASCII case
pub fn occurrence_at(chars: &[char], needle: &[char], start: usize) -> bool {
    bounded_at(chars, needle, start, |a, b| a.eq_ignore_ascii_case(b))
}

/// [`occurrence_at`] with the characters matching exactly
pub fn exact_occurrence_at(chars: &[char], needle: &[char], start: usize) -> bool {
    bounded_at(chars, needle, start, |a, b| a == b)
}

fn bounded_at(chars: &[char], needle: &[char], start: usize, same_char: impl Fn(&char, &char) -> bool) -> bool {
    let end = start + needle.len();
    if end > chars.len() {
        return false;
    }

    let same = chars[start..end].iter().zip(needle).all(|(a, b)| same_char(a, b));
    if !same {
        return false;
    }

    let before_ok = start == 0 || is_boundary_char(chars[start - 1]);
    let after_ok = end == chars.len() || is_boundary_char(chars[end]);
    before_ok && after_ok
}

/// Locate the last occurrence of every registered shortcut in `text`.
///
/// Spans never overlap; when two candidates collide the one closer to the end
/// of the text wins. The result is ordered by position.
pub fn find_registered_shortcuts<S: AsRef<str>>(text: &str, shortcuts: &[S]) -> Vec<ShortcutMatch> {
    let chars: Vec<char> = text.chars().collect();

    let mut candidates: Vec<ShortcutMatch> = shortcuts
        .iter()
        .filter_map(|shortcut| find_last_in_chars(&chars, shortcut.as_ref(), None))
        .collect();
    candidates.sort_by(|a, b| b.start.cmp(&a.start).then(b.end.cmp(&a.end)));

    let mut kept: Vec<ShortcutMatch> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let overlaps = kept
            .last()
            .is_some_and(|previous| candidate.end > previous.start);
        if !overlaps {
            kept.push(candidate);
        }
    }

    kept.reverse();
    kept
}
