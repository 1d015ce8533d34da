//! Sentence boundary detection.
//!
//! The parser hands each paragraph to a [`SentenceSplitter`] after replacing
//! bracket annotations with single placeholder characters, so punctuation
//! inside `[Mr. Smith](sub: ...)` never ends a sentence.

use std::ops::Range;

use crate::grammar::find_annotation;

/// First placeholder character; the i-th annotation becomes `U+F100 + i`.
const PLACEHOLDER_BASE: u32 = 0xF100;

/// Last private-use code point available for placeholders.
const PLACEHOLDER_LAST: u32 = 0xF8FF;

/// Splits text into sentences.
///
/// Implementations return byte ranges into `text`, in order and
/// non-overlapping. Ranges may include surrounding whitespace; callers trim.
pub trait SentenceSplitter: Send + Sync {
    fn split(&self, text: &str, language: &str) -> Vec<Range<usize>>;
}

/// Splits after `.`, `!` or `?` (and any closing quotes or brackets) followed
/// by whitespace.
#[derive(Clone, Copy, Debug, Default)]
pub struct PunctuationSplitter;

const TERMINATORS: &[char] = &['.', '!', '?'];
const CLOSERS: &[char] = &['"', '\'', ')', ']', '\u{201D}', '\u{2019}'];

impl SentenceSplitter for PunctuationSplitter {
    fn split(&self, text: &str, _language: &str) -> Vec<Range<usize>> {
        let mut ranges = Vec::new();
        let mut start = 0;
        let mut chars = text.char_indices().peekable();

        while let Some((_, c)) = chars.next() {
            if !TERMINATORS.contains(&c) {
                continue;
            }
            while let Some(&(_, next)) = chars.peek() {
                if TERMINATORS.contains(&next) || CLOSERS.contains(&next) {
                    chars.next();
                } else {
                    break;
                }
            }
            match chars.peek() {
                Some(&(end, next)) if next.is_whitespace() => {
                    ranges.push(start..end);
                    start = end;
                }
                _ => {}
            }
        }
        if start < text.len() {
            ranges.push(start..text.len());
        }
        ranges
    }
}

/// `text` with bracket annotations swapped for placeholder characters.
struct Masked {
    text: String,
    /// `(masked offset, source range)` per placeholder, in order.
    placeholders: Vec<(usize, Range<usize>)>,
}

impl Masked {
    fn new(source: &str) -> Self {
        let mut text = String::with_capacity(source.len());
        let mut placeholders = Vec::new();
        let mut copied = 0;
        let mut pos = 0;

        while let Some(token) = find_annotation(source, pos) {
            let Some(placeholder) = u32::try_from(placeholders.len())
                .ok()
                .map(|i| PLACEHOLDER_BASE + i)
                .filter(|&code| code <= PLACEHOLDER_LAST)
                .and_then(char::from_u32)
            else {
                tracing::debug!(count = placeholders.len(), "Placeholder range exhausted");
                break;
            };
            text.push_str(&source[copied..token.range.start]);
            placeholders.push((text.len(), token.range.clone()));
            text.push(placeholder);
            copied = token.range.end;
            pos = token.range.end;
        }
        text.push_str(&source[copied..]);
        Self { text, placeholders }
    }

    /// Map an offset in the masked text back to the source.
    fn to_source(&self, offset: usize) -> usize {
        let mut shift = 0isize;
        for (masked_at, source_range) in &self.placeholders {
            if *masked_at >= offset {
                break;
            }
            let width = source_range.len().cast_signed();
            shift += width - 3;
        }
        offset.saturating_add_signed(shift)
    }
}

/// Sentence ranges of `text`, trimmed and non-empty, as byte ranges of `text`.
pub(crate) fn split_sentences(
    splitter: &dyn SentenceSplitter,
    text: &str,
    language: &str,
) -> Vec<Range<usize>> {
    let masked = Masked::new(text);
    splitter
        .split(&masked.text, language)
        .into_iter()
        .filter(|range| {
            range.start <= range.end
                && masked.text.is_char_boundary(range.start)
                && masked.text.is_char_boundary(range.end)
                && range.end <= masked.text.len()
        })
        .map(|range| masked.to_source(range.start)..masked.to_source(range.end))
        .filter_map(|range| trimmed(text, range))
        .collect()
}

/// `range` without leading and trailing whitespace, or `None` if blank.
pub(crate) fn trimmed(text: &str, range: Range<usize>) -> Option<Range<usize>> {
    let slice = &text[range.clone()];
    let start = range.start + (slice.len() - slice.trim_start().len());
    let end = range.start + slice.trim_end().len();
    (start < end).then_some(start..end)
}
