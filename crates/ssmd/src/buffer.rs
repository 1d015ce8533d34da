//! Rewrite buffer separating emitted SSML from source text.
//!
//! Processors never rescan their own output: markup they emit is recorded as
//! a markup zone, and later matches are accepted only when their delimiters
//! lie in text zones. Text zones hold raw (unescaped) text and are escaped
//! once, when the buffer is serialized.

use std::ops::Range;

use crate::grammar::next_boundary;
use crate::xml::escape_text;

/// Text with the byte ranges that are emitted markup.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Buffer {
    text: String,
    /// Sorted, non-overlapping markup pieces.
    markup: Vec<Range<usize>>,
}

impl Buffer {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            markup: Vec::new(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn markup_pieces(&self) -> &[Range<usize>] {
        &self.markup
    }

    /// Whether the byte at `pos` is source text.
    pub fn is_text_at(&self, pos: usize) -> bool {
        if pos >= self.text.len() {
            return false;
        }
        let index = self.markup.partition_point(|r| r.end <= pos);
        self.markup.get(index).is_none_or(|r| r.start > pos)
    }

    /// Whether every range starts and ends in a text zone.
    pub fn accepts(&self, ranges: &[Range<usize>]) -> bool {
        ranges
            .iter()
            .filter(|r| !r.is_empty())
            .all(|r| self.is_text_at(r.start) && self.is_text_at(r.end - 1))
    }

    /// Text zones within `range`, concatenated.
    pub fn text_in(&self, range: Range<usize>) -> String {
        self.zones(range)
            .filter(|(_, is_markup)| !is_markup)
            .map(|(r, _)| &self.text[r])
            .collect()
    }

    /// Whether `range` contains no markup.
    pub fn is_plain(&self, range: Range<usize>) -> bool {
        self.zones(range).all(|(_, is_markup)| !is_markup)
    }

    /// Zones intersecting `range`, clipped to it, as `(range, is_markup)`.
    pub fn zones(&self, range: Range<usize>) -> impl Iterator<Item = (Range<usize>, bool)> + '_ {
        let mut pieces = Vec::new();
        let mut pos = range.start;
        let first = self.markup.partition_point(|r| r.end <= range.start);
        for piece in &self.markup[first..] {
            if piece.start >= range.end {
                break;
            }
            let start = piece.start.max(range.start);
            if start > pos {
                pieces.push((pos..start, false));
            }
            let end = piece.end.min(range.end);
            if end > start {
                pieces.push((start..end, true));
            }
            pos = pos.max(end);
        }
        if pos < range.end {
            pieces.push((pos..range.end, false));
        }
        pieces.into_iter()
    }

    /// Serialize as SSML: markup verbatim, text escaped.
    pub fn to_ssml(&self) -> String {
        self.zones(0..self.text.len())
            .map(|(r, is_markup)| {
                if is_markup {
                    self.text[r].to_owned()
                } else {
                    escape_text(&self.text[r])
                }
            })
            .collect()
    }

    /// Text zones only.
    pub fn to_plain(&self) -> String {
        self.text_in(0..self.text.len())
    }
}

/// Builds the next [`Buffer`] in one left-to-right pass.
#[derive(Debug, Default)]
pub(crate) struct BufferBuilder {
    text: String,
    markup: Vec<Range<usize>>,
}

impl BufferBuilder {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            text: String::with_capacity(capacity),
            markup: Vec::new(),
        }
    }

    pub fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    pub fn push_markup(&mut self, markup: &str) {
        if markup.is_empty() {
            return;
        }
        let start = self.text.len();
        self.text.push_str(markup);
        self.markup.push(start..self.text.len());
    }

    /// Copy `range` of `source`, keeping its zones.
    pub fn copy(&mut self, source: &Buffer, range: Range<usize>) {
        for (zone, is_markup) in source.zones(range) {
            let piece = &source.as_str()[zone];
            if is_markup {
                self.push_markup(piece);
            } else {
                self.push_text(piece);
            }
        }
    }

    /// Remove one trailing space if it is text.
    pub fn trim_trailing_space(&mut self) -> bool {
        let in_markup = self.markup.last().is_some_and(|r| r.end == self.text.len());
        if !in_markup && self.text.ends_with(' ') {
            self.text.pop();
            return true;
        }
        false
    }

    pub fn finish(self) -> Buffer {
        Buffer {
            text: self.text,
            markup: self.markup,
        }
    }
}

/// How a processor treats its matches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Mode {
    /// Replace markup with SSML.
    Convert,
    /// Remove markup, keep text.
    Strip,
}

/// Rewrite every accepted match left to right.
///
/// `find(text, from)` returns the next candidate at or after `from` with the
/// ranges that must be text. Rejected candidates are retried one character
/// later; accepted ones are handed to `emit`, and scanning resumes after them.
/// With `zero_width` set, an emitted match in strip mode also takes one
/// adjacent space with it.
pub(crate) fn rewrite<M>(
    source: &Buffer,
    mode: Mode,
    mut find: impl FnMut(&str, usize) -> Option<(M, Range<usize>, Vec<Range<usize>>)>,
    mut emit: impl FnMut(&M, &Buffer, &mut BufferBuilder),
    zero_width: bool,
) -> Buffer {
    let text = source.as_str();
    let mut out = BufferBuilder::with_capacity(text.len());
    let mut copied = 0;
    let mut pos = 0;

    while pos < text.len() {
        let Some((found, range, delimiters)) = find(text, pos) else {
            break;
        };
        if range.start < copied || !source.accepts(&delimiters) {
            pos = next_boundary(text, range.start);
            continue;
        }
        out.copy(source, copied..range.start);
        let mut end = range.end;
        if zero_width
            && mode == Mode::Strip
            && !out.trim_trailing_space()
            && text[end..].starts_with(' ')
            && source.is_text_at(end)
        {
            end += 1;
        }
        emit(&found, source, &mut out);
        copied = end;
        pos = if end > range.start {
            end
        } else {
            next_boundary(text, range.start)
        };
    }

    out.copy(source, copied..text.len());
    out.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Buffer {
        let mut out = BufferBuilder::default();
        out.push_text("a ");
        out.push_markup("<x y=\"*\">");
        out.push_text("b & c");
        out.push_markup("</x>");
        out.finish()
    }

    #[test]
    fn test_zones_and_serialization() {
        let buffer = sample();
        assert!(buffer.is_text_at(0));
        assert!(!buffer.is_text_at(2));
        assert!(!buffer.is_text_at(7));
        assert_eq!(buffer.to_ssml(), "a <x y=\"*\">b &amp; c</x>");
        assert_eq!(buffer.to_plain(), "a b & c");
    }

    #[test]
    fn test_copy_keeps_zones() {
        let source = sample();
        let mut out = BufferBuilder::default();
        out.copy(&source, 1..source.as_str().len());
        let copied = out.finish();
        assert_eq!(copied.to_ssml(), " <x y=\"*\">b &amp; c</x>");
        assert_eq!(copied.markup_pieces().len(), 2);
    }

    #[test]
    fn test_rewrite_skips_matches_inside_markup() {
        let source = sample();
        let star = |text: &str, from: usize| {
            text[from..]
                .find('*')
                .map(|i| ((), from + i..from + i + 1, vec![from + i..from + i + 1]))
        };
        let out = rewrite(&source, Mode::Convert, star, |(), _, out| out.push_text("!"), false);
        assert_eq!(out, source);
    }

    #[test]
    fn test_rewrite_zero_width_strip_takes_one_space() {
        let source = Buffer::new("hello @m world");
        let find = |text: &str, from: usize| {
            text[from..]
                .find("@m")
                .map(|i| ((), from + i..from + i + 2, vec![from + i..from + i + 2]))
        };
        let out = rewrite(&source, Mode::Strip, find, |(), _, _| {}, true);
        assert_eq!(out.to_plain(), "hello world");
    }
}
