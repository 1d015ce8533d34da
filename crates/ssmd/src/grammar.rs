//! Inline SSMD grammar.
//!
//! The scanners here are shared by the converter processors, the structured
//! parser and the span tracker so all passes agree on what counts as markup.
//! Every scanner takes `(text, from)` and returns the first token starting at
//! or after byte offset `from`.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::types::{BreakAttrs, BreakStrength, EmphasisLevel, ProsodyAttribute};

static STRONG_OR_MODERATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\*\*([^*]+)\*\*|\*([^*]+)\*").expect("invalid emphasis regex")
});

static REDUCED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_([^_]+?)_").expect("invalid reduced emphasis regex"));

static ANNOTATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\]]*)\](?:\(([^)]+)\)|\{([^}]*)\})").expect("invalid annotation regex")
});

static BREAK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\.\.\.(?:(\d+)(ms|s)?|([nwcsp]))?").expect("invalid break regex")
});

static MARK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@(\w+)").expect("invalid mark regex"));

static BLANK_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*\n").expect("invalid blank line regex"));

static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(#{1,6})[ \t]+(\S.*?)[ \t]*$").expect("invalid heading regex")
});

/// Characters that open or close prosody shorthand.
const PROSODY_CHARS: &[char] = &['~', '-', '+', '<', '>', '_', '^'];

/// Prosody shorthand markers, longest alternative first within each family.
const PROSODY_MARKERS: &[(&str, ProsodyAttribute, &str)] = &[
    ("~", ProsodyAttribute::Volume, "silent"),
    ("--", ProsodyAttribute::Volume, "x-soft"),
    ("++", ProsodyAttribute::Volume, "x-loud"),
    ("-", ProsodyAttribute::Volume, "soft"),
    ("+", ProsodyAttribute::Volume, "loud"),
    ("<<", ProsodyAttribute::Rate, "x-slow"),
    ("<", ProsodyAttribute::Rate, "slow"),
    (">>", ProsodyAttribute::Rate, "x-fast"),
    (">", ProsodyAttribute::Rate, "fast"),
    ("__", ProsodyAttribute::Pitch, "x-low"),
    ("^^", ProsodyAttribute::Pitch, "x-high"),
    ("_", ProsodyAttribute::Pitch, "low"),
    ("^", ProsodyAttribute::Pitch, "high"),
];

/// Syntax of a bracket annotation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum AnnotationForm {
    /// `[text](params)`
    Paren,
    /// `[text]{attrs}`
    Brace,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Inline {
    Emphasis(EmphasisLevel),
    Annotation {
        form: AnnotationForm,
        params: Range<usize>,
    },
    Break(BreakAttrs),
    /// Mark name is the token's inner range.
    Mark,
    Prosody {
        attribute: ProsodyAttribute,
        value: &'static str,
    },
}

/// One inline markup occurrence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Token {
    pub inline: Inline,
    /// Whole match.
    pub range: Range<usize>,
    /// Enclosed text (empty for breaks, the name for marks).
    pub inner: Range<usize>,
}

impl Token {
    /// Byte ranges that must be plain text for the match to count.
    pub fn delimiters(&self) -> Vec<Range<usize>> {
        match self.inline {
            Inline::Break(_) | Inline::Mark => vec![self.range.clone()],
            _ => vec![
                self.range.start..self.inner.start,
                self.inner.end..self.range.end,
            ],
        }
    }

    /// Marks and breaks occupy no text.
    pub fn is_zero_width(&self) -> bool {
        matches!(self.inline, Inline::Break(_) | Inline::Mark)
    }
}

/// A heading line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Heading {
    pub level: u8,
    /// Whole line without its newline.
    pub range: Range<usize>,
    /// The `#` run.
    pub marker: Range<usize>,
    /// Heading text, trimmed.
    pub inner: Range<usize>,
}

fn char_before(text: &str, pos: usize) -> Option<char> {
    text[..pos].chars().next_back()
}

fn char_at(text: &str, pos: usize) -> Option<char> {
    text[pos..].chars().next()
}

/// Offset of the character boundary after `pos`.
pub(crate) fn next_boundary(text: &str, pos: usize) -> usize {
    char_at(text, pos).map_or(text.len(), |c| pos + c.len_utf8())
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Inline markup never spans a paragraph break.
fn crosses_paragraph(text: &str, range: &Range<usize>) -> bool {
    BLANK_LINE_RE.is_match(&text[range.clone()])
}

/// `**strong**`, `*moderate*` or `_reduced_`, whichever starts first.
pub(crate) fn find_emphasis(text: &str, from: usize) -> Option<Token> {
    let stars = find_stars(text, from);
    let reduced = find_reduced(text, from);
    match (stars, reduced) {
        (Some(a), Some(b)) if b.range.start < a.range.start => Some(b),
        (Some(a), _) => Some(a),
        (None, b) => b,
    }
}

fn find_stars(text: &str, mut from: usize) -> Option<Token> {
    while from < text.len() {
        let caps = STRONG_OR_MODERATE_RE.captures_at(text, from)?;
        let range = caps.get(0)?.range();
        if crosses_paragraph(text, &range) {
            from = next_boundary(text, range.start);
            continue;
        }
        let (level, inner) = match caps.get(1) {
            Some(inner) => (EmphasisLevel::Strong, inner),
            None => (EmphasisLevel::Moderate, caps.get(2)?),
        };
        return Some(Token {
            inline: Inline::Emphasis(level),
            range,
            inner: inner.range(),
        });
    }
    None
}

fn find_reduced(text: &str, mut from: usize) -> Option<Token> {
    let blocks = |c: Option<char>| c.is_some_and(|c| c == '_' || c.is_ascii_alphanumeric());
    while from < text.len() {
        let caps = REDUCED_RE.captures_at(text, from)?;
        let range = caps.get(0)?.range();
        if blocks(char_before(text, range.start))
            || blocks(char_at(text, range.end))
            || crosses_paragraph(text, &range)
        {
            from = range.start + 1;
            continue;
        }
        return Some(Token {
            inline: Inline::Emphasis(EmphasisLevel::Reduced),
            inner: caps.get(1)?.range(),
            range,
        });
    }
    None
}

/// `[text](params)` or `[text]{attrs}`.
pub(crate) fn find_annotation(text: &str, mut from: usize) -> Option<Token> {
    while from < text.len() {
        let caps = ANNOTATION_RE.captures_at(text, from)?;
        let range = caps.get(0)?.range();
        if crosses_paragraph(text, &range) {
            from = next_boundary(text, range.start);
            continue;
        }
        let (form, params) = match (caps.get(2), caps.get(3)) {
            (Some(params), _) => (AnnotationForm::Paren, params.range()),
            (None, Some(attrs)) => (AnnotationForm::Brace, attrs.range()),
            (None, None) => return None,
        };
        return Some(Token {
            inline: Inline::Annotation { form, params },
            range,
            inner: caps.get(1)?.range(),
        });
    }
    None
}

/// `...` with an optional time or strength modifier.
///
/// A modifier glued to following word characters is not a modifier, so
/// `...so` is a bare break followed by `so`.
pub(crate) fn find_break(text: &str, from: usize) -> Option<Token> {
    let caps = BREAK_RE.captures_at(text, from)?;
    let whole = caps.get(0)?.range();
    let glued = whole.len() > 3 && char_at(text, whole.end).is_some_and(char::is_alphanumeric);

    let attrs = if glued {
        None
    } else if let Some(digits) = caps.get(1) {
        Some(match caps.get(2) {
            Some(unit) => BreakAttrs::Time(format!("{}{}", digits.as_str(), unit.as_str())),
            None if digits.as_str() == "0" => BreakAttrs::Strength(BreakStrength::None),
            None => BreakAttrs::Time(format!("{}ms", digits.as_str())),
        })
    } else {
        caps.get(3)
            .and_then(|m| m.as_str().chars().next())
            .and_then(BreakStrength::from_marker)
            .map(BreakAttrs::Strength)
    };

    let (range, attrs) = match attrs {
        Some(attrs) => (whole, attrs),
        None => (
            whole.start..whole.start + 3,
            BreakAttrs::Time("1000ms".to_owned()),
        ),
    };
    Some(Token {
        inline: Inline::Break(attrs),
        inner: range.end..range.end,
        range,
    })
}

/// `@name`, not preceded by a word character and not an `@voice` directive.
pub(crate) fn find_mark(text: &str, mut from: usize) -> Option<Token> {
    while from < text.len() {
        let caps = MARK_RE.captures_at(text, from)?;
        let range = caps.get(0)?.range();
        let name = caps.get(1)?;
        let directive =
            name.as_str() == "voice" && matches!(char_at(text, range.end), Some(':' | '('));
        if directive || char_before(text, range.start).is_some_and(is_word_char) {
            from = range.start + 1;
            continue;
        }
        return Some(Token {
            inline: Inline::Mark,
            inner: name.range(),
            range,
        });
    }
    None
}

/// Prosody shorthand such as `++loud++` or `<<slow<<`.
///
/// Markers are not adjacent to alphanumerics, and the enclosed text contains
/// no marker character, no newline, and no leading or trailing whitespace.
pub(crate) fn find_prosody(text: &str, from: usize) -> Option<Token> {
    for (pos, c) in text[from..].char_indices() {
        let pos = from + pos;
        if !PROSODY_CHARS.contains(&c) || char_before(text, pos).is_some_and(char::is_alphanumeric)
        {
            continue;
        }
        for &(marker, attribute, value) in PROSODY_MARKERS {
            if let Some(token) = prosody_at(text, pos, marker)
                .map(|(range, inner)| Token {
                    inline: Inline::Prosody { attribute, value },
                    range,
                    inner,
                })
            {
                return Some(token);
            }
        }
    }
    None
}

fn prosody_at(text: &str, pos: usize, marker: &str) -> Option<(Range<usize>, Range<usize>)> {
    if !text[pos..].starts_with(marker) {
        return None;
    }
    let start = pos + marker.len();
    let end = start + text[start..].find(PROSODY_CHARS)?;
    let content = &text[start..end];
    if content.is_empty()
        || content.contains('\n')
        || content.starts_with(char::is_whitespace)
        || content.ends_with(char::is_whitespace)
        || !text[end..].starts_with(marker)
    {
        return None;
    }
    let close = end + marker.len();
    if char_at(text, close).is_some_and(char::is_alphanumeric) {
        return None;
    }
    Some((pos..close, start..end))
}

/// `#` to `######` followed by whitespace and text, at the start of a line.
pub(crate) fn find_heading(text: &str, from: usize) -> Option<Heading> {
    let caps = HEADING_RE.captures_at(text, from)?;
    let marker = caps.get(1)?;
    Some(Heading {
        level: u8::try_from(marker.len()).ok()?,
        range: caps.get(0)?.range(),
        marker: marker.range(),
        inner: caps.get(2)?.range(),
    })
}

/// Parse a heading line on its own.
pub(crate) fn parse_heading(line: &str) -> Option<Heading> {
    find_heading(line, 0).filter(|heading| heading.range.start == 0 && heading.range.end == line.len())
}

type Finder = fn(&str, usize) -> Option<Token>;

/// Finders in tie-break priority order.
const FINDERS: [Finder; 5] = [
    find_emphasis,
    find_annotation,
    find_break,
    find_mark,
    find_prosody,
];

/// Non-overlapping inline tokens in source order.
///
/// At each step the earliest match wins; ties go to emphasis, then
/// annotations, breaks, marks and prosody shorthand.
pub(crate) struct Tokens<'t> {
    text: &'t str,
    pos: usize,
    /// Next match per finder; `None` once a finder is exhausted.
    pending: [Option<Token>; 5],
    fresh: [bool; 5],
}

impl<'t> Tokens<'t> {
    pub fn new(text: &'t str) -> Self {
        Self {
            text,
            pos: 0,
            pending: Default::default(),
            fresh: [false; 5],
        }
    }
}

impl Iterator for Tokens<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let mut best: Option<usize> = None;
        for (i, finder) in FINDERS.iter().enumerate() {
            let stale = match &self.pending[i] {
                Some(token) => token.range.start < self.pos,
                None => !self.fresh[i],
            };
            if stale {
                self.pending[i] = finder(self.text, self.pos);
                self.fresh[i] = true;
            }
            if let Some(token) = &self.pending[i] {
                let better = best.is_none_or(|b| {
                    self.pending[b]
                        .as_ref()
                        .is_none_or(|current| token.range.start < current.range.start)
                });
                if better {
                    best = Some(i);
                }
            }
        }
        let token = self.pending[best?].take()?;
        self.fresh[best?] = false;
        self.pos = if token.range.is_empty() {
            next_boundary(self.text, token.range.end)
        } else {
            token.range.end
        };
        Some(token)
    }
}
