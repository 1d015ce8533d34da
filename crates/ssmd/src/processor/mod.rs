//! SSMD → SSML rewrite processors.
//!
//! Each processor owns one markup family and rewrites it in a single
//! left-to-right pass over a [`Buffer`]. The pipeline order is fixed:
//! directive, emphasis, annotation, mark, prosody, heading, paragraph,
//! sentence, break.

mod annotation;
mod breaks;
mod directive;
mod emphasis;
mod heading;
mod mark;
mod paragraph;
mod prosody;
mod sentence;

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use crate::annotation::{Extensions, Registry};
use crate::buffer::{Buffer, BufferBuilder, Mode, rewrite};
use crate::capabilities::TtsCapabilities;
use crate::grammar::{Token, next_boundary};
use crate::types::HeadingLevels;

/// Processor identity, in pipeline order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ProcessorKind {
    Directive,
    Emphasis,
    Annotation,
    Mark,
    Prosody,
    Heading,
    Paragraph,
    Sentence,
    Break,
}

impl ProcessorKind {
    pub const ALL: [Self; 9] = [
        Self::Directive,
        Self::Emphasis,
        Self::Annotation,
        Self::Mark,
        Self::Prosody,
        Self::Heading,
        Self::Paragraph,
        Self::Sentence,
        Self::Break,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Directive => "directive",
            Self::Emphasis => "emphasis",
            Self::Annotation => "annotation",
            Self::Mark => "mark",
            Self::Prosody => "prosody",
            Self::Heading => "heading",
            Self::Paragraph => "paragraph",
            Self::Sentence => "sentence",
            Self::Break => "break",
        }
    }
}

impl fmt::Display for ProcessorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| format!("unknown processor '{name}'"))
    }
}

/// Shared, read-only state for one pipeline run.
pub(crate) struct Context<'a> {
    pub registry: Registry<'a>,
    pub extensions: &'a Extensions,
    pub capabilities: Option<&'a TtsCapabilities>,
    pub heading_levels: &'a HeadingLevels,
    pub auto_sentence_tags: bool,
}

/// One rewrite rule.
pub(crate) trait Processor: Send + Sync {
    fn kind(&self) -> ProcessorKind;

    /// Rewrite every match in `input`.
    fn apply(&self, input: &Buffer, mode: Mode, ctx: &Context<'_>) -> Buffer;
}

/// All processors in pipeline order.
pub(crate) fn pipeline() -> [&'static dyn Processor; 9] {
    [
        &directive::DirectiveProcessor,
        &emphasis::EmphasisProcessor,
        &annotation::AnnotationProcessor,
        &mark::MarkProcessor,
        &prosody::ProsodyProcessor,
        &heading::HeadingProcessor,
        &paragraph::ParagraphProcessor,
        &sentence::SentenceProcessor,
        &breaks::BreakProcessor,
    ]
}

/// [`rewrite`] driven by one grammar finder.
///
/// A token whose enclosed text holds only half of an element is skipped, so
/// wrapping it can never produce crossing tags.
fn rewrite_tokens(
    input: &Buffer,
    mode: Mode,
    finder: fn(&str, usize) -> Option<Token>,
    zero_width: bool,
    emit: impl FnMut(&Token, &Buffer, &mut BufferBuilder),
) -> Buffer {
    rewrite(
        input,
        mode,
        |text, mut from| loop {
            let token = finder(text, from)?;
            if token.is_zero_width() || is_balanced(input, token.inner.clone()) {
                let range = token.range.clone();
                let delimiters = token.delimiters();
                return Some((token, range, delimiters));
            }
            from = next_boundary(text, token.range.start);
        },
        emit,
        zero_width,
    )
}

/// Emit `inner` of `source` between two markup strings.
fn wrap_range(out: &mut BufferBuilder, source: &Buffer, open: &str, inner: Range<usize>, close: &str) {
    out.push_markup(open);
    out.copy(source, inner);
    out.push_markup(close);
}

/// Whether the markup pieces in `range` open and close elements evenly.
fn is_balanced(input: &Buffer, range: Range<usize>) -> bool {
    let text = input.as_str();
    let mut depth = 0i32;
    for (zone, is_markup) in input.zones(range) {
        if !is_markup {
            continue;
        }
        for tag in text[zone].split('<').skip(1) {
            let tag = tag.split('>').next().unwrap_or_default();
            if tag.starts_with('/') {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            } else if !tag.ends_with('/') && !tag.starts_with(['?', '!']) {
                depth += 1;
            }
        }
    }
    depth == 0
}

/// Apply one processor to plain text with default settings.
#[cfg(test)]
fn run(processor: &dyn Processor, text: &str, mode: Mode) -> Buffer {
    run_with(processor, text, mode, None)
}

#[cfg(test)]
fn run_with(
    processor: &dyn Processor,
    text: &str,
    mode: Mode,
    capabilities: Option<&TtsCapabilities>,
) -> Buffer {
    let extensions = Extensions::default();
    let heading_levels = HeadingLevels::default();
    let ctx = Context {
        registry: Registry::default(),
        extensions: &extensions,
        capabilities,
        heading_levels: &heading_levels,
        auto_sentence_tags: true,
    };
    processor.apply(&Buffer::new(text), mode, &ctx)
}
