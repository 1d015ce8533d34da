//! Structured parsing: SSMD text → sentences of typed segments.
//!
//! The document is split into directive blocks, then paragraphs, then
//! sentences (through the configured [`SentenceSplitter`]), and each sentence
//! is tokenized with the shared inline grammar. Heading lines always form a
//! sentence of their own.
//!
//! [`SentenceSplitter`]: crate::SentenceSplitter

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::annotation::{Registry, resolve};
use crate::capabilities::TtsCapabilities;
use crate::directive::scan;
use crate::grammar::{Heading, Inline, Token, Tokens, parse_heading};
use crate::options::ParseOptions;
use crate::splitter::{split_sentences, trimmed};
use crate::types::{BreakAttrs, DirectiveAttrs, HeadingEffect, ProsodyAttrs, Segment, Sentence};

static SPACE_BEFORE_PUNCTUATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s+([.!?,:;])").expect("invalid punctuation spacing regex")
});

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("invalid whitespace regex"));

static PARAGRAPH_BREAK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("invalid paragraph break regex"));

/// Parse a document into sentences.
pub(crate) fn parse_sentences(text: &str, options: &ParseOptions) -> Vec<Sentence> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    let parser = SegmentParser::new(options);
    let offsets = CharOffsets::new(text);
    let mut sentences: Vec<Sentence> = Vec::new();

    for block in scan(text).blocks {
        let attrs = parser.directive_attrs(&block.attrs);
        let paragraphs = paragraphs(text, block.range.clone());
        let count = paragraphs.len();

        for (index, paragraph) in paragraphs.into_iter().enumerate() {
            let first = sentences.len();
            for range in parser.sentence_ranges(text, paragraph) {
                let parsed = parser.parse(text, range.clone(), &offsets);
                if parsed.segments.is_empty() {
                    if let Some(previous) = sentences.last_mut() {
                        previous.breaks_after.extend(parsed.pending_breaks);
                    }
                    continue;
                }
                sentences.push(Sentence {
                    segments: parsed.segments,
                    voice: attrs.voice.clone(),
                    language: attrs.language.clone(),
                    prosody: attrs.prosody.clone(),
                    breaks_after: Vec::new(),
                    is_paragraph_end: false,
                    position: offsets.char_at(range.start),
                });
            }
            if index + 1 < count
                && sentences.len() > first
                && let Some(last) = sentences.last_mut()
            {
                last.is_paragraph_end = true;
            }
        }
    }

    if !options.include_default_voice {
        sentences.retain(|sentence| sentence.voice.is_some());
    }
    tracing::debug!(sentences = sentences.len(), "Parsed document");
    sentences
}

/// Parse text as one run of segments, without directive or sentence splitting.
pub(crate) fn parse_segments(text: &str, options: &ParseOptions) -> Vec<Segment> {
    let Some(range) = trimmed(text, 0..text.len()) else {
        return Vec::new();
    };
    let offsets = CharOffsets::new(text);
    SegmentParser::new(options)
        .parse(text, range, &offsets)
        .segments
}

/// Byte offset → character offset lookup.
pub(crate) struct CharOffsets {
    starts: Vec<usize>,
}

impl CharOffsets {
    pub fn new(text: &str) -> Self {
        Self {
            starts: text.char_indices().map(|(i, _)| i).collect(),
        }
    }

    /// Character index of the byte offset `byte`.
    pub fn char_at(&self, byte: usize) -> usize {
        self.starts.partition_point(|&start| start < byte)
    }
}

/// Trimmed, non-empty paragraphs of `range`.
fn paragraphs(text: &str, range: Range<usize>) -> Vec<Range<usize>> {
    let mut found = Vec::new();
    let mut start = range.start;
    for separator in PARAGRAPH_BREAK_RE.find_iter(&text[range.clone()]) {
        found.extend(trimmed(text, start..range.start + separator.start()));
        start = range.start + separator.end();
    }
    found.extend(trimmed(text, start..range.end));
    found
}

/// Remove space before punctuation, collapse whitespace and trim.
pub(crate) fn normalize_text(text: &str) -> String {
    let text = SPACE_BEFORE_PUNCTUATION_RE.replace_all(text, "$1");
    WHITESPACE_RE.replace_all(&text, " ").trim().to_owned()
}

/// Text of `text` with all inline markup removed.
pub(crate) fn plain_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    for token in Tokens::new(text) {
        out.push_str(&text[copied..token.range.start]);
        if !token.is_zero_width() {
            out.push_str(&plain_text(&text[token.inner.clone()]));
        }
        copied = token.range.end;
    }
    out.push_str(&text[copied..]);
    WHITESPACE_RE.replace_all(&out, " ").trim().to_owned()
}

fn push_plain(parsed: &mut Parsed, raw: &str, position: usize) {
    let text = normalize_text(raw);
    if text.is_empty() {
        return;
    }
    parsed.push(Segment {
        position,
        ..Segment::new(text)
    });
}

/// Segments of one sentence plus breaks and marks that found no segment.
#[derive(Default)]
struct Parsed {
    segments: Vec<Segment>,
    pending_breaks: Vec<BreakAttrs>,
    pending_marks: Vec<String>,
}

impl Parsed {
    /// Append a segment; pending breaks and marks go before it.
    fn push(&mut self, mut segment: Segment) {
        segment.breaks_before.append(&mut self.pending_breaks);
        segment.marks_before.append(&mut self.pending_marks);
        self.segments.push(segment);
    }

    fn push_break(&mut self, attrs: BreakAttrs) {
        match self.segments.last_mut() {
            Some(last) => last.breaks_after.push(attrs),
            None => self.pending_breaks.push(attrs),
        }
    }

    fn push_mark(&mut self, name: String) {
        match self.segments.last_mut() {
            Some(last) => last.marks_after.push(name),
            None => self.pending_marks.push(name),
        }
    }
}

struct SegmentParser<'a> {
    registry: Registry<'static>,
    options: &'a ParseOptions,
}

impl<'a> SegmentParser<'a> {
    fn new(options: &'a ParseOptions) -> Self {
        Self {
            registry: Registry::default(),
            options,
        }
    }

    fn capabilities(&self) -> Option<&TtsCapabilities> {
        self.options.capabilities.as_ref()
    }

    fn allows(&self, flag: impl Fn(&TtsCapabilities) -> bool) -> bool {
        self.capabilities().is_none_or(flag)
    }

    /// Directive attributes the target engine can express.
    fn directive_attrs(&self, attrs: &DirectiveAttrs) -> DirectiveAttrs {
        let Some(caps) = self.capabilities() else {
            return attrs.clone();
        };
        DirectiveAttrs {
            voice: attrs.voice.clone().filter(|_| caps.voice),
            language: attrs.language.clone().filter(|_| caps.language),
            prosody: attrs.prosody.as_ref().and_then(|p| caps.filter_prosody(p)),
        }
    }

    /// Sentence ranges of a paragraph; heading lines stand alone.
    fn sentence_ranges(&self, text: &str, paragraph: Range<usize>) -> Vec<Range<usize>> {
        let mut ranges = Vec::new();
        let mut run: Option<Range<usize>> = None;
        let mut offset = paragraph.start;

        for line in text[paragraph.clone()].split_inclusive('\n') {
            let line_range = offset..offset + line.trim_end_matches(['\n', '\r']).len();
            offset += line.len();
            if parse_heading(&text[line_range.clone()]).is_some() {
                if let Some(run) = run.take() {
                    ranges.extend(self.split_run(text, run));
                }
                ranges.extend(trimmed(text, line_range));
            } else {
                let start = run.as_ref().map_or(line_range.start, |run| run.start);
                run = Some(start..line_range.end);
            }
        }
        if let Some(run) = run {
            ranges.extend(self.split_run(text, run));
        }
        ranges
    }

    fn split_run(&self, text: &str, run: Range<usize>) -> Vec<Range<usize>> {
        if !self.options.sentence_detection {
            return trimmed(text, run).into_iter().collect();
        }
        let splitter = self.options.splitter();
        split_sentences(splitter, &text[run.clone()], &self.options.language)
            .into_iter()
            .map(|range| run.start + range.start..run.start + range.end)
            .collect()
    }

    /// Segments of `text[range]`.
    fn parse(&self, text: &str, range: Range<usize>, offsets: &CharOffsets) -> Parsed {
        let slice = &text[range.clone()];
        let position = |byte: usize| offsets.char_at(range.start + byte);

        if let Some(heading) = parse_heading(slice) {
            let mut parsed = Parsed::default();
            let mut segment = self.heading_segment(slice, &heading);
            segment.position = position(heading.inner.start);
            parsed.push(segment);
            return parsed;
        }

        let mut parsed = Parsed::default();
        let mut copied = 0;
        for token in Tokens::new(slice) {
            if token.range.start > copied {
                push_plain(&mut parsed, &slice[copied..token.range.start], position(copied));
            }
            self.push_token(&mut parsed, slice, &token, position(token.range.start));
            copied = token.range.end;
        }
        if copied < slice.len() {
            push_plain(&mut parsed, &slice[copied..], position(copied));
        }
        parsed
    }

    fn push_token(&self, parsed: &mut Parsed, text: &str, token: &Token, position: usize) {
        let inner = || Segment {
            position,
            ..Segment::new(plain_text(&text[token.inner.clone()]))
        };
        let segment = match &token.inline {
            Inline::Break(attrs) => {
                if self.allows(|caps| caps.break_tags) {
                    parsed.push_break(attrs.clone());
                }
                return;
            }
            Inline::Mark => {
                if self.allows(|caps| caps.mark) {
                    parsed.push_mark(text[token.inner.clone()].to_owned());
                }
                return;
            }
            Inline::Emphasis(level) => {
                let mut segment = inner();
                if self.allows(|caps| caps.emphasis) {
                    segment.emphasis = Some(*level);
                }
                segment
            }
            Inline::Prosody { attribute, value } => {
                let mut segment = inner();
                if self.allows(|caps| caps.supports_prosody(*attribute)) {
                    let mut prosody = ProsodyAttrs::default();
                    prosody.set(*attribute, Some((*value).to_owned()));
                    segment.prosody = Some(prosody);
                }
                segment
            }
            Inline::Annotation { form, params } => {
                let mut segment = inner();
                let annotations =
                    resolve(&self.registry, *form, &text[params.clone()], self.capabilities());
                for annotation in &annotations {
                    annotation.apply_to(&mut segment);
                }
                segment
            }
        };
        if segment.text.is_empty() && segment.transformation.is_none() {
            tracing::debug!(position, "Dropping empty markup segment");
            return;
        }
        parsed.push(segment);
    }

    /// One segment carrying the configured effects of a heading line.
    fn heading_segment(&self, line: &str, heading: &Heading) -> Segment {
        let mut segment = Segment::new(plain_text(&line[heading.inner.clone()]));
        let Some(effects) = self.options.heading_levels.get(heading.level) else {
            return segment;
        };
        if !self.allows(|caps| caps.heading_emphasis) {
            return segment;
        }
        let breaks = self.allows(|caps| caps.break_tags);
        for effect in effects {
            match effect {
                HeadingEffect::Emphasis(level) => segment.emphasis = Some(*level),
                HeadingEffect::Pause(pause) if breaks => segment.breaks_after.push(pause.clone()),
                HeadingEffect::PauseBefore(pause) if breaks => {
                    segment.breaks_before.push(pause.clone());
                }
                HeadingEffect::Prosody(prosody) => {
                    segment.prosody = match self.capabilities() {
                        Some(caps) => caps.filter_prosody(prosody),
                        None => Some(prosody.clone()),
                    };
                }
                HeadingEffect::Pause(_) | HeadingEffect::PauseBefore(_) => {}
            }
        }
        segment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BreakStrength, EmphasisLevel, Transformation, VoiceAttrs};
    use pretty_assertions::assert_eq;

    fn texts(sentences: &[Sentence]) -> Vec<String> {
        sentences.iter().map(Sentence::text).collect()
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  Hello ,\n  world  !"), "Hello, world!");
    }

    #[test]
    fn test_plain_text_strips_nested_markup() {
        assert_eq!(plain_text("a *b* [c](fr) @m d"), "a b c d");
    }

    #[test]
    fn test_char_offsets() {
        let offsets = CharOffsets::new("né x");
        assert_eq!(offsets.char_at(0), 0);
        assert_eq!(offsets.char_at(3), 2);
        assert_eq!(offsets.char_at(5), 4);
    }

    #[test]
    fn test_sentences_and_paragraphs() {
        let sentences = parse_sentences(
            "Hello world. How are you?\n\nSecond paragraph.",
            &ParseOptions::default(),
        );
        assert_eq!(
            texts(&sentences),
            vec!["Hello world.", "How are you?", "Second paragraph."]
        );
        assert!(!sentences[0].is_paragraph_end);
        assert!(sentences[1].is_paragraph_end);
        assert!(!sentences[2].is_paragraph_end);
        assert_eq!(sentences[1].position, 13);
    }

    #[test]
    fn test_segments_from_markup() {
        let segments = parse_segments(
            "Say *hello* to [H2O](sub: water) now.",
            &ParseOptions::default(),
        );
        let texts: Vec<_> = segments.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["Say", "hello", "to", "H2O", "now."]);
        assert_eq!(segments[1].emphasis, Some(EmphasisLevel::Moderate));
        assert_eq!(segments[1].position, 4);
        assert_eq!(segments[3].substitution(), Some("water"));
    }

    #[test]
    fn test_breaks_and_marks_attach() {
        let segments = parse_segments("...500ms @start Hello ...s world @end", &ParseOptions::default());
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].breaks_before, vec![BreakAttrs::Time("500ms".to_owned())]);
        assert_eq!(segments[0].marks_before, vec!["start".to_owned()]);
        assert_eq!(
            segments[0].breaks_after,
            vec![BreakAttrs::Strength(BreakStrength::Strong)]
        );
        assert_eq!(segments[1].marks_after, vec!["end".to_owned()]);
    }

    #[test]
    fn test_heading_sentence() {
        let sentences = parse_sentences("# Welcome\nBody text here.", &ParseOptions::default());
        assert_eq!(texts(&sentences), vec!["Welcome", "Body text here."]);
        let heading = &sentences[0].segments[0];
        assert_eq!(heading.emphasis, Some(EmphasisLevel::Strong));
        assert_eq!(heading.breaks_after, vec![BreakAttrs::Time("100ms".to_owned())]);
        assert_eq!(heading.position, 2);
    }

    #[test]
    fn test_unconfigured_heading_is_plain() {
        let segments = parse_segments("#### Deep", &ParseOptions::default());
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "Deep");
        assert_eq!(segments[0].emphasis, None);
        assert!(segments[0].breaks_after.is_empty());
    }

    #[test]
    fn test_directive_inheritance() {
        let sentences = parse_sentences(
            "<div lang=\"fr\">\n@voice: sarah\nBonjour.\n</div>\nHello.",
            &ParseOptions::default(),
        );
        assert_eq!(texts(&sentences), vec!["Bonjour.", "Hello."]);
        assert_eq!(sentences[0].voice, Some(VoiceAttrs::named("sarah")));
        assert_eq!(sentences[0].language.as_deref(), Some("fr"));
        assert_eq!(sentences[1].voice, None);

        let voiced_only = parse_sentences(
            "Intro.\n@voice: sarah\nHi.",
            &ParseOptions::default().with_default_voice(false),
        );
        assert_eq!(texts(&voiced_only), vec!["Hi."]);
    }

    #[test]
    fn test_trailing_break_moves_to_sentence() {
        let sentences = parse_sentences("Hello. ...2s", &ParseOptions::default());
        assert_eq!(sentences.len(), 1);
        assert_eq!(sentences[0].breaks_after, vec![BreakAttrs::Time("2s".to_owned())]);
    }

    #[test]
    fn test_capabilities_filter_segments() {
        let options = ParseOptions::default().with_capabilities(crate::TtsCapabilities::minimal());
        let segments = parse_segments("*Hi* [H2O](sub: water) ...1s @m", &options);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].emphasis, None);
        assert_eq!(segments[1].transformation, None);
        assert!(segments[1].breaks_after.is_empty());
        assert!(segments[1].marks_after.is_empty());
    }

    #[test]
    fn test_audio_segment_keeps_empty_text() {
        let segments = parse_segments("[](beep.mp3 Beep)", &ParseOptions::default());
        assert_eq!(segments.len(), 1);
        assert!(matches!(segments[0].transformation, Some(Transformation::Audio(_))));
    }

    #[test]
    fn test_without_sentence_detection() {
        let sentences = parse_sentences(
            "One. Two.",
            &ParseOptions::default().with_sentence_detection(false),
        );
        assert_eq!(texts(&sentences), vec!["One. Two."]);
    }
}
