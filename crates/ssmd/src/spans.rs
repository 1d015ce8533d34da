//! Clean text with annotation spans.
//!
//! Markup is removed in source order while a running output position is
//! tracked, so every span indexes the clean text directly:
//!
//! ```text
//! Say [tomato]{ph='a'} now.   →   Say tomato now.
//!                                     ^^^^^^ tag=phoneme, ph=a
//! ```

use std::collections::BTreeMap;
use std::ops::Range;

use crate::annotation::{Registry, parse_attributes, resolve};
use crate::capabilities::TtsCapabilities;
use crate::directive::scan;
use crate::grammar::{AnnotationForm, Inline, Tokens, find_heading};
use crate::options::ParseOptions;
use crate::parser::CharOffsets;
use crate::splitter::split_sentences;
use crate::types::BreakAttrs;

/// One annotated region of the clean text, in character offsets.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnnotationSpan {
    pub char_start: usize,
    pub char_end: usize,
    /// Span kind, also stored under `tag` in `attrs`.
    pub kind: String,
    pub attrs: BTreeMap<String, String>,
}

/// Output of [`parse_spans`](crate::parse_spans).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParseSpansResult {
    pub clean_text: String,
    /// Spans ordered by start, outer spans first.
    pub annotations: Vec<AnnotationSpan>,
    /// Structural problems found while scanning (e.g. unclosed `<div>`).
    pub warnings: Vec<String>,
}

/// Span in byte offsets of the raw (uncollapsed) output.
struct RawSpan {
    range: Range<usize>,
    attrs: BTreeMap<String, String>,
}

struct SpanWriter<'a> {
    out: String,
    spans: Vec<RawSpan>,
    registry: Registry<'static>,
    capabilities: Option<&'a TtsCapabilities>,
}

impl SpanWriter<'_> {
    fn allows(&self, flag: impl Fn(&TtsCapabilities) -> bool) -> bool {
        self.capabilities.is_none_or(flag)
    }

    /// Record a span over `range` of the output, minus surrounding whitespace.
    fn span(&mut self, range: Range<usize>, tag: &str, attrs: BTreeMap<String, String>) {
        let covered = &self.out[range.clone()];
        let start = range.start + (covered.len() - covered.trim_start().len());
        let end = (range.end - (covered.len() - covered.trim_end().len())).max(start);
        let mut attrs = attrs;
        attrs.insert("tag".to_owned(), tag.to_owned());
        self.spans.push(RawSpan {
            range: start..end,
            attrs,
        });
    }

    /// Block content; heading lines become `heading` spans.
    fn write_block(&mut self, text: &str) {
        let mut copied = 0;
        while let Some(heading) = find_heading(text, copied) {
            self.write_inline(&text[copied..heading.range.start]);
            let start = self.out.len();
            self.write_inline(&text[heading.inner.clone()]);
            if self.allows(|caps| caps.heading_emphasis) {
                let level = BTreeMap::from([("level".to_owned(), heading.level.to_string())]);
                self.span(start..self.out.len(), "heading", level);
            }
            copied = heading.range.end;
        }
        self.write_inline(&text[copied..]);
    }

    fn write_inline(&mut self, text: &str) {
        let mut copied = 0;
        for token in Tokens::new(text) {
            self.out.push_str(&text[copied..token.range.start]);
            copied = token.range.end;
            // A removed mark or break takes one neighbouring space with it.
            if token.is_zero_width() {
                if self.out.ends_with(' ') {
                    self.out.pop();
                } else if text[copied..].starts_with(' ') {
                    copied += 1;
                }
            }
            let start = self.out.len();
            let inner = &text[token.inner.clone()];

            match &token.inline {
                Inline::Break(attrs) => {
                    if self.allows(|caps| caps.break_tags) {
                        let (key, value) = match attrs {
                            BreakAttrs::Time(time) => ("time", time.clone()),
                            BreakAttrs::Strength(strength) => {
                                ("strength", strength.as_str().to_owned())
                            }
                        };
                        self.span(start..start, "break", BTreeMap::from([(key.to_owned(), value)]));
                    }
                }
                Inline::Mark => {
                    if self.allows(|caps| caps.mark) {
                        let name = BTreeMap::from([("name".to_owned(), inner.to_owned())]);
                        self.span(start..start, "mark", name);
                    }
                }
                Inline::Emphasis(level) => {
                    self.write_inline(inner);
                    if self.allows(|caps| caps.emphasis) {
                        let level = BTreeMap::from([("level".to_owned(), level.as_str().to_owned())]);
                        self.span(start..self.out.len(), "emphasis", level);
                    }
                }
                Inline::Prosody { attribute, value } => {
                    self.write_inline(inner);
                    if self.allows(|caps| caps.supports_prosody(*attribute)) {
                        let attrs =
                            BTreeMap::from([(attribute.as_str().to_owned(), (*value).to_owned())]);
                        self.span(start..self.out.len(), "prosody", attrs);
                    }
                }
                Inline::Annotation { form, params } => {
                    self.write_inline(inner);
                    let params = &text[params.clone()];
                    let range = start..self.out.len();
                    let raw = match form {
                        AnnotationForm::Brace => parse_attributes(params).as_map().clone(),
                        AnnotationForm::Paren => BTreeMap::new(),
                    };
                    for annotation in resolve(&self.registry, *form, params, self.capabilities) {
                        let mut attrs = raw.clone();
                        attrs.extend(annotation.span_attrs());
                        self.span(range.clone(), annotation.kind().as_str(), attrs);
                    }
                }
            }
        }
        self.out.push_str(&text[copied..]);
    }
}

/// Collapse whitespace runs to one space and trim, mapping each raw byte
/// offset to its offset in the result.
fn collapse(raw: &str) -> (String, Vec<usize>) {
    let mut clean = String::with_capacity(raw.len());
    let mut map = Vec::with_capacity(raw.len() + 1);
    for c in raw.chars() {
        let offset = clean.len();
        map.extend(std::iter::repeat_n(offset, c.len_utf8()));
        if c.is_whitespace() {
            if !clean.is_empty() && !clean.ends_with(' ') {
                clean.push(' ');
            }
        } else {
            clean.push(c);
        }
    }
    if clean.ends_with(' ') {
        clean.pop();
    }
    map.push(clean.len());
    let len = clean.len();
    for offset in &mut map {
        *offset = (*offset).min(len);
    }
    (clean, map)
}

/// Strip markup from `text`, returning the clean text and its spans.
pub(crate) fn parse_spans(text: &str, options: &ParseOptions) -> ParseSpansResult {
    let directives = scan(text);
    let mut writer = SpanWriter {
        out: String::with_capacity(text.len()),
        spans: Vec::new(),
        registry: Registry::default(),
        capabilities: options.capabilities.as_ref(),
    };

    for (i, block) in directives.blocks.iter().enumerate() {
        if i > 0 {
            writer.out.push_str("\n\n");
        }
        let start = writer.out.len();
        writer.write_block(block.text(text));
        if !block.params.is_empty() {
            writer.span(start..writer.out.len(), "div", block.params.clone());
        }
    }

    let (clean_text, map) = if options.preserve_whitespace {
        let map = (0..=writer.out.len()).collect();
        (writer.out, map)
    } else {
        collapse(&writer.out)
    };

    let offsets = CharOffsets::new(&clean_text);
    let mut annotations: Vec<AnnotationSpan> = writer
        .spans
        .into_iter()
        .map(|span| {
            let start = map[span.range.start];
            let end = map[span.range.end].max(start);
            AnnotationSpan {
                char_start: offsets.char_at(start),
                char_end: offsets.char_at(end),
                kind: span.attrs.get("tag").cloned().unwrap_or_default(),
                attrs: span.attrs,
            }
        })
        .collect();
    annotations.sort_by(|a, b| {
        a.char_start
            .cmp(&b.char_start)
            .then(b.char_end.cmp(&a.char_end))
    });

    ParseSpansResult {
        clean_text,
        annotations,
        warnings: directives.warnings,
    }
}

/// Sentences of the clean text with their character offsets.
pub(crate) fn iter_sentence_spans(text: &str, options: &ParseOptions) -> Vec<(String, usize, usize)> {
    let clean = parse_spans(text, options).clean_text;
    let offsets = CharOffsets::new(&clean);
    split_sentences(options.splitter(), &clean, &options.language)
        .into_iter()
        .map(|range| {
            (
                clean[range.clone()].to_owned(),
                offsets.char_at(range.start),
                offsets.char_at(range.end),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn spans(text: &str) -> ParseSpansResult {
        parse_spans(text, &ParseOptions::default())
    }

    fn covered<'t>(result: &'t ParseSpansResult, span: &AnnotationSpan) -> &'t str {
        let start = result
            .clean_text
            .char_indices()
            .nth(span.char_start)
            .map_or(result.clean_text.len(), |(i, _)| i);
        let end = result
            .clean_text
            .char_indices()
            .nth(span.char_end)
            .map_or(result.clean_text.len(), |(i, _)| i);
        &result.clean_text[start..end]
    }

    #[test]
    fn test_collapse_maps_offsets() {
        let (clean, map) = collapse("  a \n b  ");
        assert_eq!(clean, "a b");
        assert_eq!(map[2], 0);
        assert_eq!(map[6], 2);
        assert_eq!(map[9], 3);
    }

    #[test]
    fn test_emphasis_and_marks() {
        let result = spans("Hello *big* @here world ...500ms!");
        assert_eq!(result.clean_text, "Hello big world!");
        let kinds: Vec<_> = result.annotations.iter().map(|s| s.kind.as_str()).collect();
        assert_eq!(kinds, vec!["emphasis", "mark", "break"]);
        assert_eq!(covered(&result, &result.annotations[0]), "big");
        assert_eq!(result.annotations[1].char_start, result.annotations[1].char_end);
        assert_eq!(result.annotations[2].attrs.get("time").map(String::as_str), Some("500ms"));
    }

    #[test]
    fn test_span_excludes_padding() {
        let result = spans("Say [ tomato ]{ph='a'} now.");
        assert_eq!(result.clean_text, "Say tomato now.");
        let span = &result.annotations[0];
        assert_eq!((span.char_start, span.char_end), (4, 10));
        assert_eq!(covered(&result, span), "tomato");
    }

    #[test]
    fn test_paren_annotation_attrs() {
        let result = spans("[Bonjour](fr, v: 5) ami");
        assert_eq!(result.clean_text, "Bonjour ami");
        let kinds: Vec<_> = result.annotations.iter().map(|s| s.kind.as_str()).collect();
        assert_eq!(kinds, vec!["lang", "prosody"]);
        assert_eq!(result.annotations[0].attrs.get("lang").map(String::as_str), Some("fr-FR"));
        assert_eq!(covered(&result, &result.annotations[1]), "Bonjour");
    }

    #[test]
    fn test_heading_span() {
        let result = spans("## Intro\nText");
        assert_eq!(result.clean_text, "Intro Text");
        assert_eq!(result.annotations[0].kind, "heading");
        assert_eq!(result.annotations[0].attrs.get("level").map(String::as_str), Some("2"));
        assert_eq!(covered(&result, &result.annotations[0]), "Intro");
    }

    #[test]
    fn test_unclosed_div_warns() {
        let result = spans("<div lang=\"de\">\nHallo");
        assert_eq!(result.clean_text, "Hallo");
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.annotations[0].kind, "div");
    }

    #[test]
    fn test_capabilities_filter_spans() {
        let options = ParseOptions::default().with_capabilities(TtsCapabilities::minimal());
        let result = parse_spans("*a* [b](sub: c) @m", &options);
        assert_eq!(result.clean_text, "a b");
        assert!(result.annotations.is_empty());
    }

    #[test]
    fn test_multibyte_offsets() {
        let result = spans("Café [über]{lang='de'}");
        assert_eq!(result.clean_text, "Café über");
        assert_eq!(result.annotations[0].char_start, 5);
        assert_eq!(result.annotations[0].char_end, 9);
    }
}
