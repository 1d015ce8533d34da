//! Blank-line separated paragraphs → `<p>`.

use std::sync::LazyLock;

use regex::Regex;

use super::{Context, Processor, ProcessorKind, is_balanced};
use crate::buffer::{Buffer, BufferBuilder, Mode};

static PARAGRAPH_BREAK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\n+").expect("invalid paragraph break regex"));

pub(super) struct ParagraphProcessor;

impl Processor for ParagraphProcessor {
    fn kind(&self) -> ProcessorKind {
        ProcessorKind::Paragraph
    }

    fn apply(&self, input: &Buffer, mode: Mode, _ctx: &Context<'_>) -> Buffer {
        let text = input.as_str();
        if text.is_empty() {
            return input.clone();
        }
        let mut out = BufferBuilder::with_capacity(text.len() + 16);
        if mode == Mode::Convert {
            out.push_markup("<p>");
        }
        let mut copied = 0;
        for separator in PARAGRAPH_BREAK_RE.find_iter(text) {
            let range = separator.range();
            if !input.is_plain(range.clone()) || !is_balanced(input, copied..range.start) {
                continue;
            }
            out.copy(input, copied..range.start);
            match mode {
                Mode::Convert => {
                    out.push_markup("</p>");
                    out.push_markup("<p>");
                }
                Mode::Strip => out.push_text("\n\n"),
            }
            copied = range.end;
        }
        out.copy(input, copied..text.len());
        if mode == Mode::Convert {
            out.push_markup("</p>");
        }
        out.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::super::run;
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_wraps_paragraphs() {
        let out = run(&ParagraphProcessor, "One.\n\n\nTwo.\nStill two.", Mode::Convert);
        assert_eq!(out.to_ssml(), "<p>One.</p><p>Two.\nStill two.</p>");
    }

    #[test]
    fn test_strip_normalizes_breaks() {
        let out = run(&ParagraphProcessor, "One.\n\n\n\nTwo.", Mode::Strip);
        assert_eq!(out.to_plain(), "One.\n\nTwo.");
    }

    #[test]
    fn test_open_element_keeps_paragraph_together() {
        let mut builder = BufferBuilder::default();
        builder.push_text("a ");
        builder.push_markup("<emphasis>");
        builder.push_text("b\n\nc");
        builder.push_markup("</emphasis>");
        builder.push_text("\n\nd");
        let input = builder.finish();
        let extensions = crate::annotation::Extensions::default();
        let levels = crate::types::HeadingLevels::default();
        let ctx = Context {
            registry: crate::annotation::Registry::default(),
            extensions: &extensions,
            capabilities: None,
            heading_levels: &levels,
            auto_sentence_tags: false,
        };
        assert_eq!(
            ParagraphProcessor.apply(&input, Mode::Convert, &ctx).to_ssml(),
            "<p>a <emphasis>b\n\nc</emphasis></p><p>d</p>"
        );
    }

    #[test]
    fn test_empty_input_stays_empty() {
        assert_eq!(run(&ParagraphProcessor, "", Mode::Convert).to_ssml(), "");
    }
}
