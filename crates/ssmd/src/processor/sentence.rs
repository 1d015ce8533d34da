//! Lines of a paragraph → `<s>` elements (only with `auto_sentence_tags`).

use std::ops::Range;

use super::{Context, Processor, ProcessorKind, is_balanced};
use crate::buffer::{Buffer, BufferBuilder, Mode};

pub(super) struct SentenceProcessor;

impl Processor for SentenceProcessor {
    fn kind(&self) -> ProcessorKind {
        ProcessorKind::Sentence
    }

    fn apply(&self, input: &Buffer, mode: Mode, ctx: &Context<'_>) -> Buffer {
        if mode == Mode::Strip || !ctx.auto_sentence_tags {
            return input.clone();
        }
        let text = input.as_str();
        let mut out = BufferBuilder::with_capacity(text.len() + 32);
        let mut copied = 0;

        for content in paragraphs(input) {
            let lines = lines(input, content.clone());
            if lines.iter().any(|line| !is_balanced(input, line.clone())) {
                tracing::debug!("Paragraph lines carry unbalanced markup, skipping sentence tags");
                continue;
            }
            out.copy(input, copied..content.start);
            for (i, line) in lines.into_iter().enumerate() {
                if i > 0 {
                    out.push_text(" ");
                }
                out.push_markup("<s>");
                out.copy(input, line);
                out.push_markup("</s>");
            }
            copied = content.end;
        }
        out.copy(input, copied..text.len());
        out.finish()
    }
}

/// Content ranges between `<p>` and `</p>` markup pieces.
fn paragraphs(input: &Buffer) -> Vec<Range<usize>> {
    let text = input.as_str();
    let mut found = Vec::new();
    let mut open: Option<usize> = None;
    for piece in input.markup_pieces() {
        match &text[piece.clone()] {
            "<p>" => open = Some(piece.end),
            "</p>" => {
                if let Some(start) = open.take() {
                    found.push(start..piece.start);
                }
            }
            _ => {}
        }
    }
    found
}

/// Non-blank lines of `content`, trimmed; line breaks only count in text.
fn lines(input: &Buffer, content: Range<usize>) -> Vec<Range<usize>> {
    let text = input.as_str();
    let mut breaks: Vec<usize> = input
        .zones(content.clone())
        .filter(|(_, is_markup)| !is_markup)
        .flat_map(|(zone, _)| {
            text[zone.clone()]
                .match_indices('\n')
                .map(move |(i, _)| zone.start + i)
        })
        .collect();
    breaks.push(content.end);

    let mut lines = Vec::new();
    let mut start = content.start;
    for end in breaks {
        let line = &text[start..end];
        let trimmed_start = start + (line.len() - line.trim_start().len());
        let trimmed_end = start + line.trim_end().len();
        if trimmed_start < trimmed_end {
            lines.push(trimmed_start..trimmed_end);
        }
        start = end + 1;
    }
    lines
}
