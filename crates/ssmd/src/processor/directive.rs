//! `<div ...>` blocks and `@voice` lines.

use std::sync::LazyLock;

use regex::Regex;

use super::{Context, Processor, ProcessorKind};
use crate::buffer::{Buffer, BufferBuilder, Mode};
use crate::directive::{DirectiveBlock, scan};
use crate::types::join_attrs;

static PARAGRAPH_BREAK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\n+").expect("invalid paragraph break regex"));

pub(super) struct DirectiveProcessor;

impl Processor for DirectiveProcessor {
    fn kind(&self) -> ProcessorKind {
        ProcessorKind::Directive
    }

    fn apply(&self, input: &Buffer, mode: Mode, ctx: &Context<'_>) -> Buffer {
        let text = input.as_str();
        let scan = scan(text);
        if !scan.has_directives {
            return input.clone();
        }

        let mut out = BufferBuilder::with_capacity(text.len());
        for (i, block) in scan.blocks.iter().enumerate() {
            if i > 0 {
                out.push_text("\n\n");
            }
            let (opens, closes) = match mode {
                Mode::Convert => wrappers(block, ctx),
                Mode::Strip => (Vec::new(), Vec::new()),
            };
            let mut start = block.range.start;
            let content = block.text(text);
            let separators = PARAGRAPH_BREAK_RE
                .find_iter(content)
                .map(|m| block.range.start + m.start()..block.range.start + m.end());
            for separator in separators.chain(std::iter::once(block.range.end..block.range.end)) {
                opens.iter().for_each(|open| out.push_markup(open));
                out.copy(input, start..separator.start);
                closes.iter().rev().for_each(|close| out.push_markup(close));
                if !separator.is_empty() {
                    out.push_text("\n\n");
                }
                start = separator.end;
            }
        }
        out.finish()
    }
}

/// Opening and closing tags for a block, outermost first.
fn wrappers(block: &DirectiveBlock, ctx: &Context<'_>) -> (Vec<String>, Vec<String>) {
    let caps = ctx.capabilities;
    let mut opens = Vec::new();
    let mut closes = Vec::new();

    if caps.is_none_or(|c| c.voice)
        && let Some(open) = block.attrs.voice.as_ref().and_then(|voice| voice.open_tag())
    {
        opens.push(open);
        closes.push("</voice>".to_owned());
    }
    if caps.is_none_or(|c| c.language)
        && let Some(language) = &block.attrs.language
    {
        opens.push(format!("<lang {}>", join_attrs(&[("xml:lang", language.clone())])));
        closes.push("</lang>".to_owned());
    }
    let prosody = match caps {
        Some(c) => block.attrs.prosody.as_ref().and_then(|p| c.filter_prosody(p)),
        None => block.attrs.prosody.clone(),
    };
    if let Some(open) = prosody.and_then(|p| p.open_tag()) {
        opens.push(open);
        closes.push("</prosody>".to_owned());
    }
    (opens, closes)
}
