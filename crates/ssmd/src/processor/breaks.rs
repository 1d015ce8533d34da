//! `...` pauses → `<break/>`.

use super::{Context, Processor, ProcessorKind, rewrite_tokens};
use crate::buffer::{Buffer, Mode};
use crate::grammar::{Inline, find_break};

pub(super) struct BreakProcessor;

impl Processor for BreakProcessor {
    fn kind(&self) -> ProcessorKind {
        ProcessorKind::Break
    }

    fn apply(&self, input: &Buffer, mode: Mode, _ctx: &Context<'_>) -> Buffer {
        rewrite_tokens(input, mode, find_break, true, |token, _, out| {
            if let (Inline::Break(attrs), Mode::Convert) = (&token.inline, mode) {
                out.push_markup(&attrs.to_ssml());
            }
        })
    }
}
