//! `[text](params)` and `[text]{attrs}` annotations.

use std::ops::Range;

use super::{Context, Processor, ProcessorKind, rewrite_tokens};
use crate::annotation::{Annotation, Wrap, resolve};
use crate::buffer::{Buffer, BufferBuilder, Mode};
use crate::grammar::{Inline, find_annotation};

pub(super) struct AnnotationProcessor;

impl Processor for AnnotationProcessor {
    fn kind(&self) -> ProcessorKind {
        ProcessorKind::Annotation
    }

    fn apply(&self, input: &Buffer, mode: Mode, ctx: &Context<'_>) -> Buffer {
        rewrite_tokens(input, mode, find_annotation, false, |token, source, out| {
            let Inline::Annotation { form, params } = &token.inline else {
                return out.copy(source, token.range.clone());
            };
            if mode == Mode::Strip {
                return out.copy(source, token.inner.clone());
            }
            let params = source.text_in(params.clone());
            let annotations = resolve(&ctx.registry, *form, &params, ctx.capabilities);
            emit_wrapped(&annotations, source, token.inner.clone(), ctx, out);
        })
    }
}

/// Wrap `inner` in each annotation, innermost first.
///
/// A replacing annotation discards everything inside it; annotations after
/// it still wrap the replacement.
fn emit_wrapped(
    annotations: &[Annotation],
    source: &Buffer,
    inner: Range<usize>,
    ctx: &Context<'_>,
    out: &mut BufferBuilder,
) {
    let text = source.text_in(inner.clone());
    let wraps: Vec<Wrap> = annotations
        .iter()
        .map(|annotation| annotation.wrapping(&text, ctx.extensions))
        .collect();

    let replaced = wraps.iter().rposition(|wrap| matches!(wrap, Wrap::Replace(_)));
    let outer = match replaced {
        Some(index) => &wraps[index + 1..],
        None => &wraps[..],
    };

    for wrap in outer.iter().rev() {
        if let Wrap::Around { open, .. } = wrap {
            out.push_markup(open);
        }
    }
    match replaced.map(|index| &wraps[index]) {
        Some(Wrap::Replace(markup)) => out.push_markup(markup),
        _ => out.copy(source, inner),
    }
    for wrap in outer {
        if let Wrap::Around { close, .. } = wrap {
            out.push_markup(close);
        }
    }
}
