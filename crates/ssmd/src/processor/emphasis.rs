//! `**strong**`, `*moderate*` and `_reduced_` emphasis.

use super::{Context, Processor, ProcessorKind, rewrite_tokens, wrap_range};
use crate::buffer::{Buffer, Mode};
use crate::grammar::{Inline, find_emphasis};

pub(super) struct EmphasisProcessor;

impl Processor for EmphasisProcessor {
    fn kind(&self) -> ProcessorKind {
        ProcessorKind::Emphasis
    }

    fn apply(&self, input: &Buffer, mode: Mode, _ctx: &Context<'_>) -> Buffer {
        rewrite_tokens(input, mode, find_emphasis, false, |token, source, out| {
            match (&token.inline, mode) {
                (Inline::Emphasis(level), Mode::Convert) => wrap_range(
                    out,
                    source,
                    &level.open_tag(),
                    token.inner.clone(),
                    "</emphasis>",
                ),
                _ => out.copy(source, token.inner.clone()),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::run;
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_levels() {
        let out = run(&EmphasisProcessor, "**a** *b* _c_", Mode::Convert);
        assert_eq!(
            out.to_ssml(),
            "<emphasis level=\"strong\">a</emphasis> <emphasis>b</emphasis> \
             <emphasis level=\"reduced\">c</emphasis>"
        );
    }

    #[test]
    fn test_strip_keeps_text() {
        let out = run(&EmphasisProcessor, "hello *world* & _you_", Mode::Strip);
        assert_eq!(out.to_plain(), "hello world & you");
    }

    #[test]
    fn test_text_is_escaped_once() {
        let out = run(&EmphasisProcessor, "*a < b*", Mode::Convert);
        assert_eq!(out.to_ssml(), "<emphasis>a &lt; b</emphasis>");
    }

    #[test]
    fn test_identifiers_untouched() {
        let out = run(&EmphasisProcessor, "call my_func_name now", Mode::Convert);
        assert_eq!(out.to_ssml(), "call my_func_name now");
    }
}
