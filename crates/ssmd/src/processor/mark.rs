//! `@name` → `<mark name="name"/>`.

use super::{Context, Processor, ProcessorKind, rewrite_tokens};
use crate::buffer::{Buffer, Mode};
use crate::grammar::find_mark;
use crate::xml::escape_attr;

pub(super) struct MarkProcessor;

impl Processor for MarkProcessor {
    fn kind(&self) -> ProcessorKind {
        ProcessorKind::Mark
    }

    fn apply(&self, input: &Buffer, mode: Mode, _ctx: &Context<'_>) -> Buffer {
        rewrite_tokens(input, mode, find_mark, true, |token, source, out| {
            if mode == Mode::Convert {
                let name = &source.as_str()[token.inner.clone()];
                out.push_markup(&format!("<mark name=\"{}\"/>", escape_attr(name)));
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
    fn test_convert() {
        let out = run(&MarkProcessor, "I @here said", Mode::Convert);
        assert_eq!(out.to_ssml(), "I <mark name=\"here\"/> said");
    }

    #[test]
    fn test_strip_removes_one_space() {
        assert_eq!(run(&MarkProcessor, "I @here said", Mode::Strip).to_plain(), "I said");
        assert_eq!(run(&MarkProcessor, "@start Go", Mode::Strip).to_plain(), "Go");
    }

    #[test]
    fn test_email_and_voice_directive_untouched() {
        let text = "mail me@example.com\n@voice: sarah";
        assert_eq!(run(&MarkProcessor, text, Mode::Convert).to_plain(), text);
    }
}
