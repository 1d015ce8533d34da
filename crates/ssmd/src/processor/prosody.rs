//! Prosody shorthand: `++loud++`, `<<slow<<`, `^^high^^` and friends.

use super::{Context, Processor, ProcessorKind, rewrite_tokens, wrap_range};
use crate::buffer::{Buffer, Mode};
use crate::grammar::{Inline, find_prosody};

pub(super) struct ProsodyProcessor;

impl Processor for ProsodyProcessor {
    fn kind(&self) -> ProcessorKind {
        ProcessorKind::Prosody
    }

    fn apply(&self, input: &Buffer, mode: Mode, ctx: &Context<'_>) -> Buffer {
        rewrite_tokens(input, mode, find_prosody, false, |token, source, out| {
            let Inline::Prosody { attribute, value } = token.inline else {
                return out.copy(source, token.range.clone());
            };
            let supported = ctx
                .capabilities
                .is_none_or(|caps| caps.supports_prosody(attribute));
            if mode == Mode::Convert && supported {
                let open = format!("<prosody {}=\"{value}\">", attribute.as_str());
                wrap_range(out, source, &open, token.inner.clone(), "</prosody>");
            } else {
                out.copy(source, token.inner.clone());
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::{run, run_with};
    use super::*;
    use crate::capabilities::TtsCapabilities;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_convert() {
        let out = run(&ProsodyProcessor, "++Hey++ <<slow down<< ^^up^^", Mode::Convert);
        assert_eq!(
            out.to_ssml(),
            "<prosody volume=\"x-loud\">Hey</prosody> <prosody rate=\"x-slow\">slow down</prosody> \
             <prosody pitch=\"x-high\">up</prosody>"
        );
    }

    #[test]
    fn test_phone_numbers_untouched() {
        let text = "call 555-1234 or say-as";
        assert_eq!(run(&ProsodyProcessor, text, Mode::Convert).to_ssml(), text);
    }

    #[test]
    fn test_unsupported_dimension_keeps_text() {
        let caps = TtsCapabilities {
            pitch: false,
            ..TtsCapabilities::full()
        };
        let out = run_with(&ProsodyProcessor, "^high^ +loud+", Mode::Convert, Some(&caps));
        assert_eq!(out.to_ssml(), "high <prosody volume=\"loud\">loud</prosody>");
    }

    #[test]
    fn test_strip() {
        assert_eq!(
            run(&ProsodyProcessor, ">>fast>> and ~quiet~", Mode::Strip).to_plain(),
            "fast and quiet"
        );
    }
}
