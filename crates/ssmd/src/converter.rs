//! Processor pipeline driver.

use std::collections::BTreeSet;

use crate::annotation::Registry;
use crate::buffer::{Buffer, Mode};
use crate::options::ConvertOptions;
use crate::processor::{Context, ProcessorKind, pipeline};
use crate::xml::pretty_print;
use crate::xsampa::XsampaTable;

/// Reusable SSMD → SSML converter.
///
/// Holds resolved options so repeated conversions skip option handling.
///
/// # Example
///
/// ```
/// use ssmd::{ConvertOptions, Converter};
///
/// let converter = Converter::new(ConvertOptions::default().with_wrapper_tag(false));
/// assert_eq!(converter.convert("Hello *world*!"), "<p>Hello <emphasis>world</emphasis>!</p>");
/// assert_eq!(converter.strip("Hello *world*!"), "Hello world!");
/// ```
#[derive(Clone, Debug)]
pub struct Converter<'a> {
    options: ConvertOptions,
    registry: Registry<'a>,
    /// Processors the target engine cannot express; they run in strip mode.
    degraded: BTreeSet<ProcessorKind>,
}

impl Converter<'static> {
    #[must_use]
    pub fn new(options: ConvertOptions) -> Self {
        Self::with_xsampa(options, XsampaTable::shared())
    }
}

impl<'a> Converter<'a> {
    /// Converter using a caller-supplied X-SAMPA table for `ph:` annotations.
    #[must_use]
    pub fn with_xsampa(options: ConvertOptions, xsampa: &'a XsampaTable) -> Self {
        let degraded = options
            .capabilities
            .as_ref()
            .map(|caps| caps.to_skip_set())
            .unwrap_or_default();
        Self {
            options,
            registry: Registry::new(xsampa),
            degraded,
        }
    }

    #[must_use]
    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Convert SSMD to SSML.
    #[must_use]
    pub fn convert(&self, text: &str) -> String {
        let buffer = self.run(text, |kind| {
            if self.degraded.contains(&kind) {
                Mode::Strip
            } else {
                Mode::Convert
            }
        });
        let mut ssml = buffer.to_ssml();
        if self.options.output_wrapper_tag {
            ssml = format!("<speak>{ssml}</speak>");
        }
        if self.options.pretty_print {
            ssml = pretty_print(&ssml);
        }
        ssml
    }

    /// Remove all SSMD markup, keeping the spoken text.
    ///
    /// Removing a mark or break can leave text that reads as markup again
    /// (`@@a b` becomes `@b`), so stripping repeats until nothing changes.
    #[must_use]
    pub fn strip(&self, text: &str) -> String {
        let mut plain = self.strip_once(text);
        loop {
            let next = self.strip_once(&plain);
            // Each extra pass only removes text, which bounds the loop.
            if next.len() >= plain.len() {
                return plain;
            }
            tracing::trace!(before = plain.len(), after = next.len(), "Stripping again");
            plain = next;
        }
    }

    fn strip_once(&self, text: &str) -> String {
        self.run(text, |_| Mode::Strip).to_plain().trim().to_owned()
    }

    fn run(&self, text: &str, mode: impl Fn(ProcessorKind) -> Mode) -> Buffer {
        let ctx = Context {
            registry: self.registry,
            extensions: &self.options.extensions,
            capabilities: self.options.capabilities.as_ref(),
            heading_levels: &self.options.heading_levels,
            auto_sentence_tags: self.options.auto_sentence_tags,
        };
        let mut buffer = Buffer::new(text.trim());
        for processor in pipeline() {
            let kind = processor.kind();
            if self.options.skip.contains(&kind) {
                continue;
            }
            let mode = mode(kind);
            tracing::debug!(processor = %kind, ?mode, "Applying processor");
            buffer = processor.apply(&buffer, mode, &ctx);
        }
        buffer
    }
}
