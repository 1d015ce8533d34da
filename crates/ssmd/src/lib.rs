//! SSMD (Speech Synthesis Markdown) engine.
//!
//! Converts markdown-like speech markup into SSML, strips it to plain text,
//! parses it into a typed sentence/segment model, and tracks annotation
//! spans over the clean text.
//!
//! # Architecture
//!
//! - [`convert`] / [`strip`] run a fixed pipeline of processors over a
//!   buffer that keeps emitted markup apart from text, so no processor ever
//!   rewrites another one's output.
//! - [`parse_sentences`] splits a document into directive blocks, paragraphs
//!   and sentences (via a pluggable [`SentenceSplitter`]) and tokenizes each
//!   sentence into [`Segment`]s.
//! - [`parse_spans`] produces clean text plus [`AnnotationSpan`]s indexing it.
//! - [`TtsCapabilities`] describes what a target engine supports; unsupported
//!   markup degrades to its text.
//!
//! # Example
//!
//! ```
//! use ssmd::{ConvertOptions, ParseOptions};
//!
//! let ssml = ssmd::convert("Hello *world*! ...500ms [H2O](sub: water)", &ConvertOptions::default());
//! assert_eq!(
//!     ssml,
//!     "<speak><p>Hello <emphasis>world</emphasis>! <break time=\"500ms\"/> \
//!      <sub alias=\"water\">H2O</sub></p></speak>"
//! );
//!
//! let sentences = ssmd::parse_sentences("One. Two *words*.", &ParseOptions::default());
//! assert_eq!(sentences.len(), 2);
//! ```

pub mod annotation;
mod buffer;
pub mod capabilities;
mod converter;
mod directive;
mod error;
mod formatter;
mod grammar;
mod options;
mod parser;
pub mod platform;
mod processor;
mod spans;
mod splitter;
mod types;
mod xml;
mod xsampa;

pub use capabilities::TtsCapabilities;
pub use converter::Converter;
pub use directive::DirectiveBlock;
pub use error::SsmdError;
pub use formatter::format_ssmd;
pub use options::{ConvertOptions, ParseOptions};
pub use platform::Platform;
pub use processor::ProcessorKind;
pub use spans::{AnnotationSpan, ParseSpansResult};
pub use splitter::{PunctuationSplitter, SentenceSplitter};
pub use ssmd_config::{Config, ConfigError, Overrides};
pub use types::{
    AudioAttrs, BreakAttrs, BreakStrength, DirectiveAttrs, EmphasisLevel, Gender, HeadingEffect,
    HeadingLevels, PhonemeAttrs, ProsodyAttribute, ProsodyAttrs, SayAsAttrs, Segment, Sentence,
    Transformation, VoiceAttrs,
};
pub use xsampa::XsampaTable;

/// Convert SSMD to SSML.
#[must_use]
pub fn convert(text: &str, options: &ConvertOptions) -> String {
    Converter::new(options.clone()).convert(text)
}

/// Remove all SSMD markup, keeping the spoken text.
///
/// ```
/// let options = ssmd::ConvertOptions::default();
/// assert_eq!(ssmd::strip("Hello *world* @mark!", &options), "Hello world!");
/// ```
#[must_use]
pub fn strip(text: &str, options: &ConvertOptions) -> String {
    Converter::new(options.clone()).strip(text)
}

/// Parse a document into sentences of typed segments.
#[must_use]
pub fn parse_sentences(text: &str, options: &ParseOptions) -> Vec<Sentence> {
    parser::parse_sentences(text, options)
}

/// Parse text as a single run of segments, without directive blocks or
/// sentence splitting.
#[must_use]
pub fn parse_segments(text: &str, options: &ParseOptions) -> Vec<Segment> {
    parser::parse_segments(text, options)
}

/// Clean text with annotation spans in character offsets.
///
/// ```
/// let result = ssmd::parse_spans("Say [tomato]{ph='a'} now.", &ssmd::ParseOptions::default());
/// assert_eq!(result.clean_text, "Say tomato now.");
/// assert_eq!((result.annotations[0].char_start, result.annotations[0].char_end), (4, 10));
/// ```
#[must_use]
pub fn parse_spans(text: &str, options: &ParseOptions) -> ParseSpansResult {
    spans::parse_spans(text, options)
}

/// Sentences of the clean text as `(sentence, char_start, char_end)`.
#[must_use]
pub fn iter_sentence_spans(text: &str, options: &ParseOptions) -> Vec<(String, usize, usize)> {
    spans::iter_sentence_spans(text, options)
}

/// Directive blocks of a document with their inherited attributes.
#[must_use]
pub fn parse_directive_blocks(text: &str) -> Vec<DirectiveBlock> {
    directive::scan(text).blocks
}
