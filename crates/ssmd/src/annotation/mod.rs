//! Typed annotations for `[text](params)` and `[text]{attrs}` markup.
//!
//! A parameter string resolves to one or more [`Annotation`]s through the
//! [`Registry`]. Each annotation knows how to wrap text in SSML
//! ([`Annotation::wrapping`]), how to merge with a duplicate of its own
//! variant ([`Annotation::combine`]) and how to apply itself to a typed
//! [`Segment`].

mod attributes;
mod extension;
mod recognizers;
mod registry;

use std::collections::BTreeMap;

pub use attributes::{AttributeMap, parse_attributes};
pub use extension::{ExtensionHandler, Extensions, TEXT_PLACEHOLDER, TemplateExtension};
pub use recognizers::{expand_language, parse_voice_value};
pub use registry::Registry;

use crate::capabilities::TtsCapabilities;
use crate::grammar::AnnotationForm;
use crate::types::{
    AudioAttrs, EmphasisLevel, PhonemeAttrs, ProsodyAttrs, SayAsAttrs, Segment, Transformation,
    VoiceAttrs, join_attrs,
};
use crate::xml::escape_text;

/// One interpreted annotation parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Annotation {
    Audio(AudioAttrs),
    /// Platform extension by name.
    Extension(String),
    Voice(VoiceAttrs),
    SayAs(SayAsAttrs),
    Phoneme(PhonemeAttrs),
    Prosody(ProsodyAttrs),
    /// Alias spoken instead of the text.
    Substitution(String),
    Emphasis(EmphasisLevel),
    /// BCP-47 language code.
    Language(String),
}

/// Variant discriminant of an [`Annotation`], in registry priority order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AnnotationKind {
    Audio,
    Extension,
    Voice,
    SayAs,
    Phoneme,
    Prosody,
    Substitution,
    Emphasis,
    Language,
}

impl AnnotationKind {
    /// SSML element name, also used as the span `tag`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Extension => "ext",
            Self::Voice => "voice",
            Self::SayAs => "say-as",
            Self::Phoneme => "phoneme",
            Self::Prosody => "prosody",
            Self::Substitution => "sub",
            Self::Emphasis => "emphasis",
            Self::Language => "lang",
        }
    }
}

/// How an annotation turns text into markup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Wrap {
    /// Markup placed around the (escaped) text.
    Around { open: String, close: String },
    /// Markup replacing the text entirely.
    Replace(String),
    /// Text is kept as is.
    Unchanged,
}

impl Wrap {
    fn element(open: String, name: &str) -> Self {
        Self::Around {
            open,
            close: format!("</{name}>"),
        }
    }
}

impl Annotation {
    #[must_use]
    pub fn kind(&self) -> AnnotationKind {
        match self {
            Self::Audio(_) => AnnotationKind::Audio,
            Self::Extension(_) => AnnotationKind::Extension,
            Self::Voice(_) => AnnotationKind::Voice,
            Self::SayAs(_) => AnnotationKind::SayAs,
            Self::Phoneme(_) => AnnotationKind::Phoneme,
            Self::Prosody(_) => AnnotationKind::Prosody,
            Self::Substitution(_) => AnnotationKind::Substitution,
            Self::Emphasis(_) => AnnotationKind::Emphasis,
            Self::Language(_) => AnnotationKind::Language,
        }
    }

    /// Merge a later duplicate of the same variant into this one.
    ///
    /// The first annotation wins; prosody additionally takes the fields it
    /// does not set from the duplicate.
    pub fn combine(&mut self, other: &Self) {
        if let (Self::Prosody(first), Self::Prosody(second)) = (self, other) {
            first.fill_missing(second);
        }
    }

    /// Markup for `text`, which is the raw (unescaped) annotated text.
    #[must_use]
    pub fn wrapping(&self, text: &str, extensions: &Extensions) -> Wrap {
        match self {
            Self::Audio(audio) => audio_wrapping(audio, text),
            Self::Extension(name) => extensions
                .get(name)
                .map_or(Wrap::Unchanged, |handler| handler.wrap(text)),
            Self::Voice(voice) => voice
                .open_tag()
                .map_or(Wrap::Unchanged, |open| Wrap::element(open, "voice")),
            Self::SayAs(say_as) => {
                let mut attrs = vec![("interpret-as", say_as.interpret_as.clone())];
                if let Some(format) = &say_as.format {
                    attrs.push(("format", format.clone()));
                }
                if let Some(detail) = &say_as.detail {
                    attrs.push(("detail", detail.clone()));
                }
                Wrap::element(format!("<say-as {}>", join_attrs(&attrs)), "say-as")
            }
            Self::Phoneme(phoneme) => {
                let attrs = [
                    ("alphabet", phoneme.alphabet.clone()),
                    ("ph", phoneme.ph.clone()),
                ];
                Wrap::element(format!("<phoneme {}>", join_attrs(&attrs)), "phoneme")
            }
            Self::Prosody(prosody) => prosody
                .open_tag()
                .map_or(Wrap::Unchanged, |open| Wrap::element(open, "prosody")),
            Self::Substitution(alias) => Wrap::element(
                format!("<sub {}>", join_attrs(&[("alias", alias.clone())])),
                "sub",
            ),
            Self::Emphasis(level) => Wrap::element(level.open_tag(), "emphasis"),
            Self::Language(code) => Wrap::element(
                format!("<lang {}>", join_attrs(&[("xml:lang", code.clone())])),
                "lang",
            ),
        }
    }

    /// Wrap raw text into an SSML string.
    #[must_use]
    pub fn wrap(&self, text: &str, extensions: &Extensions) -> String {
        match self.wrapping(text, extensions) {
            Wrap::Around { open, close } => format!("{open}{}{close}", escape_text(text)),
            Wrap::Replace(markup) => markup,
            Wrap::Unchanged => escape_text(text),
        }
    }

    /// Attributes describing this annotation, keyed like the brace form.
    #[must_use]
    pub fn span_attrs(&self) -> BTreeMap<String, String> {
        let mut attrs = BTreeMap::new();
        let mut put = |key: &str, value: Option<&str>| {
            if let Some(value) = value {
                attrs.insert(key.to_owned(), value.to_owned());
            }
        };
        match self {
            Self::Audio(audio) => {
                put("src", Some(audio.src.as_str()));
                put("alt", audio.alt_text.as_deref());
                if let (Some(begin), Some(end)) = (&audio.clip_begin, &audio.clip_end) {
                    put("clip", Some(format!("{begin}-{end}").as_str()));
                }
                put("speed", audio.speed.as_deref());
                put("repeat", audio.repeat_count.map(|n| n.to_string()).as_deref());
                put("repeatdur", audio.repeat_dur.as_deref());
                put("level", audio.sound_level.as_deref());
            }
            Self::Extension(name) => put("ext", Some(name.as_str())),
            Self::Voice(voice) => {
                put("voice", voice.name.as_deref());
                put("voice-lang", voice.language.as_deref());
                put("gender", voice.gender.map(|g| g.as_str()));
                put("variant", voice.variant.map(|v| v.to_string()).as_deref());
            }
            Self::SayAs(say_as) => {
                put("as", Some(say_as.interpret_as.as_str()));
                put("format", say_as.format.as_deref());
                put("detail", say_as.detail.as_deref());
            }
            Self::Phoneme(phoneme) => {
                put("ph", Some(phoneme.ph.as_str()));
                put("alphabet", Some(phoneme.alphabet.as_str()));
            }
            Self::Prosody(prosody) => {
                put("volume", prosody.volume.as_deref());
                put("rate", prosody.rate.as_deref());
                put("pitch", prosody.pitch.as_deref());
            }
            Self::Substitution(alias) => put("sub", Some(alias.as_str())),
            Self::Emphasis(level) => put("level", Some(level.as_str())),
            Self::Language(code) => put("lang", Some(code.as_str())),
        }
        attrs
    }

    /// Record this annotation on a typed segment.
    pub fn apply_to(&self, segment: &mut Segment) {
        match self {
            Self::Audio(audio) => segment.set_transformation(Transformation::Audio(audio.clone())),
            Self::Extension(name) => segment.extension = Some(name.clone()),
            Self::Voice(voice) => segment.voice = Some(voice.clone()),
            Self::SayAs(say_as) => {
                segment.set_transformation(Transformation::SayAs(say_as.clone()));
            }
            Self::Phoneme(phoneme) => {
                segment.set_transformation(Transformation::Phoneme(phoneme.clone()));
            }
            Self::Prosody(prosody) => match &mut segment.prosody {
                Some(existing) => existing.fill_missing(prosody),
                None => segment.prosody = Some(prosody.clone()),
            },
            Self::Substitution(alias) => {
                segment.set_transformation(Transformation::Substitution(alias.clone()));
            }
            Self::Emphasis(level) => segment.emphasis = Some(*level),
            Self::Language(code) => segment.language = Some(code.clone()),
        }
    }
}

/// Merge duplicates of the same variant, keeping first-seen order.
#[must_use]
pub fn combine_duplicates(annotations: Vec<Annotation>) -> Vec<Annotation> {
    let mut combined: Vec<Annotation> = Vec::with_capacity(annotations.len());
    for annotation in annotations {
        match combined.iter_mut().find(|a| a.kind() == annotation.kind()) {
            Some(existing) => existing.combine(&annotation),
            None => combined.push(annotation),
        }
    }
    combined
}

/// Annotations for one parameter string, deduplicated and filtered by
/// `capabilities`.
pub(crate) fn resolve(
    registry: &Registry<'_>,
    form: AnnotationForm,
    params: &str,
    capabilities: Option<&TtsCapabilities>,
) -> Vec<Annotation> {
    let annotations = match form {
        AnnotationForm::Paren => registry.resolve_group(params),
        AnnotationForm::Brace => parse_attributes(params).annotations(),
    };
    combine_duplicates(annotations)
        .into_iter()
        .filter_map(|annotation| match capabilities {
            Some(caps) => caps.filter(annotation),
            None => Some(annotation),
        })
        .collect()
}

fn audio_wrapping(audio: &AudioAttrs, text: &str) -> Wrap {
    let mut attrs = vec![("src", audio.src.clone())];
    if let Some(begin) = &audio.clip_begin {
        attrs.push(("clipBegin", begin.clone()));
    }
    if let Some(end) = &audio.clip_end {
        attrs.push(("clipEnd", end.clone()));
    }
    if let Some(speed) = &audio.speed {
        attrs.push(("speed", speed.clone()));
    }
    if let Some(count) = audio.repeat_count {
        attrs.push(("repeatCount", count.to_string()));
    }
    if let Some(dur) = &audio.repeat_dur {
        attrs.push(("repeatDur", dur.clone()));
    }
    if let Some(level) = &audio.sound_level {
        attrs.push(("soundLevel", level.clone()));
    }
    let open = format!("<audio {}>", join_attrs(&attrs));
    let alt = audio.alt_text.as_deref().map(escape_text).unwrap_or_default();
    if text.is_empty() {
        Wrap::Replace(format!("{open}{alt}</audio>"))
    } else {
        Wrap::Around {
            open: format!("{open}<desc>"),
            close: format!("</desc>{alt}</audio>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn wrap(annotation: &Annotation, text: &str) -> String {
        annotation.wrap(text, &Extensions::default())
    }

    #[test]
    fn test_language_wrap() {
        let annotation = Annotation::Language("en-US".to_owned());
        assert_eq!(wrap(&annotation, "Hi"), "<lang xml:lang=\"en-US\">Hi</lang>");
    }

    #[test]
    fn test_prosody_without_attributes_is_unchanged() {
        let annotation = Annotation::Prosody(ProsodyAttrs::default());
        assert_eq!(wrap(&annotation, "a < b"), "a &lt; b");
    }

    #[test]
    fn test_audio_wrap_with_description_and_alt() {
        let annotation = Annotation::Audio(AudioAttrs {
            src: "cat.ogg".to_owned(),
            alt_text: Some("Sound didn't load".to_owned()),
            ..AudioAttrs::default()
        });
        assert_eq!(
            wrap(&annotation, "purr"),
            "<audio src=\"cat.ogg\"><desc>purr</desc>Sound didn't load</audio>"
        );
    }

    #[test]
    fn test_audio_wrap_empty_text_has_no_desc() {
        let annotation = Annotation::Audio(AudioAttrs {
            src: "miaou.mp3".to_owned(),
            ..AudioAttrs::default()
        });
        assert_eq!(wrap(&annotation, ""), "<audio src=\"miaou.mp3\"></audio>");
    }

    #[test]
    fn test_unknown_extension_is_unchanged() {
        let annotation = Annotation::Extension("robot".to_owned());
        assert_eq!(wrap(&annotation, "beep"), "beep");
    }

    #[test]
    fn test_combine_duplicates_prosody_fills_missing() {
        let combined = combine_duplicates(vec![
            Annotation::Prosody(ProsodyAttrs {
                volume: Some("x-loud".to_owned()),
                ..ProsodyAttrs::default()
            }),
            Annotation::Language("en-US".to_owned()),
            Annotation::Prosody(ProsodyAttrs {
                volume: Some("soft".to_owned()),
                rate: Some("slow".to_owned()),
                pitch: None,
            }),
            Annotation::Language("fr-FR".to_owned()),
        ]);
        assert_eq!(
            combined,
            vec![
                Annotation::Prosody(ProsodyAttrs {
                    volume: Some("x-loud".to_owned()),
                    rate: Some("slow".to_owned()),
                    pitch: None,
                }),
                Annotation::Language("en-US".to_owned()),
            ]
        );
    }

    #[test]
    fn test_apply_to_segment() {
        let mut segment = Segment::new("H2O");
        Annotation::Substitution("water".to_owned()).apply_to(&mut segment);
        Annotation::Language("en-GB".to_owned()).apply_to(&mut segment);
        assert_eq!(segment.substitution(), Some("water"));
        assert_eq!(segment.language.as_deref(), Some("en-GB"));
    }

    #[test]
    fn test_span_attrs_use_brace_keys() {
        let attrs = Annotation::Phoneme(PhonemeAttrs {
            ph: "təˈmeɪtoʊ".to_owned(),
            alphabet: "ipa".to_owned(),
        })
        .span_attrs();
        assert_eq!(attrs.get("ph").map(String::as_str), Some("təˈmeɪtoʊ"));
        assert_eq!(attrs.get("alphabet").map(String::as_str), Some("ipa"));
    }
}
