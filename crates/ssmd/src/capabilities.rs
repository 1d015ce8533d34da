//! Target engine capabilities.
//!
//! A [`TtsCapabilities`] value declares which SSML features a speech engine
//! understands. Unsupported features are elided to plain text: processors
//! for them run in strip mode and unsupported annotations are dropped.

use std::collections::{BTreeMap, BTreeSet};

use ssmd_config::CapabilitiesConfig;

use crate::annotation::Annotation;
use crate::error::SsmdError;
use crate::processor::ProcessorKind;
use crate::types::{ProsodyAttribute, ProsodyAttrs};

/// Preset names accepted by [`preset`], in lookup order.
pub const PRESET_NAMES: &[&str] = &[
    "espeak",
    "pyttsx3",
    "google",
    "polly",
    "amazon",
    "azure",
    "microsoft",
    "minimal",
    "full",
];

/// SSML feature flags of a speech engine.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[allow(clippy::struct_excessive_bools)]
pub struct TtsCapabilities {
    pub emphasis: bool,
    #[cfg_attr(feature = "serde", serde(rename = "break"))]
    pub break_tags: bool,
    pub paragraph: bool,
    pub language: bool,
    pub phoneme: bool,
    pub substitution: bool,
    pub prosody: bool,
    /// Only effective while `prosody` is set.
    pub volume: bool,
    pub rate: bool,
    pub pitch: bool,
    pub say_as: bool,
    pub audio: bool,
    pub mark: bool,
    pub voice: bool,
    pub sentence_tags: bool,
    pub heading_emphasis: bool,
    /// Platform extensions; an absent name is unsupported.
    pub extensions: BTreeMap<String, bool>,
}

impl Default for TtsCapabilities {
    fn default() -> Self {
        Self::full()
    }
}

impl TtsCapabilities {
    /// Every feature supported, no extensions.
    #[must_use]
    pub fn full() -> Self {
        Self {
            emphasis: true,
            break_tags: true,
            paragraph: true,
            language: true,
            phoneme: true,
            substitution: true,
            prosody: true,
            volume: true,
            rate: true,
            pitch: true,
            say_as: true,
            audio: true,
            mark: true,
            voice: true,
            sentence_tags: true,
            heading_emphasis: true,
            extensions: BTreeMap::new(),
        }
    }

    /// Plain text only.
    #[must_use]
    pub fn minimal() -> Self {
        Self {
            emphasis: false,
            break_tags: false,
            paragraph: false,
            language: false,
            phoneme: false,
            substitution: false,
            prosody: false,
            volume: false,
            rate: false,
            pitch: false,
            say_as: false,
            audio: false,
            mark: false,
            voice: false,
            sentence_tags: false,
            heading_emphasis: false,
            extensions: BTreeMap::new(),
        }
    }

    fn espeak() -> Self {
        Self {
            emphasis: false,
            paragraph: false,
            substitution: false,
            say_as: false,
            audio: false,
            mark: false,
            sentence_tags: false,
            heading_emphasis: false,
            ..Self::full()
        }
    }

    fn pyttsx3() -> Self {
        Self {
            prosody: true,
            volume: true,
            rate: true,
            voice: true,
            ..Self::minimal()
        }
    }

    fn polly() -> Self {
        Self {
            audio: false,
            ..Self::full()
        }
        .with_extension("whisper", true)
        .with_extension("drc", true)
    }

    /// Set support for one extension.
    #[must_use]
    pub fn with_extension(mut self, name: &str, supported: bool) -> Self {
        self.extensions.insert(name.to_owned(), supported);
        self
    }

    /// Build from a configuration section: the preset (or `full`) with the
    /// explicitly set flags applied on top.
    ///
    /// A `platform` table is resolved by
    /// [`ConvertOptions::from_config`](crate::ConvertOptions::from_config),
    /// which knows where the config file lives.
    ///
    /// # Errors
    ///
    /// Returns [`SsmdError::UnknownPreset`] for an unknown preset name.
    pub fn from_config(config: &CapabilitiesConfig) -> Result<Self, SsmdError> {
        let base = match &config.preset {
            Some(name) => preset(name)?,
            None => Self::full(),
        };
        Ok(base.with_config_flags(config))
    }

    /// Apply the flags and extensions a configuration section sets explicitly.
    #[must_use]
    pub fn with_config_flags(mut self, config: &CapabilitiesConfig) -> Self {
        let flags = [
            (&mut self.emphasis, config.emphasis),
            (&mut self.break_tags, config.break_tags),
            (&mut self.paragraph, config.paragraph),
            (&mut self.language, config.language),
            (&mut self.phoneme, config.phoneme),
            (&mut self.substitution, config.substitution),
            (&mut self.prosody, config.prosody),
            (&mut self.volume, config.volume),
            (&mut self.rate, config.rate),
            (&mut self.pitch, config.pitch),
            (&mut self.say_as, config.say_as),
            (&mut self.audio, config.audio),
            (&mut self.mark, config.mark),
            (&mut self.voice, config.voice),
            (&mut self.sentence_tags, config.sentence_tags),
            (&mut self.heading_emphasis, config.heading_emphasis),
        ];
        for (flag, value) in flags {
            if let Some(value) = value {
                *flag = value;
            }
        }
        self.extensions
            .extend(config.extensions.iter().map(|(k, v)| (k.clone(), *v)));
        self
    }

    /// Processors that must run in strip mode for this engine.
    #[must_use]
    pub fn to_skip_set(&self) -> BTreeSet<ProcessorKind> {
        [
            (self.emphasis, ProcessorKind::Emphasis),
            (self.break_tags, ProcessorKind::Break),
            (self.paragraph, ProcessorKind::Paragraph),
            (self.mark, ProcessorKind::Mark),
            (self.prosody, ProcessorKind::Prosody),
            (self.sentence_tags, ProcessorKind::Sentence),
            (self.heading_emphasis, ProcessorKind::Heading),
        ]
        .into_iter()
        .filter_map(|(supported, kind)| (!supported).then_some(kind))
        .collect()
    }

    #[must_use]
    pub fn supports_extension(&self, name: &str) -> bool {
        self.extensions.get(name).copied().unwrap_or(false)
    }

    /// Whether one prosody dimension can be emitted.
    #[must_use]
    pub fn supports_prosody(&self, attribute: ProsodyAttribute) -> bool {
        self.prosody
            && match attribute {
                ProsodyAttribute::Volume => self.volume,
                ProsodyAttribute::Rate => self.rate,
                ProsodyAttribute::Pitch => self.pitch,
            }
    }

    #[must_use]
    pub fn is_annotation_supported(&self, annotation: &Annotation) -> bool {
        match annotation {
            Annotation::Audio(_) => self.audio,
            Annotation::Extension(name) => self.supports_extension(name),
            Annotation::Voice(_) => self.voice,
            Annotation::SayAs(_) => self.say_as,
            Annotation::Phoneme(_) => self.phoneme,
            Annotation::Prosody(_) => self.prosody,
            Annotation::Substitution(_) => self.substitution,
            Annotation::Emphasis(_) => self.emphasis,
            Annotation::Language(_) => self.language,
        }
    }

    /// Prosody limited to the supported dimensions, `None` when nothing is left.
    #[must_use]
    pub fn filter_prosody(&self, prosody: &ProsodyAttrs) -> Option<ProsodyAttrs> {
        let mut filtered = ProsodyAttrs::default();
        for attribute in ProsodyAttribute::ALL {
            if self.supports_prosody(attribute) {
                filtered.set(attribute, prosody.get(attribute).map(str::to_owned));
            }
        }
        (!filtered.is_empty()).then_some(filtered)
    }

    /// The supported part of an annotation.
    #[must_use]
    pub fn filter(&self, annotation: Annotation) -> Option<Annotation> {
        if !self.is_annotation_supported(&annotation) {
            tracing::debug!(
                kind = annotation.kind().as_str(),
                "Annotation not supported by target engine"
            );
            return None;
        }
        match annotation {
            Annotation::Prosody(prosody) => self.filter_prosody(&prosody).map(Annotation::Prosody),
            other => Some(other),
        }
    }
}

/// Capabilities of a known engine, by case-insensitive name.
///
/// # Errors
///
/// Returns [`SsmdError::UnknownPreset`] when the name is not one of
/// [`PRESET_NAMES`].
///
/// # Example
///
/// ```
/// let caps = ssmd::capabilities::preset("eSpeak").unwrap();
/// assert!(!caps.emphasis);
/// assert!(ssmd::capabilities::preset("robot").is_err());
/// ```
pub fn preset(name: &str) -> Result<TtsCapabilities, SsmdError> {
    match name.trim().to_ascii_lowercase().as_str() {
        "espeak" => Ok(TtsCapabilities::espeak()),
        "pyttsx3" => Ok(TtsCapabilities::pyttsx3()),
        "google" | "azure" | "microsoft" | "full" => Ok(TtsCapabilities::full()),
        "polly" | "amazon" => Ok(TtsCapabilities::polly()),
        "minimal" => Ok(TtsCapabilities::minimal()),
        _ => Err(SsmdError::UnknownPreset {
            name: name.to_owned(),
            available: PRESET_NAMES.join(", "),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EmphasisLevel;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_skip_set_from_flags() {
        let caps = preset("espeak").unwrap();
        let skip: Vec<_> = caps.to_skip_set().into_iter().collect();
        assert_eq!(
            skip,
            vec![
                ProcessorKind::Emphasis,
                ProcessorKind::Mark,
                ProcessorKind::Heading,
                ProcessorKind::Paragraph,
                ProcessorKind::Sentence,
            ]
        );
        assert!(TtsCapabilities::full().to_skip_set().is_empty());
    }

    #[test]
    fn test_preset_names_case_insensitive() {
        assert_eq!(preset("POLLY").unwrap(), preset("amazon").unwrap());
        assert!(preset("Polly").unwrap().supports_extension("whisper"));
        assert!(!preset("full").unwrap().supports_extension("whisper"));
    }

    #[test]
    fn test_unknown_preset_lists_available() {
        let err = preset("robot").unwrap_err();
        assert!(err.to_string().contains("espeak, pyttsx3"));
    }

    #[test]
    fn test_minimal_supports_nothing() {
        let caps = preset("minimal").unwrap();
        assert!(!caps.is_annotation_supported(&Annotation::Language("en-US".to_owned())));
        assert!(!caps.is_annotation_supported(&Annotation::Emphasis(EmphasisLevel::Strong)));
        assert_eq!(caps.to_skip_set().len(), 7);
    }

    #[test]
    fn test_filter_drops_unsupported_prosody_dimensions() {
        let caps = preset("pyttsx3").unwrap();
        let prosody = ProsodyAttrs {
            volume: Some("loud".to_owned()),
            rate: None,
            pitch: Some("high".to_owned()),
        };
        assert_eq!(
            caps.filter(Annotation::Prosody(prosody)),
            Some(Annotation::Prosody(ProsodyAttrs {
                volume: Some("loud".to_owned()),
                ..ProsodyAttrs::default()
            }))
        );
        let pitch_only = ProsodyAttrs {
            pitch: Some("high".to_owned()),
            ..ProsodyAttrs::default()
        };
        assert_eq!(caps.filter(Annotation::Prosody(pitch_only)), None);
    }

    #[test]
    fn test_sub_flags_need_prosody() {
        let caps = TtsCapabilities {
            prosody: false,
            ..TtsCapabilities::full()
        };
        assert!(!caps.supports_prosody(ProsodyAttribute::Volume));
    }

    #[test]
    fn test_from_config_applies_overrides() {
        let config = CapabilitiesConfig {
            preset: Some("espeak".to_owned()),
            mark: Some(true),
            extensions: BTreeMap::from([("whisper".to_owned(), true)]),
            ..CapabilitiesConfig::default()
        };
        let caps = TtsCapabilities::from_config(&config).unwrap();
        assert!(caps.mark);
        assert!(!caps.emphasis);
        assert!(caps.supports_extension("whisper"));
    }

    #[test]
    fn test_from_config_unknown_preset() {
        let config = CapabilitiesConfig {
            preset: Some("nope".to_owned()),
            ..CapabilitiesConfig::default()
        };
        assert!(matches!(
            TtsCapabilities::from_config(&config),
            Err(SsmdError::UnknownPreset { .. })
        ));
    }
}
