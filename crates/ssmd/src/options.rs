//! Option types for conversion and parsing.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use ssmd_config::{Config, HeadingEffectConfig};

use crate::annotation::Extensions;
use crate::capabilities::{TtsCapabilities, preset};
use crate::error::SsmdError;
use crate::platform::Platform;
use crate::processor::ProcessorKind;
use crate::splitter::{PunctuationSplitter, SentenceSplitter};
use crate::types::{
    BreakAttrs, EmphasisLevel, HeadingEffect, HeadingLevels, ProsodyAttribute, ProsodyAttrs,
};

/// Settings for [`convert`](crate::convert) and [`strip`](crate::strip).
///
/// # Example
///
/// ```
/// use ssmd::ConvertOptions;
///
/// let options = ConvertOptions::default().with_preset("espeak").unwrap();
/// assert_eq!(ssmd::convert("Hi @here *there*", &options), "<speak>Hi there</speak>");
/// ```
#[derive(Clone, Debug)]
pub struct ConvertOptions {
    /// Processors that do not run at all.
    pub skip: BTreeSet<ProcessorKind>,
    /// Wrap the output in `<speak>`.
    pub output_wrapper_tag: bool,
    /// Re-indent the output.
    pub pretty_print: bool,
    /// Wrap each paragraph line in `<s>`.
    pub auto_sentence_tags: bool,
    pub heading_levels: HeadingLevels,
    /// Target engine; `None` means everything is supported.
    pub capabilities: Option<TtsCapabilities>,
    pub extensions: Extensions,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            skip: BTreeSet::new(),
            output_wrapper_tag: true,
            pretty_print: false,
            auto_sentence_tags: false,
            heading_levels: HeadingLevels::default(),
            capabilities: None,
            extensions: Extensions::default(),
        }
    }
}

impl ConvertOptions {
    /// Do not run the given processor.
    #[must_use]
    pub fn with_skip(mut self, kind: ProcessorKind) -> Self {
        self.skip.insert(kind);
        self
    }

    #[must_use]
    pub fn with_wrapper_tag(mut self, enabled: bool) -> Self {
        self.output_wrapper_tag = enabled;
        self
    }

    #[must_use]
    pub fn with_pretty_print(mut self, enabled: bool) -> Self {
        self.pretty_print = enabled;
        self
    }

    #[must_use]
    pub fn with_auto_sentence_tags(mut self, enabled: bool) -> Self {
        self.auto_sentence_tags = enabled;
        self
    }

    #[must_use]
    pub fn with_heading_levels(mut self, levels: HeadingLevels) -> Self {
        self.heading_levels = levels;
        self
    }

    #[must_use]
    pub fn with_capabilities(mut self, capabilities: TtsCapabilities) -> Self {
        self.capabilities = Some(capabilities);
        self
    }

    /// Use a named capability preset.
    ///
    /// # Errors
    ///
    /// Returns [`SsmdError::UnknownPreset`] if the name is not a preset.
    pub fn with_preset(self, name: &str) -> Result<Self, SsmdError> {
        Ok(self.with_capabilities(preset(name)?))
    }

    /// Register a template extension (`{text}` marks the annotated text).
    #[must_use]
    pub fn with_extension(mut self, name: &str, template: &str) -> Self {
        self.extensions = self.extensions.with_template(name, template);
        self
    }

    /// Load `ssmd.toml` (explicit path or discovered) and build options.
    ///
    /// # Errors
    ///
    /// Returns [`SsmdError::Config`] when the file cannot be loaded, plus
    /// everything [`ConvertOptions::from_config`] reports.
    pub fn from_config_path(path: Option<&Path>) -> Result<Self, SsmdError> {
        let config = Config::load(path, None)?;
        tracing::debug!(path = ?config.config_path, "Loaded converter configuration");
        Self::from_config(&config)
    }

    /// Build options from a loaded configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`SsmdError::InvalidOption`] for values the engine cannot use
    /// and [`SsmdError::UnknownPreset`] for an unknown capability preset.
    pub fn from_config(config: &Config) -> Result<Self, SsmdError> {
        let skip = config
            .converter
            .skip
            .iter()
            .map(|name| name.parse::<ProcessorKind>().map_err(SsmdError::InvalidOption))
            .collect::<Result<BTreeSet<_>, _>>()?;

        let mut extensions = Extensions::default();
        for (name, template) in &config.extensions {
            extensions = extensions.with_template(name, template);
        }

        Ok(Self {
            skip,
            output_wrapper_tag: config.converter.output_speak_tag,
            pretty_print: config.converter.pretty_print,
            auto_sentence_tags: config.converter.auto_sentence_tags,
            heading_levels: heading_levels_from_config(config)?,
            capabilities: capabilities_from_config(config)?,
            extensions,
        })
    }
}

/// Settings for the structured parser and span tracker.
#[derive(Clone)]
pub struct ParseOptions {
    /// Split paragraphs into sentences; otherwise each paragraph is one sentence.
    pub sentence_detection: bool,
    /// Language hint passed to the splitter.
    pub language: String,
    /// Custom sentence splitter; the punctuation splitter is used when unset.
    pub splitter: Option<Arc<dyn SentenceSplitter>>,
    /// Keep sentences outside any voice directive.
    pub include_default_voice: bool,
    pub heading_levels: HeadingLevels,
    pub capabilities: Option<TtsCapabilities>,
    /// Keep source whitespace in span clean text.
    pub preserve_whitespace: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            sentence_detection: true,
            language: "en".to_owned(),
            splitter: None,
            include_default_voice: true,
            heading_levels: HeadingLevels::default(),
            capabilities: None,
            preserve_whitespace: false,
        }
    }
}

impl fmt::Debug for ParseOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseOptions")
            .field("sentence_detection", &self.sentence_detection)
            .field("language", &self.language)
            .field("splitter", &self.splitter.as_ref().map(|_| "custom"))
            .field("include_default_voice", &self.include_default_voice)
            .field("heading_levels", &self.heading_levels)
            .field("capabilities", &self.capabilities)
            .field("preserve_whitespace", &self.preserve_whitespace)
            .finish()
    }
}

impl ParseOptions {
    #[must_use]
    pub fn with_sentence_detection(mut self, enabled: bool) -> Self {
        self.sentence_detection = enabled;
        self
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    #[must_use]
    pub fn with_splitter(mut self, splitter: impl SentenceSplitter + 'static) -> Self {
        self.splitter = Some(Arc::new(splitter));
        self
    }

    #[must_use]
    pub fn with_default_voice(mut self, include: bool) -> Self {
        self.include_default_voice = include;
        self
    }

    #[must_use]
    pub fn with_heading_levels(mut self, levels: HeadingLevels) -> Self {
        self.heading_levels = levels;
        self
    }

    #[must_use]
    pub fn with_capabilities(mut self, capabilities: TtsCapabilities) -> Self {
        self.capabilities = Some(capabilities);
        self
    }

    /// Use a named capability preset.
    ///
    /// # Errors
    ///
    /// Returns [`SsmdError::UnknownPreset`] if the name is not a preset.
    pub fn with_preset(self, name: &str) -> Result<Self, SsmdError> {
        Ok(self.with_capabilities(preset(name)?))
    }

    #[must_use]
    pub fn with_preserve_whitespace(mut self, enabled: bool) -> Self {
        self.preserve_whitespace = enabled;
        self
    }

    /// Load `ssmd.toml` and build parser options.
    ///
    /// # Errors
    ///
    /// Same as [`ConvertOptions::from_config_path`].
    pub fn from_config_path(path: Option<&Path>) -> Result<Self, SsmdError> {
        Self::from_config(&Config::load(path, None)?)
    }

    /// Build options from a loaded configuration file.
    ///
    /// # Errors
    ///
    /// Same as [`ConvertOptions::from_config`].
    pub fn from_config(config: &Config) -> Result<Self, SsmdError> {
        Ok(Self {
            sentence_detection: config.parser.sentence_detection,
            language: config.parser.language.clone(),
            splitter: None,
            include_default_voice: config.parser.include_default_voice,
            heading_levels: heading_levels_from_config(config)?,
            capabilities: capabilities_from_config(config)?,
            preserve_whitespace: config.parser.preserve_whitespace,
        })
    }

    /// The configured splitter or the punctuation splitter.
    pub(crate) fn splitter(&self) -> &dyn SentenceSplitter {
        match &self.splitter {
            Some(splitter) => splitter.as_ref(),
            None => &PunctuationSplitter,
        }
    }
}

fn capabilities_from_config(config: &Config) -> Result<Option<TtsCapabilities>, SsmdError> {
    let section = &config.capabilities;
    if section.is_empty() {
        return Ok(None);
    }
    let Some(platform) = &section.platform else {
        return TtsCapabilities::from_config(section).map(Some);
    };
    let path = match config.config_path.as_deref().and_then(Path::parent) {
        Some(dir) => dir.join(platform),
        None => platform.clone(),
    };
    let table = Platform::load(&path)?;
    Ok(Some(table.capabilities.with_config_flags(section)))
}

/// Configured heading table; an empty `[heading_levels]` keeps the defaults.
fn heading_levels_from_config(config: &Config) -> Result<HeadingLevels, SsmdError> {
    let configured = config.heading_levels();
    if configured.is_empty() {
        return Ok(HeadingLevels::default());
    }
    let mut levels = HeadingLevels::empty();
    for (level, effects) in configured {
        let effects = effects
            .iter()
            .map(heading_effect)
            .collect::<Result<Vec<_>, _>>()?;
        levels = levels.with_level(level, effects);
    }
    Ok(levels)
}

fn heading_effect(effect: &HeadingEffectConfig) -> Result<HeadingEffect, SsmdError> {
    Ok(match effect {
        HeadingEffectConfig::Emphasis(value) => HeadingEffect::Emphasis(
            EmphasisLevel::parse(value)
                .ok_or_else(|| SsmdError::InvalidOption(format!("unknown emphasis level '{value}'")))?,
        ),
        HeadingEffectConfig::Pause(value) => HeadingEffect::Pause(BreakAttrs::from_value(value)),
        HeadingEffectConfig::PauseBefore(value) => {
            HeadingEffect::PauseBefore(BreakAttrs::from_value(value))
        }
        HeadingEffectConfig::Prosody(prosody) => {
            let normalize = |attribute: ProsodyAttribute, value: &Option<String>| {
                value.as_deref().map(|v| attribute.normalize(v))
            };
            HeadingEffect::Prosody(ProsodyAttrs {
                volume: normalize(ProsodyAttribute::Volume, &prosody.volume),
                rate: normalize(ProsodyAttribute::Rate, &prosody.rate),
                pitch: normalize(ProsodyAttribute::Pitch, &prosody.pitch),
            })
        }
    })
}
