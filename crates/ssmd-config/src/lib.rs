//! Configuration management for the SSMD engine.
//!
//! Parses `ssmd.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! Command-line style overrides can be applied during load via [`Overrides`].
//!
//! ## Layout
//!
//! ```toml
//! [converter]
//! skip = ["mark"]
//! output_speak_tag = true
//! pretty_print = false
//! auto_sentence_tags = false
//!
//! [parser]
//! sentence_detection = true
//! language = "en"
//! include_default_voice = true
//! preserve_whitespace = false
//!
//! [capabilities]
//! preset = "polly"   # or: platform = "platforms/polly.json"
//! mark = false
//!
//! [capabilities.extensions]
//! whisper = true
//!
//! [heading_levels]
//! 1 = [{ emphasis = "strong" }, { pause = "300ms" }]
//! 2 = [{ prosody = { rate = "slow" } }]
//!
//! [extensions]
//! robot = '<amazon:effect vocal-tract-length="+20%">{text}</amazon:effect>'
//! ```
//!
//! The engine crate turns a [`Config`] into its option types; this crate only
//! knows the file format and its structural validation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Configuration filename to search for.
pub const CONFIG_FILENAME: &str = "ssmd.toml";

/// Processor names accepted in `converter.skip`.
pub const PROCESSOR_NAMES: &[&str] = &[
    "directive",
    "emphasis",
    "annotation",
    "mark",
    "prosody",
    "heading",
    "paragraph",
    "sentence",
    "break",
];

/// Overrides applied on top of configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct Overrides {
    /// Override capability preset.
    pub preset: Option<String>,
    /// Override `<speak>` wrapping.
    pub output_speak_tag: Option<bool>,
    /// Override pretty printing.
    pub pretty_print: Option<bool>,
    /// Override automatic `<s>` wrapping.
    pub auto_sentence_tags: Option<bool>,
    /// Override parser language hint.
    pub language: Option<String>,
}

/// Engine configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SSML converter settings.
    pub converter: ConverterConfig,
    /// Structured parser settings.
    pub parser: ParserConfig,
    /// Target engine capabilities.
    pub capabilities: CapabilitiesConfig,
    /// Heading effects keyed by level (`"1"`..`"6"`).
    ///
    /// An empty table keeps the built-in defaults.
    pub heading_levels: BTreeMap<String, Vec<HeadingEffectConfig>>,
    /// Custom extension templates, `{text}` is replaced by the annotated text.
    pub extensions: BTreeMap<String, String>,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Converter configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Processors that are not run at all.
    pub skip: Vec<String>,
    /// Wrap output in `<speak>`.
    pub output_speak_tag: bool,
    /// Re-indent the produced XML.
    pub pretty_print: bool,
    /// Wrap every line of a paragraph in `<s>`.
    pub auto_sentence_tags: bool,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            skip: Vec::new(),
            output_speak_tag: true,
            pretty_print: false,
            auto_sentence_tags: false,
        }
    }
}

/// Parser configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Split paragraphs into sentences.
    pub sentence_detection: bool,
    /// Language hint passed to the sentence splitter.
    pub language: String,
    /// Keep sentences that carry no voice.
    pub include_default_voice: bool,
    /// Keep original whitespace in span clean text.
    pub preserve_whitespace: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            sentence_detection: true,
            language: "en".to_owned(),
            include_default_voice: true,
            preserve_whitespace: false,
        }
    }
}

/// Capability section: an optional preset plus per-flag overrides.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CapabilitiesConfig {
    /// Named engine preset (`espeak`, `polly`, ...).
    pub preset: Option<String>,
    /// ssml.green platform table (JSON), relative to the config file.
    pub platform: Option<PathBuf>,
    pub emphasis: Option<bool>,
    #[serde(rename = "break")]
    pub break_tags: Option<bool>,
    pub paragraph: Option<bool>,
    pub language: Option<bool>,
    pub phoneme: Option<bool>,
    pub substitution: Option<bool>,
    pub prosody: Option<bool>,
    pub volume: Option<bool>,
    pub rate: Option<bool>,
    pub pitch: Option<bool>,
    pub say_as: Option<bool>,
    pub audio: Option<bool>,
    pub mark: Option<bool>,
    pub voice: Option<bool>,
    pub sentence_tags: Option<bool>,
    pub heading_emphasis: Option<bool>,
    /// Named extension flags.
    pub extensions: BTreeMap<String, bool>,
}

impl CapabilitiesConfig {
    /// Whether the section sets neither a preset nor any flag.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let flags = [
            self.emphasis,
            self.break_tags,
            self.paragraph,
            self.language,
            self.phoneme,
            self.substitution,
            self.prosody,
            self.volume,
            self.rate,
            self.pitch,
            self.say_as,
            self.audio,
            self.mark,
            self.voice,
            self.sentence_tags,
            self.heading_emphasis,
        ];
        self.preset.is_none()
            && self.platform.is_none()
            && flags.iter().all(Option::is_none)
            && self.extensions.is_empty()
    }
}

/// One effect applied to a heading line.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadingEffectConfig {
    /// Emphasis level (`none`, `reduced`, `moderate`, `strong`).
    Emphasis(String),
    /// Break after the heading (`300ms`, `1s`, or a strength).
    Pause(String),
    /// Break before the heading.
    PauseBefore(String),
    /// Prosody wrapper.
    Prosody(ProsodyConfig),
}

/// Prosody values for heading effects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProsodyConfig {
    pub volume: Option<String>,
    pub rate: Option<String>,
    pub pitch: Option<String>,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
}

const EMPHASIS_LEVELS: &[&str] = &["none", "reduced", "moderate", "strong"];

fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional overrides.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `ssmd.toml` in the current directory and parents,
    /// falling back to defaults when none is found.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, or if reading,
    /// parsing or validation fails.
    pub fn load(
        config_path: Option<&Path>,
        overrides: Option<&Overrides>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = std::env::current_dir()
            .ok()
            .and_then(|cwd| Self::discover_from(&cwd))
        {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(overrides) = overrides {
            config.apply_overrides(overrides);
        }

        Ok(config)
    }

    /// Parse and validate configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` or `ConfigError::Validation`.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Search for a config file in `start` and its parents.
    #[must_use]
    pub fn discover_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&content)?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(preset) = &overrides.preset {
            self.capabilities.preset = Some(preset.clone());
        }
        if let Some(wrap) = overrides.output_speak_tag {
            self.converter.output_speak_tag = wrap;
        }
        if let Some(pretty) = overrides.pretty_print {
            self.converter.pretty_print = pretty;
        }
        if let Some(auto) = overrides.auto_sentence_tags {
            self.converter.auto_sentence_tags = auto;
        }
        if let Some(language) = &overrides.language {
            self.parser.language.clone_from(language);
        }
    }

    /// Heading effects with level keys parsed to numbers.
    ///
    /// Only meaningful after [`Config::validate`] succeeded; invalid keys are skipped.
    #[must_use]
    pub fn heading_levels(&self) -> BTreeMap<u8, &[HeadingEffectConfig]> {
        self.heading_levels
            .iter()
            .filter_map(|(key, effects)| {
                key.trim()
                    .parse::<u8>()
                    .ok()
                    .map(|level| (level, effects.as_slice()))
            })
            .collect()
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_converter()?;
        require_non_empty(&self.parser.language, "parser.language")?;
        if let Some(preset) = &self.capabilities.preset {
            require_non_empty(preset, "capabilities.preset")?;
        }
        if self.capabilities.preset.is_some() && self.capabilities.platform.is_some() {
            return Err(ConfigError::Validation(
                "capabilities: set either preset or platform, not both".to_owned(),
            ));
        }
        self.validate_heading_levels()?;
        for (name, template) in &self.extensions {
            require_non_empty(name, "extensions key")?;
            require_non_empty(template, &format!("extensions.{name}"))?;
        }
        Ok(())
    }

    fn validate_converter(&self) -> Result<(), ConfigError> {
        for name in &self.converter.skip {
            if !PROCESSOR_NAMES.contains(&name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "converter.skip: unknown processor '{name}' (expected one of: {})",
                    PROCESSOR_NAMES.join(", ")
                )));
            }
        }
        Ok(())
    }

    fn validate_heading_levels(&self) -> Result<(), ConfigError> {
        for (key, effects) in &self.heading_levels {
            let level = key.trim().parse::<u8>().ok();
            if !matches!(level, Some(1..=6)) {
                return Err(ConfigError::Validation(format!(
                    "heading_levels: level must be 1-6, got '{key}'"
                )));
            }
            for effect in effects {
                match effect {
                    HeadingEffectConfig::Emphasis(value) => {
                        if !EMPHASIS_LEVELS.contains(&value.as_str()) {
                            return Err(ConfigError::Validation(format!(
                                "heading_levels.{key}: invalid emphasis '{value}'"
                            )));
                        }
                    }
                    HeadingEffectConfig::Pause(value) | HeadingEffectConfig::PauseBefore(value) => {
                        require_non_empty(value, &format!("heading_levels.{key} pause"))?;
                    }
                    HeadingEffectConfig::Prosody(_) => {}
                }
            }
        }
        Ok(())
    }
}
