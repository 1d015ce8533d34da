//! Capabilities from an ssml.green platform table.
//!
//! The table is JSON with one object per section, each mapping a feature key
//! (such as `elements››time (optional)`) to whether the platform supports it.
//! Sections are flattened into one key map; missing keys count as supported.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;

use crate::capabilities::TtsCapabilities;
use crate::error::SsmdError;

const EMPHASIS_LEVEL: &str = "elements››level (optional)";
const EMPHASIS_LEVEL_VALUES: &[&str] = &[
    "attribute values››level=\"strong\"",
    "attribute values››level=\"moderate\" (default)",
    "attribute values››level=\"none\"",
    "attribute values››level=\"reduced\"",
];
const BREAK_STRENGTH: &str = "elements››strength (optional)";
const BREAK_TIME: &str = "elements››time (optional)";
const PHONEME: &str = "elements››ph (required)";
const SUBSTITUTION: &str = "elements››alias (required)";
const RATE: &str = "elements››rate (optional)";
const PITCH: &str = "elements››pitch (optional)";
const VOLUME: &str = "elements››volume (optional)";
const LANG_ROOT: &str = "elements››xml:lang (required)";
const LANG_SENTENCE: &str = "elements›~~(sentence)›xml:lang (optional)";
const LANG_PARAGRAPH: &str = "elements› (paragraph)›xml:lang (optional)";
const SAY_AS: &str = "elements››interpret-as (required)";

/// Where `xml:lang` may appear on a platform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LanguageScopes {
    pub root: bool,
    pub sentence: bool,
    pub paragraph: bool,
}

/// A loaded platform table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Platform {
    pub capabilities: TtsCapabilities,
    pub language_scopes: LanguageScopes,
    /// Flattened feature keys as found in the table.
    pub keys: BTreeMap<String, bool>,
}

impl Platform {
    /// Parse a platform table.
    ///
    /// # Errors
    ///
    /// Returns [`SsmdError::PlatformTable`] when `json` is not valid JSON.
    pub fn from_json(json: &str) -> Result<Self, SsmdError> {
        let table: Value = serde_json::from_str(json)?;
        Ok(Self::from_keys(flatten(&table)))
    }

    /// Read and parse a platform table file.
    ///
    /// # Errors
    ///
    /// Returns [`SsmdError::Io`] when the file cannot be read and
    /// [`SsmdError::PlatformTable`] when it is not valid JSON.
    pub fn load(path: &Path) -> Result<Self, SsmdError> {
        let json = std::fs::read_to_string(path)?;
        let platform = Self::from_json(&json)?;
        tracing::debug!(path = %path.display(), keys = platform.keys.len(), "Loaded platform table");
        Ok(platform)
    }

    fn from_keys(keys: BTreeMap<String, bool>) -> Self {
        let key = |name: &str| keys.get(name).copied().unwrap_or(true);

        // Listed emphasis levels that are all unsupported disable emphasis.
        let levels_listed = EMPHASIS_LEVEL_VALUES.iter().any(|k| keys.contains_key(*k));
        let any_level = EMPHASIS_LEVEL_VALUES
            .iter()
            .any(|k| keys.get(*k).copied().unwrap_or(false));
        let emphasis = key(EMPHASIS_LEVEL) && (!levels_listed || any_level);

        let language_scopes = LanguageScopes {
            root: key(LANG_ROOT),
            sentence: key(LANG_SENTENCE),
            paragraph: key(LANG_PARAGRAPH),
        };
        let capabilities = TtsCapabilities {
            emphasis,
            break_tags: key(BREAK_STRENGTH) || key(BREAK_TIME),
            paragraph: true,
            language: language_scopes.root || language_scopes.sentence || language_scopes.paragraph,
            phoneme: key(PHONEME),
            substitution: key(SUBSTITUTION),
            prosody: key(RATE) || key(PITCH) || key(VOLUME),
            say_as: key(SAY_AS),
            ..TtsCapabilities::full()
        };
        Self {
            capabilities,
            language_scopes,
            keys,
        }
    }

    /// Whether a raw table key is supported, `default` when absent.
    #[must_use]
    pub fn supports_key(&self, key: &str, default: bool) -> bool {
        self.keys.get(key).copied().unwrap_or(default)
    }
}

/// Boolean entries of every top-level section; other values are ignored.
fn flatten(table: &Value) -> BTreeMap<String, bool> {
    let Some(sections) = table.as_object() else {
        return BTreeMap::new();
    };
    sections
        .values()
        .filter_map(Value::as_object)
        .flat_map(|section| {
            section
                .iter()
                .filter_map(|(key, value)| value.as_bool().map(|b| (key.clone(), b)))
        })
        .collect()
}
