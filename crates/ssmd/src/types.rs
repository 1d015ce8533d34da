//! Typed document model produced by the structured parser.
//!
//! A document is a list of [`Sentence`]s, each made of [`Segment`]s. Attribute
//! structs are shared with the annotation registry so both passes describe
//! the same facts with the same types.

use std::collections::BTreeMap;
use std::fmt;

/// Emphasis strength.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum EmphasisLevel {
    None,
    Reduced,
    #[default]
    Moderate,
    Strong,
}

impl EmphasisLevel {
    /// Parse a level name, falling back to [`EmphasisLevel::Moderate`].
    #[must_use]
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" => Self::None,
            "reduced" => Self::Reduced,
            "strong" => Self::Strong,
            _ => Self::Moderate,
        }
    }

    /// Parse a level name strictly.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" => Some(Self::None),
            "reduced" => Some(Self::Reduced),
            "moderate" => Some(Self::Moderate),
            "strong" => Some(Self::Strong),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Reduced => "reduced",
            Self::Moderate => "moderate",
            Self::Strong => "strong",
        }
    }

    /// Opening `<emphasis>` tag; moderate is the SSML default and carries no level.
    #[must_use]
    pub fn open_tag(self) -> String {
        match self {
            Self::Moderate => "<emphasis>".to_owned(),
            level => format!("<emphasis level=\"{}\">", level.as_str()),
        }
    }
}

impl fmt::Display for EmphasisLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Voice gender.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Gender {
    Male,
    Female,
    Neutral,
}

impl Gender {
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "male" => Some(Self::Male),
            "female" => Some(Self::Female),
            "neutral" => Some(Self::Neutral),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Neutral => "neutral",
        }
    }
}

/// Voice selection: either a named voice or a language/gender/variant query.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VoiceAttrs {
    /// Voice name (e.g. `Joanna`, `en-US-Wavenet-A`).
    pub name: Option<String>,
    /// BCP-47 language code.
    pub language: Option<String>,
    pub gender: Option<Gender>,
    /// Variant number for disambiguation.
    pub variant: Option<u32>,
}

impl VoiceAttrs {
    /// Named voice.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Attribute list for the `<voice>` element, in output order.
    #[must_use]
    pub fn xml_attrs(&self) -> Vec<(&'static str, String)> {
        let mut attrs = Vec::new();
        if let Some(name) = &self.name {
            attrs.push(("name", name.clone()));
        }
        if let Some(language) = &self.language {
            attrs.push(("language", language.clone()));
        }
        if let Some(gender) = self.gender {
            attrs.push(("gender", gender.as_str().to_owned()));
        }
        if let Some(variant) = self.variant {
            attrs.push(("variant", variant.to_string()));
        }
        attrs
    }

    /// Opening `<voice>` tag, or `None` when no attribute is set.
    #[must_use]
    pub fn open_tag(&self) -> Option<String> {
        let attrs = self.xml_attrs();
        if attrs.is_empty() {
            return None;
        }
        Some(format!("<voice {}>", join_attrs(&attrs)))
    }
}

/// Volume, rate and pitch values.
///
/// Values are either named levels (`x-soft` .. `x-loud`) or relative values
/// such as `+10dB` or `-5%`, kept verbatim.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProsodyAttrs {
    pub volume: Option<String>,
    pub rate: Option<String>,
    pub pitch: Option<String>,
}

impl ProsodyAttrs {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.volume.is_none() && self.rate.is_none() && self.pitch.is_none()
    }

    /// Fill fields that are unset here from `other`.
    pub fn fill_missing(&mut self, other: &Self) {
        if self.volume.is_none() {
            self.volume.clone_from(&other.volume);
        }
        if self.rate.is_none() {
            self.rate.clone_from(&other.rate);
        }
        if self.pitch.is_none() {
            self.pitch.clone_from(&other.pitch);
        }
    }

    #[must_use]
    pub fn get(&self, attribute: ProsodyAttribute) -> Option<&str> {
        match attribute {
            ProsodyAttribute::Volume => self.volume.as_deref(),
            ProsodyAttribute::Rate => self.rate.as_deref(),
            ProsodyAttribute::Pitch => self.pitch.as_deref(),
        }
    }

    pub fn set(&mut self, attribute: ProsodyAttribute, value: Option<String>) {
        match attribute {
            ProsodyAttribute::Volume => self.volume = value,
            ProsodyAttribute::Rate => self.rate = value,
            ProsodyAttribute::Pitch => self.pitch = value,
        }
    }

    /// Attribute list for the `<prosody>` element, in output order.
    #[must_use]
    pub fn xml_attrs(&self) -> Vec<(&'static str, String)> {
        let mut attrs = Vec::new();
        if let Some(volume) = &self.volume {
            attrs.push(("volume", volume.clone()));
        }
        if let Some(rate) = &self.rate {
            attrs.push(("rate", rate.clone()));
        }
        if let Some(pitch) = &self.pitch {
            attrs.push(("pitch", pitch.clone()));
        }
        attrs
    }

    /// Opening `<prosody>` tag, or `None` when no attribute is set.
    #[must_use]
    pub fn open_tag(&self) -> Option<String> {
        let attrs = self.xml_attrs();
        if attrs.is_empty() {
            return None;
        }
        Some(format!("<prosody {}>", join_attrs(&attrs)))
    }
}

/// One of the three prosody dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProsodyAttribute {
    Volume,
    Rate,
    Pitch,
}

impl ProsodyAttribute {
    pub const ALL: [Self; 3] = [Self::Volume, Self::Rate, Self::Pitch];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Volume => "volume",
            Self::Rate => "rate",
            Self::Pitch => "pitch",
        }
    }

    /// Named level for a digit. Volume counts from 0 (`silent`), rate and pitch from 1.
    #[must_use]
    pub fn level(self, digit: char) -> Option<&'static str> {
        let levels: &[&str] = match self {
            Self::Volume => &["silent", "x-soft", "soft", "medium", "loud", "x-loud"],
            Self::Rate => &["", "x-slow", "slow", "medium", "fast", "x-fast"],
            Self::Pitch => &["", "x-low", "low", "medium", "high", "x-high"],
        };
        let index = digit.to_digit(10)? as usize;
        levels.get(index).copied().filter(|level| !level.is_empty())
    }

    fn is_named_level(self, value: &str) -> bool {
        ('0'..='5').any(|digit| self.level(digit) == Some(value))
    }

    /// Normalize a user value: relative values verbatim, digits to named
    /// levels, known names lowercased, anything else kept as written.
    #[must_use]
    pub fn normalize(self, value: &str) -> String {
        let value = value.trim();
        if value.starts_with(['+', '-']) || value.ends_with("dB") || value.ends_with('%') {
            return value.to_owned();
        }
        let mut chars = value.chars();
        if let (Some(digit), None) = (chars.next(), chars.next())
            && let Some(level) = self.level(digit)
        {
            return level.to_owned();
        }
        let lowered = value.to_ascii_lowercase();
        if self.is_named_level(&lowered) {
            return lowered;
        }
        value.to_owned()
    }
}

/// Break strength levels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum BreakStrength {
    None,
    XWeak,
    Weak,
    Medium,
    Strong,
    XStrong,
}

impl BreakStrength {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::XWeak => "x-weak",
            Self::Weak => "weak",
            Self::Medium => "medium",
            Self::Strong => "strong",
            Self::XStrong => "x-strong",
        }
    }

    /// Strength for a single-letter break marker (`...n`, `...c`, ...).
    #[must_use]
    pub fn from_marker(marker: char) -> Option<Self> {
        match marker {
            'n' | '0' => Some(Self::None),
            'w' => Some(Self::XWeak),
            'c' => Some(Self::Medium),
            's' => Some(Self::Strong),
            'p' => Some(Self::XStrong),
            _ => None,
        }
    }

    /// Marker letter used when writing SSMD.
    #[must_use]
    pub fn marker(self) -> char {
        match self {
            Self::None => 'n',
            Self::XWeak | Self::Weak => 'w',
            Self::Medium => 'c',
            Self::Strong => 's',
            Self::XStrong => 'p',
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "none" => Some(Self::None),
            "x-weak" => Some(Self::XWeak),
            "weak" => Some(Self::Weak),
            "medium" => Some(Self::Medium),
            "strong" => Some(Self::Strong),
            "x-strong" => Some(Self::XStrong),
            _ => None,
        }
    }
}

/// A pause, either timed or by strength.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum BreakAttrs {
    /// Duration such as `500ms` or `2s`.
    Time(String),
    Strength(BreakStrength),
}

impl BreakAttrs {
    /// Interpret a configured pause value: a strength name or a duration.
    ///
    /// Bare numbers are milliseconds.
    #[must_use]
    pub fn from_value(value: &str) -> Self {
        let value = value.trim();
        if let Some(strength) = BreakStrength::parse(value) {
            return Self::Strength(strength);
        }
        if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
            return Self::Time(format!("{value}ms"));
        }
        Self::Time(value.to_owned())
    }

    /// Self-closing `<break/>` element.
    #[must_use]
    pub fn to_ssml(&self) -> String {
        match self {
            Self::Time(time) => format!("<break time=\"{time}\"/>"),
            Self::Strength(strength) => format!("<break strength=\"{}\"/>", strength.as_str()),
        }
    }

    /// SSMD break marker (`...500ms`, `...s`).
    #[must_use]
    pub fn to_ssmd(&self) -> String {
        match self {
            Self::Time(time) => format!("...{time}"),
            Self::Strength(strength) => format!("...{}", strength.marker()),
        }
    }
}

/// `<say-as>` interpretation.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SayAsAttrs {
    /// Interpretation type (`telephone`, `date`, `cardinal`, ...).
    pub interpret_as: String,
    /// Format string, e.g. `dd.mm.yyyy` for dates.
    pub format: Option<String>,
    pub detail: Option<String>,
}

/// Pronunciation in a phonetic alphabet.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhonemeAttrs {
    pub ph: String,
    /// `ipa` or `x-sampa`.
    pub alphabet: String,
}

/// Audio clip replacing the spoken content.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AudioAttrs {
    /// Audio file URL or path.
    pub src: String,
    /// Fallback text spoken when the audio cannot be played.
    pub alt_text: Option<String>,
    pub clip_begin: Option<String>,
    pub clip_end: Option<String>,
    /// Playback speed as a percentage (`150%`).
    pub speed: Option<String>,
    pub repeat_count: Option<u32>,
    pub repeat_dur: Option<String>,
    /// Volume adjustment in decibels (`+6dB`).
    pub sound_level: Option<String>,
}

/// How a segment's text is spoken instead of read literally.
///
/// At most one transformation applies to a segment.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Transformation {
    SayAs(SayAsAttrs),
    /// Alias spoken instead of the text.
    Substitution(String),
    Phoneme(PhonemeAttrs),
    /// Audio replaces the text entirely; the text becomes its description.
    Audio(AudioAttrs),
}

impl Transformation {
    /// Priority when several transformations compete for one segment.
    pub(crate) fn rank(&self) -> u8 {
        match self {
            Self::Audio(_) => 0,
            Self::SayAs(_) => 1,
            Self::Phoneme(_) => 2,
            Self::Substitution(_) => 3,
        }
    }
}

/// A run of text with uniform speech attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Segment {
    /// Raw text content, before any transformation.
    pub text: String,
    pub transformation: Option<Transformation>,
    pub emphasis: Option<EmphasisLevel>,
    pub language: Option<String>,
    pub prosody: Option<ProsodyAttrs>,
    pub voice: Option<VoiceAttrs>,
    /// Platform-specific extension name (e.g. `whisper`).
    pub extension: Option<String>,
    pub breaks_before: Vec<BreakAttrs>,
    pub breaks_after: Vec<BreakAttrs>,
    pub marks_before: Vec<String>,
    pub marks_after: Vec<String>,
    /// Character offset of the segment in the source text.
    pub position: usize,
}

impl Segment {
    /// Plain segment with the given text.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Set a transformation, keeping the higher-priority one on conflict.
    pub fn set_transformation(&mut self, transformation: Transformation) {
        match &self.transformation {
            Some(existing) if existing.rank() <= transformation.rank() => {}
            _ => self.transformation = Some(transformation),
        }
    }

    #[must_use]
    pub fn say_as(&self) -> Option<&SayAsAttrs> {
        match &self.transformation {
            Some(Transformation::SayAs(attrs)) => Some(attrs),
            _ => None,
        }
    }

    #[must_use]
    pub fn substitution(&self) -> Option<&str> {
        match &self.transformation {
            Some(Transformation::Substitution(alias)) => Some(alias),
            _ => None,
        }
    }

    #[must_use]
    pub fn phoneme(&self) -> Option<&PhonemeAttrs> {
        match &self.transformation {
            Some(Transformation::Phoneme(attrs)) => Some(attrs),
            _ => None,
        }
    }

    #[must_use]
    pub fn audio(&self) -> Option<&AudioAttrs> {
        match &self.transformation {
            Some(Transformation::Audio(attrs)) => Some(attrs),
            _ => None,
        }
    }
}

/// A logical sentence spoken as one unit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sentence {
    pub segments: Vec<Segment>,
    /// Voice inherited from the enclosing directive block.
    pub voice: Option<VoiceAttrs>,
    /// Language inherited from the enclosing directive block.
    pub language: Option<String>,
    /// Prosody inherited from the enclosing directive block.
    pub prosody: Option<ProsodyAttrs>,
    /// Pauses after the sentence ends.
    pub breaks_after: Vec<BreakAttrs>,
    /// Last sentence of a paragraph that is followed by another paragraph.
    pub is_paragraph_end: bool,
    /// Character offset of the sentence in the source text.
    pub position: usize,
}

impl Sentence {
    /// Concatenated segment text.
    #[must_use]
    pub fn text(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            if !out.is_empty() && !starts_with_punctuation(&segment.text) {
                out.push(' ');
            }
            out.push_str(&segment.text);
        }
        out
    }
}

fn starts_with_punctuation(text: &str) -> bool {
    text.starts_with(['.', '!', '?', ',', ':', ';'])
}

/// Voice, language and prosody inherited through nested directive blocks.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DirectiveAttrs {
    pub voice: Option<VoiceAttrs>,
    pub language: Option<String>,
    pub prosody: Option<ProsodyAttrs>,
}

impl DirectiveAttrs {
    /// Child-overrides-parent merge, field by field.
    #[must_use]
    pub fn merged_with(&self, child: &Self) -> Self {
        Self {
            voice: child.voice.clone().or_else(|| self.voice.clone()),
            language: child.language.clone().or_else(|| self.language.clone()),
            prosody: child.prosody.clone().or_else(|| self.prosody.clone()),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.voice.is_none() && self.language.is_none() && self.prosody.is_none()
    }
}

/// One effect applied to a heading line.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum HeadingEffect {
    Emphasis(EmphasisLevel),
    /// Break after the heading text.
    Pause(BreakAttrs),
    /// Break before the heading text.
    PauseBefore(BreakAttrs),
    Prosody(ProsodyAttrs),
}

/// Heading effects per level (1-6).
///
/// Levels without an entry are read as plain text.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HeadingLevels {
    levels: BTreeMap<u8, Vec<HeadingEffect>>,
}

impl HeadingLevels {
    /// Table without any configured level.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            levels: BTreeMap::new(),
        }
    }

    /// Set the effects for one level.
    #[must_use]
    pub fn with_level(mut self, level: u8, effects: Vec<HeadingEffect>) -> Self {
        self.levels.insert(level, effects);
        self
    }

    #[must_use]
    pub fn get(&self, level: u8) -> Option<&[HeadingEffect]> {
        self.levels.get(&level).map(Vec::as_slice)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

impl Default for HeadingLevels {
    fn default() -> Self {
        let pause = |ms: &str| HeadingEffect::Pause(BreakAttrs::Time(ms.to_owned()));
        Self::empty()
            .with_level(
                1,
                vec![HeadingEffect::Emphasis(EmphasisLevel::Strong), pause("100ms")],
            )
            .with_level(
                2,
                vec![HeadingEffect::Emphasis(EmphasisLevel::Moderate), pause("75ms")],
            )
            .with_level(
                3,
                vec![HeadingEffect::Emphasis(EmphasisLevel::Reduced), pause("50ms")],
            )
    }
}

/// Join `(name, value)` pairs into an XML attribute string.
pub(crate) fn join_attrs(attrs: &[(&str, String)]) -> String {
    attrs
        .iter()
        .map(|(name, value)| format!("{name}=\"{}\"", crate::xml::escape_attr(value)))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_emphasis_lenient_fallback() {
        assert_eq!(EmphasisLevel::parse_lenient("STRONG"), EmphasisLevel::Strong);
        assert_eq!(EmphasisLevel::parse_lenient("shouty"), EmphasisLevel::Moderate);
        assert_eq!(EmphasisLevel::parse("shouty"), None);
    }

    #[test]
    fn test_emphasis_open_tag() {
        assert_eq!(EmphasisLevel::Moderate.open_tag(), "<emphasis>");
        assert_eq!(
            EmphasisLevel::Reduced.open_tag(),
            "<emphasis level=\"reduced\">"
        );
    }

    #[test]
    fn test_prosody_fill_missing() {
        let mut first = ProsodyAttrs {
            volume: Some("loud".to_owned()),
            ..ProsodyAttrs::default()
        };
        let second = ProsodyAttrs {
            volume: Some("soft".to_owned()),
            rate: Some("fast".to_owned()),
            pitch: None,
        };
        first.fill_missing(&second);
        assert_eq!(first.volume.as_deref(), Some("loud"));
        assert_eq!(first.rate.as_deref(), Some("fast"));
        assert_eq!(first.pitch, None);
        assert_eq!(
            first.open_tag().as_deref(),
            Some("<prosody volume=\"loud\" rate=\"fast\">")
        );
    }

    #[test]
    fn test_prosody_normalize() {
        assert_eq!(ProsodyAttribute::Volume.normalize("0"), "silent");
        assert_eq!(ProsodyAttribute::Volume.normalize("5"), "x-loud");
        assert_eq!(ProsodyAttribute::Rate.normalize("0"), "0");
        assert_eq!(ProsodyAttribute::Pitch.normalize("4"), "high");
        assert_eq!(ProsodyAttribute::Volume.normalize("+10dB"), "+10dB");
        assert_eq!(ProsodyAttribute::Pitch.normalize("-4%"), "-4%");
        assert_eq!(ProsodyAttribute::Rate.normalize("FAST"), "fast");
        assert_eq!(ProsodyAttribute::Rate.normalize("120"), "120");
    }

    #[test]
    fn test_break_from_value() {
        assert_eq!(
            BreakAttrs::from_value("300ms"),
            BreakAttrs::Time("300ms".to_owned())
        );
        assert_eq!(BreakAttrs::from_value("250"), BreakAttrs::Time("250ms".to_owned()));
        assert_eq!(
            BreakAttrs::from_value("strong"),
            BreakAttrs::Strength(BreakStrength::Strong)
        );
        assert_eq!(BreakAttrs::from_value("x-weak").to_ssmd(), "...w");
    }

    #[test]
    fn test_transformation_priority() {
        let mut segment = Segment::new("x");
        segment.set_transformation(Transformation::Substitution("y".to_owned()));
        segment.set_transformation(Transformation::SayAs(SayAsAttrs {
            interpret_as: "characters".to_owned(),
            format: None,
            detail: None,
        }));
        assert!(segment.say_as().is_some());
        segment.set_transformation(Transformation::Substitution("z".to_owned()));
        assert!(segment.substitution().is_none());
    }

    #[test]
    fn test_directive_merge_child_overrides_field_by_field() {
        let parent = DirectiveAttrs {
            voice: Some(VoiceAttrs::named("sarah")),
            language: Some("en-US".to_owned()),
            prosody: None,
        };
        let child = DirectiveAttrs {
            language: Some("fr-FR".to_owned()),
            ..DirectiveAttrs::default()
        };
        let merged = parent.merged_with(&child);
        assert_eq!(merged.voice, Some(VoiceAttrs::named("sarah")));
        assert_eq!(merged.language.as_deref(), Some("fr-FR"));
    }

    #[test]
    fn test_default_heading_levels() {
        let levels = HeadingLevels::default();
        assert_eq!(
            levels.get(1),
            Some(
                &[
                    HeadingEffect::Emphasis(EmphasisLevel::Strong),
                    HeadingEffect::Pause(BreakAttrs::Time("100ms".to_owned())),
                ][..]
            )
        );
        assert!(levels.get(4).is_none());
    }

    #[test]
    fn test_sentence_text_joins_segments() {
        let sentence = Sentence {
            segments: vec![Segment::new("Hello"), Segment::new("world"), Segment::new("!")],
            ..Sentence::default()
        };
        assert_eq!(sentence.text(), "Hello world!");
    }
}
