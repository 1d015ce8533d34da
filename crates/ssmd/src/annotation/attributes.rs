//! Brace attribute form: `[text]{key="value" key2='v' key3=bare}`.

use std::collections::BTreeMap;

use super::Annotation;
use crate::types::{
    AudioAttrs, DirectiveAttrs, EmphasisLevel, Gender, PhonemeAttrs, ProsodyAttribute, ProsodyAttrs, SayAsAttrs,
    VoiceAttrs,
};

/// Parsed brace attributes with lowercased keys.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttributeMap {
    attrs: BTreeMap<String, String>,
}

/// Parse `key="value"`, `key='value'` and `key=value` pairs.
///
/// Keys are matched case-insensitively and must start with a letter.
/// Anything that is not a pair is skipped.
///
/// # Example
///
/// ```
/// use ssmd::annotation::parse_attributes;
///
/// let attrs = parse_attributes(r#"ph="təˈmeɪtoʊ" Alphabet='ipa' lang=en"#);
/// assert_eq!(attrs.get("alphabet"), Some("ipa"));
/// assert_eq!(attrs.get("lang"), Some("en"));
/// ```
#[must_use]
pub fn parse_attributes(input: &str) -> AttributeMap {
    let mut attrs = BTreeMap::new();
    let mut remaining = input.trim();

    while !remaining.is_empty() {
        if let Some((key, value, rest)) = parse_key_value(remaining) {
            attrs.insert(key.to_ascii_lowercase(), value.to_owned());
            remaining = rest.trim_start();
        } else {
            let mut chars = remaining.chars();
            chars.next();
            remaining = chars.as_str().trim_start();
        }
    }

    AttributeMap { attrs }
}

/// Parse one pair at the start of `s`, returning `(key, value, rest)`.
fn parse_key_value(s: &str) -> Option<(&str, &str, &str)> {
    let key_end = s
        .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '-'))
        .unwrap_or(s.len());
    let key = &s[..key_end];
    if !key.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }

    let after_key = s[key_end..].trim_start();
    let after_eq = after_key.strip_prefix('=')?.trim_start();

    if let Some(stripped) = after_eq.strip_prefix('"') {
        let end_quote = stripped.find('"')?;
        Some((key, &stripped[..end_quote], &stripped[end_quote + 1..]))
    } else if let Some(stripped) = after_eq.strip_prefix('\'') {
        let end_quote = stripped.find('\'')?;
        Some((key, &stripped[..end_quote], &stripped[end_quote + 1..]))
    } else {
        let end = after_eq.find(char::is_whitespace).unwrap_or(after_eq.len());
        if end == 0 {
            return None;
        }
        Some((key, &after_eq[..end], &after_eq[end..]))
    }
}

impl AttributeMap {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    fn has(&self, key: &str) -> bool {
        self.attrs.contains_key(key)
    }

    /// First non-empty value among `keys`.
    fn first(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .filter_map(|key| self.get(key))
            .find(|value| !value.is_empty())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    /// Raw attributes as parsed.
    #[must_use]
    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.attrs
    }

    /// Annotations described by these attributes, in registry priority order.
    ///
    /// An audio source (`src`) makes the span an audio clip and nothing else.
    #[must_use]
    pub fn annotations(&self) -> Vec<Annotation> {
        if let Some(src) = self.get("src") {
            return vec![Annotation::Audio(self.audio(src))];
        }

        let mut annotations = Vec::new();
        if let Some(name) = self.first(&["ext"]) {
            annotations.push(Annotation::Extension(name.to_owned()));
        }
        if let Some(voice) = self.voice() {
            annotations.push(Annotation::Voice(voice));
        }
        if let Some(interpret_as) = self.first(&["as", "say-as"]) {
            annotations.push(Annotation::SayAs(SayAsAttrs {
                interpret_as: interpret_as.to_owned(),
                format: self.get("format").map(str::to_owned),
                detail: self.get("detail").map(str::to_owned),
            }));
        }
        if let Some(phoneme) = self.phoneme() {
            annotations.push(Annotation::Phoneme(phoneme));
        }
        if let Some(prosody) = self.prosody() {
            annotations.push(Annotation::Prosody(prosody));
        }
        if let Some(alias) = self.get("sub") {
            annotations.push(Annotation::Substitution(alias.to_owned()));
        }
        if let Some(level) = self.get("emphasis") {
            annotations.push(Annotation::Emphasis(EmphasisLevel::parse_lenient(level)));
        }
        if let Some(code) = self.first(&["lang", "language"]) {
            annotations.push(Annotation::Language(code.to_owned()));
        }
        annotations
    }

    /// Voice, language and prosody of a `<div ...>` directive.
    pub(crate) fn directive_attrs(&self) -> DirectiveAttrs {
        DirectiveAttrs {
            voice: self.voice(),
            language: self.first(&["lang", "language"]).map(str::to_owned),
            prosody: self.prosody(),
        }
    }

    fn audio(&self, src: &str) -> AudioAttrs {
        let mut audio = AudioAttrs {
            src: src.to_owned(),
            ..AudioAttrs::default()
        };
        if let Some((begin, end)) = self.get("clip").and_then(|clip| clip.split_once('-')) {
            audio.clip_begin = Some(begin.trim().to_owned());
            audio.clip_end = Some(end.trim().to_owned());
        }
        audio.speed = self.first(&["speed"]).map(str::to_owned);
        audio.repeat_count = self.get("repeat").and_then(|n| n.trim().parse().ok());
        audio.repeat_dur = self.first(&["repeatdur"]).map(str::to_owned);
        audio.sound_level = self.first(&["level"]).map(str::to_owned);
        audio.alt_text = self.first(&["alt"]).map(str::to_owned);
        audio
    }

    fn voice(&self) -> Option<VoiceAttrs> {
        if !["voice", "voice-lang", "voice_lang", "gender", "variant"]
            .iter()
            .any(|key| self.has(key))
        {
            return None;
        }
        Some(VoiceAttrs {
            name: self.first(&["voice"]).map(str::to_owned),
            language: self.first(&["voice-lang", "voice_lang"]).map(str::to_owned),
            gender: self.get("gender").and_then(Gender::parse),
            variant: self.get("variant").and_then(|v| v.trim().parse().ok()),
        })
    }

    fn phoneme(&self) -> Option<PhonemeAttrs> {
        let (ph, alphabet) = if let Some(ipa) = self.get("ipa") {
            (ipa, "ipa".to_owned())
        } else if let Some(sampa) = self.get("sampa") {
            (sampa, "x-sampa".to_owned())
        } else {
            let ph = self.get("ph")?;
            let alphabet = self.get("alphabet").unwrap_or("ipa").to_ascii_lowercase();
            let alphabet = if alphabet == "sampa" {
                "x-sampa".to_owned()
            } else {
                alphabet
            };
            (ph, alphabet)
        };
        Some(PhonemeAttrs {
            ph: ph.to_owned(),
            alphabet,
        })
    }

    fn prosody(&self) -> Option<ProsodyAttrs> {
        let mut prosody = ProsodyAttrs::default();
        for (attribute, keys) in [
            (ProsodyAttribute::Volume, ["volume", "v"]),
            (ProsodyAttribute::Rate, ["rate", "r"]),
            (ProsodyAttribute::Pitch, ["pitch", "p"]),
        ] {
            let value = self.first(&keys).map(|value| attribute.normalize(value));
            prosody.set(attribute, value);
        }
        (!prosody.is_empty()).then_some(prosody)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_quoted_and_bare_values() {
        let attrs = parse_attributes(r#"ph="a b" LANG='fr' v=5"#);
        assert_eq!(attrs.get("ph"), Some("a b"));
        assert_eq!(attrs.get("lang"), Some("fr"));
        assert_eq!(attrs.get("v"), Some("5"));
    }

    #[test]
    fn test_parse_skips_garbage() {
        let attrs = parse_attributes("#id .cls ü= 1=x sub=water");
        assert_eq!(attrs.as_map().len(), 1);
        assert_eq!(attrs.get("sub"), Some("water"));
    }

    #[test]
    fn test_parse_unterminated_quote() {
        let attrs = parse_attributes(r#"sub="water lang=en"#);
        assert_eq!(attrs.get("sub"), None);
        assert_eq!(attrs.get("lang"), Some("en"));
    }

    #[test]
    fn test_src_means_audio_only() {
        let attrs = parse_attributes("src=beep.mp3 clip=1s-2s repeat=2 lang=en");
        assert_eq!(
            attrs.annotations(),
            vec![Annotation::Audio(AudioAttrs {
                src: "beep.mp3".to_owned(),
                clip_begin: Some("1s".to_owned()),
                clip_end: Some("2s".to_owned()),
                repeat_count: Some(2),
                ..AudioAttrs::default()
            })]
        );
    }

    #[test]
    fn test_annotations_in_priority_order() {
        let attrs = parse_attributes("lang=fr sub=eau v=4 sampa=o");
        assert_eq!(
            attrs.annotations(),
            vec![
                Annotation::Phoneme(PhonemeAttrs {
                    ph: "o".to_owned(),
                    alphabet: "x-sampa".to_owned(),
                }),
                Annotation::Prosody(ProsodyAttrs {
                    volume: Some("loud".to_owned()),
                    ..ProsodyAttrs::default()
                }),
                Annotation::Substitution("eau".to_owned()),
                Annotation::Language("fr".to_owned()),
            ]
        );
    }

    #[test]
    fn test_voice_attributes() {
        let attrs = parse_attributes("voice-lang=en-GB gender=male");
        assert_eq!(
            attrs.annotations(),
            vec![Annotation::Voice(VoiceAttrs {
                name: None,
                language: Some("en-GB".to_owned()),
                gender: Some(Gender::Male),
                variant: None,
            })]
        );
    }
}
