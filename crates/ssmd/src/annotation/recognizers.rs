//! Recognizers for single `(params)` entries.
//!
//! Each recognizer inspects one trimmed parameter string and returns an
//! [`Annotation`] when the string uses its syntax.

use std::sync::LazyLock;

use regex::Regex;

use super::Annotation;
use crate::types::{
    AudioAttrs, EmphasisLevel, Gender, PhonemeAttrs, ProsodyAttribute, ProsodyAttrs, SayAsAttrs,
    VoiceAttrs,
};
use crate::xsampa::XsampaTable;

/// Default locale for two-letter language codes.
const DEFAULT_LOCALES: &[(&str, &str)] = &[
    ("en", "en-US"),
    ("de", "de-DE"),
    ("fr", "fr-FR"),
    ("es", "es-ES"),
    ("it", "it-IT"),
    ("pt", "pt-PT"),
    ("ru", "ru-RU"),
    ("zh", "zh-CN"),
    ("ja", "ja-JP"),
    ("ko", "ko-KR"),
    ("ar", "ar-SA"),
    ("hi", "hi-IN"),
    ("nl", "nl-NL"),
    ("pl", "pl-PL"),
    ("sv", "sv-SE"),
    ("da", "da-DK"),
    ("no", "no-NO"),
    ("fi", "fi-FI"),
];

static AUDIO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^((?:https?://)?\S+\.(?:mp3|ogg|wav|m4a|aac|flac))(?:\s+(.+))?$")
        .expect("invalid audio regex")
});

static CLIP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"clip:\s*(\d+(?:\.\d+)?(?:ms|s))-(\d+(?:\.\d+)?(?:ms|s))")
        .expect("invalid clip regex")
});

static SPEED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"speed:\s*(\d+(?:\.\d+)?%)").expect("invalid speed regex"));

static REPEAT_DUR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)repeatdur:\s*(\d+(?:\.\d+)?(?:ms|s))").expect("invalid repeatdur regex")
});

static REPEAT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"repeat:\s*(\d+)").expect("invalid repeat regex"));

static LEVEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"level:\s*([+-]?\d+(?:\.\d+)?dB)").expect("invalid level regex")
});

static DOUBLE_COMMA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*,\s*,\s*").expect("invalid comma regex"));

static EXTENSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ext:\s*(\w+)$").expect("invalid extension regex"));

static VOICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^voice:\s*([a-zA-Z0-9_-]+)((?:\s*,\s*(?:gender:\s*(?:male|female|neutral)|variant:\s*\d+))*)$",
    )
    .expect("invalid voice regex")
});

static SAY_AS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^(?:as|say-as):\s*(\w+)(?:\s*,\s*format:\s*["']?([^"']+)["']?)?(?:\s*,\s*detail:\s*(\d+))?$"#,
    )
    .expect("invalid say-as regex")
});

static PHONEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(ph|ipa):\s*(.+)$").expect("invalid phoneme regex"));

static PROSODY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:vrp:\s*(\d{1,3})|([vrp]|volume|rate|pitch):\s*(.+))$")
        .expect("invalid prosody regex")
});

static SUBSTITUTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^sub:\s*(.+)$").expect("invalid substitution regex"));

static EMPHASIS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^emphasis:\s*(\w+)$").expect("invalid emphasis regex"));

static LANGUAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:lang(?:uage)?:\s*)?([a-z]{2}(?:-[A-Z]{2})?)$").expect("invalid language regex")
});

static LANGUAGE_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{2}(?:-[A-Z]{2})?$").expect("invalid language regex"));

/// Expand a two-letter language code to its default locale.
///
/// Codes with a region, and unknown two-letter codes, are returned as given.
#[must_use]
pub fn expand_language(code: &str) -> String {
    DEFAULT_LOCALES
        .iter()
        .find(|(short, _)| *short == code)
        .map_or_else(|| code.to_owned(), |(_, locale)| (*locale).to_owned())
}

pub(crate) fn is_language_code(value: &str) -> bool {
    LANGUAGE_CODE_RE.is_match(value)
}

/// Parse a voice value such as `Joanna`, `en-GB` or `fr-FR, gender: female, variant: 2`.
///
/// The first comma-separated part is a language when it looks like a language
/// code or when gender/variant are given; otherwise it is a voice name.
#[must_use]
pub fn parse_voice_value(value: &str) -> VoiceAttrs {
    let mut parts = value.split(',').map(str::trim);
    let first = parts.next().unwrap_or_default();
    let mut voice = VoiceAttrs::default();

    for part in parts {
        if let Some(gender) = part.strip_prefix("gender:") {
            voice.gender = Gender::parse(gender);
        } else if let Some(variant) = part.strip_prefix("variant:") {
            voice.variant = variant.trim().parse().ok();
        }
    }

    if is_language_code(first) || voice.gender.is_some() || voice.variant.is_some() {
        voice.language = Some(first.to_owned());
    } else {
        voice.name = Some(first.to_owned());
    }
    voice
}

pub(super) fn audio(param: &str) -> Option<Annotation> {
    let caps = AUDIO_RE.captures(param)?;
    let mut audio = AudioAttrs {
        src: caps[1].trim().to_owned(),
        ..AudioAttrs::default()
    };
    let Some(rest) = caps.get(2) else {
        return Some(Annotation::Audio(audio));
    };

    let mut remaining = rest.as_str().trim().to_owned();
    if let Some(clip) = take_match(&CLIP_RE, &mut remaining, 2) {
        let mut clip = clip.into_iter();
        audio.clip_begin = clip.next();
        audio.clip_end = clip.next();
    }
    audio.speed = take_match(&SPEED_RE, &mut remaining, 1).and_then(first_group);
    audio.repeat_dur = take_match(&REPEAT_DUR_RE, &mut remaining, 1).and_then(first_group);
    audio.repeat_count = take_match(&REPEAT_RE, &mut remaining, 1)
        .and_then(first_group)
        .and_then(|count| count.parse().ok());
    audio.sound_level = take_match(&LEVEL_RE, &mut remaining, 1).and_then(first_group);

    let cleaned = DOUBLE_COMMA_RE.replace_all(&remaining, ", ");
    let alt = cleaned.trim_matches(|c: char| c == ',' || c.is_whitespace());
    if !alt.is_empty() {
        audio.alt_text = Some(alt.to_owned());
    }
    Some(Annotation::Audio(audio))
}

/// Remove the first match of `re` from `text`, returning its capture groups.
fn take_match(re: &Regex, text: &mut String, groups: usize) -> Option<Vec<String>> {
    let caps = re.captures(text)?;
    let whole = caps.get(0)?.range();
    let values = (1..=groups)
        .filter_map(|i| caps.get(i).map(|m| m.as_str().to_owned()))
        .collect();
    text.replace_range(whole, "");
    Some(values)
}

fn first_group(groups: Vec<String>) -> Option<String> {
    groups.into_iter().next()
}

pub(super) fn extension(param: &str) -> Option<Annotation> {
    let caps = EXTENSION_RE.captures(param)?;
    Some(Annotation::Extension(caps[1].to_owned()))
}

pub(super) fn voice(param: &str) -> Option<Annotation> {
    let caps = VOICE_RE.captures(param)?;
    let value = format!("{}{}", &caps[1], caps.get(2).map_or("", |m| m.as_str()));
    Some(Annotation::Voice(parse_voice_value(&value)))
}

pub(super) fn say_as(param: &str) -> Option<Annotation> {
    let caps = SAY_AS_RE.captures(param)?;
    Some(Annotation::SayAs(SayAsAttrs {
        interpret_as: caps[1].to_owned(),
        format: caps.get(2).map(|m| m.as_str().trim().to_owned()),
        detail: caps.get(3).map(|m| m.as_str().to_owned()),
    }))
}

pub(super) fn phoneme(param: &str, xsampa: &XsampaTable) -> Option<Annotation> {
    let caps = PHONEME_RE.captures(param)?;
    let value = caps[2].trim();
    let ph = if &caps[1] == "ph" {
        xsampa.to_ipa(value)
    } else {
        value.to_owned()
    };
    Some(Annotation::Phoneme(PhonemeAttrs {
        ph,
        alphabet: "ipa".to_owned(),
    }))
}

pub(super) fn prosody(param: &str) -> Option<Annotation> {
    let caps = PROSODY_RE.captures(param)?;
    let mut prosody = ProsodyAttrs::default();

    if let Some(digits) = caps.get(1) {
        for (attribute, digit) in ProsodyAttribute::ALL.into_iter().zip(digits.as_str().chars()) {
            prosody.set(attribute, attribute.level(digit).map(str::to_owned));
        }
    } else {
        let attribute = match &caps[2] {
            "v" | "volume" => ProsodyAttribute::Volume,
            "r" | "rate" => ProsodyAttribute::Rate,
            _ => ProsodyAttribute::Pitch,
        };
        prosody.set(attribute, Some(attribute.normalize(&caps[3])));
    }
    Some(Annotation::Prosody(prosody))
}

pub(super) fn substitution(param: &str) -> Option<Annotation> {
    let caps = SUBSTITUTION_RE.captures(param)?;
    Some(Annotation::Substitution(caps[1].trim().to_owned()))
}

pub(super) fn emphasis(param: &str) -> Option<Annotation> {
    let caps = EMPHASIS_RE.captures(param)?;
    Some(Annotation::Emphasis(EmphasisLevel::parse_lenient(&caps[1])))
}

pub(super) fn language(param: &str) -> Option<Annotation> {
    let caps = LANGUAGE_RE.captures(param)?;
    Some(Annotation::Language(expand_language(&caps[1])))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_expand_language() {
        assert_eq!(expand_language("en"), "en-US");
        assert_eq!(expand_language("en-GB"), "en-GB");
        assert_eq!(expand_language("xx"), "xx");
    }

    #[test]
    fn test_voice_value_name_or_language() {
        assert_eq!(parse_voice_value("Joanna"), VoiceAttrs::named("Joanna"));
        assert_eq!(
            parse_voice_value("fr-FR, gender: female, variant: 2"),
            VoiceAttrs {
                name: None,
                language: Some("fr-FR".to_owned()),
                gender: Some(Gender::Female),
                variant: Some(2),
            }
        );
    }

    #[test]
    fn test_audio_with_attributes_and_alt_text() {
        let annotation = audio("music.mp3 clip: 5s-30s, speed: 120%, level: -3dB Fallback text");
        assert_eq!(
            annotation,
            Some(Annotation::Audio(AudioAttrs {
                src: "music.mp3".to_owned(),
                alt_text: Some("Fallback text".to_owned()),
                clip_begin: Some("5s".to_owned()),
                clip_end: Some("30s".to_owned()),
                speed: Some("120%".to_owned()),
                repeat_count: None,
                repeat_dur: None,
                sound_level: Some("-3dB".to_owned()),
            }))
        );
    }

    #[test]
    fn test_audio_requires_known_extension() {
        assert_eq!(audio("notes.txt"), None);
        assert!(audio("https://example.com/boing.MP3").is_some());
    }

    #[test]
    fn test_say_as_with_format() {
        assert_eq!(
            say_as("as: date, format: \"dd.mm.yyyy\""),
            Some(Annotation::SayAs(SayAsAttrs {
                interpret_as: "date".to_owned(),
                format: Some("dd.mm.yyyy".to_owned()),
                detail: None,
            }))
        );
    }

    #[test]
    fn test_phoneme_xsampa_converted() {
        let table = XsampaTable::new();
        assert_eq!(
            phoneme("ph: dIC", &table),
            Some(Annotation::Phoneme(PhonemeAttrs {
                ph: "dɪç".to_owned(),
                alphabet: "ipa".to_owned(),
            }))
        );
    }

    #[test]
    fn test_prosody_digit_shorthand() {
        assert_eq!(
            prosody("vrp: 555"),
            Some(Annotation::Prosody(ProsodyAttrs {
                volume: Some("x-loud".to_owned()),
                rate: Some("x-fast".to_owned()),
                pitch: Some("x-high".to_owned()),
            }))
        );
        assert_eq!(
            prosody("v: +10dB"),
            Some(Annotation::Prosody(ProsodyAttrs {
                volume: Some("+10dB".to_owned()),
                ..ProsodyAttrs::default()
            }))
        );
    }

    #[test]
    fn test_language_forms() {
        assert_eq!(language("de"), Some(Annotation::Language("de-DE".to_owned())));
        assert_eq!(
            language("lang: en-GB"),
            Some(Annotation::Language("en-GB".to_owned()))
        );
        assert_eq!(language("english"), None);
    }
}
