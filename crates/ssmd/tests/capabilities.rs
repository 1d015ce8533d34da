use pretty_assertions::assert_eq;
use ssmd::{ConvertOptions, SsmdError, TtsCapabilities};

fn convert_with(text: &str, capabilities: TtsCapabilities) -> String {
    ssmd::convert(text, &ConvertOptions::default().with_capabilities(capabilities))
}

fn convert_preset(text: &str, preset: &str) -> String {
    let options = ConvertOptions::default()
        .with_preset(preset)
        .unwrap_or_else(|err| panic!("preset {preset}: {err}"));
    ssmd::convert(text, &options)
}

#[test]
fn test_emphasis_disabled() {
    let caps = TtsCapabilities {
        emphasis: false,
        ..TtsCapabilities::full()
    };
    let ssml = convert_with("Hello *world*", caps);
    assert!(!ssml.contains("<emphasis>"));
    assert!(ssml.contains("world"));
}

#[test]
fn test_prosody_disabled() {
    let caps = TtsCapabilities {
        prosody: false,
        ..TtsCapabilities::full()
    };
    let ssml = convert_with("++loud text++", caps);
    assert!(!ssml.contains("<prosody"));
    assert!(ssml.contains("loud text"));
}

#[test]
fn test_break_disabled() {
    let caps = TtsCapabilities {
        break_tags: false,
        ..TtsCapabilities::full()
    };
    let ssml = convert_with("Hello ...500ms world", caps);
    assert!(!ssml.contains("<break"));
    assert!(ssml.contains("Hello") && ssml.contains("world"));
}

#[test]
fn test_language_disabled() {
    let caps = TtsCapabilities {
        language: false,
        ..TtsCapabilities::full()
    };
    let ssml = convert_with("[Bonjour](fr) ami", caps);
    assert!(!ssml.contains("<lang"));
    assert!(ssml.contains("Bonjour"));
}

#[test]
fn test_audio_disabled() {
    let caps = TtsCapabilities {
        audio: false,
        ..TtsCapabilities::full()
    };
    let ssml = convert_with("[sound](beep.mp3)", caps);
    assert!(!ssml.contains("<audio"));
    assert!(ssml.contains("sound"));
}

#[test]
fn test_substitution_disabled() {
    let caps = TtsCapabilities {
        substitution: false,
        ..TtsCapabilities::full()
    };
    let ssml = convert_with("[H2O](sub: water)", caps);
    assert!(!ssml.contains("<sub"));
    assert!(ssml.contains("H2O"));
}

#[test]
fn test_preset_espeak() {
    let ssml = convert_preset("Hello *world* ...500ms [Bonjour](fr)", "espeak");
    assert!(!ssml.contains("<emphasis>"));
    assert!(ssml.contains("<break"));
    assert!(ssml.contains("<lang"));
}

#[test]
fn test_preset_pyttsx3() {
    let ssml = convert_preset("Hello *world* ...500ms [Bonjour](fr)", "pyttsx3");
    assert!(!ssml.contains("<emphasis>"));
    assert!(!ssml.contains("<break"));
    assert!(!ssml.contains("<lang"));
    assert!(ssml.contains("Hello") && ssml.contains("world"));
}

#[test]
fn test_preset_google() {
    let ssml = convert_preset("Hello *world* ...500ms [Bonjour](fr)", "google");
    assert!(ssml.contains("<emphasis>"));
    assert!(ssml.contains("<break"));
    assert!(ssml.contains("<lang"));
}

#[test]
fn test_preset_minimal_keeps_all_text() {
    let text = "# Heading\n\nHello *world* ...1s ++loud++ [France](fr) with ^^excitement^^ @m";
    let ssml = convert_preset(text, "minimal");
    for tag in ["<emphasis", "<break", "<lang", "<prosody", "<mark"] {
        assert!(!ssml.contains(tag), "{tag} in {ssml}");
    }
    for word in ["Heading", "Hello", "world", "France", "excitement"] {
        assert!(ssml.contains(word), "{word} missing from {ssml}");
    }
}

#[test]
fn test_unknown_preset() {
    let err = ConvertOptions::default().with_preset("nope").unwrap_err();
    assert!(matches!(err, SsmdError::UnknownPreset { .. }));
    assert!(err.to_string().contains("espeak"));
}

#[test]
fn test_partial_prosody_support() {
    let caps = TtsCapabilities {
        rate: false,
        ..TtsCapabilities::full()
    };
    let ssml = convert_with(">>fast>> and ++loud++", caps);
    assert!(ssml.contains("fast"));
    assert!(!ssml.contains("rate="));
    assert!(ssml.contains("volume=\"x-loud\""));
}

#[test]
fn test_extension_filtering() {
    let caps = TtsCapabilities::full().with_extension("whisper", false);
    let ssml = convert_with("[quiet](ext: whisper)", caps);
    assert!(!ssml.contains("amazon:effect"));
    assert!(ssml.contains("quiet"));

    let caps = TtsCapabilities::full().with_extension("whisper", true);
    assert!(convert_with("[quiet](ext: whisper)", caps).contains("amazon:effect"));
}

#[test]
fn test_disabling_features_only_removes_markup() {
    // Turning a capability off never adds markup nor loses text.
    let text = "Hi *there* [H2O](sub: water) ...500ms @m ++up++ [Hola](es)";
    let full = ssmd::strip(text, &ConvertOptions::default());
    let reduced = [
        TtsCapabilities {
            emphasis: false,
            ..TtsCapabilities::full()
        },
        TtsCapabilities {
            substitution: false,
            mark: false,
            ..TtsCapabilities::full()
        },
        TtsCapabilities::minimal(),
    ];
    let baseline = convert_with(text, TtsCapabilities::full());
    for caps in reduced {
        let ssml = convert_with(text, caps);
        assert!(ssml.matches('<').count() <= baseline.matches('<').count());
        for word in full.split_whitespace() {
            assert!(ssml.contains(word), "{word} missing from {ssml}");
        }
    }
}

#[test]
fn test_minimal_output_is_wrapped_text() {
    assert_eq!(
        convert_preset("Hello *world*!", "minimal"),
        "<speak>Hello world!</speak>"
    );
}
