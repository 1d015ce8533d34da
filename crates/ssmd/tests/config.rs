use std::fs;

use pretty_assertions::assert_eq;
use ssmd::{
    BreakAttrs, Config, ConfigError, ConvertOptions, EmphasisLevel, HeadingEffect, Overrides,
    ParseOptions, ProcessorKind, SsmdError,
};

fn write_config(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ssmd.toml");
    fs::write(&path, content).unwrap();
    (dir, path)
}

#[test]
fn test_load_and_convert() {
    let (_dir, path) = write_config(
        r#"
[converter]
skip = ["mark"]
output_speak_tag = false

[capabilities]
preset = "polly"

[heading_levels]
1 = [{ emphasis = "reduced" }, { pause = "1s" }]

[extensions]
robot = "<robot>{text}</robot>"
"#,
    );
    let config = Config::load(Some(&path), None).unwrap();
    assert_eq!(config.config_path.as_deref(), Some(path.as_path()));

    let options = ConvertOptions::from_config(&config).unwrap();
    assert!(options.skip.contains(&ProcessorKind::Mark));
    assert!(!options.output_wrapper_tag);
    assert_eq!(
        options.heading_levels.get(1),
        Some(
            &[
                HeadingEffect::Emphasis(EmphasisLevel::Reduced),
                HeadingEffect::Pause(BreakAttrs::Time("1s".to_owned())),
            ][..]
        )
    );
    assert!(options.heading_levels.get(2).is_none());

    let ssml = ssmd::convert("# Hi\n[beep](ext: robot) @keep", &options);
    assert!(ssml.contains("<emphasis level=\"reduced\">Hi</emphasis>"));
    assert!(ssml.contains("@keep"));
}

#[test]
fn test_discover_in_parent_directory() {
    let (dir, path) = write_config("[parser]\nlanguage = \"de\"\n");
    let nested = dir.path().join("a").join("b");
    fs::create_dir_all(&nested).unwrap();
    assert_eq!(Config::discover_from(&nested), Some(path));
}

#[test]
fn test_overrides_apply_on_top_of_file() {
    let (_dir, path) = write_config("[converter]\npretty_print = false\n");
    let overrides = Overrides {
        preset: Some("minimal".to_owned()),
        pretty_print: Some(true),
        language: Some("fr".to_owned()),
        ..Overrides::default()
    };
    let config = Config::load(Some(&path), Some(&overrides)).unwrap();
    assert!(config.converter.pretty_print);

    let parse = ParseOptions::from_config(&config).unwrap();
    assert_eq!(parse.language, "fr");
    assert_eq!(parse.capabilities.map(|caps| caps.emphasis), Some(false));
}

#[test]
fn test_missing_explicit_path() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::load(Some(&dir.path().join("nope.toml")), None).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound(_)));
}

#[test]
fn test_invalid_skip_name_rejected() {
    let (_dir, path) = write_config("[converter]\nskip = [\"bogus\"]\n");
    let err = Config::load(Some(&path), None).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)));
}

#[test]
fn test_unknown_preset_in_config() {
    let (_dir, path) = write_config("[capabilities]\npreset = \"robot\"\n");
    let config = Config::load(Some(&path), None).unwrap();
    let err = ConvertOptions::from_config(&config).unwrap_err();
    assert!(matches!(err, SsmdError::UnknownPreset { .. }));
}

#[test]
fn test_defaults_without_capabilities() {
    let config = Config::from_toml_str("").unwrap();
    let options = ConvertOptions::from_config(&config).unwrap();
    assert!(options.capabilities.is_none());
    assert_eq!(
        ssmd::convert("*x*", &options),
        "<speak><p><emphasis>x</emphasis></p></speak>"
    );
}

#[test]
fn test_options_from_config_path() {
    let (_dir, path) = write_config("[converter]\noutput_speak_tag = false\n\n[parser]\nlanguage = \"de\"\n");
    let options = ConvertOptions::from_config_path(Some(&path)).unwrap();
    assert_eq!(ssmd::convert("*x*", &options), "<p><emphasis>x</emphasis></p>");
    let parse = ParseOptions::from_config_path(Some(&path)).unwrap();
    assert_eq!(parse.language, "de");
}

#[test]
fn test_config_path_errors_convert() {
    let dir = tempfile::tempdir().unwrap();
    let err = ConvertOptions::from_config_path(Some(&dir.path().join("nope.toml"))).unwrap_err();
    assert!(matches!(err, SsmdError::Config(ConfigError::NotFound(_))));

    let (_dir, path) = write_config("[converter]\nskip = [\"bogus\"]\n");
    let err = ParseOptions::from_config_path(Some(&path)).unwrap_err();
    assert!(matches!(err, SsmdError::Config(ConfigError::Validation(_))));
}

#[test]
fn test_platform_table_next_to_config() {
    let (dir, path) = write_config("[capabilities]\nplatform = \"engine.json\"\nmark = false\n");
    fs::write(
        dir.path().join("engine.json"),
        r#"{"elements": {"elements››alias (required)": false}}"#,
    )
    .unwrap();
    let options = ConvertOptions::from_config_path(Some(&path)).unwrap();
    let caps = options.capabilities.clone().unwrap();
    assert!(!caps.substitution);
    assert!(!caps.mark);
    assert!(caps.emphasis);

    let ssml = ssmd::convert("[H2O](sub: water) is *wet* @m", &options);
    assert_eq!(ssml, "<speak><p>H2O is <emphasis>wet</emphasis></p></speak>");
}

#[test]
fn test_missing_platform_table() {
    let (_dir, path) = write_config("[capabilities]\nplatform = \"missing.json\"\n");
    let err = ConvertOptions::from_config_path(Some(&path)).unwrap_err();
    assert!(matches!(err, SsmdError::Io(_)));
}
