//! Typed sentences → SSMD text.
//!
//! One sentence per line, a blank line after each paragraph, `@voice:`
//! lines wherever the voice changes. Breaks that open a sentence are moved
//! to the end of the previous line.

use crate::types::{
    BreakAttrs, EmphasisLevel, Segment, Sentence, Transformation, VoiceAttrs,
};

/// Format parsed sentences back into SSMD.
///
/// # Example
///
/// ```
/// use ssmd::{ParseOptions, format_ssmd, parse_sentences};
///
/// let sentences = parse_sentences("Hello. ...s How are *you*?", &ParseOptions::default());
/// assert_eq!(format_ssmd(&sentences), "Hello. ...s\nHow are *you*?\n");
/// ```
#[must_use]
pub fn format_ssmd(sentences: &[Sentence]) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut voice: Option<&VoiceAttrs> = None;

    for sentence in sentences {
        if let Some(current) = &sentence.voice
            && voice != Some(current)
        {
            if lines.last().is_some_and(|line| !line.is_empty()) {
                lines.push(String::new());
            }
            lines.push(voice_directive(current));
            lines.push(String::new());
            voice = Some(current);
        }

        let mut leading = Vec::new();
        if let Some(first) = sentence.segments.first()
            && !first.breaks_before.is_empty()
            && let Some(previous) = lines.last_mut().filter(|line| !line.is_empty())
        {
            previous.push(' ');
            previous.push_str(&breaks(&first.breaks_before));
            leading = first.breaks_before.clone();
        }

        let line = format_sentence(sentence, &leading);
        if !line.is_empty() {
            lines.push(line);
            if sentence.is_paragraph_end {
                lines.push(String::new());
            }
        }
    }

    let mut out = lines.join("\n");
    while out.contains("\n\n\n") {
        out = out.replace("\n\n\n", "\n\n");
    }
    let trimmed = out.trim_end();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}\n")
    }
}

/// One line for a sentence; `moved` are leading breaks already written to
/// the previous line.
fn format_sentence(sentence: &Sentence, moved: &[BreakAttrs]) -> String {
    let mut parts: Vec<String> = Vec::new();
    for (i, segment) in sentence.segments.iter().enumerate() {
        let before = if i == 0 && !moved.is_empty() {
            &[][..]
        } else {
            segment.breaks_before.as_slice()
        };
        if !before.is_empty() {
            parts.push(breaks(before));
        }
        let text = format_segment(segment);
        if !text.is_empty() {
            parts.push(text);
        }
        if !segment.breaks_after.is_empty() {
            parts.push(breaks(&segment.breaks_after));
        }
    }
    if !sentence.breaks_after.is_empty() {
        parts.push(breaks(&sentence.breaks_after));
    }

    let mut line = String::new();
    for part in parts {
        if !line.is_empty() && !part.starts_with(['.', '!', '?', ',', ':', ';']) {
            line.push(' ');
        }
        line.push_str(&part);
    }
    line
}

/// Segment text with its markup reconstructed.
fn format_segment(segment: &Segment) -> String {
    let text = segment.text.trim();
    let params = annotation_params(segment);

    let mut out = if params.is_empty() {
        if text.is_empty() {
            String::new()
        } else {
            match segment.emphasis {
                Some(EmphasisLevel::Strong) => format!("**{text}**"),
                Some(EmphasisLevel::Reduced) => format!("_{text}_"),
                Some(EmphasisLevel::Moderate) => format!("*{text}*"),
                Some(EmphasisLevel::None) | None => text.to_owned(),
            }
        }
    } else {
        format!("[{text}]({})", params.join(", "))
    };

    for mark in segment.marks_before.iter().rev() {
        out = format!("@{mark} {out}");
    }
    for mark in &segment.marks_after {
        out = format!("{out} @{mark}");
    }
    out.trim().to_owned()
}

/// `(params)` entries describing a segment's annotations.
fn annotation_params(segment: &Segment) -> Vec<String> {
    let mut params = Vec::new();

    match &segment.transformation {
        Some(Transformation::Audio(audio)) => {
            let mut parts = vec![audio.src.clone()];
            if let (Some(begin), Some(end)) = (&audio.clip_begin, &audio.clip_end) {
                parts.push(format!("clip: {begin}-{end}"));
            }
            if let Some(speed) = &audio.speed {
                parts.push(format!("speed: {speed}"));
            }
            if let Some(count) = audio.repeat_count {
                parts.push(format!("repeat: {count}"));
            }
            if let Some(duration) = &audio.repeat_dur {
                parts.push(format!("repeatDur: {duration}"));
            }
            if let Some(level) = &audio.sound_level {
                parts.push(format!("level: {level}"));
            }
            if let Some(alt) = &audio.alt_text {
                parts.push(alt.clone());
            }
            params.push(parts.join(" "));
        }
        Some(Transformation::SayAs(say_as)) => {
            let mut param = format!("as: {}", say_as.interpret_as);
            if let Some(format) = &say_as.format {
                param.push_str(&format!(", format: \"{format}\""));
            }
            if let Some(detail) = &say_as.detail {
                param.push_str(&format!(", detail: {detail}"));
            }
            params.push(param);
        }
        Some(Transformation::Phoneme(phoneme)) => params.push(format!("ipa: {}", phoneme.ph)),
        Some(Transformation::Substitution(alias)) => params.push(format!("sub: {alias}")),
        None => {}
    }

    if let Some(language) = &segment.language {
        params.push(format!("lang: {language}"));
    }
    if let Some(prosody) = &segment.prosody {
        params.extend(
            prosody
                .xml_attrs()
                .into_iter()
                .map(|(name, value)| format!("{name}: {value}")),
        );
    }
    if let Some(voice) = &segment.voice {
        params.push(format!("voice: {}", voice_params(voice)));
    }
    if let Some(extension) = &segment.extension {
        params.push(format!("ext: {extension}"));
    }
    if !params.is_empty()
        && let Some(level) = segment.emphasis
    {
        params.push(format!("emphasis: {level}"));
    }
    params
}

/// `name[, gender: g][, variant: n]`, falling back to the language.
fn voice_params(voice: &VoiceAttrs) -> String {
    let mut parts = Vec::new();
    if let Some(first) = voice.name.as_ref().or(voice.language.as_ref()) {
        parts.push(first.clone());
    }
    if let Some(gender) = voice.gender {
        parts.push(format!("gender: {}", gender.as_str()));
    }
    if let Some(variant) = voice.variant {
        parts.push(format!("variant: {variant}"));
    }
    parts.join(", ")
}

fn voice_directive(voice: &VoiceAttrs) -> String {
    format!("@voice: {}", voice_params(voice))
}

fn breaks(breaks: &[BreakAttrs]) -> String {
    breaks
        .iter()
        .map(BreakAttrs::to_ssmd)
        .collect::<Vec<_>>()
        .join(" ")
}
