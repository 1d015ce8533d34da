//! `#` .. `######` heading lines with per-level effects.

use std::ops::Range;

use super::{Context, Processor, ProcessorKind, is_balanced};
use crate::buffer::{Buffer, BufferBuilder, Mode, rewrite};
use crate::capabilities::TtsCapabilities;
use crate::grammar::{Heading, parse_heading};
use crate::types::HeadingEffect;

pub(super) struct HeadingProcessor;

impl Processor for HeadingProcessor {
    fn kind(&self) -> ProcessorKind {
        ProcessorKind::Heading
    }

    fn apply(&self, input: &Buffer, mode: Mode, ctx: &Context<'_>) -> Buffer {
        rewrite(
            input,
            mode,
            |text, from| {
                find_heading_line(input, text, from).map(|heading| {
                    let range = heading.range.clone();
                    let delimiters = vec![heading.marker.clone()];
                    (heading, range, delimiters)
                })
            },
            |heading, source, out| {
                if mode == Mode::Strip {
                    return out.copy(source, heading.inner.clone());
                }
                match ctx.heading_levels.get(heading.level) {
                    Some(effects) => emit_effects(effects, heading, source, ctx.capabilities, out),
                    None => out.copy(source, heading.range.clone()),
                }
            },
            false,
        )
    }
}

/// First heading on a line starting at or after `from`.
///
/// Markup opening or closing a line (such as a directive `<voice>`) is not
/// part of the heading.
fn find_heading_line(input: &Buffer, text: &str, from: usize) -> Option<Heading> {
    let mut line_start = if from == 0 || text[..from].ends_with('\n') {
        from
    } else {
        from + text[from..].find('\n')? + 1
    };
    loop {
        let line_end = text[line_start..]
            .find('\n')
            .map_or(text.len(), |i| line_start + i);
        let content = content_range(input, line_start..line_end);
        if let Some(heading) = parse_heading(&text[content.clone()])
            && is_balanced(input, content.clone())
        {
            return Some(shifted(heading, content.start));
        }
        if line_end >= text.len() {
            return None;
        }
        line_start = line_end + 1;
    }
}

/// `line` without leading and trailing markup pieces.
fn content_range(input: &Buffer, line: Range<usize>) -> Range<usize> {
    let mut text_zones = input
        .zones(line.clone())
        .filter(|(_, is_markup)| !is_markup)
        .map(|(zone, _)| zone);
    let Some(first) = text_zones.next() else {
        return line.end..line.end;
    };
    let end = text_zones.last().map_or(first.end, |last| last.end);
    first.start..end
}

fn shifted(heading: Heading, by: usize) -> Heading {
    let shift = |r: Range<usize>| r.start + by..r.end + by;
    Heading {
        level: heading.level,
        range: shift(heading.range),
        marker: shift(heading.marker),
        inner: shift(heading.inner),
    }
}

enum Part {
    Markup(String),
    Space,
    Inner,
}

/// Apply effects in order: wrapping effects enclose everything produced so far.
fn emit_effects(
    effects: &[HeadingEffect],
    heading: &Heading,
    source: &Buffer,
    capabilities: Option<&TtsCapabilities>,
    out: &mut BufferBuilder,
) {
    let breaks = capabilities.is_none_or(|caps| caps.break_tags);
    let mut parts = vec![Part::Inner];

    for effect in effects {
        match effect {
            HeadingEffect::Emphasis(level) => {
                parts.insert(0, Part::Markup(level.open_tag()));
                parts.push(Part::Markup("</emphasis>".to_owned()));
            }
            HeadingEffect::Pause(pause) if breaks => {
                parts.push(Part::Space);
                parts.push(Part::Markup(pause.to_ssml()));
            }
            HeadingEffect::PauseBefore(pause) if breaks => {
                parts.insert(0, Part::Space);
                parts.insert(0, Part::Markup(pause.to_ssml()));
            }
            HeadingEffect::Prosody(prosody) => {
                let prosody = match capabilities {
                    Some(caps) => caps.filter_prosody(prosody),
                    None => Some(prosody.clone()),
                };
                if let Some(open) = prosody.and_then(|p| p.open_tag()) {
                    parts.insert(0, Part::Markup(open));
                    parts.push(Part::Markup("</prosody>".to_owned()));
                }
            }
            HeadingEffect::Pause(_) | HeadingEffect::PauseBefore(_) => {}
        }
    }

    for part in parts {
        match part {
            Part::Markup(markup) => out.push_markup(&markup),
            Part::Space => out.push_text(" "),
            Part::Inner => out.copy(source, heading.inner.clone()),
        }
    }
}
