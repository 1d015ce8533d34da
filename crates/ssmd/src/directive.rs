//! Directive blocks: `<div ...>` scopes and `@voice` lines.
//!
//! ```text
//! <div voice="sarah" lang="en-US">
//! Hello there.
//! @voice: michael
//! Hi Sarah.
//! </div>
//! ```
//!
//! Blocks nest; each field (voice, language, prosody) is inherited from the
//! enclosing block unless the inner block sets it. An `@voice` line changes
//! the voice of the enclosing block until the next `@voice` line or the end
//! of that block.

use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::annotation::{parse_attributes, parse_voice_value};
use crate::types::DirectiveAttrs;

static DIV_START_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*<div\s+([^>]+)>\s*$").expect("invalid div start regex")
});

static DIV_END_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*</div>\s*$").expect("invalid div end regex"));

static VOICE_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*@voice(?::\s*(.+?)|\(\s*([^)]+?)\s*\))\s*$").expect("invalid voice line regex")
});

/// A run of content lines sharing one directive scope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectiveBlock {
    /// Inherited voice, language and prosody.
    pub attrs: DirectiveAttrs,
    /// Raw directive attributes in effect, inner blocks overriding outer ones.
    pub params: BTreeMap<String, String>,
    /// Byte range of the block content in the source, without surrounding whitespace.
    pub range: Range<usize>,
}

impl DirectiveBlock {
    /// Block content within `source`.
    #[must_use]
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        &source[self.range.clone()]
    }
}

/// Result of scanning a document for directive lines.
#[derive(Debug, Default)]
pub(crate) struct DirectiveScan {
    pub blocks: Vec<DirectiveBlock>,
    pub warnings: Vec<String>,
    /// Whether any directive line was found.
    pub has_directives: bool,
}

#[derive(Clone, Debug, Default)]
struct Scope {
    attrs: DirectiveAttrs,
    params: BTreeMap<String, String>,
}

enum Line {
    Open(Scope),
    Close,
    Voice(String),
    Content,
}

fn classify(line: &str) -> Line {
    if let Some(caps) = DIV_START_RE.captures(line) {
        let attrs = parse_attributes(&caps[1]);
        return Line::Open(Scope {
            attrs: attrs.directive_attrs(),
            params: attrs.as_map().clone(),
        });
    }
    if DIV_END_RE.is_match(line) {
        return Line::Close;
    }
    if let Some(caps) = VOICE_LINE_RE.captures(line)
        && let Some(value) = caps.get(1).or_else(|| caps.get(2))
    {
        return Line::Voice(value.as_str().trim().to_owned());
    }
    Line::Content
}

struct Scanner {
    stack: Vec<Scope>,
    block: Option<Range<usize>>,
    scan: DirectiveScan,
}

impl Scanner {
    fn top(&mut self) -> &mut Scope {
        if self.stack.is_empty() {
            self.stack.push(Scope::default());
        }
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    fn flush(&mut self, source: &str) {
        let Some(range) = self.block.take() else {
            return;
        };
        let content = &source[range.clone()];
        let trimmed = content.trim_start();
        let start = range.start + (content.len() - trimmed.len());
        let end = start + trimmed.trim_end().len();
        if start < end {
            let scope = self.top().clone();
            self.scan.blocks.push(DirectiveBlock {
                attrs: scope.attrs,
                params: scope.params,
                range: start..end,
            });
        }
    }
}

/// Split a document into directive blocks.
pub(crate) fn scan(source: &str) -> DirectiveScan {
    let mut scanner = Scanner {
        stack: vec![Scope::default()],
        block: None,
        scan: DirectiveScan::default(),
    };

    let mut offset = 0;
    for (number, raw) in source.split_inclusive('\n').enumerate() {
        let line_start = offset;
        offset += raw.len();
        let line = raw.trim_end_matches(['\n', '\r']);
        let line_end = line_start + line.len();

        match classify(line) {
            Line::Open(scope) => {
                scanner.flush(source);
                scanner.scan.has_directives = true;
                let parent = scanner.top().clone();
                let mut params = parent.params;
                params.extend(scope.params);
                scanner.stack.push(Scope {
                    attrs: parent.attrs.merged_with(&scope.attrs),
                    params,
                });
            }
            Line::Close if scanner.stack.len() > 1 => {
                scanner.flush(source);
                scanner.scan.has_directives = true;
                scanner.stack.pop();
            }
            Line::Voice(value) => {
                scanner.flush(source);
                scanner.scan.has_directives = true;
                let top = scanner.top();
                top.attrs.voice = Some(parse_voice_value(&value));
                top.params.insert("voice".to_owned(), value);
            }
            line_kind => {
                if matches!(line_kind, Line::Close) {
                    tracing::warn!(line = number + 1, "Closing </div> without an open block");
                    scanner
                        .scan
                        .warnings
                        .push(format!("line {}: </div> without an open block", number + 1));
                }
                let start = scanner.block.as_ref().map_or(line_start, |block| block.start);
                scanner.block = Some(start..line_end);
            }
        }
    }
    scanner.flush(source);

    let unclosed = scanner.stack.len().saturating_sub(1);
    if unclosed > 0 {
        tracing::warn!(unclosed, "Directive blocks not closed before end of input");
        scanner
            .scan
            .warnings
            .push(format!("{unclosed} <div> block(s) not closed"));
    }
    scanner.scan
}
