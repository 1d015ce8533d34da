//! XML escaping and pretty printing for generated SSML.

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::Event;

/// Escape text content (`&`, `<`, `>`).
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape a double-quoted attribute value.
pub fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Re-indent well-formed XML with two spaces.
///
/// Returns the input unchanged when it does not parse.
pub fn pretty_print(xml: &str) -> String {
    match reindent(xml) {
        Some(pretty) => pretty,
        None => {
            tracing::debug!("SSML is not well-formed, skipping pretty print");
            xml.to_owned()
        }
    }
}

fn reindent(xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    let mut depth = 0usize;

    loop {
        let event = reader.read_event().ok()?;
        match &event {
            Event::Eof => break,
            Event::Start(_) => depth += 1,
            Event::End(_) => depth = depth.checked_sub(1)?,
            Event::Text(text) if text.iter().all(u8::is_ascii_whitespace) => continue,
            _ => {}
        }
        writer.write_event(event).ok()?;
    }

    if depth != 0 {
        return None;
    }
    String::from_utf8(writer.into_inner()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("a < b & c > d"), "a &lt; b &amp; c &gt; d");
        assert_eq!(escape_text("say \"hi\""), "say \"hi\"");
    }

    #[test]
    fn test_escape_attr() {
        assert_eq!(escape_attr("a \"b\" & c"), "a &quot;b&quot; &amp; c");
    }

    #[test]
    fn test_pretty_print_indents_nested_elements() {
        let pretty = pretty_print("<speak><p>Hello</p><p>World</p></speak>");
        assert_eq!(pretty, "<speak>\n  <p>Hello</p>\n  <p>World</p>\n</speak>");
    }

    #[test]
    fn test_pretty_print_malformed_returns_input() {
        let broken = "<speak><p>Hello</speak>";
        assert_eq!(pretty_print(broken), broken);
    }

    #[test]
    fn test_pretty_print_unclosed_returns_input() {
        let broken = "<speak><p>Hello</p>";
        assert_eq!(pretty_print(broken), broken);
    }
}
