use pretty_assertions::assert_eq;
use ssmd::{
    AnnotationSpan, ConvertOptions, ParseOptions, ParseSpansResult, iter_sentence_spans, parse_spans,
};

/// Characters `start..end` of `text`.
fn slice(text: &str, start: usize, end: usize) -> String {
    text.chars().skip(start).take(end - start).collect()
}

fn covered(result: &ParseSpansResult, span: &AnnotationSpan) -> String {
    slice(&result.clean_text, span.char_start, span.char_end)
}

fn attr<'a>(span: &'a AnnotationSpan, name: &str) -> Option<&'a str> {
    span.attrs.get(name).map(String::as_str)
}

#[test]
fn test_phoneme_span_offsets() {
    let result = parse_spans("Say [tomato]{ph='a'} now.", &ParseOptions::default());
    assert_eq!(result.clean_text, "Say tomato now.");
    let span = &result.annotations[0];
    assert_eq!((span.char_start, span.char_end), (4, 10));
    assert_eq!(attr(span, "ph"), Some("a"));
    assert_eq!(attr(span, "tag"), Some("phoneme"));
    assert_eq!(span.kind, "phoneme");
}

#[test]
fn test_repeated_words() {
    let result = parse_spans("[word]{lang='en'} word", &ParseOptions::default());
    assert_eq!(result.clean_text, "word word");
    let span = &result.annotations[0];
    assert_eq!(attr(span, "tag"), Some("lang"));
    assert_eq!((span.char_start, span.char_end), (0, 4));
}

#[test]
fn test_punctuation_adjacency() {
    let result = parse_spans("Hello, [world]{lang='en'}!", &ParseOptions::default());
    assert_eq!(result.clean_text, "Hello, world!");
    assert_eq!(covered(&result, &result.annotations[0]), "world");
}

#[test]
fn test_adjacent_annotations_preserve_whitespace() {
    let options = ParseOptions::default().with_preserve_whitespace(true);
    let result = parse_spans("[hello]{lang='en'}[world]{lang='en'}", &options);
    assert_eq!(result.clean_text, "helloworld");
    assert_eq!(result.annotations.len(), 2);
    assert_eq!(covered(&result, &result.annotations[0]), "hello");
    assert_eq!(covered(&result, &result.annotations[1]), "world");
    assert!(result.annotations.iter().all(|s| s.kind == "lang"));
}

#[test]
fn test_div_block() {
    let result = parse_spans("<div lang='fr'>\nBonjour\n</div>", &ParseOptions::default());
    assert_eq!(result.clean_text, "Bonjour");
    let span = result
        .annotations
        .iter()
        .find(|s| attr(s, "lang") == Some("fr"))
        .unwrap_or_else(|| panic!("no div span in {:?}", result.annotations));
    assert_eq!(attr(span, "tag"), Some("div"));
    assert_eq!(covered(&result, span), "Bonjour");
}

#[test]
fn test_nested_spans_outer_first() {
    let result = parse_spans("A [*big* deal](fr) here", &ParseOptions::default());
    assert_eq!(result.clean_text, "A big deal here");
    let kinds: Vec<_> = result.annotations.iter().map(|s| s.kind.as_str()).collect();
    assert_eq!(kinds, vec!["lang", "emphasis"]);
    assert_eq!(covered(&result, &result.annotations[0]), "big deal");
    assert_eq!(covered(&result, &result.annotations[1]), "big");
}

#[test]
fn test_whitespace_is_collapsed() {
    let result = parse_spans("  One   *two*\n\n three  ", &ParseOptions::default());
    assert_eq!(result.clean_text, "One two three");
    assert_eq!(covered(&result, &result.annotations[0]), "two");
}

#[test]
fn test_spans_stay_within_clean_text() {
    let inputs = [
        "Hello @m ...500ms world",
        "# Title\n\n[Ünïcödé](de) ++loud++ text",
        "[](beep.mp3 Beep) and [x](sub: y)",
        "@voice: sarah\nHi.\n\n<div rate=\"slow\">\nSlow *down*\n</div>",
    ];
    for input in inputs {
        let result = parse_spans(input, &ParseOptions::default());
        let len = result.clean_text.chars().count();
        for span in &result.annotations {
            assert!(span.char_start <= span.char_end, "{input}: {span:?}");
            assert!(span.char_end <= len, "{input}: {span:?}");
        }
    }
}

#[test]
fn test_clean_text_matches_strip() {
    let inputs = [
        "Hello @m big world @n!",
        "Wait ...500ms here.",
        "@start Hello *there*.",
        "One [two](fr) @x ...1s three.",
    ];
    for input in inputs {
        let clean = parse_spans(input, &ParseOptions::default()).clean_text;
        assert_eq!(clean, ssmd::strip(input, &ConvertOptions::default()), "{input:?}");
    }
}

#[test]
fn test_sentence_spans_match_clean_text() {
    let text = "Hello *world*. Next sentence.";
    let clean = parse_spans(text, &ParseOptions::default()).clean_text;
    let sentences = iter_sentence_spans(text, &ParseOptions::default());
    assert_eq!(sentences.len(), 2);
    for (sentence, start, end) in &sentences {
        assert_eq!(&slice(&clean, *start, *end), sentence);
    }
    assert_eq!(sentences[0].0, "Hello world.");
    assert_eq!(sentences[1].1, 13);
}
