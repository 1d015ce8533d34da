//! X-SAMPA to IPA conversion.
//!
//! [`XsampaTable`] is an immutable lookup table built once and passed by
//! reference to whoever converts phonemes. [`XsampaTable::shared`] provides
//! a process-wide default instance.

use std::sync::LazyLock;

/// X-SAMPA symbol to IPA mapping.
const XSAMPA_TO_IPA: &[(&str, &str)] = &[
    // Vowels
    ("a", "a"),
    ("b", "b"),
    ("b_<", "ɓ"),
    ("c", "c"),
    ("d", "d"),
    ("d`", "ɖ"),
    ("d_<", "ɗ"),
    ("e", "e"),
    ("f", "f"),
    ("g", "ɡ"),
    ("g_<", "ɠ"),
    ("h", "h"),
    ("h\\", "ɦ"),
    ("i", "i"),
    ("j", "j"),
    ("j\\", "ʝ"),
    ("k", "k"),
    ("l", "l"),
    ("l`", "ɭ"),
    ("l\\", "ɺ"),
    ("m", "m"),
    ("n", "n"),
    ("n`", "ɳ"),
    ("o", "o"),
    ("p", "p"),
    ("p\\", "ɸ"),
    ("q", "q"),
    ("r", "r"),
    ("r`", "ɽ"),
    ("r\\", "ɹ"),
    ("r\\`", "ɻ"),
    ("s", "s"),
    ("s`", "ʂ"),
    ("s\\", "ɕ"),
    ("t", "t"),
    ("t`", "ʈ"),
    ("u", "u"),
    ("v", "v"),
    ("v\\", "ʋ"),
    ("w", "w"),
    ("x", "x"),
    ("x\\", "ɧ"),
    ("y", "y"),
    ("z", "z"),
    ("z`", "ʐ"),
    ("z\\", "ʑ"),
    // Capital letters
    ("A", "ɑ"),
    ("B", "β"),
    ("B\\", "ʙ"),
    ("C", "ç"),
    ("D", "ð"),
    ("E", "ɛ"),
    ("F", "ɱ"),
    ("G", "ɣ"),
    ("G\\", "ɢ"),
    ("G\\_<", "ʛ"),
    ("H", "ɥ"),
    ("H\\", "ʜ"),
    ("I", "ɪ"),
    ("I\\", "ᵻ"),
    ("J", "ɲ"),
    ("J\\", "ɟ"),
    ("J\\_<", "ʄ"),
    ("K", "ɬ"),
    ("K\\", "ɮ"),
    ("L", "ʎ"),
    ("L\\", "ʟ"),
    ("M", "ɯ"),
    ("M\\", "ɰ"),
    ("N", "ŋ"),
    ("N\\", "ɴ"),
    ("O", "ɔ"),
    ("O\\", "ʘ"),
    ("P", "ʋ"),
    ("Q", "ɒ"),
    ("R", "ʁ"),
    ("R\\", "ʀ"),
    ("S", "ʃ"),
    ("T", "θ"),
    ("U", "ʊ"),
    ("U\\", "ᵿ"),
    ("V", "ʌ"),
    ("W", "ʍ"),
    ("X", "χ"),
    ("X\\", "ħ"),
    ("Y", "ʏ"),
    ("Z", "ʒ"),
    // Other symbols
    ("@", "ə"),
    ("@\\", "ɘ"),
    ("@`", "ɚ"),
    ("{", "æ"),
    ("}", "ʉ"),
    ("1", "ɨ"),
    ("2", "ø"),
    ("3", "ɜ"),
    ("3\\", "ɞ"),
    ("4", "ɾ"),
    ("5", "ɫ"),
    ("6", "ɐ"),
    ("7", "ɤ"),
    ("8", "ɵ"),
    ("9", "œ"),
    ("&", "ɶ"),
    ("?", "ʔ"),
    ("?\\", "ʕ"),
    ("<\\", "ʢ"),
    (">\\", "ʡ"),
    ("^", "ꜛ"),
    ("!", "ꜜ"),
    ("!\\", "ǃ"),
    ("|\\", "ǀ"),
    ("||", "‖"),
    ("|\\|\\", "ǁ"),
    ("=\\", "ǂ"),
    ("-\\", "‿"),
    // Suprasegmentals
    ("\"", "ˈ"),
    ("%", "ˌ"),
    (":", "ː"),
    (":\\", "ˑ"),
    // Diacritics
    ("_h", "ʰ"),
    ("_j", "ʲ"),
    ("_w", "ʷ"),
    ("_G", "ˠ"),
    ("_?\\", "ˤ"),
    ("_~", "\u{0303}"),
    ("~", "\u{0303}"),
    ("=", "\u{0329}"),
    ("_=", "\u{0329}"),
    ("_0", "\u{0325}"),
    ("_v", "\u{032C}"),
    ("_t", "\u{0324}"),
    ("_k", "\u{0330}"),
    ("_N", "\u{033C}"),
    ("_d", "\u{032A}"),
    ("_a", "\u{033A}"),
    ("_m", "\u{033B}"),
    ("_}", "\u{031A}"),
    ("_^", "\u{032F}"),
    ("_\"", "\u{0308}"),
    ("_x", "\u{033D}"),
    ("_+", "\u{031F}"),
    ("_-", "\u{0320}"),
    ("_r", "\u{031D}"),
    ("_o", "\u{031E}"),
    ("_A", "\u{0318}"),
    ("_q", "\u{0319}"),
    ("_O", "\u{0339}"),
    ("_c", "\u{031C}"),
    ("_e", "\u{0334}"),
    ("`", "\u{02DE}"),
];

/// Immutable X-SAMPA to IPA conversion table.
///
/// Conversion replaces symbols longest-first so multi-character symbols such
/// as `r\`` win over their single-character prefixes.
#[derive(Debug)]
pub struct XsampaTable {
    /// Entries sorted by descending symbol length.
    entries: Vec<(&'static str, &'static str)>,
}

static SHARED: LazyLock<XsampaTable> = LazyLock::new(XsampaTable::new);

impl XsampaTable {
    /// Build the table from the built-in symbol list.
    #[must_use]
    pub fn new() -> Self {
        let mut entries = XSAMPA_TO_IPA.to_vec();
        entries.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        Self { entries }
    }

    /// Process-wide default table, built on first use.
    #[must_use]
    pub fn shared() -> &'static Self {
        &SHARED
    }

    /// Number of known symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Convert an X-SAMPA string to IPA.
    ///
    /// Scans left to right, taking the longest symbol at each position.
    /// Characters without a mapping are copied unchanged.
    #[must_use]
    pub fn to_ipa(&self, xsampa: &str) -> String {
        let mut out = String::with_capacity(xsampa.len() * 2);
        let mut rest = xsampa;
        'scan: while !rest.is_empty() {
            for (symbol, ipa) in &self.entries {
                if let Some(tail) = rest.strip_prefix(symbol) {
                    out.push_str(ipa);
                    rest = tail;
                    continue 'scan;
                }
            }
            let mut chars = rest.chars();
            if let Some(c) = chars.next() {
                out.push(c);
            }
            rest = chars.as_str();
        }
        out
    }
}

impl Default for XsampaTable {
    fn default() -> Self {
        Self::new()
    }
}
