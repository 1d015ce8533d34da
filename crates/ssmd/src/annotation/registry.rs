//! Parameter string dispatch.

use super::{Annotation, recognizers};
use crate::xsampa::XsampaTable;

/// Resolves `(params)` strings to [`Annotation`]s.
///
/// Recognizers are tried in fixed priority order: audio, extension, voice,
/// say-as, phoneme, prosody, substitution, emphasis, language. The first one
/// that accepts the parameter wins.
///
/// # Example
///
/// ```
/// use ssmd::annotation::{Annotation, Registry};
///
/// let registry = Registry::default();
/// assert_eq!(
///     registry.resolve("sub: water"),
///     Some(Annotation::Substitution("water".to_owned()))
/// );
/// assert_eq!(registry.resolve("nonsense here"), None);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Registry<'a> {
    xsampa: &'a XsampaTable,
}

impl<'a> Registry<'a> {
    /// Registry converting X-SAMPA phonemes with the given table.
    #[must_use]
    pub fn new(xsampa: &'a XsampaTable) -> Self {
        Self { xsampa }
    }

    /// Resolve a single parameter.
    #[must_use]
    pub fn resolve(&self, param: &str) -> Option<Annotation> {
        let param = param.trim();
        if param.is_empty() {
            return None;
        }
        recognizers::audio(param)
            .or_else(|| recognizers::extension(param))
            .or_else(|| recognizers::voice(param))
            .or_else(|| recognizers::say_as(param))
            .or_else(|| recognizers::phoneme(param, self.xsampa))
            .or_else(|| recognizers::prosody(param))
            .or_else(|| recognizers::substitution(param))
            .or_else(|| recognizers::emphasis(param))
            .or_else(|| recognizers::language(param))
    }

    /// Resolve a comma-separated parameter group.
    ///
    /// A part that resolves to nothing is retried joined to the previous
    /// part, so multi-field parameters such as
    /// `as: date, format: "dd.mm.yyyy"` survive the split. Parts that still
    /// resolve to nothing are dropped.
    #[must_use]
    pub fn resolve_group(&self, params: &str) -> Vec<Annotation> {
        let mut resolved: Vec<(String, Annotation)> = Vec::new();

        for part in params.split(',').map(str::trim) {
            if part.is_empty() {
                continue;
            }
            if let Some(annotation) = self.resolve(part) {
                resolved.push((part.to_owned(), annotation));
                continue;
            }
            let continued = resolved.last().and_then(|(raw, _)| {
                let joined = format!("{raw}, {part}");
                self.resolve(&joined).map(|annotation| (joined, annotation))
            });
            match continued {
                Some(entry) => {
                    resolved.pop();
                    resolved.push(entry);
                }
                None => tracing::debug!(param = part, "Unrecognized annotation parameter"),
            }
        }

        resolved.into_iter().map(|(_, annotation)| annotation).collect()
    }
}

impl Default for Registry<'static> {
    fn default() -> Self {
        Self::new(XsampaTable::shared())
    }
}
