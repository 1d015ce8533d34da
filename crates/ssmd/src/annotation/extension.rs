//! Platform-specific extension handlers for `[text](ext: name)`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::Wrap;
use crate::xml::escape_attr;

/// Placeholder replaced by the annotated text in templates.
pub const TEXT_PLACEHOLDER: &str = "{text}";

/// Handler producing markup for one named extension.
///
/// # Example
///
/// ```
/// use ssmd::annotation::{ExtensionHandler, Wrap};
///
/// struct Robot;
///
/// impl ExtensionHandler for Robot {
///     fn name(&self) -> &str {
///         "robot"
///     }
///
///     fn wrap(&self, _text: &str) -> Wrap {
///         Wrap::Around {
///             open: "<robot>".to_owned(),
///             close: "</robot>".to_owned(),
///         }
///     }
/// }
/// ```
pub trait ExtensionHandler: Send + Sync {
    /// Extension name as written after `ext:`.
    fn name(&self) -> &str;

    /// Markup for the annotated text.
    fn wrap(&self, text: &str) -> Wrap;
}

/// Extension defined by a markup template containing `{text}`.
///
/// When `{text}` sits in element content the template wraps the text;
/// when it sits inside a tag (e.g. an attribute value) the whole template
/// replaces the text.
#[derive(Debug, Clone)]
pub struct TemplateExtension {
    name: String,
    template: String,
}

impl TemplateExtension {
    #[must_use]
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
        }
    }
}

impl ExtensionHandler for TemplateExtension {
    fn name(&self) -> &str {
        &self.name
    }

    fn wrap(&self, text: &str) -> Wrap {
        if let Some((open, close)) = self.template.split_once(TEXT_PLACEHOLDER)
            && !close.contains(TEXT_PLACEHOLDER)
            && open.matches('<').count() == open.matches('>').count()
        {
            return Wrap::Around {
                open: open.to_owned(),
                close: close.to_owned(),
            };
        }
        Wrap::Replace(self.template.replace(TEXT_PLACEHOLDER, &escape_attr(text)))
    }
}

/// Registered extension handlers by name.
///
/// [`Extensions::default`] contains `whisper` (Amazon whispered effect) and
/// `audio` (the text is an audio URL).
#[derive(Clone)]
pub struct Extensions {
    handlers: BTreeMap<String, Arc<dyn ExtensionHandler>>,
}

impl Extensions {
    /// Registry without any handler.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }

    /// Register a handler, replacing any handler with the same name.
    #[must_use]
    pub fn with_handler(mut self, handler: impl ExtensionHandler + 'static) -> Self {
        self.insert(Arc::new(handler));
        self
    }

    /// Register a template extension.
    #[must_use]
    pub fn with_template(self, name: &str, template: &str) -> Self {
        self.with_handler(TemplateExtension::new(name, template))
    }

    pub fn insert(&mut self, handler: Arc<dyn ExtensionHandler>) {
        self.handlers.insert(handler.name().to_owned(), handler);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn ExtensionHandler> {
        self.handlers.get(name).map(AsRef::as_ref)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

impl Default for Extensions {
    fn default() -> Self {
        Self::empty()
            .with_template("whisper", "<amazon:effect name=\"whispered\">{text}</amazon:effect>")
            .with_template("audio", "<audio src=\"{text}\"/>")
    }
}

impl fmt::Debug for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_template_wraps_element_content() {
        let ext = TemplateExtension::new("whisper", "<effect>{text}</effect>");
        assert_eq!(
            ext.wrap("hi"),
            Wrap::Around {
                open: "<effect>".to_owned(),
                close: "</effect>".to_owned(),
            }
        );
    }

    #[test]
    fn test_template_inside_attribute_replaces() {
        let ext = TemplateExtension::new("audio", "<audio src=\"{text}\"/>");
        assert_eq!(
            ext.wrap("a\"b.mp3"),
            Wrap::Replace("<audio src=\"a&quot;b.mp3\"/>".to_owned())
        );
    }

    #[test]
    fn test_default_extensions() {
        let extensions = Extensions::default();
        assert_eq!(extensions.names().collect::<Vec<_>>(), vec!["audio", "whisper"]);
        assert!(extensions.get("drc").is_none());
    }

    #[test]
    fn test_custom_handler_overrides_builtin() {
        let extensions = Extensions::default().with_template("whisper", "<w>{text}</w>");
        let wrap = extensions.get("whisper").map(|h| h.wrap("x"));
        assert_eq!(
            wrap,
            Some(Wrap::Around {
                open: "<w>".to_owned(),
                close: "</w>".to_owned(),
            })
        );
    }
}
