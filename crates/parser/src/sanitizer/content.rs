//! Host facing sanitizer selection.
//!
//! An editor host either brings its own sanitizer, uses the built-in one, or
//! turns sanitization off. The choice is made once, when the options are
//! resolved into a [`ContentSanitizer`].

use std::fmt;
use std::sync::Arc;

use quill_security::SanitizerPolicy;

use crate::adapter::{DomAdapter, TreeAdapter};
use crate::config::ParserConfig;
use crate::dom::Fragment;
use crate::error::ParserResult;
use crate::sanitizer::{HtmlSanitizer, SanitizeInput};
use crate::{OutputMode, Sanitized};

/// A host supplied sanitizer. It may answer with markup or with a tree.
pub type CustomSanitizer = Arc<dyn Fn(&str) -> Sanitized<Fragment> + Send + Sync>;

/// Sanitization options as an editor host configures them.
#[derive(Clone)]
pub struct SanitizerOptions {
    /// Use the built-in sanitizer when no custom one is given
    pub use_default_sanitizer: bool,
    /// Replaces the built-in sanitizer entirely
    pub custom_sanitizer: Option<CustomSanitizer>,
    pub policy: Arc<SanitizerPolicy>,
    pub parser: ParserConfig,
}

impl Default for SanitizerOptions {
    fn default() -> Self {
        Self {
            use_default_sanitizer: true,
            custom_sanitizer: None,
            policy: Arc::new(SanitizerPolicy::standard()),
            parser: ParserConfig::default(),
        }
    }
}

impl fmt::Debug for SanitizerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SanitizerOptions")
            .field("use_default_sanitizer", &self.use_default_sanitizer)
            .field("custom_sanitizer", &self.custom_sanitizer.as_ref().map(|_| ".."))
            .field("policy", &self.policy)
            .field("parser", &self.parser)
            .finish()
    }
}

impl SanitizerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn use_default_sanitizer(mut self, enabled: bool) -> Self {
        self.use_default_sanitizer = enabled;
        self
    }

    pub fn custom_sanitizer<F>(mut self, sanitizer: F) -> Self
    where
        F: Fn(&str) -> Sanitized<Fragment> + Send + Sync + 'static,
    {
        self.custom_sanitizer = Some(Arc::new(sanitizer));
        self
    }

    pub fn policy(mut self, policy: Arc<SanitizerPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn parser(mut self, config: ParserConfig) -> Self {
        self.parser = config;
        self
    }

    /// Picks the sanitizer. A custom sanitizer wins over the flag.
    pub fn resolve(self) -> ContentSanitizer {
        match self.custom_sanitizer {
            Some(custom) => ContentSanitizer::Custom(custom),
            None if self.use_default_sanitizer => {
                ContentSanitizer::BuiltIn(HtmlSanitizer::with_config(self.policy, self.parser))
            }
            None => {
                tracing::warn!("HTML sanitization is disabled, content passes through unchanged");
                ContentSanitizer::Passthrough(DomAdapter::new(self.parser))
            }
        }
    }
}

impl From<SanitizerOptions> for ContentSanitizer {
    fn from(options: SanitizerOptions) -> Self {
        options.resolve()
    }
}

/// The sanitizer an editor runs its content through.
#[derive(Clone)]
pub enum ContentSanitizer {
    Custom(CustomSanitizer),
    BuiltIn(HtmlSanitizer),
    /// No filtering; fragment output still needs a parse
    Passthrough(DomAdapter),
}

impl fmt::Debug for ContentSanitizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentSanitizer::Custom(_) => f.write_str("Custom(..)"),
            ContentSanitizer::BuiltIn(sanitizer) => f.debug_tuple("BuiltIn").field(sanitizer).finish(),
            ContentSanitizer::Passthrough(adapter) => {
                f.debug_tuple("Passthrough").field(adapter).finish()
            }
        }
    }
}

impl ContentSanitizer {
    pub fn sanitize(&self, content: &str, mode: OutputMode) -> ParserResult<Sanitized> {
        match self {
            ContentSanitizer::Custom(custom) => Ok(custom(content)),
            ContentSanitizer::BuiltIn(sanitizer) => {
                sanitizer.sanitize(SanitizeInput::Markup(content), mode)
            }
            ContentSanitizer::Passthrough(adapter) => match mode {
                OutputMode::Html => Ok(Sanitized::Html(content.to_string())),
                OutputMode::Fragment => {
                    let tree = adapter.parse(content)?;
                    adapter.serialize(tree, OutputMode::Fragment)
                }
            },
        }
    }

    pub fn is_passthrough(&self) -> bool {
        matches!(self, ContentSanitizer::Passthrough(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_resolves_to_builtin() {
        let sanitizer = SanitizerOptions::default().resolve();
        assert!(matches!(sanitizer, ContentSanitizer::BuiltIn(_)));
        let output = sanitizer
            .sanitize(r#"<p onclick="alert(1)">hi</p>"#, OutputMode::Html)
            .unwrap();
        assert_eq!(output.into_html().unwrap(), "<p>hi</p>");
    }

    #[test]
    fn test_custom_wins_over_flag() {
        for flag in [true, false] {
            let sanitizer = SanitizerOptions::new()
                .use_default_sanitizer(flag)
                .custom_sanitizer(|content| Sanitized::Html(content.to_uppercase()))
                .resolve();
            assert!(matches!(sanitizer, ContentSanitizer::Custom(_)));
            let output = sanitizer.sanitize("<b>x</b>", OutputMode::Fragment).unwrap();
            assert_eq!(output.into_html().unwrap(), "<B>X</B>");
        }
    }

    #[test]
    fn test_passthrough() {
        let sanitizer = ContentSanitizer::from(SanitizerOptions::new().use_default_sanitizer(false));
        assert!(sanitizer.is_passthrough());

        let raw = r#"<p onclick="alert(1)">hi</p><script>x</script>"#;
        let output = sanitizer.sanitize(raw, OutputMode::Html).unwrap();
        assert_eq!(output.into_html().unwrap(), raw);

        let fragment = sanitizer
            .sanitize(raw, OutputMode::Fragment)
            .unwrap()
            .into_fragment()
            .unwrap();
        assert_eq!(fragment.children().len(), 2);
    }
}
