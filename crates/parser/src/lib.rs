//! Quill's policy driven markup sanitizer
//!
//! Untrusted markup is parsed with html5ever into a small DOM, denied elements
//! are removed with their subtrees, attributes are filtered against the
//! allowlists and the dangerous-scheme denylist, and the result is handed back
//! as markup or as a tree.
//!
//! ```
//! let clean = quill_parser::sanitize(r#"<p onclick="alert(1)">hi</p>"#).unwrap();
//! assert_eq!(clean, "<p>hi</p>");
//! ```

pub mod adapter;
pub mod config;
pub mod dom;
pub mod error;
pub mod html;
pub mod metrics;
pub mod sanitizer;

/// Re-export common types
pub use adapter::{AttributeEntry, DomAdapter, Selector, TreeAdapter};
pub use config::ParserConfig;
pub use dom::{Dom, Fragment, Node, NodeData};
pub use error::{ParserError, ParserResult};
pub use html::parse_fragment;
pub use metrics::{ParseTimer, SanitizeMetrics, SanitizeReport};
pub use quill_security::{SanitizerPolicy, SecurityError};
pub use sanitizer::{
    ContentSanitizer, CustomSanitizer, HtmlSanitizer, SanitizeInput, SanitizerOptions,
};

/// Whether a sanitize call hands back markup text or a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Html,
    Fragment,
}

/// Maps the host's "need HTML text" flag.
impl From<bool> for OutputMode {
    fn from(need_html_text: bool) -> Self {
        if need_html_text {
            OutputMode::Html
        } else {
            OutputMode::Fragment
        }
    }
}

/// Sanitizer output.
#[derive(Debug)]
pub enum Sanitized<F = Fragment> {
    Html(String),
    Fragment(F),
}

impl<F> Sanitized<F> {
    pub fn as_html(&self) -> Option<&str> {
        match self {
            Sanitized::Html(html) => Some(html),
            Sanitized::Fragment(_) => None,
        }
    }

    pub fn into_html(self) -> Option<String> {
        match self {
            Sanitized::Html(html) => Some(html),
            Sanitized::Fragment(_) => None,
        }
    }

    pub fn into_fragment(self) -> Option<F> {
        match self {
            Sanitized::Fragment(fragment) => Some(fragment),
            Sanitized::Html(_) => None,
        }
    }

    pub fn mode(&self) -> OutputMode {
        match self {
            Sanitized::Html(_) => OutputMode::Html,
            Sanitized::Fragment(_) => OutputMode::Fragment,
        }
    }
}

/// Sanitizes markup with the built-in policy.
pub fn sanitize(markup: &str) -> ParserResult<String> {
    HtmlSanitizer::default().sanitize_html(markup)
}
