//! The sanitizer: parse, remove denied tags, filter attributes, emit.

pub mod attribute_filter;
pub mod content;
pub mod tag_filter;

pub use attribute_filter::{filter_attributes, AttributeVerdict, FilterOutcome, StripReason};
pub use content::{ContentSanitizer, CustomSanitizer, SanitizerOptions};
pub use tag_filter::remove_denied_tags;

use std::io::Read;
use std::sync::Arc;

use quill_security::SanitizerPolicy;

use crate::adapter::{DomAdapter, TreeAdapter};
use crate::config::ParserConfig;
use crate::dom::Fragment;
use crate::error::{ParserError, ParserResult};
use crate::html;
use crate::metrics::{ParseTimer, SanitizeMetrics, SanitizeReport};
use crate::{OutputMode, Sanitized};

/// Input to a sanitize call: markup text or a tree the host already holds.
#[derive(Debug)]
pub enum SanitizeInput<'a, F> {
    Markup(&'a str),
    Fragment(F),
}

impl<'a, F> From<&'a str> for SanitizeInput<'a, F> {
    fn from(markup: &'a str) -> Self {
        SanitizeInput::Markup(markup)
    }
}

/// Policy driven markup sanitizer.
///
/// Each call owns its tree; the policy and the metrics are shared, so one
/// sanitizer can serve many threads.
#[derive(Debug, Clone)]
pub struct HtmlSanitizer<A: TreeAdapter = DomAdapter> {
    policy: Arc<SanitizerPolicy>,
    adapter: A,
    metrics: Arc<SanitizeMetrics>,
}

impl HtmlSanitizer<DomAdapter> {
    pub fn new(policy: Arc<SanitizerPolicy>) -> Self {
        Self::with_adapter(policy, DomAdapter::default())
    }

    pub fn with_config(policy: Arc<SanitizerPolicy>, config: ParserConfig) -> Self {
        Self::with_adapter(policy, DomAdapter::new(config))
    }

    /// Sanitizes markup and returns markup.
    pub fn sanitize_html(&self, markup: &str) -> ParserResult<String> {
        match self.sanitize(SanitizeInput::Markup(markup), OutputMode::Html)? {
            Sanitized::Html(html) => Ok(html),
            Sanitized::Fragment(fragment) => fragment.to_html(),
        }
    }

    /// Sanitizes markup and returns the tree.
    pub fn sanitize_to_fragment(&self, markup: &str) -> ParserResult<Fragment> {
        match self.sanitize(SanitizeInput::Markup(markup), OutputMode::Fragment)? {
            Sanitized::Fragment(fragment) => Ok(fragment),
            Sanitized::Html(html) => Err(ParserError::Serialization(format!(
                "expected a fragment, got {} bytes of markup",
                html.len()
            ))),
        }
    }

    /// Reads markup from `input`, up to the configured input limit.
    pub fn sanitize_reader<R: Read>(&self, input: R, mode: OutputMode) -> ParserResult<Sanitized> {
        let tree = self.track(html::parse_fragment_from_reader(input, self.adapter.config()))?;
        self.finish(tree, mode).map(|(output, _)| output)
    }
}

impl Default for HtmlSanitizer<DomAdapter> {
    fn default() -> Self {
        Self::new(Arc::new(SanitizerPolicy::standard()))
    }
}

impl<A: TreeAdapter> HtmlSanitizer<A> {
    pub fn with_adapter(policy: Arc<SanitizerPolicy>, adapter: A) -> Self {
        Self {
            policy,
            adapter,
            metrics: Arc::new(SanitizeMetrics::new()),
        }
    }

    pub fn policy(&self) -> &SanitizerPolicy {
        &self.policy
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Totals over every call made through this sanitizer (and its clones).
    pub fn metrics(&self) -> &SanitizeMetrics {
        &self.metrics
    }

    pub fn sanitize(
        &self,
        input: SanitizeInput<'_, A::Fragment>,
        mode: OutputMode,
    ) -> ParserResult<Sanitized<A::Fragment>> {
        self.sanitize_with_report(input, mode).map(|(output, _)| output)
    }

    /// Like [`sanitize`](Self::sanitize), also returning what was removed.
    pub fn sanitize_with_report(
        &self,
        input: SanitizeInput<'_, A::Fragment>,
        mode: OutputMode,
    ) -> ParserResult<(Sanitized<A::Fragment>, SanitizeReport)> {
        let tree = match input {
            SanitizeInput::Markup(markup) => self.track(self.adapter.parse(markup))?,
            SanitizeInput::Fragment(fragment) => self.adapter.adopt(fragment),
        };
        self.finish(tree, mode)
    }

    /// Sanitizes markup given as bytes, which must be UTF-8.
    pub fn sanitize_bytes(
        &self,
        bytes: &[u8],
        mode: OutputMode,
    ) -> ParserResult<Sanitized<A::Fragment>> {
        let markup = self.track(std::str::from_utf8(bytes).map_err(|e| {
            ParserError::ParseFailure(format!("input is not valid UTF-8: {}", e))
        }))?;
        self.sanitize(SanitizeInput::Markup(markup), mode)
    }

    /// Runs both filters over a tree in place: denied tags first, then
    /// attributes on whatever survived.
    pub fn sanitize_tree(&self, tree: &A::Tree) -> SanitizeReport {
        let tags_removed = remove_denied_tags(&self.adapter, tree, &self.policy);
        let outcome = filter_attributes(&self.adapter, tree, &self.policy);
        SanitizeReport {
            tags_removed,
            attributes_stripped: outcome.attributes_stripped,
            handlers_cleared: outcome.handlers_cleared,
        }
    }

    fn finish(
        &self,
        tree: A::Tree,
        mode: OutputMode,
    ) -> ParserResult<(Sanitized<A::Fragment>, SanitizeReport)> {
        let timer = ParseTimer::new();
        let report = self.sanitize_tree(&tree);
        let output = self.track(self.adapter.serialize(tree, mode))?;
        self.metrics.record(&report);
        tracing::trace!(
            "sanitized in {}us: {} tags removed, {} attributes stripped, {} handlers cleared",
            timer.elapsed_us(),
            report.tags_removed,
            report.attributes_stripped,
            report.handlers_cleared
        );
        Ok((output, report))
    }

    fn track<T>(&self, result: ParserResult<T>) -> ParserResult<T> {
        if let Err(err) = &result {
            self.metrics.increment_failures();
            tracing::warn!("sanitize failed: {}", err);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{HandlerBinding, Node};
    use pretty_assertions::assert_eq;

    fn sanitizer() -> HtmlSanitizer {
        HtmlSanitizer::default()
    }

    #[test]
    fn test_tags_before_attributes() {
        let (output, report) = sanitizer()
            .sanitize_with_report(
                SanitizeInput::Markup(r#"<form onsubmit="x()"><b onclick="y()">a</b></form><i id="k" onblur="z()">b</i>"#),
                OutputMode::Html,
            )
            .unwrap();
        assert_eq!(output.into_html().unwrap(), r#"<i id="k">b</i>"#);
        assert_eq!(
            report,
            SanitizeReport {
                tags_removed: 1,
                attributes_stripped: 1,
                handlers_cleared: 0,
            }
        );
    }

    #[test]
    fn test_fragment_input_and_output() {
        let sanitizer = sanitizer();
        let img = Node::create_html_element(
            "img",
            vec![crate::dom::Attribute::new("src", "javascript:alert(1)")],
        );
        Node::bind_handler(&img, "onload", HandlerBinding::new(|_| {})).unwrap();
        let script = Node::create_html_element("script", vec![]);
        let input = Fragment::from_nodes(vec![img.clone(), script]);

        let output = sanitizer
            .sanitize(SanitizeInput::Fragment(input), OutputMode::Fragment)
            .unwrap();
        let fragment = output.into_fragment().unwrap();
        assert_eq!(fragment.children().len(), 1);
        assert_eq!(fragment.to_html().unwrap(), "<img>");
        assert!(img.read().unwrap().as_element().unwrap().live_handlers.is_empty());
    }

    #[test]
    fn test_bytes_and_reader() {
        let sanitizer = sanitizer();
        let output = sanitizer
            .sanitize_bytes(b"<p onclick=\"x\">hi</p>", OutputMode::Html)
            .unwrap();
        assert_eq!(output.into_html().unwrap(), "<p>hi</p>");

        let err = sanitizer.sanitize_bytes(&[0xc3, 0x28], OutputMode::Html).unwrap_err();
        assert!(matches!(err, ParserError::ParseFailure(_)));

        let output = sanitizer
            .sanitize_reader("<script>x</script>ok".as_bytes(), OutputMode::Html)
            .unwrap();
        assert_eq!(output.into_html().unwrap(), "ok");
    }

    #[test]
    fn test_metrics_accumulate() {
        let sanitizer = sanitizer();
        sanitizer.sanitize_html("<script></script>").unwrap();
        sanitizer.sanitize_html("<p onclick=\"x\"></p>").unwrap();
        let _ = sanitizer.sanitize_bytes(&[0xff], OutputMode::Html);

        assert_eq!(sanitizer.metrics().documents_sanitized(), 2);
        assert_eq!(sanitizer.metrics().failures(), 1);
        assert_eq!(sanitizer.metrics().totals().tags_removed, 1);
        assert_eq!(sanitizer.metrics().totals().attributes_stripped, 1);
    }

    #[test]
    fn test_custom_policy() {
        let policy = SanitizerPolicy::builder()
            .deny_tags(["marquee"])
            .allow_html_attributes(["class"])
            .dangerous_schemes(["javascript"])
            .build()
            .unwrap();
        let sanitizer = HtmlSanitizer::new(Arc::new(policy));
        assert_eq!(
            sanitizer
                .sanitize_html(r#"<marquee>x</marquee><script>y</script><b class="c" id="d">z</b>"#)
                .unwrap(),
            r#"<script>y</script><b class="c">z</b>"#
        );
    }

    #[test]
    fn test_sanitize_to_fragment() {
        let fragment = sanitizer().sanitize_to_fragment("<p>a</p><iframe></iframe>").unwrap();
        assert_eq!(fragment.children().len(), 1);
    }
}
