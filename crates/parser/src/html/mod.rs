//! HTML parsing implementation for Quill.
//!
//! Markup is always parsed as a fragment in a `<body>` context. Comments never
//! make it into the tree.

mod serialize;
mod tree_sink;

use std::io::Read;
use std::sync::Arc;

use html5ever::{local_name, namespace_url, ns, tendril::TendrilSink, QualName};

use crate::config::ParserConfig;
use crate::dom::{Dom, DomMetrics, Node, NodeHandle};
use crate::error::{ParserError, ParserResult};

pub use serialize::{serialize_children, SerializableHandle};
pub use tree_sink::{HtmlTreeSink, SinkHandle};

/// Parse an HTML fragment into a DOM tree whose root's children are the
/// fragment's top level nodes.
pub fn parse_fragment(html: &str, config: &ParserConfig) -> ParserResult<Dom> {
    config.check_input_len(html.len())?;

    let metrics = Arc::new(DomMetrics::new());
    let html_sink = tree_sink::create_html_sink(metrics.clone());
    let context = QualName::new(None, ns!(html), local_name!("body"));

    // parser.one() hands back the sink output directly, there is no Result
    let document = html5ever::parse_fragment(html_sink, config.parse_opts(), context, vec![])
        .one(html);

    let root = fragment_root(&document).ok_or_else(|| {
        ParserError::ParseFailure("fragment parse produced no root element".to_string())
    })?;
    Node::detach(&root);
    let dom = Dom::from_root(root, metrics);

    let depth = dom.max_depth();
    if let Err(err) = config.check_depth(depth) {
        tracing::warn!("rejecting fragment nested {} levels deep", depth);
        return Err(err);
    }

    tracing::trace!(
        "parsed fragment: {} elements, {} comments discarded, {} parse errors",
        dom.metrics().get_elements_created(),
        dom.metrics().get_comments_discarded(),
        dom.metrics().get_parse_errors()
    );
    Ok(dom)
}

/// Parses a fragment from raw bytes, which must be UTF-8.
pub fn parse_fragment_bytes(bytes: &[u8], config: &ParserConfig) -> ParserResult<Dom> {
    config.check_input_len(bytes.len())?;
    let html = std::str::from_utf8(bytes).map_err(|e| {
        tracing::warn!("rejecting non UTF-8 input: {}", e);
        ParserError::ParseFailure(format!("input is not valid UTF-8: {}", e))
    })?;
    parse_fragment(html, config)
}

/// Parses a fragment from a reader, reading at most one byte past the
/// configured input limit.
pub fn parse_fragment_from_reader<R: Read>(input: R, config: &ParserConfig) -> ParserResult<Dom> {
    let limit = (config.max_input_bytes as u64).saturating_add(1);
    let mut buffer = Vec::new();
    input
        .take(limit)
        .read_to_end(&mut buffer)
        .map_err(|e| ParserError::ParseFailure(format!("failed to read input: {}", e)))?;
    parse_fragment_bytes(&buffer, config)
}

// The fragment algorithm puts the content under a synthetic <html> element.
fn fragment_root(document: &Dom) -> Option<NodeHandle> {
    document.children().into_iter().find(|handle| {
        handle
            .read()
            .map(|node| node.tag_name() == Some("html"))
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::NodeData;

    fn parse(html: &str) -> Dom {
        parse_fragment(html, &ParserConfig::default()).unwrap()
    }

    #[test]
    fn test_fragment_children_are_top_level() {
        let dom = parse("<p>one</p>two<b>three</b>");
        assert_eq!(dom.children().len(), 3);
        assert_eq!(dom.to_html().unwrap(), "<p>one</p>two<b>three</b>");
    }

    #[test]
    fn test_comments_are_discarded() {
        let dom = parse("a<!-- hidden -->b<!--[if IE]><script>x</script><![endif]-->c");
        assert_eq!(dom.to_html().unwrap(), "abc");
        assert_eq!(dom.metrics().get_comments_discarded(), 2);
        let has_comment = dom.descendants().iter().any(|handle| {
            matches!(handle.read().unwrap().data, NodeData::Comment(_))
        });
        assert!(!has_comment);
    }

    #[test]
    fn test_comment_marker_inside_attribute_is_text() {
        let dom = parse(r#"<p title="<!--x-->">y</p>"#);
        let p = &dom.get_elements_by_tag_name("p")[0];
        assert_eq!(p.read().unwrap().as_element().unwrap().attribute("title"), Some("<!--x-->"));
        assert_eq!(dom.metrics().get_comments_discarded(), 0);
    }

    #[test]
    fn test_svg_namespace_and_attributes() {
        let dom = parse(r##"<svg viewBox="0 0 1 1"><use xlink:href="#a"/></svg>"##);
        let svg = &dom.get_elements_by_tag_name("svg")[0];
        let guard = svg.read().unwrap();
        let element = guard.as_element().unwrap();
        assert_eq!(element.name.ns, ns!(svg));
        assert_eq!(element.attribute("viewBox"), Some("0 0 1 1"));

        let link = &dom.get_elements_by_tag_name("use")[0];
        let guard = link.read().unwrap();
        assert_eq!(guard.as_element().unwrap().attribute("xlink:href"), Some("#a"));
    }

    #[test]
    fn test_template_contents_are_children() {
        let dom = parse("<template><p>x</p></template>");
        assert_eq!(dom.get_elements_by_tag_name("p").len(), 1);
        assert_eq!(dom.to_html().unwrap(), "<template><p>x</p></template>");
    }

    #[test]
    fn test_depth_limit() {
        let config = ParserConfig {
            max_depth: 4,
            ..ParserConfig::default()
        };
        assert!(parse_fragment("<div><div><div>x</div></div></div>", &config).is_ok());
        let err = parse_fragment("<div><div><div><div>x</div></div></div></div>", &config).unwrap_err();
        assert!(matches!(err, ParserError::NestingTooDeep(5)));
    }

    #[test]
    fn test_input_limits() {
        let config = ParserConfig {
            max_input_bytes: 8,
            ..ParserConfig::default()
        };
        assert!(matches!(
            parse_fragment("<p>too long</p>", &config),
            Err(ParserError::ParseFailure(_))
        ));
        assert!(matches!(
            parse_fragment_from_reader("<p>too long</p>".as_bytes(), &config),
            Err(ParserError::ParseFailure(_))
        ));
        assert!(parse_fragment_from_reader("<b>k</b>".as_bytes(), &config).is_ok());
    }

    #[test]
    fn test_invalid_utf8() {
        let err = parse_fragment_bytes(&[b'<', b'p', b'>', 0xff, 0xfe], &ParserConfig::default())
            .unwrap_err();
        assert!(matches!(err, ParserError::ParseFailure(_)));
    }

    #[test]
    fn test_empty_input() {
        let dom = parse("");
        assert!(dom.children().is_empty());
        assert_eq!(dom.to_html().unwrap(), "");
    }
}
