use html5ever::tokenizer::TokenizerOpts;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::ParseOpts;
use serde::Deserialize;

use crate::error::{ParserError, ParserResult};

/// Configuration for the parser
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Maximum depth for nested elements
    pub max_depth: usize,
    /// Maximum input size in bytes
    pub max_input_bytes: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_depth: 256,
            max_input_bytes: 16 * 1024 * 1024, // 16MB
        }
    }
}

impl ParserConfig {
    /// Create tree builder options based on configuration.
    ///
    /// Scripting stays enabled so `<noscript>` content is parsed as raw text,
    /// the way a script-capable browser will later read the output.
    pub fn tree_builder_opts(&self) -> TreeBuilderOpts {
        TreeBuilderOpts {
            drop_doctype: true,
            scripting_enabled: true,
            iframe_srcdoc: false,
            ..Default::default()
        }
    }

    /// Create tokenizer options based on configuration
    pub fn tokenizer_opts(&self) -> TokenizerOpts {
        TokenizerOpts {
            ..Default::default()
        }
    }

    pub fn parse_opts(&self) -> ParseOpts {
        ParseOpts {
            tokenizer: self.tokenizer_opts(),
            tree_builder: self.tree_builder_opts(),
        }
    }

    /// Rejects input longer than `max_input_bytes`.
    pub fn check_input_len(&self, len: usize) -> ParserResult<()> {
        if len > self.max_input_bytes {
            return Err(ParserError::ParseFailure(format!(
                "input of {} bytes exceeds the {} byte limit",
                len, self.max_input_bytes
            )));
        }
        Ok(())
    }

    /// Rejects trees deeper than `max_depth`.
    pub fn check_depth(&self, depth: usize) -> ParserResult<()> {
        if depth > self.max_depth {
            return Err(ParserError::NestingTooDeep(depth));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ParserConfig::default();
        assert_eq!(config.max_depth, 256);
        assert_eq!(config.max_input_bytes, 16 * 1024 * 1024);
        assert!(config.tree_builder_opts().scripting_enabled);
        assert!(config.tree_builder_opts().drop_doctype);
    }

    #[test]
    fn test_limits() {
        let config = ParserConfig {
            max_depth: 3,
            max_input_bytes: 10,
        };
        assert!(config.check_input_len(10).is_ok());
        assert!(matches!(config.check_input_len(11), Err(ParserError::ParseFailure(_))));
        assert!(config.check_depth(3).is_ok());
        assert!(matches!(config.check_depth(4), Err(ParserError::NestingTooDeep(4))));
    }

    #[test]
    fn test_partial_json_config() {
        let config: ParserConfig = serde_json::from_str(r#"{"max_depth": 12}"#).unwrap();
        assert_eq!(config.max_depth, 12);
        assert_eq!(config.max_input_bytes, ParserConfig::default().max_input_bytes);
    }
}
