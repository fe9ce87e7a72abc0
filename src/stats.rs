/*!
 * Size statistics for flattened output
 */

use once_cell::sync::Lazy;
use tiktoken_rs::CoreBPE;
use tracing::warn;

/// Shared cl100k encoding, `None` when it could not be built
static ENCODING: Lazy<Option<CoreBPE>> = Lazy::new(|| match tiktoken_rs::cl100k_base() {
    Ok(bpe) => Some(bpe),
    Err(e) => {
        warn!(error = %e, "Token encoder unavailable, estimating tokens");
        None
    }
});

/// Character, line and token counts of a piece of text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContentStats {
    /// Number of characters
    pub characters: usize,
    /// Number of non-empty lines
    pub lines: usize,
    /// Number of LLM tokens
    pub tokens: usize,
    /// Whether `tokens` was counted by the encoder rather than estimated
    pub tokens_counted: bool,
}

impl ContentStats {
    /// Measure `text`
    pub fn measure(text: &str) -> Self {
        let characters = text.chars().count();
        let lines = text.lines().filter(|line| !line.trim().is_empty()).count();
        let (tokens, tokens_counted) = match ENCODING.as_ref() {
            Some(bpe) => (bpe.encode_ordinary(text).len(), true),
            None => (estimate_tokens(characters), false),
        };

        Self {
            characters,
            lines,
            tokens,
            tokens_counted,
        }
    }
}

/// Rough token count: one token per four characters, rounded up
pub fn estimate_tokens(characters: usize) -> usize {
    characters.div_ceil(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_rounds_up() {
        assert_eq!(estimate_tokens(0), 0);
        assert_eq!(estimate_tokens(1), 1);
        assert_eq!(estimate_tokens(8), 2);
        assert_eq!(estimate_tokens(9), 3);
    }

    #[test]
    fn test_measure_counts_non_empty_lines() {
        let stats = ContentStats::measure("a.js:\nlet x = 1;\n\n\n  \nb");
        assert_eq!(stats.lines, 3);
        assert_eq!(stats.characters, 23);
    }

    #[test]
    fn test_measure_empty() {
        let stats = ContentStats::measure("");
        assert_eq!(stats.characters, 0);
        assert_eq!(stats.lines, 0);
        assert_eq!(stats.tokens, 0);
    }

    #[test]
    fn test_tokens_present_for_text() {
        let stats = ContentStats::measure("hello world, this is a digest");
        assert!(stats.tokens > 0);
    }
}
