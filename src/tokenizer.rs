//! Chain splitting and whitespace tokenization

/// Separates segments; the next segment runs only if the previous one succeeded.
pub const CHAIN_DELIMITER: &str = " && ";

/// One command unit produced by chain-splitting an input line
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub tokens: Vec<String>,
}

impl Segment {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into().trim().to_string();
        let tokens = tokenize(&text);
        Self { text, tokens }
    }

    /// First word, lower-cased
    pub fn head(&self) -> Option<String> {
        self.tokens.first().map(|t| t.to_lowercase())
    }

    /// Tokens after the head
    pub fn args(&self) -> &[String] {
        self.tokens.get(1..).unwrap_or(&[])
    }

    pub fn is_single_word(&self) -> bool {
        self.tokens.len() == 1
    }
}

pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

/// Split a raw line into ordered, trimmed, non-empty segments
pub fn split_chain(line: &str) -> Vec<Segment> {
    line.split(CHAIN_DELIMITER)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(Segment::new)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_segment() {
        let segments = split_chain("  ls -la  ");
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "ls -la");
        assert_eq!(segments[0].tokens, vec!["ls", "-la"]);
    }

    #[test]
    fn test_chain_split_in_order() {
        let segments = split_chain("mkdir out && cd out && pwd");
        let texts: Vec<&str> = segments.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["mkdir out", "cd out", "pwd"]);
    }

    #[test]
    fn test_empty_line_yields_nothing() {
        assert!(split_chain("").is_empty());
        assert!(split_chain("   ").is_empty());
        assert!(split_chain(" &&  && ").is_empty());
    }

    #[test]
    fn test_head_is_lowercased() {
        let segment = Segment::new("LS -a docs");
        assert_eq!(segment.head().as_deref(), Some("ls"));
        assert_eq!(segment.args(), &["-a".to_string(), "docs".to_string()]);
    }

    #[test]
    fn test_unspaced_ampersands_are_not_a_delimiter() {
        let segments = split_chain("echo a&&b");
        assert_eq!(segments.len(), 1);
    }
}
