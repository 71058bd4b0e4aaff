//! Tokens as delivered by an external lexer

use std::cmp::Ordering;
use std::fmt;

/// A piece of source text with its byte span `[pos, end)`.
///
/// Tokens are never mutated by this crate. Elements keep the tokens their
/// head and tail were read from, which is what makes their position known.
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Token {
    /// start byte offset
    pub pos: usize,
    /// end byte offset (exclusive)
    pub end: usize,
    pub text: String,
}

impl Token {
    /// Create a token starting at `pos`, its end is computed from the text.
    pub fn new(pos: usize, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            pos,
            end: pos + text.len(),
            text,
        }
    }

    /// A zero-width token, used as a sentinel by some lexers.
    pub fn empty(pos: usize) -> Self {
        Self {
            pos,
            end: pos,
            text: String::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos == self.end
    }
}

impl PartialOrd for Token {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Token {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.pos, self.end)
            .cmp(&(other.pos, other.end))
            .then_with(|| self.text.cmp(&other.text))
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{}..{}", self.text, self.pos, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_span() {
        let t = Token::new(3, "fis");
        assert_eq!(t.end, 6);
        assert_eq!(t.len(), 3);
        assert!(!t.is_empty());
        assert!(Token::empty(4).is_empty());
    }

    #[test]
    fn test_token_order() {
        let mut tokens = vec![Token::new(4, "d"), Token::new(0, "{"), Token::new(2, "c")];
        tokens.sort();
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, ["{", "c", "d"]);
    }
}
