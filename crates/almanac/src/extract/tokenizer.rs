//! Delimiter-aware splitting of enumerations.
//!
//! Splits on commas and semicolons at parenthesis depth 0, keeping commas
//! that sit between two digits (thousands separators) inside the token.

/// Default delimiters for category enumerations.
pub const DEFAULT_DELIMITERS: &[char] = &[',', ';'];

/// Splits text into top-level tokens.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    delimiters: Vec<char>,
}

impl Tokenizer {
    /// Create a tokenizer splitting on commas and semicolons.
    pub fn new() -> Self {
        Self::with_delimiters(DEFAULT_DELIMITERS)
    }

    /// Create a tokenizer with a custom delimiter set.
    pub fn with_delimiters(delimiters: &[char]) -> Self {
        Self {
            delimiters: delimiters.to_vec(),
        }
    }

    /// Split `text` into trimmed, non-empty tokens in input order.
    ///
    /// Unbalanced closing parentheses clamp the depth at zero rather than
    /// failing; an unclosed `(` keeps the rest of the input in one token.
    pub fn split(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let mut tokens = Vec::new();
        let mut current = String::new();
        let mut depth: usize = 0;

        for (i, &ch) in chars.iter().enumerate() {
            match ch {
                '(' => {
                    depth += 1;
                    current.push(ch);
                }
                ')' => {
                    depth = depth.saturating_sub(1);
                    current.push(ch);
                }
                c if depth == 0 && self.delimiters.contains(&c) => {
                    if is_digit_at(&chars, i.wrapping_sub(1)) && is_digit_at(&chars, i + 1) {
                        current.push(c);
                    } else {
                        flush(&mut current, &mut tokens);
                    }
                }
                _ => current.push(ch),
            }
        }
        flush(&mut current, &mut tokens);

        tokens
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Split `text` on top-level commas and semicolons.
///
/// ```
/// use almanac::extract::tokenize;
///
/// assert_eq!(tokenize("A, 1,234, B"), vec!["A", "1,234", "B"]);
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    Tokenizer::new().split(text)
}

/// How the parentheses of a string pair up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParenBalance {
    Balanced,
    /// Number of `(` left open at the end of input.
    Unclosed(usize),
    /// Number of `)` seen with no matching `(`.
    Unopened(usize),
}

impl ParenBalance {
    pub fn is_balanced(&self) -> bool {
        matches!(self, ParenBalance::Balanced)
    }
}

/// Check how the parentheses in `text` pair up.
///
/// Stray closers are counted first since they are the more surprising
/// defect; a string with both kinds reports `Unopened`.
pub fn paren_balance(text: &str) -> ParenBalance {
    let mut depth: usize = 0;
    let mut unopened = 0;

    for ch in text.chars() {
        match ch {
            '(' => depth += 1,
            ')' if depth == 0 => unopened += 1,
            ')' => depth -= 1,
            _ => {}
        }
    }

    if unopened > 0 {
        ParenBalance::Unopened(unopened)
    } else if depth > 0 {
        ParenBalance::Unclosed(depth)
    } else {
        ParenBalance::Balanced
    }
}

fn is_digit_at(chars: &[char], index: usize) -> bool {
    chars.get(index).is_some_and(|c| c.is_ascii_digit())
}

fn flush(current: &mut String, tokens: &mut Vec<String>) {
    let token = current.trim();
    if !token.is_empty() {
        tokens.push(token.to_string());
    }
    current.clear();
}
