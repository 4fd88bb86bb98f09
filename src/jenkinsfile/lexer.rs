//! Quote- and comment-aware lexical scanning
//!
//! A Jenkinsfile is Groovy, so a `{` can appear inside `'...'`, `"..."`,
//! `// ...` or `/* ... */` without opening a block. Every structural scan in
//! this crate runs on top of the state machine defined here so that braces
//! and keywords inside literals and comments are never mistaken for code.

/// Lexical state of a scan position in a Groovy-flavoured pipeline file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LexState {
    /// Plain code.
    #[default]
    Normal,
    /// Inside a single-quoted string literal.
    SingleQuote,
    /// Inside a double-quoted string literal.
    DoubleQuote,
    /// Inside a `//` comment, up to the next newline.
    LineComment,
    /// Inside a `/* ... */` comment.
    BlockComment,
}

impl LexState {
    /// Whether characters consumed in this state are executable code.
    #[must_use]
    pub fn is_code(self) -> bool {
        matches!(self, Self::Normal)
    }
}

/// Advances the lexical state by one character.
///
/// `prev` is the character consumed immediately before `ch`, if any. A
/// single-quoted string closes only on an unescaped `'`, a double-quoted
/// string only on an unescaped `"`. Comments do not nest, and no escape
/// processing happens beyond a backslash suppressing a closing quote.
#[must_use]
pub fn advance(state: LexState, ch: char, prev: Option<char>) -> LexState {
    match state {
        LexState::Normal => match ch {
            '"' => LexState::DoubleQuote,
            '\'' => LexState::SingleQuote,
            '/' if prev == Some('/') => LexState::LineComment,
            '*' if prev == Some('/') => LexState::BlockComment,
            _ => LexState::Normal,
        },
        LexState::SingleQuote if ch == '\'' && prev != Some('\\') => LexState::Normal,
        LexState::DoubleQuote if ch == '"' && prev != Some('\\') => LexState::Normal,
        LexState::LineComment if ch == '\n' => LexState::Normal,
        LexState::BlockComment if ch == '/' && prev == Some('*') => LexState::Normal,
        other => other,
    }
}

/// A forward-only cursor over [`advance`], remembering the previous
/// character so callers only have to feed it one `char` at a time.
#[derive(Debug, Clone, Default)]
pub struct Lexer {
    state: LexState,
    prev: Option<char>,
}

impl Lexer {
    /// Creates a cursor in the [`LexState::Normal`] state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes one character, updating the state.
    pub fn consume(&mut self, ch: char) {
        self.state = advance(self.state, ch, self.prev);
        self.prev = Some(ch);
    }

    /// State after the last consumed character.
    #[must_use]
    pub fn state(&self) -> LexState {
        self.state
    }
}

/// Classifies every character position in `text`.
///
/// Yields `(byte offset, state after consuming the character at it)`.
pub fn classify(text: &str) -> impl Iterator<Item = (usize, LexState)> + '_ {
    let mut lexer = Lexer::new();
    text.char_indices().map(move |(offset, ch)| {
        lexer.consume(ch);
        (offset, lexer.state())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_at(text: &str, offset: usize) -> LexState {
        classify(text)
            .find(|(o, _)| *o == offset)
            .map(|(_, s)| s)
            .unwrap()
    }

    #[test]
    fn test_plain_code_stays_normal() {
        assert!(classify("echo foo").all(|(_, s)| s == LexState::Normal));
    }

    #[test]
    fn test_single_quoted_string() {
        let text = "sh 'make {all}'";
        assert_eq!(state_at(text, text.find('{').unwrap()), LexState::SingleQuote);
        // the closing quote returns to code
        assert_eq!(state_at(text, text.len() - 1), LexState::Normal);
    }

    #[test]
    fn test_double_quoted_string() {
        let text = "echo \"a } b\" c";
        assert_eq!(state_at(text, text.find('}').unwrap()), LexState::DoubleQuote);
        assert_eq!(state_at(text, text.len() - 1), LexState::Normal);
    }

    #[test]
    fn test_quote_kinds_are_independent() {
        // a double quote inside a single-quoted string does not close it
        let text = "'a\"b'";
        assert_eq!(state_at(text, 2), LexState::SingleQuote);
        assert_eq!(state_at(text, 4), LexState::Normal);
    }

    #[test]
    fn test_backslash_suppresses_closing_quote() {
        let text = r#""a\"b" x"#;
        assert_eq!(state_at(text, 4), LexState::DoubleQuote);
        assert_eq!(state_at(text, 5), LexState::Normal);
    }

    #[test]
    fn test_line_comment_ends_at_newline() {
        let text = "a // b { c\nd";
        assert_eq!(state_at(text, text.find('{').unwrap()), LexState::LineComment);
        assert_eq!(state_at(text, text.len() - 1), LexState::Normal);
    }

    #[test]
    fn test_block_comment() {
        let text = "a /* b } */ c";
        assert_eq!(state_at(text, text.find('}').unwrap()), LexState::BlockComment);
        assert_eq!(state_at(text, text.len() - 1), LexState::Normal);
    }

    #[test]
    fn test_block_comments_do_not_nest() {
        let text = "/* a /* b */ c";
        // the first */ closes the comment even after an inner /*
        assert_eq!(state_at(text, text.len() - 1), LexState::Normal);
    }
}
