//! Brace matching that ignores braces inside strings and comments

use super::errors::JenkinsfileError;
use super::lexer::Lexer;

/// Finds the `}` that balances the `{` at byte offset `open`.
///
/// The scan feeds every character through a fresh [`Lexer`] and counts
/// braces only while it reports code, so `{` and `}` inside strings and
/// comments never affect the depth.
///
/// # Errors
///
/// [`JenkinsfileError::UnbalancedBlock`] when `open` does not point at a
/// `{`, or when the end of `text` is reached before the depth returns to
/// zero.
pub fn matching_brace(text: &str, open: usize) -> Result<usize, JenkinsfileError> {
    if !text[open..].starts_with('{') {
        return Err(JenkinsfileError::UnbalancedBlock { offset: open });
    }

    let mut lexer = Lexer::new();
    let mut depth = 0usize;
    for (i, ch) in text[open..].char_indices() {
        lexer.consume(ch);
        if lexer.state().is_code() {
            match ch {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(open + i);
                    }
                }
                _ => {}
            }
        }
    }
    Err(JenkinsfileError::UnbalancedBlock { offset: open })
}
