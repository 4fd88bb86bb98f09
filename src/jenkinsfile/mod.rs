//! Jenkins pipeline parsing and notification injection
//!
//! A Jenkinsfile has no fixed schema: it is Groovy, and the regions worth
//! instrumenting have to be located by scanning code structure while
//! ignoring braces and keywords inside comments and string literals. This
//! module builds that up in layers:
//!
//! - [`lexer`]: quote/comment-aware state machine
//! - [`block`]: brace matching on top of the lexer
//! - [`grammar`]: composable structural matchers
//! - [`sections`]: typed pipeline/stage/steps/post/node sections
//! - [`checkout`]: recognizer for the conventional checkout steps
//! - [`markers`]: notification templates and the idempotency guard
//! - [`declarative`] / [`scripted`]: the two dialect injectors
//!
//! The transformation is pure: text in, text (or a typed error) out, no
//! I/O and no shared state, so independent inputs can be processed from
//! any number of threads.

pub mod block;
pub mod checkout;
pub mod declarative;
pub mod errors;
pub mod grammar;
pub mod lexer;
pub mod markers;
pub mod scripted;
pub mod sections;

#[cfg(test)]
mod injector_tests;

pub use checkout::{find_checkout, has_checkout, CheckoutCall};
pub use errors::JenkinsfileError;
pub use markers::NotifyConfig;
pub use scripted::ScriptedOutcome;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static DECLARATIVE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*pipeline\s*\{").unwrap());
static SCRIPTED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*node\s*\{").unwrap());

/// The two Jenkins pipeline dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Syntax {
    /// A `pipeline { ... }` root with fixed sub-sections.
    Declarative,
    /// One or more `node { ... }` blocks of arbitrary script.
    Scripted,
}

impl std::fmt::Display for Syntax {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Syntax::Declarative => write!(f, "declarative"),
            Syntax::Scripted => write!(f, "scripted"),
        }
    }
}

/// Detects which dialect a Jenkinsfile uses.
///
/// Declarative wins when a line begins (ignoring leading whitespace) with
/// `pipeline` followed by `{`; otherwise scripted when a line begins with
/// `node` followed by `{`; `None` when neither marker appears.
#[must_use]
pub fn detect_syntax(text: &str) -> Option<Syntax> {
    if DECLARATIVE_RE.is_match(text) {
        Some(Syntax::Declarative)
    } else if SCRIPTED_RE.is_match(text) {
        Some(Syntax::Scripted)
    } else {
        None
    }
}

/// Whether `text` already invokes the default notification function.
#[must_use]
pub fn is_already_configured(text: &str) -> bool {
    NotifyConfig::default().is_configured(text)
}

/// Rewrites a Jenkinsfile so it reports build lifecycle events to
/// `webhook_url`, using the default notification templates.
///
/// Already-configured files short-circuit to a no-op before any parsing,
/// so re-running on an edited file always returns it unchanged.
///
/// # Errors
///
/// [`JenkinsfileError::SyntaxUnrecognized`] when neither dialect marker is
/// found; [`JenkinsfileError::StructuralNotFound`] and
/// [`JenkinsfileError::UnbalancedBlock`] from the declarative path on
/// malformed input.
pub fn add_notifications(text: &str, webhook_url: &str) -> Result<String, JenkinsfileError> {
    add_notifications_with(text, webhook_url, &NotifyConfig::default())
}

/// [`add_notifications`] with caller-supplied notification templates.
///
/// # Errors
///
/// Same as [`add_notifications`].
pub fn add_notifications_with(
    text: &str,
    webhook_url: &str,
    notify: &NotifyConfig,
) -> Result<String, JenkinsfileError> {
    if notify.is_configured(text) {
        return Ok(text.to_string());
    }
    match detect_syntax(text) {
        Some(Syntax::Declarative) => declarative::inject(text, webhook_url, notify),
        Some(Syntax::Scripted) => Ok(scripted::inject(text, webhook_url, notify).text),
        None => Err(JenkinsfileError::SyntaxUnrecognized),
    }
}

/// Adds notification markers to a declarative pipeline with the default
/// templates. See [`declarative::inject`].
///
/// # Errors
///
/// See [`declarative::inject`].
pub fn inject_declarative(text: &str, webhook_url: &str) -> Result<String, JenkinsfileError> {
    declarative::inject(text, webhook_url, &NotifyConfig::default())
}

/// Adds notification guards to a scripted pipeline with the default
/// templates; a no-op when no node block qualifies. See
/// [`scripted::inject`].
#[must_use]
pub fn inject_scripted(text: &str, webhook_url: &str) -> String {
    scripted::inject(text, webhook_url, &NotifyConfig::default()).text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_declarative() {
        assert_eq!(
            detect_syntax("pipeline {\n    agent any\n}\n"),
            Some(Syntax::Declarative)
        );
        // leading whitespace is fine
        assert_eq!(
            detect_syntax("  pipeline {\n}\n"),
            Some(Syntax::Declarative)
        );
    }

    #[test]
    fn test_detect_scripted() {
        assert_eq!(detect_syntax("node {\n    sh 'make'\n}\n"), Some(Syntax::Scripted));
    }

    #[test]
    fn test_declarative_is_checked_first() {
        let text = "pipeline {\n}\nnode {\n}\n";
        assert_eq!(detect_syntax(text), Some(Syntax::Declarative));
    }

    #[test]
    fn test_neither_dialect() {
        assert_eq!(detect_syntax("BAM"), None);
        assert_eq!(detect_syntax("my_pipeline {\n}\n"), None);
        // the marker must start the line
        assert_eq!(detect_syntax("x = node {\n}\n"), None);
    }

    #[test]
    fn test_syntax_display() {
        assert_eq!(Syntax::Declarative.to_string(), "declarative");
        assert_eq!(Syntax::Scripted.to_string(), "scripted");
    }
}
