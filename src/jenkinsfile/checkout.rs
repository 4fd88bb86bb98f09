//! Recognizes the conventional source-checkout steps
//!
//! A pipeline may have stages or nodes that never touch the repository
//! (deploy-only, cleanup). Only a block that checks sources out is worth
//! instrumenting, because without a checkout there is no commit to report.

use once_cell::sync::Lazy;
use regex::Regex;

static CHECKOUT_SCM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^([ \t]*)checkout\s+scm.*$").unwrap());
static GIT_CLONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^([ \t]*)git\s+clone\s.*$").unwrap());

/// A located checkout invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutCall {
    /// Byte offset of the start of the line, at the indentation.
    pub start: usize,
    /// Byte offset just past the call, trailing whitespace excluded.
    pub content_end: usize,
    /// The leading indentation of the line.
    pub indent: String,
    /// The full matched line.
    pub line: String,
}

/// Finds the first conventional checkout in `text`: a `checkout scm` line,
/// or failing that a `git clone ...` line.
#[must_use]
pub fn find_checkout(text: &str) -> Option<CheckoutCall> {
    let caps = CHECKOUT_SCM_RE
        .captures(text)
        .or_else(|| GIT_CLONE_RE.captures(text))?;
    let whole = caps.get(0)?;
    Some(CheckoutCall {
        start: whole.start(),
        content_end: whole.start() + whole.as_str().trim_end().len(),
        indent: caps.get(1).map_or_else(String::new, |m| m.as_str().to_string()),
        line: whole.as_str().to_string(),
    })
}

/// Whether the region performs a checkout at all.
#[must_use]
pub fn has_checkout(text: &str) -> bool {
    CHECKOUT_SCM_RE.is_match(text) || GIT_CLONE_RE.is_match(text)
}
