//! Composable structural matchers
//!
//! A [`Matcher`] attempts to produce a [`Match`] at a byte offset. Concrete
//! kinds are a closed set: [`Literal`], [`Token`], [`Sequence`], [`Optional`],
//! [`ZeroOrMore`], [`FirstOf`], [`AtDepth`] and [`BracedBlock`]. They nest
//! freely, so a grammar is built as a value and handed to [`find_first`] or
//! [`find_all`], which walk a source with the lexer and only attempt matches
//! at positions that are code.
//!
//! A [`Match`] is pure data. Its offsets are valid only against the exact
//! text it was produced from; after any edit they are stale and must be
//! discarded, which is why the injectors re-parse instead of patching
//! offsets.

use regex::Regex;

use super::block::matching_brace;
use super::lexer::Lexer;

/// Capture key used by [`ZeroOrMore`] for its accumulated items.
pub const ITEMS: &str = "items";

/// Capture key used by [`BracedBlock`] for the text between its braces.
pub const BODY: &str = "body";

/// Ambient state available to a matcher at its attempt position.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchContext {
    /// Brace nesting depth relative to the start of the scanned text.
    pub depth: usize,
}

/// A named sub-capture of a [`Match`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capture {
    /// Raw captured text.
    Text(String),
    /// A single nested match.
    One(Box<Match>),
    /// Repeated nested matches, in source order.
    Many(Vec<Match>),
}

/// The result of applying a matcher at an offset.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Match {
    /// Byte offset of the first matched character.
    pub start: usize,
    /// Byte offset one past the last matched character.
    pub end: usize,
    /// The matched substring.
    pub text: String,
    /// Named sub-captures, in the order they were produced.
    pub captures: Vec<(&'static str, Capture)>,
}

impl Match {
    fn empty_at(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
            ..Self::default()
        }
    }

    /// Looks up a named capture.
    #[must_use]
    pub fn capture(&self, name: &str) -> Option<&Capture> {
        self.captures
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, c)| c)
    }

    /// The nested match under `name`, when the capture holds exactly one.
    #[must_use]
    pub fn capture_match(&self, name: &str) -> Option<&Match> {
        match self.capture(name)? {
            Capture::One(m) => Some(m),
            _ => None,
        }
    }

    /// The text of a named capture, descending into a nested match.
    #[must_use]
    pub fn capture_text(&self, name: &str) -> Option<&str> {
        match self.capture(name)? {
            Capture::Text(t) => Some(t),
            Capture::One(m) => Some(&m.text),
            Capture::Many(_) => None,
        }
    }

    /// The repeated matches under `name`, or an empty slice.
    ///
    /// Descends through a single nested match so a named [`ZeroOrMore`]
    /// inside a [`Sequence`] reads naturally.
    #[must_use]
    pub fn capture_list(&self, name: &str) -> &[Match] {
        match self.capture(name) {
            Some(Capture::Many(items)) => items,
            Some(Capture::One(m)) => match m.capture(ITEMS) {
                Some(Capture::Many(items)) => items,
                _ => &[],
            },
            _ => &[],
        }
    }
}

/// A structural pattern that can be attempted at a byte offset.
pub trait Matcher {
    /// Attempts to match at `offset`; `None` when the pattern does not
    /// apply there. Failure never consumes input.
    fn attempt(&self, text: &str, offset: usize, ctx: &MatchContext) -> Option<Match>;
}

/// Matches an exact string.
pub struct Literal(pub &'static str);

impl Matcher for Literal {
    fn attempt(&self, text: &str, offset: usize, _ctx: &MatchContext) -> Option<Match> {
        if text[offset..].starts_with(self.0) {
            Some(Match {
                start: offset,
                end: offset + self.0.len(),
                text: self.0.to_string(),
                captures: Vec::new(),
            })
        } else {
            None
        }
    }
}

/// Matches a regex anchored at the attempt offset.
pub struct Token {
    re: &'static Regex,
    keyword: bool,
}

impl Token {
    /// Wraps a regex; `re` must be anchored with `^`.
    #[must_use]
    pub fn new(re: &'static Regex) -> Self {
        Self { re, keyword: false }
    }

    /// Like [`Token::new`], additionally refusing to match when the
    /// preceding character belongs to an identifier, so `node` cannot
    /// match inside `mynode`.
    #[must_use]
    pub fn keyword(re: &'static Regex) -> Self {
        Self { re, keyword: true }
    }
}

impl Matcher for Token {
    fn attempt(&self, text: &str, offset: usize, _ctx: &MatchContext) -> Option<Match> {
        if self.keyword {
            if let Some(prev) = text[..offset].chars().next_back() {
                if prev.is_alphanumeric() || prev == '_' {
                    return None;
                }
            }
        }
        let m = self.re.find(&text[offset..])?;
        if m.start() != 0 {
            return None;
        }
        Some(Match {
            start: offset,
            end: offset + m.end(),
            text: m.as_str().to_string(),
            captures: Vec::new(),
        })
    }
}

/// One element of a [`Sequence`], optionally captured under a name.
pub struct Item {
    name: Option<&'static str>,
    matcher: Box<dyn Matcher>,
}

impl Item {
    /// An element that is matched but not captured.
    #[must_use]
    pub fn skip(matcher: impl Matcher + 'static) -> Self {
        Self {
            name: None,
            matcher: Box::new(matcher),
        }
    }

    /// An element captured under `name`.
    #[must_use]
    pub fn named(name: &'static str, matcher: impl Matcher + 'static) -> Self {
        Self {
            name: Some(name),
            matcher: Box::new(matcher),
        }
    }
}

/// Matches each element in order, skipping whitespace between elements.
/// Fails as a whole when any element fails, producing no partial match.
pub struct Sequence(pub Vec<Item>);

impl Matcher for Sequence {
    fn attempt(&self, text: &str, offset: usize, ctx: &MatchContext) -> Option<Match> {
        let mut pos = offset;
        let mut captures = Vec::new();
        for (index, item) in self.0.iter().enumerate() {
            if index > 0 {
                pos = skip_whitespace(text, pos);
            }
            let m = item.matcher.attempt(text, pos, ctx)?;
            pos = m.end;
            if let Some(name) = item.name {
                captures.push((name, Capture::One(Box::new(m))));
            }
        }
        Some(Match {
            start: offset,
            end: pos,
            text: text[offset..pos].to_string(),
            captures,
        })
    }
}

/// Succeeds with an empty match when the inner matcher fails, consuming
/// nothing.
pub struct Optional(Box<dyn Matcher>);

impl Optional {
    /// Wraps `matcher`.
    #[must_use]
    pub fn of(matcher: impl Matcher + 'static) -> Self {
        Self(Box::new(matcher))
    }
}

impl Matcher for Optional {
    fn attempt(&self, text: &str, offset: usize, ctx: &MatchContext) -> Option<Match> {
        Some(
            self.0
                .attempt(text, offset, ctx)
                .unwrap_or_else(|| Match::empty_at(offset)),
        )
    }
}

/// Applies the inner matcher repeatedly until it fails or stops making
/// progress, accumulating matches in source order under [`ITEMS`].
pub struct ZeroOrMore(Box<dyn Matcher>);

impl ZeroOrMore {
    /// Wraps `matcher`.
    #[must_use]
    pub fn of(matcher: impl Matcher + 'static) -> Self {
        Self(Box::new(matcher))
    }
}

impl Matcher for ZeroOrMore {
    fn attempt(&self, text: &str, offset: usize, ctx: &MatchContext) -> Option<Match> {
        let mut pos = offset;
        let mut items = Vec::new();
        loop {
            let next = skip_whitespace(text, pos);
            match self.0.attempt(text, next, ctx) {
                Some(m) if m.end > next => {
                    pos = m.end;
                    items.push(m);
                }
                _ => break,
            }
        }
        Some(Match {
            start: offset,
            end: pos,
            text: text[offset..pos].to_string(),
            captures: vec![(ITEMS, Capture::Many(items))],
        })
    }
}

/// Tries alternatives in order; the first success wins, with no
/// backtracking across alternatives. Order encodes precedence.
pub struct FirstOf(pub Vec<Box<dyn Matcher>>);

impl Matcher for FirstOf {
    fn attempt(&self, text: &str, offset: usize, ctx: &MatchContext) -> Option<Match> {
        self.0.iter().find_map(|m| m.attempt(text, offset, ctx))
    }
}

/// Restricts the inner matcher to attempts at an exact brace depth, so a
/// repetition over `stage` sections sees direct children of the enclosing
/// block and not stages nested deeper.
pub struct AtDepth {
    depth: usize,
    inner: Box<dyn Matcher>,
}

impl AtDepth {
    /// Wraps `matcher`, restricted to `depth`.
    #[must_use]
    pub fn of(depth: usize, matcher: impl Matcher + 'static) -> Self {
        Self {
            depth,
            inner: Box::new(matcher),
        }
    }
}

impl Matcher for AtDepth {
    fn attempt(&self, text: &str, offset: usize, ctx: &MatchContext) -> Option<Match> {
        if ctx.depth == self.depth {
            self.inner.attempt(text, offset, ctx)
        } else {
            None
        }
    }
}

/// Matches a `{ ... }` region via the block matcher; braces inside strings
/// and comments never count. Captures the interior under [`BODY`].
pub struct BracedBlock;

impl Matcher for BracedBlock {
    fn attempt(&self, text: &str, offset: usize, _ctx: &MatchContext) -> Option<Match> {
        let close = matching_brace(text, offset).ok()?;
        Some(Match {
            start: offset,
            end: close + 1,
            text: text[offset..=close].to_string(),
            captures: vec![(BODY, Capture::Text(text[offset + 1..close].to_string()))],
        })
    }
}

fn skip_whitespace(text: &str, mut pos: usize) -> usize {
    for ch in text[pos..].chars() {
        if ch.is_whitespace() {
            pos += ch.len_utf8();
        } else {
            break;
        }
    }
    pos
}

/// Scans `text` from the start and returns the first match, attempting the
/// matcher only at positions the lexer classifies as code.
#[must_use]
pub fn find_first(text: &str, matcher: &dyn Matcher) -> Option<Match> {
    Scan::new(text, matcher).next()
}

/// All non-overlapping matches in source order. The scan resumes after each
/// match, so regions consumed by a match are never re-entered.
#[must_use]
pub fn find_all(text: &str, matcher: &dyn Matcher) -> Vec<Match> {
    Scan::new(text, matcher).collect()
}

struct Scan<'a> {
    text: &'a str,
    matcher: &'a dyn Matcher,
    lexer: Lexer,
    depth: usize,
    pos: usize,
}

impl<'a> Scan<'a> {
    fn new(text: &'a str, matcher: &'a dyn Matcher) -> Self {
        Self {
            text,
            matcher,
            lexer: Lexer::new(),
            depth: 0,
            pos: 0,
        }
    }

    fn consume_to(&mut self, end: usize) {
        for ch in self.text[self.pos..end].chars() {
            self.lexer.consume(ch);
            if self.lexer.state().is_code() {
                match ch {
                    '{' => self.depth += 1,
                    '}' => self.depth = self.depth.saturating_sub(1),
                    _ => {}
                }
            }
        }
        self.pos = end;
    }
}

impl Iterator for Scan<'_> {
    type Item = Match;

    fn next(&mut self) -> Option<Match> {
        while self.pos < self.text.len() {
            if self.lexer.state().is_code() {
                let ctx = MatchContext { depth: self.depth };
                if let Some(m) = self.matcher.attempt(self.text, self.pos, &ctx) {
                    if m.end > self.pos {
                        self.consume_to(m.end);
                        return Some(m);
                    }
                }
            }
            let ch = self.text[self.pos..].chars().next()?;
            self.consume_to(self.pos + ch.len_utf8());
        }
        None
    }
}
