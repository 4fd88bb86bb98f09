//! Structural sections of a Jenkinsfile
//!
//! Thin typed views over [`grammar`](super::grammar) matches: each section
//! carries the absolute byte offsets an injector needs to splice text. All
//! offsets refer to the exact source the section was extracted from and are
//! stale after any edit.

use once_cell::sync::Lazy;
use regex::Regex;

use super::block::matching_brace;
use super::errors::JenkinsfileError;
use super::grammar::{
    find_all, find_first, AtDepth, BracedBlock, FirstOf, Item, Literal, Match, Optional, Sequence,
    Token, ZeroOrMore,
};
use super::lexer::Lexer;

static IDENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*").unwrap());
static PAREN_VALUE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^)]*").unwrap());
static REST_OF_LINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\n]*").unwrap());
static STAGE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^stage\b").unwrap());
static STEPS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^steps\b").unwrap());
static NODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^node\b").unwrap());
static POST_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^post\b").unwrap());
static POST_CONDITION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:always|changed|fixed|regression|aborted|failure|success|unstable|cleanup)\b")
        .unwrap()
});
static PIPELINE_OPEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*pipeline\s*\{").unwrap());

/// Byte offsets of a `{ ... }` region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSpan {
    /// Offset of the opening brace.
    pub open_brace: usize,
    /// Offset of the closing brace.
    pub close_brace: usize,
}

impl BlockSpan {
    /// The interior of the block, excluding both braces.
    #[must_use]
    pub fn body<'a>(&self, text: &'a str) -> &'a str {
        &text[self.open_brace + 1..self.close_brace]
    }
}

/// A `name`, `name(arg)`, `name { ... }` or `name(arg) { ... }` entry that
/// is a direct child of an enclosing block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// The directive keyword.
    pub name: String,
    /// The parenthesized argument, when present and non-empty.
    pub arg: Option<String>,
    /// Offset of the first character of the name.
    pub start: usize,
    /// Offset one past the directive.
    pub end: usize,
    /// The braced body; `None` for rest-of-line directives like `agent any`.
    pub block: Option<BlockSpan>,
    /// The full matched text.
    pub text: String,
}

/// The declarative `pipeline { ... }` root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSection {
    /// Offset of the `pipeline` keyword.
    pub start: usize,
    /// The root block.
    pub block: BlockSpan,
    /// Direct-child directives, in source order.
    pub children: Vec<Directive>,
}

impl PipelineSection {
    /// The first direct child directive with the given name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Directive> {
        self.children.iter().find(|d| d.name == name)
    }
}

/// A `stage('Name') { ... }` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSection {
    /// The stage name, quotes stripped.
    pub name: String,
    /// Offset of the `stage` keyword.
    pub start: usize,
    /// The stage block.
    pub block: BlockSpan,
    /// The full matched text.
    pub text: String,
}

/// The `steps { ... }` list inside a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepsSection {
    /// Offset of the `steps` keyword.
    pub start: usize,
    /// The step-list block; markers are spliced between its braces.
    pub block: BlockSpan,
    /// The full matched text.
    pub text: String,
}

/// One condition block inside a `post` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostCondition {
    /// The condition keyword, e.g. `success`.
    pub name: String,
    /// Offset of the condition keyword.
    pub start: usize,
    /// The condition block.
    pub block: BlockSpan,
}

/// The `post { ... }` section of a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostSection {
    /// Offset of the `post` keyword.
    pub start: usize,
    /// The post block.
    pub block: BlockSpan,
    /// Parsed condition blocks; empty when the body defies the grammar.
    pub conditions: Vec<PostCondition>,
}

/// A scripted `node { ... }` or `node('label') { ... }` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeBlock {
    /// Offset of the `node` keyword.
    pub start: usize,
    /// The parenthesized argument, when present and non-empty.
    pub arg: Option<String>,
    /// The node body block.
    pub block: BlockSpan,
    /// The full matched text, from the keyword through the closing brace.
    pub text: String,
}

impl NodeBlock {
    /// Offset one past the closing brace.
    #[must_use]
    pub fn end(&self) -> usize {
        self.block.close_brace + 1
    }
}

fn paren_arg() -> Sequence {
    Sequence(vec![
        Item::skip(Literal("(")),
        Item::named("value", Token::new(&PAREN_VALUE_RE)),
        Item::skip(Literal(")")),
    ])
}

fn directive_grammar() -> Sequence {
    Sequence(vec![
        Item::named("name", Token::keyword(&IDENT_RE)),
        Item::named("arg", Optional::of(paren_arg())),
        Item::named(
            "body",
            FirstOf(vec![
                Box::new(BracedBlock),
                Box::new(Token::new(&REST_OF_LINE_RE)),
            ]),
        ),
    ])
}

fn stage_grammar() -> Sequence {
    Sequence(vec![
        Item::skip(Token::keyword(&STAGE_RE)),
        Item::named("name", paren_arg()),
        Item::named("block", BracedBlock),
    ])
}

fn steps_grammar() -> Sequence {
    Sequence(vec![
        Item::skip(Token::keyword(&STEPS_RE)),
        Item::named("block", BracedBlock),
    ])
}

fn node_grammar() -> Sequence {
    Sequence(vec![
        Item::skip(Token::keyword(&NODE_RE)),
        Item::named("arg", Optional::of(paren_arg())),
        Item::named("block", BracedBlock),
    ])
}

fn post_condition_grammar() -> Sequence {
    Sequence(vec![
        Item::named("name", Token::keyword(&POST_CONDITION_RE)),
        Item::named("block", BracedBlock),
    ])
}

fn post_section_grammar() -> Sequence {
    Sequence(vec![
        Item::skip(Token::keyword(&POST_RE)),
        Item::skip(Literal("{")),
        Item::named("conditions", ZeroOrMore::of(post_condition_grammar())),
        Item::skip(Literal("}")),
    ])
}

/// The first match of `re` whose start position the lexer classifies as
/// code, so a marker inside a comment or string is never picked.
fn first_code_match<'t>(text: &'t str, re: &Regex) -> Option<regex::Match<'t>> {
    let mut lexer = Lexer::new();
    let mut pos = 0;
    for m in re.find_iter(text) {
        for ch in text[pos..m.start()].chars() {
            lexer.consume(ch);
        }
        pos = m.start();
        if lexer.state().is_code() {
            return Some(m);
        }
    }
    None
}

/// Finds the declarative pipeline root.
///
/// # Errors
///
/// [`JenkinsfileError::StructuralNotFound`] when no `pipeline {` line
/// exists, [`JenkinsfileError::UnbalancedBlock`] when its block never
/// closes.
pub fn pipeline_section(text: &str) -> Result<PipelineSection, JenkinsfileError> {
    let found = first_code_match(text, &PIPELINE_OPEN_RE)
        .ok_or(JenkinsfileError::StructuralNotFound { section: "pipeline" })?;
    let open = found.end() - 1;
    let close = matching_brace(text, open)?;
    let block = BlockSpan {
        open_brace: open,
        close_brace: close,
    };
    let indent = found.as_str().len() - found.as_str().trim_start().len();
    Ok(PipelineSection {
        start: found.start() + indent,
        block,
        children: directives(block.body(text), open + 1),
    })
}

/// Direct-child directives of a block body; `base` is the absolute offset
/// of the body's first byte.
fn directives(body: &str, base: usize) -> Vec<Directive> {
    let matcher = AtDepth::of(0, directive_grammar());
    find_all(body, &matcher)
        .iter()
        .map(|m| directive_from(m, base))
        .collect()
}

fn directive_from(m: &Match, base: usize) -> Directive {
    let block = m
        .capture_match("body")
        .filter(|b| b.text.starts_with('{'))
        .map(|b| BlockSpan {
            open_brace: base + b.start,
            close_brace: base + b.end - 1,
        });
    Directive {
        name: m
            .capture_match("name")
            .map(|n| n.text.clone())
            .unwrap_or_default(),
        arg: m
            .capture_match("arg")
            .and_then(|a| a.capture_text("value"))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty()),
        start: base + m.start,
        end: base + m.end,
        block,
        text: m.text.clone(),
    }
}

fn unquote(s: &str) -> &str {
    let t = s.trim();
    t.strip_prefix('\'')
        .and_then(|r| r.strip_suffix('\''))
        .or_else(|| t.strip_prefix('"').and_then(|r| r.strip_suffix('"')))
        .unwrap_or(t)
}

/// The stage sections that are direct children of the `stages` block, in
/// source order. Stages nested inside other stages are not listed.
#[must_use]
pub fn stage_sections(text: &str, stages: &Directive) -> Vec<StageSection> {
    let Some(block) = stages.block else {
        return Vec::new();
    };
    let base = block.open_brace + 1;
    let matcher = AtDepth::of(0, stage_grammar());
    find_all(block.body(text), &matcher)
        .iter()
        .filter_map(|m| {
            let b = m.capture_match("block")?;
            Some(StageSection {
                name: m
                    .capture_match("name")
                    .and_then(|a| a.capture_text("value"))
                    .map(unquote)
                    .unwrap_or_default()
                    .to_string(),
                start: base + m.start,
                block: BlockSpan {
                    open_brace: base + b.start,
                    close_brace: base + b.end - 1,
                },
                text: m.text.clone(),
            })
        })
        .collect()
}

/// The first `steps { ... }` list that is a direct child of the stage
/// block.
#[must_use]
pub fn steps_section(text: &str, stage: &StageSection) -> Option<StepsSection> {
    let base = stage.block.open_brace + 1;
    let matcher = AtDepth::of(0, steps_grammar());
    let m = find_first(stage.block.body(text), &matcher)?;
    let b = m.capture_match("block")?;
    Some(StepsSection {
        start: base + m.start,
        block: BlockSpan {
            open_brace: base + b.start,
            close_brace: base + b.end - 1,
        },
        text: m.text.clone(),
    })
}

/// The `post` section among a pipeline's children, with its condition
/// blocks parsed best-effort.
#[must_use]
pub fn post_section(text: &str, pipeline: &PipelineSection) -> Option<PostSection> {
    let directive = pipeline.child("post")?;
    let block = directive.block?;
    let base = directive.start;
    let conditions = find_first(&directive.text, &post_section_grammar())
        .map(|m| {
            m.capture_list("conditions")
                .iter()
                .filter_map(|c| {
                    let b = c.capture_match("block")?;
                    Some(PostCondition {
                        name: c
                            .capture_match("name")
                            .map(|n| n.text.clone())
                            .unwrap_or_default(),
                        start: base + c.start,
                        block: BlockSpan {
                            open_brace: base + b.start,
                            close_brace: base + b.end - 1,
                        },
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    Some(PostSection {
        start: directive.start,
        block,
        conditions,
    })
}

/// Every top-level `node { ... }` block, outermost first. Nodes nested in
/// another block are left to their enclosing block's rewrite.
#[must_use]
pub fn node_blocks(text: &str) -> Vec<NodeBlock> {
    let matcher = AtDepth::of(0, node_grammar());
    find_all(text, &matcher)
        .iter()
        .filter_map(|m| {
            let b = m.capture_match("block")?;
            Some(NodeBlock {
                start: m.start,
                arg: m
                    .capture_match("arg")
                    .and_then(|a| a.capture_text("value"))
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty()),
                block: BlockSpan {
                    open_brace: b.start,
                    close_brace: b.end - 1,
                },
                text: m.text.clone(),
            })
        })
        .collect()
}
