//! Injection into declarative (`pipeline { ... }`) definitions

use tracing::debug;

use super::checkout::{find_checkout, has_checkout};
use super::errors::JenkinsfileError;
use super::markers::NotifyConfig;
use super::sections::{
    pipeline_section, post_section, stage_sections, steps_section, PipelineSection, StepsSection,
};

/// Adds notification markers to a declarative pipeline.
///
/// The started marker lands at the end of the step list of the first stage
/// that performs a checkout; success/unstable/failure markers land in a
/// `post` section before the pipeline's closing brace; the helper source,
/// with `webhook_url` substituted, is prepended to the file. Text outside
/// those splice points is preserved byte for byte.
///
/// When no stage performs a checkout the step list is left untouched and
/// only the post section and helpers are added. When the step list already
/// carries the started marker it is not inserted again.
///
/// # Errors
///
/// [`JenkinsfileError::StructuralNotFound`] when the file has no pipeline
/// section, [`JenkinsfileError::UnbalancedBlock`] when a block never
/// closes.
pub fn inject(
    text: &str,
    webhook_url: &str,
    notify: &NotifyConfig,
) -> Result<String, JenkinsfileError> {
    let pipeline = pipeline_section(text)?;

    let mut content = text.to_string();
    if let Some(steps) = checkout_steps(text, &pipeline) {
        if notify.is_configured(&steps.text) {
            debug!("step list already carries the started marker");
        } else {
            content = insert_started(&content, &steps, notify);
        }
    }

    // offsets into the original text are stale once the step list changed
    let pipeline = pipeline_section(&content)?;
    content = insert_post(&content, &pipeline, notify);

    Ok(format!("{}{content}", notify.helpers_for(webhook_url)))
}

/// The step list of the first stage, in source order, that performs a
/// checkout. Stages without a checkout are skipped even when they come
/// first.
fn checkout_steps(text: &str, pipeline: &PipelineSection) -> Option<StepsSection> {
    let stages = pipeline.child("stages")?;
    let stage = stage_sections(text, stages)
        .into_iter()
        .find(|stage| has_checkout(&stage.text))?;
    debug!(stage = %stage.name, "instrumenting the first stage with a checkout");
    steps_section(text, &stage)
}

/// Splices the started marker as a new line immediately before the step
/// list's closing brace, indented like the checkout line when the steps
/// contain one, else one level deeper than the closing brace.
fn insert_started(content: &str, steps: &StepsSection, notify: &NotifyConfig) -> String {
    let close = steps.block.close_brace;
    let line_start = content[..close].rfind('\n').map_or(0, |p| p + 1);
    let brace_indent = &content[line_start..close];
    let indent = find_checkout(steps.block.body(content))
        .map_or_else(|| format!("{brace_indent}    "), |call| call.indent);

    let mut out = String::with_capacity(content.len() + indent.len() + notify.started.len() + 2);
    if on_own_line(content, steps.block.open_brace, close) {
        out.push_str(&content[..line_start]);
        out.push_str(&indent);
        out.push_str(&notify.started);
        out.push('\n');
        out.push_str(&content[line_start..]);
    } else {
        out.push_str(&content[..close]);
        out.push('\n');
        out.push_str(&indent);
        out.push_str(&notify.started);
        out.push('\n');
        out.push_str(&content[close..]);
    }
    out
}

/// Splices the success/unstable/failure markers before the pipeline's
/// closing brace: into an existing `post` section when the pipeline has
/// one, as a new `post` section otherwise.
fn insert_post(content: &str, pipeline: &PipelineSection, notify: &NotifyConfig) -> String {
    match post_section(content, pipeline) {
        Some(post) => {
            debug!(
                conditions = post.conditions.len(),
                "extending the existing post section"
            );
            let close = post.block.close_brace;
            let line_start = content[..close].rfind('\n').map_or(0, |p| p + 1);
            let brace_indent = &content[line_start..close];
            let conditions = post_conditions(notify, &format!("{brace_indent}    "));
            insert_before_brace(content, post.block.open_brace, close, &conditions)
        }
        None => {
            let block = format!("    post {{\n{}    }}\n", post_conditions(notify, "        "));
            insert_before_brace(content, pipeline.block.open_brace, pipeline.block.close_brace, &block)
        }
    }
}

/// Inserts `insertion` (which must end with a newline) as whole lines
/// immediately before the closing brace at `close`.
fn insert_before_brace(content: &str, open: usize, close: usize, insertion: &str) -> String {
    let line_start = content[..close].rfind('\n').map_or(0, |p| p + 1);
    let mut out = String::with_capacity(content.len() + insertion.len() + 1);
    if on_own_line(content, open, close) {
        out.push_str(&content[..line_start]);
        out.push_str(insertion);
        out.push_str(&content[line_start..]);
    } else {
        out.push_str(&content[..close]);
        out.push('\n');
        out.push_str(insertion);
        out.push_str(&content[close..]);
    }
    out
}

/// Whether the closing brace at `close` starts its own line (only
/// whitespace before it), rather than trailing other content.
fn on_own_line(content: &str, open: usize, close: usize) -> bool {
    let line_start = content[..close].rfind('\n').map_or(0, |p| p + 1);
    line_start > open
        && content[line_start..close]
            .chars()
            .all(|c| c == ' ' || c == '\t')
}

fn post_conditions(notify: &NotifyConfig, indent: &str) -> String {
    format!(
        "{indent}success {{\n{indent}    {success}\n{indent}}}\n\
         {indent}unstable {{\n{indent}    {unstable}\n{indent}}}\n\
         {indent}failure {{\n{indent}    {failure}\n{indent}}}\n",
        success = notify.success,
        unstable = notify.unstable,
        failure = notify.failure,
    )
}
