//! Injection into scripted (`node { ... }`) definitions

use tracing::debug;

use super::checkout::{find_checkout, has_checkout};
use super::markers::NotifyConfig;
use super::sections::{node_blocks, NodeBlock};

/// Outcome of a scripted injection pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedOutcome {
    /// The final text; identical to the input when nothing qualified.
    pub text: String,
    /// Whether any node block was rewritten.
    pub changed: bool,
}

/// Wraps every qualifying top-level node block in a notification guard.
///
/// A node qualifies when it performs a checkout and does not already
/// invoke the notification function. When no node qualifies the input
/// comes back unchanged; this path never fails, since a scripted file
/// with nothing to instrument is a legitimate no-op.
///
/// The file is re-parsed from scratch after each rewrite: an edit shifts
/// every later offset and the matchers work in absolute offsets, so
/// re-scanning is the simplest correct strategy. Pipeline files are small
/// and there is one edit per qualifying node, so the extra scans are
/// cheaper than an offset-remapping scheme would be worth.
#[must_use]
pub fn inject(text: &str, webhook_url: &str, notify: &NotifyConfig) -> ScriptedOutcome {
    if !node_blocks(text).iter().any(|node| qualifies(node, notify)) {
        debug!("no node block qualifies, leaving the file untouched");
        return ScriptedOutcome {
            text: text.to_string(),
            changed: false,
        };
    }

    let mut content = format!("{}{text}", notify.helpers_for(webhook_url));
    loop {
        let Some(node) = node_blocks(&content)
            .into_iter()
            .find(|node| qualifies(node, notify))
        else {
            break;
        };
        debug!(offset = node.start, "wrapping node block in a notification guard");
        let wrapped = wrap_in_guard(&node, notify);
        content.replace_range(node.start..node.end(), &wrapped);
    }
    ScriptedOutcome {
        text: content,
        changed: true,
    }
}

fn qualifies(node: &NodeBlock, notify: &NotifyConfig) -> bool {
    !notify.is_configured(&node.text) && has_checkout(&node.text)
}

/// Rewraps a node block so its whole body runs under a try/catch guard:
/// the success marker precedes the normal exit, the failure marker
/// precedes a rethrow, and the started marker follows the checkout line,
/// indented like the checkout line itself.
fn wrap_in_guard(node: &NodeBlock, notify: &NotifyConfig) -> String {
    let open = node.block.open_brace - node.start;
    let close = node.block.close_brace - node.start;
    let header = &node.text[..=open];
    let indented = node.text[open + 1..close]
        .split('\n')
        .map(|line| {
            if line.is_empty() {
                line.to_string()
            } else {
                format!("    {line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n");
    let body = indented.trim();

    let mut wrapped = format!(
        "{header}\n    try {{\n        {body}\n        {success}\n    }} catch(e) {{\n        {failure}\n        throw e\n    }}\n}}",
        success = notify.success,
        failure = notify.failure,
    );

    if let Some(call) = find_checkout(&wrapped) {
        let marker = format!("\n{}{}", call.indent, notify.started);
        wrapped.insert_str(call.content_end, &marker);
    }
    wrapped
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const URL: &str = "https://hooks.example.com/ci/jenkins/teams/T123";

    fn notify() -> NotifyConfig {
        NotifyConfig::default()
    }

    #[test]
    fn test_exact_output_for_a_single_node() {
        let text = r#"node {
    checkout scm
    sh 'make'
}
"#;
        let expected_body = r#"node {
    try {
        checkout scm
        notifyBuild("STARTED", "STARTED")
        sh 'make'
        notifyBuild("SUCCESS")
    } catch(e) {
        notifyBuild("FAILURE")
        throw e
    }
}
"#;
        let expected = format!("{}{expected_body}", notify().helpers_for(URL));
        let outcome = inject(text, URL, &notify());
        assert!(outcome.changed);
        assert_eq!(outcome.text, expected);
    }

    #[test]
    fn test_nested_try_blocks_survive_the_wrap() {
        let text = r#"node {
    echo "doing something"
    try {
        checkout scm
        echo("doing stuff....")
    } catch(e) {
        echo "boom"
    } finally {
        echo("finished");
    }
}
"#;
        let outcome = inject(text, URL, &notify());
        assert!(outcome.changed);
        // the inner try/catch is intact, one level deeper
        assert!(outcome.text.contains("        try {\n            checkout scm\n            notifyBuild(\"STARTED\", \"STARTED\")\n            echo(\"doing stuff....\")\n        } catch(e) {"));
        // the guard closes with failure + rethrow
        assert!(outcome.text.contains("    } catch(e) {\n        notifyBuild(\"FAILURE\")\n        throw e\n    }\n}"));
        // success precedes the guard's normal exit
        let success = outcome.text.find("notifyBuild(\"SUCCESS\")").unwrap();
        let guard_catch = outcome.text.rfind("} catch(e) {").unwrap();
        assert!(success < guard_catch);
    }

    #[test]
    fn test_only_nodes_with_a_checkout_are_wrapped() {
        let text = r#"node {
    sh 'make docs'
}
node {
    checkout scm
    sh 'make'
}
node {
    sh 'make clean'
}
"#;
        let outcome = inject(text, URL, &notify());
        assert!(outcome.changed);
        let body = outcome
            .text
            .strip_prefix(&notify().helpers_for(URL))
            .unwrap();
        // first and third nodes are byte-identical to the input
        assert!(body.starts_with("node {\n    sh 'make docs'\n}\n"));
        assert!(body.ends_with("node {\n    sh 'make clean'\n}\n"));
        // the middle one carries the guard
        assert_eq!(body.matches("try {").count(), 1);
        assert_eq!(body.matches("notifyBuild(\"STARTED\", \"STARTED\")").count(), 1);
    }

    #[test]
    fn test_multiple_qualifying_nodes_are_all_wrapped() {
        let text = r#"node {
    checkout scm
    sh 'make'
}
node('linux') {
    checkout scm
    sh 'make test'
}
"#;
        let outcome = inject(text, URL, &notify());
        assert!(outcome.changed);
        assert_eq!(outcome.text.matches("notifyBuild(\"SUCCESS\")").count(), 2);
        assert_eq!(outcome.text.matches("node('linux') {").count(), 1);
    }

    #[test]
    fn test_no_qualifying_node_is_a_no_op() {
        let text = "node {\n    sh 'make'\n}\n";
        let outcome = inject(text, URL, &notify());
        assert!(!outcome.changed);
        assert_eq!(outcome.text, text);
    }

    #[test]
    fn test_already_wrapped_node_is_left_alone() {
        let text = r#"node {
    try {
        checkout scm
        notifyBuild("STARTED", "STARTED")
        sh 'make'
        notifyBuild("SUCCESS")
    } catch(e) {
        notifyBuild("FAILURE")
        throw e
    }
}
"#;
        let outcome = inject(text, URL, &notify());
        assert!(!outcome.changed);
        assert_eq!(outcome.text, text);
    }

    #[test]
    fn test_git_clone_counts_as_a_checkout() {
        let text = "node {\n    git clone https://example.com/repo.git\n    sh 'make'\n}\n";
        let outcome = inject(text, URL, &notify());
        assert!(outcome.changed);
        assert!(outcome.text.contains("git clone https://example.com/repo.git\n        notifyBuild(\"STARTED\", \"STARTED\")"));
    }
}
