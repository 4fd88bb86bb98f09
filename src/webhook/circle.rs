//! CircleCI webhook editor
//!
//! Circle has an end-of-build `notify.webhooks` section but no hook for
//! the start of a build, so a curl step posting a "started" payload is
//! injected where each config version allows: Circle 2 runs it as the
//! first step of the `build` job, Circle 1 right after the checkout.
//! Multi-document files are split on `---` and each document updated on
//! its own.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_yaml::{Mapping, Value};

use super::{BuildSystem, Webhook, WebhookError};

const CIRCLE_1_PATH: &str = "circle.yml";
const CIRCLE_2_PATH: &str = ".circleci/config.yml";

static DOC_SEPARATOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^---[ \t]*\n").unwrap());

/// Edits `circle.yml` / `.circleci/config.yml`, adding the webhook to
/// `notify.webhooks` and a started-notification step to the build.
#[derive(Debug, Clone, Copy, Default)]
pub struct CircleWebhook;

impl Webhook for CircleWebhook {
    fn build_system(&self) -> BuildSystem {
        BuildSystem::Circle
    }

    fn config_paths(&self) -> &'static [&'static str] {
        &[CIRCLE_1_PATH, CIRCLE_2_PATH]
    }

    fn add_webhook(&self, content: &str, url: &str) -> Result<String, WebhookError> {
        match serde_yaml::from_str::<Value>(content) {
            Ok(doc) => update_document(doc, url),
            Err(_) => {
                // multi-document file: each document is updated on its own
                let mut docs = Vec::new();
                for part in DOC_SEPARATOR_RE.split(content) {
                    if part.trim().is_empty() {
                        continue;
                    }
                    let doc = serde_yaml::from_str::<Value>(part).map_err(|e| {
                        WebhookError::InvalidYaml {
                            path: CIRCLE_1_PATH,
                            message: e.to_string(),
                        }
                    })?;
                    docs.push(update_document(doc, url)?);
                }
                if docs.is_empty() {
                    return Err(WebhookError::InvalidYaml {
                        path: CIRCLE_1_PATH,
                        message: "no YAML documents found".to_string(),
                    });
                }
                Ok(format!("---\n{}", docs.join("---\n")))
            }
        }
    }
}

fn update_document(mut doc: Value, url: &str) -> Result<String, WebhookError> {
    {
        let Value::Mapping(root) = &mut doc else {
            return Err(WebhookError::InvalidYaml {
                path: CIRCLE_1_PATH,
                message: "expected a mapping document".to_string(),
            });
        };

        if root.get("version").and_then(Value::as_u64) == Some(2) {
            add_started_step_v2(root, url);
        } else {
            add_started_step_v1(root, url);
        }
        add_notify_webhook(root, url);
    }

    serde_yaml::to_string(&doc).map_err(|e| WebhookError::SerializeYaml {
        message: e.to_string(),
    })
}

/// Circle 2 has no checkout hook; the started call becomes the first step
/// of the `build` job. A workflow may name its jobs differently, in which
/// case there is no safe place to put the step and none is added.
fn add_started_step_v2(root: &mut Mapping, url: &str) {
    let Some(Value::Mapping(jobs)) = root.get_mut("jobs") else {
        return;
    };
    let Some(Value::Mapping(build)) = jobs.get_mut("build") else {
        return;
    };
    let mut steps = match build.remove("steps") {
        Some(Value::Sequence(s)) => s,
        _ => Vec::new(),
    };
    if !steps.iter().any(|step| step_mentions(step, url)) {
        let mut run = Mapping::new();
        run.insert("run".into(), Value::String(started_step(url)));
        steps.insert(0, Value::Mapping(run));
    }
    build.insert("steps".into(), Value::Sequence(steps));
}

/// Circle 1 runs post-checkout commands from `checkout.post`.
fn add_started_step_v1(root: &mut Mapping, url: &str) {
    let mut checkout = match root.remove("checkout") {
        Some(Value::Mapping(m)) => m,
        _ => Mapping::new(),
    };
    let mut post = match checkout.remove("post") {
        Some(Value::Sequence(s)) => s,
        Some(other) => vec![other],
        None => Vec::new(),
    };
    if !post
        .iter()
        .any(|step| step.as_str().is_some_and(|s| s.contains(url)))
    {
        post.insert(0, Value::String(started_step(url)));
    }
    checkout.insert("post".into(), Value::Sequence(post));
    root.insert("checkout".into(), Value::Mapping(checkout));
}

fn add_notify_webhook(root: &mut Mapping, url: &str) {
    let mut notify = match root.remove("notify") {
        Some(Value::Mapping(m)) => m,
        _ => Mapping::new(),
    };
    let mut webhooks = match notify.remove("webhooks") {
        Some(Value::Sequence(s)) => s,
        _ => Vec::new(),
    };
    if !webhooks
        .iter()
        .any(|wh| wh.get("url").and_then(Value::as_str) == Some(url))
    {
        let mut entry = Mapping::new();
        entry.insert("url".into(), Value::String(url.to_string()));
        webhooks.push(Value::Mapping(entry));
    }
    notify.insert("webhooks".into(), Value::Sequence(webhooks));
    root.insert("notify".into(), Value::Mapping(notify));
}

fn step_mentions(step: &Value, url: &str) -> bool {
    match step {
        Value::String(s) => s.contains(url),
        Value::Mapping(_) => step
            .get("run")
            .and_then(Value::as_str)
            .is_some_and(|s| s.contains(url)),
        _ => false,
    }
}

fn started_step(url: &str) -> String {
    format!(
        "curl -H 'Content-Type: application/json' -d '{{\"payload\": {{\"lifecycle\": \"started\", \
         \"build_num\": \"'${{CIRCLE_BUILD_NUM}}'\", \"vcs_revision\": \"'${{CIRCLE_SHA1}}'\", \
         \"branch\": \"'${{CIRCLE_BRANCH}}'\", \"reponame\": \"'${{CIRCLE_PROJECT_REPONAME}}'\", \
         \"username\": \"'${{CIRCLE_PROJECT_USERNAME}}'\"}}}}' \"{url}\""
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const URL: &str = "https://hooks.example.com/ci/circle/teams/T123";

    fn parse(yaml: &str) -> Value {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_circle_1_started_step_after_checkout() {
        let content = "machine:\n  timezone: UTC\n";
        let out = CircleWebhook.add_webhook(content, URL).unwrap();
        let doc = parse(&out);

        let post = doc["checkout"]["post"].as_sequence().unwrap();
        assert_eq!(post.len(), 1);
        assert!(post[0].as_str().unwrap().contains(URL));
        assert!(post[0].as_str().unwrap().contains("lifecycle"));
    }

    #[test]
    fn test_circle_1_existing_post_steps_run_after_ours() {
        let content = "checkout:\n  post:\n    - git submodule update --init\n";
        let out = CircleWebhook.add_webhook(content, URL).unwrap();
        let doc = parse(&out);

        let post = doc["checkout"]["post"].as_sequence().unwrap();
        assert_eq!(post.len(), 2);
        assert!(post[0].as_str().unwrap().contains(URL));
        assert_eq!(post[1].as_str(), Some("git submodule update --init"));
    }

    #[test]
    fn test_circle_2_started_step_leads_the_build_job() {
        let content = "version: 2\njobs:\n  build:\n    docker:\n      - image: rust:latest\n    steps:\n      - checkout\n      - run: cargo test\n";
        let out = CircleWebhook.add_webhook(content, URL).unwrap();
        let doc = parse(&out);

        let steps = doc["jobs"]["build"]["steps"].as_sequence().unwrap();
        assert_eq!(steps.len(), 3);
        assert!(steps[0]["run"].as_str().unwrap().contains(URL));
        assert_eq!(steps[1].as_str(), Some("checkout"));
    }

    #[test]
    fn test_circle_2_without_a_build_job_only_gets_notify() {
        let content = "version: 2\njobs:\n  compile:\n    steps:\n      - checkout\n";
        let out = CircleWebhook.add_webhook(content, URL).unwrap();
        let doc = parse(&out);

        assert!(doc["jobs"]["compile"]["steps"].as_sequence().is_some());
        let webhooks = doc["notify"]["webhooks"].as_sequence().unwrap();
        assert_eq!(webhooks[0]["url"].as_str(), Some(URL));
    }

    #[test]
    fn test_notify_webhook_is_added_once() {
        let content = "machine:\n  timezone: UTC\n";
        let once = CircleWebhook.add_webhook(content, URL).unwrap();
        let twice = CircleWebhook.add_webhook(&once, URL).unwrap();
        assert_eq!(twice, once);

        let doc = parse(&twice);
        assert_eq!(doc["notify"]["webhooks"].as_sequence().unwrap().len(), 1);
        assert_eq!(doc["checkout"]["post"].as_sequence().unwrap().len(), 1);
    }

    #[test]
    fn test_multi_document_files_update_each_document() {
        let content = "---\nmachine:\n  timezone: UTC\n---\nversion: 2\njobs:\n  build:\n    steps:\n      - checkout\n";
        let out = CircleWebhook.add_webhook(content, URL).unwrap();

        assert!(out.starts_with("---\n"));
        let docs: Vec<&str> = out.split("---\n").filter(|d| !d.trim().is_empty()).collect();
        assert_eq!(docs.len(), 2);

        let first = parse(docs[0]);
        assert!(first["checkout"]["post"][0].as_str().unwrap().contains(URL));
        let second = parse(docs[1]);
        assert!(second["jobs"]["build"]["steps"][0]["run"]
            .as_str()
            .unwrap()
            .contains(URL));
    }

    #[test]
    fn test_non_mapping_document_is_an_error() {
        let err = CircleWebhook.add_webhook("- just\n- a\n- list\n", URL).unwrap_err();
        assert!(matches!(err, WebhookError::InvalidYaml { .. }));
    }
}
