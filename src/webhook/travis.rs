//! Travis CI webhook editor
//!
//! Travis has a first-class `notifications.webhooks` section, so the edit
//! is a structured merge: normalize whatever shape the section currently
//! has, append the URL if absent, and fire the webhook on every build
//! outcome. The merged document is re-serialized whole; `serde_yaml`'s
//! mapping keeps key order, comments are not preserved.

use serde_yaml::{Mapping, Value};

use super::{BuildSystem, Webhook, WebhookError};

const CONFIG_PATH: &str = ".travis.yml";

const TRIGGERS: [&str; 5] = [
    "on_cancel",
    "on_error",
    "on_start",
    "on_failure",
    "on_success",
];

/// Edits `.travis.yml`, adding the webhook to `notifications.webhooks`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TravisWebhook;

impl Webhook for TravisWebhook {
    fn build_system(&self) -> BuildSystem {
        BuildSystem::Travis
    }

    fn config_paths(&self) -> &'static [&'static str] {
        &[CONFIG_PATH]
    }

    fn add_webhook(&self, content: &str, url: &str) -> Result<String, WebhookError> {
        let mut doc: Value =
            serde_yaml::from_str(content).map_err(|e| WebhookError::InvalidYaml {
                path: CONFIG_PATH,
                message: e.to_string(),
            })?;
        let Value::Mapping(root) = &mut doc else {
            return Err(WebhookError::InvalidYaml {
                path: CONFIG_PATH,
                message: "expected a mapping at the top level".to_string(),
            });
        };

        let mut notifications = match root.remove("notifications") {
            Some(Value::Mapping(m)) => m,
            _ => Mapping::new(),
        };
        merge_webhooks(&mut notifications, url);
        root.insert("notifications".into(), Value::Mapping(notifications));

        serde_yaml::to_string(&doc).map_err(|e| WebhookError::SerializeYaml {
            message: e.to_string(),
        })
    }
}

/// Normalizes `notifications.webhooks` to `{urls: [...], on_*: always}`
/// and appends `url` when it is not listed yet. Travis accepts a bare
/// string for `webhooks` and for `urls`; both shapes are folded into the
/// list form before merging.
fn merge_webhooks(notifications: &mut Mapping, url: &str) {
    let mut webhooks = match notifications.remove("webhooks") {
        Some(Value::Mapping(m)) => m,
        Some(Value::String(single)) => {
            let mut m = Mapping::new();
            m.insert("urls".into(), Value::Sequence(vec![Value::String(single)]));
            m
        }
        _ => Mapping::new(),
    };

    let mut urls = match webhooks.remove("urls") {
        Some(Value::Sequence(seq)) => seq,
        Some(Value::String(single)) => vec![Value::String(single)],
        _ => Vec::new(),
    };
    if !urls.iter().any(|u| u.as_str() == Some(url)) {
        urls.push(Value::String(url.to_string()));
    }
    webhooks.insert("urls".into(), Value::Sequence(urls));

    for trigger in TRIGGERS {
        webhooks.insert(trigger.into(), Value::String("always".to_string()));
    }
    notifications.insert("webhooks".into(), Value::Mapping(webhooks));
}
