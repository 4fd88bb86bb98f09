//! Jenkinsfile webhook editor

use crate::jenkinsfile::{add_notifications_with, NotifyConfig};

use super::{BuildSystem, Webhook, WebhookError};

/// Edits `Jenkinsfile` definitions through the structural injection
/// engine, dispatching on the detected dialect.
#[derive(Debug, Clone, Default)]
pub struct JenkinsWebhook {
    notify: NotifyConfig,
}

impl JenkinsWebhook {
    /// An editor using caller-supplied notification templates.
    #[must_use]
    pub fn with_templates(notify: NotifyConfig) -> Self {
        Self { notify }
    }
}

impl Webhook for JenkinsWebhook {
    fn build_system(&self) -> BuildSystem {
        BuildSystem::Jenkins
    }

    fn config_paths(&self) -> &'static [&'static str] {
        &["Jenkinsfile"]
    }

    fn add_webhook(&self, content: &str, url: &str) -> Result<String, WebhookError> {
        Ok(add_notifications_with(content, url, &self.notify)?)
    }
}
