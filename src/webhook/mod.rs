//! CI webhook editors
//!
//! Each supported CI system has an editor implementing [`Webhook`]: it
//! takes the current configuration content and returns it with the
//! build-notification webhook added. Editors are pure content
//! transformations; reading the file, writing it back and raising pull
//! requests belong to the caller.

pub mod circle;
pub mod jenkins;
pub mod travis;

pub use circle::CircleWebhook;
pub use jenkins::JenkinsWebhook;
pub use travis::TravisWebhook;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::jenkinsfile::JenkinsfileError;

/// The CI systems hookline can configure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildSystem {
    /// Jenkins, via a `Jenkinsfile`.
    Jenkins,
    /// Travis CI, via `.travis.yml`.
    Travis,
    /// CircleCI, via `circle.yml` or `.circleci/config.yml`.
    Circle,
}

impl std::fmt::Display for BuildSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildSystem::Jenkins => write!(f, "jenkins"),
            BuildSystem::Travis => write!(f, "travis"),
            BuildSystem::Circle => write!(f, "circle"),
        }
    }
}

/// Errors from webhook editors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WebhookError {
    /// The Jenkinsfile engine rejected the input
    #[error(transparent)]
    Jenkinsfile(#[from] JenkinsfileError),

    /// A YAML configuration could not be parsed
    #[error("failed to parse {path}: {message}")]
    InvalidYaml {
        /// Conventional path of the offending configuration.
        path: &'static str,
        /// Parser diagnostic.
        message: String,
    },

    /// The updated configuration could not be re-serialized
    #[error("failed to serialize the updated configuration: {message}")]
    SerializeYaml {
        /// Serializer diagnostic.
        message: String,
    },

    /// The webhook URL is not a valid absolute URL
    #[error("invalid webhook URL '{url}': {message}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// Parser diagnostic.
        message: String,
    },
}

/// An editor that adds the notification webhook to one CI system's
/// configuration.
pub trait Webhook {
    /// The CI system this editor understands.
    fn build_system(&self) -> BuildSystem;

    /// Conventional configuration paths, in probe order.
    fn config_paths(&self) -> &'static [&'static str];

    /// Returns `content` with the webhook at `url` added.
    ///
    /// Editors are idempotent: running one over content it already edited
    /// returns that content unchanged, so callers can compare input and
    /// output to decide whether a write-back is needed.
    ///
    /// # Errors
    ///
    /// [`WebhookError`] when the content cannot be understood.
    fn add_webhook(&self, content: &str, url: &str) -> Result<String, WebhookError>;
}

/// Selects the editor for a build system.
#[must_use]
pub fn editor_for(system: BuildSystem) -> Box<dyn Webhook> {
    match system {
        BuildSystem::Jenkins => Box::new(JenkinsWebhook::default()),
        BuildSystem::Travis => Box::new(TravisWebhook),
        BuildSystem::Circle => Box::new(CircleWebhook),
    }
}

/// Builds the standard webhook URL `base/<system>/teams/<team>`, trimming
/// any trailing slashes from the base.
///
/// # Errors
///
/// [`WebhookError::InvalidUrl`] when the result is not an absolute URL.
pub fn construct_webhook_url(
    base_url: &str,
    system: BuildSystem,
    team_id: &str,
) -> Result<String, WebhookError> {
    let trimmed = base_url.trim_end_matches('/');
    let full = format!("{trimmed}/{system}/teams/{team_id}");
    url::Url::parse(&full).map_err(|e| WebhookError::InvalidUrl {
        url: full.clone(),
        message: e.to_string(),
    })?;
    Ok(full)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construct_webhook_url() {
        let url =
            construct_webhook_url("https://hooks.example.com/ci/", BuildSystem::Jenkins, "T123")
                .unwrap();
        assert_eq!(url, "https://hooks.example.com/ci/jenkins/teams/T123");
    }

    #[test]
    fn test_trailing_slashes_are_trimmed() {
        let url =
            construct_webhook_url("https://hooks.example.com///", BuildSystem::Travis, "T1")
                .unwrap();
        assert_eq!(url, "https://hooks.example.com/travis/teams/T1");
    }

    #[test]
    fn test_invalid_base_is_rejected() {
        assert!(matches!(
            construct_webhook_url("not a url", BuildSystem::Circle, "T1"),
            Err(WebhookError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_editor_selection() {
        for system in [BuildSystem::Jenkins, BuildSystem::Travis, BuildSystem::Circle] {
            assert_eq!(editor_for(system).build_system(), system);
        }
    }

    #[test]
    fn test_build_system_display() {
        assert_eq!(BuildSystem::Jenkins.to_string(), "jenkins");
        assert_eq!(BuildSystem::Circle.to_string(), "circle");
    }
}
