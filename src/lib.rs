//! # Hookline - build-notification webhooks for CI configurations
//!
//! Hookline rewrites CI pipeline definitions in place so builds report
//! their lifecycle (started / success / unstable / failure) to a webhook
//! endpoint, without disturbing unrelated formatting or semantics.
//!
//! The heart of the crate is the [`jenkinsfile`] module: a structural
//! editor for Jenkins pipeline definitions. A Jenkinsfile is Groovy, so
//! the edit points have to be found by scanning code structure with a
//! lexer that tracks string and comment state; both supported dialects
//! (declarative `pipeline { ... }` and scripted `node { ... }`) are
//! handled, and re-running on an edited file is a no-op.
//!
//! The YAML-based CI systems (Travis, CircleCI) are covered by the
//! [`webhook`] module through a structured merge of their notification
//! sections.
//!
//! ## Quick start
//!
//! ```
//! use hookline::jenkinsfile::add_notifications;
//!
//! let jenkinsfile = "node {\n    checkout scm\n    sh 'make'\n}\n";
//! let url = "https://hooks.example.com/ci/jenkins/teams/T123";
//!
//! let edited = add_notifications(jenkinsfile, url).unwrap();
//! assert!(edited.contains("notifyBuild(\"STARTED\", \"STARTED\")"));
//!
//! // a second run returns the text unchanged
//! assert_eq!(add_notifications(&edited, url).unwrap(), edited);
//! ```
//!
//! ## License
//!
//! Licensed under either of
//! - Apache License, Version 2.0
//! - MIT license
//!
//! at your option.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod infrastructure;
pub mod jenkinsfile;
pub mod webhook;

// Prelude module for common imports
pub mod prelude;

// Re-export commonly used types
pub use infrastructure::Config;
pub use jenkinsfile::{
    add_notifications, add_notifications_with, detect_syntax, find_checkout, has_checkout,
    inject_declarative, inject_scripted, is_already_configured, CheckoutCall, JenkinsfileError,
    NotifyConfig, ScriptedOutcome, Syntax,
};
pub use webhook::{
    construct_webhook_url, editor_for, BuildSystem, CircleWebhook, JenkinsWebhook, TravisWebhook,
    Webhook, WebhookError,
};

/// Version of the hookline crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
