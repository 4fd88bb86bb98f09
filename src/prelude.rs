//! Prelude module for common imports

// Re-export the Jenkinsfile engine entry points
pub use crate::jenkinsfile::{
    add_notifications, add_notifications_with, detect_syntax, find_checkout, has_checkout,
    inject_declarative, inject_scripted, is_already_configured, CheckoutCall, JenkinsfileError,
    NotifyConfig, ScriptedOutcome, Syntax,
};

// Re-export the webhook editors
pub use crate::webhook::{
    construct_webhook_url, editor_for, BuildSystem, CircleWebhook, JenkinsWebhook, TravisWebhook,
    Webhook, WebhookError,
};

// Re-export infrastructure types
pub use crate::infrastructure::{init_logging, Config};
