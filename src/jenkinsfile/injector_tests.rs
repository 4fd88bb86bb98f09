//! End-to-end scenarios for notification injection
//!
//! These exercise the whole path a caller takes: detect the dialect,
//! dispatch to the injector, and rely on the idempotency guard to keep
//! repeated runs from piling up markers.

use pretty_assertions::assert_eq;

use super::{add_notifications, detect_syntax, is_already_configured, JenkinsfileError, Syntax};

const URL: &str = "https://hooks.example.com/ci/jenkins/teams/T123";

const DECLARATIVE: &str = r#"pipeline {
    agent any
    stages {
        stage('Build') {
            steps {
                checkout scm
                sh 'make'
            }
        }
    }
}
"#;

const SCRIPTED: &str = r#"node {
    checkout scm
    sh 'make'
}
"#;

#[test]
fn test_declarative_end_to_end() {
    let out = add_notifications(DECLARATIVE, URL).unwrap();
    assert!(out.starts_with("import groovy.json.JsonOutput"));
    assert!(out.contains(&format!("endpoint=\"{URL}\"")));
    assert!(out.contains("notifyBuild(\"STARTED\", \"STARTED\")"));
    assert!(out.contains("post {"));
    assert!(out.contains("notifyBuild(\"UNSTABLE\")"));
}

#[test]
fn test_scripted_end_to_end() {
    let out = add_notifications(SCRIPTED, URL).unwrap();
    assert!(out.starts_with("import groovy.json.JsonOutput"));
    assert!(out.contains("try {"));
    assert!(out.contains("checkout scm\n        notifyBuild(\"STARTED\", \"STARTED\")"));
    assert!(out.contains("notifyBuild(\"FAILURE\")\n        throw e"));
}

#[test]
fn test_already_configured_file_is_returned_unchanged() {
    let configured = add_notifications(SCRIPTED, URL).unwrap();
    assert!(is_already_configured(&configured));
    assert_eq!(add_notifications(&configured, URL).unwrap(), configured);
}

#[test]
fn test_injection_is_idempotent_for_both_dialects() {
    for input in [DECLARATIVE, SCRIPTED] {
        let once = add_notifications(input, URL).unwrap();
        let twice = add_notifications(&once, URL).unwrap();
        assert_eq!(twice, once);
    }
}

#[test]
fn test_unrecognized_syntax_is_an_error() {
    assert_eq!(
        add_notifications("BAM", URL).unwrap_err(),
        JenkinsfileError::SyntaxUnrecognized
    );
}

#[test]
fn test_a_corrupt_but_marked_file_is_never_reparsed() {
    // unbalanced braces, but the marker short-circuits before parsing
    let text = "node {\n    notifyBuild(\"SUCCESS\")\n";
    assert_eq!(add_notifications(text, URL).unwrap(), text);
}

#[test]
fn test_scripted_non_interference() {
    let text = r#"node {
    sh 'make docs'
}
node {
    checkout scm
}
node {
    sh 'make clean'
}
"#;
    let out = add_notifications(text, URL).unwrap();
    assert_eq!(detect_syntax(text), Some(Syntax::Scripted));
    // the untouched siblings survive byte for byte
    assert!(out.contains("node {\n    sh 'make docs'\n}\n"));
    assert!(out.contains("node {\n    sh 'make clean'\n}\n"));
    // exactly one guard was added, around the middle node
    assert_eq!(out.matches("try {").count(), 1);
}

#[test]
fn test_scripted_file_without_checkout_is_untouched() {
    let text = "node {\n    sh 'make'\n}\n";
    assert_eq!(add_notifications(text, URL).unwrap(), text);
}

#[test]
fn test_braces_in_strings_do_not_confuse_the_injectors() {
    let text = r#"node {
    checkout scm
    sh 'echo }'
    echo "{ not a block"
}
"#;
    let out = add_notifications(text, URL).unwrap();
    assert!(out.contains("sh 'echo }'"));
    assert!(out.contains("echo \"{ not a block\""));
    assert!(out.contains("notifyBuild(\"SUCCESS\")"));
}

#[test]
fn test_commented_markers_do_not_trip_the_guard() {
    // the guard looks for the literal token, wherever it appears; a
    // commented-out call therefore counts as configured and protects the
    // file from double edits rather than risking them
    let text = "node {\n    checkout scm\n    // notifyBuild(\"SUCCESS\")\n}\n";
    assert_eq!(add_notifications(text, URL).unwrap(), text);
}
