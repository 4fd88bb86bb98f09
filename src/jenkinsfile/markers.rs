//! Notification marker and helper templates
//!
//! Everything hookline writes into a pipeline file comes from a
//! [`NotifyConfig`]: the Groovy helper functions prepended once per file,
//! and the marker calls spliced into the instrumented regions. The config
//! is passed explicitly into the injectors so callers can substitute their
//! own function name and payload without touching global state.

/// Groovy helper source for the default [`NotifyConfig`]. The literal
/// `WEBHOOK_URL` is replaced with the destination URL on injection.
const HELPER_SOURCE: &str = r#"import groovy.json.JsonOutput
/*
 * Collect SCM information from the local working copy.
 */
def scmInformation() {
    def remoteUrl = sh(returnStdout: true, script: 'git config --get remote.origin.url').trim()
    def commitSha = sh(returnStdout: true, script: 'git rev-parse HEAD').trim()
    def branchName = sh(returnStdout: true, script: 'git name-rev --always --name-only HEAD').trim().replace('remotes/origin/', '')
    return [
        url: remoteUrl,
        branch: branchName,
        commit: commitSha
    ]
}
/*
 * Post the status of this build to the notification endpoint.
 */
def notifyBuild(buildStatus, buildPhase="FINALIZED",
                endpoint="WEBHOOK_URL") {
    def payload = JsonOutput.toJson([
        name: env.JOB_NAME,
        duration: currentBuild.duration,
        build: [
            number: env.BUILD_NUMBER,
            phase: buildPhase,
            status: buildStatus,
            full_url: env.BUILD_URL,
            scm: scmInformation()
        ]
    ])
    sh "curl --silent -XPOST -H 'Content-Type: application/json' -d '${payload}' ${endpoint}"
}
"#;

/// Marker and helper templates injected into a pipeline definition.
///
/// The marker fields must invoke `function`; the idempotency guard looks
/// for the literal `function(` token, so a mismatched pair would defeat
/// the duplicate-insertion check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyConfig {
    /// Name of the Groovy notification function the markers invoke.
    pub function: String,
    /// Helper source prepended to the file; the literal `WEBHOOK_URL`
    /// placeholder is replaced with the destination URL.
    pub helper_source: String,
    /// Marker inserted when a build starts.
    pub started: String,
    /// Marker for a successful build.
    pub success: String,
    /// Marker for an unstable build.
    pub unstable: String,
    /// Marker for a failed build.
    pub failure: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            function: "notifyBuild".to_string(),
            helper_source: HELPER_SOURCE.to_string(),
            started: r#"notifyBuild("STARTED", "STARTED")"#.to_string(),
            success: r#"notifyBuild("SUCCESS")"#.to_string(),
            unstable: r#"notifyBuild("UNSTABLE")"#.to_string(),
            failure: r#"notifyBuild("FAILURE")"#.to_string(),
        }
    }
}

impl NotifyConfig {
    /// Whether `text` already invokes the notification function. This is
    /// the idempotency guard: a region that contains the invocation token
    /// is never instrumented again.
    #[must_use]
    pub fn is_configured(&self, text: &str) -> bool {
        text.contains(&format!("{}(", self.function))
    }

    /// The helper source with the webhook URL substituted.
    #[must_use]
    pub fn helpers_for(&self, webhook_url: &str) -> String {
        self.helper_source.replace("WEBHOOK_URL", webhook_url)
    }
}
