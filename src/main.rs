//! hookline - add build-notification webhooks to CI configurations
//!
//! A command-line front end for the hookline editors.
//!
//! ## Commands
//!
//! - `hookline inject` - Add the notification webhook to a CI config file
//! - `hookline detect` - Report which Jenkins pipeline dialect a file uses
//! - `hookline completions` - Generate shell completions
//!
//! ## Quick Start
//!
//! ```bash
//! # Add the webhook to the Jenkinsfile in the current directory
//! hookline inject --ci jenkins --url https://hooks.example.com/ci/jenkins/teams/T123
//!
//! # Construct the URL from its parts
//! hookline inject --ci travis --base-url https://hooks.example.com/ci --team T123
//!
//! # Which dialect is this Jenkinsfile?
//! hookline detect Jenkinsfile
//!
//! # Generate shell completions
//! hookline completions bash > /etc/bash_completion.d/hookline
//! ```

use std::process::ExitCode;

mod cli;

fn main() -> ExitCode {
    // Initialize tracing for debugging
    if std::env::var("HOOKLINE_DEBUG").is_ok() {
        hookline::infrastructure::init_logging("debug");
    }

    // Run the CLI
    match cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            if std::env::var("HOOKLINE_VERBOSE").is_ok() {
                eprintln!("{:?}", e);
            }
            ExitCode::FAILURE
        }
    }
}
