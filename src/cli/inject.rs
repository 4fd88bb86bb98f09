//! `hookline inject` - add the notification webhook to a CI configuration
//!
//! The caller contract around the editors: read the conventional file,
//! hand its content to the editor for the chosen CI system, and write the
//! result back only when it differs from what was read.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use hookline::infrastructure::Config;
use hookline::webhook::{construct_webhook_url, editor_for, BuildSystem, Webhook};

#[derive(Debug, Clone)]
pub struct InjectConfig {
    pub system: BuildSystem,
    pub file: Option<PathBuf>,
    pub url: Option<String>,
    pub base_url: Option<String>,
    pub team: Option<String>,
    pub output: Option<PathBuf>,
    pub dry_run: bool,
}

pub fn inject_webhook(config: &InjectConfig) -> Result<()> {
    let editor = editor_for(config.system);
    let path = resolve_path(config, editor.as_ref())?;
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;

    let url = resolve_url(config)?;
    tracing::debug!(system = %config.system, url = %url, "adding webhook");

    let updated = editor
        .add_webhook(&content, &url)
        .with_context(|| format!("Failed to add the webhook to '{}'", path.display()))?;

    if updated == content {
        println!("{} is already configured", path.display());
        return Ok(());
    }

    if config.dry_run {
        println!("{updated}");
        return Ok(());
    }

    let target = config.output.clone().unwrap_or(path);
    fs::write(&target, updated)
        .with_context(|| format!("Failed to write file: {}", target.display()))?;
    println!("Updated {}", target.display());
    Ok(())
}

fn resolve_path(config: &InjectConfig, editor: &dyn Webhook) -> Result<PathBuf> {
    if let Some(file) = &config.file {
        return Ok(file.clone());
    }
    editor
        .config_paths()
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
        .with_context(|| {
            format!(
                "No {} configuration found (looked for {})",
                editor.build_system(),
                editor.config_paths().join(", ")
            )
        })
}

fn resolve_url(config: &InjectConfig) -> Result<String> {
    if let Some(url) = &config.url {
        return Ok(url.clone());
    }
    if let (Some(base), Some(team)) = (&config.base_url, &config.team) {
        return Ok(construct_webhook_url(base, config.system, team)?);
    }
    let fallback = Config::from_env();
    if fallback.team_id.is_empty() {
        anyhow::bail!("Provide --url, or --base-url together with --team");
    }
    Ok(construct_webhook_url(
        &fallback.webhook_base_url,
        config.system,
        &fallback.team_id,
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(system: BuildSystem, file: PathBuf, url: &str) -> InjectConfig {
        InjectConfig {
            system,
            file: Some(file),
            url: Some(url.to_string()),
            base_url: None,
            team: None,
            output: None,
            dry_run: false,
        }
    }

    #[test]
    fn test_jenkins_round_trip_edits_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Jenkinsfile");
        fs::write(&path, "node {\n    checkout scm\n}\n").unwrap();

        let cfg = config(
            BuildSystem::Jenkins,
            path.clone(),
            "https://hooks.example.com/ci/jenkins/teams/T1",
        );
        inject_webhook(&cfg).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("notifyBuild(\"STARTED\", \"STARTED\")"));

        // a second run is a no-op
        inject_webhook(&cfg).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), written);
    }

    #[test]
    fn test_output_redirects_the_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".travis.yml");
        let out_path = dir.path().join("travis.out.yml");
        fs::write(&path, "language: rust\n").unwrap();

        let mut cfg = config(
            BuildSystem::Travis,
            path.clone(),
            "https://hooks.example.com/ci/travis/teams/T1",
        );
        cfg.output = Some(out_path.clone());
        inject_webhook(&cfg).unwrap();

        // the source is untouched, the output carries the webhook
        assert_eq!(fs::read_to_string(&path).unwrap(), "language: rust\n");
        assert!(fs::read_to_string(&out_path).unwrap().contains("webhooks"));
    }

    #[test]
    fn test_unrecognized_jenkinsfile_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Jenkinsfile");
        fs::write(&path, "BAM\n").unwrap();

        let cfg = config(
            BuildSystem::Jenkins,
            path.clone(),
            "https://hooks.example.com/ci/jenkins/teams/T1",
        );
        let err = inject_webhook(&cfg).unwrap_err();
        assert!(err.to_string().contains("Jenkinsfile"));
    }

    #[test]
    fn test_url_is_required_without_env_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Jenkinsfile");
        fs::write(&path, "node {\n    checkout scm\n}\n").unwrap();

        let mut cfg = config(BuildSystem::Jenkins, path, "");
        cfg.url = None;
        assert!(inject_webhook(&cfg).is_err());
    }
}
