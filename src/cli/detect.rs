//! `hookline detect` - report the Jenkins pipeline dialect of a file

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

use hookline::jenkinsfile::{detect_syntax, Syntax};

#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Serialize)]
struct Detection<'a> {
    file: &'a str,
    syntax: Option<Syntax>,
}

pub fn detect_file(file: &Path, format: OutputFormat) -> Result<String> {
    let content = fs::read_to_string(file)
        .with_context(|| format!("Failed to read file: {}", file.display()))?;

    let syntax = detect_syntax(&content);
    match format {
        OutputFormat::Json => {
            let name = file.to_string_lossy();
            let detection = Detection {
                file: &name,
                syntax,
            };
            serde_json::to_string_pretty(&detection).context("Failed to serialize detection")
        }
        OutputFormat::Text => Ok(match syntax {
            Some(syntax) => format!("{}: {syntax}", file.display()),
            None => format!("{}: unrecognized", file.display()),
        }),
    }
}
