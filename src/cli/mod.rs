//! CLI tools for hookline
//!
//! - `inject`: add the build-notification webhook to a CI configuration
//! - `detect`: report which Jenkins pipeline dialect a file uses
//! - `completions`: generate shell completions

pub mod completions;
pub mod detect;
pub mod inject;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use hookline::webhook::BuildSystem;

/// CLI arguments for hookline
#[derive(Parser, Debug)]
#[command(name = "hookline")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add the build-notification webhook to a CI configuration file
    Inject {
        /// CI system the configuration belongs to
        #[arg(short, long, value_enum)]
        ci: CiArg,
        /// Configuration file (defaults to the system's conventional path)
        file: Option<PathBuf>,
        /// Full webhook URL to notify
        #[arg(short, long)]
        url: Option<String>,
        /// Base URL to construct the webhook URL from
        #[arg(long, requires = "team", conflicts_with = "url")]
        base_url: Option<String>,
        /// Team identifier appended to the constructed URL
        #[arg(long, requires = "base_url", conflicts_with = "url")]
        team: Option<String>,
        /// Write the result here instead of editing in place
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print the result without writing any file
        #[arg(long)]
        dry_run: bool,
    },

    /// Report which Jenkins pipeline dialect a file uses
    Detect {
        /// Pipeline file to inspect
        file: PathBuf,
        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<DetectFormat>,
    },

    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: ShellArg,
        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum CiArg {
    Jenkins,
    Travis,
    Circle,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum DetectFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ShellArg {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

/// Build the CLI command for completion generation
pub fn build_cli() -> clap::Command {
    Args::command()
}

/// Parse and execute CLI arguments
pub fn run() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Command::Inject {
            ci,
            file,
            url,
            base_url,
            team,
            output,
            dry_run,
        } => {
            let config = inject::InjectConfig {
                system: match ci {
                    CiArg::Jenkins => BuildSystem::Jenkins,
                    CiArg::Travis => BuildSystem::Travis,
                    CiArg::Circle => BuildSystem::Circle,
                },
                file,
                url,
                base_url,
                team,
                output,
                dry_run,
            };
            inject::inject_webhook(&config)?;
        }
        Command::Detect { file, format } => {
            let output_format = match format {
                Some(DetectFormat::Json) => detect::OutputFormat::Json,
                Some(DetectFormat::Text) | None => detect::OutputFormat::Text,
            };
            let report = detect::detect_file(&file, output_format)?;
            println!("{}", report);
        }
        Command::Completions { shell, output } => {
            use clap_complete::Shell;

            let shell_enum = match shell {
                ShellArg::Bash => Shell::Bash,
                ShellArg::Zsh => Shell::Zsh,
                ShellArg::Fish => Shell::Fish,
                ShellArg::PowerShell => Shell::PowerShell,
            };

            let completions = completions::generate_completions(shell_enum)?;

            if let Some(output_path) = output {
                completions::save_completions(&completions, &output_path)?;
            } else {
                println!("{}", completions);
            }
        }
    }

    Ok(())
}
