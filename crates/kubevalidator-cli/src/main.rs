//! # kubevalidator CLI entry point
//!
//! Parses arguments, initializes logging on stderr and dispatches to the
//! subcommand handlers. stdout carries only the report.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use kubevalidator_cli::check::{run_check, CheckArgs};
use kubevalidator_cli::locate::{run_locate, LocateArgs};
use kubevalidator_cli::EXIT_ERROR;

/// Validates Kubernetes manifests changed in a repository against versioned
/// JSON schemas and reports each violation at its line.
#[derive(Parser, Debug)]
#[command(name = "kubevalidator", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate changed manifests and print the report.
    Check(CheckArgs),

    /// Print the line range of a path within a YAML file.
    Locate(LocateArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match &cli.command {
        Commands::Check(args) => run_check(args),
        Commands::Locate(args) => run_locate(args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kubevalidator_cli::locate::PolicyArg;
    use kubevalidator_cli::output::OutputFormat;
    use std::path::PathBuf;

    #[test]
    fn cli_parse_check_explicit_files() {
        let cli = Cli::try_parse_from(["kubevalidator", "check", "k8s/a.yaml", "k8s/b.yaml"]).unwrap();
        if let Commands::Check(args) = cli.command {
            assert_eq!(args.files, vec!["k8s/a.yaml", "k8s/b.yaml"]);
            assert_eq!(args.repo, PathBuf::from("."));
            assert_eq!(args.config, ".github/kubevalidator.yaml");
            assert_eq!(args.head, "HEAD");
            assert_eq!(args.format, OutputFormat::Text);
            assert!(!args.all);
        } else {
            panic!("expected check");
        }
    }

    #[test]
    fn cli_parse_check_git_range() {
        let cli = Cli::try_parse_from([
            "kubevalidator",
            "-vv",
            "check",
            "--base",
            "origin/main",
            "--format",
            "github",
            "--jobs",
            "8",
            "--repository",
            "acme/deploys",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        if let Commands::Check(args) = cli.command {
            assert_eq!(args.base.as_deref(), Some("origin/main"));
            assert_eq!(args.format, OutputFormat::Github);
            assert_eq!(args.jobs, 8);
            assert_eq!(args.repository.as_deref(), Some("acme/deploys"));
        } else {
            panic!("expected check");
        }
    }

    #[test]
    fn cli_rejects_files_with_all() {
        assert!(Cli::try_parse_from(["kubevalidator", "check", "--all", "a.yaml"]).is_err());
        assert!(Cli::try_parse_from(["kubevalidator", "check", "--all", "--base", "main"]).is_err());
    }

    #[test]
    fn cli_parse_locate() {
        let cli = Cli::try_parse_from([
            "kubevalidator",
            "locate",
            "pod.yaml",
            "spec.containers[0].image",
            "--document",
            "1",
            "--policy",
            "remove",
        ])
        .unwrap();
        if let Commands::Locate(args) = cli.command {
            assert_eq!(args.file, PathBuf::from("pod.yaml"));
            assert_eq!(args.path, "spec.containers[0].image");
            assert_eq!(args.document, 1);
            assert_eq!(args.policy, PolicyArg::Remove);
        } else {
            panic!("expected locate");
        }
    }
}
