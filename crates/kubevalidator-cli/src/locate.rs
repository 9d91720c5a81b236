//! # `kubevalidator locate`
//!
//! Prints the line range the localizer finds for a path in a YAML file.
//! Accepts dotted paths (`spec.containers[0].image`, optionally prefixed
//! with `(root).`) and JSON pointers (`/spec/containers/0/image`).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use kubevalidator_core::{parse_path, LineRange};
use kubevalidator_locate::{EditPolicy, LineLocalizer, RemoveNode, SentinelReplace};

use crate::EXIT_SUCCESS;

/// Edit used to mark the node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    /// Replace the node with a placeholder value.
    #[default]
    Replace,
    /// Remove the node.
    Remove,
}

impl PolicyArg {
    fn policy(self) -> Box<dyn EditPolicy> {
        match self {
            Self::Replace => Box::new(SentinelReplace),
            Self::Remove => Box::new(RemoveNode),
        }
    }
}

/// Arguments for `kubevalidator locate`.
#[derive(Args, Debug)]
pub struct LocateArgs {
    /// YAML file to search.
    pub file: PathBuf,

    /// Path of the node, dotted or as a JSON pointer.
    pub path: String,

    /// Zero-based document index within the file.
    #[arg(long, default_value_t = 0)]
    pub document: usize,

    /// How the node is marked.
    #[arg(long, value_enum, default_value_t = PolicyArg::Replace)]
    pub policy: PolicyArg,
}

/// Locate `args.path` in `source`.
pub fn locate_in(source: &str, args: &LocateArgs) -> Result<LineRange> {
    let path = parse_path(&args.path).with_context(|| format!("invalid path {:?}", args.path))?;
    let localizer = LineLocalizer::new(args.policy.policy());
    Ok(localizer.locate(source, args.document, &path))
}

/// Execute `kubevalidator locate`.
pub fn run_locate(args: &LocateArgs) -> Result<u8> {
    let source = std::fs::read_to_string(&args.file)
        .with_context(|| format!("cannot read {}", args.file.display()))?;
    let range = locate_in(&source, args)?;
    if range.is_fallback() {
        tracing::info!(path = %args.path, "node not found, reporting first line");
    }
    println!("{}:{range}", args.file.display());
    Ok(EXIT_SUCCESS)
}
