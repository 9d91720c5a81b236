//! # kubevalidator-cli: The `kubevalidator` Command
//!
//! ## Subcommands
//!
//! - `kubevalidator check`: validate changed manifests and print a report.
//! - `kubevalidator locate`: print the line range of a path in a YAML file.
//!
//! ## Exit Codes
//!
//! | Code | Meaning                                                   |
//! |------|-----------------------------------------------------------|
//! | 0    | Success, or nothing to validate (neutral)                 |
//! | 1    | The report concluded with failure                         |
//! | 2    | The check could not run (repository, git or I/O failure)  |

pub mod check;
pub mod locate;
pub mod output;

/// Report concluded with success or neutral.
pub const EXIT_SUCCESS: u8 = 0;

/// Report concluded with failure.
pub const EXIT_FAILURE: u8 = 1;

/// The command could not produce a report.
pub const EXIT_ERROR: u8 = 2;
