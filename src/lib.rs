//! # credsweep - hard-coded credential scanner
//!
//! Walks a source tree and flags strings that look like hard-coded
//! credentials (passwords, tokens, API keys, private keys, connection
//! strings) across many file formats. Built for security reviewers and CI
//! pipelines auditing a codebase for leaked secrets.
//!
//! Findings are heuristic triage material: nothing is verified against a
//! live service, and false positives/negatives are expected.
//!
//! ## Quick start
//!
//! ```bash
//! # scan a tree with the built-in rules
//! credsweep scan path/to/project
//!
//! # replay the scan over the last 20 commits
//! credsweep history path/to/repo --limit 20
//! ```

pub mod cli;
pub mod config;
pub mod scanner;

pub use cli::Cli;
pub use config::Config;
pub use scanner::{Finding, FindingKind, ScanReport, Scanner, Statistics};

/// Result type alias for credsweep operations
pub type Result<T> = anyhow::Result<T>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
