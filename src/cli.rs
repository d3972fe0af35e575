//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand, ValueEnum};
use interlink_core::{RewriterKind, TemporalMode};
use std::path::PathBuf;

/// Interlink: keyword-driven internal links for markdown content
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root directory (default: current directory)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Content directory path (relative to project root)
    #[arg(short, long)]
    pub content: Option<PathBuf>,

    /// Config file name (default: interlink.toml)
    #[arg(short = 'C', long, default_value = "interlink.toml")]
    pub config: PathBuf,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = Format::Human, global = true)]
    pub format: Format,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Per-run link policy overrides shared by the linking commands
#[derive(clap::Args, Debug, Clone, Default)]
pub struct LinkArgs {
    /// Maximum injected links per document
    #[arg(short, long = "max-links")]
    pub max_links: Option<usize>,

    /// Temporal ordering rule for this run
    #[arg(short, long, value_enum)]
    pub temporal: Option<Temporal>,

    /// How links are spliced into documents
    #[arg(long, value_enum)]
    pub rewriter: Option<Rewriter>,

    /// Allow links to draft documents
    #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub allow_drafts: Option<bool>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Remove previously injected links and inject fresh ones
    Refresh {
        #[command(flatten)]
        link_args: LinkArgs,
    },

    /// Validate internal links without modifying anything
    Check {
        #[command(flatten)]
        link_args: LinkArgs,
    },

    /// Show which links a refresh would inject, and why others are skipped
    DryRun {
        #[command(flatten)]
        link_args: LinkArgs,
    },

    /// Remove every injected internal link
    Strip,
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    /// Colored console lines
    #[default]
    Human,
    /// A single JSON document on stdout
    Json,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Temporal {
    Off,
    NoForward,
    Future,
}

impl From<Temporal> for TemporalMode {
    fn from(value: Temporal) -> Self {
        match value {
            Temporal::Off => Self::Off,
            Temporal::NoForward => Self::NoForward,
            Temporal::Future => Self::Future,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rewriter {
    Ast,
    Text,
}

impl From<Rewriter> for RewriterKind {
    fn from(value: Rewriter) -> Self {
        match value {
            Rewriter::Ast => Self::Ast,
            Rewriter::Text => Self::Text,
        }
    }
}

impl Cli {
    /// Policy overrides of the current command, if it takes any.
    pub const fn link_args(&self) -> Option<&LinkArgs> {
        match &self.command {
            Commands::Refresh { link_args }
            | Commands::Check { link_args }
            | Commands::DryRun { link_args } => Some(link_args),
            Commands::Strip => None,
        }
    }

    /// Whether the command injects links and therefore needs keywords.
    pub const fn injects(&self) -> bool {
        matches!(self.command, Commands::Refresh { .. } | Commands::DryRun { .. })
    }
}
