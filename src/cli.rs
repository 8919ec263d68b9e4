//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Sync recordings from networked DVR tuners into local media libraries.
///
/// Each invocation performs one pass; run it from a scheduler (cron, a
/// systemd timer) to keep libraries current.
#[derive(Parser, Debug)]
#[command(name = "dvrsync")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: $XDG_CONFIG_HOME/dvrsync/config.toml)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Download new recordings, apply the delete policy and fetch artwork
    Sync,

    /// Discover configured tuners and print what they report
    Tuners {
        /// Also fetch each tuner's channel lineup
        #[arg(long)]
        lineup: bool,

        /// Also fetch each tuner's program guide from `guide_url`
        #[arg(long)]
        guide: bool,
    },

    /// Compare each library with its catalog without changing anything
    Scrub,
}

impl Args {
    /// Default tracing level from the verbosity flags.
    ///
    /// `RUST_LOG` still wins when set.
    #[must_use]
    pub fn default_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        }
    }
}
