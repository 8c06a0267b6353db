use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[cfg(test)]
mod tests;

#[derive(Debug, Parser)]
#[command(name = "spacefold")]
#[command(about = "Inspect spaces over a directory tree", version)]
pub struct Cli {
    /// Directory whose entries are indexed.
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Cache file; the index stays in memory when omitted.
    #[arg(long)]
    pub cache: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Parse an address and print its parts.
    Uri(UriArg),
    /// Index the root and print a summary.
    Scan(ScanArgs),
    /// Index the root and print the ordered members of one space.
    Members(MembersArgs),
    Cache(CacheArgs),
}

impl Commands {
    /// Name reported in structured error payloads.
    #[must_use]
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Uri(_) => "uri",
            Self::Scan(_) => "scan",
            Self::Members(_) => "members",
            Self::Cache(CacheArgs {
                command: CacheCommand::List { .. },
            }) => "cache.list",
            Self::Cache(CacheArgs {
                command: CacheCommand::Clean { .. },
            }) => "cache.clean",
        }
    }
}

#[derive(Debug, Args)]
pub struct UriArg {
    pub uri: String,
}

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// JSON array of space definitions to add before indexing.
    #[arg(long)]
    pub spaces: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct MembersArgs {
    pub space: String,

    #[arg(long)]
    pub spaces: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommand,
}

#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// Print the rows of one cache kind.
    List { kind: String },
    /// Sweep rows written under an older epoch.
    Clean { kind: String },
}
