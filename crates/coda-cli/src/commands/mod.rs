//! CLI commands for coda.

pub mod parse;
pub mod repositories;
pub mod resolve;
pub mod scopes;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use coda_config::{CliOverrides, ConfigLoader, EnvConfig, ResolverConfig};
use std::path::PathBuf;

/// Coda - resolve Maven-layout artifacts
#[derive(Parser, Debug)]
#[command(name = "coda")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    pub no_ansi: bool,

    /// Settings file (JSON)
    #[arg(long, global = true, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Drop every repository that is not on the local filesystem
    #[arg(long, global = true)]
    pub offline: bool,

    /// Repositories, comma separated (`url[@option]*`); a leading `+` appends
    #[arg(long, global = true, value_name = "VALUE")]
    pub repositories: Option<String>,

    /// Repositories searched before all others; a leading `+` appends
    #[arg(long, global = true, value_name = "VALUE")]
    pub default_repositories: Option<String>,

    /// Local repository directory
    #[arg(long, global = true, value_name = "DIR")]
    pub local_repository: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Overrides given on the command line.
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            settings: self.settings.clone(),
            offline: self.offline.then_some(true),
            repositories: self.repositories.clone(),
            default_repositories: self.default_repositories.clone(),
            local_repository: self.local_repository.clone(),
        }
    }

    /// Merge defaults, settings file, environment and command line.
    pub fn config(&self) -> Result<ResolverConfig> {
        let env = EnvConfig::from_process().context("invalid environment")?;
        ConfigLoader::new()
            .with_env(env)
            .with_cli(self.overrides())
            .resolve()
            .context("failed to load configuration")
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse a coordinate reference and show its parts
    Parse(parse::ParseArgs),

    /// Show the effective repository list
    #[command(alias = "repos")]
    Repositories(repositories::RepositoriesArgs),

    /// Resolve and download an artifact
    Resolve(resolve::ResolveArgs),

    /// Mark conflicts and compute effective scopes of a dependency graph
    Scopes(scopes::ScopesArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_become_overrides() {
        let cli = Cli::try_parse_from([
            "coda",
            "resolve",
            "g/a/1.0",
            "--offline",
            "--repositories",
            "+https://r.example.com@id=r",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let overrides = cli.overrides();
        assert_eq!(overrides.offline, Some(true));
        assert_eq!(overrides.repositories.as_deref(), Some("+https://r.example.com@id=r"));
        assert_eq!(overrides.default_repositories, None);
    }

    #[test]
    fn offline_unset_leaves_lower_sources_alone() {
        let cli = Cli::try_parse_from(["coda", "parse", "g/a"]).unwrap();
        assert_eq!(cli.overrides().offline, None);
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["coda", "-q", "-v", "parse", "g/a"]).is_err());
    }
}
