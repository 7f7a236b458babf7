//! Resolve command - download one artifact.

use crate::commands::Cli;
use crate::output::{self, Icon, Theme};
use anyhow::{Context, Result};
use clap::Args;
use coda_downloader::SchemeFetcher;
use coda_resolver::{Artifact, ArtifactResolver};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;

/// Arguments for the resolve command
#[derive(Args, Debug, Clone)]
pub struct ResolveArgs {
    /// Reference, e.g. `org.example/lib/[1.0,2.0)` or `https://repo!org.example/lib/1.0`
    #[arg(value_name = "COORDINATE")]
    pub coordinate: String,

    /// Output file (default: the artifact file name in the current directory)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Run the resolve command.
pub fn run(cli: &Cli, args: &ResolveArgs) -> Result<()> {
    let config = cli.config()?;
    let fetcher = SchemeFetcher::from_config(&config).context("failed to set up downloads")?;
    let resolver = ArtifactResolver::new(&config, Arc::new(fetcher));

    let mut artifact = resolver.resolve(&args.coordinate)?;
    tracing::debug!(stats = %resolver.stats().summary(), "resolve finished");

    let target = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(artifact.file_name()));
    let bytes = write_artifact(&mut artifact, &target)?;

    let theme = Theme::from_env();
    output::success(&format!(
        "{} {} {} {} ({})",
        theme.coordinate(&artifact.coordinate.to_string()),
        theme.icon(Icon::Arrow),
        target.display(),
        theme.dim(&format!("from {}", artifact.repository_id)),
        output::format_bytes(bytes),
    ));
    if artifact.file_version != artifact.version {
        output::info(&format!(
            "snapshot build {}",
            theme.version(&artifact.file_version)
        ));
    }
    Ok(())
}

/// Stream the artifact into `target`, replacing it only once the copy is
/// complete.
fn write_artifact(artifact: &mut Artifact, target: &Path) -> Result<u64> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create a temporary file in {}", dir.display()))?;
    let bytes = io::copy(&mut artifact.stream, &mut temp)
        .with_context(|| format!("failed to download {}", artifact.path))?;
    temp.persist(target)
        .with_context(|| format!("failed to write {}", target.display()))?;
    tracing::debug!(path = %target.display(), bytes, "artifact written");
    Ok(bytes)
}
