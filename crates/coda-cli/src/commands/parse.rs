//! Parse command - show how a reference is understood.

use crate::output::{self, Theme};
use anyhow::{Context, Result};
use clap::Args;
use coda_core::{ArtifactReference, VersionSpec};
use serde::Serialize;

/// Arguments for the parse command
#[derive(Args, Debug, Clone)]
pub struct ParseArgs {
    /// Reference, e.g. `org.example/lib/1.0` or `https://repo!org.example/lib`
    #[arg(value_name = "COORDINATE")]
    pub coordinate: String,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ParsedReference {
    repository: Option<String>,
    group_id: String,
    artifact_id: String,
    version: String,
    version_kind: &'static str,
    classifier: Option<String>,
    #[serde(rename = "type")]
    artifact_type: String,
    metadata_path: String,
}

impl From<&ArtifactReference> for ParsedReference {
    fn from(reference: &ArtifactReference) -> Self {
        let coordinate = &reference.coordinate;
        let version_kind = match coordinate.version() {
            VersionSpec::Exact(_) => "release",
            VersionSpec::Latest => "latest",
            VersionSpec::Snapshot(_) => "snapshot",
            VersionSpec::Range(_) => "range",
        };
        Self {
            repository: reference.repository.clone(),
            group_id: coordinate.group_id().to_string(),
            artifact_id: coordinate.artifact_id().to_string(),
            version: coordinate.version().to_string(),
            version_kind,
            classifier: coordinate.classifier().map(str::to_string),
            artifact_type: coordinate.artifact_type().to_string(),
            metadata_path: coordinate.metadata_path(),
        }
    }
}

/// Run the parse command.
pub fn run(args: &ParseArgs) -> Result<()> {
    let reference = ArtifactReference::parse(&args.coordinate)
        .with_context(|| format!("invalid coordinate '{}'", args.coordinate))?;
    let parsed = ParsedReference::from(&reference);

    if args.json {
        println!("{}", sonic_rs::to_string_pretty(&parsed)?);
        return Ok(());
    }

    let theme = Theme::from_env();
    output::header(&reference.coordinate.to_string());
    let mut table = output::table::Table::new();
    table.headers(["Field", "Value"]);
    table.row([
        "repository",
        parsed.repository.as_deref().unwrap_or("(configured)"),
    ]);
    table.row(["groupId", parsed.group_id.as_str()]);
    table.row(["artifactId", parsed.artifact_id.as_str()]);
    table.row(["version".to_string(), theme.version(&parsed.version)]);
    table.row(["kind", parsed.version_kind]);
    table.row(["classifier", parsed.classifier.as_deref().unwrap_or("-")]);
    table.row(["type", parsed.artifact_type.as_str()]);
    table.row(["metadata", parsed.metadata_path.as_str()]);
    table.print();
    Ok(())
}
