//! Repositories command - print the effective search order.

use crate::commands::Cli;
use crate::output::{self, Theme, table::Table};
use anyhow::Result;
use clap::Args;
use coda_config::RepositorySpec;
use coda_repository::EffectiveRepositories;
use serde::Serialize;

/// Arguments for the repositories command
#[derive(Args, Debug, Clone)]
pub struct RepositoriesArgs {
    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryRow {
    set: &'static str,
    id: String,
    url: String,
    releases: bool,
    snapshots: bool,
    proxy: Option<String>,
    mirror_of: Option<String>,
    mirrored: Vec<String>,
}

impl RepositoryRow {
    fn new(set: &'static str, spec: &RepositorySpec) -> Self {
        Self {
            set,
            id: spec.id.clone(),
            url: spec.url.to_string(),
            releases: spec.releases_enabled,
            snapshots: spec.snapshots_enabled,
            proxy: spec.proxy.as_ref().map(|p| p.endpoint()),
            mirror_of: spec.mirror_of.clone(),
            mirrored: spec.mirrored_repositories.clone(),
        }
    }
}

fn rows(repositories: &EffectiveRepositories) -> Vec<RepositoryRow> {
    repositories
        .default_repositories
        .iter()
        .map(|spec| RepositoryRow::new("default", spec))
        .chain(
            repositories
                .repositories
                .iter()
                .map(|spec| RepositoryRow::new("configured", spec)),
        )
        .collect()
}

/// Run the repositories command.
pub fn run(cli: &Cli, args: &RepositoriesArgs) -> Result<()> {
    let config = cli.config()?;
    let repositories = EffectiveRepositories::from_config(&config);
    let rows = rows(&repositories);

    if args.json {
        println!("{}", sonic_rs::to_string_pretty(&rows)?);
        return Ok(());
    }

    let theme = Theme::from_env();
    output::header("Effective repositories");
    output::info(&format!(
        "default repositories from {}, repositories from {}",
        config.default_repositories_source, config.repositories_source
    ));
    if config.offline {
        output::warning("offline: only file repositories are searched");
    }
    if rows.is_empty() {
        output::warning("no repositories configured");
        return Ok(());
    }

    let mut table = Table::new();
    table.headers(["#", "Set", "Id", "URL", "Policy", "Proxy", "Mirror of"]);
    for (position, row) in rows.iter().enumerate() {
        let policy = match (row.releases, row.snapshots) {
            (true, true) => table.success_cell("releases+snapshots"),
            (true, false) => table.success_cell("releases"),
            (false, true) => table.warning_cell("snapshots"),
            (false, false) => table.warning_cell("disabled"),
        };
        let mirror = if row.mirrored.is_empty() {
            row.mirror_of.clone().unwrap_or_default()
        } else {
            format!(
                "{} ({})",
                row.mirror_of.as_deref().unwrap_or_default(),
                row.mirrored.join(", ")
            )
        };
        let set = table.dim_cell(row.set);
        table.styled_row(vec![
            (position + 1).to_string().into(),
            set,
            row.id.as_str().into(),
            theme.url(&row.url).into(),
            policy,
            row.proxy.as_deref().unwrap_or("-").into(),
            mirror.into(),
        ]);
    }
    table.print();
    Ok(())
}
