//! Scopes command - mark conflicts and compute effective scopes of a graph.

use crate::commands::Cli;
use crate::output::{self, Theme, table::Table};
use anyhow::{Context, Result};
use clap::Args;
use coda_core::ScopePrecedence;
use coda_resolver::{ConflictTag, DependencyGraph, TransformationContext, transform_graph};
use std::path::PathBuf;

/// Arguments for the scopes command
#[derive(Args, Debug, Clone)]
pub struct ScopesArgs {
    /// Dependency graph (JSON)
    #[arg(value_name = "GRAPH")]
    pub graph: PathBuf,

    /// Print the transformed graph as JSON
    #[arg(long)]
    pub json: bool,
}

fn transform(
    graph: &mut DependencyGraph,
    precedence: ScopePrecedence,
) -> Result<TransformationContext> {
    let ctx = transform_graph(graph, precedence)?;
    tracing::debug!(
        nodes = graph.len(),
        groups = ctx.group_count(),
        passes = ctx.passes(),
        "graph transformed"
    );
    Ok(ctx)
}

/// Run the scopes command.
pub fn run(cli: &Cli, args: &ScopesArgs) -> Result<()> {
    let config = cli.config()?;
    let mut graph = DependencyGraph::load(&args.graph)
        .with_context(|| format!("failed to load {}", args.graph.display()))?;
    let ctx = transform(&mut graph, config.scope_precedence)?;

    if args.json {
        println!("{}", graph.to_json()?);
        return Ok(());
    }

    let theme = Theme::from_env();
    output::header(&format!(
        "{} nodes, {} conflict groups",
        graph.len(),
        ctx.group_count()
    ));
    let mut table = Table::new();
    table.headers(["Id", "Coordinate", "Declared", "Effective", "Conflict"]);
    for node in graph.nodes() {
        let conflict = match node.conflict {
            ConflictTag::Winner => table.success_cell("winner"),
            ConflictTag::Loser { winner } => {
                table.warning_cell(&format!("loser to {}", graph.node(winner).id))
            }
            ConflictTag::Unmarked => table.dim_cell("unreachable"),
        };
        let effective = if node.scope == node.declared_scope {
            node.scope.to_string()
        } else {
            theme.version(node.scope.as_str())
        };
        table.styled_row(vec![
            node.id.as_str().into(),
            theme.coordinate(&node.coordinate.to_string()).into(),
            node.declared_scope.as_str().into(),
            effective.into(),
            conflict,
        ]);
    }
    table.print();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRAPH: &str = r#"{
        "root": "app",
        "nodes": [
            {"id": "app", "coordinate": "org.example/app/1.0"},
            {"id": "web", "coordinate": "org.example/web/1.0"},
            {"id": "json-old", "coordinate": "org.json/json/1.0"},
            {"id": "json-new", "coordinate": "org.json/json/2.0", "scope": "test"},
            {"id": "log", "coordinate": "org.log/log/1.0", "scope": "runtime"}
        ],
        "edges": [
            ["app", "web"],
            ["app", "json-new"],
            ["web", "json-old"],
            ["web", "log"]
        ]
    }"#;

    #[test]
    fn transforms_loaded_graph() {
        let mut graph = DependencyGraph::from_json(GRAPH).unwrap();
        let ctx = transform(&mut graph, ScopePrecedence::default()).unwrap();
        assert_eq!(ctx.group_count(), 4);

        let json_new = graph.node(graph.find("json-new").unwrap());
        assert!(json_new.conflict.is_winner());
        assert_eq!(json_new.scope.as_str(), "test");

        let json_old = graph.node(graph.find("json-old").unwrap());
        assert!(matches!(json_old.conflict, ConflictTag::Loser { .. }));
        assert_eq!(json_old.scope.as_str(), "test");

        assert_eq!(graph.node(graph.find("log").unwrap()).scope.as_str(), "runtime");
    }

    #[test]
    fn json_output_carries_tags() {
        let mut graph = DependencyGraph::from_json(GRAPH).unwrap();
        transform(&mut graph, ScopePrecedence::default()).unwrap();
        let json = graph.to_json().unwrap();
        assert!(json.contains("\"winner\": \"json-new\"") || json.contains("\"winner\":\"json-new\""));
        assert!(json.contains("effectiveScope"));
    }

    #[test]
    fn unknown_scope_fails() {
        let mut graph = DependencyGraph::from_json(
            r#"{"root": "app", "nodes": [
                {"id": "app", "coordinate": "g/app/1.0"},
                {"id": "x", "coordinate": "g/x/1.0", "scope": "bogus"}
            ], "edges": [["app", "x"]]}"#,
        )
        .unwrap();
        assert!(transform(&mut graph, ScopePrecedence::default()).is_err());
    }
}
