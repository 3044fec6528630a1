//! `transform` command implementation.

use anyhow::{Context, Result};
use contracts::{matrix_to_rows, MatrixRows, TransformName};
use serde::Serialize;
use tracing::info;

use crate::cli::TransformArgs;

#[derive(Serialize)]
struct TransformResult {
    name: String,
    valid: bool,
    edges: Vec<String>,
    matrix: MatrixRows,
}

/// Execute the `transform` command
pub fn run_transform(args: &TransformArgs) -> Result<()> {
    let name = TransformName::parse(&args.name)
        .with_context(|| format!("Invalid transform name '{}'", args.name))?;
    info!(transform = %name, config = %args.config.display(), "Resolving transform");

    let config = super::load_config(&args.config)?;
    let graph = super::build_graph(&config)?;

    let lookup = graph.get_transform(name.from().clone(), name.to().clone());
    observability::record_transform_lookup(lookup.is_ok());
    let (matrix, status) = lookup.with_context(|| format!("Cannot resolve {}", name))?;
    let edges = graph
        .find_path(name.from().clone(), name.to().clone())
        .map(|names| names.iter().map(|n| n.to_string()).collect())
        .unwrap_or_default();

    let result = TransformResult {
        name: name.to_string(),
        valid: status.is_valid(),
        edges,
        matrix: matrix_to_rows(&matrix),
    };

    if args.json {
        let json =
            serde_json::to_string_pretty(&result).context("Failed to serialize transform")?;
        println!("{}", json);
    } else {
        print_transform(&result);
    }

    Ok(())
}

fn print_transform(result: &TransformResult) {
    println!(
        "{} ({})",
        result.name,
        if result.valid { "valid" } else { "invalid" }
    );
    println!("  Edges: {}", result.edges.join(" -> "));
    for row in &result.matrix {
        println!(
            "  {:>12.6} {:>12.6} {:>12.6} {:>12.6}",
            row[0], row[1], row[2], row[3]
        );
    }
}
