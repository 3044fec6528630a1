//! Command implementations.

mod calibrate;
mod info;
mod transform;
mod validate;

pub use calibrate::run_calibrate;
pub use info::run_info;
pub use transform::run_transform;
pub use validate::run_validate;

use std::path::Path;

use anyhow::{Context, Result};
use contracts::NavConfig;
use transform_graph::TransformGraph;

/// Load a configuration file, failing early when it does not exist
fn load_config(path: &Path) -> Result<NavConfig> {
    if !path.exists() {
        anyhow::bail!("Configuration file not found: {}", path.display());
    }
    config_loader::ConfigLoader::load_from_path(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

/// Transform graph holding the coordinate definitions of `config`
fn build_graph(config: &NavConfig) -> Result<TransformGraph> {
    let mut graph = TransformGraph::new();
    graph
        .load_coordinate_definitions(&config.coordinate_definitions)
        .context("Failed to load coordinate definitions")?;
    Ok(graph)
}
