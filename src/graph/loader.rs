//! JSON loader for the schema graph export.

use crate::error::Result;
use crate::graph::SchemaGraph;
use log::info;
use std::fs;
use std::path::Path;

/// Reads and validates a schema graph from a JSON export file.
pub fn load_graph(path: &Path) -> Result<SchemaGraph> {
    let data = fs::read_to_string(path)?;
    let graph: SchemaGraph = serde_json::from_str(&data)?;
    graph.validate()?;

    info!(
        "loaded schema graph: {} entities, {} tables",
        graph.entities.len(),
        graph.tables.len()
    );
    Ok(graph)
}
