//! Loading dependency graphs from disk.

use std::path::Path;

use anyhow::{bail, Context, Result};
use depwalk_core::{GraphDocument, InMemoryGraph};

/// Supported on-disk graph formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
    Json,
    Toml,
}

impl GraphFormat {
    /// Pick the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(GraphFormat::Json),
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(GraphFormat::Toml),
            Some(ext) => bail!("unsupported graph file extension '.{}' (expected .json or .toml)", ext),
            None => bail!("graph file {} has no extension (expected .json or .toml)", path.display()),
        }
    }
}

pub fn parse_document(text: &str, format: GraphFormat) -> Result<GraphDocument> {
    let document = match format {
        GraphFormat::Json => GraphDocument::from_json(text).context("invalid JSON graph document")?,
        GraphFormat::Toml => toml::from_str(text).context("invalid TOML graph document")?,
    };
    Ok(document)
}

/// Read and build the graph stored at `path`.
pub fn load_graph(path: &Path) -> Result<InMemoryGraph> {
    let format = GraphFormat::from_path(path)?;
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read graph file {}", path.display()))?;
    let document = parse_document(&text, format)
        .with_context(|| format!("failed to parse graph file {}", path.display()))?;
    let graph = InMemoryGraph::from_document(document)
        .with_context(|| format!("inconsistent graph in {}", path.display()))?;
    tracing::debug!(path = %path.display(), jobs = graph.len(), "Loaded dependency graph");
    Ok(graph)
}
