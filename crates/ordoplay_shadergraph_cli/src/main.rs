// SPDX-License-Identifier: MIT OR Apache-2.0
//! `shadergraph` - assemble a shader graph document.
//!
//! Usage: `shadergraph <graph.ron> [settings.ron]`
//!
//! Loads the graph against the built-in types and the standard node
//! library, then prints one rendered fragment per node in dependency order.

use ordoplay_shadergraph::{
    assemble_graph, register_standard_nodes, AssemblyError, AssemblySettings, DocumentError,
    GraphDocument, GraphHandler, Registry, RegistryError, SettingsError,
};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Errors reported by the command line driver
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("usage: shadergraph <graph.ron> [settings.ron]")]
    Usage,

    #[error("failed to build registry: {0}")]
    Registry(#[from] RegistryError),

    #[error("failed to load settings: {0}")]
    Settings(#[from] SettingsError),

    #[error("failed to load graph: {0}")]
    Document(#[from] DocumentError),

    #[error("failed to assemble graph: {0}")]
    Assembly(#[from] AssemblyError),
}

fn run(args: &[String]) -> Result<(), CliError> {
    let (graph_path, settings_path) = match args {
        [graph] => (PathBuf::from(graph), None),
        [graph, settings] => (PathBuf::from(graph), Some(PathBuf::from(settings))),
        _ => return Err(CliError::Usage),
    };

    let settings = match settings_path {
        Some(path) => AssemblySettings::load(&path)?,
        None => AssemblySettings::default(),
    };

    let mut registry = Registry::with_builtin_types()?;
    register_standard_nodes(&mut registry)?;

    let document = GraphDocument::load(&graph_path)?;
    let graph = GraphHandler::from_document(&document, &registry)?;
    tracing::info!(
        "Loaded {} from {} ({} nodes)",
        graph.name,
        graph_path.display(),
        graph.node_count()
    );

    for fragment in assemble_graph(&graph, &registry, &settings)? {
        println!("{}", fragment.render(&settings));
    }
    Ok(())
}

fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ordoplay_shadergraph=info,shadergraph=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(e) = run(&args) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}
