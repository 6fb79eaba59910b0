//! Building a pedigree from files produced by other tools.
//!
//! Importers only produce a [`BaseGraph`] of persons, relationships and child hubs; laying it
//! out is up to the caller (see [`ImportedPedigree::into_layout`]).

mod ped;
mod simple_json;
mod tracker;

pub use ped::{PedImportOptions, from_ped};
pub use simple_json::from_simple_json;

use crate::dynamic::DynamicPositionedGraph;
use crate::options::LayoutContext;
use pedigree_graph::{BaseGraph, Error, Result, VertexId, alg};

#[derive(Debug, Clone)]
pub struct ImportedPedigree {
    pub graph: BaseGraph,
    pub proband: VertexId,
}

impl ImportedPedigree {
    pub fn into_layout(self, context: LayoutContext) -> Result<DynamicPositionedGraph> {
        let context = LayoutContext {
            proband: Some(self.proband),
            ..context
        };
        DynamicPositionedGraph::new(self.graph, context)
    }
}

/// Final checks shared by all importers.
fn finish(graph: BaseGraph, proband: VertexId) -> Result<ImportedPedigree> {
    if alg::components(&graph).len() > 1 {
        return Err(Error::import(
            "some components of the imported pedigree are disconnected from each other",
        ));
    }
    graph
        .validate()
        .map_err(|err| Error::import(format!("unable to import pedigree: {err}")))?;
    tracing::debug!(
        vertices = graph.num_vertices(),
        proband,
        "pedigree imported"
    );
    Ok(ImportedPedigree { graph, proband })
}
