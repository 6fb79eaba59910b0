//! Persisted forms of a laid out pedigree: the layout document and the undo/redo state.

use crate::options::LayoutContext;
use crate::ordering::Ordering;
use crate::positioned::{PositionedGraph, SuggestedLayout};
use pedigree_graph::{BaseGraph, Error, GraphDefaults, Rank, Result, SerializedVertex, VertexId};
use serde::{Deserialize, Serialize};

/// The saved layout: graph (segments included), ranks, order and positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutDocument {
    #[serde(rename = "GG")]
    pub graph: Vec<SerializedVertex>,
    pub ranks: Vec<Rank>,
    pub order: Vec<Vec<VertexId>>,
    pub positions: Vec<f64>,
    #[serde(rename = "probandNodeID", default)]
    pub proband: Option<VertexId>,
    #[serde(rename = "JSON_version")]
    pub json_version: String,
}

impl LayoutDocument {
    pub fn capture(dg: &PositionedGraph, json_version: &str) -> Result<Self> {
        Ok(Self {
            graph: dg.gg.serialize(false)?,
            ranks: dg.ranks.clone(),
            order: dg.order.serialize(),
            positions: dg.positions.clone(),
            proband: dg.proband,
            json_version: json_version.to_string(),
        })
    }

    /// Rebuilds the layout. Stored ranks, order and positions are reused when they still fit
    /// the stored graph.
    pub fn restore(self, context: &LayoutContext) -> Result<PositionedGraph> {
        if self.json_version != context.json_version {
            return Err(Error::UnsupportedVersion {
                found: self.json_version,
                expected: context.json_version.clone(),
            });
        }
        let gg = BaseGraph::deserialize(&self.graph, GraphDefaults::default())?;
        let suggested = SuggestedLayout {
            ranks: Some(self.ranks),
            order: Some(Ordering::deserialize(self.order)?),
            positions: Some(self.positions),
        };
        PositionedGraph::new(gg, self.proband, context.options.clone(), Some(suggested))
    }
}

/// Everything needed to return to an earlier state of an editing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoRedoState {
    pub base_graph: Vec<SerializedVertex>,
    #[serde(default)]
    pub proband_node_id: Option<VertexId>,
    pub ranks: Vec<Rank>,
    pub order: Vec<Vec<VertexId>>,
    pub positions: Vec<f64>,
}

impl UndoRedoState {
    pub fn capture(dg: &PositionedGraph) -> Result<Self> {
        Ok(Self {
            base_graph: dg.gg.serialize(true)?,
            proband_node_id: dg.proband,
            ranks: dg.ranks.clone(),
            order: dg.order.serialize(),
            positions: dg.positions.clone(),
        })
    }

    pub fn restore(self, context: &LayoutContext) -> Result<PositionedGraph> {
        let gg = BaseGraph::deserialize(&self.base_graph, GraphDefaults::default())?;
        let suggested = SuggestedLayout {
            ranks: Some(self.ranks),
            order: Some(Ordering::deserialize(self.order)?),
            positions: Some(self.positions),
        };
        PositionedGraph::new(gg, self.proband_node_id, context.options.clone(), Some(suggested))
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}
