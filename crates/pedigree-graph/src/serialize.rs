//! Wire form of a [`BaseGraph`]: one record per vertex, in id order.
//!
//! ```json
//! [{"id": 0, "prop": {"gender": "M"}, "outedges": [{"to": 2}]},
//!  {"id": 2, "rel": true, "hub": true, "prop": {}, "outedges": [{"to": 3}]}]
//! ```

use crate::{BaseGraph, EdgeWeight, Error, GraphDefaults, Result, VertexData, VertexId};
use crate::{PersonProperties, RelationshipProperties, VirtualEdgeSegment};
use serde::{Deserialize, Serialize};
use serde_json::Value;

fn is_false(b: &bool) -> bool {
    !*b
}

fn unit_weight() -> EdgeWeight {
    1
}

fn is_unit_weight(w: &EdgeWeight) -> bool {
    *w == 1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedEdge {
    pub to: VertexId,
    #[serde(default = "unit_weight", skip_serializing_if = "is_unit_weight")]
    pub weight: EdgeWeight,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedVertex {
    pub id: VertexId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub rel: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub hub: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub chhub: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub virt: bool,
    #[serde(default)]
    pub prop: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outedges: Vec<SerializedEdge>,
}

impl BaseGraph {
    pub fn serialize(&self, save_width: bool) -> Result<Vec<SerializedVertex>> {
        let mut output = Vec::with_capacity(self.num_vertices());
        for v in 0..self.num_vertices() {
            let data = self.data(v);
            let prop = match data {
                VertexData::Person(p) => serde_json::to_value(p)?,
                VertexData::Relationship(r) => serde_json::to_value(r)?,
                VertexData::ChildHub => Value::Object(Default::default()),
                VertexData::VirtualEdge(s) => serde_json::to_value(s)?,
            };
            output.push(SerializedVertex {
                id: v,
                width: save_width.then(|| self.width(v)),
                rel: matches!(data, VertexData::Relationship(_)),
                hub: matches!(data, VertexData::Relationship(_)),
                chhub: matches!(data, VertexData::ChildHub),
                virt: matches!(data, VertexData::VirtualEdge(_)),
                prop,
                outedges: self
                    .out_edges(v)
                    .iter()
                    .map(|&to| SerializedEdge {
                        to,
                        weight: self.edge_weight(v, to),
                    })
                    .collect(),
            });
        }
        Ok(output)
    }

    /// Rebuilds a graph from its wire form. Ids must be dense and every segment vertex must
    /// come after all real vertices. The result is validated.
    pub fn deserialize(vertices: &[SerializedVertex], defaults: GraphDefaults) -> Result<Self> {
        let mut sorted: Vec<&SerializedVertex> = vertices.iter().collect();
        sorted.sort_by_key(|s| s.id);

        let mut g = BaseGraph::with_defaults(defaults);
        for (expected, s) in sorted.iter().enumerate() {
            if s.id != expected {
                return Err(Error::import(format!(
                    "vertex ids are not dense: expected {expected}, found {}",
                    s.id
                )));
            }
            let prop = if s.prop.is_null() {
                Value::Object(Default::default())
            } else {
                s.prop.clone()
            };
            let data = if s.rel || s.hub {
                VertexData::Relationship(serde_json::from_value::<RelationshipProperties>(prop)?)
            } else if s.chhub {
                VertexData::ChildHub
            } else if s.virt {
                let segment = serde_json::from_value::<VirtualEdgeSegment>(prop)
                    .unwrap_or_else(|_| VirtualEdgeSegment {
                        name: format!("_virtual_{}", s.id),
                    });
                VertexData::VirtualEdge(segment)
            } else {
                VertexData::Person(serde_json::from_value::<PersonProperties>(prop)?)
            };
            g.add_vertex(data, s.width)
                .map_err(|_| Error::import(format!("vertex {} is out of place", s.id)))?;
        }

        for s in &sorted {
            for e in &s.outedges {
                if !g.is_valid_id(e.to) {
                    return Err(Error::import(format!(
                        "edge {} -> {} points to an unknown vertex",
                        s.id, e.to
                    )));
                }
                g.add_edge(s.id, e.to, e.weight)?;
            }
        }

        g.validate()?;
        Ok(g)
    }
}
