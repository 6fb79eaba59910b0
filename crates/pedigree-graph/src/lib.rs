//! Typed pedigree graph store.
//!
//! A pedigree is a directed graph with four vertex kinds: persons, relationships (a couple),
//! child hubs (the attachment point for the children of one relationship) and virtual edge
//! segments (pieces of an edge that spans more than one generation). Edges always point from
//! the older generation to the younger: person -> relationship -> childhub -> person.

mod error;
mod graph;
mod serialize;
mod vertex;

pub use error::{Error, Result};
pub use graph::{BaseGraph, GraphDefaults, LeafAndParentless, MotherFather, alg};
pub use serialize::{SerializedEdge, SerializedVertex};
pub use vertex::{
    AdoptedStatus, ChildlessStatus, Consanguinity, Gender, LifeStatus, PedigreeDate,
    PersonProperties, RelationshipProperties, VertexData, VertexKind, VirtualEdgeSegment,
};

/// Dense vertex index.
pub type VertexId = usize;

/// Layer index; persons of the topmost generation sit on rank 1.
pub type Rank = usize;

pub type EdgeWeight = u32;
