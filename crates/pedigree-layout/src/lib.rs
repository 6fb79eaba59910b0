//! Incremental layered layout for pedigree diagrams.
//!
//! A pedigree ([`pedigree_graph::BaseGraph`]) is laid out in four stages: generations are
//! assigned ([`rank`]), every rank is ordered to minimise crossings ([`order`]), vertices get
//! x-coordinates ([`position`]) and overlapping horizontal lines get vertical levels
//! ([`vertical`]). [`PositionedGraph`] holds the result; [`DynamicPositionedGraph`] edits it in
//! place and reports what changed as a [`ChangeSet`].

pub use pedigree_graph as graph;
pub use pedigree_graph::{Error, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod ancestors;
pub mod document;
pub mod dynamic;
pub mod heuristics;
pub mod import;
pub mod options;
pub mod order;
pub mod ordering;
pub mod position;
pub mod positioned;
pub mod rank;
pub mod vertical;

pub use document::{LayoutDocument, UndoRedoState};
pub use dynamic::{ChangeSet, DynamicPositionedGraph, Point, PossiblePartner, RelationshipLineInfo};
pub use import::{ImportedPedigree, PedImportOptions, from_ped, from_simple_json};
pub use options::{
    CURRENT_JSON_VERSION, LayoutContext, LayoutOptions, Separations, TuningParameters,
    VerticalSpacing,
};
pub use ordering::Ordering;
pub use positioned::{PositionedGraph, SuggestedLayout};
