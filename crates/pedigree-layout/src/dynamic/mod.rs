//! Incremental editing of a laid out pedigree.
//!
//! [`DynamicPositionedGraph`] is the entry point for interactive use. Every edit runs on a
//! staged copy of the layout and is committed only when it succeeds, so a failed edit leaves
//! the pedigree exactly as it was. Each successful edit reports a [`ChangeSet`].

mod change_set;
mod edit;
mod insert;
mod queries;

pub use change_set::ChangeSet;
pub use queries::{PossiblePartner, Point, RelationshipLineInfo};

use crate::document::{LayoutDocument, UndoRedoState};
use crate::options::LayoutContext;
use crate::positioned::{PositionedGraph, SuggestedLayout};
use pedigree_graph::{
    BaseGraph, PersonProperties, RelationshipProperties, Result, VertexData, VertexId,
};
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct DynamicPositionedGraph {
    context: LayoutContext,
    dg: PositionedGraph,
}

impl DynamicPositionedGraph {
    /// Lays out `gg` from scratch; the proband is taken from the context.
    pub fn new(gg: BaseGraph, context: LayoutContext) -> Result<Self> {
        Self::with_suggested_layout(gg, context, SuggestedLayout::default())
    }

    pub fn with_suggested_layout(
        gg: BaseGraph,
        context: LayoutContext,
        suggested: SuggestedLayout,
    ) -> Result<Self> {
        let dg = PositionedGraph::new(gg, context.proband, context.options.clone(), Some(suggested))?;
        Ok(Self { context, dg })
    }

    /// A pedigree holding only the proband, a person of unknown gender.
    pub fn with_single_proband(context: LayoutContext) -> Result<Self> {
        let mut gg = BaseGraph::new();
        let proband = gg.add_vertex(VertexData::Person(PersonProperties::default()), None)?;
        let context = LayoutContext {
            proband: Some(proband),
            ..context
        };
        Self::new(gg, context)
    }

    /// Restores a layout saved with [`to_json`](Self::to_json).
    pub fn from_layout_json(value: &serde_json::Value, context: LayoutContext) -> Result<Self> {
        let document: LayoutDocument = serde_json::from_value(value.clone())?;
        let dg = document.restore(&context)?;
        Ok(Self { context, dg })
    }

    pub fn context(&self) -> &LayoutContext {
        &self.context
    }

    pub fn positioned(&self) -> &PositionedGraph {
        &self.dg
    }

    pub fn graph(&self) -> &BaseGraph {
        self.dg.graph()
    }

    pub fn proband(&self) -> Option<VertexId> {
        self.dg.proband()
    }

    /// Runs `edit` on a copy of the layout and keeps the copy only if the edit succeeded.
    fn stage(
        &mut self,
        operation: &'static str,
        edit: impl FnOnce(&mut PositionedGraph) -> Result<ChangeSet>,
    ) -> Result<ChangeSet> {
        let started = Instant::now();
        let mut staged = self.dg.clone();
        let changes = match edit(&mut staged) {
            Ok(changes) => changes,
            Err(err) => {
                tracing::warn!(operation, error = %err, "edit rejected, layout unchanged");
                return Err(err);
            }
        };
        self.dg = staged;
        tracing::debug!(
            operation,
            new = changes.new.len(),
            moved = changes.moved.len(),
            removed = changes.removed.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "edit committed"
        );
        Ok(changes)
    }

    // ---- edits ---------------------------------------------------------------------------

    /// Adds a child (and `num_twins - 1` twins of it) under a relationship or child hub.
    pub fn add_new_child(
        &mut self,
        parent: VertexId,
        properties: PersonProperties,
        num_twins: usize,
    ) -> Result<ChangeSet> {
        self.stage("add_new_child", |dg| dg.add_new_child(parent, properties, num_twins))
    }

    /// Adds a mother and a father to a person who has no parents.
    pub fn add_new_parents(&mut self, person: VertexId) -> Result<ChangeSet> {
        self.stage("add_new_parents", |dg| dg.add_new_parents(person))
    }

    /// Adds a partner of the opposite gender, a relationship and one child (plus twins).
    pub fn add_new_relationship(
        &mut self,
        person: VertexId,
        child_properties: PersonProperties,
        prefer_left: bool,
        num_twins: usize,
    ) -> Result<ChangeSet> {
        self.stage("add_new_relationship", |dg| {
            dg.add_new_relationship(person, child_properties, prefer_left, num_twins)
        })
    }

    pub fn add_twin(&mut self, person: VertexId, properties: PersonProperties) -> Result<ChangeSet> {
        self.stage("add_twin", |dg| dg.add_twin(person, properties))
    }

    pub fn assign_parent(&mut self, parent: VertexId, child: VertexId) -> Result<ChangeSet> {
        self.stage("assign_parent", |dg| dg.assign_parent(parent, child))
    }

    pub fn assign_partner(
        &mut self,
        person1: VertexId,
        person2: VertexId,
        child_properties: PersonProperties,
    ) -> Result<ChangeSet> {
        self.stage("assign_partner", |dg| dg.assign_partner(person1, person2, child_properties))
    }

    pub fn convert_placeholder_to(
        &mut self,
        placeholder: VertexId,
        properties: PersonProperties,
    ) -> Result<ChangeSet> {
        self.stage("convert_placeholder_to", |dg| dg.convert_placeholder_to(placeholder, properties))
    }

    pub fn remove_nodes(&mut self, nodes: &[VertexId]) -> Result<ChangeSet> {
        self.stage("remove_nodes", |dg| dg.remove_nodes(nodes))
    }

    pub fn improve_position(&mut self) -> Result<ChangeSet> {
        self.stage("improve_position", PositionedGraph::improve_position)
    }

    pub fn update_y_positioning(&mut self) -> Result<ChangeSet> {
        self.stage("update_y_positioning", PositionedGraph::update_y_positioning)
    }

    pub fn update_ancestors(&mut self) -> Result<ChangeSet> {
        self.stage("update_ancestors", |dg| Ok(dg.update_ancestors()))
    }

    pub fn clear_all(&mut self) -> Result<ChangeSet> {
        self.stage("clear_all", PositionedGraph::clear_all)
    }

    pub fn redraw_all(&mut self) -> Result<ChangeSet> {
        self.stage("redraw_all", |dg| dg.redraw_all(Vec::new(), Vec::new(), Vec::new(), None))
    }

    /// Moves a person `amount` persons to the right (negative: left) within its generation.
    pub fn perform_node_order_change(&mut self, v: VertexId, amount: isize) -> Result<ChangeSet> {
        self.stage("perform_node_order_change", |dg| dg.perform_node_order_change(v, amount))
    }

    /// Replaces the properties of a person. Changes that affect the drawing height (comments,
    /// dates) need an [`update_y_positioning`](Self::update_y_positioning) afterwards.
    pub fn set_person_properties(&mut self, v: VertexId, properties: PersonProperties) -> Result<()> {
        self.stage("set_person_properties", |dg| {
            dg.gg.set_data(v, VertexData::Person(properties))?;
            Ok(ChangeSet::default())
        })
        .map(drop)
    }

    /// Replaces the properties of a relationship. Consanguinity changes are reflected
    /// after [`update_ancestors`](Self::update_ancestors).
    pub fn set_relationship_properties(
        &mut self,
        v: VertexId,
        properties: RelationshipProperties,
    ) -> Result<()> {
        self.stage("set_relationship_properties", |dg| {
            dg.gg.set_data(v, VertexData::Relationship(properties))?;
            Ok(ChangeSet::default())
        })
        .map(drop)
    }

    // ---- persistence ---------------------------------------------------------------------

    pub fn to_json(&self) -> Result<serde_json::Value> {
        let document = LayoutDocument::capture(&self.dg, &self.context.json_version)?;
        Ok(serde_json::to_value(document)?)
    }

    /// Replaces the pedigree by a saved layout; everything is reported as removed and new.
    pub fn from_json(&mut self, value: &serde_json::Value) -> Result<ChangeSet> {
        let context = self.context.clone();
        self.stage("from_json", |dg| {
            let removed = dg.all_nodes();
            let document: LayoutDocument = serde_json::from_value(value.clone())?;
            *dg = document.restore(&context)?;
            Ok(ChangeSet {
                new: dg.all_nodes(),
                removed,
                ..Default::default()
            })
        })
    }

    pub fn to_undo_redo_state(&self) -> Result<String> {
        UndoRedoState::capture(&self.dg)?.to_json_string()
    }

    pub fn from_undo_redo_state(&mut self, state: &str) -> Result<ChangeSet> {
        let context = self.context.clone();
        self.stage("from_undo_redo_state", |dg| {
            let removed = dg.all_nodes();
            *dg = UndoRedoState::from_json_str(state)?.restore(&context)?;
            Ok(ChangeSet {
                new: dg.all_nodes(),
                removed,
                ..Default::default()
            })
        })
    }
}
