//! Structural edits of a laid out pedigree.
//!
//! Each edit inserts the new vertices one at a time at their best slot, validates the graph,
//! tidies the layout and reports what a renderer has to update. Edits that break the layering
//! (a parent below its child, say) fall back to a full redraw seeded with the current ranks.

use super::change_set::{ChangeSet, Snapshot, push_unique};
use crate::ordering::Ordering;
use crate::position::{Frame, XCoord};
use crate::positioned::{PositionedGraph, SuggestedLayout};
use pedigree_graph::{
    BaseGraph, Error, Gender, PersonProperties, Rank, RelationshipProperties, Result, VertexData,
    VertexId,
};
use std::collections::BTreeMap;

impl PositionedGraph {
    /// Persons and relationships, in id order.
    pub(crate) fn all_nodes(&self) -> Vec<VertexId> {
        let n = self.gg.real_vertex_count();
        (0..n)
            .filter(|&v| self.gg.is_person(v) || self.gg.is_relationship(v))
            .collect()
    }

    /// Validation, heuristic clean-up and vertical levels, the common tail of every edit.
    fn settle(&mut self) -> Result<()> {
        self.gg.validate()?;
        self.improve_positioning()?;
        self.update_secondary_structures(false);
        Ok(())
    }

    fn person_of_gender(gender: Gender) -> VertexData {
        VertexData::Person(PersonProperties::with_gender(gender))
    }

    fn relationship_for(child: &PersonProperties) -> VertexData {
        if child.placeholder {
            VertexData::Relationship(RelationshipProperties::childless())
        } else {
            VertexData::Relationship(RelationshipProperties::default())
        }
    }

    pub(crate) fn add_new_child(
        &mut self,
        parent: VertexId,
        properties: PersonProperties,
        num_twins: usize,
    ) -> Result<ChangeSet> {
        let hub = if self.gg.is_childhub(parent) {
            parent
        } else if self.gg.is_relationship(parent) {
            self.gg.relationship_childhub(parent)?
        } else {
            return Err(Error::precondition("add_new_child", parent));
        };
        let before = Snapshot::capture(self);

        let rank = self.ranks[hub] + 1;
        let order = self.find_best_insert_position(rank, hub, false)?;
        let child = self.insert_and_place(VertexData::Person(properties.clone()), Some(hub), None, rank, order)?;

        let mut new = vec![child];
        for _ in 1..num_twins {
            let twin = self.add_twin(child, properties.clone())?;
            new.extend(twin.new.first());
        }

        self.settle()?;
        let mut moved = self.find_moved_nodes(&before, false)?;
        let rel = self
            .gg
            .in_edges(hub)
            .first()
            .copied()
            .ok_or_else(|| Error::precondition("add_new_child", hub))?;
        push_unique(&mut moved, rel);
        Ok(ChangeSet {
            new,
            moved,
            animate: self.gg.in_edges(rel).to_vec(),
            ..Default::default()
        })
    }

    pub(crate) fn add_new_parents(&mut self, person: VertexId) -> Result<ChangeSet> {
        if !self.gg.is_person(person) || !self.gg.in_edges(person).is_empty() {
            return Err(Error::precondition("add_new_parents", person));
        }
        let before = Snapshot::capture(self);

        self.swap_before_parents_to_bring_to_side_if_possible(person)?;

        let hub_rank = self.ranks[person] - 1;
        let hub_order = self.find_best_insert_position(hub_rank, person, false)?;
        let hub = self.insert_and_place(VertexData::ChildHub, None, Some(person), hub_rank, hub_order)?;

        // inserting above the top rank renumbers every rank
        let parents_rank = self.ranks[hub] - 1;
        let rel_order = self.find_best_insert_position(parents_rank, hub, false)?;
        let rel = self.insert_and_place(
            VertexData::Relationship(RelationshipProperties::default()),
            None,
            Some(hub),
            parents_rank,
            rel_order,
        )?;

        let parents_rank = self.ranks[rel];
        let mother = self.insert_and_place(
            Self::person_of_gender(Gender::Female),
            None,
            Some(rel),
            parents_rank,
            rel_order + 1,
        )?;
        let father = self.insert_and_place(
            Self::person_of_gender(Gender::Male),
            None,
            Some(rel),
            parents_rank,
            rel_order,
        )?;

        self.settle()?;
        let moved = self.find_moved_nodes(&before, false)?;

        // animating all partners of a person with many relationships gets confusing
        let mut animate = self.gg.all_partners(person)?;
        if animate.len() == 1 {
            animate.push(person);
        } else {
            animate = vec![person];
        }
        Ok(ChangeSet {
            new: vec![rel, mother, father],
            moved,
            highlight: vec![person],
            animate,
            ..Default::default()
        })
    }

    pub(crate) fn add_new_relationship(
        &mut self,
        person: VertexId,
        child_properties: PersonProperties,
        prefer_left: bool,
        num_twins: usize,
    ) -> Result<ChangeSet> {
        if !self.gg.is_person(person) {
            return Err(Error::precondition("add_new_relationship", person));
        }
        let before = Snapshot::capture(self);
        let partner_gender = self.gg.opposite_gender(person)?;
        let rank = self.ranks[person];

        self.swap_partner_to_bring_to_side_if_possible(person)?;
        self.swap_twins_to_bring_to_side_if_possible(person)?;
        let person_order = self.order.position(person);

        let rel_order = self.find_best_insert_position(rank, person, prefer_left)?;
        let rel = self.insert_and_place(Self::relationship_for(&child_properties), Some(person), None, rank, rel_order)?;

        let partner_order = if rel_order > person_order { rel_order + 1 } else { rel_order };
        let partner = self.insert_and_place(
            Self::person_of_gender(partner_gender),
            None,
            Some(rel),
            rank,
            partner_order,
        )?;

        let hub_rank = rank + 1;
        let hub_order = self.find_best_insert_position(hub_rank, rel, false)?;
        let hub = self.insert_and_place(VertexData::ChildHub, Some(rel), None, hub_rank, hub_order)?;

        let child_rank = hub_rank + 1;
        let child_order = self.find_best_insert_position(child_rank, hub, false)?;
        let child = self.insert_and_place(
            VertexData::Person(child_properties.clone()),
            Some(hub),
            None,
            child_rank,
            child_order,
        )?;

        let mut new = vec![rel, partner, child];
        for _ in 1..num_twins {
            let twin = self.add_twin(child, child_properties.clone())?;
            new.extend(twin.new.first());
        }

        self.settle()?;
        let moved = self.find_moved_nodes(&before, false)?;
        Ok(ChangeSet {
            new,
            moved,
            highlight: vec![person],
            ..Default::default()
        })
    }

    /// Makes `child` (a person without parents) a child of `parent`, which is either a
    /// relationship or a person. A person gets a new partner and relationship for it.
    pub(crate) fn assign_parent(&mut self, parent: VertexId, child: VertexId) -> Result<ChangeSet> {
        if !self.gg.is_person(child) || !self.gg.in_edges(child).is_empty() {
            return Err(Error::precondition("assign_parent", child));
        }
        if self.gg.is_relationship(parent) {
            self.assign_parent_relationship(parent, child)
        } else if self.gg.is_person(parent) {
            self.assign_parent_person(parent, child)
        } else {
            Err(Error::precondition("assign_parent", parent))
        }
    }

    fn assign_parent_relationship(&mut self, rel: VertexId, child: VertexId) -> Result<ChangeSet> {
        let hub = self.gg.relationship_childhub(rel)?;
        let (rank_hub, rank_child) = (self.ranks[hub], self.ranks[child]);
        let others = self.gg.out_edges(hub).to_vec();
        self.gg.add_edge(hub, child, 1)?;

        // a lone placeholder child gives way to the real one; ids above it shift down
        let mut removal = None;
        let (mut rel, mut child) = (rel, child);
        if let [only] = others[..] {
            if self.gg.is_placeholder(only) {
                let changes = self.remove_nodes(&[only])?;
                let remap = |v: VertexId| changes.changed_id_set.get(&v).copied().unwrap_or(v);
                rel = remap(rel);
                child = remap(child);
                removal = Some(changes);
            }
        }

        if rank_hub + 1 != rank_child {
            let removed = removal.map(|c| c.removed).unwrap_or_default();
            return self.redraw_all(removed, vec![child], Vec::new(), None);
        }

        let mut before = Snapshot::capture(self);
        self.gg.validate()?;
        self.update_secondary_structures(false);
        // the relationship always gets redrawn
        if let Some(x) = before.positions.get_mut(rel) {
            *x = f64::INFINITY;
        }
        let moved = self.find_moved_nodes(&before, false)?;

        match removal {
            Some(mut changes) => {
                for v in moved {
                    push_unique(&mut changes.moved, v);
                }
                changes.animate = vec![child];
                Ok(changes)
            }
            None => Ok(ChangeSet {
                moved,
                animate: vec![child],
                ..Default::default()
            }),
        }
    }

    fn assign_parent_person(&mut self, parent: VertexId, child: VertexId) -> Result<ChangeSet> {
        let (rank_parent, rank_child) = (self.ranks[parent], self.ranks[child]);
        let partner_gender = self.gg.opposite_gender(parent)?;

        if rank_parent >= rank_child {
            // the layering breaks: build the family anywhere and lay everything out again
            let ranks_before = self.ranks[..self.gg.real_vertex_count()].to_vec();
            let hub = self.insert_and_place(VertexData::ChildHub, None, Some(child), rank_child - 1, 0)?;
            let rel = self.insert_and_place(
                VertexData::Relationship(RelationshipProperties::default()),
                None,
                Some(hub),
                self.ranks[hub] - 1,
                0,
            )?;
            let partner = self.insert_and_place(
                Self::person_of_gender(partner_gender),
                None,
                Some(rel),
                self.ranks[rel],
                0,
            )?;
            self.gg.add_edge(parent, rel, 1)?;
            return self.redraw_all(Vec::new(), vec![child, parent], vec![rel, partner], Some(ranks_before));
        }

        let before = Snapshot::capture(self);
        let (x_parent, x_child) = (self.positions[parent], self.positions[child]);

        let (rel, partner) = if rank_parent + 2 == rank_child {
            let rel_order = self.find_best_insert_position(rank_parent, parent, x_child < x_parent)?;
            let rel = self.insert_and_place(
                VertexData::Relationship(RelationshipProperties::default()),
                Some(parent),
                None,
                rank_parent,
                rel_order,
            )?;
            let partner_order = if self.order.position(parent) > self.order.position(rel) {
                rel_order
            } else {
                rel_order + 1
            };
            let partner = self.insert_and_place(
                Self::person_of_gender(partner_gender),
                None,
                Some(rel),
                rank_parent,
                partner_order,
            )?;
            let hub_rank = self.ranks[child] - 1;
            let hub_order = self.find_best_insert_position(hub_rank, rel, false)?;
            let hub = self.insert_and_place(VertexData::ChildHub, Some(rel), None, hub_rank, hub_order)?;
            self.gg.add_edge(hub, child, 1)?;
            (rel, partner)
        } else {
            // the relationship sits right above the child; the parent reaches it through
            // a chain of segments
            let hub_rank = rank_child - 1;
            let hub_order = self.find_best_insert_position(hub_rank, child, false)?;
            let hub = self.insert_and_place(VertexData::ChildHub, None, Some(child), hub_rank, hub_order)?;

            let parents_rank = rank_child - 2;
            let rel_order = self.find_best_insert_position(parents_rank, hub, false)?;
            let rel = self.insert_and_place(
                VertexData::Relationship(RelationshipProperties::default()),
                None,
                Some(hub),
                parents_rank,
                rel_order,
            )?;
            let partner_order = if self.positions[parent] > self.positions[rel] {
                rel_order
            } else {
                rel_order + 1
            };
            let partner = self.insert_and_place(
                Self::person_of_gender(partner_gender),
                None,
                Some(rel),
                parents_rank,
                partner_order,
            )?;
            self.add_multi_rank_edge(parent, rel)?;
            (rel, partner)
        };

        self.settle()?;
        let moved = self.find_moved_nodes(&before, false)?;
        Ok(ChangeSet {
            new: vec![rel, partner],
            moved,
            highlight: vec![parent, partner, child],
            ..Default::default()
        })
    }

    /// Creates a relationship between two existing persons with one new child. Partners on
    /// different generations are joined by a long partner line.
    pub(crate) fn assign_partner(
        &mut self,
        person1: VertexId,
        person2: VertexId,
        child_properties: PersonProperties,
    ) -> Result<ChangeSet> {
        if !self.gg.is_person(person1) || person1 == person2 {
            return Err(Error::precondition("assign_partner", person1));
        }
        if !self.gg.is_person(person2) {
            return Err(Error::precondition("assign_partner", person2));
        }
        let before = Snapshot::capture(self);

        // the lower (or, on one rank, the left) partner hosts the relationship
        let (mut p1, mut p2) = (person1, person2);
        if self.ranks[p1] < self.ranks[p2]
            || (self.ranks[p1] == self.ranks[p2] && self.order.position(p2) < self.order.position(p1))
        {
            std::mem::swap(&mut p1, &mut p2);
        }
        let (rank1, rank2) = (self.ranks[p1], self.ranks[p2]);
        let prefer_left = self.positions[p2] < self.positions[p1];

        let rel_order = if rank1 == rank2 {
            self.find_best_relationship_position(p1, false, Some(p2))?
        } else {
            self.find_best_relationship_position(p1, prefer_left, None)?
        };
        let rel = self.insert_and_place(Self::relationship_for(&child_properties), Some(p1), None, rank1, rel_order)?;

        let hub_rank = self.ranks[rel] + 1;
        let hub_order = self.find_best_insert_position(hub_rank, rel, false)?;
        let hub = self.insert_and_place(VertexData::ChildHub, Some(rel), None, hub_rank, hub_order)?;

        let child_rank = hub_rank + 1;
        let child_order = self.find_best_insert_position(child_rank, hub, false)?;
        let child = self.insert_and_place(VertexData::Person(child_properties), Some(hub), None, child_rank, child_order)?;

        if rank1 == rank2 {
            self.gg.add_edge(p2, rel, 1)?;
        } else {
            self.add_multi_rank_edge(p2, rel)?;
        }

        self.settle()?;
        let moved = self.find_moved_nodes(&before, false)?;
        Ok(ChangeSet {
            new: vec![rel, child],
            moved,
            highlight: vec![p1, p2, child],
            ..Default::default()
        })
    }

    /// Adds a twin of `person`, creating the twin group when `person` was not a twin yet.
    pub(crate) fn add_twin(&mut self, person: VertexId, properties: PersonProperties) -> Result<ChangeSet> {
        let before = Snapshot::capture(self);
        let rel = self
            .gg
            .producing_relationship(person)?
            .ok_or_else(|| Error::precondition("add_twin", person))?;
        let hub = self.gg.relationship_childhub(rel)?;

        let group = match self.gg.twin_group_id(person) {
            Some(group) => group,
            None => {
                let group = self.gg.unused_twin_group_id(rel)?;
                if let Some(p) = self.gg.person_mut(person) {
                    p.twin_group = Some(group);
                }
                group
            }
        };
        let mut properties = properties;
        properties.twin_group = Some(group);

        let rank = self.ranks[person];
        let order = self.find_best_twin_insert_position(person, &[])?;
        let twin = self.insert_and_place(VertexData::Person(properties), Some(hub), None, rank, order)?;

        self.settle()?;
        let mut moved = self.find_moved_nodes(&before, false)?;
        push_unique(&mut moved, rel);
        let mut animate = self.gg.parents(rel)?;
        animate.push(person);
        Ok(ChangeSet {
            new: vec![twin],
            moved,
            animate,
            ..Default::default()
        })
    }

    pub(crate) fn convert_placeholder_to(
        &mut self,
        placeholder: VertexId,
        properties: PersonProperties,
    ) -> Result<ChangeSet> {
        if !self.gg.is_placeholder(placeholder) {
            return Err(Error::precondition("convert_placeholder_to", placeholder));
        }
        let before = Snapshot::capture(self);
        let mut properties = properties;
        properties.placeholder = false;
        self.gg.set_data(placeholder, VertexData::Person(properties))?;

        self.improve_positioning()?;
        self.update_secondary_structures(false);

        // partner lines on the rank are redrawn too: a person is drawn larger than a placeholder
        let mut moved: Vec<VertexId> = self.gg.producing_relationship(placeholder)?.into_iter().collect();
        let rank = self.ranks[placeholder];
        for &v in self.order.rank(rank) {
            if self.gg.is_relationship(v) {
                push_unique(&mut moved, v);
            }
        }
        for v in self.find_moved_nodes(&before, false)? {
            push_unique(&mut moved, v);
        }
        moved.retain(|&v| v != placeholder);

        Ok(ChangeSet {
            new: vec![placeholder],
            moved,
            removed: vec![placeholder],
            ..Default::default()
        })
    }

    /// Removes the given persons and relationships. A relationship takes its child hub and
    /// partner-line segments along; callers remove whatever would end up disconnected (see
    /// `disconnected_set_if_node_removed`). Ids above each removed vertex shift down.
    pub(crate) fn remove_nodes(&mut self, nodes: &[VertexId]) -> Result<ChangeSet> {
        let old_max = self.gg.max_real_vertex_id();
        let mut removed = nodes.to_vec();
        removed.sort_unstable();
        removed.dedup();

        let mut doomed = removed.clone();
        for &v in &removed {
            if !self.gg.is_person(v) && !self.gg.is_relationship(v) {
                return Err(Error::precondition("remove_nodes", v));
            }
            if self.gg.is_relationship(v) {
                doomed.push(self.gg.relationship_childhub(v)?);
                for path in self.gg.path_to_parents(v)? {
                    doomed.extend(path.into_iter().filter(|&u| self.gg.is_virtual(u)));
                }
            }
        }
        doomed.sort_unstable();
        doomed.dedup();

        // a twin whose only co-twin goes away is no longer a twin
        let mut lone_twins = Vec::new();
        for &v in &doomed {
            if self.gg.twin_group_id(v).is_none() {
                continue;
            }
            let survivors: Vec<VertexId> = self
                .gg
                .all_twins_of(v)?
                .into_iter()
                .filter(|u| doomed.binary_search(u).is_err())
                .collect();
            if let [only] = survivors[..] {
                lone_twins.push(only);
            }
        }

        let mut changed: BTreeMap<VertexId, VertexId> = BTreeMap::new();
        for &v in doomed.iter().rev() {
            self.remove_vertex(v)?;
            if let Some(old_max) = old_max {
                for u in v + 1..=old_max {
                    let id = changed.entry(u).or_insert(u);
                    *id -= 1;
                }
            }
        }
        changed.retain(|u, _| doomed.binary_search(u).is_err());

        for twin in lone_twins {
            let twin = changed.get(&twin).copied().unwrap_or(twin);
            if let Some(p) = self.gg.person_mut(twin) {
                p.twin_group = None;
                p.monozygotic = false;
            }
        }

        self.recompute_max_rank();
        while self.order.num_ranks() > self.max_rank + 1 {
            self.order.remove_rank(self.order.num_ranks() - 1);
        }
        self.gg.validate()?;
        // former twins need the wider gap of ordinary siblings
        self.spread_crowded_neighbours()?;
        // ids changed, so nothing can be compared against the old layout: every partner
        // line is redrawn and rank heights are kept
        self.update_secondary_structures(true);

        let moved = (0..self.gg.real_vertex_count())
            .filter(|&v| self.gg.is_relationship(v))
            .collect();
        Ok(ChangeSet {
            moved,
            removed,
            changed_id_set: changed,
            ..Default::default()
        })
    }

    /// Pushes vertices right wherever neighbours ended up closer than allowed. Fails when
    /// that does not make the positions valid.
    fn spread_crowded_neighbours(&mut self) -> Result<()> {
        let positions = std::mem::take(&mut self.positions);
        let frame = Frame::new(&self.gg, &self.ranks, &self.order, &self.options.separations);
        let mut xcoord = XCoord::unchecked(frame, positions);
        let spread = xcoord.spread_crowded_neighbours();
        let checked = xcoord.validate();
        self.positions = xcoord.into_positions();
        if spread {
            tracing::debug!("spread vertices left too close by a removal");
        }
        checked
    }

    pub(crate) fn improve_position(&mut self) -> Result<ChangeSet> {
        let before = Snapshot::capture(self);
        self.improve_positioning()?;
        self.update_secondary_structures(false);
        let moved = self.find_moved_nodes(&before, false)?;
        Ok(ChangeSet {
            moved,
            ..Default::default()
        })
    }

    /// Recomputes rank heights only, e.g. after a label got longer.
    pub(crate) fn update_y_positioning(&mut self) -> Result<ChangeSet> {
        let before = Snapshot::capture(self);
        self.rank_y = self.compute_rank_y();
        let moved = self.find_moved_nodes(&before, true)?;
        Ok(ChangeSet {
            moved,
            ..Default::default()
        })
    }

    pub(crate) fn update_ancestors(&mut self) -> ChangeSet {
        self.update_secondary_structures(true);
        let moved = (0..self.gg.real_vertex_count())
            .filter(|&v| self.gg.is_relationship(v))
            .collect();
        ChangeSet {
            moved,
            ..Default::default()
        }
    }

    /// Replaces the pedigree by a single person carrying the proband's properties.
    pub(crate) fn clear_all(&mut self) -> Result<ChangeSet> {
        let removed = self.all_nodes();
        let mut properties = self
            .proband
            .and_then(|p| self.gg.person(p))
            .cloned()
            .unwrap_or_default();
        properties.twin_group = None;
        properties.monozygotic = false;

        let mut gg = BaseGraph::with_defaults(self.gg.defaults());
        gg.add_vertex(VertexData::Person(properties), None)?;
        *self = PositionedGraph::new(gg, Some(0), self.options.clone(), None)?;

        Ok(ChangeSet {
            new: vec![0],
            removed,
            makevisible: vec![0],
            ..Default::default()
        })
    }

    /// Lays the whole pedigree out again, reusing the current generations where possible.
    ///
    /// `ranks_before` (real vertices only) is what re-ranking is measured against; persons
    /// whose generation changed differently from the proband's are highlighted.
    pub(crate) fn redraw_all(
        &mut self,
        removed: Vec<VertexId>,
        animate: Vec<VertexId>,
        new: Vec<VertexId>,
        ranks_before: Option<Vec<Rank>>,
    ) -> Result<ChangeSet> {
        let ranks_before =
            ranks_before.unwrap_or_else(|| self.ranks[..self.gg.real_vertex_count()].to_vec());
        let suggested = SuggestedLayout {
            ranks: Some(self.ranks.clone()),
            ..Default::default()
        };
        *self = PositionedGraph::new(self.gg.clone(), self.proband, self.options.clone(), Some(suggested))?;

        let mut moved = self.all_nodes();
        moved.retain(|v| !new.contains(v));

        let shift = |v: VertexId| ranks_before.get(v).map(|&r| r as isize - self.ranks[v] as isize);
        let proband_shift = self.proband.and_then(shift);
        let mut re_ranked = Vec::new();
        let mut shifted_unlike_proband = Vec::new();
        for v in 0..self.gg.real_vertex_count() {
            if !self.gg.is_person(v) || self.gg.is_placeholder(v) {
                continue;
            }
            let Some(delta) = shift(v) else {
                continue;
            };
            if delta != 0 {
                re_ranked.push(v);
            }
            if proband_shift.is_some_and(|p| p != delta) {
                shifted_unlike_proband.push(v);
            }
        }
        if proband_shift.is_some() && shifted_unlike_proband.len() < re_ranked.len() {
            re_ranked = shifted_unlike_proband;
        }

        Ok(ChangeSet {
            new,
            moved,
            removed,
            animate,
            highlight: re_ranked,
            ..Default::default()
        })
    }

    /// Moves person `v` past `amount` neighbouring persons on its rank (negative: to the
    /// left) and lays the pedigree out again with the resulting order. Returns an empty
    /// change set when there are not enough persons to move past.
    pub(crate) fn perform_node_order_change(&mut self, v: VertexId, amount: isize) -> Result<ChangeSet> {
        if !self.gg.is_person(v) {
            return Err(Error::precondition("perform_node_order_change", v));
        }
        if amount == 0 {
            return Ok(ChangeSet::default());
        }
        let rank = self.ranks[v];
        let mut order = self.order.clone();
        for _ in 0..amount.unsigned_abs() {
            if !self.move_past_one_person(&mut order, rank, v, amount.signum())? {
                return Ok(ChangeSet::default());
            }
        }

        let suggested = SuggestedLayout {
            ranks: Some(self.ranks.clone()),
            order: Some(order),
            positions: None,
        };
        *self = PositionedGraph::new(self.gg.clone(), self.proband, self.options.clone(), Some(suggested))?;
        Ok(ChangeSet {
            moved: self.all_nodes(),
            ..Default::default()
        })
    }

    pub(crate) fn neighbour_person_order(
        &self,
        order: &Ordering,
        rank: Rank,
        from: usize,
        direction: isize,
    ) -> Option<usize> {
        let row = order.rank(rank);
        let mut i = from as isize + direction;
        while i >= 0 && (i as usize) < row.len() {
            if self.gg.is_person(row[i as usize]) {
                return Some(i as usize);
            }
            i += direction;
        }
        None
    }

    /// One step of [`perform_node_order_change`](Self::perform_node_order_change). A partner
    /// next in line swaps places with `v`; anyone else is passed, with the relationships of
    /// `v` in between carried past as well.
    fn move_past_one_person(
        &self,
        order: &mut Ordering,
        rank: Rank,
        v: VertexId,
        direction: isize,
    ) -> Result<bool> {
        let current = order.position(v);
        let Some(mut next_order) = self.neighbour_person_order(order, rank, current, direction) else {
            return Ok(false);
        };
        let next = order.rank(rank)[next_order];

        if self.gg.all_partners(v)?.contains(&next) {
            order.exchange(rank, current, next_order);
            return Ok(true);
        }

        let relationships = self.gg.all_relationships(v)?;
        let mut carried = 0;
        let mut between = current as isize + direction;
        while between != next_order as isize {
            let node = order.rank(rank)[between as usize];
            if relationships.contains(&node) {
                let amount = next_order as isize - between + direction * carried;
                order.move_by(rank, between as usize, amount);
                next_order = order.position(next);
                between = current as isize;
                carried += 1;
            }
            between += direction;
        }
        order.move_by(rank, current, next_order as isize - current as isize);
        Ok(true)
    }
}
