//! The pedigree graph container.
//!
//! Vertex ids are dense: real vertices (persons, relationships, child hubs) occupy
//! `0..real_vertex_count()`, long-edge segments occupy the ids above them. Inserting a real
//! vertex while segments exist shifts every segment id up by one; removing any vertex shifts
//! every id above it down by one.

mod entries;

pub mod alg;

use crate::vertex::{Gender, PersonProperties, RelationshipProperties, VirtualEdgeSegment};
use crate::{EdgeWeight, Error, Rank, Result, VertexData, VertexId, VertexKind};
use entries::VertexEntry;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphDefaults {
    pub person_width: f64,
    pub non_person_width: f64,
}

impl Default for GraphDefaults {
    fn default() -> Self {
        Self {
            person_width: 10.0,
            non_person_width: 2.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeafAndParentless {
    pub parentless: Vec<VertexId>,
    pub leaves: Vec<VertexId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MotherFather {
    pub mother: Option<VertexId>,
    pub father: Option<VertexId>,
    pub other: Vec<VertexId>,
}

#[derive(Debug, Clone, Default)]
pub struct BaseGraph {
    entries: Vec<VertexEntry>,
    real_count: usize,
    defaults: GraphDefaults,
}

impl BaseGraph {
    pub fn new() -> Self {
        Self::with_defaults(GraphDefaults::default())
    }

    pub fn with_defaults(defaults: GraphDefaults) -> Self {
        Self {
            entries: Vec::new(),
            real_count: 0,
            defaults,
        }
    }

    pub fn defaults(&self) -> GraphDefaults {
        self.defaults
    }

    fn default_width(&self, kind: VertexKind) -> f64 {
        match kind {
            VertexKind::Person => self.defaults.person_width,
            _ => self.defaults.non_person_width,
        }
    }

    // ---- construction -------------------------------------------------------------------

    /// Appends a vertex without shifting any id. Meant for bulk construction; real vertices
    /// can only be appended while no segment vertex exists.
    pub fn add_vertex(&mut self, data: VertexData, width: Option<f64>) -> Result<VertexId> {
        let kind = data.kind();
        let id = self.entries.len();
        if kind != VertexKind::VirtualEdge && self.real_count != id {
            return Err(Error::precondition("add_vertex", id));
        }
        let width = width.unwrap_or_else(|| self.default_width(kind));
        self.entries.push(VertexEntry::new(data, width));
        if kind != VertexKind::VirtualEdge {
            self.real_count += 1;
        }
        Ok(id)
    }

    pub fn add_edge(&mut self, from: VertexId, to: VertexId, weight: EdgeWeight) -> Result<()> {
        if from >= self.entries.len() {
            return Err(Error::precondition("add_edge", from));
        }
        if to >= self.entries.len() {
            return Err(Error::precondition("add_edge", to));
        }
        if self.has_edge(from, to) {
            return Err(Error::invariant(format!(
                "edge {from} -> {to} already exists"
            )));
        }
        self.entries[from].out.push(to);
        self.entries[to].in_.push(from);
        self.entries[from].weights.insert(to, weight);
        Ok(())
    }

    pub fn remove_edge(&mut self, from: VertexId, to: VertexId) -> Result<EdgeWeight> {
        if !self.has_edge(from, to) {
            return Err(Error::precondition("remove_edge", from));
        }
        remove_first(&mut self.entries[from].out, to);
        remove_first(&mut self.entries[to].in_, from);
        self.entries[from]
            .weights
            .remove(&to)
            .ok_or_else(|| Error::precondition("remove_edge", from))
    }

    pub fn set_edge_weight(&mut self, from: VertexId, to: VertexId, weight: EdgeWeight) -> Result<()> {
        match self.entries.get_mut(from).and_then(|e| e.weights.get_mut(&to)) {
            Some(w) => {
                *w = weight;
                Ok(())
            }
            None => Err(Error::precondition("set_edge_weight", from)),
        }
    }

    /// Moves the edge `old_source -> to` over to `new_source`, keeping `to`'s in-edge slot and
    /// the edge weight.
    pub fn redirect_in_edge(
        &mut self,
        to: VertexId,
        old_source: VertexId,
        new_source: VertexId,
    ) -> Result<()> {
        if self.has_edge(new_source, to) {
            return Err(Error::invariant(format!(
                "edge {new_source} -> {to} already exists"
            )));
        }
        let weight = self.remove_edge_keep_slot(old_source, to)?;
        replace_in(&mut self.entries[to].in_, old_source, new_source);
        self.entries[new_source].out.push(to);
        self.entries[new_source].weights.insert(to, weight);
        Ok(())
    }

    fn remove_edge_keep_slot(&mut self, from: VertexId, to: VertexId) -> Result<EdgeWeight> {
        if !self.has_edge(from, to) {
            return Err(Error::precondition("remove_edge", from));
        }
        remove_first(&mut self.entries[from].out, to);
        self.entries[from]
            .weights
            .remove(&to)
            .ok_or_else(|| Error::precondition("remove_edge", from))
    }

    /// Inserts a vertex at the end of the real (or virtual) id range and connects it.
    ///
    /// Edge endpoints are interpreted after the id shift, which only affects segment ids.
    pub fn insert_vertex(
        &mut self,
        data: VertexData,
        weight: EdgeWeight,
        in_edges: &[VertexId],
        out_edges: &[VertexId],
        width: Option<f64>,
    ) -> Result<VertexId> {
        let kind = data.kind();
        let width = width.unwrap_or_else(|| self.default_width(kind));

        let new_id = if kind == VertexKind::VirtualEdge {
            self.entries.len()
        } else {
            self.real_count
        };

        if new_id < self.entries.len() {
            self.update_all_references(|u| if u >= new_id { u + 1 } else { u });
        }
        self.entries.insert(new_id, VertexEntry::new(data, width));
        if kind != VertexKind::VirtualEdge {
            self.real_count += 1;
        }

        for &u in in_edges {
            self.add_edge(u, new_id, weight)?;
        }
        for &u in out_edges {
            self.add_edge(new_id, u, weight)?;
        }
        Ok(new_id)
    }

    /// Detaches a segment vertex, connecting its parent directly to its child.
    pub fn unplug_virtual_vertex(&mut self, v: VertexId) -> Result<()> {
        if !self.is_virtual(v) {
            return Err(Error::precondition("unplug_virtual_vertex", v));
        }
        let (Some(&parent), Some(&child)) = (self.entries[v].in_.first(), self.entries[v].out.first())
        else {
            return Err(Error::precondition("unplug_virtual_vertex", v));
        };

        replace_in(&mut self.entries[parent].out, v, child);
        if let Some(w) = self.entries[parent].weights.remove(&v) {
            self.entries[parent].weights.insert(child, w);
        }
        replace_in(&mut self.entries[child].in_, v, parent);

        let entry = &mut self.entries[v];
        entry.out.clear();
        entry.in_.clear();
        entry.weights.clear();
        Ok(())
    }

    /// Removes `v` with all its edges; every id above `v` is decremented.
    pub fn remove(&mut self, v: VertexId) -> Result<()> {
        if v >= self.entries.len() {
            return Err(Error::precondition("remove", v));
        }
        let out = std::mem::take(&mut self.entries[v].out);
        for target in out {
            remove_first(&mut self.entries[target].in_, v);
        }
        let ins = std::mem::take(&mut self.entries[v].in_);
        for source in ins {
            remove_first(&mut self.entries[source].out, v);
            self.entries[source].weights.remove(&v);
        }

        self.entries.remove(v);
        if v < self.real_count {
            self.real_count -= 1;
        }
        self.update_all_references(|u| if u > v { u - 1 } else { u });
        Ok(())
    }

    fn update_all_references(&mut self, f: impl Fn(VertexId) -> VertexId) {
        for entry in &mut self.entries {
            entry.remap(&f);
        }
    }

    // ---- long edges ---------------------------------------------------------------------

    /// Replaces every edge spanning more than one rank by a chain of segment vertices, one per
    /// intermediate rank. `ranks` is extended with the ranks of the new vertices.
    pub fn split_multi_rank_edges(&mut self, ranks: &mut Vec<Rank>) -> Result<()> {
        let mut next = BaseGraph::with_defaults(self.defaults);
        for entry in &self.entries {
            next.entries
                .push(VertexEntry::new(entry.data.clone(), entry.width));
        }
        next.real_count = self.real_count;
        ranks.resize(self.entries.len(), 0);

        for source in 0..self.entries.len() {
            let source_rank = ranks[source];
            for &target in &self.entries[source].out {
                let weight = self.edge_weight(source, target);
                let target_rank = ranks[target];
                if target_rank < source_rank {
                    return Err(Error::invariant(format!(
                        "edge {source} -> {target} points to a lower rank"
                    )));
                }
                if target_rank <= source_rank + 1 {
                    next.add_edge(source, target, weight)?;
                    continue;
                }
                let mut prev = source;
                for mid_rank in source_rank + 1..target_rank {
                    let piece = mid_rank - source_rank - 1;
                    let segment = VirtualEdgeSegment::new(source, target, piece);
                    let width = self.defaults.non_person_width;
                    let id = next.add_vertex(VertexData::VirtualEdge(segment), Some(width))?;
                    ranks.push(mid_rank);
                    next.add_edge(prev, id, weight)?;
                    prev = id;
                }
                next.add_edge(prev, target, weight)?;
            }
        }

        next.validate()?;
        *self = next;
        Ok(())
    }

    /// Inverse of [`split_multi_rank_edges`](Self::split_multi_rank_edges): drops every segment
    /// vertex and reconnects each chain's head to its tail.
    pub fn collapse_multi_rank_edges(&mut self) -> Result<()> {
        let mut next = BaseGraph::with_defaults(self.defaults);
        for entry in &self.entries[..self.real_count] {
            next.entries
                .push(VertexEntry::new(entry.data.clone(), entry.width));
        }
        next.real_count = self.real_count;

        for source in 0..self.real_count {
            for &target in &self.entries[source].out {
                let weight = self.edge_weight(source, target);
                let target = self.down_the_chain_until_non_virtual(target);
                next.add_edge(source, target, weight)?;
            }
        }

        next.validate()?;
        *self = next;
        Ok(())
    }

    // ---- validation ---------------------------------------------------------------------

    pub fn validate(&self) -> Result<()> {
        if self.entries.is_empty() {
            return Ok(());
        }

        for v in 0..self.entries.len() {
            let out = self.out_edges(v);
            let ins = self.in_edges(v);
            match self.kind(v) {
                VertexKind::Person => {
                    if ins.len() > 1 {
                        return Err(self.violation(v, "a person has more than one in-edge"));
                    }
                    if out
                        .iter()
                        .any(|&u| !self.is_relationship(u) && !self.is_virtual(u))
                    {
                        return Err(self.violation(v, "a person links to a non-relationship"));
                    }
                }
                VertexKind::Relationship => {
                    if out.len() != 1 {
                        return Err(
                            self.violation(v, "a relationship must have exactly one childhub")
                        );
                    }
                    if !self.is_childhub(out[0]) {
                        return Err(self.violation(v, "a relationship links to a non-childhub"));
                    }
                    if ins.len() != 2 {
                        return Err(
                            self.violation(v, "a relationship must have exactly two partners")
                        );
                    }
                }
                VertexKind::VirtualEdge => {
                    if out.len() != 1 || ins.len() != 1 {
                        return Err(
                            self.violation(v, "a segment must have exactly one in- and out-edge")
                        );
                    }
                    if !self.is_relationship(out[0]) && !self.is_virtual(out[0]) {
                        return Err(self.violation(v, "a segment links to a non-relationship"));
                    }
                }
                VertexKind::ChildHub => {
                    if out.is_empty() {
                        return Err(self.violation(v, "a childhub has no children"));
                    }
                    if out.iter().any(|&u| !self.is_person(u)) {
                        return Err(self.violation(v, "a childhub links to a non-person"));
                    }
                }
            }
        }

        let roots = self.leaf_and_parentless_nodes().parentless;
        if roots.is_empty() {
            return Err(Error::invariant("pedigree has a cycle (no parentless nodes)"));
        }
        if alg::has_cycle(self) {
            return Err(Error::invariant("pedigree has a cycle"));
        }
        let reachable = alg::reachable_undirected(self, roots[0]);
        if let Some(v) = (0..self.entries.len()).find(|v| !reachable.contains(v)) {
            return Err(self.violation(v, "disconnected component detected"));
        }
        Ok(())
    }

    fn violation(&self, v: VertexId, what: &str) -> Error {
        Error::invariant(format!("{what} ({})", self.vertex_description(v)))
    }

    pub fn vertex_description(&self, v: VertexId) -> String {
        let Some(entry) = self.entries.get(v) else {
            return format!("[id: {v}, type: ERROR]");
        };
        let kind = match entry.data.kind() {
            VertexKind::Person => "PERSON",
            VertexKind::Relationship => "RELATION",
            VertexKind::ChildHub => "CHILDHUB",
            VertexKind::VirtualEdge => "VIRTUAL",
        };
        format!(
            "[id: {v}, name: <{}>, type: {kind}]",
            entry.data.display_name()
        )
    }

    // ---- plain accessors ----------------------------------------------------------------

    pub fn num_vertices(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of non-segment vertices; their ids are `0..real_vertex_count()`.
    pub fn real_vertex_count(&self) -> usize {
        self.real_count
    }

    pub fn max_real_vertex_id(&self) -> Option<VertexId> {
        self.real_count.checked_sub(1)
    }

    pub fn is_valid_id(&self, v: VertexId) -> bool {
        v < self.entries.len()
    }

    pub fn data(&self, v: VertexId) -> &VertexData {
        &self.entries[v].data
    }

    pub fn data_mut(&mut self, v: VertexId) -> &mut VertexData {
        &mut self.entries[v].data
    }

    pub fn set_data(&mut self, v: VertexId, data: VertexData) -> Result<()> {
        let entry = self
            .entries
            .get_mut(v)
            .ok_or_else(|| Error::precondition("set_data", v))?;
        if entry.data.kind() != data.kind() {
            return Err(Error::precondition("set_data", v));
        }
        entry.data = data;
        Ok(())
    }

    pub fn person(&self, v: VertexId) -> Option<&PersonProperties> {
        self.entries.get(v).and_then(|e| e.data.person())
    }

    pub fn person_mut(&mut self, v: VertexId) -> Option<&mut PersonProperties> {
        match self.entries.get_mut(v).map(|e| &mut e.data) {
            Some(VertexData::Person(p)) => Some(p),
            _ => None,
        }
    }

    pub fn relationship(&self, v: VertexId) -> Option<&RelationshipProperties> {
        self.entries.get(v).and_then(|e| e.data.relationship())
    }

    pub fn relationship_mut(&mut self, v: VertexId) -> Option<&mut RelationshipProperties> {
        match self.entries.get_mut(v).map(|e| &mut e.data) {
            Some(VertexData::Relationship(r)) => Some(r),
            _ => None,
        }
    }

    pub fn kind(&self, v: VertexId) -> VertexKind {
        self.entries[v].data.kind()
    }

    pub fn width(&self, v: VertexId) -> f64 {
        self.entries[v].width
    }

    pub fn half_width(&self, v: VertexId) -> f64 {
        (self.entries[v].width / 2.0).floor()
    }

    pub fn out_edges(&self, v: VertexId) -> &[VertexId] {
        &self.entries[v].out
    }

    pub fn in_edges(&self, v: VertexId) -> &[VertexId] {
        &self.entries[v].in_
    }

    /// Out-edges followed by in-edges.
    pub fn all_edges(&self, v: VertexId) -> Vec<VertexId> {
        let e = &self.entries[v];
        e.out.iter().chain(e.in_.iter()).copied().collect()
    }

    /// Weight of the edge `from -> to`, or 0 when there is no such edge.
    pub fn edge_weight(&self, from: VertexId, to: VertexId) -> EdgeWeight {
        self.entries[from].weights.get(&to).copied().unwrap_or(0)
    }

    pub fn has_edge(&self, from: VertexId, to: VertexId) -> bool {
        self.entries
            .get(from)
            .is_some_and(|e| e.weights.contains_key(&to))
    }

    pub fn leaf_and_parentless_nodes(&self) -> LeafAndParentless {
        let mut result = LeafAndParentless::default();
        for v in 0..self.real_count {
            if self.in_edges(v).is_empty() {
                result.parentless.push(v);
            } else if self.out_edges(v).is_empty() {
                result.leaves.push(v);
            }
        }
        result
    }

    // ---- kind predicates ----------------------------------------------------------------

    fn is_kind(&self, v: VertexId, kind: VertexKind) -> bool {
        self.entries.get(v).is_some_and(|e| e.data.kind() == kind)
    }

    pub fn is_person(&self, v: VertexId) -> bool {
        self.is_kind(v, VertexKind::Person)
    }

    pub fn is_relationship(&self, v: VertexId) -> bool {
        self.is_kind(v, VertexKind::Relationship)
    }

    pub fn is_childhub(&self, v: VertexId) -> bool {
        self.is_kind(v, VertexKind::ChildHub)
    }

    pub fn is_virtual(&self, v: VertexId) -> bool {
        self.is_kind(v, VertexKind::VirtualEdge)
    }

    pub fn is_placeholder(&self, v: VertexId) -> bool {
        self.person(v).is_some_and(|p| p.placeholder)
    }

    pub fn is_adopted_in(&self, v: VertexId) -> bool {
        self.person(v)
            .is_some_and(|p| p.adopted_status == Some(crate::AdoptedStatus::AdoptedIn))
    }

    pub fn is_adopted_out(&self, v: VertexId) -> bool {
        self.person(v)
            .is_some_and(|p| p.adopted_status == Some(crate::AdoptedStatus::AdoptedOut))
    }

    pub fn is_childless(&self, v: VertexId) -> bool {
        self.relationship(v)
            .is_some_and(|r| r.childless_status.is_some())
    }

    // ---- person queries -----------------------------------------------------------------

    pub fn gender(&self, v: VertexId) -> Result<Gender> {
        self.person(v)
            .map(|p| p.gender)
            .ok_or_else(|| Error::precondition("gender", v))
    }

    pub fn opposite_gender(&self, v: VertexId) -> Result<Gender> {
        Ok(self.gender(v)?.opposite())
    }

    /// Last name, falling back to the last name at birth.
    pub fn last_name(&self, v: VertexId) -> Result<String> {
        let p = self
            .person(v)
            .ok_or_else(|| Error::precondition("last_name", v))?;
        Ok(p.last_name
            .clone()
            .or_else(|| p.last_name_at_birth.clone())
            .unwrap_or_default())
    }

    pub fn relationship_childhub(&self, v: VertexId) -> Result<VertexId> {
        if !self.is_relationship(v) {
            return Err(Error::precondition("relationship_childhub", v));
        }
        self.out_edges(v)
            .first()
            .copied()
            .ok_or_else(|| Error::precondition("relationship_childhub", v))
    }

    /// Relationships of a person, looking through long-edge segments.
    pub fn all_relationships(&self, v: VertexId) -> Result<Vec<VertexId>> {
        if !self.is_person(v) {
            return Err(Error::precondition("all_relationships", v));
        }
        Ok(self
            .out_edges(v)
            .iter()
            .map(|&u| self.down_the_chain_until_non_virtual(u))
            .collect())
    }

    pub fn all_partners(&self, v: VertexId) -> Result<Vec<VertexId>> {
        if !self.is_person(v) {
            return Err(Error::precondition("all_partners", v));
        }
        let mut result = Vec::new();
        for rel in self.all_relationships(v)? {
            let partners = self.parents(rel)?;
            if partners.len() == 2 {
                result.push(if partners[0] != v { partners[0] } else { partners[1] });
            }
        }
        Ok(result)
    }

    /// The relationship that produced person `v`, if any.
    pub fn producing_relationship(&self, v: VertexId) -> Result<Option<VertexId>> {
        if !self.is_person(v) {
            return Err(Error::precondition("producing_relationship", v));
        }
        let Some(&hub) = self.in_edges(v).first() else {
            return Ok(None);
        };
        Ok(self.in_edges(hub).first().copied())
    }

    /// The two real parents of a person or the two partners of a relationship; empty when a
    /// person has no parents.
    pub fn parents(&self, v: VertexId) -> Result<Vec<VertexId>> {
        let rel = if self.is_person(v) {
            match self.producing_relationship(v)? {
                Some(rel) => rel,
                None => return Ok(Vec::new()),
            }
        } else if self.is_relationship(v) {
            v
        } else {
            return Err(Error::precondition("parents", v));
        };

        let ins = self.in_edges(rel);
        if ins.len() != 2 {
            return Err(Error::invariant(format!(
                "relationship {rel} does not have exactly two partners"
            )));
        }
        Ok(vec![
            self.up_the_chain_until_non_virtual(ins[0]),
            self.up_the_chain_until_non_virtual(ins[1]),
        ])
    }

    /// Parents of `v` split by gender. When both parents share a gender the second one ends
    /// up in `other`.
    pub fn mother_father(&self, v: VertexId) -> Result<MotherFather> {
        let mut result = MotherFather::default();
        for p in self.parents(v)? {
            match self.gender(p)? {
                Gender::Male if result.father.is_none() => result.father = Some(p),
                Gender::Female if result.mother.is_none() => result.mother = Some(p),
                _ => result.other.push(p),
            }
        }
        Ok(result)
    }

    /// For a relationship, the paths up to each partner (segments first, partner last).
    pub fn path_to_parents(&self, v: VertexId) -> Result<[Vec<VertexId>; 2]> {
        if !self.is_relationship(v) {
            return Err(Error::precondition("path_to_parents", v));
        }
        let ins = self.in_edges(v);
        if ins.len() != 2 {
            return Err(Error::precondition("path_to_parents", v));
        }
        Ok([
            self.up_path_ending_in_non_virtual(ins[0]),
            self.up_path_ending_in_non_virtual(ins[1]),
        ])
    }

    pub fn up_the_chain_until_non_virtual(&self, mut v: VertexId) -> VertexId {
        while self.is_virtual(v) {
            match self.in_edges(v).first() {
                Some(&u) => v = u,
                None => break,
            }
        }
        v
    }

    pub fn down_the_chain_until_non_virtual(&self, mut v: VertexId) -> VertexId {
        while self.is_virtual(v) {
            match self.out_edges(v).first() {
                Some(&u) => v = u,
                None => break,
            }
        }
        v
    }

    pub fn up_path_ending_in_non_virtual(&self, mut v: VertexId) -> Vec<VertexId> {
        let mut path = vec![v];
        while self.is_virtual(v) {
            match self.in_edges(v).first() {
                Some(&u) => {
                    v = u;
                    path.push(v);
                }
                None => break,
            }
        }
        path
    }

    // ---- twins & siblings ---------------------------------------------------------------

    pub fn twin_group_id(&self, v: VertexId) -> Option<u32> {
        self.person(v).and_then(|p| p.twin_group)
    }

    /// Smallest twin group id not used by any child of relationship `v`.
    pub fn unused_twin_group_id(&self, v: VertexId) -> Result<u32> {
        let hub = self.relationship_childhub(v)?;
        let used: Vec<u32> = self
            .out_edges(hub)
            .iter()
            .filter_map(|&c| self.twin_group_id(c))
            .collect();
        let mut free = 0;
        while used.contains(&free) {
            free += 1;
        }
        Ok(free)
    }

    /// All children of the same childhub, `v` included.
    pub fn all_siblings_of(&self, v: VertexId) -> Result<Vec<VertexId>> {
        if !self.is_person(v) {
            return Err(Error::precondition("all_siblings_of", v));
        }
        match self.in_edges(v).first() {
            None => Ok(vec![v]),
            Some(&hub) => Ok(self.out_edges(hub).to_vec()),
        }
    }

    /// Twins of `v`, `v` included. A twin group left over after the parents were removed
    /// yields just `[v]`.
    pub fn all_twins_of(&self, v: VertexId) -> Result<Vec<VertexId>> {
        if !self.is_person(v) {
            return Err(Error::precondition("all_twins_of", v));
        }
        let (Some(group), Some(&hub)) = (self.twin_group_id(v), self.in_edges(v).first()) else {
            return Ok(vec![v]);
        };
        Ok(self
            .out_edges(hub)
            .iter()
            .copied()
            .filter(|&c| self.twin_group_id(c) == Some(group))
            .collect())
    }

    pub fn is_parent_to_twin_edge(&self, from: VertexId, to: VertexId) -> bool {
        self.is_childhub(from) && self.twin_group_id(to).is_some()
    }

    /// `v` together with every vertex above it.
    pub fn all_ancestors(&self, v: VertexId) -> Vec<VertexId> {
        let mut result: Vec<VertexId> = alg::all_ancestors(self, v).into_iter().collect();
        result.sort_unstable();
        result
    }
}

fn remove_first(list: &mut Vec<VertexId>, value: VertexId) {
    if let Some(pos) = list.iter().position(|&u| u == value) {
        list.remove(pos);
    }
}

fn replace_in(list: &mut [VertexId], value: VertexId, with: VertexId) {
    for u in list.iter_mut() {
        if *u == value {
            *u = with;
        }
    }
}
