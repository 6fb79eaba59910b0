//! Read-only questions a pedigree editor asks while the user works.

use super::DynamicPositionedGraph;
use pedigree_graph::{
    Consanguinity, Error, Gender, LifeStatus, PersonProperties, Result, VertexData, VertexId, alg,
};
use rustc_hash::FxHashSet as HashSet;
use serde::Serialize;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// How the line from a person to one of its relationships is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipLineInfo {
    pub attachment_port: usize,
    pub attach_y: f64,
    pub vertical_level: usize,
    pub vertical_y: f64,
    pub num_attach_ports: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PossiblePartner {
    #[serde(rename = "nodeID")]
    pub node_id: VertexId,
    /// Gender-compatible with the person asking.
    pub preferred: bool,
}

impl DynamicPositionedGraph {
    // ---- vertex kinds --------------------------------------------------------------------

    pub fn is_valid_id(&self, v: VertexId) -> bool {
        v < self.graph().real_vertex_count()
    }

    pub fn max_node_id(&self) -> Option<VertexId> {
        self.graph().max_real_vertex_id()
    }

    pub fn is_person(&self, v: VertexId) -> bool {
        self.graph().is_person(v)
    }

    pub fn is_relationship(&self, v: VertexId) -> bool {
        self.graph().is_relationship(v)
    }

    pub fn is_placeholder(&self, v: VertexId) -> bool {
        self.graph().is_placeholder(v)
    }

    pub fn is_adopted_in(&self, v: VertexId) -> bool {
        self.graph().is_adopted_in(v)
    }

    pub fn is_adopted_out(&self, v: VertexId) -> bool {
        self.graph().is_adopted_out(v)
    }

    /// Persons with a life status other than alive or deceased (unborn, miscarried, ...).
    pub fn is_fetus(&self, v: VertexId) -> Result<bool> {
        let person = self
            .graph()
            .person(v)
            .ok_or_else(|| Error::precondition("is_fetus", v))?;
        Ok(person
            .life_status
            .is_some_and(|s| !matches!(s, LifeStatus::Alive | LifeStatus::Deceased)))
    }

    pub fn is_childless(&self, v: VertexId) -> Result<bool> {
        if !self.is_person(v) && !self.is_relationship(v) {
            return Err(Error::precondition("is_childless", v));
        }
        Ok(self.graph().is_childless(v))
    }

    /// Whether relationship `v` joins relatives (or is marked so).
    pub fn is_consangr_relationship(&self, v: VertexId) -> Result<bool> {
        let Some(rel) = self.graph().relationship(v) else {
            return Err(Error::precondition("is_consangr_relationship", v));
        };
        Ok(match rel.consanguinity {
            Consanguinity::Yes => true,
            Consanguinity::No => false,
            Consanguinity::Auto => self.dg.ancestors().is_consanguineous(v),
        })
    }

    pub fn properties(&self, v: VertexId) -> Result<&VertexData> {
        if !self.is_valid_id(v) {
            return Err(Error::precondition("properties", v));
        }
        Ok(self.graph().data(v))
    }

    pub fn gender(&self, v: VertexId) -> Result<Gender> {
        self.graph().gender(v)
    }

    pub fn opposite_gender(&self, v: VertexId) -> Result<Gender> {
        self.graph().opposite_gender(v)
    }

    /// Persons in id order, placeholders excluded.
    pub fn all_person_ids(&self) -> Vec<VertexId> {
        (0..self.graph().real_vertex_count())
            .filter(|&v| self.is_person(v) && !self.is_placeholder(v))
            .collect()
    }

    // ---- generations ---------------------------------------------------------------------

    /// 1-based generation number, the topmost generation being 1.
    pub fn generation(&self, v: VertexId) -> Result<usize> {
        if !self.is_valid_id(v) {
            return Err(Error::precondition("generation", v));
        }
        let ranks = self.dg.ranks();
        let min = ranks.iter().copied().min().unwrap_or(1);
        Ok((ranks[v] - min) / 2 + 1)
    }

    /// 1-based position of person `v` among the (non-placeholder) persons of its generation.
    pub fn order_within_generation(&self, v: VertexId) -> Result<usize> {
        if !self.is_person(v) {
            return Err(Error::precondition("order_within_generation", v));
        }
        let order = self.dg.order();
        let row = order.rank(self.dg.ranks()[v]);
        let upto = &row[..=order.position(v)];
        Ok(upto
            .iter()
            .filter(|&&u| self.is_person(u) && !self.is_placeholder(u))
            .count())
    }

    pub fn allow_manual_node_reposition_left(&self, v: VertexId) -> bool {
        self.has_person_neighbour(v, -1)
    }

    pub fn allow_manual_node_reposition_right(&self, v: VertexId) -> bool {
        self.has_person_neighbour(v, 1)
    }

    fn has_person_neighbour(&self, v: VertexId, direction: isize) -> bool {
        if !self.is_person(v) {
            return false;
        }
        let order = self.dg.order();
        self.dg
            .neighbour_person_order(order, self.dg.ranks()[v], order.position(v), direction)
            .is_some()
    }

    // ---- geometry ------------------------------------------------------------------------

    /// Drawing position of a person, relationship or partner-line segment.
    pub fn position(&self, v: VertexId) -> Result<Point> {
        let dg = &self.dg;
        let gg = self.graph();
        if !gg.is_valid_id(v) {
            return Err(Error::precondition("position", v));
        }
        let x = dg.positions()[v];
        let rank = dg.ranks()[v];

        let y = if gg.is_childhub(v) {
            dg.compute_node_y(rank, dg.vertical_levels().child_edge_level(v).unwrap_or(1))
        } else if gg.is_virtual(v) {
            let person = gg.up_the_chain_until_non_virtual(v);
            let rel = gg.down_the_chain_until_non_virtual(v);
            if rank == dg.ranks()[person] {
                let level = dg
                    .vertical_levels()
                    .edge_level(person, rel)
                    .map_or(1, |l| l.vertical_level);
                dg.compute_rel_line_y(rank, 0, level).rel_line_y
            } else if rank == dg.ranks()[rel] {
                self.position(rel)?.y
            } else {
                dg.compute_node_y(rank, 1)
            }
        } else if gg.is_relationship(v) {
            let mut attach = usize::MAX;
            let mut vertical = usize::MAX;
            for partner in gg.parents(v)? {
                let level = dg.vertical_levels().edge_level(partner, v);
                attach = attach.min(level.map_or(0, |l| l.attach_level));
                vertical = vertical.min(level.map_or(0, |l| l.vertical_level));
            }
            dg.compute_rel_line_y(rank, attach, vertical).rel_line_y
        } else {
            dg.compute_node_y(rank, 1)
        };
        Ok(Point { x, y })
    }

    pub fn relationship_childhub_position(&self, v: VertexId) -> Result<Point> {
        let hub = self.graph().relationship_childhub(v)?;
        self.position(hub)
    }

    /// How the line from `person` to relationship `rel` is drawn; a person without a
    /// computed level gets the plain straight line.
    pub fn relationship_line_info(&self, rel: VertexId, person: VertexId) -> Result<RelationshipLineInfo> {
        if !self.is_relationship(rel) {
            return Err(Error::precondition("relationship_line_info", rel));
        }
        if !self.is_person(person) {
            return Err(Error::precondition("relationship_line_info", person));
        }
        let (attach, vertical, ports) = self
            .dg
            .vertical_levels()
            .edge_level(person, rel)
            .map_or((0, 0, 1), |l| (l.attach_level, l.vertical_level, l.num_attach_levels));
        let y = self.dg.compute_rel_line_y(self.dg.ranks()[person], attach, vertical);
        Ok(RelationshipLineInfo {
            attachment_port: attach,
            attach_y: y.attach_y,
            vertical_level: vertical,
            vertical_y: y.rel_line_y,
            num_attach_ports: ports,
        })
    }

    // ---- family ----------------------------------------------------------------------------

    pub fn parent_relationship(&self, v: VertexId) -> Result<Option<VertexId>> {
        self.graph().producing_relationship(v)
    }

    pub fn parents(&self, v: VertexId) -> Result<Vec<VertexId>> {
        self.graph().parents(v)
    }

    pub fn all_relationships(&self, v: VertexId) -> Result<Vec<VertexId>> {
        self.graph().all_relationships(v)
    }

    pub fn all_partners(&self, v: VertexId) -> Result<Vec<VertexId>> {
        self.graph().all_partners(v)
    }

    /// Children of relationship `v`, left to right.
    pub fn relationship_children_sorted_by_order(&self, v: VertexId) -> Result<Vec<VertexId>> {
        let hub = self.graph().relationship_childhub(v)?;
        let mut children = self.graph().out_edges(hub).to_vec();
        self.dg.order().sort_by_order(&mut children);
        Ok(children)
    }

    /// Children of a person (over all its relationships) or of a relationship.
    pub fn all_children(&self, v: VertexId) -> Result<Vec<VertexId>> {
        let gg = self.graph();
        let relationships = if gg.is_person(v) {
            gg.all_relationships(v)?
        } else if gg.is_relationship(v) {
            vec![v]
        } else {
            return Err(Error::precondition("all_children", v));
        };
        let mut children = Vec::new();
        for rel in relationships {
            let hub = gg.relationship_childhub(rel)?;
            children.extend_from_slice(gg.out_edges(hub));
        }
        Ok(children)
    }

    /// Siblings of `v`, `v` itself excluded.
    pub fn all_siblings(&self, v: VertexId) -> Result<Vec<VertexId>> {
        let mut siblings = self.graph().all_siblings_of(v)?;
        siblings.retain(|&u| u != v);
        Ok(siblings)
    }

    pub fn twin_group_id(&self, v: VertexId) -> Option<u32> {
        self.graph().twin_group_id(v)
    }

    /// Twins of `v` (itself included), left to right.
    pub fn all_twins_sorted_by_order(&self, v: VertexId) -> Result<Vec<VertexId>> {
        self.dg.all_twins_sorted_by_order(v)
    }

    /// Last name the children of relationship `v` would get: the father's birth name, or
    /// his current name.
    pub fn relationship_child_last_name(&self, v: VertexId) -> Result<Option<String>> {
        let parents = self.graph().mother_father(v)?;
        let father = parents.father.and_then(|f| self.graph().person(f));
        Ok(father.and_then(|f| f.last_name_at_birth.clone().or_else(|| f.last_name.clone())))
    }

    // ---- candidates for linking --------------------------------------------------------------

    /// Persons that could become children of `v`: those without parents that are not
    /// ancestors of `v`.
    pub fn possible_children_of(&self, v: VertexId) -> Vec<VertexId> {
        let ancestors = self.dg.ancestors();
        (0..self.graph().real_vertex_count())
            .filter(|&u| u != v && self.is_person(u) && self.graph().in_edges(u).is_empty())
            .filter(|&u| !ancestors.is_ancestor(u, v))
            .collect()
    }

    /// Persons that could become siblings of `v`: neither ancestors nor descendants of it,
    /// and without parents of their own when `v` has parents.
    pub fn possible_siblings_of(&self, v: VertexId) -> Vec<VertexId> {
        let ancestors = self.dg.ancestors();
        let has_parents = !self.graph().in_edges(v).is_empty();
        (0..self.graph().real_vertex_count())
            .filter(|&u| u != v && self.is_person(u))
            .filter(|&u| !ancestors.is_ancestor(u, v) && !ancestors.is_ancestor(v, u))
            .filter(|&u| !has_parents || self.graph().in_edges(u).is_empty())
            .collect()
    }

    /// Persons and relationships that could become the parent(s) of `v`: anything that is
    /// not a placeholder and not a descendant of `v`.
    pub fn possible_parents_of(&self, v: VertexId) -> Vec<VertexId> {
        let ancestors = self.dg.ancestors();
        (0..self.graph().real_vertex_count())
            .filter(|&u| u != v && (self.is_person(u) || self.is_relationship(u)))
            .filter(|&u| !self.is_placeholder(u) && !ancestors.is_ancestor(v, u))
            .collect()
    }

    /// Persons that could become partners of `v`. Current partners and fetuses are excluded;
    /// persons of a compatible gender are marked preferred.
    pub fn possible_partners_of(&self, v: VertexId) -> Result<Vec<PossiblePartner>> {
        let gg = self.graph();
        let opposite = gg.opposite_gender(v)?;
        let partners = gg.all_partners(v)?;
        let mut result = Vec::new();
        for u in 0..gg.real_vertex_count() {
            if u == v || !gg.is_person(u) || gg.is_placeholder(u) || partners.contains(&u) {
                continue;
            }
            if self.is_fetus(u)? {
                continue;
            }
            let gender = gg.gender(u)?;
            let preferred = opposite == Gender::Unknown
                || gender == opposite
                || matches!(gender, Gender::Unknown | Gender::Other);
            result.push(PossiblePartner {
                node_id: u,
                preferred,
            });
        }
        Ok(result)
    }

    /// Persons and relationships that would be cut off from the proband if `v` (together
    /// with its relationships, when `v` is a person) were removed; `v` itself included.
    pub fn disconnected_set_if_node_removed(&self, v: VertexId) -> Result<Vec<VertexId>> {
        let gg = self.graph();
        if !gg.is_person(v) && !gg.is_relationship(v) {
            return Err(Error::precondition("disconnected_set_if_node_removed", v));
        }
        let mut gone: HashSet<VertexId> = HashSet::default();
        gone.insert(v);
        if gg.is_person(v) {
            for rel in gg.all_relationships(v)? {
                gone.insert(rel);
                gone.insert(gg.relationship_childhub(rel)?);
            }
        } else {
            gone.insert(gg.relationship_childhub(v)?);
        }

        let start = self.proband().filter(|p| !gone.contains(p)).or_else(|| {
            (0..gg.real_vertex_count())
                .find(|&u| gg.is_person(u) && !gg.is_placeholder(u) && !gone.contains(&u))
        });

        let mut reached: HashSet<VertexId> = HashSet::default();
        if let Some(start) = start {
            let mut queue = VecDeque::from([start]);
            reached.insert(start);
            while let Some(u) = queue.pop_front() {
                for w in gg.all_edges(u) {
                    if !gone.contains(&w) && reached.insert(w) {
                        queue.push_back(w);
                    }
                }
            }
        }

        Ok((0..gg.real_vertex_count())
            .filter(|&u| gg.is_person(u) || gg.is_relationship(u))
            .filter(|u| !reached.contains(u))
            .collect())
    }

    /// Number of separate families; 1 for any pedigree the editor produces.
    pub fn component_count(&self) -> usize {
        alg::components(self.graph()).len()
    }

    /// Convenience for callers building new persons from an existing one.
    pub fn person_properties(&self, v: VertexId) -> Result<&PersonProperties> {
        self.graph()
            .person(v)
            .ok_or_else(|| Error::precondition("person_properties", v))
    }
}
