//! What an edit changed, in the terms a renderer needs.

use crate::positioned::PositionedGraph;
use crate::vertical::VerticalLevels;
use pedigree_graph::{Rank, Result, VertexId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Vertices a renderer has to (re)draw after an edit.
///
/// All ids refer to the graph *after* the edit, except `removed`, which lists ids as they
/// were before it. `changed_id_set` maps old ids to new ones when a removal shifted them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub new: Vec<VertexId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub moved: Vec<VertexId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed: Vec<VertexId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub animate: Vec<VertexId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub highlight: Vec<VertexId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub makevisible: Vec<VertexId>,
    #[serde(rename = "changedIDSet", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub changed_id_set: BTreeMap<VertexId, VertexId>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.new.is_empty()
            && self.moved.is_empty()
            && self.removed.is_empty()
            && self.animate.is_empty()
            && self.highlight.is_empty()
            && self.makevisible.is_empty()
            && self.changed_id_set.is_empty()
    }
}

pub(crate) fn push_unique(list: &mut Vec<VertexId>, v: VertexId) {
    if !list.contains(&v) {
        list.push(v);
    }
}

/// Layout state captured before an edit, compared against afterwards to find what moved.
#[derive(Debug, Clone)]
pub(crate) struct Snapshot {
    pub(crate) max_real_id: Option<VertexId>,
    pub(crate) positions: Vec<f64>,
    pub(crate) ranks: Vec<Rank>,
    pub(crate) vertical: VerticalLevels,
    pub(crate) rank_y: Vec<f64>,
    pub(crate) consanguineous: BTreeSet<VertexId>,
}

impl Snapshot {
    pub(crate) fn capture(dg: &PositionedGraph) -> Self {
        Self {
            max_real_id: dg.gg.max_real_vertex_id(),
            positions: dg.positions.clone(),
            ranks: dg.ranks.clone(),
            vertical: dg.vertical.clone(),
            rank_y: dg.rank_y.clone(),
            consanguineous: dg.ancestors.consanguineous().clone(),
        }
    }
}

impl PositionedGraph {
    /// Persons and relationships that existed in `before` and have to be redrawn now.
    ///
    /// Only valid when the edit added vertices: real ids up to the old maximum keep their
    /// meaning. When the whole drawing moved right (something was inserted left of
    /// everything) positions are first shifted back so the old leftmost vertex stays put.
    /// `fast_check` skips the partner-line segment test, for edits that never touch edges.
    pub(crate) fn find_moved_nodes(&mut self, before: &Snapshot, fast_check: bool) -> Result<Vec<VertexId>> {
        let Some(max_old) = before.max_real_id else {
            return Ok(Vec::new());
        };
        self.normalize_against(before);

        let max_real = self.gg.max_real_vertex_id().unwrap_or(0);
        let mut result = BTreeSet::new();

        for v in 0..=max_old.min(self.gg.num_vertices().saturating_sub(1)) {
            if !self.gg.is_person(v) && !self.gg.is_relationship(v) {
                continue;
            }
            let rank = self.ranks[v];
            let y_before = before.ranks.get(v).and_then(|&r| before.rank_y.get(r));
            if y_before != self.rank_y.get(rank) || before.positions.get(v) != Some(&self.positions[v]) {
                self.add_node_and_associated_relationships(v, &mut result, max_old);
                continue;
            }
            if !self.gg.is_relationship(v) {
                continue;
            }

            if before.consanguineous.contains(&v) != self.ancestors.is_consanguineous(v) {
                result.insert(v);
                continue;
            }
            // long partner lines are redrawn whenever anything nearby may have moved
            if !fast_check && self.gg.in_edges(v).iter().any(|&u| u > max_real) {
                result.insert(v);
                continue;
            }

            let partners = self.gg.parents(v)?;
            let level_changed = partners.iter().all(|&p| before.vertical.edge_level(p, v).is_some())
                && partners.iter().any(|&p| {
                    let old = before.vertical.edge_level(p, v).map(|l| l.vertical_level);
                    let new = self.vertical.edge_level(p, v).map(|l| l.vertical_level);
                    old != new
                });
            if level_changed {
                result.insert(v);
                continue;
            }

            let hub = self.gg.relationship_childhub(v)?;
            if let Some(old) = before.vertical.child_edge_level(hub) {
                if self.vertical.child_edge_level(hub) != Some(old) {
                    result.insert(v);
                }
            }
        }

        // Segments whose rank moved vertically drag their relationship along.
        for v in self.gg.real_vertex_count()..self.gg.num_vertices() {
            let rank = self.ranks[v];
            let changed = before
                .rank_y
                .get(rank)
                .is_some_and(|&y| self.rank_y.get(rank) != Some(&y));
            if changed {
                let rel = self.gg.down_the_chain_until_non_virtual(v);
                if rel <= max_old {
                    result.insert(rel);
                }
            }
        }

        Ok(result.into_iter().collect())
    }

    pub(crate) fn normalize_against(&mut self, before: &Snapshot) {
        let old_min = before.positions.iter().copied().fold(f64::INFINITY, f64::min);
        let new_min = self.positions.iter().copied().fold(f64::INFINITY, f64::min);
        if !new_min.is_finite() || new_min <= old_min {
            return;
        }
        let Some(mut anchor) = before.positions.iter().position(|&x| x == old_min) else {
            return;
        };
        // a segment id moved up by the number of real vertices added since
        if let (Some(old_max), Some(new_max)) = (before.max_real_id, self.gg.max_real_vertex_id()) {
            if anchor > old_max {
                anchor += new_max.saturating_sub(old_max);
            }
        }
        let Some(&now) = self.positions.get(anchor) else {
            return;
        };
        let shift = now - old_min;
        for x in &mut self.positions {
            *x -= shift;
        }
    }

    fn add_node_and_associated_relationships(
        &self,
        v: VertexId,
        into: &mut BTreeSet<VertexId>,
        max_old: VertexId,
    ) {
        into.insert(v);
        if !self.gg.is_person(v) {
            return;
        }
        if let Some(&hub) = self.gg.in_edges(v).first() {
            if let Some(&rel) = self.gg.in_edges(hub).first() {
                if rel <= max_old {
                    into.insert(rel);
                }
            }
        }
        into.extend(self.gg.out_edges(v).iter().copied().filter(|&u| u <= max_old));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::{PedImportOptions, from_ped};
    use crate::options::LayoutOptions;

    /// The founder couple's relationship is 8.
    fn three_generations() -> PositionedGraph {
        let input = "fam gc 0 c1 1 2\nfam f 0 0 1 1\nfam m 0 0 2 1\nfam c1 f m 2 1\nfam c2 f m 1 1\n";
        let imported = from_ped(input, &PedImportOptions::default()).unwrap();
        PositionedGraph::new(imported.graph, Some(imported.proband), LayoutOptions::default(), None).unwrap()
    }

    #[test]
    fn lost_consanguinity_is_redrawn() {
        let mut dg = three_generations();
        let mut before = Snapshot::capture(&dg);
        assert!(!dg.ancestors.is_consanguineous(8));
        assert!(dg.find_moved_nodes(&before, true).unwrap().is_empty());

        before.consanguineous.insert(8);
        assert_eq!(dg.find_moved_nodes(&before, true).unwrap(), vec![8]);
    }

    #[test]
    fn empty_sets_are_not_serialized() {
        let changes = ChangeSet {
            new: vec![3],
            changed_id_set: [(4, 3)].into_iter().collect(),
            ..Default::default()
        };
        let json = serde_json::to_value(&changes).unwrap();
        assert_eq!(json, serde_json::json!({"new": [3], "changedIDSet": {"4": 3}}));
        assert!(!changes.is_empty());
        assert!(ChangeSet::default().is_empty());
    }

    #[test]
    fn push_unique_keeps_first_occurrence() {
        let mut list = vec![1, 2];
        push_unique(&mut list, 2);
        push_unique(&mut list, 5);
        assert_eq!(list, vec![1, 2, 5]);
    }
}
