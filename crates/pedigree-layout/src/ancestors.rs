//! Ancestor distances and consanguinity.

use crate::ordering::Ordering;
use pedigree_graph::{BaseGraph, Rank, VertexId};
use rustc_hash::FxHashMap as HashMap;
use std::collections::BTreeSet;

/// For every person and relationship, the distance (in generations) to each of its ancestors,
/// itself included at distance 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ancestors {
    distances: Vec<HashMap<VertexId, usize>>,
    consanguineous: BTreeSet<VertexId>,
}

impl Ancestors {
    /// Walks the ranks top to bottom so that both parents of a vertex are done before it.
    /// Persons first, then relationships, which may share a rank with one of their partners.
    pub fn find(gg: &BaseGraph, order: &Ordering, max_rank: Rank) -> Self {
        let mut result = Self {
            distances: vec![HashMap::default(); gg.num_vertices()],
            consanguineous: BTreeSet::new(),
        };

        for r in 1..=max_rank {
            for &v in order.rank(r) {
                if !gg.is_person(v) {
                    continue;
                }
                result.distances[v].insert(v, 0);
                // Adopted-in persons are not related to the family that adopted them.
                if gg.is_adopted_in(v) {
                    continue;
                }
                let parents = gg.parents(v).unwrap_or_default();
                result.merge_parents(v, &parents);
            }
        }

        for r in 1..=max_rank {
            for &v in order.rank(r) {
                if !gg.is_relationship(v) {
                    continue;
                }
                result.distances[v].insert(v, 0);
                let parents = gg.parents(v).unwrap_or_default();
                if result.merge_parents(v, &parents) {
                    result.consanguineous.insert(v);
                }
            }
        }
        result
    }

    /// Returns whether the parents have an ancestor in common.
    fn merge_parents(&mut self, v: VertexId, parents: &[VertexId]) -> bool {
        let mut common = false;
        for &p in parents {
            let branch: Vec<(VertexId, usize)> = self.distances[p]
                .iter()
                .map(|(&u, &d)| (u, d + 1))
                .collect();
            for (u, d) in branch {
                self.distances[v]
                    .entry(u)
                    .and_modify(|known| {
                        common = true;
                        *known = (*known).min(d);
                    })
                    .or_insert(d);
            }
        }
        common
    }

    /// Ancestors of `v` with their distances; empty for child hubs and segments.
    pub fn of(&self, v: VertexId) -> Option<&HashMap<VertexId, usize>> {
        self.distances.get(v).filter(|m| !m.is_empty())
    }

    pub fn is_ancestor(&self, ancestor: VertexId, of: VertexId) -> bool {
        self.distances
            .get(of)
            .is_some_and(|m| m.contains_key(&ancestor))
    }

    /// Relationships whose partners are blood relatives.
    pub fn consanguineous(&self) -> &BTreeSet<VertexId> {
        &self.consanguineous
    }

    pub fn is_consanguineous(&self, relationship: VertexId) -> bool {
        self.consanguineous.contains(&relationship)
    }
}
