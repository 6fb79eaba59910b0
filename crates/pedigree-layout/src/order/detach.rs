//! Vertices taken out of the graph while the ordering search runs.
//!
//! Each of them has an obvious place once everything else is ordered: a rootless partner goes
//! next to its partner, a leaf sibling goes next to its siblings, a twin goes next to the twin
//! that stood in for its whole group. Leaving them out makes every crossing count cheaper and
//! keeps the search from wasting seeds on them.

use super::Layers;
use crate::options::TuningParameters;
use crate::ordering::{Ordering, UNPLACED};
use pedigree_graph::{BaseGraph, EdgeWeight, LeafAndParentless, Rank, Result, VertexId};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DetachedEdge {
    from: VertexId,
    to: VertexId,
    weight: EdgeWeight,
}

/// Parentless persons whose only relationship is with a person that has parents, keyed by that
/// partner.
#[derive(Debug, Clone, Default)]
pub struct RootlessPartners {
    by_partner: BTreeMap<VertexId, Vec<DetachedEdge>>,
}

impl RootlessPartners {
    pub fn find(gg: &BaseGraph, ranks: &[Rank], info: &LeafAndParentless) -> Self {
        let mut by_partner: BTreeMap<VertexId, Vec<DetachedEdge>> = BTreeMap::new();
        for &v in &info.parentless {
            let &[first] = gg.out_edges(v) else {
                continue;
            };
            let rel = gg.down_the_chain_until_non_virtual(first);
            let Ok(parents) = gg.parents(rel) else {
                continue;
            };
            let other = if parents[0] == v { parents[1] } else { parents[0] };
            // A partner on another rank hangs off a long edge that needs a head to be ordered.
            if ranks[v] != ranks[other] {
                continue;
            }
            if !gg.in_edges(other).is_empty() {
                by_partner.entry(other).or_default().push(DetachedEdge {
                    from: v,
                    to: first,
                    weight: 0,
                });
            }
        }
        Self { by_partner }
    }

    pub fn is_empty(&self) -> bool {
        self.by_partner.is_empty()
    }

    /// Every detached rootless person.
    pub fn vertices(&self) -> BTreeSet<VertexId> {
        self.by_partner
            .values()
            .flat_map(|edges| edges.iter().map(|e| e.from))
            .collect()
    }

    pub fn detach(&mut self, gg: &mut BaseGraph) -> Result<()> {
        for edges in self.by_partner.values_mut() {
            for edge in edges.iter_mut() {
                edge.weight = gg.remove_edge(edge.from, edge.to)?;
            }
        }
        Ok(())
    }

    /// Puts every rootless person back next to its partner, on the side where the partner has
    /// fewer other relationships.
    pub fn reconnect(&self, gg: &mut BaseGraph, ranks: &[Rank], order: &mut Ordering) -> Result<()> {
        for (&p, edges) in &self.by_partner {
            let rank = ranks[p];
            let p_order = order.position(p).min(order.rank_len(rank));

            let mut partners_left = 0;
            let mut partners_right = 0;
            for &rel in gg.out_edges(p) {
                if !gg.is_relationship(rel) {
                    continue;
                }
                if let &[a, b] = gg.in_edges(rel) {
                    let partner = if a == p { b } else { a };
                    let partner_order = order.position(partner);
                    if partner_order != UNPLACED && partner_order > p_order {
                        partners_right += 1;
                    } else {
                        partners_left += 1;
                    }
                }
            }

            for edge in edges {
                gg.add_edge(edge.from, edge.to, edge.weight)?;
                if partners_right <= partners_left {
                    partners_right += 1;
                    order.insert(rank, p_order + 1, edge.from);
                } else {
                    partners_left += 1;
                    order.insert(rank, p_order, edge.from);
                }
            }
        }
        Ok(())
    }
}

/// Childless children of a child hub that has more than one child, keyed by the hub. One leaf
/// per hub always stays so that bottom-up seeds can still move the family around.
#[derive(Debug, Clone, Default)]
pub struct LeafSiblings {
    by_childhub: BTreeMap<VertexId, Vec<DetachedEdge>>,
}

impl LeafSiblings {
    pub fn find(gg: &BaseGraph, info: &LeafAndParentless, fused: &FusedTwins) -> Self {
        let mut by_childhub: BTreeMap<VertexId, Vec<DetachedEdge>> = BTreeMap::new();
        for &v in &info.leaves {
            if fused.is_fused(v) {
                continue;
            }
            let Some(&hub) = gg.in_edges(v).first() else {
                continue;
            };
            if by_childhub.contains_key(&hub) {
                continue;
            }
            let children = gg.out_edges(hub);
            if children.len() > 1 {
                let leaves = children
                    .iter()
                    .filter(|&&c| c != v && gg.out_edges(c).is_empty())
                    .map(|&c| DetachedEdge {
                        from: hub,
                        to: c,
                        weight: 0,
                    })
                    .collect();
                by_childhub.insert(hub, leaves);
            }
        }
        Self { by_childhub }
    }

    pub fn vertices(&self) -> BTreeSet<VertexId> {
        self.by_childhub
            .values()
            .flat_map(|edges| edges.iter().map(|e| e.to))
            .collect()
    }

    pub fn detach(&mut self, gg: &mut BaseGraph) -> Result<()> {
        for edges in self.by_childhub.values_mut() {
            for edge in edges.iter_mut() {
                edge.weight = gg.remove_edge(edge.from, edge.to)?;
            }
        }
        Ok(())
    }

    /// Inserts every leaf at the position of its rank with the fewest crossings, ties broken by
    /// the edge length score.
    pub fn reconnect(
        &self,
        gg: &mut BaseGraph,
        ranks: &[Rank],
        max_rank: Rank,
        tuning: &TuningParameters,
        order: &mut Ordering,
    ) -> Result<()> {
        for edges in self.by_childhub.values() {
            for edge in edges {
                gg.add_edge(edge.from, edge.to, edge.weight)?;
                let layers = Layers::new(gg, ranks, max_rank, tuning);
                let leaf = edge.to;
                let rank = ranks[leaf];
                order.insert(rank, 0, leaf);

                let mut best_order = 0;
                let mut best_crossings = layers.edge_crossing(order, Some(rank), false);
                let mut best_score = layers.edge_length_score(order, Some(rank));

                for o in 0..order.rank_len(rank).saturating_sub(1) {
                    order.exchange(rank, o, o + 1);
                    let crossings = layers.edge_crossing(order, Some(rank), false);
                    let score = layers.edge_length_score(order, Some(rank));
                    if crossings < best_crossings
                        || (crossings == best_crossings && score < best_score)
                    {
                        best_order = o + 1;
                        best_crossings = crossings;
                        best_score = score;
                    }
                }

                order.move_vertex_to_order(rank, order.position(leaf), best_order);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FusedEdge {
    target: VertexId,
    weight: EdgeWeight,
    /// The representative already had an edge to `target` (two twins in one relationship) and
    /// carries the sum of both weights.
    merged: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FusedTwin {
    twin: VertexId,
    childhub: VertexId,
    childhub_weight: EdgeWeight,
    edges: Vec<FusedEdge>,
}

/// Twin groups collapsed onto one representative twin.
///
/// A fused twin keeps its rank but loses every edge: its relationships are attached to the
/// representative instead, so the whole group is ordered as a single person.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FusedTwins {
    groups: BTreeMap<VertexId, Vec<FusedTwin>>,
    fused: BTreeSet<VertexId>,
}

impl FusedTwins {
    pub fn fuse(gg: &mut BaseGraph) -> Result<Self> {
        let mut result = Self::default();
        for v in 0..gg.real_vertex_count() {
            if result.fused.contains(&v) || !gg.is_person(v) || gg.twin_group_id(v).is_none() {
                continue;
            }
            let Some(&childhub) = gg.in_edges(v).first() else {
                continue;
            };

            let mut group = Vec::new();
            for twin in gg.all_twins_of(v)? {
                if twin == v {
                    continue;
                }
                let childhub_weight = gg.remove_edge(childhub, twin)?;
                let mut edges = Vec::new();
                for target in gg.out_edges(twin).to_vec() {
                    let weight = gg.edge_weight(twin, target);
                    let merged = gg.has_edge(v, target);
                    if merged {
                        gg.remove_edge(twin, target)?;
                        let sum = gg.edge_weight(v, target) + weight;
                        gg.set_edge_weight(v, target, sum)?;
                    } else {
                        gg.redirect_in_edge(target, twin, v)?;
                    }
                    edges.push(FusedEdge {
                        target,
                        weight,
                        merged,
                    });
                }
                result.fused.insert(twin);
                group.push(FusedTwin {
                    twin,
                    childhub,
                    childhub_weight,
                    edges,
                });
            }
            if !group.is_empty() {
                tracing::trace!(representative = v, twins = group.len(), "fused twin group");
                result.groups.insert(v, group);
            }
        }
        Ok(result)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn is_fused(&self, v: VertexId) -> bool {
        self.fused.contains(&v)
    }

    /// A segment the representative leads into is about to be unplugged; its place in the
    /// chain is taken by the segment's child.
    pub fn replace_target(&mut self, old: VertexId, new: VertexId) {
        for twin in self.groups.values_mut().flatten() {
            for edge in &mut twin.edges {
                if edge.target == old {
                    edge.target = new;
                }
            }
        }
    }

    /// Renumbers recorded targets after the given (ascending, pre-removal) ids were removed.
    pub fn forget_ids(&mut self, removed: &[VertexId]) {
        let shift = |v: VertexId| v - removed.partition_point(|&r| r < v);
        for twin in self.groups.values_mut().flatten() {
            twin.childhub = shift(twin.childhub);
            for edge in &mut twin.edges {
                edge.target = shift(edge.target);
            }
        }
    }

    /// Representatives in ascending id order, each with its fused twins sorted by how many
    /// edges they had, most first, so that twins without relationships are placed last.
    pub fn groups(&self) -> Vec<(VertexId, Vec<VertexId>)> {
        self.groups
            .iter()
            .map(|(&v, twins)| {
                let mut sorted: Vec<&FusedTwin> = twins.iter().collect();
                sorted.sort_by(|a, b| b.edges.len().cmp(&a.edges.len()));
                (v, sorted.into_iter().map(|t| t.twin).collect())
            })
            .collect()
    }

    /// Gives `twin` its own edges back, taking them from `representative`.
    pub fn restore_edges(
        &self,
        gg: &mut BaseGraph,
        representative: VertexId,
        twin: VertexId,
    ) -> Result<()> {
        let Some(fused) = self
            .groups
            .get(&representative)
            .and_then(|g| g.iter().find(|t| t.twin == twin))
        else {
            return Ok(());
        };
        for edge in &fused.edges {
            if edge.merged {
                let rest = gg.edge_weight(representative, edge.target).saturating_sub(edge.weight);
                gg.set_edge_weight(representative, edge.target, rest)?;
                gg.add_edge(twin, edge.target, edge.weight)?;
            } else {
                gg.redirect_in_edge(edge.target, representative, twin)?;
            }
        }
        Ok(())
    }

    /// Reattaches `twin` to its child hub.
    pub fn restore_childhub_edge(
        &self,
        gg: &mut BaseGraph,
        representative: VertexId,
        twin: VertexId,
    ) -> Result<Option<VertexId>> {
        let Some(fused) = self
            .groups
            .get(&representative)
            .and_then(|g| g.iter().find(|t| t.twin == twin))
        else {
            return Ok(None);
        };
        gg.add_edge(fused.childhub, twin, fused.childhub_weight)?;
        Ok(Some(fused.childhub))
    }
}
