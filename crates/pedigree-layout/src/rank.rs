//! Generation assignment.
//!
//! While the layout is computed every generation occupies three ranks: persons, then
//! relationships, then child hubs (persons of the top generation sit on rank 1). Multi-rank
//! edges are only split after ranking, so the input graph must not contain segment vertices.

use pedigree_graph::{BaseGraph, EdgeWeight, Rank, VertexId};
use std::collections::{BTreeMap, VecDeque};

/// Ranks every vertex of `g`.
///
/// `suggested` holds ranks in the compact output form (persons two ranks apart). When it is
/// consistent with the graph it is converted and reused as is; otherwise the ranks are computed
/// from scratch.
pub fn rank(g: &BaseGraph, suggested: Option<&[Rank]>) -> Vec<Rank> {
    if let Some(suggested) = suggested {
        if let Some(ranks) = init_rank(g, Some(suggested)) {
            return ranks;
        }
        tracing::warn!("suggested ranks are inconsistent with the graph, recomputing");
    }

    let mut ranks = init_rank(g, None).unwrap_or_default();
    lower_ranks(g, &mut ranks);
    ranks
}

/// Topological ranking: a vertex is ranked once all of its parents are, one below the lowest
/// of them.
///
/// Returns `None` only when `suggested` is given and turns out to be inconsistent.
pub fn init_rank(g: &BaseGraph, suggested: Option<&[Rank]>) -> Option<Vec<Rank>> {
    let n = g.num_vertices();
    if n == 0 {
        return Some(Vec::new());
    }

    let mut ranks: Vec<Option<Rank>> = vec![None; n];
    let mut ranked_parents = vec![0usize; n];
    let mut queue: VecDeque<VertexId> = VecDeque::new();

    match suggested {
        Some(suggested) => {
            let min = suggested.iter().copied().min().unwrap_or(0);
            for v in 0..n {
                if g.is_person(v) {
                    let diff = suggested.get(v)?.checked_sub(min)?;
                    if diff % 2 != 0 {
                        return None;
                    }
                    ranks[v] = Some(diff / 2 * 3 + 1);
                }
                if g.is_relationship(v) {
                    queue.push_back(v);
                }
            }
        }
        None => queue.extend(g.leaf_and_parentless_nodes().parentless),
    }

    while let Some(next) = queue.pop_front() {
        let rank = g
            .in_edges(next)
            .iter()
            .filter_map(|&u| ranks[u])
            .map(|r| r + 1)
            .max()
            .unwrap_or(1)
            .max(1);
        ranks[next] = Some(rank);

        for &u in g.out_edges(next) {
            if suggested.is_some() && ranks[u].is_some_and(|ru| ru <= rank) {
                return None;
            }
            ranked_parents[u] += 1;
            if ranked_parents[u] == g.in_edges(u).len() {
                queue.push_back(u);
            }
        }
    }

    // Unreached vertices only exist in graphs with cycles, which `validate` rejects.
    Some(ranks.into_iter().map(|r| r.unwrap_or(1)).collect())
}

#[derive(Debug, Clone, Copy)]
struct OutEdge {
    length: Rank,
    weight: EdgeWeight,
}

/// Moves parentless vertices as far down as their out-edges allow.
///
/// Flood-fills components joined by single-rank edges, then pushes the component owning the
/// heaviest (and among those the shortest) outgoing multi-rank edge down until that edge spans
/// one rank. Repeats until a single component remains.
pub fn lower_ranks(g: &BaseGraph, ranks: &mut [Rank]) {
    let n = g.num_vertices();
    if n <= 1 {
        return;
    }

    loop {
        let mut color: Vec<Option<usize>> = vec![None; n];
        let mut components: Vec<Vec<VertexId>> = Vec::new();
        let mut min_out: Vec<Option<OutEdge>> = Vec::new();

        for start in 0..n {
            if color[start].is_some() {
                continue;
            }
            let current = components.len();
            let mut members = Vec::new();
            let mut long_edges: BTreeMap<VertexId, OutEdge> = BTreeMap::new();
            let mut queue = VecDeque::from([start]);

            while let Some(v) = queue.pop_front() {
                if color[v].is_some() {
                    continue;
                }
                color[v] = Some(current);
                members.push(v);

                let rank_v = ranks[v];
                let neighbours = g
                    .out_edges(v)
                    .iter()
                    .map(|&u| (u, true))
                    .chain(g.in_edges(v).iter().map(|&u| (u, false)));
                for (u, outgoing) in neighbours {
                    if color[u] == Some(current) {
                        continue;
                    }
                    let length = rank_v.abs_diff(ranks[u]);
                    if length == 1 {
                        if color[u].is_none() {
                            queue.push_back(u);
                        }
                    } else if outgoing {
                        let weight = g.edge_weight(v, u);
                        long_edges.insert(u, OutEdge { length, weight });
                    }
                }
            }

            let mut best: Option<OutEdge> = None;
            for (&u, &edge) in &long_edges {
                if color[u] == Some(current) {
                    continue;
                }
                let better = match best {
                    None => true,
                    Some(b) => {
                        edge.length < b.length || (edge.length == b.length && edge.weight > b.weight)
                    }
                };
                if better {
                    best = Some(edge);
                }
            }

            components.push(members);
            min_out.push(best);
        }

        if components.len() == 1 {
            return;
        }

        // Always lower the source component: every in-edge of one component is an out-edge of
        // another, and this keeps ranks non-negative.
        let weight = |c: usize| min_out[c].map_or(0, |e| e.weight);
        let length = |c: usize| min_out[c].map_or(Rank::MAX, |e| e.length);
        let mut chosen = 0;
        for c in 1..components.len() {
            if weight(c) > weight(chosen) || (weight(c) == weight(chosen) && length(c) < length(chosen))
            {
                chosen = c;
            }
        }

        let Some(edge) = min_out[chosen] else {
            // Components without any outgoing long edge cannot be merged further.
            tracing::warn!(components = components.len(), "rank lowering stopped early");
            return;
        };
        for &v in &components[chosen] {
            ranks[v] += edge.length - 1;
        }
    }
}
