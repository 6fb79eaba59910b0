//! Placement of a freshly inserted vertex, pushing the rest of the layout out of its way.

use crate::position::{Frame, XCoord};
use crate::positioned::PositionedGraph;
use pedigree_graph::{VertexId, VertexKind};
use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};
use std::collections::VecDeque;

/// How far each vertex was moved so far. The vertex being placed has no entry, which
/// counts as an unbounded move.
#[derive(Debug, Default)]
struct Moves(HashMap<VertexId, f64>);

impl Moves {
    fn get(&self, v: VertexId) -> Option<f64> {
        self.0.get(&v).copied()
    }

    fn of(&self, v: VertexId) -> f64 {
        self.get(v).unwrap_or(f64::INFINITY)
    }

    fn add(&mut self, v: VertexId, amount: f64) {
        *self.0.entry(v).or_insert(0.0) += amount;
    }

    /// `u` already moved at least as far as `v`.
    fn caught_up(&self, u: VertexId, v: VertexId) -> bool {
        self.get(u).is_some_and(|moved| moved >= self.of(v))
    }

    /// How far `u` should follow a move of `v` by `amount`.
    fn follow(&self, u: VertexId, v: VertexId, amount: f64) -> f64 {
        match self.get(u) {
            Some(moved) => amount.min((self.of(v) - moved).max(0.0)),
            None => amount,
        }
    }
}

impl PositionedGraph {
    /// Gives `new` (whose x is still undefined) a position keeping its edge to `align_with`
    /// as straight as possible without moving anything left of it, then shifts every vertex
    /// the insertion disturbs to the right, dragging connected vertices along so the shape
    /// of the layout is preserved.
    ///
    /// Vertices above `new` and everything left of them never move. Child hubs only follow
    /// once all their children moved, and widening prefers to stretch partner lines to the
    /// right of a relationship.
    pub fn place_new_vertex(&mut self, new: VertexId, align_with: VertexId) {
        let positions = std::mem::take(&mut self.positions);
        let frame = Frame::new(&self.gg, &self.ranks, &self.order, &self.options.separations);
        let mut xcoord = XCoord::unchecked(frame, positions);
        self.push_apart(&mut xcoord, new, align_with);
        self.positions = xcoord.into_positions();
    }

    fn push_apart(&self, xcoord: &mut XCoord<'_>, new: VertexId, align_with: VertexId) {
        let gg = &self.gg;
        let new_rank = self.ranks[new];
        let left_boundary = xcoord.left_most_no_disturb_position(new);
        let right_boundary = xcoord.right_most_no_disturb_position(new, false);

        let mut desired = xcoord.x(align_with);
        if align_with != new {
            if self.ranks[align_with] == new_rank {
                let separation = xcoord.frame().separation_by_type(new, align_with);
                if self.order.position(new) > self.order.position(align_with) {
                    desired = xcoord.right_edge(align_with) + separation + gg.half_width(new);
                } else {
                    desired = (xcoord.left_edge(align_with) - separation - gg.half_width(new)).min(right_boundary);
                }
            } else if gg.is_person(new) && desired > right_boundary {
                desired = right_boundary;
            }
        }
        let insert_at = desired.max(left_boundary);
        xcoord.set(new, insert_at);

        let mut disturbed: VecDeque<(VertexId, f64)> = VecDeque::new();
        disturbed.push_back((new, (insert_at - desired).max(0.0)));

        let mut do_not_touch: HashSet<VertexId> = HashSet::default();
        for ancestor in gg.all_ancestors(new) {
            do_not_touch.insert(ancestor);
            let rank = self.ranks[ancestor];
            let order = self.order.position(ancestor);
            do_not_touch.extend(self.order.rank(rank).iter().take(order).copied());
        }

        let tuning = &self.options.tuning;
        let max_movements = self.ranks.len() * tuning.domino_inner_factor;
        let mut moves = Moves::default();
        let mut iterations = 0;

        for _ in 0..tuning.domino_outer_iterations {
            if disturbed.is_empty() {
                break;
            }
            // child hub -> number of its children that moved
            let mut children_moved: HashMap<VertexId, usize> = HashMap::default();

            while iterations < max_movements {
                let Some((v, amount)) = disturbed.pop_front() else {
                    break;
                };
                iterations += 1;

                let rank = self.ranks[v];
                let kind = gg.kind(v);
                let right_most_ok = xcoord.right_most_no_disturb_position(v, false);
                if xcoord.x(v) > right_most_ok {
                    if let Some(right) = self.order.right_neighbour(v, rank) {
                        let push = xcoord.x(v) - right_most_ok;
                        xcoord.shift(right, push);
                        moves.add(right, push);
                        disturbed.push_back((right, push));
                    }
                }

                if v == new && kind != VertexKind::VirtualEdge {
                    continue;
                }

                let in_edges = gg.in_edges(v);
                let mut skip_in_edges = v == new && matches!(kind, VertexKind::Person | VertexKind::VirtualEdge);
                if kind == VertexKind::VirtualEdge && in_edges.first().is_some_and(|&u| self.ranks[u] == rank) {
                    skip_in_edges = true;
                }
                if kind == VertexKind::Relationship {
                    skip_in_edges = true;
                    // A partner known only through this relationship, sitting right next to it,
                    // comes along instead of stretching the line.
                    let v_order = self.order.position(v);
                    let lonely_neighbour = if in_edges.len() == 2 {
                        in_edges.iter().copied().find(|&p| {
                            self.order.position(p) + 1 == v_order
                                && gg.out_edges(p).len() == 1
                                && gg.in_edges(p).is_empty()
                                && !do_not_touch.contains(&p)
                        })
                    } else {
                        None
                    };
                    if let Some(p) = lonely_neighbour {
                        if moves.get(p).is_none_or(|moved| moved < moves.of(v)) {
                            xcoord.shift(p, amount);
                            moves.add(p, amount);
                        }
                    }
                }

                if !skip_in_edges {
                    for &u in in_edges {
                        if do_not_touch.contains(&u) || moves.caught_up(u, v) {
                            continue;
                        }
                        if kind == VertexKind::Person && gg.is_childhub(u) {
                            *children_moved.entry(u).or_insert(0) += 1;
                            continue;
                        }
                        if gg.is_virtual(u) && xcoord.x(u) == xcoord.x(v) {
                            continue;
                        }
                        let shift = moves.follow(u, v, amount);
                        xcoord.shift(u, shift);
                        moves.add(u, shift);
                        disturbed.push_back((u, shift));
                    }
                }

                let out_edges = gg.out_edges(v);
                if kind == VertexKind::ChildHub {
                    let right_most_child = out_edges
                        .iter()
                        .map(|&u| xcoord.x(u))
                        .fold(f64::NEG_INFINITY, f64::max);
                    // no bend is created
                    if right_most_child >= xcoord.x(v) {
                        continue;
                    }
                }

                for &u in out_edges {
                    let mut shift = moves.follow(u, v, amount);
                    if do_not_touch.contains(&u) || moves.caught_up(u, v) {
                        continue;
                    }
                    // same-rank neighbours only move when pushed from the left
                    if self.ranks[u] == rank {
                        continue;
                    }
                    if matches!(kind, VertexKind::Relationship | VertexKind::VirtualEdge) {
                        let diff = xcoord.x(v) - xcoord.x(u);
                        if diff <= 0.0 {
                            continue;
                        }
                        shift = shift.min(diff);
                    }
                    xcoord.shift(u, shift);
                    moves.add(u, shift);
                    disturbed.push_back((u, shift));
                }
            }

            let mut hubs: Vec<(VertexId, usize)> = children_moved.into_iter().collect();
            hubs.sort_unstable();
            for (hub, moved) in hubs {
                if do_not_touch.contains(&hub) {
                    continue;
                }
                let children = gg.out_edges(hub);
                if children.is_empty() || children.len() != moved {
                    continue;
                }
                let mut min_shift = children
                    .iter()
                    .filter_map(|&c| moves.get(c))
                    .fold(f64::INFINITY, f64::min);
                if let Some(hub_moved) = moves.get(hub) {
                    if hub_moved > min_shift {
                        continue;
                    }
                    min_shift -= hub_moved;
                }
                if !min_shift.is_finite() {
                    continue;
                }
                xcoord.shift(hub, min_shift);
                moves.add(hub, min_shift);
                disturbed.push_back((hub, min_shift));
            }
        }

        tracing::trace!(vertex = new, x = xcoord.x(new), iterations, "placed new vertex");
    }
}
