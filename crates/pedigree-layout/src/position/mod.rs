//! Horizontal placement.
//!
//! Starts from every rank packed to the left and repeatedly shifts vertices right towards the
//! median of their neighbours, keeping a shift only when it lowers the weighted edge length.
//! Long edges are then straightened where the neighbours leave room for it.

mod xcoord;

pub use xcoord::{Frame, XCoord};

use crate::options::LayoutOptions;
use crate::ordering::Ordering;
use pedigree_graph::{BaseGraph, Rank, VertexId};

/// Restricts scoring to the edges that a shift of one vertex can affect.
#[derive(Debug, Clone, Copy)]
pub struct ScoreScope {
    pub rank: Rank,
    pub edges_from_above: bool,
    pub edges_to_below: bool,
    pub from_order: usize,
}

/// Weighted edge length of a placement plus the tie-breakers used to compare two of them.
#[derive(Debug, Clone, PartialEq)]
pub struct XCoordScore {
    score: f64,
    in_edge_max_len: Vec<f64>,
    max_real_vertex_id: Option<VertexId>,
    num_straight_long: usize,
}

impl XCoordScore {
    pub fn new(num_vertices: usize, max_real_vertex_id: Option<VertexId>) -> Self {
        Self {
            score: 0.0,
            in_edge_max_len: vec![0.0; num_vertices],
            max_real_vertex_id,
            num_straight_long: 0,
        }
    }

    fn is_segment(&self, v: VertexId) -> bool {
        self.max_real_vertex_id.is_none_or(|max| v > max)
    }

    pub fn add(&mut self, amount: f64) {
        self.score += amount;
    }

    /// Records the horizontal length of the edge `v -> u`.
    pub fn add_edge(&mut self, v: VertexId, u: VertexId, mut length: f64) {
        if self.is_segment(u) {
            if length == 0.0 && self.is_segment(v) {
                self.num_straight_long += 1;
            }
            length /= 2.0;
        }
        if self.in_edge_max_len[u] < length {
            self.in_edge_max_len[u] = length;
        }
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn num_straight_long(&self) -> usize {
        self.num_straight_long
    }

    pub fn is_better_than(&self, other: &XCoordScore) -> bool {
        if self.score != other.score {
            return self.score < other.score;
        }
        if self.num_straight_long != other.num_straight_long {
            return self.num_straight_long > other.num_straight_long;
        }
        let sum = |s: &XCoordScore| s.in_edge_max_len.iter().sum::<f64>();
        let max = |s: &XCoordScore| s.in_edge_max_len.iter().copied().fold(0.0, f64::max);
        let (mine, theirs) = (sum(self), sum(other));
        if mine == theirs {
            return max(self) < max(other);
        }
        mine < theirs
    }
}

/// Computes x-coordinates for an ordered graph.
#[derive(Debug, Clone, Copy)]
pub struct Positioner<'a> {
    frame: Frame<'a>,
    max_rank: Rank,
    options: &'a LayoutOptions,
}

impl<'a> Positioner<'a> {
    pub fn new(
        gg: &'a BaseGraph,
        ranks: &'a [Rank],
        max_rank: Rank,
        order: &'a Ordering,
        options: &'a LayoutOptions,
    ) -> Self {
        Self {
            frame: Frame::new(gg, ranks, order, &options.separations),
            max_rank,
            options,
        }
    }

    pub fn frame(&self) -> Frame<'a> {
        self.frame
    }

    /// Whether the given coordinates keep every pair of neighbours far enough apart.
    pub fn validate_positions(&self, positions: &[f64]) -> bool {
        positions.len() == self.frame.gg.num_vertices()
            && XCoord::with_positions(self.frame, positions.to_vec()).is_ok()
    }

    pub fn position(&self) -> Vec<f64> {
        let long_edges = self.find_long_edges();

        let mut xcoord = XCoord::init(self.frame);
        self.try_shift_right(&mut xcoord, true, false);
        self.try_shift_right(&mut xcoord, false, true);
        xcoord.normalize();

        let mut best = xcoord.clone();
        let mut best_score = self.xcoord_score(best.positions(), None);

        for iteration in 0..=self.options.max_xcoord_iterations {
            self.try_shift_right(&mut xcoord, true, true);
            self.try_straighten_long_edges(&long_edges, &mut xcoord);
            xcoord.normalize();

            let score = self.xcoord_score(xcoord.positions(), None);
            if !score.is_better_than(&best_score) {
                tracing::trace!(iteration, score = best_score.score(), "placement converged");
                break;
            }
            best = xcoord.clone();
            best_score = score;
        }
        best.into_positions()
    }

    /// How much straightening an edge is worth: segments of long edges matter most, edges
    /// into relationships least.
    pub fn edge_importance_to_straighten(&self, from: VertexId, to: VertexId) -> f64 {
        let gg = self.frame.gg;
        if gg.is_relationship(to) {
            return 1.0;
        }
        if !gg.is_virtual(from) && gg.is_virtual(to) {
            return 1.5;
        }
        if gg.is_relationship(from) {
            return 8.0;
        }
        if gg.is_virtual(from) {
            if gg.is_virtual(to) {
                return 16.0;
            }
            return 4.0;
        }
        2.0
    }

    fn edge_weight(&self, from: VertexId, to: VertexId) -> f64 {
        if self.options.xcoord_edge_weight_value {
            f64::from(self.frame.gg.edge_weight(from, to))
        } else {
            1.0
        }
    }

    pub fn xcoord_score(&self, x: &[f64], scope: Option<ScoreScope>) -> XCoordScore {
        let gg = self.frame.gg;
        let order = self.frame.order;
        let ranks = self.frame.ranks;
        let mut score = XCoordScore::new(gg.num_vertices(), gg.max_real_vertex_id());

        let (from_rank, to_rank) = match scope {
            None => (1, self.max_rank),
            Some(s) if s.edges_from_above => (s.rank.saturating_sub(1).max(1), s.rank),
            Some(s) => (s.rank, s.rank),
        };

        for r in from_rank..=to_rank {
            let from_order = match scope {
                Some(s) if s.rank == r => s.from_order,
                _ => 0,
            };
            for &v in order.rank(r).iter().skip(from_order) {
                for &u in gg.out_edges(v) {
                    if let Some(s) = scope {
                        if !s.edges_to_below && ranks[u] != s.rank {
                            continue;
                        }
                        if ranks[u] == s.rank && order.position(u) < s.from_order {
                            continue;
                        }
                    }
                    let distance = (x[v] - x[u]).abs();
                    let weight = self.edge_importance_to_straighten(v, u) * self.edge_weight(v, u);
                    score.add(weight * distance);
                    score.add_edge(v, u, distance);
                }
            }
        }
        score
    }

    /// Where the neighbours of `v` would like it to be. Edges vote in proportion to their
    /// weight; the upper median wins when both sides have an opinion.
    pub fn compute_median(
        &self,
        v: VertexId,
        xcoord: &XCoord<'_>,
        consider_above: bool,
        consider_below: bool,
    ) -> Option<f64> {
        let gg = self.frame.gg;
        let ranks = self.frame.ranks;

        let mut above = Vec::new();
        let mut below = Vec::new();
        let neighbours = gg
            .out_edges(v)
            .iter()
            .map(|&u| (u, self.edge_importance_to_straighten(v, u) * self.edge_weight(v, u)))
            .chain(
                gg.in_edges(v)
                    .iter()
                    .map(|&u| (u, self.edge_importance_to_straighten(u, v) * self.edge_weight(u, v))),
            );
        for (u, weight) in neighbours {
            if u == v {
                continue;
            }
            let votes = weight.ceil().max(0.0) as usize;
            for _ in 0..votes {
                if ranks[u] <= ranks[v] {
                    above.push(xcoord.x(u));
                }
                if ranks[u] >= ranks[v] {
                    below.push(xcoord.x(u));
                }
            }
        }

        let is_virtual = gg.is_virtual(v);
        let median_above = (consider_above || is_virtual)
            .then(|| median_of(&mut above))
            .flatten();
        let median_below = (consider_below || is_virtual)
            .then(|| median_of(&mut below))
            .flatten();

        let median = match (median_above, median_below) {
            (Some(a), Some(b)) => a.max(b),
            (a, b) => a.or(b)?,
        };
        Some(median.ceil())
    }

    pub fn try_shift_right(&self, xcoord: &mut XCoord<'_>, shift_to_below: bool, shift_to_above: bool) {
        let order = self.frame.order;
        let max_rank = self.max_rank;

        for rr in 0..=max_rank {
            let r = if shift_to_above { rr } else { max_rank - rr };
            if r == 0 {
                continue;
            }
            let consider_below = (shift_to_below || r == 1) && r != max_rank;
            let consider_above = (shift_to_above || r == max_rank) && r != 1;

            for i in (0..order.rank_len(r)).rev() {
                let v = order.rank(r)[i];

                let median = self
                    .compute_median(v, xcoord, consider_above, consider_below)
                    .unwrap_or_else(|| xcoord.x(v));
                let max_shift = median - xcoord.x(v);
                if max_shift <= 0.0 {
                    continue;
                }
                let no_disturb = xcoord.right_most_no_disturb_position(v, false);
                let max_safe_shift = if no_disturb < median {
                    no_disturb - xcoord.x(v)
                } else {
                    max_shift
                };

                let scope = ScoreScope {
                    rank: r,
                    edges_from_above: shift_to_above,
                    edges_to_below: shift_to_below,
                    from_order: i,
                };
                let mut best_shift = 0.0;
                let mut best_score = self.xcoord_score(xcoord.positions(), Some(scope));
                let mut shift = max_shift;
                loop {
                    let score = if shift <= max_safe_shift {
                        xcoord.shift(v, shift);
                        let score = self.xcoord_score(xcoord.positions(), Some(scope));
                        xcoord.shift(v, -shift);
                        score
                    } else {
                        let mut trial = xcoord.clone();
                        trial.shift_right_and_shift_other_if_necessary(v, shift);
                        self.xcoord_score(trial.positions(), Some(scope))
                    };
                    if score.is_better_than(&best_score) {
                        best_shift = shift;
                        best_score = score;
                    }
                    shift -= 1.0;
                    if shift < max_safe_shift.max(0.0) {
                        break;
                    }
                }

                if best_shift > 0.0 {
                    xcoord.shift_right_and_shift_other_if_necessary(v, best_shift);
                }
            }
        }
    }

    /// Chains of segments for every long edge, top to bottom.
    pub fn find_long_edges(&self) -> Vec<Vec<VertexId>> {
        let gg = self.frame.gg;
        let ranks = self.frame.ranks;
        let first_segment = gg.max_real_vertex_id().map_or(0, |max| max + 1);

        let mut checked = vec![false; gg.num_vertices()];
        let mut chains = Vec::new();
        for v in first_segment..gg.num_vertices() {
            if checked[v] || ranks[v] == 0 || !gg.is_virtual(v) {
                continue;
            }
            let mut head = v;
            while let Some(&up) = gg.in_edges(head).first() {
                if !gg.is_virtual(up) {
                    break;
                }
                head = up;
            }
            let mut chain = Vec::new();
            let mut next = head;
            while gg.is_virtual(next) {
                checked[next] = true;
                chain.push(next);
                match gg.out_edges(next).first() {
                    Some(&down) => next = down,
                    None => break,
                }
            }
            chains.push(chain);
        }
        chains
    }

    /// Lines up the segments of each long edge with its head or tail where the neighbours
    /// leave room. Returns whether anything moved.
    pub fn try_straighten_long_edges(&self, long_edges: &[Vec<VertexId>], xcoord: &mut XCoord<'_>) -> bool {
        let mut improved = false;
        for chain in long_edges {
            let Some(&head) = chain.first() else {
                continue;
            };
            improved |= straighten_from(xcoord, chain.iter().copied(), head);
            let tail = chain[chain.len() - 1];
            improved |= straighten_from(xcoord, chain.iter().rev().copied(), tail);
        }
        improved
    }
}

/// Walks the chain away from `start`, pulling every segment seen so far onto the next
/// segment's x whenever that x fits inside the corridor they all share.
fn straighten_from(
    xcoord: &mut XCoord<'_>,
    chain: impl Iterator<Item = VertexId>,
    start: VertexId,
) -> bool {
    let mut improved = false;
    let mut corridor_left = xcoord.left_most_no_disturb_position(start);
    let mut corridor_right = xcoord.right_most_no_disturb_position(start, false);
    let mut done: Vec<VertexId> = Vec::new();

    for v in chain {
        if done.is_empty() {
            done.push(v);
            continue;
        }
        let current = xcoord.x(done[0]);
        let target = xcoord.x(v);
        if target != current {
            if target < corridor_left || target > corridor_right {
                break;
            }
            for &u in &done {
                xcoord.set(u, target);
            }
            improved = true;
        }
        corridor_left = corridor_left.max(xcoord.left_most_no_disturb_position(v));
        corridor_right = corridor_right.min(xcoord.right_most_no_disturb_position(v, false));
        if corridor_left > corridor_right {
            break;
        }
        done.push(v);
    }
    improved
}

fn median_of(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let middle = values.len().div_ceil(2).min(values.len() - 1);
    if values.len() % 2 == 0 {
        Some(((values[middle] + values[middle - 1]) / 2.0).floor())
    } else {
        Some(values[middle])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_picks_upper_middle_for_odd_lists() {
        assert_eq!(median_of(&mut [5.0, 1.0, 3.0]), Some(5.0));
        assert_eq!(median_of(&mut [7.0]), Some(7.0));
    }

    #[test]
    fn median_floors_the_mean_for_even_lists() {
        assert_eq!(median_of(&mut [1.0, 4.0]), Some(2.0));
        assert_eq!(median_of(&mut []), None);
    }

    #[test]
    fn more_straight_long_edges_win_a_tie() {
        let mut a = XCoordScore::new(4, Some(1));
        let mut b = XCoordScore::new(4, Some(1));
        a.add(10.0);
        b.add(10.0);
        a.add_edge(2, 3, 0.0);
        b.add_edge(2, 3, 4.0);
        assert!(a.is_better_than(&b));
        assert!(!b.is_better_than(&a));
    }

    #[test]
    fn lower_score_wins() {
        let mut a = XCoordScore::new(2, Some(1));
        let mut b = XCoordScore::new(2, Some(1));
        a.add(3.0);
        b.add(4.0);
        assert!(a.is_better_than(&b));
    }
}
