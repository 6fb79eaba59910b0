//! Vertical levels of horizontal connector lines.
//!
//! Between two ranks there may be many horizontal lines: the sibling line under every child
//! hub, and the partner lines leaving a person towards its relationships. Each line gets a
//! discrete level so that overlapping lines are drawn at different heights with as few
//! crossings as possible; the number of levels used on a rank later stretches that rank
//! vertically.

mod optimizer;

pub use optimizer::{PairScore, VerticalPosIntOptimizer};

use crate::order::Layers;
use crate::ordering::Ordering;
use pedigree_graph::{Rank, VertexId};
use rustc_hash::FxHashMap as HashMap;

/// Where the line from a person to one of its relationships attaches and runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeLevel {
    /// Port on the person's side, 0 being the one closest to the vertical centre.
    pub attach_level: usize,
    pub vertical_level: usize,
    /// Number of partner lines leaving the person on the same side.
    pub num_attach_levels: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VerticalLevels {
    /// Number of parallel horizontal lines needed between rank `r` and rank `r + 1`.
    pub rank_vertical_levels: Vec<usize>,
    /// Level of the sibling line under each child hub; 0 when the line is a straight drop.
    pub child_edge_level: HashMap<VertexId, usize>,
    /// `person -> relationship -> level` for every partner line on the person's own rank.
    pub out_edge_vertical_level: HashMap<VertexId, HashMap<VertexId, EdgeLevel>>,
}

impl VerticalLevels {
    pub fn rank_levels(&self, rank: Rank) -> usize {
        self.rank_vertical_levels.get(rank).copied().unwrap_or(1)
    }

    pub fn child_edge_level(&self, childhub: VertexId) -> Option<usize> {
        self.child_edge_level.get(&childhub).copied()
    }

    pub fn edge_level(&self, person: VertexId, relationship: VertexId) -> Option<EdgeLevel> {
        self.out_edge_vertical_level
            .get(&person)
            .and_then(|m| m.get(&relationship))
            .copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone)]
struct SiblingLine {
    childhub: VertexId,
    top_x: f64,
    left_x: f64,
    right_x: f64,
    child_xs: Vec<f64>,
    need_topmost: bool,
}

#[derive(Debug, Clone)]
struct PartnerLine {
    v: VertexId,
    u: VertexId,
    left_x: f64,
    right_x: f64,
    down_x: f64,
    top_x: f64,
    over: Vec<VertexId>,
    side: Side,
    attach_level: usize,
    complement: Option<usize>,
}

impl Layers<'_> {
    /// Out-edges of `v` that stay on its rank, split by side and sorted by distance from `v`.
    pub fn left_and_right_partners(
        &self,
        order: &Ordering,
        v: VertexId,
    ) -> (Vec<VertexId>, Vec<VertexId>) {
        let rank = self.ranks[v];
        let order_v = order.position(v);
        let (mut left, mut right): (Vec<VertexId>, Vec<VertexId>) = self
            .gg
            .out_edges(v)
            .iter()
            .copied()
            .filter(|&rel| self.ranks[rel] == rank)
            .partition(|&rel| order.position(rel) < order_v);

        let distance = |a: &VertexId| order.position(*a).abs_diff(order_v);
        left.sort_by_key(distance);
        right.sort_by_key(distance);
        (left, right)
    }

    /// Assigns levels to every sibling line and partner line.
    pub fn position_vertically(&self, order: &Ordering, positions: &[f64]) -> VerticalLevels {
        let mut levels = VerticalLevels {
            rank_vertical_levels: vec![1; self.max_rank + 1],
            ..Default::default()
        };
        if self.gg.num_vertices() <= 1 {
            return levels;
        }

        let mut r = 2;
        while r <= self.max_rank {
            self.position_sibling_lines(order, positions, r, &mut levels);
            r += 2;
        }
        for r in 1..=self.max_rank {
            self.position_partner_lines(order, positions, r, &mut levels);
        }
        levels
    }

    fn position_sibling_lines(
        &self,
        order: &Ordering,
        positions: &[f64],
        r: Rank,
        levels: &mut VerticalLevels,
    ) {
        let mut lines: Vec<SiblingLine> = Vec::new();

        for &v in order.rank(r) {
            if !self.gg.is_childhub(v) {
                continue;
            }
            let Some(&relationship) = self.gg.in_edges(v).first() else {
                continue;
            };
            let top_x = positions[relationship];
            let children = self.gg.out_edges(v);
            let child_xs: Vec<f64> = children.iter().map(|&c| positions[c]).collect();
            let left_x = child_xs.iter().copied().fold(top_x, f64::min);
            let right_x = child_xs.iter().copied().fold(top_x, f64::max);

            if left_x == right_x {
                levels.child_edge_level.insert(v, 0);
                continue;
            }
            // A lone child at either end of its rank, with the parents further in, looks best
            // with its line on top.
            let need_topmost = match children {
                &[child] => {
                    let child_rank = self.ranks[child];
                    let at_left = order.position(child) == 0 && top_x > positions[child];
                    let at_right = order.position(child) + 1 == order.rank_len(child_rank)
                        && top_x < positions[child];
                    at_left || at_right
                }
                _ => false,
            };
            lines.push(SiblingLine {
                childhub: v,
                top_x,
                left_x,
                right_x,
                child_xs,
                need_topmost,
            });
        }

        let score = |e1: usize, e2: usize, l1: usize, l2: usize, _: Option<&[usize]>| {
            let (a, b) = (&lines[e1], &lines[e2]);
            if a.right_x < b.left_x || a.left_x > b.right_x {
                return 0.0;
            }
            if l1 == l2 {
                return f64::INFINITY;
            }
            let (low, high) = if l1 < l2 { (a, b) } else { (b, a) };
            let mut intersections = 0.0;
            if high.top_x >= low.left_x && high.top_x <= low.right_x {
                intersections += 1.0;
            }
            for &x in &low.child_xs {
                if x >= high.left_x && x <= high.right_x {
                    intersections += 1.0;
                }
            }
            if high.need_topmost {
                intersections += 0.1;
            }
            intersections
        };

        let mut optimizer = VerticalPosIntOptimizer::new(score, vec![1; lines.len()], None);
        let result = optimizer.compute_vertical_positions(
            self.tuning.exhaustive_search_edges,
            self.tuning.childhub_annealing_steps,
        );
        for (line, level) in lines.iter().zip(result) {
            levels.child_edge_level.insert(line.childhub, level);
            if level > levels.rank_vertical_levels[r] {
                levels.rank_vertical_levels[r] = level;
            }
        }
    }

    fn position_partner_lines(
        &self,
        order: &Ordering,
        positions: &[f64],
        r: Rank,
        levels: &mut VerticalLevels,
    ) {
        let mut num_levels = 1;
        let mut lines: Vec<PartnerLine> = Vec::new();
        let mut init_levels: Vec<usize> = Vec::new();
        let mut by_relationship: HashMap<VertexId, Vec<usize>> = HashMap::default();

        for &v in order.rank(r) {
            if !self.gg.is_person(v) || self.gg.out_edges(v).is_empty() {
                continue;
            }
            let (left, right) = self.left_and_right_partners(order, v);
            let person_levels = levels.out_edge_vertical_level.entry(v).or_default();

            for (side, edges) in [(Side::Left, left), (Side::Right, right)] {
                let mut next_port = 0;
                let mut next_level = 0;
                for &dest in &edges {
                    let u = self.gg.down_the_chain_until_non_virtual(dest);
                    let (lo, hi) = {
                        let (a, b) = (order.position(dest), order.position(v));
                        (a.min(b) + 1, a.max(b))
                    };
                    let mut min_level = if lo == hi { 0 } else { 1 };
                    let mut other_virtual_edge = false;
                    let mut over = Vec::new();
                    for o in lo..hi {
                        let Some(w) = order.vertex_at(r, o) else {
                            continue;
                        };
                        if self.gg.is_placeholder(w) {
                            continue;
                        }
                        if self.gg.is_relationship(w) {
                            min_level = min_level.max(2);
                        }
                        if self.gg.is_person(w) {
                            min_level = min_level.max(3);
                        }
                        if self.gg.is_virtual(w) && self.gg.in_edges(w).first() != Some(&v) {
                            other_virtual_edge = true;
                        }
                        over.push(w);
                    }
                    next_level = next_level.max(min_level);
                    person_levels.insert(
                        u,
                        EdgeLevel {
                            attach_level: next_port,
                            vertical_level: next_level,
                            num_attach_levels: edges.len(),
                        },
                    );

                    if min_level >= 2 || (min_level == 1 && other_virtual_edge) {
                        let v_x = positions[v];
                        let down_x = positions[dest];
                        let mut left_x = v_x.min(down_x);
                        let mut right_x = v_x.max(down_x);

                        // A partner line that continues upwards also occupies this rank.
                        let mut top_x = f64::INFINITY;
                        if dest == u {
                            if let &[a, b] = self.gg.in_edges(u) {
                                let other_parent = if a == v { b } else { a };
                                if self.gg.is_virtual(other_parent) {
                                    top_x = positions[other_parent];
                                    right_x = right_x.max(top_x);
                                    left_x = left_x.min(top_x);
                                }
                            }
                        }

                        lines.push(PartnerLine {
                            v,
                            u,
                            left_x,
                            right_x,
                            down_x,
                            top_x,
                            over,
                            side,
                            attach_level: next_port,
                            complement: None,
                        });
                        init_levels.push(next_level);
                        by_relationship.entry(u).or_default().push(lines.len() - 1);
                    }

                    next_port += 1;
                    next_level += 1;
                }
                num_levels = num_levels.max(next_level.saturating_sub(1));
            }
        }

        if lines.len() > 1 {
            for e in 0..lines.len() {
                if lines[e].complement.is_some() {
                    continue;
                }
                if let Some(edges) = by_relationship.get(&lines[e].u) {
                    if edges.len() > 1 {
                        let other = if edges[0] == e { edges[1] } else { edges[0] };
                        lines[e].complement = Some(other);
                        lines[other].complement = Some(e);
                    }
                }
            }

            let score = |e1: usize, e2: usize, l1: usize, l2: usize, all: Option<&[usize]>| {
                let (a, b) = (&lines[e1], &lines[e2]);
                if a.right_x <= b.left_x || a.left_x >= b.right_x {
                    return 0.0;
                }
                if l1 == l2 {
                    return f64::INFINITY;
                }
                // `upper` is drawn above `lower`.
                let (upper, lower, lower_level) = if l1 > l2 { (a, b, l2) } else { (b, a, l1) };

                // Lines leaving one person on one side keep the order of their ports.
                if upper.v == lower.v && upper.side == lower.side && upper.attach_level < lower.attach_level
                {
                    return f64::INFINITY;
                }
                if upper.left_x <= lower.left_x && upper.right_x >= lower.right_x {
                    return 0.0;
                }
                if upper.left_x >= lower.left_x && upper.right_x <= lower.right_x {
                    return 2.0;
                }

                let mut extra = 1.0;
                if lower.top_x >= upper.left_x && lower.top_x <= upper.right_x {
                    extra += 1.0;
                }
                // The relationship will sit above the lower line, which saves most of one
                // of the two crossings.
                if let Some(complement) = upper.complement {
                    if all.is_none_or(|assigned| assigned[complement] > lower_level)
                        && upper.down_x >= lower.left_x
                        && upper.down_x <= lower.right_x
                    {
                        extra -= 0.4;
                    }
                }
                extra
            };

            let mut optimizer =
                VerticalPosIntOptimizer::new(score, init_levels.clone(), Some(init_levels));
            let result = optimizer.compute_vertical_positions(
                self.tuning.exhaustive_search_edges,
                self.tuning.partner_annealing_steps,
            );

            num_levels = 0;
            for (line, &level) in lines.iter().zip(&result) {
                if let Some(edge) = levels
                    .out_edge_vertical_level
                    .get_mut(&line.v)
                    .and_then(|m| m.get_mut(&line.u))
                {
                    edge.vertical_level = level;
                }
                num_levels = num_levels.max(level);
            }

            // A line raised only to clear relationships that are themselves raised above it
            // can go back to level 1.
            for (line, &level) in lines.iter().zip(&result) {
                if level <= 1 {
                    continue;
                }
                let lower = line.over.iter().all(|&w| {
                    if !self.gg.is_relationship(w) {
                        return false;
                    }
                    let Ok(parents) = self.gg.parents(w) else {
                        return false;
                    };
                    parents.iter().all(|&p| {
                        levels
                            .edge_level(p, w)
                            .is_some_and(|e| e.vertical_level > level)
                    })
                });
                if lower {
                    if let Some(edge) = levels
                        .out_edge_vertical_level
                        .get_mut(&line.v)
                        .and_then(|m| m.get_mut(&line.u))
                    {
                        edge.vertical_level = 1;
                    }
                }
            }
        }

        levels.rank_vertical_levels[r - 1] += num_levels.saturating_sub(2);
    }
}
