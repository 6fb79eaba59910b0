//! X-coordinates of vertex centres and the separation rules between neighbours.

use crate::options::Separations;
use crate::ordering::Ordering;
use pedigree_graph::{BaseGraph, Error, Rank, Result, VertexId};
use rustc_hash::FxHashSet as HashSet;

/// What coordinate queries need to know about the layout besides the coordinates.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub gg: &'a BaseGraph,
    pub ranks: &'a [Rank],
    pub order: &'a Ordering,
    pub separations: &'a Separations,
}

impl<'a> Frame<'a> {
    pub fn new(
        gg: &'a BaseGraph,
        ranks: &'a [Rank],
        order: &'a Ordering,
        separations: &'a Separations,
    ) -> Self {
        Self {
            gg,
            ranks,
            order,
            separations,
        }
    }

    fn relationship_or_childhub(&self, v: VertexId) -> bool {
        self.gg.is_relationship(v) || self.gg.is_childhub(v)
    }

    /// Minimum gap between the borders of two neighbouring vertices.
    pub fn separation_by_type(&self, v1: VertexId, v2: VertexId) -> f64 {
        let s = self.separations;
        let (rel1, rel2) = (self.relationship_or_childhub(v1), self.relationship_or_childhub(v2));
        if rel1 && rel2 {
            return s.rel_rel;
        }
        if rel1 || rel2 {
            return s.rel;
        }
        if self.gg.is_virtual(v1) || self.gg.is_virtual(v2) {
            if self.gg.has_edge(v1, v2) || self.gg.has_edge(v2, v1) {
                return s.rel;
            }
            return s.twin;
        }
        let twin1 = self.gg.twin_group_id(v1);
        if twin1.is_some() && twin1 == self.gg.twin_group_id(v2) {
            return s.twin;
        }
        s.person
    }

    /// Minimum distance between the centres of two neighbouring vertices.
    pub fn min_separation(&self, v1: VertexId, v2: VertexId) -> f64 {
        self.gg.half_width(v1) + self.separation_by_type(v1, v2) + self.gg.half_width(v2)
    }
}

/// Centre x-coordinate of every vertex, indexed by id.
#[derive(Debug, Clone)]
pub struct XCoord<'a> {
    frame: Frame<'a>,
    x: Vec<f64>,
}

impl<'a> XCoord<'a> {
    /// Every rank packed as far left as the separation rules allow.
    pub fn init(frame: Frame<'a>) -> Self {
        let mut x = vec![0.0; frame.gg.num_vertices()];
        for row in frame.order.ranks() {
            let Some(&first) = row.first() else {
                continue;
            };
            x[first] = frame.gg.half_width(first);
            for pair in row.windows(2) {
                x[pair[1]] = x[pair[0]] + frame.min_separation(pair[0], pair[1]);
            }
        }
        Self { frame, x }
    }

    /// Wraps existing coordinates, rejecting them when two neighbours are too close.
    pub fn with_positions(frame: Frame<'a>, x: Vec<f64>) -> Result<Self> {
        let result = Self::unchecked(frame, x);
        result.validate()?;
        Ok(result)
    }

    pub fn unchecked(frame: Frame<'a>, mut x: Vec<f64>) -> Self {
        x.resize(frame.gg.num_vertices(), 0.0);
        Self { frame, x }
    }

    pub fn frame(&self) -> Frame<'a> {
        self.frame
    }

    pub fn validate(&self) -> Result<()> {
        for (r, row) in self.frame.order.ranks().iter().enumerate() {
            for pair in row.windows(2) {
                let (prev, v) = (pair[0], pair[1]);
                if self.x[v] < self.x[prev] + self.frame.min_separation(prev, v) {
                    return Err(Error::invariant(format!(
                        "vertices {prev} and {v} on rank {r} are closer than allowed"
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn x(&self, v: VertexId) -> f64 {
        self.x[v]
    }

    pub fn set(&mut self, v: VertexId, x: f64) {
        self.x[v] = x;
    }

    pub fn shift(&mut self, v: VertexId, amount: f64) {
        self.x[v] += amount;
    }

    pub fn positions(&self) -> &[f64] {
        &self.x
    }

    pub fn into_positions(self) -> Vec<f64> {
        self.x
    }

    pub fn left_edge(&self, v: VertexId) -> f64 {
        self.x[v] - self.frame.gg.half_width(v)
    }

    pub fn right_edge(&self, v: VertexId) -> f64 {
        self.x[v] + self.frame.gg.half_width(v)
    }

    /// Leftmost centre `v` can move to without pushing its left neighbour.
    pub fn left_most_no_disturb_position(&self, v: VertexId) -> f64 {
        match self.frame.order.left_neighbour(v, self.frame.ranks[v]) {
            Some(left) => {
                self.right_edge(left)
                    + self.frame.separation_by_type(v, left)
                    + self.frame.gg.half_width(v)
            }
            None => f64::NEG_INFINITY,
        }
    }

    /// Rightmost centre `v` can move to without pushing its right neighbour. With
    /// `also_move_relationship`, a relationship to the right counts as movable too.
    pub fn right_most_no_disturb_position(&self, v: VertexId, also_move_relationship: bool) -> f64 {
        let Some(right) = self.frame.order.right_neighbour(v, self.frame.ranks[v]) else {
            return f64::INFINITY;
        };
        let mut boundary =
            self.left_edge(right) - self.frame.separation_by_type(v, right) - self.frame.gg.half_width(v);
        if also_move_relationship && self.frame.gg.is_relationship(right) {
            boundary += self.right_most_no_disturb_position(right, false) - self.x[right];
        }
        boundary
    }

    pub fn slack_on_the_left(&self, v: VertexId) -> f64 {
        self.x[v] - self.left_most_no_disturb_position(v)
    }

    pub fn slack_on_the_right(&self, v: VertexId) -> f64 {
        self.right_most_no_disturb_position(v, false) - self.x[v]
    }

    /// Moves `v` left by up to `amount`, stopping at its left neighbour. Returns the distance
    /// actually moved.
    pub fn shift_left_one_vertex(&mut self, v: VertexId, amount: f64) -> f64 {
        let actual = amount.min(self.x[v] - self.left_most_no_disturb_position(v));
        self.x[v] -= actual;
        actual
    }

    pub fn shift_right_one_vertex(&mut self, v: VertexId, amount: f64) -> f64 {
        let actual = amount.min(self.right_most_no_disturb_position(v, false) - self.x[v]);
        self.x[v] += actual;
        actual
    }

    /// Moves `v` right by `amount` and pushes its right neighbours just as far as needed.
    pub fn shift_right_and_shift_other_if_necessary(&mut self, v: VertexId, amount: f64) {
        self.x[v] += amount;

        let rank = self.frame.ranks[v];
        let row = self.frame.order.rank(rank);
        let mut prev = v;
        let mut right_edge = self.right_edge(v);
        for &right in row.iter().skip(self.frame.order.position(v) + 1) {
            let gap = self.frame.separation_by_type(prev, right);
            if self.left_edge(right) >= right_edge + gap {
                break;
            }
            self.x[right] = right_edge + gap + self.frame.gg.half_width(right);
            right_edge = self.right_edge(right);
            prev = right;
        }
    }

    /// Pushes vertices right, rank by rank, until neighbours are at least their minimum
    /// separation apart. Returns whether anything moved.
    pub fn spread_crowded_neighbours(&mut self) -> bool {
        let frame = self.frame;
        let mut moved = false;
        for row in frame.order.ranks() {
            for pair in row.windows(2) {
                let wanted = self.x[pair[0]] + frame.min_separation(pair[0], pair[1]);
                if self.x[pair[1]] < wanted {
                    self.x[pair[1]] = wanted;
                    moved = true;
                }
            }
        }
        moved
    }

    /// Moves `v` towards `target` as far as the neighbours allow. Returns whether it moved.
    pub fn move_node_as_close_to_x_as_possible(&mut self, v: VertexId, target: f64) -> bool {
        let old = self.x[v];
        self.x[v] = if old > target {
            target.max(self.left_most_no_disturb_position(v))
        } else {
            target.min(self.right_most_no_disturb_position(v, false))
        };
        self.x[v] != old
    }

    /// Shifts everything so that the leftmost border sits at 0.
    pub fn normalize(&mut self) {
        let mut leftmost: Option<VertexId> = None;
        for (v, &x) in self.x.iter().enumerate() {
            if leftmost.is_none_or(|l| x <= self.x[l]) {
                leftmost = Some(v);
            }
        }
        let Some(leftmost) = leftmost else {
            return;
        };
        let amount = self.x[leftmost] - self.frame.gg.half_width(leftmost);
        for x in &mut self.x {
            *x -= amount;
        }
    }

    /// Smallest slack on each side of a set of vertices moved together, only counting
    /// neighbours outside the set. Returns `(left, right)`.
    pub fn find_vertex_set_slacks(&self, set: &HashSet<VertexId>) -> (f64, f64) {
        let mut left = f64::INFINITY;
        let mut right = f64::INFINITY;
        for &v in set {
            let rank = self.frame.ranks[v];
            let left_neighbour = self.frame.order.left_neighbour(v, rank);
            if left_neighbour.is_none_or(|u| !set.contains(&u)) {
                left = left.min(self.slack_on_the_left(v));
            }
            let right_neighbour = self.frame.order.right_neighbour(v, rank);
            if right_neighbour.is_none_or(|u| !set.contains(&u)) {
                right = right.min(self.slack_on_the_right(v));
            }
        }
        (left, right)
    }
}
