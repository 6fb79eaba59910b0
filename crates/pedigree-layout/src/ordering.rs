//! Per-rank left-to-right order of vertices.
//!
//! `order[r]` lists the vertices of rank `r` from left to right and `v_order[v]` is the index of
//! `v` within its rank. Rank 0 is a scratch rank for vertices that are about to be removed.

use pedigree_graph::{Error, Rank, Result, VertexId};
use std::cmp::Ordering as CmpOrdering;

/// Position reported for a vertex that is not part of any rank.
pub const UNPLACED: usize = usize::MAX;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ordering {
    order: Vec<Vec<VertexId>>,
    v_order: Vec<usize>,
}

impl Ordering {
    /// An ordering with `max_rank + 1` empty ranks.
    pub fn with_ranks(max_rank: Rank) -> Self {
        Self {
            order: vec![Vec::new(); max_rank + 1],
            v_order: Vec::new(),
        }
    }

    /// Builds an ordering from per-rank vertex lists, deriving the position index.
    pub fn from_ranks(order: Vec<Vec<VertexId>>) -> Self {
        let mut result = Self {
            order,
            v_order: Vec::new(),
        };
        result.rebuild_positions();
        result
    }

    fn rebuild_positions(&mut self) {
        self.v_order.clear();
        for r in 0..self.order.len() {
            self.refresh_rank_from(r, 0);
        }
    }

    fn set_position(&mut self, v: VertexId, position: usize) {
        if v >= self.v_order.len() {
            self.v_order.resize(v + 1, UNPLACED);
        }
        self.v_order[v] = position;
    }

    fn refresh_rank_from(&mut self, rank: Rank, from: usize) {
        for i in from..self.order[rank].len() {
            let v = self.order[rank][i];
            self.set_position(v, i);
        }
    }

    pub fn ranks(&self) -> &[Vec<VertexId>] {
        &self.order
    }

    pub fn num_ranks(&self) -> usize {
        self.order.len()
    }

    /// Vertices of `rank`, left to right; empty for a rank that does not exist.
    pub fn rank(&self, rank: Rank) -> &[VertexId] {
        self.order.get(rank).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn rank_len(&self, rank: Rank) -> usize {
        self.rank(rank).len()
    }

    pub fn vertex_at(&self, rank: Rank, position: usize) -> Option<VertexId> {
        self.order.get(rank).and_then(|r| r.get(position)).copied()
    }

    /// Index of `v` within its rank, or [`UNPLACED`].
    pub fn position(&self, v: VertexId) -> usize {
        self.v_order.get(v).copied().unwrap_or(UNPLACED)
    }

    pub fn is_placed(&self, v: VertexId) -> bool {
        self.position(v) != UNPLACED
    }

    pub fn positions(&self) -> &[usize] {
        &self.v_order
    }

    /// Appends `v` at the right end of `rank`.
    pub fn push(&mut self, rank: Rank, v: VertexId) {
        if rank >= self.order.len() {
            self.order.resize(rank + 1, Vec::new());
        }
        self.order[rank].push(v);
        let position = self.order[rank].len() - 1;
        self.set_position(v, position);
    }

    pub fn insert(&mut self, rank: Rank, position: usize, v: VertexId) {
        if rank >= self.order.len() {
            self.order.resize(rank + 1, Vec::new());
        }
        let position = position.min(self.order[rank].len());
        self.order[rank].insert(position, v);
        self.refresh_rank_from(rank, position);
    }

    pub fn exchange(&mut self, rank: Rank, i1: usize, i2: usize) {
        let row = &mut self.order[rank];
        row.swap(i1, i2);
        let (v1, v2) = (row[i1], row[i2]);
        self.set_position(v1, i1);
        self.set_position(v2, i2);
    }

    pub fn can_move(&self, rank: Rank, position: usize, amount: isize) -> bool {
        let target = position as isize + amount;
        target >= 0 && (target as usize) < self.rank_len(rank)
    }

    /// Moves the vertex at `position` by `amount` places, shifting everything in between.
    /// Returns false (and changes nothing) when the target is outside the rank.
    pub fn move_by(&mut self, rank: Rank, position: usize, amount: isize) -> bool {
        if !self.can_move(rank, position, amount) || position >= self.rank_len(rank) {
            return false;
        }
        if amount == 0 {
            return true;
        }
        let target = (position as isize + amount) as usize;
        let v = self.order[rank].remove(position);
        self.order[rank].insert(target, v);
        self.refresh_rank_from(rank, position.min(target));
        true
    }

    pub fn move_vertex_to_rank_and_order(
        &mut self,
        old_rank: Rank,
        old_order: usize,
        new_rank: Rank,
        new_order: usize,
    ) {
        let v = self.order[old_rank].remove(old_order);
        self.refresh_rank_from(old_rank, old_order);
        self.insert(new_rank, new_order, v);
    }

    /// Moves the vertex at `old_order` so that it ends up in front of whatever currently sits
    /// at `new_order`.
    pub fn move_vertex_to_order(&mut self, rank: Rank, old_order: usize, new_order: usize) {
        let v = self.order[rank].remove(old_order);
        let new_order = if new_order > old_order {
            new_order - 1
        } else {
            new_order
        };
        let new_order = new_order.min(self.order[rank].len());
        self.order[rank].insert(new_order, v);
        self.refresh_rank_from(rank, old_order.min(new_order));
    }

    /// Drops every vertex parked on rank 0 and renumbers the remaining ids to stay dense.
    /// Returns the dropped ids in ascending order.
    pub fn remove_unplugged(&mut self) -> Vec<VertexId> {
        let Some(scratch) = self.order.first_mut() else {
            return Vec::new();
        };
        let mut removed = std::mem::take(scratch);
        removed.sort_unstable_by(|a, b| b.cmp(a));
        for &v in &removed {
            self.forget_id(v);
        }
        removed.reverse();
        removed
    }

    /// Removes `v` from `rank` and renumbers every id above `v` down by one.
    pub fn remove(&mut self, v: VertexId, rank: Rank) -> Result<()> {
        let position = self.position(v);
        if self.vertex_at(rank, position) != Some(v) {
            return Err(Error::precondition("ordering_remove", v));
        }
        self.order[rank].remove(position);
        self.refresh_rank_from(rank, position);
        self.forget_id(v);
        Ok(())
    }

    fn forget_id(&mut self, v: VertexId) {
        if v < self.v_order.len() {
            self.v_order.remove(v);
        }
        for row in &mut self.order {
            for u in row.iter_mut() {
                if *u > v {
                    *u -= 1;
                }
            }
        }
    }

    /// Makes room for a new vertex with id `v` (every id `>= v` moves up by one) and places it.
    pub fn insert_and_shift_all_ids_above_v_by_one(
        &mut self,
        v: VertexId,
        rank: Rank,
        new_order: usize,
    ) {
        for row in &mut self.order {
            for u in row.iter_mut() {
                if *u >= v {
                    *u += 1;
                }
            }
        }
        if v <= self.v_order.len() {
            self.v_order.insert(v, UNPLACED);
        }
        self.insert(rank, new_order, v);
    }

    /// Inserts an empty rank in front of `before`.
    pub fn insert_rank(&mut self, before: Rank) {
        let before = before.min(self.order.len());
        self.order.insert(before, Vec::new());
    }

    pub fn remove_rank(&mut self, rank: Rank) -> Vec<VertexId> {
        let row = self.order.remove(rank);
        for &v in &row {
            self.set_position(v, UNPLACED);
        }
        row
    }

    pub fn left_neighbour(&self, v: VertexId, rank: Rank) -> Option<VertexId> {
        let position = self.position(v);
        if position == UNPLACED || position == 0 {
            return None;
        }
        self.vertex_at(rank, position - 1)
    }

    pub fn right_neighbour(&self, v: VertexId, rank: Rank) -> Option<VertexId> {
        let position = self.position(v);
        if position == UNPLACED {
            return None;
        }
        self.vertex_at(rank, position + 1)
    }

    /// Mirrors every rank left to right.
    pub fn flip_orders(&mut self) {
        for row in &mut self.order {
            row.reverse();
        }
        self.rebuild_positions();
    }

    /// Sorts `vertices` left to right by their current position.
    pub fn sort_by_order(&self, vertices: &mut [VertexId]) {
        vertices.sort_by_key(|&v| self.position(v));
    }

    /// Stable sort of one rank with a caller supplied comparison.
    pub fn sort_rank_by(
        &mut self,
        rank: Rank,
        compare: impl FnMut(&VertexId, &VertexId) -> CmpOrdering,
    ) {
        self.order[rank].sort_by(compare);
        self.refresh_rank_from(rank, 0);
    }

    /// Replaces the contents of one rank.
    pub fn set_rank(&mut self, rank: Rank, vertices: Vec<VertexId>) {
        if rank >= self.order.len() {
            self.order.resize(rank + 1, Vec::new());
        }
        self.order[rank] = vertices;
        self.refresh_rank_from(rank, 0);
    }

    /// Reverses the segment `from..=to` of a rank.
    pub fn reverse_span(&mut self, rank: Rank, from: usize, to: usize) {
        self.order[rank][from..=to].reverse();
        self.refresh_rank_from(rank, from);
    }

    /// All vertices accepted by `keep`, reading ranks top to bottom and each rank left to right.
    pub fn left_to_right_top_to_bottom(&self, keep: impl Fn(VertexId) -> bool) -> Vec<VertexId> {
        self.order
            .iter()
            .skip(1)
            .flat_map(|row| row.iter().copied())
            .filter(|&v| keep(v))
            .collect()
    }

    /// Checks that every rank is consistent with the position index.
    pub fn validate(&self) -> Result<()> {
        for (r, row) in self.order.iter().enumerate() {
            for (i, &v) in row.iter().enumerate() {
                if self.position(v) != i {
                    return Err(Error::invariant(format!(
                        "vertex {v} is listed at rank {r} position {i} but indexed at {}",
                        self.position(v)
                    )));
                }
            }
        }
        Ok(())
    }

    /// Per-rank vertex lists, the wire form of an ordering.
    pub fn serialize(&self) -> Vec<Vec<VertexId>> {
        self.order.clone()
    }

    pub fn deserialize(order: Vec<Vec<VertexId>>) -> Result<Self> {
        let result = Self::from_ranks(order);
        let mut seen = vec![false; result.v_order.len()];
        for row in &result.order {
            for &v in row {
                if seen[v] {
                    return Err(Error::import(format!("vertex {v} appears twice in the order")));
                }
                seen[v] = true;
            }
        }
        Ok(result)
    }
}
