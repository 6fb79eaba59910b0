//! Choosing where a new vertex goes.
//!
//! Every insertion picks the slot on the target rank that crosses the fewest existing edges,
//! inserts the vertex there with an undefined x-coordinate and lets
//! [`PositionedGraph::place_new_vertex`] push the rest of the layout out of the way.

use crate::positioned::PositionedGraph;
use pedigree_graph::{Error, Rank, Result, VertexData, VertexId, VirtualEdgeSegment};

impl PositionedGraph {
    /// Inserts a vertex connected by exactly one edge (from `in_edge` or to `out_edge`) and
    /// places it next to that neighbour.
    pub(crate) fn insert_and_place(
        &mut self,
        data: VertexData,
        in_edge: Option<VertexId>,
        out_edge: Option<VertexId>,
        rank: Rank,
        order: usize,
    ) -> Result<VertexId> {
        let anchor = match (in_edge, out_edge) {
            (Some(u), None) | (None, Some(u)) => u,
            _ => {
                return Err(Error::invariant(
                    "a new vertex must be connected through exactly one edge",
                ));
            }
        };
        let ins: Vec<VertexId> = in_edge.into_iter().collect();
        let outs: Vec<VertexId> = out_edge.into_iter().collect();
        let new = self.insert_vertex(data, 1, &ins, &outs, rank, order)?;
        self.place_new_vertex(new, anchor);
        tracing::trace!(vertex = new, rank = self.ranks[new], x = self.positions[new], "inserted");
        Ok(new)
    }

    /// Slot on `rank` for a new vertex connected to `edge_to` that crosses the fewest edges,
    /// preferring the slot closest to where `edge_to` is.
    pub(crate) fn find_best_insert_position(
        &self,
        rank: Rank,
        edge_to: VertexId,
        prefer_left: bool,
    ) -> Result<usize> {
        if rank == 0 || rank > self.max_rank {
            return Ok(0);
        }
        let edge_to_rank = self.ranks[edge_to];
        let edge_to_order = self.order.position(edge_to);
        if edge_to_rank == rank && self.gg.is_person(edge_to) {
            return self.find_best_relationship_position(edge_to, prefer_left, None);
        }

        let hub_penalty = self.gg.is_childhub(edge_to);
        let row = self.order.rank(rank);
        let edge_to_x = self.positions[edge_to];
        let mut desired = row
            .iter()
            .take_while(|&&u| self.positions[u] < edge_to_x)
            .count();
        // new children go next to their siblings
        if hub_penalty && rank > edge_to_rank && !self.gg.out_edges(edge_to).is_empty() {
            desired = self.analyze_children(edge_to)?.right_most_child_order + 1;
        }

        let mut best = 0;
        let mut best_crossings = f64::INFINITY;
        let mut best_distance = usize::MAX;
        for o in 0..=row.len() {
            if o > 0 && o < row.len() && self.splits_twins(row, o)? {
                continue;
            }
            let crossings = self.edge_crossings_by_future_edge(
                rank,
                o as f64 - 0.5,
                edge_to_rank,
                edge_to_order as f64,
                hub_penalty,
                edge_to,
            )?;
            let distance = o.abs_diff(desired);
            if crossings < best_crossings || (crossings == best_crossings && distance <= best_distance) {
                best = o;
                best_crossings = crossings;
                best_distance = distance;
            }
        }
        Ok(best)
    }

    /// Whether slot `o` (in front of `row[o]`) lies between two twins, ignoring segments.
    fn splits_twins(&self, row: &[VertexId], o: usize) -> Result<bool> {
        let mut left = o - 1;
        while left > 0 && self.gg.is_virtual(row[left]) {
            left -= 1;
        }
        let mut right = o;
        while right + 1 < row.len() && self.gg.is_virtual(row[right]) {
            right += 1;
        }
        let (left, right) = (row[left], row[right]);
        if !self.gg.is_person(left) || !self.gg.is_person(right) {
            return Ok(false);
        }
        if self.gg.producing_relationship(left)? != self.gg.producing_relationship(right)? {
            return Ok(false);
        }
        let group = self.gg.twin_group_id(left);
        Ok(group.is_some() && group == self.gg.twin_group_id(right))
    }

    /// Edges an edge from a new vertex at fractional `new_order` on `new_rank` to the
    /// existing vertex `existing` would cross.
    ///
    /// Crossing a sibling line costs a lot when `hub_penalty` is set. A new child of
    /// `existing` (a child hub) must land next to one of its siblings unless every sibling
    /// already has a partner; otherwise the slot is infinitely bad. Splitting a partner line on
    /// the new vertex's own rank costs a little.
    pub(crate) fn edge_crossings_by_future_edge(
        &self,
        new_rank: Rank,
        new_order: f64,
        existing_rank: Rank,
        existing_order: f64,
        hub_penalty: bool,
        existing: VertexId,
    ) -> Result<f64> {
        let rank_from = new_rank.min(existing_rank);
        let rank_to = new_rank.max(existing_rank);
        if rank_from == rank_to {
            return Err(Error::precondition("edge_crossings_by_future_edge", existing));
        }
        let (order_from, order_to) = if new_rank < existing_rank {
            (new_order, existing_order)
        } else {
            (existing_order, new_order)
        };
        let tuning = &self.options.tuning;

        let mut siblings = None;
        if self.gg.is_childhub(existing)
            && new_rank > existing_rank
            && !self.gg.out_edges(existing).is_empty()
        {
            let info = self.analyze_children(existing)?;
            if info.num_with_partners < info.ordered_children.len() {
                let row = self.order.rank(new_rank);
                let is_sibling = |at: f64| {
                    row.get(at as usize)
                        .is_some_and(|&u| matches!(self.gg.in_edges(u), [hub] if *hub == existing))
                };
                let next_to_sibling = (new_order > 0.0 && is_sibling(new_order.floor()))
                    || (new_order < row.len() as f64 - 1.0 && is_sibling(new_order.ceil()));
                if !next_to_sibling {
                    return Ok(f64::INFINITY);
                }
            }
            siblings = Some(info);
        }

        let mut crossings = 0.0;
        for (ord, &vertex) in self.order.rank(rank_to).iter().enumerate() {
            let ord = ord as f64;
            if ord == order_to {
                continue;
            }
            for &target in self.gg.in_edges(vertex) {
                let mut penalty = 1.0;
                if hub_penalty && self.gg.is_childhub(target) {
                    penalty = tuning.insert_childhub_edge_crossing;
                    // fine when the two sibling groups are interleaved already
                    if let Some(info) = &siblings {
                        let other = self.analyze_children(target)?;
                        if other.left_most_child_order < info.right_most_child_order
                            && other.right_most_child_order > info.left_most_child_order
                        {
                            penalty = 1.0;
                        }
                    }
                }
                let order_target = self.order.position(target) as f64;
                if self.ranks[target] == rank_to {
                    if (ord < order_to && order_target > order_to) || (ord > order_to && order_target < order_to) {
                        crossings += 2.0;
                    }
                } else if (ord < order_to && order_target > order_from)
                    || (ord > order_to && order_target < order_from)
                {
                    crossings += penalty;
                }
            }
        }

        for (ord, &vertex) in self.order.rank(new_rank).iter().enumerate() {
            let ord = ord as f64;
            if ord == new_order {
                continue;
            }
            for &target in self.gg.out_edges(vertex) {
                if self.ranks[target] != new_rank {
                    continue;
                }
                let order_target = self.order.position(target) as f64;
                if (new_order < ord && new_order > order_target) || (new_order > ord && new_order < order_target) {
                    crossings += tuning.insert_same_rank_edge_crossing;
                }
            }
        }
        Ok(crossings)
    }

    /// Slot for a new relationship of `v` on its rank. With `partner` given the slot lies
    /// between the two; otherwise on the side of `v` that is free, or `prefer_left`.
    pub(crate) fn find_best_relationship_position(
        &self,
        v: VertexId,
        prefer_left: bool,
        partner: Option<VertexId>,
    ) -> Result<usize> {
        let rank = self.ranks[v];
        let row = self.order.rank(rank);
        let len = row.len();
        let is_twin = self.gg.twin_group_id(v).is_some();
        let v_order = self.order.position(v);
        let busy = self.options.tuning.insert_busy_rank_below;

        // penalties for inserting in front of slot o
        let mut below = vec![0.0; len + 3];
        let mut same_rank = vec![0.0; len + 1];

        for (o, &node) in row.iter().enumerate() {
            if !self.gg.is_relationship(node) {
                continue;
            }
            let children = self.analyze_children(node)?;
            if children.left_most_has_left_partner {
                below[o] += 1.0;
                if o > 0 {
                    below[o - 1] += busy;
                }
            }
            if children.right_most_has_right_partner {
                below[o + 1] += 1.0;
                below[o + 2] += busy;
            }
        }

        // never cut through a partner line on this rank
        for (rel_order, &node) in row.iter().enumerate() {
            if !self.gg.is_relationship(node) {
                continue;
            }
            for &parent in self.gg.in_edges(node) {
                if parent == v || Some(parent) == partner || self.ranks[parent] != rank {
                    continue;
                }
                let parent_order = self.order.position(parent);
                let (from, to) = if parent_order > rel_order {
                    (rel_order + 1, parent_order)
                } else {
                    (parent_order + 1, rel_order)
                };
                for slot in &mut same_rank[from..=to.min(len)] {
                    *slot = f64::INFINITY;
                }
            }
        }

        // twins stay together, and lines up to parents are better not crossed
        let mut o = 0;
        while o < len {
            let mut at = o;
            o += 1;
            if at == v_order {
                continue;
            }
            let node = row[at];
            if !self.gg.is_person(node) {
                continue;
            }
            let twins = self.all_twins_sorted_by_order(node)?;
            if twins.len() > 1 {
                let left_most = self.order.position(twins[0]);
                let right_most = self.order.position(twins[twins.len() - 1]);
                for slot in &mut same_rank[(left_most + 1).min(len + 1)..=right_most.min(len)] {
                    *slot = f64::INFINITY;
                }
                at = right_most;
                o = right_most + 1;
            }
            if self.gg.producing_relationship(node)?.is_some() {
                let range = if at < v_order { 0..=at } else { at + 1..=len };
                for slot in &mut same_rank[range] {
                    *slot += 1.0;
                }
            }
        }

        let layers = self.layers();
        let Some(u) = partner else {
            if prefer_left && v_order == 0 {
                return Ok(0);
            }
            let (left, right) = layers.left_and_right_partners(&self.order, v);
            // with nothing else in the way the right side moves fewer vertices
            if !is_twin && left.is_empty() && (prefer_left || !right.is_empty()) {
                return Ok(v_order);
            }
            if !is_twin && right.is_empty() {
                return Ok(v_order + 1);
            }

            let mut best = v_order + 1;
            let mut best_penalty = f64::INFINITY;
            for o in 0..=len {
                let mut penalty = below[o] + same_rank[o];
                if o <= v_order {
                    penalty += (left.len() + v_order - o) as f64;
                    penalty += if prefer_left { -0.5 } else { 0.5 };
                } else {
                    penalty += (right.len() + o - v_order - 1) as f64;
                }
                if penalty < best_penalty {
                    best_penalty = penalty;
                    best = o;
                }
            }
            return Ok(best);
        };

        let (v, u) = if self.order.position(v) > self.order.position(u) { (u, v) } else { (v, u) };
        let (order_v, order_u) = (self.order.position(v), self.order.position(u));
        let (_, right_of_v) = layers.left_and_right_partners(&self.order, v);
        let (left_of_u, _) = layers.left_and_right_partners(&self.order, u);

        if right_of_v.is_empty() && !left_of_u.is_empty() {
            return Ok(order_v + 1);
        }
        if !right_of_v.is_empty() && left_of_u.is_empty() {
            return Ok(order_u);
        }

        let mut best = order_v + 1;
        let mut best_penalty = f64::INFINITY;
        for o in order_v + 1..=order_u {
            let mut penalty = below[o] + same_rank[o];
            penalty += right_of_v
                .iter()
                .filter(|&&rel| o <= self.order.position(rel))
                .count() as f64;
            penalty += left_of_u
                .iter()
                .filter(|&&rel| o > self.order.position(rel))
                .count() as f64;
            if penalty <= best_penalty {
                best_penalty = penalty;
                best = o;
            }
        }
        Ok(best)
    }

    /// Connects `person` to `relationship` at least two ranks below it through a chain of
    /// segments: one next to the relationship on its own rank, then one per rank in between.
    pub(crate) fn add_multi_rank_edge(&mut self, person: VertexId, relationship: VertexId) -> Result<()> {
        let rank_person = self.ranks[person];
        let rank_rel = self.ranks[relationship];
        if rank_person + 2 > rank_rel {
            return Err(Error::precondition("add_multi_rank_edge", relationship));
        }
        let Some(&other) = self.gg.in_edges(relationship).first() else {
            return Err(Error::precondition("add_multi_rank_edge", relationship));
        };

        // the segment goes on the side of the relationship away from the other partner
        let order_rel = self.order.position(relationship);
        let first_order = if self.positions[other] < self.positions[relationship] {
            order_rel + 1
        } else {
            order_rel
        };
        let segment = VirtualEdgeSegment::new(person, relationship, 0);
        let mut prev = self.insert_and_place(
            VertexData::VirtualEdge(segment),
            None,
            Some(relationship),
            rank_rel,
            first_order,
        )?;

        let mut piece = 1;
        for rank in (rank_person + 1..rank_rel).rev() {
            let prev_x = self.positions[prev];
            let row = self.order.rank(rank);
            let order = row
                .iter()
                .position(|&u| self.positions[u] >= prev_x)
                .unwrap_or(row.len());
            let segment = VirtualEdgeSegment::new(person, relationship, piece);
            prev = self.insert_and_place(VertexData::VirtualEdge(segment), None, Some(prev), rank, order)?;
            piece += 1;
        }
        self.gg.add_edge(person, prev, 1)
    }

    /// Twins of `v` (including `v`) from left to right.
    pub(crate) fn all_twins_sorted_by_order(&self, v: VertexId) -> Result<Vec<VertexId>> {
        let mut twins = self.gg.all_twins_of(v)?;
        self.order.sort_by_order(&mut twins);
        Ok(twins)
    }
}
