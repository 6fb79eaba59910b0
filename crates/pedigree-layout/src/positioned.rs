//! A fully laid out pedigree.
//!
//! [`PositionedGraph`] owns the graph together with everything derived from it (ranks, order,
//! x-coordinates, vertical levels, rank heights and ancestor maps). Ranks, order and positions
//! are parallel, id-indexed structures; [`PositionedGraph::insert_vertex`] and
//! [`PositionedGraph::remove_vertex`] are the only places that splice them.

use crate::ancestors::Ancestors;
use crate::options::LayoutOptions;
use crate::order::{self, FusedTwins, Layers};
use crate::ordering::Ordering;
use crate::position::Positioner;
use crate::rank;
use crate::vertical::VerticalLevels;
use chrono::NaiveDate;
use pedigree_graph::{BaseGraph, EdgeWeight, Error, Rank, Result, VertexData, VertexId};
use rustc_hash::FxHashSet as HashSet;
use std::collections::VecDeque;
use std::time::Instant;

/// Layout hints, typically from a saved document. Anything inconsistent with the graph is
/// dropped and recomputed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuggestedLayout {
    /// Either internal ranks (together with `order`) or compact generation ranks.
    pub ranks: Option<Vec<Rank>>,
    pub order: Option<Ordering>,
    pub positions: Option<Vec<f64>>,
}

/// y-coordinates of a partner line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelLineY {
    /// Where the line leaves the person.
    pub attach_y: f64,
    /// Height of the horizontal part of the line.
    pub rel_line_y: f64,
}

/// Result of [`PositionedGraph::find_connected_component`].
#[derive(Debug, Clone, Default)]
pub struct ConnectedComponent {
    pub component: HashSet<VertexId>,
    /// Number of vertices reached besides the start vertices.
    pub size: usize,
    pub stop_reached: bool,
}

#[derive(Debug, Clone)]
pub struct PositionedGraph {
    pub(crate) gg: BaseGraph,
    pub(crate) ranks: Vec<Rank>,
    pub(crate) max_rank: Rank,
    pub(crate) order: Ordering,
    pub(crate) positions: Vec<f64>,
    pub(crate) vertical: VerticalLevels,
    pub(crate) rank_y: Vec<f64>,
    pub(crate) ancestors: Ancestors,
    pub(crate) proband: Option<VertexId>,
    pub(crate) options: LayoutOptions,
}

impl PositionedGraph {
    /// Lays out `gg`.
    ///
    /// With a suggested layout carrying both ranks and an order that match the graph (the
    /// graph then already contains its long-edge segments), ranking and ordering are skipped.
    /// Suggested positions are used only when they respect the separation rules.
    pub fn new(
        gg: BaseGraph,
        proband: Option<VertexId>,
        options: LayoutOptions,
        suggested: Option<SuggestedLayout>,
    ) -> Result<Self> {
        options.validate()?;
        let started = Instant::now();
        let proband = proband.filter(|&p| gg.is_person(p));

        let mut dg = Self {
            gg,
            ranks: Vec::new(),
            max_rank: 0,
            order: Ordering::with_ranks(0),
            positions: Vec::new(),
            vertical: VerticalLevels::default(),
            rank_y: vec![0.0, 0.0],
            ancestors: Ancestors::default(),
            proband,
            options,
        };

        let SuggestedLayout {
            ranks: suggested_ranks,
            order: suggested_order,
            positions: suggested_positions,
        } = suggested.unwrap_or_default();

        let mut suggested_positions = suggested_positions;
        match (suggested_ranks, suggested_order) {
            (Some(ranks), Some(order)) if dg.is_consistent_layout(&ranks, &order) => {
                dg.max_rank = ranks.iter().copied().max().unwrap_or(0);
                dg.ranks = ranks;
                dg.order = order;
            }
            (ranks, order) => {
                if order.is_some() {
                    tracing::warn!("suggested order is inconsistent with the graph, recomputing");
                }
                dg.compute_ranks_and_order(ranks.as_deref())?;
                suggested_positions = None;
            }
        }

        let positions = suggested_positions.filter(|p| {
            let ok = Positioner::new(&dg.gg, &dg.ranks, dg.max_rank, &dg.order, &dg.options)
                .validate_positions(p);
            if !ok {
                tracing::warn!("suggested positions violate the separation rules, recomputing");
            }
            ok
        });
        match positions {
            Some(positions) => dg.positions = positions,
            None => {
                dg.positions =
                    Positioner::new(&dg.gg, &dg.ranks, dg.max_rank, &dg.order, &dg.options)
                        .position();
                dg.improve_positioning()?;
            }
        }

        dg.update_secondary_structures(false);
        tracing::debug!(
            vertices = dg.gg.num_vertices(),
            max_rank = dg.max_rank,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "pedigree laid out"
        );
        Ok(dg)
    }

    fn is_consistent_layout(&self, ranks: &[Rank], order: &Ordering) -> bool {
        let n = self.gg.num_vertices();
        if ranks.len() != n || order.validate().is_err() {
            return false;
        }
        let placed: usize = order.ranks().iter().skip(1).map(Vec::len).sum();
        if placed != n || !order.rank(0).is_empty() {
            return false;
        }
        (0..n).all(|v| {
            ranks[v] >= 1
                && order.vertex_at(ranks[v], order.position(v)) == Some(v)
                && self
                    .gg
                    .out_edges(v)
                    .iter()
                    .all(|&u| ranks[u] == ranks[v] || ranks[u] == ranks[v] + 1)
        })
    }

    /// Ranker, then orderer, then relationships are moved onto their partners' rank.
    fn compute_ranks_and_order(&mut self, suggested_ranks: Option<&[Rank]>) -> Result<()> {
        if self.gg.is_empty() {
            return Ok(());
        }
        let started = Instant::now();

        self.gg.collapse_multi_rank_edges()?;
        let mut ranks = rank::rank(&self.gg, suggested_ranks);
        self.max_rank = ranks.iter().copied().max().unwrap_or(0);
        self.gg.split_multi_rank_edges(&mut ranks)?;
        self.ranks = ranks;
        tracing::debug!(
            max_rank = self.max_rank,
            segments = self.gg.num_vertices() - self.gg.real_vertex_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "ranking"
        );

        let mut fused = FusedTwins::fuse(&mut self.gg)?;
        self.order = order::ordering(
            &mut self.gg,
            &self.ranks,
            self.max_rank,
            &self.options,
            self.proband,
            &fused,
        )?;
        self.re_rank_relationships(&mut fused)?;
        self.reconnect_twins(&fused)?;
        Ok(())
    }

    // ---- accessors -----------------------------------------------------------------------

    pub fn graph(&self) -> &BaseGraph {
        &self.gg
    }

    pub fn ranks(&self) -> &[Rank] {
        &self.ranks
    }

    pub fn max_rank(&self) -> Rank {
        self.max_rank
    }

    pub fn order(&self) -> &Ordering {
        &self.order
    }

    pub fn positions(&self) -> &[f64] {
        &self.positions
    }

    pub fn vertical_levels(&self) -> &VerticalLevels {
        &self.vertical
    }

    pub fn rank_y(&self) -> &[f64] {
        &self.rank_y
    }

    pub fn ancestors(&self) -> &Ancestors {
        &self.ancestors
    }

    pub fn proband(&self) -> Option<VertexId> {
        self.proband
    }

    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    pub(crate) fn layers(&self) -> Layers<'_> {
        Layers::new(&self.gg, &self.ranks, self.max_rank, &self.options.tuning)
    }

    // ---- re-ranking ----------------------------------------------------------------------

    /// Moves every relationship from its own rank onto the rank of its partners, between or
    /// next to them, then drops the emptied relationship ranks.
    fn re_rank_relationships(&mut self, fused: &mut FusedTwins) -> Result<()> {
        if self.gg.is_empty() {
            return Ok(());
        }
        let initial = self.order.clone();
        let mut handled: HashSet<VertexId> = HashSet::default();

        let mut r = 2;
        while r <= self.max_rank {
            // Partners already next to each other: the relationship goes in between.
            for &rel in initial.rank(r) {
                if self.gg.is_virtual(rel) {
                    continue;
                }
                if !self.gg.is_relationship(rel) {
                    return Err(Error::invariant(format!(
                        "unexpected {} on relationship rank {r}",
                        self.gg.vertex_description(rel)
                    )));
                }
                let partners = self.gg.in_edges(rel).to_vec();
                match partners.as_slice() {
                    // The other partner is a fused twin: stay right of the representative.
                    [p] => {
                        let target = self.order.position(*p) + 1;
                        self.move_vertex_to_rank_and_order(rel, self.ranks[*p], target);
                        handled.insert(rel);
                    }
                    [p0, p1] => {
                        if self.ranks[*p0] != self.ranks[*p1] {
                            return Err(Error::invariant(format!(
                                "partners of relationship {rel} are on different ranks"
                            )));
                        }
                        let (o1, o2) = (self.order.position(*p0), self.order.position(*p1));
                        if o1.abs_diff(o2) == 1 {
                            self.move_vertex_to_rank_and_order(rel, self.ranks[*p0], o1.max(o2));
                            handled.insert(rel);
                        }
                    }
                    _ => return Err(Error::precondition("re_rank_relationships", rel)),
                }
            }

            for (old_order, &rel) in initial.rank(r).iter().enumerate() {
                if self.gg.is_virtual(rel) || handled.contains(&rel) {
                    continue;
                }
                let insert_order = self.relationship_insert_order(rel)?;
                let rank = self.ranks[self.gg.in_edges(rel)[0]];
                self.move_vertex_to_rank_and_order(rel, rank, insert_order);
                self.untangle_old_neighbours(&initial, r, old_order, rel)?;
            }
            r += 3;
        }

        self.remove_relationship_ranks(fused)?;
        self.improve_ordering();

        let layers = Layers::new(&self.gg, &self.ranks, self.max_rank, &self.options.tuning);
        let crossings = layers.edge_crossing(&self.order, None, true);
        layers.transpose_long_edges(&mut self.order, crossings, true);
        Ok(())
    }

    /// Where a relationship whose partners are not adjacent goes on the partner rank.
    fn relationship_insert_order(&self, rel: VertexId) -> Result<usize> {
        let mut partners = self.gg.in_edges(rel).to_vec();
        if partners.len() != 2 {
            return Err(Error::precondition("relationship_insert_order", rel));
        }
        self.order.sort_by_order(&mut partners);
        let (p0, p1) = (partners[0], partners[1]);
        let rank = self.ranks[p0];
        let (o1, o2) = (self.order.position(p0), self.order.position(p1));
        if o2 == o1 + 1 {
            return Err(Error::invariant(format!(
                "relationship {rel} has adjacent partners but was not placed between them"
            )));
        }

        let row = self.order.rank(rank);
        let right_of_p0 = row[o1 + 1];
        let left_of_p1 = row[o2 - 1];
        let p0_busy = self.gg.has_edge(p0, right_of_p0);
        let p1_busy = self.gg.has_edge(p1, left_of_p1);

        let insert_order = match (p0_busy, p1_busy) {
            (true, true) => {
                let free = (o1 + 2..o2).find(|&o| !self.gg.has_edge(p0, row[o]));
                match free {
                    Some(o) => o,
                    None => {
                        let others = self.gg.in_edges(left_of_p1);
                        let other = others.iter().copied().find(|&u| u != p1);
                        match other {
                            Some(u) if self.order.position(u) < o1 => o2,
                            _ => o1 + 1,
                        }
                    }
                }
            }
            (false, true) => o1 + 1,
            _ => o2,
        };
        Ok(insert_order)
    }

    /// After `rel` moved, a relationship that used to be its neighbour may now sit on the
    /// other side of it; the children and child hubs follow so the sibling lines do not cross.
    fn untangle_old_neighbours(
        &mut self,
        initial: &Ordering,
        r: Rank,
        old_order: usize,
        rel: VertexId,
    ) -> Result<()> {
        if old_order > 0 {
            let left = initial.rank(r)[old_order - 1];
            if self.gg.is_relationship(left)
                && self.ranks[left] == self.ranks[rel]
                && self.order.position(left) > self.order.position(rel)
            {
                self.swap_children_if_all_a_left_of_b(left, rel)?;
                self.exchange_childhubs_if_crossed(left, rel)?;
            }
        }
        if old_order + 1 < initial.rank_len(r) {
            let right = initial.rank(r)[old_order + 1];
            if self.gg.is_relationship(right)
                && self.ranks[right] == self.ranks[rel]
                && self.order.position(right) < self.order.position(rel)
            {
                self.swap_children_if_all_a_left_of_b(rel, right)?;
                self.exchange_childhubs_if_crossed(rel, right)?;
            }
        }
        Ok(())
    }

    fn exchange_childhubs_if_crossed(&mut self, left_rel: VertexId, right_rel: VertexId) -> Result<()> {
        let hub_l = self.gg.relationship_childhub(left_rel)?;
        let hub_r = self.gg.relationship_childhub(right_rel)?;
        let (pos_l, pos_r) = (self.order.position(hub_l), self.order.position(hub_r));
        if pos_l < pos_r && self.ranks[hub_l] == self.ranks[hub_r] {
            self.order.exchange(self.ranks[hub_l], pos_l, pos_r);
        }
        Ok(())
    }

    fn move_vertex_to_rank_and_order(&mut self, v: VertexId, new_rank: Rank, new_order: usize) {
        let old_rank = self.ranks[v];
        let old_order = self.order.position(v);
        self.order
            .move_vertex_to_rank_and_order(old_rank, old_order, new_rank, new_order);
        self.ranks[v] = new_rank;
    }

    /// When the children of `left_rel` occupy a contiguous block immediately left of the
    /// children of `right_rel` and none of them has a partner outside the block, mirrors the
    /// block so both sibling groups swap sides.
    fn swap_children_if_all_a_left_of_b(&mut self, left_rel: VertexId, right_rel: VertexId) -> Result<()> {
        let hub_l = self.gg.relationship_childhub(left_rel)?;
        let hub_r = self.gg.relationship_childhub(right_rel)?;
        let children_l = self.gg.out_edges(hub_l).len();

        let mut all: Vec<VertexId> = self
            .gg
            .out_edges(hub_l)
            .iter()
            .chain(self.gg.out_edges(hub_r))
            .copied()
            .collect();
        self.order.sort_by_order(&mut all);
        let (Some(&first), Some(&last)) = (all.first(), all.last()) else {
            return Ok(());
        };
        let child_rank = self.ranks[first];
        let left_most = self.order.position(first);
        let right_most = self.order.position(last);
        if right_most - left_most + 1 != all.len() {
            return Ok(());
        }

        for (i, &child) in all.iter().enumerate() {
            let belongs_left = i < children_l;
            if belongs_left && self.gg.in_edges(child).first() != Some(&hub_l) {
                return Ok(());
            }
            for &rel in self.gg.out_edges(child) {
                if self.gg.is_virtual(rel) {
                    return Ok(());
                }
                for &partner in self.gg.in_edges(rel) {
                    let partner = self.gg.up_the_chain_until_non_virtual(partner);
                    if self.ranks[partner] != child_rank {
                        return Ok(());
                    }
                    let at = self.order.position(partner);
                    if belongs_left && at < left_most {
                        return Ok(());
                    }
                    if !belongs_left && at > right_most {
                        return Ok(());
                    }
                }
            }
        }

        tracing::trace!(left_rel, right_rel, "swapping sibling groups");
        self.order.reverse_span(child_rank, left_most, right_most);
        Ok(())
    }

    /// Removes the (now empty apart from segments) relationship ranks 2, 4, ... of the
    /// re-ranked layout, unplugging the segments that lived there.
    fn remove_relationship_ranks(&mut self, fused: &mut FusedTwins) -> Result<()> {
        let mut r = 2;
        while r <= self.max_rank {
            let row = self.order.remove_rank(r);
            for v in row {
                if let Some(&child) = self.gg.out_edges(v).first() {
                    fused.replace_target(v, child);
                }
                self.gg.unplug_virtual_vertex(v)?;
                self.ranks[v] = 0;
                self.order.push(0, v);
            }
            for rank in self.ranks.iter_mut() {
                if *rank > r {
                    *rank -= 1;
                }
            }
            self.max_rank -= 1;
            r += 2;
        }

        let removed = self.order.remove_unplugged();
        for (i, &id) in removed.iter().enumerate() {
            let id = id - i;
            self.ranks.remove(id);
            self.gg.remove(id)?;
        }
        fused.forget_ids(&removed);
        Ok(())
    }

    /// Cheap fixes right after re-ranking: a parentless person with a single relationship is
    /// put right next to it, and child hubs follow the order of their relationships.
    fn improve_ordering(&mut self) {
        for r in 1..=self.max_rank {
            let mut oo = 0;
            while oo < self.order.rank_len(r) {
                let current = oo;
                oo += 1;
                let Some(v) = self.order.vertex_at(r, current) else {
                    continue;
                };
                if !self.gg.is_person(v) || !self.gg.in_edges(v).is_empty() {
                    continue;
                }
                let &[rel] = self.gg.out_edges(v) else {
                    continue;
                };
                if self.ranks[rel] != r {
                    continue;
                }
                let (order_v, order_rel) =
                    (self.order.position(v) as isize, self.order.position(rel) as isize);
                if (order_rel - order_v).abs() != 1 {
                    let amount = if order_rel > order_v {
                        order_rel - order_v - 1
                    } else {
                        order_rel - order_v + 1
                    };
                    self.order.move_by(r, order_v as usize, amount);
                }
            }
        }

        let layers = Layers::new(&self.gg, &self.ranks, self.max_rank, &self.options.tuning);
        let mut r = 2;
        while r <= self.max_rank {
            if !layers.childhubs_in_correct_order(&self.order, r) {
                layers.place_childhubs_in_correct_order(&mut self.order, r);
            }
            r += 2;
        }
    }

    // ---- twins ---------------------------------------------------------------------------

    /// Puts fused twins back next to their representative, with their own edges.
    fn reconnect_twins(&mut self, fused: &FusedTwins) -> Result<()> {
        for (representative, twins) in fused.groups() {
            let rank = self.ranks[representative];
            for twin in twins {
                fused.restore_edges(&mut self.gg, representative, twin)?;
                fused.restore_childhub_edge(&mut self.gg, representative, twin)?;

                let out = self.gg.out_edges(twin).to_vec();
                let position = self.find_best_twin_insert_position(twin, &out)?;
                self.order.insert(rank, position, twin);

                for rel in out {
                    if !self.gg.is_relationship(rel) {
                        continue;
                    }
                    let Some(&other) = self.gg.in_edges(rel).iter().find(|&&u| u != twin) else {
                        continue;
                    };
                    self.join_twin_couple(twin, other, rel, rank)?;
                }
            }
        }
        Ok(())
    }

    /// Twins of one group in a relationship with each other stay adjacent with the
    /// relationship right between them.
    fn join_twin_couple(
        &mut self,
        twin: VertexId,
        other: VertexId,
        rel: VertexId,
        rank: Rank,
    ) -> Result<()> {
        let group = self.gg.twin_group_id(twin);
        if group.is_none() || self.gg.twin_group_id(other) != group || self.ranks[other] != rank {
            return Ok(());
        }
        let Some(&hub) = self.gg.in_edges(twin).first() else {
            return Ok(());
        };
        if !self.gg.has_edge(hub, other) {
            return Ok(());
        }

        let (o1, o2) = (self.order.position(twin), self.order.position(other));
        if o1.abs_diff(o2) != 1 {
            let (mover, anchor) = if self.gg.out_edges(twin).len() == 1 {
                (o1, o2)
            } else if self.gg.out_edges(other).len() == 1 {
                (o2, o1)
            } else {
                return Ok(());
            };
            let target = if mover < anchor { anchor } else { anchor + 1 };
            self.order.move_vertex_to_order(rank, mover, target);
        }

        let (o1, o2) = (self.order.position(twin), self.order.position(other));
        if self.ranks[rel] == rank {
            self.order
                .move_vertex_to_order(rank, self.order.position(rel), o1.max(o2));
        }
        Ok(())
    }

    /// Position among the placed twins of `v` where a new twin crosses the fewest partner
    /// lines (`rels` are the relationships the new twin connects to).
    pub fn find_best_twin_insert_position(&self, v: VertexId, rels: &[VertexId]) -> Result<usize> {
        let rank = self.ranks[v];
        let mut twins: Vec<VertexId> = self
            .gg
            .all_twins_of(v)?
            .into_iter()
            .filter(|&u| self.order.is_placed(u))
            .collect();
        if twins.is_empty() {
            return Ok(self.order.rank_len(rank));
        }
        self.order.sort_by_order(&mut twins);
        let n = twins.len();
        let left_most = self.order.position(twins[0]);

        // across[j]: crossings when inserted in front of the j-th twin.
        let mut across = vec![0usize; n + 1];
        for &rel in rels {
            if self.order.position(rel) < left_most {
                for (j, slot) in across.iter_mut().enumerate().skip(1) {
                    *slot += j;
                }
            } else {
                for (j, slot) in across.iter_mut().enumerate().take(n) {
                    *slot += n - j;
                }
            }
        }
        let layers = self.layers();
        for (i, &twin) in twins.iter().enumerate() {
            let (left, right) = layers.left_and_right_partners(&self.order, twin);
            for slot in &mut across[..=i] {
                *slot += left.len();
            }
            for slot in &mut across[i + 1..] {
                *slot += right.len();
            }
        }

        let mut best = 0;
        for (j, &value) in across.iter().enumerate() {
            if value <= across[best] {
                best = j;
            }
        }

        // Relationships between twins push the slot further right.
        let mut position = left_most + best;
        let mut i = left_most + 1;
        while i < position {
            if self
                .order
                .vertex_at(rank, i)
                .is_some_and(|u| self.gg.is_relationship(u))
            {
                position += 1;
            }
            i += 1;
        }
        Ok(position)
    }

    // ---- vertical placement --------------------------------------------------------------

    /// Recomputes ancestors, vertical levels and (unless `keep_rank_y`) the rank heights.
    pub fn update_secondary_structures(&mut self, keep_rank_y: bool) {
        let started = Instant::now();
        self.ancestors = Ancestors::find(&self.gg, &self.order, self.max_rank);
        self.vertical = self
            .layers()
            .position_vertically(&self.order, &self.positions);
        if keep_rank_y && self.rank_y.len() > self.max_rank {
            self.rank_y.truncate(self.max_rank + 1);
        } else {
            self.rank_y = self.compute_rank_y();
        }
        tracing::debug!(
            consanguineous = self.ancestors.consanguineous().len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "secondary structures"
        );
    }

    pub fn compute_rank_y(&self) -> Vec<f64> {
        let spacing = &self.options.vertical;
        let mut rank_y = vec![0.0, 0.0];
        for r in 2..=self.max_rank {
            let distance = if self.is_childhub_rank(r) {
                self.person_rank_height(r - 1)
            } else {
                spacing.childhub_to_node
            };
            let extra_lines = self.vertical.rank_levels(r - 1).max(1) - 1;
            let y = rank_y[r - 1] + distance + spacing.extra_per_horizontal_line * extra_lines as f64;
            rank_y.push(y);
        }
        rank_y
    }

    /// Whether rank `r` holds child hubs (judged by its first non-segment vertex).
    pub fn is_childhub_rank(&self, r: Rank) -> bool {
        for &v in self.order.rank(r) {
            if self.gg.is_person(v) || self.gg.is_relationship(v) {
                return false;
            }
            if self.gg.is_childhub(v) {
                return true;
            }
        }
        true
    }

    /// Distance from a person rank down to the child hub rank below it, grown for ranks whose
    /// persons carry long labels.
    fn person_rank_height(&self, r: Rank) -> f64 {
        let spacing = &self.options.vertical;
        let max_lines = self
            .order
            .rank(r)
            .iter()
            .map(|&v| self.label_lines(v))
            .fold(0.0, f64::max);
        let mut height = spacing.node_to_childhub;
        if max_lines > 3.0 {
            height += (max_lines - 3.0) * spacing.comment_line_height;
        }
        height
    }

    /// Number of text lines rendered under a person (fractional for smaller fonts).
    pub fn label_lines(&self, v: VertexId) -> f64 {
        let Some(p) = self.gg.person(v) else {
            return 0.0;
        };
        let mut lines = 0.0;
        if let Some(comments) = &p.comments {
            lines += (comments.trim().matches('\n').count() + 1) as f64;
        }
        if p.extra.contains_key("phenotipsId") {
            lines += 1.1;
        }
        let born = p.birth_date.as_ref().and_then(|d| d.complete_date());
        let died = p.death_date.as_ref().and_then(|d| d.complete_date());
        if born.is_some() {
            lines += 1.0;
        }
        if died.is_some() {
            lines += 1.0;
        }
        if let (Some(born), Some(died)) = (born, died) {
            // Ages under a year are shown on the same line as the dates.
            if lived_less_than_a_year(born, died) {
                lines -= 1.0;
            }
        }
        if p.first_name.is_some() || p.last_name.is_some() {
            lines += 1.0;
        }
        if p.external_id.is_some() {
            lines += 1.0;
        }
        if p.extra.contains_key("deceasedCause") || p.extra.contains_key("deceasedAge") {
            lines += 1.0;
        }
        if p.extra.get("childlessReason").is_some_and(is_truthy) {
            lines += 0.9;
        }
        lines
    }

    /// Rendered height of a person node including its label block.
    pub fn person_height(&self, v: VertexId) -> f64 {
        let spacing = &self.options.vertical;
        spacing.person_height + self.label_lines(v) * spacing.comment_line_height
    }

    pub fn compute_node_y(&self, rank: Rank, level: usize) -> f64 {
        let base = self.rank_y.get(rank).copied().unwrap_or(0.0);
        base + (level as f64 - 1.0) * self.options.vertical.extra_per_horizontal_line
    }

    pub fn compute_rel_line_y(&self, rank: Rank, attach_level: usize, vertical_level: usize) -> RelLineY {
        let spacing = &self.options.vertical;
        let base = self.rank_y.get(rank).copied().unwrap_or(0.0);
        let attach_y = base - attach_level as f64 * spacing.attach_port_height;
        let rel_line_y = match vertical_level {
            1 => attach_y,
            2 => base - spacing.extra_per_horizontal_line * 1.25,
            level => base - level as f64 * spacing.extra_per_horizontal_line,
        };
        RelLineY {
            attach_y,
            rel_line_y,
        }
    }

    // ---- graph walks ---------------------------------------------------------------------

    /// Breadth-first search from `starts` over the edges accepted by `edge_included`
    /// (called with the edge's source and target). Stops as soon as a vertex of `stop_set`
    /// is reached or more than `max_size` vertices were added.
    pub fn find_connected_component(
        &self,
        starts: &[VertexId],
        edge_included: impl Fn(VertexId, VertexId) -> bool,
        stop_set: &HashSet<VertexId>,
        max_size: Option<usize>,
    ) -> ConnectedComponent {
        let mut result = ConnectedComponent::default();
        let mut queue: VecDeque<VertexId> = VecDeque::new();
        for &v in starts {
            if result.component.insert(v) {
                queue.push_back(v);
            }
        }

        while let Some(next) = queue.pop_front() {
            let out = self.gg.out_edges(next).iter().map(|&u| (next, u, u));
            let ins = self.gg.in_edges(next).iter().map(|&u| (u, next, u));
            for (from, to, u) in out.chain(ins) {
                if !edge_included(from, to) || result.component.contains(&u) {
                    continue;
                }
                result.component.insert(u);
                queue.push_back(u);
                result.size += 1;
                if stop_set.contains(&u) {
                    result.stop_reached = true;
                    return result;
                }
                if max_size.is_some_and(|max| result.size > max) {
                    return result;
                }
            }
        }
        result
    }

    // ---- lockstep edits ------------------------------------------------------------------

    /// Adds a vertex to the graph and places it at `order_position` on `rank` with an
    /// undefined x-coordinate. Rank 0 opens a new top rank; a rank past the bottom opens a
    /// new bottom rank. Returns the new id.
    pub fn insert_vertex(
        &mut self,
        data: VertexData,
        weight: EdgeWeight,
        in_edges: &[VertexId],
        out_edges: &[VertexId],
        rank: Rank,
        order_position: usize,
    ) -> Result<VertexId> {
        let mut rank = rank;
        if rank == 0 {
            for r in self.ranks.iter_mut() {
                *r += 1;
            }
            self.max_rank += 1;
            self.order.insert_rank(1);
            rank = 1;
        } else if rank > self.max_rank {
            self.max_rank = rank;
            self.order.insert_rank(rank);
        }

        let id = self
            .gg
            .insert_vertex(data, weight, in_edges, out_edges, None)?;
        self.ranks.insert(id, rank);
        self.order
            .insert_and_shift_all_ids_above_v_by_one(id, rank, order_position);
        self.positions.insert(id, f64::NEG_INFINITY);
        Ok(id)
    }

    /// Removes `v` from every parallel structure; ids above `v` move down by one.
    pub fn remove_vertex(&mut self, v: VertexId) -> Result<()> {
        let rank = *self
            .ranks
            .get(v)
            .ok_or_else(|| Error::precondition("remove_vertex", v))?;
        self.order.remove(v, rank)?;
        self.ranks.remove(v);
        self.positions.remove(v);
        self.gg.remove(v)?;
        self.proband = match self.proband {
            Some(p) if p == v => None,
            Some(p) if p > v => Some(p - 1),
            p => p,
        };
        Ok(())
    }

    pub(crate) fn recompute_max_rank(&mut self) {
        self.max_rank = self.ranks.iter().copied().max().unwrap_or(0);
    }
}

fn lived_less_than_a_year(born: NaiveDate, died: NaiveDate) -> bool {
    died.years_since(born).is_none_or(|years| years < 1)
}

fn is_truthy(v: &serde_json::Value) -> bool {
    match v {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|x| x != 0.0),
        serde_json::Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pedigree_graph::{Gender, PersonProperties, RelationshipProperties};

    fn person(gender: Gender) -> VertexData {
        VertexData::Person(PersonProperties::with_gender(gender))
    }

    /// Father, mother and one child.
    fn trio() -> BaseGraph {
        let mut g = BaseGraph::new();
        let father = g.add_vertex(person(Gender::Male), None).unwrap();
        let mother = g.add_vertex(person(Gender::Female), None).unwrap();
        let rel = g
            .add_vertex(VertexData::Relationship(RelationshipProperties::default()), None)
            .unwrap();
        let hub = g.add_vertex(VertexData::ChildHub, None).unwrap();
        let child = g.add_vertex(person(Gender::Unknown), None).unwrap();
        g.add_edge(father, rel, 1).unwrap();
        g.add_edge(mother, rel, 1).unwrap();
        g.add_edge(rel, hub, 1).unwrap();
        g.add_edge(hub, child, 1).unwrap();
        g
    }

    #[test]
    fn relationship_sits_between_its_partners() {
        let dg = PositionedGraph::new(trio(), Some(4), LayoutOptions::default(), None).unwrap();
        assert_eq!(dg.max_rank(), 3);
        assert_eq!(dg.ranks()[0], 1);
        assert_eq!(dg.ranks()[2], 1);
        assert_eq!(dg.ranks()[3], 2);
        assert_eq!(dg.ranks()[4], 3);
        assert_eq!(dg.order().position(2), 1);
    }

    #[test]
    fn crowded_neighbours_are_spread_apart() {
        let dg = PositionedGraph::new(trio(), Some(4), LayoutOptions::default(), None).unwrap();
        let frame = crate::position::Frame::new(&dg.gg, &dg.ranks, &dg.order, &dg.options.separations);
        // father, relationship, mother
        let row = dg.order().rank(1);
        assert_eq!(row.len(), 3);
        let mut crowded = dg.positions().to_vec();
        for &v in row {
            crowded[v] = 0.0;
        }

        let mut xcoord = crate::position::XCoord::unchecked(frame, crowded);
        assert!(xcoord.validate().is_err());
        assert!(xcoord.spread_crowded_neighbours());
        assert!(xcoord.validate().is_ok());
        assert!(!xcoord.spread_crowded_neighbours());
        for pair in row.windows(2) {
            let gap = xcoord.x(pair[1]) - xcoord.x(pair[0]);
            assert_eq!(gap, frame.min_separation(pair[0], pair[1]));
        }
    }

    #[test]
    fn rel_line_levels() {
        let dg = PositionedGraph::new(trio(), None, LayoutOptions::default(), None).unwrap();
        let base = dg.rank_y()[1];
        assert_eq!(dg.compute_rel_line_y(1, 0, 1).rel_line_y, base);
        assert_eq!(dg.compute_rel_line_y(1, 0, 2).rel_line_y, base - 5.0);
        assert_eq!(dg.compute_rel_line_y(1, 1, 3).attach_y, base - 1.5);
        assert_eq!(dg.compute_rel_line_y(1, 1, 3).rel_line_y, base - 12.0);
    }

    #[test]
    fn rank_y_grows_downwards() {
        let dg = PositionedGraph::new(trio(), None, LayoutOptions::default(), None).unwrap();
        let y = dg.rank_y();
        assert_eq!(y.len(), 4);
        assert_eq!(y[1], 0.0);
        assert!(y[2] > y[1]);
        assert!(y[3] > y[2]);
    }

    #[test]
    fn component_search_stops_at_stop_set() {
        let dg = PositionedGraph::new(trio(), None, LayoutOptions::default(), None).unwrap();
        let stop: HashSet<VertexId> = [4].into_iter().collect();
        let found = dg.find_connected_component(&[0], |_, _| true, &stop, None);
        assert!(found.stop_reached);

        let none: HashSet<VertexId> = HashSet::default();
        let all = dg.find_connected_component(&[0], |_, _| true, &none, None);
        assert!(!all.stop_reached);
        assert_eq!(all.component.len(), 5);
        assert_eq!(all.size, 4);
    }

    #[test]
    fn label_lines_count_names_and_dates() {
        let mut g = BaseGraph::new();
        let mut p = PersonProperties::with_gender(Gender::Female);
        p.first_name = Some("Ann".into());
        p.comments = Some("one\ntwo".into());
        p.birth_date = Some(pedigree_graph::PedigreeDate::from_ymd(1950, 1, 1));
        g.add_vertex(VertexData::Person(p), None).unwrap();
        let dg = PositionedGraph::new(g, Some(0), LayoutOptions::default(), None).unwrap();
        assert_eq!(dg.label_lines(0), 4.0);
    }
}
