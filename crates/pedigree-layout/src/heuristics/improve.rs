//! Post-positioning clean-up passes.

use super::shift::{ShiftRequest, desired_childhub_location};
use crate::position::{Frame, XCoord};
use crate::positioned::PositionedGraph;
use pedigree_graph::{Result, VertexData, VertexId, VirtualEdgeSegment};
use rustc_hash::FxHashSet as HashSet;
use std::time::Instant;

impl PositionedGraph {
    /// Fixes common imperfections of a finished layout.
    ///
    /// Partner lines to another generation first leave the person sideways, then long edges
    /// get straightened, relationships are pulled above their children (or children below
    /// their relationship), slack is squeezed out, and finally relationships are centred
    /// between the partners. Nothing here changes the graph other than routing partner lines.
    ///
    /// The straightening and polishing passes repeat until the coordinates stop changing (at
    /// most `heuristic_max_iterations` times), so running this again on its own result moves
    /// nothing.
    pub fn improve_positioning(&mut self) -> Result<()> {
        let started = Instant::now();

        let rerouted = self.route_partner_lines_sideways()?;
        let max_passes = self.options.tuning.heuristic_max_iterations.max(1);
        let mut passes = 0;
        let mut settled = false;
        while !settled && passes < max_passes {
            let previous = self.positions.clone();
            self.optimize_long_edge_placement()?;
            self.polish_positions()?;
            settled = self.positions == previous;
            passes += 1;
        }
        if !settled {
            tracing::warn!(passes, "positions did not settle");
        }

        tracing::debug!(
            rerouted,
            passes,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "improved positioning"
        );
        Ok(())
    }

    fn polish_positions(&mut self) -> Result<()> {
        let positions = std::mem::take(&mut self.positions);
        let frame = Frame::new(&self.gg, &self.ranks, &self.order, &self.options.separations);
        let mut xcoord = XCoord::unchecked(frame, positions);
        let outcome = self.polish(&mut xcoord);
        self.positions = xcoord.into_positions();
        outcome
    }

    /// Makes every partner line that ends on another rank start with a horizontal piece on
    /// the person's own rank. Returns the number of lines rerouted.
    fn route_partner_lines_sideways(&mut self) -> Result<usize> {
        let Some(max_real) = self.gg.max_real_vertex_id() else {
            return Ok(0);
        };
        let mut rerouted = 0;

        for parent in 0..=max_real {
            if !self.gg.is_person(parent) {
                continue;
            }
            let rank = self.ranks[parent];
            let order = self.order.position(parent);

            let mut multi_rank = Vec::new();
            let (mut same_rank_left, mut same_rank_right) = (0, 0);
            for &u in self.gg.out_edges(parent) {
                if self.ranks[u] != rank {
                    multi_rank.push(u);
                } else if self.order.position(u) < order {
                    same_rank_left += 1;
                } else {
                    same_rank_right += 1;
                }
            }
            if multi_rank.is_empty() {
                continue;
            }

            // Lines ending left of the person come first, ordered left to right; those ending
            // to the right follow in reverse, so lines landing closer are inserted closer and
            // never cross each other.
            let parent_x = self.positions[parent];
            let key = |v: VertexId| {
                let x = self.positions[self.gg.down_the_chain_until_non_virtual(v)];
                if x >= parent_x { (1, -x) } else { (0, x) }
            };
            multi_rank.sort_by(|&a, &b| {
                let (ka, kb) = (key(a), key(b));
                ka.0.cmp(&kb.0).then(ka.1.total_cmp(&kb.1))
            });

            let single = multi_rank.len() == 1;
            for first in multi_rank {
                let target = self.gg.down_the_chain_until_non_virtual(first);
                let (target_x, parent_x) = (self.positions[target], self.positions[parent]);
                let mut to_the_right = target_x >= parent_x;
                if target_x == parent_x && same_rank_right > 0 && same_rank_left == 0 && single {
                    to_the_right = false;
                }

                let new_order = self.sideways_insert_order(parent, first, to_the_right);
                let weight = self.gg.remove_edge(parent, first)?;
                let segment = VirtualEdgeSegment::new(parent, target, 0);
                let new = self.insert_vertex(
                    VertexData::VirtualEdge(segment),
                    weight,
                    &[parent],
                    &[first],
                    rank,
                    new_order,
                )?;
                self.place_new_vertex(new, first);
                rerouted += 1;
            }
        }
        Ok(rerouted)
    }

    fn sideways_insert_order(&self, parent: VertexId, first: VertexId, to_the_right: bool) -> usize {
        let gg = &self.gg;
        let row = self.order.rank(self.ranks[parent]);
        let first_x = self.positions[first];
        let parent_order = self.order.position(parent);

        // `person` sits next to `rel` and has no other relationship: crossing that short
        // line would be ugly.
        let attached = |person: Option<&VertexId>, rel: Option<&VertexId>| match (person, rel) {
            (Some(&p), Some(&r)) => {
                gg.is_relationship(r) && gg.is_person(p) && gg.has_edge(p, r) && gg.out_edges(p).len() == 1
            }
            _ => false,
        };

        let mut new_order;
        if to_the_right {
            new_order = parent_order + 1;
            while new_order < row.len() && first_x > self.positions[row[new_order]] {
                new_order += 1;
            }
            let (left, right) = (new_order.checked_sub(1).and_then(|o| row.get(o)), row.get(new_order));
            if attached(right, left) {
                new_order += 1;
            }
            if attached(left, right) {
                new_order -= 1;
            }
        } else {
            new_order = parent_order;
            while new_order > 0 && first_x < self.positions[row[new_order - 1]] {
                new_order -= 1;
            }
            let (left, right) = (new_order.checked_sub(1).and_then(|o| row.get(o)), row.get(new_order));
            if attached(left, right) {
                new_order -= 1;
            }
            if attached(right, left) {
                new_order += 1;
            }
        }
        new_order
    }

    fn polish(&self, xcoord: &mut XCoord<'_>) -> Result<()> {
        let gg = &self.gg;
        let tuning = &self.options.tuning;
        let real_ids = 0..gg.real_vertex_count();

        for v in real_ids.clone().filter(|&v| gg.is_relationship(v)) {
            let hub = gg.relationship_childhub(v)?;
            let rel_x = xcoord.x(v);
            if xcoord.x(hub) != rel_x {
                xcoord.move_node_as_close_to_x_as_possible(hub, rel_x);
            }
        }

        // Close gaps between siblings left by removals, only moving children without
        // relationships towards the outermost children that have some.
        for hub in real_ids.filter(|&v| gg.is_childhub(v)) {
            let mut children = gg.out_edges(hub).to_vec();
            if children.len() < 2 {
                continue;
            }
            self.order.sort_by_order(&mut children);
            let last = children.len() - 1;
            if let Some(anchor) = (0..=last).rev().find(|&i| i == 0 || !gg.out_edges(children[i]).is_empty()) {
                for &child in &children[anchor + 1..] {
                    xcoord.shift_left_one_vertex(child, f64::INFINITY);
                }
            }
            if let Some(anchor) = (0..=last).find(|&i| i == last || !gg.out_edges(children[i]).is_empty()) {
                for &child in children[..anchor].iter().rev() {
                    xcoord.shift_right_one_vertex(child, f64::INFINITY);
                }
            }
        }

        self.compact_graph(xcoord, Some(tuning.compact_max_component_size))?;

        let relationships = self.order.left_to_right_top_to_bottom(|v| gg.is_relationship(v));
        for _ in 0..tuning.heuristic_max_iterations {
            let mut improved = false;
            for &rel in &relationships {
                improved |= self.align_with_children(xcoord, rel)?;
            }
            if !improved {
                break;
            }
        }

        // Last resort when all children hang off one side of the child line: bring the
        // closest child under it.
        for &rel in &relationships {
            let hub = gg.relationship_childhub(rel)?;
            let hub_x = xcoord.x(hub);
            let info = self.analyze_children(hub)?;
            let left_x = xcoord.x(info.left_most_child);
            let right_x = xcoord.x(info.right_most_child);
            if left_x > hub_x && right_x > hub_x {
                let amount = hub_x - left_x;
                if xcoord.slack_on_the_left(info.left_most_child) >= -amount {
                    xcoord.shift(info.left_most_child, amount);
                }
            } else if left_x < hub_x && right_x < hub_x {
                let amount = hub_x - right_x;
                if xcoord.slack_on_the_right(info.right_most_child) >= amount {
                    xcoord.shift(info.right_most_child, amount);
                }
            }
        }

        self.compact_graph(xcoord, None)?;

        for _ in 0..tuning.heuristic_max_iterations {
            let mut improved = false;
            for &rel in &relationships {
                improved |= self.center_between_partners(xcoord, rel)?;
            }
            if !improved {
                break;
            }
        }
        Ok(())
    }

    /// Moves either the relationship (with its partners) or the children so that the child
    /// line ends up above the children. Returns whether anything moved in a way worth
    /// another round.
    fn align_with_children(&self, xcoord: &mut XCoord<'_>, rel: VertexId) -> Result<bool> {
        let gg = &self.gg;
        let parents = gg.in_edges(rel);
        if parents.len() != 2 {
            return Ok(false);
        }
        let hub = gg.relationship_childhub(rel)?;
        let hub_x = xcoord.x(hub);
        let info = self.analyze_children(hub)?;
        if info.unrelated_nodes_between_children {
            return Ok(false);
        }

        let mut improved = false;
        let misalignment = if let [child] = info.ordered_children[..] {
            if xcoord.x(child) == hub_x {
                return Ok(false);
            }
            improved = xcoord.move_node_as_close_to_x_as_possible(child, hub_x);
            if xcoord.x(child) == hub_x {
                return Ok(improved);
            }
            xcoord.x(child) - hub_x
        } else {
            let desired = desired_childhub_location(&info, xcoord, None);
            if desired.min_preferred <= hub_x && hub_x <= desired.max_preferred {
                return Ok(false);
            }
            let shift_to = if hub_x > desired.max_preferred {
                desired.max_preferred
            } else {
                desired.min_preferred
            };
            let mut need_to_shift = hub_x - shift_to;
            if info.num_with_partners == 0 {
                let available = if need_to_shift < 0.0 {
                    -need_to_shift.abs().min(xcoord.slack_on_the_left(info.left_most_child))
                } else {
                    need_to_shift.min(xcoord.slack_on_the_right(info.right_most_child))
                };
                if available != 0.0 {
                    for &child in &info.ordered_children {
                        xcoord.shift(child, available);
                    }
                    improved = true;
                    need_to_shift -= available;
                }
            }
            -need_to_shift
        };
        if misalignment == 0.0 {
            return Ok(improved);
        }

        let (left_parent, right_parent) = if xcoord.x(parents[0]) < xcoord.x(parents[1]) {
            (parents[0], parents[1])
        } else {
            (parents[1], parents[0])
        };
        let rel_rank = self.ranks[rel];
        let rel_order = self.order.position(rel);
        let left_next = self.ranks[left_parent] == rel_rank && self.order.position(left_parent) + 1 == rel_order;
        let right_next = self.ranks[right_parent] == rel_rank && self.order.position(right_parent) == rel_order + 1;
        let left_movable = left_next && !gg.is_virtual(left_parent);
        let right_movable = right_next && !gg.is_virtual(right_parent);

        let tuning = &self.options.tuning;
        let (max_persons, max_rels) = (tuning.parent_shift_max_persons, tuning.parent_shift_max_relationships);
        let children: HashSet<VertexId> = info.ordered_children.iter().copied().collect();
        let parent_request = |shift_list: Vec<VertexId>, shift: f64, max_persons, max_rels| {
            let mut request = ShiftRequest::new(shift_list.clone(), shift, max_persons, max_rels);
            request.no_up.insert(rel);
            request.no_down = shift_list.into_iter().collect();
            request.forbidden = children.clone();
            request
        };

        let mut shift_list = vec![rel, hub];
        if left_movable && (misalignment > 0.0 || xcoord.slack_on_the_left(rel) < -misalignment) {
            shift_list.insert(0, left_parent);
        }
        if right_movable && (misalignment < 0.0 || xcoord.slack_on_the_right(rel) < misalignment) {
            shift_list.push(right_parent);
        }
        let parent_shift =
            self.find_affected_set(xcoord, parent_request(shift_list, misalignment, max_persons, max_rels))?;

        let mut child_request = ShiftRequest::new(info.ordered_children.clone(), -misalignment, max_persons, max_rels);
        child_request.no_up = children.clone();
        child_request.forbidden = [rel, hub].into_iter().collect();
        let child_shift = self.find_affected_set(xcoord, child_request)?;

        let parent_ok = parent_shift.is_acceptable(false, max_persons, max_rels);
        let child_ok = child_shift.is_acceptable(false, max_persons, max_rels);
        if parent_ok && (!child_ok || parent_shift.is_better_than(&child_shift)) {
            tracing::trace!(relationship = rel, misalignment, "shifting parents towards children");
            parent_shift.apply(xcoord, misalignment);
            return Ok(true);
        }
        if child_ok {
            tracing::trace!(relationship = rel, misalignment, "shifting children towards parents");
            child_shift.apply(xcoord, -misalignment);
            return Ok(true);
        }

        // Cannot go all the way: move the parents as far as they go freely.
        let small_shift = if misalignment < 0.0 {
            let node = if left_next { left_parent } else { rel };
            (-xcoord.slack_on_the_left(node)).max(misalignment)
        } else {
            let node = if right_next { right_parent } else { rel };
            xcoord.slack_on_the_right(node).min(misalignment)
        };
        if small_shift == 0.0 || small_shift == misalignment {
            return Ok(improved);
        }
        let mut shift_list = vec![rel, hub];
        if left_movable {
            shift_list.insert(0, left_parent);
        }
        if right_movable {
            shift_list.push(right_parent);
        }
        let (max_persons, max_rels) = (tuning.small_shift_max_persons, tuning.small_shift_max_relationships);
        let small = self.find_affected_set(xcoord, parent_request(shift_list, small_shift, max_persons, max_rels))?;
        if small.is_acceptable(false, max_persons, max_rels) {
            tracing::trace!(relationship = rel, small_shift, "partially shifting parents");
            small.apply(xcoord, small_shift);
        }
        Ok(improved)
    }

    /// Centres a relationship between two partners standing right next to it, provided that
    /// only vertices further down follow.
    fn center_between_partners(&self, xcoord: &mut XCoord<'_>, rel: VertexId) -> Result<bool> {
        let mut parents = self.gg.in_edges(rel).to_vec();
        let rank = self.ranks[rel];
        if parents.len() != 2 || parents.iter().any(|&p| self.ranks[p] != rank) {
            return Ok(false);
        }
        self.order.sort_by_order(&mut parents);
        if self.order.position(parents[1]) - self.order.position(parents[0]) != 2 {
            return Ok(false);
        }

        let mid_x = ((xcoord.right_edge(parents[0]) + xcoord.left_edge(parents[1])) / 2.0).floor();
        let rel_x = xcoord.x(rel);
        if rel_x == mid_x {
            return Ok(false);
        }

        let tuning = &self.options.tuning;
        let (max_persons, max_rels) = (tuning.straighten_max_persons, tuning.straighten_max_relationships);
        let shift = mid_x - rel_x;
        let mut request = ShiftRequest::new(vec![rel, self.gg.relationship_childhub(rel)?], shift, max_persons, max_rels);
        request.no_up.insert(rel);
        request.stop_at_rank = Some(rank);
        let affected = self.find_affected_set(xcoord, request)?;

        // Relationships further up are assumed to be placed well already.
        if affected.is_acceptable(false, max_persons, max_rels) && affected.min_affected_rank.is_none_or(|r| r > rank) {
            affected.apply(xcoord, shift);
            return Ok(true);
        }
        Ok(false)
    }

    /// Shortens edges spanning needless gaps by moving the vertices on one side of the gap
    /// closer to the other side. With `max_component_size`, only groups up to that size are
    /// moved and child hub ranks are left alone.
    pub(crate) fn compact_graph(&self, xcoord: &mut XCoord<'_>, max_component_size: Option<usize>) -> Result<()> {
        let gg = &self.gg;
        let too_big = |size: usize| max_component_size.is_some_and(|max| size > max);

        for _ in 0..self.options.tuning.heuristic_max_iterations {
            let mut improved = false;

            for rank in 1..self.order.num_ranks() {
                let row = self.order.rank(rank);
                for order in 0..row.len().saturating_sub(1) {
                    let v = row[order];
                    if gg.is_childhub(v) {
                        break;
                    }
                    if xcoord.slack_on_the_right(v) == 0.0 {
                        continue;
                    }

                    let producing = if gg.is_person(v) { gg.producing_relationship(v)? } else { None };
                    let sibling_hub = match producing {
                        Some(rel) => Some(gg.relationship_childhub(rel)?),
                        None => None,
                    };
                    // Edges across the gap right of `v` do not hold the two sides together.
                    let holds = |from: VertexId, to: VertexId| {
                        let (order_from, order_to) = (self.order.position(from), self.order.position(to));
                        if self.ranks[from] == rank
                            && self.ranks[to] == rank
                            && ((order_from <= order && order_to > order) || (order_to <= order && order_from > order))
                        {
                            return false;
                        }
                        !(Some(from) == sibling_hub && order_to > order)
                    };

                    let right = row[order + 1];
                    let stop: HashSet<VertexId> = [right].into_iter().collect();
                    let mut component = self.find_connected_component(&[v], &holds, &stop, max_component_size);
                    if component.stop_reached {
                        continue;
                    }
                    let mut left_side = true;
                    if too_big(component.size) {
                        component = self.find_connected_component(&[right], &holds, &HashSet::default(), max_component_size);
                        if too_big(component.size) {
                            continue;
                        }
                        left_side = false;
                    }

                    let (left_slack, right_slack) = xcoord.find_vertex_set_slacks(&component.component);
                    let slack = if left_side { right_slack } else { -left_slack };
                    if slack == 0.0 || !slack.is_finite() {
                        continue;
                    }
                    for &u in &component.component {
                        xcoord.shift(u, slack);
                    }
                    improved = true;
                }
            }

            if max_component_size.is_none() {
                improved |= self.compact_childhub_ranks(xcoord)?;
            }
            if !improved {
                break;
            }
        }
        Ok(())
    }

    /// Moves child hubs lying outside the span of their children, together with whatever
    /// hangs above them, towards the children.
    fn compact_childhub_ranks(&self, xcoord: &mut XCoord<'_>) -> Result<bool> {
        let gg = &self.gg;
        let mut improved = false;
        for rank in 1..self.order.num_ranks() {
            for &v in self.order.rank(rank) {
                if gg.is_person(v) || gg.is_relationship(v) {
                    break;
                }
                if !gg.is_childhub(v) {
                    continue;
                }
                let hub_x = xcoord.x(v);
                let info = self.analyze_children(v)?;
                let desired = desired_childhub_location(&info, xcoord, None);
                if hub_x >= desired.left_x && hub_x <= desired.right_x {
                    continue;
                }
                let wanted = if hub_x > desired.max_preferred {
                    desired.max_preferred - hub_x
                } else {
                    desired.min_preferred - hub_x
                };

                let children: HashSet<VertexId> = gg.out_edges(v).iter().copied().collect();
                let component = self.find_connected_component(&[v], |from, _| from != v, &children, None);
                if component.stop_reached {
                    continue;
                }
                let (left_slack, right_slack) = xcoord.find_vertex_set_slacks(&component.component);
                let slack = if wanted > 0.0 {
                    wanted.min(right_slack)
                } else {
                    wanted.max(-left_slack)
                };
                if slack == 0.0 {
                    continue;
                }
                for &u in &component.component {
                    xcoord.shift(u, slack);
                }
                improved = true;
            }
        }
        Ok(improved)
    }
}
