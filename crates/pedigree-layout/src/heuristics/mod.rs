//! Local corrections applied after every structural change.
//!
//! None of these is needed for a valid layout; they exist for visual quality and each one
//! silently does nothing when its preconditions do not hold.

mod domino;
mod improve;
mod shift;

pub use shift::AffectedSet;

use crate::positioned::PositionedGraph;
use pedigree_graph::{Error, Rank, Result, VertexId};
use rustc_hash::FxHashSet as HashSet;

/// Layout facts about the children of one child hub.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChildrenInfo {
    pub left_most_child: VertexId,
    pub left_most_child_order: usize,
    /// The leftmost child has a relationship or partner further left on its rank.
    pub left_most_has_left_partner: bool,
    pub right_most_child: VertexId,
    pub right_most_child_order: usize,
    pub right_most_has_right_partner: bool,
    pub with_partners: HashSet<VertexId>,
    pub num_with_partners: usize,
    /// Children from left to right.
    pub ordered_children: Vec<VertexId>,
    pub only_placeholder: bool,
    /// Something unrelated to the children was placed between them.
    pub unrelated_nodes_between_children: bool,
}

impl PositionedGraph {
    /// Accepts a child hub or a relationship (which stands for its child hub).
    pub fn analyze_children(&self, childhub: VertexId) -> Result<ChildrenInfo> {
        let childhub = if self.gg.is_relationship(childhub) {
            self.gg.relationship_childhub(childhub)?
        } else {
            childhub
        };
        if !self.gg.is_childhub(childhub) {
            return Err(Error::precondition("analyze_children", childhub));
        }
        let children = self.gg.out_edges(childhub);
        let Some(&first) = children.first() else {
            return Err(Error::precondition("analyze_children", childhub));
        };
        let rank = self.ranks[first];

        let mut info = ChildrenInfo {
            left_most_child_order: usize::MAX,
            only_placeholder: children.len() == 1 && self.gg.is_placeholder(first),
            ..Default::default()
        };
        let mut connected: HashSet<VertexId> = HashSet::default();
        let mut any = false;

        for &child in children {
            let order = self.order.position(child);
            let rels = self.gg.all_relationships(child)?;
            let partners = self.gg.all_partners(child)?;
            connected.insert(child);
            connected.extend(rels.iter().copied());
            connected.extend(partners.iter().copied());

            if order < info.left_most_child_order {
                info.left_most_child = child;
                info.left_most_child_order = order;
                info.left_most_has_left_partner = order > 0
                    && (self.any_between_orders_on_rank(&rels, rank, 0, order - 1)
                        || self.any_between_orders_on_rank(&partners, rank, 0, order - 1));
            }
            if !any || order > info.right_most_child_order {
                info.right_most_child = child;
                info.right_most_child_order = order;
                info.right_most_has_right_partner =
                    self.any_between_orders_on_rank(&rels, rank, order + 1, usize::MAX)
                        || self.any_between_orders_on_rank(&partners, rank, order + 1, usize::MAX);
            }
            any = true;
            if !rels.is_empty() {
                info.with_partners.insert(child);
                info.num_with_partners += 1;
            }
        }

        info.unrelated_nodes_between_children = (info.left_most_child_order + 1
            ..info.right_most_child_order)
            .filter_map(|o| self.order.vertex_at(rank, o))
            .any(|u| !connected.contains(&u));

        let mut ordered = children.to_vec();
        self.order.sort_by_order(&mut ordered);
        info.ordered_children = ordered;
        Ok(info)
    }

    fn any_between_orders_on_rank(
        &self,
        vertices: &[VertexId],
        rank: Rank,
        min_order: usize,
        max_order: usize,
    ) -> bool {
        vertices.iter().any(|&v| {
            self.ranks[v] == rank && (min_order..=max_order).contains(&self.order.position(v))
        })
    }

    /// Exchanges two partners placed as `[p1] [rel] [p2]`, keeping the relationship between
    /// them. Does nothing for any other arrangement.
    pub fn swap_partners(&mut self, partner1: VertexId, partner2: VertexId, rel: VertexId) -> Result<()> {
        let rank = self.ranks[partner1];
        if self.ranks[partner2] != rank || self.ranks[rel] != rank {
            return Err(Error::precondition("swap_partners", rel));
        }
        let (mut left, mut right) = (partner1, partner2);
        if self.order.position(left) > self.order.position(right) {
            std::mem::swap(&mut left, &mut right);
        }
        let (order1, order2) = (self.order.position(left), self.order.position(right));
        let order_rel = self.order.position(rel);
        if order1 + 1 != order_rel || order_rel + 1 != order2 {
            return Ok(());
        }

        tracing::trace!(left, right, rel, "swapping partners");
        self.order.exchange(rank, order1, order2);

        let width_decrease = self.gg.width(left) - self.gg.width(right);
        let right_x = self.positions[right];
        self.positions[right] = self.positions[left];
        self.positions[left] = right_x - width_decrease;
        self.positions[rel] -= width_decrease;
        Ok(())
    }

    /// Turns `[sibling_1] .. [sibling_n] [person]-[rel]-[partner]` into
    /// `[person]-[rel]-[partner] [sibling_1] .. [sibling_n]` (or the mirror image), with
    /// `new_order` the order the person ends up at.
    fn move_sibling_plus_partner_to_order(
        &mut self,
        person: VertexId,
        partner: VertexId,
        rel: VertexId,
        new_order: usize,
    ) {
        let rank = self.ranks[partner];
        let partner_order = self.order.position(partner);
        let person_order = self.order.position(person);
        let rel_order = self.order.position(rel);
        let (Some(at_new), Some(first_sibling)) = (
            self.order.vertex_at(rank, new_order),
            if new_order > person_order {
                self.order.vertex_at(rank, person_order + 1)
            } else {
                person_order
                    .checked_sub(1)
                    .and_then(|o| self.order.vertex_at(rank, o))
            },
        ) else {
            return;
        };

        let move_orders = new_order as isize - person_order as isize;
        let move_distance = self.positions[at_new] - self.positions[person];
        let move_other_distance = self.positions[first_sibling] - self.positions[partner];
        let move_right = new_order > person_order;

        self.order.move_by(rank, person_order, move_orders);
        self.order.move_by(rank, rel_order, move_orders);
        self.order.move_by(rank, partner_order, move_orders);

        for v in [person, partner, rel] {
            self.positions[v] += move_distance;
        }

        let (min_moved, max_moved) = if move_right {
            (partner_order, new_order.saturating_sub(3))
        } else {
            (new_order + 3, partner_order)
        };
        for o in min_moved..=max_moved {
            if let Some(v) = self.order.vertex_at(rank, o) {
                self.positions[v] -= move_other_distance;
            }
        }
    }

    /// Before a new partner is added next to `person`, swaps `person` with its only partner
    /// when that puts the free side where the children leave room.
    pub fn swap_partner_to_bring_to_side_if_possible(&mut self, person: VertexId) -> Result<()> {
        if self.gg.twin_group_id(person).is_some() {
            return Ok(());
        }
        let rank = self.ranks[person];
        let order = self.order.position(person);
        let rank_len = self.order.rank_len(rank);
        if order == 0 || order + 1 == rank_len {
            return Ok(());
        }

        let rels = self.gg.all_relationships(person)?;
        let &[rel] = rels.as_slice() else {
            return Ok(());
        };
        let partners = self.gg.parents(rel)?;
        let partner = if partners[0] == person { partners[1] } else { partners[0] };
        if self.gg.out_edges(partner).len() != 1 || self.ranks[partner] != rank {
            return Ok(());
        }
        let partner_order = self.order.position(partner);
        if partner_order + 2 != order && partner_order != order + 2 {
            return Ok(());
        }
        // Swapping would cross the parent lines.
        if !self.gg.in_edges(person).is_empty() && !self.gg.in_edges(partner).is_empty() {
            return Ok(());
        }

        let hub = self.gg.relationship_childhub(rel)?;
        if self.gg.out_edges(hub).is_empty() {
            return Ok(());
        }
        let to_the_left = order < partner_order;
        let children = self.analyze_children(hub)?;

        let swap = (to_the_left
            && children.left_most_has_left_partner
            && !children.right_most_has_right_partner)
            || (!to_the_left
                && children.right_most_has_right_partner
                && !children.left_most_has_left_partner)
            || (order == 2 && children.right_most_has_right_partner)
            || (order + 3 == rank_len && children.left_most_has_left_partner);
        if swap {
            self.swap_partners(person, partner, rel)?;
        }
        Ok(())
    }

    /// Before a new partner is added to a twin in the middle of its group, trades places with
    /// a twin at the end of the group (right end first) that has no relationships itself.
    pub fn swap_twins_to_bring_to_side_if_possible(&mut self, person: VertexId) -> Result<()> {
        if self.gg.twin_group_id(person).is_none() || !self.gg.out_edges(person).is_empty() {
            return Ok(());
        }
        let mut twins = self.gg.all_twins_of(person)?;
        if twins.len() < 3 {
            return Ok(());
        }
        self.order.sort_by_order(&mut twins);
        let (Some(&first), Some(&last)) = (twins.first(), twins.last()) else {
            return Ok(());
        };
        if person == first || person == last {
            return Ok(());
        }

        let rank = self.ranks[person];
        let target = if self.gg.out_edges(last).is_empty() {
            last
        } else if self.gg.out_edges(first).is_empty() {
            first
        } else {
            return Ok(());
        };

        tracing::trace!(person, target, "moving twin to the side of its group");
        self.order
            .exchange(rank, self.order.position(person), self.order.position(target));
        self.positions.swap(person, target);
        Ok(())
    }

    /// Before parents are added above `person`, moves it and its only partner to the side of
    /// the partner's sibling group so the new parents fit in without crossings.
    pub fn swap_before_parents_to_bring_to_side_if_possible(&mut self, person: VertexId) -> Result<()> {
        let rels = self.gg.all_relationships(person)?;
        let &[rel] = rels.as_slice() else {
            return Ok(());
        };
        let partners = self.gg.parents(rel)?;
        let partner = if partners[0] == person { partners[1] } else { partners[0] };
        if self.gg.in_edges(partner).is_empty()
            || self.ranks[person] != self.ranks[partner]
            || self.gg.out_edges(partner).len() > 1
        {
            return Ok(());
        }

        let order = self.order.position(person);
        let partner_order = self.order.position(partner);
        if partner_order + 2 != order && partner_order != order + 2 {
            return Ok(());
        }
        let to_the_left = order < partner_order;

        let partner_hub = self.gg.in_edges(partner)[0];
        let siblings = self.analyze_children(partner_hub)?;

        if siblings.ordered_children.len() > 1 {
            if siblings.left_most_child == partner {
                if !to_the_left {
                    self.swap_partners(person, partner, rel)?;
                }
                return Ok(());
            }
            if siblings.right_most_child == partner {
                if to_the_left {
                    self.swap_partners(person, partner, rel)?;
                }
                return Ok(());
            }
        }

        // The partner is surrounded by siblings.
        let Some(&partner_parents_rel) = self.gg.in_edges(partner_hub).first() else {
            return Ok(());
        };
        let mut grand_parents = self.gg.in_edges(partner_parents_rel).to_vec();
        if grand_parents.len() != 2 {
            return Ok(());
        }
        self.order.sort_by_order(&mut grand_parents);
        let num_left_partners = self.gg.out_edges(grand_parents[0]).len();
        let num_right_partners = self.gg.out_edges(grand_parents[1]).len();
        if num_left_partners > 1 && num_right_partners > 1 {
            return Ok(());
        }

        if siblings.ordered_children.len() == 1 {
            if num_left_partners == 1 && num_right_partners == 1 {
                return Ok(());
            }
            if num_left_partners == 1 && !to_the_left {
                self.swap_partners(person, partner, rel)?;
            }
            if num_right_partners == 1 && to_the_left {
                self.swap_partners(person, partner, rel)?;
            }
            return Ok(());
        }

        let hub_below = self.gg.relationship_childhub(rel)?;
        if self.analyze_children(hub_below)?.num_with_partners > 0 {
            return Ok(());
        }

        if num_right_partners == 1 && !siblings.right_most_has_right_partner {
            for &sibling in siblings.ordered_children.iter().rev() {
                if sibling == partner {
                    if to_the_left {
                        self.swap_partners(person, partner, rel)?;
                    }
                    self.move_sibling_plus_partner_to_order(
                        person,
                        partner,
                        rel,
                        siblings.right_most_child_order,
                    );
                    return Ok(());
                }
                if siblings.with_partners.contains(&sibling) {
                    break;
                }
            }
        }
        if num_left_partners == 1 && !siblings.left_most_has_left_partner {
            for &sibling in &siblings.ordered_children {
                if sibling == partner {
                    if !to_the_left {
                        self.swap_partners(person, partner, rel)?;
                    }
                    self.move_sibling_plus_partner_to_order(
                        person,
                        partner,
                        rel,
                        siblings.left_most_child_order,
                    );
                    return Ok(());
                }
                if siblings.with_partners.contains(&sibling) {
                    break;
                }
            }
        }
        Ok(())
    }
}
