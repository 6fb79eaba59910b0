use super::Layers;
use crate::ordering::{Ordering, UNPLACED};
use pedigree_graph::{Gender, Rank, VertexId};

impl Layers<'_> {
    /// Weighted number of edge crossings under `order`.
    ///
    /// With `only_rank`, only crossings affected by reordering that rank are counted. Unless
    /// `exact_relationship_edges` is set, each edge into a relationship also costs half a
    /// crossing per vertex with parents between the two partners: relationships are re-ranked
    /// onto the partner rank later, and this anticipates the crossings that move creates.
    pub fn edge_crossing(
        &self,
        order: &Ordering,
        only_rank: Option<Rank>,
        exact_relationship_edges: bool,
    ) -> f64 {
        let (from, to) = match only_rank {
            Some(r) => (r.saturating_sub(1).max(1), r),
            None => (1, self.max_rank),
        };

        let mut crossings = 0.0;
        for r in from..=to {
            let row = order.rank(r);
            // The rightmost vertex has no edges to its right to cross.
            for &v in row.iter().take(row.len().saturating_sub(1)) {
                let is_hub = self.gg.is_childhub(v);
                for &target in self.gg.out_edges(v) {
                    if !exact_relationship_edges && self.gg.is_relationship(target) {
                        if let [p0, p1] = self.gg.in_edges(target) {
                            let between = self.num_nodes_with_parents_in_between(
                                order,
                                r,
                                order.position(*p0),
                                order.position(*p1),
                            );
                            crossings += between * self.tuning.relationship_edge_crossing;
                        }
                    }

                    let by_edge = self.crossings_by_one_edge(order, v, target);
                    let twin_factor = if is_hub && self.gg.twin_group_id(target).is_some() {
                        self.tuning.twin_edge_crossing
                    } else {
                        1.0
                    };
                    crossings += by_edge * twin_factor;
                }
            }
        }
        crossings
    }

    /// Crossings of `v -> target` with edges leaving vertices to the right of `v`. Crossings
    /// with edges from the left are counted when those vertices are processed.
    fn crossings_by_one_edge(&self, order: &Ordering, v: VertexId, target: VertexId) -> f64 {
        let rank_v = self.ranks[v];
        let order_v = order.position(v);
        let order_t = order.position(target);
        if order_v == UNPLACED || order_t == UNPLACED {
            return 0.0;
        }

        if rank_v == self.ranks[target] {
            return self.num_nodes_with_parents_in_between(order, rank_v, order_v, order_t);
        }

        let mut crossings = 0.0;
        for &u in order.rank(rank_v).iter().skip(order_v + 1) {
            let is_hub = self.gg.is_childhub(u);
            for &w in self.gg.out_edges(u) {
                if order.position(w) < order_t {
                    crossings += 1.0;
                    if is_hub && self.gg.twin_group_id(w).is_some() {
                        crossings += 1.0;
                    }
                }
            }
        }

        // A long edge crossing others right where it leaves its person places better once the
        // head segment shares the person's rank.
        if crossings > 0.0 && self.gg.is_person(v) && self.gg.is_virtual(target) {
            crossings -= self.tuning.person_to_virtual_bonus;
        }
        crossings
    }

    /// Number of in-edges crossing a same-rank edge between positions `order1` and `order2`:
    /// edges from other ranks into vertices strictly between them, and same-rank edges coming
    /// from outside the interval. Twins count once more since their group shares one edge.
    pub fn num_nodes_with_parents_in_between(
        &self,
        order: &Ordering,
        rank: Rank,
        order1: usize,
        order2: usize,
    ) -> f64 {
        if order1 == UNPLACED || order2 == UNPLACED {
            return 0.0;
        }
        let lo = order1.min(order2);
        let hi = order1.max(order2);
        let row = order.rank(rank);
        let mut count = 0usize;

        for &b in row.iter().take(hi).skip(lo + 1) {
            for &u in self.gg.in_edges(b) {
                if self.ranks[u] != rank {
                    count += 1;
                } else {
                    let other = order.position(u);
                    if other < lo || other > hi {
                        count += 1;
                    }
                }
            }
            if self.gg.is_person(b) && self.gg.twin_group_id(b).is_some() {
                count += 1;
            }
        }
        count as f64
    }

    /// Secondary ordering score; lower is better. In decreasing weight: partners far apart,
    /// siblings spread out, a mother placed left of the father, siblings out of birth order.
    pub fn edge_length_score(&self, order: &Ordering, only_rank: Option<Rank>) -> f64 {
        let tuning = self.tuning;
        let mut partner_distance = 0usize;
        let mut sibling_spread = 0usize;
        let mut female_on_left = 0usize;
        let mut age_order = 0usize;

        for v in 0..self.gg.num_vertices() {
            if let Some(r) = only_rank {
                let rank = self.ranks[v];
                if rank + 1 < r || rank > r + 1 {
                    continue;
                }
            }

            if self.gg.is_relationship(v) {
                let &[p0, p1] = self.gg.in_edges(v) else {
                    continue;
                };
                if self.ranks[p0] != self.ranks[p1] {
                    continue;
                }
                let (o0, o1) = (order.position(p0), order.position(p1));
                partner_distance += o0.abs_diff(o1);
                let left = if o0 < o1 { p0 } else { p1 };
                if self.gg.gender(left).ok() == Some(Gender::Female) {
                    female_on_left += 1;
                }
            } else if self.gg.is_childhub(v) {
                let mut children = self.gg.out_edges(v).to_vec();
                if children.len() < 2 {
                    continue;
                }
                order.sort_by_order(&mut children);
                if let (Some(&first), Some(&last)) = (children.first(), children.last()) {
                    sibling_spread += order.position(last).saturating_sub(order.position(first));
                }
                age_order += self.children_out_of_age_order(&children);
            }
        }

        partner_distance as f64 * tuning.partner_distance
            + sibling_spread as f64 * tuning.sibling_spread
            + female_on_left as f64 * tuning.female_on_left
            + age_order as f64 * tuning.child_age_penalty
    }

    /// Adjacent sibling pairs where a dated child follows an undated or younger one.
    fn children_out_of_age_order(&self, sorted_children: &[VertexId]) -> usize {
        let birth = |v: VertexId| {
            self.gg
                .person(v)
                .and_then(|p| p.birth_date.as_ref())
                .and_then(|d| d.complete_date())
        };
        sorted_children
            .windows(2)
            .filter(|pair| match (birth(pair[0]), birth(pair[1])) {
                (_, None) => false,
                (None, Some(_)) => true,
                (Some(left), Some(right)) => left > right,
            })
            .count()
    }
}
