use super::Layers;
use crate::ordering::{Ordering, UNPLACED};
use pedigree_graph::{Rank, VertexId};

impl Layers<'_> {
    /// Adjacent-swap hill climbing.
    ///
    /// For every rank, tries exchanging each pair of neighbours and keeps the exchange when it
    /// lowers the crossing count (or, with `minor_improvements`, keeps crossings and lowers the
    /// edge length score). A rank that improved is retried. Child hub ranks are not searched:
    /// hubs simply follow the order of their relationships.
    ///
    /// Without `minor_improvements` the sweep is capped at a few rounds and returns as soon as
    /// no crossing is left; `give_up_above` skips the work entirely for seeds that start out
    /// worse than that many crossings.
    pub fn transpose(
        &self,
        order: &mut Ordering,
        minor_improvements: bool,
        give_up_above: Option<f64>,
    ) {
        let mut total = self.edge_crossing(order, None, false);
        if give_up_above.is_some_and(|limit| total > limit) {
            return;
        }

        let mut iteration = 0;
        let mut improved = true;
        while improved {
            iteration += 1;
            if !minor_improvements && iteration > self.tuning.transpose_major_iterations {
                break;
            }
            if iteration > self.tuning.transpose_max_iterations {
                tracing::warn!(iteration, "transpose did not converge");
                break;
            }
            improved = false;

            let mut r = 1;
            while r <= self.max_rank {
                if r % 3 == 0 {
                    self.place_childhubs_in_correct_order(order, r);
                    r += 1;
                    continue;
                }

                let mut crossings = self.edge_crossing(order, Some(r), false);
                if !minor_improvements && crossings == 0.0 {
                    r += 1;
                    continue;
                }
                let mut length = if minor_improvements {
                    self.edge_length_score(order, Some(r))
                } else {
                    0.0
                };

                let mut rank_improved = false;
                for i in 0..order.rank_len(r).saturating_sub(1) {
                    order.exchange(r, i, i + 1);
                    let new_crossings = self.edge_crossing(order, Some(r), false);
                    let new_length = if minor_improvements {
                        self.edge_length_score(order, Some(r))
                    } else {
                        0.0
                    };

                    if new_crossings < crossings || (new_crossings == crossings && new_length < length)
                    {
                        improved = true;
                        rank_improved = true;
                        total -= crossings - new_crossings;
                        crossings = new_crossings;
                        length = new_length;
                        if !minor_improvements {
                            if total == 0.0 {
                                return;
                            }
                            if crossings == 0.0 {
                                break;
                            }
                        }
                    } else {
                        order.exchange(r, i, i + 1);
                    }
                }

                if !rank_improved {
                    r += 1;
                }
            }
        }
    }

    /// Sorts a child hub rank by the order of the vertex above each entry; segments of long
    /// edges hanging from the same vertex keep their relative order.
    pub fn place_childhubs_in_correct_order(&self, order: &mut Ordering, rank: Rank) {
        let mut keyed: Vec<(usize, usize, VertexId)> = order
            .rank(rank)
            .iter()
            .map(|&v| {
                let above = self
                    .gg
                    .in_edges(v)
                    .first()
                    .map_or(UNPLACED, |&u| order.position(u));
                (above, order.position(v), v)
            })
            .collect();
        keyed.sort();
        order.set_rank(rank, keyed.into_iter().map(|(_, _, v)| v).collect());
    }

    /// Whether every child hub on `rank` sits left of the next hub exactly when its
    /// relationship does.
    pub fn childhubs_in_correct_order(&self, order: &Ordering, rank: Rank) -> bool {
        let row = order.rank(rank);
        let above = |v: VertexId| {
            self.gg
                .in_edges(v)
                .first()
                .map_or(UNPLACED, |&u| order.position(u))
        };
        for (i, &v) in row.iter().enumerate() {
            if !self.gg.is_childhub(v) {
                continue;
            }
            let Some(&u) = row[i + 1..].iter().find(|&&u| self.gg.is_childhub(u)) else {
                continue;
            };
            if above(v) > above(u) {
                return false;
            }
        }
        true
    }

    /// Brute-force placement of long edges: for every chain of at most
    /// `long_edge_max_segments` pieces, tries moving each window of three consecutive pieces
    /// by up to `long_edge_max_shift` positions each and keeps the best improvement.
    ///
    /// Returns the resulting crossing count.
    pub fn transpose_long_edges(
        &self,
        order: &mut Ordering,
        mut crossings: f64,
        after_reranking: bool,
    ) -> f64 {
        if crossings == 0.0 {
            return crossings;
        }

        let first_virtual = self.gg.real_vertex_count();
        let n = self.gg.num_vertices();
        let mut checked = vec![false; n];
        let max_shift = self.tuning.long_edge_max_shift;
        let keep_from_end = if after_reranking { 4 } else { 2 };

        for v in first_virtual..n {
            if checked[v] || self.ranks[v] == 0 {
                continue;
            }

            let chain = self.long_edge_chain(v);
            for &piece in &chain {
                if piece >= first_virtual {
                    checked[piece] = true;
                }
            }

            let mut best_score = crossings;
            let mut best_moves: Option<[(Rank, usize, isize); 3]> = None;

            if chain.len() <= self.tuning.long_edge_max_segments {
                for i in 0..chain.len().saturating_sub(keep_from_end) {
                    let pieces = [chain[i], chain[i + 1], chain[i + 2]];
                    let slots = pieces.map(|p| (self.ranks[p], order.position(p)));

                    for m1 in -max_shift..=max_shift {
                        if !order.can_move(slots[0].0, slots[0].1, m1) {
                            continue;
                        }
                        for m2 in -max_shift..=max_shift {
                            if !order.can_move(slots[1].0, slots[1].1, m2) {
                                continue;
                            }
                            for m3 in -max_shift..=max_shift {
                                if m1 == 0 && m2 == 0 && m3 == 0 {
                                    continue;
                                }
                                if !order.can_move(slots[2].0, slots[2].1, m3) {
                                    continue;
                                }
                                let moves = [
                                    (slots[0].0, slots[0].1, m1),
                                    (slots[1].0, slots[1].1, m2),
                                    (slots[2].0, slots[2].1, m3),
                                ];
                                let applied = apply_moves(order, &moves);
                                let score = self.edge_crossing(order, None, after_reranking);
                                undo_moves(order, &moves, applied);
                                if score < best_score {
                                    best_score = score;
                                    best_moves = Some(moves);
                                }
                            }
                        }
                    }
                }
            }

            if let Some(moves) = best_moves {
                if best_score < crossings {
                    apply_moves(order, &moves);
                    crossings = best_score;
                }
            }
            if crossings == 0.0 {
                break;
            }
        }
        crossings
    }

    /// The pieces of the long edge through segment `v`, from the first segment down to the
    /// real vertex the edge ends in.
    pub fn long_edge_chain(&self, v: VertexId) -> Vec<VertexId> {
        let mut head = v;
        while let Some(&u) = self.gg.in_edges(head).first() {
            if !self.gg.is_virtual(u) {
                break;
            }
            head = u;
        }

        let mut chain = vec![head];
        let mut next = head;
        while let Some(&u) = self.gg.out_edges(next).first() {
            chain.push(u);
            if !self.gg.is_virtual(u) {
                break;
            }
            next = u;
        }
        chain
    }

    /// Mirrors the whole order when the proband's father ended up right of the mother (or of
    /// any other parent), then repairs what the mirroring broke with a transpose pass.
    pub fn adjust_proband_parent_order(&self, order: &mut Ordering, proband: Option<VertexId>) {
        let Some(proband) = proband.filter(|&p| self.gg.is_person(p)) else {
            return;
        };
        let Ok(parents) = self.gg.mother_father(proband) else {
            return;
        };

        let wrong = |v: VertexId, others: &[VertexId], should_be_left: bool| {
            others.iter().any(|&u| {
                self.ranks[v] == self.ranks[u]
                    && (order.position(v) < order.position(u)) != should_be_left
            })
        };

        let mut flip = false;
        if let Some(father) = parents.father {
            let mut others = parents.other.clone();
            others.extend(parents.mother);
            flip = wrong(father, &others, true);
        }
        if !flip {
            if let Some(mother) = parents.mother {
                let mut others = parents.other.clone();
                others.extend(parents.father);
                flip = wrong(mother, &others, false);
            }
        }

        if flip {
            tracing::debug!(proband, "mirroring order to put the proband's father on the left");
            order.flip_orders();
            self.transpose(order, true, None);
        }
    }
}

fn apply_moves(order: &mut Ordering, moves: &[(Rank, usize, isize); 3]) -> [bool; 3] {
    moves.map(|(rank, position, amount)| order.move_by(rank, position, amount))
}

fn undo_moves(order: &mut Ordering, moves: &[(Rank, usize, isize); 3], applied: [bool; 3]) {
    for i in (0..3).rev() {
        let (rank, position, amount) = moves[i];
        if applied[i] {
            let moved_to = (position as isize + amount) as usize;
            order.move_by(rank, moved_to, -amount);
        }
    }
}
