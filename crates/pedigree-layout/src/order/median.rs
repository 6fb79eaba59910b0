use super::Layers;
use crate::ordering::Ordering;
use pedigree_graph::{Rank, VertexId};

impl Layers<'_> {
    /// Weighted median sweep: even iterations sort each rank by the median position of its
    /// neighbours on the rank above, odd iterations by those on the rank below.
    pub fn wmedian(&self, order: &mut Ordering, iteration: usize) {
        if iteration % 2 == 0 {
            for r in 2..=self.max_rank {
                if order.rank_len(r) <= 1 || order.rank_len(r - 1) <= 1 {
                    continue;
                }
                self.sort_by_median(order, r, r - 1);
            }
        } else {
            for r in (1..self.max_rank).rev() {
                if order.rank_len(r) <= 1 || order.rank_len(r + 1) <= 1 {
                    continue;
                }
                self.sort_by_median(order, r, r + 1);
            }
        }
    }

    fn sort_by_median(&self, order: &mut Ordering, rank: Rank, adjacent: Rank) {
        let mut keyed: Vec<(VertexId, f64)> = order
            .rank(rank)
            .iter()
            .map(|&v| (v, self.median_value(order, v, adjacent)))
            .collect();
        keyed.sort_by(|a, b| a.1.total_cmp(&b.1));
        order.set_rank(rank, keyed.into_iter().map(|(v, _)| v).collect());
    }

    /// Median position of the neighbours of `v` on `adjacent`, interpolated towards the denser
    /// side for even counts; -1 when `v` has no neighbour there.
    fn median_value(&self, order: &Ordering, v: VertexId, adjacent: Rank) -> f64 {
        let positions: Vec<f64> = order
            .rank(adjacent)
            .iter()
            .enumerate()
            .filter(|&(_, &u)| self.gg.has_edge(u, v) || self.gg.has_edge(v, u))
            .map(|(i, _)| i as f64)
            .collect();

        let len = positions.len();
        if len == 0 {
            return -1.0;
        }
        let m = len / 2;
        if len % 2 == 1 {
            return positions[m];
        }
        if len == 2 {
            return (positions[0] + positions[1]) / 2.0;
        }
        let left = positions[m - 1] - positions[0];
        let right = positions[len - 1] - positions[m];
        if left + right == 0.0 {
            return (positions[m - 1] + positions[m]) / 2.0;
        }
        (positions[m - 1] * right + positions[m] * left) / (left + right)
    }
}
