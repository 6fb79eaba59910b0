//! Seed orderings for the crossing minimisation.
//!
//! Roots (or leaves) are grouped into a handful of buckets; every permutation of the buckets is
//! a seed that a breadth-first or depth-first sweep turns into a full ordering.

use super::Layers;
use crate::ordering::Ordering;
use pedigree_graph::{LeafAndParentless, VertexId};
use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};
use std::collections::{BTreeSet, VecDeque};

type Bucket = Vec<VertexId>;

impl Layers<'_> {
    /// Seeds for top-to-bottom sweeps. A parentless person whose single relationship is with
    /// another parentless, otherwise unattached person shares a bucket with that partner.
    pub fn parentless_permutations(
        &self,
        info: &LeafAndParentless,
        rootless_partners: &BTreeSet<VertexId>,
        max_buckets: usize,
    ) -> Vec<Vec<VertexId>> {
        let mut handled: HashSet<VertexId> = rootless_partners.iter().copied().collect();
        let mut buckets: Vec<Bucket> = Vec::new();

        for &v in &info.parentless {
            if !handled.insert(v) {
                continue;
            }
            let mut bucket = vec![v];

            if let &[first] = self.gg.out_edges(v) {
                let rel = self.gg.down_the_chain_until_non_virtual(first);
                if let Ok(parents) = self.gg.parents(rel) {
                    let other = if parents[0] == v { parents[1] } else { parents[0] };
                    if !handled.contains(&other)
                        && self.gg.in_edges(other).is_empty()
                        && self.gg.out_edges(other).len() == 1
                    {
                        bucket.push(other);
                        handled.insert(other);
                    }
                }
            }
            buckets.push(bucket);
        }

        if buckets.len() > max_buckets {
            self.merge_buckets(&mut buckets, max_buckets, false);
        }
        let permutations = permutations(&mut buckets);
        tracing::debug!(
            buckets = buckets.len(),
            permutations = permutations.len(),
            "parentless seeds"
        );
        permutations
    }

    /// Seeds for bottom-to-top sweeps. Leaves hanging from the same child hub share a bucket.
    pub fn leaf_permutations(
        &self,
        info: &LeafAndParentless,
        excluded: &BTreeSet<VertexId>,
        max_buckets: usize,
    ) -> Vec<Vec<VertexId>> {
        let mut handled: HashSet<VertexId> = excluded.iter().copied().collect();
        let mut buckets: Vec<Bucket> = Vec::new();

        for (i, &v) in info.leaves.iter().enumerate() {
            if !handled.insert(v) {
                continue;
            }
            let mut bucket = vec![v];
            let hub = self.gg.in_edges(v).first().copied();

            for &u in &info.leaves[i + 1..] {
                if handled.contains(&u) {
                    continue;
                }
                if hub.is_some() && self.gg.in_edges(u).first().copied() == hub {
                    bucket.push(u);
                    handled.insert(u);
                }
            }
            buckets.push(bucket);
        }

        if buckets.len() > max_buckets {
            self.merge_buckets(&mut buckets, max_buckets, true);
        }
        let permutations = permutations(&mut buckets);
        tracing::debug!(
            buckets = buckets.len(),
            permutations = permutations.len(),
            "leaf seeds"
        );
        permutations
    }

    /// Repeatedly merges the two most closely related buckets (smallest combined size breaks
    /// ties) until no more than `max_buckets` remain.
    fn merge_buckets(&self, buckets: &mut Vec<Bucket>, max_buckets: usize, use_in_edges: bool) {
        while buckets.len() > max_buckets && buckets.len() > 1 {
            let mut min_distance: Option<usize> = None;
            let (mut b1, mut b2) = (0, 1);

            for i in 0..buckets.len() - 1 {
                for j in i + 1..buckets.len() {
                    let Some(dist) = self.bucket_distance(&buckets[i], &buckets[j], use_in_edges)
                    else {
                        continue;
                    };
                    let closer = min_distance.is_none_or(|min| dist < min);
                    let same_but_smaller = min_distance == Some(dist)
                        && buckets[i].len() + buckets[j].len()
                            < buckets[b1].len() + buckets[b2].len();
                    if closer || same_but_smaller {
                        min_distance = Some(dist);
                        b1 = i;
                        b2 = j;
                    }
                }
            }

            if min_distance.is_none() {
                tracing::warn!(buckets = buckets.len(), "no related seed buckets, merging the first two");
            }
            let merged = buckets.remove(b2);
            buckets[b1].extend(merged);
        }
    }

    /// Number of alternating breadth-first steps (along out-edges, or in-edges) after which the
    /// searches started from the two buckets meet. `None` for unrelated buckets.
    fn bucket_distance(&self, bucket1: &[VertexId], bucket2: &[VertexId], use_in_edges: bool) -> Option<usize> {
        let neighbours = |v: VertexId| {
            if use_in_edges {
                self.gg.in_edges(v)
            } else {
                self.gg.out_edges(v)
            }
        };

        // Positive distances belong to the first search, negative ones to the second.
        let mut distance: HashMap<VertexId, isize> = HashMap::default();
        for &v in bucket1 {
            distance.insert(v, 1);
        }
        for &v in bucket2 {
            distance.insert(v, -1);
        }
        let mut queue1: Vec<VertexId> = bucket1.to_vec();
        let mut queue2: Vec<VertexId> = bucket2.to_vec();

        for _ in 0..self.tuning.bucket_distance_max_steps {
            if queue1.is_empty() && queue2.is_empty() {
                return None;
            }

            let mut next1 = Vec::new();
            for v in queue1 {
                let dist = distance.get(&v).copied().unwrap_or(0);
                for &u in neighbours(v) {
                    if let Some(&other) = distance.get(&u) {
                        if other < 0 {
                            return Some((dist - other) as usize);
                        }
                    }
                    distance.insert(u, dist + 1);
                    next1.push(u);
                }
            }
            queue1 = next1;

            let mut next2 = Vec::new();
            for v in queue2 {
                let dist = distance.get(&v).copied().unwrap_or(0);
                for &u in neighbours(v) {
                    if let Some(&other) = distance.get(&u) {
                        if other > 0 {
                            return Some((other - dist) as usize);
                        }
                    }
                    distance.insert(u, dist - 1);
                    next2.push(u);
                }
            }
            queue2 = next2;
        }

        tracing::warn!("bucket distance search did not terminate");
        None
    }

    /// Orders every vertex reachable from `seeds` along out-edges, assigning positions in
    /// visiting order. `use_stack` switches from breadth-first to depth-first.
    pub fn init_order_top_to_bottom(&self, seeds: &[VertexId], use_stack: bool) -> Ordering {
        self.init_order(seeds, use_stack, false)
    }

    /// Same as [`init_order_top_to_bottom`](Self::init_order_top_to_bottom), walking in-edges.
    pub fn init_order_bottom_to_top(&self, seeds: &[VertexId], use_stack: bool) -> Ordering {
        self.init_order(seeds, use_stack, true)
    }

    fn init_order(&self, seeds: &[VertexId], use_stack: bool, upwards: bool) -> Ordering {
        let mut order = Ordering::with_ranks(self.max_rank);
        let mut queue: VecDeque<VertexId> = seeds.iter().copied().collect();

        loop {
            let next = if use_stack {
                queue.pop_back()
            } else {
                queue.pop_front()
            };
            let Some(next) = next else {
                break;
            };
            if order.is_placed(next) {
                continue;
            }
            order.push(self.ranks[next], next);

            let edges = if upwards {
                self.gg.in_edges(next)
            } else {
                self.gg.out_edges(next)
            };
            queue.extend(edges.iter().copied());
        }
        order
    }
}

/// Every permutation of the buckets, each flattened into one seed list.
fn permutations(buckets: &mut [Bucket]) -> Vec<Vec<VertexId>> {
    fn permute(buckets: &mut [Bucket], from: usize, out: &mut Vec<Vec<VertexId>>) {
        if from + 1 == buckets.len() {
            out.push(buckets.iter().flatten().copied().collect());
            return;
        }
        for j in from..buckets.len() {
            buckets.swap(from, j);
            permute(buckets, from + 1, out);
            buckets.swap(from, j);
        }
    }

    let mut out = Vec::new();
    if !buckets.is_empty() {
        permute(buckets, 0, &mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permutations_cover_every_bucket_order() {
        let mut buckets = vec![vec![1, 2], vec![3], vec![4]];
        let result = permutations(&mut buckets);
        assert_eq!(result.len(), 6);
        assert_eq!(result[0], vec![1, 2, 3, 4]);
        assert!(result.contains(&vec![4, 3, 1, 2]));
        assert_eq!(buckets, vec![vec![1, 2], vec![3], vec![4]]);
    }

    #[test]
    fn no_buckets_no_permutations() {
        assert!(permutations(&mut []).is_empty());
    }
}
