//! Crossing minimisation.
//!
//! Finds a left-to-right order for every rank of the segment-split graph. Many seed orderings
//! are tried and locally repaired, the best one is refined with weighted-median sweeps and
//! adjacent transpositions, and the vertices left out during the search are reinserted at the
//! end.

mod cross_count;
mod detach;
mod init_order;
mod median;
mod transpose;

pub use detach::{FusedTwins, LeafSiblings, RootlessPartners};

use crate::options::{LayoutOptions, TuningParameters};
use crate::ordering::Ordering;
use pedigree_graph::{BaseGraph, Rank, Result, VertexId};
use std::time::Instant;

/// Read-only view of a ranked graph; all scoring and local search over an [`Ordering`] hangs
/// off it.
#[derive(Debug, Clone, Copy)]
pub struct Layers<'a> {
    pub gg: &'a BaseGraph,
    pub ranks: &'a [Rank],
    pub max_rank: Rank,
    pub tuning: &'a TuningParameters,
}

impl<'a> Layers<'a> {
    pub fn new(
        gg: &'a BaseGraph,
        ranks: &'a [Rank],
        max_rank: Rank,
        tuning: &'a TuningParameters,
    ) -> Self {
        Self {
            gg,
            ranks,
            max_rank,
            tuning,
        }
    }
}

/// Computes the ordering of a ranked, segment-split graph in which twin groups have already
/// been fused.
///
/// The graph is temporarily modified (rootless partners and leaf siblings are detached) and
/// restored before returning.
pub fn ordering(
    gg: &mut BaseGraph,
    ranks: &[Rank],
    max_rank: Rank,
    options: &LayoutOptions,
    proband: Option<VertexId>,
    fused: &FusedTwins,
) -> Result<Ordering> {
    if gg.is_empty() {
        return Ok(Ordering::with_ranks(max_rank));
    }
    let started = Instant::now();
    let tuning = &options.tuning;

    let mut info = gg.leaf_and_parentless_nodes();
    info.parentless.retain(|&v| !fused.is_fused(v));
    info.leaves.retain(|&v| !fused.is_fused(v));

    let mut rootless = RootlessPartners::find(gg, ranks, &info);
    rootless.detach(gg)?;
    let rootless_set = rootless.vertices();

    let mut leaf_siblings = LeafSiblings::find(gg, &info, fused);
    leaf_siblings.detach(gg)?;
    let leaf_excluded = leaf_siblings.vertices();

    // Bottom-up sweeps never reach a person without any edge.
    let isolated: Vec<VertexId> = info
        .parentless
        .iter()
        .copied()
        .filter(|v| !rootless_set.contains(v) && gg.out_edges(*v).is_empty())
        .collect();

    let layers = Layers::new(gg, ranks, max_rank, tuning);
    let root_seeds = layers.parentless_permutations(
        &info,
        &rootless_set,
        options.max_init_ordering_buckets,
    );
    let leaf_seeds =
        layers.leaf_permutations(&info, &leaf_excluded, options.max_init_ordering_buckets);

    let mut best: Option<Ordering> = None;
    let mut best_crossings = f64::INFINITY;
    let mut seeds_tried = 0usize;

    'seeding: for use_stack in [false, true] {
        for seed in &root_seeds {
            seeds_tried += 1;
            let mut order = layers.init_order_top_to_bottom(seed, use_stack);
            layers.transpose(&mut order, false, Some(best_crossings * 4.0 + 5.0));
            let crossings = layers.edge_crossing(&order, None, false);
            if crossings < best_crossings {
                best = Some(order);
                best_crossings = crossings;
                if crossings == 0.0 {
                    break 'seeding;
                }
            }
        }
        for seed in &leaf_seeds {
            seeds_tried += 1;
            let mut seed = seed.clone();
            seed.extend_from_slice(&isolated);
            let mut order = layers.init_order_bottom_to_top(&seed, use_stack);
            layers.transpose(&mut order, false, Some(best_crossings * 4.0 + 5.0));
            let crossings = layers.edge_crossing(&order, None, false);
            if crossings < best_crossings {
                best = Some(order);
                best_crossings = crossings;
                if crossings == 0.0 {
                    break 'seeding;
                }
            }
        }
    }

    let mut best = match best {
        Some(order) => order,
        None => {
            let roots: Vec<VertexId> = info
                .parentless
                .iter()
                .copied()
                .filter(|v| !rootless_set.contains(v))
                .collect();
            let order = layers.init_order_top_to_bottom(&roots, false);
            best_crossings = layers.edge_crossing(&order, None, false);
            order
        }
    };
    let mut best_length = layers.edge_length_score(&best, None);
    tracing::debug!(
        seeds_tried,
        crossings = best_crossings,
        length_score = best_length,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "initial ordering"
    );

    let mut order = best.clone();
    let mut no_change = 0;
    let mut iterations = 0;
    for i in 0..options.max_ordering_iterations {
        iterations = i + 1;
        layers.wmedian(&mut order, i);
        layers.transpose(&mut order, true, None);

        let crossings = layers.edge_crossing(&order, None, false);
        let length = layers.edge_length_score(&order, None);
        if crossings < best_crossings || (crossings == best_crossings && length < best_length) {
            best = order.clone();
            best_crossings = crossings;
            best_length = length;
            no_change = 0;
        } else {
            no_change += 1;
            if no_change == tuning.non_improving_iterations {
                break;
            }
        }
    }
    layers.transpose(&mut best, true, None);

    rootless.reconnect(gg, ranks, &mut best)?;
    let layers = Layers::new(gg, ranks, max_rank, tuning);
    layers.transpose(&mut best, true, None);
    layers.adjust_proband_parent_order(&mut best, proband);

    leaf_siblings.reconnect(gg, ranks, max_rank, tuning, &mut best)?;
    let layers = Layers::new(gg, ranks, max_rank, tuning);
    let crossings = layers.transpose_long_edges(&mut best, best_crossings, false);

    tracing::debug!(
        iterations,
        no_change,
        crossings,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "final ordering"
    );
    Ok(best)
}

