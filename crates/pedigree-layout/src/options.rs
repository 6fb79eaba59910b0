//! Layout configuration.
//!
//! Everything the engine reads from outside the graph lives here: iteration budgets, the
//! horizontal separation rules, vertical spacing, and the empirically tuned weights used by the
//! ordering and heuristic passes. Values are plain data so hosts can load them from JSON.

use pedigree_graph::{Error, Result, VertexId};
use serde::{Deserialize, Serialize};

/// Permutations of more than this many buckets are not tried (the seed count is factorial).
pub const MAX_INIT_ORDERING_BUCKETS: usize = 8;

/// Version tag written into (and required from) persisted layout documents.
pub const CURRENT_JSON_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutOptions {
    pub max_init_ordering_buckets: usize,
    pub max_ordering_iterations: usize,
    pub max_xcoord_iterations: usize,
    /// Whether edge weights scale the x-coordinate score.
    pub xcoord_edge_weight_value: bool,
    pub separations: Separations,
    pub vertical: VerticalSpacing,
    pub tuning: TuningParameters,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            max_init_ordering_buckets: 5,
            max_ordering_iterations: 24,
            max_xcoord_iterations: 4,
            xcoord_edge_weight_value: true,
            separations: Separations::default(),
            vertical: VerticalSpacing::default(),
            tuning: TuningParameters::default(),
        }
    }
}

impl LayoutOptions {
    pub fn validate(&self) -> Result<()> {
        if self.max_init_ordering_buckets > MAX_INIT_ORDERING_BUCKETS {
            return Err(Error::InvalidOption {
                name: "max_init_ordering_buckets",
                reason: format!(
                    "{} buckets exceed the limit of {MAX_INIT_ORDERING_BUCKETS}",
                    self.max_init_ordering_buckets
                ),
            });
        }
        Ok(())
    }
}

/// Minimum gap between the borders of two vertices adjacent on a rank, in the same units as
/// vertex widths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Separations {
    pub person: f64,
    pub twin: f64,
    pub rel_rel: f64,
    pub rel: f64,
}

impl Default for Separations {
    fn default() -> Self {
        Self {
            person: 10.0,
            twin: 8.0,
            rel_rel: 8.0,
            rel: 6.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VerticalSpacing {
    pub node_to_childhub: f64,
    pub childhub_to_node: f64,
    pub extra_per_horizontal_line: f64,
    pub attach_port_height: f64,
    pub comment_line_height: f64,
    /// Height of a rendered person node; not used by the rank spacing itself, only exported
    /// for hosts that need to place labels.
    pub person_height: f64,
}

impl Default for VerticalSpacing {
    fn default() -> Self {
        Self {
            node_to_childhub: 21.6,
            childhub_to_node: 14.0,
            extra_per_horizontal_line: 4.0,
            attach_port_height: 1.5,
            comment_line_height: 2.8,
            person_height: 40.0,
        }
    }
}

/// Tuned constants. None of them has a derivation; they were picked because the resulting
/// diagrams looked right on real pedigrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TuningParameters {
    // -- crossing count
    pub relationship_edge_crossing: f64,
    pub twin_edge_crossing: f64,
    pub person_to_virtual_bonus: f64,

    // -- edge length score
    pub partner_distance: f64,
    pub sibling_spread: f64,
    pub female_on_left: f64,
    pub child_age_penalty: f64,

    // -- ordering budgets
    pub non_improving_iterations: usize,
    pub transpose_max_iterations: usize,
    pub transpose_major_iterations: usize,
    pub long_edge_max_segments: usize,
    pub long_edge_max_shift: isize,
    pub bucket_distance_max_steps: usize,

    // -- vertical levels
    pub exhaustive_search_edges: usize,
    pub childhub_annealing_steps: usize,
    pub partner_annealing_steps: usize,

    // -- insertion of new vertices
    pub insert_childhub_edge_crossing: f64,
    pub insert_same_rank_edge_crossing: f64,
    pub insert_busy_rank_below: f64,

    // -- heuristics
    pub straighten_max_persons: usize,
    pub straighten_max_relationships: usize,
    pub parent_shift_max_persons: usize,
    pub parent_shift_max_relationships: usize,
    pub small_shift_max_persons: usize,
    pub small_shift_max_relationships: usize,
    pub heuristic_max_iterations: usize,
    pub compact_max_component_size: usize,
    pub domino_outer_iterations: usize,
    pub domino_inner_factor: usize,
}

impl Default for TuningParameters {
    fn default() -> Self {
        Self {
            relationship_edge_crossing: 0.5,
            twin_edge_crossing: 2.0,
            person_to_virtual_bonus: 0.1,

            partner_distance: 100_000.0,
            sibling_spread: 1_000.0,
            female_on_left: 5.0,
            child_age_penalty: 1.0,

            non_improving_iterations: 6,
            transpose_max_iterations: 100,
            transpose_major_iterations: 4,
            long_edge_max_segments: 10,
            long_edge_max_shift: 4,
            bucket_distance_max_steps: 100,

            exhaustive_search_edges: 5,
            childhub_annealing_steps: 600,
            partner_annealing_steps: 500,

            insert_childhub_edge_crossing: 100_000.0,
            insert_same_rank_edge_crossing: 0.1,
            insert_busy_rank_below: 0.25,

            straighten_max_persons: 5,
            straighten_max_relationships: 3,
            parent_shift_max_persons: 7,
            parent_shift_max_relationships: 3,
            small_shift_max_persons: 3,
            small_shift_max_relationships: 2,
            heuristic_max_iterations: 20,
            compact_max_component_size: 5,
            domino_outer_iterations: 5,
            domino_inner_factor: 5,
        }
    }
}

/// Engine-wide context handed to the facade at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutContext {
    pub json_version: String,
    pub options: LayoutOptions,
    pub proband: Option<VertexId>,
}

impl Default for LayoutContext {
    fn default() -> Self {
        Self {
            json_version: CURRENT_JSON_VERSION.to_string(),
            options: LayoutOptions::default(),
            proband: None,
        }
    }
}
