//! Rigid shifts of vertex groups and the straightening of long edges built on them.

use super::ChildrenInfo;
use crate::position::XCoord;
use crate::positioned::PositionedGraph;
use pedigree_graph::{Rank, Result, VertexId};
use rustc_hash::FxHashSet as HashSet;
use std::collections::VecDeque;

/// Which vertices have to move by the same amount when `start` is shifted.
#[derive(Debug, Clone)]
pub(crate) struct ShiftRequest {
    pub start: Vec<VertexId>,
    /// Moved only when a neighbour pushes them.
    pub dont_move: HashSet<VertexId>,
    /// In-edges of these are not followed.
    pub no_up: HashSet<VertexId>,
    /// Out-edges of these are not followed.
    pub no_down: HashSet<VertexId>,
    /// Reaching any of these aborts the search and marks the shift as forbidden.
    pub forbidden: HashSet<VertexId>,
    pub shift: f64,
    pub stop_at_virtual: bool,
    /// Only push neighbours; everything on the far side of `dont_move` stays put.
    pub minimize_movement: bool,
    pub max_persons: usize,
    pub max_relationships: usize,
    pub stop_at_rank: Option<Rank>,
}

impl ShiftRequest {
    pub fn new(start: Vec<VertexId>, shift: f64, max_persons: usize, max_relationships: usize) -> Self {
        Self {
            start,
            dont_move: HashSet::default(),
            no_up: HashSet::default(),
            no_down: HashSet::default(),
            forbidden: HashSet::default(),
            shift,
            stop_at_virtual: true,
            minimize_movement: false,
            max_persons,
            max_relationships,
            stop_at_rank: None,
        }
    }
}

/// Outcome of [`PositionedGraph::find_affected_set`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AffectedSet {
    pub nodes: Vec<VertexId>,
    /// Counts exclude the vertices the shift started from.
    pub num_persons: usize,
    pub num_relationships: usize,
    pub num_virtual: usize,
    /// Smallest rank reached outside the start set.
    pub min_affected_rank: Option<Rank>,
    pub forbidden_moved: bool,
}

impl AffectedSet {
    pub fn is_acceptable(&self, allow_virtual: bool, max_persons: usize, max_relationships: usize) -> bool {
        !self.forbidden_moved
            && (allow_virtual || self.num_virtual == 0)
            && self.num_persons <= max_persons
            && self.num_relationships <= max_relationships
    }

    /// Fewer segments moved wins, then fewer persons, then fewer relationships.
    pub fn is_better_than(&self, other: &AffectedSet) -> bool {
        (self.num_virtual, self.num_persons, self.num_relationships)
            < (other.num_virtual, other.num_persons, other.num_relationships)
    }

    pub fn apply(&self, xcoord: &mut XCoord<'_>, amount: f64) {
        for &v in &self.nodes {
            xcoord.shift(v, amount);
        }
    }
}

/// Where a child hub should sit relative to its children: anywhere between the midpoint of
/// the outer children and (with exactly three children) the middle child.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct DesiredChildhubLocation {
    pub left_x: f64,
    pub right_x: f64,
    pub min_preferred: f64,
    pub max_preferred: f64,
    pub min_preferred_with_shift: f64,
    pub max_preferred_with_shift: f64,
}

pub(crate) fn desired_childhub_location(
    info: &ChildrenInfo,
    xcoord: &XCoord<'_>,
    shifting: Option<(&HashSet<VertexId>, f64)>,
) -> DesiredChildhubLocation {
    let interval = |shifted: Option<(&HashSet<VertexId>, f64)>| {
        let x = |v: VertexId| {
            xcoord.x(v)
                + shifted
                    .filter(|(set, _)| set.contains(&v))
                    .map_or(0.0, |(_, amount)| amount)
        };
        let left_x = x(info.left_most_child);
        let right_x = x(info.right_most_child);
        let middle = (left_x + right_x) / 2.0;
        let median = if info.ordered_children.len() == 3 {
            x(info.ordered_children[1])
        } else {
            middle
        };
        (left_x, right_x, middle.min(median), middle.max(median))
    };

    let (left_x, right_x, min_preferred, max_preferred) = interval(None);
    let (_, _, min_with_shift, max_with_shift) = match shifting {
        Some(_) => interval(shifting),
        None => (left_x, right_x, min_preferred, max_preferred),
    };
    DesiredChildhubLocation {
        left_x,
        right_x,
        min_preferred,
        max_preferred,
        min_preferred_with_shift: min_with_shift,
        max_preferred_with_shift: max_with_shift,
    }
}

struct MoveSet {
    nodes: Vec<VertexId>,
    members: HashSet<VertexId>,
    queue: VecDeque<VertexId>,
}

impl MoveSet {
    fn add(&mut self, v: VertexId) {
        if self.members.insert(v) {
            self.nodes.push(v);
            self.queue.push_back(v);
        }
    }

    fn contains(&self, v: VertexId) -> bool {
        self.members.contains(&v)
    }
}

impl PositionedGraph {
    /// Given vertices to shift by `request.shift`, finds everything that has to move along to
    /// keep the separation rules and the shape of the surrounding layout.
    ///
    /// The search gives up early once more persons or relationships than the request allows
    /// were collected, so callers must check the result with [`AffectedSet::is_acceptable`].
    pub(crate) fn find_affected_set(&self, xcoord: &XCoord<'_>, request: ShiftRequest) -> Result<AffectedSet> {
        let ShiftRequest {
            start,
            mut dont_move,
            mut no_up,
            mut no_down,
            forbidden,
            shift,
            stop_at_virtual,
            minimize_movement,
            max_persons,
            max_relationships,
            stop_at_rank,
        } = request;

        let initial: HashSet<VertexId> = start.iter().copied().collect();
        if minimize_movement {
            for &v in &start {
                no_up.insert(v);
                no_down.insert(v);
            }
            let anchors: Vec<VertexId> = dont_move.iter().copied().collect();
            for node in anchors {
                let rank = self.ranks[node];
                let order = self.order.position(node);
                let range = if shift > 0.0 {
                    0..order
                } else {
                    order + 1..self.order.rank_len(rank)
                };
                for o in range {
                    if let Some(u) = self.order.vertex_at(rank, o) {
                        dont_move.insert(u);
                        no_up.insert(u);
                        no_down.insert(u);
                    }
                }
            }
        }

        let mut set = MoveSet {
            nodes: Vec::new(),
            members: HashSet::default(),
            queue: VecDeque::new(),
        };
        for &v in &start {
            set.add(v);
        }
        let mut result = AffectedSet::default();
        let movable = |v: VertexId, set: &MoveSet| !dont_move.contains(&v) && !set.contains(v);

        while let Some(next) = set.queue.pop_front() {
            if result.num_persons > max_persons || result.num_relationships > max_relationships {
                break;
            }
            if forbidden.contains(&next) {
                result.forbidden_moved = true;
                break;
            }

            let rank = self.ranks[next];
            if shift > 0.0 {
                if xcoord.slack_on_the_right(next) < shift {
                    if let Some(right) = self.order.right_neighbour(next, rank) {
                        set.add(right);
                    }
                }
            } else if xcoord.slack_on_the_left(next) < -shift {
                if let Some(left) = self.order.left_neighbour(next, rank) {
                    set.add(left);
                }
            }

            if no_up.contains(&next) && no_down.contains(&next) {
                continue;
            }

            if !initial.contains(&next) && result.min_affected_rank.is_none_or(|m| rank < m) {
                result.min_affected_rank = Some(rank);
                if stop_at_rank.is_some_and(|stop| rank < stop) {
                    break;
                }
            }

            let next_order = self.order.position(next);
            // Neighbour on the side the shift comes from, which would be pushed anyway
            // when moving in the other direction.
            let trailing = |u: VertexId| {
                let o = self.order.position(u);
                self.ranks[u] == rank
                    && ((shift < 0.0 && o == next_order + 1) || (shift > 0.0 && o + 1 == next_order))
            };

            if self.gg.is_relationship(next) {
                if !initial.contains(&next) {
                    result.num_relationships += 1;
                }
                set.add(self.gg.relationship_childhub(next)?);
                if minimize_movement || no_up.contains(&next) {
                    continue;
                }
                for &parent in self.gg.in_edges(next) {
                    if movable(parent, &set) && trailing(parent) {
                        set.add(parent);
                    }
                }
            } else if self.gg.is_childhub(next) {
                if let Some(&rel) = self.gg.in_edges(next).first() {
                    set.add(rel);
                }
                if minimize_movement || no_down.contains(&next) {
                    continue;
                }
                let info = self.analyze_children(next)?;
                let desired = desired_childhub_location(&info, xcoord, Some((&set.members, shift)));
                let hub_x = xcoord.x(next);
                let shifted = hub_x + shift;
                if shifted == desired.min_preferred_with_shift
                    || shifted == desired.max_preferred_with_shift
                {
                    continue;
                }
                if hub_x < desired.min_preferred_with_shift
                    && shift > 0.0
                    && shifted < desired.min_preferred_with_shift
                {
                    continue;
                }
                if hub_x > desired.max_preferred_with_shift
                    && shift < 0.0
                    && shifted > desired.max_preferred_with_shift
                {
                    continue;
                }
                for &child in self.gg.out_edges(next) {
                    if movable(child, &set) {
                        set.add(child);
                    }
                }
            } else if self.gg.is_person(next) {
                if !initial.contains(&next) && !self.gg.is_placeholder(next) {
                    result.num_persons += 1;
                }

                if !no_down.contains(&next) {
                    // An existing long partner line may grow; otherwise the relationship
                    // follows to keep things compact.
                    let tight = (shift > 0.0 && xcoord.slack_on_the_left(next) == 0.0)
                        || (shift < 0.0 && xcoord.slack_on_the_right(next) == 0.0);
                    for &rel in self.gg.out_edges(next) {
                        if movable(rel, &set) && trailing(rel) && tight {
                            set.add(rel);
                        }
                    }
                }

                let twins = self.gg.all_twins_of(next)?;
                if twins.len() > 1 {
                    for twin in twins {
                        if movable(twin, &set) {
                            set.add(twin);
                        }
                    }
                }

                if no_up.contains(&next) {
                    continue;
                }
                let Some(&hub) = self.gg.in_edges(next).first() else {
                    continue;
                };
                if dont_move.contains(&hub) || set.contains(hub) {
                    continue;
                }
                let info = self.analyze_children(hub)?;
                let desired = desired_childhub_location(&info, xcoord, Some((&set.members, shift)));
                let hub_x = xcoord.x(hub);
                if hub_x == desired.min_preferred_with_shift || hub_x == desired.max_preferred_with_shift {
                    continue;
                }
                if hub_x < desired.min_preferred && shift < 0.0 && hub_x < desired.min_preferred_with_shift {
                    continue;
                }
                if hub_x > desired.max_preferred && shift > 0.0 && hub_x > desired.max_preferred_with_shift {
                    continue;
                }
                set.add(hub);
            } else if self.gg.is_virtual(next) {
                if !initial.contains(&next) {
                    result.num_virtual += 1;
                }
                if stop_at_virtual && result.num_virtual > 0 {
                    break;
                }
                if !no_up.contains(&next) {
                    if let Some(&above) = self.gg.in_edges(next).first() {
                        if !self.gg.is_person(above) && movable(above, &set) {
                            set.add(above);
                        }
                    }
                }
                if !no_down.contains(&next) {
                    if let Some(&below) = self.gg.out_edges(next).first() {
                        if !self.gg.is_relationship(below) && movable(below, &set) {
                            set.add(below);
                        }
                    }
                }
            }
        }

        result.nodes = set.nodes;
        Ok(result)
    }

    /// Lines up each long edge with its head or tail, moving whichever side displaces fewer
    /// vertices. Returns the chains that could not be straightened within budget.
    pub(crate) fn straighten_long_edges(
        &self,
        long_edges: &[Vec<VertexId>],
        xcoord: &mut XCoord<'_>,
    ) -> Result<Vec<Vec<VertexId>>> {
        let tuning = &self.options.tuning;
        let (max_persons, max_rels) = (tuning.straighten_max_persons, tuning.straighten_max_relationships);
        let mut still_not_straight = Vec::new();

        for chain in long_edges {
            let Some(&first) = chain.first() else {
                continue;
            };
            for _ in 0..tuning.heuristic_max_iterations {
                let head_x = xcoord.x(first);
                let Some(bend) = chain.iter().position(|&v| xcoord.x(v) != head_x) else {
                    break;
                };
                let (head, tail) = chain.split_at(bend);
                let bend_x = xcoord.x(chain[bend]);

                let mut head_request = ShiftRequest::new(head.to_vec(), bend_x - head_x, max_persons, max_rels);
                head_request.dont_move = tail.iter().copied().collect();
                head_request.minimize_movement = true;
                let head_shift = self.find_affected_set(xcoord, head_request)?;

                let mut tail_request = ShiftRequest::new(tail.to_vec(), head_x - bend_x, max_persons, max_rels);
                tail_request.dont_move = head.iter().copied().collect();
                tail_request.minimize_movement = true;
                let tail_shift = self.find_affected_set(xcoord, tail_request)?;

                let head_ok = head_shift.is_acceptable(false, max_persons, max_rels);
                let tail_ok = tail_shift.is_acceptable(false, max_persons, max_rels);
                if !head_ok && !tail_ok {
                    still_not_straight.push(chain.clone());
                    break;
                }
                if tail_ok && (!head_ok || tail_shift.is_better_than(&head_shift)) {
                    tracing::trace!(segment = first, nodes = tail_shift.nodes.len(), "straightening by tail shift");
                    tail_shift.apply(xcoord, head_x - bend_x);
                } else {
                    tracing::trace!(segment = first, nodes = head_shift.nodes.len(), "straightening by head shift");
                    head_shift.apply(xcoord, bend_x - head_x);
                }
            }
        }
        Ok(still_not_straight)
    }

    /// Straightens long edges, first without disturbing anything, then more aggressively.
    pub(crate) fn optimize_long_edge_placement(&mut self) -> Result<()> {
        let positions = std::mem::take(&mut self.positions);
        let positioner = crate::position::Positioner::new(
            &self.gg,
            &self.ranks,
            self.max_rank,
            &self.order,
            &self.options,
        );
        let mut xcoord = XCoord::unchecked(positioner.frame(), positions);

        let long_edges = positioner.find_long_edges();
        positioner.try_straighten_long_edges(&long_edges, &mut xcoord);
        let rest = self.straighten_long_edges(&long_edges, &mut xcoord);
        if let Ok(rest) = &rest {
            positioner.try_straighten_long_edges(rest, &mut xcoord);
        }
        self.positions = xcoord.into_positions();
        rest.map(|_| ())
    }
}
