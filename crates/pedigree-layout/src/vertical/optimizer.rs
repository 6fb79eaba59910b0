//! Integer level assignment for overlapping horizontal segments.
//!
//! Every segment gets a level (1 = lowest). Two segments that overlap horizontally must not
//! share a level; beyond that, a caller-supplied pair score counts the visual crossings a given
//! pair of levels produces. Segments are split into groups of mutually overlapping segments and
//! each group is solved separately: exhaustively when small, by simulated annealing otherwise.

/// Penalty for a pair of segments at the given levels. Symmetric in its arguments. The level
/// slice is the complete assignment being scored, or `None` while the optimizer probes pairs in
/// isolation.
pub trait PairScore {
    fn score(&self, e1: usize, e2: usize, level1: usize, level2: usize, levels: Option<&[usize]>)
    -> f64;
}

impl<F> PairScore for F
where
    F: Fn(usize, usize, usize, usize, Option<&[usize]>) -> f64,
{
    fn score(
        &self,
        e1: usize,
        e2: usize,
        level1: usize,
        level2: usize,
        levels: Option<&[usize]>,
    ) -> f64 {
        self(e1, e2, level1, level2, levels)
    }
}

#[derive(Debug, Clone, Default)]
struct Components {
    edges: Vec<Vec<usize>>,
    min_penalty: Vec<f64>,
    edge_component: Vec<Option<usize>>,
}

impl Components {
    fn new(num_edges: usize) -> Self {
        Self {
            edges: Vec::new(),
            min_penalty: Vec::new(),
            edge_component: vec![None; num_edges],
        }
    }

    fn add_to_new(&mut self, edge: usize) -> usize {
        let id = self.edges.len();
        self.edge_component[edge] = Some(id);
        self.edges.push(vec![edge]);
        self.min_penalty.push(0.0);
        id
    }

    fn add_to(&mut self, edge: usize, component: usize) {
        self.edges[component].push(edge);
        self.edge_component[edge] = Some(component);
    }

    /// Moves everything into the lower id and closes the gap left by the higher one.
    fn merge(&mut self, c1: usize, c2: usize) {
        if c1 == c2 {
            return;
        }
        let (keep, drop) = (c1.min(c2), c1.max(c2));
        let moved = self.edges.remove(drop);
        let penalty = self.min_penalty.remove(drop);
        for edge in moved {
            self.add_to(edge, keep);
        }
        self.min_penalty[keep] += penalty;

        for component in self.edge_component.iter_mut().flatten() {
            if *component > drop {
                *component -= 1;
            }
        }
    }
}

pub struct VerticalPosIntOptimizer<F> {
    pair_score: F,
    init_levels: Vec<usize>,
    min_levels: Option<Vec<usize>>,
    components: Components,
    crosses: Vec<Vec<usize>>,
    seed: f64,
}

impl<F: PairScore> VerticalPosIntOptimizer<F> {
    /// `min_levels`, when given, is a per-segment lower bound (and usually equal to
    /// `init_levels`).
    pub fn new(pair_score: F, init_levels: Vec<usize>, min_levels: Option<Vec<usize>>) -> Self {
        let min_levels = min_levels.filter(|m| m.iter().any(|&l| l > 1));
        let mut result = Self {
            pair_score,
            components: Components::new(init_levels.len()),
            crosses: vec![Vec::new(); init_levels.len()],
            init_levels,
            min_levels,
            seed: 1.0,
        };
        result.compute_components();
        result
    }

    fn min_level(&self, edge: usize) -> usize {
        self.min_levels.as_ref().map_or(1, |m| m[edge])
    }

    /// Less than one extra crossing, so an extra level is always preferred over a crossing.
    fn number_of_levels_penalty(max_level_used: usize, min_required: usize, num_edges: usize) -> f64 {
        (max_level_used as f64 - min_required as f64) / (num_edges as f64 + 1.0)
    }

    fn component_score(&self, levels: &[usize], component: usize) -> f64 {
        let mut penalty = 0.0;
        let mut max_level_used = 0;
        let mut min_required = 1;

        let edges = &self.components.edges[component];
        for &edge in edges {
            max_level_used = max_level_used.max(levels[edge]);
            min_required = min_required.max(self.min_level(edge));
            for &other in &self.crosses[edge] {
                // Each pair once.
                if other > edge {
                    penalty += self.pair_score.score(
                        edge,
                        other,
                        levels[edge],
                        levels[other],
                        Some(levels),
                    );
                    if !penalty.is_finite() {
                        return penalty;
                    }
                }
            }
        }
        penalty + Self::number_of_levels_penalty(max_level_used, min_required, edges.len())
    }

    /// Groups segments that cannot share a level and estimates, per group, a lower bound on the
    /// achievable penalty so the search can stop as soon as it is reached.
    fn compute_components(&mut self) {
        let n = self.init_levels.len();
        let mut has_to_be_above: Vec<Vec<usize>> = vec![Vec::new(); n];

        for i in 0..n.saturating_sub(1) {
            for j in i + 1..n {
                if self.pair_score.score(i, j, 1, 1, None) != f64::INFINITY {
                    continue;
                }
                self.crosses[i].push(j);
                self.crosses[j].push(i);

                let component = match (
                    self.components.edge_component[i],
                    self.components.edge_component[j],
                ) {
                    (None, None) => {
                        let c = self.components.add_to_new(i);
                        self.components.add_to(j, c);
                        c
                    }
                    (Some(ci), Some(cj)) => {
                        self.components.merge(ci, cj);
                        ci.min(cj)
                    }
                    (Some(ci), None) => {
                        self.components.add_to(j, ci);
                        ci
                    }
                    (None, Some(cj)) => {
                        self.components.add_to(i, cj);
                        cj
                    }
                };

                let score_above = self.pair_score.score(i, j, 1, 2, None);
                let score_below = self.pair_score.score(i, j, 2, 1, None);
                self.components.min_penalty[component] += score_above.min(score_below);
                if score_above < score_below {
                    has_to_be_above[i].push(j);
                }
                if score_above > score_below {
                    has_to_be_above[j].push(i);
                }
            }
        }

        for c in 0..self.components.edges.len() {
            let mut min_num_levels = 1;
            let mut min_required = 1;
            let mut min_min_level = usize::MAX;

            for &edge in &self.components.edges[c] {
                if self.min_levels.is_some() {
                    min_required = min_required.max(self.min_level(edge));
                    min_min_level = min_min_level.min(self.min_level(edge));
                }
                let mut min_for_this = self.min_level(edge);
                for &above in &has_to_be_above[edge] {
                    let mut min_for_other = self.min_level(above);
                    if !has_to_be_above[above].is_empty() && min_for_other == 1 {
                        min_for_other += 1;
                    }
                    min_for_this = min_for_this.max(min_for_other + 1);
                }
                min_num_levels = min_num_levels.max(min_for_this);
            }

            let extra = usize::from(self.components.min_penalty[c] != 0.0);
            if min_min_level == usize::MAX {
                min_min_level = 1;
            }
            min_num_levels = min_num_levels.max(min_min_level + extra);
            self.components.min_penalty[c] += Self::number_of_levels_penalty(
                min_num_levels,
                min_required,
                self.components.edges[c].len(),
            );
        }
    }

    /// Solves every group of overlapping segments. Groups of at most `max_full_search_size`
    /// segments are searched exhaustively, larger ones get `max_steps` annealing steps.
    pub fn compute_vertical_positions(
        &mut self,
        max_full_search_size: usize,
        max_steps: usize,
    ) -> Vec<usize> {
        self.seed = 1.0;
        let mut best = self.init_levels.clone();
        for c in 0..self.components.edges.len() {
            best = if self.components.edges[c].len() <= max_full_search_size {
                self.exhaustive_search(c, best)
            } else {
                self.simulated_annealing(c, best, max_steps)
            };
        }
        best
    }

    fn exhaustive_search(&self, component: usize, start: Vec<usize>) -> Vec<usize> {
        let score = self.component_score(&start, component);
        let mut best = (start.clone(), score);
        let mut values = start;
        self.search_from(component, &mut values, 0, &mut best);
        best.0
    }

    fn search_from(
        &self,
        component: usize,
        values: &mut Vec<usize>,
        depth: usize,
        best: &mut (Vec<usize>, f64),
    ) {
        let edges = &self.components.edges[component];
        if depth == edges.len() {
            let score = self.component_score(values, component);
            if score < best.1 {
                *best = (values.clone(), score);
            }
            return;
        }

        let edge = edges[depth];
        let min_value = self.min_level(edge);
        let max_value = edges.len() + min_value - 1;
        for level in min_value..=max_value {
            values[edge] = level;
            self.search_from(component, values, depth + 1, best);
            if best.1 == self.components.min_penalty[component] {
                break;
            }
        }
    }

    /// One level per segment, in group order; always free of same-level overlaps.
    fn basic_valid_assignment(&self, levels: &[usize], component: usize) -> Vec<usize> {
        let mut result = levels.to_vec();
        let mut value = 1;
        for &edge in &self.components.edges[component] {
            value = value.max(self.min_level(edge));
            result[edge] = value;
            value += 1;
        }
        result
    }

    /// Fractional part of `sin(seed) * 16`: cheap, deterministic, and good enough here.
    fn random(&mut self) -> f64 {
        let x = self.seed.sin() * 16.0;
        self.seed += 1.0;
        x - x.floor()
    }

    /// Moves one random segment to a random other level, pushing up whatever sits at the
    /// target level when that would overlap, then renormalises the group. `None` when no
    /// segment can be moved.
    fn compute_neighbour(&mut self, current: &[usize], component: usize) -> Option<Vec<usize>> {
        let edges = self.components.edges[component].clone();
        let mut state = current.to_vec();
        let attempts = edges.len() * 16 + 16;

        let mut picked = None;
        for _ in 0..attempts {
            let edge = edges[(self.random() * edges.len() as f64) as usize % edges.len()];
            let old_level = state[edge];
            let mut max_used = old_level;
            let mut below_all = true;
            let mut above_all = true;
            let mut forbidden = Vec::new();
            for &other in &self.crosses[edge] {
                let level = state[other];
                max_used = max_used.max(level);
                forbidden.push(level);
                if level >= old_level {
                    above_all = false;
                }
                if level <= old_level {
                    below_all = false;
                }
            }
            if old_level == self.min_level(edge) {
                below_all = true;
            }
            if !(above_all && below_all) {
                picked = Some((edge, old_level, max_used, below_all, above_all, forbidden));
                break;
            }
        }
        let (edge, old_level, max_used, below_all, above_all, forbidden) = picked?;

        // Level 0 is allowed here: it puts the segment below everything and gets normalised.
        let mut new_level = None;
        for _ in 0..attempts {
            let level = (self.random() * (max_used + 2) as f64) as usize;
            let useless = level == old_level
                || (below_all && level < old_level)
                || (above_all && level > old_level);
            if !useless {
                new_level = Some(level);
                break;
            }
        }
        let new_level = new_level?;

        if forbidden.contains(&new_level) {
            for &e in &edges {
                if state[e] <= new_level {
                    state[e] += 1;
                }
            }
        }
        state[edge] = new_level;
        self.normalize(&mut state, &edges);
        Some(state)
    }

    fn normalize(&self, levels: &mut [usize], edges: &[usize]) {
        // Close a gap in the used levels.
        let mut used: Vec<usize> = edges.iter().map(|&e| levels[e]).collect();
        used.sort_unstable();
        used.dedup();
        for i in (1..used.len()).rev() {
            if used[i] != used[i - 1] + 1 {
                for &e in edges {
                    if levels[e] >= used[i] {
                        levels[e] -= 1;
                    }
                }
                break;
            }
        }

        // Respect minimum levels (and lift level 0).
        for &edge in edges {
            let min = self.min_level(edge);
            if levels[edge] < min {
                let adjust = min - levels[edge];
                for &e in edges {
                    levels[e] += adjust;
                }
            }
        }

        // Drop every segment as low as its crossing segments allow.
        for &edge in edges {
            let current = levels[edge];
            if current <= self.min_level(edge) {
                continue;
            }
            let highest_below = self.crosses[edge]
                .iter()
                .map(|&o| levels[o])
                .filter(|&l| l < current)
                .max()
                .unwrap_or(0);
            if highest_below + 1 < current {
                levels[edge] = highest_below + 1;
            }
        }
    }

    fn switch_during_annealing(&mut self, old: f64, new: f64, steps_since_reset: usize) -> bool {
        if new <= old {
            return true;
        }
        let probability = (-(new - old) * (((steps_since_reset + 1) * 5) as f64).ln()).exp();
        probability > self.random()
    }

    fn simulated_annealing(&mut self, component: usize, start: Vec<usize>, max_steps: usize) -> Vec<usize> {
        let score = self.component_score(&start, component);
        let (mut best_state, mut best_score) = if score.is_finite() {
            (start, score)
        } else {
            let valid = self.basic_valid_assignment(&start, component);
            let score = self.component_score(&valid, component);
            (valid, score)
        };

        let min_possible = self.components.min_penalty[component];
        let max_wrong_direction = max_steps / 6;
        let mut best_step = max_steps;
        let mut current_state = best_state.clone();
        let mut current_score = best_score;

        let mut step = max_steps as isize;
        while best_score > min_possible && step >= 0 {
            let s = step as usize;
            if s + max_wrong_direction < best_step {
                current_state = best_state.clone();
                current_score = best_score;
                best_step = s;
                tracing::trace!(component, step = max_steps - s, "annealing restarted from best");
            }

            let Some(neighbour) = self.compute_neighbour(&current_state, component) else {
                break;
            };
            let neighbour_score = self.component_score(&neighbour, component);
            if self.switch_during_annealing(current_score, neighbour_score, best_step - s) {
                current_state = neighbour;
                current_score = neighbour_score;
            }
            if current_score < best_score {
                best_state = current_state.clone();
                best_score = current_score;
                best_step = s;
            }
            step -= 1;
        }
        tracing::trace!(component, score = best_score, min_possible, "annealing finished");
        best_state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_overlapping(_: usize, _: usize, l1: usize, l2: usize, _: Option<&[usize]>) -> f64 {
        if l1 == l2 { f64::INFINITY } else { 0.0 }
    }

    #[test]
    fn overlapping_segments_get_distinct_levels() {
        let mut optimizer = VerticalPosIntOptimizer::new(all_overlapping, vec![1, 1, 1], None);
        let mut levels = optimizer.compute_vertical_positions(5, 600);
        levels.sort_unstable();
        assert_eq!(levels, vec![1, 2, 3]);
    }

    #[test]
    fn disjoint_segments_stay_on_level_one() {
        let disjoint = |_: usize, _: usize, _: usize, _: usize, _: Option<&[usize]>| 0.0;
        let mut optimizer = VerticalPosIntOptimizer::new(disjoint, vec![1, 1], None);
        assert_eq!(optimizer.compute_vertical_positions(5, 600), vec![1, 1]);
    }

    #[test]
    fn annealing_finds_a_valid_assignment_for_large_groups() {
        let mut optimizer = VerticalPosIntOptimizer::new(all_overlapping, vec![1; 7], None);
        let levels = optimizer.compute_vertical_positions(5, 600);
        let mut sorted = levels.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 7);
    }

    #[test]
    fn merged_groups_keep_consistent_ids() {
        // Three groups form first; 3-6 then joins the first two and the third is renumbered.
        let pairs = [(0, 6), (1, 3), (2, 4), (3, 6)];
        let score = move |a: usize, b: usize, l1: usize, l2: usize, _: Option<&[usize]>| {
            let key = (a.min(b), a.max(b));
            if pairs.contains(&key) && l1 == l2 { f64::INFINITY } else { 0.0 }
        };
        let optimizer = VerticalPosIntOptimizer::new(score, vec![1; 7], None);
        assert_eq!(optimizer.components.edges.len(), 2);
        assert_eq!(optimizer.components.edge_component[4], Some(1));
        for (c, edges) in optimizer.components.edges.iter().enumerate() {
            for &e in edges {
                assert_eq!(optimizer.components.edge_component[e], Some(c));
            }
        }
    }
}
