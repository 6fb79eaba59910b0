//! Helper algorithms over [`BaseGraph`].

use super::BaseGraph;
use crate::VertexId;
use rustc_hash::FxBuildHasher;
use std::collections::VecDeque;

type HashSet<T> = hashbrown::HashSet<T, FxBuildHasher>;

/// Weakly connected components, each listed in BFS order from its smallest id.
pub fn components(g: &BaseGraph) -> Vec<Vec<VertexId>> {
    let mut seen = vec![false; g.num_vertices()];
    let mut out: Vec<Vec<VertexId>> = Vec::new();

    for start in 0..g.num_vertices() {
        if seen[start] {
            continue;
        }
        seen[start] = true;
        let mut comp: Vec<VertexId> = Vec::new();
        let mut q: VecDeque<VertexId> = VecDeque::new();
        q.push_back(start);
        while let Some(v) = q.pop_front() {
            comp.push(v);
            for &n in g.out_edges(v).iter().chain(g.in_edges(v)) {
                if !seen[n] {
                    seen[n] = true;
                    q.push_back(n);
                }
            }
        }
        out.push(comp);
    }

    out
}

/// Everything reachable from `from` ignoring edge direction.
pub fn reachable_undirected(g: &BaseGraph, from: VertexId) -> HashSet<VertexId> {
    let mut reached: HashSet<VertexId> = HashSet::default();
    if !g.is_valid_id(from) {
        return reached;
    }
    let mut stack = vec![from];
    reached.insert(from);
    while let Some(v) = stack.pop() {
        for &u in g.out_edges(v).iter().chain(g.in_edges(v)) {
            if reached.insert(u) {
                stack.push(u);
            }
        }
    }
    reached
}

/// Strongly connected components with more than one vertex (pedigrees should have none).
pub fn find_cycles(g: &BaseGraph) -> Vec<Vec<VertexId>> {
    struct Tarjan<'a> {
        g: &'a BaseGraph,
        index: usize,
        stack: Vec<VertexId>,
        on_stack: Vec<bool>,
        indices: Vec<Option<usize>>,
        lowlink: Vec<usize>,
        sccs: Vec<Vec<VertexId>>,
    }

    impl Tarjan<'_> {
        fn strongconnect(&mut self, v: VertexId) {
            self.indices[v] = Some(self.index);
            self.lowlink[v] = self.index;
            self.index += 1;
            self.stack.push(v);
            self.on_stack[v] = true;

            for &w in self.g.out_edges(v) {
                match self.indices[w] {
                    None => {
                        self.strongconnect(w);
                        self.lowlink[v] = self.lowlink[v].min(self.lowlink[w]);
                    }
                    Some(w_idx) if self.on_stack[w] => {
                        self.lowlink[v] = self.lowlink[v].min(w_idx);
                    }
                    Some(_) => {}
                }
            }

            if Some(self.lowlink[v]) == self.indices[v] {
                let mut scc: Vec<VertexId> = Vec::new();
                while let Some(w) = self.stack.pop() {
                    self.on_stack[w] = false;
                    scc.push(w);
                    if w == v {
                        break;
                    }
                }
                self.sccs.push(scc);
            }
        }
    }

    let n = g.num_vertices();
    let mut tarjan = Tarjan {
        g,
        index: 0,
        stack: Vec::new(),
        on_stack: vec![false; n],
        indices: vec![None; n],
        lowlink: vec![0; n],
        sccs: Vec::new(),
    };

    for v in 0..n {
        if tarjan.indices[v].is_none() {
            tarjan.strongconnect(v);
        }
    }

    let mut cycles: Vec<Vec<VertexId>> = tarjan
        .sccs
        .into_iter()
        .filter(|scc| scc.len() > 1 || g.has_edge(scc[0], scc[0]))
        .map(|mut scc| {
            scc.sort_unstable();
            scc
        })
        .collect();
    cycles.sort_by(|a, b| a.first().cmp(&b.first()));
    cycles
}

pub fn has_cycle(g: &BaseGraph) -> bool {
    !find_cycles(g).is_empty()
}

/// `v` and every vertex that has a directed path to it.
pub fn all_ancestors(g: &BaseGraph, v: VertexId) -> HashSet<VertexId> {
    let mut ancestors: HashSet<VertexId> = HashSet::default();
    ancestors.insert(v);
    let mut q: VecDeque<VertexId> = VecDeque::new();
    q.push_back(v);
    while let Some(next) = q.pop_front() {
        for &u in g.in_edges(next) {
            if ancestors.insert(u) {
                q.push_back(u);
            }
        }
    }
    ancestors
}
