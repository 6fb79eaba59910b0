//! Internal storage entries for [`BaseGraph`](super::BaseGraph).

use crate::{EdgeWeight, VertexData, VertexId};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone)]
pub(in crate::graph) struct VertexEntry {
    pub(in crate::graph) data: VertexData,
    pub(in crate::graph) width: f64,
    pub(in crate::graph) out: Vec<VertexId>,
    pub(in crate::graph) in_: Vec<VertexId>,
    /// Weights of the out-edges, keyed by target.
    pub(in crate::graph) weights: FxHashMap<VertexId, EdgeWeight>,
}

impl VertexEntry {
    pub(in crate::graph) fn new(data: VertexData, width: f64) -> Self {
        Self {
            data,
            width,
            out: Vec::new(),
            in_: Vec::new(),
            weights: FxHashMap::default(),
        }
    }

    pub(in crate::graph) fn remap(&mut self, f: &impl Fn(VertexId) -> VertexId) {
        for u in self.out.iter_mut().chain(self.in_.iter_mut()) {
            *u = f(*u);
        }
        self.weights = self.weights.drain().map(|(u, w)| (f(u), w)).collect();
    }
}
