use pedigree_graph::{BaseGraph, RelationshipProperties, Result, VertexData, VertexId};
use rustc_hash::FxBuildHasher;

type HashMap<K, V> = hashbrown::HashMap<K, V, FxBuildHasher>;

/// Creates one relationship (with its child hub) per couple while importing.
#[derive(Debug, Default)]
pub(super) struct RelationshipTracker {
    childhubs: HashMap<(VertexId, VertexId), VertexId>,
}

impl RelationshipTracker {
    /// The child hub of the couple, creating relationship and hub on first use.
    pub(super) fn create_or_get_childhub(
        &mut self,
        gg: &mut BaseGraph,
        mother: VertexId,
        father: VertexId,
    ) -> Result<VertexId> {
        let key = (mother.min(father), mother.max(father));
        if let Some(&hub) = self.childhubs.get(&key) {
            return Ok(hub);
        }
        let rel = gg.add_vertex(VertexData::Relationship(RelationshipProperties::default()), None)?;
        let hub = gg.add_vertex(VertexData::ChildHub, None)?;
        gg.add_edge(rel, hub, 1)?;
        gg.add_edge(mother, rel, 1)?;
        gg.add_edge(father, rel, 1)?;
        self.childhubs.insert(key, hub);
        Ok(hub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pedigree_graph::{Gender, PersonProperties};

    #[test]
    fn one_relationship_per_couple() {
        let mut gg = BaseGraph::new();
        let m = gg
            .add_vertex(VertexData::Person(PersonProperties::with_gender(Gender::Female)), None)
            .unwrap();
        let f = gg
            .add_vertex(VertexData::Person(PersonProperties::with_gender(Gender::Male)), None)
            .unwrap();
        let mut tracker = RelationshipTracker::default();
        let hub = tracker.create_or_get_childhub(&mut gg, m, f).unwrap();
        assert_eq!(tracker.create_or_get_childhub(&mut gg, f, m).unwrap(), hub);
        assert_eq!(gg.num_vertices(), 4);
        assert!(gg.is_childhub(hub));
    }
}
