use pedigree_layout::graph::{BaseGraph, Gender, PersonProperties, RelationshipProperties, VertexData};
use pedigree_layout::order::Layers;
use pedigree_layout::position::Positioner;
use pedigree_layout::{
    DynamicPositionedGraph, LayoutContext, LayoutOptions, PedImportOptions, PositionedGraph, from_ped,
    rank,
};

/// Grandchild (proband, id 0) of a founder couple; the grandchild's father is unknown.
const THREE_GENERATIONS: &str = "\
fam gc 0 c1 1 2
fam f 0 0 1 1
fam m 0 0 2 1
fam c1 f m 2 1
fam c2 f m 1 1
";

/// Two families joined by a marriage in the second generation, with a third generation.
const TWO_FAMILIES: &str = "\
fam p1 a1 b1 1 1
fam a1 0 0 1 1
fam b1 0 0 2 1
fam a2 0 0 1 1
fam b2 0 0 2 1
fam s1 a1 b1 2 1
fam s2 a2 b2 2 1
fam s3 a2 b2 1 1
fam k1 p1 s2 1 2
fam k2 p1 s2 2 1
fam k3 s3 s1 1 1
";

fn layout(ped: &str) -> PositionedGraph {
    let imported = from_ped(ped, &PedImportOptions::default()).unwrap();
    PositionedGraph::new(imported.graph, Some(imported.proband), LayoutOptions::default(), None)
        .unwrap()
}

fn assert_layout_invariants(dg: &PositionedGraph) {
    let g = dg.graph();
    let ranks = dg.ranks();
    let order = dg.order();

    // edges run within a rank (partner lines) or one rank down
    for v in 0..g.num_vertices() {
        for &u in g.out_edges(v) {
            assert!(
                ranks[u] == ranks[v] || ranks[u] == ranks[v] + 1,
                "edge {v} -> {u} spans ranks {} -> {}",
                ranks[v],
                ranks[u]
            );
            if g.is_childhub(v) || g.is_relationship(v) {
                assert_eq!(ranks[u], ranks[v] + 1);
            }
        }
    }

    // the order is a bijection per rank
    let placed: usize = order.ranks().iter().map(Vec::len).sum();
    assert_eq!(placed, g.num_vertices());
    for v in 0..g.num_vertices() {
        assert_eq!(order.vertex_at(ranks[v], order.position(v)), Some(v));
    }

    // positions increase along each rank and respect the separation rules
    for row in order.ranks() {
        for pair in row.windows(2) {
            assert!(dg.positions()[pair[0]] < dg.positions()[pair[1]]);
        }
    }
    let positioner = Positioner::new(g, ranks, dg.max_rank(), order, dg.options());
    assert!(positioner.validate_positions(dg.positions()));
}

#[test]
fn three_generations_get_five_ranks() {
    let dg = layout(THREE_GENERATIONS);
    assert_eq!(dg.max_rank(), 5);
    assert_layout_invariants(&dg);

    let g = dg.graph();
    for generation_rank in [1, 3] {
        let rels = dg
            .order()
            .rank(generation_rank)
            .iter()
            .filter(|&&v| g.is_relationship(v))
            .count();
        assert_eq!(rels, 1, "rank {generation_rank}");
    }
    assert_eq!(dg.ranks()[0], 5);
    assert_eq!(dg.ranks()[1], 1);
    assert_eq!(dg.ranks()[3], 3);
}

#[test]
fn persons_and_relationships_share_odd_ranks() {
    let dg = layout(TWO_FAMILIES);
    assert_layout_invariants(&dg);
    let g = dg.graph();
    for v in 0..g.real_vertex_count() {
        let rank = dg.ranks()[v];
        if g.is_childhub(v) {
            assert_eq!(rank % 2, 0, "hub {v}");
        } else {
            assert_eq!(rank % 2, 1, "vertex {v}");
        }
    }
}

#[test]
fn relationships_share_the_rank_of_their_partners() {
    let dg = layout(TWO_FAMILIES);
    let g = dg.graph();
    for rel in 0..g.real_vertex_count() {
        if !g.is_relationship(rel) {
            continue;
        }
        let partners = g.parents(rel).unwrap();
        assert_eq!(partners.len(), 2);
        for p in partners {
            assert_eq!(dg.ranks()[p], dg.ranks()[rel], "relationship {rel}, partner {p}");
        }
        assert_eq!(dg.ranks()[g.relationship_childhub(rel).unwrap()], dg.ranks()[rel] + 1);
    }
}

#[test]
fn transposition_never_increases_crossings() {
    let imported = from_ped(TWO_FAMILIES, &PedImportOptions::default()).unwrap();
    let mut g = imported.graph;
    let mut ranks = rank::rank(&g, None);
    let max_rank = ranks.iter().copied().max().unwrap();
    g.split_multi_rank_edges(&mut ranks).unwrap();

    let options = LayoutOptions::default();
    let layers = Layers::new(&g, &ranks, max_rank, &options.tuning);
    let roots = g.leaf_and_parentless_nodes().parentless;
    for use_stack in [false, true] {
        let mut order = layers.init_order_top_to_bottom(&roots, use_stack);
        let before = layers.edge_crossing(&order, None, false);
        layers.transpose(&mut order, false, None);
        let after = layers.edge_crossing(&order, None, false);
        assert!(after <= before, "{after} > {before}");
    }
}

#[test]
fn single_person_is_laid_out_on_rank_one() {
    let mut g = BaseGraph::new();
    g.add_vertex(VertexData::Person(PersonProperties::with_gender(Gender::Female)), None)
        .unwrap();
    let dg = PositionedGraph::new(g, Some(0), LayoutOptions::default(), None).unwrap();
    assert_eq!(dg.max_rank(), 1);
    assert_eq!(dg.order().rank(1), &[0]);
    assert!(dg.positions()[0].is_finite());
}

#[test]
fn suggested_ranks_with_odd_gaps_are_recomputed() {
    let mut g = BaseGraph::new();
    let father = g
        .add_vertex(VertexData::Person(PersonProperties::with_gender(Gender::Male)), None)
        .unwrap();
    let mother = g
        .add_vertex(VertexData::Person(PersonProperties::with_gender(Gender::Female)), None)
        .unwrap();
    let rel = g
        .add_vertex(VertexData::Relationship(RelationshipProperties::default()), None)
        .unwrap();
    let hub = g.add_vertex(VertexData::ChildHub, None).unwrap();
    let child = g
        .add_vertex(VertexData::Person(PersonProperties::default()), None)
        .unwrap();
    g.add_edge(father, rel, 1).unwrap();
    g.add_edge(mother, rel, 1).unwrap();
    g.add_edge(rel, hub, 1).unwrap();
    g.add_edge(hub, child, 1).unwrap();

    let suggested = pedigree_layout::SuggestedLayout {
        ranks: Some(vec![1, 2, 1, 2, 4]),
        ..Default::default()
    };
    let dg = DynamicPositionedGraph::with_suggested_layout(g, LayoutContext::default(), suggested)
        .unwrap();
    assert_eq!(dg.positioned().ranks()[child], 3);
    assert_eq!(dg.positioned().ranks()[mother], 1);
}

#[test]
fn invalid_options_are_rejected() {
    let options = LayoutOptions {
        max_init_ordering_buckets: 9,
        ..Default::default()
    };
    let imported = from_ped(THREE_GENERATIONS, &PedImportOptions::default()).unwrap();
    let err = PositionedGraph::new(imported.graph, Some(0), options, None).unwrap_err();
    assert!(matches!(err, pedigree_layout::Error::InvalidOption { .. }));
}
