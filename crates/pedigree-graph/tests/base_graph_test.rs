use pedigree_graph::{
    BaseGraph, Error, Gender, PersonProperties, RelationshipProperties, VertexData, VertexKind,
};

fn person(gender: Gender) -> VertexData {
    VertexData::Person(PersonProperties::with_gender(gender))
}

fn rel() -> VertexData {
    VertexData::Relationship(RelationshipProperties::default())
}

/// father(0) + mother(1) -> rel(2) -> hub(3) -> child(4)
fn nuclear_family() -> BaseGraph {
    let mut g = BaseGraph::new();
    g.add_vertex(person(Gender::Male), None).unwrap();
    g.add_vertex(person(Gender::Female), None).unwrap();
    g.add_vertex(rel(), None).unwrap();
    g.add_vertex(VertexData::ChildHub, None).unwrap();
    g.add_vertex(person(Gender::Unknown), None).unwrap();
    g.add_edge(0, 2, 1).unwrap();
    g.add_edge(1, 2, 1).unwrap();
    g.add_edge(2, 3, 1).unwrap();
    g.add_edge(3, 4, 1).unwrap();
    g
}

#[test]
fn nuclear_family_is_valid() {
    let g = nuclear_family();
    g.validate().unwrap();
    assert_eq!(g.num_vertices(), 5);
    assert_eq!(g.real_vertex_count(), 5);
    assert_eq!(g.kind(3), VertexKind::ChildHub);
    assert_eq!(g.width(0), 10.0);
    assert_eq!(g.width(2), 2.0);
    assert_eq!(g.half_width(2), 1.0);
}

#[test]
fn structural_queries() {
    let g = nuclear_family();
    assert_eq!(g.parents(4).unwrap(), vec![0, 1]);
    assert_eq!(g.parents(2).unwrap(), vec![0, 1]);
    assert!(g.parents(0).unwrap().is_empty());
    assert_eq!(g.producing_relationship(4).unwrap(), Some(2));
    assert_eq!(g.relationship_childhub(2).unwrap(), 3);
    assert_eq!(g.all_partners(0).unwrap(), vec![1]);
    assert_eq!(g.all_relationships(1).unwrap(), vec![2]);
    assert_eq!(g.opposite_gender(0).unwrap(), Gender::Female);
    assert_eq!(g.all_ancestors(4), vec![0, 1, 2, 3, 4]);

    let roots = g.leaf_and_parentless_nodes();
    assert_eq!(roots.parentless, vec![0, 1]);
    assert_eq!(roots.leaves, vec![4]);
}

#[test]
fn person_accessors_reject_other_kinds() {
    let g = nuclear_family();
    assert!(matches!(
        g.gender(2),
        Err(Error::PreconditionViolation {
            operation: "gender",
            vertex: 2
        })
    ));
    assert!(g.relationship_childhub(0).is_err());
    assert!(g.all_siblings_of(3).is_err());
}

#[test]
fn validate_reports_relationship_without_two_partners() {
    let mut g = nuclear_family();
    g.remove_edge(1, 2).unwrap();
    assert!(matches!(g.validate(), Err(Error::InvariantViolation { .. })));
}

#[test]
fn validate_reports_disconnected_component() {
    let mut g = nuclear_family();
    g.add_vertex(person(Gender::Female), None).unwrap();
    let err = g.validate().unwrap_err();
    assert!(err.to_string().contains("disconnected"), "{err}");
}

#[test]
fn duplicate_edges_are_rejected() {
    let mut g = nuclear_family();
    assert!(g.add_edge(0, 2, 1).is_err());
}

#[test]
fn remove_shifts_higher_ids_down() {
    let mut g = nuclear_family();
    // add a second child and then remove the first one
    g.add_vertex(person(Gender::Female), None).unwrap();
    g.add_edge(3, 5, 1).unwrap();
    g.remove(4).unwrap();

    assert_eq!(g.num_vertices(), 5);
    assert_eq!(g.out_edges(3), &[4]);
    assert_eq!(g.in_edges(4), &[3]);
    assert_eq!(g.gender(4).unwrap(), Gender::Female);
    g.validate().unwrap();
}

#[test]
fn split_and_collapse_long_edges() {
    // father(0) + mother(1) -> rel(2) -> hub(3) -> son(4); son + grandmother-generation
    // partner(5) -> rel(6) -> hub(7) -> grandchild(8), where 5 sits two generations too high
    let mut g = nuclear_family();
    g.add_vertex(person(Gender::Female), None).unwrap();
    g.add_vertex(rel(), None).unwrap();
    g.add_vertex(VertexData::ChildHub, None).unwrap();
    g.add_vertex(person(Gender::Male), None).unwrap();
    g.add_edge(4, 6, 1).unwrap();
    g.add_edge(5, 6, 1).unwrap();
    g.add_edge(6, 7, 1).unwrap();
    g.add_edge(7, 8, 1).unwrap();
    g.validate().unwrap();

    let mut ranks = vec![1, 1, 2, 3, 4, 1, 5, 6, 7];
    g.split_multi_rank_edges(&mut ranks).unwrap();

    // 5 (rank 1) -> 6 (rank 5) needs segments on ranks 2, 3 and 4
    assert_eq!(g.num_vertices(), 12);
    assert_eq!(g.real_vertex_count(), 9);
    assert_eq!(&ranks[9..], &[2, 3, 4]);
    assert_eq!(g.out_edges(5), &[9]);
    assert_eq!(g.down_the_chain_until_non_virtual(9), 6);
    assert_eq!(g.up_the_chain_until_non_virtual(11), 5);
    assert_eq!(g.all_partners(5).unwrap(), vec![4]);
    assert_eq!(g.path_to_parents(6).unwrap(), [vec![4], vec![11, 10, 9, 5]]);

    g.collapse_multi_rank_edges().unwrap();
    assert_eq!(g.num_vertices(), 9);
    assert!(g.has_edge(5, 6));
}

#[test]
fn inserting_a_real_vertex_shifts_segments_up() {
    let mut g = nuclear_family();
    g.add_vertex(person(Gender::Female), None).unwrap();
    g.add_vertex(rel(), None).unwrap();
    g.add_vertex(VertexData::ChildHub, None).unwrap();
    g.add_vertex(person(Gender::Male), None).unwrap();
    g.add_edge(4, 6, 1).unwrap();
    g.add_edge(5, 6, 1).unwrap();
    g.add_edge(6, 7, 1).unwrap();
    g.add_edge(7, 8, 1).unwrap();
    let mut ranks = vec![1, 1, 2, 3, 4, 1, 4, 5, 6];
    g.split_multi_rank_edges(&mut ranks).unwrap();
    assert_eq!(g.out_edges(5), &[9]);

    let twin = g
        .insert_vertex(person(Gender::Unknown), 1, &[7], &[], None)
        .unwrap();
    assert_eq!(twin, 9);
    assert_eq!(g.out_edges(5), &[10]);
    assert_eq!(g.out_edges(7), &[8, 9]);
    assert!(g.is_virtual(10));
    g.validate().unwrap();
}

#[test]
fn unplugging_a_segment_reconnects_its_ends() {
    let mut g = nuclear_family();
    g.add_vertex(person(Gender::Female), None).unwrap();
    g.add_vertex(rel(), None).unwrap();
    g.add_vertex(VertexData::ChildHub, None).unwrap();
    g.add_vertex(person(Gender::Male), None).unwrap();
    g.add_edge(4, 6, 1).unwrap();
    g.add_edge(5, 6, 2).unwrap();
    g.add_edge(6, 7, 1).unwrap();
    g.add_edge(7, 8, 1).unwrap();
    let mut ranks = vec![1, 1, 2, 3, 4, 2, 4, 5, 6];
    g.split_multi_rank_edges(&mut ranks).unwrap();
    assert_eq!(g.num_vertices(), 10);

    g.unplug_virtual_vertex(9).unwrap();
    assert!(g.has_edge(5, 6));
    assert_eq!(g.edge_weight(5, 6), 2);
    assert!(g.out_edges(9).is_empty());
    g.remove(9).unwrap();
    g.validate().unwrap();
    assert!(g.unplug_virtual_vertex(0).is_err());
}

#[test]
fn twins_and_unused_group_ids() {
    let mut g = nuclear_family();
    g.person_mut(4).unwrap().twin_group = Some(0);
    let twin = g
        .insert_vertex(
            VertexData::Person(PersonProperties {
                twin_group: Some(0),
                ..Default::default()
            }),
            1,
            &[3],
            &[],
            None,
        )
        .unwrap();
    let single = g.insert_vertex(person(Gender::Male), 1, &[3], &[], None).unwrap();

    assert_eq!(g.all_twins_of(4).unwrap(), vec![4, twin]);
    assert_eq!(g.all_twins_of(single).unwrap(), vec![single]);
    assert_eq!(g.all_siblings_of(single).unwrap(), vec![4, twin, single]);
    assert_eq!(g.unused_twin_group_id(2).unwrap(), 1);
    assert!(g.is_parent_to_twin_edge(3, twin));
    assert!(!g.is_parent_to_twin_edge(3, single));
}

#[test]
fn serialize_round_trip_keeps_properties_and_weights() {
    let mut g = nuclear_family();
    {
        let p = g.person_mut(4).unwrap();
        p.first_name = Some("Ann".to_string());
        p.extra
            .insert("hpoTerms".to_string(), serde_json::json!(["HP:0000118"]));
    }
    g.remove_edge(3, 4).unwrap();
    g.add_edge(3, 4, 3).unwrap();

    let wire = g.serialize(false).unwrap();
    let json = serde_json::to_value(&wire).unwrap();
    assert_eq!(json[2]["rel"], true);
    assert_eq!(json[3]["chhub"], true);
    assert_eq!(json[3]["outedges"][0]["weight"], 3);
    assert!(json[0]["outedges"][0].get("weight").is_none());
    assert_eq!(json[4]["prop"]["fName"], "Ann");
    assert_eq!(json[4]["prop"]["hpoTerms"][0], "HP:0000118");

    let back = BaseGraph::deserialize(&wire, g.defaults()).unwrap();
    assert_eq!(back.num_vertices(), 5);
    assert_eq!(back.edge_weight(3, 4), 3);
    assert_eq!(back.person(4), g.person(4));
}

#[test]
fn deserialize_rejects_sparse_ids() {
    let wire: Vec<pedigree_graph::SerializedVertex> = serde_json::from_value(serde_json::json!([
        {"id": 0, "prop": {"gender": "M"}},
        {"id": 2, "prop": {"gender": "F"}}
    ]))
    .unwrap();
    let err = BaseGraph::deserialize(&wire, Default::default()).unwrap_err();
    assert!(matches!(err, Error::ImportError { .. }));
}
