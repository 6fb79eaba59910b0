use pedigree_layout::graph::{Consanguinity, Gender, PersonProperties, RelationshipProperties};
use pedigree_layout::{
    DynamicPositionedGraph, LayoutContext, PedImportOptions, PossiblePartner, from_ped,
};

/// gc 0, f 1, m 2, c1 3, c2 4, unknown father 5, relationships 6 (hub 7) and 8 (hub 9).
const THREE_GENERATIONS: &str = "\
fam gc 0 c1 1 2
fam f 0 0 1 1
fam m 0 0 2 1
fam c1 f m 2 1
fam c2 f m 1 1
";

fn three_generations() -> DynamicPositionedGraph {
    from_ped(THREE_GENERATIONS, &PedImportOptions::default())
        .unwrap()
        .into_layout(LayoutContext::default())
        .unwrap()
}

#[test]
fn generations_count_from_the_top() {
    let dg = three_generations();
    assert_eq!(dg.generation(1).unwrap(), 1);
    assert_eq!(dg.generation(2).unwrap(), 1);
    assert_eq!(dg.generation(8).unwrap(), 1);
    assert_eq!(dg.generation(3).unwrap(), 2);
    assert_eq!(dg.generation(5).unwrap(), 2);
    assert_eq!(dg.generation(0).unwrap(), 3);
    assert!(dg.generation(7).is_ok());
    assert!(dg.generation(42).is_err());
}

#[test]
fn later_generations_are_drawn_lower() {
    let dg = three_generations();
    let y = |v| dg.position(v).unwrap().y;
    assert!(y(1) < y(3));
    assert!(y(3) < y(0));
    assert_eq!(y(1), y(2));
    let hub = dg.relationship_childhub_position(8).unwrap();
    assert!(hub.y > y(8) && hub.y < y(3));
}

#[test]
fn order_within_generation_is_one_based() {
    let dg = three_generations();
    let mut seen: Vec<usize> = [3, 4, 5]
        .into_iter()
        .map(|v| dg.order_within_generation(v).unwrap())
        .collect();
    seen.sort_unstable();
    assert_eq!(seen, vec![1, 2, 3]);
    assert_eq!(dg.order_within_generation(0).unwrap(), 1);
    assert!(!dg.allow_manual_node_reposition_left(0));
    assert!(!dg.allow_manual_node_reposition_right(0));
}

#[test]
fn family_queries() {
    let dg = three_generations();
    assert_eq!(dg.parent_relationship(0).unwrap(), Some(6));
    let mut parents = dg.parents(0).unwrap();
    parents.sort_unstable();
    assert_eq!(parents, vec![3, 5]);
    assert_eq!(dg.all_relationships(3).unwrap(), vec![6]);
    assert_eq!(dg.all_partners(3).unwrap(), vec![5]);

    let mut children = dg.all_children(1).unwrap();
    children.sort_unstable();
    assert_eq!(children, vec![3, 4]);
    assert_eq!(dg.all_siblings(3).unwrap(), vec![4]);
    assert_eq!(dg.relationship_children_sorted_by_order(8).unwrap().len(), 2);
    assert!(dg.all_person_ids().len() == 6);
    assert_eq!(dg.component_count(), 1);
}

#[test]
fn imported_unknown_parents_are_commented() {
    let dg = three_generations();
    let father = dg.person_properties(5).unwrap();
    assert_eq!(father.gender, Gender::Male);
    assert_eq!(father.comments.as_deref(), Some("unknown"));
    assert_eq!(dg.person_properties(0).unwrap().disorders, vec!["affected".to_string()]);
}

#[test]
fn removing_a_founder_cuts_off_her_other_children() {
    let dg = three_generations();
    assert_eq!(dg.disconnected_set_if_node_removed(2).unwrap(), vec![1, 2, 4, 8]);
    assert_eq!(dg.disconnected_set_if_node_removed(4).unwrap(), vec![4]);
    assert!(dg.disconnected_set_if_node_removed(9).is_err());
}

#[test]
fn possible_relatives_exclude_ancestors_and_descendants() {
    let dg = three_generations();
    // nobody can become the parent of their own grandparent
    assert!(!dg.possible_parents_of(1).contains(&0));
    assert!(dg.possible_parents_of(0).contains(&4));
    assert!(!dg.possible_children_of(0).contains(&1));
    assert!(!dg.possible_siblings_of(4).contains(&0));
}

#[test]
fn opposite_gender_partners_are_preferred() {
    let dg = three_generations();
    let candidates = dg.possible_partners_of(4).unwrap();
    assert!(candidates.contains(&PossiblePartner {
        node_id: 3,
        preferred: true
    }));
    assert!(candidates.contains(&PossiblePartner {
        node_id: 0,
        preferred: false
    }));
    assert!(!candidates.iter().any(|c| c.node_id == 4));

    let json = serde_json::to_value(&candidates[0]).unwrap();
    assert!(json.get("nodeID").is_some());
}

#[test]
fn consanguinity_follows_explicit_setting() {
    let mut dg = three_generations();
    assert!(!dg.is_consangr_relationship(8).unwrap());

    let forced = RelationshipProperties {
        consanguinity: Consanguinity::Yes,
        ..Default::default()
    };
    dg.set_relationship_properties(8, forced).unwrap();
    assert!(dg.is_consangr_relationship(8).unwrap());
    assert!(dg.set_relationship_properties(0, RelationshipProperties::default()).is_err());
}

#[test]
fn relationship_line_of_a_partner() {
    let dg = three_generations();
    let info = dg.relationship_line_info(8, 1).unwrap();
    assert!(info.num_attach_ports >= 1);
    assert!(info.attach_y.is_finite() && info.vertical_y.is_finite());
    assert!(dg.relationship_line_info(1, 8).is_err());
}

#[test]
fn child_last_name_comes_from_the_father() {
    let mut dg = three_generations();
    let father = PersonProperties {
        last_name: Some("Smith".to_string()),
        ..PersonProperties::with_gender(Gender::Male)
    };
    dg.set_person_properties(1, father).unwrap();
    assert_eq!(dg.relationship_child_last_name(8).unwrap().as_deref(), Some("Smith"));
    assert_eq!(dg.relationship_child_last_name(6).unwrap(), None);
}
