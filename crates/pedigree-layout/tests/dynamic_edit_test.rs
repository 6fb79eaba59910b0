use pedigree_layout::graph::{Gender, PersonProperties, VertexId};
use pedigree_layout::position::Positioner;
use pedigree_layout::{
    DynamicPositionedGraph, LayoutContext, PedImportOptions, from_ped, from_simple_json,
};
use std::collections::BTreeMap;

/// Ids after import: gc 0, f 1, m 2, c1 3, c2 4, gc's unknown father 5, relationship of
/// c1 and the unknown father 6 (hub 7), relationship of f and m 8 (hub 9).
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

fn family_of_four() -> DynamicPositionedGraph {
    let input = r#"[
        {"name": "dad", "sex": "male"},
        {"name": "mum", "sex": "female"},
        {"name": "a", "mother": "mum", "father": "dad", "proband": true},
        {"name": "b", "mother": "mum", "father": "dad"}
    ]"#;
    from_simple_json(input)
        .unwrap()
        .into_layout(LayoutContext::default())
        .unwrap()
}

fn assert_order_matches_ranks(dg: &DynamicPositionedGraph) {
    let p = dg.positioned();
    let placed: usize = p.order().ranks().iter().map(Vec::len).sum();
    assert_eq!(placed, p.graph().num_vertices());
    for v in 0..p.graph().num_vertices() {
        assert_eq!(p.order().vertex_at(p.ranks()[v], p.order().position(v)), Some(v));
    }
}

fn assert_positions_valid(dg: &DynamicPositionedGraph) {
    let p = dg.positioned();
    let positioner = Positioner::new(p.graph(), p.ranks(), p.max_rank(), p.order(), p.options());
    assert!(positioner.validate_positions(p.positions()));
}

/// Valid positions that reload unchanged and that a further `improve_position` leaves alone.
fn assert_settled(dg: &mut DynamicPositionedGraph) {
    assert_order_matches_ranks(dg);
    assert_positions_valid(dg);

    let saved = dg.to_json().unwrap();
    let restored = DynamicPositionedGraph::from_layout_json(&saved, LayoutContext::default()).unwrap();
    assert_eq!(restored.to_json().unwrap(), saved);

    dg.improve_position().unwrap();
    assert_positions_valid(dg);
    let once = dg.positioned().positions().to_vec();
    dg.improve_position().unwrap();
    assert_eq!(dg.positioned().positions(), once.as_slice());
}

#[test]
fn new_parents_of_a_single_proband() {
    let mut dg = DynamicPositionedGraph::with_single_proband(LayoutContext::default()).unwrap();
    let changes = dg.add_new_parents(0).unwrap();

    assert_eq!(changes.new, vec![2, 3, 4]);
    assert!(dg.is_relationship(2));
    assert_eq!(dg.gender(3).unwrap(), Gender::Female);
    assert_eq!(dg.gender(4).unwrap(), Gender::Male);
    assert!(changes.moved.contains(&0));
    assert_eq!(changes.highlight, vec![0]);

    assert_eq!(dg.parents(0).unwrap().len(), 2);
    assert_eq!(dg.positioned().max_rank(), 3);
    assert_order_matches_ranks(&dg);
}

#[test]
fn adding_parents_twice_is_rejected() {
    let mut dg = DynamicPositionedGraph::with_single_proband(LayoutContext::default()).unwrap();
    dg.add_new_parents(0).unwrap();
    assert!(dg.add_new_parents(0).is_err());
    assert_eq!(dg.graph().real_vertex_count(), 5);
}

#[test]
fn twins_added_twice_share_one_group() {
    let mut dg = three_generations();
    let first = dg.add_twin(4, PersonProperties::default()).unwrap();
    let second = dg.add_twin(4, PersonProperties::default()).unwrap();

    let group = dg.twin_group_id(4).unwrap();
    let twins = [first.new[0], second.new[0]];
    for twin in twins {
        assert_eq!(dg.twin_group_id(twin), Some(group));
    }
    let sorted = dg.all_twins_sorted_by_order(4).unwrap();
    assert_eq!(sorted.len(), 3);
    for pair in sorted.windows(2) {
        let order = dg.positioned().order();
        assert!(order.position(pair[0]) < order.position(pair[1]));
    }
    // c1 is a sibling but not a twin
    assert_eq!(dg.twin_group_id(3), None);
    assert!(first.moved.contains(&8));
}

#[test]
fn partners_across_generations_get_a_virtual_chain() {
    let mut dg = three_generations();
    let changes = dg.assign_partner(0, 4, PersonProperties::default()).unwrap();
    let rel = changes.new[0];
    assert!(dg.is_relationship(rel));
    assert!(changes.highlight.contains(&0) && changes.highlight.contains(&4));

    let p = dg.positioned();
    let g = p.graph();
    let (low, high) = (p.ranks()[0], p.ranks()[4]);
    assert_eq!(p.ranks()[rel], low);

    let chain = g
        .path_to_parents(rel)
        .unwrap()
        .into_iter()
        .find(|path| path.last() == Some(&4))
        .unwrap();
    let between = chain
        .iter()
        .filter(|&&u| g.is_virtual(u) && p.ranks()[u] > high && p.ranks()[u] < low)
        .count();
    assert_eq!(between, low - high - 1);

    // gc is the son of c2's sister
    assert!(dg.is_consangr_relationship(rel).unwrap());
    assert_order_matches_ranks(&dg);
}

#[test]
fn removing_a_person_renumbers_higher_ids() {
    let mut dg = three_generations();
    let changes = dg.remove_nodes(&[4]).unwrap();

    let expected: BTreeMap<VertexId, VertexId> =
        [(5, 4), (6, 5), (7, 6), (8, 7), (9, 8)].into_iter().collect();
    assert_eq!(changes.changed_id_set, expected);
    assert_eq!(changes.removed, vec![4]);
    assert_eq!(dg.graph().real_vertex_count(), 9);
    assert_eq!(dg.proband(), Some(0));
    assert_order_matches_ranks(&dg);
}

#[test]
fn removing_a_lower_id_shifts_the_proband() {
    let input = r#"[
        {"name": "dad", "sex": "male"},
        {"name": "mum", "sex": "female"},
        {"name": "sis", "mother": "mum", "father": "dad", "sex": "female"},
        {"name": "me", "mother": "mum", "father": "dad", "proband": true}
    ]"#;
    let mut dg = from_simple_json(input)
        .unwrap()
        .into_layout(LayoutContext::default())
        .unwrap();
    assert_eq!(dg.proband(), Some(3));

    let changes = dg.remove_nodes(&[2]).unwrap();
    assert_eq!(dg.proband(), Some(2));
    assert_eq!(changes.changed_id_set.get(&3), Some(&2));
}

#[test]
fn failed_edit_leaves_layout_untouched() {
    let mut dg = three_generations();
    let before = dg.to_json().unwrap();
    // 7 is a child hub, which cannot be removed on its own
    assert!(dg.remove_nodes(&[7]).is_err());
    assert_eq!(dg.to_json().unwrap(), before);
}

#[test]
fn improving_positions_twice_changes_nothing() {
    let mut dg = three_generations();
    dg.improve_position().unwrap();
    let once = dg.positioned().positions().to_vec();
    dg.improve_position().unwrap();
    assert_eq!(dg.positioned().positions(), once.as_slice());
}

#[test]
fn clearing_keeps_only_the_proband() {
    let mut dg = three_generations();
    let changes = dg.clear_all().unwrap();
    assert_eq!(changes.new, vec![0]);
    assert_eq!(changes.makevisible, vec![0]);
    assert_eq!(changes.removed.len(), 8);
    assert_eq!(dg.graph().real_vertex_count(), 1);
    assert_eq!(dg.gender(0).unwrap(), Gender::Male);
}

#[test]
fn new_child_of_a_relationship() {
    let mut dg = three_generations();
    let changes = dg
        .add_new_child(8, PersonProperties::with_gender(Gender::Female), 2)
        .unwrap();
    assert_eq!(changes.new.len(), 2);
    assert!(changes.moved.contains(&8));
    let children = dg.relationship_children_sorted_by_order(8).unwrap();
    assert_eq!(children.len(), 4);
    let twins = dg.all_twins_sorted_by_order(changes.new[0]).unwrap();
    assert_eq!(twins.len(), 2);
    assert_order_matches_ranks(&dg);
}

#[test]
fn new_relationship_adds_partner_and_child() {
    let mut dg = three_generations();
    let changes = dg
        .add_new_relationship(4, PersonProperties::default(), false, 1)
        .unwrap();
    let [rel, partner, child] = changes.new[..] else {
        panic!("unexpected change set {changes:?}");
    };
    assert!(dg.is_relationship(rel));
    assert_eq!(dg.gender(partner).unwrap(), Gender::Female);
    assert_eq!(dg.parents(child).unwrap().len(), 2);
    assert_eq!(dg.positioned().ranks()[rel], dg.positioned().ranks()[4]);
    assert_eq!(dg.all_partners(4).unwrap(), vec![partner]);
    assert_order_matches_ranks(&dg);
}

#[test]
fn placeholder_child_becomes_a_person() {
    let mut dg = three_generations();
    let placeholder = PersonProperties {
        placeholder: true,
        ..Default::default()
    };
    let changes = dg.add_new_child(8, placeholder, 1).unwrap();
    let id = changes.new[0];
    assert!(dg.is_placeholder(id));
    assert!(!dg.all_person_ids().contains(&id));

    let converted = dg
        .convert_placeholder_to(id, PersonProperties::with_gender(Gender::Male))
        .unwrap();
    assert_eq!(converted.new, vec![id]);
    assert!(!dg.is_placeholder(id));
    assert!(converted.moved.contains(&8));
    assert!(!converted.moved.contains(&id));
}

#[test]
fn sibling_moves_one_step_right() {
    let mut dg = family_of_four();
    let (a, b) = (2, 3);
    let order = dg.positioned().order();
    let (left, right) = if order.position(a) < order.position(b) {
        (a, b)
    } else {
        (b, a)
    };

    let changes = dg.perform_node_order_change(left, 1).unwrap();
    assert!(!changes.moved.is_empty());
    let order = dg.positioned().order();
    assert!(order.position(left) > order.position(right));
    assert!(dg.positioned().positions()[left] > dg.positioned().positions()[right]);

    // nobody to pass any more
    let unchanged = dg.perform_node_order_change(left, 1).unwrap();
    assert!(unchanged.is_empty());
}

#[test]
fn assigning_an_existing_person_as_parent() {
    let mut dg = family_of_four();
    let orphan = dg
        .add_new_relationship(3, PersonProperties::default(), false, 1)
        .unwrap();
    let partner = orphan.new[1];
    assert!(dg.parents(partner).unwrap().is_empty());

    // the partner of b gets a's parents as parents; ranks force a full redraw
    let rel = dg.parent_relationship(2).unwrap().unwrap();
    let changes = dg.assign_parent(rel, partner).unwrap();
    assert!(!changes.moved.is_empty() || !changes.new.is_empty());
    assert_eq!(dg.parent_relationship(partner).unwrap(), Some(rel));
    assert_order_matches_ranks(&dg);
}

#[test]
fn long_comments_push_lower_generations_down() {
    let mut dg = three_generations();
    let y = |dg: &DynamicPositionedGraph, v| dg.position(v).unwrap().y;
    let (father_y, child_y) = (y(&dg, 1), y(&dg, 3));

    let props = PersonProperties {
        comments: Some("one\ntwo\nthree\nfour\nfive\nsix".to_string()),
        ..PersonProperties::with_gender(Gender::Male)
    };
    dg.set_person_properties(1, props).unwrap();
    dg.update_y_positioning().unwrap();

    assert_eq!(y(&dg, 1), father_y);
    assert!(y(&dg, 3) > child_y);
    assert!(dg.update_y_positioning().unwrap().moved.is_empty());
}

#[test]
fn updating_ancestors_reports_every_relationship() {
    let mut dg = three_generations();
    let mut moved = dg.update_ancestors().unwrap().moved;
    moved.sort_unstable();
    assert_eq!(moved, vec![6, 8]);
    assert!(!dg.is_consangr_relationship(6).unwrap());
}

#[test]
fn removing_one_of_two_twins_keeps_the_separation() {
    let mut dg = three_generations();
    let twin = dg.add_twin(4, PersonProperties::default()).unwrap().new[0];
    assert!(dg.twin_group_id(4).is_some());

    let changes = dg.remove_nodes(&[twin]).unwrap();
    assert_eq!(changes.removed, vec![twin]);
    assert_eq!(dg.twin_group_id(4), None);
    assert_positions_valid(&dg);
}

#[test]
fn layout_stays_settled_through_a_session_of_edits() {
    let mut dg = three_generations();
    assert_settled(&mut dg);

    let twin = dg.add_twin(4, PersonProperties::default()).unwrap().new[0];
    assert_settled(&mut dg);

    dg.add_new_relationship(0, PersonProperties::with_gender(Gender::Female), false, 1)
        .unwrap();
    assert_settled(&mut dg);

    dg.assign_partner(0, 4, PersonProperties::default()).unwrap();
    assert_settled(&mut dg);

    dg.perform_node_order_change(1, 1).unwrap();
    assert_settled(&mut dg);

    let doomed = dg.disconnected_set_if_node_removed(twin).unwrap();
    assert_eq!(doomed, vec![twin]);
    dg.remove_nodes(&doomed).unwrap();
    assert_eq!(dg.twin_group_id(4), None);
    assert_settled(&mut dg);

    dg.add_new_parents(1).unwrap();
    assert_settled(&mut dg);

    dg.redraw_all().unwrap();
    assert_settled(&mut dg);
}
