use pedigree_layout::graph::{Gender, PersonProperties};
use pedigree_layout::{
    CURRENT_JSON_VERSION, DynamicPositionedGraph, Error, LayoutContext, LayoutDocument,
    PedImportOptions, from_ped,
};
use serde_json::json;

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
fn saved_layout_is_restored_exactly() {
    let dg = three_generations();
    let saved = dg.to_json().unwrap();
    assert_eq!(saved["JSON_version"], json!(CURRENT_JSON_VERSION));
    assert_eq!(saved["probandNodeID"], json!(0));

    let restored = DynamicPositionedGraph::from_layout_json(&saved, LayoutContext::default()).unwrap();
    assert_eq!(restored.to_json().unwrap(), saved);
    assert_eq!(restored.positioned().positions(), dg.positioned().positions());
    assert_eq!(restored.positioned().max_rank(), 5);
}

#[test]
fn long_partner_lines_survive_a_round_trip() {
    let mut dg = three_generations();
    dg.assign_partner(0, 4, PersonProperties::default()).unwrap();
    let saved = dg.to_json().unwrap();
    let virtual_count = dg.graph().num_vertices() - dg.graph().real_vertex_count();
    assert!(virtual_count > 0);

    let restored = DynamicPositionedGraph::from_layout_json(&saved, LayoutContext::default()).unwrap();
    assert_eq!(
        restored.graph().num_vertices() - restored.graph().real_vertex_count(),
        virtual_count
    );
    assert_eq!(restored.to_json().unwrap(), saved);
}

#[test]
fn other_document_versions_are_rejected() {
    let dg = three_generations();
    let mut saved = dg.to_json().unwrap();
    saved["JSON_version"] = json!("0.9");
    let err = DynamicPositionedGraph::from_layout_json(&saved, LayoutContext::default()).unwrap_err();
    assert!(matches!(
        err,
        Error::UnsupportedVersion { ref found, .. } if found == "0.9"
    ));
}

#[test]
fn loading_replaces_the_current_pedigree() {
    let source = three_generations();
    let saved = source.to_json().unwrap();

    let mut dg = DynamicPositionedGraph::with_single_proband(LayoutContext::default()).unwrap();
    let changes = dg.from_json(&saved).unwrap();
    assert_eq!(changes.removed, vec![0]);
    assert_eq!(changes.new.len(), 8);
    assert_eq!(dg.to_json().unwrap(), saved);
}

#[test]
fn broken_document_keeps_the_current_pedigree() {
    let mut dg = three_generations();
    let before = dg.to_json().unwrap();
    assert!(dg.from_json(&json!({"GG": "nope"})).is_err());
    assert_eq!(dg.to_json().unwrap(), before);
}

#[test]
fn document_field_names() {
    let dg = three_generations();
    let document: LayoutDocument = serde_json::from_value(dg.to_json().unwrap()).unwrap();
    assert_eq!(document.proband, Some(0));
    assert_eq!(document.ranks.len(), document.positions.len());
    assert_eq!(document.order.iter().map(Vec::len).sum::<usize>(), document.graph.len());
}

#[test]
fn undo_returns_to_an_earlier_state() {
    let mut dg = three_generations();
    let saved = dg.to_json().unwrap();
    let state = dg.to_undo_redo_state().unwrap();

    dg.add_new_relationship(4, PersonProperties::with_gender(Gender::Female), false, 1)
        .unwrap();
    assert_ne!(dg.to_json().unwrap(), saved);

    let changes = dg.from_undo_redo_state(&state).unwrap();
    assert_eq!(changes.new.len(), 8);
    assert_eq!(dg.to_json().unwrap(), saved);
    assert_eq!(dg.proband(), Some(0));
}

#[test]
fn undo_state_keeps_property_details() {
    let mut dg = three_generations();
    let props = PersonProperties {
        first_name: Some("Ann".to_string()),
        comments: Some("line one\nline two".to_string()),
        ..PersonProperties::with_gender(Gender::Female)
    };
    dg.set_person_properties(3, props.clone()).unwrap();
    let state = dg.to_undo_redo_state().unwrap();

    let mut other = three_generations();
    other.from_undo_redo_state(&state).unwrap();
    assert_eq!(other.person_properties(3).unwrap(), &props);
}
