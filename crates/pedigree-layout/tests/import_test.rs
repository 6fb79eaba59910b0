use pedigree_layout::graph::{Gender, LifeStatus};
use pedigree_layout::{Error, LayoutContext, PedImportOptions, from_ped, from_simple_json};

fn import_error(err: Error) -> String {
    match err {
        Error::ImportError { reason } => reason,
        other => panic!("expected an import error, got {other:?}"),
    }
}

#[test]
fn ped_founders_share_one_relationship() {
    let input = "\
fam kid dad mum 2 2
fam dad 0 0 1 1
fam mum 0 0 2 1
fam sib dad mum 1 1
";
    let imported = from_ped(input, &PedImportOptions::default()).unwrap();
    let g = &imported.graph;
    assert_eq!(imported.proband, 0);
    // four persons, one relationship, one hub
    assert_eq!(g.real_vertex_count(), 6);
    assert_eq!(g.all_relationships(1).unwrap(), vec![4]);
    assert_eq!(g.all_siblings_of(0).unwrap().len(), 2);
    assert_eq!(g.gender(0).unwrap(), Gender::Female);
}

#[test]
fn ped_phenotypes_follow_the_chosen_scheme() {
    let input = "\
fam a 0 0 1 2
fam b 0 0 2 1
fam c a b 1 0
";
    let options = PedImportOptions {
        mark_evaluated: true,
        save_id_as_external_id: true,
        ..Default::default()
    };
    let g = from_ped(input, &options).unwrap().graph;
    let a = g.person(0).unwrap();
    assert_eq!(a.disorders, vec!["affected".to_string()]);
    assert_eq!(a.carrier_status.as_deref(), Some("affected"));
    assert!(a.evaluated);
    assert_eq!(a.external_id.as_deref(), Some("a"));
    let b = g.person(1).unwrap();
    assert!(b.disorders.is_empty() && b.evaluated);
    assert!(!g.person(2).unwrap().evaluated);

    let affected_one = PedImportOptions {
        affected_code_one: true,
        ..Default::default()
    };
    let err = from_ped(input, &affected_one).unwrap_err();
    assert!(import_error(err).contains("other than 0 or 1"));
}

#[test]
fn ped_extended_phenotypes_become_disorders() {
    let input = "\
fam a 0 0 1 7
fam b 0 0 2 1
fam c a b 1 7
";
    let options = PedImportOptions {
        accept_other_phenotypes: true,
        ..Default::default()
    };
    let g = from_ped(input, &options).unwrap().graph;
    assert_eq!(
        g.person(0).unwrap().disorders,
        vec!["affected (phenotype 7)".to_string()]
    );
    assert!(from_ped(input, &PedImportOptions::default()).unwrap().graph.person(0).unwrap().disorders.is_empty());
}

#[test]
fn ped_input_errors() {
    let cases = [
        ("", "no data"),
        ("fam a 0 0 1\n", "not enough columns"),
        ("fam a 0 0 1 1\nother b 0 0 2 1\n", "multiple families"),
        ("fam a 0 0 1 1\nfam a 0 0 2 1\n", "same ID"),
        ("fam a x 0 1 1\n", "not a valid father"),
        ("fam a 0 0 1 1\nfam b a 0 2 1\nfam c b 0 1 1\n", "other sex"),
        ("fam a a 0 1 1\n", "their own parent"),
    ];
    for (input, expected) in cases {
        let err = from_ped(input, &PedImportOptions::default()).unwrap_err();
        let reason = import_error(err);
        assert!(reason.contains(expected), "{input:?}: {reason}");
    }
}

#[test]
fn ped_missing_parent_is_synthesized() {
    let input = "fam a 0 m 1 1\nfam m 0 0 2 1\n";
    let imported = from_ped(input, &PedImportOptions::default()).unwrap();
    let g = &imported.graph;
    let father = g.mother_father(0).unwrap().father.unwrap();
    assert_eq!(father, 2);
    assert_eq!(g.person(father).unwrap().comments.as_deref(), Some("unknown"));
}

#[test]
fn disconnected_pedigrees_are_rejected() {
    let input = "fam a 0 0 1 1\nfam b 0 0 2 1\n";
    let err = from_ped(input, &PedImportOptions::default()).unwrap_err();
    assert!(import_error(err).contains("disconnected"));

    let json = r#"[{"name": "a"}, {"name": "b"}]"#;
    let err = from_simple_json(json).unwrap_err();
    assert!(import_error(err).contains("disconnected"));
}

#[test]
fn simple_json_family() {
    let input = r#"[
        {"name": "f11", "sex": "female"},
        {"name": "m11", "sex": "male", "lastName": "Doe"},
        {"name": "ch1", "mother": "f11", "father": "m11", "disorders": [603235],
         "proband": true, "deathDate": "2001-04-05"}
    ]"#;
    let imported = from_simple_json(input).unwrap();
    assert_eq!(imported.proband, 2);
    let g = &imported.graph;
    assert_eq!(g.gender(0).unwrap(), Gender::Female);
    assert_eq!(g.person(1).unwrap().last_name.as_deref(), Some("Doe"));

    let child = g.person(2).unwrap();
    assert_eq!(child.first_name.as_deref(), Some("ch1"));
    assert_eq!(child.disorders, vec!["603235".to_string()]);
    assert_eq!(child.carrier_status.as_deref(), Some("affected"));
    assert_eq!(child.life_status, Some(LifeStatus::Deceased));

    let dg = imported.into_layout(LayoutContext::default()).unwrap();
    assert_eq!(dg.proband(), Some(2));
    assert_eq!(dg.generation(2).unwrap(), 2);
}

#[test]
fn simple_json_references_by_id_then_name() {
    let input = r#"[
        {"id": 10, "name": "mother", "sex": "F"},
        {"id": "x", "sex": "M"},
        {"name": "kid", "MOTHER": 10, "Father": "x"}
    ]"#;
    let imported = from_simple_json(input).unwrap();
    assert_eq!(imported.proband, 0);
    let parents = imported.graph.mother_father(2).unwrap();
    assert_eq!(parents.mother, Some(0));
    assert_eq!(parents.father, Some(1));
}

#[test]
fn simple_json_input_errors() {
    let cases = [
        ("not json", "not a valid JSON"),
        (r#"{"name": "a"}"#, "array of objects"),
        ("[]", "empty"),
        (r#"[{"sex": "male"}]"#, "no ID or name"),
        (r#"[{"id": 1}, {"id": 1}]"#, "same ID"),
        (r#"[{"name": "a", "mother": "nobody"}]"#, "not a valid mother"),
        (r#"[{"name": "a", "sex": "male"}, {"name": "b", "mother": "a"}]"#, "other sex"),
        (r#"[{"name": "a", "mother": "a"}]"#, "own parent"),
    ];
    for (input, expected) in cases {
        let err = from_simple_json(input).unwrap_err();
        let reason = import_error(err);
        assert!(reason.contains(expected), "{input}: {reason}");
    }
}
