use assert_cmd::Command;
use std::fs;

const FAMILY_PED: &str = "\
fam kid dad mum 2 2
fam dad 0 0 1 1
fam mum 0 0 2 1
fam sib dad mum 1 1
";

fn run_cli(args: &[&str], stdin: &str) -> serde_json::Value {
    let exe = assert_cmd::cargo_bin!("pedigree-cli");
    let output = Command::new(exe)
        .args(args)
        .write_stdin(stdin)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    serde_json::from_slice(&output).expect("stdout is JSON")
}

#[test]
fn cli_imports_ped_from_stdin() {
    let layout = run_cli(&["import"], FAMILY_PED);
    assert_eq!(layout["probandNodeID"], serde_json::json!(0));
    assert_eq!(layout["JSON_version"], serde_json::json!("1.0"));
    assert!(layout["GG"].as_array().is_some_and(|gg| gg.len() == 6));
}

#[test]
fn cli_summarizes_an_imported_json_file() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let input = tmp.path().join("family.json");
    fs::write(
        &input,
        r#"[{"name": "dad", "sex": "male"}, {"name": "mum", "sex": "female"},
            {"name": "kid", "father": "dad", "mother": "mum", "proband": true}]"#,
    )
    .expect("write input");

    let layout = run_cli(&["import", input.to_string_lossy().as_ref()], "");
    let summary = run_cli(&["summary"], &layout.to_string());
    assert_eq!(summary["persons"], serde_json::json!(3));
    assert_eq!(summary["relationships"], serde_json::json!(1));
    assert_eq!(summary["generations"], serde_json::json!(2));
    assert_eq!(summary["proband"], serde_json::json!(2));
}

#[test]
fn cli_prints_drawn_nodes() {
    let layout = run_cli(&["import", "--format", "ped"], FAMILY_PED);
    let nodes = run_cli(&["layout"], &layout.to_string());
    let nodes = nodes.as_array().expect("array of nodes");
    assert_eq!(nodes.len(), 5);
    let rel = nodes
        .iter()
        .find(|n| n["kind"] == "relationship")
        .expect("one relationship");
    assert!(rel["childhub"]["y"].as_f64().is_some());
}

#[test]
fn cli_reports_import_errors() {
    let exe = assert_cmd::cargo_bin!("pedigree-cli");
    Command::new(exe)
        .args(["import"])
        .write_stdin("fam a 0 0 1 1\nfam b 0 0 2 1\n")
        .assert()
        .failure()
        .code(1);

    let exe = assert_cmd::cargo_bin!("pedigree-cli");
    Command::new(exe).args(["--bogus"]).assert().failure().code(2);
}
