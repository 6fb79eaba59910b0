//! LINKAGE `.ped` files.
//!
//! Pre-makeped files have six columns: family, person, father, mother, sex (1 male, 2 female)
//! and phenotype. Post-makeped files (detected by the `Ped:`/`Per:` markers on the first line)
//! carry ten columns with sex in the 8th, a proband flag in the 9th and the phenotype in the
//! 10th. Parent id `0` means unknown.

use super::tracker::RelationshipTracker;
use super::{ImportedPedigree, finish};
use pedigree_graph::{BaseGraph, Error, Gender, PersonProperties, Result, VertexData, VertexId};
use rustc_hash::FxHashMap as HashMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PedImportOptions {
    /// Phenotype codes other than `-9/0/1/2` become distinct affected disorders.
    pub accept_other_phenotypes: bool,
    /// Persons with a known phenotype are marked as evaluated.
    pub mark_evaluated: bool,
    /// Keeps the file's person id as the external id.
    pub save_id_as_external_id: bool,
    /// Uses the `-9/0/1` scheme (1 = affected) instead of `-9/0/1/2`.
    pub affected_code_one: bool,
}

struct Row {
    name: String,
    father: String,
    mother: String,
    gender: Gender,
    phenotype: String,
    proband: bool,
}

const MISSING_PARENT: &str = "0";

fn sanitize(line: &str) -> String {
    line.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-' | '*') || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect()
}

fn parse_rows(input: &str) -> Result<Vec<Row>> {
    let lines: Vec<&str> = input.lines().filter(|l| !l.trim().is_empty()).collect();
    let Some(first) = lines.first() else {
        return Err(Error::import("no data"));
    };
    let post_makeped = first.contains("Ped:") && first.contains("Per:");

    let mut family: Option<String> = None;
    let mut rows = Vec::with_capacity(lines.len());
    for line in lines {
        let clean = sanitize(line);
        let parts: Vec<&str> = clean.split_whitespace().collect();
        if parts.len() < 6 || (post_makeped && parts.len() < 10) {
            return Err(Error::import(format!(
                "input line has not enough columns: [{}]",
                clean.trim()
            )));
        }
        match &family {
            None => family = Some(parts[0].to_string()),
            Some(f) if f != parts[0] => {
                return Err(Error::import(
                    "multiple families detected within the same pedigree",
                ));
            }
            Some(_) => {}
        }
        let (sex, phenotype) = if post_makeped {
            (parts[7], parts[9])
        } else {
            (parts[4], parts[5])
        };
        let gender = match sex {
            "1" => Gender::Male,
            "2" => Gender::Female,
            _ => Gender::Unknown,
        };
        rows.push(Row {
            name: parts[1].to_string(),
            father: parts[2].to_string(),
            mother: parts[3].to_string(),
            gender,
            phenotype: phenotype.to_string(),
            proband: post_makeped && parts[8] == "1",
        });
    }
    Ok(rows)
}

enum Phenotype {
    Affected(String),
    Unaffected,
    Unknown,
}

/// Which phenotype codes mean affected and unaffected; anything else is unknown.
struct PhenotypeScheme {
    affected: Vec<String>,
    unaffected: &'static str,
}

impl PhenotypeScheme {
    fn new(rows: &[Row], options: &PedImportOptions) -> Result<Self> {
        let standard = ["-9", "0", "1", "2"];
        let extended: Vec<String> = if options.accept_other_phenotypes {
            let mut codes: Vec<String> = rows
                .iter()
                .map(|r| r.phenotype.clone())
                .filter(|p| !standard.contains(&p.as_str()))
                .collect();
            codes.sort();
            codes.dedup();
            codes
        } else {
            Vec::new()
        };

        if options.affected_code_one {
            if !extended.is_empty() || rows.iter().any(|r| r.phenotype == "2") {
                return Err(Error::import(
                    "phenotypes with codes other than 0 or 1 were found",
                ));
            }
            return Ok(Self {
                affected: vec!["1".to_string()],
                unaffected: "0",
            });
        }
        let mut affected = vec!["2".to_string()];
        affected.extend(extended);
        Ok(Self {
            affected,
            unaffected: "1",
        })
    }

    fn classify(&self, code: &str) -> Phenotype {
        if self.affected.iter().any(|a| a == code) {
            // only the standard "affected" code maps to a plain disorder name
            if code == "1" || code == "2" {
                Phenotype::Affected("affected".to_string())
            } else {
                Phenotype::Affected(format!("affected (phenotype {code})"))
            }
        } else if code == self.unaffected {
            Phenotype::Unaffected
        } else {
            Phenotype::Unknown
        }
    }
}

/// Imports a LINKAGE pedigree. The first person (or the one flagged as proband in a
/// post-makeped file) becomes the proband with id 0.
pub fn from_ped(input: &str, options: &PedImportOptions) -> Result<ImportedPedigree> {
    let mut rows = parse_rows(input)?;
    let scheme = PhenotypeScheme::new(&rows, options)?;
    if let Some(p) = rows.iter().position(|r| r.proband) {
        let proband = rows.remove(p);
        rows.insert(0, proband);
    }

    let mut gg = BaseGraph::new();
    let mut ids: HashMap<&str, VertexId> = HashMap::default();
    for row in &rows {
        if ids.contains_key(row.name.as_str()) {
            return Err(Error::import(format!(
                "multiple persons with the same ID [{}]",
                row.name
            )));
        }
        let mut properties = PersonProperties::with_gender(row.gender);
        if options.save_id_as_external_id {
            properties.external_id = Some(row.name.clone());
        }
        match scheme.classify(&row.phenotype) {
            Phenotype::Affected(disorder) => {
                properties.carrier_status = Some("affected".to_string());
                properties.disorders = vec![disorder];
                properties.evaluated = options.mark_evaluated;
            }
            Phenotype::Unaffected => properties.evaluated = options.mark_evaluated,
            Phenotype::Unknown => {}
        }
        let id = gg.add_vertex(VertexData::Person(properties), None)?;
        ids.insert(row.name.as_str(), id);
    }

    let mut tracker = RelationshipTracker::default();
    for row in &rows {
        if row.father == MISSING_PARENT && row.mother == MISSING_PARENT {
            continue;
        }
        let child = ids[row.name.as_str()];
        let father = resolve_parent(&mut gg, &ids, &row.father, Gender::Male, &row.name)?;
        let mother = resolve_parent(&mut gg, &ids, &row.mother, Gender::Female, &row.name)?;
        if father == child || mother == child {
            return Err(Error::import(format!(
                "person [{}] is declared to be their own parent",
                row.name
            )));
        }
        let hub = tracker.create_or_get_childhub(&mut gg, mother, father)?;
        gg.add_edge(hub, child, 1)?;
    }

    finish(gg, 0)
}

/// Looks up a parent column, creating an "unknown" person when the parent is missing.
fn resolve_parent(
    gg: &mut BaseGraph,
    ids: &HashMap<&str, VertexId>,
    reference: &str,
    role: Gender,
    child: &str,
) -> Result<VertexId> {
    let role_name = if role == Gender::Male { "father" } else { "mother" };
    if reference == MISSING_PARENT {
        let properties = PersonProperties {
            gender: role,
            comments: Some("unknown".to_string()),
            ..Default::default()
        };
        return gg.add_vertex(VertexData::Person(properties), None);
    }
    let Some(&id) = ids.get(reference) else {
        return Err(Error::import(format!(
            "[{reference}] is not a valid {role_name} reference for [{child}]"
        )));
    };
    if gg.gender(id)? == role.opposite() {
        return Err(Error::import(format!(
            "a person [{reference}] of the other sex is declared as the {role_name} of [{child}]"
        )));
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_punctuation_but_keeps_ids() {
        assert_eq!(sanitize("fam1,\tp-1.a*"), "fam1 \tp-1.a*");
    }

    #[test]
    fn post_makeped_proband_comes_first() {
        let input = "\
fam 1 0 0 3 0 0 1 0 1 Ped: fam Per: 1
fam 2 0 0 3 0 0 2 0 1 Ped: fam Per: 2
fam 3 1 2 0 0 0 1 1 2 Ped: fam Per: 3
";
        let imported = from_ped(input, &PedImportOptions::default()).unwrap();
        assert_eq!(imported.proband, 0);
        let proband = imported.graph.person(0).unwrap();
        assert_eq!(proband.disorders, vec!["affected".to_string()]);
        assert_eq!(imported.graph.in_edges(0).len(), 1);
    }
}
