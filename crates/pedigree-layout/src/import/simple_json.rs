//! The "simple JSON" pedigree format: an array of persons.
//!
//! ```json
//! [ { "name": "f11", "sex": "female" },
//!   { "name": "m11", "sex": "male" },
//!   { "name": "ch1", "mother": "f11", "father": "m11", "disorders": [603235], "proband": true } ]
//! ```
//!
//! Every person needs one of `id`, `name`, `firstName` or `externalId`. `mother` and `father`
//! refer to another person by id (or external id), then by name. Keys are case-insensitive.

use super::tracker::RelationshipTracker;
use super::{ImportedPedigree, finish};
use pedigree_graph::{
    BaseGraph, Error, Gender, LifeStatus, PersonProperties, Result, VertexData, VertexId,
};
use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};
use serde_json::{Map, Value};

/// Input key (lowercased) to stored property name.
const PROPERTY_NAMES: &[(&str, &str)] = &[
    ("lastname", "lName"),
    ("lastnameatbirth", "lNameAtB"),
    ("comments", "comments"),
    ("twingroup", "twinGroup"),
    ("monozygotic", "monozygotic"),
    ("adoptedstatus", "adoptedStatus"),
    ("evaluated", "evaluated"),
    ("birthdate", "dob"),
    ("deathdate", "dod"),
    ("gestationage", "gestationAge"),
    ("lifestatus", "lifeStatus"),
    ("disorders", "disorders"),
    ("hpoterms", "hpoTerms"),
    ("candidategenes", "candidateGenes"),
    ("ethnicities", "ethnicities"),
    ("carrierstatus", "carrierStatus"),
    ("externalid", "externalID"),
    ("numpersons", "numPersons"),
    ("lostcontact", "lostContact"),
    ("nodenumber", "nodeNumber"),
    ("cancers", "cancers"),
];

/// Lookup tables for `mother`/`father` references.
#[derive(Default)]
struct References {
    by_id: HashMap<String, VertexId>,
    by_name: HashMap<String, VertexId>,
    ambiguous: HashSet<String>,
}

impl References {
    fn add_id(&mut self, id: String, v: VertexId) -> Result<bool> {
        if self.by_id.contains_key(&id) {
            return Err(Error::import(format!("multiple persons with the same ID [{id}]")));
        }
        if self.by_name.get(&id).is_some_and(|&u| u != v) {
            self.by_name.remove(&id);
            self.ambiguous.insert(id);
            return Ok(false);
        }
        self.by_id.insert(id, v);
        Ok(true)
    }

    fn add_name(&mut self, name: String, v: VertexId) {
        if self.by_name.get(&name).is_some_and(|&u| u != v) {
            self.by_name.remove(&name);
            self.ambiguous.insert(name);
        } else if self.by_id.get(&name).is_some_and(|&u| u != v) {
            self.by_id.remove(&name);
            self.ambiguous.insert(name);
        } else {
            self.by_name.insert(name, v);
        }
    }

    fn resolve(&self, reference: &str, role: &str) -> Result<VertexId> {
        if self.ambiguous.contains(reference) {
            return Err(Error::import(format!("ambiguous reference to [{reference}]")));
        }
        self.by_id
            .get(reference)
            .or_else(|| self.by_name.get(reference))
            .copied()
            .ok_or_else(|| {
                Error::import(format!(
                    "[{reference}] is not a valid {role} reference (does not correspond to a name or an ID of another person)"
                ))
            })
    }
}

/// Ids and names may be given as numbers.
fn reference_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn gender_of(value: &Value) -> Gender {
    match value.as_str().map(str::to_lowercase).as_deref() {
        Some("female" | "f") => Gender::Female,
        Some("male" | "m") => Gender::Male,
        _ => Gender::Unknown,
    }
}

/// OMIM ids may be given as numbers; they are stored as strings.
fn disorder_list(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|d| Value::String(reference_key(d)))
                .collect(),
        ),
        other => other.clone(),
    }
}

struct Person {
    properties: PersonProperties,
    mother: Option<String>,
    father: Option<String>,
}

fn read_person(
    index: usize,
    object: &Map<String, Value>,
    references: &mut References,
    proband: &mut Option<VertexId>,
) -> Result<Person> {
    let mut props = Map::new();
    props.insert("gender".into(), Value::from("U"));
    let (mut mother, mut father) = (None, None);
    let mut has_id = false;
    let mut external_id = None;

    for (key, value) in object {
        match key.to_lowercase().as_str() {
            "mother" => mother = Some(reference_key(value)),
            "father" => father = Some(reference_key(value)),
            "proband" => {
                if proband.is_none() && value.as_bool() != Some(false) {
                    *proband = Some(index);
                }
            }
            "sex" => {
                let gender = serde_json::to_value(gender_of(value))?;
                props.insert("gender".into(), gender);
            }
            "id" => has_id |= references.add_id(reference_key(value), index)?,
            "name" | "firstname" => {
                let name = reference_key(value);
                props.insert("fName".into(), Value::String(name.clone()));
                references.add_name(name, index);
            }
            lower => {
                if lower == "externalid" {
                    external_id = Some(reference_key(value));
                }
                if let Some(&(_, stored)) = PROPERTY_NAMES.iter().find(|(k, _)| *k == lower) {
                    let value = if stored == "disorders" {
                        disorder_list(value)
                    } else if stored == "externalID" {
                        Value::String(reference_key(value))
                    } else {
                        value.clone()
                    };
                    props.insert(stored.into(), value);
                }
            }
        }
    }
    if let (Some(external), false) = (external_id, has_id) {
        references.add_id(external, index)?;
    }

    let mut properties: PersonProperties = serde_json::from_value(Value::Object(props))
        .map_err(|err| Error::import(format!("invalid properties for person #{index}: {err}")))?;
    // a disorder implies the person is affected; a death date implies deceased
    if !properties.disorders.is_empty()
        && properties.carrier_status.as_deref().is_none_or(str::is_empty)
    {
        properties.carrier_status = Some("affected".to_string());
    }
    if properties.death_date.is_some()
        && properties
            .life_status
            .is_none_or(|s| s == LifeStatus::Alive)
    {
        properties.life_status = Some(LifeStatus::Deceased);
    }
    Ok(Person {
        properties,
        mother,
        father,
    })
}

/// Imports a pedigree from the simple JSON format. The first person flagged `proband` (or
/// the first person) is the proband; persons keep the ids of their position in the array.
pub fn from_simple_json(input: &str) -> Result<ImportedPedigree> {
    let parsed: Value = serde_json::from_str(input)
        .map_err(|err| Error::import(format!("input is not a valid JSON string: {err}")))?;
    let Value::Array(items) = parsed else {
        return Err(Error::import("JSON does not represent an array of objects"));
    };
    if items.is_empty() {
        return Err(Error::import("input is empty"));
    }

    let mut references = References::default();
    let mut proband = None;
    let mut persons = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let Value::Object(object) = item else {
            return Err(Error::import("JSON does not represent an array of objects"));
        };
        let identified = object.keys().any(|k| {
            matches!(
                k.to_lowercase().as_str(),
                "id" | "name" | "firstname" | "externalid"
            )
        });
        if !identified {
            return Err(Error::import("a node with no ID or name is found"));
        }
        persons.push(read_person(index, object, &mut references, &mut proband)?);
    }

    let mut gg = BaseGraph::new();
    for person in &persons {
        gg.add_vertex(VertexData::Person(person.properties.clone()), None)?;
    }

    let mut tracker = RelationshipTracker::default();
    for (child, person) in persons.iter().enumerate() {
        if person.mother.is_none() && person.father.is_none() {
            continue;
        }
        let father = parent(&mut gg, &references, person.father.as_deref(), Gender::Male)?;
        let mother = parent(&mut gg, &references, person.mother.as_deref(), Gender::Female)?;
        if father == child || mother == child {
            return Err(Error::import("a person is declared to be their own parent"));
        }
        let hub = tracker.create_or_get_childhub(&mut gg, mother, father)?;
        gg.add_edge(hub, child, 1)?;
    }

    finish(gg, proband.unwrap_or(0))
}

fn parent(
    gg: &mut BaseGraph,
    references: &References,
    reference: Option<&str>,
    role: Gender,
) -> Result<VertexId> {
    let role_name = if role == Gender::Male { "father" } else { "mother" };
    let Some(reference) = reference else {
        let properties = PersonProperties {
            gender: role,
            comments: Some("unknown".to_string()),
            ..Default::default()
        };
        return gg.add_vertex(VertexData::Person(properties), None);
    };
    let id = references.resolve(reference, role_name)?;
    if gg.gender(id)? == role.opposite() {
        return Err(Error::import(format!(
            "a person of the other sex is declared as being a {role_name} ({reference})"
        )));
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_disorders_become_strings() {
        let list = disorder_list(&serde_json::json!([603235, "custom"]));
        assert_eq!(list, serde_json::json!(["603235", "custom"]));
    }

    #[test]
    fn name_shared_by_two_persons_is_ambiguous() {
        let mut refs = References::default();
        refs.add_name("ann".into(), 0);
        refs.add_name("ann".into(), 1);
        assert!(refs.resolve("ann", "mother").is_err());
    }
}
