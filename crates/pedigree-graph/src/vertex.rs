//! Vertex payloads.
//!
//! Every vertex carries exactly one [`VertexData`] variant; the variant decides which fields
//! exist. Field names on the wire follow the pedigree document format (`fName`, `lNameAtB`,
//! `dob`, ...), anything not modelled explicitly is kept in `extra` and written back unchanged.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexKind {
    Person,
    Relationship,
    ChildHub,
    VirtualEdge,
}

#[derive(Debug, Clone, PartialEq)]
pub enum VertexData {
    Person(PersonProperties),
    Relationship(RelationshipProperties),
    ChildHub,
    VirtualEdge(VirtualEdgeSegment),
}

impl VertexData {
    pub fn kind(&self) -> VertexKind {
        match self {
            VertexData::Person(_) => VertexKind::Person,
            VertexData::Relationship(_) => VertexKind::Relationship,
            VertexData::ChildHub => VertexKind::ChildHub,
            VertexData::VirtualEdge(_) => VertexKind::VirtualEdge,
        }
    }

    pub fn person(&self) -> Option<&PersonProperties> {
        match self {
            VertexData::Person(p) => Some(p),
            _ => None,
        }
    }

    pub fn relationship(&self) -> Option<&RelationshipProperties> {
        match self {
            VertexData::Relationship(r) => Some(r),
            _ => None,
        }
    }

    /// Human readable name used in diagnostics.
    pub fn display_name(&self) -> String {
        match self {
            VertexData::Person(p) => {
                let first = p.first_name.as_deref().unwrap_or("");
                let last = p.last_name.as_deref().unwrap_or("");
                if !first.is_empty() && !last.is_empty() {
                    format!("{first} {last}")
                } else {
                    format!("{first}{last}")
                }
            }
            VertexData::VirtualEdge(s) => s.name.clone(),
            VertexData::Relationship(_) | VertexData::ChildHub => String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
    #[default]
    #[serde(rename = "U", alias = "u")]
    Unknown,
    #[serde(rename = "O")]
    Other,
}

impl Gender {
    /// Gender a new partner gets by default.
    pub fn opposite(self) -> Gender {
        match self {
            Gender::Male => Gender::Female,
            Gender::Female => Gender::Male,
            Gender::Unknown | Gender::Other => Gender::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifeStatus {
    Alive,
    Deceased,
    Stillborn,
    Unborn,
    Aborted,
    Miscarriage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdoptedStatus {
    #[serde(rename = "adoptedIn")]
    AdoptedIn,
    #[serde(rename = "adoptedOut")]
    AdoptedOut,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Consanguinity {
    /// Derived from the ancestor map.
    #[default]
    #[serde(rename = "A")]
    Auto,
    #[serde(rename = "Y")]
    Yes,
    #[serde(rename = "N")]
    No,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChildlessStatus {
    Childless,
    Infertile,
}

/// A date as stored in a pedigree document: either an ISO-like string or an object with
/// `year`/`month`/`day` fields. Only complete dates take part in sibling ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PedigreeDate(pub Value);

impl PedigreeDate {
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Self {
        PedigreeDate(Value::String(format!("{year:04}-{month:02}-{day:02}")))
    }

    pub fn complete_date(&self) -> Option<NaiveDate> {
        match &self.0 {
            Value::String(s) => {
                let s = s.trim();
                let head = s.get(..10).unwrap_or(s);
                NaiveDate::parse_from_str(head, "%Y-%m-%d")
                    .or_else(|_| NaiveDate::parse_from_str(s, "%m/%d/%Y"))
                    .ok()
            }
            Value::Object(map) => {
                let field = |k: &str| map.get(k).and_then(number_like);
                let year = field("year")?;
                let month = field("month")?;
                let day = field("day")?;
                NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month as u32, day as u32)
            }
            _ => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.complete_date().is_some()
    }

    pub fn year(&self) -> Option<i32> {
        self.complete_date().map(|d| d.year())
    }
}

fn number_like(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonProperties {
    #[serde(default)]
    pub gender: Gender,
    #[serde(rename = "fName", default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(rename = "lName", default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(rename = "lNameAtB", default, skip_serializing_if = "Option::is_none")]
    pub last_name_at_birth: Option<String>,
    #[serde(rename = "lifeStatus", default, skip_serializing_if = "Option::is_none")]
    pub life_status: Option<LifeStatus>,
    #[serde(rename = "dob", default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<PedigreeDate>,
    #[serde(rename = "dod", default, skip_serializing_if = "Option::is_none")]
    pub death_date: Option<PedigreeDate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub disorders: Vec<String>,
    #[serde(rename = "carrierStatus", default, skip_serializing_if = "Option::is_none")]
    pub carrier_status: Option<String>,
    #[serde(rename = "twinGroup", default, skip_serializing_if = "Option::is_none")]
    pub twin_group: Option<u32>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub monozygotic: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub placeholder: bool,
    #[serde(rename = "adoptedStatus", default, skip_serializing_if = "Option::is_none")]
    pub adopted_status: Option<AdoptedStatus>,
    #[serde(rename = "externalID", default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub evaluated: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PersonProperties {
    pub fn with_gender(gender: Gender) -> Self {
        Self {
            gender,
            ..Default::default()
        }
    }

    pub fn placeholder() -> Self {
        Self {
            placeholder: true,
            ..Default::default()
        }
    }

    /// Number of lines the comment block takes when rendered below the node.
    pub fn comment_lines(&self) -> usize {
        self.comments
            .as_deref()
            .map(|c| c.lines().filter(|l| !l.trim().is_empty()).count())
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationshipProperties {
    #[serde(rename = "consangr", default)]
    pub consanguinity: Consanguinity,
    #[serde(rename = "childlessStatus", default, skip_serializing_if = "Option::is_none")]
    pub childless_status: Option<ChildlessStatus>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub broken: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RelationshipProperties {
    pub fn childless() -> Self {
        Self {
            childless_status: Some(ChildlessStatus::Childless),
            ..Default::default()
        }
    }
}

/// One piece of a long edge. The name records which edge it belongs to (`_src->tgt_k`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualEdgeSegment {
    #[serde(rename = "fName")]
    pub name: String,
}

impl VirtualEdgeSegment {
    pub fn new(source: usize, target: usize, piece: usize) -> Self {
        Self {
            name: format!("_{source}->{target}_{piece}"),
        }
    }
}
