//! Input tables: three directed edge lists and the lawyer attribute
//! roster.
//!
//! The survey files encode attributes as small integer codes; decoding
//! follows the documented mapping (status 1=partner 2=associate, gender
//! 1=man 2=woman, office 1=Boston 2=Hartford 3=Providence, practice
//! 1=litigation 2=corporate). Edge rows referencing an id absent from the
//! attribute table abort the run with the offending file and row.

use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors raised while reading and validating the input tables
#[derive(Error, Debug)]
pub enum DataError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} row {row}: {source}")]
    Malformed {
        path: PathBuf,
        row: usize,
        #[source]
        source: csv::Error,
    },

    #[error("{relation} edge list row {row}: node {id} missing from the attribute table")]
    UnknownNode {
        relation: Relation,
        row: usize,
        id: u32,
    },

    #[error("{relation} edge list row {row}: self-loop on node {id}")]
    SelfLoop {
        relation: Relation,
        row: usize,
        id: u32,
    },

    #[error("attribute table row {row}: duplicate lawyer id {id}")]
    DuplicateId { row: usize, id: u32 },

    #[error("attribute table row {row}: {column} code {code} has no defined label")]
    UnknownCode {
        row: usize,
        column: &'static str,
        code: u8,
    },
}

pub type DataResult<T> = Result<T, DataError>;

/// The three tie types collected by the survey
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Relation {
    Advice,
    Cowork,
    Friendship,
}

impl Relation {
    pub const ALL: [Relation; 3] = [Relation::Advice, Relation::Cowork, Relation::Friendship];

    pub fn name(&self) -> &'static str {
        match self {
            Relation::Advice => "advice",
            Relation::Cowork => "cowork",
            Relation::Friendship => "friendship",
        }
    }

    fn file_name(&self) -> &'static str {
        match self {
            Relation::Advice => "advice.csv",
            Relation::Cowork => "cowork.csv",
            Relation::Friendship => "friendship.csv",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Status {
    Partner,
    Associate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Gender {
    Man,
    Woman,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Office {
    Boston,
    Hartford,
    Providence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Practice {
    Litigation,
    Corporate,
}

/// One row of the attribute table, decoded
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lawyer {
    pub id: u32,
    pub status: Status,
    pub gender: Gender,
    pub office: Office,
    pub age: u32,
    pub practice: Practice,
    pub seniority: u32,
}

/// Categorical attributes analysed for homophily
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoricalAttr {
    Status,
    Gender,
    Office,
    Practice,
}

impl CategoricalAttr {
    pub const ALL: [CategoricalAttr; 4] = [
        CategoricalAttr::Status,
        CategoricalAttr::Gender,
        CategoricalAttr::Office,
        CategoricalAttr::Practice,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CategoricalAttr::Status => "status",
            CategoricalAttr::Gender => "gender",
            CategoricalAttr::Office => "office",
            CategoricalAttr::Practice => "practice",
        }
    }

    pub fn level_names(&self) -> &'static [&'static str] {
        match self {
            CategoricalAttr::Status => &["partner", "associate"],
            CategoricalAttr::Gender => &["man", "woman"],
            CategoricalAttr::Office => &["Boston", "Hartford", "Providence"],
            CategoricalAttr::Practice => &["litigation", "corporate"],
        }
    }

    /// Dense category code of one lawyer, indexing `level_names`
    pub fn code_of(&self, lawyer: &Lawyer) -> usize {
        match self {
            CategoricalAttr::Status => lawyer.status as usize,
            CategoricalAttr::Gender => lawyer.gender as usize,
            CategoricalAttr::Office => lawyer.office as usize,
            CategoricalAttr::Practice => lawyer.practice as usize,
        }
    }
}

/// Numeric attributes analysed for assortative mixing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericAttr {
    Age,
    Seniority,
}

impl NumericAttr {
    pub const ALL: [NumericAttr; 2] = [NumericAttr::Age, NumericAttr::Seniority];

    pub fn name(&self) -> &'static str {
        match self {
            NumericAttr::Age => "age",
            NumericAttr::Seniority => "seniority",
        }
    }

    pub fn value_of(&self, lawyer: &Lawyer) -> f64 {
        match self {
            NumericAttr::Age => lawyer.age as f64,
            NumericAttr::Seniority => lawyer.seniority as f64,
        }
    }
}

/// The attribute table. Vertex ordering everywhere in the pipeline is
/// this table's row order.
#[derive(Debug, Clone)]
pub struct Roster {
    lawyers: Vec<Lawyer>,
    index: FxHashMap<u32, usize>,
}

impl Roster {
    pub fn new(lawyers: Vec<Lawyer>) -> DataResult<Self> {
        let mut index = FxHashMap::default();
        for (i, lawyer) in lawyers.iter().enumerate() {
            if index.insert(lawyer.id, i).is_some() {
                return Err(DataError::DuplicateId {
                    row: i + 2,
                    id: lawyer.id,
                });
            }
        }
        Ok(Roster { lawyers, index })
    }

    pub fn len(&self) -> usize {
        self.lawyers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lawyers.is_empty()
    }

    pub fn get(&self, idx: usize) -> &Lawyer {
        &self.lawyers[idx]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Lawyer> {
        self.lawyers.iter()
    }

    /// Dense index of a lawyer id, if present
    pub fn index_of(&self, id: u32) -> Option<usize> {
        self.index.get(&id).copied()
    }

    pub fn category_codes(&self, attr: CategoricalAttr) -> Vec<usize> {
        self.lawyers.iter().map(|l| attr.code_of(l)).collect()
    }

    pub fn numeric_values(&self, attr: NumericAttr) -> Vec<f64> {
        self.lawyers.iter().map(|l| attr.value_of(l)).collect()
    }
}

/// One validated edge list, endpoints resolved to dense roster indices
#[derive(Debug, Clone)]
pub struct LayerEdges {
    pub relation: Relation,
    pub edges: Vec<(usize, usize)>,
}

/// The full input: roster plus the three tie layers
#[derive(Debug, Clone)]
pub struct Dataset {
    pub roster: Roster,
    pub layers: Vec<LayerEdges>,
}

#[derive(Debug, Deserialize)]
struct EdgeRow {
    from: u32,
    to: u32,
}

#[derive(Debug, Deserialize)]
struct AttributeRow {
    id: u32,
    status: u8,
    gender: u8,
    office: u8,
    age: u32,
    practice: u8,
    seniority: u32,
}

fn decode<T>(
    row: usize,
    column: &'static str,
    code: u8,
    table: &[(u8, T)],
) -> DataResult<T>
where
    T: Copy,
{
    table
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, v)| *v)
        .ok_or(DataError::UnknownCode { row, column, code })
}

fn open_csv(path: &Path) -> DataResult<csv::Reader<File>> {
    let file = File::open(path).map_err(|source| DataError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(csv::Reader::from_reader(file))
}

/// Read and decode the attribute table
pub fn load_roster(path: &Path) -> DataResult<Roster> {
    let mut reader = open_csv(path)?;
    let mut lawyers = Vec::new();
    for (i, record) in reader.deserialize().enumerate() {
        let row = i + 2; // header is row 1
        let raw: AttributeRow = record.map_err(|source| DataError::Malformed {
            path: path.to_path_buf(),
            row,
            source,
        })?;
        lawyers.push(Lawyer {
            id: raw.id,
            status: decode(
                row,
                "status",
                raw.status,
                &[(1, Status::Partner), (2, Status::Associate)],
            )?,
            gender: decode(row, "gender", raw.gender, &[(1, Gender::Man), (2, Gender::Woman)])?,
            office: decode(
                row,
                "office",
                raw.office,
                &[(1, Office::Boston), (2, Office::Hartford), (3, Office::Providence)],
            )?,
            age: raw.age,
            practice: decode(
                row,
                "practice",
                raw.practice,
                &[(1, Practice::Litigation), (2, Practice::Corporate)],
            )?,
            seniority: raw.seniority,
        });
    }
    debug!(lawyers = lawyers.len(), path = %path.display(), "attribute table loaded");
    Roster::new(lawyers)
}

/// Read one edge list, validating endpoints against the roster.
/// Duplicate rows collapse to a single tie; any positive count is a tie.
pub fn load_edges(dir: &Path, relation: Relation, roster: &Roster) -> DataResult<LayerEdges> {
    let path = dir.join(relation.file_name());
    let mut reader = open_csv(&path)?;
    let mut edges = Vec::new();
    for (i, record) in reader.deserialize().enumerate() {
        let row = i + 2;
        let raw: EdgeRow = record.map_err(|source| DataError::Malformed {
            path: path.clone(),
            row,
            source,
        })?;
        if raw.from == raw.to {
            return Err(DataError::SelfLoop {
                relation,
                row,
                id: raw.from,
            });
        }
        let from = roster.index_of(raw.from).ok_or(DataError::UnknownNode {
            relation,
            row,
            id: raw.from,
        })?;
        let to = roster.index_of(raw.to).ok_or(DataError::UnknownNode {
            relation,
            row,
            id: raw.to,
        })?;
        edges.push((from, to));
    }
    edges.sort_unstable();
    edges.dedup();
    debug!(relation = %relation, ties = edges.len(), "edge list loaded");
    Ok(LayerEdges { relation, edges })
}

/// Load the roster and all three layers from `dir`
pub fn load_dataset(dir: &Path) -> DataResult<Dataset> {
    let roster = load_roster(&dir.join("attributes.csv"))?;
    let layers = Relation::ALL
        .iter()
        .map(|&relation| load_edges(dir, relation, &roster))
        .collect::<DataResult<Vec<_>>>()?;
    Ok(Dataset { roster, layers })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lawyer(id: u32) -> Lawyer {
        Lawyer {
            id,
            status: Status::Partner,
            gender: Gender::Man,
            office: Office::Boston,
            age: 40,
            practice: Practice::Litigation,
            seniority: 10,
        }
    }

    #[test]
    fn roster_rejects_duplicate_ids() {
        let err = Roster::new(vec![lawyer(1), lawyer(1)]).unwrap_err();
        assert!(matches!(err, DataError::DuplicateId { id: 1, .. }));
    }

    #[test]
    fn roster_preserves_row_order() {
        let roster = Roster::new(vec![lawyer(5), lawyer(2), lawyer(9)]).unwrap();
        assert_eq!(roster.index_of(5), Some(0));
        assert_eq!(roster.index_of(2), Some(1));
        assert_eq!(roster.index_of(9), Some(2));
        assert_eq!(roster.index_of(7), None);
    }

    #[test]
    fn category_codes_follow_level_names() {
        let mut l = lawyer(1);
        l.status = Status::Associate;
        l.office = Office::Providence;
        let roster = Roster::new(vec![l]).unwrap();
        assert_eq!(roster.category_codes(CategoricalAttr::Status), vec![1]);
        assert_eq!(roster.category_codes(CategoricalAttr::Office), vec![2]);
        assert_eq!(
            CategoricalAttr::Office.level_names()[2],
            "Providence"
        );
    }
}
