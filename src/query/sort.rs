//! Sort sets, the sort compiler and row ordering
//!
//! Wire shape: `sorts[<field>] = asc|desc`, applied in the order the caller
//! supplied them. No sorts means `id ASC` so that paging is repeatable.

use std::borrow::Borrow;
use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::{QueryError, QueryResult};
use super::predicate::compare_values;

/// Column used when the caller gives no sort
pub const DEFAULT_SORT_FIELD: &str = "id";

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Parses `asc`/`desc` in any letter case
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    /// Storage casing
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// One ordering key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Field name to direction, in supply order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct SortSet {
    entries: Vec<(String, SortDirection)>,
}

impl SortSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a key, or updates the direction of an existing one in place
    pub fn with(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        let field = field.into();
        match self.entries.iter_mut().find(|(f, _)| *f == field) {
            Some(entry) => entry.1 = direction,
            None => self.entries.push((field, direction)),
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, SortDirection)> {
        self.entries.iter().map(|(f, d)| (f.as_str(), *d))
    }
}

impl TryFrom<Map<String, Value>> for SortSet {
    type Error = QueryError;

    fn try_from(map: Map<String, Value>) -> QueryResult<Self> {
        let mut entries = Vec::with_capacity(map.len());
        for (field, value) in map {
            let direction = value.as_str().and_then(SortDirection::parse);
            match direction {
                Some(direction) => entries.push((field, direction)),
                None => {
                    return Err(QueryError::InvalidSort {
                        field,
                        direction: value.to_string(),
                    })
                }
            }
        }
        Ok(Self { entries })
    }
}

impl From<SortSet> for Map<String, Value> {
    fn from(set: SortSet) -> Self {
        set.entries
            .into_iter()
            .map(|(field, d)| (field, Value::String(d.as_str().to_string())))
            .collect()
    }
}

/// Turns a [`SortSet`] into ordered keys
pub struct SortCompiler;

impl SortCompiler {
    /// Field names are not checked here; storage rejects unknown columns.
    pub fn compile(sorts: Option<&SortSet>) -> Vec<SortKey> {
        match sorts {
            Some(set) if !set.is_empty() => set
                .iter()
                .map(|(field, direction)| SortKey {
                    field: field.to_string(),
                    direction,
                })
                .collect(),
            _ => vec![SortKey::asc(DEFAULT_SORT_FIELD)],
        }
    }
}

/// Orders rows by a list of keys
pub struct RowSorter;

impl RowSorter {
    /// Stable multi-key sort
    pub fn sort<R: Borrow<Map<String, Value>>>(rows: &mut [R], keys: &[SortKey]) {
        rows.sort_by(|a, b| {
            let (a, b): (&Map<String, Value>, &Map<String, Value>) = (a.borrow(), b.borrow());
            for key in keys {
                let ordering = Self::compare_column(a.get(&key.field), b.get(&key.field));
                let ordering = match key.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });
    }

    /// Total order over column values: missing/null first, then by type,
    /// then by value within a type.
    fn compare_column(a: Option<&Value>, b: Option<&Value>) -> Ordering {
        let rank = |v: Option<&Value>| -> u8 {
            match v {
                None | Some(Value::Null) => 0,
                Some(Value::Bool(_)) => 1,
                Some(Value::Number(_)) => 2,
                Some(Value::String(_)) => 3,
                Some(Value::Array(_)) => 4,
                Some(Value::Object(_)) => 5,
            }
        };

        let (ra, rb) = (rank(a), rank(b));
        if ra != rb {
            return ra.cmp(&rb);
        }
        match (a, b) {
            (Some(a), Some(b)) => compare_values(a, b).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        }
    }
}
