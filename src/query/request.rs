//! Query inputs and the compiled read
//!
//! `FindQuery`/`FindAllQuery`/`FindOneQuery` mirror what the routing layer
//! hands over after parsing the query string. `ReadQuery` is what storage
//! executes.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::filter::FilterSet;
use super::pagination::PageRequest;
use super::predicate::WhereClause;
use super::sort::{SortCompiler, SortKey, SortSet};

/// Relation names to attach to each returned row.
///
/// Passed to storage untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IncludeSet(Vec<String>);

impl IncludeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }
}

impl<S: Into<String>> FromIterator<S> for IncludeSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Paginated listing input
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FindQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<FilterSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sorts: Option<SortSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub includes: Option<IncludeSet>,
}

/// Unpaginated listing input
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FindAllQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<FilterSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sorts: Option<SortSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub includes: Option<IncludeSet>,
}

/// Single-row input
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FindOneQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub includes: Option<IncludeSet>,
}

impl From<FindQuery> for FindAllQuery {
    fn from(query: FindQuery) -> Self {
        Self {
            filters: query.filters,
            sorts: query.sorts,
            includes: query.includes,
        }
    }
}

/// Row window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: u64,
    pub limit: u64,
}

/// A compiled read: filter, order, optional window, includes
#[derive(Debug, Clone, PartialEq)]
pub struct ReadQuery {
    pub filter: WhereClause,
    pub order: Vec<SortKey>,
    pub window: Option<Window>,
    pub includes: IncludeSet,
}

impl ReadQuery {
    /// Unwindowed read in default order
    pub fn new(filter: WhereClause) -> Self {
        Self {
            filter,
            order: SortCompiler::compile(None),
            window: None,
            includes: IncludeSet::new(),
        }
    }

    pub fn order_by(mut self, order: Vec<SortKey>) -> Self {
        self.order = order;
        self
    }

    pub fn paged(mut self, page: &PageRequest) -> Self {
        self.window = Some(Window {
            offset: page.offset(),
            limit: page.limit(),
        });
        self
    }

    pub fn include(mut self, includes: IncludeSet) -> Self {
        self.includes = includes;
        self
    }
}

impl fmt::Display for ReadQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WHERE {}", self.filter)?;
        if !self.order.is_empty() {
            write!(f, " ORDER BY ")?;
            for (i, key) in self.order.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{} {}", key.field, key.direction.as_sql())?;
            }
        }
        if let Some(window) = self.window {
            write!(f, " LIMIT {} OFFSET {}", window.limit, window.offset)?;
        }
        Ok(())
    }
}
