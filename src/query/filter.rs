//! Filter sets and the filter compiler
//!
//! Wire shape: `filters[<field>][<operator>] = <value>`. Fields combine with
//! AND. Within one field only the last operator supplied takes effect; the
//! earlier ones are still checked against the registry but otherwise ignored.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::{QueryError, QueryResult};
use super::operator::Operator;
use super::predicate::{FieldPredicate, WhereClause};

/// Operator token to operand, in the order the caller supplied them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldFilter(Map<String, Value>);

impl FieldFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an operator
    pub fn with(mut self, token: impl Into<String>, value: Value) -> Self {
        self.0.insert(token.into(), value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// All supplied operators, in supply order
    pub fn operators(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The last supplied operator, which is the one that applies
    pub fn effective(&self) -> Option<(&str, &Value)> {
        self.0.iter().next_back().map(|(k, v)| (k.as_str(), v))
    }
}

/// Field name to [`FieldFilter`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct FilterSet {
    entries: Vec<(String, FieldFilter)>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the filter for `field`
    pub fn with(mut self, field: impl Into<String>, filter: FieldFilter) -> Self {
        let field = field.into();
        match self.entries.iter_mut().find(|(f, _)| *f == field) {
            Some(entry) => entry.1 = filter,
            None => self.entries.push((field, filter)),
        }
        self
    }

    /// Shorthand for a single-operator field filter
    pub fn where_op(self, field: impl Into<String>, op: Operator, value: Value) -> Self {
        self.with(field, FieldFilter::new().with(op.token(), value))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, field: &str) -> Option<&FieldFilter> {
        self.entries.iter().find(|(f, _)| f == field).map(|(_, ff)| ff)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldFilter)> {
        self.entries.iter().map(|(f, ff)| (f.as_str(), ff))
    }
}

impl TryFrom<Map<String, Value>> for FilterSet {
    type Error = QueryError;

    fn try_from(map: Map<String, Value>) -> QueryResult<Self> {
        let mut entries = Vec::with_capacity(map.len());
        for (field, value) in map {
            match value {
                Value::Object(ops) => entries.push((field, FieldFilter(ops))),
                _ => return Err(QueryError::InvalidFieldFilter { field }),
            }
        }
        Ok(Self { entries })
    }
}

impl From<FilterSet> for Map<String, Value> {
    fn from(set: FilterSet) -> Self {
        set.entries
            .into_iter()
            .map(|(field, ff)| (field, Value::Object(ff.0)))
            .collect()
    }
}

/// Compiles a [`FilterSet`] into a [`WhereClause`]
#[derive(Debug, Clone, Default)]
pub struct FilterCompiler {
    /// `None` accepts every field
    filterable: Option<HashSet<String>>,
}

impl FilterCompiler {
    /// Compiler restricted to an entity's filterable fields
    pub fn new<I, S>(filterable: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            filterable: Some(filterable.into_iter().map(Into::into).collect()),
        }
    }

    /// Compiler that accepts any field name
    pub fn any_field() -> Self {
        Self { filterable: None }
    }

    /// Builds the conjunction of each field's effective predicate.
    ///
    /// # Errors
    ///
    /// - `InvalidOperator` if any supplied token is outside the registry
    /// - `FieldNotFilterable` if a field is outside the filterable list
    /// - `InvalidOperand` if the effective operand has the wrong shape
    pub fn compile(&self, filters: &FilterSet) -> QueryResult<WhereClause> {
        let mut clause = WhereClause::new();

        for (field, filter) in filters.iter() {
            if let Some(allowed) = &self.filterable {
                if !allowed.contains(field) {
                    return Err(QueryError::FieldNotFilterable {
                        field: field.to_string(),
                    });
                }
            }

            let mut effective = None;
            for (token, value) in filter.operators() {
                let op = Operator::from_token(token).ok_or_else(|| QueryError::InvalidOperator {
                    field: field.to_string(),
                    token: token.to_string(),
                })?;
                effective = Some((op, value));
            }

            let Some((op, value)) = effective else {
                continue;
            };
            if let Some(condition) = op.condition(field, value)? {
                clause = clause.and(FieldPredicate::new(field, condition));
            }
        }

        Ok(clause)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::predicate::Condition;
    use serde_json::json;

    fn parse(value: Value) -> FilterSet {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_last_operator_wins() {
        let filters = parse(json!({"id": {"$gte": 17, "$lte": 4}}));
        let clause = FilterCompiler::any_field().compile(&filters).unwrap();
        assert_eq!(clause.len(), 1);
        assert_eq!(
            clause.predicates[0].condition,
            Condition::LessThanOrEqual(json!(4))
        );

        let alone = parse(json!({"id": {"$lte": 4}}));
        assert_eq!(FilterCompiler::any_field().compile(&alone).unwrap(), clause);
    }

    #[test]
    fn test_unknown_operator_names_field() {
        let filters = parse(json!({"title": {"$foo": "x", "$eq": "y"}}));
        let err = FilterCompiler::any_field().compile(&filters).unwrap_err();
        assert_eq!(
            err,
            QueryError::InvalidOperator {
                field: "title".into(),
                token: "$foo".into()
            }
        );
    }

    #[test]
    fn test_empty_operand_leaves_field_unfiltered() {
        let filters = parse(json!({"title": {"$like": ""}, "id": {"$eq": 3}}));
        let clause = FilterCompiler::any_field().compile(&filters).unwrap();
        assert_eq!(clause.fields().collect::<Vec<_>>(), vec!["id"]);
    }

    #[test]
    fn test_empty_field_filter_imposes_nothing() {
        let filters = parse(json!({"title": {}}));
        assert!(FilterCompiler::any_field().compile(&filters).unwrap().is_empty());
    }

    #[test]
    fn test_filterable_list_is_enforced() {
        let compiler = FilterCompiler::new(["id", "title"]);
        let filters = FilterSet::new().where_op("password", Operator::Eq, json!("x"));
        assert!(matches!(
            compiler.compile(&filters),
            Err(QueryError::FieldNotFilterable { .. })
        ));
    }

    #[test]
    fn test_non_object_field_filter_rejected() {
        let result: Result<FilterSet, _> = serde_json::from_value(json!({"id": 3}));
        assert!(result.is_err());
    }

    #[test]
    fn test_fields_combine_with_and() {
        let filters = FilterSet::new()
            .where_op("status", Operator::Eq, json!("published"))
            .where_op("id", Operator::Between, json!([8, 13]));
        let clause = FilterCompiler::any_field().compile(&filters).unwrap();
        assert_eq!(
            clause.to_string(),
            "status = 'published' AND id BETWEEN 8 AND 13"
        );
    }
}
