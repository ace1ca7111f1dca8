//! Boundary checks for listing queries
//!
//! [`QueryPolicy`] rejects queries an entity does not allow before they reach
//! the compiler: unknown filter or sort fields, operators that do not fit a
//! field's kind, malformed operands, non-positive page values and relation
//! names outside the entity's include list. Every failure is collected.

use serde_json::Value;

use super::entity::EntityDef;
use super::types::FieldKind;
use crate::query::{
    is_empty_operand, Arity, FilterSet, FindAllQuery, FindOneQuery, FindQuery, IncludeSet,
    Operator, SortSet,
};
use crate::validation::ValidationErrors;

/// Longest string operand accepted on a string field
const MAX_STRING_OPERAND: usize = 100;

/// Per-entity whitelist for listing queries
pub struct QueryPolicy<'a> {
    def: &'a EntityDef,
}

impl<'a> QueryPolicy<'a> {
    pub fn new(def: &'a EntityDef) -> Self {
        Self { def }
    }

    pub fn check_find(&self, query: &FindQuery) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(filters) = &query.filters {
            self.check_filters(filters, &mut errors);
        }
        check_positive("page", query.page, &mut errors);
        check_positive("pageSize", query.page_size, &mut errors);
        if let Some(sorts) = &query.sorts {
            self.check_sorts(sorts, &mut errors);
        }
        if let Some(includes) = &query.includes {
            self.check_includes(includes, &mut errors);
        }
        errors.into_result()
    }

    pub fn check_find_all(&self, query: &FindAllQuery) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(filters) = &query.filters {
            self.check_filters(filters, &mut errors);
        }
        if let Some(sorts) = &query.sorts {
            self.check_sorts(sorts, &mut errors);
        }
        if let Some(includes) = &query.includes {
            self.check_includes(includes, &mut errors);
        }
        errors.into_result()
    }

    pub fn check_find_one(&self, query: &FindOneQuery) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(includes) = &query.includes {
            self.check_includes(includes, &mut errors);
        }
        errors.into_result()
    }

    fn check_filters(&self, filters: &FilterSet, errors: &mut ValidationErrors) {
        for (field, filter) in filters.iter() {
            let Some(kind) = self.def.queryable_kind(field) else {
                errors.add(
                    format!("filters.{}", field),
                    format!("filters.property {} should not exist", field),
                );
                continue;
            };

            for (token, value) in filter.operators() {
                let path = format!("filters.{}", field);
                match Operator::from_token(token) {
                    Some(op) if kind.allows_operator(op) => {
                        check_operand(&format!("{}.{}", path, token), kind, op, value, errors)
                    }
                    _ => errors.add(
                        path.clone(),
                        format!("{}.property {} should not exist", path, token),
                    ),
                }
            }
        }
    }

    fn check_sorts(&self, sorts: &SortSet, errors: &mut ValidationErrors) {
        for (field, _) in sorts.iter() {
            if self.def.queryable_kind(field).is_none() {
                errors.add(
                    format!("sorts.{}", field),
                    format!("sorts.property {} should not exist", field),
                );
            }
        }
    }

    fn check_includes(&self, includes: &IncludeSet, errors: &mut ValidationErrors) {
        if includes.iter().all(|name| self.def.relation_def(name).is_some()) {
            return;
        }
        let allowed: Vec<&str> = self.def.relation_names().collect();
        errors.add(
            "includes",
            format!(
                "each value in includes must be one of the following values: {}",
                allowed.join(", ")
            ),
        );
    }
}

fn check_positive(param: &str, value: Option<u64>, errors: &mut ValidationErrors) {
    if value == Some(0) {
        errors.add(param, format!("{} must be a positive number", param));
    }
}

fn check_operand(
    path: &str,
    kind: FieldKind,
    op: Operator,
    value: &Value,
    errors: &mut ValidationErrors,
) {
    if is_empty_operand(value) {
        return;
    }

    match op.arity() {
        Arity::One | Arity::Pattern => check_scalar(path, kind, value, false, errors),
        Arity::Pair => {
            let Some(values) = value.as_array() else {
                errors.add(path, format!("{} must be an array", path));
                return;
            };
            if values.len() < 2 {
                errors.add(path, format!("{} must contain at least 2 elements", path));
            } else if values.len() > 2 {
                errors.add(path, format!("{} must contain not more than 2 elements", path));
            }
            for v in values {
                check_scalar(path, kind, v, true, errors);
            }
        }
        Arity::Many => {
            let Some(values) = value.as_array() else {
                errors.add(path, format!("{} must be an array", path));
                return;
            };
            for v in values {
                check_scalar(path, kind, v, true, errors);
            }
        }
    }
}

fn check_scalar(
    path: &str,
    kind: FieldKind,
    value: &Value,
    each: bool,
    errors: &mut ValidationErrors,
) {
    let prefix = if each { "each value in " } else { "" };
    if !kind.accepts(value) {
        errors.add(path, format!("{}{}", prefix, kind.type_message(path)));
        return;
    }
    match kind {
        FieldKind::Integer if value.as_f64().is_some_and(|n| n <= 0.0) => {
            errors.add(path, format!("{}{} must be a positive number", prefix, path));
        }
        FieldKind::String
            if value
                .as_str()
                .is_some_and(|s| s.chars().count() > MAX_STRING_OPERAND) =>
        {
            errors.add(
                path,
                format!(
                    "{}{} must be shorter than or equal to {} characters",
                    prefix, path, MAX_STRING_OPERAND
                ),
            );
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDef, RelationDef};
    use serde_json::json;

    fn article() -> EntityDef {
        EntityDef::new("Article", "articles")
            .field(FieldDef::integer("user_id").required())
            .field(FieldDef::string("title").required())
            .relation(RelationDef::belongs_to("user", "User", "user_id"))
            .relation(RelationDef::has_one("content", "Content", "article_id"))
    }

    fn find(value: Value) -> FindQuery {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_valid_query_passes() {
        let def = article();
        let query = find(json!({
            "filters": {"title": {"$like": "a"}, "id": {"$between": [8, 13]}},
            "sorts": {"created_at": "desc"},
            "page": 1,
            "pageSize": 10,
            "includes": ["user"]
        }));
        assert!(QueryPolicy::new(&def).check_find(&query).is_ok());
    }

    #[test]
    fn test_unknown_field_and_operator() {
        let def = article();
        let query = find(json!({
            "filters": {"colour": {"$eq": "red"}, "title": {"$gt": "a"}},
            "sorts": {"colour": "asc"}
        }));
        let errors = QueryPolicy::new(&def).check_find(&query).unwrap_err();
        assert_eq!(
            errors.messages(),
            vec![
                "filters.property colour should not exist",
                "filters.title.property $gt should not exist",
                "sorts.property colour should not exist",
            ]
        );
    }

    #[test]
    fn test_operand_shapes() {
        let def = article();
        let query = find(json!({
            "filters": {"id": {"$between": [3], "$in": [1, -2]}, "user_id": {"$eq": "x"}}
        }));
        let errors = QueryPolicy::new(&def).check_find(&query).unwrap_err();
        assert_eq!(
            errors.messages(),
            vec![
                "filters.id.$between must contain at least 2 elements",
                "each value in filters.id.$in must be a positive number",
                "filters.user_id.$eq must be an integer number",
            ]
        );
    }

    #[test]
    fn test_empty_operand_is_not_checked() {
        let def = article();
        let query = find(json!({"filters": {"id": {"$in": []}, "title": {"$like": ""}}}));
        assert!(QueryPolicy::new(&def).check_find(&query).is_ok());
    }

    #[test]
    fn test_includes_and_page() {
        let def = article();
        let query = find(json!({"page": 0, "includes": ["user", "tags"]}));
        let errors = QueryPolicy::new(&def).check_find(&query).unwrap_err();
        assert_eq!(
            errors.messages(),
            vec![
                "page must be a positive number",
                "each value in includes must be one of the following values: user, content",
            ]
        );

        let one = FindOneQuery {
            includes: Some(["content"].into_iter().collect()),
        };
        assert!(QueryPolicy::new(&def).check_find_one(&one).is_ok());
    }
}
