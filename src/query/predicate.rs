//! Predicate tree
//!
//! A compiled filter is a conjunction of field predicates. The tree is what
//! storage receives; the memory backend evaluates it directly and every
//! backend can render it SQL-style for logs.
//!
//! Evaluation is three-valued like SQL: a missing or null column makes the
//! predicate unknown, and unknown never matches, negated or not.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};

/// A single test applied to one column
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// column = value
    Equal(Value),
    /// column > value
    MoreThan(Value),
    /// column >= value
    MoreThanOrEqual(Value),
    /// column < value
    LessThan(Value),
    /// column <= value
    LessThanOrEqual(Value),
    /// low <= column <= high
    Between(Value, Value),
    /// column is one of the values
    In(Vec<Value>),
    /// SQL LIKE pattern (`%` any run, `_` one char), case-insensitive
    Like(String),
    /// Negation of the inner condition
    Not(Box<Condition>),
}

impl Condition {
    /// Wrap this condition in a negation
    pub fn negate(self) -> Self {
        Condition::Not(Box::new(self))
    }

    /// Evaluates against a column value. `None` means unknown.
    pub fn evaluate(&self, actual: Option<&Value>) -> Option<bool> {
        let actual = match actual {
            Some(v) if !v.is_null() => v,
            _ => return None,
        };

        match self {
            Condition::Equal(expected) => Some(values_equal(actual, expected)),
            Condition::MoreThan(bound) => {
                compare_values(actual, bound).map(|o| o == Ordering::Greater)
            }
            Condition::MoreThanOrEqual(bound) => {
                compare_values(actual, bound).map(|o| o != Ordering::Less)
            }
            Condition::LessThan(bound) => compare_values(actual, bound).map(|o| o == Ordering::Less),
            Condition::LessThanOrEqual(bound) => {
                compare_values(actual, bound).map(|o| o != Ordering::Greater)
            }
            Condition::Between(low, high) => {
                let above = compare_values(actual, low)?;
                let below = compare_values(actual, high)?;
                Some(above != Ordering::Less && below != Ordering::Greater)
            }
            Condition::In(values) => Some(values.iter().any(|v| values_equal(actual, v))),
            Condition::Like(pattern) => actual.as_str().map(|s| like_matches(s, pattern)),
            Condition::Not(inner) => inner.evaluate(Some(actual)).map(|b| !b),
        }
    }

    fn render(&self, field: &str, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Equal(v) => write!(f, "{} = {}", field, SqlValue(v)),
            Condition::MoreThan(v) => write!(f, "{} > {}", field, SqlValue(v)),
            Condition::MoreThanOrEqual(v) => write!(f, "{} >= {}", field, SqlValue(v)),
            Condition::LessThan(v) => write!(f, "{} < {}", field, SqlValue(v)),
            Condition::LessThanOrEqual(v) => write!(f, "{} <= {}", field, SqlValue(v)),
            Condition::Between(low, high) => write!(
                f,
                "{} BETWEEN {} AND {}",
                field,
                SqlValue(low),
                SqlValue(high)
            ),
            Condition::In(values) => {
                write!(f, "{} IN (", field)?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", SqlValue(v))?;
                }
                write!(f, ")")
            }
            Condition::Like(pattern) => write!(f, "{} LIKE '{}'", field, pattern.replace('\'', "''")),
            Condition::Not(inner) => {
                write!(f, "NOT (")?;
                inner.render(field, f)?;
                write!(f, ")")
            }
        }
    }
}

/// A condition bound to a column
#[derive(Debug, Clone, PartialEq)]
pub struct FieldPredicate {
    pub field: String,
    pub condition: Condition,
}

impl FieldPredicate {
    pub fn new(field: impl Into<String>, condition: Condition) -> Self {
        Self {
            field: field.into(),
            condition,
        }
    }

    /// Equality predicate
    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, Condition::Equal(value))
    }

    /// Membership predicate
    pub fn in_list(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self::new(field, Condition::In(values))
    }

    /// Checks a row. Unknown counts as no match.
    pub fn matches(&self, row: &Map<String, Value>) -> bool {
        self.condition.evaluate(row.get(&self.field)).unwrap_or(false)
    }
}

impl fmt::Display for FieldPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.condition.render(&self.field, f)
    }
}

/// Conjunction of field predicates. Empty means "every row".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereClause {
    pub predicates: Vec<FieldPredicate>,
}

impl WhereClause {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, predicate: FieldPredicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    /// Columns referenced by this clause, in predicate order
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.predicates.iter().map(|p| p.field.as_str())
    }

    /// Checks a row against every predicate
    pub fn matches(&self, row: &Map<String, Value>) -> bool {
        self.predicates.iter().all(|p| p.matches(row))
    }
}

impl fmt::Display for WhereClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.predicates.is_empty() {
            return write!(f, "TRUE");
        }
        for (i, predicate) in self.predicates.iter().enumerate() {
            if i > 0 {
                write!(f, " AND ")?;
            }
            write!(f, "{}", predicate)?;
        }
        Ok(())
    }
}

struct SqlValue<'a>(&'a Value);

impl fmt::Display for SqlValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Value::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Value::Null => write!(f, "NULL"),
            other => write!(f, "{}", other),
        }
    }
}

/// Equality with the same coercions as [`compare_values`]
pub fn values_equal(a: &Value, b: &Value) -> bool {
    compare_values(a, b) == Some(Ordering::Equal)
}

/// Compares two scalar JSON values.
///
/// Numbers compare numerically, strings that both parse as dates compare as
/// instants, other strings lexically. Booleans also compare against the
/// strings `"true"`/`"false"`. Anything else is incomparable.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(ai), Some(bi)) => Some(ai.cmp(&bi)),
            _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
        },
        (Value::String(a), Value::String(b)) => match (parse_timestamp(a), parse_timestamp(b)) {
            (Some(at), Some(bt)) => Some(at.cmp(&bt)),
            _ => Some(a.cmp(b)),
        },
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::String(b)) => parse_bool(b).map(|b| a.cmp(&b)),
        (Value::String(a), Value::Bool(b)) => parse_bool(a).map(|a| a.cmp(b)),
        _ => None,
    }
}

/// Parses an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC)
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// SQL LIKE matching, case-insensitive
pub fn like_matches(value: &str, pattern: &str) -> bool {
    let value: Vec<char> = value.to_lowercase().chars().collect();
    let pattern: Vec<char> = pattern.to_lowercase().chars().collect();

    let (mut v, mut p) = (0, 0);
    // Last `%` seen and the value position it is currently absorbing up to
    let mut backtrack: Option<(usize, usize)> = None;

    while v < value.len() {
        if p < pattern.len() && (pattern[p] == '_' || pattern[p] == value[v]) {
            v += 1;
            p += 1;
        } else if p < pattern.len() && pattern[p] == '%' {
            backtrack = Some((p, v));
            p += 1;
        } else if let Some((star, absorbed)) = backtrack {
            p = star + 1;
            v = absorbed + 1;
            backtrack = Some((star, absorbed + 1));
        } else {
            return false;
        }
    }

    while p < pattern.len() && pattern[p] == '%' {
        p += 1;
    }
    p == pattern.len()
}
