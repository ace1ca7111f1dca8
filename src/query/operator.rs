//! Operator registry
//!
//! The closed set of filter operators a caller may use, and the mapping from
//! each operator plus operand to a predicate [`Condition`].

use std::fmt;

use serde_json::Value;

use super::errors::{QueryError, QueryResult};
use super::predicate::Condition;

/// Filter operators, keyed by their `$token` on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Between,
    NotBetween,
    In,
    NotIn,
    Like,
    NotLike,
}

/// Operand shape an operator expects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// One scalar
    One,
    /// Exactly two scalars, inclusive bounds
    Pair,
    /// Non-empty array of scalars
    Many,
    /// One string, wrapped in wildcards
    Pattern,
}

impl Operator {
    /// Every operator, in registry order
    pub const ALL: [Operator; 12] = [
        Operator::Eq,
        Operator::Ne,
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
        Operator::Between,
        Operator::NotBetween,
        Operator::In,
        Operator::NotIn,
        Operator::Like,
        Operator::NotLike,
    ];

    /// Wire token
    pub fn token(self) -> &'static str {
        match self {
            Operator::Eq => "$eq",
            Operator::Ne => "$ne",
            Operator::Gt => "$gt",
            Operator::Gte => "$gte",
            Operator::Lt => "$lt",
            Operator::Lte => "$lte",
            Operator::Between => "$between",
            Operator::NotBetween => "$notBetween",
            Operator::In => "$in",
            Operator::NotIn => "$notIn",
            Operator::Like => "$like",
            Operator::NotLike => "$notLike",
        }
    }

    /// Looks up an operator by wire token
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.token() == token)
    }

    pub fn arity(self) -> Arity {
        match self {
            Operator::Eq
            | Operator::Ne
            | Operator::Gt
            | Operator::Gte
            | Operator::Lt
            | Operator::Lte => Arity::One,
            Operator::Between | Operator::NotBetween => Arity::Pair,
            Operator::In | Operator::NotIn => Arity::Many,
            Operator::Like | Operator::NotLike => Arity::Pattern,
        }
    }

    /// Builds the condition for `value`.
    ///
    /// Returns `Ok(None)` when the operand is empty: the field is then left
    /// unfiltered rather than rejected.
    pub fn condition(self, field: &str, value: &Value) -> QueryResult<Option<Condition>> {
        if is_empty_operand(value) {
            return Ok(None);
        }

        let token = self.token();
        let condition = match self.arity() {
            Arity::One => {
                if !is_scalar(value) {
                    return Err(QueryError::operand(field, token, "expected a single value"));
                }
                let v = value.clone();
                match self {
                    Operator::Eq => Condition::Equal(v),
                    Operator::Ne => Condition::Equal(v).negate(),
                    Operator::Gt => Condition::MoreThan(v),
                    Operator::Gte => Condition::MoreThanOrEqual(v),
                    Operator::Lt => Condition::LessThan(v),
                    _ => Condition::LessThanOrEqual(v),
                }
            }
            Arity::Pair => {
                let (low, high) = match value.as_array().map(Vec::as_slice) {
                    Some([low, high]) if is_scalar(low) && is_scalar(high) => {
                        (low.clone(), high.clone())
                    }
                    _ => {
                        return Err(QueryError::operand(field, token, "expected exactly 2 values"))
                    }
                };
                let between = Condition::Between(low, high);
                if self == Operator::NotBetween {
                    between.negate()
                } else {
                    between
                }
            }
            Arity::Many => {
                let values = match value.as_array() {
                    Some(values) if values.iter().all(is_scalar) => values.clone(),
                    _ => {
                        return Err(QueryError::operand(
                            field,
                            token,
                            "expected an array of values",
                        ))
                    }
                };
                if self == Operator::NotIn {
                    Condition::In(values).negate()
                } else {
                    Condition::In(values)
                }
            }
            Arity::Pattern => {
                let needle = value
                    .as_str()
                    .ok_or_else(|| QueryError::operand(field, token, "expected a string"))?;
                let like = Condition::Like(format!("%{}%", needle));
                if self == Operator::NotLike {
                    like.negate()
                } else {
                    like
                }
            }
        };

        Ok(Some(condition))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// `null`, `""` and `[]` count as "no operand"
pub fn is_empty_operand(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(values) => values.is_empty(),
        _ => false,
    }
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_) | Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tokens_round_trip_through_registry() {
        for op in Operator::ALL {
            assert_eq!(Operator::from_token(op.token()), Some(op));
        }
        assert_eq!(Operator::from_token("$foo"), None);
        assert_eq!(Operator::from_token("eq"), None);
    }

    #[test]
    fn test_like_wraps_operand_in_wildcards() {
        let cond = Operator::Like.condition("title", &json!("a")).unwrap();
        assert_eq!(cond, Some(Condition::Like("%a%".to_string())));

        let cond = Operator::NotLike.condition("title", &json!("a")).unwrap();
        assert_eq!(cond, Some(Condition::Like("%a%".to_string()).negate()));
    }

    #[test]
    fn test_empty_operand_skips_field() {
        assert_eq!(Operator::Eq.condition("id", &Value::Null).unwrap(), None);
        assert_eq!(Operator::Like.condition("title", &json!("")).unwrap(), None);
        assert_eq!(Operator::In.condition("id", &json!([])).unwrap(), None);
    }

    #[test]
    fn test_zero_is_a_real_operand() {
        let cond = Operator::Gt.condition("id", &json!(0)).unwrap();
        assert_eq!(cond, Some(Condition::MoreThan(json!(0))));
    }

    #[test]
    fn test_between_requires_pair() {
        let err = Operator::Between.condition("id", &json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, QueryError::InvalidOperand { ref field, .. } if field == "id"));

        let cond = Operator::NotBetween.condition("id", &json!([8, 13])).unwrap();
        assert_eq!(
            cond,
            Some(Condition::Between(json!(8), json!(13)).negate())
        );
    }

    #[test]
    fn test_in_requires_array() {
        assert!(Operator::In.condition("id", &json!(3)).is_err());
        let cond = Operator::NotIn.condition("id", &json!([1, 2])).unwrap();
        assert_eq!(cond, Some(Condition::In(vec![json!(1), json!(2)]).negate()));
    }
}
