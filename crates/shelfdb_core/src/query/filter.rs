//! Filter predicates and value comparison.

use crate::error::{CoreError, CoreResult};
use serde_json::Value;
use shelfdb_codec::Document;
use std::cmp::Ordering;

/// A comparison operator, parsed from a `field__op` suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Equality (the default when no suffix is given).
    Eq,
    /// Inequality.
    Ne,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// Membership in a set of values.
    In,
    /// Non-membership in a set of values.
    NotIn,
    /// Case-sensitive substring match.
    Contains,
    /// Case-insensitive substring match.
    IContains,
    /// String prefix match.
    StartsWith,
    /// String suffix match.
    EndsWith,
    /// Null/absence test; the predicate value is a boolean.
    IsNull,
}

impl Operator {
    /// Parses an operator suffix. Returns `None` for unrecognized suffixes.
    #[must_use]
    pub fn parse(suffix: &str) -> Option<Self> {
        match suffix {
            "eq" => Some(Self::Eq),
            "ne" => Some(Self::Ne),
            "gt" => Some(Self::Gt),
            "gte" => Some(Self::Gte),
            "lt" => Some(Self::Lt),
            "lte" => Some(Self::Lte),
            "in" => Some(Self::In),
            "not_in" => Some(Self::NotIn),
            "contains" => Some(Self::Contains),
            "icontains" => Some(Self::IContains),
            "startswith" => Some(Self::StartsWith),
            "endswith" => Some(Self::EndsWith),
            "isnull" => Some(Self::IsNull),
            _ => None,
        }
    }
}

/// One filter predicate: a field, an operator, and a comparison value.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    /// The field being tested.
    pub field: String,
    /// The comparison operator.
    pub op: Operator,
    /// The comparison value.
    pub value: Value,
}

impl Predicate {
    /// Parses a `field` or `field__op` spec into a predicate.
    ///
    /// Validation happens here, at query-build time: an unrecognized
    /// operator suffix, a non-array value for `in`/`not_in`, or a
    /// non-boolean value for `isnull` all fail before any store access.
    pub fn parse(spec: &str, value: Value) -> CoreResult<Self> {
        let (field, op) = match spec.rsplit_once("__") {
            Some((field, suffix)) => {
                let op = Operator::parse(suffix).ok_or_else(|| {
                    CoreError::invalid_query(format!(
                        "unrecognized operator suffix '{suffix}' in '{spec}'"
                    ))
                })?;
                (field, op)
            }
            None => (spec, Operator::Eq),
        };

        if field.is_empty() {
            return Err(CoreError::invalid_query(format!(
                "empty field name in '{spec}'"
            )));
        }
        match op {
            Operator::In | Operator::NotIn if !value.is_array() => {
                return Err(CoreError::invalid_query(format!(
                    "'{spec}' requires an array of values"
                )));
            }
            Operator::IsNull if !value.is_boolean() => {
                return Err(CoreError::invalid_query(format!(
                    "'{spec}' requires a boolean value"
                )));
            }
            _ => {}
        }

        Ok(Self {
            field: field.to_string(),
            op,
            value,
        })
    }

    /// Evaluates this predicate against a document.
    ///
    /// Comparison uses native semantic types: numeric for numbers,
    /// lexicographic for strings (which makes RFC 3339 timestamps ordinal),
    /// membership for the set operators. A document whose field is absent
    /// or null fails every operator except `isnull` and `ne`/`not_in`.
    #[must_use]
    pub fn matches(&self, doc: &Document) -> bool {
        let field_value = doc.field(&self.field);

        match self.op {
            Operator::IsNull => {
                let want_null = self.value.as_bool().unwrap_or(true);
                is_nullish(field_value.as_ref()) == want_null
            }
            Operator::Eq => values_equal(field_value.as_ref(), &self.value),
            Operator::Ne => !values_equal(field_value.as_ref(), &self.value),
            Operator::Gt => ordered(field_value.as_ref(), &self.value, Ordering::is_gt),
            Operator::Gte => ordered(field_value.as_ref(), &self.value, Ordering::is_ge),
            Operator::Lt => ordered(field_value.as_ref(), &self.value, Ordering::is_lt),
            Operator::Lte => ordered(field_value.as_ref(), &self.value, Ordering::is_le),
            Operator::In => in_set(field_value.as_ref(), &self.value),
            Operator::NotIn => !in_set(field_value.as_ref(), &self.value),
            Operator::Contains => with_strings(field_value.as_ref(), &self.value, |f, p| {
                f.contains(p)
            }),
            Operator::IContains => with_strings(field_value.as_ref(), &self.value, |f, p| {
                f.to_lowercase().contains(&p.to_lowercase())
            }),
            Operator::StartsWith => with_strings(field_value.as_ref(), &self.value, |f, p| {
                f.starts_with(p)
            }),
            Operator::EndsWith => with_strings(field_value.as_ref(), &self.value, |f, p| {
                f.ends_with(p)
            }),
        }
    }
}

fn is_nullish(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}

/// Equality with numeric normalization: `1` equals `1.0`. An absent field
/// equals an explicit null.
pub(crate) fn values_equal(field: Option<&Value>, predicate: &Value) -> bool {
    match field {
        None => predicate.is_null(),
        Some(f) => match (f.as_f64(), predicate.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => f == predicate,
        },
    }
}

fn ordered(field: Option<&Value>, predicate: &Value, test: fn(Ordering) -> bool) -> bool {
    match field {
        Some(f) => compare_values(f, predicate).is_some_and(test),
        None => false,
    }
}

fn in_set(field: Option<&Value>, predicate: &Value) -> bool {
    predicate
        .as_array()
        .is_some_and(|set| set.iter().any(|candidate| values_equal(field, candidate)))
}

fn with_strings(field: Option<&Value>, predicate: &Value, test: fn(&str, &str) -> bool) -> bool {
    match (field.and_then(Value::as_str), predicate.as_str()) {
        (Some(f), Some(p)) => test(f, p),
        _ => false,
    }
}

/// Compares two values by their native semantic type.
///
/// Numbers compare numerically (integer and float interchangeably),
/// strings lexicographically, booleans as false < true. Mixed or
/// non-comparable types return `None`.
pub(crate) fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
        return x.partial_cmp(&y);
    }
    match (a, b) {
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Total order used for sorting: absent and null sort first, then
/// comparable values by [`compare_values`]; incomparable pairs tie (the
/// stable sort keeps their listing order).
pub(crate) fn compare_for_sort(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (
        a.filter(|v| !v.is_null()),
        b.filter(|v| !v.is_null()),
    ) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(pairs: &[(&str, Value)]) -> Document {
        let mut d = Document::new();
        for (k, v) in pairs {
            d.set_attr(*k, v.clone());
        }
        d
    }

    #[test]
    fn parse_default_is_eq() {
        let p = Predicate::parse("price", json!(10)).unwrap();
        assert_eq!(p.op, Operator::Eq);
        assert_eq!(p.field, "price");
    }

    #[test]
    fn parse_splits_on_last_separator() {
        let p = Predicate::parse("author_id__in", json!([])).unwrap();
        assert_eq!(p.field, "author_id");
        assert_eq!(p.op, Operator::In);
    }

    #[test]
    fn parse_rejects_unknown_suffix() {
        let err = Predicate::parse("price__between", json!(10)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidQuery { .. }));
    }

    #[test]
    fn parse_validates_set_operators() {
        assert!(Predicate::parse("sku__in", json!("not-an-array")).is_err());
        assert!(Predicate::parse("sku__not_in", json!(3)).is_err());
        assert!(Predicate::parse("sku__in", json!(["a", "b"])).is_ok());
    }

    #[test]
    fn parse_validates_isnull() {
        assert!(Predicate::parse("sku__isnull", json!("yes")).is_err());
        assert!(Predicate::parse("sku__isnull", json!(true)).is_ok());
    }

    #[test]
    fn eq_and_ne() {
        let d = doc(&[("price", json!(10))]);
        assert!(Predicate::parse("price", json!(10)).unwrap().matches(&d));
        assert!(Predicate::parse("price", json!(10.0)).unwrap().matches(&d));
        assert!(!Predicate::parse("price", json!(11)).unwrap().matches(&d));
        assert!(Predicate::parse("price__ne", json!(11)).unwrap().matches(&d));
    }

    #[test]
    fn numeric_ordering() {
        let d = doc(&[("price", json!(20))]);
        assert!(Predicate::parse("price__gte", json!(20)).unwrap().matches(&d));
        assert!(Predicate::parse("price__gt", json!(10)).unwrap().matches(&d));
        assert!(!Predicate::parse("price__lt", json!(20)).unwrap().matches(&d));
        assert!(Predicate::parse("price__lte", json!(20.5)).unwrap().matches(&d));
    }

    #[test]
    fn string_ordering_is_lexicographic() {
        let d = doc(&[("ts", json!("2026-02-01T00:00:00Z"))]);
        assert!(Predicate::parse("ts__gt", json!("2026-01-01T00:00:00Z"))
            .unwrap()
            .matches(&d));
    }

    #[test]
    fn set_membership() {
        let d = doc(&[("sku", json!("A-1"))]);
        assert!(Predicate::parse("sku__in", json!(["A-1", "B-2"]))
            .unwrap()
            .matches(&d));
        assert!(Predicate::parse("sku__not_in", json!(["C-3"]))
            .unwrap()
            .matches(&d));
    }

    #[test]
    fn substring_operators() {
        let d = doc(&[("name", json!("Widget Deluxe"))]);
        assert!(Predicate::parse("name__contains", json!("Deluxe"))
            .unwrap()
            .matches(&d));
        assert!(!Predicate::parse("name__contains", json!("deluxe"))
            .unwrap()
            .matches(&d));
        assert!(Predicate::parse("name__icontains", json!("dELuXe"))
            .unwrap()
            .matches(&d));
        assert!(Predicate::parse("name__startswith", json!("Widget"))
            .unwrap()
            .matches(&d));
        assert!(Predicate::parse("name__endswith", json!("Deluxe"))
            .unwrap()
            .matches(&d));
    }

    #[test]
    fn isnull_treats_absent_and_null_alike() {
        let with_null = doc(&[("sku", Value::Null)]);
        let without = doc(&[]);
        let with_value = doc(&[("sku", json!("A-1"))]);

        let null_true = Predicate::parse("sku__isnull", json!(true)).unwrap();
        assert!(null_true.matches(&with_null));
        assert!(null_true.matches(&without));
        assert!(!null_true.matches(&with_value));

        let null_false = Predicate::parse("sku__isnull", json!(false)).unwrap();
        assert!(null_false.matches(&with_value));
        assert!(!null_false.matches(&without));
    }

    #[test]
    fn absent_field_fails_ordering_and_strings() {
        let d = doc(&[]);
        assert!(!Predicate::parse("price__gte", json!(0)).unwrap().matches(&d));
        assert!(!Predicate::parse("name__contains", json!("x")).unwrap().matches(&d));
    }

    #[test]
    fn virtual_id_field_is_filterable() {
        let d = doc(&[]);
        let p = Predicate::parse("id", json!(d.id().to_string())).unwrap();
        assert!(p.matches(&d));
    }

    #[test]
    fn sort_comparison_puts_missing_first() {
        let a = json!(1);
        assert_eq!(compare_for_sort(None, Some(&a)), Ordering::Less);
        assert_eq!(compare_for_sort(Some(&a), None), Ordering::Greater);
        assert_eq!(
            compare_for_sort(Some(&Value::Null), Some(&a)),
            Ordering::Less
        );
        assert_eq!(compare_for_sort(None, None), Ordering::Equal);
    }
}
