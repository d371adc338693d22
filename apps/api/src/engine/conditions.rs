//! Condition evaluation for conditional sections and company-gated sections.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::engine::placeholders::resolve;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "==", alias = "equals")]
    Eq,
    #[serde(rename = "!=", alias = "not_equals")]
    NotEq,
    #[serde(rename = ">", alias = "greater_than")]
    Gt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<", alias = "less_than")]
    Lt,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "not_in")]
    NotIn,
    #[serde(untagged)]
    Unknown(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOperator {
    #[default]
    And,
    Or,
}

/// `{field, operator, value}` — `field` is a dotted path into the render data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub field: String,
    pub operator: Operator,
    #[serde(default)]
    pub value: Value,
    /// Carried with the document for the editor; section gating always ANDs.
    #[serde(default)]
    pub logical_operator: LogicalOperator,
}

impl Condition {
    pub fn new(field: impl Into<String>, operator: Operator, value: Value) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
            logical_operator: LogicalOperator::And,
        }
    }
}

/// Evaluates one condition. A missing condition always passes.
pub fn evaluate(condition: Option<&Condition>, bag: &Value) -> bool {
    let Some(condition) = condition else {
        return true;
    };
    let actual = resolve(bag, &condition.field);
    let expected = &condition.value;

    match &condition.operator {
        Operator::Eq => loose_eq(actual, expected),
        Operator::NotEq => !loose_eq(actual, expected),
        Operator::Gt => compare(actual, expected) == Some(Ordering::Greater),
        Operator::Gte => matches!(
            compare(actual, expected),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Operator::Lt => compare(actual, expected) == Some(Ordering::Less),
        Operator::Lte => matches!(
            compare(actual, expected),
            Some(Ordering::Less | Ordering::Equal)
        ),
        Operator::In => match expected {
            Value::Array(options) => actual.is_some() && options.iter().any(|o| loose_eq(actual, o)),
            _ => false,
        },
        Operator::NotIn => match expected {
            Value::Array(options) => !options.iter().any(|o| loose_eq(actual, o)),
            _ => true,
        },
        Operator::Unknown(op) => {
            warn!(
                "Unknown condition operator '{}' on field '{}' — treating as false",
                op, condition.field
            );
            false
        }
    }
}

/// AND of every condition. An empty list passes.
pub fn evaluate_all(conditions: &[Condition], bag: &Value) -> bool {
    conditions.iter().all(|c| evaluate(Some(c), bag))
}

/// Loose equality: numbers compare numerically (including numeric strings),
/// booleans equal 1/0, and a missing field equals `null`.
fn loose_eq(actual: Option<&Value>, expected: &Value) -> bool {
    let Some(actual) = actual else {
        return expected.is_null();
    };
    match (actual, expected) {
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Null, Value::Null) => true,
        (Value::Array(_), _) | (Value::Object(_), _) => actual == expected,
        _ => match (as_number(actual), as_number(expected)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
    }
}

/// Numeric comparison when both sides coerce to numbers, otherwise string
/// comparison when both are strings. Anything else is incomparable.
fn compare(actual: Option<&Value>, expected: &Value) -> Option<Ordering> {
    let actual = actual?;
    if let (Some(a), Some(b)) = (as_number(actual), as_number(expected)) {
        return a.partial_cmp(&b);
    }
    match (actual, expected) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}
