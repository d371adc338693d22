//! Render-time data shared by every section of one document.

use serde_json::{Map, Value};

use crate::engine::salary::{calculate, SalaryBreakdown};
use crate::models::company::CompanyPolicy;

/// Everything a section renderer may read. Built once per render.
///
/// `data` is the placeholder/condition bag: the candidate fields at the root,
/// plus `company.*` (the policy) and `salary.*` (the computed breakdown) when
/// the candidate does not already define those keys.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub data: Value,
    pub policy: CompanyPolicy,
    pub salary: SalaryBreakdown,
}

impl RenderContext {
    pub fn new(candidate: &Value, policy: Option<&CompanyPolicy>) -> Self {
        let policy = policy.cloned().unwrap_or_default();
        let salary = calculate(candidate, &policy);

        let mut data = match candidate {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        if !data.contains_key("company") {
            data.insert(
                "company".to_string(),
                serde_json::to_value(&policy).unwrap_or(Value::Null),
            );
        }
        if !data.contains_key("salary") {
            data.insert(
                "salary".to_string(),
                serde_json::to_value(&salary).unwrap_or(Value::Null),
            );
        }

        Self {
            data: Value::Object(data),
            policy,
            salary,
        }
    }

    pub fn currency(&self) -> &str {
        &self.salary.currency
    }
}
