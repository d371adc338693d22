//! Offer-letter engine. Pure, synchronous, no I/O.
//!
//! placeholders → conditions → salary → sections → renderer, with the
//! validator gating every render and versioning applied on template save.

pub mod conditions;
pub mod context;
pub mod placeholders;
pub mod renderer;
pub mod salary;
pub mod sections;
pub mod style;
pub mod validator;
pub mod versioning;

use thiserror::Error;
use uuid::Uuid;

use crate::engine::validator::ValidationReport;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Template is invalid: {}", .0.summary())]
    InvalidTemplate(ValidationReport),

    #[error("Invalid salary data: {}", .0.join("; "))]
    InvalidSalaryData(Vec<String>),

    #[error("Template {template_id} has no retained version {version}")]
    VersionNotFound { template_id: Uuid, version: i32 },
}
