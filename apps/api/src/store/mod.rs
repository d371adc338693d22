//! Persistence seam. Handlers and services only see `Arc<dyn OfferStore>`.
//!
//! Documents (templates, company policies, offers) are stored whole; the
//! engine never reads from the store directly.

#[cfg(test)]
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::company::CompanyPolicy;
use crate::models::offer::GeneratedOffer;
use crate::models::template::Template;

#[async_trait]
pub trait OfferStore: Send + Sync {
    async fn insert_template(&self, template: &Template) -> Result<(), AppError>;

    async fn fetch_template(&self, id: Uuid) -> Result<Option<Template>, AppError>;

    /// Persists `template` only if the stored row is still at `expected_version`.
    /// A concurrent writer that got there first yields `AppError::Conflict`.
    async fn save_template(&self, template: &Template, expected_version: i32)
        -> Result<(), AppError>;

    async fn upsert_company(&self, id: Uuid, policy: &CompanyPolicy) -> Result<(), AppError>;

    async fn fetch_company(&self, id: Uuid) -> Result<Option<CompanyPolicy>, AppError>;

    async fn insert_offer(&self, offer: &GeneratedOffer) -> Result<(), AppError>;

    async fn fetch_offer(&self, id: Uuid) -> Result<Option<GeneratedOffer>, AppError>;

    async fn update_offer(&self, offer: &GeneratedOffer) -> Result<(), AppError>;
}
