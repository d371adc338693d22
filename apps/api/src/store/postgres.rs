use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::company::CompanyPolicy;
use crate::models::offer::GeneratedOffer;
use crate::models::template::Template;
use crate::store::OfferStore;

#[derive(Debug, FromRow)]
struct TemplateRow {
    document: Json<Template>,
}

#[derive(Debug, FromRow)]
struct CompanyRow {
    policy: Json<CompanyPolicy>,
}

#[derive(Debug, FromRow)]
struct OfferRow {
    document: Json<GeneratedOffer>,
}

/// Postgres-backed store. Each document lives in a JSONB column, with the
/// fields used for lookups and concurrency checks lifted into real columns.
#[derive(Clone)]
pub struct PgOfferStore {
    pool: PgPool,
}

impl PgOfferStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OfferStore for PgOfferStore {
    async fn insert_template(&self, template: &Template) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO templates (id, name, version, is_active, document, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(template.id)
        .bind(&template.name)
        .bind(template.version)
        .bind(template.is_active)
        .bind(Json(template))
        .bind(template.created_at)
        .bind(template.updated_at)
        .execute(&self.pool)
        .await?;

        debug!("Inserted template {} v{}", template.id, template.version);
        Ok(())
    }

    async fn fetch_template(&self, id: Uuid) -> Result<Option<Template>, AppError> {
        let row: Option<TemplateRow> =
            sqlx::query_as("SELECT document FROM templates WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|r| r.document.0))
    }

    async fn save_template(
        &self,
        template: &Template,
        expected_version: i32,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE templates
            SET name = $2, version = $3, is_active = $4, document = $5, updated_at = $6
            WHERE id = $1 AND version = $7
            "#,
        )
        .bind(template.id)
        .bind(&template.name)
        .bind(template.version)
        .bind(template.is_active)
        .bind(Json(template))
        .bind(template.updated_at)
        .bind(expected_version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        // Nothing updated: either the template is gone or someone saved first.
        let current: Option<i32> = sqlx::query_scalar("SELECT version FROM templates WHERE id = $1")
            .bind(template.id)
            .fetch_optional(&self.pool)
            .await?;
        match current {
            None => Err(AppError::NotFound(format!("Template {} not found", template.id))),
            Some(found) => {
                warn!(
                    "Lost update prevented on template {}: expected v{}, found v{}",
                    template.id, expected_version, found
                );
                Err(AppError::Conflict(format!(
                    "Template {} was modified concurrently (expected version {}, found {})",
                    template.id, expected_version, found
                )))
            }
        }
    }

    async fn upsert_company(&self, id: Uuid, policy: &CompanyPolicy) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO companies (id, name, policy, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name, policy = EXCLUDED.policy, updated_at = NOW()
            "#,
        )
        .bind(id)
        .bind(policy.name.as_deref())
        .bind(Json(policy))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn fetch_company(&self, id: Uuid) -> Result<Option<CompanyPolicy>, AppError> {
        let row: Option<CompanyRow> = sqlx::query_as("SELECT policy FROM companies WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.policy.0))
    }

    async fn insert_offer(&self, offer: &GeneratedOffer) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO generated_offers
                (id, template_id, template_version, status, document, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(offer.id)
        .bind(offer.template_id)
        .bind(offer.template_version)
        .bind(offer.status.as_str())
        .bind(Json(offer))
        .bind(offer.created_at)
        .bind(offer.updated_at)
        .execute(&self.pool)
        .await?;

        debug!("Inserted offer {}", offer.id);
        Ok(())
    }

    async fn fetch_offer(&self, id: Uuid) -> Result<Option<GeneratedOffer>, AppError> {
        let row: Option<OfferRow> =
            sqlx::query_as("SELECT document FROM generated_offers WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|r| r.document.0))
    }

    async fn update_offer(&self, offer: &GeneratedOffer) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE generated_offers
            SET status = $2, document = $3, updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(offer.id)
        .bind(offer.status.as_str())
        .bind(Json(offer))
        .bind(offer.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Offer {} not found", offer.id)));
        }
        Ok(())
    }
}
