use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::company::CompanyPolicy;
use crate::models::offer::GeneratedOffer;
use crate::models::template::Template;
use crate::store::OfferStore;

/// In-process store with the same version check as the Postgres one.
#[derive(Default)]
pub struct MemoryOfferStore {
    templates: RwLock<HashMap<Uuid, Template>>,
    companies: RwLock<HashMap<Uuid, CompanyPolicy>>,
    offers: RwLock<HashMap<Uuid, GeneratedOffer>>,
}

#[async_trait]
impl OfferStore for MemoryOfferStore {
    async fn insert_template(&self, template: &Template) -> Result<(), AppError> {
        let mut templates = self.templates.write().await;
        if templates.contains_key(&template.id) {
            return Err(AppError::Conflict(format!(
                "Template {} already exists",
                template.id
            )));
        }
        templates.insert(template.id, template.clone());
        Ok(())
    }

    async fn fetch_template(&self, id: Uuid) -> Result<Option<Template>, AppError> {
        Ok(self.templates.read().await.get(&id).cloned())
    }

    async fn save_template(
        &self,
        template: &Template,
        expected_version: i32,
    ) -> Result<(), AppError> {
        let mut templates = self.templates.write().await;
        let stored = templates
            .get_mut(&template.id)
            .ok_or_else(|| AppError::NotFound(format!("Template {} not found", template.id)))?;
        if stored.version != expected_version {
            return Err(AppError::Conflict(format!(
                "Template {} was modified concurrently (expected version {}, found {})",
                template.id, expected_version, stored.version
            )));
        }
        *stored = template.clone();
        Ok(())
    }

    async fn upsert_company(&self, id: Uuid, policy: &CompanyPolicy) -> Result<(), AppError> {
        self.companies.write().await.insert(id, policy.clone());
        Ok(())
    }

    async fn fetch_company(&self, id: Uuid) -> Result<Option<CompanyPolicy>, AppError> {
        Ok(self.companies.read().await.get(&id).cloned())
    }

    async fn insert_offer(&self, offer: &GeneratedOffer) -> Result<(), AppError> {
        self.offers.write().await.insert(offer.id, offer.clone());
        Ok(())
    }

    async fn fetch_offer(&self, id: Uuid) -> Result<Option<GeneratedOffer>, AppError> {
        Ok(self.offers.read().await.get(&id).cloned())
    }

    async fn update_offer(&self, offer: &GeneratedOffer) -> Result<(), AppError> {
        let mut offers = self.offers.write().await;
        match offers.get_mut(&offer.id) {
            Some(stored) => {
                *stored = offer.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!("Offer {} not found", offer.id))),
        }
    }
}
