//! Offer service — generate offers from templates and drive them through their lifecycle.
//!
//! Flow: fetch template → resolve company → generate (pure) → persist draft.
//! Sending publishes through the dispatcher before the new status is stored,
//! so a failed hand-off leaves the offer in draft.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::engine::renderer::generate_offer;
use crate::errors::AppError;
use crate::models::company::CompanyPolicy;
use crate::models::offer::GeneratedOffer;
use crate::offers::dispatch::OfferDispatcher;
use crate::offers::lifecycle::{self, CandidateDecision};
use crate::store::OfferStore;
use crate::templates::service::{get_template, resolve_policy};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateOfferRequest {
    pub template_id: Uuid,
    pub candidate_data: Value,
    #[serde(default)]
    pub company_id: Option<Uuid>,
    #[serde(default)]
    pub company_policy: Option<CompanyPolicy>,
    #[serde(default)]
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOfferRequest {
    #[serde(default)]
    pub sent_by: Option<String>,
    /// Overrides the company's validity window for this offer.
    #[serde(default)]
    pub validity_days: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RespondRequest {
    pub decision: CandidateDecision,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawRequest {
    #[serde(default)]
    pub withdrawn_by: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

pub async fn create_offer(
    store: &dyn OfferStore,
    req: GenerateOfferRequest,
    now: DateTime<Utc>,
) -> Result<GeneratedOffer, AppError> {
    let template = get_template(store, req.template_id).await?;
    if !template.is_active {
        return Err(AppError::Validation(format!(
            "Template {} is inactive",
            template.id
        )));
    }
    let policy = resolve_policy(store, req.company_id, req.company_policy).await?;

    let offer = generate_offer(
        &template,
        &req.candidate_data,
        policy.as_ref(),
        req.created_by.as_deref(),
        now,
    )?;
    store.insert_offer(&offer).await?;
    Ok(offer)
}

/// Fetches an offer, expiring it first if its validity window has closed.
pub async fn get_offer(
    store: &dyn OfferStore,
    id: Uuid,
    now: DateTime<Utc>,
) -> Result<GeneratedOffer, AppError> {
    let mut offer = store
        .fetch_offer(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Offer {id} not found")))?;
    if lifecycle::expire_if_due(&mut offer, now) {
        store.update_offer(&offer).await?;
    }
    Ok(offer)
}

pub async fn send_offer(
    store: &dyn OfferStore,
    dispatcher: &dyn OfferDispatcher,
    id: Uuid,
    req: SendOfferRequest,
    default_validity_days: i64,
    now: DateTime<Utc>,
) -> Result<GeneratedOffer, AppError> {
    let mut offer = get_offer(store, id, now).await?;
    let validity_days = req
        .validity_days
        .or(offer.company_data.offer_validity_days)
        .unwrap_or(default_validity_days);

    lifecycle::mark_sent(&mut offer, validity_days, req.sent_by.as_deref(), now)?;
    let receipt = dispatcher.dispatch(&offer).await?;
    store.update_offer(&offer).await?;

    info!(
        "Offer {} sent (html={}, queue={}, expires={:?})",
        offer.id, receipt.html_key, receipt.queue, offer.tracking.expires_at
    );
    Ok(offer)
}

pub async fn record_offer_view(
    store: &dyn OfferStore,
    id: Uuid,
    now: DateTime<Utc>,
) -> Result<GeneratedOffer, AppError> {
    let mut offer = get_offer(store, id, now).await?;
    lifecycle::record_view(&mut offer, now)?;
    store.update_offer(&offer).await?;
    Ok(offer)
}

pub async fn respond_to_offer(
    store: &dyn OfferStore,
    id: Uuid,
    req: RespondRequest,
    now: DateTime<Utc>,
) -> Result<GeneratedOffer, AppError> {
    let mut offer = get_offer(store, id, now).await?;
    lifecycle::respond(&mut offer, req.decision, req.note.as_deref(), now)?;
    store.update_offer(&offer).await?;
    info!("Offer {} {}", offer.id, offer.status);
    Ok(offer)
}

pub async fn withdraw_offer(
    store: &dyn OfferStore,
    id: Uuid,
    req: WithdrawRequest,
    now: DateTime<Utc>,
) -> Result<GeneratedOffer, AppError> {
    let mut offer = get_offer(store, id, now).await?;
    lifecycle::withdraw(
        &mut offer,
        req.withdrawn_by.as_deref(),
        req.reason.as_deref(),
        now,
    )?;
    store.update_offer(&offer).await?;
    Ok(offer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::offer::OfferStatus;
    use crate::models::template::Template;
    use crate::offers::dispatch::RecordingDispatcher;
    use crate::store::memory::MemoryOfferStore;
    use chrono::Duration;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    async fn seeded_store() -> (MemoryOfferStore, Uuid) {
        let store = MemoryOfferStore::default();
        let template: Template = serde_json::from_value(json!({
            "id": Uuid::new_v4(),
            "name": "Engineering Offer",
            "content": {
                "sections": [
                    {
                        "id": "greeting",
                        "type": "paragraph",
                        "content": "Dear {{candidate_name}}, your CTC is {{total_ctc}}",
                        "metadata": { "isRequired": true, "order": 1 }
                    },
                    { "id": "pay", "type": "salary_table", "metadata": { "order": 2 } }
                ],
                "placeholders": [{ "key": "candidate_name" }, { "key": "total_ctc" }]
            }
        }))
        .unwrap();
        store.insert_template(&template).await.unwrap();
        (store, template.id)
    }

    fn request(template_id: Uuid, candidate: Value) -> GenerateOfferRequest {
        GenerateOfferRequest {
            template_id,
            candidate_data: candidate,
            company_id: None,
            company_policy: None,
            created_by: Some("hr@acme.example".to_string()),
        }
    }

    fn jane() -> Value {
        json!({ "candidate_name": "Jane Doe", "total_ctc": 900000, "base_salary": 600000 })
    }

    #[tokio::test]
    async fn test_generate_persists_draft() {
        let (store, template_id) = seeded_store().await;
        let now = Utc::now();
        let offer = create_offer(&store, request(template_id, jane()), now).await.unwrap();

        assert_eq!(offer.status, OfferStatus::Draft);
        assert_eq!(offer.salary_breakdown.gross_salary.annual, 777600.0);
        let stored = get_offer(&store, offer.id, now).await.unwrap();
        assert_eq!(stored, offer);
    }

    #[tokio::test]
    async fn test_generate_rejects_invalid_salary() {
        let (store, template_id) = seeded_store().await;
        let err = create_offer(
            &store,
            request(template_id, json!({ "candidate_name": "Jane" })),
            Utc::now(),
        )
        .await
        .unwrap_err();
        match err {
            AppError::InvalidSalaryData(errors) => {
                assert_eq!(errors, vec!["base_salary is required".to_string()])
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_generate_with_unknown_template_or_company_fails() {
        let (store, template_id) = seeded_store().await;
        let missing_template = create_offer(&store, request(Uuid::new_v4(), jane()), Utc::now()).await;
        assert!(matches!(missing_template, Err(AppError::NotFound(_))));

        let mut req = request(template_id, jane());
        req.company_id = Some(Uuid::new_v4());
        let missing_company = create_offer(&store, req, Utc::now()).await;
        assert!(matches!(missing_company, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_full_lifecycle() {
        let (store, template_id) = seeded_store().await;
        let dispatcher = RecordingDispatcher::default();
        let now = Utc::now();

        let offer = create_offer(&store, request(template_id, jane()), now).await.unwrap();
        let sent = send_offer(&store, &dispatcher, offer.id, SendOfferRequest::default(), 14, now)
            .await
            .unwrap();
        assert_eq!(sent.status, OfferStatus::Sent);
        assert_eq!(sent.tracking.expires_at, Some(now + Duration::days(14)));
        assert_eq!(*dispatcher.dispatched.lock().await, vec![offer.id]);

        let viewed = record_offer_view(&store, offer.id, now + Duration::hours(3))
            .await
            .unwrap();
        assert_eq!(viewed.status, OfferStatus::Viewed);
        assert_eq!(viewed.tracking.view_count, 1);

        let accepted = respond_to_offer(
            &store,
            offer.id,
            RespondRequest {
                decision: CandidateDecision::Accept,
                note: None,
            },
            now + Duration::days(1),
        )
        .await
        .unwrap();
        assert_eq!(accepted.status, OfferStatus::Accepted);
        assert_eq!(accepted.status_history.len(), 4);

        let again = withdraw_offer(&store, offer.id, WithdrawRequest::default(), now).await;
        assert!(matches!(again, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_company_validity_window_used_when_sending() {
        let (store, template_id) = seeded_store().await;
        let dispatcher = RecordingDispatcher::default();
        let now = Utc::now();

        let mut req = request(template_id, jane());
        req.company_policy = Some(CompanyPolicy {
            offer_validity_days: Some(5),
            ..Default::default()
        });
        let offer = create_offer(&store, req, now).await.unwrap();
        let sent = send_offer(&store, &dispatcher, offer.id, SendOfferRequest::default(), 30, now)
            .await
            .unwrap();
        assert_eq!(sent.tracking.expires_at, Some(now + Duration::days(5)));
    }

    #[tokio::test]
    async fn test_fetch_after_window_expires_offer() {
        let (store, template_id) = seeded_store().await;
        let dispatcher = RecordingDispatcher::default();
        let now = Utc::now();

        let offer = create_offer(&store, request(template_id, jane()), now).await.unwrap();
        send_offer(&store, &dispatcher, offer.id, SendOfferRequest::default(), 7, now)
            .await
            .unwrap();

        let later = get_offer(&store, offer.id, now + Duration::days(10)).await.unwrap();
        assert_eq!(later.status, OfferStatus::Expired);

        let stored = store.fetch_offer(offer.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OfferStatus::Expired);
    }
}
