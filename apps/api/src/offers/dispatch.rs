//! Offer dispatch — hands a sent offer to the external PDF and email workers.
//!
//! Flow: upload rendered HTML to S3 → LPUSH a JSON job onto the Redis dispatch queue.
//! The workers own PDF layout, SMTP and retries; this side only publishes.

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::engine::placeholders::resolve_display;
use crate::errors::AppError;
use crate::models::offer::GeneratedOffer;

/// Job payload consumed by the PDF/email workers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DispatchJob {
    pub offer_id: Uuid,
    pub template_id: Uuid,
    pub template_version: i32,
    pub bucket: String,
    pub html_key: String,
    pub candidate_name: Option<String>,
    pub candidate_email: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub queued_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DispatchReceipt {
    pub html_key: String,
    pub queue: String,
}

/// S3 object key for an offer's rendered HTML.
pub fn html_key(offer: &GeneratedOffer) -> String {
    format!("offers/{}/v{}.html", offer.id, offer.template_version)
}

pub fn build_job(offer: &GeneratedOffer, bucket: &str, now: DateTime<Utc>) -> DispatchJob {
    let candidate = &offer.candidate_data;
    DispatchJob {
        offer_id: offer.id,
        template_id: offer.template_id,
        template_version: offer.template_version,
        bucket: bucket.to_string(),
        html_key: html_key(offer),
        candidate_name: resolve_display(candidate, "candidate_name")
            .or_else(|| resolve_display(candidate, "name")),
        candidate_email: resolve_display(candidate, "candidate_email")
            .or_else(|| resolve_display(candidate, "email")),
        expires_at: offer.tracking.expires_at,
        queued_at: now,
    }
}

/// Carried in `AppState` as `Arc<dyn OfferDispatcher>`.
#[async_trait]
pub trait OfferDispatcher: Send + Sync {
    async fn dispatch(&self, offer: &GeneratedOffer) -> Result<DispatchReceipt, AppError>;
}

pub struct S3RedisDispatcher {
    s3: aws_sdk_s3::Client,
    redis: redis::Client,
    bucket: String,
    queue: String,
}

impl S3RedisDispatcher {
    pub fn new(s3: aws_sdk_s3::Client, redis: redis::Client, bucket: String, queue: String) -> Self {
        Self {
            s3,
            redis,
            bucket,
            queue,
        }
    }
}

#[async_trait]
impl OfferDispatcher for S3RedisDispatcher {
    async fn dispatch(&self, offer: &GeneratedOffer) -> Result<DispatchReceipt, AppError> {
        let job = build_job(offer, &self.bucket, Utc::now());

        self.s3
            .put_object()
            .bucket(&self.bucket)
            .key(&job.html_key)
            .body(ByteStream::from(Bytes::from(
                offer.rendered_content.html.clone(),
            )))
            .content_type("text/html; charset=utf-8")
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("S3 upload failed: {e}")))?;

        info!("Uploaded offer HTML to s3://{}/{}", self.bucket, job.html_key);

        let payload = serde_json::to_string(&job)?;
        let mut conn = self.redis.get_multiplexed_async_connection().await?;
        let depth: i64 = conn.lpush(&self.queue, payload).await?;

        info!(
            "Queued dispatch job for offer {} on '{}' (depth {})",
            offer.id, self.queue, depth
        );

        Ok(DispatchReceipt {
            html_key: job.html_key,
            queue: self.queue.clone(),
        })
    }
}

/// Test double that records every dispatched offer id.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingDispatcher {
    pub dispatched: tokio::sync::Mutex<Vec<Uuid>>,
}

#[cfg(test)]
#[async_trait]
impl OfferDispatcher for RecordingDispatcher {
    async fn dispatch(&self, offer: &GeneratedOffer) -> Result<DispatchReceipt, AppError> {
        self.dispatched.lock().await.push(offer.id);
        Ok(DispatchReceipt {
            html_key: html_key(offer),
            queue: "test".to_string(),
        })
    }
}
