//! Offer lifecycle — status transitions, expiry, and view tracking.
//!
//! ```text
//! draft ──send──▶ sent ──view──▶ viewed
//!   │              │               │
//!   │              ├──────┬────────┤
//!   ▼              ▼      ▼        ▼
//! withdrawn    accepted rejected expired
//! ```
//!
//! Every transition appends to `status_history`. Terminal states never move again.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::models::offer::{GeneratedOffer, OfferStatus, StatusChange};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("Offer cannot move from {from} to {to}")]
    InvalidTransition { from: OfferStatus, to: OfferStatus },

    #[error("Offer expired at {0}")]
    Expired(DateTime<Utc>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateDecision {
    Accept,
    Reject,
}

pub fn can_transition(from: OfferStatus, to: OfferStatus) -> bool {
    use OfferStatus::*;
    if from.is_terminal() {
        return false;
    }
    matches!(
        (from, to),
        (Draft, Sent)
            | (Draft, Withdrawn)
            | (Sent, Viewed)
            | (Sent | Viewed, Accepted | Rejected | Expired | Withdrawn)
    )
}

fn transition(
    offer: &mut GeneratedOffer,
    to: OfferStatus,
    changed_by: Option<&str>,
    note: Option<&str>,
    now: DateTime<Utc>,
) -> Result<(), LifecycleError> {
    if !can_transition(offer.status, to) {
        return Err(LifecycleError::InvalidTransition {
            from: offer.status,
            to,
        });
    }
    info!("Offer {}: {} → {}", offer.id, offer.status, to);
    offer.status = to;
    offer.updated_at = now;
    offer.status_history.push(StatusChange {
        status: to,
        changed_at: now,
        changed_by: changed_by.map(str::to_string),
        note: note.map(str::to_string),
    });
    Ok(())
}

/// Moves a draft to `sent` and starts the validity window.
pub fn mark_sent(
    offer: &mut GeneratedOffer,
    validity_days: i64,
    changed_by: Option<&str>,
    now: DateTime<Utc>,
) -> Result<(), LifecycleError> {
    transition(offer, OfferStatus::Sent, changed_by, None, now)?;
    offer.tracking.sent_at = Some(now);
    offer.tracking.expires_at = Some(now + Duration::days(validity_days.max(1)));
    Ok(())
}

/// Expires a sent/viewed offer whose window has closed. Returns whether it expired now.
pub fn expire_if_due(offer: &mut GeneratedOffer, now: DateTime<Utc>) -> bool {
    let due = matches!(offer.status, OfferStatus::Sent | OfferStatus::Viewed)
        && offer.tracking.expires_at.is_some_and(|at| at <= now);
    if due {
        // Sent/Viewed → Expired is always allowed.
        let _ = transition(offer, OfferStatus::Expired, None, Some("validity window elapsed"), now);
    }
    due
}

/// Counts a candidate view. The first view of a sent offer moves it to `viewed`.
pub fn record_view(offer: &mut GeneratedOffer, now: DateTime<Utc>) -> Result<(), LifecycleError> {
    if offer.status == OfferStatus::Draft {
        return Err(LifecycleError::InvalidTransition {
            from: OfferStatus::Draft,
            to: OfferStatus::Viewed,
        });
    }
    expire_if_due(offer, now);

    offer.tracking.view_count += 1;
    offer.tracking.first_viewed_at.get_or_insert(now);
    offer.tracking.last_viewed_at = Some(now);
    offer.updated_at = now;

    if offer.status == OfferStatus::Sent {
        transition(offer, OfferStatus::Viewed, None, None, now)?;
    }
    Ok(())
}

pub fn respond(
    offer: &mut GeneratedOffer,
    decision: CandidateDecision,
    note: Option<&str>,
    now: DateTime<Utc>,
) -> Result<(), LifecycleError> {
    if expire_if_due(offer, now) || offer.status == OfferStatus::Expired {
        let at = offer.tracking.expires_at.unwrap_or(now);
        return Err(LifecycleError::Expired(at));
    }
    let to = match decision {
        CandidateDecision::Accept => OfferStatus::Accepted,
        CandidateDecision::Reject => OfferStatus::Rejected,
    };
    transition(offer, to, None, note, now)?;
    offer.tracking.responded_at = Some(now);
    Ok(())
}

pub fn withdraw(
    offer: &mut GeneratedOffer,
    changed_by: Option<&str>,
    note: Option<&str>,
    now: DateTime<Utc>,
) -> Result<(), LifecycleError> {
    transition(offer, OfferStatus::Withdrawn, changed_by, note, now)
}
