use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Html,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::offer::GeneratedOffer;
use crate::offers::service::{
    self, GenerateOfferRequest, RespondRequest, SendOfferRequest, WithdrawRequest,
};
use crate::state::AppState;

/// POST /api/v1/offers
pub async fn handle_generate_offer(
    State(state): State<AppState>,
    Json(req): Json<GenerateOfferRequest>,
) -> Result<(StatusCode, Json<GeneratedOffer>), AppError> {
    let offer = service::create_offer(state.store.as_ref(), req, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(offer)))
}

/// GET /api/v1/offers/:id
pub async fn handle_get_offer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GeneratedOffer>, AppError> {
    Ok(Json(service::get_offer(state.store.as_ref(), id, Utc::now()).await?))
}

/// GET /api/v1/offers/:id/html
/// The rendered letter as a standalone page, for the PDF worker and previews.
pub async fn handle_offer_html(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Html<String>, AppError> {
    let offer = service::get_offer(state.store.as_ref(), id, Utc::now()).await?;
    Ok(Html(offer.rendered_content.html))
}

/// POST /api/v1/offers/:id/send
pub async fn handle_send_offer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SendOfferRequest>,
) -> Result<Json<GeneratedOffer>, AppError> {
    let offer = service::send_offer(
        state.store.as_ref(),
        state.dispatcher.as_ref(),
        id,
        req,
        state.config.offer_validity_days,
        Utc::now(),
    )
    .await?;
    Ok(Json(offer))
}

/// POST /api/v1/offers/:id/view
pub async fn handle_record_view(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GeneratedOffer>, AppError> {
    Ok(Json(
        service::record_offer_view(state.store.as_ref(), id, Utc::now()).await?,
    ))
}

/// POST /api/v1/offers/:id/respond
pub async fn handle_respond(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<RespondRequest>,
) -> Result<Json<GeneratedOffer>, AppError> {
    Ok(Json(
        service::respond_to_offer(state.store.as_ref(), id, req, Utc::now()).await?,
    ))
}

/// POST /api/v1/offers/:id/withdraw
pub async fn handle_withdraw(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<WithdrawRequest>,
) -> Result<Json<GeneratedOffer>, AppError> {
    Ok(Json(
        service::withdraw_offer(state.store.as_ref(), id, req, Utc::now()).await?,
    ))
}
