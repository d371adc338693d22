use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::engine::validator::ValidationReport;
use crate::errors::AppError;
use crate::models::company::CompanyPolicy;
use crate::models::template::{Template, VersionEntry};
use crate::state::AppState;
use crate::templates::service::{
    self, CreateTemplateRequest, PreviewResponse, RenderInput, RestoreRequest, SalaryResponse,
    TemplateResponse, UpdateTemplateRequest,
};

/// POST /api/v1/templates
pub async fn handle_create_template(
    State(state): State<AppState>,
    Json(req): Json<CreateTemplateRequest>,
) -> Result<(StatusCode, Json<TemplateResponse>), AppError> {
    let created = service::create_template(
        state.store.as_ref(),
        req,
        state.config.template_max_versions,
        Utc::now(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/v1/templates/:id
pub async fn handle_get_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Template>, AppError> {
    Ok(Json(service::get_template(state.store.as_ref(), id).await?))
}

/// PUT /api/v1/templates/:id
pub async fn handle_update_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTemplateRequest>,
) -> Result<Json<TemplateResponse>, AppError> {
    let updated = service::update_template(state.store.as_ref(), id, req, Utc::now()).await?;
    Ok(Json(updated))
}

/// GET /api/v1/templates/:id/history
pub async fn handle_template_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<VersionEntry>>, AppError> {
    Ok(Json(service::template_history(state.store.as_ref(), id).await?))
}

/// POST /api/v1/templates/:id/versions/:version/restore
pub async fn handle_restore_version(
    State(state): State<AppState>,
    Path((id, version)): Path<(Uuid, i32)>,
    Json(req): Json<RestoreRequest>,
) -> Result<Json<TemplateResponse>, AppError> {
    let restored = service::restore_template_version(
        state.store.as_ref(),
        id,
        version,
        req.changed_by.as_deref(),
        Utc::now(),
    )
    .await?;
    Ok(Json(restored))
}

/// GET /api/v1/templates/:id/validate
pub async fn handle_validate_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ValidationReport>, AppError> {
    Ok(Json(service::validate_template(state.store.as_ref(), id).await?))
}

/// POST /api/v1/templates/:id/preview
pub async fn handle_preview_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<RenderInput>,
) -> Result<Json<PreviewResponse>, AppError> {
    Ok(Json(service::preview_template(state.store.as_ref(), id, input).await?))
}

/// POST /api/v1/salary/calculate
pub async fn handle_calculate_salary(
    State(state): State<AppState>,
    Json(input): Json<RenderInput>,
) -> Result<Json<SalaryResponse>, AppError> {
    Ok(Json(service::calculate_salary(state.store.as_ref(), input).await?))
}

/// PUT /api/v1/companies/:id
pub async fn handle_upsert_company(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(mut policy): Json<CompanyPolicy>,
) -> Result<Json<CompanyPolicy>, AppError> {
    policy.company_id = Some(id);
    state.store.upsert_company(id, &policy).await?;
    Ok(Json(policy))
}

/// GET /api/v1/companies/:id
pub async fn handle_get_company(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CompanyPolicy>, AppError> {
    let policy = state
        .store
        .fetch_company(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Company {id} not found")))?;
    Ok(Json(policy))
}
