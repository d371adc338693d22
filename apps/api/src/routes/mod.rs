pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::offers::handlers as offers;
use crate::state::AppState;
use crate::templates::handlers as templates;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Templates
        .route("/api/v1/templates", post(templates::handle_create_template))
        .route(
            "/api/v1/templates/:id",
            get(templates::handle_get_template).put(templates::handle_update_template),
        )
        .route(
            "/api/v1/templates/:id/history",
            get(templates::handle_template_history),
        )
        .route(
            "/api/v1/templates/:id/versions/:version/restore",
            post(templates::handle_restore_version),
        )
        .route(
            "/api/v1/templates/:id/validate",
            get(templates::handle_validate_template),
        )
        .route(
            "/api/v1/templates/:id/preview",
            post(templates::handle_preview_template),
        )
        // Companies & salary
        .route(
            "/api/v1/companies/:id",
            get(templates::handle_get_company).put(templates::handle_upsert_company),
        )
        .route(
            "/api/v1/salary/calculate",
            post(templates::handle_calculate_salary),
        )
        // Offers
        .route("/api/v1/offers", post(offers::handle_generate_offer))
        .route("/api/v1/offers/:id", get(offers::handle_get_offer))
        .route("/api/v1/offers/:id/html", get(offers::handle_offer_html))
        .route("/api/v1/offers/:id/send", post(offers::handle_send_offer))
        .route("/api/v1/offers/:id/view", post(offers::handle_record_view))
        .route("/api/v1/offers/:id/respond", post(offers::handle_respond))
        .route("/api/v1/offers/:id/withdraw", post(offers::handle_withdraw))
        .with_state(state)
}
