use std::sync::Arc;

use crate::config::Config;
use crate::offers::dispatch::OfferDispatcher;
use crate::store::OfferStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Template, company and offer documents. Postgres in production.
    pub store: Arc<dyn OfferStore>,
    /// Publishes sent offers to the PDF/email workers (S3 + Redis queue).
    pub dispatcher: Arc<dyn OfferDispatcher>,
    pub config: Config,
}
