pub mod handlers;

pub use handlers::*;

use crate::service::{CommodityClassifier, OfferExtractor, OfferIntake, RequestService};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;

/// PDF 上传上限
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// 共享状态
#[derive(Clone)]
pub struct AppState {
    pub requests: Arc<RequestService>,
    pub extractor: Arc<OfferExtractor>,
    pub classifier: Arc<CommodityClassifier>,
    pub intake: Arc<OfferIntake>,
}

pub fn router(state: AppState) -> Router {
    let request_routes = Router::new()
        .route("/api/requests", get(list_requests).post(create_request))
        .route("/api/requests/export", get(export_requests))
        .route(
            "/api/requests/:id",
            get(get_request).put(update_request).delete(delete_request),
        )
        .route("/api/requests/:id/status", patch(update_status))
        .route("/api/requests/:id/pdf", get(get_pdf).post(upload_pdf).delete(delete_pdf));

    let extraction_routes = Router::new()
        .route("/api/extraction/pdf", post(extract_pdf))
        .route("/api/extraction/draft", post(draft_from_pdf))
        .route("/api/extraction/classify-commodity", post(classify_commodity));

    let commodity_routes = Router::new()
        .route("/api/commodity-groups", get(list_commodity_groups))
        .route("/api/commodity-groups/categories", get(list_commodity_categories))
        .route("/api/commodity-groups/classify", post(classify_description));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/health", get(api_health))
        .merge(request_routes)
        .merge(extraction_routes)
        .merge(commodity_routes)
        .layer(ServiceBuilder::new().layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)))
        .with_state(state)
}
