use super::AppState;
use crate::document::ExtractionMode;
use crate::error::AppError;
use crate::models::commodity::groups_by_category;
use crate::models::status::SYSTEM_ACTOR;
use crate::models::{
    ClassificationResult, CommodityGroup, ExtractedOffer, NewRequest, ProcurementRequest, RequestFilter,
    RequestStatus, RequestUpdate, SourceDocument, COMMODITY_GROUPS,
};
use crate::service::export::write_requests_csv;
use crate::service::{ClassificationInput, IntakeDraft};
use crate::validation::{validate_new_request, validate_update};
use axum::{
    body::Bytes,
    extract::{Json, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 错误响应体
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        use crate::error::DocumentError;

        let status = match &self {
            AppError::NotFound(_) | AppError::DocumentNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Document(DocumentError::InvalidPdf(_)) => StatusCode::BAD_REQUEST,
            AppError::Document(DocumentError::RendererUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Document(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Llm(_) => StatusCode::BAD_GATEWAY,
            AppError::Store(_) | AppError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!("请求处理失败: {}", self);
        }

        let errors = match &self {
            AppError::Validation(errors) => errors.clone(),
            _ => Vec::new(),
        };
        let body = ErrorResponse { success: false, message: self.to_string(), errors };
        (status, Json(body)).into_response()
    }
}

fn reject_invalid(errors: Vec<String>) -> Result<(), AppError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

/// 上传内容必须非空且为 PDF
fn check_pdf_upload(body: &[u8]) -> Result<(), AppError> {
    if body.is_empty() {
        return Err(AppError::BadRequest("Empty file".to_string()));
    }
    if !body.starts_with(b"%PDF") {
        return Err(AppError::BadRequest("Only PDF files are accepted".to_string()));
    }
    Ok(())
}

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

pub async fn api_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// 列表查询参数 (空字符串视为未提供)
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub search: Option<String>,
}

impl ListQuery {
    fn into_filter(self) -> Result<RequestFilter, AppError> {
        let status = match self.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => Some(
                RequestStatus::from_str(s).map_err(|_| AppError::BadRequest(format!("Unknown status '{}'", s)))?,
            ),
            None => None,
        };
        Ok(RequestFilter { status, search: self.search })
    }
}

pub async fn list_requests(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ProcurementRequest>>, AppError> {
    let filter = query.into_filter()?;
    Ok(Json(state.requests.list(&filter).await?))
}

/// 导出 CSV
pub async fn export_requests(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Response, AppError> {
    let filter = query.into_filter()?;
    let requests = state.requests.list(&filter).await?;

    let mut buf = Vec::new();
    write_requests_csv(&requests, &mut buf)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"requests.csv\""),
        ],
        buf,
    )
        .into_response())
}

pub async fn get_request(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ProcurementRequest>, AppError> {
    Ok(Json(state.requests.get(id).await?))
}

/// 创建申请: 先校验, 所有错误一并返回
pub async fn create_request(
    State(state): State<AppState>,
    Json(payload): Json<NewRequest>,
) -> Result<(StatusCode, Json<ProcurementRequest>), AppError> {
    reject_invalid(validate_new_request(&payload))?;
    let created = state.requests.create(payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_request(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<RequestUpdate>,
) -> Result<Json<ProcurementRequest>, AppError> {
    reject_invalid(validate_update(&payload))?;
    Ok(Json(state.requests.update(id, payload).await?))
}

fn default_actor() -> String {
    SYSTEM_ACTOR.to_string()
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: RequestStatus,
    #[serde(default = "default_actor")]
    pub changed_by: String,
}

pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<StatusUpdateRequest>,
) -> Result<Json<ProcurementRequest>, AppError> {
    let actor = if payload.changed_by.trim().is_empty() { default_actor() } else { payload.changed_by };
    Ok(Json(state.requests.change_status(id, payload.status, &actor).await?))
}

pub async fn delete_request(State(state): State<AppState>, Path(id): Path<i64>) -> Result<StatusCode, AppError> {
    state.requests.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub filename: Option<String>,
}

/// 上传附件 (请求体为 PDF 原始字节)
pub async fn upload_pdf(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> Result<Json<ProcurementRequest>, AppError> {
    check_pdf_upload(&body)?;
    let filename = query
        .filename
        .filter(|f| !f.trim().is_empty())
        .unwrap_or_else(|| format!("{}.pdf", id));
    let document = SourceDocument { filename, data: body.to_vec() };
    Ok(Json(state.requests.attach_document(id, document).await?))
}

pub async fn get_pdf(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Response, AppError> {
    let document = state.requests.document(id).await?;
    let disposition = format!("inline; filename=\"{}\"", document.filename.replace('"', ""));
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document.data,
    )
        .into_response())
}

pub async fn delete_pdf(State(state): State<AppState>, Path(id): Path<i64>) -> Result<StatusCode, AppError> {
    state.requests.detach_document(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct ExtractionQuery {
    /// 覆盖进程级 vision 配置
    pub vision: Option<bool>,
}

pub async fn extract_pdf(
    State(state): State<AppState>,
    Query(query): Query<ExtractionQuery>,
    body: Bytes,
) -> Result<Json<ExtractedOffer>, AppError> {
    check_pdf_upload(&body)?;
    let mode = query.vision.map(ExtractionMode::from_flag);
    Ok(Json(state.extractor.extract_from_pdf(&body, mode).await?))
}

pub async fn draft_from_pdf(
    State(state): State<AppState>,
    Query(query): Query<ExtractionQuery>,
    body: Bytes,
) -> Result<Json<IntakeDraft>, AppError> {
    check_pdf_upload(&body)?;
    let mode = query.vision.map(ExtractionMode::from_flag);
    Ok(Json(state.intake.draft(&body, mode).await?))
}

#[derive(Debug, Deserialize)]
pub struct LineDescription {
    #[serde(default)]
    pub description: String,
}

/// 分类请求体
#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub order_lines: Vec<LineDescription>,
    #[serde(default)]
    pub vendor_name: String,
    #[serde(default)]
    pub department: String,
}

pub async fn classify_commodity(
    State(state): State<AppState>,
    Json(payload): Json<ClassifyRequest>,
) -> Result<Json<ClassificationResult>, AppError> {
    let input = ClassificationInput {
        title: payload.title,
        vendor_name: payload.vendor_name,
        department: payload.department,
        line_descriptions: payload.order_lines.into_iter().map(|l| l.description).collect(),
    };
    Ok(Json(state.classifier.classify(&input).await?))
}

#[derive(Debug, Deserialize)]
pub struct DescriptionRequest {
    pub description: String,
}

/// 只按一段描述文本分类
pub async fn classify_description(
    State(state): State<AppState>,
    Json(payload): Json<DescriptionRequest>,
) -> Result<Json<ClassificationResult>, AppError> {
    let input = ClassificationInput { title: payload.description, ..Default::default() };
    Ok(Json(state.classifier.classify(&input).await?))
}

pub async fn list_commodity_groups() -> Json<&'static [CommodityGroup]> {
    Json(&COMMODITY_GROUPS[..])
}

pub async fn list_commodity_categories() -> impl IntoResponse {
    Json(groups_by_category())
}
