use thiserror::Error;

/// 存储层错误
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

/// PDF 处理错误
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("invalid PDF document: {0}")]
    InvalidPdf(String),

    /// vision 模式需要 pdfium, 缺失时为配置错误
    #[error("page renderer unavailable: {0}")]
    RendererUnavailable(String),

    #[error("failed to render page {page}: {reason}")]
    Render { page: usize, reason: String },

    #[error("failed to encode page image: {0}")]
    Encode(#[from] image::ImageError),

    #[error("document worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// LLM 调用错误 (网络/鉴权/限流等), 不在本地恢复
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM API key is not configured")]
    MissingApiKey,

    #[error("LLM transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("LLM returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("LLM response contained no message content")]
    EmptyResponse,
}

/// 应用层错误
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Request {0} not found")]
    NotFound(i64),

    /// 申请存在但没有附件
    #[error("PDF not found for request {0}")]
    DocumentNotFound(i64),

    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("CSV export failed: {0}")]
    Export(#[from] csv::Error),
}

pub type AppResult<T> = Result<T, AppError>;
