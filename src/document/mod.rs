pub mod render;
pub mod text;

pub use render::{PageImage, PageRenderer, PdfiumRenderer};
pub use text::extract_text;

use crate::error::DocumentError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 提取模式: 纯文本, 或文本+页面图像
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    TextOnly,
    Vision,
}

impl ExtractionMode {
    pub fn from_flag(use_vision: bool) -> Self {
        if use_vision {
            Self::Vision
        } else {
            Self::TextOnly
        }
    }
}

/// 文档内容: 文本总是提取, 图像仅 vision 模式
#[derive(Debug, Clone, Default)]
pub struct DocumentContent {
    pub text: String,
    pub pages: Vec<PageImage>,
}

/// PDF -> 文本/图像
#[derive(Clone)]
pub struct DocumentExtractor {
    renderer: Option<Arc<dyn PageRenderer>>,
    default_mode: ExtractionMode,
}

impl DocumentExtractor {
    pub fn new(renderer: Option<Arc<dyn PageRenderer>>, default_mode: ExtractionMode) -> Self {
        Self { renderer, default_mode }
    }

    pub fn default_mode(&self) -> ExtractionMode {
        self.default_mode
    }

    /// 按模式提取; `mode` 为 None 时使用进程级默认值
    pub async fn prepare(
        &self,
        bytes: &[u8],
        mode: Option<ExtractionMode>,
    ) -> Result<(ExtractionMode, DocumentContent), DocumentError> {
        let mode = mode.unwrap_or(self.default_mode);
        let owned = bytes.to_vec();

        // vision 模式下渲染器缺失直接失败, 不做静默降级
        let renderer = match mode {
            ExtractionMode::TextOnly => None,
            ExtractionMode::Vision => Some(self.renderer.clone().ok_or_else(|| {
                DocumentError::RendererUnavailable(
                    "vision mode requires the pdfium library; use text-only mode instead".to_string(),
                )
            })?),
        };

        let text = run_blocking(owned.clone(), |b| extract_text(&b)).await?;

        let pages = match renderer {
            Some(renderer) => run_blocking(owned, move |b| renderer.render_pages(&b)).await?,
            None => Vec::new(),
        };

        tracing::info!(
            "文档预处理完成: mode={:?}, 文本长度 {} 字符, 页面图像 {} 张",
            mode,
            text.chars().count(),
            pages.len()
        );
        Ok((mode, DocumentContent { text, pages }))
    }
}

async fn run_blocking<T, F>(bytes: Vec<u8>, f: F) -> Result<T, DocumentError>
where
    T: Send + 'static,
    F: FnOnce(Vec<u8>) -> Result<T, DocumentError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || f(bytes)).await?
}
