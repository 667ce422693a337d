use crate::error::DocumentError;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::{DynamicImage, ImageFormat, RgbaImage};
use pdfium_render::prelude::*;
use std::io::Cursor;

/// 渲染后的单页 PNG
#[derive(Debug, Clone, PartialEq)]
pub struct PageImage {
    pub page_number: usize,
    pub png: Vec<u8>,
}

impl PageImage {
    /// 供多模态消息使用的 data URL
    pub fn to_data_url(&self) -> String {
        format!("data:image/png;base64,{}", BASE64.encode(&self.png))
    }
}

/// 页面渲染能力
pub trait PageRenderer: Send + Sync {
    fn render_pages(&self, bytes: &[u8]) -> Result<Vec<PageImage>, DocumentError>;
}

/// 基于 pdfium 的渲染器
///
/// 每次渲染时重新绑定动态库, 渲染器本身只保存配置。
#[derive(Debug, Clone)]
pub struct PdfiumRenderer {
    library_path: Option<String>,
    dpi: f32,
}

impl PdfiumRenderer {
    /// 绑定一次 pdfium 以确认动态库存在; 缺失即返回 `RendererUnavailable`
    pub fn probe(library_path: Option<String>, dpi: f32) -> Result<Self, DocumentError> {
        let renderer = Self { library_path, dpi };
        renderer.bind()?;
        Ok(renderer)
    }

    fn bind(&self) -> Result<Pdfium, DocumentError> {
        let bindings = match &self.library_path {
            Some(path) => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(path)),
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| DocumentError::RendererUnavailable(e.to_string()))?;
        Ok(Pdfium::new(bindings))
    }
}

impl PageRenderer for PdfiumRenderer {
    fn render_pages(&self, bytes: &[u8]) -> Result<Vec<PageImage>, DocumentError> {
        let pdfium = self.bind()?;
        let document = pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| DocumentError::InvalidPdf(e.to_string()))?;

        // PDF 坐标为 72 点/英寸
        let config = PdfRenderConfig::new().scale_page_by_factor(self.dpi / 72.0);

        let mut images = Vec::new();
        for (idx, page) in document.pages().iter().enumerate() {
            let page_number = idx + 1;
            let bitmap = page
                .render_with_config(&config)
                .map_err(|e| DocumentError::Render { page: page_number, reason: e.to_string() })?;

            let width = bitmap.width() as u32;
            let height = bitmap.height() as u32;
            let rgba = RgbaImage::from_raw(width, height, bitmap.as_rgba_bytes()).ok_or_else(|| {
                DocumentError::Render {
                    page: page_number,
                    reason: "bitmap size does not match its dimensions".to_string(),
                }
            })?;

            let mut png = Vec::new();
            DynamicImage::ImageRgba8(rgba).write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
            images.push(PageImage { page_number, png });
        }

        Ok(images)
    }
}
