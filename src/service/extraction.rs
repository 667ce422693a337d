use crate::document::{DocumentExtractor, ExtractionMode, PageImage};
use crate::error::{AppResult, LlmError};
use crate::llm::{truncate, ChatMessage, ChatRequest, ContentPart, ImageUrl, LlmClient};
use crate::models::request::DEFAULT_UNIT;
use crate::models::{CoercedField, DraftOrderLine, ExtractedOffer};
use serde_json::{Map, Value};
use std::sync::Arc;

/// 输出结构约定 (字段名、类型与提取提示)
pub const OFFER_SCHEMA: &str = r#"Required JSON structure:
{
    "vendor_name": "string (the company or person sending the offer, not the recipient. leave blank if unknown)",
    "vat_id": "string (format: DE followed by 9 digits, e.g., DE123456789)",
    "department": "string (the department the offer is addressed to, not the one creating the offer. Leave blank if unknown)",
    "requestor_name": "string (the person the offer is addressed to, e.g. from salutation)",
    "title": "string (the offer title if explicitly stated, otherwise generate a concise descriptive title from the order lines, e.g. 'Adobe Software Licenses' or 'Office Furniture Order')",
    "currency": "string (3-letter currency code like EUR, USD, GBP, CHF - extract from currency symbols € $ £ or explicit mentions)",
    "order_lines": [
        {
            "description": "string",
            "unit_price": number,
            "quantity": number,
            "unit": "string (the unit of measure or quantity)",
            "stated_total_price": number (the total price as stated in the document for this line)
        }
    ],
    "stated_total_cost": number (the total cost of the entire offer as stated in the document)
}

If a field cannot be found, use null for strings/numbers and an empty array for order_lines.
Extract prices as numbers without currency symbols.
For requestor_name: look for salutations, "Attention:", "To:", or similar addressing patterns.
For title: if no explicit offer title exists, create a short meaningful title summarizing the main items being offered.
For currency: default to EUR if not explicitly stated but Euro symbols (€) are used.
"#;

const TEXT_SYSTEM_PROMPT: &str = "You are an expert at extracting structured data from vendor offers.
Extract the following information from the provided text and return it as valid JSON only.
Do not include any explanation, only the JSON object.

";

const VISION_SYSTEM_PROMPT: &str = "You are an expert at extracting structured data from vendor offers.
You receive both the document images AND extracted text (which may be incomplete for scanned documents).
Use BOTH sources to extract accurate information. Treat the images as ground truth for layout-sensitive fields such as tables, totals and addresses.

Extract the following information and return it as valid JSON only.
Do not include any explanation, only the JSON object.

";

const LOG_PREVIEW_CHARS: usize = 500;

/// 纯文本模式请求
pub fn text_request(model: &str, text: &str) -> ChatRequest {
    ChatRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage::system(format!("{}{}", TEXT_SYSTEM_PROMPT, OFFER_SCHEMA)),
            ChatMessage::user(format!("Extract data from this vendor offer:\n\n{}", text)),
        ],
    }
}

/// vision 模式请求: 提取文本作为补充上下文 + 全部页面图像
pub fn vision_request(model: &str, text: &str, pages: &[PageImage]) -> ChatRequest {
    let mut parts = vec![ContentPart::Text {
        text: format!(
            "Extract data from this vendor offer.\n\nExtracted text (may be incomplete):\n{}\n\nDocument images follow:",
            text
        ),
    }];
    parts.extend(pages.iter().map(|page| ContentPart::ImageUrl {
        image_url: ImageUrl { url: page.to_data_url(), detail: "high".to_string() },
    }));

    ChatRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage::system(format!("{}{}", VISION_SYSTEM_PROMPT, OFFER_SCHEMA)),
            ChatMessage::user_parts(parts),
        ],
    }
}

fn text_field(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number_field(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// 单行转换; 缺失的单价/数量/单位补默认值并记录
fn draft_line(obj: &Map<String, Value>) -> DraftOrderLine {
    let mut coerced = Vec::new();

    let unit_price = number_field(obj.get("unit_price")).unwrap_or_else(|| {
        coerced.push(CoercedField::UnitPrice);
        0.0
    });
    // 数量为 0 同样按 1 处理
    let quantity = number_field(obj.get("quantity")).filter(|q| *q != 0.0).unwrap_or_else(|| {
        coerced.push(CoercedField::Quantity);
        1.0
    });
    let unit = text_field(obj.get("unit")).unwrap_or_else(|| {
        coerced.push(CoercedField::Unit);
        DEFAULT_UNIT.to_string()
    });

    DraftOrderLine {
        description: text_field(obj.get("description")).unwrap_or_default(),
        unit_price,
        quantity,
        unit,
        stated_total_price: number_field(obj.get("stated_total_price")),
        coerced,
    }
}

/// 解析模型输出; 不是 JSON 对象时返回 None
pub fn parse_offer(raw: &str) -> Option<ExtractedOffer> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let obj = value.as_object()?;

    let order_lines = obj
        .get("order_lines")
        .and_then(Value::as_array)
        .map(|lines| lines.iter().filter_map(Value::as_object).map(draft_line).collect())
        .unwrap_or_default();

    Some(ExtractedOffer {
        vendor_name: text_field(obj.get("vendor_name")),
        vat_id: text_field(obj.get("vat_id")),
        department: text_field(obj.get("department")),
        requestor_name: text_field(obj.get("requestor_name")),
        title: text_field(obj.get("title")),
        currency: text_field(obj.get("currency")).map(|c| c.to_uppercase()),
        order_lines,
        stated_total_cost: number_field(obj.get("stated_total_cost")),
    })
}

/// 解析失败降级为空结果, 不向调用方报错
pub fn offer_from_response(raw: &str) -> ExtractedOffer {
    parse_offer(raw).unwrap_or_else(|| {
        tracing::warn!("报价提取结果无法解析为 JSON, 返回空结果: {}", truncate(raw, LOG_PREVIEW_CHARS));
        ExtractedOffer::default()
    })
}

/// 报价提取服务
pub struct OfferExtractor {
    llm: Arc<dyn LlmClient>,
    documents: DocumentExtractor,
    text_model: String,
    vision_model: String,
}

impl OfferExtractor {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        documents: DocumentExtractor,
        text_model: impl Into<String>,
        vision_model: impl Into<String>,
    ) -> Self {
        Self {
            llm,
            documents,
            text_model: text_model.into(),
            vision_model: vision_model.into(),
        }
    }

    /// PDF -> 报价草稿; `mode` 覆盖进程级配置
    pub async fn extract_from_pdf(&self, bytes: &[u8], mode: Option<ExtractionMode>) -> AppResult<ExtractedOffer> {
        let (mode, content) = self.documents.prepare(bytes, mode).await?;
        let offer = match mode {
            ExtractionMode::TextOnly => self.extract_from_text(&content.text).await?,
            ExtractionMode::Vision => self.extract_with_pages(&content.text, &content.pages).await?,
        };
        Ok(offer)
    }

    pub async fn extract_from_text(&self, text: &str) -> Result<ExtractedOffer, LlmError> {
        let request = text_request(&self.text_model, text);
        self.complete(&request).await
    }

    pub async fn extract_with_pages(&self, text: &str, pages: &[PageImage]) -> Result<ExtractedOffer, LlmError> {
        tracing::info!(
            "vision 提取: model={}, 页面 {} 张, 文本长度 {} 字符",
            self.vision_model,
            pages.len(),
            text.chars().count()
        );
        let request = vision_request(&self.vision_model, text, pages);
        self.complete(&request).await
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ExtractedOffer, LlmError> {
        for message in &request.messages {
            tracing::debug!("LLM 请求 [{}] {}", message.role, message.preview(LOG_PREVIEW_CHARS));
        }
        let raw = self.llm.complete_json(request).await.map_err(|e| {
            tracing::error!("报价提取调用失败: {}", e);
            e
        })?;
        tracing::debug!("LLM 响应: {}", truncate(&raw, LOG_PREVIEW_CHARS));

        let offer = offer_from_response(&raw);
        tracing::info!("报价提取完成: {} 条订单行", offer.order_lines.len());
        Ok(offer)
    }
}
