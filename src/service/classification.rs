use crate::error::LlmError;
use crate::llm::{truncate, ChatMessage, ChatRequest, LlmClient};
use crate::models::commodity::{groups_for_prompt, is_known_group};
use crate::models::{ClassificationResult, ExtractedOffer, MISCELLANEOUS_GROUP_ID};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

/// 分类输入
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ClassificationInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub vendor_name: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub line_descriptions: Vec<String>,
}

impl ClassificationInput {
    pub fn from_offer(offer: &ExtractedOffer) -> Self {
        Self {
            title: offer.title.clone().unwrap_or_default(),
            vendor_name: offer.vendor_name.clone().unwrap_or_default(),
            department: offer.department.clone().unwrap_or_default(),
            line_descriptions: offer.order_lines.iter().map(|l| l.description.clone()).collect(),
        }
    }

    /// 只有标题或任一行描述非空时才值得分类
    pub fn has_content(&self) -> bool {
        !self.title.trim().is_empty() || self.line_descriptions.iter().any(|d| !d.trim().is_empty())
    }
}

/// 解析失败时的保留结论
pub fn fallback_verdict(rationale: impl Into<String>) -> ClassificationResult {
    ClassificationResult {
        commodity_group_id: MISCELLANEOUS_GROUP_ID.to_string(),
        confidence: 0.0,
        rationale: rationale.into(),
    }
}

pub fn classification_request(model: &str, input: &ClassificationInput) -> ChatRequest {
    let system = format!(
        r#"You are an expert at classifying procurement requests into commodity groups.
Based on the provided information, select the most appropriate commodity group from this list:

{}

Return your response as valid JSON only with this structure:
{{
    "commodity_group_id": "string (the 3-digit ID like 001, 031, etc.; must be one of the IDs above)",
    "confidence": number (0.0 to 1.0),
    "rationale": "string (brief explanation)"
}}
"#,
        groups_for_prompt()
    );

    let lines = input
        .line_descriptions
        .iter()
        .map(|d| format!("- {}", d))
        .collect::<Vec<_>>()
        .join("\n");
    let user = format!(
        "Classify this procurement request:\nTitle: {}\nVendor: {}\nDepartment: {}\nOrder Lines:\n{}\n",
        input.title, input.vendor_name, input.department, lines
    );

    ChatRequest {
        model: model.to_string(),
        messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
    }
}

/// 解析模型结论
///
/// 非 JSON 对象返回 "分类失败" 保留结论; ID 缺失或不在商品组表中同样回退到保留ID。
pub fn parse_verdict(raw: &str) -> ClassificationResult {
    let Some(obj) = serde_json::from_str::<Value>(raw).ok().and_then(|v| v.as_object().cloned()) else {
        tracing::warn!("分类结果无法解析为 JSON: {}", truncate(raw, 200));
        return fallback_verdict("Classification failed");
    };

    let id = match obj.get("commodity_group_id") {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(f) if f >= 0.0 && f.fract() == 0.0 => format!("{:03}", f as u64),
            _ => n.to_string(),
        },
        _ => String::new(),
    };
    if !is_known_group(&id) {
        tracing::warn!("模型返回未知商品组 '{}', 使用保留ID {}", id, MISCELLANEOUS_GROUP_ID);
        return fallback_verdict(format!("Classification failed: unknown commodity group '{}'", id));
    }

    let confidence = obj.get("confidence").and_then(Value::as_f64).unwrap_or(0.0).clamp(0.0, 1.0);
    let rationale = obj.get("rationale").and_then(Value::as_str).unwrap_or_default().to_string();

    ClassificationResult { commodity_group_id: id, confidence, rationale }
}

/// 商品组分类服务 (单次调用, 不重试)
pub struct CommodityClassifier {
    llm: Arc<dyn LlmClient>,
    model: String,
}

impl CommodityClassifier {
    pub fn new(llm: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self { llm, model: model.into() }
    }

    pub async fn classify(&self, input: &ClassificationInput) -> Result<ClassificationResult, LlmError> {
        let request = classification_request(&self.model, input);
        tracing::debug!("分类请求: {}", request.messages[1].preview(500));

        let raw = self.llm.complete_json(&request).await.map_err(|e| {
            tracing::error!("商品组分类调用失败: {}", e);
            e
        })?;

        let verdict = parse_verdict(&raw);
        tracing::info!(
            "分类结果: {} (confidence {:.2})",
            verdict.commodity_group_id,
            verdict.confidence
        );
        Ok(verdict)
    }
}
