pub mod openai;

pub use openai::OpenAiClient;

use crate::error::LlmError;
use async_trait::async_trait;
use serde::Serialize;

/// 多模态消息片段 (OpenAI chat 格式)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageUrl {
    pub url: String,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: MessageContent::Text(text.into()) }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: MessageContent::Text(text.into()) }
    }

    pub fn user_parts(parts: Vec<ContentPart>) -> Self {
        Self { role: "user".to_string(), content: MessageContent::Parts(parts) }
    }

    /// 日志用摘要: 文本截断, 图片只计数
    pub fn preview(&self, max_chars: usize) -> String {
        match &self.content {
            MessageContent::Text(text) => truncate(text, max_chars),
            MessageContent::Parts(parts) => {
                let images = parts.iter().filter(|p| matches!(p, ContentPart::ImageUrl { .. })).count();
                let text = parts
                    .iter()
                    .filter_map(|p| match p {
                        ContentPart::Text { text } => Some(text.as_str()),
                        ContentPart::ImageUrl { .. } => None,
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                format!("{} [+{} images]", truncate(&text, max_chars), images)
            }
        }
    }
}

pub(crate) fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}

/// 一次 JSON 模式的对话请求
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

/// LLM 调用能力, 由调用方构造后注入服务
///
/// 返回模型输出的原始文本; 响应必须被约束为单个 JSON 对象。
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete_json(&self, request: &ChatRequest) -> Result<String, LlmError>;
}
