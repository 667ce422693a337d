use crate::error::DocumentError;
use lopdf::Document;

/// 逐页提取文本并按页序拼接
///
/// 只设了所有者密码的文档 (用户密码为空) 先用空密码解密。
/// 单页提取失败时该页贡献空字符串, 只有文档本身无法解析时才返回错误。
pub fn extract_text(bytes: &[u8]) -> Result<String, DocumentError> {
    let mut doc = Document::load_mem(bytes).map_err(|e| DocumentError::InvalidPdf(e.to_string()))?;

    if doc.is_encrypted() {
        if let Err(e) = doc.decrypt("") {
            tracing::debug!("文档已加密且空密码无法解密: {}", e);
        }
    }

    let mut text = String::new();
    for (page_number, _) in doc.get_pages() {
        match doc.extract_text(&[page_number]) {
            Ok(page_text) => text.push_str(&page_text),
            Err(e) => {
                tracing::debug!("第 {} 页无可提取文本: {}", page_number, e);
            }
        }
    }
    Ok(text)
}
