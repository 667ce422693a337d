use super::classification::{ClassificationInput, CommodityClassifier};
use super::extraction::OfferExtractor;
use crate::document::ExtractionMode;
use crate::error::AppResult;
use crate::models::{ClassificationResult, ExtractedOffer, NewRequest};
use serde::Serialize;
use std::sync::Arc;

/// 报价导入结果: 提取草稿 + 分类结论 + 合并后的创建载荷
#[derive(Debug, Clone, Serialize)]
pub struct IntakeDraft {
    pub offer: ExtractedOffer,
    pub classification: Option<ClassificationResult>,
    pub request: NewRequest,
}

/// 上传报价 -> 提取 -> (可选) 分类 -> 申请草稿
pub struct OfferIntake {
    extractor: Arc<OfferExtractor>,
    classifier: Arc<CommodityClassifier>,
}

impl OfferIntake {
    pub fn new(extractor: Arc<OfferExtractor>, classifier: Arc<CommodityClassifier>) -> Self {
        Self { extractor, classifier }
    }

    pub async fn draft(&self, bytes: &[u8], mode: Option<ExtractionMode>) -> AppResult<IntakeDraft> {
        let offer = self.extractor.extract_from_pdf(bytes, mode).await?;
        let mut request = NewRequest::from_offer(&offer);

        let input = ClassificationInput::from_offer(&offer);
        let classification = if input.has_content() {
            let verdict = self.classifier.classify(&input).await?;
            request.commodity_group_id = Some(verdict.commodity_group_id.clone());
            Some(verdict)
        } else {
            tracing::info!("提取结果无标题与订单行描述, 跳过分类");
            None
        };

        Ok(IntakeDraft { offer, classification, request })
    }
}
