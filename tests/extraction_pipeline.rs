mod common;

use assert_matches::assert_matches;
use common::{offer_pdf, owner_locked_pdf, ScriptedLlm};
use procuro_rust::document::{extract_text, DocumentExtractor, ExtractionMode, PageImage, PageRenderer};
use procuro_rust::error::{DocumentError, LlmError};
use procuro_rust::llm::{ChatRequest, ContentPart, MessageContent};
use procuro_rust::models::{CoercedField, MISCELLANEOUS_GROUP_ID};
use procuro_rust::service::ClassificationInput;
use procuro_rust::{AppError, CommodityClassifier, OfferExtractor, OfferIntake};
use std::sync::Arc;

struct FakeRenderer;

impl PageRenderer for FakeRenderer {
    fn render_pages(&self, _bytes: &[u8]) -> Result<Vec<PageImage>, DocumentError> {
        Ok(vec![
            PageImage { page_number: 1, png: vec![0x89, b'P', b'N', b'G'] },
            PageImage { page_number: 2, png: vec![0x89, b'P', b'N', b'G'] },
        ])
    }
}

const OFFER_JSON: &str = r#"{
    "vendor_name": "Global Tech Solutions",
    "vat_id": "DE987654321",
    "department": "Marketing",
    "requestor_name": "John Doe",
    "title": "Adobe Creative Cloud",
    "currency": "eur",
    "order_lines": [
        {"description": "Adobe Photoshop License", "unit_price": 150, "quantity": 10, "unit": "licenses", "stated_total_price": 1500},
        {"description": "Onboarding", "unit_price": "200.50", "quantity": 0}
    ],
    "stated_total_cost": 1700.5
}"#;

fn extractor(llm: Arc<ScriptedLlm>, renderer: Option<Arc<dyn PageRenderer>>, mode: ExtractionMode) -> OfferExtractor {
    OfferExtractor::new(llm, DocumentExtractor::new(renderer, mode), "text-model", "vision-model")
}

fn user_text(request: &ChatRequest) -> String {
    match &request.messages[1].content {
        MessageContent::Text(text) => text.clone(),
        MessageContent::Parts(parts) => parts
            .iter()
            .filter_map(|p| match p {
                ContentPart::Text { text } => Some(text.clone()),
                ContentPart::ImageUrl { .. } => None,
            })
            .collect(),
    }
}

#[test]
fn text_is_extracted_from_generated_pdf() {
    let text = extract_text(&offer_pdf("Hello World")).unwrap();
    assert!(text.contains("Hello World"), "extracted: {:?}", text);
}

#[test]
fn owner_locked_pdf_is_read_with_empty_password() {
    let bytes = owner_locked_pdf("Offer No 4711");
    assert!(lopdf::Document::load_mem(&bytes).unwrap().is_encrypted());

    let text = extract_text(&bytes).unwrap();

    assert!(text.contains("Offer No 4711"), "extracted: {:?}", text);
}

#[tokio::test]
async fn owner_locked_pdf_text_reaches_model() {
    let llm = ScriptedLlm::replying(vec![Ok(OFFER_JSON.to_string())]);
    let extractor = extractor(llm.clone(), None, ExtractionMode::TextOnly);

    extractor.extract_from_pdf(&owner_locked_pdf("Angebot 2024-117"), None).await.unwrap();

    assert!(user_text(&llm.requests()[0]).contains("Angebot 2024-117"));
}

#[tokio::test]
async fn text_mode_sends_document_text_to_text_model() {
    let llm = ScriptedLlm::replying(vec![Ok(OFFER_JSON.to_string())]);
    let extractor = extractor(llm.clone(), None, ExtractionMode::TextOnly);

    let offer = extractor.extract_from_pdf(&offer_pdf("Offer No 4711"), None).await.unwrap();

    let requests = llm.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].model, "text-model");
    assert!(user_text(&requests[0]).contains("Offer No 4711"));

    assert_eq!(offer.vendor_name.as_deref(), Some("Global Tech Solutions"));
    assert_eq!(offer.currency.as_deref(), Some("EUR"));
    assert_eq!(offer.stated_total_cost, Some(1700.5));
    assert_eq!(offer.order_lines.len(), 2);

    let onboarding = &offer.order_lines[1];
    assert_eq!(onboarding.unit_price, 200.5);
    assert_eq!(onboarding.quantity, 1.0);
    assert_eq!(onboarding.unit, "pieces");
    assert!(onboarding.is_coerced(CoercedField::Quantity));
    assert!(onboarding.is_coerced(CoercedField::Unit));
    assert!(!offer.order_lines[0].is_coerced(CoercedField::Quantity));
}

#[tokio::test]
async fn unparseable_response_degrades_to_empty_offer() {
    let llm = ScriptedLlm::replying(vec![Ok("Sorry, I cannot help with that.".to_string())]);
    let extractor = extractor(llm, None, ExtractionMode::TextOnly);

    let offer = extractor.extract_from_pdf(&offer_pdf("Offer"), None).await.unwrap();

    assert!(offer.is_empty());
}

#[tokio::test]
async fn vision_mode_attaches_every_page_image() {
    let llm = ScriptedLlm::replying(vec![Ok(OFFER_JSON.to_string())]);
    let renderer: Arc<dyn PageRenderer> = Arc::new(FakeRenderer);
    let extractor = extractor(llm.clone(), Some(renderer), ExtractionMode::Vision);

    extractor.extract_from_pdf(&offer_pdf("Scanned offer"), None).await.unwrap();

    let requests = llm.requests();
    assert_eq!(requests[0].model, "vision-model");
    let MessageContent::Parts(parts) = &requests[0].messages[1].content else {
        panic!("vision request must be multimodal");
    };
    let images: Vec<_> = parts
        .iter()
        .filter_map(|p| match p {
            ContentPart::ImageUrl { image_url } => Some(image_url),
            ContentPart::Text { .. } => None,
        })
        .collect();
    assert_eq!(images.len(), 2);
    assert!(images.iter().all(|i| i.url.starts_with("data:image/png;base64,") && i.detail == "high"));
    assert!(user_text(&requests[0]).contains("Scanned offer"));
}

#[tokio::test]
async fn per_call_mode_overrides_default() {
    let llm = ScriptedLlm::replying(vec![Ok(OFFER_JSON.to_string())]);
    let renderer: Arc<dyn PageRenderer> = Arc::new(FakeRenderer);
    let extractor = extractor(llm.clone(), Some(renderer), ExtractionMode::Vision);

    extractor
        .extract_from_pdf(&offer_pdf("Offer"), Some(ExtractionMode::TextOnly))
        .await
        .unwrap();

    assert_eq!(llm.requests()[0].model, "text-model");
}

#[tokio::test]
async fn upstream_failure_is_propagated() {
    let llm = ScriptedLlm::replying(vec![Err(LlmError::Status { status: 429, body: "rate limited".to_string() })]);
    let extractor = extractor(llm, None, ExtractionMode::TextOnly);

    let result = extractor.extract_from_pdf(&offer_pdf("Offer"), None).await;

    assert_matches!(result, Err(AppError::Llm(LlmError::Status { status: 429, .. })));
}

#[tokio::test]
async fn invalid_pdf_is_rejected_before_calling_model() {
    let llm = ScriptedLlm::replying(vec![]);
    let extractor = extractor(llm.clone(), None, ExtractionMode::TextOnly);

    let result = extractor.extract_from_pdf(b"%PDF-garbage", None).await;

    assert_matches!(result, Err(AppError::Document(DocumentError::InvalidPdf(_))));
    assert!(llm.requests().is_empty());
}

#[tokio::test]
async fn classifier_returns_known_group() {
    let llm = ScriptedLlm::replying(vec![Ok(
        r#"{"commodity_group_id": "031", "confidence": 0.95, "rationale": "Software licenses"}"#.to_string(),
    )]);
    let classifier = CommodityClassifier::new(llm.clone(), "text-model");
    let input = ClassificationInput {
        title: "Adobe Creative Cloud".to_string(),
        vendor_name: "Global Tech Solutions".to_string(),
        department: "Marketing".to_string(),
        line_descriptions: vec!["Adobe Photoshop License".to_string()],
    };

    let verdict = classifier.classify(&input).await.unwrap();

    assert_eq!(verdict.commodity_group_id, "031");
    assert_eq!(verdict.confidence, 0.95);
    assert!(user_text(&llm.requests()[0]).contains("- Adobe Photoshop License"));
}

#[tokio::test]
async fn classifier_falls_back_on_garbage() {
    let llm = ScriptedLlm::replying(vec![Ok("not json".to_string())]);
    let classifier = CommodityClassifier::new(llm, "text-model");

    let verdict = classifier.classify(&ClassificationInput::default()).await.unwrap();

    assert_eq!(verdict.commodity_group_id, MISCELLANEOUS_GROUP_ID);
    assert_eq!(verdict.confidence, 0.0);
    assert_eq!(verdict.rationale, "Classification failed");
}

#[tokio::test]
async fn intake_merges_offer_and_classification() {
    let llm = ScriptedLlm::replying(vec![
        Ok(OFFER_JSON.to_string()),
        Ok(r#"{"commodity_group_id": "031", "confidence": 0.9, "rationale": "Software"}"#.to_string()),
    ]);
    let extractor = Arc::new(extractor(llm.clone(), None, ExtractionMode::TextOnly));
    let classifier = Arc::new(CommodityClassifier::new(llm.clone(), "text-model"));
    let intake = OfferIntake::new(extractor, classifier);

    let draft = intake.draft(&offer_pdf("Offer"), None).await.unwrap();

    assert_eq!(llm.requests().len(), 2);
    assert_eq!(draft.request.commodity_group_id.as_deref(), Some("031"));
    assert_eq!(draft.request.currency, "EUR");
    assert_eq!(draft.request.order_lines.len(), 2);
    assert_eq!(draft.request.order_lines[1].quantity, 1.0);
    assert_eq!(draft.classification.map(|c| c.confidence), Some(0.9));
}

#[tokio::test]
async fn intake_skips_classification_for_empty_offer() {
    let llm = ScriptedLlm::replying(vec![Ok("{}".to_string())]);
    let extractor = Arc::new(extractor(llm.clone(), None, ExtractionMode::TextOnly));
    let classifier = Arc::new(CommodityClassifier::new(llm.clone(), "text-model"));
    let intake = OfferIntake::new(extractor, classifier);

    let draft = intake.draft(&offer_pdf("Offer"), None).await.unwrap();

    assert_eq!(llm.requests().len(), 1);
    assert!(draft.classification.is_none());
    assert_eq!(draft.request.commodity_group_id, None);
}
