use crate::models::commodity::is_known_group;
use crate::models::{NewRequest, OrderLineInput, RequestUpdate};
use once_cell::sync::Lazy;
use regex::Regex;

/// 德国增值税号: "DE" + 9 位数字
static VAT_ID_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^DE[0-9]{9}$").expect("valid regex"));

pub fn is_valid_vat_id(vat_id: &str) -> bool {
    VAT_ID_PATTERN.is_match(vat_id)
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn check_required(errors: &mut Vec<String>, value: &str, message: &str) {
    if blank(value) {
        errors.push(message.to_string());
    }
}

fn check_vat_id(errors: &mut Vec<String>, vat_id: &str) {
    if blank(vat_id) {
        errors.push("VAT ID is required".to_string());
    } else if !is_valid_vat_id(vat_id) {
        errors.push("VAT ID must be in format DE followed by 9 digits (e.g., DE123456789)".to_string());
    }
}

fn check_order_lines(errors: &mut Vec<String>, lines: &[OrderLineInput]) {
    if !lines.iter().any(OrderLineInput::is_complete) {
        errors.push("At least one complete order line is required".to_string());
    }
    for (idx, line) in lines.iter().enumerate() {
        if line.is_complete() && line.quantity <= 0.0 {
            errors.push(format!("Order line {} must have a quantity greater than zero", idx + 1));
        }
    }
}

fn check_commodity_group(errors: &mut Vec<String>, id: Option<&str>) {
    match id.map(str::trim).filter(|s| !s.is_empty()) {
        None => errors.push("Commodity group must be classified or selected".to_string()),
        Some(id) if !is_known_group(id) => errors.push(format!("Unknown commodity group '{}'", id)),
        Some(_) => {}
    }
}

/// 校验提交的申请, 返回所有违反的规则 (不在第一条处中断)
pub fn validate_new_request(request: &NewRequest) -> Vec<String> {
    let mut errors = Vec::new();
    check_required(&mut errors, &request.requestor_name, "Requestor name is required");
    check_required(&mut errors, &request.title, "Title is required");
    check_required(&mut errors, &request.vendor_name, "Vendor name is required");
    check_vat_id(&mut errors, &request.vat_id);
    check_required(&mut errors, &request.department, "Department is required");
    check_order_lines(&mut errors, &request.order_lines);
    check_commodity_group(&mut errors, request.commodity_group_id.as_deref());
    errors
}

/// 只校验更新中提供的字段
pub fn validate_update(update: &RequestUpdate) -> Vec<String> {
    let mut errors = Vec::new();
    if let Some(v) = &update.requestor_name {
        check_required(&mut errors, v, "Requestor name is required");
    }
    if let Some(v) = &update.title {
        check_required(&mut errors, v, "Title is required");
    }
    if let Some(v) = &update.vendor_name {
        check_required(&mut errors, v, "Vendor name is required");
    }
    if let Some(v) = &update.vat_id {
        check_vat_id(&mut errors, v);
    }
    if let Some(v) = &update.department {
        check_required(&mut errors, v, "Department is required");
    }
    if let Some(lines) = &update.order_lines {
        check_order_lines(&mut errors, lines);
    }
    if let Some(id) = &update.commodity_group_id {
        check_commodity_group(&mut errors, Some(id));
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn valid_request() -> NewRequest {
        NewRequest {
            requestor_name: "Max Mustermann".to_string(),
            title: "Adobe Creative Cloud".to_string(),
            vendor_name: "Adobe Systems".to_string(),
            vat_id: "DE123456789".to_string(),
            department: "Marketing".to_string(),
            commodity_group_id: Some("031".to_string()),
            currency: "EUR".to_string(),
            stated_total_cost: Some(1000.0),
            order_lines: vec![OrderLineInput {
                description: "Creative Cloud license".to_string(),
                unit_price: 500.0,
                quantity: 2.0,
                unit: "licenses".to_string(),
                stated_total_price: Some(1000.0),
            }],
        }
    }

    #[test_case("DE123456789" ; "valid")]
    #[test_case("DE000000000" ; "all zeros")]
    fn accepts_german_vat_ids(vat_id: &str) {
        assert!(is_valid_vat_id(vat_id));
    }

    #[test_case("AT123456789" ; "wrong prefix")]
    #[test_case("DE12345678" ; "too short")]
    #[test_case("DE1234567890" ; "too long")]
    #[test_case("DE12345678A" ; "letters")]
    #[test_case("de123456789" ; "lowercase")]
    #[test_case("" ; "empty")]
    fn rejects_malformed_vat_ids(vat_id: &str) {
        assert!(!is_valid_vat_id(vat_id));
    }

    #[test]
    fn valid_request_passes() {
        assert!(validate_new_request(&valid_request()).is_empty());
    }

    #[test]
    fn reports_every_violation_together() {
        let request = NewRequest {
            requestor_name: String::new(),
            title: " ".to_string(),
            vendor_name: String::new(),
            vat_id: "AT123456789".to_string(),
            department: String::new(),
            commodity_group_id: None,
            currency: "EUR".to_string(),
            stated_total_cost: None,
            order_lines: vec![],
        };
        let errors = validate_new_request(&request);
        assert_eq!(
            errors,
            vec![
                "Requestor name is required",
                "Title is required",
                "Vendor name is required",
                "VAT ID must be in format DE followed by 9 digits (e.g., DE123456789)",
                "Department is required",
                "At least one complete order line is required",
                "Commodity group must be classified or selected",
            ]
        );
    }

    #[test]
    fn unknown_commodity_group_rejected() {
        let mut request = valid_request();
        request.commodity_group_id = Some("999".to_string());
        assert_eq!(validate_new_request(&request), vec!["Unknown commodity group '999'"]);
    }

    #[test]
    fn update_checks_only_supplied_fields() {
        assert!(validate_update(&RequestUpdate::default()).is_empty());

        let update = RequestUpdate {
            vat_id: Some("DE12345678".to_string()),
            order_lines: Some(vec![]),
            ..Default::default()
        };
        assert_eq!(validate_update(&update).len(), 2);
    }
}
