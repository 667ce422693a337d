use crate::models::commodity::group_display;
use crate::models::ProcurementRequest;
use std::io::Write;

const HEADER: [&str; 12] = [
    "id",
    "title",
    "vendor_name",
    "requestor_name",
    "department",
    "commodity_group",
    "currency",
    "status",
    "calculated_total_cost",
    "stated_total_cost",
    "has_total_mismatch",
    "created_at",
];

fn option_to_csv(val: Option<f64>) -> String {
    val.map(|v| v.to_string()).unwrap_or_default()
}

/// 导出申请概览到 CSV
pub fn write_requests_csv<W: Write>(requests: &[ProcurementRequest], out: W) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(HEADER)?;

    for r in requests {
        writer.write_record(&[
            r.id.to_string(),
            r.title.clone(),
            r.vendor_name.clone(),
            r.requestor_name.clone(),
            r.department.clone(),
            r.commodity_group_id.as_deref().map(group_display).unwrap_or_default(),
            r.currency.clone(),
            r.status.to_string(),
            r.calculated_total_cost().to_string(),
            option_to_csv(r.stated_total_cost),
            r.has_total_mismatch().to_string(),
            r.created_at.to_rfc3339(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
