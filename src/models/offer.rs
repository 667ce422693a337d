use serde::{Deserialize, Serialize};

/// 被补默认值的订单行字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoercedField {
    UnitPrice,
    Quantity,
    Unit,
}

/// 提取出的草稿订单行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftOrderLine {
    pub description: String,
    pub unit_price: f64,
    pub quantity: f64,
    pub unit: String,
    pub stated_total_price: Option<f64>,
    /// 模型未给出、由默认值填充的字段
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coerced: Vec<CoercedField>,
}

impl DraftOrderLine {
    pub fn is_coerced(&self, field: CoercedField) -> bool {
        self.coerced.contains(&field)
    }
}

/// 报价提取结果 (草稿, 不单独持久化)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedOffer {
    pub vendor_name: Option<String>,
    pub vat_id: Option<String>,
    pub department: Option<String>,
    pub requestor_name: Option<String>,
    pub title: Option<String>,
    pub currency: Option<String>,
    pub order_lines: Vec<DraftOrderLine>,
    pub stated_total_cost: Option<f64>,
}

impl ExtractedOffer {
    /// 是否什么都没提取到
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// 商品组分类结论
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub commodity_group_id: String,
    pub confidence: f64,
    pub rationale: String,
}
