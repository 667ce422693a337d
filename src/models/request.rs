use crate::models::offer::ExtractedOffer;
use crate::models::status::{RequestStatus, StatusHistoryEntry};
use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// 声明金额与计算金额的允许偏差 (严格大于才算不一致)
pub const MISMATCH_TOLERANCE: f64 = 0.01;

pub const DEFAULT_CURRENCY: &str = "EUR";
pub const DEFAULT_UNIT: &str = "pieces";

/// 声明值缺失视为一致; 否则比较绝对偏差
pub fn exceeds_tolerance(stated: Option<f64>, calculated: f64) -> bool {
    match stated {
        Some(stated) => (stated - calculated).abs() > MISMATCH_TOLERANCE,
        None => false,
    }
}

/// 订单行
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLine {
    pub id: i64,
    pub request_id: i64,
    pub description: String,
    pub unit_price: f64,
    pub quantity: f64,
    pub unit: String,
    pub stated_total_price: Option<f64>, // 报价单上的行合计
}

impl OrderLine {
    pub fn calculated_total_price(&self) -> f64 {
        self.unit_price * self.quantity
    }

    pub fn has_price_mismatch(&self) -> bool {
        exceeds_tolerance(self.stated_total_price, self.calculated_total_price())
    }
}

impl Serialize for OrderLine {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("OrderLine", 8)?;
        s.serialize_field("id", &self.id)?;
        s.serialize_field("description", &self.description)?;
        s.serialize_field("unit_price", &self.unit_price)?;
        s.serialize_field("quantity", &self.quantity)?;
        s.serialize_field("unit", &self.unit)?;
        s.serialize_field("stated_total_price", &self.stated_total_price)?;
        s.serialize_field("calculated_total_price", &self.calculated_total_price())?;
        s.serialize_field("has_price_mismatch", &self.has_price_mismatch())?;
        s.end()
    }
}

/// 采购申请 (聚合根, 独占订单行与状态历史)
#[derive(Debug, Clone, PartialEq)]
pub struct ProcurementRequest {
    pub id: i64,
    pub requestor_name: String,
    pub title: String,
    pub vendor_name: String,
    pub vat_id: String,
    pub department: String,
    pub commodity_group_id: Option<String>,
    pub currency: String,
    pub stated_total_cost: Option<f64>, // 报价单上的总价
    pub status: RequestStatus,
    pub pdf_filename: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub order_lines: Vec<OrderLine>,
    pub status_history: Vec<StatusHistoryEntry>,
}

impl ProcurementRequest {
    /// 所有订单行 单价×数量 之和, 无订单行时为 0.0
    pub fn calculated_total_cost(&self) -> f64 {
        self.order_lines.iter().map(OrderLine::calculated_total_price).sum()
    }

    pub fn has_total_mismatch(&self) -> bool {
        exceeds_tolerance(self.stated_total_cost, self.calculated_total_cost())
    }
}

impl Serialize for ProcurementRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ProcurementRequest", 17)?;
        s.serialize_field("id", &self.id)?;
        s.serialize_field("requestor_name", &self.requestor_name)?;
        s.serialize_field("title", &self.title)?;
        s.serialize_field("vendor_name", &self.vendor_name)?;
        s.serialize_field("vat_id", &self.vat_id)?;
        s.serialize_field("department", &self.department)?;
        s.serialize_field("commodity_group_id", &self.commodity_group_id)?;
        s.serialize_field("currency", &self.currency)?;
        s.serialize_field("stated_total_cost", &self.stated_total_cost)?;
        s.serialize_field("status", &self.status)?;
        s.serialize_field("pdf_filename", &self.pdf_filename)?;
        s.serialize_field("created_at", &self.created_at)?;
        s.serialize_field("updated_at", &self.updated_at)?;
        s.serialize_field("order_lines", &self.order_lines)?;
        s.serialize_field("status_history", &self.status_history)?;
        s.serialize_field("calculated_total_cost", &self.calculated_total_cost())?;
        s.serialize_field("has_total_mismatch", &self.has_total_mismatch())?;
        s.end()
    }
}

/// 附件 (原始报价PDF)
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    pub filename: String,
    pub data: Vec<u8>,
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_unit() -> String {
    DEFAULT_UNIT.to_string()
}

fn default_quantity() -> f64 {
    1.0
}

/// 订单行输入 (创建/整体替换时使用)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLineInput {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub unit_price: f64,
    #[serde(default = "default_quantity")]
    pub quantity: f64,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default)]
    pub stated_total_price: Option<f64>,
}

impl OrderLineInput {
    /// 描述非空且单价大于0才会被保存
    pub fn is_complete(&self) -> bool {
        !self.description.trim().is_empty() && self.unit_price > 0.0
    }
}

/// 只保留完整的订单行, 其余静默丢弃
pub fn complete_lines(lines: &[OrderLineInput]) -> Vec<OrderLineInput> {
    lines.iter().filter(|l| l.is_complete()).cloned().collect()
}

/// 创建申请的载荷
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRequest {
    #[serde(default)]
    pub requestor_name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub vendor_name: String,
    #[serde(default)]
    pub vat_id: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub commodity_group_id: Option<String>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub stated_total_cost: Option<f64>,
    #[serde(default)]
    pub order_lines: Vec<OrderLineInput>,
}

impl NewRequest {
    /// 将提取结果合并为创建载荷; 商品组由调用方另行设置
    pub fn from_offer(offer: &ExtractedOffer) -> Self {
        Self {
            requestor_name: offer.requestor_name.clone().unwrap_or_default(),
            title: offer.title.clone().unwrap_or_default(),
            vendor_name: offer.vendor_name.clone().unwrap_or_default(),
            vat_id: offer.vat_id.clone().unwrap_or_default(),
            department: offer.department.clone().unwrap_or_default(),
            commodity_group_id: None,
            currency: offer.currency.clone().unwrap_or_else(default_currency),
            stated_total_cost: offer.stated_total_cost,
            order_lines: offer
                .order_lines
                .iter()
                .map(|line| OrderLineInput {
                    description: line.description.clone(),
                    unit_price: line.unit_price,
                    quantity: line.quantity,
                    unit: line.unit.clone(),
                    stated_total_price: line.stated_total_price,
                })
                .collect(),
        }
    }
}

/// 区分 "未提供" 与 "显式 null"
fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// 部分更新: 只修改调用方提供的字段
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RequestUpdate {
    pub requestor_name: Option<String>,
    pub title: Option<String>,
    pub vendor_name: Option<String>,
    pub vat_id: Option<String>,
    pub department: Option<String>,
    pub commodity_group_id: Option<String>,
    pub currency: Option<String>,
    /// `Some(None)` 清空声明总价
    #[serde(default, deserialize_with = "deserialize_present")]
    pub stated_total_cost: Option<Option<f64>>,
    /// 提供时整体替换订单行
    pub order_lines: Option<Vec<OrderLineInput>>,
}

impl RequestUpdate {
    /// 应用标量字段; 订单行替换由存储层完成
    pub fn apply_fields(&self, request: &mut ProcurementRequest) {
        if let Some(v) = &self.requestor_name {
            request.requestor_name = v.clone();
        }
        if let Some(v) = &self.title {
            request.title = v.clone();
        }
        if let Some(v) = &self.vendor_name {
            request.vendor_name = v.clone();
        }
        if let Some(v) = &self.vat_id {
            request.vat_id = v.clone();
        }
        if let Some(v) = &self.department {
            request.department = v.clone();
        }
        if let Some(v) = &self.commodity_group_id {
            request.commodity_group_id = Some(v.clone());
        }
        if let Some(v) = &self.currency {
            request.currency = v.clone();
        }
        if let Some(v) = self.stated_total_cost {
            request.stated_total_cost = v;
        }
    }
}

/// 列表查询条件
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestFilter {
    pub status: Option<RequestStatus>,
    pub search: Option<String>,
}

impl RequestFilter {
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// 状态精确匹配, 搜索词对标题/供应商/申请人做不区分大小写的包含匹配
    pub fn matches(&self, request: &ProcurementRequest) -> bool {
        if let Some(status) = self.status {
            if request.status != status {
                return false;
            }
        }
        match self.search_term() {
            Some(term) => {
                let term = term.to_lowercase();
                [&request.title, &request.vendor_name, &request.requestor_name]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&term))
            }
            None => true,
        }
    }
}
