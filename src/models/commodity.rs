use indexmap::IndexMap;
use serde::Serialize;

/// 商品组 (采购分类目标)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommodityGroup {
    pub id: &'static str,
    pub category: &'static str,
    pub name: &'static str,
}

/// 分类失败时使用的保留ID ("Miscellaneous Services")
pub const MISCELLANEOUS_GROUP_ID: &str = "009";

const fn group(id: &'static str, category: &'static str, name: &'static str) -> CommodityGroup {
    CommodityGroup { id, category, name }
}

/// 固定商品组表, 运行期只读
pub static COMMODITY_GROUPS: [CommodityGroup; 50] = [
    group("001", "General Services", "Accommodation Rentals"),
    group("002", "General Services", "Membership Fees"),
    group("003", "General Services", "Workplace Safety"),
    group("004", "General Services", "Consulting"),
    group("005", "General Services", "Financial Services"),
    group("006", "General Services", "Fleet Management"),
    group("007", "General Services", "Recruitment Services"),
    group("008", "General Services", "Professional Development"),
    group("009", "General Services", "Miscellaneous Services"),
    group("010", "General Services", "Insurance"),
    group("011", "Facility Management", "Electrical Engineering"),
    group("012", "Facility Management", "Facility Management Services"),
    group("013", "Facility Management", "Security"),
    group("014", "Facility Management", "Renovations"),
    group("015", "Facility Management", "Office Equipment"),
    group("016", "Facility Management", "Energy Management"),
    group("017", "Facility Management", "Maintenance"),
    group("018", "Facility Management", "Cafeteria and Kitchenettes"),
    group("019", "Facility Management", "Cleaning"),
    group("020", "Publishing Production", "Audio and Visual Production"),
    group("021", "Publishing Production", "Books/Videos/CDs"),
    group("022", "Publishing Production", "Printing Costs"),
    group("023", "Publishing Production", "Software Development for Publishing"),
    group("024", "Publishing Production", "Material Costs"),
    group("025", "Publishing Production", "Shipping for Production"),
    group("026", "Publishing Production", "Digital Product Development"),
    group("027", "Publishing Production", "Pre-production"),
    group("028", "Publishing Production", "Post-production Costs"),
    group("029", "Information Technology", "Hardware"),
    group("030", "Information Technology", "IT Services"),
    group("031", "Information Technology", "Software"),
    group("032", "Logistics", "Courier, Express, and Postal Services"),
    group("033", "Logistics", "Warehousing and Material Handling"),
    group("034", "Logistics", "Transportation Logistics"),
    group("035", "Logistics", "Delivery Services"),
    group("036", "Marketing & Advertising", "Advertising"),
    group("037", "Marketing & Advertising", "Outdoor Advertising"),
    group("038", "Marketing & Advertising", "Marketing Agencies"),
    group("039", "Marketing & Advertising", "Direct Mail"),
    group("040", "Marketing & Advertising", "Customer Communication"),
    group("041", "Marketing & Advertising", "Online Marketing"),
    group("042", "Marketing & Advertising", "Events"),
    group("043", "Marketing & Advertising", "Promotional Materials"),
    group("044", "Production", "Warehouse and Operational Equipment"),
    group("045", "Production", "Production Machinery"),
    group("046", "Production", "Spare Parts"),
    group("047", "Production", "Internal Transportation"),
    group("048", "Production", "Production Materials"),
    group("049", "Production", "Consumables"),
    group("050", "Production", "Maintenance and Repairs"),
];

/// 按ID查询商品组
pub fn find_group(id: &str) -> Option<&'static CommodityGroup> {
    COMMODITY_GROUPS.iter().find(|g| g.id == id)
}

pub fn is_known_group(id: &str) -> bool {
    find_group(id).is_some()
}

/// 展示用文本: "类别 - 名称", 未知ID返回 "Unknown"
pub fn group_display(id: &str) -> String {
    match find_group(id) {
        Some(g) => format!("{} - {}", g.category, g.name),
        None => "Unknown".to_string(),
    }
}

/// 按类别分组 (保持表中顺序)
pub fn groups_by_category() -> IndexMap<&'static str, Vec<&'static CommodityGroup>> {
    let mut grouped: IndexMap<&'static str, Vec<&'static CommodityGroup>> = IndexMap::new();
    for g in COMMODITY_GROUPS.iter() {
        grouped.entry(g.category).or_default().push(g);
    }
    grouped
}

/// 嵌入分类提示词的完整列表, 每行一个商品组
pub fn groups_for_prompt() -> String {
    COMMODITY_GROUPS
        .iter()
        .map(|g| format!("ID: {}, Category: {}, Name: {}", g.id, g.category, g.name))
        .collect::<Vec<_>>()
        .join("\n")
}
