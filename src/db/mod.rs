pub mod memory;
pub mod pool;
pub mod postgres;
pub mod queries;
pub mod schema;

pub use memory::MemoryRequestStore;
pub use pool::create_pool;
pub use postgres::PgRequestStore;
pub use schema::ensure_schema;

use crate::error::StoreError;
use crate::models::{NewRequest, OrderLineInput, ProcurementRequest, RequestFilter, SourceDocument, StatusChange};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// 申请持久化
///
/// 删除申请时一并删除其订单行、状态历史与附件。返回 `false` 表示申请不存在。
#[async_trait]
pub trait RequestStore: Send + Sync {
    /// 写入申请、订单行与首条历史, 返回新ID
    async fn insert(&self, request: &NewRequest, creation: &StatusChange) -> Result<i64, StoreError>;

    async fn find(&self, id: i64) -> Result<Option<ProcurementRequest>, StoreError>;

    async fn list(&self, filter: &RequestFilter) -> Result<Vec<ProcurementRequest>, StoreError>;

    /// 覆盖可编辑字段; `replace_lines` 为 Some 时整体替换订单行
    async fn update(
        &self,
        request: &ProcurementRequest,
        replace_lines: Option<&[OrderLineInput]>,
    ) -> Result<bool, StoreError>;

    /// 更新当前状态并追加历史
    ///
    /// 申请不存在, 或当前状态已不是 `change.from` 时不做修改并返回 false。
    async fn append_status(&self, id: i64, change: &StatusChange) -> Result<bool, StoreError>;

    async fn delete(&self, id: i64) -> Result<bool, StoreError>;

    async fn set_document(
        &self,
        id: i64,
        document: Option<&SourceDocument>,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    async fn document(&self, id: i64) -> Result<Option<SourceDocument>, StoreError>;
}
