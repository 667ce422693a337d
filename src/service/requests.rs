use crate::db::RequestStore;
use crate::error::{AppError, AppResult};
use crate::models::request::complete_lines;
use crate::models::{
    NewRequest, ProcurementRequest, RequestFilter, RequestStatus, RequestUpdate, SourceDocument, StatusChange,
};
use chrono::Utc;
use std::sync::Arc;

/// 采购申请服务: 增删改查 + 状态流转 + 附件
///
/// 不做字段校验 (由调用方负责); 引用不存在的申请返回 `AppError::NotFound`。
pub struct RequestService {
    store: Arc<dyn RequestStore>,
}

impl RequestService {
    pub fn new(store: Arc<dyn RequestStore>) -> Self {
        Self { store }
    }

    /// 创建申请: 状态固定为 Open, 并写入 none -> Open 的首条历史
    pub async fn create(&self, mut request: NewRequest) -> AppResult<ProcurementRequest> {
        let submitted = request.order_lines.len();
        request.order_lines = complete_lines(&request.order_lines);
        if request.order_lines.len() < submitted {
            tracing::debug!("丢弃 {} 条不完整订单行", submitted - request.order_lines.len());
        }

        let creation = StatusChange::creation(Utc::now());
        let id = self.store.insert(&request, &creation).await?;
        tracing::info!("申请 {} 已创建: {} ({} 条订单行)", id, request.title, request.order_lines.len());
        self.get(id).await
    }

    pub async fn get(&self, id: i64) -> AppResult<ProcurementRequest> {
        self.store.find(id).await?.ok_or(AppError::NotFound(id))
    }

    pub async fn list(&self, filter: &RequestFilter) -> AppResult<Vec<ProcurementRequest>> {
        Ok(self.store.list(filter).await?)
    }

    /// 部分更新; 提供订单行时整体替换 (不完整的行被丢弃)
    pub async fn update(&self, id: i64, update: RequestUpdate) -> AppResult<ProcurementRequest> {
        let mut request = self.get(id).await?;
        update.apply_fields(&mut request);
        request.updated_at = Utc::now();

        let lines = update.order_lines.as_deref().map(complete_lines);
        if !self.store.update(&request, lines.as_deref()).await? {
            return Err(AppError::NotFound(id));
        }
        tracing::info!("申请 {} 已更新", id);
        self.get(id).await
    }

    /// 状态流转; 与当前状态相同则不做任何修改
    ///
    /// 读取后状态已被并发修改时放弃本次流转, 返回最新的申请。
    pub async fn change_status(&self, id: i64, status: RequestStatus, actor: &str) -> AppResult<ProcurementRequest> {
        let request = self.get(id).await?;
        let Some(change) = StatusChange::transition(request.status, status, actor, Utc::now()) else {
            tracing::debug!("申请 {} 状态未变化 ({})", id, status);
            return Ok(request);
        };

        if !self.store.append_status(id, &change).await? {
            let latest = self.get(id).await?;
            tracing::warn!(
                "申请 {} 状态已被并发修改为 {}, 放弃 {} -> {}",
                id,
                latest.status,
                request.status,
                status
            );
            return Ok(latest);
        }
        tracing::info!("申请 {} 状态: {} -> {} (by {})", id, request.status, status, actor);
        self.get(id).await
    }

    /// 删除申请及其订单行、历史和附件
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        if !self.store.delete(id).await? {
            return Err(AppError::NotFound(id));
        }
        tracing::info!("申请 {} 已删除", id);
        Ok(())
    }

    pub async fn attach_document(&self, id: i64, document: SourceDocument) -> AppResult<ProcurementRequest> {
        if !self.store.set_document(id, Some(&document), Utc::now()).await? {
            return Err(AppError::NotFound(id));
        }
        tracing::info!("申请 {} 附件已保存: {} ({} bytes)", id, document.filename, document.data.len());
        self.get(id).await
    }

    /// 申请不存在返回 `NotFound`, 存在但无附件返回 `DocumentNotFound`
    pub async fn document(&self, id: i64) -> AppResult<SourceDocument> {
        if let Some(document) = self.store.document(id).await? {
            return Ok(document);
        }
        self.get(id).await?;
        Err(AppError::DocumentNotFound(id))
    }

    pub async fn detach_document(&self, id: i64) -> AppResult<ProcurementRequest> {
        if !self.store.set_document(id, None, Utc::now()).await? {
            return Err(AppError::NotFound(id));
        }
        self.get(id).await
    }
}
