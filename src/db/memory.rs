use super::RequestStore;
use crate::error::StoreError;
use crate::models::{
    NewRequest, OrderLine, OrderLineInput, ProcurementRequest, RequestFilter, SourceDocument, StatusChange,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};

struct StoredRequest {
    request: ProcurementRequest,
    document: Option<SourceDocument>,
}

/// 内存存储, 语义与 Postgres 实现一致 (本地运行与测试)
#[derive(Default)]
pub struct MemoryRequestStore {
    requests: DashMap<i64, StoredRequest>,
    request_seq: AtomicI64,
    line_seq: AtomicI64,
    history_seq: AtomicI64,
}

fn next(seq: &AtomicI64) -> i64 {
    seq.fetch_add(1, Ordering::SeqCst) + 1
}

impl MemoryRequestStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn build_lines(&self, request_id: i64, lines: &[OrderLineInput]) -> Vec<OrderLine> {
        lines
            .iter()
            .map(|l| OrderLine {
                id: next(&self.line_seq),
                request_id,
                description: l.description.clone(),
                unit_price: l.unit_price,
                quantity: l.quantity,
                unit: l.unit.clone(),
                stated_total_price: l.stated_total_price,
            })
            .collect()
    }

    /// 当前存储的订单行与历史条数 (用于检查级联删除)
    pub fn child_record_count(&self) -> usize {
        self.requests
            .iter()
            .map(|e| e.request.order_lines.len() + e.request.status_history.len())
            .sum()
    }
}

#[async_trait]
impl RequestStore for MemoryRequestStore {
    async fn insert(&self, request: &NewRequest, creation: &StatusChange) -> Result<i64, StoreError> {
        let id = next(&self.request_seq);
        let now = creation.changed_at;
        let stored = ProcurementRequest {
            id,
            requestor_name: request.requestor_name.clone(),
            title: request.title.clone(),
            vendor_name: request.vendor_name.clone(),
            vat_id: request.vat_id.clone(),
            department: request.department.clone(),
            commodity_group_id: request.commodity_group_id.clone(),
            currency: request.currency.clone(),
            stated_total_cost: request.stated_total_cost,
            status: creation.to,
            pdf_filename: None,
            created_at: now,
            updated_at: now,
            order_lines: self.build_lines(id, &request.order_lines),
            status_history: vec![creation.clone().into_entry(next(&self.history_seq))],
        };
        self.requests.insert(id, StoredRequest { request: stored, document: None });
        Ok(id)
    }

    async fn find(&self, id: i64) -> Result<Option<ProcurementRequest>, StoreError> {
        Ok(self.requests.get(&id).map(|e| e.request.clone()))
    }

    async fn list(&self, filter: &RequestFilter) -> Result<Vec<ProcurementRequest>, StoreError> {
        let mut found: Vec<ProcurementRequest> = self
            .requests
            .iter()
            .filter(|e| filter.matches(&e.request))
            .map(|e| e.request.clone())
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(found)
    }

    async fn update(
        &self,
        request: &ProcurementRequest,
        replace_lines: Option<&[OrderLineInput]>,
    ) -> Result<bool, StoreError> {
        let new_lines = replace_lines.map(|lines| self.build_lines(request.id, lines));
        let Some(mut entry) = self.requests.get_mut(&request.id) else {
            return Ok(false);
        };
        let current = &mut entry.request;
        current.requestor_name = request.requestor_name.clone();
        current.title = request.title.clone();
        current.vendor_name = request.vendor_name.clone();
        current.vat_id = request.vat_id.clone();
        current.department = request.department.clone();
        current.commodity_group_id = request.commodity_group_id.clone();
        current.currency = request.currency.clone();
        current.stated_total_cost = request.stated_total_cost;
        current.updated_at = request.updated_at;
        if let Some(lines) = new_lines {
            current.order_lines = lines;
        }
        Ok(true)
    }

    async fn append_status(&self, id: i64, change: &StatusChange) -> Result<bool, StoreError> {
        let Some(mut entry) = self.requests.get_mut(&id) else {
            return Ok(false);
        };
        let current = &mut entry.request;
        if change.from.is_some_and(|from| from != current.status) {
            return Ok(false);
        }
        let history_id = next(&self.history_seq);
        current.status = change.to;
        current.updated_at = change.changed_at;
        current.status_history.push(change.clone().into_entry(history_id));
        Ok(true)
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.requests.remove(&id).is_some())
    }

    async fn set_document(
        &self,
        id: i64,
        document: Option<&SourceDocument>,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let Some(mut entry) = self.requests.get_mut(&id) else {
            return Ok(false);
        };
        entry.request.pdf_filename = document.map(|d| d.filename.clone());
        entry.request.updated_at = now;
        entry.document = document.cloned();
        Ok(true)
    }

    async fn document(&self, id: i64) -> Result<Option<SourceDocument>, StoreError> {
        Ok(self.requests.get(&id).and_then(|e| e.document.clone()))
    }
}
