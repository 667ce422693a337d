use super::queries::{self, OrderLineRow, RequestRow, StatusHistoryRow};
use super::RequestStore;
use crate::error::StoreError;
use crate::models::{
    NewRequest, OrderLine, OrderLineInput, ProcurementRequest, RequestFilter, RequestStatus, SourceDocument,
    StatusChange, StatusHistoryEntry,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use std::str::FromStr;

/// Postgres 存储
pub struct PgRequestStore {
    pool: PgPool,
}

impl PgRequestStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 为主表行装配订单行与历史 (各一次批量查询)
    async fn assemble(&self, rows: Vec<RequestRow>) -> Result<Vec<ProcurementRequest>, StoreError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let (lines, history) = futures::try_join!(
            queries::list_order_lines(&self.pool, &ids),
            queries::list_status_history(&self.pool, &ids),
        )?;

        let mut lines_by_request: HashMap<i64, Vec<OrderLine>> = HashMap::new();
        for row in lines {
            lines_by_request.entry(row.request_id).or_default().push(line_from_row(row));
        }
        let mut history_by_request: HashMap<i64, Vec<StatusHistoryEntry>> = HashMap::new();
        for row in history {
            let request_id = row.request_id;
            history_by_request.entry(request_id).or_default().push(history_from_row(row)?);
        }

        rows.into_iter()
            .map(|row| {
                let order_lines = lines_by_request.remove(&row.id).unwrap_or_default();
                let status_history = history_by_request.remove(&row.id).unwrap_or_default();
                request_from_row(row, order_lines, status_history)
            })
            .collect()
    }
}

fn parse_status(value: &str) -> Result<RequestStatus, StoreError> {
    RequestStatus::from_str(value).map_err(|_| StoreError::Corrupt(format!("unknown status '{}'", value)))
}

fn line_from_row(row: OrderLineRow) -> OrderLine {
    OrderLine {
        id: row.id,
        request_id: row.request_id,
        description: row.description,
        unit_price: row.unit_price,
        quantity: row.quantity,
        unit: row.unit,
        stated_total_price: row.stated_total_price,
    }
}

fn history_from_row(row: StatusHistoryRow) -> Result<StatusHistoryEntry, StoreError> {
    Ok(StatusHistoryEntry {
        id: row.id,
        from_status: row.from_status.as_deref().map(parse_status).transpose()?,
        to_status: parse_status(&row.to_status)?,
        changed_at: row.changed_at,
        changed_by: row.changed_by,
    })
}

fn request_from_row(
    row: RequestRow,
    order_lines: Vec<OrderLine>,
    status_history: Vec<StatusHistoryEntry>,
) -> Result<ProcurementRequest, StoreError> {
    Ok(ProcurementRequest {
        id: row.id,
        requestor_name: row.requestor_name,
        title: row.title,
        vendor_name: row.vendor_name,
        vat_id: row.vat_id,
        department: row.department,
        commodity_group_id: row.commodity_group_id,
        currency: row.currency,
        stated_total_cost: row.stated_total_cost,
        status: parse_status(&row.status)?,
        pdf_filename: row.pdf_filename,
        created_at: row.created_at,
        updated_at: row.updated_at,
        order_lines,
        status_history,
    })
}

#[async_trait]
impl RequestStore for PgRequestStore {
    async fn insert(&self, request: &NewRequest, creation: &StatusChange) -> Result<i64, StoreError> {
        // 事务中任一步失败, tx 被 drop 时自动回滚
        let mut tx = self.pool.begin().await?;
        let id = queries::insert_request(&mut *tx, request, creation.changed_at).await?;
        queries::insert_order_lines(&mut *tx, id, &request.order_lines).await?;
        queries::insert_status_history(&mut *tx, id, creation).await?;
        tx.commit().await?;
        Ok(id)
    }

    async fn find(&self, id: i64) -> Result<Option<ProcurementRequest>, StoreError> {
        let Some(row) = queries::get_request(&self.pool, id).await? else {
            return Ok(None);
        };
        Ok(self.assemble(vec![row]).await?.pop())
    }

    async fn list(&self, filter: &RequestFilter) -> Result<Vec<ProcurementRequest>, StoreError> {
        let rows = queries::list_requests(&self.pool, filter.status, filter.search_term()).await?;
        self.assemble(rows).await
    }

    async fn update(
        &self,
        request: &ProcurementRequest,
        replace_lines: Option<&[OrderLineInput]>,
    ) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;
        let affected = queries::update_request_fields(&mut *tx, request).await?;
        if affected == 0 {
            return Ok(false);
        }
        if let Some(lines) = replace_lines {
            let removed = queries::delete_order_lines(&mut *tx, request.id).await?;
            queries::insert_order_lines(&mut *tx, request.id, lines).await?;
            tracing::debug!("申请 {} 订单行替换: 删除 {}, 新增 {}", request.id, removed, lines.len());
        }
        tx.commit().await?;
        Ok(true)
    }

    async fn append_status(&self, id: i64, change: &StatusChange) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;
        if queries::update_status(&mut *tx, id, change).await? == 0 {
            return Ok(false);
        }
        queries::insert_status_history(&mut *tx, id, change).await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        Ok(queries::delete_request(&self.pool, id).await? > 0)
    }

    async fn set_document(
        &self,
        id: i64,
        document: Option<&SourceDocument>,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let affected = queries::set_document(
            &self.pool,
            id,
            document.map(|d| d.filename.as_str()),
            document.map(|d| d.data.as_slice()),
            now,
        )
        .await?;
        Ok(affected > 0)
    }

    async fn document(&self, id: i64) -> Result<Option<SourceDocument>, StoreError> {
        let row = queries::get_document(&self.pool, id).await?;
        Ok(row.and_then(|r| match (r.pdf_filename, r.pdf_data) {
            (Some(filename), Some(data)) => Some(SourceDocument { filename, data }),
            _ => None,
        }))
    }
}
