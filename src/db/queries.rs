use crate::models::{NewRequest, OrderLineInput, ProcurementRequest, RequestStatus, StatusChange};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgExecutor, PgPool, Postgres, QueryBuilder};

/// 申请主表行 (不含 pdf_data)
#[derive(Debug, Clone, FromRow)]
pub struct RequestRow {
    pub id: i64,
    pub requestor_name: String,
    pub title: String,
    pub vendor_name: String,
    pub vat_id: String,
    pub department: String,
    pub commodity_group_id: Option<String>,
    pub currency: String,
    pub stated_total_cost: Option<f64>,
    pub status: String,
    pub pdf_filename: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 订单行表
#[derive(Debug, Clone, FromRow)]
pub struct OrderLineRow {
    pub id: i64,
    pub request_id: i64,
    pub description: String,
    pub unit_price: f64,
    pub quantity: f64,
    pub unit: String,
    pub stated_total_price: Option<f64>,
}

/// 状态历史表
#[derive(Debug, Clone, FromRow)]
pub struct StatusHistoryRow {
    pub id: i64,
    pub request_id: i64,
    pub from_status: Option<String>,
    pub to_status: String,
    pub changed_at: DateTime<Utc>,
    pub changed_by: String,
}

/// 附件行
#[derive(Debug, Clone, FromRow)]
pub struct DocumentRow {
    pub pdf_filename: Option<String>,
    pub pdf_data: Option<Vec<u8>>,
}

const REQUEST_COLUMNS: &str = "id, requestor_name, title, vendor_name, vat_id, department, \
     commodity_group_id, currency, stated_total_cost, status, pdf_filename, created_at, updated_at";

/// 查询单个申请主表
pub async fn get_request(pool: &PgPool, id: i64) -> Result<Option<RequestRow>, sqlx::Error> {
    let sql = format!("SELECT {} FROM procurement_requests WHERE id = $1", REQUEST_COLUMNS);
    sqlx::query_as::<_, RequestRow>(&sql).bind(id).fetch_optional(pool).await
}

/// 按状态/关键字筛选, 按创建时间倒序
///
/// 关键字按字面做不区分大小写的包含匹配, `%` 与 `_` 不作通配符。
pub async fn list_requests(
    pool: &PgPool,
    status: Option<RequestStatus>,
    search: Option<&str>,
) -> Result<Vec<RequestRow>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {}
        FROM procurement_requests
        WHERE ($1::text IS NULL OR status = $1)
          AND ($2::text IS NULL
               OR strpos(lower(title), lower($2)) > 0
               OR strpos(lower(vendor_name), lower($2)) > 0
               OR strpos(lower(requestor_name), lower($2)) > 0)
        ORDER BY created_at DESC, id DESC
        "#,
        REQUEST_COLUMNS
    );
    sqlx::query_as::<_, RequestRow>(&sql)
        .bind(status.map(|s| s.to_string()))
        .bind(search)
        .fetch_all(pool)
        .await
}

/// 批量查询订单行
pub async fn list_order_lines(pool: &PgPool, request_ids: &[i64]) -> Result<Vec<OrderLineRow>, sqlx::Error> {
    sqlx::query_as::<_, OrderLineRow>(
        r#"
        SELECT id, request_id, description, unit_price, quantity, unit, stated_total_price
        FROM order_lines
        WHERE request_id = ANY($1)
        ORDER BY id ASC
        "#,
    )
    .bind(request_ids)
    .fetch_all(pool)
    .await
}

/// 批量查询状态历史 (按时间顺序)
pub async fn list_status_history(
    pool: &PgPool,
    request_ids: &[i64],
) -> Result<Vec<StatusHistoryRow>, sqlx::Error> {
    sqlx::query_as::<_, StatusHistoryRow>(
        r#"
        SELECT id, request_id, from_status, to_status, changed_at, changed_by
        FROM status_history
        WHERE request_id = ANY($1)
        ORDER BY changed_at ASC, id ASC
        "#,
    )
    .bind(request_ids)
    .fetch_all(pool)
    .await
}

/// 插入申请主表, 返回新ID
pub async fn insert_request<'e, E: PgExecutor<'e>>(
    executor: E,
    request: &NewRequest,
    now: DateTime<Utc>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO procurement_requests (
            requestor_name, title, vendor_name, vat_id, department,
            commodity_group_id, currency, stated_total_cost, status,
            created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
        RETURNING id
        "#,
    )
    .bind(&request.requestor_name)
    .bind(&request.title)
    .bind(&request.vendor_name)
    .bind(&request.vat_id)
    .bind(&request.department)
    .bind(&request.commodity_group_id)
    .bind(&request.currency)
    .bind(request.stated_total_cost)
    .bind(RequestStatus::Open.to_string())
    .bind(now)
    .fetch_one(executor)
    .await
}

/// 批量插入订单行
pub async fn insert_order_lines<'e, E: PgExecutor<'e>>(
    executor: E,
    request_id: i64,
    lines: &[OrderLineInput],
) -> Result<(), sqlx::Error> {
    if lines.is_empty() {
        return Ok(());
    }

    let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(
        "INSERT INTO order_lines (request_id, description, unit_price, quantity, unit, stated_total_price) ",
    );
    query_builder.push_values(lines, |mut b, line| {
        b.push_bind(request_id)
            .push_bind(&line.description)
            .push_bind(line.unit_price)
            .push_bind(line.quantity)
            .push_bind(&line.unit)
            .push_bind(line.stated_total_price);
    });

    let result = query_builder.build().execute(executor).await?;
    tracing::debug!("申请 {} 写入 {} 条订单行", request_id, result.rows_affected());
    Ok(())
}

pub async fn delete_order_lines<'e, E: PgExecutor<'e>>(executor: E, request_id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM order_lines WHERE request_id = $1")
        .bind(request_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

/// 追加一条状态历史
pub async fn insert_status_history<'e, E: PgExecutor<'e>>(
    executor: E,
    request_id: i64,
    change: &StatusChange,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO status_history (request_id, from_status, to_status, changed_at, changed_by)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(request_id)
    .bind(change.from.map(|s| s.to_string()))
    .bind(change.to.to_string())
    .bind(change.changed_at)
    .bind(&change.changed_by)
    .execute(executor)
    .await?;
    Ok(())
}

/// 整体覆盖可编辑字段 (后写者生效)
pub async fn update_request_fields<'e, E: PgExecutor<'e>>(
    executor: E,
    request: &ProcurementRequest,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE procurement_requests
        SET requestor_name = $2, title = $3, vendor_name = $4, vat_id = $5, department = $6,
            commodity_group_id = $7, currency = $8, stated_total_cost = $9, updated_at = $10
        WHERE id = $1
        "#,
    )
    .bind(request.id)
    .bind(&request.requestor_name)
    .bind(&request.title)
    .bind(&request.vendor_name)
    .bind(&request.vat_id)
    .bind(&request.department)
    .bind(&request.commodity_group_id)
    .bind(&request.currency)
    .bind(request.stated_total_cost)
    .bind(request.updated_at)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

/// 仅当当前状态仍为 `change.from` 时更新, 返回受影响行数
pub async fn update_status<'e, E: PgExecutor<'e>>(
    executor: E,
    request_id: i64,
    change: &StatusChange,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE procurement_requests
        SET status = $2, updated_at = $3
        WHERE id = $1 AND ($4::text IS NULL OR status = $4)
        "#,
    )
    .bind(request_id)
    .bind(change.to.to_string())
    .bind(change.changed_at)
    .bind(change.from.map(|s| s.to_string()))
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

/// 删除申请 (订单行与历史由外键级联删除)
pub async fn delete_request(pool: &PgPool, request_id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM procurement_requests WHERE id = $1")
        .bind(request_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn get_document(pool: &PgPool, request_id: i64) -> Result<Option<DocumentRow>, sqlx::Error> {
    sqlx::query_as::<_, DocumentRow>("SELECT pdf_filename, pdf_data FROM procurement_requests WHERE id = $1")
        .bind(request_id)
        .fetch_optional(pool)
        .await
}

/// 设置或清除附件
pub async fn set_document(
    pool: &PgPool,
    request_id: i64,
    filename: Option<&str>,
    data: Option<&[u8]>,
    now: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE procurement_requests SET pdf_filename = $2, pdf_data = $3, updated_at = $4 WHERE id = $1",
    )
    .bind(request_id)
    .bind(filename)
    .bind(data)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
