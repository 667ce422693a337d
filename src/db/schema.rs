use sqlx::PgPool;

const STATEMENTS: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS procurement_requests (
        id                  BIGSERIAL PRIMARY KEY,
        requestor_name      TEXT NOT NULL,
        title               TEXT NOT NULL,
        vendor_name         TEXT NOT NULL,
        vat_id              TEXT NOT NULL,
        department          TEXT NOT NULL,
        commodity_group_id  TEXT,
        currency            TEXT NOT NULL DEFAULT 'EUR',
        stated_total_cost   DOUBLE PRECISION,
        status              TEXT NOT NULL DEFAULT 'Open',
        pdf_data            BYTEA,
        pdf_filename        TEXT,
        created_at          TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at          TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS order_lines (
        id                  BIGSERIAL PRIMARY KEY,
        request_id          BIGINT NOT NULL REFERENCES procurement_requests(id) ON DELETE CASCADE,
        description         TEXT NOT NULL,
        unit_price          DOUBLE PRECISION NOT NULL,
        quantity            DOUBLE PRECISION NOT NULL,
        unit                TEXT NOT NULL,
        stated_total_price  DOUBLE PRECISION
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS status_history (
        id                  BIGSERIAL PRIMARY KEY,
        request_id          BIGINT NOT NULL REFERENCES procurement_requests(id) ON DELETE CASCADE,
        from_status         TEXT,
        to_status           TEXT NOT NULL,
        changed_at          TIMESTAMPTZ NOT NULL DEFAULT now(),
        changed_by          TEXT NOT NULL DEFAULT 'system'
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_procurement_requests_status ON procurement_requests (status)
    "#,
];

/// 建表 (幂等)
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    for stmt in STATEMENTS {
        sqlx::query(stmt).execute(pool).await?;
    }
    tracing::info!("数据库表结构已就绪");
    Ok(())
}
