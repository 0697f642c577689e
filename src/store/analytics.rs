//! Independent read queries behind the analytics and revenue endpoints.
//!
//! Each function is one self-contained snapshot query; the handlers issue
//! them concurrently. Cancelled orders never count toward revenue.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{with_retry, Db};
use crate::domain::status::OrderStatus;

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct MonthlyRow {
    pub month: DateTime<Utc>,
    pub revenue: Decimal,
    pub orders: i64,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct TopProductRow {
    pub product_id: Uuid,
    pub name: String,
    pub units_sold: i64,
    pub revenue: Decimal,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct StatusCountRow {
    pub status: OrderStatus,
    pub count: i64,
}

pub async fn revenue_between(
    db: &Db,
    seller_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Decimal, sqlx::Error> {
    let row: (Decimal,) = with_retry(|| {
        let pool = db.pool().clone();
        async move {
            sqlx::query_as(
                "SELECT COALESCE(SUM(total_amount), 0) FROM orders \
                 WHERE seller_id = $1 AND status <> 'CANCELLED' \
                   AND created_at >= $2 AND created_at < $3",
            )
            .bind(seller_id)
            .bind(start)
            .bind(end)
            .fetch_one(&pool)
            .await
        }
    })
    .await?;
    Ok(row.0)
}

pub async fn order_count_between(
    db: &Db,
    seller_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<i64, sqlx::Error> {
    let row: (i64,) = with_retry(|| {
        let pool = db.pool().clone();
        async move {
            sqlx::query_as(
                "SELECT COUNT(*) FROM orders \
                 WHERE seller_id = $1 AND created_at >= $2 AND created_at < $3",
            )
            .bind(seller_id)
            .bind(start)
            .bind(end)
            .fetch_one(&pool)
            .await
        }
    })
    .await?;
    Ok(row.0)
}

pub async fn distinct_customers_between(
    db: &Db,
    seller_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<i64, sqlx::Error> {
    let row: (i64,) = with_retry(|| {
        let pool = db.pool().clone();
        async move {
            sqlx::query_as(
                "SELECT COUNT(DISTINCT customer_id) FROM orders \
                 WHERE seller_id = $1 AND created_at >= $2 AND created_at < $3",
            )
            .bind(seller_id)
            .bind(start)
            .bind(end)
            .fetch_one(&pool)
            .await
        }
    })
    .await?;
    Ok(row.0)
}

pub async fn active_product_count(db: &Db, seller_id: Uuid) -> Result<i64, sqlx::Error> {
    let row: (i64,) = with_retry(|| {
        let pool = db.pool().clone();
        async move {
            sqlx::query_as(
                "SELECT COUNT(*) FROM products WHERE seller_id = $1 AND is_active",
            )
            .bind(seller_id)
            .fetch_one(&pool)
            .await
        }
    })
    .await?;
    Ok(row.0)
}

pub async fn monthly_breakdown(
    db: &Db,
    seller_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<MonthlyRow>, sqlx::Error> {
    with_retry(|| {
        let pool = db.pool().clone();
        async move {
            sqlx::query_as::<_, MonthlyRow>(
                "SELECT date_trunc('month', created_at) AS month, \
                        COALESCE(SUM(total_amount) FILTER (WHERE status <> 'CANCELLED'), 0) AS revenue, \
                        COUNT(*) AS orders \
                 FROM orders \
                 WHERE seller_id = $1 AND created_at >= $2 AND created_at < $3 \
                 GROUP BY 1 ORDER BY 1",
            )
            .bind(seller_id)
            .bind(start)
            .bind(end)
            .fetch_all(&pool)
            .await
        }
    })
    .await
}

pub async fn top_products(
    db: &Db,
    seller_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<TopProductRow>, sqlx::Error> {
    with_retry(|| {
        let pool = db.pool().clone();
        async move {
            sqlx::query_as::<_, TopProductRow>(
                "SELECT p.id AS product_id, p.name, \
                        COALESCE(SUM(oi.quantity), 0) AS units_sold, \
                        COALESCE(SUM(oi.quantity * oi.unit_price), 0) AS revenue \
                 FROM order_items oi \
                 JOIN orders o ON o.id = oi.order_id \
                 JOIN products p ON p.id = oi.product_id \
                 WHERE o.seller_id = $1 AND o.status <> 'CANCELLED' \
                   AND o.created_at >= $2 AND o.created_at < $3 \
                 GROUP BY p.id, p.name \
                 ORDER BY revenue DESC \
                 LIMIT $4",
            )
            .bind(seller_id)
            .bind(start)
            .bind(end)
            .bind(limit)
            .fetch_all(&pool)
            .await
        }
    })
    .await
}

pub async fn status_breakdown(
    db: &Db,
    seller_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<StatusCountRow>, sqlx::Error> {
    with_retry(|| {
        let pool = db.pool().clone();
        async move {
            sqlx::query_as::<_, StatusCountRow>(
                "SELECT status, COUNT(*) AS count FROM orders \
                 WHERE seller_id = $1 AND created_at >= $2 AND created_at < $3 \
                 GROUP BY status",
            )
            .bind(seller_id)
            .bind(start)
            .bind(end)
            .fetch_all(&pool)
            .await
        }
    })
    .await
}
