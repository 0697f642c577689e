//! Derived customer aggregates, grouped from a seller's orders at query
//! time. The SQL classification counters mirror `domain::customer`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{with_retry, Db};

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct CustomerAggregateRow {
    pub customer_id: Uuid,
    pub display_name: String,
    pub email: String,
    pub total_orders: i64,
    pub total_spent: Decimal,
    pub first_order_at: DateTime<Utc>,
    pub last_order_at: DateTime<Utc>,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct CustomerSummaryRow {
    pub total: i64,
    pub vip: i64,
    pub active: i64,
}

pub async fn aggregates(
    db: &Db,
    seller_id: Uuid,
    search: Option<String>,
    limit: i64,
    offset: i64,
) -> Result<Vec<CustomerAggregateRow>, sqlx::Error> {
    with_retry(|| {
        let pool = db.pool().clone();
        let search = search.clone();
        async move {
            sqlx::query_as::<_, CustomerAggregateRow>(
                "SELECT c.id AS customer_id, c.display_name, c.email, \
                        COUNT(o.id) AS total_orders, \
                        COALESCE(SUM(o.total_amount) FILTER (WHERE o.status <> 'CANCELLED'), 0) AS total_spent, \
                        MIN(o.created_at) AS first_order_at, \
                        MAX(o.created_at) AS last_order_at \
                 FROM orders o \
                 JOIN accounts c ON c.id = o.customer_id \
                 WHERE o.seller_id = $1 \
                   AND ($2::text IS NULL OR c.display_name ILIKE '%' || $2 || '%' \
                        OR c.email ILIKE '%' || $2 || '%') \
                 GROUP BY c.id, c.display_name, c.email \
                 ORDER BY last_order_at DESC \
                 LIMIT $3 OFFSET $4",
            )
            .bind(seller_id)
            .bind(search)
            .bind(limit)
            .bind(offset)
            .fetch_all(&pool)
            .await
        }
    })
    .await
}

pub async fn summary(db: &Db, seller_id: Uuid) -> Result<CustomerSummaryRow, sqlx::Error> {
    with_retry(|| {
        let pool = db.pool().clone();
        async move {
            sqlx::query_as::<_, CustomerSummaryRow>(
                "SELECT COUNT(*) AS total, \
                        COUNT(*) FILTER (WHERE total_spent > 1000) AS vip, \
                        COUNT(*) FILTER (WHERE total_spent <= 1000 \
                            AND last_order_at >= NOW() - INTERVAL '90 days') AS active \
                 FROM (SELECT COALESCE(SUM(total_amount) FILTER (WHERE status <> 'CANCELLED'), 0) AS total_spent, \
                              MAX(created_at) AS last_order_at \
                       FROM orders WHERE seller_id = $1 GROUP BY customer_id) per_customer",
            )
            .bind(seller_id)
            .fetch_one(&pool)
            .await
        }
    })
    .await
}
