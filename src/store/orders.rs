//! Order queries and the transactional status-change write.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{with_retry, Db};
use crate::domain::status::OrderStatus;
use crate::models::{OrderItemRow, OrderRow, StatusHistoryRow};

const ORDER_COLUMNS: &str = "id, seller_id, customer_id, status, total_amount, notes, \
     shipping_address, created_at, updated_at";

pub async fn by_id(db: &Db, id: Uuid) -> Result<Option<OrderRow>, sqlx::Error> {
    with_retry(|| {
        let pool = db.pool().clone();
        async move {
            sqlx::query_as::<_, OrderRow>(&format!(
                "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
            ))
            .bind(id)
            .fetch_optional(&pool)
            .await
        }
    })
    .await
}

pub async fn items(db: &Db, order_id: Uuid) -> Result<Vec<OrderItemRow>, sqlx::Error> {
    with_retry(|| {
        let pool = db.pool().clone();
        async move {
            sqlx::query_as::<_, OrderItemRow>(
                "SELECT oi.id, oi.product_id, p.name AS product_name, \
                        p.image_url AS product_image, oi.quantity, oi.unit_price \
                 FROM order_items oi \
                 JOIN products p ON p.id = oi.product_id \
                 WHERE oi.order_id = $1 \
                 ORDER BY oi.id",
            )
            .bind(order_id)
            .fetch_all(&pool)
            .await
        }
    })
    .await
}

pub async fn status_history(
    db: &Db,
    order_id: Uuid,
) -> Result<Vec<StatusHistoryRow>, sqlx::Error> {
    with_retry(|| {
        let pool = db.pool().clone();
        async move {
            sqlx::query_as::<_, StatusHistoryRow>(
                "SELECT id, status, previous_status, actor_id, notes, created_at \
                 FROM order_status_history \
                 WHERE order_id = $1 \
                 ORDER BY created_at",
            )
            .bind(order_id)
            .fetch_all(&pool)
            .await
        }
    })
    .await
}

pub async fn list(
    db: &Db,
    seller_id: Uuid,
    status: Option<OrderStatus>,
    limit: i64,
    offset: i64,
) -> Result<(Vec<OrderRow>, i64), sqlx::Error> {
    let rows = with_retry(|| {
        let pool = db.pool().clone();
        async move {
            sqlx::query_as::<_, OrderRow>(&format!(
                "SELECT {ORDER_COLUMNS} FROM orders \
                 WHERE seller_id = $1 AND ($2::order_status IS NULL OR status = $2) \
                 ORDER BY created_at DESC LIMIT $3 OFFSET $4"
            ))
            .bind(seller_id)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(&pool)
            .await
        }
    })
    .await?;
    let total: (i64,) = with_retry(|| {
        let pool = db.pool().clone();
        async move {
            sqlx::query_as(
                "SELECT COUNT(*) FROM orders \
                 WHERE seller_id = $1 AND ($2::order_status IS NULL OR status = $2)",
            )
            .bind(seller_id)
            .bind(status)
            .fetch_one(&pool)
            .await
        }
    })
    .await?;
    Ok((rows, total.0))
}

/// Apply a validated status change: update the order and insert exactly one
/// history row, in a single transaction. Callers have already checked
/// ownership and transition legality against `previous`, but that check ran
/// outside this transaction, so the UPDATE re-asserts the expected current
/// status. Returns `None` without mutating anything when the order no
/// longer sits at `previous` (a concurrent writer got there first, or a
/// retried attempt already committed).
pub async fn apply_status_change(
    db: &Db,
    order_id: Uuid,
    previous: OrderStatus,
    next: OrderStatus,
    actor_id: Uuid,
    note_line: Option<String>,
    note_text: Option<String>,
) -> Result<Option<OrderRow>, sqlx::Error> {
    with_retry(|| {
        let pool = db.pool().clone();
        let note_line = note_line.clone();
        let note_text = note_text.clone();
        async move {
            let mut tx = pool.begin().await?;
            let order = sqlx::query_as::<_, OrderRow>(&format!(
                "UPDATE orders \
                 SET status = $2, \
                     notes = COALESCE(notes, '') || $3, \
                     updated_at = NOW() \
                 WHERE id = $1 AND status = $4 \
                 RETURNING {ORDER_COLUMNS}"
            ))
            .bind(order_id)
            .bind(next)
            .bind(note_line.as_deref().unwrap_or(""))
            .bind(previous)
            .fetch_optional(&mut *tx)
            .await?;
            let Some(order) = order else {
                tx.rollback().await?;
                return Ok(None);
            };
            sqlx::query(
                "INSERT INTO order_status_history \
                     (id, order_id, status, previous_status, actor_id, notes, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, NOW())",
            )
            .bind(Uuid::now_v7())
            .bind(order_id)
            .bind(next)
            .bind(previous)
            .bind(actor_id)
            .bind(note_text.as_deref())
            .execute(&mut *tx)
            .await?;
            tx.commit().await?;
            Ok(Some(order))
        }
    })
    .await
}

/// Concatenate one note line onto the order's flat notes blob and return
/// the blob post-append. Prior content is never replaced.
pub async fn append_note(
    db: &Db,
    order_id: Uuid,
    line: &str,
    now: DateTime<Utc>,
) -> Result<String, sqlx::Error> {
    let row: (String,) = with_retry(|| {
        let pool = db.pool().clone();
        let line = line.to_string();
        async move {
            sqlx::query_as(
                "UPDATE orders \
                 SET notes = COALESCE(notes, '') || $2, updated_at = $3 \
                 WHERE id = $1 \
                 RETURNING COALESCE(notes, '')",
            )
            .bind(order_id)
            .bind(line)
            .bind(now)
            .fetch_one(&pool)
            .await
        }
    })
    .await?;
    Ok(row.0)
}
