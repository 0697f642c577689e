//! Warehouse persistence. A seller has at most one default warehouse;
//! setting a new default unsets the others in the same transaction.

use uuid::Uuid;

use super::{with_retry, Db};
use crate::models::WarehouseRow;

const WAREHOUSE_COLUMNS: &str =
    "id, seller_id, name, address, is_default, created_at, updated_at";

pub async fn by_id(db: &Db, id: Uuid) -> Result<Option<WarehouseRow>, sqlx::Error> {
    with_retry(|| {
        let pool = db.pool().clone();
        async move {
            sqlx::query_as::<_, WarehouseRow>(&format!(
                "SELECT {WAREHOUSE_COLUMNS} FROM warehouses WHERE id = $1"
            ))
            .bind(id)
            .fetch_optional(&pool)
            .await
        }
    })
    .await
}

pub async fn list(db: &Db, seller_id: Uuid) -> Result<Vec<WarehouseRow>, sqlx::Error> {
    with_retry(|| {
        let pool = db.pool().clone();
        async move {
            sqlx::query_as::<_, WarehouseRow>(&format!(
                "SELECT {WAREHOUSE_COLUMNS} FROM warehouses \
                 WHERE seller_id = $1 ORDER BY is_default DESC, name"
            ))
            .bind(seller_id)
            .fetch_all(&pool)
            .await
        }
    })
    .await
}

/// Insert or update, handling the single-default invariant transactionally:
/// when `is_default` is set, every other warehouse of the seller is unset
/// before the write lands.
pub async fn upsert(
    db: &Db,
    seller_id: Uuid,
    id: Option<Uuid>,
    name: &str,
    address: Option<&str>,
    is_default: bool,
) -> Result<WarehouseRow, sqlx::Error> {
    with_retry(|| {
        let pool = db.pool().clone();
        let name = name.to_string();
        let address = address.map(str::to_string);
        async move {
            let mut tx = pool.begin().await?;
            if is_default {
                sqlx::query(
                    "UPDATE warehouses SET is_default = FALSE, updated_at = NOW() \
                     WHERE seller_id = $1 AND is_default AND id IS DISTINCT FROM $2",
                )
                .bind(seller_id)
                .bind(id)
                .execute(&mut *tx)
                .await?;
            }
            let row = match id {
                Some(id) => {
                    sqlx::query_as::<_, WarehouseRow>(&format!(
                        "UPDATE warehouses \
                         SET name = $2, address = $3, is_default = $4, updated_at = NOW() \
                         WHERE id = $1 \
                         RETURNING {WAREHOUSE_COLUMNS}"
                    ))
                    .bind(id)
                    .bind(&name)
                    .bind(&address)
                    .bind(is_default)
                    .fetch_one(&mut *tx)
                    .await?
                }
                None => {
                    sqlx::query_as::<_, WarehouseRow>(&format!(
                        "INSERT INTO warehouses \
                             (id, seller_id, name, address, is_default, created_at, updated_at) \
                         VALUES ($1, $2, $3, $4, $5, NOW(), NOW()) \
                         RETURNING {WAREHOUSE_COLUMNS}"
                    ))
                    .bind(Uuid::now_v7())
                    .bind(seller_id)
                    .bind(&name)
                    .bind(&address)
                    .bind(is_default)
                    .fetch_one(&mut *tx)
                    .await?
                }
            };
            tx.commit().await?;
            Ok(row)
        }
    })
    .await
}

pub async fn delete(db: &Db, id: Uuid) -> Result<(), sqlx::Error> {
    with_retry(|| {
        let pool = db.pool().clone();
        async move {
            sqlx::query("DELETE FROM warehouses WHERE id = $1")
                .bind(id)
                .execute(&pool)
                .await
                .map(|_| ())
        }
    })
    .await
}
