//! Product and variant persistence. Soft deletes only: historical order
//! items keep referencing the row after a product is retired.

use rust_decimal::Decimal;
use uuid::Uuid;

use super::{with_retry, Db};
use crate::models::{ProductRow, VariantRow};

const PRODUCT_COLUMNS: &str = "id, seller_id, name, description, price, purchase_price, stock, \
     category_id, is_active, is_published, is_approved, barcode, image_url, \
     created_at, updated_at";

const VARIANT_COLUMNS: &str = "id, product_id, name, sku, price, stock, attributes, barcode, \
     is_active, created_at, updated_at";

pub async fn by_id(db: &Db, id: Uuid) -> Result<Option<ProductRow>, sqlx::Error> {
    with_retry(|| {
        let pool = db.pool().clone();
        async move {
            sqlx::query_as::<_, ProductRow>(&format!(
                "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
            ))
            .bind(id)
            .fetch_optional(&pool)
            .await
        }
    })
    .await
}

pub async fn list(
    db: &Db,
    seller_id: Uuid,
    search: Option<String>,
    category_id: Option<Uuid>,
    include_inactive: bool,
    limit: i64,
    offset: i64,
) -> Result<(Vec<ProductRow>, i64), sqlx::Error> {
    let filter = "seller_id = $1 \
         AND ($2::text IS NULL OR name ILIKE '%' || $2 || '%') \
         AND ($3::uuid IS NULL OR category_id = $3) \
         AND ($4 OR is_active)";
    let rows = with_retry(|| {
        let pool = db.pool().clone();
        let search = search.clone();
        async move {
            sqlx::query_as::<_, ProductRow>(&format!(
                "SELECT {PRODUCT_COLUMNS} FROM products WHERE {filter} \
                 ORDER BY created_at DESC LIMIT $5 OFFSET $6"
            ))
            .bind(seller_id)
            .bind(search)
            .bind(category_id)
            .bind(include_inactive)
            .bind(limit)
            .bind(offset)
            .fetch_all(&pool)
            .await
        }
    })
    .await?;
    let total: (i64,) = with_retry(|| {
        let pool = db.pool().clone();
        let search = search.clone();
        async move {
            sqlx::query_as(&format!("SELECT COUNT(*) FROM products WHERE {filter}"))
                .bind(seller_id)
                .bind(search)
                .bind(category_id)
                .bind(include_inactive)
                .fetch_one(&pool)
                .await
        }
    })
    .await?;
    Ok((rows, total.0))
}

#[derive(Clone)]
pub struct NewProduct {
    pub seller_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub purchase_price: Option<Decimal>,
    pub stock: i32,
    pub category_id: Option<Uuid>,
    pub barcode: Option<String>,
    pub image_url: Option<String>,
}

/// Claim a code in the shared barcode registry. The registry's primary key
/// rejects a code already held by any product or variant, regardless of
/// which table each copy lives in; a duplicate surfaces as a unique
/// violation. No-op when no barcode is being written.
async fn claim_barcode(
    conn: &mut sqlx::PgConnection,
    code: Option<&str>,
) -> Result<(), sqlx::Error> {
    if let Some(code) = code {
        sqlx::query("INSERT INTO barcodes (code) VALUES ($1)")
            .bind(code)
            .execute(conn)
            .await?;
    }
    Ok(())
}

/// Release a registry claim once no catalog row references it. Must run
/// after the referencing row has been updated or deleted.
async fn release_barcode(
    conn: &mut sqlx::PgConnection,
    code: Option<&str>,
) -> Result<(), sqlx::Error> {
    if let Some(code) = code {
        sqlx::query("DELETE FROM barcodes WHERE code = $1")
            .bind(code)
            .execute(conn)
            .await?;
    }
    Ok(())
}

pub async fn insert(db: &Db, new: &NewProduct) -> Result<ProductRow, sqlx::Error> {
    with_retry(|| {
        let pool = db.pool().clone();
        let new = new.clone();
        async move {
            let mut tx = pool.begin().await?;
            claim_barcode(&mut tx, new.barcode.as_deref()).await?;
            let row = sqlx::query_as::<_, ProductRow>(&format!(
                "INSERT INTO products \
                     (id, seller_id, name, description, price, purchase_price, stock, \
                      category_id, barcode, image_url, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NOW(), NOW()) \
                 RETURNING {PRODUCT_COLUMNS}"
            ))
            .bind(Uuid::now_v7())
            .bind(new.seller_id)
            .bind(&new.name)
            .bind(&new.description)
            .bind(new.price)
            .bind(new.purchase_price)
            .bind(new.stock)
            .bind(new.category_id)
            .bind(&new.barcode)
            .bind(&new.image_url)
            .fetch_one(&mut *tx)
            .await?;
            tx.commit().await?;
            Ok(row)
        }
    })
    .await
}

#[derive(Clone)]
pub struct ProductUpdate {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub purchase_price: Option<Decimal>,
    pub category_id: Option<Uuid>,
    pub barcode: Option<String>,
    pub image_url: Option<String>,
}

pub async fn update(
    db: &Db,
    id: Uuid,
    update: &ProductUpdate,
) -> Result<ProductRow, sqlx::Error> {
    with_retry(|| {
        let pool = db.pool().clone();
        let update = update.clone();
        async move {
            let mut tx = pool.begin().await?;
            let (previous,): (Option<String>,) =
                sqlx::query_as("SELECT barcode FROM products WHERE id = $1 FOR UPDATE")
                    .bind(id)
                    .fetch_one(&mut *tx)
                    .await?;
            let changed = previous.as_deref() != update.barcode.as_deref();
            if changed {
                claim_barcode(&mut tx, update.barcode.as_deref()).await?;
            }
            let row = sqlx::query_as::<_, ProductRow>(&format!(
                "UPDATE products \
                 SET name = $2, description = $3, price = $4, purchase_price = $5, \
                     category_id = $6, barcode = $7, image_url = $8, updated_at = NOW() \
                 WHERE id = $1 \
                 RETURNING {PRODUCT_COLUMNS}"
            ))
            .bind(id)
            .bind(&update.name)
            .bind(&update.description)
            .bind(update.price)
            .bind(update.purchase_price)
            .bind(update.category_id)
            .bind(&update.barcode)
            .bind(&update.image_url)
            .fetch_one(&mut *tx)
            .await?;
            if changed {
                release_barcode(&mut tx, previous.as_deref()).await?;
            }
            tx.commit().await?;
            Ok(row)
        }
    })
    .await
}

/// Soft delete. The row stays so historical order items keep resolving.
pub async fn deactivate(db: &Db, id: Uuid) -> Result<(), sqlx::Error> {
    with_retry(|| {
        let pool = db.pool().clone();
        async move {
            sqlx::query(
                "UPDATE products SET is_active = FALSE, updated_at = NOW() WHERE id = $1",
            )
            .bind(id)
            .execute(&pool)
            .await
            .map(|_| ())
        }
    })
    .await
}

/// Relative stock adjustment; the guard keeps stock non-negative. Returns
/// None when the adjustment would underflow.
pub async fn adjust_stock(
    db: &Db,
    id: Uuid,
    delta: i32,
) -> Result<Option<ProductRow>, sqlx::Error> {
    with_retry(|| {
        let pool = db.pool().clone();
        async move {
            sqlx::query_as::<_, ProductRow>(&format!(
                "UPDATE products SET stock = stock + $2, updated_at = NOW() \
                 WHERE id = $1 AND stock + $2 >= 0 \
                 RETURNING {PRODUCT_COLUMNS}"
            ))
            .bind(id)
            .bind(delta)
            .fetch_optional(&pool)
            .await
        }
    })
    .await
}

pub async fn set_active(db: &Db, id: Uuid, is_active: bool) -> Result<ProductRow, sqlx::Error> {
    with_retry(|| {
        let pool = db.pool().clone();
        async move {
            sqlx::query_as::<_, ProductRow>(&format!(
                "UPDATE products SET is_active = $2, updated_at = NOW() \
                 WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
            ))
            .bind(id)
            .bind(is_active)
            .fetch_one(&pool)
            .await
        }
    })
    .await
}

pub async fn set_published(
    db: &Db,
    id: Uuid,
    is_published: bool,
) -> Result<ProductRow, sqlx::Error> {
    with_retry(|| {
        let pool = db.pool().clone();
        async move {
            sqlx::query_as::<_, ProductRow>(&format!(
                "UPDATE products SET is_published = $2, updated_at = NOW() \
                 WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
            ))
            .bind(id)
            .bind(is_published)
            .fetch_one(&pool)
            .await
        }
    })
    .await
}

/// Pre-check across the shared product/variant barcode namespace, used to
/// produce a friendly validation message. The barcodes registry is the
/// final authority under races.
pub async fn barcode_in_use(
    db: &Db,
    barcode: &str,
    exclude_product: Option<Uuid>,
    exclude_variant: Option<Uuid>,
) -> Result<bool, sqlx::Error> {
    let row: (bool,) = with_retry(|| {
        let pool = db.pool().clone();
        let barcode = barcode.to_string();
        async move {
            sqlx::query_as(
                "SELECT EXISTS(SELECT 1 FROM products WHERE barcode = $1 AND id IS DISTINCT FROM $2) \
                     OR EXISTS(SELECT 1 FROM product_variants WHERE barcode = $1 AND id IS DISTINCT FROM $3)",
            )
            .bind(barcode)
            .bind(exclude_product)
            .bind(exclude_variant)
            .fetch_one(&pool)
            .await
        }
    })
    .await?;
    Ok(row.0)
}

/// Resolve a scanned code against the seller's products, then variants.
pub async fn find_by_barcode(
    db: &Db,
    seller_id: Uuid,
    barcode: &str,
) -> Result<Option<(ProductRow, Option<VariantRow>)>, sqlx::Error> {
    let product = with_retry(|| {
        let pool = db.pool().clone();
        let barcode = barcode.to_string();
        async move {
            sqlx::query_as::<_, ProductRow>(&format!(
                "SELECT {PRODUCT_COLUMNS} FROM products \
                 WHERE seller_id = $1 AND barcode = $2 AND is_active"
            ))
            .bind(seller_id)
            .bind(barcode)
            .fetch_optional(&pool)
            .await
        }
    })
    .await?;
    if let Some(product) = product {
        return Ok(Some((product, None)));
    }
    let variant = with_retry(|| {
        let pool = db.pool().clone();
        let barcode = barcode.to_string();
        async move {
            sqlx::query_as::<_, VariantRow>(
                "SELECT v.id, v.product_id, v.name, v.sku, v.price, v.stock, \
                        v.attributes, v.barcode, v.is_active, v.created_at, v.updated_at \
                 FROM product_variants v \
                 JOIN products p ON p.id = v.product_id \
                 WHERE p.seller_id = $1 AND v.barcode = $2 AND v.is_active",
            )
            .bind(seller_id)
            .bind(barcode)
            .fetch_optional(&pool)
            .await
        }
    })
    .await?;
    match variant {
        Some(variant) => {
            let product = by_id(db, variant.product_id).await?;
            Ok(product.map(|p| (p, Some(variant))))
        }
        None => Ok(None),
    }
}

pub async fn variant_by_id(db: &Db, id: Uuid) -> Result<Option<VariantRow>, sqlx::Error> {
    with_retry(|| {
        let pool = db.pool().clone();
        async move {
            sqlx::query_as::<_, VariantRow>(&format!(
                "SELECT {VARIANT_COLUMNS} FROM product_variants WHERE id = $1"
            ))
            .bind(id)
            .fetch_optional(&pool)
            .await
        }
    })
    .await
}

#[derive(Clone)]
pub struct VariantInput {
    pub name: String,
    pub sku: Option<String>,
    pub price: Option<Decimal>,
    pub stock: i32,
    pub attributes: serde_json::Value,
    pub barcode: Option<String>,
}

pub async fn insert_variant(
    db: &Db,
    product_id: Uuid,
    input: &VariantInput,
) -> Result<VariantRow, sqlx::Error> {
    with_retry(|| {
        let pool = db.pool().clone();
        let input = input.clone();
        async move {
            let mut tx = pool.begin().await?;
            claim_barcode(&mut tx, input.barcode.as_deref()).await?;
            let row = sqlx::query_as::<_, VariantRow>(&format!(
                "INSERT INTO product_variants \
                     (id, product_id, name, sku, price, stock, attributes, barcode, \
                      created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW(), NOW()) \
                 RETURNING {VARIANT_COLUMNS}"
            ))
            .bind(Uuid::now_v7())
            .bind(product_id)
            .bind(&input.name)
            .bind(&input.sku)
            .bind(input.price)
            .bind(input.stock)
            .bind(&input.attributes)
            .bind(&input.barcode)
            .fetch_one(&mut *tx)
            .await?;
            tx.commit().await?;
            Ok(row)
        }
    })
    .await
}

pub async fn update_variant(
    db: &Db,
    id: Uuid,
    input: &VariantInput,
) -> Result<VariantRow, sqlx::Error> {
    with_retry(|| {
        let pool = db.pool().clone();
        let input = input.clone();
        async move {
            let mut tx = pool.begin().await?;
            let (previous,): (Option<String>,) =
                sqlx::query_as("SELECT barcode FROM product_variants WHERE id = $1 FOR UPDATE")
                    .bind(id)
                    .fetch_one(&mut *tx)
                    .await?;
            let changed = previous.as_deref() != input.barcode.as_deref();
            if changed {
                claim_barcode(&mut tx, input.barcode.as_deref()).await?;
            }
            let row = sqlx::query_as::<_, VariantRow>(&format!(
                "UPDATE product_variants \
                 SET name = $2, sku = $3, price = $4, stock = $5, attributes = $6, \
                     barcode = $7, updated_at = NOW() \
                 WHERE id = $1 \
                 RETURNING {VARIANT_COLUMNS}"
            ))
            .bind(id)
            .bind(&input.name)
            .bind(&input.sku)
            .bind(input.price)
            .bind(input.stock)
            .bind(&input.attributes)
            .bind(&input.barcode)
            .fetch_one(&mut *tx)
            .await?;
            if changed {
                release_barcode(&mut tx, previous.as_deref()).await?;
            }
            tx.commit().await?;
            Ok(row)
        }
    })
    .await
}

pub async fn delete_variant(db: &Db, id: Uuid) -> Result<(), sqlx::Error> {
    with_retry(|| {
        let pool = db.pool().clone();
        async move {
            let mut tx = pool.begin().await?;
            let freed: Option<(Option<String>,)> =
                sqlx::query_as("DELETE FROM product_variants WHERE id = $1 RETURNING barcode")
                    .bind(id)
                    .fetch_optional(&mut *tx)
                    .await?;
            if let Some((barcode,)) = freed {
                release_barcode(&mut tx, barcode.as_deref()).await?;
            }
            tx.commit().await?;
            Ok(())
        }
    })
    .await
}
