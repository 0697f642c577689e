//! Database row types shared across the store and API layers.
//! Response projections live beside the handlers that shape them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::status::OrderStatus;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "account_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    SuperSeller,
    UserSeller,
    Courier,
    Customer,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub is_active: bool,
    pub super_seller_id: Option<Uuid>,
    pub permissions: Option<serde_json::Value>,
    pub phone: Option<String>,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct OrderRow {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub customer_id: Uuid,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub notes: Option<String>,
    pub shipping_address: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Order line joined with its product's display fields. `unit_price` is the
/// snapshot taken at order time, not the live product price.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct OrderItemRow {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_image: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct StatusHistoryRow {
    pub id: Uuid,
    pub status: OrderStatus,
    pub previous_status: OrderStatus,
    pub actor_id: Uuid,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct ProductRow {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub purchase_price: Option<Decimal>,
    pub stock: i32,
    pub category_id: Option<Uuid>,
    pub is_active: bool,
    pub is_published: bool,
    pub is_approved: bool,
    pub barcode: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct VariantRow {
    pub id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub sku: Option<String>,
    pub price: Option<Decimal>,
    pub stock: i32,
    pub attributes: serde_json::Value,
    pub barcode: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct WarehouseRow {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
