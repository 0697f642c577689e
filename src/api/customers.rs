//! Derived customer aggregates for the seller dashboard.

use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::SellerContext;
use crate::domain::customer::{classify, CustomerStatus};
use crate::domain::permissions::Permission;
use crate::domain::reporting::round_money;
use crate::error::ApiResult;
use crate::state::AppState;
use crate::store;

#[derive(Debug, Deserialize)]
pub struct CustomerParams {
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct CustomerView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub total_orders: i64,
    pub total_spent: Decimal,
    pub first_order_at: String,
    pub last_order_at: String,
    pub status: CustomerStatus,
}

#[derive(Debug, Serialize)]
pub struct CustomerMetrics {
    pub total: i64,
    pub vip: i64,
    pub active: i64,
    pub inactive: i64,
}

#[derive(Debug, Serialize)]
pub struct CustomersResponse {
    pub data: Vec<CustomerView>,
    pub metrics: CustomerMetrics,
    pub page: u32,
}

pub async fn list_customers(
    State(state): State<AppState>,
    ctx: SellerContext,
    Query(params): Query<CustomerParams>,
) -> ApiResult<Json<CustomersResponse>> {
    ctx.ensure(Permission::ViewAnalytics)?;
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(20).min(100).max(1);
    let offset = super::page_offset(page, limit);
    let search = params
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let (rows, summary) = tokio::try_join!(
        store::customers::aggregates(
            &state.db,
            ctx.actual_seller_id,
            search,
            i64::from(limit),
            offset,
        ),
        store::customers::summary(&state.db, ctx.actual_seller_id),
    )?;

    let now = Utc::now();
    let data = rows
        .into_iter()
        .map(|row| CustomerView {
            id: row.customer_id,
            name: row.display_name,
            email: row.email,
            total_orders: row.total_orders,
            total_spent: round_money(row.total_spent),
            first_order_at: row.first_order_at.to_rfc3339(),
            last_order_at: row.last_order_at.to_rfc3339(),
            status: classify(row.total_spent, row.last_order_at, now),
        })
        .collect();

    Ok(Json(CustomersResponse {
        data,
        metrics: CustomerMetrics {
            total: summary.total,
            vip: summary.vip,
            active: summary.active,
            inactive: summary.total - summary.vip - summary.active,
        },
        page,
    }))
}
