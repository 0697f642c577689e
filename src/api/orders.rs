//! Seller order endpoints: projection reads, the status workflow, and the
//! append-only note log.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::SellerContext;
use crate::domain::notes::note_line;
use crate::domain::permissions::Permission;
use crate::domain::reporting::round_money;
use crate::domain::status::{transition_error, OrderStatus};
use crate::error::{ApiError, ApiResult};
use crate::models::{OrderItemRow, OrderRow, StatusHistoryRow};
use crate::state::AppState;
use crate::store;

#[derive(Debug, Serialize)]
pub struct OrderProjection {
    pub id: Uuid,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub notes: String,
    pub shipping_address: serde_json::Value,
    pub created_at: String,
    pub updated_at: String,
    pub customer: CustomerInfo,
    pub items: Vec<OrderItemView>,
    pub status_history: Vec<StatusHistoryView>,
}

#[derive(Debug, Serialize)]
pub struct CustomerInfo {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OrderItemView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_image: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    /// Derived, never stored: quantity times the order-time price snapshot.
    pub line_total: Decimal,
}

#[derive(Debug, Serialize)]
pub struct StatusHistoryView {
    pub id: Uuid,
    pub status: OrderStatus,
    pub previous_status: OrderStatus,
    pub actor_id: Uuid,
    pub notes: Option<String>,
    pub created_at: String,
}

impl OrderItemView {
    fn from_row(row: OrderItemRow) -> Self {
        let line_total = round_money(Decimal::from(row.quantity) * row.unit_price);
        Self {
            id: row.id,
            product_id: row.product_id,
            product_name: row.product_name,
            product_image: row.product_image,
            quantity: row.quantity,
            unit_price: round_money(row.unit_price),
            line_total,
        }
    }
}

impl StatusHistoryView {
    fn from_row(row: StatusHistoryRow) -> Self {
        Self {
            id: row.id,
            status: row.status,
            previous_status: row.previous_status,
            actor_id: row.actor_id,
            notes: row.notes,
            created_at: row.created_at.to_rfc3339(),
        }
    }
}

/// Load an order and enforce seller ownership. A missing order is NotFound;
/// an order owned by a different seller is Forbidden — the two are kept
/// distinct so delegated staff see why their scope is wrong.
async fn owned_order(
    db: &store::Db,
    ctx: &SellerContext,
    order_id: Uuid,
) -> ApiResult<OrderRow> {
    let order = store::orders::by_id(db, order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found".into()))?;
    if order.seller_id != ctx.actual_seller_id {
        return Err(ApiError::Forbidden(
            "This order belongs to a different seller".into(),
        ));
    }
    Ok(order)
}

async fn project(db: &store::Db, order: OrderRow) -> ApiResult<OrderProjection> {
    // three independent reads, issued together
    let (items, customer, history) = tokio::try_join!(
        store::orders::items(db, order.id),
        store::accounts::by_id(db, order.customer_id),
        store::orders::status_history(db, order.id),
    )?;
    let customer = customer
        .map(|c| CustomerInfo {
            id: c.id,
            name: c.display_name,
            email: c.email,
            phone: c.phone,
        })
        .ok_or_else(|| ApiError::NotFound("Order customer no longer exists".into()))?;
    Ok(OrderProjection {
        id: order.id,
        status: order.status,
        total_amount: round_money(order.total_amount),
        notes: order.notes.unwrap_or_default(),
        shipping_address: order.shipping_address,
        created_at: order.created_at.to_rfc3339(),
        updated_at: order.updated_at.to_rfc3339(),
        customer,
        items: items.into_iter().map(OrderItemView::from_row).collect(),
        status_history: history.into_iter().map(StatusHistoryView::from_row).collect(),
    })
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersParams {
    pub status: Option<OrderStatus>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct OrderSummary {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct PaginatedOrders {
    pub data: Vec<OrderSummary>,
    pub total: i64,
    pub page: u32,
}

pub async fn list_orders(
    State(state): State<AppState>,
    ctx: SellerContext,
    Query(params): Query<ListOrdersParams>,
) -> ApiResult<Json<PaginatedOrders>> {
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(20).min(100).max(1);
    let offset = super::page_offset(page, limit);
    let (rows, total) = store::orders::list(
        &state.db,
        ctx.actual_seller_id,
        params.status,
        i64::from(limit),
        offset,
    )
    .await?;
    let data = rows
        .into_iter()
        .map(|o| OrderSummary {
            id: o.id,
            customer_id: o.customer_id,
            status: o.status,
            total_amount: round_money(o.total_amount),
            created_at: o.created_at.to_rfc3339(),
        })
        .collect();
    Ok(Json(PaginatedOrders { data, total, page }))
}

pub async fn get_order(
    State(state): State<AppState>,
    ctx: SellerContext,
    Path(order_id): Path<Uuid>,
) -> ApiResult<Json<OrderProjection>> {
    let order = owned_order(&state.db, &ctx, order_id).await?;
    Ok(Json(project(&state.db, order).await?))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
    pub notes: Option<String>,
}

/// The order status workflow: validate locally, then apply the order update
/// and its audit row in one transaction.
pub async fn update_order_status(
    State(state): State<AppState>,
    ctx: SellerContext,
    Path(order_id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<Json<OrderProjection>> {
    ctx.ensure(Permission::ManageOrders)?;
    let order = owned_order(&state.db, &ctx, order_id).await?;
    if !order.status.can_transition(req.status) {
        return Err(ApiError::InvalidTransition(transition_error(
            order.status,
            req.status,
        )));
    }
    let note_text = req
        .notes
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);
    let line = note_text
        .as_deref()
        .map(|n| note_line(n, Utc::now()))
        .transpose()?;
    let updated = store::orders::apply_status_change(
        &state.db,
        order.id,
        order.status,
        req.status,
        ctx.account.id,
        line,
        note_text,
    )
    .await?
    .ok_or_else(|| {
        ApiError::Conflict("Order status changed concurrently; reload and retry".into())
    })?;
    tracing::info!(
        order_id = %order.id,
        from = %order.status,
        to = %req.status,
        actor = %ctx.account.id,
        "order status changed"
    );
    Ok(Json(project(&state.db, updated).await?))
}

#[derive(Debug, Serialize)]
pub struct NotesResponse {
    pub notes: String,
}

pub async fn get_order_notes(
    State(state): State<AppState>,
    ctx: SellerContext,
    Path(order_id): Path<Uuid>,
) -> ApiResult<Json<NotesResponse>> {
    let order = owned_order(&state.db, &ctx, order_id).await?;
    Ok(Json(NotesResponse {
        notes: order.notes.unwrap_or_default(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct AppendNoteRequest {
    pub note: String,
}

pub async fn append_order_note(
    State(state): State<AppState>,
    ctx: SellerContext,
    Path(order_id): Path<Uuid>,
    Json(req): Json<AppendNoteRequest>,
) -> ApiResult<Json<NotesResponse>> {
    ctx.ensure(Permission::ManageOrders)?;
    let order = owned_order(&state.db, &ctx, order_id).await?;
    let now = Utc::now();
    let line = note_line(&req.note, now)?;
    let notes = store::orders::append_note(&state.db, order.id, &line, now).await?;
    Ok(Json(NotesResponse { notes }))
}
