//! Warehouse endpoints. Mutations require the manage-warehouse grant.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::auth::SellerContext;
use crate::domain::permissions::Permission;
use crate::error::{ApiError, ApiResult};
use crate::models::WarehouseRow;
use crate::state::AppState;
use crate::store::{self, warehouses};

async fn owned_warehouse(
    db: &store::Db,
    ctx: &SellerContext,
    id: Uuid,
) -> ApiResult<WarehouseRow> {
    let warehouse = warehouses::by_id(db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Warehouse not found".into()))?;
    if warehouse.seller_id != ctx.actual_seller_id {
        return Err(ApiError::Forbidden(
            "This warehouse belongs to a different seller".into(),
        ));
    }
    Ok(warehouse)
}

pub async fn list_warehouses(
    State(state): State<AppState>,
    ctx: SellerContext,
) -> ApiResult<Json<Vec<WarehouseRow>>> {
    Ok(Json(
        warehouses::list(&state.db, ctx.actual_seller_id).await?,
    ))
}

#[derive(Debug, Deserialize, Validate)]
pub struct WarehouseRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub address: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

pub async fn create_warehouse(
    State(state): State<AppState>,
    ctx: SellerContext,
    Json(req): Json<WarehouseRequest>,
) -> ApiResult<(StatusCode, Json<WarehouseRow>)> {
    ctx.ensure(Permission::ManageWarehouse)?;
    req.validate()?;
    let row = warehouses::upsert(
        &state.db,
        ctx.actual_seller_id,
        None,
        &req.name,
        req.address.as_deref(),
        req.is_default,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(row)))
}

pub async fn update_warehouse(
    State(state): State<AppState>,
    ctx: SellerContext,
    Path(warehouse_id): Path<Uuid>,
    Json(req): Json<WarehouseRequest>,
) -> ApiResult<Json<WarehouseRow>> {
    ctx.ensure(Permission::ManageWarehouse)?;
    req.validate()?;
    let existing = owned_warehouse(&state.db, &ctx, warehouse_id).await?;
    let row = warehouses::upsert(
        &state.db,
        ctx.actual_seller_id,
        Some(existing.id),
        &req.name,
        req.address.as_deref(),
        req.is_default,
    )
    .await?;
    Ok(Json(row))
}

pub async fn delete_warehouse(
    State(state): State<AppState>,
    ctx: SellerContext,
    Path(warehouse_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    ctx.ensure(Permission::ManageWarehouse)?;
    let existing = owned_warehouse(&state.db, &ctx, warehouse_id).await?;
    warehouses::delete(&state.db, existing.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
