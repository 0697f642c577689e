//! Seller catalog endpoints: products, variants, stock, publish state, and
//! barcode lookup.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use crate::auth::SellerContext;
use crate::domain::permissions::Permission;
use crate::domain::reporting::round_money;
use crate::error::{ApiError, ApiResult};
use crate::models::{ProductRow, VariantRow};
use crate::state::AppState;
use crate::store::{self, products};

#[derive(Debug, Serialize)]
pub struct ProductView {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    /// Redacted for delegated callers without the view-purchase-price grant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_price: Option<Decimal>,
    pub stock: i32,
    pub category_id: Option<Uuid>,
    pub is_active: bool,
    pub is_published: bool,
    pub is_approved: bool,
    pub barcode: Option<String>,
    pub image_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl ProductView {
    fn from_row(row: ProductRow, ctx: &SellerContext) -> Self {
        let purchase_price = if ctx.can_view_purchase_price() {
            row.purchase_price.map(round_money)
        } else {
            None
        };
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            price: round_money(row.price),
            purchase_price,
            stock: row.stock,
            category_id: row.category_id,
            is_active: row.is_active,
            is_published: row.is_published,
            is_approved: row.is_approved,
            barcode: row.barcode,
            image_url: row.image_url,
            created_at: row.created_at.to_rfc3339(),
            updated_at: row.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VariantView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub sku: Option<String>,
    pub price: Option<Decimal>,
    pub stock: i32,
    pub attributes: serde_json::Value,
    pub barcode: Option<String>,
    pub is_active: bool,
}

impl From<VariantRow> for VariantView {
    fn from(row: VariantRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            name: row.name,
            sku: row.sku,
            price: row.price.map(round_money),
            stock: row.stock,
            attributes: row.attributes,
            barcode: row.barcode,
            is_active: row.is_active,
        }
    }
}

async fn owned_product(
    db: &store::Db,
    ctx: &SellerContext,
    product_id: Uuid,
) -> ApiResult<ProductRow> {
    let product = products::by_id(db, product_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".into()))?;
    if product.seller_id != ctx.actual_seller_id {
        return Err(ApiError::Forbidden(
            "This product belongs to a different seller".into(),
        ));
    }
    Ok(product)
}

/// Friendly-message pre-check for the shared barcode namespace; the unique
/// indexes stay authoritative under concurrent writes.
async fn check_barcode_free(
    db: &store::Db,
    barcode: Option<&str>,
    exclude_product: Option<Uuid>,
    exclude_variant: Option<Uuid>,
) -> ApiResult<()> {
    if let Some(code) = barcode {
        if products::barcode_in_use(db, code, exclude_product, exclude_variant).await? {
            return Err(ApiError::Conflict(format!(
                "Barcode {code} is already assigned"
            )));
        }
    }
    Ok(())
}

fn require_positive_price(price: Decimal) -> ApiResult<()> {
    if price <= Decimal::ZERO {
        return Err(ApiError::Validation("Price must be positive".into()));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct ListProductsParams {
    pub search: Option<String>,
    pub category_id: Option<Uuid>,
    pub include_inactive: Option<bool>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct PaginatedProducts {
    pub data: Vec<ProductView>,
    pub total: i64,
    pub page: u32,
}

pub async fn list_products(
    State(state): State<AppState>,
    ctx: SellerContext,
    Query(params): Query<ListProductsParams>,
) -> ApiResult<Json<PaginatedProducts>> {
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(20).min(100).max(1);
    let offset = super::page_offset(page, limit);
    let search = params
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    let (rows, total) = products::list(
        &state.db,
        ctx.actual_seller_id,
        search,
        params.category_id,
        params.include_inactive.unwrap_or(false),
        i64::from(limit),
        offset,
    )
    .await?;
    let data = rows
        .into_iter()
        .map(|row| ProductView::from_row(row, &ctx))
        .collect();
    Ok(Json(PaginatedProducts { data, total, page }))
}

pub async fn get_product(
    State(state): State<AppState>,
    ctx: SellerContext,
    Path(product_id): Path<Uuid>,
) -> ApiResult<Json<ProductView>> {
    let product = owned_product(&state.db, &ctx, product_id).await?;
    Ok(Json(ProductView::from_row(product, &ctx)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub purchase_price: Option<Decimal>,
    #[validate(range(min = 0))]
    pub stock: Option<i32>,
    pub category_id: Option<Uuid>,
    pub barcode: Option<String>,
    pub image_url: Option<String>,
}

pub async fn create_product(
    State(state): State<AppState>,
    ctx: SellerContext,
    Json(req): Json<CreateProductRequest>,
) -> ApiResult<(StatusCode, Json<ProductView>)> {
    ctx.ensure(Permission::ManageProducts)?;
    req.validate()?;
    require_positive_price(req.price)?;
    check_barcode_free(&state.db, req.barcode.as_deref(), None, None).await?;
    let row = products::insert(
        &state.db,
        &products::NewProduct {
            seller_id: ctx.actual_seller_id,
            name: req.name,
            description: req.description,
            price: req.price,
            purchase_price: req.purchase_price,
            stock: req.stock.unwrap_or(0),
            category_id: req.category_id,
            barcode: req.barcode,
            image_url: req.image_url,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(ProductView::from_row(row, &ctx))))
}

pub async fn update_product(
    State(state): State<AppState>,
    ctx: SellerContext,
    Path(product_id): Path<Uuid>,
    Json(req): Json<CreateProductRequest>,
) -> ApiResult<Json<ProductView>> {
    ctx.ensure(Permission::ManageProducts)?;
    req.validate()?;
    require_positive_price(req.price)?;
    let existing = owned_product(&state.db, &ctx, product_id).await?;
    check_barcode_free(&state.db, req.barcode.as_deref(), Some(existing.id), None).await?;
    let row = products::update(
        &state.db,
        existing.id,
        &products::ProductUpdate {
            name: req.name,
            description: req.description,
            price: req.price,
            purchase_price: req.purchase_price,
            category_id: req.category_id,
            barcode: req.barcode,
            image_url: req.image_url,
        },
    )
    .await?;
    Ok(Json(ProductView::from_row(row, &ctx)))
}

pub async fn delete_product(
    State(state): State<AppState>,
    ctx: SellerContext,
    Path(product_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    ctx.ensure(Permission::ManageProducts)?;
    let product = owned_product(&state.db, &ctx, product_id).await?;
    products::deactivate(&state.db, product.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    pub delta: i32,
}

pub async fn adjust_stock(
    State(state): State<AppState>,
    ctx: SellerContext,
    Path(product_id): Path<Uuid>,
    Json(req): Json<AdjustStockRequest>,
) -> ApiResult<Json<ProductView>> {
    ctx.ensure(Permission::ManageWarehouse)?;
    let product = owned_product(&state.db, &ctx, product_id).await?;
    let row = products::adjust_stock(&state.db, product.id, req.delta)
        .await?
        .ok_or_else(|| {
            ApiError::Validation("Adjustment would make stock negative".into())
        })?;
    Ok(Json(ProductView::from_row(row, &ctx)))
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

pub async fn set_product_active(
    State(state): State<AppState>,
    ctx: SellerContext,
    Path(product_id): Path<Uuid>,
    Json(req): Json<SetActiveRequest>,
) -> ApiResult<Json<ProductView>> {
    ctx.ensure(Permission::ManageWarehouse)?;
    let product = owned_product(&state.db, &ctx, product_id).await?;
    let row = products::set_active(&state.db, product.id, req.is_active).await?;
    Ok(Json(ProductView::from_row(row, &ctx)))
}

#[derive(Debug, Deserialize)]
pub struct SetPublishedRequest {
    pub is_published: bool,
}

pub async fn set_product_published(
    State(state): State<AppState>,
    ctx: SellerContext,
    Path(product_id): Path<Uuid>,
    Json(req): Json<SetPublishedRequest>,
) -> ApiResult<Json<ProductView>> {
    let needed = if req.is_published {
        Permission::PublishProducts
    } else {
        Permission::UnpublishProducts
    };
    ctx.ensure(needed)?;
    let product = owned_product(&state.db, &ctx, product_id).await?;
    // customer visibility additionally requires the admin approval flag
    let row = products::set_published(&state.db, product.id, req.is_published).await?;
    Ok(Json(ProductView::from_row(row, &ctx)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct VariantRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub sku: Option<String>,
    pub price: Option<Decimal>,
    #[validate(range(min = 0))]
    pub stock: Option<i32>,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    pub barcode: Option<String>,
}

pub async fn create_variant(
    State(state): State<AppState>,
    ctx: SellerContext,
    Path(product_id): Path<Uuid>,
    Json(req): Json<VariantRequest>,
) -> ApiResult<(StatusCode, Json<VariantView>)> {
    ctx.ensure(Permission::ManageProducts)?;
    req.validate()?;
    if let Some(price) = req.price {
        require_positive_price(price)?;
    }
    let product = owned_product(&state.db, &ctx, product_id).await?;
    check_barcode_free(&state.db, req.barcode.as_deref(), None, None).await?;
    let row = products::insert_variant(
        &state.db,
        product.id,
        &products::VariantInput {
            name: req.name,
            sku: req.sku,
            price: req.price,
            stock: req.stock.unwrap_or(0),
            attributes: serde_json::to_value(req.attributes)
                .map_err(|e| ApiError::Internal(e.into()))?,
            barcode: req.barcode,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(row.into())))
}

async fn owned_variant(
    db: &store::Db,
    ctx: &SellerContext,
    variant_id: Uuid,
) -> ApiResult<VariantRow> {
    let variant = products::variant_by_id(db, variant_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Variant not found".into()))?;
    // ownership flows through the parent product
    owned_product(db, ctx, variant.product_id).await?;
    Ok(variant)
}

pub async fn update_variant(
    State(state): State<AppState>,
    ctx: SellerContext,
    Path(variant_id): Path<Uuid>,
    Json(req): Json<VariantRequest>,
) -> ApiResult<Json<VariantView>> {
    ctx.ensure(Permission::ManageProducts)?;
    req.validate()?;
    if let Some(price) = req.price {
        require_positive_price(price)?;
    }
    let variant = owned_variant(&state.db, &ctx, variant_id).await?;
    check_barcode_free(&state.db, req.barcode.as_deref(), None, Some(variant.id)).await?;
    let row = products::update_variant(
        &state.db,
        variant.id,
        &products::VariantInput {
            name: req.name,
            sku: req.sku,
            price: req.price,
            stock: req.stock.unwrap_or(variant.stock),
            attributes: serde_json::to_value(req.attributes)
                .map_err(|e| ApiError::Internal(e.into()))?,
            barcode: req.barcode,
        },
    )
    .await?;
    Ok(Json(row.into()))
}

pub async fn delete_variant(
    State(state): State<AppState>,
    ctx: SellerContext,
    Path(variant_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    ctx.ensure(Permission::ManageProducts)?;
    let variant = owned_variant(&state.db, &ctx, variant_id).await?;
    products::delete_variant(&state.db, variant.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct BarcodeLookupResponse {
    /// "product" when the code sits on a product, "variant" otherwise.
    pub match_kind: &'static str,
    pub product: ProductView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<VariantView>,
}

pub async fn lookup_barcode(
    State(state): State<AppState>,
    ctx: SellerContext,
    Path(code): Path<String>,
) -> ApiResult<Json<BarcodeLookupResponse>> {
    ctx.ensure(Permission::UseBarcode)?;
    let found = products::find_by_barcode(&state.db, ctx.actual_seller_id, &code)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No item with barcode {code}")))?;
    let (product, variant) = found;
    Ok(Json(BarcodeLookupResponse {
        match_kind: if variant.is_some() { "variant" } else { "product" },
        product: ProductView::from_row(product, &ctx),
        variant: variant.map(Into::into),
    }))
}
