//! HTTP surface: the seller API router.

use axum::routing::{get, patch, post, put};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub mod analytics;
pub mod customers;
pub mod orders;
pub mod products;
pub mod warehouses;

/// OFFSET for a 1-based page. The arithmetic runs in i64 so a huge `page`
/// cannot overflow u32 before the widening.
pub(crate) fn page_offset(page: u32, limit: u32) -> i64 {
    (i64::from(page) - 1) * i64::from(limit)
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/health",
            get(|| async { Json(serde_json::json!({"status": "healthy", "service": "sellerhub"})) }),
        )
        .route("/api/seller/orders", get(orders::list_orders))
        .route(
            "/api/seller/orders/:id",
            get(orders::get_order).put(orders::update_order_status),
        )
        .route(
            "/api/seller/orders/:id/notes",
            get(orders::get_order_notes).post(orders::append_order_note),
        )
        .route("/api/seller/customers", get(customers::list_customers))
        .route("/api/seller/analytics", get(analytics::analytics))
        .route("/api/seller/revenue", get(analytics::revenue))
        .route(
            "/api/seller/products",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/api/seller/products/:id",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route("/api/seller/products/:id/stock", patch(products::adjust_stock))
        .route(
            "/api/seller/products/:id/active",
            patch(products::set_product_active),
        )
        .route(
            "/api/seller/products/:id/publish",
            patch(products::set_product_published),
        )
        .route(
            "/api/seller/products/:id/variants",
            post(products::create_variant),
        )
        .route(
            "/api/seller/variants/:id",
            put(products::update_variant).delete(products::delete_variant),
        )
        .route("/api/seller/barcodes/:code", get(products::lookup_barcode))
        .route(
            "/api/seller/warehouses",
            get(warehouses::list_warehouses).post(warehouses::create_warehouse),
        )
        .route(
            "/api/seller/warehouses/:id",
            put(warehouses::update_warehouse).delete(warehouses::delete_warehouse),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::page_offset;

    #[test]
    fn first_page_starts_at_zero() {
        assert_eq!(page_offset(1, 20), 0);
        assert_eq!(page_offset(3, 20), 40);
    }

    #[test]
    fn large_page_numbers_do_not_overflow() {
        assert_eq!(
            page_offset(u32::MAX, 100),
            (i64::from(u32::MAX) - 1) * 100
        );
    }
}
