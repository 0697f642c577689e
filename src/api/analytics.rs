//! Reporting endpoints. Each response is folded from a batch of
//! independent snapshot queries issued concurrently; money and growth
//! percentages are rounded only here, at the boundary.

use axum::extract::{Query, State};
use axum::Json;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::SellerContext;
use crate::domain::permissions::Permission;
use crate::domain::reporting::{growth_percent, round_money, ReportRange};
use crate::domain::status::OrderStatus;
use crate::error::ApiResult;
use crate::state::AppState;
use crate::store::analytics;

const TOP_PRODUCT_LIMIT: i64 = 5;

#[derive(Debug, Deserialize)]
pub struct RangeParams {
    #[serde(rename = "startDate")]
    pub start_date: Option<NaiveDate>,
    #[serde(rename = "endDate")]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct PeriodMetric {
    pub current: Decimal,
    pub previous: Decimal,
    pub growth_percent: Decimal,
}

impl PeriodMetric {
    fn new(current: Decimal, previous: Decimal) -> Self {
        Self {
            current: round_money(current),
            previous: round_money(previous),
            growth_percent: round_money(growth_percent(current, previous)),
        }
    }

    fn counts(current: i64, previous: i64) -> Self {
        Self {
            current: Decimal::from(current),
            previous: Decimal::from(previous),
            growth_percent: round_money(growth_percent(
                Decimal::from(current),
                Decimal::from(previous),
            )),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RangeInfo {
    pub start: String,
    pub end: String,
}

impl RangeInfo {
    fn from(range: &ReportRange) -> Self {
        Self {
            start: range.start.to_rfc3339(),
            end: range.end.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MonthlyPoint {
    pub month: String,
    pub revenue: Decimal,
    pub orders: i64,
}

#[derive(Debug, Serialize)]
pub struct TopProduct {
    pub product_id: Uuid,
    pub name: String,
    pub units_sold: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Serialize)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct AnalyticsResponse {
    pub range: RangeInfo,
    pub revenue: PeriodMetric,
    pub orders: PeriodMetric,
    pub customers: PeriodMetric,
    pub active_products: i64,
    pub monthly: Vec<MonthlyPoint>,
    pub top_products: Vec<TopProduct>,
    pub status_breakdown: Vec<StatusCount>,
}

pub async fn analytics(
    State(state): State<AppState>,
    ctx: SellerContext,
    Query(params): Query<RangeParams>,
) -> ApiResult<Json<AnalyticsResponse>> {
    ctx.ensure(Permission::ViewAnalytics)?;
    let range = ReportRange::resolve(params.start_date, params.end_date, Utc::now())?;
    let db = &state.db;
    let seller = ctx.actual_seller_id;

    // independent snapshots; no cross-query consistency is promised
    let (
        revenue,
        prev_revenue,
        orders,
        prev_orders,
        customers,
        prev_customers,
        active_products,
        monthly,
        top,
        statuses,
    ) = tokio::try_join!(
        analytics::revenue_between(db, seller, range.start, range.end),
        analytics::revenue_between(db, seller, range.previous_start, range.previous_end),
        analytics::order_count_between(db, seller, range.start, range.end),
        analytics::order_count_between(db, seller, range.previous_start, range.previous_end),
        analytics::distinct_customers_between(db, seller, range.start, range.end),
        analytics::distinct_customers_between(db, seller, range.previous_start, range.previous_end),
        analytics::active_product_count(db, seller),
        analytics::monthly_breakdown(db, seller, range.start, range.end),
        analytics::top_products(db, seller, range.start, range.end, TOP_PRODUCT_LIMIT),
        analytics::status_breakdown(db, seller, range.start, range.end),
    )?;

    Ok(Json(AnalyticsResponse {
        range: RangeInfo::from(&range),
        revenue: PeriodMetric::new(revenue, prev_revenue),
        orders: PeriodMetric::counts(orders, prev_orders),
        customers: PeriodMetric::counts(customers, prev_customers),
        active_products,
        monthly: monthly
            .into_iter()
            .map(|m| MonthlyPoint {
                month: m.month.to_rfc3339(),
                revenue: round_money(m.revenue),
                orders: m.orders,
            })
            .collect(),
        top_products: top
            .into_iter()
            .map(|t| TopProduct {
                product_id: t.product_id,
                name: t.name,
                units_sold: t.units_sold,
                revenue: round_money(t.revenue),
            })
            .collect(),
        status_breakdown: statuses
            .into_iter()
            .map(|s| StatusCount {
                status: s.status,
                count: s.count,
            })
            .collect(),
    }))
}

#[derive(Debug, Serialize)]
pub struct RevenueResponse {
    pub range: RangeInfo,
    pub revenue: PeriodMetric,
    pub average_order_value: Decimal,
    pub monthly: Vec<MonthlyPoint>,
}

pub async fn revenue(
    State(state): State<AppState>,
    ctx: SellerContext,
    Query(params): Query<RangeParams>,
) -> ApiResult<Json<RevenueResponse>> {
    ctx.ensure(Permission::ViewAnalytics)?;
    let range = ReportRange::resolve(params.start_date, params.end_date, Utc::now())?;
    let db = &state.db;
    let seller = ctx.actual_seller_id;

    let (current, previous, order_count, monthly) = tokio::try_join!(
        analytics::revenue_between(db, seller, range.start, range.end),
        analytics::revenue_between(db, seller, range.previous_start, range.previous_end),
        analytics::order_count_between(db, seller, range.start, range.end),
        analytics::monthly_breakdown(db, seller, range.start, range.end),
    )?;
    let average_order_value = if order_count == 0 {
        Decimal::ZERO
    } else {
        round_money(current / Decimal::from(order_count))
    };

    Ok(Json(RevenueResponse {
        range: RangeInfo::from(&range),
        revenue: PeriodMetric::new(current, previous),
        average_order_value,
        monthly: monthly
            .into_iter()
            .map(|m| MonthlyPoint {
                month: m.month.to_rfc3339(),
                revenue: round_money(m.revenue),
                orders: m.orders,
            })
            .collect(),
    }))
}
