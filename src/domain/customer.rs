//! Derived customer classification.
//!
//! Customers are not a stored aggregate; they are computed by grouping a
//! seller's orders per customer. The classification thresholds here must
//! match the SQL summary counters in `store::customers`.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

pub const VIP_SPEND_THRESHOLD: u32 = 1000;
pub const ACTIVE_WINDOW_DAYS: i64 = 90;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomerStatus {
    Vip,
    Active,
    Inactive,
}

/// `vip` above the lifetime-spend threshold, else `active` when the most
/// recent order falls inside the trailing window, else `inactive`.
pub fn classify(
    total_spent: Decimal,
    last_order_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> CustomerStatus {
    if total_spent > Decimal::from(VIP_SPEND_THRESHOLD) {
        CustomerStatus::Vip
    } else if now - last_order_at <= Duration::days(ACTIVE_WINDOW_DAYS) {
        CustomerStatus::Active
    } else {
        CustomerStatus::Inactive
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn two_600_orders_make_a_vip() {
        let status = classify(dec!(1200), now() - Duration::days(400), now());
        assert_eq!(status, CustomerStatus::Vip);
    }

    #[test]
    fn threshold_is_strictly_greater_than() {
        let status = classify(dec!(1000), now() - Duration::days(10), now());
        assert_eq!(status, CustomerStatus::Active);
    }

    #[test]
    fn recent_small_spender_is_active() {
        let status = classify(dec!(200), now() - Duration::days(10), now());
        assert_eq!(status, CustomerStatus::Active);
    }

    #[test]
    fn stale_small_spender_is_inactive() {
        let status = classify(dec!(200), now() - Duration::days(91), now());
        assert_eq!(status, CustomerStatus::Inactive);
    }
}
