//! Reporting periods and growth arithmetic shared by the analytics,
//! revenue, and customer endpoints.

use chrono::{DateTime, Days, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::error::{ApiError, ApiResult};

/// A resolved reporting window plus the equal-length period immediately
/// preceding it, used for growth comparisons.
///
/// Both windows are half-open: `[start, end)` and
/// `[previous_start, previous_end)` with `previous_end == start`, so an
/// order created exactly on the boundary instant counts in one period only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReportRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub previous_start: DateTime<Utc>,
    pub previous_end: DateTime<Utc>,
}

impl ReportRange {
    /// Resolve an optional `startDate`/`endDate` pair. Absent bounds default
    /// to the trailing 30 days ending now; an explicit start widens to
    /// start-of-day and an explicit end to the following midnight (the
    /// exclusive bound covering the whole end day). A range whose end date
    /// is not after its start date is rejected before widening.
    pub fn resolve(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        now: DateTime<Utc>,
    ) -> ApiResult<Self> {
        if let (Some(s), Some(e)) = (start, end) {
            if e <= s {
                return Err(ApiError::Validation(
                    "endDate must be after startDate".into(),
                ));
            }
        }
        let end = match end {
            Some(d) => d
                .checked_add_days(Days::new(1))
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .ok_or_else(|| ApiError::Validation("Invalid end date".into()))?
                .and_utc(),
            None => now,
        };
        let start = match start {
            Some(d) => d
                .and_hms_opt(0, 0, 0)
                .ok_or_else(|| ApiError::Validation("Invalid start date".into()))?
                .and_utc(),
            None => end - Duration::days(30),
        };
        if end <= start {
            return Err(ApiError::Validation(
                "endDate must be after startDate".into(),
            ));
        }
        let length = end - start;
        Ok(Self {
            start,
            end,
            previous_start: start - length,
            previous_end: start,
        })
    }
}

/// `((current - previous) / previous) * 100`, defined as 0 when the previous
/// period was empty so callers never see Infinity or NaN.
pub fn growth_percent(current: Decimal, previous: Decimal) -> Decimal {
    if previous.is_zero() {
        return Decimal::ZERO;
    }
    ((current - previous) / previous) * Decimal::from(100)
}

/// Response-boundary rounding. Internal accumulation stays unrounded.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn defaults_to_trailing_30_days() {
        let r = ReportRange::resolve(None, None, now()).unwrap();
        assert_eq!(r.end, now());
        assert_eq!(r.end - r.start, Duration::days(30));
        assert_eq!(r.previous_end, r.start);
        assert_eq!(r.previous_end - r.previous_start, Duration::days(30));
    }

    #[test]
    fn explicit_range_is_widened_to_day_boundaries() {
        let start = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 5, 31).unwrap();
        let r = ReportRange::resolve(Some(start), Some(end), now()).unwrap();
        assert_eq!(r.start, Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap());
        // exclusive end: the following midnight, covering all of May 31
        assert_eq!(r.end, Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn previous_period_immediately_precedes_with_equal_length() {
        let start = NaiveDate::from_ymd_opt(2025, 5, 11).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 5, 21).unwrap();
        let r = ReportRange::resolve(Some(start), Some(end), now()).unwrap();
        assert_eq!(r.previous_end, r.start);
        assert_eq!(r.end - r.start, r.previous_end - r.previous_start);
    }

    #[test]
    fn inverted_range_is_rejected() {
        let start = NaiveDate::from_ymd_opt(2025, 5, 21).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 5, 11).unwrap();
        assert!(ReportRange::resolve(Some(start), Some(end), now()).is_err());
    }

    #[test]
    fn same_day_range_is_rejected_before_widening() {
        // the raw dates are compared; widening the end to the following
        // midnight must not sneak an equal-date range past validation
        let day = NaiveDate::from_ymd_opt(2025, 5, 21).unwrap();
        assert!(ReportRange::resolve(Some(day), Some(day), now()).is_err());
    }

    #[test]
    fn periods_do_not_overlap_on_the_boundary() {
        let r = ReportRange::resolve(None, None, now()).unwrap();
        // half-open windows share the boundary instant without double
        // counting: it is inside [start, end) and outside [prev_start, prev_end)
        assert_eq!(r.previous_end, r.start);
        assert!(r.start >= r.previous_end);
    }

    #[test]
    fn growth_is_zero_when_previous_is_zero() {
        assert_eq!(growth_percent(dec!(500), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(growth_percent(Decimal::ZERO, Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn growth_percent_matches_formula() {
        assert_eq!(growth_percent(dec!(150), dec!(100)), dec!(50));
        assert_eq!(growth_percent(dec!(50), dec!(100)), dec!(-50));
    }

    #[test]
    fn money_rounds_to_two_places_at_the_boundary() {
        assert_eq!(round_money(dec!(10.006)), dec!(10.01));
        assert_eq!(round_money(dec!(10.004)), dec!(10.00));
        assert_eq!(round_money(dec!(10.40)), dec!(10.40));
    }
}
