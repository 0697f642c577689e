//! Order note formatting.
//!
//! Notes persist as one flat growing text blob per order. Each append adds
//! a `"[<timestamp>] <text>\n"` line; prior content is never replaced or
//! truncated. The structured audit trail lives in `order_status_history`.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::{ApiError, ApiResult};

/// Build the line appended for one note. Rejects notes that are empty after
/// trimming.
pub fn note_line(text: &str, at: DateTime<Utc>) -> ApiResult<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Validation("Note cannot be empty".into()));
    }
    Ok(format!(
        "[{}] {}\n",
        at.to_rfc3339_opts(SecondsFormat::Secs, true),
        trimmed
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn line_carries_timestamp_and_text() {
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 0).unwrap();
        let line = note_line("packed", at).unwrap();
        assert_eq!(line, "[2025-06-01T09:30:00Z] packed\n");
    }

    #[test]
    fn whitespace_only_note_is_rejected() {
        assert!(note_line("   ", Utc::now()).is_err());
        assert!(note_line("", Utc::now()).is_err());
    }

    #[test]
    fn appends_preserve_order_and_prior_content() {
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap();
        let mut blob = String::new();
        blob.push_str(&note_line("A", at).unwrap());
        blob.push_str(&note_line("B", at).unwrap());
        let a = blob.find("A").unwrap();
        let b = blob.find("B").unwrap();
        assert!(a < b);
        assert_eq!(blob.lines().count(), 2);
    }
}
