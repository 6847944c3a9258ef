// src/models/payment.rs
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Approved => "approved",
            PaymentStatus::Rejected => "rejected",
        })
    }
}

/// Claimed payment joined with the student's name. No money moves; staff only
/// confirm or refuse the claim.
#[derive(Debug, Clone, FromRow)]
pub struct PaymentView {
    pub id: i64,
    pub student_id: i64,
    pub student_name: String,
    pub amount_cents: i64,
    pub status: PaymentStatus,
    pub created_at: NaiveDateTime,
    pub reviewed_at: Option<NaiveDateTime>,
    pub reviewer_name: Option<String>,
}

impl PaymentView {
    pub fn amount(&self) -> String {
        format_cents(self.amount_cents)
    }

    pub fn is_pending(&self) -> bool {
        self.status == PaymentStatus::Pending
    }

    pub fn reviewer(&self) -> &str {
        self.reviewer_name.as_deref().unwrap_or("-")
    }
}

#[derive(Debug, Deserialize)]
pub struct PaymentForm {
    pub amount: String,
}

/// Formats an amount in cents as "12.50".
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.abs();
    format!("{}{}.{:02}", sign, cents / 100, cents % 100)
}

/// Parses a positive decimal amount with at most two fractional digits into
/// cents ("12" -> 1200, "12.5" -> 1250, "0.99" -> 99).
pub fn parse_amount(input: &str) -> Option<i64> {
    let input = input.trim();
    let (whole, frac) = match input.split_once('.') {
        Some((w, f)) => (w, f),
        None => (input, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if frac.len() > 2 {
        return None;
    }

    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let frac: i64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().ok()? * 10,
        _ => frac.parse().ok()?,
    };

    let cents = whole.checked_mul(100)?.checked_add(frac)?;
    (cents > 0).then_some(cents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_decimal_amounts() {
        assert_eq!(parse_amount("12"), Some(1200));
        assert_eq!(parse_amount(" 12.5 "), Some(1250));
        assert_eq!(parse_amount("0.99"), Some(99));
        assert_eq!(parse_amount(".5"), Some(50));
    }

    #[test]
    fn rejects_invalid_amounts() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("0"), None);
        assert_eq!(parse_amount("-3"), None);
        assert_eq!(parse_amount("1.234"), None);
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount("1,50"), None);
        assert_eq!(parse_amount("."), None);
    }

    #[test]
    fn formats_cents() {
        assert_eq!(format_cents(1250), "12.50");
        assert_eq!(format_cents(7), "0.07");
        assert_eq!(format_cents(0), "0.00");
    }
}
