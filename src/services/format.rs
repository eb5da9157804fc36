//! Money and date formatting in the Brazilian locale.

use chrono::NaiveDate;
use serde::{de, Deserialize, Deserializer};

/// Rounds to cents, half away from zero.
pub fn round_money(value: f64) -> f64 {
    to_cents(value) as f64 / 100.0
}

// 1.005 is stored as 1.00499999..., so nudge away from zero before rounding.
fn to_cents(value: f64) -> i64 {
    let scaled = value * 100.0;
    let nudge = 1e-9 + scaled.abs() * 1e-12;
    (scaled + scaled.signum() * nudge).round() as i64
}

/// Formats an amount as `R$ 1.234,56`.
pub fn format_brl(amount: f64) -> String {
    let cents = to_cents(amount);
    let negative = cents < 0;
    let cents = cents.unsigned_abs();
    let reais = cents / 100;
    let rest = cents % 100;

    let digits = reais.to_string();
    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if negative { "-" } else { "" };
    format!("{sign}R$ {grouped},{rest:02}")
}

/// Parses `R$ 1.234,56`, `1234,56` or `1234.56`.
///
/// When both separators appear, the last one is the decimal separator. A lone
/// `.` followed by exactly three digits is read as a thousands separator.
pub fn parse_brl(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, trimmed),
    };
    let body = body.strip_prefix("R$").unwrap_or(body).trim();
    if body.is_empty() || !body.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',') {
        return None;
    }

    let last_comma = body.rfind(',');
    let last_dot = body.rfind('.');
    let normalized = match (last_comma, last_dot) {
        (Some(c), Some(d)) if c > d => body.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => body.replace(',', ""),
        (Some(_), None) => body.replace(',', "."),
        (None, Some(d)) => {
            let decimals = body.len() - d - 1;
            if body.matches('.').count() > 1 || decimals == 3 {
                body.replace('.', "")
            } else {
                body.to_string()
            }
        }
        (None, None) => body.to_string(),
    };

    if normalized.matches('.').count() > 1 {
        return None;
    }
    let value: f64 = normalized.parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Deserializes an amount sent either as a JSON number or as a BRL string.
pub fn deserialize_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Amount {
        Number(f64),
        Text(String),
    }

    match Amount::deserialize(deserializer)? {
        Amount::Number(value) => Ok(value),
        Amount::Text(text) => parse_brl(&text)
            .ok_or_else(|| de::Error::custom(format!("invalid amount: {text}"))),
    }
}

pub fn format_date_br(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// First and last day of the month, or `None` for an invalid month.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next.pred_opt()?))
}
