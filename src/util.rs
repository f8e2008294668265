// Utility helpers for parsing cell text and formatting numbers.
//
// Uploaded cells are untyped strings; everything that turns them into
// numbers or dates lives here so the aggregation code can stay simple.
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use num_format::{Locale, ToFormattedString};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d %b %Y", "%b %d, %Y"];

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in spreadsheet exports.
///
/// - Trims whitespace.
/// - Strips thousands separators like `","` before parsing.
/// - Reads the leading number only, so `"30 INR"` is 30 and `"abc"` is `None`.
/// - Returns `None` when no digits lead the cell or the value is not finite.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let cleaned = s?.trim().replace(',', "");
    let v = numeric_prefix(&cleaned, true)?.parse::<f64>().ok()?;
    v.is_finite().then_some(v)
}

/// Integer counterpart of [`parse_f64_safe`]: reads leading digits only, so
/// `"2.7"` is 2 and `"2 pcs"` is 2. Values outside the `i64` range are
/// `None` rather than saturated.
pub fn parse_i64_safe(s: Option<&str>) -> Option<i64> {
    let cleaned = s?.trim().replace(',', "");
    numeric_prefix(&cleaned, false)?.parse::<i64>().ok()
}

/// Longest prefix of `s` shaped like `[+-]digits[.digits][e[+-]digits]`
/// (fraction and exponent only when `fractional`). `None` without a digit.
fn numeric_prefix(s: &str, fractional: bool) -> Option<&str> {
    let b = s.as_bytes();
    let digits_from = |mut i: usize| {
        while i < b.len() && b[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = if matches!(b.first(), Some(b'+' | b'-')) { 1 } else { 0 };
    let int_end = digits_from(end);
    let mut seen_digit = int_end > end;
    end = int_end;

    if fractional {
        if b.get(end) == Some(&b'.') {
            let frac_end = digits_from(end + 1);
            if frac_end > end + 1 || seen_digit {
                seen_digit |= frac_end > end + 1;
                end = frac_end;
            }
        }
        if seen_digit && matches!(b.get(end), Some(b'e' | b'E')) {
            let mut exp = end + 1;
            if matches!(b.get(exp), Some(b'+' | b'-')) {
                exp += 1;
            }
            let exp_end = digits_from(exp);
            if exp_end > exp {
                end = exp_end;
            }
        }
    }

    seen_digit.then(|| &s[..end])
}

/// Parse a date or timestamp cell down to its calendar day.
///
/// RFC 3339 timestamps are converted to UTC first; naive timestamps keep
/// their own day.
pub fn parse_date_safe(s: Option<&str>) -> Option<NaiveDate> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    {
        return Some(dt.date());
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// `count` as a percentage of `total`; 0 when there is nothing to divide by.
pub fn share_pct(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    count as f64 / total as f64 * 100.0
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus locale-aware thousands separators (`1,234,567.89`).
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

/// Human-readable size with a 1024 base, e.g. `"1.5 KB"`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}
