//! Money representation and conversion helpers.
//!
//! Costs are stored in microcents (1/1,000,000 of a dollar) for precision.
//! Every reference dollar amount has at most two decimal places, so the
//! conversion is exact in both directions.

/// Convert dollars to microcents (1/1,000,000 of a dollar)
///
/// Examples:
/// - $1.00 = 1,000,000 microcents
/// - $0.0195 = 19,500 microcents
/// - $12,114,651.89 = 12,114,651,890,000 microcents
pub fn dollars_to_microcents(dollars: f64) -> i64 {
    (dollars * 1_000_000.0).round() as i64
}

/// Convert microcents to dollars
pub fn microcents_to_dollars(microcents: i64) -> f64 {
    microcents as f64 / 1_000_000.0
}

/// Saturate an i128 value to fit in an i64
///
/// Returns `i64::MAX` if the value exceeds the i64 range, or the value as i64 otherwise.
/// Negative values that underflow return `i64::MIN`.
pub(crate) fn saturate_to_i64(value: i128) -> i64 {
    if value > i64::MAX as i128 {
        i64::MAX
    } else if value < i64::MIN as i128 {
        i64::MIN
    } else {
        value as i64
    }
}

/// Truncate a float toward zero into an i64.
///
/// `as` casts from f64 saturate at the i64 bounds and map NaN to zero, so the
/// result is always defined. Interpolated counts use this to match the
/// reference behavior of converting via `int()` rather than rounding.
pub(crate) fn truncate_to_i64(value: f64) -> i64 {
    value as i64
}

/// Format microcents as whole dollars with thousands separators, e.g. `$3,277,752`.
///
/// Rounds to the nearest dollar. Negative amounts keep the sign ahead of the
/// dollar sign: `-$42`.
pub fn format_dollars_whole(microcents: i64) -> String {
    let dollars = (microcents as f64 / 1_000_000.0).round() as i64;
    let (sign, magnitude) = if dollars < 0 {
        ("-", dollars.unsigned_abs())
    } else {
        ("", dollars.unsigned_abs())
    };
    format!("{sign}${}", group_thousands(magnitude))
}

/// Format microcents as dollars and cents with thousands separators,
/// e.g. `$12,114,651.89`.
///
/// Rounds half away from zero at the cent.
pub fn format_dollars(microcents: i64) -> String {
    let sign = if microcents < 0 { "-" } else { "" };
    let cents = (microcents.unsigned_abs() as u128 * 100 + 500_000) / 1_000_000;
    format!(
        "{sign}${}.{:02}",
        group_thousands((cents / 100) as u64),
        cents % 100
    )
}

/// Format a count with thousands separators, e.g. `2,057,722`.
pub fn format_count(value: i64) -> String {
    let sign = if value < 0 { "-" } else { "" };
    format!("{sign}{}", group_thousands(value.unsigned_abs()))
}

/// Insert commas every three digits: 12114651 -> "12,114,651".
fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    let offset = digits.len() % 3;
    for (i, c) in digits.chars().enumerate() {
        if i != 0 && (i + 3 - offset) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
