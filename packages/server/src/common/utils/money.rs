//! Pure formatting helpers for salary figures.
//!
//! These functions contain NO side effects - they take inputs and return
//! outputs without touching databases or performing I/O.

/// Formats a dollar amount with thousands separators, e.g. `125000.0`
/// becomes `"$125,000"`. Fractional cents are rounded away; salary data
/// is never precise enough for them to matter.
pub fn format_usd(amount: f64) -> String {
    let whole = amount.round() as i64;
    let sign = if whole < 0 { "-" } else { "" };
    let digits = whole.abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}${grouped}")
}
