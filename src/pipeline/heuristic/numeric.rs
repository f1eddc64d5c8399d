//! Currency-formatted number parsing.
//!
//! Statement figures arrive as `$1,234.50`, `2.95%`, `(12.00)` and worse.
//! Parsing never fails: a value that cannot be read is 0 for the lenient
//! entry point, `None` for the strict one.

/// Parse a currency/percent-formatted string leniently. Non-numeric input
/// yields 0.0, never an error.
pub fn parse_number(s: &str) -> f64 {
    parse_amount(s).unwrap_or(0.0)
}

/// Strict variant: `None` when the string contains no parseable number.
/// Distinguishes "field absent" from "field observed as zero".
pub fn parse_amount(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }

    // Accounting-style negatives: ($12.00)
    let negative = trimmed.starts_with('(') && trimmed.ends_with(')');

    let cleaned: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    if cleaned.is_empty() || cleaned == "-" || cleaned == "." {
        return None;
    }

    let value: f64 = cleaned.parse().ok()?;
    Some(if negative { -value } else { value })
}
