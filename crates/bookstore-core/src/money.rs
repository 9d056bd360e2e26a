//! Fixed-point money helpers.

/// Format an amount in cents as a decimal string with two places.
///
/// ```
/// assert_eq!(bookstore_core::format_cents(3000), "30.00");
/// assert_eq!(bookstore_core::format_cents(-5), "-0.05");
/// ```
#[must_use]
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}
