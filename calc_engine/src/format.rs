//! # Display Formatting
//!
//! Locale-aware number formatting used by every compute function to build
//! the `formatted` map of a result set.
//!
//! These functions are total: they never panic. Non-finite inputs render as
//! `"N/A"`; callers are expected to normalize bad numbers before formatting.
//!
//! ## Example
//!
//! ```rust
//! use calc_engine::format::{smart_format, format_bytes_human, format_currency, NumberFormat};
//!
//! assert_eq!(smart_format(1_500_000.0), "1.50 M");
//! assert_eq!(format_bytes_human(2_500_000.0), "2.50 MB");
//! assert_eq!(format_currency(1234.5, 2, "USD", &NumberFormat::for_locale("en")), "$1,234.50");
//! ```

use serde::{Deserialize, Serialize};

use crate::units::currency_symbol;

/// Placeholder for values that cannot be displayed
pub const NOT_AVAILABLE: &str = "N/A";

/// Decimal and grouping separators for one locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberFormat {
    /// Thousands separator
    pub group: String,
    /// Decimal separator
    pub decimal: String,
    /// Whether the currency symbol follows the amount ("1.234,50 €")
    pub currency_after: bool,
}

impl NumberFormat {
    /// Separators for a locale code. Unknown locales use English conventions.
    pub fn for_locale(locale: &str) -> Self {
        let language = locale.split(['-', '_']).next().unwrap_or("en");
        match language {
            "de" | "es" | "it" | "nl" | "pt" | "tr" | "id" => NumberFormat {
                group: ".".into(),
                decimal: ",".into(),
                currency_after: true,
            },
            "fr" | "pl" | "cs" | "sv" | "nb" | "fi" | "ru" | "uk" => NumberFormat {
                group: "\u{202f}".into(),
                decimal: ",".into(),
                currency_after: true,
            },
            _ => NumberFormat::default(),
        }
    }
}

impl Default for NumberFormat {
    fn default() -> Self {
        NumberFormat {
            group: ",".into(),
            decimal: ".".into(),
            currency_after: false,
        }
    }
}

/// Format a number with fixed decimals and thousands grouping.
///
/// ```rust
/// use calc_engine::format::{format_number, NumberFormat};
///
/// assert_eq!(format_number(1234567.891, 2, &NumberFormat::for_locale("de")), "1.234.567,89");
/// ```
pub fn format_number(value: f64, decimals: usize, fmt: &NumberFormat) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    let rendered = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match rendered.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (rendered.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3 * fmt.group.len());
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push_str(&fmt.group);
        }
        grouped.push(ch);
    }

    let negative = value < 0.0 && rendered.chars().any(|c| c.is_ascii_digit() && c != '0');
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(frac) = frac_part {
        out.push_str(&fmt.decimal);
        out.push_str(frac);
    }
    out
}

/// Format a number with up to `max_decimals` decimals, trailing zeros removed.
pub fn format_decimal(value: f64, max_decimals: usize, fmt: &NumberFormat) -> String {
    let full = format_number(value, max_decimals, fmt);
    if max_decimals == 0 || !full.contains(fmt.decimal.as_str()) {
        return full;
    }
    let trimmed = full.trim_end_matches('0');
    trimmed
        .strip_suffix(fmt.decimal.as_str())
        .unwrap_or(trimmed)
        .to_string()
}

const SI_PREFIXES: [(f64, &str); 6] = [
    (1e15, "P"),
    (1e12, "T"),
    (1e9, "G"),
    (1e6, "M"),
    (1e3, "k"),
    (1.0, ""),
];

/// Pick the largest `(factor, unit)` of a descending table that does not
/// exceed `magnitude`. When the scaled value, rounded to the unit's
/// decimals, reaches 1000 the next larger unit is used instead
/// (`999_999 -> 1 M`, not `1000 k`).
fn scale<'a>(magnitude: f64, table: &[(f64, &'a str)], decimals: impl Fn(&str) -> i32) -> (f64, &'a str) {
    let smallest = table.last().copied().unwrap_or((1.0, ""));
    let Some(index) = table.iter().position(|(factor, _)| magnitude >= *factor) else {
        return smallest;
    };
    let (factor, unit) = table[index];
    let precision = 10f64.powi(decimals(unit));
    let rounded = (magnitude / factor * precision).round() / precision;
    if rounded >= 1000.0 && index > 0 {
        table[index - 1]
    } else {
        (factor, unit)
    }
}

/// Render a value with the largest SI prefix that keeps its magnitude below
/// 1000, e.g. `1500000 -> "1.50 M"`.
///
/// - exact zero renders as `"0"`
/// - magnitudes below 0.01 use scientific notation
/// - two decimals, dropped when both are zero (`2000 -> "2 k"`)
pub fn smart_format(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    let magnitude = value.abs();
    if magnitude < 0.01 {
        return format!("{:.2e}", value);
    }

    let (factor, prefix) = scale(magnitude, &SI_PREFIXES, |_| 2);

    let mut number = format!("{:.2}", value / factor);
    if let Some(whole) = number.strip_suffix(".00") {
        number = whole.to_string();
    }
    if prefix.is_empty() {
        number
    } else {
        format!("{} {}", number, prefix)
    }
}

/// Format a data rate in bits per second with an SI prefix ("12.50 Mbps").
pub fn format_bit_rate(bps: f64) -> String {
    let text = smart_format(bps);
    match text.rsplit_once(' ') {
        Some((number, "k")) => format!("{} Kbps", number),
        Some((number, prefix)) => format!("{} {}bps", number, prefix),
        None => format!("{} bps", text),
    }
}

/// Format a monetary amount with grouping and a currency symbol.
///
/// The symbol comes from the static currency table, `"$"` for unknown codes.
pub fn format_currency(value: f64, decimals: usize, currency_code: &str, fmt: &NumberFormat) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    let symbol = currency_symbol(currency_code);
    let amount = format_number(value.abs(), decimals, fmt);
    let sign = if value < 0.0 && amount.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };
    if fmt.currency_after {
        format!("{}{}\u{a0}{}", sign, amount, symbol)
    } else {
        format!("{}{}{}", sign, symbol, amount)
    }
}

/// Format a percentage (`12.345 -> "12.35%"`).
pub fn format_percent(value: f64, decimals: usize, fmt: &NumberFormat) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    format!("{}%", format_number(value, decimals, fmt))
}

const BYTE_UNITS: [(f64, &str); 6] = [(1e15, "PB"), (1e12, "TB"), (1e9, "GB"), (1e6, "MB"), (1e3, "KB"), (1.0, "B")];

/// Human-readable byte count using decimal thresholds (1 KB = 1000 B).
///
/// Chooses B, KB, MB or GB, continuing to TB and PB for storage-array sized
/// values.
pub fn format_bytes_human(bytes: f64) -> String {
    if !bytes.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    let magnitude = bytes.abs();
    let (factor, unit) = scale(magnitude, &BYTE_UNITS, |unit| if unit == "B" { 0 } else { 2 });
    if unit == "B" {
        format!("{} B", bytes.round())
    } else {
        format!("{:.2} {}", bytes / factor, unit)
    }
}

/// Format a duration given in hours ("45 min", "11.1 h", "3.2 days").
pub fn format_duration_hours(hours: f64, fmt: &NumberFormat) -> String {
    if !hours.is_finite() || hours < 0.0 {
        return NOT_AVAILABLE.to_string();
    }
    if hours < 1.0 {
        format!("{} min", format_number(hours * 60.0, 0, fmt))
    } else if hours < 48.0 {
        format!("{} h", format_decimal(hours, 1, fmt))
    } else {
        format!("{} days", format_decimal(hours / 24.0, 1, fmt))
    }
}
