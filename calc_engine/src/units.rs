//! # Unit Types
//!
//! Unit wrappers and conversion tables for the quantities calculators deal
//! in: data rates, data sizes and currencies.
//!
//! ## Design Philosophy
//!
//! We use simple newtype wrappers rather than a full units library because:
//! - Calculators use a small, fixed set of units
//! - We want JSON serialization to be clean (just numbers)
//! - Bits vs. bytes confusion is the main hazard, and the type system
//!   catches it at the conversion boundary
//!
//! All prefixes are decimal SI (k = 10^3, M = 10^6, ...) which matches
//! networking and drive-vendor conventions.
//!
//! ## Example
//!
//! ```rust
//! use calc_engine::units::{convert_to_base_unit, BitsPerSecond, BytesPerSecond};
//!
//! let rate = BitsPerSecond(convert_to_base_unit(100.0, "mbps"));
//! let bytes: BytesPerSecond = rate.into();
//! assert_eq!(bytes.0, 12_500_000.0);
//! ```

use std::collections::HashMap;
use std::ops::{Add, Div, Mul, Sub};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

// ============================================================================
// Data Rate Units
// ============================================================================

/// Data rate in bits per second
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BitsPerSecond(pub f64);

/// Data rate in bytes per second
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BytesPerSecond(pub f64);

impl From<BitsPerSecond> for BytesPerSecond {
    fn from(bps: BitsPerSecond) -> Self {
        BytesPerSecond(bps.0 / 8.0)
    }
}

impl From<BytesPerSecond> for BitsPerSecond {
    fn from(bytes: BytesPerSecond) -> Self {
        BitsPerSecond(bytes.0 * 8.0)
    }
}

// ============================================================================
// Data Size Units
// ============================================================================

/// Data size in bytes
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bytes(pub f64);

// ============================================================================
// Arithmetic Implementations (macro to reduce boilerplate)
// ============================================================================

macro_rules! impl_arithmetic {
    ($type:ty) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl $type {
            /// Get the raw f64 value
            pub fn value(self) -> f64 {
                self.0
            }

            /// Create from raw f64 value
            pub fn new(value: f64) -> Self {
                Self(value)
            }
        }
    };
}

impl_arithmetic!(BitsPerSecond);
impl_arithmetic!(BytesPerSecond);
impl_arithmetic!(Bytes);

// ============================================================================
// Data Rate Symbols
// ============================================================================

/// Data rate unit symbols understood by the bandwidth calculator.
///
/// Lower-case `b` means bits, upper-case `B` means bytes. The byte variants
/// carry the extra ×8 when converted to bits per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataRateUnit {
    #[serde(rename = "bps")]
    Bps,
    #[serde(rename = "kbps")]
    Kbps,
    #[serde(rename = "mbps")]
    Mbps,
    #[serde(rename = "gbps")]
    Gbps,
    #[serde(rename = "tbps")]
    Tbps,
    #[serde(rename = "Bps")]
    BytesPs,
    #[serde(rename = "KBps")]
    KBytesPs,
    #[serde(rename = "MBps")]
    MBytesPs,
    #[serde(rename = "GBps")]
    GBytesPs,
    #[serde(rename = "TBps")]
    TBytesPs,
}

impl DataRateUnit {
    /// All data rate units in display order
    pub const ALL: [DataRateUnit; 10] = [
        DataRateUnit::Bps,
        DataRateUnit::Kbps,
        DataRateUnit::Mbps,
        DataRateUnit::Gbps,
        DataRateUnit::Tbps,
        DataRateUnit::BytesPs,
        DataRateUnit::KBytesPs,
        DataRateUnit::MBytesPs,
        DataRateUnit::GBytesPs,
        DataRateUnit::TBytesPs,
    ];

    /// Canonical symbol (e.g., "mbps", "MBps")
    pub fn symbol(&self) -> &'static str {
        match self {
            DataRateUnit::Bps => "bps",
            DataRateUnit::Kbps => "kbps",
            DataRateUnit::Mbps => "mbps",
            DataRateUnit::Gbps => "gbps",
            DataRateUnit::Tbps => "tbps",
            DataRateUnit::BytesPs => "Bps",
            DataRateUnit::KBytesPs => "KBps",
            DataRateUnit::MBytesPs => "MBps",
            DataRateUnit::GBytesPs => "GBps",
            DataRateUnit::TBytesPs => "TBps",
        }
    }

    /// Conventional display label (e.g., "Mbps", "MB/s")
    pub fn label(&self) -> &'static str {
        match self {
            DataRateUnit::Bps => "bps",
            DataRateUnit::Kbps => "Kbps",
            DataRateUnit::Mbps => "Mbps",
            DataRateUnit::Gbps => "Gbps",
            DataRateUnit::Tbps => "Tbps",
            DataRateUnit::BytesPs => "B/s",
            DataRateUnit::KBytesPs => "KB/s",
            DataRateUnit::MBytesPs => "MB/s",
            DataRateUnit::GBytesPs => "GB/s",
            DataRateUnit::TBytesPs => "TB/s",
        }
    }

    /// Multiplier to bits per second
    pub fn to_bps_factor(&self) -> f64 {
        match self {
            DataRateUnit::Bps => 1.0,
            DataRateUnit::Kbps => 1e3,
            DataRateUnit::Mbps => 1e6,
            DataRateUnit::Gbps => 1e9,
            DataRateUnit::Tbps => 1e12,
            DataRateUnit::BytesPs => 8.0,
            DataRateUnit::KBytesPs => 8e3,
            DataRateUnit::MBytesPs => 8e6,
            DataRateUnit::GBytesPs => 8e9,
            DataRateUnit::TBytesPs => 8e12,
        }
    }

    /// Look up a unit by symbol or display label. Case matters: `MBps` is
    /// bytes, `mbps` is bits.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        RATE_UNITS_BY_SYMBOL.get(symbol).copied()
    }
}

impl std::fmt::Display for DataRateUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

static RATE_UNITS_BY_SYMBOL: Lazy<HashMap<&'static str, DataRateUnit>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for unit in DataRateUnit::ALL {
        map.insert(unit.symbol(), unit);
        map.insert(unit.label(), unit);
    }
    map
});

/// Convert a data rate to bits per second.
///
/// Unknown symbols are treated as already being in bits per second
/// (multiplier 1). This lenient fallback is part of the calculator contract.
pub fn convert_to_base_unit(value: f64, unit_symbol: &str) -> f64 {
    match DataRateUnit::from_symbol(unit_symbol) {
        Some(unit) => value * unit.to_bps_factor(),
        None => {
            tracing::debug!(unit = unit_symbol, "unknown data rate unit, using multiplier 1");
            value
        }
    }
}

/// Convert a data rate between two unit symbols via bits per second.
pub fn convert_rate(value: f64, from_symbol: &str, to_symbol: &str) -> f64 {
    let bps = convert_to_base_unit(value, from_symbol);
    bps / convert_to_base_unit(1.0, to_symbol)
}

// ============================================================================
// Data Size Symbols
// ============================================================================

/// Decimal data size units (1 KB = 1000 B)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataSizeUnit {
    B,
    KB,
    MB,
    GB,
    TB,
    PB,
}

impl DataSizeUnit {
    /// All size units, smallest first
    pub const ALL: [DataSizeUnit; 6] = [
        DataSizeUnit::B,
        DataSizeUnit::KB,
        DataSizeUnit::MB,
        DataSizeUnit::GB,
        DataSizeUnit::TB,
        DataSizeUnit::PB,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            DataSizeUnit::B => "B",
            DataSizeUnit::KB => "KB",
            DataSizeUnit::MB => "MB",
            DataSizeUnit::GB => "GB",
            DataSizeUnit::TB => "TB",
            DataSizeUnit::PB => "PB",
        }
    }

    /// Number of bytes in one unit
    pub fn bytes(&self) -> f64 {
        match self {
            DataSizeUnit::B => 1.0,
            DataSizeUnit::KB => 1e3,
            DataSizeUnit::MB => 1e6,
            DataSizeUnit::GB => 1e9,
            DataSizeUnit::TB => 1e12,
            DataSizeUnit::PB => 1e15,
        }
    }

    /// Parse a symbol case-insensitively ("mb", "MB", "Mb" all mean megabytes
    /// here since sizes are always bytes)
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        DataSizeUnit::ALL
            .into_iter()
            .find(|unit| unit.symbol().eq_ignore_ascii_case(symbol.trim()))
    }

    /// Convert a value in this unit to bytes
    pub fn to_bytes(&self, value: f64) -> Bytes {
        Bytes(value * self.bytes())
    }
}

impl std::fmt::Display for DataSizeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

// ============================================================================
// Currency
// ============================================================================

/// Symbol used when a currency code is not in the table
pub const FALLBACK_CURRENCY_SYMBOL: &str = "$";

static CURRENCY_SYMBOLS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("USD", "$"),
        ("EUR", "€"),
        ("GBP", "£"),
        ("JPY", "¥"),
        ("CNY", "¥"),
        ("CHF", "CHF"),
        ("CAD", "C$"),
        ("AUD", "A$"),
        ("NZD", "NZ$"),
        ("INR", "₹"),
        ("BRL", "R$"),
        ("MXN", "MX$"),
        ("SEK", "kr"),
        ("NOK", "kr"),
        ("DKK", "kr"),
        ("PLN", "zł"),
        ("KRW", "₩"),
        ("RUB", "₽"),
        ("TRY", "₺"),
        ("ZAR", "R"),
    ])
});

/// Currency symbol for an ISO 4217 code, `"$"` for unknown codes.
pub fn currency_symbol(code: &str) -> &'static str {
    CURRENCY_SYMBOLS
        .get(code.trim().to_ascii_uppercase().as_str())
        .copied()
        .unwrap_or(FALLBACK_CURRENCY_SYMBOL)
}

/// Whether the currency code is in the symbol table
pub fn is_known_currency(code: &str) -> bool {
    CURRENCY_SYMBOLS.contains_key(code.trim().to_ascii_uppercase().as_str())
}

/// Currency codes in the symbol table, sorted
pub fn currency_codes() -> Vec<&'static str> {
    let mut codes: Vec<_> = CURRENCY_SYMBOLS.keys().copied().collect();
    codes.sort_unstable();
    codes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_to_bytes() {
        let rate = BitsPerSecond(100e6);
        let bytes: BytesPerSecond = rate.into();
        assert_eq!(bytes.0, 12.5e6);
    }

    #[test]
    fn test_base_unit_conversion() {
        assert_eq!(convert_to_base_unit(1.0, "kbps"), 1e3);
        assert_eq!(convert_to_base_unit(1.0, "mbps"), 1e6);
        assert_eq!(convert_to_base_unit(1.0, "MBps"), 8e6);
        assert_eq!(convert_to_base_unit(2.0, "GB/s"), 16e9);
    }

    #[test]
    fn test_unknown_unit_defaults_to_one() {
        assert_eq!(convert_to_base_unit(42.0, "furlongs"), 42.0);
    }

    #[test]
    fn test_case_distinguishes_bits_and_bytes() {
        assert_eq!(DataRateUnit::from_symbol("mbps"), Some(DataRateUnit::Mbps));
        assert_eq!(DataRateUnit::from_symbol("MBps"), Some(DataRateUnit::MBytesPs));
    }

    #[test]
    fn test_convert_rate() {
        assert!((convert_rate(100.0, "mbps", "MBps") - 12.5).abs() < 1e-12);
        assert!((convert_rate(1.0, "gbps", "mbps") - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_data_size_units() {
        assert_eq!(DataSizeUnit::from_symbol("mb"), Some(DataSizeUnit::MB));
        assert_eq!(DataSizeUnit::TB.to_bytes(4.0).0, 4e12);
        assert_eq!(DataSizeUnit::from_symbol("XB"), None);
    }

    #[test]
    fn test_currency_symbols() {
        assert_eq!(currency_symbol("EUR"), "€");
        assert_eq!(currency_symbol("gbp"), "£");
        assert_eq!(currency_symbol("XYZ"), "$");
        assert!(is_known_currency("usd"));
        assert!(currency_codes().contains(&"JPY"));
    }

    #[test]
    fn test_arithmetic() {
        let a = Bytes(10.0);
        let b = Bytes(5.0);
        assert_eq!((a + b).0, 15.0);
        assert_eq!((a - b).0, 5.0);
        assert_eq!((a * 2.0).0, 20.0);
        assert_eq!((a / 2.0).0, 5.0);
    }

    #[test]
    fn test_serialization() {
        let rate = BitsPerSecond(1500.0);
        let json = serde_json::to_string(&rate).unwrap();
        assert_eq!(json, "1500.0");

        let unit = serde_json::to_string(&DataRateUnit::MBytesPs).unwrap();
        assert_eq!(unit, "\"MBps\"");
    }
}
