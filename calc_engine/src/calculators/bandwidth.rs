//! # Bandwidth Calculator
//!
//! Two modes selected by the `mode` field:
//!
//! - **convert**: a data rate in one unit expressed in another, plus every
//!   common equivalent and the volume transferred over 30 days at that rate.
//! - **website**: average and headroom-adjusted bit rate needed to serve a
//!   monthly page-view volume.
//!
//! Every equivalent unit is emitted at once so the presentation layer never
//! re-derives a conversion.
//!
//! ## Example
//!
//! ```rust
//! use calc_engine::calculators::bandwidth::compute;
//! use calc_engine::input::ComputeInput;
//!
//! let input = ComputeInput::default()
//!     .with("mode", "convert")
//!     .with("value", 100.0)
//!     .with("fromUnit", "mbps")
//!     .with("toUnit", "MBps");
//!
//! let results = compute(&input);
//! assert!(results.is_valid);
//! assert_eq!(results.number("result"), Some(12.5));
//! ```

use serde_json::json;

use crate::errors::CalcResult;
use crate::format::{format_bit_rate, format_bytes_human, format_decimal, NumberFormat};
use crate::input::ComputeInput;
use crate::locale::LocaleCatalog;
use crate::results::{CalculatorResults, ResultBuilder};
use crate::schema::{
    CalculatorConfig, Category, ChartType, InputField, Preset, ResultField, UnitType,
};
use crate::units::{convert_to_base_unit, BitsPerSecond, BytesPerSecond, DataRateUnit, DataSizeUnit};

pub const ID: &str = "bandwidth";

pub const MODE_CONVERT: &str = "convert";
pub const MODE_WEBSITE: &str = "website";

const SECONDS_PER_DAY: f64 = 86_400.0;
/// Billing month used for transfer projections
const DAYS_PER_MONTH: f64 = 30.0;

const DEFAULT_VALUE: f64 = 100.0;
const DEFAULT_FROM_UNIT: &str = "mbps";
const DEFAULT_TO_UNIT: &str = "MBps";
const DEFAULT_PAGE_VIEWS: f64 = 50_000.0;
const DEFAULT_PAGE_SIZE: f64 = 2.5;
const DEFAULT_PAGE_SIZE_UNIT: &str = "MB";
const DEFAULT_REDUNDANCY: f64 = 1.5;

/// Result ids of the per-unit equivalents, paired with their unit
const EQUIVALENTS: [(&str, DataRateUnit); 8] = [
    ("bps", DataRateUnit::Bps),
    ("kbps", DataRateUnit::Kbps),
    ("mbps", DataRateUnit::Mbps),
    ("gbps", DataRateUnit::Gbps),
    ("bytesPerSecond", DataRateUnit::BytesPs),
    ("kilobytesPerSecond", DataRateUnit::KBytesPs),
    ("megabytesPerSecond", DataRateUnit::MBytesPs),
    ("gigabytesPerSecond", DataRateUnit::GBytesPs),
];

pub fn config() -> CalcResult<CalculatorConfig> {
    let rate_units: Vec<&str> = DataRateUnit::ALL.iter().map(|u| u.symbol()).collect();

    let mut config = CalculatorConfig::new(ID, "1.2.0", Category::Networking, "wifi")
        .with_input(InputField::radio("mode", MODE_CONVERT, &[MODE_CONVERT, MODE_WEBSITE]))
        .with_input(InputField::number("value", DEFAULT_VALUE).min(0.0).show_when("mode", MODE_CONVERT))
        .with_input(InputField::select("fromUnit", DEFAULT_FROM_UNIT, &rate_units).show_when("mode", MODE_CONVERT))
        .with_input(InputField::select("toUnit", DEFAULT_TO_UNIT, &rate_units).show_when("mode", MODE_CONVERT))
        .with_input(
            InputField::number("pageViews", DEFAULT_PAGE_VIEWS)
                .min(0.0)
                .step(1000.0)
                .show_when("mode", MODE_WEBSITE),
        )
        .with_input(
            InputField::number("avgPageSize", DEFAULT_PAGE_SIZE)
                .min(0.0)
                .step(0.1)
                .with_unit(UnitType::DataSize, DEFAULT_PAGE_SIZE_UNIT, &["KB", "MB"])
                .show_when("mode", MODE_WEBSITE),
        )
        .with_input(
            InputField::number("redundancy", DEFAULT_REDUNDANCY)
                .range(1.0, 10.0)
                .step(0.1)
                .show_when("mode", MODE_WEBSITE),
        )
        .with_preset(
            Preset::new("stream4k", "tv")
                .set("mode", MODE_CONVERT)
                .set("value", 25.0)
                .set("fromUnit", "mbps")
                .set("toUnit", "MBps"),
        )
        .with_preset(
            Preset::new("gigabitLink", "cable")
                .set("mode", MODE_CONVERT)
                .set("value", 1.0)
                .set("fromUnit", "gbps")
                .set("toUnit", "MBps"),
        )
        .with_preset(
            Preset::new("smallBlog", "pencil")
                .set("mode", MODE_WEBSITE)
                .set("pageViews", 10_000.0)
                .set("avgPageSize", 1.5)
                .set("redundancy", 1.5),
        )
        .with_preset(
            Preset::new("busyStore", "cart")
                .set("mode", MODE_WEBSITE)
                .set("pageViews", 500_000.0)
                .set("avgPageSize", 3.0)
                .set("redundancy", 2.0),
        )
        .with_result(ResultField::primary("result"))
        .with_result(ResultField::primary("averageMbps"))
        .with_result(ResultField::primary("recommendedMbps"))
        .with_result(ResultField::secondary("monthlyTransfer"))
        .with_result(ResultField::secondary("dailyTransfer"))
        .with_chart(ChartType::Bar, "units", "unit", &["value"])
        .with_table("units", &["unit", "value"])
        .with_info_card("bitsVsBytes", "binary")
        .with_info_card("siPrefixes", "ruler")
        .with_education("howItWorks")
        .with_faq("mbpsVsMBps")
        .with_faq("redundancy")
        .with_faq("monthlyTransfer")
        .with_reference(
            "IEC 80000-13: Quantities and units - Information science and technology",
            "https://www.iso.org/standard/31898.html",
        )
        .with_reference(
            "NIST: Metric (SI) Prefixes",
            "https://www.nist.gov/pml/owm/metric-si-prefixes",
        );

    for (id, _) in EQUIVALENTS {
        config = config.with_result(ResultField::secondary(id));
    }

    Ok(config.with_locales(LocaleCatalog::load_embedded(ID)?))
}

/// Display amount with precision suited to very small and very large rates
fn amount(value: f64, nf: &NumberFormat) -> String {
    if value != 0.0 && value.abs() < 1e-4 {
        format!("{:.3e}", value)
    } else {
        format_decimal(value, 4, nf)
    }
}

fn unit_label(symbol: &str) -> String {
    DataRateUnit::from_symbol(symbol)
        .map(|u| u.label().to_string())
        .unwrap_or_else(|| symbol.to_string())
}

/// Rows of every unit's equivalent for the chart and table
fn unit_rows(bps: f64) -> serde_json::Value {
    let rows: Vec<_> = DataRateUnit::ALL
        .iter()
        .map(|unit| json!({ "unit": unit.label(), "value": bps / unit.to_bps_factor() }))
        .collect();
    json!({ "units": rows })
}

pub fn compute(input: &ComputeInput) -> CalculatorResults {
    match input.text("mode", MODE_CONVERT).as_str() {
        MODE_WEBSITE => compute_website(input),
        _ => compute_convert(input),
    }
}

fn compute_convert(input: &ComputeInput) -> CalculatorResults {
    let nf = input.number_format();
    let value = input.number("value", DEFAULT_VALUE);
    if value <= 0.0 {
        return CalculatorResults::invalid();
    }
    let from = input.text("fromUnit", DEFAULT_FROM_UNIT);
    let to = input.text("toUnit", DEFAULT_TO_UNIT);

    let rate = BitsPerSecond(convert_to_base_unit(value, &from));
    let bps = rate.value();
    let result = bps / convert_to_base_unit(1.0, &to);
    let bytes_per_second = BytesPerSecond::from(rate).value();
    let monthly_bytes = bytes_per_second * SECONDS_PER_DAY * DAYS_PER_MONTH;

    let mut builder = ResultBuilder::new()
        .entry("result", result, format!("{} {}", amount(result, &nf), unit_label(&to)))
        .entry("monthlyTransfer", monthly_bytes, format_bytes_human(monthly_bytes))
        .entry("dailyTransfer", bytes_per_second * SECONDS_PER_DAY, format_bytes_human(bytes_per_second * SECONDS_PER_DAY));

    for (id, unit) in EQUIVALENTS {
        let converted = bps / unit.to_bps_factor();
        builder = builder.entry(id, converted, format!("{} {}", amount(converted, &nf), unit.label()));
    }

    builder
        .var("value", amount(value, &nf))
        .var("fromUnit", unit_label(&from))
        .var("toUnit", unit_label(&to))
        .summary(input.t.format("summary", "{value} {fromUnit} = {result}"))
        .metadata(unit_rows(bps))
        .build()
}

fn compute_website(input: &ComputeInput) -> CalculatorResults {
    let nf = input.number_format();
    let page_views = input.number("pageViews", DEFAULT_PAGE_VIEWS);
    let page_size = input.number("avgPageSize", DEFAULT_PAGE_SIZE);
    let redundancy = input.number("redundancy", DEFAULT_REDUNDANCY);
    if page_views <= 0.0 || page_size <= 0.0 || redundancy <= 0.0 {
        return CalculatorResults::invalid();
    }

    let size_symbol = input.unit("avgPageSize", DEFAULT_PAGE_SIZE_UNIT);
    let size_unit = DataSizeUnit::from_symbol(size_symbol).unwrap_or_else(|| {
        tracing::debug!(unit = size_symbol, "unknown page size unit, assuming MB");
        DataSizeUnit::MB
    });

    let monthly = size_unit.to_bytes(page_size) * page_views;
    let monthly_bytes = monthly.value();
    let seconds_per_month = DAYS_PER_MONTH * SECONDS_PER_DAY;
    let average = BitsPerSecond::from(BytesPerSecond(monthly_bytes / seconds_per_month));
    let recommended = average * redundancy;
    let (average_bps, recommended_bps) = (average.value(), recommended.value());
    let average_mbps = average_bps / 1e6;
    let recommended_mbps = recommended_bps / 1e6;
    let daily_bytes = monthly_bytes / DAYS_PER_MONTH;

    ResultBuilder::new()
        .entry("averageMbps", average_mbps, format!("{} Mbps", format_decimal(average_mbps, 3, &nf)))
        .entry(
            "recommendedMbps",
            recommended_mbps,
            format!("{} Mbps", format_decimal(recommended_mbps, 3, &nf)),
        )
        .entry("monthlyTransfer", monthly_bytes, format_bytes_human(monthly_bytes))
        .entry("dailyTransfer", daily_bytes, format_bytes_human(daily_bytes))
        .entry("averageBps", average_bps, format_bit_rate(average_bps))
        .entry("recommendedBps", recommended_bps, format_bit_rate(recommended_bps))
        .var("pageViews", format_decimal(page_views, 0, &nf))
        .var("redundancy", format_decimal(redundancy, 2, &nf))
        .summary(input.t.format(
            "websiteSummary",
            "Average {averageMbps}, plan for {recommendedMbps} ({monthlyTransfer} per month)",
        ))
        .metadata(unit_rows(recommended_bps))
        .build()
}
