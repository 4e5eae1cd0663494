//! # Investment Growth Projector
//!
//! Compound growth of an initial amount plus periodic contributions,
//! simulated one compounding period at a time.
//!
//! Each period:
//! 1. contributions due at the *start* of their interval are added
//! 2. the per-period rate `(annualRate - annualFee) / periodsPerYear` is applied
//! 3. contributions due at the *end* of their interval are added
//!
//! When contributions are more frequent than compounding (e.g. monthly
//! deposits, annual compounding) they are pooled evenly across the
//! compounding periods. A second balance without fees runs alongside to
//! report what the fees cost. Contributions can escalate by a fixed
//! percentage each year.
//!
//! ## Example
//!
//! ```rust
//! use calc_engine::calculators::investment::compute;
//! use calc_engine::input::ComputeInput;
//!
//! let input = ComputeInput::default()
//!     .with("initialInvestment", 10_000.0)
//!     .with("contribution", 500.0)
//!     .with("expectedReturn", 8.0)
//!     .with("investmentPeriod", 20);
//!
//! let results = compute(&input);
//! let balance = results.number("futureBalance").unwrap();
//! assert!((balance - 343_778.24).abs() < 0.01);
//! ```

use serde::Serialize;
use serde_json::json;

use crate::errors::CalcResult;
use crate::format::{format_currency, format_decimal, format_percent, NOT_AVAILABLE};
use crate::input::ComputeInput;
use crate::locale::LocaleCatalog;
use crate::results::{CalculatorResults, ResultBuilder};
use crate::schema::{
    CalculatorConfig, Category, ChartType, InputField, Preset, ResultField, ResultFormat, UnitType,
};
use crate::units::currency_codes;

pub const ID: &str = "investment";

const DEFAULT_INITIAL: f64 = 10_000.0;
const DEFAULT_CONTRIBUTION: f64 = 500.0;
const DEFAULT_RETURN: f64 = 8.0;
const DEFAULT_YEARS: f64 = 20.0;
const DEFAULT_INFLATION: f64 = 2.5;
const DEFAULT_FEE: f64 = 0.5;
const DEFAULT_TAX: f64 = 15.0;
const DEFAULT_CURRENCY: &str = "USD";

/// How often something happens within a year
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Daily,
    Monthly,
    Quarterly,
    Annually,
}

impl Frequency {
    pub fn code(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Monthly => "monthly",
            Frequency::Quarterly => "quarterly",
            Frequency::Annually => "annually",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        [Frequency::Daily, Frequency::Monthly, Frequency::Quarterly, Frequency::Annually]
            .into_iter()
            .find(|f| f.code() == code.trim())
    }

    pub fn per_year(&self) -> u32 {
        match self {
            Frequency::Daily => 365,
            Frequency::Monthly => 12,
            Frequency::Quarterly => 4,
            Frequency::Annually => 1,
        }
    }
}

/// Whether contributions land at the start or end of their interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timing {
    Start,
    End,
}

/// Parameters of one projection
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub initial: f64,
    pub contribution: f64,
    pub contribution_frequency: Frequency,
    /// Annual return in percent
    pub annual_return: f64,
    pub compounding: Frequency,
    pub years: u32,
    pub timing: Timing,
    /// Yearly contribution escalation in percent
    pub contribution_increase: f64,
    /// Annual fee in percent, deducted from the return
    pub annual_fee: f64,
    /// Annual inflation in percent, used for real values
    pub inflation: f64,
}

/// One row of the year-by-year table
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearRow {
    pub year: u32,
    pub contribution: f64,
    pub interest_earned: f64,
    pub balance: f64,
    pub total_contributions: f64,
    pub real_value: f64,
}

/// Outcome of a projection
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionResult {
    pub balance: f64,
    pub balance_without_fees: f64,
    pub total_contributions: f64,
    pub years: Vec<YearRow>,
}

impl Projection {
    /// Run the period-by-period simulation
    pub fn run(&self) -> ProjectionResult {
        let periods = self.compounding.per_year();
        let rate = (self.annual_return - self.annual_fee) / 100.0 / periods as f64;
        let gross_rate = self.annual_return / 100.0 / periods as f64;

        // contributions per compounding period, or periods per contribution
        let deposits = self.contribution_frequency.per_year();
        let (interval, pooled) = if periods >= deposits && periods % deposits == 0 {
            (periods / deposits, 1.0)
        } else {
            (1, deposits as f64 / periods as f64)
        };

        let mut balance = self.initial;
        let mut gross = self.initial;
        let mut total_contributions = self.initial;
        let mut rows = Vec::with_capacity(self.years as usize);

        for year in 1..=self.years {
            let amount = self.contribution * pooled * (1.0 + self.contribution_increase / 100.0).powi(year as i32 - 1);
            let mut contributed = 0.0;
            let mut interest = 0.0;

            for period in 0..periods {
                let due_start = self.timing == Timing::Start && period % interval == 0;
                let due_end = self.timing == Timing::End && period % interval == interval - 1;

                if due_start {
                    balance += amount;
                    gross += amount;
                    contributed += amount;
                }
                let earned = balance * rate;
                balance += earned;
                gross += gross * gross_rate;
                interest += earned;
                if due_end {
                    balance += amount;
                    gross += amount;
                    contributed += amount;
                }
            }

            total_contributions += contributed;
            let deflator = (1.0 + self.inflation / 100.0).powi(year as i32);
            rows.push(YearRow {
                year,
                contribution: contributed,
                interest_earned: interest,
                balance,
                total_contributions,
                real_value: balance / deflator,
            });
        }

        ProjectionResult {
            balance,
            balance_without_fees: gross,
            total_contributions,
            years: rows,
        }
    }

    /// Effective annual rate after fees, in percent
    pub fn effective_rate(&self) -> f64 {
        let periods = self.compounding.per_year() as f64;
        let rate = (self.annual_return - self.annual_fee) / 100.0 / periods;
        ((1.0 + rate).powf(periods) - 1.0) * 100.0
    }
}

pub fn config() -> CalcResult<CalculatorConfig> {
    let currencies = currency_codes();
    let frequencies = ["monthly", "quarterly", "annually"];

    let config = CalculatorConfig::new(ID, "1.4.0", Category::Finance, "trending-up")
        .with_input(
            InputField::number("initialInvestment", DEFAULT_INITIAL)
                .min(0.0)
                .step(100.0)
                .with_unit(UnitType::Currency, DEFAULT_CURRENCY, &currencies),
        )
        .with_input(
            InputField::number("contribution", DEFAULT_CONTRIBUTION)
                .min(0.0)
                .step(50.0)
                .with_unit(UnitType::Currency, DEFAULT_CURRENCY, &currencies),
        )
        .with_input(InputField::select("contributionFrequency", "monthly", &frequencies))
        .with_input(InputField::number("expectedReturn", DEFAULT_RETURN).range(-50.0, 50.0).step(0.1))
        .with_input(InputField::select(
            "compoundingFrequency",
            "monthly",
            &["daily", "monthly", "quarterly", "annually"],
        ))
        .with_input(InputField::stepper("investmentPeriod", DEFAULT_YEARS).range(1.0, 100.0).step(1.0))
        .with_input(InputField::radio("contributionTiming", "end", &["start", "end"]))
        .with_input(InputField::number("contributionIncrease", 0.0).range(0.0, 50.0).step(0.5))
        .with_input(InputField::toggle("includeInflation", false))
        .with_input(
            InputField::number("inflationRate", DEFAULT_INFLATION)
                .range(0.0, 50.0)
                .step(0.1)
                .show_when("includeInflation", true),
        )
        .with_input(InputField::toggle("includeFees", false))
        .with_input(
            InputField::number("annualFee", DEFAULT_FEE)
                .range(0.0, 10.0)
                .step(0.05)
                .show_when("includeFees", true),
        )
        .with_input(InputField::toggle("includeTax", false))
        .with_input(
            InputField::number("taxRate", DEFAULT_TAX)
                .range(0.0, 100.0)
                .step(0.5)
                .show_when("includeTax", true),
        )
        .with_preset(
            Preset::new("retirement", "sunset")
                .set("initialInvestment", 25_000.0)
                .set("contribution", 800.0)
                .set("expectedReturn", 7.0)
                .set("investmentPeriod", 30.0)
                .set("contributionIncrease", 2.0)
                .set("includeInflation", true)
                .set("includeFees", true),
        )
        .with_preset(
            Preset::new("collegeFund", "graduation")
                .set("initialInvestment", 5_000.0)
                .set("contribution", 200.0)
                .set("expectedReturn", 6.0)
                .set("investmentPeriod", 18.0),
        )
        .with_preset(
            Preset::new("lumpSum", "coins")
                .set("initialInvestment", 50_000.0)
                .set("contribution", 0.0)
                .set("expectedReturn", 8.0)
                .set("investmentPeriod", 10.0)
                .set("compoundingFrequency", "annually"),
        )
        .with_result(ResultField::primary("futureBalance").format(ResultFormat::Currency))
        .with_result(ResultField::primary("totalContributions").format(ResultFormat::Currency))
        .with_result(ResultField::primary("interestEarned").format(ResultFormat::Currency))
        .with_result(ResultField::secondary("totalReturn").format(ResultFormat::Percent))
        .with_result(ResultField::secondary("realValue").format(ResultFormat::Currency))
        .with_result(ResultField::secondary("afterTaxValue").format(ResultFormat::Currency))
        .with_result(ResultField::secondary("feesCost").format(ResultFormat::Currency))
        .with_result(ResultField::secondary("effectiveRate").format(ResultFormat::Percent))
        .with_result(ResultField::secondary("doublingTime"))
        .with_chart(ChartType::Area, "yearly", "year", &["balance", "totalContributions", "realValue"])
        .with_table("yearly", &["year", "contribution", "interestEarned", "balance", "realValue"])
        .with_info_card("compounding", "repeat")
        .with_info_card("ruleOf72", "clock")
        .with_education("timeInMarket")
        .with_education("feesMatter")
        .with_faq("realReturn")
        .with_faq("contributionTiming")
        .with_faq("guarantee")
        .with_reference(
            "U.S. SEC Investor.gov: Compound Interest Calculator",
            "https://www.investor.gov/financial-tools-calculators/calculators/compound-interest-calculator",
        );

    Ok(config.with_locales(LocaleCatalog::load_embedded(ID)?))
}

pub fn compute(input: &ComputeInput) -> CalculatorResults {
    let nf = input.number_format();

    let initial = input.number("initialInvestment", DEFAULT_INITIAL);
    let contribution = input.number("contribution", DEFAULT_CONTRIBUTION);
    let annual_return = input.number("expectedReturn", DEFAULT_RETURN);
    let years = input.number("investmentPeriod", DEFAULT_YEARS).round();
    if initial < 0.0 || contribution < 0.0 || (initial == 0.0 && contribution == 0.0) {
        return CalculatorResults::invalid();
    }
    if years < 1.0 || annual_return <= -100.0 {
        return CalculatorResults::invalid();
    }

    let contribution_frequency =
        Frequency::from_code(&input.text("contributionFrequency", "monthly")).unwrap_or(Frequency::Monthly);
    let compounding = Frequency::from_code(&input.text("compoundingFrequency", "monthly")).unwrap_or(Frequency::Monthly);
    let timing = match input.text("contributionTiming", "end").as_str() {
        "start" => Timing::Start,
        _ => Timing::End,
    };

    let include_inflation = input.flag("includeInflation", false);
    let include_fees = input.flag("includeFees", false);
    let include_tax = input.flag("includeTax", false);

    let projection = Projection {
        initial,
        contribution,
        contribution_frequency,
        annual_return,
        compounding,
        years: years.min(100.0) as u32,
        timing,
        contribution_increase: input.number("contributionIncrease", 0.0).max(0.0),
        annual_fee: if include_fees { input.number("annualFee", DEFAULT_FEE).max(0.0) } else { 0.0 },
        inflation: if include_inflation { input.number("inflationRate", DEFAULT_INFLATION) } else { 0.0 },
    };
    let outcome = projection.run();

    let balance = outcome.balance;
    let interest = balance - outcome.total_contributions;
    let total_return = if outcome.total_contributions > 0.0 {
        interest / outcome.total_contributions * 100.0
    } else {
        0.0
    };
    let real_value = outcome.years.last().map(|row| row.real_value).unwrap_or(balance);
    let after_tax = if include_tax {
        let rate = input.number("taxRate", DEFAULT_TAX).clamp(0.0, 100.0);
        balance - interest.max(0.0) * rate / 100.0
    } else {
        balance
    };
    let fees_cost = (outcome.balance_without_fees - balance).max(0.0);
    let effective_rate = projection.effective_rate();

    let currency = input.unit("initialInvestment", DEFAULT_CURRENCY);
    let money = |v: f64| format_currency(v, 2, currency, &nf);
    let years_label = input.t.value("years", "years");

    let (doubling, doubling_text) = if effective_rate > 0.0 {
        let t = 72.0 / effective_rate;
        (t, format!("{} {}", format_decimal(t, 1, &nf), years_label))
    } else {
        (0.0, NOT_AVAILABLE.to_string())
    };

    ResultBuilder::new()
        .entry("futureBalance", balance, money(balance))
        .entry("totalContributions", outcome.total_contributions, money(outcome.total_contributions))
        .entry("interestEarned", interest, money(interest))
        .entry("totalReturn", total_return, format_percent(total_return, 1, &nf))
        .entry("realValue", real_value, money(real_value))
        .entry("afterTaxValue", after_tax, money(after_tax))
        .entry("feesCost", fees_cost, money(fees_cost))
        .entry("effectiveRate", effective_rate, format_percent(effective_rate, 2, &nf))
        .entry("doublingTime", doubling, doubling_text)
        .var("investmentPeriod", format_decimal(projection.years as f64, 0, &nf))
        .summary(input.t.format(
            "summary",
            "After {investmentPeriod} years your investment grows to {futureBalance}: {totalContributions} contributed and {interestEarned} earned",
        ))
        .metadata(json!({ "yearly": outcome.years }))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> ComputeInput {
        ComputeInput::default()
            .with("initialInvestment", 10_000.0)
            .with("contribution", 500.0)
            .with("contributionFrequency", "monthly")
            .with("expectedReturn", 8.0)
            .with("compoundingFrequency", "monthly")
            .with("investmentPeriod", 20.0)
    }

    fn balance(input: &ComputeInput) -> f64 {
        compute(input).number("futureBalance").unwrap()
    }

    #[test]
    fn test_monthly_scenario() {
        let results = compute(&base());
        assert!(results.is_valid);
        let future = results.number("futureBalance").unwrap();
        assert!((future - 343_778.24).abs() < 0.01);
        assert_eq!(results.number("totalContributions"), Some(130_000.0));
        assert_eq!(results.text("futureBalance"), Some("$343,778.24"));
        let interest = results.number("interestEarned").unwrap();
        assert!((interest - (future - 130_000.0)).abs() < 1e-6);
    }

    #[test]
    fn test_contribution_at_start_earns_more() {
        let start = balance(&base().with("contributionTiming", "start"));
        assert!((start - 345_741.64).abs() < 0.01);
        assert!(start > balance(&base()));
    }

    #[test]
    fn test_lump_sum_annual_compounding() {
        let input = ComputeInput::default()
            .with("initialInvestment", 1_000.0)
            .with("contribution", 0.0)
            .with("expectedReturn", 10.0)
            .with("compoundingFrequency", "annually")
            .with("investmentPeriod", 2.0);
        assert!((balance(&input) - 1_210.0).abs() < 1e-9);
    }

    #[test]
    fn test_pooled_contributions() {
        // monthly deposits with annual compounding: 12 x 100 pooled per year, paid at year end
        let input = ComputeInput::default()
            .with("initialInvestment", 0.0)
            .with("contribution", 100.0)
            .with("expectedReturn", 0.0)
            .with("compoundingFrequency", "annually")
            .with("investmentPeriod", 3.0);
        assert!((balance(&input) - 3_600.0).abs() < 1e-9);
    }

    #[test]
    fn test_yearly_rows() {
        let results = compute(&base());
        let rows = results.metadata.as_ref().unwrap()["yearly"].as_array().unwrap().clone();
        assert_eq!(rows.len(), 20);
        assert_eq!(rows[0]["year"], 1);
        assert_eq!(rows[0]["contribution"], 6_000.0);
        let last = rows[19]["balance"].as_f64().unwrap();
        assert!((last - results.number("futureBalance").unwrap()).abs() < 1e-9);
    }

    #[test]
    fn test_fees_reduce_balance() {
        let with_fees = compute(&base().with("includeFees", true).with("annualFee", 1.0));
        let fees = with_fees.number("feesCost").unwrap();
        let plain = balance(&base());
        assert!((with_fees.number("futureBalance").unwrap() + fees - plain).abs() < 1e-6);
        assert!(fees > 0.0);
        // 7% net monthly compounding
        assert!((with_fees.number("effectiveRate").unwrap() - 7.229).abs() < 0.001);
    }

    #[test]
    fn test_inflation_and_tax() {
        let results = compute(
            &base()
                .with("includeInflation", true)
                .with("inflationRate", 2.0)
                .with("includeTax", true)
                .with("taxRate", 20.0),
        );
        let future = results.number("futureBalance").unwrap();
        let real = results.number("realValue").unwrap();
        assert!((real - future / 1.02f64.powi(20)).abs() < 1e-6);
        let interest = results.number("interestEarned").unwrap();
        assert!((results.number("afterTaxValue").unwrap() - (future - interest * 0.2)).abs() < 1e-6);
    }

    #[test]
    fn test_rule_of_72() {
        let results = compute(&base().with("compoundingFrequency", "annually"));
        assert!((results.number("doublingTime").unwrap() - 9.0).abs() < 1e-9);
        assert_eq!(results.text("doublingTime"), Some("9 years"));
    }

    #[test]
    fn test_contribution_increase() {
        let flat = balance(&base());
        let rising = balance(&base().with("contributionIncrease", 3.0));
        assert!(rising > flat);
    }

    #[test]
    fn test_invalid_inputs() {
        let nothing = base().with("initialInvestment", 0.0).with("contribution", 0.0);
        assert!(!compute(&nothing).is_valid);
        assert!(!compute(&base().with("contribution", -5.0)).is_valid);
        assert!(!compute(&base().with("investmentPeriod", 0.0)).is_valid);
    }

    #[test]
    fn test_currency_override() {
        let mut input = base().with_unit("initialInvestment", "EUR");
        input.t.locale = "de".into();
        let results = compute(&input);
        assert_eq!(results.text("futureBalance"), Some("343.778,24\u{a0}€"));
    }
}
