//! # Loan Amortization
//!
//! Fixed-rate annuity loan with an optional extra principal payment each
//! period.
//!
//! Payment per period: `P * r / (1 - (1 + r)^-n)`, or `P / n` at a zero rate.
//! The schedule is simulated period by period so extra payments shorten the
//! term; the last payment only covers what is left.

use serde::Serialize;
use serde_json::json;

use crate::errors::CalcResult;
use crate::format::{format_currency, format_decimal, format_number};
use crate::input::ComputeInput;
use crate::locale::LocaleCatalog;
use crate::results::{CalculatorResults, ResultBuilder};
use crate::schema::{
    CalculatorConfig, Category, ChartType, InputField, Preset, ResultField, ResultFormat, UnitType,
};
use crate::units::currency_codes;

pub const ID: &str = "loan";

pub const ERROR_CURRENCY_MISMATCH: &str = "currency_mismatch";

const DEFAULT_AMOUNT: f64 = 250_000.0;
const DEFAULT_RATE: f64 = 6.5;
const DEFAULT_TERM: f64 = 30.0;
const DEFAULT_FREQUENCY: &str = "monthly";
const DEFAULT_CURRENCY: &str = "USD";

/// Balance below half a cent counts as paid off
const PAID_OFF: f64 = 0.005;

fn periods_per_year(frequency: &str) -> u32 {
    match frequency {
        "weekly" => 52,
        "biweekly" => 26,
        _ => 12,
    }
}

/// Level payment that retires `principal` over `periods` at `rate` per period
pub fn annuity_payment(principal: f64, rate: f64, periods: u32) -> f64 {
    if periods == 0 {
        return principal;
    }
    if rate == 0.0 {
        return principal / periods as f64;
    }
    principal * rate / (1.0 - (1.0 + rate).powi(-(periods as i32)))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanYear {
    pub year: u32,
    pub paid: f64,
    pub principal: f64,
    pub interest: f64,
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    pub periods: u32,
    pub total_paid: f64,
    pub total_interest: f64,
    pub years: Vec<LoanYear>,
}

/// Simulate repayment with `extra` added to every scheduled payment
pub fn amortize(principal: f64, rate: f64, payment: f64, extra: f64, max_periods: u32, per_year: u32) -> Schedule {
    let mut balance = principal;
    let mut schedule = Schedule {
        periods: 0,
        total_paid: 0.0,
        total_interest: 0.0,
        years: Vec::new(),
    };
    let mut year = LoanYear {
        year: 1,
        paid: 0.0,
        principal: 0.0,
        interest: 0.0,
        balance,
    };

    for period in 1..=max_periods {
        let interest = balance * rate;
        let principal_paid = (payment + extra - interest).min(balance);
        balance -= principal_paid;

        year.paid += principal_paid + interest;
        year.principal += principal_paid;
        year.interest += interest;
        schedule.total_paid += principal_paid + interest;
        schedule.total_interest += interest;
        schedule.periods = period;

        let done = balance <= PAID_OFF;
        if period % per_year == 0 || done {
            year.balance = balance.max(0.0);
            let next = year.year + 1;
            schedule.years.push(std::mem::replace(
                &mut year,
                LoanYear {
                    year: next,
                    paid: 0.0,
                    principal: 0.0,
                    interest: 0.0,
                    balance,
                },
            ));
        }
        if done {
            break;
        }
    }
    schedule
}

pub fn config() -> CalcResult<CalculatorConfig> {
    let currencies = currency_codes();
    let config = CalculatorConfig::new(ID, "1.0.3", Category::Finance, "home")
        .with_input(
            InputField::number("loanAmount", DEFAULT_AMOUNT)
                .min(0.0)
                .step(1000.0)
                .with_unit(UnitType::Currency, DEFAULT_CURRENCY, &currencies)
                .required(),
        )
        .with_input(InputField::number("interestRate", DEFAULT_RATE).range(0.0, 30.0).step(0.05))
        .with_input(InputField::stepper("loanTerm", DEFAULT_TERM).range(1.0, 50.0).step(1.0))
        .with_input(InputField::select("paymentFrequency", DEFAULT_FREQUENCY, &["monthly", "biweekly", "weekly"]))
        .with_input(
            InputField::number("extraPayment", 0.0)
                .min(0.0)
                .step(50.0)
                .with_unit(UnitType::Currency, DEFAULT_CURRENCY, &currencies),
        )
        .with_preset(
            Preset::new("mortgage", "home")
                .set("loanAmount", 350_000.0)
                .set("interestRate", 6.5)
                .set("loanTerm", 30.0),
        )
        .with_preset(
            Preset::new("carLoan", "car")
                .set("loanAmount", 30_000.0)
                .set("interestRate", 7.5)
                .set("loanTerm", 5.0),
        )
        .with_preset(
            Preset::new("studentLoan", "graduation")
                .set("loanAmount", 40_000.0)
                .set("interestRate", 5.5)
                .set("loanTerm", 10.0),
        )
        .with_result(ResultField::primary("payment").format(ResultFormat::Currency))
        .with_result(ResultField::primary("totalInterest").format(ResultFormat::Currency))
        .with_result(ResultField::secondary("totalPaid").format(ResultFormat::Currency))
        .with_result(ResultField::secondary("payoffPeriods").format(ResultFormat::Number))
        .with_result(ResultField::secondary("payoffTime"))
        .with_result(ResultField::secondary("interestSaved").format(ResultFormat::Currency))
        .with_chart(ChartType::Bar, "yearly", "year", &["principal", "interest"])
        .with_table("yearly", &["year", "paid", "principal", "interest", "balance"])
        .with_info_card("extraPayments", "rocket")
        .with_education("amortization")
        .with_faq("biweekly")
        .with_reference(
            "Consumer Financial Protection Bureau: What is amortization?",
            "https://www.consumerfinance.gov/ask-cfpb/what-is-amortization-and-how-could-it-affect-my-auto-loan-en-873/",
        );

    Ok(config.with_locales(LocaleCatalog::load_embedded(ID)?))
}

pub fn compute(input: &ComputeInput) -> CalculatorResults {
    let nf = input.number_format();

    let amount = input.number("loanAmount", DEFAULT_AMOUNT);
    let annual_rate = input.number("interestRate", DEFAULT_RATE);
    let term = input.number("loanTerm", DEFAULT_TERM).round();
    let extra = input.number("extraPayment", 0.0);
    if amount <= 0.0 || annual_rate < 0.0 || term < 1.0 || extra < 0.0 {
        return CalculatorResults::invalid();
    }

    let currency = input.unit("loanAmount", DEFAULT_CURRENCY);
    if extra > 0.0 && input.unit("extraPayment", currency) != currency {
        return CalculatorResults::invalid_with(
            ERROR_CURRENCY_MISMATCH,
            input.t.value("currencyMismatch", "Extra payments must use the loan currency"),
        );
    }

    let frequency = input.text("paymentFrequency", DEFAULT_FREQUENCY);
    let per_year = periods_per_year(&frequency);
    let periods = (term.min(100.0) as u32) * per_year;
    let rate = annual_rate / 100.0 / per_year as f64;

    let payment = annuity_payment(amount, rate, periods);
    let schedule = amortize(amount, rate, payment, extra, periods, per_year);
    let baseline_interest = (payment * periods as f64 - amount).max(0.0);
    let interest_saved = (baseline_interest - schedule.total_interest).max(0.0);
    let payoff_years = schedule.periods as f64 / per_year as f64;

    let money = |v: f64| format_currency(v, 2, currency, &nf);

    ResultBuilder::new()
        .entry("payment", payment, money(payment))
        .entry("totalInterest", schedule.total_interest, money(schedule.total_interest))
        .entry("totalPaid", schedule.total_paid, money(schedule.total_paid))
        .entry("payoffPeriods", schedule.periods as f64, format_number(schedule.periods as f64, 0, &nf))
        .entry(
            "payoffTime",
            payoff_years,
            format!("{} {}", format_decimal(payoff_years, 1, &nf), input.t.value("years", "years")),
        )
        .entry("interestSaved", interest_saved, money(interest_saved))
        .var("paymentFrequency", input.t.value(&frequency, &frequency))
        .summary(input.t.format(
            "summary",
            "Pay {payment} {paymentFrequency} for {payoffTime}: {totalInterest} in interest, {totalPaid} in total",
        ))
        .metadata(json!({ "yearly": schedule.years }))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mortgage() -> ComputeInput {
        ComputeInput::default()
            .with("loanAmount", 250_000.0)
            .with("interestRate", 6.5)
            .with("loanTerm", 30)
            .with("paymentFrequency", "monthly")
    }

    #[test]
    fn test_standard_mortgage() {
        let results = compute(&mortgage());
        assert!(results.is_valid);
        assert!((results.number("payment").unwrap() - 1580.17).abs() < 0.01);
        assert_eq!(results.text("payment"), Some("$1,580.17"));
        assert_eq!(results.number("payoffPeriods"), Some(360.0));
        assert!((results.number("totalInterest").unwrap() - 318_861.22).abs() < 0.05);
        assert!(results.number("interestSaved").unwrap() < 0.01);
    }

    #[test]
    fn test_extra_payment_shortens_loan() {
        let results = compute(&mortgage().with("extraPayment", 200.0));
        assert_eq!(results.number("payoffPeriods"), Some(265.0));
        let saved = results.number("interestSaved").unwrap();
        assert!((saved - (318_861.22 - 221_243.10)).abs() < 0.1);
        assert_eq!(results.text("payoffTime"), Some("22.1 years"));
    }

    #[test]
    fn test_extra_payment_currency_must_match() {
        let euros = mortgage().with_unit("loanAmount", "EUR");
        let same = compute(&euros.clone().with("extraPayment", 200.0).with_unit("extraPayment", "EUR"));
        assert!(same.is_valid);
        assert_eq!(same.number("payoffPeriods"), Some(265.0));

        let mixed = compute(&euros.clone().with("extraPayment", 200.0).with_unit("extraPayment", "USD"));
        assert!(!mixed.is_valid);
        assert!(mixed.values.is_empty());
        assert_eq!(mixed.error.as_deref(), Some(ERROR_CURRENCY_MISMATCH));

        // no extra payment, nothing to convert
        let idle = compute(&euros.with("extraPayment", 0.0).with_unit("extraPayment", "USD"));
        assert!(idle.is_valid);
    }

    #[test]
    fn test_zero_rate() {
        let results = compute(
            &ComputeInput::default()
                .with("loanAmount", 12_000.0)
                .with("interestRate", 0.0)
                .with("loanTerm", 1),
        );
        assert_eq!(results.number("payment"), Some(1000.0));
        assert_eq!(results.number("totalInterest"), Some(0.0));
        assert_eq!(results.number("payoffPeriods"), Some(12.0));
    }

    #[test]
    fn test_yearly_rows_balance_down() {
        let results = compute(&mortgage());
        let rows = results.metadata.as_ref().unwrap()["yearly"].as_array().unwrap().clone();
        assert_eq!(rows.len(), 30);
        let balances: Vec<f64> = rows.iter().map(|r| r["balance"].as_f64().unwrap()).collect();
        assert!(balances.windows(2).all(|w| w[1] < w[0]));
        assert!(balances[29] < 0.01);
    }

    #[test]
    fn test_biweekly_payment() {
        let results = compute(&mortgage().with("paymentFrequency", "biweekly"));
        let payment = results.number("payment").unwrap();
        assert!(payment < 1580.17 / 2.0 + 1.0 && payment > 700.0);
        assert!(results.summary.contains("biweekly"));
    }

    #[test]
    fn test_invalid_amount() {
        assert!(!compute(&mortgage().with("loanAmount", 0.0)).is_valid);
        assert!(!compute(&mortgage().with("interestRate", -1.0)).is_valid);
    }
}
