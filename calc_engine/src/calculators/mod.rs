//! # Calculators
//!
//! Every calculator module follows the same pattern:
//!
//! - `ID` - registry key, also the locale folder name
//! - `config() -> CalcResult<CalculatorConfig>` - declarative description
//!   with its embedded locale bundles
//! - `compute(&ComputeInput) -> CalculatorResults` - pure computation
//!
//! Compute functions never return errors. Input that fails domain
//! validation yields [`CalculatorResults::invalid`] and empty maps.
//!
//! ## Available Calculators
//!
//! - [`bandwidth`] - Data rate conversion and website bandwidth sizing
//! - [`vlsm`] - Variable length subnet allocation (largest first)
//! - [`raid`] - RAID capacity, performance and rebuild risk
//! - [`investment`] - Compound growth with contributions, fees and tax
//! - [`loan`] - Loan amortization with extra payments

pub mod bandwidth;
pub mod investment;
pub mod loan;
pub mod raid;
pub mod vlsm;

use crate::errors::CalcResult;
use crate::input::ComputeInput;
use crate::results::CalculatorResults;
use crate::schema::CalculatorConfig;

/// Signature shared by all compute functions
pub type ComputeFn = fn(&ComputeInput) -> CalculatorResults;

/// A registered calculator: its configuration and compute function
#[derive(Debug, Clone)]
pub struct CalculatorDefinition {
    pub config: CalculatorConfig,
    pub compute: ComputeFn,
}

impl CalculatorDefinition {
    pub fn new(config: CalculatorConfig, compute: ComputeFn) -> Self {
        CalculatorDefinition { config, compute }
    }

    pub fn id(&self) -> &str {
        &self.config.id
    }
}

/// Definitions of every built-in calculator, in catalog order
pub fn builtin() -> CalcResult<Vec<CalculatorDefinition>> {
    Ok(vec![
        CalculatorDefinition::new(bandwidth::config()?, bandwidth::compute),
        CalculatorDefinition::new(vlsm::config()?, vlsm::compute),
        CalculatorDefinition::new(raid::config()?, raid::compute),
        CalculatorDefinition::new(investment::config()?, investment::compute),
        CalculatorDefinition::new(loan::config()?, loan::compute),
    ])
}
