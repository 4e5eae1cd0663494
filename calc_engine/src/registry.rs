//! # Calculator Registry
//!
//! Read-only map from calculator id to its configuration and compute
//! function. Built once at startup; lookups never mutate it.

use std::collections::BTreeMap;

use crate::calculators::{self, CalculatorDefinition};
use crate::errors::{CalcError, CalcResult};

#[derive(Debug, Clone, Default)]
pub struct Registry {
    calculators: BTreeMap<String, CalculatorDefinition>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in calculator
    pub fn builtin() -> CalcResult<Self> {
        let mut registry = Registry::new();
        for definition in calculators::builtin()? {
            registry.register(definition)?;
        }
        Ok(registry)
    }

    /// Add a calculator; ids must be unique
    pub fn register(&mut self, definition: CalculatorDefinition) -> CalcResult<()> {
        let id = definition.id().to_string();
        if self.calculators.contains_key(&id) {
            return Err(CalcError::invalid_config(id, vec!["calculator id is already registered".to_string()]));
        }
        self.calculators.insert(id, definition);
        Ok(())
    }

    pub fn get(&self, id: &str) -> CalcResult<&CalculatorDefinition> {
        self.calculators
            .get(id)
            .ok_or_else(|| CalcError::unknown_calculator(id))
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut CalculatorDefinition> {
        self.calculators.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.calculators.contains_key(id)
    }

    /// Definitions sorted by id
    pub fn iter(&self) -> impl Iterator<Item = &CalculatorDefinition> {
        self.calculators.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.calculators.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.calculators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calculators.is_empty()
    }
}
