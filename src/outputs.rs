use std::collections::HashMap;

use crate::variable::{Variable, VariableKey};

/// The crisp value of one output variable.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Defuzzified {
    Value(f64),
    /// No rule lent the variable any membership; this is the universe midpoint.
    Fallback(f64),
}

impl Defuzzified {
    pub fn value(self) -> f64 {
        match self {
            Self::Value(value) | Self::Fallback(value) => value,
        }
    }

    pub fn is_fallback(self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

/// Everything derived while evaluating one set of inputs.
#[derive(Clone, Debug)]
pub struct Outputs {
    clamped_inputs: HashMap<VariableKey, f64>,
    firing_strengths: Vec<f64>,
    aggregated_memberships: HashMap<VariableKey, Vec<f64>>,
    defuzzificated_inferred_memberships: HashMap<VariableKey, Defuzzified>,
}

impl Outputs {
    pub(crate) fn new(
        clamped_inputs: HashMap<VariableKey, f64>,
        firing_strengths: Vec<f64>,
        aggregated_memberships: HashMap<VariableKey, Vec<f64>>,
        defuzzificated_inferred_memberships: HashMap<VariableKey, Defuzzified>,
    ) -> Self {
        Self {
            clamped_inputs,
            firing_strengths,
            aggregated_memberships,
            defuzzificated_inferred_memberships,
        }
    }

    /// Crisp value of an output variable.
    pub fn get_inferred_membership<I>(&self, var: Variable<I>) -> Option<f64> {
        self.defuzzified(var).map(Defuzzified::value)
    }

    pub fn defuzzified<I>(&self, var: Variable<I>) -> Option<Defuzzified> {
        self.defuzzificated_inferred_memberships.get(&var.0).copied()
    }

    pub fn is_fallback<I>(&self, var: Variable<I>) -> bool {
        self.defuzzified(var).is_some_and(Defuzzified::is_fallback)
    }

    /// The aggregated fuzzy set of an output variable, sampled over its universe.
    pub fn aggregated<I>(&self, var: Variable<I>) -> Option<&[f64]> {
        self.aggregated_memberships.get(&var.0).map(Vec::as_slice)
    }

    /// The value an input was evaluated at, after clipping into its universe.
    pub fn clamped_input<I>(&self, var: Variable<I>) -> Option<f64> {
        self.clamped_inputs.get(&var.0).copied()
    }

    pub fn firing_strength(&self, rule: usize) -> Option<f64> {
        self.firing_strengths.get(rule).copied()
    }

    /// Firing strength of every rule, in rule base order.
    pub fn firing_strengths(&self) -> &[f64] {
        &self.firing_strengths
    }

    /// Strength of the most strongly firing rule.
    pub fn inferred_cf(&self) -> f64 {
        self.firing_strengths.iter().copied().fold(0., f64::max)
    }
}
