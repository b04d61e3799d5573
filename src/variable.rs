use std::collections::HashMap;
use std::marker::PhantomData;
use std::ops::RangeInclusive;

use slotmap::{new_key_type, SlotMap};

use crate::linspace::Linspace;
use crate::terms::{Term, Terms, Triangle};

new_key_type! {
    /// A variable key
    pub struct VariableKey;
}

/// Typed handle to a variable whose terms are the enum `I`.
pub struct Variable<I>(pub(crate) VariableKey, PhantomData<I>);

impl<I> Clone for Variable<I> {
    fn clone(&self) -> Self {
        Variable(self.0, PhantomData)
    }
}

impl<I> Copy for Variable<I> {}

impl<I> Variable<I> {
    pub fn key(self) -> VariableKey {
        self.0
    }
}

/// Whether a variable is fed by the caller or produced by inference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Input,
    Output,
}

/// Degrees of every term of every input variable, per evaluation.
pub type Fuzzified<T> = HashMap<VariableKey, Vec<(T, f64)>>;

pub struct Variables<T>(pub(crate) SlotMap<VariableKey, LinguisticVariable<T>>);

impl<T> Default for Variables<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Variables<T> {
    pub fn new() -> Self {
        Self(SlotMap::with_key())
    }

    /// Declares an antecedent. `step` is the sampling resolution of the universe.
    pub fn input<I: Into<T> + Term>(
        &mut self,
        name: &str,
        universe_range: RangeInclusive<f64>,
        step: f64,
        terms: Terms<I>,
    ) -> Variable<I> {
        self.add(name, Role::Input, universe_range, step, terms)
    }

    /// Declares a consequent. `step` is the sampling resolution of the universe.
    pub fn output<I: Into<T> + Term>(
        &mut self,
        name: &str,
        universe_range: RangeInclusive<f64>,
        step: f64,
        terms: Terms<I>,
    ) -> Variable<I> {
        self.add(name, Role::Output, universe_range, step, terms)
    }

    fn add<I: Into<T> + Term>(
        &mut self,
        name: &str,
        role: Role,
        universe_range: RangeInclusive<f64>,
        step: f64,
        terms: Terms<I>,
    ) -> Variable<I> {
        let terms = terms.0.iter().map(|(k, v)| (k.into(), *v)).collect();
        let key = self
            .0
            .insert(LinguisticVariable::new(name, role, universe_range, step, terms));

        Variable(key, PhantomData)
    }

    pub fn get(&self, key: VariableKey) -> Option<&LinguisticVariable<T>> {
        self.0.get(key)
    }

    /// Variables in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (VariableKey, &LinguisticVariable<T>)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A named universe of discourse and the terms defined over it.
#[derive(Debug)]
pub struct LinguisticVariable<T> {
    name: String,
    role: Role,
    min_u: f64,
    max_u: f64,
    step: f64,
    universe: Vec<f64>,
    terms: Vec<(T, Triangle)>,
}

impl<T> LinguisticVariable<T> {
    fn new(name: &str, role: Role, universe_range: RangeInclusive<f64>, step: f64, terms: Vec<(T, Triangle)>) -> Self {
        let min_u = *universe_range.start();
        let max_u = *universe_range.end();
        // Left empty for a malformed range; model assembly reports it
        let universe = match Self::sample_count(min_u, max_u, step) {
            Some(n) => Linspace::new(min_u, max_u, n).collect(),
            None => Vec::new(),
        };

        Self {
            name: name.to_owned(),
            role,
            min_u,
            max_u,
            step,
            universe,
            terms,
        }
    }

    fn sample_count(min_u: f64, max_u: f64, step: f64) -> Option<usize> {
        if min_u.is_finite() && max_u.is_finite() && step.is_finite() && min_u < max_u && step > 0. {
            Linspace::count(min_u, max_u, step)
        } else {
            None
        }
    }

    pub(crate) fn has_valid_universe(&self) -> bool {
        Self::sample_count(self.min_u, self.max_u, self.step).is_some()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn range(&self) -> RangeInclusive<f64> {
        self.min_u..=self.max_u
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// The sampled universe used for aggregation and defuzzification.
    pub fn universe(&self) -> &[f64] {
        &self.universe
    }

    /// Fallback output when no rule lends this variable any membership.
    pub fn midpoint(&self) -> f64 {
        (self.min_u + self.max_u) / 2.
    }

    /// Clip to bounds.
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min_u).min(self.max_u)
    }

    pub fn terms(&self) -> &[(T, Triangle)] {
        &self.terms
    }
}

impl<T: Copy + PartialEq> LinguisticVariable<T> {
    pub fn triangle(&self, term: T) -> Option<Triangle> {
        self.terms.iter().find(|(t, _)| *t == term).map(|(_, tri)| *tri)
    }

    /// Degree of `term` at `value`, after clipping `value` into the universe.
    pub fn degree(&self, term: T, value: f64) -> Option<f64> {
        self.triangle(term).map(|tri| tri.degree(self.clamp(value)))
    }

    /// Degree of every term at `value`, after clipping `value` into the universe.
    pub fn fuzzify(&self, value: f64) -> Vec<(T, f64)> {
        let value = self.clamp(value);

        self.terms.iter().map(|(term, tri)| (*term, tri.degree(value))).collect()
    }

    /// `term`'s membership sampled over the universe.
    pub fn membership(&self, term: T) -> Option<Vec<f64>> {
        let tri = self.triangle(term)?;

        Some(self.universe.iter().map(|&u| tri.degree(u)).collect())
    }

    /// Every term's sampled membership, in declaration order.
    pub fn curves(&self) -> Vec<(T, Vec<f64>)> {
        self.terms
            .iter()
            .map(|(term, tri)| (*term, self.universe.iter().map(|&u| tri.degree(u)).collect()))
            .collect()
    }
}

#[cfg(test)]
#[derive(Clone, Copy, Debug, crate::terms::Key, PartialEq, Eq)]
enum Speed {
    Slow,
    Fast,
}

#[cfg(test)]
fn speed_terms() -> Terms<Speed> {
    Terms::new().with(Speed::Slow, [0., 0., 60.]).with(Speed::Fast, [40., 120., 120.])
}

#[test]
fn test_fuzzify_clips_to_bounds() {
    let mut vars = Variables::<Speed>::new();
    let speed = vars.input("speed", 0. ..=120., 1., speed_terms());
    let var = vars.get(speed.key()).unwrap();

    assert_eq!(var.fuzzify(30.), vec![(Speed::Slow, 0.5), (Speed::Fast, 0.)]);
    assert_eq!(var.fuzzify(999.), var.fuzzify(120.));
    assert_eq!(var.fuzzify(-5.), var.fuzzify(0.));
    assert_eq!(var.degree(Speed::Fast, 80.), Some(0.5));
    assert_eq!(var.midpoint(), 60.);

    for value in [-1e9, -1., 0., 17.3, 50., 60., 119.9, 120., 1e9] {
        for (_, degree) in var.fuzzify(value) {
            assert!((0. ..=1.).contains(&degree));
        }
    }
}

#[test]
fn test_universe_and_curves() {
    let mut vars = Variables::<Speed>::new();
    let speed = vars.output("speed", 0. ..=120., 10., speed_terms());
    let var = vars.get(speed.key()).unwrap();

    assert_eq!(var.role(), Role::Output);
    assert_eq!(var.universe().len(), 13);
    assert_eq!(var.universe()[12], 120.);

    let curves = var.curves();

    assert_eq!(curves.len(), 2);
    assert_eq!(curves[0].0, Speed::Slow);
    assert_eq!(curves[0].1[..4], [1., (60. - 10.) / 60., (60. - 20.) / 60., 0.5]);
    assert_eq!(var.membership(Speed::Fast).as_ref(), Some(&curves[1].1));
}

#[test]
fn test_malformed_universe_is_left_unsampled() {
    let mut vars = Variables::<Speed>::new();
    let speed = vars.input("speed", 10. ..=0., 1., speed_terms());
    let var = vars.get(speed.key()).unwrap();

    assert!(!var.has_valid_universe());
    assert!(var.universe().is_empty());
}
