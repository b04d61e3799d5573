use crate::dsl::Expr;
use crate::ops::{AndOp, OrOp};
use crate::variable::{Fuzzified, VariableKey};

pub struct Rules<T>(pub(crate) Vec<Rule<T>>);

impl<T> Default for Rules<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Rules<T> {
    pub fn new() -> Self {
        Rules(Vec::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Rules(Vec::with_capacity(capacity))
    }

    /// `consequence` must be a single proposition or an AND of propositions.
    pub fn add(&mut self, premise: Expr<T>, consequence: Expr<T>) {
        self.add_with_cf(premise, consequence, 1.0);
    }

    /// Like `add`, but the rule's strength is scaled by the certainty factor `cf`.
    pub fn add_with_cf(&mut self, premise: Expr<T>, consequence: Expr<T>, cf: f64) {
        self.0.push(Rule { premise, consequence, cf });
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule<T>> {
        self.0.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Rule<T>> {
        self.0.get(index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

pub struct Rule<T> {
    pub(crate) premise: Expr<T>,
    pub(crate) consequence: Expr<T>,
    pub(crate) cf: f64,
}

impl<T> Rule<T> {
    pub fn premise(&self) -> &Expr<T> {
        &self.premise
    }

    pub fn consequence(&self) -> &Expr<T> {
        &self.consequence
    }

    pub fn cf(&self) -> f64 {
        self.cf
    }
}

impl<T: Copy + PartialEq> Rule<T> {
    /// The `(variable, term)` targets this rule activates, in order.
    pub fn consequents(&self) -> Vec<(VariableKey, T)> {
        self.consequence.propositions()
    }

    /// Firing strength of the premise over already fuzzified inputs, scaled by `cf`.
    ///
    /// A proposition with no fuzzified degree counts as zero.
    pub fn fire(&self, fuzzified: &Fuzzified<T>, and_op: AndOp, or_op: OrOp) -> f64 {
        let degree = |var_key: VariableKey, term: T| {
            fuzzified
                .get(&var_key)
                .and_then(|degrees| degrees.iter().find(|(t, _)| *t == term))
                .map_or(0., |(_, degree)| *degree)
        };

        self.premise.eval(and_op, or_op, &degree) * self.cf
    }
}

#[test]
fn test_fire() {
    use std::collections::HashMap;

    use crate::terms::{Key, Terms};
    use crate::variable::Variables;

    #[derive(Clone, Copy, Debug, Key, PartialEq, Eq)]
    enum Level {
        Low,
        High,
    }

    let terms = || Terms::new().with(Level::Low, [0., 0., 10.]).with(Level::High, [0., 10., 10.]);
    let mut vars = Variables::<Level>::new();
    let x = vars.input("x", 0. ..=10., 1., terms());
    let y = vars.input("y", 0. ..=10., 1., terms());
    let out = vars.output("out", 0. ..=10., 1., terms());

    let mut fuzzified = HashMap::new();

    fuzzified.insert(x.key(), vars.get(x.key()).unwrap().fuzzify(7.5));
    fuzzified.insert(y.key(), vars.get(y.key()).unwrap().fuzzify(5.));

    let mut rules = Rules::with_capacity(3);

    rules.add(x.is(Level::High).and(y.is(Level::High)), out.is(Level::High));
    rules.add(x.is(Level::Low).or(y.is(Level::Low)), out.is(Level::Low));
    rules.add_with_cf(x.is(Level::High), out.is(Level::High).and(out.is(Level::Low)), 0.5);

    let strengths: Vec<_> = rules.iter().map(|rule| rule.fire(&fuzzified, AndOp::Min, OrOp::Max)).collect();

    assert_eq!(strengths, vec![0.5, 0.5, 0.375]);
    assert_eq!(rules.get(2).map(Rule::consequents), Some(vec![(out.key(), Level::High), (out.key(), Level::Low)]));
    assert_eq!(rules.len(), 3);
}
