//! A validated, immutable pairing of variables and rules.
//!
//! Assembly checks every invariant the inference engine relies on, so a `Model`
//! that exists can always be evaluated. It is never mutated afterwards and may be
//! shared between threads freely.

use std::collections::HashSet;
use std::fmt::Display;

use serde::Serialize;
use tracing::{debug, warn};

use crate::dsl::Expr;
use crate::error::ModelError;
use crate::rules::{Rule, Rules};
use crate::variable::{LinguisticVariable, Role, VariableKey, Variables};

pub struct Model<T> {
    vars: Variables<T>,
    rules: Rules<T>,
}

impl<T: Copy + PartialEq + Display> Model<T> {
    pub fn new(vars: Variables<T>, rules: Rules<T>) -> Result<Self, ModelError> {
        let mut names = HashSet::with_capacity(vars.len());

        for (_, var) in vars.iter() {
            if !names.insert(var.name()) {
                return Err(ModelError::DuplicateVariable(var.name().to_owned()));
            }

            check_variable(var)?;
        }

        for (i, rule) in rules.iter().enumerate() {
            check_rule(&vars, i, rule)?;
        }

        let concluded: HashSet<_> = rules
            .iter()
            .flat_map(|rule| rule.consequents())
            .map(|(var_key, _)| var_key)
            .collect();

        for (key, var) in vars.iter() {
            if var.role() == Role::Output && !concluded.contains(&key) {
                warn!(variable = var.name(), "no rule concludes on output; it will always fall back");
            }
        }

        if rules.is_empty() {
            warn!("model has no rules");
        }

        let this = Self { vars, rules };

        debug!(
            inputs = this.inputs().count(),
            outputs = this.outputs().count(),
            rules = this.rules.len(),
            "assembled fuzzy model"
        );

        Ok(this)
    }

    /// Ordered `(term, sampled membership)` pairs over the variable's universe.
    pub fn curves(&self, var_key: VariableKey) -> Option<MembershipCurves> {
        let var = self.vars.get(var_key)?;

        Some(MembershipCurves {
            variable: var.name().to_owned(),
            universe: var.universe().to_vec(),
            terms: var
                .curves()
                .into_iter()
                .map(|(term, membership)| TermCurve {
                    term: term.to_string(),
                    membership,
                })
                .collect(),
        })
    }

    /// `IF <premise> THEN <consequence>` for the rule at `index`.
    pub fn describe_rule(&self, index: usize) -> Option<String> {
        let rule = self.rules.get(index)?;
        let mut text = format!(
            "IF {} THEN {}",
            rule.premise().render(&self.vars),
            rule.consequence().render(&self.vars)
        );

        if rule.cf() < 1. {
            text.push_str(&format!(" WITH {}", rule.cf()));
        }

        Some(text)
    }

    /// Every rule rendered as text, in rule base order.
    pub fn describe_rules(&self) -> Vec<String> {
        (0..self.rules.len()).filter_map(|i| self.describe_rule(i)).collect()
    }
}

impl<T> Model<T> {
    pub fn variables(&self) -> &Variables<T> {
        &self.vars
    }

    pub fn variable(&self, var_key: VariableKey) -> Option<&LinguisticVariable<T>> {
        self.vars.get(var_key)
    }

    /// Looks a variable up by name.
    pub fn find(&self, name: &str) -> Option<(VariableKey, &LinguisticVariable<T>)> {
        self.vars.iter().find(|(_, var)| var.name() == name)
    }

    pub fn rules(&self) -> &Rules<T> {
        &self.rules
    }

    pub fn inputs(&self) -> impl Iterator<Item = (VariableKey, &LinguisticVariable<T>)> {
        self.vars.iter().filter(|(_, var)| var.role() == Role::Input)
    }

    pub fn outputs(&self) -> impl Iterator<Item = (VariableKey, &LinguisticVariable<T>)> {
        self.vars.iter().filter(|(_, var)| var.role() == Role::Output)
    }
}

/// Sampled membership curves of one variable, ready for plotting.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MembershipCurves {
    pub variable: String,
    pub universe: Vec<f64>,
    pub terms: Vec<TermCurve>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TermCurve {
    pub term: String,
    pub membership: Vec<f64>,
}

fn check_variable<T: Display>(var: &LinguisticVariable<T>) -> Result<(), ModelError> {
    let range = var.range();
    let (min, max) = (*range.start(), *range.end());

    if !var.has_valid_universe() {
        return Err(ModelError::InvalidUniverse {
            name: var.name().to_owned(),
            min,
            max,
            step: var.step(),
        });
    }

    if var.terms().is_empty() {
        return Err(ModelError::NoTerms(var.name().to_owned()));
    }

    for (term, tri) in var.terms() {
        if !tri.is_well_formed() {
            return Err(ModelError::UnorderedBreakpoints {
                variable: var.name().to_owned(),
                term: term.to_string(),
                a: tri.a,
                b: tri.b,
                c: tri.c,
            });
        }

        if !tri.fits(min, max) {
            return Err(ModelError::TermOutsideUniverse {
                variable: var.name().to_owned(),
                term: term.to_string(),
                min,
                max,
            });
        }
    }

    Ok(())
}

fn check_rule<T: Copy + PartialEq + Display>(vars: &Variables<T>, i: usize, rule: &Rule<T>) -> Result<(), ModelError> {
    if !rule.premise().is_populated() {
        return Err(ModelError::EmptyGroup { rule: i });
    }

    if !rule.consequence().is_conjunction() {
        return Err(ModelError::DisjunctiveConsequence { rule: i });
    }

    if matches!(rule.consequence(), Expr::And(exprs) if exprs.is_empty()) || rule.consequents().is_empty() {
        return Err(ModelError::EmptyConsequence { rule: i });
    }

    if !(0. ..=1.).contains(&rule.cf()) {
        return Err(ModelError::InvalidCertainty { rule: i, cf: rule.cf() });
    }

    let premise = rule.premise().propositions().into_iter().map(|prop| (prop, Role::Input));
    let consequence = rule.consequents().into_iter().map(|prop| (prop, Role::Output));

    for ((var_key, term), expected) in premise.chain(consequence) {
        let var = vars.get(var_key).ok_or(ModelError::UnknownVariable { rule: i })?;

        if var.triangle(term).is_none() {
            return Err(ModelError::UnknownTerm {
                rule: i,
                variable: var.name().to_owned(),
                term: term.to_string(),
            });
        }

        match (expected, var.role()) {
            (Role::Input, Role::Output) => {
                return Err(ModelError::OutputInPremise {
                    rule: i,
                    variable: var.name().to_owned(),
                })
            },
            (Role::Output, Role::Input) => {
                return Err(ModelError::InputInConsequence {
                    rule: i,
                    variable: var.name().to_owned(),
                })
            },
            _ => {},
        }
    }

    Ok(())
}

#[cfg(test)]
mod fixtures {
    use std::fmt;

    use crate::terms::{Key, Terms};

    #[derive(Clone, Copy, Debug, Key, PartialEq, Eq)]
    pub enum Level {
        Low,
        Mid,
        High,
    }

    impl fmt::Display for Level {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(match self {
                Level::Low => "low",
                Level::Mid => "mid",
                Level::High => "high",
            })
        }
    }

    pub fn two_terms() -> Terms<Level> {
        Terms::new().with(Level::Low, [0., 0., 10.]).with(Level::High, [0., 10., 10.])
    }
}

#[test]
fn test_valid_model_and_introspection() {
    use fixtures::Level;

    let mut vars = Variables::<Level>::new();
    let x = vars.input("x", 0. ..=10., 5., fixtures::two_terms());
    let y = vars.input("y", 0. ..=10., 1., fixtures::two_terms());
    let out = vars.output("out", 0. ..=10., 1., fixtures::two_terms());
    let mut rules = Rules::new();

    rules.add(x.is(Level::High).and(y.is(Level::Low).or(y.is(Level::High))), out.is(Level::High));
    rules.add_with_cf(x.is(Level::Low), out.is(Level::Low), 0.5);

    let model = Model::new(vars, rules).unwrap();

    assert_eq!(model.inputs().count(), 2);
    assert_eq!(model.outputs().count(), 1);
    assert_eq!(model.find("out").map(|(key, _)| key), Some(out.key()));
    assert_eq!(
        model.describe_rules(),
        vec![
            "IF x[high] AND (y[low] OR y[high]) THEN out[high]".to_owned(),
            "IF x[low] THEN out[low] WITH 0.5".to_owned(),
        ]
    );
    assert_eq!(model.describe_rule(2), None);

    let curves = model.curves(x.key()).unwrap();

    assert_eq!(curves.variable, "x");
    assert_eq!(curves.universe, vec![0., 5., 10.]);
    assert_eq!(
        curves.terms,
        vec![
            TermCurve {
                term: "low".to_owned(),
                membership: vec![1., 0.5, 0.],
            },
            TermCurve {
                term: "high".to_owned(),
                membership: vec![0., 0.5, 1.],
            },
        ]
    );
}

#[test]
fn test_invalid_variables() {
    use crate::terms::Terms;
    use fixtures::Level;

    let mut vars = Variables::<Level>::new();
    vars.input("x", 0. ..=10., 1., fixtures::two_terms());
    vars.output("x", 0. ..=10., 1., fixtures::two_terms());

    assert_eq!(
        Model::new(vars, Rules::new()).err(),
        Some(ModelError::DuplicateVariable("x".to_owned()))
    );

    let mut vars = Variables::<Level>::new();
    vars.input("x", 0. ..=10., 0., fixtures::two_terms());

    assert!(matches!(
        Model::new(vars, Rules::new()),
        Err(ModelError::InvalidUniverse { step, .. }) if step == 0.
    ));

    // Too many samples to walk is reported, not allocated
    let mut vars = Variables::<Level>::new();
    vars.input("x", 0. ..=1e300, 1e-300, fixtures::two_terms());

    assert!(matches!(
        Model::new(vars, Rules::new()),
        Err(ModelError::InvalidUniverse { name, .. }) if name == "x"
    ));

    let mut vars = Variables::<Level>::new();
    vars.input("x", 0. ..=10., 1., Terms::<Level>::new());

    assert_eq!(Model::new(vars, Rules::new()).err(), Some(ModelError::NoTerms("x".to_owned())));

    let mut vars = Variables::<Level>::new();
    vars.input("x", 0. ..=10., 1., Terms::new().with(Level::Mid, [6., 5., 7.]));

    assert!(matches!(
        Model::new(vars, Rules::new()),
        Err(ModelError::UnorderedBreakpoints { term, .. }) if term == "mid"
    ));

    let mut vars = Variables::<Level>::new();
    vars.input("x", 0. ..=10., 1., Terms::new().with(Level::High, [5., 10., 12.]));

    assert!(matches!(
        Model::new(vars, Rules::new()),
        Err(ModelError::TermOutsideUniverse { term, .. }) if term == "high"
    ));
}

#[test]
fn test_invalid_rules() {
    use fixtures::Level;

    let build = |add: &dyn Fn(&mut Rules<Level>, crate::Variable<Level>, crate::Variable<Level>)| {
        let mut vars = Variables::new();
        let x = vars.input("x", 0. ..=10., 1., fixtures::two_terms());
        let out = vars.output("out", 0. ..=10., 1., fixtures::two_terms());
        let mut rules = Rules::new();

        add(&mut rules, x, out);

        Model::new(vars, rules).err()
    };

    assert_eq!(
        build(&|rules, x, out| rules.add(x.is(Level::Mid), out.is(Level::Low))),
        Some(ModelError::UnknownTerm {
            rule: 0,
            variable: "x".to_owned(),
            term: "mid".to_owned(),
        })
    );
    assert_eq!(
        build(&|rules, x, out| rules.add(out.is(Level::Low), x.is(Level::Low))),
        Some(ModelError::OutputInPremise {
            rule: 0,
            variable: "out".to_owned(),
        })
    );
    assert_eq!(
        build(&|rules, x, _| rules.add(x.is(Level::Low), x.is(Level::High))),
        Some(ModelError::InputInConsequence {
            rule: 0,
            variable: "x".to_owned(),
        })
    );
    assert_eq!(
        build(&|rules, _, out| rules.add(Expr::And(vec![]), out.is(Level::Low))),
        Some(ModelError::EmptyGroup { rule: 0 })
    );
    assert_eq!(
        build(&|rules, x, _| rules.add(x.is(Level::Low), Expr::And(vec![]))),
        Some(ModelError::EmptyConsequence { rule: 0 })
    );
    assert_eq!(
        build(&|rules, x, out| rules.add(x.is(Level::Low), out.is(Level::Low).or(out.is(Level::High)))),
        Some(ModelError::DisjunctiveConsequence { rule: 0 })
    );
    assert_eq!(
        build(&|rules, x, out| rules.add_with_cf(x.is(Level::Low), out.is(Level::Low), 1.5)),
        Some(ModelError::InvalidCertainty { rule: 0, cf: 1.5 })
    );
    assert_eq!(build(&|rules, x, out| rules.add(x.is(Level::Low), out.is(Level::Low))), None);
}

#[test]
fn test_foreign_variable_is_rejected() {
    use crate::terms::Terms;
    use fixtures::Level;

    let mut other = Variables::<Level>::new();
    other.input("a", 0. ..=1., 1., fixtures::two_terms());
    let foreign = other.input("b", 0. ..=1., 1., Terms::new().with(Level::Low, [0., 0., 1.]));

    let mut vars = Variables::<Level>::new();
    let out = vars.output("out", 0. ..=10., 1., fixtures::two_terms());
    let mut rules = Rules::new();

    rules.add(foreign.is(Level::Low), out.is(Level::Low));

    assert_eq!(Model::new(vars, rules).err(), Some(ModelError::UnknownVariable { rule: 0 }));
}
