use std::collections::HashMap;

use tracing::{debug, trace};

use crate::error::EvalError;
use crate::inputs::Inputs;
use crate::model::Model;
use crate::ops::*;
use crate::outputs::{Defuzzified, Outputs};
use crate::variable::{Fuzzified, Role};

/// Mamdani style inference: fuzzify, fire, imply, aggregate by max, defuzzify.
///
/// The engine holds no state between calls. Any number of evaluations may run
/// against the same `Model` at once.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InferenceEngine {
    and_op: AndOp,
    or_op: OrOp,
    imp_op: ImplicationOp,
    defuzz_op: DefuzzificationOp,
}

impl InferenceEngine {
    pub fn new(and_op: AndOp, or_op: OrOp, imp_op: ImplicationOp, defuzz_op: DefuzzificationOp) -> Self {
        Self {
            and_op,
            or_op,
            imp_op,
            defuzz_op,
        }
    }

    /// min AND, max OR, min implication, centroid.
    pub fn mamdani() -> Self {
        Self::default()
    }

    pub fn eval<T: Copy + PartialEq>(&self, model: &Model<T>, inputs: &Inputs) -> Result<Outputs, EvalError> {
        // Check facts
        for (key, value) in &inputs.0 {
            let var = model.variable(*key).ok_or(EvalError::UnknownVariable)?;

            if var.role() != Role::Input {
                return Err(EvalError::NotAnInput(var.name().to_owned()));
            }

            if !value.is_finite() {
                return Err(EvalError::NonFinite {
                    variable: var.name().to_owned(),
                    value: *value,
                });
            }
        }

        // Fuzzificate facts
        let mut clamped_inputs = HashMap::with_capacity(inputs.0.len());
        let mut fuzzified: Fuzzified<T> = HashMap::with_capacity(inputs.0.len());

        for (key, var) in model.inputs() {
            let value = *inputs
                .0
                .get(&key)
                .ok_or_else(|| EvalError::MissingInput(var.name().to_owned()))?;
            let clamped = var.clamp(value);

            if clamped != value {
                trace!(variable = var.name(), value, clamped, "clipped input to universe");
            }

            clamped_inputs.insert(key, clamped);
            fuzzified.insert(key, var.fuzzify(clamped));
        }

        // Fire rules
        let firing_strengths: Vec<f64> = model
            .rules()
            .iter()
            .map(|rule| rule.fire(&fuzzified, self.and_op, self.or_op))
            .collect();

        trace!(?firing_strengths, "fired rules");

        // Imply and aggregate
        let mut aggregated_memberships = HashMap::new();

        for (key, var) in model.outputs() {
            let universe = var.universe();
            let mut aggregated = vec![0.; universe.len()];

            for (rule, strength) in model.rules().iter().zip(&firing_strengths) {
                for (var_key, term) in rule.consequents() {
                    if var_key != key {
                        continue;
                    }

                    // Validated at assembly
                    let Some(tri) = var.triangle(term) else {
                        continue;
                    };

                    for (agg, u) in aggregated.iter_mut().zip(universe) {
                        *agg = f64::max(*agg, self.imp_op.call(*strength, tri.degree(*u)));
                    }
                }
            }

            aggregated_memberships.insert(key, aggregated);
        }

        // Defuzzificate
        let mut defuzzificated_inferred_memberships = HashMap::with_capacity(aggregated_memberships.len());

        for (key, var) in model.outputs() {
            let aggregated = &aggregated_memberships[&key];
            let defuzzed = match self.defuzz_op.call(var.universe(), aggregated) {
                Some(value) => Defuzzified::Value(value),
                None => {
                    debug!(variable = var.name(), "no aggregated membership, falling back to midpoint");

                    Defuzzified::Fallback(var.midpoint())
                },
            };

            defuzzificated_inferred_memberships.insert(key, defuzzed);
        }

        Ok(Outputs::new(
            clamped_inputs,
            firing_strengths,
            aggregated_memberships,
            defuzzificated_inferred_memberships,
        ))
    }
}

#[cfg(test)]
mod fixtures {
    use std::fmt;

    use crate::model::Model;
    use crate::rules::Rules;
    use crate::terms::{Key, Terms};
    use crate::variable::{Variable, Variables};

    #[derive(Clone, Copy, Debug, Key, PartialEq, Eq)]
    pub enum Level {
        Low,
        High,
    }

    impl fmt::Display for Level {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            fmt::Debug::fmt(self, f)
        }
    }

    pub struct Fixture {
        pub model: Model<Level>,
        pub x: Variable<Level>,
        pub y: Variable<Level>,
        pub out: Variable<Level>,
        pub idle: Variable<Level>,
    }

    /// Two inputs over [0, 10], an output over [0, 4] sampled at integers, and an
    /// output no rule concludes on.
    pub fn fixture(
        add_rules: impl FnOnce(&mut Rules<Level>, Variable<Level>, Variable<Level>, Variable<Level>),
    ) -> Fixture {
        let terms = || Terms::new().with(Level::Low, [0., 0., 10.]).with(Level::High, [0., 10., 10.]);
        let mut vars = Variables::new();
        let x = vars.input("x", 0. ..=10., 1., terms());
        let y = vars.input("y", 0. ..=10., 1., terms());
        let out = vars.output(
            "out",
            0. ..=4.,
            1.,
            Terms::new().with(Level::Low, [0., 0., 4.]).with(Level::High, [0., 4., 4.]),
        );
        let idle = vars.output(
            "idle",
            10. ..=20.,
            1.,
            Terms::new().with(Level::Low, [10., 10., 20.]).with(Level::High, [10., 20., 20.]),
        );
        let mut rules = Rules::new();

        add_rules(&mut rules, x, y, out);

        Fixture {
            model: Model::new(vars, rules).unwrap(),
            x,
            y,
            out,
            idle,
        }
    }
}

#[test]
fn test_aggregation_takes_max_not_sum() {
    use fixtures::Level;

    let f = fixtures::fixture(|rules, x, y, out| {
        rules.add(x.is(Level::High), out.is(Level::High));
        rules.add(y.is(Level::High), out.is(Level::High));
    });
    let inputs = Inputs::new().with(f.x, 2.5).with(f.y, 5.);
    let outputs = InferenceEngine::mamdani().eval(&f.model, &inputs).unwrap();

    assert_eq!(outputs.firing_strengths(), &[0.25, 0.5]);
    // High over [0, 4] sampled at integers is [0, .25, .5, .75, 1], clipped at 0.5
    assert_eq!(outputs.aggregated(f.out), Some(&[0., 0.25, 0.5, 0.5, 0.5][..]));

    // A single rule firing at the larger strength yields the same set
    let single = fixtures::fixture(|rules, _, y, out| rules.add(y.is(Level::High), out.is(Level::High)));
    let single_outputs = InferenceEngine::mamdani()
        .eval(&single.model, &Inputs::new().with(single.x, 2.5).with(single.y, 5.))
        .unwrap();

    assert_eq!(single_outputs.aggregated(single.out), outputs.aggregated(f.out));
    assert_eq!(
        single_outputs.get_inferred_membership(single.out),
        outputs.get_inferred_membership(f.out)
    );
    assert_eq!(outputs.inferred_cf(), 0.5);
}

#[test]
fn test_centroid_of_two_terms() {
    use approx::assert_abs_diff_eq;
    use fixtures::Level;

    let f = fixtures::fixture(|rules, x, _, out| {
        rules.add(x.is(Level::Low), out.is(Level::Low));
        rules.add(x.is(Level::High), out.is(Level::High));
    });
    let outputs = InferenceEngine::mamdani()
        .eval(&f.model, &Inputs::new().with(f.x, 5.).with(f.y, 0.))
        .unwrap();

    // Low clipped at .5: [.5, .5, .5, .25, 0]; High clipped at .5: [0, .25, .5, .5, .5]
    let aggregated = [0.5, 0.5, 0.5, 0.5, 0.5];

    assert_eq!(outputs.aggregated(f.out), Some(&aggregated[..]));
    assert_abs_diff_eq!(outputs.get_inferred_membership(f.out).unwrap(), 2., epsilon = 1e-12);
    assert_eq!(outputs.defuzzified(f.out), Some(Defuzzified::Value(2.)));
}

#[test]
fn test_zero_aggregation_falls_back_to_midpoint() {
    use fixtures::Level;

    let f = fixtures::fixture(|rules, x, _, out| rules.add(x.is(Level::High), out.is(Level::High)));
    let outputs = InferenceEngine::mamdani()
        .eval(&f.model, &Inputs::new().with(f.x, 0.).with(f.y, 0.))
        .unwrap();

    assert_eq!(outputs.firing_strength(0), Some(0.));
    assert_eq!(outputs.defuzzified(f.out), Some(Defuzzified::Fallback(2.)));
    assert!(outputs.is_fallback(f.out));
    // Never concluded on at all
    assert_eq!(outputs.defuzzified(f.idle), Some(Defuzzified::Fallback(15.)));
    assert_eq!(outputs.aggregated(f.idle).map(|agg| agg.iter().sum::<f64>()), Some(0.));
}

#[test]
fn test_larsen_and_mean_of_maximum() {
    use fixtures::Level;

    let f = fixtures::fixture(|rules, x, _, out| rules.add(x.is(Level::Low), out.is(Level::Low)));
    let engine = InferenceEngine::new(
        AndOp::Min,
        OrOp::Max,
        ImplicationOp::Prod,
        DefuzzificationOp::MeanOfMaximum,
    );
    let outputs = engine.eval(&f.model, &Inputs::new().with(f.x, 5.).with(f.y, 0.)).unwrap();

    assert_eq!(outputs.aggregated(f.out), Some(&[0.5, 0.375, 0.25, 0.125, 0.][..]));
    assert_eq!(outputs.get_inferred_membership(f.out), Some(0.));
}

#[test]
fn test_domain_errors() {
    use fixtures::Level;

    let f = fixtures::fixture(|rules, x, _, out| rules.add(x.is(Level::Low), out.is(Level::Low)));
    let engine = InferenceEngine::mamdani();

    assert!(matches!(
        engine.eval(&f.model, &Inputs::new().with(f.x, f64::NAN).with(f.y, 0.)),
        Err(EvalError::NonFinite { variable, value }) if variable == "x" && value.is_nan()
    ));
    assert_eq!(
        engine.eval(&f.model, &Inputs::new().with(f.x, 1.).with(f.y, f64::INFINITY)).err(),
        Some(EvalError::NonFinite {
            variable: "y".to_owned(),
            value: f64::INFINITY,
        })
    );
    assert_eq!(
        engine.eval(&f.model, &Inputs::new().with(f.x, 1.)).err(),
        Some(EvalError::MissingInput("y".to_owned()))
    );
    assert_eq!(
        engine.eval(&f.model, &Inputs::new().with(f.x, 1.).with(f.y, 1.).with(f.out, 1.)).err(),
        Some(EvalError::NotAnInput("out".to_owned()))
    );

    // The model is still usable afterwards
    assert!(engine.eval(&f.model, &Inputs::new().with(f.x, 1.).with(f.y, 1.)).is_ok());
}

#[test]
fn test_out_of_range_inputs_are_clamped() {
    use fixtures::Level;

    let f = fixtures::fixture(|rules, x, y, out| {
        rules.add(x.is(Level::High).and(y.is(Level::Low)), out.is(Level::High));
        rules.add(x.is(Level::Low).or(y.is(Level::High)), out.is(Level::Low));
    });
    let engine = InferenceEngine::mamdani();
    let wild = engine.eval(&f.model, &Inputs::new().with(f.x, 1e6).with(f.y, -3.)).unwrap();
    let bounded = engine.eval(&f.model, &Inputs::new().with(f.x, 10.).with(f.y, 0.)).unwrap();

    assert_eq!(wild.clamped_input(f.x), Some(10.));
    assert_eq!(wild.clamped_input(f.y), Some(0.));
    assert_eq!(wild.firing_strengths(), bounded.firing_strengths());
    assert_eq!(wild.get_inferred_membership(f.out), bounded.get_inferred_membership(f.out));
}
