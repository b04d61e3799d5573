//! The driver fatigue model.
//!
//! Five sensor readings (blink rate, steering wheel movement frequency, time behind
//! the wheel, cabin temperature, music volume) are mapped onto an alert level in
//! `[0, 100]` and a break suggestion in `[0, 1]`.
//!
//! The rule base has two families. The first pairs combinations of the sensors with
//! an alert level and a break suggestion. The second keys on drive time alone; since
//! the drive time terms cover their whole universe, at least one of those rules fires
//! for any reading and neither output ever falls back.

use std::fmt;

use serde::Serialize;

use crate::dsl::Expr;
use crate::error::{EvalError, ModelError};
use crate::inference::InferenceEngine;
use crate::inputs::Inputs;
use crate::model::Model;
use crate::outputs::Outputs;
use crate::rules::Rules;
use crate::terms::{Key, Terms};
use crate::variable::{Variable, VariableKey, Variables};

/// Break suggestions strictly above this are a "yes".
pub const DEFAULT_BREAK_THRESHOLD: f64 = 0.5;

macro_rules! fatigue_terms {
    ($($var:ident => $ty:ident { $($term:ident => $name:literal),+ $(,)? }),+ $(,)?) => {
        $(
            #[derive(Clone, Copy, Debug, Eq, Hash, Key, Ord, PartialEq, PartialOrd)]
            pub enum $ty {
                $($term),+
            }

            impl $ty {
                pub fn name(self) -> &'static str {
                    match self {
                        $(Self::$term => $name),+
                    }
                }
            }

            impl From<$ty> for FatigueTerm {
                fn from(term: $ty) -> Self {
                    Self::$var(term)
                }
            }
        )+

        /// Every term of every variable in the fatigue model.
        #[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
        pub enum FatigueTerm {
            $($var($ty)),+
        }

        impl fmt::Display for FatigueTerm {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $(Self::$var(term) => f.write_str(term.name())),+
                }
            }
        }
    };
}

fatigue_terms! {
    BlinkRate => BlinkRate { Low => "low", Normal => "normal", High => "high" },
    SteeringFreq => SteeringFreq { Low => "low", Normal => "normal", High => "high" },
    DriveTime => DriveTime { Short => "short", Medium => "medium", Long => "long" },
    Temp => Temp { Cold => "cold", Comfortable => "comfortable", Hot => "hot" },
    MusicVolume => MusicVolume { Low => "low", Medium => "medium", High => "high" },
    AlertLevel => AlertLevel { Low => "low", Medium => "medium", High => "high" },
    BreakSuggestion => BreakSuggestion { No => "no", Yes => "yes" },
}

/// One snapshot of the five sensors.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Reading {
    /// Eye blinks per second
    pub blink_rate: f64,
    /// Steering wheel movements per minute
    pub steering_freq: f64,
    /// Minutes behind the wheel
    pub drive_time: f64,
    /// Cabin temperature in degrees Celsius
    pub temp: f64,
    /// Music volume, 0 to 100
    pub music_volume: f64,
}

impl Reading {
    pub fn new(blink_rate: f64, steering_freq: f64, drive_time: f64, temp: f64, music_volume: f64) -> Self {
        Self {
            blink_rate,
            steering_freq,
            drive_time,
            temp,
            music_volume,
        }
    }
}

/// The two crisp outputs of the fatigue model.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Assessment {
    pub alert_level: f64,
    pub break_suggestion: f64,
}

impl Assessment {
    pub fn suggests_break(&self, threshold: f64) -> bool {
        self.break_suggestion > threshold
    }
}

/// The assembled fatigue model, with typed handles to each of its variables.
pub struct FatigueModel {
    model: Model<FatigueTerm>,
    engine: InferenceEngine,
    pub blink_rate: Variable<BlinkRate>,
    pub steering_freq: Variable<SteeringFreq>,
    pub drive_time: Variable<DriveTime>,
    pub temp: Variable<Temp>,
    pub music_volume: Variable<MusicVolume>,
    pub alert_level: Variable<AlertLevel>,
    pub break_suggestion: Variable<BreakSuggestion>,
}

/// Assembles the fatigue model. Call once and share the result.
pub fn build_model() -> Result<FatigueModel, ModelError> {
    let mut vars = Variables::new();

    let blink_rate = vars.input(
        "blink_rate",
        0.1..=1.0,
        0.1,
        Terms::new()
            .with(BlinkRate::Low, [0.1, 0.1, 0.4])
            .with(BlinkRate::Normal, [0.3, 0.5, 0.7])
            .with(BlinkRate::High, [0.6, 1.0, 1.0]),
    );
    let steering_freq = vars.input(
        "steering_freq",
        0. ..=50.,
        1.,
        Terms::new()
            .with(SteeringFreq::Low, [0., 0., 20.])
            .with(SteeringFreq::Normal, [15., 25., 35.])
            .with(SteeringFreq::High, [30., 50., 50.]),
    );
    let drive_time = vars.input(
        "drive_time",
        0. ..=300.,
        10.,
        Terms::new()
            .with(DriveTime::Short, [0., 0., 120.])
            .with(DriveTime::Medium, [100., 150., 220.])
            .with(DriveTime::Long, [200., 300., 300.]),
    );
    let temp = vars.input(
        "temp",
        10. ..=40.,
        1.,
        Terms::new()
            .with(Temp::Cold, [10., 10., 20.])
            .with(Temp::Comfortable, [18., 23., 28.])
            .with(Temp::Hot, [26., 40., 40.]),
    );
    let music_volume = vars.input(
        "music_volume",
        0. ..=100.,
        5.,
        Terms::new()
            .with(MusicVolume::Low, [0., 0., 30.])
            .with(MusicVolume::Medium, [25., 50., 75.])
            .with(MusicVolume::High, [70., 100., 100.]),
    );
    let alert_level = vars.output(
        "alert_level",
        0. ..=100.,
        1.,
        Terms::new()
            .with(AlertLevel::Low, [0., 0., 40.])
            .with(AlertLevel::Medium, [30., 50., 70.])
            .with(AlertLevel::High, [60., 100., 100.]),
    );
    let break_suggestion = vars.output(
        "break_suggestion",
        0. ..=1.,
        1.,
        Terms::new()
            .with(BreakSuggestion::No, [0., 0., 1.])
            .with(BreakSuggestion::Yes, [0., 1., 1.]),
    );

    let mut rules = Rules::with_capacity(18);

    // Sensor combinations, each concluding on both outputs
    let combinations: [(Expr<FatigueTerm>, AlertLevel, BreakSuggestion); 6] = [
        (
            blink_rate
                .is(BlinkRate::High)
                .and2(steering_freq.is(SteeringFreq::Low), drive_time.is(DriveTime::Long)),
            AlertLevel::High,
            BreakSuggestion::Yes,
        ),
        (
            blink_rate
                .is(BlinkRate::Normal)
                .and2(steering_freq.is(SteeringFreq::Normal), drive_time.is(DriveTime::Medium)),
            AlertLevel::Medium,
            BreakSuggestion::No,
        ),
        (
            blink_rate
                .is(BlinkRate::Low)
                .and2(steering_freq.is(SteeringFreq::High), drive_time.is(DriveTime::Short)),
            AlertLevel::Low,
            BreakSuggestion::No,
        ),
        (
            temp.is(Temp::Hot).and(drive_time.is(DriveTime::Long)),
            AlertLevel::High,
            BreakSuggestion::Yes,
        ),
        (
            music_volume.is(MusicVolume::Low).and(blink_rate.is(BlinkRate::High)),
            AlertLevel::High,
            BreakSuggestion::Yes,
        ),
        (
            music_volume.is(MusicVolume::High).and(blink_rate.is(BlinkRate::Low)),
            AlertLevel::Low,
            BreakSuggestion::No,
        ),
    ];

    for (premise, alert, suggestion) in combinations {
        rules.add(premise.clone(), alert_level.is(alert));
        rules.add(premise, break_suggestion.is(suggestion));
    }

    // Drive time alone
    rules.add(drive_time.is(DriveTime::Short), alert_level.is(AlertLevel::Low));
    rules.add(drive_time.is(DriveTime::Medium), alert_level.is(AlertLevel::Medium));
    rules.add(drive_time.is(DriveTime::Long), alert_level.is(AlertLevel::High));

    rules.add(drive_time.is(DriveTime::Short), break_suggestion.is(BreakSuggestion::No));
    rules.add(drive_time.is(DriveTime::Medium), break_suggestion.is(BreakSuggestion::No));
    rules.add(drive_time.is(DriveTime::Long), break_suggestion.is(BreakSuggestion::Yes));

    Ok(FatigueModel {
        model: Model::new(vars, rules)?,
        engine: InferenceEngine::mamdani(),
        blink_rate,
        steering_freq,
        drive_time,
        temp,
        music_volume,
        alert_level,
        break_suggestion,
    })
}

impl FatigueModel {
    pub fn model(&self) -> &Model<FatigueTerm> {
        &self.model
    }

    pub fn inputs(&self, reading: &Reading) -> Inputs {
        Inputs::with_capacity(5)
            .with(self.blink_rate, reading.blink_rate)
            .with(self.steering_freq, reading.steering_freq)
            .with(self.drive_time, reading.drive_time)
            .with(self.temp, reading.temp)
            .with(self.music_volume, reading.music_volume)
    }

    /// Full evaluation, including firing strengths and aggregated sets.
    pub fn evaluate(&self, reading: &Reading) -> Result<Outputs, EvalError> {
        self.engine.eval(&self.model, &self.inputs(reading))
    }

    pub fn assess(&self, reading: &Reading) -> Result<Assessment, EvalError> {
        Ok(self.assessment(&self.evaluate(reading)?))
    }

    /// The crisp outputs of an evaluation already run against this model.
    pub fn assessment(&self, outputs: &Outputs) -> Assessment {
        Assessment {
            alert_level: outputs
                .get_inferred_membership(self.alert_level)
                .unwrap_or_else(|| self.midpoint(self.alert_level.key())),
            break_suggestion: outputs
                .get_inferred_membership(self.break_suggestion)
                .unwrap_or_else(|| self.midpoint(self.break_suggestion.key())),
        }
    }

    fn midpoint(&self, key: VariableKey) -> f64 {
        self.model.variable(key).map_or(0., |var| var.midpoint())
    }
}

#[test]
fn test_model_shape() {
    let fatigue = build_model().unwrap();
    let model = fatigue.model();

    assert_eq!(model.inputs().count(), 5);
    assert_eq!(model.outputs().count(), 2);
    assert_eq!(model.rules().len(), 18);
    assert_eq!(
        model.variable(fatigue.blink_rate.key()).map(|var| var.universe().len()),
        Some(10)
    );
    assert_eq!(
        model.variable(fatigue.break_suggestion.key()).map(|var| var.universe().to_vec()),
        Some(vec![0., 1.])
    );
}

#[test]
fn test_rule_listing() {
    let fatigue = build_model().unwrap();
    let rules = fatigue.model().describe_rules();

    assert_eq!(rules.len(), 18);
    assert_eq!(rules[0], "IF blink_rate[high] AND steering_freq[low] AND drive_time[long] THEN alert_level[high]");
    assert_eq!(rules[7], "IF temp[hot] AND drive_time[long] THEN break_suggestion[yes]");
    assert_eq!(rules[17], "IF drive_time[long] THEN break_suggestion[yes]");
}

#[test]
fn test_membership_curves() {
    let fatigue = build_model().unwrap();
    let curves = fatigue.model().curves(fatigue.temp.key()).unwrap();
    let names: Vec<_> = curves.terms.iter().map(|curve| curve.term.as_str()).collect();

    assert_eq!(curves.variable, "temp");
    assert_eq!(curves.universe.len(), 31);
    assert_eq!(names, vec!["cold", "comfortable", "hot"]);
    assert_eq!(curves.terms[1].membership[13], 1.);
    assert_eq!(curves.terms[0].membership[0], 1.);
    assert_eq!(curves.terms[2].membership[30], 1.);
}

#[test]
fn test_fuzzification_stays_in_unit_interval() {
    let fatigue = build_model().unwrap();
    let model = fatigue.model();

    for (_, var) in model.inputs() {
        let range = var.range();
        let (min, max) = (*range.start(), *range.end());

        for i in -10..=110 {
            let value = min + (max - min) * i as f64 / 100.;

            for (_, degree) in var.fuzzify(value) {
                assert!((0. ..=1.).contains(&degree), "{} at {value}: {degree}", var.name());
            }
        }
    }
}

#[test]
fn test_exhausted_driver() {
    use approx::assert_abs_diff_eq;

    let fatigue = build_model().unwrap();
    let assessment = fatigue.assess(&Reading::new(1.0, 5., 300., 38., 10.)).unwrap();

    assert!(assessment.alert_level > 60., "{assessment:?}");
    assert!(assessment.suggests_break(DEFAULT_BREAK_THRESHOLD), "{assessment:?}");
    // Only the high term is active, fully: the centroid of (60, 100, 100) sampled at integers
    assert_abs_diff_eq!(assessment.alert_level, 87., epsilon = 1e-9);
    assert_abs_diff_eq!(assessment.break_suggestion, 1., epsilon = 1e-12);
}

#[test]
fn test_rested_driver() {
    use approx::assert_abs_diff_eq;

    let fatigue = build_model().unwrap();
    let assessment = fatigue.assess(&Reading::new(0.5, 25., 150., 23., 50.)).unwrap();

    assert!((30. ..=70.).contains(&assessment.alert_level), "{assessment:?}");
    assert!(!assessment.suggests_break(DEFAULT_BREAK_THRESHOLD), "{assessment:?}");
    assert_abs_diff_eq!(assessment.alert_level, 50., epsilon = 1e-9);
    assert_eq!(assessment.break_suggestion, 0.);
}

#[test]
fn test_fresh_driver() {
    use approx::assert_abs_diff_eq;

    let fatigue = build_model().unwrap();
    let assessment = fatigue.assess(&Reading::new(0.1, 50., 0., 10., 100.)).unwrap();

    assert!(assessment.alert_level < 40., "{assessment:?}");
    assert!(!assessment.suggests_break(DEFAULT_BREAK_THRESHOLD), "{assessment:?}");
    assert_abs_diff_eq!(assessment.alert_level, 13., epsilon = 1e-9);
}

#[test]
fn test_medium_drive_time_keeps_a_floor() {
    let fatigue = build_model().unwrap();
    let medium_rule = 13;

    assert_eq!(
        fatigue.model().describe_rule(medium_rule).as_deref(),
        Some("IF drive_time[medium] THEN alert_level[medium]")
    );

    for blink_rate in [0.1, 0.35, 0.5, 0.65, 1.0] {
        for steering_freq in [0., 17., 25., 33., 50.] {
            for temp in [10., 19., 23., 27., 40.] {
                for music_volume in [0., 27., 50., 72., 100.] {
                    let reading = Reading::new(blink_rate, steering_freq, 150., temp, music_volume);
                    let outputs = fatigue.evaluate(&reading).unwrap();
                    let aggregated = outputs.aggregated(fatigue.alert_level).unwrap();

                    assert_eq!(outputs.firing_strength(medium_rule), Some(1.));
                    // alert_level is sampled at integers; index 50 is the medium peak
                    assert_eq!(aggregated[50], 1.);
                    assert!(!outputs.is_fallback(fatigue.alert_level));
                    assert!(!outputs.is_fallback(fatigue.break_suggestion));
                }
            }
        }
    }
}

#[test]
fn test_out_of_range_reading_is_clamped() {
    let fatigue = build_model().unwrap();
    let wild = fatigue.assess(&Reading::new(0.5, 999., 150., 23., 50.)).unwrap();
    let bounded = fatigue.assess(&Reading::new(0.5, 50., 150., 23., 50.)).unwrap();

    assert_eq!(wild, bounded);
    assert_eq!(
        fatigue
            .evaluate(&Reading::new(0.5, 999., 150., 23., 50.))
            .unwrap()
            .clamped_input(fatigue.steering_freq),
        Some(50.)
    );
}

#[test]
fn test_non_finite_reading_is_rejected() {
    let fatigue = build_model().unwrap();
    let reading = Reading::new(0.5, 25., 150., 23., 50.);
    let before = fatigue.assess(&reading).unwrap();

    assert!(matches!(
        fatigue.assess(&Reading::new(0.5, 25., f64::NAN, 23., 50.)),
        Err(EvalError::NonFinite { variable, .. }) if variable == "drive_time"
    ));
    assert_eq!(fatigue.assess(&reading).unwrap(), before);
}

#[test]
fn test_evaluation_is_idempotent() {
    let fatigue = build_model().unwrap();
    let reading = Reading::new(0.42, 18.5, 205., 27.3, 72.);
    let first = fatigue.assess(&reading).unwrap();
    let second = fatigue.assess(&reading).unwrap();

    assert_eq!(first.alert_level.to_bits(), second.alert_level.to_bits());
    assert_eq!(first.break_suggestion.to_bits(), second.break_suggestion.to_bits());
}

#[test]
fn test_shared_across_threads() {
    let fatigue = &build_model().unwrap();
    let readings = [
        Reading::new(1.0, 5., 300., 38., 10.),
        Reading::new(0.5, 25., 150., 23., 50.),
        Reading::new(0.1, 50., 0., 10., 100.),
    ];
    let expected: Vec<_> = readings.iter().map(|r| fatigue.assess(r).unwrap()).collect();

    std::thread::scope(|scope| {
        let handles: Vec<_> = readings
            .iter()
            .map(|reading| scope.spawn(move || fatigue.assess(reading).unwrap()))
            .collect();

        for (handle, expected) in handles.into_iter().zip(&expected) {
            assert_eq!(handle.join().unwrap(), *expected);
        }
    });
}

#[test]
fn test_assessment_from_one_evaluation() {
    let fatigue = build_model().unwrap();
    let reading = Reading::new(0.9, 10., 240., 30., 80.);
    let inputs = fatigue.inputs(&reading);

    assert_eq!(inputs.get(fatigue.drive_time), Some(240.));
    assert_eq!(inputs.get(fatigue.alert_level), None);

    let outputs = fatigue.evaluate(&reading).unwrap();

    assert_eq!(fatigue.assessment(&outputs), fatigue.assess(&reading).unwrap());
    assert_eq!(
        Some(fatigue.assessment(&outputs).alert_level),
        outputs.get_inferred_membership(fatigue.alert_level)
    );
}
