//! A Mamdani fuzzy inference engine and the driver fatigue advisory built on it.
//!
//! ```
//! use fuzzy_fatigue::{build_model, Reading, DEFAULT_BREAK_THRESHOLD};
//!
//! let fatigue = build_model().unwrap();
//! let assessment = fatigue.assess(&Reading::new(1.0, 5., 300., 38., 10.)).unwrap();
//!
//! assert!(assessment.alert_level > 60.);
//! assert!(assessment.suggests_break(DEFAULT_BREAK_THRESHOLD));
//! ```

mod dsl;
mod error;
mod inference;
mod inputs;
mod linspace;
mod math;
mod model;
mod ops;
mod outputs;
mod rules;
mod terms;
mod variable;

pub mod config;
pub mod fatigue;

pub use dsl::Expr;
pub use error::{EvalError, ModelError};
pub use fatigue::{build_model, Assessment, FatigueModel, FatigueTerm, Reading, DEFAULT_BREAK_THRESHOLD};
pub use inference::InferenceEngine;
pub use inputs::Inputs;
pub use model::{MembershipCurves, Model, TermCurve};
pub use ops::{AndOp, DefuzzificationOp, ImplicationOp, OrOp};
pub use outputs::{Defuzzified, Outputs};
pub use rules::{Rule, Rules};
pub use terms::{Key, Term, Terms, Triangle};
pub use variable::{Fuzzified, LinguisticVariable, Role, Variable, VariableKey, Variables};
