use thiserror::Error;

/// Reasons a set of variables and rules cannot be assembled into a model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("variable `{0}` is declared more than once")]
    DuplicateVariable(String),

    #[error("variable `{name}` has an unusable universe [{min}, {max}] sampled every {step}")]
    InvalidUniverse { name: String, min: f64, max: f64, step: f64 },

    #[error("variable `{0}` declares no terms")]
    NoTerms(String),

    #[error("term `{variable}[{term}]` has breakpoints ({a}, {b}, {c}), expected finite a <= b <= c")]
    UnorderedBreakpoints {
        variable: String,
        term: String,
        a: f64,
        b: f64,
        c: f64,
    },

    #[error("term `{variable}[{term}]` reaches outside the universe [{min}, {max}]")]
    TermOutsideUniverse {
        variable: String,
        term: String,
        min: f64,
        max: f64,
    },

    #[error("rule {rule} refers to a variable that was not declared in this model")]
    UnknownVariable { rule: usize },

    #[error("rule {rule} refers to `{variable}[{term}]`, which is not declared")]
    UnknownTerm { rule: usize, variable: String, term: String },

    #[error("rule {rule} has the output `{variable}` in its premise")]
    OutputInPremise { rule: usize, variable: String },

    #[error("rule {rule} concludes on the input `{variable}`")]
    InputInConsequence { rule: usize, variable: String },

    #[error("rule {rule} has an empty AND/OR group")]
    EmptyGroup { rule: usize },

    #[error("rule {rule} has no consequence")]
    EmptyConsequence { rule: usize },

    #[error("rule {rule} has a consequence that is not a conjunction of propositions")]
    DisjunctiveConsequence { rule: usize },

    #[error("rule {rule} has a certainty factor of {cf}, expected a value in [0, 1]")]
    InvalidCertainty { rule: usize, cf: f64 },
}

/// Reasons a single evaluation is refused. The model is unaffected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("input `{variable}` is not a finite number: {value}")]
    NonFinite { variable: String, value: f64 },

    #[error("no value was given for input `{0}`")]
    MissingInput(String),

    #[error("`{0}` is an output and cannot be given a value")]
    NotAnInput(String),

    #[error("a value was given for a variable that is not part of this model")]
    UnknownVariable,
}
