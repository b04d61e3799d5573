use num::Float;

use crate::math::{centroid, maxima};

/// And operator method for combining the propositions of a fuzzy rule premise.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AndOp {
    #[default]
    Min,
    Prod,
    BoundedProd,
}

impl AndOp {
    pub fn call<F: Float>(self, u: F, v: F) -> F {
        match self {
            Self::Min => F::min(u, v),
            Self::Prod => u * v,
            Self::BoundedProd => F::max(F::zero(), u + v - F::one()),
        }
    }
}

/// Or operator method for combining the propositions of a fuzzy rule premise.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OrOp {
    #[default]
    Max,
    ProbOr,
    BoundedSum,
}

impl OrOp {
    pub fn call<F: Float>(self, u: F, v: F) -> F {
        match self {
            Self::Max => F::max(u, v),
            Self::ProbOr => u + v - u * v,
            Self::BoundedSum => F::min(F::one(), u + v),
        }
    }
}

/// Implication operator: shapes a consequence term's membership by the strength of
/// the rule that activated it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ImplicationOp {
    /// Mamdani, clips the term at the rule strength
    #[default]
    Min,
    /// Larsen, scales the term by the rule strength
    Prod,
}

impl ImplicationOp {
    pub fn call<F: Float>(self, strength: F, membership: F) -> F {
        match self {
            Self::Min => F::min(strength, membership),
            Self::Prod => strength * membership,
        }
    }
}

/// Method for defuzzificating an aggregated membership function.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DefuzzificationOp {
    /// Center of gravity over the sampled universe
    #[default]
    Centroid,
    /// Mean of the values for which the membership function is maximum
    MeanOfMaximum,
    /// Smallest value for which the membership function is maximum
    SmallestOfMaximum,
    /// Largest value for which the membership function is maximum
    LargestOfMaximum,
}

impl DefuzzificationOp {
    /// `None` if the membership function is zero everywhere.
    pub fn call<F: Float>(self, universe: &[F], membership: &[F]) -> Option<F> {
        debug_assert_eq!(universe.len(), membership.len());

        match self {
            Self::Centroid => centroid(universe, membership),
            Self::MeanOfMaximum => {
                let (len, sum) = maxima(universe, membership)
                    .fold((0usize, F::zero()), |(len, sum), x| (len + 1, sum + x));

                if len == 0 {
                    None
                } else {
                    F::from(len).map(|len| sum / len)
                }
            },
            Self::SmallestOfMaximum => maxima(universe, membership).reduce(F::min),
            Self::LargestOfMaximum => maxima(universe, membership).reduce(F::max),
        }
    }
}

#[test]
fn test_and_or_ops() {
    assert_eq!(AndOp::Min.call(0.3, 0.8), 0.3);
    assert_eq!(AndOp::Prod.call(0.5, 0.5), 0.25);
    assert_eq!(AndOp::BoundedProd.call(0.25, 0.5), 0.);
    assert_eq!(AndOp::BoundedProd.call(0.75, 0.5), 0.25);

    assert_eq!(OrOp::Max.call(0.3, 0.8), 0.8);
    assert_eq!(OrOp::ProbOr.call(0.5, 0.5), 0.75);
    assert_eq!(OrOp::BoundedSum.call(0.75, 0.5), 1.);
}

#[test]
fn test_implication_ops() {
    assert_eq!(ImplicationOp::Min.call(0.5, 0.25), 0.25);
    assert_eq!(ImplicationOp::Min.call(0.5, 1.), 0.5);
    assert_eq!(ImplicationOp::Prod.call(0.5, 1.), 0.5);
    assert_eq!(ImplicationOp::Prod.call(0.5, 0.5), 0.25);
}

#[test]
fn test_defuzzification_ops() {
    let universe = [0., 1., 2., 3., 4.];
    let membership = [0., 0.5, 0.5, 0.25, 0.];

    assert_eq!(DefuzzificationOp::MeanOfMaximum.call(&universe, &membership), Some(1.5));
    assert_eq!(DefuzzificationOp::SmallestOfMaximum.call(&universe, &membership), Some(1.));
    assert_eq!(DefuzzificationOp::LargestOfMaximum.call(&universe, &membership), Some(2.));
    assert_eq!(DefuzzificationOp::Centroid.call(&universe, &membership), Some(2.25 / 1.25));

    for op in [
        DefuzzificationOp::Centroid,
        DefuzzificationOp::MeanOfMaximum,
        DefuzzificationOp::SmallestOfMaximum,
        DefuzzificationOp::LargestOfMaximum,
    ] {
        assert_eq!(op.call(&universe, &[0.; 5]), None);
    }
}
