use num::Float;

/// Triangular membership, similar to skfuzzy.trimf but evaluated at a single point.
///
/// A shoulder (`a == b` or `b == c`) peaks at the shared breakpoint. Anything outside
/// `[a, c]`, and NaN, has no membership.
pub(crate) fn trimf<F: Float>(x: F, a: F, b: F, c: F) -> F {
    if x.is_nan() || x < a || x > c {
        return F::zero();
    }

    let y = if x < b {
        (x - a) / (b - a)
    } else if x > b {
        (c - x) / (c - b)
    } else {
        F::one()
    };

    y.max(F::zero()).min(F::one())
}

/// Discrete center of gravity: `sum(x * mu) / sum(mu)` over the samples.
///
/// Returns `None` when the set carries no mass at all.
pub(crate) fn centroid<F: Float>(universe: &[F], membership: &[F]) -> Option<F> {
    let (num, den) = universe
        .iter()
        .zip(membership)
        .fold((F::zero(), F::zero()), |(num, den), (&x, &mu)| (num + x * mu, den + mu));

    if den == F::zero() {
        None
    } else {
        Some(num / den)
    }
}

/// Universe values at which `membership` reaches its (non-zero) maximum.
pub(crate) fn maxima<'u, F: Float>(universe: &'u [F], membership: &'u [F]) -> impl Iterator<Item = F> + 'u {
    let peak = membership.iter().copied().fold(F::zero(), F::max);

    universe
        .iter()
        .copied()
        .zip(membership.iter().copied())
        .filter_map(move |(x, mu)| if peak > F::zero() && mu == peak { Some(x) } else { None })
}

#[test]
fn test_trimf() {
    assert_eq!(trimf(0., 0., 5., 10.), 0.);
    assert_eq!(trimf(2.5, 0., 5., 10.), 0.5);
    assert_eq!(trimf(5., 0., 5., 10.), 1.);
    assert_eq!(trimf(7.5, 0., 5., 10.), 0.5);
    assert_eq!(trimf(10., 0., 5., 10.), 0.);
    assert_eq!(trimf(-1., 0., 5., 10.), 0.);
    assert_eq!(trimf(11., 0., 5., 10.), 0.);
    assert_eq!(trimf(f64::NAN, 0., 5., 10.), 0.);
}

#[test]
fn test_trimf_shoulders() {
    // Left shoulder
    assert_eq!(trimf(0., 0., 0., 20.), 1.);
    assert_eq!(trimf(5., 0., 0., 20.), 0.75);
    assert_eq!(trimf(20., 0., 0., 20.), 0.);
    // Right shoulder
    assert_eq!(trimf(50., 30., 50., 50.), 1.);
    assert_eq!(trimf(40., 30., 50., 50.), 0.5);
    assert_eq!(trimf(30., 30., 50., 50.), 0.);
    // Spike
    assert_eq!(trimf(1., 1., 1., 1.), 1.);
    assert_eq!(trimf(1.5, 1., 1., 1.), 0.);
}

#[test]
fn test_centroid() {
    let universe = [0., 1., 2., 3., 4.];

    assert_eq!(centroid(&universe, &[0., 0.5, 1., 0.5, 0.]), Some(2.));
    assert_eq!(centroid(&universe, &[0., 0., 0., 0., 1.]), Some(4.));
    assert_eq!(centroid(&universe, &[0.; 5]), None);
    assert_eq!(centroid(&[0., 1.], &[0.25, 0.75]), Some(0.75));
}

#[test]
fn test_maxima() {
    let universe = [0., 1., 2., 3., 4.];

    assert_eq!(maxima(&universe, &[0., 0.5, 0.5, 0.2, 0.]).collect::<Vec<_>>(), vec![1., 2.]);
    assert_eq!(maxima(&universe, &[0.; 5]).count(), 0);
}
