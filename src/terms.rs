pub use fixed_map::Key as Term;
pub use fixed_map::Key;
use fixed_map::Map as FixedMap;

use crate::math::trimf;

/// Breakpoints `(a, b, c)` of a triangular membership function.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl Triangle {
    pub const fn new(a: f64, b: f64, c: f64) -> Self {
        Self { a, b, c }
    }

    /// Degree of membership of `x`, in `[0, 1]` for every real `x`.
    #[inline]
    pub fn degree(&self, x: f64) -> f64 {
        trimf(x, self.a, self.b, self.c)
    }

    pub(crate) fn is_well_formed(&self) -> bool {
        self.a.is_finite() && self.b.is_finite() && self.c.is_finite() && self.a <= self.b && self.b <= self.c
    }

    pub(crate) fn fits(&self, min: f64, max: f64) -> bool {
        min <= self.a && self.c <= max
    }
}

impl From<[f64; 3]> for Triangle {
    fn from([a, b, c]: [f64; 3]) -> Self {
        Self::new(a, b, c)
    }
}

/// The term set of one linguistic variable, keyed by that variable's term enum.
pub struct Terms<K: Term>(pub(crate) FixedMap<K, Triangle>);

impl<K: Term> Default for Terms<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Term> Terms<K> {
    pub fn new() -> Self {
        Self(FixedMap::new())
    }

    pub fn insert(&mut self, key: K, triangle: impl Into<Triangle>) {
        self.0.insert(key, triangle.into());
    }

    pub fn with(mut self, key: K, triangle: impl Into<Triangle>) -> Self {
        self.insert(key, triangle);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[test]
fn test_triangle_properties() {
    let triangles = [
        Triangle::new(0.3, 0.5, 0.7),
        Triangle::new(15., 25., 35.),
        Triangle::new(100., 150., 220.),
        Triangle::new(18., 23., 28.),
    ];

    for tri in triangles {
        assert_eq!(tri.degree(tri.a), 0.);
        assert_eq!(tri.degree(tri.b), 1.);
        assert_eq!(tri.degree(tri.c), 0.);

        let mut last = 0.;
        for i in 0..=100 {
            let x = tri.a + (tri.b - tri.a) * i as f64 / 100.;
            let y = tri.degree(x);

            assert!(y >= last);
            assert!((0. ..=1.).contains(&y));
            last = y;
        }

        let mut last = 1.;
        for i in 0..=100 {
            let x = tri.b + (tri.c - tri.b) * i as f64 / 100.;
            let y = tri.degree(x);

            assert!(y <= last);
            assert!((0. ..=1.).contains(&y));
            last = y;
        }
    }
}

#[test]
fn test_triangle_validation() {
    assert!(Triangle::new(0., 0., 20.).is_well_formed());
    assert!(Triangle::new(1., 1., 1.).is_well_formed());
    assert!(!Triangle::new(0., 30., 20.).is_well_formed());
    assert!(!Triangle::new(0., f64::NAN, 20.).is_well_formed());

    assert!(Triangle::new(0., 0., 20.).fits(0., 50.));
    assert!(!Triangle::new(-1., 0., 20.).fits(0., 50.));
    assert!(!Triangle::new(30., 50., 60.).fits(0., 50.));
}

#[test]
fn test_terms_map() {
    #[derive(Clone, Copy, Debug, Key, PartialEq, Eq)]
    enum Level {
        Low,
        High,
    }

    let terms = Terms::new().with(Level::Low, [0., 0., 1.]).with(Level::High, [0., 1., 1.]);

    assert_eq!(terms.len(), 2);
    assert!(!terms.is_empty());
    assert_eq!(terms.0.get(Level::High), Some(&Triangle::new(0., 1., 1.)));
}
