/// Upper bound on the samples a single universe may hold.
pub(crate) const MAX_SAMPLES: usize = 1_000_000;

/// Evenly spaced samples over a closed interval, both ends included.
pub(crate) struct Linspace {
    start: f64,
    end: f64,
    step: f64,
    index: usize,
    len: usize,
}

impl Linspace {
    pub(crate) fn new(min: f64, max: f64, n: usize) -> Self {
        let step = if n > 1 { (max - min) / (n - 1) as f64 } else { 0. };

        Linspace {
            start: min,
            end: max,
            step,
            index: 0,
            len: n,
        }
    }

    /// Sample count for a universe walked at `step`, the way `numpy.arange` would
    /// count it. The epsilon absorbs `(1.0 - 0.1) / 0.1 == 8.999999999999998`.
    ///
    /// `None` when the walk is not finite or would exceed `MAX_SAMPLES`.
    pub(crate) fn count(min: f64, max: f64, step: f64) -> Option<usize> {
        let gaps = ((max - min) / step + 1e-9).floor();

        if gaps >= 0. && gaps < MAX_SAMPLES as f64 {
            Some(gaps as usize + 1)
        } else {
            None
        }
    }
}

impl Iterator for Linspace {
    type Item = f64;

    #[inline]
    fn next(&mut self) -> Option<f64> {
        if self.index >= self.len {
            return None;
        }

        let i = self.index;
        self.index += 1;

        // Pin the last sample so accumulated rounding never leaves the upper bound unsampled
        if self.len > 1 && i == self.len - 1 {
            Some(self.end)
        } else {
            Some(self.start + self.step * i as f64)
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.len - self.index;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Linspace {}

#[test]
fn test_linspace_includes_bounds() {
    let samples: Vec<_> = Linspace::new(0., 100., 101).collect();

    assert_eq!(samples.len(), 101);
    assert_eq!(samples[0], 0.);
    assert_eq!(samples[50], 50.);
    assert_eq!(samples[100], 100.);
}

#[test]
fn test_linspace_count_survives_rounding() {
    assert_eq!(Linspace::count(0.1, 1.0, 0.1), Some(10));
    assert_eq!(Linspace::count(0., 300., 10.), Some(31));
    assert_eq!(Linspace::count(0., 1., 1.), Some(2));
    assert_eq!(Linspace::count(0., 10., 3.), Some(4));

    let blink: Vec<_> = Linspace::new(0.1, 1.0, 10).collect();

    assert_eq!(blink.first(), Some(&0.1));
    assert_eq!(blink.last(), Some(&1.0));
}

#[test]
fn test_linspace_single_sample() {
    let mut iter = Linspace::new(3., 3., 1);

    assert_eq!(iter.len(), 1);
    assert_eq!(iter.next(), Some(3.));
    assert_eq!(iter.next(), None);
}

#[test]
fn test_linspace_count_rejects_huge_walks() {
    assert_eq!(Linspace::count(0., 1e300, 1e-300), None);
    assert_eq!(Linspace::count(0., 1e6, 1.), None);
    assert_eq!(Linspace::count(0., 1e6 - 1., 1.), Some(MAX_SAMPLES));
    assert_eq!(Linspace::count(0., f64::INFINITY, 1.), None);
    assert_eq!(Linspace::count(0., 1., f64::NAN), None);
}
