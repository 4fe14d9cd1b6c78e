use std::ops::Range;

use super::binary_search::{
    lower_bound,
    upper_bound,
};

/// A contiguous block of indices `[min, max_exclusive)` in a sorted array.
///
/// Empty ranges are always stored as `[0, 0)` so two empty ranges compare
/// equal no matter how they were built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct IndexRange {
    min: usize,
    max_exclusive: usize,
}

impl IndexRange {
    pub fn empty() -> Self {
        IndexRange {
            min: 0,
            max_exclusive: 0,
        }
    }

    pub fn of_inclusive(
        min: usize,
        max_inclusive: usize,
    ) -> Self {
        if max_inclusive < min {
            return Self::empty();
        }
        IndexRange {
            min,
            max_exclusive: max_inclusive + 1,
        }
    }

    pub fn of_exclusive(
        min: usize,
        max_exclusive: usize,
    ) -> Self {
        if max_exclusive <= min {
            return Self::empty();
        }
        IndexRange { min, max_exclusive }
    }

    pub fn is_empty(&self) -> bool {
        self.max_exclusive == self.min
    }

    pub fn len(&self) -> usize {
        self.max_exclusive - self.min
    }

    pub fn min(&self) -> Option<usize> {
        if self.is_empty() {
            None
        } else {
            Some(self.min)
        }
    }

    pub fn max_inclusive(&self) -> Option<usize> {
        if self.is_empty() {
            None
        } else {
            Some(self.max_exclusive - 1)
        }
    }

    pub fn max_exclusive(&self) -> usize {
        self.max_exclusive
    }

    pub fn contains(
        &self,
        index: usize,
    ) -> bool {
        index >= self.min && index < self.max_exclusive
    }

    pub fn iter(&self) -> Range<usize> {
        self.min..self.max_exclusive
    }

    /// Sub-slice of `data` covered by this range.
    ///
    /// Panics if the range was computed over a longer array than `data`.
    pub fn slice<'a, T>(
        &self,
        data: &'a [T],
    ) -> &'a [T] {
        &data[self.min..self.max_exclusive]
    }
}

/// Indices of the values `v` within `[from, to_exclusive)` such that `lower <= v <= upper`.
///
/// Both boundaries are located with their own binary search.
pub fn index_range_by_index<F>(
    from: usize,
    to_exclusive: usize,
    lower: f64,
    upper: f64,
    value_at: F,
) -> IndexRange
where
    F: Fn(usize) -> f64,
{
    // Also catches NaN bounds
    if !(lower <= upper) || from >= to_exclusive {
        return IndexRange::empty();
    }
    let first = lower_bound(from, to_exclusive, lower, &value_at);
    if first == to_exclusive {
        return IndexRange::empty();
    }
    let end = upper_bound(first, to_exclusive, upper, &value_at);
    IndexRange::of_exclusive(first, end)
}

/// Indices of `data` whose values lie in the closed interval `[lower, upper]`.
///
/// Usage:
/// ```rust
/// use ionstream::search::index_range;
/// let data = [1.0, 1.5, 1.5, 2.0, 2.5, 3.0, 3.5];
/// let range = index_range(&data, 1.5, 3.0);
/// assert_eq!(range.min(), Some(1));
/// assert_eq!(range.max_inclusive(), Some(5));
/// assert_eq!(range.slice(&data), &[1.5, 1.5, 2.0, 2.5, 3.0]);
/// assert!(index_range(&data, 3.1, 3.4).is_empty());
/// assert!(index_range(&data, 3.0, 1.0).is_empty());
/// ```
pub fn index_range(
    data: &[f64],
    lower: f64,
    upper: f64,
) -> IndexRange {
    index_range_by_index(0, data.len(), lower, upper, |i| data[i])
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{
        Rng,
        SeedableRng,
    };

    use super::*;
    use crate::search::binary_search::{
        binary_search,
        DefaultTo,
    };

    #[test]
    fn test_empty_and_single() {
        let empty: [f64; 0] = [];
        assert!(index_range(&empty, 0.0, 10.0).is_empty());
        assert_eq!(index_range(&empty, 0.0, 10.0).len(), 0);

        let single = [5.0];
        assert_eq!(index_range(&single, 5.0, 5.0), IndexRange::of_inclusive(0, 0));
        assert_eq!(index_range(&single, 0.0, 10.0).len(), 1);
        assert!(index_range(&single, 0.0, 4.99).is_empty());
        assert!(index_range(&single, 5.01, 10.0).is_empty());
    }

    #[test]
    fn test_inverted_bounds_are_empty() {
        let data = [1.0, 2.0, 3.0];
        assert!(index_range(&data, 2.5, 1.5).is_empty());
        assert!(index_range(&data, f64::NAN, 1.5).is_empty());
    }

    #[test]
    fn test_empty_ranges_compare_equal() {
        assert_eq!(IndexRange::of_inclusive(4, 2), IndexRange::empty());
        assert_eq!(IndexRange::of_exclusive(3, 3), IndexRange::empty());
        assert_eq!(IndexRange::empty().min(), None);
        assert_eq!(IndexRange::empty().max_inclusive(), None);
        assert_eq!(IndexRange::empty().iter().count(), 0);
    }

    #[test]
    fn test_range_accessors() {
        let range = IndexRange::of_inclusive(2, 4);
        assert_eq!(range.len(), 3);
        assert_eq!(range.max_exclusive(), 5);
        assert!(range.contains(2));
        assert!(range.contains(4));
        assert!(!range.contains(5));
        assert_eq!(range.iter().collect::<Vec<_>>(), vec![2, 3, 4]);
    }

    fn random_sorted(
        rng: &mut StdRng,
        len: usize,
    ) -> Vec<f64> {
        // Low resolution values so duplicates show up often.
        let mut out: Vec<f64> = (0..len)
            .map(|_| (rng.gen_range(0..40) as f64) * 0.5)
            .collect();
        out.sort_by(|a, b| a.total_cmp(b));
        out
    }

    #[test]
    fn test_matches_linear_scan() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            let len = rng.gen_range(0..30);
            let data = random_sorted(&mut rng, len);
            let a = rng.gen_range(-2.0..22.0);
            let b = rng.gen_range(-2.0..22.0);
            let (lower, upper) = if rng.gen_bool(0.9) && a > b {
                (b, a)
            } else {
                (a, b)
            };

            let range = index_range(&data, lower, upper);
            let expected: Vec<usize> = (0..data.len())
                .filter(|&i| lower <= data[i] && data[i] <= upper)
                .collect();

            assert_eq!(range.len(), expected.len(), "{:?} [{}, {}]", data, lower, upper);
            assert_eq!(range.iter().collect::<Vec<_>>(), expected);
        }
    }

    #[test]
    fn test_bounds_agree_with_binary_search() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let len = rng.gen_range(0..25);
            let data = random_sorted(&mut rng, len);
            let lower = rng.gen_range(0.0..20.0);
            let upper = lower + rng.gen_range(0.0..5.0);

            let range = index_range(&data, lower, upper);
            if range.is_empty() {
                continue;
            }
            let ge = binary_search(&data, lower, DefaultTo::GreaterEquals).unwrap();
            let le = binary_search(&data, upper, DefaultTo::LessEquals).unwrap();
            assert_eq!(range.min(), Some(ge as usize));
            assert_eq!(range.max_inclusive(), Some(le as usize));
        }
    }
}
