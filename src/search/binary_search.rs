use serde::{
    Deserialize,
    Serialize,
};

use crate::errors::{
    IonStreamError,
    Result,
};

/// What to return when the searched value is not present in the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DefaultTo {
    /// Index of the closest value, ties go to the lower index
    /// (the first copy when the closest value is duplicated).
    ClosestValue,
    /// Same convention as java's `Arrays.binarySearch`,
    /// `-(insertion_point) - 1` when the value is not found.
    MinusInsertionPoint,
    /// First index whose value is >= the searched value, -1 if none.
    GreaterEquals,
    /// Last index whose value is <= the searched value, -1 if none.
    LessEquals,
}

/// First index in `[from, to_exclusive)` whose value is not less than `value`.
/// Returns `to_exclusive` when every value is smaller.
pub(crate) fn lower_bound<F>(
    from: usize,
    to_exclusive: usize,
    value: f64,
    value_at: &F,
) -> usize
where
    F: Fn(usize) -> f64,
{
    let mut lo = from;
    let mut hi = to_exclusive;
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if value_at(mid) < value {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    lo
}

/// First index in `[from, to_exclusive)` whose value is greater than `value`.
pub(crate) fn upper_bound<F>(
    from: usize,
    to_exclusive: usize,
    value: f64,
    value_at: &F,
) -> usize
where
    F: Fn(usize) -> f64,
{
    let mut lo = from;
    let mut hi = to_exclusive;
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if value_at(mid) <= value {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    lo
}

/// Binary search over the values exposed by `value_at` in `[from, to_exclusive)`.
///
/// The values have to be sorted ascending and must not contain NaN.
/// Returned indices are absolute, not relative to `from`.
/// An empty range gives -1 for every policy but [DefaultTo::ClosestValue],
/// which has no answer for empty input and errors out.
pub fn binary_search_by_index<F>(
    from: usize,
    to_exclusive: usize,
    value: f64,
    default_to: DefaultTo,
    value_at: F,
) -> Result<isize>
where
    F: Fn(usize) -> f64,
{
    if from > to_exclusive {
        return Err(IonStreamError::InvalidArgument(format!(
            "Search range start {} is after its end {}",
            from, to_exclusive
        )));
    }
    if value.is_nan() {
        return Err(IonStreamError::InvalidArgument(
            "Cannot search for a NaN value".to_string(),
        ));
    }
    if from == to_exclusive {
        return match default_to {
            DefaultTo::ClosestValue => Err(IonStreamError::InvalidArgument(
                "Closest value is undefined for empty data".to_string(),
            )),
            _ => Ok(-1),
        };
    }

    let out = match default_to {
        DefaultTo::GreaterEquals => {
            let idx = lower_bound(from, to_exclusive, value, &value_at);
            if idx == to_exclusive {
                -1
            } else {
                idx as isize
            }
        },
        DefaultTo::LessEquals => {
            let idx = upper_bound(from, to_exclusive, value, &value_at);
            if idx == from {
                -1
            } else {
                (idx - 1) as isize
            }
        },
        DefaultTo::MinusInsertionPoint => {
            let idx = lower_bound(from, to_exclusive, value, &value_at);
            if idx < to_exclusive && value_at(idx) == value {
                idx as isize
            } else {
                -(idx as isize) - 1
            }
        },
        DefaultTo::ClosestValue => {
            let idx = lower_bound(from, to_exclusive, value, &value_at);
            if idx == to_exclusive {
                let last = value_at(to_exclusive - 1);
                lower_bound(from, to_exclusive, last, &value_at) as isize
            } else if idx == from {
                from as isize
            } else {
                let below_value = value_at(idx - 1);
                let below = value - below_value;
                let above = value_at(idx) - value;
                if below <= above {
                    // First copy of a duplicated value
                    lower_bound(from, idx, below_value, &value_at) as isize
                } else {
                    idx as isize
                }
            }
        },
    };
    Ok(out)
}

/// Binary search on a sorted slice, see [binary_search_by_index].
///
/// Usage:
/// ```rust
/// use ionstream::search::{binary_search, DefaultTo};
/// let data = [1.0, 2.0, 2.0, 2.0, 5.0];
/// assert_eq!(binary_search(&data, 2.0, DefaultTo::GreaterEquals).unwrap(), 1);
/// assert_eq!(binary_search(&data, 2.0, DefaultTo::LessEquals).unwrap(), 3);
/// assert_eq!(binary_search(&data, 6.0, DefaultTo::GreaterEquals).unwrap(), -1);
/// assert_eq!(binary_search(&data, 0.5, DefaultTo::LessEquals).unwrap(), -1);
/// assert_eq!(binary_search(&data, 3.5, DefaultTo::ClosestValue).unwrap(), 1);
/// assert_eq!(binary_search(&data, 4.0, DefaultTo::MinusInsertionPoint).unwrap(), -5);
/// let empty: [f64; 0] = [];
/// assert_eq!(binary_search(&empty, 4.0, DefaultTo::GreaterEquals).unwrap(), -1);
/// assert!(binary_search(&empty, 4.0, DefaultTo::ClosestValue).is_err());
/// ```
pub fn binary_search(
    data: &[f64],
    value: f64,
    default_to: DefaultTo,
) -> Result<isize> {
    binary_search_by_index(0, data.len(), value, default_to, |i| data[i])
}
