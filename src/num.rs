//! Small numeric helpers.

use std::hash::Hash;

/// A wrapper for `f64` that implements `Ord`.
///
/// Unlike the more principled wrappers in the `ordered_float` crate, this one
/// doesn't order NaNs, nor does it guard against them on construction: it
/// just compares them equal to everything. Inputs are screened for NaN at the
/// public entry point, so none of the values we sort on can be NaN.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheapOrderedFloat(f64);

impl CheapOrderedFloat {
    /// Retrieve the inner `f64`.
    pub fn into_inner(self) -> f64 {
        self.0
    }
}

impl Hash for CheapOrderedFloat {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state)
    }
}

impl From<f64> for CheapOrderedFloat {
    fn from(value: f64) -> Self {
        CheapOrderedFloat(value)
    }
}

// Now comes the fishy stuff.
impl Eq for CheapOrderedFloat {}

impl PartialOrd for CheapOrderedFloat {
    #[inline(always)]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CheapOrderedFloat {
    #[inline(always)]
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        if self.0 < other.0 {
            std::cmp::Ordering::Less
        } else if self.0 > other.0 {
            std::cmp::Ordering::Greater
        } else {
            std::cmp::Ordering::Equal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_like_f64() {
        let mut xs: Vec<CheapOrderedFloat> =
            [3.0, -1.5, 0.0, 2.25, -7.0].into_iter().map(CheapOrderedFloat::from).collect();
        xs.sort();
        let xs: Vec<f64> = xs.into_iter().map(CheapOrderedFloat::into_inner).collect();
        assert_eq!(xs, vec![-7.0, -1.5, 0.0, 2.25, 3.0]);
    }

    #[test]
    fn zero_signs_compare_equal() {
        assert_eq!(
            CheapOrderedFloat::from(0.0).cmp(&CheapOrderedFloat::from(-0.0)),
            std::cmp::Ordering::Equal
        );
    }
}
