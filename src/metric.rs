use std::cmp::Ordering;
use std::fmt::{Debug, Display};

pub use num::Float;

/// Distance values stored in the trees.
pub trait Scalar: Float + Debug + Display + Send + Sync {}
impl<T: Float + Debug + Display + Send + Sync> Scalar for T {}

/// An item living in a metric space with distances of type `F`.
pub trait MetricItem<F: Scalar> {
    fn distance(&self, other: &Self) -> F;
}

/// Total order over distances; incomparable values compare equal.
#[inline]
pub fn cmp_distance<F: Scalar>(a: F, b: F) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}
