use num_traits::One;
use num_traits::SaturatingAdd;
use num_traits::Zero;
use num_traits::bounds::UpperBounded;
use ordered_float::OrderedFloat;

use crate::cost::Cost;

/// A totally ordered, non-negative real distance.
///
/// Grid edges cost their Euclidean length, so grid paths are measured with
/// this instead of the integer step counts the puzzle uses.
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Distance(pub OrderedFloat<f64>);

impl Distance {
    /// Length of an orthogonal step.
    pub const ORTHOGONAL: Distance = Distance(OrderedFloat(1.0f64));
    /// Length of a diagonal step.
    pub const DIAGONAL: Distance = Distance(OrderedFloat(std::f64::consts::SQRT_2));

    #[inline(always)]
    pub fn new(d: f64) -> Self {
        debug_assert!(!d.is_nan());
        Self(OrderedFloat(d))
    }

    #[inline(always)]
    pub fn get(&self) -> f64 {
        self.0.0
    }

    /// Whether two distances agree up to accumulated rounding.
    pub fn approx_eq(&self, other: &Self) -> bool {
        if !self.valid() || !other.valid() {
            return self == other;
        }
        (self.get() - other.get()).abs() <= 1e-9 * self.get().abs().max(1.0)
    }
}

impl Cost for Distance {}

impl std::fmt::Display for Distance {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if self.valid() {
            write!(f, "{:.2}", self.get())
        } else {
            write!(f, "∞")
        }
    }
}

impl std::ops::Add for Distance {
    type Output = Self;
    #[inline(always)]
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}
impl std::ops::Sub for Distance {
    type Output = Self;
    #[inline(always)]
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}
impl std::ops::Mul for Distance {
    type Output = Self;
    #[inline(always)]
    fn mul(self, rhs: Self) -> Self::Output {
        Self(self.0 * rhs.0)
    }
}
impl std::ops::AddAssign for Distance {
    #[inline(always)]
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

// IEEE addition already saturates at infinity.
impl SaturatingAdd for Distance {
    #[inline(always)]
    fn saturating_add(&self, rhs: &Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Zero for Distance {
    #[inline(always)]
    fn zero() -> Self {
        Self(OrderedFloat(0.0f64))
    }
    #[inline(always)]
    fn is_zero(&self) -> bool {
        self.get() == 0.0f64
    }
}
impl One for Distance {
    #[inline(always)]
    fn one() -> Self {
        Self::ORTHOGONAL
    }
}
impl UpperBounded for Distance {
    #[inline(always)]
    fn max_value() -> Self {
        Self(OrderedFloat(f64::INFINITY))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero() {
        assert!(Distance::zero().is_zero());
        assert!(Distance::new(0.0).is_zero());
        assert!(!Distance::ORTHOGONAL.is_zero());
    }

    #[test]
    fn order() {
        assert!(Distance::ORTHOGONAL < Distance::DIAGONAL);
        assert!(Distance::DIAGONAL < Distance::infinity());
        assert_eq!(Distance::new(2.0), Distance::ORTHOGONAL + Distance::ORTHOGONAL);
    }

    #[test]
    fn sum() {
        let mut d = Distance::zero();
        d += Distance::ORTHOGONAL;
        d += Distance::DIAGONAL;
        assert!(d.approx_eq(&Distance::new(1.0 + std::f64::consts::SQRT_2)));
        d += Distance::infinity();
        assert_eq!(d, Distance::max_value());
        assert!(!d.valid());
    }

    #[test]
    fn display() {
        assert_eq!(Distance::DIAGONAL.to_string(), "1.41");
        assert_eq!(Distance::infinity().to_string(), "∞");
    }
}
