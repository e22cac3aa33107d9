use num_traits::bounds::UpperBounded;

/// A path cost.
///
/// `max_value()` doubles as "unreached", so every node starts at infinity and
/// only finite costs are [`Cost::valid`].
pub trait Cost:
    Copy
    + std::fmt::Debug
    + std::fmt::Display
    + PartialEq
    + core::cmp::Eq
    + PartialOrd
    + Ord
    + num_traits::SaturatingAdd
    + num_traits::bounds::UpperBounded
    + num_traits::Zero
    + num_traits::One
    + std::ops::Add<Self, Output = Self>
    + std::ops::Sub<Self, Output = Self>
    + std::ops::AddAssign
{
    #[inline(always)]
    fn valid(&self) -> bool {
        *self != UpperBounded::max_value()
    }

    #[inline(always)]
    fn infinity() -> Self {
        UpperBounded::max_value()
    }
}

/// Unit step counts, as used by the sliding-tile puzzle.
impl Cost for u32 {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infinity_is_not_valid() {
        assert!(!<u32 as Cost>::infinity().valid());
        assert!(0u32.valid());
        assert!(41u32.valid());
    }

    #[test]
    fn infinity_saturates() {
        use num_traits::SaturatingAdd;

        // The inherent `u32::saturating_add` takes its argument by value.
        let inf = <u32 as Cost>::infinity();
        assert_eq!(SaturatingAdd::saturating_add(&inf, &1u32), inf);
        assert_eq!(SaturatingAdd::saturating_add(&2u32, &3u32), 5);
    }
}
