//! [`Percent`]-related definitions.

use std::str::FromStr;

use derive_more::Display;
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::Money;

/// Non-negative percentage with two fractional digits.
///
/// Not capped at `100`: a part may exceed its whole (for example, a profit
/// coming from outside the reported revenue).
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[display("{}%", _0.normalize())]
pub struct Percent(Decimal);

impl Percent {
    /// Creates a new [`Percent`] if the provided value is non-negative.
    #[must_use]
    pub fn new(val: Decimal) -> Option<Self> {
        (val >= Decimal::ZERO).then(|| Self(val.round_dp(2)))
    }

    /// Calculates which [`Percent`] the `part` is of the `whole`.
    ///
    /// [`None`] is returned if the `whole` is zero, or the result doesn't fit
    /// into a [`Decimal`].
    #[must_use]
    pub fn of(part: Money, whole: Money) -> Option<Self> {
        part.ratio(whole)
            .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
            .map(|p| Self(p.round_dp(2)))
    }

    /// Returns the value of this [`Percent`].
    #[must_use]
    pub fn value(self) -> Decimal {
        self.0
    }
}

impl FromStr for Percent {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.strip_suffix('%').unwrap_or(s))
            .ok()
            .and_then(Self::new)
            .ok_or("invalid percent value")
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;

    use crate::Money;

    use super::Percent;

    #[test]
    fn of() {
        let half = Percent::of(
            Money::from_dollars(420_000),
            Money::from_dollars(840_000),
        )
        .unwrap();
        assert_eq!(half, Percent::from_str("50").unwrap());
        assert_eq!(half.to_string(), "50%");

        let over = Percent::of(Money::from_dollars(3), Money::from_dollars(2));
        assert_eq!(over, Some(Percent::from_str("150%").unwrap()));

        assert_eq!(Percent::of(Money::from_dollars(1), Money::ZERO), None);
    }

    #[test]
    fn of_extreme_ratio() {
        let cent = Money::new(Decimal::new(1, 2)).unwrap();

        let huge = Percent::of(Money::MAX, cent).unwrap();
        assert_eq!(huge.value(), Decimal::from(9_999_999_999_999_900_i64));

        let tiny = Percent::of(cent, Money::MAX).unwrap();
        assert_eq!(tiny.value(), Decimal::ZERO);
    }

    #[test]
    fn from_str() {
        assert!(Percent::from_str("12.5").is_ok());
        assert!(Percent::from_str("-1").is_err());
        assert!(Percent::from_str("abc").is_err());
    }
}
