//! [`Money`]-related definitions.

use std::{fmt, ops, str::FromStr};

use derive_more::Display;
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::{prelude::ToPrimitive as _, Decimal};
use serde::{Deserialize, Serialize};

/// Non-negative amount of money in the platform currency (USD).
///
/// Amounts are kept with at most two fractional digits.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    /// Zero [`Money`].
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Largest representable [`Money`], matching the `NUMERIC(14, 2)`
    /// columns it's stored in.
    pub const MAX: Self =
        Self(Decimal::from_parts(276_447_231, 23_283, 0, false, 2));

    /// Creates a new [`Money`] if the provided `amount` is non-negative and
    /// doesn't exceed [`Money::MAX`].
    ///
    /// The `amount` is rounded to cents.
    #[must_use]
    pub fn new(amount: Decimal) -> Option<Self> {
        let amount = amount.round_dp(2);
        (amount >= Decimal::ZERO && amount <= Self::MAX.0)
            .then_some(Self(amount))
    }

    /// Creates a new [`Money`] out of the provided whole dollars.
    ///
    /// Saturates at [`Money::MAX`].
    #[must_use]
    pub fn from_dollars(dollars: u64) -> Self {
        Self(Decimal::from(dollars).min(Self::MAX.0))
    }

    /// Returns the amount of this [`Money`].
    #[must_use]
    pub fn amount(self) -> Decimal {
        self.0
    }

    /// Indicates whether this [`Money`] is zero.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// Returns the ratio of this [`Money`] to the provided `whole` one.
    ///
    /// [`None`] is returned if the `whole` is zero.
    #[must_use]
    pub fn ratio(self, whole: Self) -> Option<Decimal> {
        self.0.checked_div(whole.0)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let amount = self.0.normalize();
        if let Some(whole) = amount.is_integer().then(|| amount.to_u128()) {
            write!(f, "${}", whole.unwrap_or_default())
        } else {
            write!(f, "${amount:.2}")
        }
    }
}

impl FromStr for Money {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix('$').unwrap_or(s);
        let amount = Decimal::from_str(s).map_err(|_| "invalid amount")?;
        Self::new(amount).ok_or("amount out of range")
    }
}

impl TryFrom<Decimal> for Money {
    type Error = InvalidAmount;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount).ok_or(InvalidAmount)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl ops::Add for Money {
    type Output = Self;

    /// Saturates at [`Money::MAX`].
    fn add(self, rhs: Self) -> Self::Output {
        self.0
            .checked_add(rhs.0)
            .map_or(Self::MAX, |sum| Self(sum.min(Self::MAX.0)))
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, ops::Add::add)
    }
}

/// Error of constructing [`Money`] out of a negative or too large amount.
#[derive(Clone, Copy, Debug, Display)]
#[display("amount of money is negative or exceeds the maximum")]
pub struct InvalidAmount;

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;

    use super::Money;

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn rejects_negative_amounts() {
        assert!(Money::new(decimal("-0.01")).is_none());
        assert!(Money::from_str("-5").is_err());
        assert_eq!(Money::new(Decimal::ZERO), Some(Money::ZERO));
    }

    #[test]
    fn rejects_amounts_over_max() {
        assert_eq!(Money::MAX.amount(), decimal("999999999999.99"));
        assert_eq!(
            Money::new(decimal("999999999999.99")),
            Some(Money::MAX),
        );
        assert!(Money::new(decimal("1000000000000")).is_none());
        assert!(Money::new(Decimal::MAX).is_none());
        assert!(Money::from_str("79228162514264337593543950335").is_err());
        assert_eq!(Money::from_dollars(u64::MAX), Money::MAX);
    }

    #[test]
    fn rounds_to_cents() {
        assert_eq!(
            Money::new(decimal("10.005")).unwrap().amount(),
            decimal("10.00"),
        );
        assert_eq!(
            Money::new(decimal("10.015")).unwrap().amount(),
            decimal("10.02"),
        );
    }

    #[test]
    fn from_str() {
        assert_eq!(
            Money::from_str("2600000").unwrap(),
            Money::from_dollars(2_600_000),
        );
        assert_eq!(
            Money::from_str("$123.45").unwrap().amount(),
            decimal("123.45"),
        );
        assert!(Money::from_str("12O").is_err());
        assert!(Money::from_str("").is_err());
    }

    #[test]
    fn to_string() {
        assert_eq!(Money::from_dollars(840_000).to_string(), "$840000");
        assert_eq!(Money::new(decimal("123.00")).unwrap().to_string(), "$123");
        assert_eq!(
            Money::new(decimal("123.4")).unwrap().to_string(),
            "$123.40",
        );
    }

    #[test]
    fn ratio() {
        let profit = Money::from_dollars(420_000);
        let revenue = Money::from_dollars(840_000);

        assert_eq!(profit.ratio(revenue), Some(decimal("0.5")));
        assert_eq!(profit.ratio(Money::ZERO), None);
    }

    #[test]
    fn sums() {
        let total: Money = [Money::from_dollars(1), Money::from_dollars(2)]
            .into_iter()
            .sum();

        assert_eq!(total, Money::from_dollars(3));
    }

    #[test]
    fn saturates_sum_at_max() {
        assert_eq!(Money::MAX + Money::MAX, Money::MAX);
        assert_eq!(Money::MAX + Money::ZERO, Money::MAX);

        let total: Money = [Money::MAX, Money::MAX, Money::from_dollars(1)]
            .into_iter()
            .sum();
        assert_eq!(total, Money::MAX);
    }
}
