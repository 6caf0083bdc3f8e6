//! [`Money`]-related definitions.

use std::{fmt, str::FromStr};

use rust_decimal::{prelude::ToPrimitive as _, Decimal};

use crate::define_kind;

/// Amount of money in some [`Currency`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Money {
    /// Amount of this [`Money`].
    pub amount: Decimal,

    /// [`Currency`] of this amount.
    pub currency: Currency,
}

impl Money {
    /// Creates a new [`Money`] out of a floating-point `amount`.
    ///
    /// [`None`] is returned if the `amount` is not a finite number.
    #[must_use]
    pub fn from_f64(amount: f64, currency: Currency) -> Option<Self> {
        let amount = Decimal::try_from(amount).ok()?.normalize();
        Some(Self { amount, currency })
    }

    /// Returns the amount of this [`Money`] as a floating-point number.
    #[must_use]
    pub fn to_f64(&self) -> f64 {
        self.amount.to_f64().unwrap_or(f64::NAN)
    }

    /// Indicates whether this [`Money`] is strictly greater than zero.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { amount, currency } = self;
        write!(f, "{}{currency}", amount.normalize())
    }
}

impl FromStr for Money {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() < 4 {
            return Err("too short");
        }

        let (amount, currency) = s.split_at(s.len() - 3);
        let amount = Decimal::from_str(amount).map_err(|_| "invalid amount")?;
        let currency =
            Currency::from_str(currency).map_err(|_| "invalid currency")?;

        Ok(Self { amount, currency })
    }
}

define_kind! {
    #[doc = "Currency of a [`Money`] amount."]
    enum Currency {
        #[doc = "Thai Baht."]
        Thb = 1,

        #[doc = "US Dollar."]
        Usd = 2,

        #[doc = "Euro."]
        Eur = 3,
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;

    use super::{Currency, Money};

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn from_str() {
        assert_eq!(
            Money::from_str("1500000.50THB").unwrap(),
            Money {
                amount: decimal("1500000.50"),
                currency: Currency::Thb,
            },
        );
        assert_eq!(
            Money::from_str("123.45usd").unwrap(),
            Money {
                amount: decimal("123.45"),
                currency: Currency::Usd,
            },
        );

        assert!(Money::from_str("123.45").is_err());
        assert!(Money::from_str("123.45Th").is_err());
        assert!(Money::from_str("123.45Bahts").is_err());
        assert!(Money::from_str("123THB").is_ok());
    }

    #[test]
    fn to_string() {
        assert_eq!(
            Money {
                amount: decimal("123.45"),
                currency: Currency::Eur,
            }
            .to_string(),
            "123.45EUR",
        );
        assert_eq!(
            Money {
                amount: decimal("123.00"),
                currency: Currency::Thb,
            }
            .to_string(),
            "123THB",
        );
    }

    #[test]
    fn converts_floats() {
        let money = Money::from_f64(1200.5, Currency::Thb).unwrap();

        assert_eq!(money.amount, decimal("1200.5"));
        assert!((money.to_f64() - 1200.5).abs() < f64::EPSILON);
        assert!(money.is_positive());

        assert!(Money::from_f64(f64::NAN, Currency::Thb).is_none());
        assert!(Money::from_f64(f64::INFINITY, Currency::Thb).is_none());
        assert!(!Money::from_f64(0.0, Currency::Thb).unwrap().is_positive());
        assert!(!Money::from_f64(-3.0, Currency::Thb).unwrap().is_positive());
    }
}
