//! [`Contract`] definitions.

pub mod rent;
pub mod sale;

use common::{define_kind, unit, DateTimeOf, Money};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::customer;

pub use self::{rent::Rent, sale::Sale};

/// Binding agreement with a customer, immutable once issued.
#[derive(Clone, Debug, From)]
pub enum Contract {
    #[doc(hidden)]
    Sale(Sale),
    #[doc(hidden)]
    Rent(Rent),
}

impl Contract {
    /// Returns ID of this [`Contract`].
    #[must_use]
    pub fn id(&self) -> Id {
        match self {
            Self::Sale(c) => c.id,
            Self::Rent(c) => c.id,
        }
    }

    /// Returns [`Kind`] of this [`Contract`].
    #[must_use]
    pub fn kind(&self) -> Kind {
        match self {
            Self::Sale(_) => Kind::Sale,
            Self::Rent(_) => Kind::Rent,
        }
    }

    /// Returns ID of the customer bound by this [`Contract`].
    #[must_use]
    pub fn customer_id(&self) -> customer::Id {
        match self {
            Self::Sale(c) => c.customer_id,
            Self::Rent(c) => c.customer_id,
        }
    }

    /// Returns the total price agreed in this [`Contract`].
    #[must_use]
    pub fn price(&self) -> Money {
        match self {
            Self::Sale(c) => c.price,
            Self::Rent(c) => c.total_price,
        }
    }

    /// Returns [`DateTime`] when this [`Contract`] was issued.
    ///
    /// [`DateTime`]: common::DateTime
    #[must_use]
    pub fn created_at(&self) -> CreationDateTime {
        match self {
            Self::Sale(c) => c.created_at,
            Self::Rent(c) => c.created_at,
        }
    }
}

/// ID of a [`Contract`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

define_kind! {
    #[doc = "Kind of a [`Contract`]."]
    enum Kind {
        #[doc = "[`Sale`] contract."]
        Sale = 1,

        #[doc = "[`Rent`] contract."]
        Rent = 2,
    }
}

/// [`DateTime`] when a [`Contract`] was issued.
///
/// [`DateTime`]: common::DateTime
pub type CreationDateTime = DateTimeOf<(Contract, unit::Creation)>;
