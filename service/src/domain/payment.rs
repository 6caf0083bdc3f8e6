//! [`Payment`] definitions.

use common::{define_kind, unit, DateTimeOf, Money};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{contract, customer, employee};
#[cfg(doc)]
use crate::domain::{Contract, Customer};

/// Money transfer made by a [`Customer`] against a [`Contract`].
#[derive(Clone, Debug)]
pub struct Payment {
    /// ID of this [`Payment`].
    pub id: Id,

    /// [`Contract`] this [`Payment`] is made against.
    pub contract: ContractRef,

    /// ID of the [`Method`] used to pay.
    pub method_id: MethodId,

    /// Paid amount.
    pub amount: Money,

    /// ID of the paying [`Customer`].
    pub customer_id: customer::Id,

    /// ID of the employee who accepted this [`Payment`], if any.
    pub employee_id: Option<employee::Id>,

    /// [`Status`] of this [`Payment`].
    pub status: Status,

    /// [`Proof`] of this [`Payment`], once uploaded.
    pub proof: Option<Proof>,

    /// [`DateTime`] when the money was transferred.
    ///
    /// [`DateTime`]: common::DateTime
    pub paid_at: PaymentDateTime,

    /// [`DateTime`] when this [`Payment`] was recorded.
    ///
    /// [`DateTime`]: common::DateTime
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Payment`] was modified the last time.
    ///
    /// [`DateTime`]: common::DateTime
    pub updated_at: ModificationDateTime,
}

/// Reference to exactly one [`Contract`] of a known [`contract::Kind`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ContractRef {
    /// [`contract::Sale`] reference.
    Sale(contract::Id),

    /// [`contract::Rent`] reference.
    Rent(contract::Id),
}

impl ContractRef {
    /// Creates a new [`ContractRef`] out of its parts.
    #[must_use]
    pub fn new(kind: contract::Kind, id: contract::Id) -> Self {
        match kind {
            contract::Kind::Sale => Self::Sale(id),
            contract::Kind::Rent => Self::Rent(id),
        }
    }

    /// Returns ID of the referenced [`Contract`].
    #[must_use]
    pub fn id(self) -> contract::Id {
        match self {
            Self::Sale(id) | Self::Rent(id) => id,
        }
    }

    /// Returns [`contract::Kind`] of the referenced [`Contract`].
    #[must_use]
    pub fn kind(self) -> contract::Kind {
        match self {
            Self::Sale(_) => contract::Kind::Sale,
            Self::Rent(_) => contract::Kind::Rent,
        }
    }
}

/// Uploaded proof of a [`Payment`], like a bank slip.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Proof {
    /// [`ProofUrl`] of the uploaded file.
    pub url: ProofUrl,

    /// [`ProofMethod`] the proof was made with.
    pub method: ProofMethod,
}

/// ID of a [`Payment`].
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
    Ord,
    PartialEq,
    PartialOrd,
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

/// ID of a payment [`Method`], like a bank transfer or cash.
///
/// Methods are reference data managed outside of this service.
///
/// [`Method`]: MethodId
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
pub struct MethodId(Uuid);

/// Reference to an uploaded [`Proof`] file.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct ProofUrl(String);

impl ProofUrl {
    /// Creates a new [`ProofUrl`] if the given `url` is valid.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Option<Self> {
        let url = url.into();
        (url.trim() == url && !url.is_empty() && url.len() <= 2048)
            .then_some(Self(url))
    }
}

/// Way a [`Proof`] was made with, like `bank_slip` or `qr_code`.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct ProofMethod(String);

impl ProofMethod {
    /// Creates a new [`ProofMethod`] if the given `method` is valid.
    #[must_use]
    pub fn new(method: impl Into<String>) -> Option<Self> {
        let method = method.into();
        (method.trim() == method && !method.is_empty() && method.len() <= 64)
            .then_some(Self(method))
    }
}

define_kind! {
    #[doc = "Status of a [`Payment`]."]
    enum Status {
        #[doc = "[`Payment`] awaits verification."]
        Pending = 1,

        #[doc = "[`Payment`] is verified, final."]
        Confirmed = 2,

        #[doc = "[`Payment`] failed verification."]
        Rejected = 3,
    }
}

impl Status {
    /// Indicates whether a [`Payment`] in this [`Status`] may be moved to the
    /// `next` one.
    #[must_use]
    pub fn can_become(self, next: Self) -> bool {
        use Status as S;

        self == next
            || matches!(
                (self, next),
                (S::Pending, S::Confirmed | S::Rejected)
                    | (S::Rejected, S::Pending)
            )
    }
}

/// [`DateTime`] when a [`Payment`] was made.
///
/// [`DateTime`]: common::DateTime
pub type PaymentDateTime = DateTimeOf<(Payment, unit::Payment)>;

/// [`DateTime`] when a [`Payment`] was recorded.
///
/// [`DateTime`]: common::DateTime
pub type CreationDateTime = DateTimeOf<(Payment, unit::Creation)>;

/// [`DateTime`] when a [`Payment`] was modified.
///
/// [`DateTime`]: common::DateTime
pub type ModificationDateTime = DateTimeOf<(Payment, unit::Modification)>;

#[cfg(test)]
mod spec {
    use super::Status;

    #[test]
    fn confirmed_is_final() {
        assert!(Status::Confirmed.can_become(Status::Confirmed));
        assert!(!Status::Confirmed.can_become(Status::Pending));
        assert!(!Status::Confirmed.can_become(Status::Rejected));
    }

    #[test]
    fn rejected_may_be_retried() {
        assert!(Status::Rejected.can_become(Status::Pending));
        assert!(!Status::Rejected.can_become(Status::Confirmed));
    }

    #[test]
    fn pending_is_resolved() {
        assert!(Status::Pending.can_become(Status::Confirmed));
        assert!(Status::Pending.can_become(Status::Rejected));
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert_eq!("pending".parse::<Status>().unwrap(), Status::Pending);
        assert!("checking".parse::<Status>().is_err());
        assert!("paid".parse::<Status>().is_err());
    }
}
