//! Abstract operations and the [`Handler`] executing them.

use std::{future::Future, marker::PhantomData};

/// Executor of `Args`.
///
/// The service, its commands and queries, and the databases below them are
/// all [`Handler`]s. Each layer handles its own `Args` by executing the ones
/// of the layer below.
pub trait Handler<Args = ()> {
    /// Result of a successful execution.
    type Ok;

    /// Error of a failed execution.
    type Err;

    /// Executes the provided `args`.
    fn execute(
        &self,
        args: Args,
    ) -> impl Future<Output = Result<Self::Ok, Self::Err>>;
}

/// Defines single-field wrappers marking what a [`Handler`] should do with
/// the wrapped value.
macro_rules! define_operations {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {$(
        $(#[$meta])*
        #[derive(Clone, Copy, Debug)]
        pub struct $name<T>(pub T);
    )*};
}

define_operations! {
    /// Stores a value which hasn't been stored before, like a freshly issued
    /// contract.
    Insert,

    /// Overwrites a stored value, like a sale listing changing its status.
    Update,

    /// Removes a stored value, like a rent window being withdrawn.
    Delete,

    /// Reads a value, usually through a [`By`] selector.
    Select,

    /// Reserves a value, so concurrent transactions wait for the current one
    /// to finish before touching it. Outside of a transaction it only checks
    /// the value is there.
    Lock,
}

/// Begins a transaction, so all the following operations either apply
/// together on [`Commit`] or not at all.
#[derive(Clone, Copy, Debug)]
pub struct Transact;

/// [`Handler`] returned by [`Transact`]ing the `T` one.
pub type Transacted<T> = <T as Handler<Transact>>::Ok;

/// Applies everything done since [`Transact`].
#[derive(Clone, Copy, Debug)]
pub struct Commit;

/// Selector of `W` by `B`.
///
/// `By<Option<Car>, car::Id>` reads as "an optional car by its ID", so the
/// same `B` may select different `W`s.
#[derive(Clone, Copy, Debug)]
pub struct By<W, B> {
    /// Type of the value being selected.
    _what: PhantomData<W>,

    /// Value to select by.
    by: B,
}

impl<W, B> By<W, B> {
    /// Selects by the provided value.
    #[must_use]
    pub fn new(by: B) -> Self {
        Self {
            _what: PhantomData,
            by,
        }
    }

    /// Returns the value this [`By`] selects by.
    #[must_use]
    pub fn into_inner(self) -> B {
        self.by
    }
}
