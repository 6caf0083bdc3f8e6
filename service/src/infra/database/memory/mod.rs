//! In-memory [`Database`] implementation.
//!
//! Mirrors the transactional behavior of [`Postgres`]:
//! - [`Transact`] starts an isolated unit of writes;
//! - [`Lock`] serializes competing transactions until they finish;
//! - [`Commit`] applies all the writes of a transaction at once;
//! - dropping an uncommitted transaction discards its writes.
//!
//! [`Commit`]: common::operations::Commit
//! [`Database`]: crate::infra::Database
//! [`Lock`]: common::operations::Lock
//! [`Postgres`]: crate::infra::Postgres
//! [`Transact`]: common::operations::Transact

mod impls;

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use derive_more::{Deref, Display, Error as StdError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::{
    booking, car, contract, customer, payment, rent_date, rent_list,
    sale_list, Booking, Car, Contract, Customer, Payment, RentDate, RentList,
    SaleList,
};

/// In-memory [`Database`] client.
///
/// [`Database`]: crate::infra::Database
#[derive(Clone, Debug, Default, Deref)]
pub struct Memory<C = NonTx>(C);

impl Memory {
    /// Creates a new empty [`Memory`] database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Rows stored in a [`Memory`] database.
#[derive(Clone, Debug, Default)]
pub struct Tables {
    /// Registered [`Car`]s.
    cars: HashMap<car::Id, Car>,

    /// Registered [`Customer`]s.
    customers: HashMap<customer::Id, Customer>,

    /// [`SaleList`]s of all [`Car`]s.
    sale_lists: HashMap<sale_list::Id, SaleList>,

    /// [`RentList`]s of all [`Car`]s.
    rent_lists: HashMap<rent_list::Id, RentList>,

    /// Links between [`RentList`]s and [`RentDate`]s.
    rentable_dates: Vec<rent_list::RentableDate>,

    /// [`RentDate`]s of all [`RentList`]s.
    rent_dates: HashMap<rent_date::Id, RentDate>,

    /// [`Booking`]s of all [`Customer`]s.
    bookings: HashMap<booking::Id, Booking>,

    /// Issued [`Contract`]s.
    contracts: HashMap<contract::Id, Contract>,

    /// Recorded [`Payment`]s.
    payments: HashMap<payment::Id, Payment>,
}

#[cfg(test)]
impl Tables {
    pub(crate) fn contracts(&self) -> &HashMap<contract::Id, Contract> {
        &self.contracts
    }

    pub(crate) fn rent_lists(&self) -> &HashMap<rent_list::Id, RentList> {
        &self.rent_lists
    }

    pub(crate) fn rent_dates(&self) -> &HashMap<rent_date::Id, RentDate> {
        &self.rent_dates
    }

    pub(crate) fn bookings(&self) -> &HashMap<booking::Id, Booking> {
        &self.bookings
    }
}

/// Write operation upon [`Tables`], replayable on commit.
type Write = Arc<dyn Fn(&mut Tables) -> Result<(), Error> + Send + Sync>;

/// Shared state of a [`Memory`] database.
#[derive(Debug, Default)]
struct Store {
    /// Committed [`Tables`].
    tables: Mutex<Tables>,

    /// Lock serializing transactions performing a [`Lock`] operation.
    ///
    /// [`Lock`]: common::operations::Lock
    lock: Arc<AsyncMutex<()>>,
}

impl Store {
    /// Returns the committed [`Tables`].
    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Access to [`Tables`] of a [`Memory`] database.
pub trait Access {
    /// Runs the provided function upon the [`Tables`] visible to this client.
    fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> R;

    /// Applies the provided write to the [`Tables`] visible to this client.
    ///
    /// # Errors
    ///
    /// If the write violates some constraint. Nothing is written then.
    fn write(
        &self,
        op: impl Fn(&mut Tables) -> Result<(), Error> + Send + Sync + 'static,
    ) -> Result<(), Error>;
}

/// Non-transactional [`Memory`] database client.
///
/// Every write is visible immediately.
#[derive(Clone, Debug, Default)]
pub struct NonTx {
    /// Shared [`Store`] of the database.
    store: Arc<Store>,
}

impl Access for NonTx {
    fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> R {
        f(&self.store.tables())
    }

    fn write(
        &self,
        op: impl Fn(&mut Tables) -> Result<(), Error> + Send + Sync + 'static,
    ) -> Result<(), Error> {
        let mut tables = self.store.tables();
        let mut next = tables.clone();
        op(&mut next)?;
        *tables = next;
        Ok(())
    }
}

/// Transactional [`Memory`] database client.
///
/// Reads see the committed [`Tables`] along with the own uncommitted writes.
#[derive(Clone)]
pub struct Tx {
    /// Shared [`Store`] of the database.
    store: Arc<Store>,

    /// State of this transaction.
    state: Arc<Mutex<TxState>>,
}

/// State of a [`Tx`].
#[derive(Default)]
struct TxState {
    /// Uncommitted writes, in order of their execution.
    writes: Vec<Write>,

    /// Held [`Store::lock`], if any.
    guard: Option<OwnedMutexGuard<()>>,
}

impl fmt::Debug for Tx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("Tx")
            .field("writes", &state.writes.len())
            .field("locked", &state.guard.is_some())
            .finish_non_exhaustive()
    }
}

impl Tx {
    /// Starts a new [`Tx`] from the provided [`NonTx`] client.
    fn from_non_tx(client: &NonTx) -> Self {
        Self {
            store: Arc::clone(&client.store),
            state: Arc::default(),
        }
    }

    /// Returns the [`TxState`] of this [`Tx`].
    fn state(&self) -> MutexGuard<'_, TxState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Waits until no other [`Tx`] holds the lock, and holds it till the end
    /// of this [`Tx`].
    async fn lock(&self) {
        if self.state().guard.is_some() {
            return;
        }
        let guard = Arc::clone(&self.store.lock).lock_owned().await;
        self.state().guard = Some(guard);
    }

    /// Applies all the writes of this [`Tx`] to the committed [`Tables`] and
    /// releases the held lock.
    ///
    /// # Errors
    ///
    /// If some write violates a constraint. Nothing is committed then.
    fn commit(&self) -> Result<(), Error> {
        let mut state = self.state();
        let writes = std::mem::take(&mut state.writes);

        let result = {
            let mut tables = self.store.tables();
            let mut next = tables.clone();
            writes
                .iter()
                .try_for_each(|w| w(&mut next))
                .map(|()| *tables = next)
        };

        state.guard = None;
        result
    }
}

impl Access for Tx {
    fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> R {
        let state = self.state();
        let tables = self.store.tables();
        if state.writes.is_empty() {
            return f(&tables);
        }

        let mut view = tables.clone();
        drop(tables);
        for w in &state.writes {
            // Conflicting writes are reported on commit.
            _ = w(&mut view);
        }
        f(&view)
    }

    fn write(
        &self,
        op: impl Fn(&mut Tables) -> Result<(), Error> + Send + Sync + 'static,
    ) -> Result<(), Error> {
        let mut state = self.state();
        let mut view = self.store.tables().clone();
        for w in &state.writes {
            _ = w(&mut view);
        }
        op(&mut view)?;
        state.writes.push(Arc::new(op));
        Ok(())
    }
}

/// [`Memory`] database error.
#[derive(Clone, Copy, Debug, Display, StdError)]
pub enum Error {
    /// Unique constraint is violated.
    #[display("Unique constraint `{_0}` is violated")]
    UniqueViolation(#[error(not(source))] &'static str),
}

impl Error {
    /// Checks if the error is a unique violation of the specified constraint.
    #[must_use]
    pub fn is_unique_violation(&self, constraint: Option<&str>) -> bool {
        match self {
            Self::UniqueViolation(c) => constraint.map_or(true, |n| n == *c),
        }
    }
}
