//! [`Command`] for renting a [`Car`] by issuing a [`contract::Rent`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    Date, DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        car, contract, customer, rent_date, rent_list, Customer, RentDate,
        RentList,
    },
    infra::{database, Database},
    Service,
};
#[cfg(doc)]
use crate::domain::{Car, Contract};

use super::Command;

/// [`Command`] for renting a [`Car`] by issuing a [`contract::Rent`].
///
/// Every day of the rented range must be covered by [`RentDate`]s booked by
/// the same [`Customer`] beforehand.
#[derive(Clone, Copy, Debug)]
pub struct IssueRentContract {
    /// ID of the [`Car`] to rent.
    pub car_id: car::Id,

    /// ID of the [`Customer`] renting the [`Car`].
    pub customer_id: customer::Id,

    /// First day of the rent.
    pub start_date: Date,

    /// Last day of the rent, inclusive.
    pub end_date: Date,

    /// Total price of the rent.
    pub total_price: Money,
}

impl<Db> Command<IssueRentContract> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Customer>, customer::Id>>,
            Ok = Option<Customer>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<
            Lock<By<RentList, car::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<RentList>, car::Id>>,
            Ok = Option<RentList>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<RentDate>, rent_list::Id>>,
            Ok = Vec<RentDate>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<RentDate, Vec<rent_date::Id>>>,
            Err = Traced<database::Error>,
        > + Database<Insert<contract::Contract>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = contract::Rent;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: IssueRentContract,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let IssueRentContract {
            car_id,
            customer_id,
            start_date,
            end_date,
            total_price,
        } = cmd;

        if start_date > end_date {
            return Err(tracerr::new!(E::InvalidRange {
                start: start_date,
                end: end_date,
            }));
        }
        if total_price.amount.is_sign_negative() {
            return Err(tracerr::new!(E::InvalidPrice(total_price)));
        }

        self.database()
            .execute(Select(By::<Option<Customer>, _>::new(customer_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::CustomerNotExists(customer_id))
            .map_err(tracerr::wrap!())?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid the dates being re-opened while the contract is issued.
        tx.execute(Lock(By::<RentList, _>::new(car_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let list = tx
            .execute(Select(By::<Option<RentList>, _>::new(car_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::NotForRent(car_id))
            .map_err(tracerr::wrap!())?;

        let booked_by_customer = |dates: Vec<RentDate>| {
            dates
                .into_iter()
                .filter(|d| {
                    d.booked_by == Some(customer_id) && !d.is_available()
                })
                .collect::<Vec<_>>()
        };

        let mut ids = booked_by_customer(
            tx.execute(Select(By::<Vec<RentDate>, _>::new(list.id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?,
        )
        .into_iter()
        .map(|d| d.id)
        .collect::<Vec<_>>();
        ids.sort_unstable();

        // Keep the covering dates booked until the contract is committed.
        if !ids.is_empty() {
            tx.execute(Lock(By::<RentDate, _>::new(ids)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        }

        let booked = booked_by_customer(
            tx.execute(Select(By::<Vec<RentDate>, _>::new(list.id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?,
        );

        let mut day = Some(start_date);
        while let Some(d) = day.filter(|d| *d <= end_date) {
            if !booked.iter().any(|b| b.covers(d)) {
                return Err(tracerr::new!(E::DatesNotBooked(d)));
            }
            day = d.next_day();
        }

        let contract = contract::Rent {
            id: contract::Id::new(),
            rent_list_id: list.id,
            customer_id,
            start_date,
            end_date,
            total_price,
            created_at: DateTime::now().coerce(),
        };
        tx.execute(Insert(contract.clone().into()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(contract)
    }
}

/// Error of [`IssueRentContract`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Customer`] with the provided ID does not exist.
    #[display("`Customer(id: {_0})` does not exist")]
    CustomerNotExists(#[error(not(source))] customer::Id),

    /// Day of the range is not booked by the [`Customer`].
    #[display("`{_0}` is not booked by the `Customer`")]
    DatesNotBooked(#[error(not(source))] Date),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Price is negative.
    #[display("Price must not be negative, but `{_0}` provided")]
    InvalidPrice(#[error(not(source))] Money),

    /// Range ends before it starts.
    #[display("Range `{start}..={end}` ends before it starts")]
    InvalidRange {
        /// First day of the range.
        start: Date,

        /// Last day of the range.
        end: Date,
    },

    /// [`Car`] has no [`RentList`].
    #[display("`Car(id: {_0})` is not listed for rent")]
    NotForRent(#[error(not(source))] car::Id),
}
