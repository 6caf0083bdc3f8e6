//! [`Command`] for booking a batch of [`RentDate`]s.

use std::collections::{HashMap, HashSet};

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{car, customer, rent_date, Customer, RentDate, RentList},
    infra::{database, Database},
    Service,
};
#[cfg(doc)]
use crate::domain::Car;

use super::Command;

/// [`Command`] for booking a batch of [`RentDate`]s of a [`Car`].
///
/// Either all the [`RentDate`]s are booked, or none of them.
#[derive(Clone, Debug)]
pub struct BookDates {
    /// ID of the [`Car`] the [`RentDate`]s belong to.
    pub car_id: car::Id,

    /// ID of the [`Customer`] booking the [`RentDate`]s.
    pub customer_id: customer::Id,

    /// IDs of the [`RentDate`]s to book, in the order to check them.
    pub date_ids: Vec<rent_date::Id>,
}

impl<Db> Command<BookDates> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Customer>, customer::Id>>,
            Ok = Option<Customer>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<
            Lock<By<RentDate, Vec<rent_date::Id>>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<RentList>, car::Id>>,
            Ok = Option<RentList>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<RentDate>, crate::domain::rent_list::Id>>,
            Ok = Vec<RentDate>,
            Err = Traced<database::Error>,
        > + Database<Update<RentDate>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Vec<RentDate>;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: BookDates) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let BookDates {
            car_id,
            customer_id,
            date_ids,
        } = cmd;

        if date_ids.is_empty() {
            return Err(tracerr::new!(E::NoDates));
        }
        let mut seen = HashSet::with_capacity(date_ids.len());
        if let Some(dup) = date_ids.iter().find(|id| !seen.insert(**id)) {
            return Err(tracerr::new!(E::DuplicateDate(*dup)));
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

        let mut locked = date_ids.clone();
        locked.sort_unstable();
        tx.execute(Lock(By::<RentDate, _>::new(locked)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let list = tx
            .execute(Select(By::<Option<RentList>, _>::new(car_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::NotForRent(car_id))
            .map_err(tracerr::wrap!())?;
        let mut dates = tx
            .execute(Select(By::<Vec<RentDate>, _>::new(list.id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .into_iter()
            .map(|d| (d.id, d))
            .collect::<HashMap<_, _>>();

        let mut booked = Vec::with_capacity(date_ids.len());
        for id in date_ids {
            let mut date = dates
                .remove(&id)
                .ok_or(E::DateNotExists(id))
                .map_err(tracerr::wrap!())?;
            if !date.is_available() {
                return Err(tracerr::new!(E::DateNotAvailable(id)));
            }
            date.book(customer_id);
            booked.push(date);
        }

        for date in &booked {
            tx.execute(Update(date.clone()))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        }

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::debug!(
            "`Customer(id: {customer_id})` booked {} `RentDate`s of \
             `Car(id: {car_id})`",
            booked.len(),
        );

        Ok(booked)
    }
}

/// Error of [`BookDates`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Customer`] with the provided ID does not exist.
    #[display("`Customer(id: {_0})` does not exist")]
    CustomerNotExists(#[error(not(source))] customer::Id),

    /// [`RentDate`] is booked already.
    #[display("`RentDate(id: {_0})` is not available")]
    DateNotAvailable(#[error(not(source))] rent_date::Id),

    /// [`RentDate`] with the provided ID does not exist for the [`Car`].
    #[display("`RentDate(id: {_0})` does not exist")]
    DateNotExists(#[error(not(source))] rent_date::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Same [`RentDate`] is requested more than once.
    #[display("`RentDate(id: {_0})` is requested more than once")]
    DuplicateDate(#[error(not(source))] rent_date::Id),

    /// No [`RentDate`]s are requested.
    #[display("No `RentDate`s to book")]
    NoDates,

    /// [`Car`] has no [`RentList`].
    #[display("`Car(id: {_0})` is not listed for rent")]
    NotForRent(#[error(not(source))] car::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{
            create_or_replace_rent_window::DateWindow, fixture,
            CreateOrReplaceRentWindow,
        },
        domain::{car, manager, rent_date, RentDate},
        query, Command as _,
    };

    use super::{BookDates, ExecutionError};

    async fn schedule(
        svc: &fixture::Service,
        car_id: car::Id,
        n: usize,
    ) -> Vec<RentDate> {
        let dates = (1..=n)
            .map(|d| DateWindow {
                id: None,
                open_date: fixture::date(&format!("2024-05-{d:02}")),
                close_date: fixture::date(&format!("2024-05-{d:02}")),
                price: fixture::money(100),
                description: None,
            })
            .collect();
        svc.execute(CreateOrReplaceRentWindow {
            car_id,
            manager_id: manager::Id::default(),
            dates,
        })
        .await
        .unwrap()
        .dates
    }

    async fn dates_of(
        svc: &fixture::Service,
        car_id: car::Id,
    ) -> Vec<RentDate> {
        svc.execute(query::rent_list::ByCar(car_id))
            .await
            .unwrap()
            .unwrap()
            .dates
    }

    #[tokio::test]
    async fn books_whole_batch() {
        let svc = fixture::service();
        let car_id = fixture::car(&svc).await;
        let customer_id = fixture::customer(&svc).await;
        let dates = schedule(&svc, car_id, 3).await;

        let booked = svc
            .execute(BookDates {
                car_id,
                customer_id,
                date_ids: vec![dates[2].id, dates[0].id],
            })
            .await
            .unwrap();
        assert_eq!(booked.len(), 2);

        let after = dates_of(&svc, car_id).await;
        assert_eq!(after[0].status, rent_date::Status::Booked);
        assert_eq!(after[0].booked_by, Some(customer_id));
        assert_eq!(after[1].status, rent_date::Status::Available);
        assert_eq!(after[2].status, rent_date::Status::Booked);
    }

    #[tokio::test]
    async fn fails_whole_batch_on_booked_date() {
        let svc = fixture::service();
        let car_id = fixture::car(&svc).await;
        let first = fixture::customer(&svc).await;
        let second = fixture::customer(&svc).await;
        let dates = schedule(&svc, car_id, 2).await;
        let (d1, d2) = (dates[0].id, dates[1].id);

        _ = svc
            .execute(BookDates {
                car_id,
                customer_id: first,
                date_ids: vec![d2],
            })
            .await
            .unwrap();

        let err = svc
            .execute(BookDates {
                car_id,
                customer_id: second,
                date_ids: vec![d1, d2],
            })
            .await
            .unwrap_err();
        assert!(
            matches!(err.as_ref(), ExecutionError::DateNotAvailable(id) if *id == d2),
            "{err}",
        );

        let after = dates_of(&svc, car_id).await;
        assert_eq!(after[0].status, rent_date::Status::Available);
        assert_eq!(after[0].booked_by, None);
        assert_eq!(after[1].booked_by, Some(first));
    }

    #[tokio::test]
    async fn fails_whole_batch_on_unknown_date() {
        let svc = fixture::service();
        let car_id = fixture::car(&svc).await;
        let customer_id = fixture::customer(&svc).await;
        let dates = schedule(&svc, car_id, 1).await;

        let err = svc
            .execute(BookDates {
                car_id,
                customer_id,
                date_ids: vec![dates[0].id, rent_date::Id::new()],
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::DateNotExists(_)));

        let after = dates_of(&svc, car_id).await;
        assert!(after[0].is_available());
    }

    #[tokio::test]
    async fn rejects_malformed_batches() {
        let svc = fixture::service();
        let car_id = fixture::car(&svc).await;
        let customer_id = fixture::customer(&svc).await;
        let dates = schedule(&svc, car_id, 1).await;

        let err = svc
            .execute(BookDates {
                car_id,
                customer_id,
                date_ids: vec![],
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NoDates));

        let err = svc
            .execute(BookDates {
                car_id,
                customer_id,
                date_ids: vec![dates[0].id, dates[0].id],
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::DuplicateDate(_)));
    }

    #[tokio::test]
    async fn concurrent_bookings_never_share_dates() {
        let svc = fixture::service();
        let car_id = fixture::car(&svc).await;
        let dates = schedule(&svc, car_id, 2).await;
        let ids = vec![dates[0].id, dates[1].id];

        let mut tasks = Vec::new();
        for _ in 0..4 {
            let svc = svc.clone();
            let customer_id = fixture::customer(&svc).await;
            let date_ids = ids.clone();
            tasks.push(tokio::spawn(async move {
                svc.execute(BookDates {
                    car_id,
                    customer_id,
                    date_ids,
                })
                .await
                .is_ok()
            }));
        }
        let mut succeeded = 0;
        for t in tasks {
            if t.await.unwrap() {
                succeeded += 1;
            }
        }
        assert_eq!(succeeded, 1);

        let after = dates_of(&svc, car_id).await;
        assert_eq!(after[0].booked_by, after[1].booked_by);
    }
}
