//! [`Command`] for defining the rental availability of a [`Car`].

use common::{
    operations::{
        By, Commit, Insert, Lock, Select, Transact, Transacted, Update,
    },
    Date, DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        car, manager, rent_date, rent_list, Car, RentDate, RentList,
    },
    infra::{database, Database},
    read::rent_list::Schedule,
    Service,
};

use super::Command;

/// [`Command`] for defining the rental availability of a [`Car`].
///
/// Creates the [`RentList`] of the [`Car`] if there is none, or re-lists it
/// if any [`DateWindow`]s are provided. Every touched [`RentDate`] ends up
/// [`rent_date::Status::Available`].
#[derive(Clone, Debug)]
pub struct CreateOrReplaceRentWindow {
    /// ID of the [`Car`] to rent out.
    pub car_id: car::Id,

    /// ID of the manager owning the [`RentList`].
    pub manager_id: manager::Id,

    /// [`DateWindow`]s to create or replace.
    pub dates: Vec<DateWindow>,
}

/// Range of days to create or replace a [`RentDate`] with.
#[derive(Clone, Debug)]
pub struct DateWindow {
    /// ID of the existing [`RentDate`] to replace.
    ///
    /// New [`RentDate`] is created if [`None`].
    pub id: Option<rent_date::Id>,

    /// First day of the range.
    pub open_date: Date,

    /// Last day of the range, inclusive.
    pub close_date: Date,

    /// Price of renting for the whole range.
    pub price: Money,

    /// [`rent_date::Description`] of the range.
    pub description: Option<rent_date::Description>,
}

impl<Db> Command<CreateOrReplaceRentWindow> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Car>, car::Id>>,
            Ok = Option<Car>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<
            Lock<By<RentList, car::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<RentDate, Vec<rent_date::Id>>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<RentList>, car::Id>>,
            Ok = Option<RentList>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<RentDate>, rent_list::Id>>,
            Ok = Vec<RentDate>,
            Err = Traced<database::Error>,
        > + Database<Insert<RentList>, Err = Traced<database::Error>>
        + Database<Update<RentList>, Err = Traced<database::Error>>
        + Database<Insert<RentDate>, Err = Traced<database::Error>>
        + Database<Update<RentDate>, Err = Traced<database::Error>>
        + Database<
            Insert<rent_list::RentableDate>,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Schedule;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateOrReplaceRentWindow,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateOrReplaceRentWindow {
            car_id,
            manager_id,
            dates,
        } = cmd;

        for w in &dates {
            if w.open_date > w.close_date {
                return Err(tracerr::new!(E::InvalidRange {
                    open: w.open_date,
                    close: w.close_date,
                }));
            }
            if w.price.amount.is_sign_negative() {
                return Err(tracerr::new!(E::InvalidPrice(w.price)));
            }
        }

        self.database()
            .execute(Select(By::<Option<Car>, _>::new(car_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::CarNotExists(car_id))
            .map_err(tracerr::wrap!())?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::<RentList, _>::new(car_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let now = DateTime::now();

        let list = tx
            .execute(Select(By::<Option<RentList>, _>::new(car_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let list = match list {
            None => {
                let list = RentList {
                    id: rent_list::Id::new(),
                    car_id,
                    manager_id,
                    status: rent_list::Status::ForRent,
                    created_at: now.coerce(),
                };
                tx.execute(Insert(list.clone()))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))
                    .map(drop)?;
                list
            }
            Some(mut list) => {
                if !dates.is_empty()
                    && list.status != rent_list::Status::ForRent
                {
                    list.status = rent_list::Status::ForRent;
                    tx.execute(Update(list.clone()))
                        .await
                        .map_err(tracerr::map_from_and_wrap!(=> E))
                        .map(drop)?;
                }
                list
            }
        };

        let mut replaced = dates.iter().filter_map(|w| w.id).collect::<Vec<_>>();
        replaced.sort_unstable();
        replaced.dedup();
        if !replaced.is_empty() {
            // Avoid racing with concurrent bookings of the replaced dates.
            tx.execute(Lock(By::<RentDate, _>::new(replaced)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        }

        let mut existing = tx
            .execute(Select(By::<Vec<RentDate>, _>::new(list.id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        for w in dates {
            let DateWindow {
                id,
                open_date,
                close_date,
                price,
                description,
            } = w;

            if let Some(id) = id {
                let date = existing
                    .iter_mut()
                    .find(|d| d.id == id)
                    .ok_or(E::DateNotExists(id))
                    .map_err(tracerr::wrap!())?;
                date.open_date = open_date;
                date.close_date = close_date;
                date.price = price;
                date.description = description;
                date.reopen();
                tx.execute(Update(date.clone()))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))
                    .map(drop)?;
            } else {
                let date = RentDate {
                    id: rent_date::Id::new(),
                    open_date,
                    close_date,
                    price,
                    status: rent_date::Status::Available,
                    booked_by: None,
                    description,
                    created_at: now.coerce(),
                    updated_at: now.coerce(),
                };
                tx.execute(Insert(date.clone()))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))
                    .map(drop)?;
                tx.execute(Insert(rent_list::RentableDate {
                    rent_list_id: list.id,
                    date_id: date.id,
                }))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
                existing.push(date);
            }
        }

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        existing.sort_by_key(|d| (d.open_date, d.id));
        Ok(Schedule {
            list,
            dates: existing,
        })
    }
}

/// Error of [`CreateOrReplaceRentWindow`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Car`] with the provided ID does not exist.
    #[display("`Car(id: {_0})` does not exist")]
    CarNotExists(#[error(not(source))] car::Id),

    /// [`RentDate`] with the provided ID does not belong to the [`RentList`].
    #[display("`RentDate(id: {_0})` does not exist")]
    DateNotExists(#[error(not(source))] rent_date::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Price is negative.
    #[display("Price must not be negative, but `{_0}` provided")]
    InvalidPrice(#[error(not(source))] Money),

    /// Range closes before it opens.
    #[display("Range `{open}..={close}` closes before it opens")]
    InvalidRange {
        /// First day of the range.
        open: Date,

        /// Last day of the range.
        close: Date,
    },
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{fixture, BookDates},
        domain::{manager, rent_date, rent_list},
        infra::memory::Access as _,
        query, Command as _,
    };

    use super::{CreateOrReplaceRentWindow, DateWindow, ExecutionError};

    fn window(open: &str, close: &str) -> DateWindow {
        DateWindow {
            id: None,
            open_date: fixture::date(open),
            close_date: fixture::date(close),
            price: fixture::money(1_000),
            description: None,
        }
    }

    #[tokio::test]
    async fn creates_list_with_available_dates() {
        let svc = fixture::service();
        let car_id = fixture::car(&svc).await;

        let schedule = svc
            .execute(CreateOrReplaceRentWindow {
                car_id,
                manager_id: manager::Id::default(),
                dates: vec![
                    window("2024-03-10", "2024-03-12"),
                    window("2024-03-01", "2024-03-05"),
                ],
            })
            .await
            .unwrap();
        assert_eq!(schedule.list.car_id, car_id);
        assert_eq!(schedule.list.status, rent_list::Status::ForRent);
        assert_eq!(schedule.dates.len(), 2);
        assert_eq!(schedule.dates[0].open_date, fixture::date("2024-03-01"));
        assert!(schedule.dates.iter().all(|d| d.is_available()));
    }

    #[tokio::test]
    async fn replacing_booked_date_reopens_it() {
        let svc = fixture::service();
        let car_id = fixture::car(&svc).await;
        let customer_id = fixture::customer(&svc).await;
        let schedule = svc
            .execute(CreateOrReplaceRentWindow {
                car_id,
                manager_id: manager::Id::default(),
                dates: vec![window("2024-03-01", "2024-03-05")],
            })
            .await
            .unwrap();
        let date_id = schedule.dates[0].id;
        _ = svc
            .execute(BookDates {
                car_id,
                customer_id,
                date_ids: vec![date_id],
            })
            .await
            .unwrap();

        let schedule = svc
            .execute(CreateOrReplaceRentWindow {
                car_id,
                manager_id: manager::Id::default(),
                dates: vec![DateWindow {
                    id: Some(date_id),
                    ..window("2024-03-02", "2024-03-06")
                }],
            })
            .await
            .unwrap();
        assert_eq!(schedule.dates.len(), 1);
        let date = &schedule.dates[0];
        assert_eq!(date.id, date_id);
        assert_eq!(date.status, rent_date::Status::Available);
        assert_eq!(date.booked_by, None);
        assert_eq!(date.open_date, fixture::date("2024-03-02"));
    }

    #[tokio::test]
    async fn relists_car_only_with_dates() {
        let svc = fixture::service();
        let car_id = fixture::car(&svc).await;

        let schedule = svc
            .execute(CreateOrReplaceRentWindow {
                car_id,
                manager_id: manager::Id::default(),
                dates: vec![],
            })
            .await
            .unwrap();
        assert_eq!(schedule.list.status, rent_list::Status::ForRent);
        assert!(schedule.dates.is_empty());

        let again = svc
            .execute(CreateOrReplaceRentWindow {
                car_id,
                manager_id: manager::Id::default(),
                dates: vec![],
            })
            .await
            .unwrap();
        assert_eq!(again.list.id, schedule.list.id);
    }

    #[tokio::test]
    async fn rejects_inverted_range() {
        let svc = fixture::service();
        let car_id = fixture::car(&svc).await;

        let err = svc
            .execute(CreateOrReplaceRentWindow {
                car_id,
                manager_id: manager::Id::default(),
                dates: vec![window("2024-03-05", "2024-03-01")],
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::InvalidRange { .. }));
    }

    #[tokio::test]
    async fn rejects_foreign_date() {
        let svc = fixture::service();
        let car_id = fixture::car(&svc).await;

        let err = svc
            .execute(CreateOrReplaceRentWindow {
                car_id,
                manager_id: manager::Id::default(),
                dates: vec![DateWindow {
                    id: Some(rent_date::Id::new()),
                    ..window("2024-03-01", "2024-03-02")
                }],
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::DateNotExists(_)));
    }

    #[tokio::test]
    async fn stores_nothing_if_any_window_fails() {
        let svc = fixture::service();
        let car_id = fixture::car(&svc).await;
        let foreign = rent_date::Id::new();

        let err = svc
            .execute(CreateOrReplaceRentWindow {
                car_id,
                manager_id: manager::Id::default(),
                dates: vec![
                    window("2024-03-01", "2024-03-02"),
                    DateWindow {
                        id: Some(foreign),
                        ..window("2024-03-05", "2024-03-06")
                    },
                ],
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::DateNotExists(id) if *id == foreign,
        ));

        let schedule = svc.execute(query::rent_list::ByCar(car_id)).await.unwrap();
        assert!(schedule.is_none());
        svc.database().read(|t| {
            assert!(t.rent_lists().is_empty());
            assert!(t.rent_dates().is_empty());
        });
    }
}
