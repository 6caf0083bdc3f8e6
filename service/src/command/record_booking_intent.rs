//! [`Command`] for recording a [`Customer`]'s interest in a [`SaleList`].

use common::{
    operations::{By, Insert, Select},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{booking, customer, sale_list, Booking, Customer, SaleList},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for recording a [`Customer`]'s interest in a [`SaleList`].
///
/// A [`Booking`] is advisory only: it neither changes the [`SaleList`]
/// status nor prevents other [`Customer`]s from booking the same
/// [`SaleList`].
#[derive(Clone, Copy, Debug)]
pub struct RecordBookingIntent {
    /// ID of the interested [`Customer`].
    pub customer_id: customer::Id,

    /// ID of the [`SaleList`] of interest.
    pub sale_list_id: sale_list::Id,
}

impl<Db> Command<RecordBookingIntent> for Service<Db>
where
    Db: Database<
            Select<By<Option<Customer>, customer::Id>>,
            Ok = Option<Customer>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<SaleList>, sale_list::Id>>,
            Ok = Option<SaleList>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Booking>, (customer::Id, sale_list::Id)>>,
            Ok = Option<Booking>,
            Err = Traced<database::Error>,
        > + Database<Insert<Booking>, Err = Traced<database::Error>>,
{
    type Ok = Booking;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: RecordBookingIntent,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RecordBookingIntent {
            customer_id,
            sale_list_id,
        } = cmd;

        self.database()
            .execute(Select(By::<Option<Customer>, _>::new(customer_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::CustomerNotExists(customer_id))
            .map_err(tracerr::wrap!())?;

        self.database()
            .execute(Select(By::<Option<SaleList>, _>::new(sale_list_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::SaleListNotExists(sale_list_id))
            .map_err(tracerr::wrap!())?;

        let booking = Booking {
            id: booking::Id::new(),
            customer_id,
            sale_list_id,
            created_at: DateTime::now().coerce(),
        };
        let inserted = self.database().execute(Insert(booking.clone())).await;
        if inserted.as_ref().is_err_and(|e| {
            e.as_ref()
                .is_unique_violation(Some("bookings_customer_sale_list_key"))
        }) {
            let existing = self
                .database()
                .execute(Select(By::<Option<Booking>, _>::new((
                    customer_id,
                    sale_list_id,
                ))))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            if let Some(existing) = existing {
                return Err(tracerr::new!(E::AlreadyBooked(existing.id)));
            }
        }
        inserted
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(booking)
    }
}

/// Error of [`RecordBookingIntent`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Booking`] for the same [`Customer`] and [`SaleList`] exists already.
    #[display("`Customer` has booked the `SaleList` already")]
    AlreadyBooked(#[error(not(source))] booking::Id),

    /// [`Customer`] with the provided ID does not exist.
    #[display("`Customer(id: {_0})` does not exist")]
    CustomerNotExists(#[error(not(source))] customer::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`SaleList`] with the provided ID does not exist.
    #[display("`SaleList(id: {_0})` does not exist")]
    SaleListNotExists(#[error(not(source))] sale_list::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{fixture, CreateSaleListing},
        domain::{manager, sale_list},
        infra::memory::Access as _,
        Command as _,
    };

    use super::{ExecutionError, RecordBookingIntent};

    #[tokio::test]
    async fn books_pair_only_once() {
        let svc = fixture::service();
        let car_id = fixture::car(&svc).await;
        let customer_id = fixture::customer(&svc).await;
        let list = svc
            .execute(CreateSaleListing {
                car_id,
                price: fixture::money(10),
                description: None,
                manager_id: manager::Id::default(),
                employee_id: None,
            })
            .await
            .unwrap();
        let cmd = RecordBookingIntent {
            customer_id,
            sale_list_id: list.id,
        };

        let booking = svc.execute(cmd).await.unwrap();
        assert_eq!(booking.customer_id, customer_id);

        let err = svc.execute(cmd).await.unwrap_err();
        assert!(
            matches!(err.as_ref(), ExecutionError::AlreadyBooked(id) if *id == booking.id),
            "{err}",
        );
        let stored = svc
            .database()
            .read(|t| t.bookings().keys().copied().collect::<Vec<_>>());
        assert_eq!(stored, [booking.id]);
    }

    #[tokio::test]
    async fn other_customers_may_book_too() {
        let svc = fixture::service();
        let car_id = fixture::car(&svc).await;
        let list = svc
            .execute(CreateSaleListing {
                car_id,
                price: fixture::money(10),
                description: None,
                manager_id: manager::Id::default(),
                employee_id: None,
            })
            .await
            .unwrap();

        for _ in 0..2 {
            let customer_id = fixture::customer(&svc).await;
            _ = svc
                .execute(RecordBookingIntent {
                    customer_id,
                    sale_list_id: list.id,
                })
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn fails_on_unknown_references() {
        let svc = fixture::service();
        let customer_id = fixture::customer(&svc).await;

        let err = svc
            .execute(RecordBookingIntent {
                customer_id,
                sale_list_id: sale_list::Id::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::SaleListNotExists(_)));
    }
}
