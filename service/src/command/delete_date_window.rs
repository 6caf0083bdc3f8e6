//! [`Command`] for removing a [`RentDate`].

use common::operations::{By, Commit, Delete, Lock, Transact, Transacted};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{rent_date, rent_list, RentDate},
    infra::{database, Database},
    Service,
};
#[cfg(doc)]
use crate::domain::RentList;

use super::Command;

/// [`Command`] for removing a [`RentDate`] along with its links to
/// [`RentList`]s.
///
/// Succeeds even if there is no such [`RentDate`].
#[derive(Clone, Copy, Debug)]
pub struct DeleteDateWindow {
    /// ID of the [`RentDate`] to remove.
    pub id: rent_date::Id,
}

impl<Db> Command<DeleteDateWindow> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<RentDate, [rent_date::Id; 1]>>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<rent_list::RentableDate, rent_date::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<RentDate, rent_date::Id>>,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        DeleteDateWindow { id }: DeleteDateWindow,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::<RentDate, _>::new([id])))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Delete(By::<rent_list::RentableDate, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Delete(By::<RentDate, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)
    }
}

/// Error of [`DeleteDateWindow`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{
            create_or_replace_rent_window::DateWindow, fixture,
            CreateOrReplaceRentWindow,
        },
        domain::{manager, rent_date},
        query, Command as _,
    };

    use super::DeleteDateWindow;

    #[tokio::test]
    async fn removes_date_from_schedule() {
        let svc = fixture::service();
        let car_id = fixture::car(&svc).await;
        let window = |d: &str| DateWindow {
            id: None,
            open_date: fixture::date(d),
            close_date: fixture::date(d),
            price: fixture::money(50),
            description: None,
        };
        let schedule = svc
            .execute(CreateOrReplaceRentWindow {
                car_id,
                manager_id: manager::Id::default(),
                dates: vec![window("2024-06-01"), window("2024-06-02")],
            })
            .await
            .unwrap();
        let removed = schedule.dates[0].id;

        svc.execute(DeleteDateWindow { id: removed }).await.unwrap();

        let after = svc
            .execute(query::rent_list::ByCar(car_id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after.dates.len(), 1);
        assert_ne!(after.dates[0].id, removed);
    }

    #[tokio::test]
    async fn succeeds_on_unknown_date() {
        let svc = fixture::service();

        svc.execute(DeleteDateWindow {
            id: rent_date::Id::new(),
        })
        .await
        .unwrap();
    }
}
