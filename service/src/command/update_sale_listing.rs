//! [`Command`] for updating an existing [`SaleList`].

use common::{
    operations::{
        By, Commit, Lock, Select, Transact, Transacted, Update,
    },
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{car, employee, sale_list, SaleList},
    infra::{database, Database},
    read::sale_list::Available,
    Service,
};
#[cfg(doc)]
use crate::domain::Car;

use super::Command;

/// [`Command`] for updating an existing [`SaleList`].
///
/// Only the provided fields are changed.
#[derive(Clone, Debug)]
pub struct UpdateSaleListing {
    /// ID of the [`SaleList`] to update.
    pub id: sale_list::Id,

    /// New asked price.
    pub price: Option<Money>,

    /// New [`sale_list::Description`].
    pub description: Option<sale_list::Description>,

    /// ID of the newly assigned employee.
    pub employee_id: Option<employee::Id>,

    /// New [`sale_list::Status`].
    pub status: Option<sale_list::Status>,
}

impl<Db> Command<UpdateSaleListing> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<SaleList>, sale_list::Id>>,
            Ok = Option<SaleList>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<
            Lock<By<SaleList, car::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<SaleList>, sale_list::Id>>,
            Ok = Option<SaleList>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Available<SaleList>>, car::Id>>,
            Ok = Option<Available<SaleList>>,
            Err = Traced<database::Error>,
        > + Database<Update<SaleList>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = SaleList;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdateSaleListing,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateSaleListing {
            id,
            price,
            description,
            employee_id,
            status,
        } = cmd;

        if let Some(price) = price.filter(|p| !p.is_positive()) {
            return Err(tracerr::new!(E::InvalidPrice(price)));
        }

        let car_id = self
            .database()
            .execute(Select(By::<Option<SaleList>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::NotExists(id))
            .map_err(tracerr::wrap!())?
            .car_id;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::<SaleList, _>::new(car_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        // Re-read under the lock, as the `SaleList` may have been sold
        // meanwhile.
        let mut list = tx
            .execute(Select(By::<Option<SaleList>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::NotExists(id))
            .map_err(tracerr::wrap!())?;

        if let Some(next) = status {
            if !list.status.can_become(next) {
                return Err(tracerr::new!(E::InvalidTransition {
                    from: list.status,
                    to: next,
                }));
            }
            if next == sale_list::Status::Available && !list.is_available() {
                let other = tx
                    .execute(Select(
                        By::<Option<Available<SaleList>>, _>::new(car_id),
                    ))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?;
                if let Some(Available(other)) = other {
                    return Err(tracerr::new!(E::AlreadyListed(other.id)));
                }
            }
            list.status = next;
        }
        if let Some(price) = price {
            list.price = price;
        }
        if let Some(description) = description {
            list.description = Some(description);
        }
        if let Some(employee_id) = employee_id {
            list.employee_id = Some(employee_id);
        }
        list.updated_at = DateTime::now().coerce();

        tx.execute(Update(list.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(list)
    }
}

/// Error of [`UpdateSaleListing`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// Another [`SaleList`] of the same [`Car`] is available already.
    #[display("`Car` is already listed for sale by `SaleList(id: {_0})`")]
    AlreadyListed(#[error(not(source))] sale_list::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Price is not positive.
    #[display("Price must be positive, but `{_0}` provided")]
    InvalidPrice(#[error(not(source))] Money),

    /// [`sale_list::Status`] cannot be changed this way.
    #[display("`SaleList` cannot become `{to}` from `{from}`")]
    InvalidTransition {
        /// Current [`sale_list::Status`].
        from: sale_list::Status,

        /// Requested [`sale_list::Status`].
        to: sale_list::Status,
    },

    /// [`SaleList`] with the provided ID does not exist.
    #[display("`SaleList(id: {_0})` does not exist")]
    NotExists(#[error(not(source))] sale_list::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{fixture, CreateSaleListing},
        domain::{manager, sale_list},
        Command as _,
    };

    use super::{ExecutionError, UpdateSaleListing};

    fn update(id: sale_list::Id) -> UpdateSaleListing {
        UpdateSaleListing {
            id,
            price: None,
            description: None,
            employee_id: None,
            status: None,
        }
    }

    async fn listing(
        svc: &fixture::Service,
        car_id: crate::domain::car::Id,
    ) -> sale_list::Id {
        svc.execute(CreateSaleListing {
            car_id,
            price: fixture::money(100),
            description: None,
            manager_id: manager::Id::default(),
            employee_id: None,
        })
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn updates_only_provided_fields() {
        let svc = fixture::service();
        let car_id = fixture::car(&svc).await;
        let id = listing(&svc, car_id).await;

        let list = svc
            .execute(UpdateSaleListing {
                price: Some(fixture::money(150)),
                status: Some(sale_list::Status::Reserved),
                ..update(id)
            })
            .await
            .unwrap();
        assert_eq!(list.price, fixture::money(150));
        assert_eq!(list.status, sale_list::Status::Reserved);
        assert_eq!(list.description, None);
        assert_eq!(list.employee_id, None);
    }

    #[tokio::test]
    async fn sold_listing_is_final() {
        let svc = fixture::service();
        let car_id = fixture::car(&svc).await;
        let id = listing(&svc, car_id).await;

        _ = svc
            .execute(UpdateSaleListing {
                status: Some(sale_list::Status::Sold),
                ..update(id)
            })
            .await
            .unwrap();
        let err = svc
            .execute(UpdateSaleListing {
                status: Some(sale_list::Status::Available),
                ..update(id)
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::InvalidTransition { .. },
        ));
    }

    #[tokio::test]
    async fn reopening_conflicts_with_available_listing() {
        let svc = fixture::service();
        let car_id = fixture::car(&svc).await;
        let old = listing(&svc, car_id).await;

        _ = svc
            .execute(UpdateSaleListing {
                status: Some(sale_list::Status::Withdrawn),
                ..update(old)
            })
            .await
            .unwrap();
        let new = listing(&svc, car_id).await;

        let err = svc
            .execute(UpdateSaleListing {
                status: Some(sale_list::Status::Available),
                ..update(old)
            })
            .await
            .unwrap_err();
        assert!(
            matches!(err.as_ref(), ExecutionError::AlreadyListed(id) if *id == new),
            "{err}",
        );
    }

    #[tokio::test]
    async fn fails_on_unknown_listing() {
        let svc = fixture::service();

        let err = svc
            .execute(update(sale_list::Id::new()))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotExists(_)));
    }
}
