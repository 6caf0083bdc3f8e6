//! [`Command`] for creating a new [`SaleList`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{car, employee, manager, sale_list, Car, SaleList},
    infra::{database, Database},
    read::sale_list::Available,
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`SaleList`].
#[derive(Clone, Debug)]
pub struct CreateSaleListing {
    /// ID of the [`Car`] to sell.
    pub car_id: car::Id,

    /// Asked price.
    pub price: Money,

    /// [`sale_list::Description`] of the offer.
    pub description: Option<sale_list::Description>,

    /// ID of the manager owning the new [`SaleList`].
    pub manager_id: manager::Id,

    /// ID of the employee assigned to close the deal.
    pub employee_id: Option<employee::Id>,
}

impl<Db> Command<CreateSaleListing> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Car>, car::Id>>,
            Ok = Option<Car>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<
            Lock<By<SaleList, car::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Available<SaleList>>, car::Id>>,
            Ok = Option<Available<SaleList>>,
            Err = Traced<database::Error>,
        > + Database<Insert<SaleList>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = SaleList;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateSaleListing,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateSaleListing {
            car_id,
            price,
            description,
            manager_id,
            employee_id,
        } = cmd;

        if !price.is_positive() {
            return Err(tracerr::new!(E::InvalidPrice(price)));
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

        tx.execute(Lock(By::<SaleList, _>::new(car_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let available = tx
            .execute(Select(By::<Option<Available<SaleList>>, _>::new(car_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if let Some(Available(list)) = available {
            return Err(tracerr::new!(E::AlreadyListed(list.id)));
        }

        let now = DateTime::now();
        let list = SaleList {
            id: sale_list::Id::new(),
            car_id,
            price,
            description,
            status: sale_list::Status::Available,
            manager_id,
            employee_id,
            created_at: now.coerce(),
            updated_at: now.coerce(),
        };
        tx.execute(Insert(list.clone()))
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

/// Error of [`CreateSaleListing`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Car`] already has an available [`SaleList`].
    #[display("`Car` is already listed for sale by `SaleList(id: {_0})`")]
    AlreadyListed(#[error(not(source))] sale_list::Id),

    /// [`Car`] with the provided ID does not exist.
    #[display("`Car(id: {_0})` does not exist")]
    CarNotExists(#[error(not(source))] car::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Price is not positive.
    #[display("Price must be positive, but `{_0}` provided")]
    InvalidPrice(#[error(not(source))] Money),
}
