//! [`Command`] for buying a [`Car`] by issuing a [`contract::Sale`].

use common::{
    operations::{
        By, Commit, Insert, Lock, Select, Transact, Transacted, Update,
    },
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{car, contract, customer, employee, sale_list, Customer, SaleList},
    infra::{database, Database},
    read::sale_list::Available,
    Service,
};
#[cfg(doc)]
use crate::domain::{Car, Contract};

use super::Command;

/// [`Command`] for buying a [`Car`] by issuing a [`contract::Sale`].
///
/// The available [`SaleList`] of the [`Car`] becomes
/// [`sale_list::Status::Sold`] along with the [`Contract`] creation.
#[derive(Clone, Copy, Debug)]
pub struct IssueSaleContract {
    /// ID of the [`Car`] to buy.
    pub car_id: car::Id,

    /// ID of the [`Customer`] buying the [`Car`].
    pub customer_id: customer::Id,

    /// ID of the employee closing the deal.
    ///
    /// Used only if the [`SaleList`] has no employee assigned.
    pub employee_id: Option<employee::Id>,
}

impl<Db> Command<IssueSaleContract> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Customer>, customer::Id>>,
            Ok = Option<Customer>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<
            Lock<By<SaleList, car::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Available<SaleList>>, car::Id>>,
            Ok = Option<Available<SaleList>>,
            Err = Traced<database::Error>,
        > + Database<Insert<contract::Contract>, Err = Traced<database::Error>>
        + Database<Update<SaleList>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = contract::Sale;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: IssueSaleContract,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let IssueSaleContract {
            car_id,
            customer_id,
            employee_id,
        } = cmd;

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

        // Avoid selling the same `Car` twice.
        tx.execute(Lock(By::<SaleList, _>::new(car_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let Available(mut list) = tx
            .execute(Select(By::<Option<Available<SaleList>>, _>::new(car_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::NoAvailableListing(car_id))
            .map_err(tracerr::wrap!())?;

        let employee_id = list
            .employee_id
            .or(employee_id)
            .ok_or(E::NoEmployee(list.id))
            .map_err(tracerr::wrap!())?;

        let now = DateTime::now();
        let contract = contract::Sale {
            id: contract::Id::new(),
            sale_list_id: list.id,
            customer_id,
            employee_id,
            price: list.price,
            created_at: now.coerce(),
        };
        tx.execute(Insert(contract.clone().into()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        list.status = sale_list::Status::Sold;
        list.updated_at = now.coerce();
        tx.execute(Update(list))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            contract.id = %contract.id,
            sale_list.id = %contract.sale_list_id,
            "`Car(id: {car_id})` sold",
        );

        Ok(contract)
    }
}

/// Error of [`IssueSaleContract`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Customer`] with the provided ID does not exist.
    #[display("`Customer(id: {_0})` does not exist")]
    CustomerNotExists(#[error(not(source))] customer::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Car`] has no available [`SaleList`].
    #[display("`Car(id: {_0})` has no available `SaleList`")]
    NoAvailableListing(#[error(not(source))] car::Id),

    /// Neither the [`SaleList`] nor the caller specify an employee.
    #[display("No employee to close `SaleList(id: {_0})`")]
    NoEmployee(#[error(not(source))] sale_list::Id),
}

#[cfg(test)]
mod spec {
    use common::{operations::Insert, DateTime};

    use crate::{
        command::{fixture, CreateSaleListing},
        domain::{contract, employee, manager, sale_list, Contract},
        infra::{memory::Access as _, Database as _},
        query, Command as _,
    };

    use super::{ExecutionError, IssueSaleContract};

    #[tokio::test]
    async fn sells_available_listing_once() {
        let svc = fixture::service();
        let car_id = fixture::car(&svc).await;
        let customer_id = fixture::customer(&svc).await;
        let assigned = employee::Id::new();
        let list = svc
            .execute(CreateSaleListing {
                car_id,
                price: fixture::money(900),
                description: None,
                manager_id: manager::Id::default(),
                employee_id: Some(assigned),
            })
            .await
            .unwrap();

        let caller = employee::Id::new();
        let cmd = IssueSaleContract {
            car_id,
            customer_id,
            employee_id: Some(caller),
        };
        let sale = svc.execute(cmd).await.unwrap();
        assert_eq!(sale.sale_list_id, list.id);
        assert_eq!(sale.employee_id, assigned, "listing employee wins");
        assert_eq!(sale.price, list.price);

        let list = svc
            .execute(query::sale_listing::ById::by(list.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(list.status, sale_list::Status::Sold);

        let stored = svc
            .execute(query::contract::ById::by(sale.id))
            .await
            .unwrap();
        assert!(matches!(stored, Some(Contract::Sale(c)) if c.id == sale.id));

        let err = svc.execute(cmd).await.unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::NoAvailableListing(_),
        ));
    }

    #[tokio::test]
    async fn falls_back_to_caller_employee() {
        let svc = fixture::service();
        let car_id = fixture::car(&svc).await;
        let customer_id = fixture::customer(&svc).await;
        let list = svc
            .execute(CreateSaleListing {
                car_id,
                price: fixture::money(900),
                description: None,
                manager_id: manager::Id::default(),
                employee_id: None,
            })
            .await
            .unwrap();

        let err = svc
            .execute(IssueSaleContract {
                car_id,
                customer_id,
                employee_id: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NoEmployee(id) if *id == list.id));

        let caller = employee::Id::new();
        let sale = svc
            .execute(IssueSaleContract {
                car_id,
                customer_id,
                employee_id: Some(caller),
            })
            .await
            .unwrap();
        assert_eq!(sale.employee_id, caller);
    }

    #[tokio::test]
    async fn fails_without_available_listing() {
        let svc = fixture::service();
        let car_id = fixture::car(&svc).await;
        let customer_id = fixture::customer(&svc).await;

        let err = svc
            .execute(IssueSaleContract {
                car_id,
                customer_id,
                employee_id: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::NoAvailableListing(_),
        ));

        assert!(svc.database().read(|t| t.contracts().is_empty()));
    }

    #[tokio::test]
    async fn keeps_listing_available_if_contract_fails() {
        let svc = fixture::service();
        let car_id = fixture::car(&svc).await;
        let customer_id = fixture::customer(&svc).await;
        let employee_id = employee::Id::new();
        let list = svc
            .execute(CreateSaleListing {
                car_id,
                price: fixture::money(900),
                description: None,
                manager_id: manager::Id::default(),
                employee_id: Some(employee_id),
            })
            .await
            .unwrap();

        // Occupies the listing on the contracts side only.
        let stray = contract::Sale {
            id: contract::Id::new(),
            sale_list_id: list.id,
            customer_id,
            employee_id,
            price: list.price,
            created_at: DateTime::now().coerce(),
        };
        svc.database()
            .execute(Insert(Contract::from(stray.clone())))
            .await
            .unwrap();

        let err = svc
            .execute(IssueSaleContract {
                car_id,
                customer_id,
                employee_id: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::Db(e)
                if e.is_unique_violation(Some("contracts_sale_list_id_key")),
        ));

        let list = svc
            .execute(query::sale_listing::ById::by(list.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(list.status, sale_list::Status::Available);
        let ids = svc
            .database()
            .read(|t| t.contracts().keys().copied().collect::<Vec<_>>());
        assert_eq!(ids, [stray.id]);
    }
}
