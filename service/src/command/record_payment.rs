//! [`Command`] for recording a new [`Payment`].

use common::{
    operations::{By, Insert, Select},
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        contract, customer, employee,
        payment::{self, ContractRef},
        Contract, Customer, Payment,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for recording a new [`Payment`] of a [`Contract`].
#[derive(Clone, Copy, Debug)]
pub struct RecordPayment {
    /// [`Contract`] being paid.
    pub contract: ContractRef,

    /// ID of the payment method used.
    pub method_id: payment::MethodId,

    /// Paid amount.
    pub amount: Money,

    /// ID of the paying [`Customer`].
    pub customer_id: customer::Id,

    /// ID of the employee accepting the [`Payment`].
    pub employee_id: Option<employee::Id>,

    /// Initial [`payment::Status`].
    ///
    /// [`payment::Status::Pending`] if [`None`].
    pub status: Option<payment::Status>,

    /// [`DateTime`] when the [`Payment`] was made.
    ///
    /// Now, if [`None`].
    pub paid_at: Option<payment::PaymentDateTime>,
}

impl<Db> Command<RecordPayment> for Service<Db>
where
    Db: Database<
            Select<By<Option<Contract>, contract::Id>>,
            Ok = Option<Contract>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Customer>, customer::Id>>,
            Ok = Option<Customer>,
            Err = Traced<database::Error>,
        > + Database<Insert<Payment>, Err = Traced<database::Error>>,
{
    type Ok = Payment;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: RecordPayment,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RecordPayment {
            contract,
            method_id,
            amount,
            customer_id,
            employee_id,
            status,
            paid_at,
        } = cmd;

        if !amount.is_positive() {
            return Err(tracerr::new!(E::InvalidAmount(amount)));
        }

        self.database()
            .execute(Select(By::<Option<Contract>, _>::new(contract.id())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|c| c.kind() == contract.kind())
            .ok_or(E::ContractNotExists(contract.id()))
            .map_err(tracerr::wrap!())?;

        self.database()
            .execute(Select(By::<Option<Customer>, _>::new(customer_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::CustomerNotExists(customer_id))
            .map_err(tracerr::wrap!())?;

        let now = DateTime::now();
        let payment = Payment {
            id: payment::Id::new(),
            contract,
            method_id,
            amount,
            customer_id,
            employee_id,
            status: status.unwrap_or(payment::Status::Pending),
            proof: None,
            paid_at: paid_at.unwrap_or(now.coerce()),
            created_at: now.coerce(),
            updated_at: now.coerce(),
        };
        self.database()
            .execute(Insert(payment.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(payment)
    }
}

/// Error of [`RecordPayment`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Contract`] of the referenced kind does not exist.
    #[display("`Contract(id: {_0})` does not exist")]
    ContractNotExists(#[error(not(source))] contract::Id),

    /// [`Customer`] with the provided ID does not exist.
    #[display("`Customer(id: {_0})` does not exist")]
    CustomerNotExists(#[error(not(source))] customer::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Amount is not positive.
    #[display("Amount must be positive, but `{_0}` provided")]
    InvalidAmount(#[error(not(source))] Money),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::fixture,
        domain::{
            contract,
            payment::{self, ContractRef},
        },
        query, Command as _,
    };

    use super::{ExecutionError, RecordPayment};

    fn cmd(
        contract: ContractRef,
        customer_id: crate::domain::customer::Id,
    ) -> RecordPayment {
        RecordPayment {
            contract,
            method_id: payment::MethodId::default(),
            amount: fixture::money(250),
            customer_id,
            employee_id: None,
            status: None,
            paid_at: None,
        }
    }

    #[tokio::test]
    async fn records_pending_payment() {
        let svc = fixture::service();
        let (contract, customer_id) = fixture::sale_contract(&svc).await;

        let payment = svc
            .execute(cmd(ContractRef::Sale(contract), customer_id))
            .await
            .unwrap();
        assert_eq!(payment.status, payment::Status::Pending);
        assert_eq!(payment.proof, None);

        let stored = svc
            .execute(query::payment::ById::by(payment.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.contract, ContractRef::Sale(contract));
        assert_eq!(stored.amount, payment.amount);
    }

    #[tokio::test]
    async fn keeps_provided_status() {
        let svc = fixture::service();
        let (contract, customer_id) = fixture::sale_contract(&svc).await;

        let payment = svc
            .execute(RecordPayment {
                status: Some(payment::Status::Confirmed),
                ..cmd(ContractRef::Sale(contract), customer_id)
            })
            .await
            .unwrap();
        assert_eq!(payment.status, payment::Status::Confirmed);
    }

    #[tokio::test]
    async fn rejects_contract_of_other_kind() {
        let svc = fixture::service();
        let (contract, customer_id) = fixture::sale_contract(&svc).await;

        let err = svc
            .execute(cmd(ContractRef::Rent(contract), customer_id))
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::ContractNotExists(_),
        ));

        let err = svc
            .execute(cmd(ContractRef::Sale(contract::Id::new()), customer_id))
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::ContractNotExists(_),
        ));
    }

    #[tokio::test]
    async fn rejects_non_positive_amount() {
        let svc = fixture::service();
        let (contract, customer_id) = fixture::sale_contract(&svc).await;

        let err = svc
            .execute(RecordPayment {
                amount: fixture::money(0),
                ..cmd(ContractRef::Sale(contract), customer_id)
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::InvalidAmount(_)));
    }
}
