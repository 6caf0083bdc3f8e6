//! [`Command`] for changing the [`payment::Status`] of a [`Payment`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{payment, Payment},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for changing the [`payment::Status`] of a [`Payment`].
#[derive(Clone, Copy, Debug)]
pub struct UpdatePaymentStatus {
    /// ID of the [`Payment`] to update.
    pub id: payment::Id,

    /// New [`payment::Status`].
    pub status: payment::Status,
}

impl<Db> Command<UpdatePaymentStatus> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Payment, payment::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Payment>, payment::Id>>,
            Ok = Option<Payment>,
            Err = Traced<database::Error>,
        > + Database<Update<Payment>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Payment;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        UpdatePaymentStatus { id, status }: UpdatePaymentStatus,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::<Payment, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut payment = tx
            .execute(Select(By::<Option<Payment>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::NotExists(id))
            .map_err(tracerr::wrap!())?;
        if !payment.status.can_become(status) {
            return Err(tracerr::new!(E::InvalidTransition {
                from: payment.status,
                to: status,
            }));
        }
        if payment.status == status {
            return Ok(payment);
        }

        payment.status = status;
        payment.updated_at = DateTime::now().coerce();
        tx.execute(Update(payment.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(payment)
    }
}

/// Error of [`UpdatePaymentStatus`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`payment::Status`] cannot be changed this way.
    #[display("`Payment` cannot become `{to}` from `{from}`")]
    InvalidTransition {
        /// Current [`payment::Status`].
        from: payment::Status,

        /// Requested [`payment::Status`].
        to: payment::Status,
    },

    /// [`Payment`] with the provided ID does not exist.
    #[display("`Payment(id: {_0})` does not exist")]
    NotExists(#[error(not(source))] payment::Id),
}
