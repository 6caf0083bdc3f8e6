//! [`Command`] for attaching a [`Proof`] to a [`Payment`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        payment::{self, Proof},
        Payment,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for attaching a [`Proof`] to a [`Payment`].
///
/// The [`Payment`] goes back to [`payment::Status::Pending`] awaiting
/// verification of the new [`Proof`]. [`payment::Status::Confirmed`]
/// [`Payment`]s cannot be changed.
#[derive(Clone, Debug)]
pub struct AttachPaymentProof {
    /// ID of the [`Payment`] to attach the [`Proof`] to.
    pub payment_id: payment::Id,

    /// [`Proof`] to attach.
    pub proof: Proof,
}

impl<Db> Command<AttachPaymentProof> for Service<Db>
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
        cmd: AttachPaymentProof,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AttachPaymentProof { payment_id, proof } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::<Payment, _>::new(payment_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut payment = tx
            .execute(Select(By::<Option<Payment>, _>::new(payment_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::NotExists(payment_id))
            .map_err(tracerr::wrap!())?;
        if payment.status == payment::Status::Confirmed {
            return Err(tracerr::new!(E::AlreadyConfirmed(payment_id)));
        }

        payment.proof = Some(proof);
        payment.status = payment::Status::Pending;
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

/// Error of [`AttachPaymentProof`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Payment`] is confirmed already.
    #[display("`Payment(id: {_0})` is confirmed already")]
    AlreadyConfirmed(#[error(not(source))] payment::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Payment`] with the provided ID does not exist.
    #[display("`Payment(id: {_0})` does not exist")]
    NotExists(#[error(not(source))] payment::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{fixture, UpdatePaymentStatus},
        domain::payment::{self, Proof, ProofMethod, ProofUrl},
        Command as _,
    };

    use super::{AttachPaymentProof, ExecutionError};

    fn proof() -> Proof {
        Proof {
            url: ProofUrl::new("/uploads/slip-1.png").unwrap(),
            method: ProofMethod::new("bank_slip").unwrap(),
        }
    }

    #[tokio::test]
    async fn attaches_proof_and_resets_status() {
        let svc = fixture::service();
        let id = fixture::payment(&svc).await;
        _ = svc
            .execute(UpdatePaymentStatus {
                id,
                status: payment::Status::Rejected,
            })
            .await
            .unwrap();

        let payment = svc
            .execute(AttachPaymentProof {
                payment_id: id,
                proof: proof(),
            })
            .await
            .unwrap();
        assert_eq!(payment.status, payment::Status::Pending);
        assert_eq!(payment.proof, Some(proof()));
    }

    #[tokio::test]
    async fn keeps_confirmed_payment_intact() {
        let svc = fixture::service();
        let id = fixture::payment(&svc).await;
        _ = svc
            .execute(UpdatePaymentStatus {
                id,
                status: payment::Status::Confirmed,
            })
            .await
            .unwrap();

        let err = svc
            .execute(AttachPaymentProof {
                payment_id: id,
                proof: proof(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::AlreadyConfirmed(_)));
    }

    #[tokio::test]
    async fn fails_on_unknown_payment() {
        let svc = fixture::service();

        let err = svc
            .execute(AttachPaymentProof {
                payment_id: payment::Id::new(),
                proof: proof(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotExists(_)));
    }
}
