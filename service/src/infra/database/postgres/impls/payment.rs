//! [`Payment`]-related [`Database`] implementations.

use common::{
    operations::{By, Delete, Insert, Lock, Select, Update},
    Money,
};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        payment::{self, ContractRef, Proof},
        Payment,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Columns of the `payments` table, in the order expected by [`from_row`].
const COLUMNS: &str = "\
    id, contract_id, contract_kind, method_id, \
    amount, amount_currency, \
    customer_id, employee_id, status, \
    proof_url, proof_method, \
    paid_at, created_at, updated_at";

/// Builds a [`Payment`] out of a [`Row`] having all the [`COLUMNS`].
fn from_row(row: &Row) -> Payment {
    let proof = row
        .get::<_, Option<payment::ProofUrl>>("proof_url")
        .zip(row.get::<_, Option<payment::ProofMethod>>("proof_method"))
        .map(|(url, method)| Proof { url, method });
    Payment {
        id: row.get("id"),
        contract: ContractRef::new(
            row.get("contract_kind"),
            row.get("contract_id"),
        ),
        method_id: row.get("method_id"),
        amount: Money {
            amount: row.get("amount"),
            currency: row.get("amount_currency"),
        },
        customer_id: row.get("customer_id"),
        employee_id: row.get("employee_id"),
        status: row.get("status"),
        proof,
        paid_at: row.get("paid_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

impl<C> Database<Select<By<Option<Payment>, payment::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Payment>, payment::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM payments \
             WHERE id = $1::UUID"
        );
        Ok(self
            .query_opt(&sql, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Insert<Payment>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Payment>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(payment): Insert<Payment>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(payment)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Payment>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(payment): Update<Payment>,
    ) -> Result<Self::Ok, Self::Err> {
        let Payment {
            id,
            contract,
            method_id,
            amount,
            customer_id,
            employee_id,
            status,
            proof,
            paid_at,
            created_at,
            updated_at,
        } = payment;
        let (proof_url, proof_method) =
            proof.map(|p| (p.url, p.method)).unzip();

        const SQL: &str = "\
            INSERT INTO payments (\
                id, contract_id, contract_kind, method_id, \
                amount, amount_currency, \
                customer_id, employee_id, status, \
                proof_url, proof_method, \
                paid_at, created_at, updated_at\
            ) VALUES (\
                $1::UUID, $2::UUID, $3::INT2, $4::UUID, \
                $5::NUMERIC, $6::INT2, \
                $7::UUID, $8::UUID, $9::INT2, \
                $10::VARCHAR, $11::VARCHAR, \
                $12::TIMESTAMPTZ, $13::TIMESTAMPTZ, $14::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET method_id = EXCLUDED.method_id, \
                amount = EXCLUDED.amount, \
                amount_currency = EXCLUDED.amount_currency, \
                employee_id = EXCLUDED.employee_id, \
                status = EXCLUDED.status, \
                proof_url = EXCLUDED.proof_url, \
                proof_method = EXCLUDED.proof_method, \
                paid_at = EXCLUDED.paid_at, \
                updated_at = EXCLUDED.updated_at";
        self.exec(
            SQL,
            &[
                &id,
                &contract.id(),
                &contract.kind(),
                &method_id,
                &amount.amount,
                &amount.currency,
                &customer_id,
                &employee_id,
                &status,
                &proof_url,
                &proof_method,
                &paid_at,
                &created_at,
                &updated_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Delete<By<Payment, payment::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Payment, payment::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM payments \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<Payment, payment::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Payment, payment::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM payments \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C>
    Database<
        Select<By<read::payment::list::Page, read::payment::list::Selector>>,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = read::payment::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::payment::list::Page, read::payment::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::payment::list::Selector {
            arguments,
            filter: read::payment::list::Filter { customer_id },
        } = by.into_inner();

        let limit = i32::try_from(arguments.limit() + 1).unwrap_or(i32::MAX);

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![&limit];

        let customer_idx = customer_id.as_ref().map(|c| {
            ps.push(c);
            ps.len()
        });
        let cursor_idx = arguments.cursor().map(|c| {
            ps.push(c);
            ps.len()
        });

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM payments \
             WHERE TRUE \
                   {customer} \
                   {cursor} \
             ORDER BY id ASC \
             LIMIT $1::INT4",
            customer = customer_idx.into_iter().format_with("", |idx, f| {
                f(&format_args!("AND customer_id = ${idx}::UUID"))
            }),
            cursor = cursor_idx.into_iter().format_with("", |idx, f| {
                f(&format_args!("AND id > ${idx}::UUID"))
            }),
        );
        let rows = self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?;

        Ok(read::payment::list::Page::from_overfetched(
            &arguments,
            rows.iter().map(from_row).map(|p| (p.id, p)),
        ))
    }
}
