//! [`Contract`]-related [`Database`] implementations.

use common::{
    operations::{By, Insert, Select},
    Money,
};
use tracerr::Traced;

use crate::{
    domain::{contract, Contract},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Select<By<Option<Contract>, contract::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Contract>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Contract>, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT id, kind, customer_id, \
                   sale_list_id, employee_id, \
                   rent_list_id, start_date, end_date, \
                   price, price_currency, \
                   created_at \
            FROM contracts \
            WHERE id = $1::UUID";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| {
                let id = row.get("id");
                let customer_id = row.get("customer_id");
                let price = Money {
                    amount: row.get("price"),
                    currency: row.get("price_currency"),
                };
                let created_at = row.get("created_at");
                match row.get("kind") {
                    contract::Kind::Sale => contract::Sale {
                        id,
                        sale_list_id: row.get("sale_list_id"),
                        customer_id,
                        employee_id: row.get("employee_id"),
                        price,
                        created_at,
                    }
                    .into(),
                    contract::Kind::Rent => contract::Rent {
                        id,
                        rent_list_id: row.get("rent_list_id"),
                        customer_id,
                        start_date: row.get("start_date"),
                        end_date: row.get("end_date"),
                        total_price: price,
                        created_at,
                    }
                    .into(),
                }
            }))
    }
}

impl<C> Database<Insert<Contract>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(contract): Insert<Contract>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = contract.id();
        let kind = contract.kind();
        let customer_id = contract.customer_id();
        let price = contract.price();
        let created_at = contract.created_at();

        let (sale_list_id, employee_id) = match &contract {
            Contract::Sale(c) => (Some(c.sale_list_id), Some(c.employee_id)),
            Contract::Rent(_) => (None, None),
        };
        let (rent_list_id, start_date, end_date) = match &contract {
            Contract::Rent(c) => {
                (Some(c.rent_list_id), Some(c.start_date), Some(c.end_date))
            }
            Contract::Sale(_) => (None, None, None),
        };

        const SQL: &str = "\
            INSERT INTO contracts (\
                id, kind, customer_id, \
                sale_list_id, employee_id, \
                rent_list_id, start_date, end_date, \
                price, price_currency, \
                created_at\
            ) VALUES (\
                $1::UUID, $2::INT2, $3::UUID, \
                $4::UUID, $5::UUID, \
                $6::UUID, $7::DATE, $8::DATE, \
                $9::NUMERIC, $10::INT2, \
                $11::TIMESTAMPTZ\
            )";
        self.exec(
            SQL,
            &[
                &id,
                &kind,
                &customer_id,
                &sale_list_id,
                &employee_id,
                &rent_list_id,
                &start_date,
                &end_date,
                &price.amount,
                &price.currency,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}
