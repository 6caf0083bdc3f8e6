//! [`Booking`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select};
use tracerr::Traced;

use crate::{
    domain::{customer, sale_list, Booking},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Select<By<Option<Booking>, (customer::Id, sale_list::Id)>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Booking>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Booking>, (customer::Id, sale_list::Id)>>,
    ) -> Result<Self::Ok, Self::Err> {
        let (customer_id, sale_list_id) = by.into_inner();

        const SQL: &str = "\
            SELECT id, customer_id, sale_list_id, created_at \
            FROM bookings \
            WHERE customer_id = $1::UUID \
              AND sale_list_id = $2::UUID";
        Ok(self
            .query_opt(SQL, &[&customer_id, &sale_list_id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| Booking {
                id: row.get("id"),
                customer_id: row.get("customer_id"),
                sale_list_id: row.get("sale_list_id"),
                created_at: row.get("created_at"),
            }))
    }
}

impl<C> Database<Insert<Booking>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(booking): Insert<Booking>,
    ) -> Result<Self::Ok, Self::Err> {
        let Booking {
            id,
            customer_id,
            sale_list_id,
            created_at,
        } = booking;

        const SQL: &str = "\
            INSERT INTO bookings (\
                id, customer_id, sale_list_id, created_at\
            ) VALUES (\
                $1::UUID, $2::UUID, $3::UUID, $4::TIMESTAMPTZ\
            )";
        self.exec(SQL, &[&id, &customer_id, &sale_list_id, &created_at])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
