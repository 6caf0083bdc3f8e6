//! [`RentDate`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::{
    operations::{By, Delete, Insert, Lock, Select, Update},
    Money,
};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{rent_date, rent_list, RentDate},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Builds a [`RentDate`] out of a [`Row`] of the `rent_dates` table.
fn from_row(row: &Row) -> RentDate {
    RentDate {
        id: row.get("id"),
        open_date: row.get("open_date"),
        close_date: row.get("close_date"),
        price: Money {
            amount: row.get("price"),
            currency: row.get("price_currency"),
        },
        status: row.get("status"),
        booked_by: row.get("booked_by"),
        description: row.get("description"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

impl<C, IDs> Database<Select<By<HashMap<rent_date::Id, RentDate>, IDs>>>
    for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[rent_date::Id]>,
{
    type Ok = HashMap<rent_date::Id, RentDate>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<rent_date::Id, RentDate>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        let ids = ids.as_ref();

        const SQL: &str = "\
            SELECT d.id, d.open_date, d.close_date, \
                   d.price, d.price_currency, \
                   d.status, d.booked_by, d.description, \
                   d.created_at, d.updated_at \
            FROM unnest($1::UUID[]) AS ids(id) \
            INNER JOIN rent_dates AS d \
                    ON d.id = ids.id";
        Ok(self
            .query(SQL, &[&ids])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .map(|d| (d.id, d))
            .collect())
    }
}

impl<C> Database<Select<By<Vec<RentDate>, rent_list::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<RentDate>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<RentDate>, rent_list::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let list_id = by.into_inner();

        const SQL: &str = "\
            SELECT d.id, d.open_date, d.close_date, \
                   d.price, d.price_currency, \
                   d.status, d.booked_by, d.description, \
                   d.created_at, d.updated_at \
            FROM rentable_dates AS l \
            INNER JOIN rent_dates AS d \
                    ON d.id = l.date_id \
            WHERE l.rent_list_id = $1::UUID \
            ORDER BY d.open_date ASC, d.id ASC";
        Ok(self
            .query(SQL, &[&list_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Insert<RentDate>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<RentDate>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(date): Insert<RentDate>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(date)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<RentDate>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(date): Update<RentDate>,
    ) -> Result<Self::Ok, Self::Err> {
        let RentDate {
            id,
            open_date,
            close_date,
            price,
            status,
            booked_by,
            description,
            created_at,
            updated_at,
        } = date;

        const SQL: &str = "\
            INSERT INTO rent_dates (\
                id, open_date, close_date, \
                price, price_currency, \
                status, booked_by, description, \
                created_at, updated_at\
            ) VALUES (\
                $1::UUID, $2::DATE, $3::DATE, \
                $4::NUMERIC, $5::INT2, \
                $6::INT2, $7::UUID, $8::VARCHAR, \
                $9::TIMESTAMPTZ, $10::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET open_date = EXCLUDED.open_date, \
                close_date = EXCLUDED.close_date, \
                price = EXCLUDED.price, \
                price_currency = EXCLUDED.price_currency, \
                status = EXCLUDED.status, \
                booked_by = EXCLUDED.booked_by, \
                description = EXCLUDED.description, \
                updated_at = EXCLUDED.updated_at";
        self.exec(
            SQL,
            &[
                &id,
                &open_date,
                &close_date,
                &price.amount,
                &price.currency,
                &status,
                &booked_by,
                &description,
                &created_at,
                &updated_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Delete<By<RentDate, rent_date::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<RentDate, rent_date::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM rent_dates \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C, IDs> Database<Lock<By<RentDate, IDs>>> for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[rent_date::Id]>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<RentDate, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        let ids = ids.as_ref();

        // Rows are locked in a stable order to avoid deadlocks between
        // concurrent bookings of overlapping batches.
        const SQL: &str = "\
            SELECT id \
            FROM rent_dates \
            WHERE id = ANY($1::UUID[]) \
            ORDER BY id ASC \
            FOR UPDATE";
        self.query(SQL, &[&ids])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
