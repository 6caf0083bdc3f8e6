//! [`SaleList`]-related [`Database`] implementations.

use common::{
    operations::{By, Insert, Lock, Select, Update},
    Money,
};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{car, sale_list, SaleList},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read::{self, sale_list::Available},
};

/// Columns of the `sale_lists` table, in the order expected by [`from_row`].
const COLUMNS: &str = "\
    id, car_id, \
    price, price_currency, \
    description, status, \
    manager_id, employee_id, \
    created_at, updated_at";

/// Builds a [`SaleList`] out of a [`Row`] having all the [`COLUMNS`].
fn from_row(row: &Row) -> SaleList {
    SaleList {
        id: row.get("id"),
        car_id: row.get("car_id"),
        price: Money {
            amount: row.get("price"),
            currency: row.get("price_currency"),
        },
        description: row.get("description"),
        status: row.get("status"),
        manager_id: row.get("manager_id"),
        employee_id: row.get("employee_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

impl<C> Database<Select<By<Option<SaleList>, sale_list::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<SaleList>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<SaleList>, sale_list::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM sale_lists \
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

impl<C> Database<Select<By<Option<Available<SaleList>>, car::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Available<SaleList>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Available<SaleList>>, car::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let car_id = by.into_inner();
        let status = sale_list::Status::Available;

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM sale_lists \
             WHERE car_id = $1::UUID \
               AND status = $2::INT2 \
             ORDER BY created_at ASC, id ASC \
             LIMIT 1"
        );
        Ok(self
            .query_opt(&sql, &[&car_id, &status])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row)
            .map(Available))
    }
}

impl<C> Database<Insert<SaleList>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<SaleList>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(list): Insert<SaleList>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(list)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<SaleList>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(list): Update<SaleList>,
    ) -> Result<Self::Ok, Self::Err> {
        let SaleList {
            id,
            car_id,
            price,
            description,
            status,
            manager_id,
            employee_id,
            created_at,
            updated_at,
        } = list;

        const SQL: &str = "\
            INSERT INTO sale_lists (\
                id, car_id, \
                price, price_currency, \
                description, status, \
                manager_id, employee_id, \
                created_at, updated_at\
            ) VALUES (\
                $1::UUID, $2::UUID, \
                $3::NUMERIC, $4::INT2, \
                $5::VARCHAR, $6::INT2, \
                $7::UUID, $8::UUID, \
                $9::TIMESTAMPTZ, $10::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET price = EXCLUDED.price, \
                price_currency = EXCLUDED.price_currency, \
                description = EXCLUDED.description, \
                status = EXCLUDED.status, \
                employee_id = EXCLUDED.employee_id, \
                updated_at = EXCLUDED.updated_at";
        self.exec(
            SQL,
            &[
                &id,
                &car_id,
                &price.amount,
                &price.currency,
                &description,
                &status,
                &manager_id,
                &employee_id,
                &created_at,
                &updated_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<SaleList, car::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<SaleList, car::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let car_id: car::Id = by.into_inner();

        // Locking the `cars` row serializes all the listing changes of the
        // same car, including creation of new ones.
        const SQL: &str = "\
            SELECT id \
            FROM cars \
            WHERE id = $1::UUID \
            FOR NO KEY UPDATE";
        self.query(SQL, &[&car_id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C>
    Database<
        Select<
            By<read::sale_list::list::Page, read::sale_list::list::Selector>,
        >,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = read::sale_list::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::sale_list::list::Page, read::sale_list::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::sale_list::list::Selector {
            arguments,
            filter: read::sale_list::list::Filter { status },
        } = by.into_inner();

        let limit = i32::try_from(arguments.limit() + 1).unwrap_or(i32::MAX);

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![&limit, &status];

        let cursor_idx = arguments.cursor().map(|c| {
            ps.push(c);
            ps.len()
        });

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM sale_lists \
             WHERE status = $2::INT2 \
                   {cursor} \
             ORDER BY id ASC \
             LIMIT $1::INT4",
            cursor = cursor_idx.into_iter().format_with("", |idx, f| {
                f(&format_args!("AND id > ${idx}::UUID"))
            }),
        );
        let rows = self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?;

        Ok(read::sale_list::list::Page::from_overfetched(
            &arguments,
            rows.iter().map(from_row).map(|s| (s.id, s)),
        ))
    }
}
