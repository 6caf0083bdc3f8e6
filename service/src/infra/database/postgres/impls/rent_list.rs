//! [`RentList`]-related [`Database`] implementations.

use common::operations::{By, Delete, Insert, Lock, Select, Update};
use tracerr::Traced;

use crate::{
    domain::{car, rent_date, rent_list, RentList},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Select<By<Option<RentList>, car::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<RentList>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<RentList>, car::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let car_id = by.into_inner();

        const SQL: &str = "\
            SELECT id, car_id, manager_id, status, created_at \
            FROM rent_lists \
            WHERE car_id = $1::UUID";
        Ok(self
            .query_opt(SQL, &[&car_id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| RentList {
                id: row.get("id"),
                car_id: row.get("car_id"),
                manager_id: row.get("manager_id"),
                status: row.get("status"),
                created_at: row.get("created_at"),
            }))
    }
}

impl<C> Database<Insert<RentList>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(list): Insert<RentList>,
    ) -> Result<Self::Ok, Self::Err> {
        let RentList {
            id,
            car_id,
            manager_id,
            status,
            created_at,
        } = list;

        const SQL: &str = "\
            INSERT INTO rent_lists (\
                id, car_id, manager_id, status, created_at\
            ) VALUES (\
                $1::UUID, $2::UUID, $3::UUID, $4::INT2, $5::TIMESTAMPTZ\
            )";
        self.exec(SQL, &[&id, &car_id, &manager_id, &status, &created_at])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Update<RentList>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(list): Update<RentList>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            UPDATE rent_lists \
            SET manager_id = $2::UUID, \
                status = $3::INT2 \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&list.id, &list.manager_id, &list.status])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<RentList, car::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<RentList, car::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let car_id: car::Id = by.into_inner();

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

impl<C> Database<Insert<rent_list::RentableDate>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(link): Insert<rent_list::RentableDate>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            INSERT INTO rentable_dates (rent_list_id, date_id) \
            VALUES ($1::UUID, $2::UUID) \
            ON CONFLICT DO NOTHING";
        self.exec(SQL, &[&link.rent_list_id, &link.date_id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Delete<By<rent_list::RentableDate, rent_date::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<rent_list::RentableDate, rent_date::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let date_id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM rentable_dates \
            WHERE date_id = $1::UUID";
        self.exec(SQL, &[&date_id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
