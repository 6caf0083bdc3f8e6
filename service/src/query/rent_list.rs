//! [`Query`] collection related to a single [`RentList`].

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    domain::{car, rent_list, RentDate, RentList},
    infra::{database, Database},
    read::rent_list::Schedule,
    Query, Service,
};
#[cfg(doc)]
use crate::domain::Car;

/// [`Query`] of the [`Schedule`] of a [`Car`].
///
/// Outputs [`None`] if the [`Car`] has no [`RentList`].
#[derive(Clone, Copy, Debug)]
pub struct ByCar(pub car::Id);

impl<Db> Query<ByCar> for Service<Db>
where
    Db: Database<
            Select<By<Option<RentList>, car::Id>>,
            Ok = Option<RentList>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<RentDate>, rent_list::Id>>,
            Ok = Vec<RentDate>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Option<Schedule>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        ByCar(car_id): ByCar,
    ) -> Result<Self::Ok, Self::Err> {
        let Some(list) = self
            .database()
            .execute(Select(By::<Option<RentList>, _>::new(car_id)))
            .await
            .map_err(tracerr::wrap!())?
        else {
            return Ok(None);
        };

        let dates = self
            .database()
            .execute(Select(By::<Vec<RentDate>, _>::new(list.id)))
            .await
            .map_err(tracerr::wrap!())?;

        Ok(Some(Schedule { list, dates }))
    }
}
