//! [`Query`] definition.

pub mod contract;
pub mod payment;
pub mod payments;
pub mod rent_list;
pub mod sale_listing;
pub mod sale_listings;

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    infra::{database, Database},
    Service,
};

/// [`Query`] of the [`Service`].
pub use common::Handler as Query;

/// [`Query`] [`Select`]ing a `T`ype from a [`Database`].
#[derive(Clone, Copy, Debug)]
#[expect(clippy::module_name_repetitions, reason = "more readable")]
pub struct DatabaseQuery<T>(T);

impl<W, B> DatabaseQuery<By<W, B>> {
    /// Creates a new [`DatabaseQuery`] selecting a `W` by the provided `B`.
    #[must_use]
    pub fn by(by: B) -> Self {
        Self(By::new(by))
    }
}

impl<Db, W, B> Query<DatabaseQuery<By<W, B>>> for Service<Db>
where
    Db: Database<Select<By<W, B>>, Ok = W, Err = Traced<database::Error>>,
{
    type Ok = W;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        DatabaseQuery(by): DatabaseQuery<By<W, B>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.database()
            .execute(Select(by))
            .await
            .map_err(tracerr::wrap!())
    }
}

#[cfg(test)]
mod spec {
    use common::pagination::Arguments;

    use crate::{
        command::{fixture, CreateSaleListing},
        domain::{manager, sale_list},
        read, Query as _,
    };

    use super::sale_listings;

    #[tokio::test]
    async fn paginates_available_sale_listings() {
        let svc = fixture::service();
        for _ in 0..3 {
            let car_id = fixture::car(&svc).await;
            _ = svc
                .execute(CreateSaleListing {
                    car_id,
                    price: fixture::money(100),
                    description: None,
                    manager_id: manager::Id::default(),
                    employee_id: None,
                })
                .await
                .unwrap();
        }

        let first = svc
            .execute(sale_listings::List::by(read::sale_list::list::Selector {
                arguments: Arguments::new(Some(2), None).unwrap(),
                filter: read::sale_list::list::Filter::default(),
            }))
            .await
            .unwrap();
        assert_eq!(first.edges.len(), 2);
        assert!(first.has_more);

        let rest = svc
            .execute(sale_listings::List::by(read::sale_list::list::Selector {
                arguments: Arguments::new(Some(2), first.end_cursor().copied())
                    .unwrap(),
                filter: read::sale_list::list::Filter::default(),
            }))
            .await
            .unwrap();
        assert_eq!(rest.edges.len(), 1);
        assert!(!rest.has_more);

        let sold = svc
            .execute(sale_listings::List::by(read::sale_list::list::Selector {
                arguments: Arguments::default(),
                filter: read::sale_list::list::Filter {
                    status: sale_list::Status::Sold,
                },
            }))
            .await
            .unwrap();
        assert!(sold.edges.is_empty());
    }
}
