//! [`Database`] implementations.

use std::collections::HashMap;

use common::operations::{
    By, Commit, Delete, Insert, Lock, Select, Transact, Update,
};
use tracerr::Traced;

use crate::{
    domain::{
        booking, car, contract, customer, payment, rent_date, rent_list,
        sale_list, Booking, Car, Contract, Customer, Payment, RentDate,
        RentList, SaleList,
    },
    infra::{database, Database},
    read::{self, sale_list::Available},
};

use super::{Access, Error, Memory, NonTx, Tx};

impl Database<Transact> for Memory<NonTx> {
    type Ok = Memory<Tx>;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(Memory(Tx::from_non_tx(&self.0)))
    }
}

impl Database<Transact> for Memory<Tx> {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

impl Database<Commit> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        self.commit()
            .map_err(database::Error::from)
            .map_err(tracerr::wrap!())
    }
}

/// Applies the provided write via the [`Access`] of a [`Memory`] client.
fn write<C: Access>(
    db: &Memory<C>,
    op: impl Fn(&mut super::Tables) -> Result<(), Error> + Send + Sync + 'static,
) -> Result<(), Traced<database::Error>> {
    db.0.write(op)
        .map_err(database::Error::from)
        .map_err(tracerr::wrap!())
}

impl<C: Access> Database<Select<By<Option<Car>, car::Id>>> for Memory<C> {
    type Ok = Option<Car>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Car>, car::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.read(|t| t.cars.get(&id).cloned()))
    }
}

impl<C: Access> Database<Insert<Car>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(car): Insert<Car>,
    ) -> Result<Self::Ok, Self::Err> {
        write(self, move |t| {
            drop(t.cars.insert(car.id, car.clone()));
            Ok(())
        })
    }
}

impl<C: Access> Database<Select<By<Option<Customer>, customer::Id>>>
    for Memory<C>
{
    type Ok = Option<Customer>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Customer>, customer::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.read(|t| t.customers.get(&id).cloned()))
    }
}

impl<C: Access> Database<Insert<Customer>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(customer): Insert<Customer>,
    ) -> Result<Self::Ok, Self::Err> {
        write(self, move |t| {
            drop(t.customers.insert(customer.id, customer.clone()));
            Ok(())
        })
    }
}

impl<C: Access> Database<Select<By<Option<SaleList>, sale_list::Id>>>
    for Memory<C>
{
    type Ok = Option<SaleList>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<SaleList>, sale_list::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.read(|t| t.sale_lists.get(&id).cloned()))
    }
}

impl<C: Access> Database<Select<By<Option<Available<SaleList>>, car::Id>>>
    for Memory<C>
{
    type Ok = Option<Available<SaleList>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Available<SaleList>>, car::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let car_id = by.into_inner();
        Ok(self.read(|t| {
            t.sale_lists
                .values()
                .filter(|s| s.car_id == car_id && s.is_available())
                .min_by_key(|s| (s.created_at, s.id))
                .cloned()
                .map(Available)
        }))
    }
}

impl<C: Access> Database<Insert<SaleList>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(list): Insert<SaleList>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(list)).await
    }
}

impl<C: Access> Database<Update<SaleList>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(list): Update<SaleList>,
    ) -> Result<Self::Ok, Self::Err> {
        write(self, move |t| {
            drop(t.sale_lists.insert(list.id, list.clone()));
            Ok(())
        })
    }
}

impl Database<Lock<By<SaleList, car::Id>>> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<SaleList, car::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.lock().await;
        Ok(())
    }
}

impl<C: Access>
    Database<
        Select<
            By<read::sale_list::list::Page, read::sale_list::list::Selector>,
        >,
    > for Memory<C>
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

        let mut rows = self.read(|t| {
            t.sale_lists
                .values()
                .filter(|s| s.status == status)
                .filter(|s| arguments.cursor().map_or(true, |c| s.id > *c))
                .cloned()
                .collect::<Vec<_>>()
        });
        rows.sort_by_key(|s| s.id);
        rows.truncate(arguments.limit() + 1);

        Ok(read::sale_list::list::Page::from_overfetched(
            &arguments,
            rows.into_iter().map(|s| (s.id, s)),
        ))
    }
}

impl<C: Access> Database<Select<By<Option<RentList>, car::Id>>> for Memory<C> {
    type Ok = Option<RentList>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<RentList>, car::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let car_id = by.into_inner();
        Ok(self.read(|t| {
            t.rent_lists.values().find(|l| l.car_id == car_id).cloned()
        }))
    }
}

impl<C: Access> Database<Insert<RentList>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(list): Insert<RentList>,
    ) -> Result<Self::Ok, Self::Err> {
        write(self, move |t| {
            if t.rent_lists.values().any(|l| l.car_id == list.car_id) {
                return Err(Error::UniqueViolation("rent_lists_car_id_key"));
            }
            drop(t.rent_lists.insert(list.id, list.clone()));
            Ok(())
        })
    }
}

impl<C: Access> Database<Update<RentList>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(list): Update<RentList>,
    ) -> Result<Self::Ok, Self::Err> {
        write(self, move |t| {
            drop(t.rent_lists.insert(list.id, list.clone()));
            Ok(())
        })
    }
}

impl Database<Lock<By<RentList, car::Id>>> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<RentList, car::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.lock().await;
        Ok(())
    }
}

impl<C: Access> Database<Insert<rent_list::RentableDate>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(link): Insert<rent_list::RentableDate>,
    ) -> Result<Self::Ok, Self::Err> {
        write(self, move |t| {
            if !t.rentable_dates.contains(&link) {
                t.rentable_dates.push(link);
            }
            Ok(())
        })
    }
}

impl<C: Access> Database<Delete<By<rent_list::RentableDate, rent_date::Id>>>
    for Memory<C>
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<rent_list::RentableDate, rent_date::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let date_id = by.into_inner();
        write(self, move |t| {
            t.rentable_dates.retain(|l| l.date_id != date_id);
            Ok(())
        })
    }
}

impl<C, IDs> Database<Select<By<HashMap<rent_date::Id, RentDate>, IDs>>>
    for Memory<C>
where
    C: Access,
    IDs: AsRef<[rent_date::Id]>,
{
    type Ok = HashMap<rent_date::Id, RentDate>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<rent_date::Id, RentDate>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        Ok(self.read(|t| {
            ids.as_ref()
                .iter()
                .filter_map(|id| t.rent_dates.get(id))
                .map(|d| (d.id, d.clone()))
                .collect()
        }))
    }
}

impl<C: Access> Database<Select<By<Vec<RentDate>, rent_list::Id>>>
    for Memory<C>
{
    type Ok = Vec<RentDate>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<RentDate>, rent_list::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let list_id = by.into_inner();
        let mut dates = self.read(|t| {
            t.rentable_dates
                .iter()
                .filter(|l| l.rent_list_id == list_id)
                .filter_map(|l| t.rent_dates.get(&l.date_id))
                .cloned()
                .collect::<Vec<_>>()
        });
        dates.sort_by_key(|d| (d.open_date, d.id));
        Ok(dates)
    }
}

impl<C: Access> Database<Insert<RentDate>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(date): Insert<RentDate>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(date)).await
    }
}

impl<C: Access> Database<Update<RentDate>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(date): Update<RentDate>,
    ) -> Result<Self::Ok, Self::Err> {
        write(self, move |t| {
            drop(t.rent_dates.insert(date.id, date.clone()));
            Ok(())
        })
    }
}

impl<C: Access> Database<Delete<By<RentDate, rent_date::Id>>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<RentDate, rent_date::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        write(self, move |t| {
            drop(t.rent_dates.remove(&id));
            Ok(())
        })
    }
}

impl<IDs> Database<Lock<By<RentDate, IDs>>> for Memory<Tx>
where
    IDs: AsRef<[rent_date::Id]>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<RentDate, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.lock().await;
        Ok(())
    }
}

impl<C: Access>
    Database<Select<By<Option<Booking>, (customer::Id, sale_list::Id)>>>
    for Memory<C>
{
    type Ok = Option<Booking>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Booking>, (customer::Id, sale_list::Id)>>,
    ) -> Result<Self::Ok, Self::Err> {
        let (customer_id, sale_list_id) = by.into_inner();
        Ok(self.read(|t| {
            t.bookings
                .values()
                .find(|b| {
                    b.customer_id == customer_id
                        && b.sale_list_id == sale_list_id
                })
                .cloned()
        }))
    }
}

impl<C: Access> Database<Insert<Booking>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(booking): Insert<Booking>,
    ) -> Result<Self::Ok, Self::Err> {
        write(self, move |t| {
            let duplicate = t.bookings.values().any(|b| {
                b.customer_id == booking.customer_id
                    && b.sale_list_id == booking.sale_list_id
            });
            if duplicate {
                return Err(Error::UniqueViolation(
                    "bookings_customer_sale_list_key",
                ));
            }
            drop(t.bookings.insert(booking.id, booking.clone()));
            Ok(())
        })
    }
}

impl<C: Access> Database<Select<By<Option<Contract>, contract::Id>>>
    for Memory<C>
{
    type Ok = Option<Contract>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Contract>, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.read(|t| t.contracts.get(&id).cloned()))
    }
}

impl<C: Access> Database<Insert<Contract>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(contract): Insert<Contract>,
    ) -> Result<Self::Ok, Self::Err> {
        write(self, move |t| {
            let id = contract.id();
            if t.contracts.contains_key(&id) {
                return Err(Error::UniqueViolation("contracts_pkey"));
            }
            if let Contract::Sale(sale) = &contract {
                let sold = t.contracts.values().any(|c| {
                    matches!(c, Contract::Sale(s)
                        if s.sale_list_id == sale.sale_list_id)
                });
                if sold {
                    return Err(Error::UniqueViolation(
                        "contracts_sale_list_id_key",
                    ));
                }
            }
            drop(t.contracts.insert(id, contract.clone()));
            Ok(())
        })
    }
}

impl<C: Access> Database<Select<By<Option<Payment>, payment::Id>>>
    for Memory<C>
{
    type Ok = Option<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Payment>, payment::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.read(|t| t.payments.get(&id).cloned()))
    }
}

impl<C: Access> Database<Insert<Payment>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(payment): Insert<Payment>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(payment)).await
    }
}

impl<C: Access> Database<Update<Payment>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(payment): Update<Payment>,
    ) -> Result<Self::Ok, Self::Err> {
        write(self, move |t| {
            drop(t.payments.insert(payment.id, payment.clone()));
            Ok(())
        })
    }
}

impl<C: Access> Database<Delete<By<Payment, payment::Id>>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Payment, payment::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        write(self, move |t| {
            drop(t.payments.remove(&id));
            Ok(())
        })
    }
}

impl Database<Lock<By<Payment, payment::Id>>> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Payment, payment::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.lock().await;
        Ok(())
    }
}

impl<C: Access>
    Database<
        Select<By<read::payment::list::Page, read::payment::list::Selector>>,
    > for Memory<C>
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

        let mut rows = self.read(|t| {
            t.payments
                .values()
                .filter(|p| customer_id.map_or(true, |c| p.customer_id == c))
                .filter(|p| arguments.cursor().map_or(true, |c| p.id > *c))
                .cloned()
                .collect::<Vec<_>>()
        });
        rows.sort_by_key(|p| p.id);
        rows.truncate(arguments.limit() + 1);

        Ok(read::payment::list::Page::from_overfetched(
            &arguments,
            rows.into_iter().map(|p| (p.id, p)),
        ))
    }
}

#[cfg(test)]
mod spec {
    use common::{
        operations::{By, Commit, Insert, Lock, Select, Transact},
        DateTimeOf,
    };

    use crate::{
        domain::{booking, customer, sale_list, Booking, Customer},
        infra::{Database as _, Memory},
    };

    fn customer() -> Customer {
        Customer {
            id: customer::Id::new(),
            name: customer::Name::new("Somchai").unwrap(),
            created_at: DateTimeOf::now(),
        }
    }

    #[tokio::test]
    async fn uncommitted_writes_are_isolated() {
        let db = Memory::new();
        let c = customer();

        let tx = db.execute(Transact).await.unwrap();
        tx.execute(Insert(c.clone())).await.unwrap();

        let seen = tx
            .execute(Select(By::<Option<Customer>, _>::new(c.id)))
            .await
            .unwrap();
        assert!(seen.is_some(), "transaction sees its own writes");
        let seen = db
            .execute(Select(By::<Option<Customer>, _>::new(c.id)))
            .await
            .unwrap();
        assert!(seen.is_none(), "others don't see uncommitted writes");

        tx.execute(Commit).await.unwrap();

        let seen = db
            .execute(Select(By::<Option<Customer>, _>::new(c.id)))
            .await
            .unwrap();
        assert!(seen.is_some());
    }

    #[tokio::test]
    async fn dropped_transaction_is_rolled_back() {
        let db = Memory::new();
        let c = customer();

        {
            let tx = db.execute(Transact).await.unwrap();
            tx.execute(Insert(c.clone())).await.unwrap();
        }

        let seen = db
            .execute(Select(By::<Option<Customer>, _>::new(c.id)))
            .await
            .unwrap();
        assert!(seen.is_none());
    }

    #[tokio::test]
    async fn rejects_duplicate_bookings() {
        let db = Memory::new();
        let (customer_id, sale_list_id) =
            (customer::Id::new(), sale_list::Id::new());
        let booking = || Booking {
            id: booking::Id::new(),
            customer_id,
            sale_list_id,
            created_at: DateTimeOf::now(),
        };

        db.execute(Insert(booking())).await.unwrap();
        let err = db.execute(Insert(booking())).await.unwrap_err();

        assert!(err.as_ref().is_unique_violation(None));
    }

    #[tokio::test]
    async fn lock_serializes_transactions() {
        let db = Memory::new();

        let first = db.execute(Transact).await.unwrap();
        first
            .execute(Lock(By::<sale_list::SaleList, _>::new(
                crate::domain::car::Id::new(),
            )))
            .await
            .unwrap();

        let second = db.execute(Transact).await.unwrap();
        let waiting = tokio::spawn(async move {
            second
                .execute(Lock(By::<sale_list::SaleList, _>::new(
                    crate::domain::car::Id::new(),
                )))
                .await
        });
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(!waiting.is_finished());

        first.execute(Commit).await.unwrap();
        waiting.await.unwrap().unwrap();
    }
}
