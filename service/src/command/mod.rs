//! [`Command`] definition.

pub mod attach_payment_proof;
pub mod book_dates;
pub mod create_or_replace_rent_window;
pub mod create_sale_listing;
pub mod delete_date_window;
pub mod delete_payment;
pub mod issue_rent_contract;
pub mod issue_sale_contract;
pub mod record_booking_intent;
pub mod record_payment;
pub mod update_payment_status;
pub mod update_sale_listing;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    attach_payment_proof::AttachPaymentProof, book_dates::BookDates,
    create_or_replace_rent_window::CreateOrReplaceRentWindow,
    create_sale_listing::CreateSaleListing,
    delete_date_window::DeleteDateWindow, delete_payment::DeletePayment,
    issue_rent_contract::IssueRentContract,
    issue_sale_contract::IssueSaleContract,
    record_booking_intent::RecordBookingIntent,
    record_payment::RecordPayment,
    update_payment_status::UpdatePaymentStatus,
    update_sale_listing::UpdateSaleListing,
};

#[cfg(test)]
pub(crate) mod fixture {
    //! Helpers for [`Command`] tests.

    use common::{
        money::Currency, operations::Insert, Date, DateTime, Money,
    };
    use rust_decimal::Decimal;

    use crate::{
        domain::{
            car, contract, customer, employee, manager, payment, Car,
            Customer,
        },
        infra::{Database as _, Memory},
        Config,
    };

    use super::{
        Command as _, CreateSaleListing, IssueSaleContract, RecordPayment,
    };

    /// [`crate::Service`] backed by [`Memory`].
    pub(crate) type Service = crate::Service<Memory>;

    pub(crate) fn service() -> Service {
        Service::new(Config::default(), Memory::new())
    }

    pub(crate) fn money(amount: i64) -> Money {
        Money {
            amount: Decimal::from(amount),
            currency: Currency::Thb,
        }
    }

    pub(crate) fn date(s: &str) -> Date {
        s.parse().unwrap()
    }

    pub(crate) async fn car(svc: &Service) -> car::Id {
        let car = Car {
            id: car::Id::new(),
            name: car::Name::new("Toyota Corolla").unwrap(),
            created_at: DateTime::now().coerce(),
        };
        svc.database().execute(Insert(car.clone())).await.unwrap();
        car.id
    }

    pub(crate) async fn customer(svc: &Service) -> customer::Id {
        let customer = Customer {
            id: customer::Id::new(),
            name: customer::Name::new("Somchai").unwrap(),
            created_at: DateTime::now().coerce(),
        };
        svc.database()
            .execute(Insert(customer.clone()))
            .await
            .unwrap();
        customer.id
    }

    /// Sells a new [`Car`] to a new [`Customer`].
    pub(crate) async fn sale_contract(
        svc: &Service,
    ) -> (contract::Id, customer::Id) {
        let car_id = car(svc).await;
        let customer_id = customer(svc).await;
        _ = svc
            .execute(CreateSaleListing {
                car_id,
                price: money(1_000),
                description: None,
                manager_id: manager::Id::default(),
                employee_id: Some(employee::Id::new()),
            })
            .await
            .unwrap();
        let sale = svc
            .execute(IssueSaleContract {
                car_id,
                customer_id,
                employee_id: None,
            })
            .await
            .unwrap();
        (sale.id, customer_id)
    }

    /// Records a new [`payment::Status::Pending`] payment of a new
    /// [`contract::Sale`].
    pub(crate) async fn payment(svc: &Service) -> payment::Id {
        let (contract, customer_id) = sale_contract(svc).await;
        svc.execute(RecordPayment {
            contract: payment::ContractRef::Sale(contract),
            method_id: payment::MethodId::default(),
            amount: money(1_000),
            customer_id,
            employee_id: None,
            status: None,
            paid_at: None,
        })
        .await
        .unwrap()
        .id
    }
}
