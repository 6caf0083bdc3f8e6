//! `Contract` REST endpoints.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path,
    },
    routing::{get, post},
    Extension, Json, Router,
};
use common::Date;
use serde::{Deserialize, Serialize};
use service::{
    command,
    domain::{contract, customer, employee, rent_list, sale_list, Contract},
    query, Command as _,
};
use uuid::Uuid;

use crate::{api, define_error, AsError, Error, Service};

/// Builds [`Router`] of the `Contract` endpoints.
pub(crate) fn routes() -> Router {
    Router::new()
        .route("/contracts/:id", get(by_id))
        .route("/rent-contracts", post(create_rent))
}

define_error! {
    enum NotFoundError {
        #[code = "CONTRACT_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Contract` does not exist"]
        Contract,
    }
}

/// `Contract` representation of either kind.
///
/// Kind-specific fields are omitted for the other kind.
#[derive(Clone, Debug, Serialize)]
pub struct ContractView {
    /// ID of the `Contract`.
    pub id: contract::Id,

    /// Kind of the `Contract`.
    pub kind: String,

    /// ID of the customer bound by the `Contract`.
    pub customer_id: customer::Id,

    /// Total price of the `Contract`.
    pub price: f64,

    /// Currency of the `price`.
    pub currency: String,

    /// ID of the sold `SaleList`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sale_list_id: Option<sale_list::Id>,

    /// ID of the employee who closed the sale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<employee::Id>,

    /// ID of the rented `RentList`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rent_list_id: Option<rent_list::Id>,

    /// First day of the rent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<Date>,

    /// Last day of the rent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<Date>,

    /// Creation datetime.
    pub created_at: contract::CreationDateTime,
}

impl From<Contract> for ContractView {
    fn from(c: Contract) -> Self {
        let price = c.price();
        let mut view = Self {
            id: c.id(),
            kind: c.kind().to_string(),
            customer_id: c.customer_id(),
            price: price.to_f64(),
            currency: price.currency.to_string(),
            sale_list_id: None,
            employee_id: None,
            rent_list_id: None,
            start_date: None,
            end_date: None,
            created_at: c.created_at(),
        };
        match c {
            Contract::Sale(s) => {
                view.sale_list_id = Some(s.sale_list_id);
                view.employee_id = Some(s.employee_id);
            }
            Contract::Rent(r) => {
                view.rent_list_id = Some(r.rent_list_id);
                view.start_date = Some(r.start_date);
                view.end_date = Some(r.end_date);
            }
        }
        view
    }
}

/// Body of `POST /rent-contracts`.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct CreateRentRequest {
    /// ID of the rented `Car`.
    pub car_id: Uuid,

    /// ID of the renting customer.
    pub customer_id: Uuid,

    /// First day of the rent.
    pub start_date: Date,

    /// Last day of the rent.
    pub end_date: Date,

    /// Total price of the rent.
    pub total_price: f64,
}

/// Returns a `Contract` by its ID.
#[tracing::instrument(skip_all, fields(id = tracing::field::Empty))]
async fn by_id(
    Extension(service): Extension<Service>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ContractView>, Error> {
    let Path(id) = id.map_err(AsError::into_error)?;
    _ = tracing::Span::current().record("id", tracing::field::display(id));

    service
        .execute(query::contract::ById::by(id.into()))
        .await
        .map_err(AsError::into_error)?
        .map(|c| Json(c.into()))
        .ok_or_else(|| NotFoundError::Contract.into())
}

/// Issues a rent contract over the dates booked by the customer.
///
/// # Errors
///
/// Possible error codes:
/// - `RENT_LIST_NOT_EXISTS` - `Car` is not listed for rent;
/// - `CUSTOMER_NOT_EXISTS` - `Customer` with the provided ID does not exist;
/// - `DATES_NOT_BOOKED` - some day of the range is not booked by the customer;
/// - `INVALID_PRICE` - total price is negative;
/// - `INVALID_RANGE` - range ends before it starts.
#[tracing::instrument(
    skip_all,
    fields(
        car_id = tracing::field::Empty,
        customer_id = tracing::field::Empty,
    ),
)]
async fn create_rent(
    Extension(service): Extension<Service>,
    req: Result<Json<CreateRentRequest>, JsonRejection>,
) -> Result<(http::StatusCode, Json<ContractView>), Error> {
    let Json(req) = req.map_err(AsError::into_error)?;
    let span = tracing::Span::current();
    _ = span.record("car_id", tracing::field::display(req.car_id));
    _ = span.record("customer_id", tracing::field::display(req.customer_id));

    service
        .execute(command::IssueRentContract {
            car_id: req.car_id.into(),
            customer_id: req.customer_id.into(),
            start_date: req.start_date,
            end_date: req.end_date,
            total_price: api::money(&service, req.total_price)?,
        })
        .await
        .map_err(AsError::into_error)
        .map(|c| {
            (http::StatusCode::CREATED, Json(Contract::from(c).into()))
        })
}

impl AsError for command::issue_rent_contract::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "CUSTOMER_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`Customer` with the provided ID does not exist"]
                CustomerNotExists,

                #[code = "DATES_NOT_BOOKED"]
                #[status = CONFLICT]
                #[message = "Rent range is not fully booked by the `Customer`"]
                DatesNotBooked,

                #[code = "INVALID_PRICE"]
                #[status = BAD_REQUEST]
                #[message = "Price must not be negative"]
                InvalidPrice,

                #[code = "INVALID_RANGE"]
                #[status = BAD_REQUEST]
                #[message = "Rent range ends before it starts"]
                InvalidRange,

                #[code = "RENT_LIST_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`Car` is not listed for rent"]
                NotForRent,
            }
        }

        match self {
            Self::CustomerNotExists(_) => Some(Error::CustomerNotExists.into()),
            Self::DatesNotBooked(_) => Some(Error::DatesNotBooked.into()),
            Self::Db(e) => e.try_as_error(),
            Self::InvalidPrice(_) => Some(Error::InvalidPrice.into()),
            Self::InvalidRange { .. } => Some(Error::InvalidRange.into()),
            Self::NotForRent(_) => Some(Error::NotForRent.into()),
        }
    }
}
