//! `SaleList` REST endpoints.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query,
    },
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use service::{
    command,
    domain::{car, contract, customer, employee, manager, sale_list, SaleList},
    query, read, Command as _,
};
use uuid::Uuid;

use crate::{api, define_error, AsError, Error, Service};

/// Builds [`Router`] of the `SaleList` endpoints.
pub(crate) fn routes() -> Router {
    Router::new()
        .route("/sale", post(create))
        .route("/sale/cars", get(list))
        .route("/sale/cars/:car_id", get(available_by_car))
        .route("/sale/:id", get(by_id).put(update))
        .route("/bycar/buy/:car_id", post(buy))
}

define_error! {
    enum NotFoundError {
        #[code = "SALE_LIST_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`SaleList` does not exist"]
        SaleList,

        #[code = "NO_AVAILABLE_SALE_LIST"]
        #[status = NOT_FOUND]
        #[message = "`Car` has no available `SaleList`"]
        Available,
    }
}

/// `SaleList` representation.
#[derive(Clone, Debug, Serialize)]
pub struct SaleListing {
    /// ID of the `SaleList`.
    pub id: sale_list::Id,

    /// ID of the listed `Car`.
    pub car_id: car::Id,

    /// Asking price.
    pub price: f64,

    /// Currency of the `price`.
    pub currency: String,

    /// Description of the offer.
    pub description: Option<String>,

    /// Status of the `SaleList`.
    pub status: String,

    /// ID of the owning manager.
    pub manager_id: manager::Id,

    /// ID of the assigned employee.
    pub employee_id: Option<employee::Id>,

    /// Creation datetime.
    pub created_at: sale_list::CreationDateTime,

    /// Last modification datetime.
    pub updated_at: sale_list::ModificationDateTime,
}

impl From<SaleList> for SaleListing {
    fn from(list: SaleList) -> Self {
        Self {
            id: list.id,
            car_id: list.car_id,
            price: list.price.to_f64(),
            currency: list.price.currency.to_string(),
            description: list.description.map(|d| d.to_string()),
            status: list.status.to_string(),
            manager_id: list.manager_id,
            employee_id: list.employee_id,
            created_at: list.created_at,
            updated_at: list.updated_at,
        }
    }
}

/// Body of `POST /sale`.
#[derive(Clone, Debug, Deserialize)]
pub struct CreateRequest {
    /// ID of the `Car` to list.
    pub car_id: Uuid,

    /// Asking price.
    pub price: f64,

    /// Description of the offer.
    pub description: Option<String>,

    /// ID of the owning manager.
    pub manager_id: Uuid,

    /// ID of the assigned employee.
    pub employee_id: Option<Uuid>,
}

/// Body of `PUT /sale/:id`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UpdateRequest {
    /// New asking price.
    pub price: Option<f64>,

    /// New description of the offer.
    pub description: Option<String>,

    /// New assigned employee.
    pub employee_id: Option<Uuid>,

    /// New status.
    pub status: Option<String>,
}

/// Query of `GET /sale/cars`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Status to list `SaleList`s in, `AVAILABLE` by default.
    pub status: Option<String>,

    /// Number of items to return.
    pub first: Option<usize>,

    /// Cursor after which to return items.
    pub after: Option<Uuid>,
}

/// Body of `POST /bycar/buy/:car_id`.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct BuyRequest {
    /// ID of the buying customer.
    pub customer_id: Uuid,

    /// ID of the employee closing the sale, if the `SaleList` has none.
    pub employee_id: Option<Uuid>,
}

/// `contract::Sale` representation.
#[derive(Clone, Debug, Serialize)]
pub struct SaleContract {
    /// ID of the contract.
    pub id: contract::Id,

    /// ID of the sold `SaleList`.
    pub sale_list_id: sale_list::Id,

    /// ID of the buyer.
    pub customer_id: customer::Id,

    /// ID of the employee who closed the sale.
    pub employee_id: employee::Id,

    /// Final price.
    pub price: f64,

    /// Currency of the `price`.
    pub currency: String,

    /// Creation datetime.
    pub created_at: contract::CreationDateTime,
}

impl From<contract::Sale> for SaleContract {
    fn from(c: contract::Sale) -> Self {
        Self {
            id: c.id,
            sale_list_id: c.sale_list_id,
            customer_id: c.customer_id,
            employee_id: c.employee_id,
            price: c.price.to_f64(),
            currency: c.price.currency.to_string(),
            created_at: c.created_at,
        }
    }
}

/// Parses an optional [`sale_list::Description`].
fn description(
    text: Option<String>,
) -> Result<Option<sale_list::Description>, Error> {
    text.map(|t| {
        sale_list::Description::new(t)
            .ok_or_else(|| api::InputError::Description.into())
    })
    .transpose()
}

/// Lists `SaleList`s in the requested status.
#[tracing::instrument(skip_all, fields(status = tracing::field::Empty))]
async fn list(
    Extension(service): Extension<Service>,
    q: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<api::Page<sale_list::Id, SaleListing>>, Error> {
    let Query(q) = q.map_err(AsError::into_error)?;
    let filter = match q.status.as_deref() {
        Some(s) => read::sale_list::list::Filter {
            status: api::status(s)?,
        },
        None => read::sale_list::list::Filter::default(),
    };
    _ = tracing::Span::current()
        .record("status", tracing::field::display(filter.status));

    let arguments = api::PageArgs {
        first: q.first,
        after: q.after,
    }
    .into_arguments()?;

    service
        .execute(query::sale_listings::List::by(
            read::sale_list::list::Selector { arguments, filter },
        ))
        .await
        .map_err(AsError::into_error)
        .map(|page| Json(page.into()))
}

/// Returns the available `SaleList` of a `Car`.
#[tracing::instrument(skip_all, fields(car_id = tracing::field::Empty))]
async fn available_by_car(
    Extension(service): Extension<Service>,
    car_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<SaleListing>, Error> {
    let Path(car_id) = car_id.map_err(AsError::into_error)?;
    let car_id = car::Id::from(car_id);
    _ = tracing::Span::current()
        .record("car_id", tracing::field::display(car_id));

    service
        .execute(query::sale_listing::AvailableByCar::by(car_id))
        .await
        .map_err(AsError::into_error)?
        .map(|read::sale_list::Available(list)| Json(list.into()))
        .ok_or_else(|| NotFoundError::Available.into())
}

/// Returns a `SaleList` by its ID.
#[tracing::instrument(skip_all, fields(id = tracing::field::Empty))]
async fn by_id(
    Extension(service): Extension<Service>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<SaleListing>, Error> {
    let Path(id) = id.map_err(AsError::into_error)?;
    let id = sale_list::Id::from(id);
    _ = tracing::Span::current().record("id", tracing::field::display(id));

    service
        .execute(query::sale_listing::ById::by(id))
        .await
        .map_err(AsError::into_error)?
        .map(|list| Json(list.into()))
        .ok_or_else(|| NotFoundError::SaleList.into())
}

/// Creates a new `SaleList`.
///
/// # Errors
///
/// Possible error codes:
/// - `CAR_NOT_EXISTS` - `Car` with the provided ID does not exist;
/// - `ALREADY_LISTED` - `Car` has an available `SaleList` already;
/// - `INVALID_PRICE` - price is not positive.
#[tracing::instrument(skip_all, fields(car_id = tracing::field::Empty))]
async fn create(
    Extension(service): Extension<Service>,
    req: Result<Json<CreateRequest>, JsonRejection>,
) -> Result<Json<SaleListing>, Error> {
    let Json(req) = req.map_err(AsError::into_error)?;
    _ = tracing::Span::current()
        .record("car_id", tracing::field::display(req.car_id));

    service
        .execute(command::CreateSaleListing {
            car_id: req.car_id.into(),
            price: api::money(&service, req.price)?,
            description: description(req.description)?,
            manager_id: req.manager_id.into(),
            employee_id: req.employee_id.map(Into::into),
        })
        .await
        .map_err(AsError::into_error)
        .map(|list| Json(list.into()))
}

/// Updates a `SaleList`.
///
/// # Errors
///
/// Possible error codes:
/// - `SALE_LIST_NOT_EXISTS` - `SaleList` with the provided ID does not exist;
/// - `INVALID_STATUS_TRANSITION` - requested status is unreachable;
/// - `ALREADY_LISTED` - another `SaleList` of the `Car` is available;
/// - `INVALID_PRICE` - price is not positive.
#[tracing::instrument(skip_all, fields(id = tracing::field::Empty))]
async fn update(
    Extension(service): Extension<Service>,
    id: Result<Path<Uuid>, PathRejection>,
    req: Result<Json<UpdateRequest>, JsonRejection>,
) -> Result<Json<SaleListing>, Error> {
    let Path(id) = id.map_err(AsError::into_error)?;
    let Json(req) = req.map_err(AsError::into_error)?;
    let id = sale_list::Id::from(id);
    _ = tracing::Span::current().record("id", tracing::field::display(id));

    service
        .execute(command::UpdateSaleListing {
            id,
            price: req
                .price
                .map(|p| api::money(&service, p))
                .transpose()?,
            description: description(req.description)?,
            employee_id: req.employee_id.map(Into::into),
            status: req.status.as_deref().map(api::status).transpose()?,
        })
        .await
        .map_err(AsError::into_error)
        .map(|list| Json(list.into()))
}

/// Issues a sale contract for the available `SaleList` of a `Car`.
///
/// # Errors
///
/// Possible error codes:
/// - `NO_AVAILABLE_SALE_LIST` - `Car` has no available `SaleList`;
/// - `CUSTOMER_NOT_EXISTS` - `Customer` with the provided ID does not exist;
/// - `NO_EMPLOYEE` - neither the `SaleList` nor the request name an employee.
#[tracing::instrument(
    skip_all,
    fields(car_id = tracing::field::Empty, customer_id = tracing::field::Empty),
)]
async fn buy(
    Extension(service): Extension<Service>,
    car_id: Result<Path<Uuid>, PathRejection>,
    req: Result<Json<BuyRequest>, JsonRejection>,
) -> Result<Json<SaleContract>, Error> {
    let Path(car_id) = car_id.map_err(AsError::into_error)?;
    let Json(req) = req.map_err(AsError::into_error)?;
    let span = tracing::Span::current();
    _ = span.record("car_id", tracing::field::display(car_id));
    _ = span.record("customer_id", tracing::field::display(req.customer_id));

    service
        .execute(command::IssueSaleContract {
            car_id: car_id.into(),
            customer_id: req.customer_id.into(),
            employee_id: req.employee_id.map(Into::into),
        })
        .await
        .map_err(AsError::into_error)
        .map(|c| Json(c.into()))
}

define_error! {
    enum ListingError {
        #[code = "ALREADY_LISTED"]
        #[status = CONFLICT]
        #[message = "`Car` has an available `SaleList` already"]
        AlreadyListed,

        #[code = "CAR_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Car` with the provided ID does not exist"]
        CarNotExists,

        #[code = "INVALID_PRICE"]
        #[status = BAD_REQUEST]
        #[message = "Price must be positive"]
        InvalidPrice,

        #[code = "INVALID_STATUS_TRANSITION"]
        #[status = CONFLICT]
        #[message = "`SaleList` cannot move to the requested status"]
        InvalidTransition,
    }
}

impl AsError for command::create_sale_listing::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::AlreadyListed(_) => Some(ListingError::AlreadyListed.into()),
            Self::CarNotExists(_) => Some(ListingError::CarNotExists.into()),
            Self::Db(e) => e.try_as_error(),
            Self::InvalidPrice(_) => Some(ListingError::InvalidPrice.into()),
        }
    }
}

impl AsError for command::update_sale_listing::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::AlreadyListed(_) => Some(ListingError::AlreadyListed.into()),
            Self::Db(e) => e.try_as_error(),
            Self::InvalidPrice(_) => Some(ListingError::InvalidPrice.into()),
            Self::InvalidTransition { .. } => {
                Some(ListingError::InvalidTransition.into())
            }
            Self::NotExists(_) => Some(NotFoundError::SaleList.into()),
        }
    }
}

impl AsError for command::issue_sale_contract::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "CUSTOMER_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`Customer` with the provided ID does not exist"]
                CustomerNotExists,

                #[code = "NO_EMPLOYEE"]
                #[status = BAD_REQUEST]
                #[message = "No employee is assigned to close the sale"]
                NoEmployee,
            }
        }

        match self {
            Self::CustomerNotExists(_) => Some(Error::CustomerNotExists.into()),
            Self::Db(e) => e.try_as_error(),
            Self::NoAvailableListing(_) => Some(NotFoundError::Available.into()),
            Self::NoEmployee(_) => Some(Error::NoEmployee.into()),
        }
    }
}
