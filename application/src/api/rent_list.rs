//! `RentList` REST endpoints.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path,
    },
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use common::Date;
use itertools::Itertools as _;
use serde::{Deserialize, Serialize};
use service::{
    command::{self, create_or_replace_rent_window::DateWindow},
    domain::{car, customer, manager, rent_date, rent_list, RentDate},
    query,
    read::rent_list::Schedule,
    Command as _,
};
use uuid::Uuid;

use crate::{api, define_error, AsError, Error, Service};

/// Builds [`Router`] of the `RentList` endpoints.
pub(crate) fn routes() -> Router {
    Router::new()
        .route("/rentlists", put(create_or_replace))
        .route("/rentlists/:car_id", get(by_car))
        .route("/rentlists/book/:car_id", post(book))
        .route("/rentlists/date/:date_id", delete(delete_date))
}

define_error! {
    enum NotFoundError {
        #[code = "CAR_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Car` with the provided ID does not exist"]
        Car,

        #[code = "RENT_DATE_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`RentDate` does not exist in the `RentList`"]
        Date,

        #[code = "RENT_LIST_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Car` is not listed for rent"]
        RentList,
    }
}

/// `RentList` representation along with its dates.
#[derive(Clone, Debug, Serialize)]
pub struct RentListing {
    /// ID of the `RentList`.
    pub id: rent_list::Id,

    /// ID of the listed `Car`.
    pub car_id: car::Id,

    /// ID of the owning manager.
    pub manager_id: manager::Id,

    /// Status of the `RentList`.
    pub status: String,

    /// Creation datetime.
    pub created_at: rent_list::CreationDateTime,

    /// Dates of the `RentList` ordered by their open dates.
    pub dates: Vec<RentWindow>,
}

impl From<Schedule> for RentListing {
    fn from(Schedule { list, dates }: Schedule) -> Self {
        Self {
            id: list.id,
            car_id: list.car_id,
            manager_id: list.manager_id,
            status: list.status.to_string(),
            created_at: list.created_at,
            dates: dates.into_iter().map(Into::into).collect(),
        }
    }
}

/// `RentDate` representation.
#[derive(Clone, Debug, Serialize)]
pub struct RentWindow {
    /// ID of the `RentDate`.
    pub id: rent_date::Id,

    /// First rentable day.
    pub open_date: Date,

    /// Last rentable day.
    pub close_date: Date,

    /// Rent price.
    pub price: f64,

    /// Currency of the `price`.
    pub currency: String,

    /// Status of the `RentDate`.
    pub status: String,

    /// ID of the customer who booked the `RentDate`.
    pub booked_by: Option<customer::Id>,

    /// Description of the `RentDate`.
    pub description: Option<String>,

    /// Creation datetime.
    pub created_at: rent_date::CreationDateTime,

    /// Last modification datetime.
    pub updated_at: rent_date::ModificationDateTime,
}

impl From<RentDate> for RentWindow {
    fn from(d: RentDate) -> Self {
        Self {
            id: d.id,
            open_date: d.open_date,
            close_date: d.close_date,
            price: d.price.to_f64(),
            currency: d.price.currency.to_string(),
            status: d.status.to_string(),
            booked_by: d.booked_by,
            description: d.description.map(|t| t.to_string()),
            created_at: d.created_at,
            updated_at: d.updated_at,
        }
    }
}

/// Body of `PUT /rentlists`.
#[derive(Clone, Debug, Deserialize)]
pub struct CreateOrReplaceRequest {
    /// ID of the `Car` to list for rent.
    pub car_id: Uuid,

    /// ID of the owning manager.
    pub manager_id: Uuid,

    /// Dates to create or replace.
    #[serde(default)]
    pub dates: Vec<DateRequest>,
}

/// Single date range of a [`CreateOrReplaceRequest`].
#[derive(Clone, Debug, Deserialize)]
pub struct DateRequest {
    /// ID of the replaced `RentDate`, if any.
    pub id: Option<Uuid>,

    /// First rentable day.
    pub open_date: Date,

    /// Last rentable day.
    pub close_date: Date,

    /// Rent price.
    pub price: f64,

    /// Description of the `RentDate`.
    pub description: Option<String>,
}

/// Body of `POST /rentlists/book/:car_id`.
#[derive(Clone, Debug, Deserialize)]
pub struct BookRequest {
    /// ID of the booking customer.
    pub customer_id: Uuid,

    /// IDs of the `RentDate`s to book.
    pub date_ids: Vec<Uuid>,
}

/// Defines or edits rentable dates of a `Car`.
///
/// # Errors
///
/// Possible error codes:
/// - `CAR_NOT_EXISTS` - `Car` with the provided ID does not exist;
/// - `RENT_DATE_NOT_EXISTS` - replaced date does not belong to the `RentList`;
/// - `INVALID_PRICE` - price is negative;
/// - `INVALID_RANGE` - range closes before it opens.
#[tracing::instrument(skip_all, fields(car_id = tracing::field::Empty))]
async fn create_or_replace(
    Extension(service): Extension<Service>,
    req: Result<Json<CreateOrReplaceRequest>, JsonRejection>,
) -> Result<Json<RentListing>, Error> {
    let Json(req) = req.map_err(AsError::into_error)?;
    _ = tracing::Span::current()
        .record("car_id", tracing::field::display(req.car_id));

    let dates = req
        .dates
        .into_iter()
        .map(|d| -> Result<_, Error> {
            Ok(DateWindow {
                id: d.id.map(Into::into),
                open_date: d.open_date,
                close_date: d.close_date,
                price: api::money(&service, d.price)?,
                description: d
                    .description
                    .map(|t| {
                        rent_date::Description::new(t)
                            .ok_or(api::InputError::Description)
                    })
                    .transpose()?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    service
        .execute(command::CreateOrReplaceRentWindow {
            car_id: req.car_id.into(),
            manager_id: req.manager_id.into(),
            dates,
        })
        .await
        .map_err(AsError::into_error)
        .map(|s| Json(s.into()))
}

/// Returns the `RentList` of a `Car` along with all its dates.
#[tracing::instrument(skip_all, fields(car_id = tracing::field::Empty))]
async fn by_car(
    Extension(service): Extension<Service>,
    car_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<RentListing>, Error> {
    let Path(car_id) = car_id.map_err(AsError::into_error)?;
    _ = tracing::Span::current()
        .record("car_id", tracing::field::display(car_id));

    service
        .execute(query::rent_list::ByCar(car_id.into()))
        .await
        .map_err(AsError::into_error)?
        .map(|s| Json(s.into()))
        .ok_or_else(|| NotFoundError::RentList.into())
}

/// Books the requested dates of a `Car` for a customer, all or none.
///
/// # Errors
///
/// Possible error codes:
/// - `RENT_LIST_NOT_EXISTS` - `Car` is not listed for rent;
/// - `RENT_DATE_NOT_EXISTS` - date does not belong to the `RentList`;
/// - `CUSTOMER_NOT_EXISTS` - `Customer` with the provided ID does not exist;
/// - `DATE_NOT_AVAILABLE` - date is booked already;
/// - `INVALID_DATES` - no dates or duplicated dates are requested.
#[tracing::instrument(
    skip_all,
    fields(
        car_id = tracing::field::Empty,
        customer_id = tracing::field::Empty,
        date_ids = tracing::field::Empty,
    ),
)]
async fn book(
    Extension(service): Extension<Service>,
    car_id: Result<Path<Uuid>, PathRejection>,
    req: Result<Json<BookRequest>, JsonRejection>,
) -> Result<Json<Vec<RentWindow>>, Error> {
    let Path(car_id) = car_id.map_err(AsError::into_error)?;
    let Json(req) = req.map_err(AsError::into_error)?;
    let span = tracing::Span::current();
    _ = span.record("car_id", tracing::field::display(car_id));
    _ = span.record("customer_id", tracing::field::display(req.customer_id));
    _ = span.record(
        "date_ids",
        tracing::field::display(req.date_ids.iter().format(", ")),
    );

    service
        .execute(command::BookDates {
            car_id: car_id.into(),
            customer_id: req.customer_id.into(),
            date_ids: req.date_ids.into_iter().map(Into::into).collect(),
        })
        .await
        .map_err(AsError::into_error)
        .map(|dates| Json(dates.into_iter().map(Into::into).collect()))
}

/// Removes a rentable date, succeeding if it is absent already.
#[tracing::instrument(skip_all, fields(date_id = tracing::field::Empty))]
async fn delete_date(
    Extension(service): Extension<Service>,
    date_id: Result<Path<Uuid>, PathRejection>,
) -> Result<http::StatusCode, Error> {
    let Path(date_id) = date_id.map_err(AsError::into_error)?;
    _ = tracing::Span::current()
        .record("date_id", tracing::field::display(date_id));

    service
        .execute(command::DeleteDateWindow { id: date_id.into() })
        .await
        .map_err(AsError::into_error)
        .map(|()| http::StatusCode::OK)
}

define_error! {
    enum WindowError {
        #[code = "INVALID_PRICE"]
        #[status = BAD_REQUEST]
        #[message = "Price must not be negative"]
        InvalidPrice,

        #[code = "INVALID_RANGE"]
        #[status = BAD_REQUEST]
        #[message = "Date range closes before it opens"]
        InvalidRange,
    }
}

impl AsError for command::create_or_replace_rent_window::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::CarNotExists(_) => Some(NotFoundError::Car.into()),
            Self::DateNotExists(id) => {
                Some(Error::from(NotFoundError::Date).about(id))
            }
            Self::Db(e) => e.try_as_error(),
            Self::InvalidPrice(_) => Some(WindowError::InvalidPrice.into()),
            Self::InvalidRange { .. } => Some(WindowError::InvalidRange.into()),
        }
    }
}

impl AsError for command::book_dates::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "CUSTOMER_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`Customer` with the provided ID does not exist"]
                CustomerNotExists,

                #[code = "DATE_NOT_AVAILABLE"]
                #[status = CONFLICT]
                #[message = "`RentDate` is booked already"]
                DateNotAvailable,

                #[code = "INVALID_DATES"]
                #[status = BAD_REQUEST]
                #[message = "At least one date must be requested, each only \
                             once"]
                InvalidDates,
            }
        }

        match self {
            Self::CustomerNotExists(_) => Some(Error::CustomerNotExists.into()),
            Self::DateNotAvailable(id) => Some(
                crate::Error::from(Error::DateNotAvailable).about(id),
            ),
            Self::DateNotExists(id) => {
                Some(crate::Error::from(NotFoundError::Date).about(id))
            }
            Self::Db(e) => e.try_as_error(),
            Self::DuplicateDate(_) | Self::NoDates => {
                Some(Error::InvalidDates.into())
            }
            Self::NotForRent(_) => Some(NotFoundError::RentList.into()),
        }
    }
}

impl AsError for command::delete_date_window::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
        }
    }
}

#[cfg(test)]
pub(crate) mod spec {
    use http::{Method, StatusCode};
    use serde_json::{json, Value};
    use uuid::Uuid;

    use crate::{api::fixture, Service};

    /// Lists a new `Car` for rent with two dates and returns the `Car` ID
    /// along with the created `RentList`.
    pub(crate) async fn rent_list(svc: &Service) -> (Uuid, Value) {
        let car_id = Uuid::from(fixture::car(svc).await);
        let (status, list) = fixture::request(
            svc,
            Method::PUT,
            "/rentlists",
            Some(json!({
                "car_id": car_id,
                "manager_id": Uuid::new_v4(),
                "dates": [{
                    "open_date": "2024-03-01",
                    "close_date": "2024-03-03",
                    "price": 1500,
                }, {
                    "open_date": "2024-03-04",
                    "close_date": "2024-03-05",
                    "price": 1000,
                    "description": "weekend",
                }],
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{list}");
        (car_id, list)
    }

    fn date_id(list: &Value, n: usize) -> Value {
        list["dates"][n]["id"].clone()
    }

    #[tokio::test]
    async fn defines_rent_window() {
        let svc = fixture::service();
        let (car_id, list) = rent_list(&svc).await;

        assert_eq!(list["status"], json!("FOR_RENT"));
        assert_eq!(list["dates"].as_array().unwrap().len(), 2);
        assert_eq!(list["dates"][0]["open_date"], json!("2024-03-01"));
        assert_eq!(list["dates"][0]["status"], json!("AVAILABLE"));
        assert_eq!(list["dates"][1]["description"], json!("weekend"));

        let (status, fetched) = fixture::request(
            &svc,
            Method::GET,
            format!("/rentlists/{car_id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["id"], list["id"]);
    }

    #[tokio::test]
    async fn unlisted_car_is_not_found() {
        let svc = fixture::service();
        let car_id = fixture::car(&svc).await;

        let (status, err) = fixture::request(
            &svc,
            Method::GET,
            format!("/rentlists/{car_id}"),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(err["code"], json!("RENT_LIST_NOT_EXISTS"));
    }

    #[tokio::test]
    async fn rejects_inverted_range() {
        let svc = fixture::service();
        let car_id = fixture::car(&svc).await;

        let (status, err) = fixture::request(
            &svc,
            Method::PUT,
            "/rentlists",
            Some(json!({
                "car_id": car_id,
                "manager_id": Uuid::new_v4(),
                "dates": [{
                    "open_date": "2024-03-05",
                    "close_date": "2024-03-01",
                    "price": 100,
                }],
            })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["code"], json!("INVALID_RANGE"));
    }

    #[tokio::test]
    async fn books_all_or_nothing() {
        let svc = fixture::service();
        let (car_id, list) = rent_list(&svc).await;
        let first = fixture::customer(&svc).await;
        let second = fixture::customer(&svc).await;

        let (status, booked) = fixture::request(
            &svc,
            Method::POST,
            format!("/rentlists/book/{car_id}"),
            Some(json!({
                "customer_id": first,
                "date_ids": [date_id(&list, 1)],
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{booked}");
        assert_eq!(booked[0]["status"], json!("BOOKED"));
        assert_eq!(booked[0]["booked_by"], json!(first));

        let (status, err) = fixture::request(
            &svc,
            Method::POST,
            format!("/rentlists/book/{car_id}"),
            Some(json!({
                "customer_id": second,
                "date_ids": [date_id(&list, 0), date_id(&list, 1)],
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(err["code"], json!("DATE_NOT_AVAILABLE"));
        let clashed = date_id(&list, 1);
        assert!(
            err["message"]
                .as_str()
                .unwrap()
                .contains(clashed.as_str().unwrap()),
            "{err}",
        );

        let (_, fetched) = fixture::request(
            &svc,
            Method::GET,
            format!("/rentlists/{car_id}"),
            None,
        )
        .await;
        assert_eq!(fetched["dates"][0]["status"], json!("AVAILABLE"));
        assert_eq!(fetched["dates"][0]["booked_by"], json!(null));
    }

    #[tokio::test]
    async fn rejects_bad_batches() {
        let svc = fixture::service();
        let (car_id, list) = rent_list(&svc).await;
        let customer_id = fixture::customer(&svc).await;

        for date_ids in [
            json!([]),
            json!([date_id(&list, 0), date_id(&list, 0)]),
        ] {
            let (status, err) = fixture::request(
                &svc,
                Method::POST,
                format!("/rentlists/book/{car_id}"),
                Some(json!({
                    "customer_id": customer_id,
                    "date_ids": date_ids,
                })),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(err["code"], json!("INVALID_DATES"));
        }

        let unknown = Uuid::new_v4();
        let (status, err) = fixture::request(
            &svc,
            Method::POST,
            format!("/rentlists/book/{car_id}"),
            Some(json!({
                "customer_id": customer_id,
                "date_ids": [unknown],
            })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(err["code"], json!("RENT_DATE_NOT_EXISTS"));
        assert!(
            err["message"].as_str().unwrap().contains(&unknown.to_string()),
            "{err}",
        );
    }

    #[tokio::test]
    async fn deletes_date_idempotently() {
        let svc = fixture::service();
        let (car_id, list) = rent_list(&svc).await;
        let uri = format!(
            "/rentlists/date/{}",
            date_id(&list, 0).as_str().unwrap(),
        );

        for _ in 0..2 {
            let (status, _) =
                fixture::request(&svc, Method::DELETE, &uri, None).await;
            assert_eq!(status, StatusCode::OK);
        }

        let (_, fetched) = fixture::request(
            &svc,
            Method::GET,
            format!("/rentlists/{car_id}"),
            None,
        )
        .await;
        assert_eq!(fetched["dates"].as_array().unwrap().len(), 1);
        assert_eq!(fetched["dates"][0]["id"], date_id(&list, 1));
    }
}
