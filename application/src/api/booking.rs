//! `Booking` REST endpoints.

use axum::{
    extract::rejection::JsonRejection, routing::post, Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use service::{
    command,
    domain::{booking, customer, sale_list, Booking},
    Command as _,
};
use uuid::Uuid;

use crate::{define_error, AsError, Error, Service};

/// Builds [`Router`] of the `Booking` endpoints.
pub(crate) fn routes() -> Router {
    Router::new().route("/bookings", post(create))
}

/// Body of `POST /bookings`.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct CreateRequest {
    /// ID of the interested customer.
    pub customer_id: Uuid,

    /// ID of the `SaleList` of interest.
    pub sale_list_id: Uuid,
}

/// `Booking` representation.
#[derive(Clone, Debug, Serialize)]
pub struct BookingIntent {
    /// ID of the `Booking`.
    pub id: booking::Id,

    /// ID of the interested customer.
    pub customer_id: customer::Id,

    /// ID of the `SaleList` of interest.
    pub sale_list_id: sale_list::Id,

    /// Creation datetime.
    pub created_at: booking::CreationDateTime,
}

impl From<Booking> for BookingIntent {
    fn from(b: Booking) -> Self {
        Self {
            id: b.id,
            customer_id: b.customer_id,
            sale_list_id: b.sale_list_id,
            created_at: b.created_at,
        }
    }
}

/// Records a customer's interest in a `SaleList`.
///
/// # Errors
///
/// Possible error codes:
/// - `ALREADY_BOOKED` - customer has booked the `SaleList` already;
/// - `CUSTOMER_NOT_EXISTS` - `Customer` with the provided ID does not exist;
/// - `SALE_LIST_NOT_EXISTS` - `SaleList` with the provided ID does not exist.
#[tracing::instrument(
    skip_all,
    fields(
        customer_id = tracing::field::Empty,
        sale_list_id = tracing::field::Empty,
    ),
)]
async fn create(
    Extension(service): Extension<Service>,
    req: Result<Json<CreateRequest>, JsonRejection>,
) -> Result<(http::StatusCode, Json<BookingIntent>), Error> {
    let Json(req) = req.map_err(AsError::into_error)?;
    let span = tracing::Span::current();
    _ = span.record("customer_id", tracing::field::display(req.customer_id));
    _ = span.record("sale_list_id", tracing::field::display(req.sale_list_id));

    service
        .execute(command::RecordBookingIntent {
            customer_id: req.customer_id.into(),
            sale_list_id: req.sale_list_id.into(),
        })
        .await
        .map_err(AsError::into_error)
        .map(|b| (http::StatusCode::CREATED, Json(b.into())))
}

impl AsError for command::record_booking_intent::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "ALREADY_BOOKED"]
                #[status = CONFLICT]
                #[message = "`Customer` has booked the `SaleList` already"]
                AlreadyBooked,

                #[code = "CUSTOMER_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`Customer` with the provided ID does not exist"]
                CustomerNotExists,

                #[code = "SALE_LIST_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`SaleList` does not exist"]
                SaleListNotExists,
            }
        }

        match self {
            Self::AlreadyBooked(id) => {
                Some(crate::Error::from(Error::AlreadyBooked).about(id))
            }
            Self::CustomerNotExists(_) => Some(Error::CustomerNotExists.into()),
            Self::Db(e) => e.try_as_error(),
            Self::SaleListNotExists(_) => Some(Error::SaleListNotExists.into()),
        }
    }
}

#[cfg(test)]
mod spec {
    use http::{Method, StatusCode};
    use serde_json::json;
    use uuid::Uuid;

    use crate::api::fixture;

    #[tokio::test]
    async fn second_booking_of_same_pair_conflicts() {
        let svc = fixture::service();
        let car_id = fixture::car(&svc).await;
        let customer_id = fixture::customer(&svc).await;
        let (_, list) = fixture::request(
            &svc,
            Method::POST,
            "/sale",
            Some(json!({
                "car_id": car_id,
                "price": 100,
                "manager_id": Uuid::new_v4(),
            })),
        )
        .await;
        let body = json!({
            "customer_id": customer_id,
            "sale_list_id": list["id"],
        });

        let (status, booking) =
            fixture::request(&svc, Method::POST, "/bookings", Some(body.clone()))
                .await;
        assert_eq!(status, StatusCode::CREATED, "{booking}");
        assert_eq!(booking["sale_list_id"], list["id"]);

        let (status, err) =
            fixture::request(&svc, Method::POST, "/bookings", Some(body)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(err["code"], json!("ALREADY_BOOKED"));
        let existing = booking["id"].as_str().unwrap();
        assert!(err["message"].as_str().unwrap().contains(existing), "{err}");
    }

    #[tokio::test]
    async fn unknown_sale_list_is_not_found() {
        let svc = fixture::service();
        let customer_id = fixture::customer(&svc).await;

        let (status, err) = fixture::request(
            &svc,
            Method::POST,
            "/bookings",
            Some(json!({
                "customer_id": customer_id,
                "sale_list_id": Uuid::new_v4(),
            })),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(err["code"], json!("SALE_LIST_NOT_EXISTS"));
    }
}
