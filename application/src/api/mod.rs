//! REST API definitions.

pub mod booking;
pub mod contract;
pub mod payment;
pub mod rent_list;
pub mod sale;

use std::str::FromStr;

use common::{pagination, Money};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{define_error, Error, Service};

define_error! {
    enum InputError {
        #[code = "INVALID_AMOUNT"]
        #[status = BAD_REQUEST]
        #[message = "Monetary amount must be a finite number"]
        Amount,

        #[code = "INVALID_CONTRACT_REFERENCE"]
        #[status = BAD_REQUEST]
        #[message = "Exactly one of `sale_contract_id` and \
                     `rent_contract_id` must be provided"]
        ContractRef,

        #[code = "INVALID_DATETIME"]
        #[status = BAD_REQUEST]
        #[message = "Datetime must be in RFC 3339 format"]
        DateTime,

        #[code = "INVALID_DESCRIPTION"]
        #[status = BAD_REQUEST]
        #[message = "Description must be a non-empty trimmed text"]
        Description,

        #[code = "INVALID_PROOF"]
        #[status = BAD_REQUEST]
        #[message = "Proof URL and method must be non-empty trimmed texts"]
        Proof,

        #[code = "INVALID_STATUS"]
        #[status = BAD_REQUEST]
        #[message = "Unknown status"]
        Status,
    }
}

define_error! {
    enum PaginationError {
        #[code = "INVALID_PAGINATION_ARGUMENTS"]
        #[status = BAD_REQUEST]
        #[message = "`first` must be between 1 and 100"]
        Invalid,
    }
}

/// Converts the provided JSON `amount` into [`Money`] of the [`Service`]
/// currency.
fn money(service: &Service, amount: f64) -> Result<Money, Error> {
    Money::from_f64(amount, service.config().currency)
        .ok_or_else(|| InputError::Amount.into())
}

/// Parses a case-insensitive status string.
fn status<S: FromStr>(status: &str) -> Result<S, Error> {
    status.parse().map_err(|_| InputError::Status.into())
}

/// Cursor pagination query parameters.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct PageArgs {
    /// Number of items to return.
    pub first: Option<usize>,

    /// Cursor after which to return items.
    pub after: Option<Uuid>,
}

impl PageArgs {
    /// Converts these [`PageArgs`] into [`pagination::Arguments`].
    fn into_arguments<C: From<Uuid>>(
        self,
    ) -> Result<pagination::Arguments<C>, Error> {
        pagination::Arguments::new(self.first, self.after.map(C::from))
            .ok_or_else(|| PaginationError::Invalid.into())
    }
}

/// Single page of a list.
#[derive(Clone, Debug, Serialize)]
pub struct Page<C, T> {
    /// Items on this [`Page`].
    pub items: Vec<T>,

    /// Cursor to request the next [`Page`] with.
    pub end_cursor: Option<C>,

    /// Indicator whether there are more items after this [`Page`].
    pub has_more: bool,
}

impl<C: Clone, I, T: From<I>> From<pagination::Page<C, I>> for Page<C, T> {
    fn from(page: pagination::Page<C, I>) -> Self {
        let end_cursor = page.end_cursor().cloned();
        let has_more = page.has_more;
        Self {
            items: page.into_nodes().map(T::from).collect(),
            end_cursor,
            has_more,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixture {
    //! Helpers for REST API tests.

    use axum::body::Body;
    use common::{operations::Insert, DateTime};
    use serde_json::Value;
    use service::{
        domain::{car, customer, Car, Customer},
        infra::{Database as _, Memory},
    };
    use tower::ServiceExt as _;

    use crate::Service;

    pub(crate) fn service() -> Service {
        Service::new(service::Config::default(), Memory::new())
    }

    pub(crate) async fn car(svc: &Service) -> car::Id {
        let id = car::Id::new();
        svc.database()
            .execute(Insert(Car {
                id,
                name: car::Name::new("Honda Civic").unwrap(),
                created_at: DateTime::now().coerce(),
            }))
            .await
            .unwrap();
        id
    }

    pub(crate) async fn customer(svc: &Service) -> customer::Id {
        let id = customer::Id::new();
        svc.database()
            .execute(Insert(Customer {
                id,
                name: customer::Name::new("Somchai").unwrap(),
                created_at: DateTime::now().coerce(),
            }))
            .await
            .unwrap();
        id
    }

    /// Sends a request to the [`crate::router()`] of the provided [`Service`].
    pub(crate) async fn request(
        svc: &Service,
        method: http::Method,
        uri: impl AsRef<str>,
        body: Option<Value>,
    ) -> (http::StatusCode, Value) {
        let req = http::Request::builder()
            .method(method)
            .uri(uri.as_ref())
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
            .unwrap();

        let resp = crate::router(svc.clone()).oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }
}

#[cfg(test)]
mod spec {
    use serde_json::json;

    use super::fixture;

    #[tokio::test]
    async fn rejects_out_of_range_page_size() {
        let svc = fixture::service();

        let (status, body) =
            fixture::request(&svc, http::Method::GET, "/sale/cars?first=0", None)
                .await;

        assert_eq!(status, http::StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], json!("INVALID_PAGINATION_ARGUMENTS"));
    }

    #[tokio::test]
    async fn rejects_malformed_json_body() {
        let svc = fixture::service();

        let (status, body) = fixture::request(
            &svc,
            http::Method::POST,
            "/bookings",
            Some(json!({ "customer_id": "not-a-uuid" })),
        )
        .await;

        assert_eq!(status, http::StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], json!("BAD_REQUEST"));
    }
}
