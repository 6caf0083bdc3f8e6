//! `Payment` REST endpoints.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query,
    },
    routing::{get, patch, post},
    Extension, Json, Router,
};
use common::DateTimeOf;
use serde::{Deserialize, Serialize};
use service::{
    command,
    domain::{
        contract, customer, employee,
        payment::{self, ContractRef, Proof, ProofMethod, ProofUrl},
        Payment,
    },
    query, read, Command as _,
};
use uuid::Uuid;

use crate::{api, define_error, AsError, Error, Service};

/// Builds [`Router`] of the `Payment` endpoints.
pub(crate) fn routes() -> Router {
    Router::new()
        .route("/payments", post(create).get(list))
        .route("/payments/customer/:customer_id", get(list_by_customer))
        .route("/payments/:id", get(by_id).delete(remove))
        .route("/payments/:id/status", patch(update_status))
        .route("/payments/:id/upload-proof", post(upload_proof))
}

define_error! {
    enum NotFoundError {
        #[code = "PAYMENT_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Payment` does not exist"]
        Payment,
    }
}

/// `Payment` representation.
#[derive(Clone, Debug, Serialize)]
pub struct PaymentView {
    /// ID of the `Payment`.
    pub id: payment::Id,

    /// ID of the paid sale contract.
    pub sale_contract_id: Option<contract::Id>,

    /// ID of the paid rent contract.
    pub rent_contract_id: Option<contract::Id>,

    /// ID of the payment method.
    pub method_id: payment::MethodId,

    /// Paid amount.
    pub amount: f64,

    /// Currency of the `amount`.
    pub currency: String,

    /// ID of the paying customer.
    pub customer_id: customer::Id,

    /// ID of the employee who accepted the `Payment`.
    pub employee_id: Option<employee::Id>,

    /// Status of the `Payment`.
    pub status: String,

    /// Reference to the uploaded proof file.
    pub proof_url: Option<String>,

    /// Way the proof was made with.
    pub proof_method: Option<String>,

    /// Datetime when the money was transferred.
    pub paid_at: payment::PaymentDateTime,

    /// Creation datetime.
    pub created_at: payment::CreationDateTime,

    /// Last modification datetime.
    pub updated_at: payment::ModificationDateTime,
}

impl From<Payment> for PaymentView {
    fn from(p: Payment) -> Self {
        let (sale_contract_id, rent_contract_id) = match p.contract {
            ContractRef::Sale(id) => (Some(id), None),
            ContractRef::Rent(id) => (None, Some(id)),
        };
        let (proof_url, proof_method) = p
            .proof
            .map(|Proof { url, method }| (url.to_string(), method.to_string()))
            .unzip();
        Self {
            id: p.id,
            sale_contract_id,
            rent_contract_id,
            method_id: p.method_id,
            amount: p.amount.to_f64(),
            currency: p.amount.currency.to_string(),
            customer_id: p.customer_id,
            employee_id: p.employee_id,
            status: p.status.to_string(),
            proof_url,
            proof_method,
            paid_at: p.paid_at,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// Body of `POST /payments`.
#[derive(Clone, Debug, Deserialize)]
pub struct CreateRequest {
    /// ID of the paid sale contract.
    pub sale_contract_id: Option<Uuid>,

    /// ID of the paid rent contract.
    pub rent_contract_id: Option<Uuid>,

    /// ID of the payment method.
    pub method_id: Uuid,

    /// Paid amount.
    pub amount: f64,

    /// ID of the paying customer.
    pub customer_id: Uuid,

    /// ID of the employee who accepted the `Payment`.
    pub employee_id: Option<Uuid>,

    /// Initial status, `PENDING` by default.
    pub status: Option<String>,

    /// RFC 3339 datetime when the money was transferred, now by default.
    pub paid_at: Option<String>,
}

/// Body of `PATCH /payments/:id/status`.
#[derive(Clone, Debug, Deserialize)]
pub struct StatusRequest {
    /// New status.
    pub status: String,
}

/// Body of `POST /payments/:id/upload-proof`.
#[derive(Clone, Debug, Deserialize)]
pub struct ProofRequest {
    /// Reference to the uploaded proof file.
    pub proof_url: String,

    /// Way the proof was made with.
    pub proof_method: String,
}

/// Records a new `Payment` against a contract.
///
/// # Errors
///
/// Possible error codes:
/// - `INVALID_CONTRACT_REFERENCE` - not exactly one contract is referenced;
/// - `CONTRACT_NOT_EXISTS` - referenced contract does not exist;
/// - `CUSTOMER_NOT_EXISTS` - `Customer` with the provided ID does not exist;
/// - `INVALID_AMOUNT` - amount is not positive.
#[tracing::instrument(skip_all, fields(customer_id = tracing::field::Empty))]
async fn create(
    Extension(service): Extension<Service>,
    req: Result<Json<CreateRequest>, JsonRejection>,
) -> Result<(http::StatusCode, Json<PaymentView>), Error> {
    let Json(req) = req.map_err(AsError::into_error)?;
    _ = tracing::Span::current()
        .record("customer_id", tracing::field::display(req.customer_id));

    let contract = match (req.sale_contract_id, req.rent_contract_id) {
        (Some(id), None) => ContractRef::Sale(id.into()),
        (None, Some(id)) => ContractRef::Rent(id.into()),
        (Some(_), Some(_)) | (None, None) => {
            return Err(api::InputError::ContractRef.into());
        }
    };
    let paid_at = req
        .paid_at
        .as_deref()
        .map(|s| {
            DateTimeOf::from_rfc3339(s).map_err(|_| api::InputError::DateTime)
        })
        .transpose()?;

    service
        .execute(command::RecordPayment {
            contract,
            method_id: req.method_id.into(),
            amount: api::money(&service, req.amount)?,
            customer_id: req.customer_id.into(),
            employee_id: req.employee_id.map(Into::into),
            status: req.status.as_deref().map(api::status).transpose()?,
            paid_at,
        })
        .await
        .map_err(AsError::into_error)
        .map(|p| (http::StatusCode::CREATED, Json(p.into())))
}

/// Lists all `Payment`s.
#[tracing::instrument(skip_all)]
async fn list(
    Extension(service): Extension<Service>,
    args: Result<Query<api::PageArgs>, QueryRejection>,
) -> Result<Json<api::Page<payment::Id, PaymentView>>, Error> {
    let Query(args) = args.map_err(AsError::into_error)?;

    select(&service, args, read::payment::list::Filter::default()).await
}

/// Lists `Payment`s of a customer.
#[tracing::instrument(skip_all, fields(customer_id = tracing::field::Empty))]
async fn list_by_customer(
    Extension(service): Extension<Service>,
    customer_id: Result<Path<Uuid>, PathRejection>,
    args: Result<Query<api::PageArgs>, QueryRejection>,
) -> Result<Json<api::Page<payment::Id, PaymentView>>, Error> {
    let Path(customer_id) = customer_id.map_err(AsError::into_error)?;
    let Query(args) = args.map_err(AsError::into_error)?;
    _ = tracing::Span::current()
        .record("customer_id", tracing::field::display(customer_id));

    select(
        &service,
        args,
        read::payment::list::Filter {
            customer_id: Some(customer_id.into()),
        },
    )
    .await
}

/// Selects a page of `Payment`s matching the `filter`.
async fn select(
    service: &Service,
    args: api::PageArgs,
    filter: read::payment::list::Filter,
) -> Result<Json<api::Page<payment::Id, PaymentView>>, Error> {
    let arguments = args.into_arguments()?;

    service
        .execute(query::payments::List::by(read::payment::list::Selector {
            arguments,
            filter,
        }))
        .await
        .map_err(AsError::into_error)
        .map(|page| Json(page.into()))
}

/// Returns a `Payment` by its ID.
#[tracing::instrument(skip_all, fields(id = tracing::field::Empty))]
async fn by_id(
    Extension(service): Extension<Service>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<PaymentView>, Error> {
    let Path(id) = id.map_err(AsError::into_error)?;
    _ = tracing::Span::current().record("id", tracing::field::display(id));

    service
        .execute(query::payment::ById::by(id.into()))
        .await
        .map_err(AsError::into_error)?
        .map(|p| Json(p.into()))
        .ok_or_else(|| NotFoundError::Payment.into())
}

/// Deletes a `Payment`, returning it.
#[tracing::instrument(skip_all, fields(id = tracing::field::Empty))]
async fn remove(
    Extension(service): Extension<Service>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<PaymentView>, Error> {
    let Path(id) = id.map_err(AsError::into_error)?;
    _ = tracing::Span::current().record("id", tracing::field::display(id));

    service
        .execute(command::DeletePayment { id: id.into() })
        .await
        .map_err(AsError::into_error)
        .map(|p| Json(p.into()))
}

/// Moves a `Payment` to another status.
///
/// # Errors
///
/// Possible error codes:
/// - `INVALID_STATUS` - status is unknown;
/// - `INVALID_STATUS_TRANSITION` - status is unreachable from the current one;
/// - `PAYMENT_NOT_EXISTS` - `Payment` with the provided ID does not exist.
#[tracing::instrument(
    skip_all,
    fields(id = tracing::field::Empty, status = tracing::field::Empty),
)]
async fn update_status(
    Extension(service): Extension<Service>,
    id: Result<Path<Uuid>, PathRejection>,
    req: Result<Json<StatusRequest>, JsonRejection>,
) -> Result<Json<PaymentView>, Error> {
    let Path(id) = id.map_err(AsError::into_error)?;
    let Json(req) = req.map_err(AsError::into_error)?;
    let status: payment::Status = api::status(&req.status)?;
    let span = tracing::Span::current();
    _ = span.record("id", tracing::field::display(id));
    _ = span.record("status", tracing::field::display(status));

    service
        .execute(command::UpdatePaymentStatus {
            id: id.into(),
            status,
        })
        .await
        .map_err(AsError::into_error)
        .map(|p| Json(p.into()))
}

/// Attaches an uploaded proof to a `Payment`.
///
/// # Errors
///
/// Possible error codes:
/// - `INVALID_PROOF` - proof URL or method is malformed;
/// - `PAYMENT_CONFIRMED` - `Payment` is confirmed already;
/// - `PAYMENT_NOT_EXISTS` - `Payment` with the provided ID does not exist.
#[tracing::instrument(skip_all, fields(id = tracing::field::Empty))]
async fn upload_proof(
    Extension(service): Extension<Service>,
    id: Result<Path<Uuid>, PathRejection>,
    req: Result<Json<ProofRequest>, JsonRejection>,
) -> Result<Json<PaymentView>, Error> {
    let Path(id) = id.map_err(AsError::into_error)?;
    let Json(req) = req.map_err(AsError::into_error)?;
    _ = tracing::Span::current().record("id", tracing::field::display(id));

    let proof = ProofUrl::new(req.proof_url)
        .zip(ProofMethod::new(req.proof_method))
        .map(|(url, method)| Proof { url, method })
        .ok_or(api::InputError::Proof)?;

    service
        .execute(command::AttachPaymentProof {
            payment_id: id.into(),
            proof,
        })
        .await
        .map_err(AsError::into_error)
        .map(|p| Json(p.into()))
}

impl AsError for command::record_payment::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "CONTRACT_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`Contract` of the referenced kind does not exist"]
                ContractNotExists,

                #[code = "CUSTOMER_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`Customer` with the provided ID does not exist"]
                CustomerNotExists,

                #[code = "INVALID_AMOUNT"]
                #[status = BAD_REQUEST]
                #[message = "Amount must be positive"]
                InvalidAmount,
            }
        }

        match self {
            Self::ContractNotExists(_) => Some(Error::ContractNotExists.into()),
            Self::CustomerNotExists(_) => Some(Error::CustomerNotExists.into()),
            Self::Db(e) => e.try_as_error(),
            Self::InvalidAmount(_) => Some(Error::InvalidAmount.into()),
        }
    }
}

impl AsError for command::attach_payment_proof::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "PAYMENT_CONFIRMED"]
                #[status = CONFLICT]
                #[message = "`Payment` is confirmed already"]
                AlreadyConfirmed,
            }
        }

        match self {
            Self::AlreadyConfirmed(_) => Some(Error::AlreadyConfirmed.into()),
            Self::Db(e) => e.try_as_error(),
            Self::NotExists(_) => Some(NotFoundError::Payment.into()),
        }
    }
}

impl AsError for command::update_payment_status::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "INVALID_STATUS_TRANSITION"]
                #[status = CONFLICT]
                #[message = "`Payment` cannot move to the requested status"]
                InvalidTransition,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::InvalidTransition { .. } => {
                Some(Error::InvalidTransition.into())
            }
            Self::NotExists(_) => Some(NotFoundError::Payment.into()),
        }
    }
}

impl AsError for command::delete_payment::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NotExists(_) => Some(NotFoundError::Payment.into()),
        }
    }
}

#[cfg(test)]
mod spec {
    use http::{Method, StatusCode};
    use serde_json::{json, Value};
    use uuid::Uuid;

    use crate::{api::fixture, Service};

    /// Sells a new `Car` and returns the sale contract ID along with the
    /// buyer ID.
    async fn sale_contract(svc: &Service) -> (Value, Value) {
        let car_id = fixture::car(svc).await;
        let customer_id = fixture::customer(svc).await;
        _ = fixture::request(
            svc,
            Method::POST,
            "/sale",
            Some(json!({
                "car_id": car_id,
                "price": 500_000,
                "manager_id": Uuid::new_v4(),
                "employee_id": Uuid::new_v4(),
            })),
        )
        .await;
        let (status, contract) = fixture::request(
            svc,
            Method::POST,
            format!("/bycar/buy/{car_id}"),
            Some(json!({ "customer_id": customer_id })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{contract}");
        (contract["id"].clone(), json!(customer_id))
    }

    async fn payment(svc: &Service) -> (String, Value) {
        let (contract_id, customer_id) = sale_contract(svc).await;
        let (status, payment) = fixture::request(
            svc,
            Method::POST,
            "/payments",
            Some(json!({
                "sale_contract_id": contract_id,
                "method_id": Uuid::new_v4(),
                "amount": 100_000,
                "customer_id": customer_id,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{payment}");
        (format!("/payments/{}", payment["id"].as_str().unwrap()), payment)
    }

    #[tokio::test]
    async fn records_pending_payment() {
        let svc = fixture::service();
        let (uri, payment) = payment(&svc).await;

        assert_eq!(payment["status"], json!("PENDING"));
        assert_eq!(payment["rent_contract_id"], json!(null));
        assert_eq!(payment["proof_url"], json!(null));

        let (status, fetched) =
            fixture::request(&svc, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["amount"], json!(100_000.0));
    }

    #[tokio::test]
    async fn requires_exactly_one_contract() {
        let svc = fixture::service();
        let customer_id = fixture::customer(&svc).await;

        for refs in [
            json!({}),
            json!({
                "sale_contract_id": Uuid::new_v4(),
                "rent_contract_id": Uuid::new_v4(),
            }),
        ] {
            let mut body = json!({
                "method_id": Uuid::new_v4(),
                "amount": 10,
                "customer_id": customer_id,
            });
            for (k, v) in refs.as_object().unwrap() {
                body[k] = v.clone();
            }

            let (status, err) =
                fixture::request(&svc, Method::POST, "/payments", Some(body))
                    .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(err["code"], json!("INVALID_CONTRACT_REFERENCE"));
        }
    }

    #[tokio::test]
    async fn rejects_wrong_contract_kind() {
        let svc = fixture::service();
        let (contract_id, customer_id) = sale_contract(&svc).await;

        let (status, err) = fixture::request(
            &svc,
            Method::POST,
            "/payments",
            Some(json!({
                "rent_contract_id": contract_id,
                "method_id": Uuid::new_v4(),
                "amount": 10,
                "customer_id": customer_id,
            })),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(err["code"], json!("CONTRACT_NOT_EXISTS"));
    }

    #[tokio::test]
    async fn confirmed_payment_keeps_its_status() {
        let svc = fixture::service();
        let (uri, _) = payment(&svc).await;

        let (status, confirmed) = fixture::request(
            &svc,
            Method::PATCH,
            format!("{uri}/status"),
            Some(json!({ "status": "confirmed" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(confirmed["status"], json!("CONFIRMED"));

        let (status, err) = fixture::request(
            &svc,
            Method::POST,
            format!("{uri}/upload-proof"),
            Some(json!({
                "proof_url": "https://files.example/slip.png",
                "proof_method": "bank_slip",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(err["code"], json!("PAYMENT_CONFIRMED"));

        let (status, err) = fixture::request(
            &svc,
            Method::PATCH,
            format!("{uri}/status"),
            Some(json!({ "status": "pending" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(err["code"], json!("INVALID_STATUS_TRANSITION"));

        let (status, err) = fixture::request(
            &svc,
            Method::PATCH,
            format!("{uri}/status"),
            Some(json!({ "status": "checking" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["code"], json!("INVALID_STATUS"));
    }

    #[tokio::test]
    async fn uploads_proof_onto_rejected_payment() {
        let svc = fixture::service();
        let (uri, _) = payment(&svc).await;
        _ = fixture::request(
            &svc,
            Method::PATCH,
            format!("{uri}/status"),
            Some(json!({ "status": "REJECTED" })),
        )
        .await;

        let (status, updated) = fixture::request(
            &svc,
            Method::POST,
            format!("{uri}/upload-proof"),
            Some(json!({
                "proof_url": "https://files.example/slip.png",
                "proof_method": "bank_slip",
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK, "{updated}");
        assert_eq!(updated["status"], json!("PENDING"));
        assert_eq!(updated["proof_method"], json!("bank_slip"));
    }

    #[tokio::test]
    async fn lists_payments_of_customer() {
        let svc = fixture::service();
        let (_, first) = payment(&svc).await;
        let (_, second) = payment(&svc).await;

        let (status, all) =
            fixture::request(&svc, Method::GET, "/payments", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(all["items"].as_array().unwrap().len(), 2);

        let (status, own) = fixture::request(
            &svc,
            Method::GET,
            format!(
                "/payments/customer/{}",
                first["customer_id"].as_str().unwrap(),
            ),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let items = own["items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["id"], first["id"]);
        assert_ne!(items[0]["id"], second["id"]);
    }

    #[tokio::test]
    async fn deletes_payment_once() {
        let svc = fixture::service();
        let (uri, payment) = payment(&svc).await;

        let (status, deleted) =
            fixture::request(&svc, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(deleted["id"], payment["id"]);

        let (status, err) =
            fixture::request(&svc, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(err["code"], json!("PAYMENT_NOT_EXISTS"));

        let (status, _) = fixture::request(&svc, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
