//! Remote REST Adapter
//!
//! Implements [`SalesPort`] by forwarding every operation to a ledger
//! backend over HTTP. The backend owns the engines and the transaction
//! boundaries; this adapter only translates requests, responses and error
//! bodies.
//!
//! # Error Handling
//!
//! Two error body formats are understood:
//!
//! - the ledger's own `{"error", "message", "fields": [{"field", "message"}]}`
//! - FastAPI style `{"detail": [{"loc": [...], "msg"}]}` or `{"detail": "text"}`,
//!   where `loc` is joined with `.` to name the field
//!
//! Statuses map onto [`SalesError`]:
//! - 404 -> `NotFound`
//! - 400 / 422 -> `Validation`
//! - 409 -> `LinkageAmbiguity` when the body names candidates, else `Validation`
//! - timeouts and refused connections -> transient `Storage`
//! - anything else -> `Storage` carrying `HTTP status: message`

use std::str::FromStr;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use core_kernel::{
    AdapterType, ContractId, DomainPort, HealthCheckResult, HealthCheckable, HouseId, Money,
    PaymentId, PortError, ReceiptId, RemoteConfig, ResaleId,
};

use crate::contract::{Contract, NewContract, RemainingBalance};
use crate::error::{entity_label, SalesError};
use crate::house::{BulkHouseReport, BulkHouses, House, HouseFilter, NewHouse, SoldHouse};
use crate::payment::{NewPayment, Payment};
use crate::ports::SalesPort;
use crate::receipt::{NewReceipt, Receipt, ReceiptIssued, ReceiptRemoval};
use crate::resale::{NewResaleListing, ResaleView};
use crate::statistics::SalesStatistics;
use crate::validation::{FieldError, ValidationErrors};

const ADAPTER_ID: &str = "remote_rest";

/// Error body of the ledger's own API
#[derive(Debug, Deserialize)]
struct LedgerErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    entity: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    fields: Vec<FieldError>,
    #[serde(default)]
    receipt_id: Option<ReceiptId>,
    #[serde(default)]
    candidates: Vec<ContractId>,
}

#[derive(Debug, Deserialize)]
struct FastApiIssue {
    #[serde(default)]
    loc: Vec<serde_json::Value>,
    msg: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FastApiDetail {
    Issues(Vec<FastApiIssue>),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct FastApiErrorBody {
    detail: FastApiDetail,
}

/// Normalized content of an error response
#[derive(Debug, Default, PartialEq)]
struct ErrorReport {
    message: String,
    /// Entity and id of a missing record, when the backend names them
    missing: Option<(String, String)>,
    fields: ValidationErrors,
    receipt_id: Option<ReceiptId>,
    candidates: Vec<ContractId>,
}

fn join_loc(loc: &[serde_json::Value]) -> String {
    loc.iter()
        .map(|part| match part {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// Reads whichever error format the body uses
fn parse_error_body(body: &str) -> ErrorReport {
    if let Ok(parsed) = serde_json::from_str::<FastApiErrorBody>(body) {
        return match parsed.detail {
            FastApiDetail::Text(text) => ErrorReport {
                message: text,
                ..Default::default()
            },
            FastApiDetail::Issues(issues) => {
                let mut fields = ValidationErrors::new();
                for issue in &issues {
                    fields.push(FieldError::new(join_loc(&issue.loc), issue.msg.clone()));
                }
                ErrorReport {
                    message: fields.to_string(),
                    fields,
                    ..Default::default()
                }
            }
        };
    }

    if let Ok(parsed) = serde_json::from_str::<LedgerErrorBody>(body) {
        let fields = ValidationErrors::from(parsed.fields);
        let message = parsed
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| fields.to_string());
        return ErrorReport {
            message,
            missing: parsed.entity.zip(parsed.id),
            fields,
            receipt_id: parsed.receipt_id,
            candidates: parsed.candidates,
        };
    }

    ErrorReport {
        message: body.trim().to_string(),
        ..Default::default()
    }
}

/// Entity label and id of a resource path such as `/contracts/7`
fn describe_path(path: &str) -> (&'static str, String) {
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    let entity = match segments.first().copied() {
        Some("houses") => "House",
        Some("receipts") => "Receipt",
        Some("contracts") => "Contract",
        Some("payments") => "Payment",
        Some("resale") => "ResaleListing",
        _ => "Record",
    };
    let id = segments
        .iter()
        .rev()
        .find(|s| s.parse::<i64>().is_ok())
        .map(|s| s.to_string())
        .unwrap_or_default();
    (entity, id)
}

/// Maps a non-success response onto the domain error
fn error_for_status(status: StatusCode, path: &str, body: &str) -> SalesError {
    let report = parse_error_body(body);
    match status {
        StatusCode::NOT_FOUND => match report.missing {
            Some((entity, id)) => SalesError::NotFound {
                entity: entity_label(&entity),
                id,
            },
            None => {
                let (entity, id) = describe_path(path);
                SalesError::NotFound { entity, id }
            }
        },
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            if report.fields.is_empty() {
                SalesError::invalid("request", report.message)
            } else {
                SalesError::Validation(report.fields)
            }
        }
        StatusCode::CONFLICT => match report.receipt_id {
            Some(receipt_id) if !report.candidates.is_empty() => SalesError::LinkageAmbiguity {
                receipt_id,
                candidates: report.candidates,
            },
            _ => SalesError::invalid("request", report.message),
        },
        other => SalesError::Storage(PortError::Remote {
            status: other.as_u16(),
            message: report.message,
        }),
    }
}

fn transport_error(err: reqwest::Error, operation: &str, timeout: Duration) -> SalesError {
    let port = if err.is_timeout() {
        PortError::Timeout {
            operation: operation.to_string(),
            duration_ms: timeout.as_millis() as u64,
        }
    } else if err.is_connect() || err.is_request() {
        PortError::Connection {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    } else if err.is_decode() {
        PortError::transformation(err.to_string())
    } else {
        PortError::Internal {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    };
    SalesError::Storage(port)
}

/// [`SalesPort`] over a remote ledger backend
///
/// # Example
///
/// ```rust,ignore
/// use core_kernel::RemoteConfig;
/// use domain_sales::adapters::RemoteSalesAdapter;
///
/// let adapter = RemoteSalesAdapter::new(RemoteConfig::new("http://10.0.0.5:8001/api"))?;
/// let houses = adapter.list_houses(HouseFilter::available_only()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct RemoteSalesAdapter {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl RemoteSalesAdapter {
    /// Builds the HTTP client from the remote settings
    ///
    /// # Errors
    ///
    /// Returns `PortError::Internal` if a configured header is not a valid
    /// HTTP header or the client cannot be built.
    pub fn new(config: RemoteConfig) -> Result<Self, PortError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::from_str(name)
                .map_err(|e| PortError::internal(format!("invalid header name {name}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| PortError::internal(format!("invalid header value for {name}: {e}")))?;
            headers.insert(name, value);
        }

        let timeout = Duration::from_secs(config.timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| PortError::Internal {
                message: "failed to build HTTP client".to_string(),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Server root, i.e. the base URL without its `/api` prefix
    fn root_url(&self) -> &str {
        self.base_url.strip_suffix("/api").unwrap_or(&self.base_url)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url(path))
    }

    async fn send(&self, builder: RequestBuilder, path: &str) -> Result<reqwest::Response, SalesError> {
        let response = builder
            .send()
            .await
            .map_err(|e| transport_error(e, path, self.timeout))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        warn!(%status, path, "Remote backend rejected request");
        Err(error_for_status(status, path, &body))
    }

    async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder, path: &str) -> Result<T, SalesError> {
        let response = self.send(builder, path).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| transport_error(e, path, self.timeout))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, SalesError> {
        debug!(path, "GET");
        self.fetch(self.request(Method::GET, path), path).await
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, SalesError> {
        debug!(path, "POST");
        self.fetch(self.request(Method::POST, path).json(body), path).await
    }

    async fn put<B: Serialize + Sync, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, SalesError> {
        debug!(path, "PUT");
        self.fetch(self.request(Method::PUT, path).json(body), path).await
    }

    async fn delete_unit(&self, path: &str) -> Result<(), SalesError> {
        debug!(path, "DELETE");
        self.send(self.request(Method::DELETE, path), path).await?;
        Ok(())
    }

    async fn delete_returning<T: DeserializeOwned>(&self, path: &str) -> Result<T, SalesError> {
        debug!(path, "DELETE");
        self.fetch(self.request(Method::DELETE, path), path).await
    }
}

impl DomainPort for RemoteSalesAdapter {}

#[async_trait]
impl HealthCheckable for RemoteSalesAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        let started = Instant::now();
        let url = format!("{}/health", self.root_url());
        let outcome = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status());
        let latency_ms = started.elapsed().as_millis() as u64;
        match outcome {
            Ok(_) => HealthCheckResult::healthy(ADAPTER_ID, AdapterType::ExternalRestApi, latency_ms),
            Err(e) => HealthCheckResult::unhealthy(ADAPTER_ID, AdapterType::ExternalRestApi, latency_ms, e.to_string()),
        }
    }
}

#[async_trait]
impl SalesPort for RemoteSalesAdapter {
    #[instrument(skip(self))]
    async fn list_houses(&self, filter: HouseFilter) -> Result<Vec<House>, SalesError> {
        let path = "/houses";
        self.fetch(self.request(Method::GET, path).query(&filter), path).await
    }

    async fn get_house(&self, id: HouseId) -> Result<House, SalesError> {
        self.get(&format!("/houses/{id}")).await
    }

    #[instrument(skip(self, house))]
    async fn create_house(&self, house: NewHouse) -> Result<House, SalesError> {
        self.post("/houses", &house).await
    }

    async fn create_houses_bulk(&self, request: BulkHouses) -> Result<BulkHouseReport, SalesError> {
        self.post("/houses/bulk", &request).await
    }

    #[instrument(skip(self, house))]
    async fn update_house(&self, id: HouseId, house: NewHouse) -> Result<House, SalesError> {
        self.put(&format!("/houses/{id}"), &house).await
    }

    async fn delete_house(&self, id: HouseId) -> Result<(), SalesError> {
        self.delete_unit(&format!("/houses/{id}")).await
    }

    async fn list_receipts(&self) -> Result<Vec<Receipt>, SalesError> {
        self.get("/receipts").await
    }

    async fn get_receipt(&self, id: ReceiptId) -> Result<Receipt, SalesError> {
        self.get(&format!("/receipts/{id}")).await
    }

    #[instrument(skip(self, receipt))]
    async fn create_receipt(&self, receipt: NewReceipt) -> Result<ReceiptIssued, SalesError> {
        self.post("/receipts", &receipt).await
    }

    #[instrument(skip(self))]
    async fn delete_receipt(&self, id: ReceiptId) -> Result<ReceiptRemoval, SalesError> {
        self.delete_returning(&format!("/receipts/{id}")).await
    }

    async fn list_contracts(&self) -> Result<Vec<Contract>, SalesError> {
        self.get("/contracts").await
    }

    async fn get_contract(&self, id: ContractId) -> Result<Contract, SalesError> {
        self.get(&format!("/contracts/{id}")).await
    }

    #[instrument(skip(self, contract))]
    async fn create_contract(&self, contract: NewContract) -> Result<Contract, SalesError> {
        self.post("/contracts", &contract).await
    }

    #[instrument(skip(self, contract))]
    async fn update_contract(&self, id: ContractId, contract: NewContract) -> Result<Contract, SalesError> {
        self.put(&format!("/contracts/{id}"), &contract).await
    }

    async fn delete_contract(&self, id: ContractId) -> Result<(), SalesError> {
        self.delete_unit(&format!("/contracts/{id}")).await
    }

    async fn remaining_amount(&self, id: ContractId) -> Result<Money, SalesError> {
        let balance: RemainingBalance = self.get(&format!("/contracts/{id}/remaining")).await?;
        Ok(balance.remaining_amount)
    }

    async fn sold_houses(&self) -> Result<Vec<SoldHouse>, SalesError> {
        self.get("/contracts/sold-houses").await
    }

    async fn payments_for_contract(&self, contract_id: ContractId) -> Result<Vec<Payment>, SalesError> {
        self.get(&format!("/contracts/{contract_id}/payments")).await
    }

    #[instrument(skip(self, payment))]
    async fn add_payment(&self, payment: NewPayment) -> Result<Payment, SalesError> {
        self.post("/payments", &payment).await
    }

    async fn delete_payment(&self, id: PaymentId) -> Result<Payment, SalesError> {
        self.delete_returning(&format!("/payments/{id}")).await
    }

    async fn list_resale(&self) -> Result<Vec<ResaleView>, SalesError> {
        self.get("/resale").await
    }

    #[instrument(skip(self, listing))]
    async fn create_resale(&self, listing: NewResaleListing) -> Result<ResaleView, SalesError> {
        self.post("/resale", &listing).await
    }

    async fn delete_resale(&self, id: ResaleId) -> Result<(), SalesError> {
        self.delete_unit(&format!("/resale/{id}")).await
    }

    async fn statistics(&self) -> Result<SalesStatistics, SalesError> {
        self.get("/statistics").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod error_body_tests {
        use super::*;

        #[test]
        fn test_ledger_body_with_fields() {
            let body = r#"{"error":"validation_error","message":"Validation failed","fields":[{"field":"amount","message":"must be greater than zero"}]}"#;
            let err = error_for_status(StatusCode::UNPROCESSABLE_ENTITY, "/payments", body);
            match err {
                SalesError::Validation(fields) => {
                    assert!(fields.has_field("amount"));
                    assert_eq!(fields.len(), 1);
                }
                other => panic!("expected validation error, got {other:?}"),
            }
        }

        #[test]
        fn test_fastapi_issue_list_joins_loc() {
            let body = r#"{"detail":[{"loc":["body","amount"],"msg":"field required"},{"loc":["body",0,"buyer_name"],"msg":"too long"}]}"#;
            let report = parse_error_body(body);
            assert!(report.fields.has_field("body.amount"));
            assert!(report.fields.has_field("body.0.buyer_name"));
        }

        #[test]
        fn test_fastapi_text_detail() {
            let err = error_for_status(StatusCode::BAD_REQUEST, "/receipts", r#"{"detail":"Receipt number already exists"}"#);
            assert_eq!(err.to_string(), "Validation failed: request: Receipt number already exists");
        }

        #[test]
        fn test_not_found_uses_path() {
            let err = error_for_status(StatusCode::NOT_FOUND, "/contracts/42/remaining", "{}");
            assert_eq!(err.to_string(), "Contract with id 42 not found");
        }

        #[test]
        fn test_not_found_prefers_body() {
            let body = r#"{"error":"not_found","message":"Contract with id 9 not found","entity":"Contract","id":"9"}"#;
            let err = error_for_status(StatusCode::NOT_FOUND, "/payments", body);
            assert_eq!(err.to_string(), "Contract with id 9 not found");
        }

        #[test]
        fn test_conflict_with_candidates_is_ambiguity() {
            let body = r#"{"error":"linkage_ambiguity","message":"ambiguous","receipt_id":5,"candidates":[8,9]}"#;
            match error_for_status(StatusCode::CONFLICT, "/receipts/5", body) {
                SalesError::LinkageAmbiguity { receipt_id, candidates } => {
                    assert_eq!(receipt_id, ReceiptId::new(5));
                    assert_eq!(candidates, vec![ContractId::new(8), ContractId::new(9)]);
                }
                other => panic!("expected ambiguity, got {other:?}"),
            }
        }

        #[test]
        fn test_server_error_keeps_status_and_message() {
            let err = error_for_status(StatusCode::INTERNAL_SERVER_ERROR, "/statistics", "database is locked");
            match err {
                SalesError::Storage(PortError::Remote { status, message }) => {
                    assert_eq!(status, 500);
                    assert_eq!(message, "database is locked");
                }
                other => panic!("expected storage error, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_root_url_strips_api_prefix() {
        let adapter = RemoteSalesAdapter::new(RemoteConfig::new("http://localhost:8001/api/")).unwrap();
        assert_eq!(adapter.root_url(), "http://localhost:8001");
        assert_eq!(adapter.url("/houses"), "http://localhost:8001/api/houses");
    }

    #[test]
    fn test_invalid_header_is_rejected() {
        let config = RemoteConfig::new("http://localhost:8001/api").with_header("bad header", "x");
        assert!(RemoteSalesAdapter::new(config).is_err());
    }
}
