use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};

use carkeeper_auth::UserResponse;
use carkeeper_catalog::{TrimFilter, parse_id_list};
use carkeeper_configurator::ConfigurationDraft;
use carkeeper_core::{ColorId, ConfigurationId, Money, OptionId};

use crate::app::errors::{self, ServiceError, ServiceResult};

// -------------------------
// Envelope
// -------------------------

/// `200 {"success": true, "data": ...}`
pub fn ok<T: Serialize>(data: T) -> axum::response::Response {
    envelope(StatusCode::OK, data)
}

/// `201 {"success": true, "data": ...}`
pub fn created<T: Serialize>(data: T) -> axum::response::Response {
    envelope(StatusCode::CREATED, data)
}

fn envelope<T: Serialize>(status: StatusCode, data: T) -> axum::response::Response {
    (
        status,
        axum::Json(serde_json::json!({
            "success": true,
            "data": data,
        })),
    )
        .into_response()
}

/// Map a service result straight into a response.
pub fn respond<T: Serialize>(result: ServiceResult<T>) -> axum::response::Response {
    match result {
        Ok(data) => ok(data),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub fn parse_id<T>(raw: &str, what: &str) -> ServiceResult<T>
where
    T: core::str::FromStr,
{
    raw.trim()
        .parse()
        .map_err(|_| ServiceError::validation(format!("invalid {what}")))
}

/// A required id in the query string.
pub fn required_id<T>(raw: Option<&str>, field: &str) -> ServiceResult<T>
where
    T: core::str::FromStr,
{
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(v) => parse_id(v, field),
        None => Err(ServiceError::validation(format!("{field} is required"))),
    }
}

/// `Json<T>` whose rejection is reported in the error envelope.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let axum::Json(value) = axum::Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body of `PUT /configurations/{id}`.
///
/// Ids arrive as strings so that an empty value counts as absent.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateConfigurationRequest {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub trim_id: Option<String>,
    #[serde(default)]
    pub color_id: Option<String>,
    #[serde(default)]
    pub option_ids: Option<Vec<String>>,
}

/// What a configuration update asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationUpdate {
    /// Only the status; price untouched.
    Status(String),
    /// Trim, color and options; status ignored.
    Full(ConfigurationDraft),
}

impl UpdateConfigurationRequest {
    /// Status-only when `status` is non-empty and neither `trim_id` nor
    /// `color_id` is given. Otherwise a full update that needs both.
    pub fn into_update(self) -> ServiceResult<ConfigurationUpdate> {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());

        let has_trim_or_color = present(&self.trim_id) || present(&self.color_id);
        if present(&self.status) && !has_trim_or_color {
            return Ok(ConfigurationUpdate::Status(
                self.status.unwrap_or_default().trim().to_string(),
            ));
        }

        let trim_id = required_id(self.trim_id.as_deref(), "trim_id")?;
        let color_id: ColorId = required_id(self.color_id.as_deref(), "color_id")?;
        let option_ids = self
            .option_ids
            .unwrap_or_default()
            .iter()
            .filter(|s| !s.trim().is_empty())
            .map(|s| parse_id::<OptionId>(s, "option_id"))
            .collect::<ServiceResult<Vec<_>>>()?;

        Ok(ConfigurationUpdate::Full(ConfigurationDraft::new(
            trim_id, color_id, option_ids,
        )))
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub configuration_id: ConfigurationId,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

// -------------------------
// Query strings
// -------------------------

#[derive(Debug, Default, Deserialize)]
pub struct ModelsQuery {
    pub brand_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerationsQuery {
    pub model_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TrimsQuery {
    pub brand_id: Option<String>,
    pub engine_type_id: Option<String>,
    pub transmission_id: Option<String>,
    pub drive_type_id: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub is_available: Option<bool>,
}

fn id_list<T: core::str::FromStr>(raw: Option<String>) -> Vec<T> {
    raw.as_deref().map(parse_id_list).unwrap_or_default()
}

impl TrimsQuery {
    pub fn into_filter(self) -> TrimFilter {
        TrimFilter {
            brand_ids: id_list(self.brand_id),
            engine_type_ids: id_list(self.engine_type_id),
            transmission_ids: id_list(self.transmission_id),
            drive_type_ids: id_list(self.drive_type_id),
            min_price: self.min_price.map(Money::new),
            max_price: self.max_price.map(Money::new),
            is_available: self.is_available,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AvailabilityQuery {
    pub is_available: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OptionsQuery {
    pub trim_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ServiceTypesQuery {
    pub category: Option<String>,
    pub is_available: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BranchesQuery {
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NewsQuery {
    pub is_published: Option<bool>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}
