use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Value as JsonValue, json};
use thiserror::Error;

use crate::data::query::{self, DisasterFilter, Matches};
use crate::data::store::{DatasetSource, Unavailable};

/// Query parameters as received from the transport.
pub type Params = HashMap<String, String>;

// ---------------------------------------------------------------------------
// Response contract
// ---------------------------------------------------------------------------

/// Transport-neutral response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    BadRequest,
    NotFound,
    InternalError,
}

impl Status {
    /// The HTTP status code this maps to.
    pub fn code(self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::BadRequest => 400,
            Status::NotFound => 404,
            Status::InternalError => 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: Status,
    pub body: JsonValue,
}

/// Bad request input. Detected before the store is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing parameters")]
    MissingParam(&'static str),
    #[error("Invalid {param}: {value}")]
    BadType { param: &'static str, value: String },
    /// The transport could not decode the query string or path.
    #[error("Malformed request: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Unavailable(#[from] Unavailable),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> Status {
        match self {
            ApiError::Validation(_) => Status::BadRequest,
            ApiError::Unavailable(_) | ApiError::Internal(_) => Status::InternalError,
        }
    }
}

impl From<ApiError> for ApiResponse {
    fn from(err: ApiError) -> Self {
        match &err {
            ApiError::Validation(e) => log::debug!("Rejected request: {e:?}"),
            ApiError::Unavailable(e) => log::warn!("{e}"),
            ApiError::Internal(msg) => log::error!("Request failed: {msg}"),
        }
        ApiResponse {
            status: err.status(),
            body: json!({ "error": err.to_string() }),
        }
    }
}

fn to_body<T: Serialize>(value: &T) -> Result<JsonValue, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::Internal(e.to_string()))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// A present, non-empty parameter.
fn required<'a>(params: &'a Params, name: &'static str) -> Result<&'a str, ValidationError> {
    params
        .get(name)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
        .ok_or(ValidationError::MissingParam(name))
}

fn parse_year(raw: &str) -> Result<i64, ValidationError> {
    raw.trim().parse().map_err(|_| ValidationError::BadType {
        param: "year",
        value: raw.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Answer for a request the transport could not decode into parameters.
pub fn malformed(reason: impl Into<String>) -> ApiResponse {
    ApiError::from(ValidationError::Malformed(reason.into())).into()
}

/// `available-years`: `country` and `disasterType` are required.
pub fn available_years<S>(source: &S, params: &Params) -> ApiResponse
where
    S: DatasetSource + ?Sized,
{
    let run = || -> Result<ApiResponse, ApiError> {
        let country = required(params, "country")?;
        let disaster_type = required(params, "disasterType")?;

        let years = query::available_years(source, country, disaster_type)?;
        log::debug!(
            "available-years {country}/{disaster_type}: {} years",
            years.len()
        );
        Ok(ApiResponse {
            status: Status::Ok,
            body: to_body(&years)?,
        })
    };
    run().unwrap_or_else(ApiResponse::from)
}

/// `disasters`: `country`, `year` and `type` are required; `year` must be an integer.
///
/// Zero matches answers `NotFound` with an empty array.
pub fn disasters<S>(source: &S, params: &Params) -> ApiResponse
where
    S: DatasetSource + ?Sized,
{
    let run = || -> Result<ApiResponse, ApiError> {
        let country = required(params, "country")?;
        let year = required(params, "year")?;
        let disaster_type = required(params, "type")?;
        let year = parse_year(year)?;

        let filter = DisasterFilter {
            country,
            year,
            disaster_type,
        };
        let response = match query::find_disasters(source, &filter)? {
            Matches::Found(records) => {
                log::debug!("disasters {filter:?}: {} matches", records.len());
                ApiResponse {
                    status: Status::Ok,
                    body: to_body(&records)?,
                }
            }
            Matches::NoMatches => {
                log::debug!("disasters {filter:?}: no matches");
                ApiResponse {
                    status: Status::NotFound,
                    body: JsonValue::Array(Vec::new()),
                }
            }
        };
        Ok(response)
    };
    run().unwrap_or_else(ApiResponse::from)
}

/// `geojson/{country_code}`: always a FeatureCollection unless the geometry is unavailable.
pub fn geojson<S>(source: &S, country_code: &str) -> ApiResponse
where
    S: DatasetSource + ?Sized,
{
    let run = || -> Result<ApiResponse, ApiError> {
        let collection = query::geometry_for(source, country_code)?;
        log::debug!(
            "geojson {country_code}: {} features",
            collection.features.len()
        );
        Ok(ApiResponse {
            status: Status::Ok,
            body: to_body(&collection)?,
        })
    };
    run().unwrap_or_else(ApiResponse::from)
}
