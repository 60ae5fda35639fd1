use axum::Json;
use serde::{de::DeserializeOwned, Deserialize};
use tracing::warn;
use utoipa::IntoParams;

use crate::envelope::Envelope;
use crate::errors::ServiceError;

/// `?filter=<json>` carried by every list endpoint.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct FilterParam {
    /// JSON object with the entity's filter fields plus `pageNumber`/`pageSize`
    pub filter: Option<String>,
}

impl FilterParam {
    /// Decodes the filter; a missing or blank parameter is `{}`.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, ServiceError> {
        let raw = match self.filter.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => raw,
            _ => "{}",
        };
        serde_json::from_str(raw).map_err(|e| {
            warn!(error = %e, "Malformed filter");
            ServiceError::validation(format!("Invalid filter: {e}"))
        })
    }
}

/// Single entity envelope, `totalData = 1`
pub fn ok<T>(data: T) -> Json<Envelope<T>> {
    Json(Envelope::success(data))
}

/// List envelope counting its own items
pub fn ok_list<T>(data: Vec<T>) -> Json<Envelope<Vec<T>>> {
    let total = data.len() as u64;
    Json(Envelope::success_with_total(data, total))
}

/// Delete acknowledgement: no data, `totalData = 0`
pub fn deleted() -> Json<Envelope<()>> {
    Json(Envelope::success_empty())
}
