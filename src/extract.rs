use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use serde_json::Value;

use crate::error::{AppError, INVALID_ID, INVALID_JSON};
use crate::models::TodoPayload;

/// Numeric `:id` path segment. Anything else is a form-level bad request.
pub struct TodoId(pub i64);

/// Create/update body. Parsed as JSON whatever the content type says.
pub struct JsonPayload(pub TodoPayload);

impl<S> FromRequestParts<S> for TodoId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::BadRequest(INVALID_ID))?;

        parse_id(&raw).map(TodoId)
    }
}

/// Integers, plus integral numbers in other notations (`1.0`, `1e2`).
/// A finite number with a fraction can name no todo.
fn parse_id(raw: &str) -> Result<i64, AppError> {
    let raw = raw.trim();
    if let Ok(id) = raw.parse::<i64>() {
        return Ok(id);
    }

    match raw.parse::<f64>() {
        Ok(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < i64::MAX as f64 => Ok(n as i64),
        Ok(n) if n.is_finite() => Err(AppError::NotFound),
        _ => Err(AppError::BadRequest(INVALID_ID)),
    }
}

impl<S> FromRequest<S> for JsonPayload
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state)
            .await
            .map_err(|_| AppError::BadRequest(INVALID_JSON))?;

        serde_json::from_slice::<Value>(&body)
            .ok()
            .and_then(TodoPayload::from_json)
            .map(JsonPayload)
            .ok_or(AppError::BadRequest(INVALID_JSON))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> Option<i64> {
        parse_id(raw).ok()
    }

    #[test]
    fn integral_ids_in_any_notation() {
        assert_eq!(id("7"), Some(7));
        assert_eq!(id(" 7 "), Some(7));
        assert_eq!(id("7.0"), Some(7));
        assert_eq!(id("1e2"), Some(100));
    }

    #[test]
    fn fractional_ids_are_missing_rows() {
        assert!(matches!(parse_id("1.5"), Err(AppError::NotFound)));
    }

    #[test]
    fn non_numeric_ids_are_rejected() {
        for raw in ["abc", "", "inf", "NaN", "1e400"] {
            assert!(
                matches!(parse_id(raw), Err(AppError::BadRequest(INVALID_ID))),
                "{raw}"
            );
        }
    }
}
