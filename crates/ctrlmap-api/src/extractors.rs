//! # Request Body Extraction
//!
//! Handlers take `Result<Json<T>, JsonRejection>` so that body failures go
//! through [`AppError`] and use the standard error envelope instead of
//! axum's plain-text rejections.
//!
//! Rejections split into content type, JSON syntax and JSON shape, each with
//! its own message. All three are 400s. Limits serde cannot express (row
//! counts, label lengths) are checked afterwards through [`Validate`]. Every
//! violation is reported at once, and the result is a 422.

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::error::AppError;

/// Request types with limits beyond their serde shape.
pub trait Validate {
    /// Every violated limit, as a readable message. Empty means valid.
    fn violations(&self) -> Vec<String>;
}

/// Unwrap a JSON body, turning axum's rejection into [`AppError::BadRequest`].
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result.map(|Json(v)| v).map_err(|rejection| {
        let message = match &rejection {
            JsonRejection::MissingJsonContentType(_) => {
                "request body must be sent with Content-Type: application/json".to_string()
            }
            JsonRejection::JsonSyntaxError(_) => {
                format!("request body is not valid JSON: {}", rejection.body_text())
            }
            JsonRejection::JsonDataError(_) => {
                format!("request body has the wrong shape: {}", rejection.body_text())
            }
            _ => rejection.body_text(),
        };
        AppError::BadRequest(message)
    })
}

/// [`extract_json`], then reject with every [`Validate`] violation joined.
pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let value = extract_json(result)?;
    let violations = value.violations();
    if violations.is_empty() {
        Ok(value)
    } else {
        Err(AppError::Validation(violations.join("; ")))
    }
}
