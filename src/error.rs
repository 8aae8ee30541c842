use poem::http::StatusCode;
use poem::Error as PoemError;
use poem_openapi::Object;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::business::validation::FieldError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unauthorized: missing or invalid admin token")]
    Unauthorized,

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    MissingField(#[from] FieldError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error body shared by every endpoint
#[derive(Debug, Clone, Serialize, Deserialize, Object)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    pub status: u16,
    /// Every missing field, for validation errors
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::MissingField(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "rest_forbidden",
            AppError::NotFound(_) => "rest_order_invalid_id",
            AppError::MissingField(_) => "rest_order_missing_field",
            AppError::Internal(_) => "internal_error",
        }
    }

    pub fn body(&self) -> ErrorBody {
        let missing = match self {
            AppError::MissingField(err) => err.missing.clone(),
            _ => Vec::new(),
        };
        ErrorBody {
            code: self.code().to_string(),
            message: self.to_string(),
            status: self.status_code().as_u16(),
            missing,
        }
    }
}

impl From<AppError> for PoemError {
    fn from(err: AppError) -> Self {
        PoemError::from_string(err.to_string(), err.status_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_body() {
        let err = AppError::from(FieldError::new(vec![
            "stageId".to_string(),
            "brandId".to_string(),
        ]));
        let body = err.body();

        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(body.code, "rest_order_missing_field");
        assert_eq!(body.message, "stageId is required.");
        assert_eq!(body.status, 400);
        assert_eq!(body.missing, vec!["stageId", "brandId"]);
    }

    #[test]
    fn test_not_found_body() {
        let body = AppError::NotFound("Order 7 not found".to_string()).body();

        assert_eq!(body.status, 404);
        assert_eq!(body.message, "Order 7 not found");
        assert!(body.missing.is_empty());
    }

    #[test]
    fn test_into_poem_error() {
        let err: PoemError = AppError::Unauthorized.into();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }
}
