use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use sea_orm::DbErr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Empty fields detected, try again")]
    EmptyFields,

    #[error("Unknown parent product")]
    UnknownParent,

    #[error("Unknown product")]
    UnknownProduct,

    #[error("Unknown image")]
    UnknownImage,

    #[error("Product {0} cannot be placed under one of its own descendants")]
    ParentCycle(i64),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Convert CatalogError to AppError for standardized error responses
impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::EmptyFields => AppError::BadRequest(err.to_string()),
            CatalogError::UnknownParent
            | CatalogError::UnknownProduct
            | CatalogError::UnknownImage => AppError::NotFound(err.to_string()),
            CatalogError::ParentCycle(_) => AppError::Conflict(err.to_string()),
            CatalogError::Database(e) => AppError::Database(e),
        }
    }
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_client_errors_keep_exact_messages() {
        let cases = [
            (CatalogError::EmptyFields, StatusCode::BAD_REQUEST, "Empty fields detected, try again"),
            (CatalogError::UnknownParent, StatusCode::NOT_FOUND, "Unknown parent product"),
            (CatalogError::UnknownProduct, StatusCode::NOT_FOUND, "Unknown product"),
            (CatalogError::UnknownImage, StatusCode::NOT_FOUND, "Unknown image"),
        ];

        for (err, status, message) in cases {
            assert_eq!(err.to_string(), message);
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_cycle_is_conflict() {
        let response = CatalogError::ParentCycle(4).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_db_errors_keep_driver_error() {
        let err: CatalogError = DbErr::Custom("boom".into()).into();
        assert!(matches!(err, CatalogError::Database(DbErr::Custom(_))));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_pool_exhaustion_is_service_unavailable() {
        let err = CatalogError::from(DbErr::ConnectionAcquire(
            sea_orm::ConnAcquireErr::Timeout,
        ));
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
