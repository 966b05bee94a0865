use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use compute::ComputeError;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use tracing::{error, warn};

use crate::schemas::ErrorResponse;

/// Errors returned by request handlers.
///
/// Each variant maps to one HTTP status and is rendered as
/// `{"mensaje": ...}`, with the offending field names for `MissingFields`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Campos faltantes")]
    MissingFields(Vec<String>),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unprocessable(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(DbErr),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::MissingFields(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) | ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                warn!("Unique constraint violated: {}", detail);
                ApiError::Unprocessable("El registro ya existe".to_string())
            }
            Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
                warn!("Foreign key constraint violated: {}", detail);
                ApiError::Conflict("El registro está referenciado por otros registros".to_string())
            }
            _ => ApiError::Database(err),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!("Rejected request body: {}", rejection.body_text());
        ApiError::BadRequest(format!(
            "Cuerpo de la petición inválido: {}",
            rejection.body_text()
        ))
    }
}

impl From<ComputeError> for ApiError {
    fn from(err: ComputeError) -> Self {
        match err {
            ComputeError::Database(db_err) => ApiError::from(db_err),
            ComputeError::RecipeNotFound(_) => {
                ApiError::Unprocessable("No existe una receta con ese id".to_string())
            }
            ComputeError::IngredientNotFound(_) => {
                ApiError::Unprocessable("No existe un ingrediente con ese id".to_string())
            }
            ComputeError::ZeroPortion { .. } => {
                ApiError::Unprocessable("La receta tiene una porción de cero".to_string())
            }
            ComputeError::UnknownRecipeIngredient { .. } => ApiError::Unprocessable(
                "El ingrediente editado no pertenece a la receta".to_string(),
            ),
            ComputeError::Decimal(msg) | ComputeError::InvalidValue(msg) => ApiError::Internal(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let body = match self {
            ApiError::MissingFields(fields) => ErrorResponse {
                mensaje: "Campos faltantes".to_string(),
                campos_faltantes: Some(fields),
            },
            ApiError::Database(_) => ErrorResponse {
                mensaje: "Error interno de base de datos".to_string(),
                campos_faltantes: None,
            },
            other => ErrorResponse {
                mensaje: other.to_string(),
                campos_faltantes: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Type alias for handler results
pub type ApiResult<T> = std::result::Result<T, ApiError>;
