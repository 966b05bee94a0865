use axum::{extract::State, response::Json};
use axum_valid::Valid;
use model::entities::user::{self, UserRole};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::{hash_password, verify_password};
use crate::error::{ApiError, ApiResult};
use crate::schemas::{ApiJson, AppState, ErrorResponse};

const DEFAULT_ADMINISTRATOR_NAME: &str = "Administrador";

/// Request body for creating an administrator account
#[derive(Deserialize, Serialize, ToSchema, Validate)]
pub struct SignUpRequest {
    /// Login name, unique across administrators and chefs
    #[serde(rename = "usuario")]
    #[validate(length(min = 1))]
    pub username: String,
    #[serde(rename = "contrasena")]
    #[validate(length(min = 1))]
    pub password: String,
    /// Display name, "Administrador" when omitted
    #[serde(rename = "nombre", default)]
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SignUpResponse {
    pub mensaje: String,
    pub id: i32,
}

/// Request body for logging in
#[derive(Deserialize, Serialize, ToSchema)]
pub struct LogInRequest {
    #[serde(rename = "usuario")]
    pub username: String,
    #[serde(rename = "contrasena")]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LogInResponse {
    pub mensaje: String,
    pub token: String,
    pub id: i32,
    /// "Administrador" or "Chef"
    pub tipo: String,
    pub nombre: String,
}

/// Create an administrator account
#[utoipa::path(
    post,
    path = "/signin",
    tag = "auth",
    request_body = SignUpRequest,
    responses(
        (status = 200, description = "Administrator created", body = SignUpResponse),
        (status = 400, description = "Empty username or password"),
        (status = 422, description = "Username already taken", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn sign_up(
    State(state): State<AppState>,
    Valid(ApiJson(request)): Valid<ApiJson<SignUpRequest>>,
) -> ApiResult<Json<SignUpResponse>> {
    trace!("Entering sign_up function");
    debug!("Signing up administrator with username: {}", request.username);

    let existing = user::Entity::find()
        .filter(user::Column::Username.eq(request.username.as_str()))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        warn!("Username '{}' already exists", request.username);
        return Err(ApiError::Unprocessable("El usuario ya existe".to_string()));
    }

    let name = request
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ADMINISTRATOR_NAME.to_string());

    let new_user = user::ActiveModel {
        username: Set(request.username),
        password_hash: Set(hash_password(&request.password)?),
        name: Set(name),
        role: Set(UserRole::Administrator),
        restaurant_id: Set(None),
        ..Default::default()
    };

    let created = new_user.insert(&state.db).await?;
    info!("Administrator created with ID: {}, username: {}", created.id, created.username);

    Ok(Json(SignUpResponse {
        mensaje: "usuario creado exitosamente".to_string(),
        id: created.id,
    }))
}

/// Authenticate and obtain a bearer token
#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    request_body = LogInRequest,
    responses(
        (status = 200, description = "Logged in", body = LogInResponse),
        (status = 404, description = "Wrong username or password", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn log_in(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LogInRequest>,
) -> ApiResult<Json<LogInResponse>> {
    trace!("Entering log_in function");
    debug!("Log-in attempt for username: {}", request.username);

    let found = user::Entity::find()
        .filter(user::Column::Username.eq(request.username.as_str()))
        .one(&state.db)
        .await?
        .filter(|candidate| verify_password(&request.password, &candidate.password_hash));

    match found {
        Some(user_model) => {
            let token = state.tokens.issue(user_model.id)?;
            info!("User {} logged in as {}", user_model.id, user_model.role.as_str());
            Ok(Json(LogInResponse {
                mensaje: "Inicio de sesión exitoso".to_string(),
                token,
                id: user_model.id,
                tipo: user_model.role.as_str().to_string(),
                nombre: user_model.name,
            }))
        }
        None => {
            warn!("Failed log-in for username: {}", request.username);
            Err(ApiError::NotFound("Usuario o contraseña incorrectos".to_string()))
        }
    }
}
