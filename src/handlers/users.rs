use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use model::entities::user::{self, UserRole};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::ToSchema;

use crate::auth::{hash_password, AuthenticatedUser};
use crate::error::{ApiError, ApiResult};
use crate::handlers::recipes::{administrator_recipes, RecipeResponse};
use crate::handlers::restaurants::{administrator_restaurants, RestaurantResponse};
use crate::schemas::{ApiJson, AppState, ErrorResponse};

/// Request body for changing an administrator's password
#[derive(Deserialize, Serialize, ToSchema)]
pub struct UpdatePasswordRequest {
    #[serde(rename = "contrasena")]
    pub password: String,
}

/// User with the restaurants and recipes it owns
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserDetailResponse {
    pub id: i32,
    pub usuario: String,
    pub nombre: String,
    pub tipo: String,
    /// Restaurant of a chef
    pub restaurante: Option<i32>,
    pub restaurantes: Vec<RestaurantResponse>,
    pub recetas: Vec<RecipeResponse>,
}

async fn user_detail(state: &AppState, model: user::Model) -> ApiResult<UserDetailResponse> {
    let (restaurantes, recetas) = if model.is_administrator() {
        (
            administrator_restaurants(state, &model).await?,
            administrator_recipes(&state.db, model.id).await?,
        )
    } else {
        (Vec::new(), Vec::new())
    };

    Ok(UserDetailResponse {
        id: model.id,
        usuario: model.username,
        nombre: model.name,
        tipo: model.role.as_str().to_string(),
        restaurante: model.restaurant_id,
        restaurantes,
        recetas,
    })
}

async fn find_administrator(state: &AppState, user_id: i32) -> ApiResult<user::Model> {
    user::Entity::find_by_id(user_id)
        .filter(user::Column::Role.eq(UserRole::Administrator))
        .one(&state.db)
        .await?
        .ok_or_else(|| {
            warn!("Administrator with ID {} not found", user_id);
            ApiError::NotFound("No existe un administrador con ese id".to_string())
        })
}

/// Get a user with its restaurants and recipes
#[utoipa::path(
    get,
    path = "/usuarios/{user_id}",
    tag = "users",
    params(("user_id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User retrieved", body = UserDetailResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip(state))]
pub async fn get_user(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
    _caller: AuthenticatedUser,
) -> ApiResult<Json<UserDetailResponse>> {
    trace!("Entering get_user function for user_id: {}", user_id);

    match user::Entity::find_by_id(user_id).one(&state.db).await? {
        Some(model) => {
            debug!("Retrieved user {}: {}", model.id, model.username);
            Ok(Json(user_detail(&state, model).await?))
        }
        None => {
            warn!("User with ID {} not found", user_id);
            Err(ApiError::NotFound("No existe un usuario con ese id".to_string()))
        }
    }
}

/// Change the password of an administrator
#[utoipa::path(
    put,
    path = "/usuarios/{user_id}",
    tag = "users",
    params(("user_id" = i32, Path, description = "Administrator ID")),
    request_body = UpdatePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = UserDetailResponse),
        (status = 404, description = "Administrator not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip(state, request))]
pub async fn update_password(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
    _caller: AuthenticatedUser,
    ApiJson(request): ApiJson<UpdatePasswordRequest>,
) -> ApiResult<Json<UserDetailResponse>> {
    trace!("Entering update_password function for user_id: {}", user_id);

    let existing = find_administrator(&state, user_id).await?;

    if request.password.is_empty() {
        return Err(ApiError::MissingFields(vec!["contrasena".to_string()]));
    }

    let mut active: user::ActiveModel = existing.into();
    active.password_hash = Set(hash_password(&request.password)?);
    let updated = active.update(&state.db).await?;

    info!("Password changed for administrator {}", updated.id);
    Ok(Json(user_detail(&state, updated).await?))
}

/// Delete an administrator with everything it owns
#[utoipa::path(
    delete,
    path = "/usuarios/{user_id}",
    tag = "users",
    params(("user_id" = i32, Path, description = "Administrator ID")),
    responses(
        (status = 204, description = "Administrator deleted"),
        (status = 404, description = "Administrator not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip(state))]
pub async fn delete_administrator(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
    _caller: AuthenticatedUser,
) -> ApiResult<StatusCode> {
    trace!("Entering delete_administrator function for user_id: {}", user_id);

    let existing = find_administrator(&state, user_id).await?;
    user::Entity::delete_by_id(existing.id)
        .exec(&state.db)
        .await?;

    info!("Administrator {} deleted with its restaurants, recipes and ingredients", user_id);
    Ok(StatusCode::NO_CONTENT)
}
