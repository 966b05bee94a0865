use axum::{
    extract::{Path, State},
    response::Json,
};
use model::entities::{
    restaurant,
    user::{self, UserRole},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::ToSchema;

use crate::auth::{hash_password, AuthenticatedUser};
use crate::error::{ApiError, ApiResult};
use crate::schemas::{ApiJson, AppState, ErrorResponse};

/// Request body for hiring a chef
#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreateChefRequest {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "usuario")]
    pub username: String,
    #[serde(rename = "contrasena")]
    pub password: String,
}

/// Chef response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChefResponse {
    pub id: i32,
    pub nombre: String,
    pub usuario: String,
    pub tipo: String,
    pub restaurante: Option<i32>,
}

impl From<user::Model> for ChefResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            nombre: model.name,
            usuario: model.username,
            tipo: model.role.as_str().to_string(),
            restaurante: model.restaurant_id,
        }
    }
}

/// List the chefs of a restaurant
#[utoipa::path(
    get,
    path = "/restaurantes/{restaurant_id}/chefs",
    tag = "chefs",
    params(("restaurant_id" = i32, Path, description = "Restaurant ID")),
    responses(
        (status = 200, description = "Chefs retrieved", body = Vec<ChefResponse>)
    ),
    security(("bearer" = []))
)]
#[instrument(skip(state))]
pub async fn get_chefs(
    Path(restaurant_id): Path<i32>,
    State(state): State<AppState>,
    _caller: AuthenticatedUser,
) -> ApiResult<Json<Vec<ChefResponse>>> {
    trace!("Entering get_chefs function for restaurant_id: {}", restaurant_id);

    let chefs = user::Entity::find()
        .filter(user::Column::Role.eq(UserRole::Chef))
        .filter(user::Column::RestaurantId.eq(restaurant_id))
        .order_by_asc(user::Column::Id)
        .all(&state.db)
        .await?;

    debug!("Retrieved {} chefs of restaurant {}", chefs.len(), restaurant_id);
    Ok(Json(chefs.into_iter().map(ChefResponse::from).collect()))
}

/// Create a chef working in a restaurant
#[utoipa::path(
    post,
    path = "/restaurantes/{restaurant_id}/chefs",
    tag = "chefs",
    params(("restaurant_id" = i32, Path, description = "Restaurant ID")),
    request_body = CreateChefRequest,
    responses(
        (status = 200, description = "Chef created", body = ChefResponse),
        (status = 422, description = "Username taken or unknown restaurant", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip(state, request))]
pub async fn create_chef(
    Path(restaurant_id): Path<i32>,
    State(state): State<AppState>,
    _caller: AuthenticatedUser,
    ApiJson(request): ApiJson<CreateChefRequest>,
) -> ApiResult<Json<ChefResponse>> {
    trace!("Entering create_chef function for restaurant_id: {}", restaurant_id);

    let existing = user::Entity::find()
        .filter(user::Column::Username.eq(request.username.as_str()))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        warn!("Username '{}' already exists", request.username);
        return Err(ApiError::Unprocessable(
            "Ya existe un chef con el mismo usuario".to_string(),
        ));
    }

    if restaurant::Entity::find_by_id(restaurant_id)
        .one(&state.db)
        .await?
        .is_none()
    {
        warn!("Restaurant with ID {} not found", restaurant_id);
        return Err(ApiError::Unprocessable(
            "No existe un restaurante con ese id".to_string(),
        ));
    }

    let created = user::ActiveModel {
        username: Set(request.username),
        password_hash: Set(hash_password(&request.password)?),
        name: Set(request.name),
        role: Set(UserRole::Chef),
        restaurant_id: Set(Some(restaurant_id)),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!(
        "Chef created with ID: {}, username: {}, restaurant: {}",
        created.id, created.username, restaurant_id
    );
    Ok(Json(ChefResponse::from(created)))
}
