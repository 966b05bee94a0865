use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use model::entities::{ingredient, recipe_ingredient};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;

use crate::auth::AuthenticatedUser;
use crate::error::{ApiError, ApiResult};
use crate::helpers::scope::resolve_administrator_id;
use crate::schemas::{ApiJson, AppState, ErrorResponse};

/// Request body for creating or replacing an ingredient.
/// Cost and calories accept numbers or numeric strings.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct IngredientRequest {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "unidad")]
    pub unit: String,
    #[serde(rename = "costo")]
    #[schema(value_type = String)]
    pub cost: Decimal,
    #[serde(rename = "calorias")]
    #[schema(value_type = String)]
    pub calories: Decimal,
    #[serde(rename = "sitio")]
    pub site: String,
}

/// Ingredient response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IngredientResponse {
    pub id: i32,
    pub nombre: String,
    pub unidad: String,
    #[schema(value_type = String)]
    pub costo: Decimal,
    #[schema(value_type = String)]
    pub calorias: Decimal,
    pub sitio: String,
    pub administrador: i32,
}

impl From<ingredient::Model> for IngredientResponse {
    fn from(model: ingredient::Model) -> Self {
        Self {
            id: model.id,
            nombre: model.name,
            unidad: model.unit,
            costo: model.cost,
            calorias: model.calories,
            sitio: model.site,
            administrador: model.administrator_id,
        }
    }
}

fn not_found(ingredient_id: i32) -> ApiError {
    warn!("Ingredient with ID {} not found", ingredient_id);
    ApiError::NotFound("No existe un ingrediente con ese id".to_string())
}

/// List the ingredient catalog visible to a user
#[utoipa::path(
    get,
    path = "/usuarios/{user_id}/ingredientes",
    tag = "ingredients",
    params(("user_id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "Ingredients retrieved", body = Vec<IngredientResponse>),
        (status = 422, description = "Unknown user", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip(state))]
pub async fn get_ingredients(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
    _caller: AuthenticatedUser,
) -> ApiResult<Json<Vec<IngredientResponse>>> {
    trace!("Entering get_ingredients function for user_id: {}", user_id);

    let administrator_id = resolve_administrator_id(&state.db, user_id).await?;
    debug!("Fetching ingredients of administrator {}", administrator_id);

    let ingredients = ingredient::Entity::find()
        .filter(ingredient::Column::AdministratorId.eq(administrator_id))
        .order_by_asc(ingredient::Column::Id)
        .all(&state.db)
        .await?;

    info!("Retrieved {} ingredients for user {}", ingredients.len(), user_id);
    Ok(Json(ingredients.into_iter().map(IngredientResponse::from).collect()))
}

/// Add an ingredient to the catalog of the user's administrator
#[utoipa::path(
    post,
    path = "/usuarios/{user_id}/ingredientes",
    tag = "ingredients",
    params(("user_id" = i32, Path, description = "User ID")),
    request_body = IngredientRequest,
    responses(
        (status = 200, description = "Ingredient created", body = IngredientResponse),
        (status = 422, description = "Unknown user", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip(state))]
pub async fn create_ingredient(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
    _caller: AuthenticatedUser,
    ApiJson(request): ApiJson<IngredientRequest>,
) -> ApiResult<Json<IngredientResponse>> {
    trace!("Entering create_ingredient function for user_id: {}", user_id);

    let administrator_id = resolve_administrator_id(&state.db, user_id).await?;

    let new_ingredient = ingredient::ActiveModel {
        name: Set(request.name),
        unit: Set(request.unit),
        cost: Set(request.cost),
        calories: Set(request.calories),
        site: Set(request.site),
        administrator_id: Set(administrator_id),
        ..Default::default()
    };

    let created = new_ingredient.insert(&state.db).await?;
    info!(
        "Ingredient created with ID: {}, name: {}, administrator: {}",
        created.id, created.name, administrator_id
    );
    Ok(Json(IngredientResponse::from(created)))
}

/// Get an ingredient by ID
#[utoipa::path(
    get,
    path = "/ingredientes/{ingredient_id}",
    tag = "ingredients",
    params(("ingredient_id" = i32, Path, description = "Ingredient ID")),
    responses(
        (status = 200, description = "Ingredient retrieved", body = IngredientResponse),
        (status = 404, description = "Ingredient not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip(state))]
pub async fn get_ingredient(
    Path(ingredient_id): Path<i32>,
    State(state): State<AppState>,
    _caller: AuthenticatedUser,
) -> ApiResult<Json<IngredientResponse>> {
    trace!("Entering get_ingredient function for ingredient_id: {}", ingredient_id);

    match ingredient::Entity::find_by_id(ingredient_id).one(&state.db).await {
        Ok(Some(model)) => {
            debug!("Retrieved ingredient {}: {}", model.id, model.name);
            Ok(Json(IngredientResponse::from(model)))
        }
        Ok(None) => Err(not_found(ingredient_id)),
        Err(db_error) => {
            error!("Failed to retrieve ingredient {}: {}", ingredient_id, db_error);
            Err(db_error.into())
        }
    }
}

/// Replace every field of an ingredient
#[utoipa::path(
    put,
    path = "/ingredientes/{ingredient_id}",
    tag = "ingredients",
    params(("ingredient_id" = i32, Path, description = "Ingredient ID")),
    request_body = IngredientRequest,
    responses(
        (status = 200, description = "Ingredient updated", body = IngredientResponse),
        (status = 404, description = "Ingredient not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip(state))]
pub async fn update_ingredient(
    Path(ingredient_id): Path<i32>,
    State(state): State<AppState>,
    _caller: AuthenticatedUser,
    ApiJson(request): ApiJson<IngredientRequest>,
) -> ApiResult<Json<IngredientResponse>> {
    trace!("Entering update_ingredient function for ingredient_id: {}", ingredient_id);

    let existing = ingredient::Entity::find_by_id(ingredient_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| not_found(ingredient_id))?;

    let mut active: ingredient::ActiveModel = existing.into();
    active.name = Set(request.name);
    active.unit = Set(request.unit);
    active.cost = Set(request.cost);
    active.calories = Set(request.calories);
    active.site = Set(request.site);

    let updated = active.update(&state.db).await?;
    info!("Ingredient {} updated", updated.id);
    Ok(Json(IngredientResponse::from(updated)))
}

/// Delete an ingredient no recipe uses
#[utoipa::path(
    delete,
    path = "/ingredientes/{ingredient_id}",
    tag = "ingredients",
    params(("ingredient_id" = i32, Path, description = "Ingredient ID")),
    responses(
        (status = 204, description = "Ingredient deleted"),
        (status = 404, description = "Ingredient not found", body = ErrorResponse),
        (status = 409, description = "Ingredient used by recipes", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip(state))]
pub async fn delete_ingredient(
    Path(ingredient_id): Path<i32>,
    State(state): State<AppState>,
    _caller: AuthenticatedUser,
) -> ApiResult<StatusCode> {
    trace!("Entering delete_ingredient function for ingredient_id: {}", ingredient_id);

    let existing = ingredient::Entity::find_by_id(ingredient_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| not_found(ingredient_id))?;

    let uses = recipe_ingredient::Entity::find()
        .filter(recipe_ingredient::Column::IngredientId.eq(ingredient_id))
        .count(&state.db)
        .await?;
    if uses > 0 {
        warn!("Ingredient {} is used by {} recipe links", ingredient_id, uses);
        return Err(ApiError::Conflict(
            "El ingrediente se está usando en diferentes recetas".to_string(),
        ));
    }

    ingredient::Entity::delete_by_id(existing.id)
        .exec(&state.db)
        .await?;
    info!("Ingredient {} deleted", ingredient_id);
    Ok(StatusCode::NO_CONTENT)
}
