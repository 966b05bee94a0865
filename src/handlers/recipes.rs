use std::collections::{BTreeSet, HashMap};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use compute::{plan_recipe_ingredients, IncomingLink, LinkValues};
use model::entities::{ingredient, menu_recipe, recipe, recipe_ingredient};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};

use crate::auth::AuthenticatedUser;
use crate::error::{ApiError, ApiResult};
use crate::helpers::scope::resolve_administrator_id;
use crate::schemas::{deserialize_id, deserialize_optional_id, ApiJson, AppState, ErrorResponse};

/// Ingredient link of a recipe being created or edited.
/// An empty or missing `id` marks a new link.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct RecipeIngredientRequest {
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub id: Option<i32>,
    #[serde(rename = "cantidad")]
    pub quantity: Decimal,
    #[serde(rename = "idIngrediente", deserialize_with = "deserialize_id")]
    pub ingredient_id: i32,
}

/// Request body for creating or replacing a recipe
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct RecipeRequest {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "duracion")]
    pub duration: Decimal,
    /// Servings the ingredient quantities are defined for
    #[serde(rename = "porcion")]
    pub portion: Decimal,
    #[serde(rename = "preparacion")]
    pub preparation: String,
    #[serde(rename = "ingredientes", default)]
    pub ingredients: Vec<RecipeIngredientRequest>,
}

/// Ingredient embedded in a recipe, with its cost as a plain number
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecipeIngredientDetail {
    pub id: i32,
    pub nombre: String,
    pub unidad: String,
    pub costo: f64,
    #[schema(value_type = String)]
    pub calorias: Decimal,
    pub sitio: String,
    pub administrador: i32,
}

impl From<ingredient::Model> for RecipeIngredientDetail {
    fn from(model: ingredient::Model) -> Self {
        Self {
            id: model.id,
            nombre: model.name,
            unidad: model.unit,
            costo: model.cost.to_f64().unwrap_or_default(),
            calorias: model.calories,
            sitio: model.site,
            administrador: model.administrator_id,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecipeIngredientResponse {
    pub id: i32,
    #[schema(value_type = String)]
    pub cantidad: Decimal,
    pub receta: i32,
    pub ingrediente: RecipeIngredientDetail,
}

/// Recipe with its ingredient links
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecipeResponse {
    pub id: i32,
    pub nombre: String,
    #[schema(value_type = String)]
    pub duracion: Decimal,
    #[schema(value_type = String)]
    pub porcion: Decimal,
    pub preparacion: String,
    /// Author of the recipe
    pub usuario: Option<i32>,
    pub administrador: i32,
    pub ingredientes: Vec<RecipeIngredientResponse>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct RecipeListQuery {
    /// "true" lists every recipe of the administrator, not only the caller's
    pub todos: Option<String>,
}

/// Serializes recipes with their ingredient links, ingredients embedded.
pub(crate) async fn recipe_responses<C: ConnectionTrait>(
    db: &C,
    recipes: Vec<recipe::Model>,
) -> ApiResult<Vec<RecipeResponse>> {
    let recipe_ids: Vec<i32> = recipes.iter().map(|r| r.id).collect();
    let links = recipe_ingredient::Entity::find()
        .filter(recipe_ingredient::Column::RecipeId.is_in(recipe_ids))
        .order_by_asc(recipe_ingredient::Column::Id)
        .find_also_related(ingredient::Entity)
        .all(db)
        .await?;

    let mut by_recipe: HashMap<i32, Vec<RecipeIngredientResponse>> = HashMap::new();
    for (link, ingredient) in links {
        let Some(ingredient) = ingredient else {
            warn!("Recipe ingredient {} points to a missing ingredient", link.id);
            continue;
        };
        by_recipe
            .entry(link.recipe_id)
            .or_default()
            .push(RecipeIngredientResponse {
                id: link.id,
                cantidad: link.quantity,
                receta: link.recipe_id,
                ingrediente: RecipeIngredientDetail::from(ingredient),
            });
    }

    Ok(recipes
        .into_iter()
        .map(|model| RecipeResponse {
            ingredientes: by_recipe.remove(&model.id).unwrap_or_default(),
            id: model.id,
            nombre: model.name,
            duracion: model.duration,
            porcion: model.portion,
            preparacion: model.preparation,
            usuario: model.author_id,
            administrador: model.administrator_id,
        })
        .collect())
}

async fn recipe_response<C: ConnectionTrait>(db: &C, model: recipe::Model) -> ApiResult<RecipeResponse> {
    recipe_responses(db, vec![model])
        .await?
        .pop()
        .ok_or_else(|| ApiError::Internal("Recipe vanished while serializing".to_string()))
}

/// Fails with 422 unless every referenced ingredient exists.
async fn ensure_ingredients_exist<C: ConnectionTrait>(
    db: &C,
    links: &[RecipeIngredientRequest],
) -> ApiResult<()> {
    let wanted: BTreeSet<i32> = links.iter().map(|l| l.ingredient_id).collect();
    if wanted.is_empty() {
        return Ok(());
    }

    let found = ingredient::Entity::find()
        .filter(ingredient::Column::Id.is_in(wanted.iter().copied()))
        .all(db)
        .await?;
    if found.len() != wanted.len() {
        warn!("Recipe references unknown ingredients: {:?}", wanted);
        return Err(ApiError::Unprocessable(
            "No existe un ingrediente con ese id".to_string(),
        ));
    }
    Ok(())
}

async fn find_recipe<C: ConnectionTrait>(db: &C, recipe_id: i32) -> ApiResult<recipe::Model> {
    recipe::Entity::find_by_id(recipe_id)
        .one(db)
        .await?
        .ok_or_else(|| {
            warn!("Recipe with ID {} not found", recipe_id);
            ApiError::NotFound("No existe una receta con ese id".to_string())
        })
}

/// List the recipes visible to a user
#[utoipa::path(
    get,
    path = "/usuarios/{user_id}/recetas",
    tag = "recipes",
    params(
        ("user_id" = i32, Path, description = "User ID"),
        RecipeListQuery
    ),
    responses(
        (status = 200, description = "Recipes retrieved", body = Vec<RecipeResponse>),
        (status = 422, description = "Unknown user", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip(state))]
pub async fn get_recipes(
    Path(user_id): Path<i32>,
    Query(query): Query<RecipeListQuery>,
    State(state): State<AppState>,
    _caller: AuthenticatedUser,
) -> ApiResult<Json<Vec<RecipeResponse>>> {
    trace!("Entering get_recipes function for user_id: {}", user_id);

    let administrator_id = resolve_administrator_id(&state.db, user_id).await?;
    let everything = administrator_id == user_id || query.todos.as_deref() == Some("true");

    let filter = if everything {
        debug!("Listing every recipe of administrator {}", administrator_id);
        recipe::Column::AdministratorId.eq(administrator_id)
    } else {
        debug!("Listing recipes written by user {}", user_id);
        recipe::Column::AuthorId.eq(user_id)
    };

    let recipes = recipe::Entity::find()
        .filter(filter)
        .order_by_asc(recipe::Column::Id)
        .all(&state.db)
        .await?;

    let responses = recipe_responses(&state.db, recipes).await?;
    info!("Retrieved {} recipes for user {}", responses.len(), user_id);
    Ok(Json(responses))
}

/// Create a recipe with its ingredients
#[utoipa::path(
    post,
    path = "/usuarios/{user_id}/recetas",
    tag = "recipes",
    params(("user_id" = i32, Path, description = "Author user ID")),
    request_body = RecipeRequest,
    responses(
        (status = 200, description = "Recipe created", body = RecipeResponse),
        (status = 422, description = "Unknown user or ingredient", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip(state))]
pub async fn create_recipe(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
    _caller: AuthenticatedUser,
    ApiJson(request): ApiJson<RecipeRequest>,
) -> ApiResult<Json<RecipeResponse>> {
    trace!("Entering create_recipe function for user_id: {}", user_id);

    let txn = state.db.begin().await?;

    let administrator_id = resolve_administrator_id(&txn, user_id).await?;
    ensure_ingredients_exist(&txn, &request.ingredients).await?;

    let created = recipe::ActiveModel {
        name: Set(request.name),
        duration: Set(request.duration),
        portion: Set(request.portion),
        preparation: Set(request.preparation),
        author_id: Set(Some(user_id)),
        administrator_id: Set(administrator_id),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    for link in &request.ingredients {
        recipe_ingredient::ActiveModel {
            quantity: Set(link.quantity),
            recipe_id: Set(created.id),
            ingredient_id: Set(link.ingredient_id),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;
    info!(
        "Recipe created with ID: {} and {} ingredients",
        created.id,
        request.ingredients.len()
    );

    Ok(Json(recipe_response(&state.db, created).await?))
}

/// Get a recipe by ID
#[utoipa::path(
    get,
    path = "/recetas/{recipe_id}",
    tag = "recipes",
    params(("recipe_id" = i32, Path, description = "Recipe ID")),
    responses(
        (status = 200, description = "Recipe retrieved", body = RecipeResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip(state))]
pub async fn get_recipe(
    Path(recipe_id): Path<i32>,
    State(state): State<AppState>,
    _caller: AuthenticatedUser,
) -> ApiResult<Json<RecipeResponse>> {
    trace!("Entering get_recipe function for recipe_id: {}", recipe_id);

    let model = find_recipe(&state.db, recipe_id).await?;
    Ok(Json(recipe_response(&state.db, model).await?))
}

/// Replace a recipe and reconcile its ingredient links
#[utoipa::path(
    put,
    path = "/recetas/{recipe_id}",
    tag = "recipes",
    params(("recipe_id" = i32, Path, description = "Recipe ID")),
    request_body = RecipeRequest,
    responses(
        (status = 200, description = "Recipe updated", body = RecipeResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse),
        (status = 422, description = "Link not owned by the recipe or unknown ingredient", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip(state))]
pub async fn update_recipe(
    Path(recipe_id): Path<i32>,
    State(state): State<AppState>,
    _caller: AuthenticatedUser,
    ApiJson(request): ApiJson<RecipeRequest>,
) -> ApiResult<Json<RecipeResponse>> {
    trace!("Entering update_recipe function for recipe_id: {}", recipe_id);

    let txn = state.db.begin().await?;

    let existing = find_recipe(&txn, recipe_id).await?;
    let existing_ids: Vec<i32> = recipe_ingredient::Entity::find()
        .filter(recipe_ingredient::Column::RecipeId.eq(recipe_id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|link| link.id)
        .collect();

    let incoming: Vec<IncomingLink> = request
        .ingredients
        .iter()
        .map(|link| IncomingLink {
            id: link.id,
            values: LinkValues {
                quantity: link.quantity,
                ingredient_id: link.ingredient_id,
            },
        })
        .collect();
    let plan = plan_recipe_ingredients(recipe_id, &existing_ids, &incoming)?;
    ensure_ingredients_exist(&txn, &request.ingredients).await?;

    let mut active: recipe::ActiveModel = existing.into();
    active.name = Set(request.name);
    active.duration = Set(request.duration);
    active.portion = Set(request.portion);
    active.preparation = Set(request.preparation);
    let updated = active.update(&txn).await?;

    if !plan.delete.is_empty() {
        recipe_ingredient::Entity::delete_many()
            .filter(recipe_ingredient::Column::Id.is_in(plan.delete.clone()))
            .exec(&txn)
            .await?;
    }

    for (link_id, values) in &plan.update {
        recipe_ingredient::ActiveModel {
            id: Set(*link_id),
            quantity: Set(values.quantity),
            recipe_id: Set(recipe_id),
            ingredient_id: Set(values.ingredient_id),
        }
        .update(&txn)
        .await?;
    }

    for values in &plan.insert {
        recipe_ingredient::ActiveModel {
            quantity: Set(values.quantity),
            recipe_id: Set(recipe_id),
            ingredient_id: Set(values.ingredient_id),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;
    info!(
        "Recipe {} updated: {} links deleted, {} updated, {} inserted",
        recipe_id,
        plan.delete.len(),
        plan.update.len(),
        plan.insert.len()
    );

    Ok(Json(recipe_response(&state.db, updated).await?))
}

/// Delete a recipe with its ingredient links and menu entries
#[utoipa::path(
    delete,
    path = "/recetas/{recipe_id}",
    tag = "recipes",
    params(("recipe_id" = i32, Path, description = "Recipe ID")),
    responses(
        (status = 204, description = "Recipe deleted"),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip(state))]
pub async fn delete_recipe(
    Path(recipe_id): Path<i32>,
    State(state): State<AppState>,
    _caller: AuthenticatedUser,
) -> ApiResult<StatusCode> {
    trace!("Entering delete_recipe function for recipe_id: {}", recipe_id);

    let txn = state.db.begin().await?;
    let existing = find_recipe(&txn, recipe_id).await?;

    let menu_links = menu_recipe::Entity::delete_many()
        .filter(menu_recipe::Column::RecipeId.eq(recipe_id))
        .exec(&txn)
        .await?;
    let ingredient_links = recipe_ingredient::Entity::delete_many()
        .filter(recipe_ingredient::Column::RecipeId.eq(recipe_id))
        .exec(&txn)
        .await?;
    recipe::Entity::delete_by_id(existing.id).exec(&txn).await?;

    txn.commit().await?;
    info!(
        "Recipe {} deleted with {} ingredient links and {} menu entries",
        recipe_id, ingredient_links.rows_affected, menu_links.rows_affected
    );
    Ok(StatusCode::NO_CONTENT)
}

/// Recipes owned by an administrator, used by the user detail view.
pub(crate) async fn administrator_recipes<C: ConnectionTrait>(
    db: &C,
    administrator_id: i32,
) -> ApiResult<Vec<RecipeResponse>> {
    let recipes = recipe::Entity::find()
        .filter(recipe::Column::AdministratorId.eq(administrator_id))
        .order_by_asc(recipe::Column::Id)
        .all(db)
        .await?;
    recipe_responses(db, recipes).await
}

