use std::collections::{BTreeSet, HashMap};

use axum::{
    extract::{Path, State},
    response::Json,
};
use chrono::NaiveDate;
use model::entities::{menu, menu_recipe, recipe, restaurant, user};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;

use crate::auth::AuthenticatedUser;
use crate::error::{ApiError, ApiResult};
use crate::helpers::scope::{chef_restaurant, find_user};
use crate::schemas::{
    deserialize_entity_ref, deserialize_id, deserialize_optional_entity_ref, ApiJson, AppState,
    ErrorResponse,
};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A recipe served by a menu
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct MenuRecipeRequest {
    #[serde(rename = "personas", deserialize_with = "deserialize_id")]
    pub servings: i32,
    /// Recipe id, or an object carrying it
    #[serde(rename = "receta", deserialize_with = "deserialize_entity_ref")]
    pub recipe_id: i32,
}

/// Request body for creating or replacing a menu
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct MenuRequest {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    /// YYYY-MM-DD
    #[serde(rename = "fechaInicio")]
    pub start_date: String,
    /// YYYY-MM-DD
    #[serde(rename = "fechaFin")]
    pub end_date: String,
    #[serde(rename = "foto")]
    pub photo: String,
    /// Ignored for chefs, whose menus always belong to their restaurant
    #[serde(
        rename = "restaurante",
        default,
        deserialize_with = "deserialize_optional_entity_ref"
    )]
    pub restaurant_id: Option<i32>,
    #[serde(rename = "recetas", default)]
    pub recipes: Vec<MenuRecipeRequest>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MenuRecipeResponse {
    pub id: i32,
    pub personas: i32,
    pub receta: i32,
    pub menu: i32,
}

impl From<menu_recipe::Model> for MenuRecipeResponse {
    fn from(model: menu_recipe::Model) -> Self {
        Self {
            id: model.id,
            personas: model.servings,
            receta: model.recipe_id,
            menu: model.menu_id,
        }
    }
}

/// Menu response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MenuResponse {
    pub id: i32,
    pub nombre: String,
    pub descripcion: String,
    #[serde(rename = "fechaInicio")]
    pub fecha_inicio: NaiveDate,
    #[serde(rename = "fechaFin")]
    pub fecha_fin: NaiveDate,
    pub foto: String,
    pub autor: Option<i32>,
    pub autor_name: String,
    pub restaurante: i32,
    pub recetas: Vec<MenuRecipeResponse>,
}

fn parse_date(field: &str, value: &str) -> ApiResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| {
        error!("Invalid {} '{}': {}", field, value, e);
        ApiError::Internal(format!("Invalid {} '{}': {}", field, value, e))
    })
}

fn unknown_menu(menu_id: i32) -> ApiError {
    warn!("Menu with ID {} not found", menu_id);
    ApiError::Unprocessable("No existe un menú con ese id".to_string())
}

async fn menu_responses<C: ConnectionTrait>(
    db: &C,
    menus: Vec<menu::Model>,
) -> ApiResult<Vec<MenuResponse>> {
    let menu_ids: Vec<i32> = menus.iter().map(|m| m.id).collect();
    let links = menu_recipe::Entity::find()
        .filter(menu_recipe::Column::MenuId.is_in(menu_ids))
        .order_by_asc(menu_recipe::Column::Id)
        .all(db)
        .await?;

    let mut by_menu: HashMap<i32, Vec<MenuRecipeResponse>> = HashMap::new();
    for link in links {
        by_menu
            .entry(link.menu_id)
            .or_default()
            .push(MenuRecipeResponse::from(link));
    }

    Ok(menus
        .into_iter()
        .map(|model| MenuResponse {
            recetas: by_menu.remove(&model.id).unwrap_or_default(),
            id: model.id,
            nombre: model.name,
            descripcion: model.description,
            fecha_inicio: model.start_date,
            fecha_fin: model.end_date,
            foto: model.photo,
            autor: model.author_id,
            autor_name: model.author_name,
            restaurante: model.restaurant_id,
        })
        .collect())
}

async fn menu_response<C: ConnectionTrait>(db: &C, model: menu::Model) -> ApiResult<MenuResponse> {
    menu_responses(db, vec![model])
        .await?
        .pop()
        .ok_or_else(|| ApiError::Internal("Menu vanished while serializing".to_string()))
}

/// Restaurant a new menu written by `author` belongs to: a chef's own
/// restaurant, otherwise the requested one.
async fn menu_restaurant<C: ConnectionTrait>(
    db: &C,
    author: &user::Model,
    requested: Option<i32>,
) -> ApiResult<i32> {
    if author.is_chef() {
        let own = chef_restaurant(db, author).await?;
        if requested.is_some_and(|id| id != own.id) {
            debug!(
                "Chef {} asked for restaurant {:?}, using own restaurant {}",
                author.id, requested, own.id
            );
        }
        return Ok(own.id);
    }

    let restaurant_id = requested.ok_or_else(|| {
        warn!("Menu without restaurant for administrator {}", author.id);
        ApiError::Unprocessable("No existe un restaurante con ese id".to_string())
    })?;

    existing_restaurant(db, restaurant_id).await
}

async fn existing_restaurant<C: ConnectionTrait>(db: &C, restaurant_id: i32) -> ApiResult<i32> {
    restaurant::Entity::find_by_id(restaurant_id)
        .one(db)
        .await?
        .map(|r| r.id)
        .ok_or_else(|| {
            warn!("Restaurant with ID {} not found", restaurant_id);
            ApiError::Unprocessable("No existe un restaurante con ese id".to_string())
        })
}

async fn ensure_recipes_exist<C: ConnectionTrait>(
    db: &C,
    recipes: &[MenuRecipeRequest],
) -> ApiResult<()> {
    let wanted: BTreeSet<i32> = recipes.iter().map(|r| r.recipe_id).collect();
    if wanted.is_empty() {
        return Ok(());
    }

    let found = recipe::Entity::find()
        .filter(recipe::Column::Id.is_in(wanted.iter().copied()))
        .all(db)
        .await?;
    if found.len() != wanted.len() {
        warn!("Menu references unknown recipes: {:?}", wanted);
        return Err(ApiError::Unprocessable(
            "No existe una receta con ese id".to_string(),
        ));
    }
    Ok(())
}

async fn insert_menu_recipes<C: ConnectionTrait>(
    db: &C,
    menu_id: i32,
    recipes: &[MenuRecipeRequest],
) -> ApiResult<()> {
    for entry in recipes {
        menu_recipe::ActiveModel {
            servings: Set(entry.servings),
            menu_id: Set(menu_id),
            recipe_id: Set(entry.recipe_id),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }
    Ok(())
}

/// Create a menu
#[utoipa::path(
    post,
    path = "/usuarios/{user_id}/menus",
    tag = "menus",
    params(("user_id" = i32, Path, description = "Author user ID")),
    request_body = MenuRequest,
    responses(
        (status = 200, description = "Menu created", body = MenuResponse),
        (status = 422, description = "Unknown user, restaurant or recipe", body = ErrorResponse),
        (status = 500, description = "Malformed date", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip(state))]
pub async fn create_menu(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
    _caller: AuthenticatedUser,
    ApiJson(request): ApiJson<MenuRequest>,
) -> ApiResult<Json<MenuResponse>> {
    trace!("Entering create_menu function for user_id: {}", user_id);

    let start_date = parse_date("fechaInicio", &request.start_date)?;
    let end_date = parse_date("fechaFin", &request.end_date)?;

    let txn = state.db.begin().await?;

    let author = find_user(&txn, user_id).await?;
    let restaurant_id = menu_restaurant(&txn, &author, request.restaurant_id).await?;
    ensure_recipes_exist(&txn, &request.recipes).await?;

    let created = menu::ActiveModel {
        name: Set(request.name),
        description: Set(request.description),
        start_date: Set(start_date),
        end_date: Set(end_date),
        photo: Set(request.photo),
        author_id: Set(Some(author.id)),
        author_name: Set(author.username.clone()),
        restaurant_id: Set(restaurant_id),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    insert_menu_recipes(&txn, created.id, &request.recipes).await?;
    txn.commit().await?;

    info!(
        "Menu created with ID: {}, restaurant: {}, recipes: {}",
        created.id,
        restaurant_id,
        request.recipes.len()
    );
    Ok(Json(menu_response(&state.db, created).await?))
}

/// Get a menu by ID
#[utoipa::path(
    get,
    path = "/usuarios/{user_id}/menu/{menu_id}",
    tag = "menus",
    params(
        ("user_id" = i32, Path, description = "User ID"),
        ("menu_id" = i32, Path, description = "Menu ID"),
    ),
    responses(
        (status = 200, description = "Menu retrieved", body = MenuResponse),
        (status = 422, description = "Unknown user or menu", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip(state))]
pub async fn get_menu(
    Path((user_id, menu_id)): Path<(i32, i32)>,
    State(state): State<AppState>,
    _caller: AuthenticatedUser,
) -> ApiResult<Json<MenuResponse>> {
    trace!("Entering get_menu function for user_id: {}, menu_id: {}", user_id, menu_id);

    find_user(&state.db, user_id).await?;
    let model = menu::Entity::find_by_id(menu_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| unknown_menu(menu_id))?;

    Ok(Json(menu_response(&state.db, model).await?))
}

/// Replace a menu and its recipes
#[utoipa::path(
    put,
    path = "/usuarios/{user_id}/menu/{menu_id}",
    tag = "menus",
    params(
        ("user_id" = i32, Path, description = "Editing user ID"),
        ("menu_id" = i32, Path, description = "Menu ID"),
    ),
    request_body = MenuRequest,
    responses(
        (status = 200, description = "Menu updated", body = MenuResponse),
        (status = 422, description = "Unknown user or menu, or not allowed to edit", body = ErrorResponse),
        (status = 500, description = "Malformed date", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip(state))]
pub async fn update_menu(
    Path((user_id, menu_id)): Path<(i32, i32)>,
    State(state): State<AppState>,
    _caller: AuthenticatedUser,
    ApiJson(request): ApiJson<MenuRequest>,
) -> ApiResult<Json<MenuResponse>> {
    trace!("Entering update_menu function for user_id: {}, menu_id: {}", user_id, menu_id);

    let txn = state.db.begin().await?;

    let editor = find_user(&txn, user_id).await?;
    let existing = menu::Entity::find_by_id(menu_id)
        .one(&txn)
        .await?
        .ok_or_else(|| unknown_menu(menu_id))?;

    // A chef editing someone else's menu keeps it in the chef's restaurant.
    let mut forced_restaurant = None;
    if existing.author_id != Some(editor.id) && editor.is_chef() {
        let own = chef_restaurant(&txn, &editor).await?;
        forced_restaurant = Some(own.id);
        if own.id != existing.restaurant_id {
            warn!(
                "Chef {} of restaurant {} cannot edit menu {} of restaurant {}",
                editor.id, own.id, menu_id, existing.restaurant_id
            );
            return Err(ApiError::Unprocessable(
                "El usuario no tiene permisos para editar el menú".to_string(),
            ));
        }
    }

    let start_date = parse_date("fechaInicio", &request.start_date)?;
    let end_date = parse_date("fechaFin", &request.end_date)?;
    let restaurant_id = match forced_restaurant {
        Some(id) => id,
        None => {
            existing_restaurant(&txn, request.restaurant_id.unwrap_or(existing.restaurant_id))
                .await?
        }
    };
    ensure_recipes_exist(&txn, &request.recipes).await?;

    let mut active: menu::ActiveModel = existing.into();
    active.name = Set(request.name);
    active.description = Set(request.description);
    active.start_date = Set(start_date);
    active.end_date = Set(end_date);
    active.photo = Set(request.photo);
    active.author_id = Set(Some(editor.id));
    active.author_name = Set(editor.username.clone());
    active.restaurant_id = Set(restaurant_id);
    let updated = active.update(&txn).await?;

    let removed = menu_recipe::Entity::delete_many()
        .filter(menu_recipe::Column::MenuId.eq(menu_id))
        .exec(&txn)
        .await?;
    insert_menu_recipes(&txn, menu_id, &request.recipes).await?;

    txn.commit().await?;
    info!(
        "Menu {} updated by user {}: {} recipes replaced by {}",
        menu_id,
        editor.id,
        removed.rows_affected,
        request.recipes.len()
    );
    Ok(Json(menu_response(&state.db, updated).await?))
}

/// List the menus of a chef's restaurant
#[utoipa::path(
    get,
    path = "/usuarios/{user_id}/menus",
    tag = "menus",
    params(("user_id" = i32, Path, description = "Chef user ID")),
    responses(
        (status = 200, description = "Menus retrieved", body = Vec<MenuResponse>),
        (status = 422, description = "Unknown user or not a chef", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip(state))]
pub async fn get_chef_menus(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
    _caller: AuthenticatedUser,
) -> ApiResult<Json<Vec<MenuResponse>>> {
    trace!("Entering get_chef_menus function for user_id: {}", user_id);

    let chef = find_user(&state.db, user_id).await?;
    if !chef.is_chef() {
        warn!("User {} listed chef menus but is not a chef", user_id);
        return Err(ApiError::Unprocessable("El usuario no es un chef".to_string()));
    }

    let restaurant_id = chef.restaurant_id.ok_or_else(|| {
        warn!("Chef {} is not bound to a restaurant", chef.id);
        ApiError::Unprocessable("El chef no pertenece a un restaurante".to_string())
    })?;

    let menus = menu::Entity::find()
        .filter(menu::Column::RestaurantId.eq(restaurant_id))
        .order_by_asc(menu::Column::Id)
        .all(&state.db)
        .await?;

    debug!("Retrieved {} menus of restaurant {}", menus.len(), restaurant_id);
    Ok(Json(menu_responses(&state.db, menus).await?))
}

/// List the menus of a restaurant owned by an administrator
#[utoipa::path(
    get,
    path = "/usuarios/{user_id}/restaurantes/{restaurant_id}/menus",
    tag = "menus",
    params(
        ("user_id" = i32, Path, description = "Administrator ID"),
        ("restaurant_id" = i32, Path, description = "Restaurant ID"),
    ),
    responses(
        (status = 200, description = "Menus retrieved", body = Vec<MenuResponse>),
        (status = 422, description = "Not an administrator or restaurant not owned", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip(state))]
pub async fn get_restaurant_menus(
    Path((user_id, restaurant_id)): Path<(i32, i32)>,
    State(state): State<AppState>,
    _caller: AuthenticatedUser,
) -> ApiResult<Json<Vec<MenuResponse>>> {
    trace!(
        "Entering get_restaurant_menus function for user_id: {}, restaurant_id: {}",
        user_id, restaurant_id
    );

    let administrator = find_user(&state.db, user_id).await?;
    if !administrator.is_administrator() {
        warn!("User {} listed restaurant menus but is not an administrator", user_id);
        return Err(ApiError::Unprocessable(
            "El usuario no es un administrador".to_string(),
        ));
    }

    let owned = restaurant::Entity::find()
        .filter(restaurant::Column::AdministratorId.eq(administrator.id))
        .filter(restaurant::Column::Id.eq(restaurant_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| {
            warn!(
                "Restaurant {} is not owned by administrator {}",
                restaurant_id, administrator.id
            );
            ApiError::Unprocessable("No existe un restaurante con ese id".to_string())
        })?;

    let menus = menu::Entity::find()
        .filter(menu::Column::RestaurantId.eq(owned.id))
        .order_by_asc(menu::Column::Id)
        .all(&state.db)
        .await?;

    debug!("Retrieved {} menus of restaurant {}", menus.len(), owned.id);
    Ok(Json(menu_responses(&state.db, menus).await?))
}
