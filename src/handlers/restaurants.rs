use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use model::entities::{restaurant, user};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::ToSchema;

use crate::auth::AuthenticatedUser;
use crate::error::{ApiError, ApiResult};
use crate::helpers::scope::{find_user, resolve_administrator_id};
use crate::schemas::{ApiJson, AppState, ErrorResponse};

/// Fields a new restaurant must carry, in the order they are reported.
const REQUIRED_FIELDS: [&str; 9] = [
    "nombre",
    "direccion",
    "telefono",
    "redes_sociales",
    "hora_apertura",
    "servicio_sitio",
    "servicio_domicilio",
    "tipo_comida",
    "plataformas",
];

const FLAG_FIELDS: [&str; 2] = ["servicio_sitio", "servicio_domicilio"];

/// Request body for creating a restaurant
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateRestaurantRequest {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "direccion")]
    pub address: String,
    #[serde(rename = "telefono")]
    pub phone: String,
    #[serde(rename = "redes_sociales")]
    pub social_links: String,
    #[serde(rename = "hora_apertura")]
    pub opening_hour: String,
    #[serde(rename = "servicio_sitio")]
    pub on_site_service: bool,
    #[serde(rename = "servicio_domicilio")]
    pub delivery_service: bool,
    #[serde(rename = "tipo_comida")]
    pub cuisine_type: String,
    #[serde(rename = "plataformas")]
    pub platforms: String,
}

/// Restaurant response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RestaurantResponse {
    pub id: i32,
    pub nombre: String,
    pub direccion: String,
    pub telefono: String,
    pub redes_sociales: String,
    pub hora_apertura: String,
    pub servicio_sitio: bool,
    pub servicio_domicilio: bool,
    pub tipo_comida: String,
    pub plataformas: String,
    pub administrador: i32,
}

impl From<restaurant::Model> for RestaurantResponse {
    fn from(model: restaurant::Model) -> Self {
        Self {
            id: model.id,
            nombre: model.name,
            direccion: model.address,
            telefono: model.phone,
            redes_sociales: model.social_links,
            hora_apertura: model.opening_hour,
            servicio_sitio: model.on_site_service,
            servicio_domicilio: model.delivery_service,
            tipo_comida: model.cuisine_type,
            plataformas: model.platforms,
            administrador: model.administrator_id,
        }
    }
}

/// Names of the required fields that are absent, null, empty strings, or
/// (for the service flags) not booleans.
fn missing_fields(body: &Map<String, Value>) -> Vec<String> {
    REQUIRED_FIELDS
        .iter()
        .filter(|field| {
            let value = body.get(**field);
            if FLAG_FIELDS.contains(*field) {
                !matches!(value, Some(Value::Bool(_)))
            } else {
                match value {
                    None | Some(Value::Null) => true,
                    Some(Value::String(s)) => s.is_empty(),
                    Some(_) => false,
                }
            }
        })
        .map(|field| field.to_string())
        .collect()
}

/// Converts a validated body into the typed request.
/// Non-string scalars such as phone numbers are accepted as their text.
fn parse_request(body: &Map<String, Value>) -> CreateRestaurantRequest {
    let text = |field: &str| -> String {
        match body.get(field) {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    };
    let flag = |field: &str| -> bool { matches!(body.get(field), Some(Value::Bool(true))) };

    CreateRestaurantRequest {
        name: text("nombre"),
        address: text("direccion"),
        phone: text("telefono"),
        social_links: text("redes_sociales"),
        opening_hour: text("hora_apertura"),
        on_site_service: flag("servicio_sitio"),
        delivery_service: flag("servicio_domicilio"),
        cuisine_type: text("tipo_comida"),
        platforms: text("plataformas"),
    }
}

/// List the restaurants visible to a user
#[utoipa::path(
    get,
    path = "/usuarios/{user_id}/restaurantes",
    tag = "restaurants",
    params(("user_id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "Restaurants retrieved", body = Vec<RestaurantResponse>),
        (status = 422, description = "Unknown user", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip(state))]
pub async fn get_restaurants(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
    _caller: AuthenticatedUser,
) -> ApiResult<Json<Vec<RestaurantResponse>>> {
    trace!("Entering get_restaurants function for user_id: {}", user_id);

    let administrator_id = resolve_administrator_id(&state.db, user_id).await?;
    let restaurants = restaurant::Entity::find()
        .filter(restaurant::Column::AdministratorId.eq(administrator_id))
        .order_by_asc(restaurant::Column::Id)
        .all(&state.db)
        .await?;

    info!("Retrieved {} restaurants for user {}", restaurants.len(), user_id);
    Ok(Json(restaurants.into_iter().map(RestaurantResponse::from).collect()))
}

/// Create a restaurant owned by an administrator
#[utoipa::path(
    post,
    path = "/usuarios/{user_id}/restaurantes",
    tag = "restaurants",
    params(("user_id" = i32, Path, description = "Administrator ID")),
    request_body = CreateRestaurantRequest,
    responses(
        (status = 200, description = "Restaurant created", body = RestaurantResponse),
        (status = 400, description = "Missing required fields", body = ErrorResponse),
        (status = 422, description = "Duplicate name or unknown administrator", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip(state, body))]
pub async fn create_restaurant(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
    _caller: AuthenticatedUser,
    ApiJson(body): ApiJson<Value>,
) -> ApiResult<Json<RestaurantResponse>> {
    trace!("Entering create_restaurant function for user_id: {}", user_id);

    let Value::Object(body) = body else {
        warn!("Restaurant body is not a JSON object");
        return Err(ApiError::MissingFields(
            REQUIRED_FIELDS.iter().map(|f| f.to_string()).collect(),
        ));
    };

    if let Some(Value::String(name)) = body.get("nombre") {
        let duplicate = restaurant::Entity::find()
            .filter(restaurant::Column::Name.eq(name.as_str()))
            .one(&state.db)
            .await?;
        if duplicate.is_some() {
            warn!("Restaurant named '{}' already exists", name);
            return Err(ApiError::Unprocessable(format!(
                "El Restaurante con nombre {} ya existe dentro de la cadena",
                name
            )));
        }
    }

    let missing = missing_fields(&body);
    if !missing.is_empty() {
        warn!("Restaurant creation missing fields: {:?}", missing);
        return Err(ApiError::MissingFields(missing));
    }

    let owner = find_user(&state.db, user_id).await?;
    if !owner.is_administrator() {
        warn!("User {} cannot own restaurants", user_id);
        return Err(ApiError::Unprocessable(
            "El usuario no es un administrador".to_string(),
        ));
    }

    let request = parse_request(&body);
    debug!("Creating restaurant '{}' for administrator {}", request.name, user_id);

    let created = restaurant::ActiveModel {
        name: Set(request.name),
        address: Set(request.address),
        phone: Set(request.phone),
        social_links: Set(request.social_links),
        opening_hour: Set(request.opening_hour),
        on_site_service: Set(request.on_site_service),
        delivery_service: Set(request.delivery_service),
        cuisine_type: Set(request.cuisine_type),
        platforms: Set(request.platforms),
        administrator_id: Set(owner.id),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!("Restaurant created with ID: {}, name: {}", created.id, created.name);
    Ok(Json(RestaurantResponse::from(created)))
}

/// Get a restaurant by ID
#[utoipa::path(
    get,
    path = "/usuarios/{user_id}/restaurante/{restaurant_id}",
    tag = "restaurants",
    params(
        ("user_id" = i32, Path, description = "User ID"),
        ("restaurant_id" = i32, Path, description = "Restaurant ID"),
    ),
    responses(
        (status = 200, description = "Restaurant retrieved", body = RestaurantResponse),
        (status = 422, description = "Unknown user or restaurant", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip(state))]
pub async fn get_restaurant(
    Path((user_id, restaurant_id)): Path<(i32, i32)>,
    State(state): State<AppState>,
    _caller: AuthenticatedUser,
) -> ApiResult<Json<RestaurantResponse>> {
    trace!(
        "Entering get_restaurant function for user_id: {}, restaurant_id: {}",
        user_id, restaurant_id
    );

    find_user(&state.db, user_id).await?;

    match restaurant::Entity::find_by_id(restaurant_id).one(&state.db).await? {
        Some(model) => {
            debug!("Retrieved restaurant {}: {}", model.id, model.name);
            Ok(Json(RestaurantResponse::from(model)))
        }
        None => {
            warn!("Restaurant with ID {} not found", restaurant_id);
            Err(ApiError::Unprocessable(
                "No existe un restaurante con ese id".to_string(),
            ))
        }
    }
}

/// Delete a restaurant with its chefs and menus
#[utoipa::path(
    delete,
    path = "/restaurantes/{restaurant_id}",
    tag = "restaurants",
    params(("restaurant_id" = i32, Path, description = "Restaurant ID")),
    responses(
        (status = 204, description = "Restaurant deleted"),
        (status = 404, description = "Restaurant not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip(state))]
pub async fn delete_restaurant(
    Path(restaurant_id): Path<i32>,
    State(state): State<AppState>,
    _caller: AuthenticatedUser,
) -> ApiResult<StatusCode> {
    trace!("Entering delete_restaurant function for restaurant_id: {}", restaurant_id);

    let result = restaurant::Entity::delete_by_id(restaurant_id)
        .exec(&state.db)
        .await?;

    if result.rows_affected == 0 {
        warn!("Restaurant with ID {} not found for deletion", restaurant_id);
        return Err(ApiError::NotFound(
            "No existe un restaurante con ese id".to_string(),
        ));
    }

    info!("Restaurant {} deleted", restaurant_id);
    Ok(StatusCode::NO_CONTENT)
}

/// Restaurants owned by an administrator, used by the user detail view.
pub(crate) async fn administrator_restaurants(
    state: &AppState,
    administrator: &user::Model,
) -> ApiResult<Vec<RestaurantResponse>> {
    let restaurants = restaurant::Entity::find()
        .filter(restaurant::Column::AdministratorId.eq(administrator.id))
        .order_by_asc(restaurant::Column::Id)
        .all(&state.db)
        .await?;
    Ok(restaurants.into_iter().map(RestaurantResponse::from).collect())
}
