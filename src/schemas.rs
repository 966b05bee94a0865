use axum::{extract::FromRequest, Json};
use compute::RoundingPolicy;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi, ToSchema,
};

use crate::auth::TokenIssuer;
use crate::error::ApiError;

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Issues and validates bearer tokens
    pub tokens: TokenIssuer,
    /// Rounding applied by the purchasing report
    pub report_rounding: RoundingPolicy,
}

/// JSON request body whose rejections render as `ApiError`.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl<T: validator::Validate> axum_valid::HasValidate for ApiJson<T> {
    type Validate = T;

    fn get_validate(&self) -> &T {
        &self.0
    }
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Human readable error message
    pub mensaje: String,
    /// Required fields that were missing or empty
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub campos_faltantes: Option<Vec<String>>,
}

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// Reads an id sent either as a JSON number or as a numeric string.
fn value_to_id(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|v| i32::try_from(v).ok()),
        Value::String(s) => s.trim().parse::<i32>().ok(),
        _ => None,
    }
}

/// Custom deserializer for ids that handles both string and integer values
pub fn deserialize_id<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value = Value::deserialize(deserializer)?;
    value_to_id(&value).ok_or_else(|| D::Error::custom("id must be an integer or a numeric string"))
}

/// Like [`deserialize_id`], but `null` and `""` mean "no id".
pub fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value = Value::deserialize(deserializer)?;
    match &value {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        other => value_to_id(other)
            .map(Some)
            .ok_or_else(|| D::Error::custom("id must be empty, an integer or a numeric string")),
    }
}

/// Reads a reference to another entity: an id, or an object carrying an `id`.
pub fn deserialize_entity_ref<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value = Value::deserialize(deserializer)?;
    let id = match &value {
        Value::Object(fields) => fields.get("id").and_then(value_to_id),
        other => value_to_id(other),
    };
    id.ok_or_else(|| D::Error::custom("reference must be an id or an object with an id"))
}

/// Optional form of [`deserialize_entity_ref`]: `null` and `""` mean "no reference".
pub fn deserialize_optional_entity_ref<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value = Value::deserialize(deserializer)?;
    match &value {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::Object(fields) => fields
            .get("id")
            .and_then(value_to_id)
            .map(Some)
            .ok_or_else(|| D::Error::custom("reference object must carry an id")),
        other => value_to_id(other)
            .map(Some)
            .ok_or_else(|| D::Error::custom("reference must be an id or an object with an id")),
    }
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::auth::sign_up,
        crate::handlers::auth::log_in,
        crate::handlers::users::get_user,
        crate::handlers::users::update_password,
        crate::handlers::users::delete_administrator,
        crate::handlers::restaurants::get_restaurants,
        crate::handlers::restaurants::create_restaurant,
        crate::handlers::restaurants::get_restaurant,
        crate::handlers::restaurants::delete_restaurant,
        crate::handlers::ingredients::get_ingredients,
        crate::handlers::ingredients::create_ingredient,
        crate::handlers::ingredients::get_ingredient,
        crate::handlers::ingredients::update_ingredient,
        crate::handlers::ingredients::delete_ingredient,
        crate::handlers::recipes::get_recipes,
        crate::handlers::recipes::create_recipe,
        crate::handlers::recipes::get_recipe,
        crate::handlers::recipes::update_recipe,
        crate::handlers::recipes::delete_recipe,
        crate::handlers::chefs::get_chefs,
        crate::handlers::chefs::create_chef,
        crate::handlers::menus::create_menu,
        crate::handlers::menus::get_chef_menus,
        crate::handlers::menus::get_menu,
        crate::handlers::menus::update_menu,
        crate::handlers::menus::get_restaurant_menus,
        crate::handlers::reports::create_menu_report,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            crate::handlers::auth::SignUpRequest,
            crate::handlers::auth::SignUpResponse,
            crate::handlers::auth::LogInRequest,
            crate::handlers::auth::LogInResponse,
            crate::handlers::users::UserDetailResponse,
            crate::handlers::users::UpdatePasswordRequest,
            crate::handlers::restaurants::CreateRestaurantRequest,
            crate::handlers::restaurants::RestaurantResponse,
            crate::handlers::ingredients::IngredientRequest,
            crate::handlers::ingredients::IngredientResponse,
            crate::handlers::recipes::RecipeRequest,
            crate::handlers::recipes::RecipeIngredientRequest,
            crate::handlers::recipes::RecipeResponse,
            crate::handlers::recipes::RecipeIngredientResponse,
            crate::handlers::recipes::RecipeIngredientDetail,
            crate::handlers::chefs::CreateChefRequest,
            crate::handlers::chefs::ChefResponse,
            crate::handlers::menus::MenuRequest,
            crate::handlers::menus::MenuRecipeRequest,
            crate::handlers::menus::MenuResponse,
            crate::handlers::menus::MenuRecipeResponse,
            crate::handlers::reports::ReportRequestBody,
            crate::handlers::reports::ReportEntry,
            crate::handlers::reports::ReportItemResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Sign-up and log-in"),
        (name = "users", description = "User management endpoints"),
        (name = "restaurants", description = "Restaurant endpoints"),
        (name = "ingredients", description = "Ingredient catalog endpoints"),
        (name = "recipes", description = "Recipe catalog endpoints"),
        (name = "chefs", description = "Chef endpoints"),
        (name = "menus", description = "Menu endpoints"),
        (name = "reports", description = "Purchasing report endpoints"),
    ),
    info(
        title = "Cheflab API",
        description = "Restaurant management API - restaurants, recipes, menus and purchasing reports",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Ids {
        #[serde(deserialize_with = "deserialize_id")]
        id: i32,
        #[serde(default, deserialize_with = "deserialize_optional_id")]
        maybe: Option<i32>,
        #[serde(deserialize_with = "deserialize_entity_ref")]
        reference: i32,
    }

    #[test]
    fn test_ids_accept_numbers_and_strings() {
        let ids: Ids =
            serde_json::from_str(r#"{"id": "12", "maybe": 3, "reference": {"id": "7"}}"#).unwrap();
        assert_eq!(ids.id, 12);
        assert_eq!(ids.maybe, Some(3));
        assert_eq!(ids.reference, 7);

        let ids: Ids = serde_json::from_str(r#"{"id": 4, "maybe": "", "reference": 9}"#).unwrap();
        assert_eq!(ids.id, 4);
        assert_eq!(ids.maybe, None);
        assert_eq!(ids.reference, 9);

        let ids: Ids = serde_json::from_str(r#"{"id": 4, "reference": "5"}"#).unwrap();
        assert_eq!(ids.maybe, None);
        assert_eq!(ids.reference, 5);
    }

    #[derive(Debug, Deserialize)]
    struct OptionalRef {
        #[serde(default, deserialize_with = "deserialize_optional_entity_ref")]
        restaurante: Option<i32>,
    }

    #[test]
    fn test_optional_reference_forms() {
        let parse = |json: &str| serde_json::from_str::<OptionalRef>(json).unwrap().restaurante;

        assert_eq!(parse(r#"{}"#), None);
        assert_eq!(parse(r#"{"restaurante": null}"#), None);
        assert_eq!(parse(r#"{"restaurante": ""}"#), None);
        assert_eq!(parse(r#"{"restaurante": 3}"#), Some(3));
        assert_eq!(parse(r#"{"restaurante": {"id": "8", "nombre": "x"}}"#), Some(8));
        assert!(serde_json::from_str::<OptionalRef>(r#"{"restaurante": {}}"#).is_err());
    }

    #[test]
    fn test_invalid_ids_are_rejected() {
        assert!(serde_json::from_str::<Ids>(r#"{"id": "abc", "reference": 1}"#).is_err());
        assert!(serde_json::from_str::<Ids>(r#"{"id": 1, "reference": {"name": "x"}}"#).is_err());
        assert!(serde_json::from_str::<Ids>(r#"{"id": 1, "maybe": true, "reference": 1}"#).is_err());
    }
}
