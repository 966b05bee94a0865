use crate::handlers::{
    auth::{log_in, sign_up},
    chefs::{create_chef, get_chefs},
    health::health_check,
    ingredients::{
        create_ingredient, delete_ingredient, get_ingredient, get_ingredients, update_ingredient,
    },
    menus::{create_menu, get_chef_menus, get_menu, get_restaurant_menus, update_menu},
    recipes::{create_recipe, delete_recipe, get_recipe, get_recipes, update_recipe},
    reports::create_menu_report,
    restaurants::{create_restaurant, delete_restaurant, get_restaurant, get_restaurants},
    users::{delete_administrator, get_user, update_password},
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{delete, get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Sign-up, log-in and user accounts
        .route("/signin", post(sign_up))
        .route("/login", post(log_in))
        .route(
            "/usuarios/:user_id",
            get(get_user).put(update_password).delete(delete_administrator),
        )
        // Restaurants and their chefs
        .route(
            "/usuarios/:user_id/restaurantes",
            get(get_restaurants).post(create_restaurant),
        )
        .route(
            "/usuarios/:user_id/restaurante/:restaurant_id",
            get(get_restaurant),
        )
        .route("/restaurantes/:restaurant_id", delete(delete_restaurant))
        .route(
            "/restaurantes/:restaurant_id/chefs",
            get(get_chefs).post(create_chef),
        )
        // Ingredient catalog
        .route(
            "/usuarios/:user_id/ingredientes",
            get(get_ingredients).post(create_ingredient),
        )
        .route(
            "/ingredientes/:ingredient_id",
            get(get_ingredient)
                .put(update_ingredient)
                .delete(delete_ingredient),
        )
        // Recipe catalog
        .route(
            "/usuarios/:user_id/recetas",
            get(get_recipes).post(create_recipe),
        )
        .route(
            "/recetas/:recipe_id",
            get(get_recipe).put(update_recipe).delete(delete_recipe),
        )
        // Menus
        .route(
            "/usuarios/:user_id/menus",
            get(get_chef_menus).post(create_menu),
        )
        .route(
            "/usuarios/:user_id/menu/:menu_id",
            get(get_menu).put(update_menu),
        )
        .route(
            "/usuarios/:user_id/restaurantes/:restaurant_id/menus",
            get(get_restaurant_menus),
        )
        // Purchasing report
        .route("/reporteMenu", post(create_menu_report))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
