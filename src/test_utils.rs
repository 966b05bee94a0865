#[cfg(test)]
pub mod test_utils {
    use crate::auth::TokenIssuer;
    use crate::router::create_router;
    use crate::schemas::AppState;
    use axum::http::{header::AUTHORIZATION, HeaderName, HeaderValue, StatusCode};
    use axum::Router;
    use axum_test::TestServer;
    use compute::RoundingPolicy;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{Database, DatabaseConnection};
    use serde_json::{json, Value};
    use tracing::Level;
    use tracing_subscriber::FmtSubscriber;

    pub const TEST_SECRET: &str = "test-secret";
    pub const TEST_PASSWORD: &str = "clave123";

    /// Create an in-memory SQLite database for testing
    pub async fn setup_test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory database");

        // Run migrations
        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        db
    }

    /// Create AppState for testing
    pub async fn setup_test_app_state() -> AppState {
        AppState {
            db: setup_test_db().await,
            tokens: TokenIssuer::new(TEST_SECRET, 1),
            report_rounding: RoundingPolicy::Final,
        }
    }

    /// Initialize tracing for tests with output to STDERR.
    ///
    /// The log level is determined by the RUST_LOG environment variable,
    /// defaulting to WARN if not set. Only the first call installs the
    /// subscriber.
    fn init_test_tracing() {
        let log_level = std::env::var("RUST_LOG")
            .ok()
            .and_then(|level| match level.to_uppercase().as_str() {
                "ERROR" => Some(Level::ERROR),
                "WARN" => Some(Level::WARN),
                "INFO" => Some(Level::INFO),
                "DEBUG" => Some(Level::DEBUG),
                "TRACE" => Some(Level::TRACE),
                _ => None,
            })
            .unwrap_or(Level::WARN);

        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    /// Create axum app for testing
    pub async fn setup_test_app() -> Router {
        init_test_tracing();
        create_router(setup_test_app_state().await)
    }

    /// Create a test server around a fresh app
    pub async fn setup_test_server() -> TestServer {
        TestServer::new(setup_test_app().await).unwrap()
    }

    /// `Authorization: Bearer` header for a token
    pub fn bearer(token: &str) -> (HeaderName, HeaderValue) {
        (
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        )
    }

    /// Log in and return (user id, token)
    pub async fn log_in(server: &TestServer, username: &str, password: &str) -> (i32, String) {
        let response = server
            .post("/login")
            .json(&json!({"usuario": username, "contrasena": password}))
            .await;
        response.assert_status(StatusCode::OK);

        let body = response.json::<Value>();
        let id = body["id"].as_i64().unwrap() as i32;
        let token = body["token"].as_str().unwrap().to_string();
        (id, token)
    }

    /// Sign up an administrator and log it in, returning (id, token)
    pub async fn create_administrator(server: &TestServer, username: &str) -> (i32, String) {
        server
            .post("/signin")
            .json(&json!({"usuario": username, "contrasena": TEST_PASSWORD}))
            .await
            .assert_status(StatusCode::OK);

        log_in(server, username, TEST_PASSWORD).await
    }

    /// Body of a complete restaurant creation request
    pub fn restaurant_body(name: &str) -> Value {
        json!({
            "nombre": name,
            "direccion": "Calle 1 # 2-3",
            "telefono": "3001234567",
            "redes_sociales": "@restaurante",
            "hora_apertura": "08:00",
            "servicio_sitio": true,
            "servicio_domicilio": false,
            "tipo_comida": "Italiana",
            "plataformas": "Rappi"
        })
    }

    pub async fn create_restaurant(
        server: &TestServer,
        token: &str,
        administrator_id: i32,
        name: &str,
    ) -> i32 {
        let (header, value) = bearer(token);
        let response = server
            .post(&format!("/usuarios/{}/restaurantes", administrator_id))
            .add_header(header, value)
            .json(&restaurant_body(name))
            .await;
        response.assert_status(StatusCode::OK);
        response.json::<Value>()["id"].as_i64().unwrap() as i32
    }

    pub async fn create_ingredient(
        server: &TestServer,
        token: &str,
        user_id: i32,
        name: &str,
    ) -> i32 {
        let (header, value) = bearer(token);
        let response = server
            .post(&format!("/usuarios/{}/ingredientes", user_id))
            .add_header(header, value)
            .json(&json!({
                "nombre": name,
                "unidad": "gramos",
                "costo": 1500,
                "calorias": "120.5",
                "sitio": "Plaza de mercado"
            }))
            .await;
        response.assert_status(StatusCode::OK);
        response.json::<Value>()["id"].as_i64().unwrap() as i32
    }

    /// Create a recipe with `(quantity, ingredient id)` links, returning the recipe id
    pub async fn create_recipe(
        server: &TestServer,
        token: &str,
        user_id: i32,
        name: &str,
        portion: i64,
        links: &[(i64, i32)],
    ) -> i32 {
        let ingredientes: Vec<Value> = links
            .iter()
            .map(|(quantity, ingredient_id)| {
                json!({"cantidad": quantity, "idIngrediente": ingredient_id})
            })
            .collect();

        let (header, value) = bearer(token);
        let response = server
            .post(&format!("/usuarios/{}/recetas", user_id))
            .add_header(header, value)
            .json(&json!({
                "nombre": name,
                "duracion": 30,
                "porcion": portion,
                "preparacion": "Mezclar y cocinar",
                "ingredientes": ingredientes
            }))
            .await;
        response.assert_status(StatusCode::OK);
        response.json::<Value>()["id"].as_i64().unwrap() as i32
    }

    /// Create a chef in a restaurant and log it in, returning (id, token)
    pub async fn create_chef(
        server: &TestServer,
        token: &str,
        restaurant_id: i32,
        username: &str,
    ) -> (i32, String) {
        let (header, value) = bearer(token);
        server
            .post(&format!("/restaurantes/{}/chefs", restaurant_id))
            .add_header(header, value)
            .json(&json!({
                "nombre": "Chef de prueba",
                "usuario": username,
                "contrasena": TEST_PASSWORD
            }))
            .await
            .assert_status(StatusCode::OK);

        log_in(server, username, TEST_PASSWORD).await
    }

    /// Body of a menu request serving `recipe_id` for `servings` people
    pub fn menu_body(name: &str, restaurant_id: i32, recipe_id: i32, servings: i32) -> Value {
        json!({
            "nombre": name,
            "descripcion": "Menú de la semana",
            "fechaInicio": "2024-03-01",
            "fechaFin": "2024-03-07",
            "foto": "https://example.com/menu.png",
            "restaurante": restaurant_id,
            "recetas": [{"personas": servings, "receta": recipe_id}]
        })
    }

    pub async fn create_menu(
        server: &TestServer,
        token: &str,
        user_id: i32,
        body: &Value,
    ) -> Value {
        let (header, value) = bearer(token);
        let response = server
            .post(&format!("/usuarios/{}/menus", user_id))
            .add_header(header, value)
            .json(body)
            .await;
        response.assert_status(StatusCode::OK);
        response.json::<Value>()
    }
}
