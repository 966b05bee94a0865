#[cfg(test)]
mod integration_tests {
    use crate::test_utils::test_utils::{
        bearer, create_administrator, create_chef, create_ingredient, create_menu,
        create_recipe, create_restaurant, log_in, menu_body, restaurant_body, setup_test_server,
        TEST_PASSWORD,
    };
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    fn decimal(value: &Value) -> f64 {
        match value {
            Value::String(s) => s.parse::<f64>().unwrap(),
            other => other.as_f64().unwrap(),
        }
    }

    #[tokio::test]
    async fn test_health_check() {
        let server = setup_test_server().await;

        let response = server.get("/health").await;

        response.assert_status(StatusCode::OK);
        let body = response.json::<Value>();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["database"], "connected");
    }

    #[tokio::test]
    async fn test_openapi_document_is_served() {
        let server = setup_test_server().await;

        let response = server.get("/api-docs/openapi.json").await;

        response.assert_status(StatusCode::OK);
        let body = response.json::<Value>();
        assert!(body["paths"]["/reporteMenu"].is_object());
        assert!(body["paths"]["/recetas/{recipe_id}"].is_object());
    }

    #[tokio::test]
    async fn test_sign_up_then_log_in_returns_same_id() {
        let server = setup_test_server().await;

        let response = server
            .post("/signin")
            .json(&json!({"usuario": "ana", "contrasena": "secreto"}))
            .await;
        response.assert_status(StatusCode::OK);
        let body = response.json::<Value>();
        assert_eq!(body["mensaje"], "usuario creado exitosamente");
        let created_id = body["id"].as_i64().unwrap();

        let response = server
            .post("/login")
            .json(&json!({"usuario": "ana", "contrasena": "secreto"}))
            .await;
        response.assert_status(StatusCode::OK);
        let body = response.json::<Value>();
        assert_eq!(body["mensaje"], "Inicio de sesión exitoso");
        assert_eq!(body["id"].as_i64().unwrap(), created_id);
        assert_eq!(body["tipo"], "Administrador");
        assert_eq!(body["nombre"], "Administrador");
        assert!(!body["token"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sign_up_with_taken_username_fails() {
        let server = setup_test_server().await;
        create_administrator(&server, "repetido").await;

        let response = server
            .post("/signin")
            .json(&json!({"usuario": "repetido", "contrasena": "otra"}))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.json::<Value>()["mensaje"], "El usuario ya existe");
    }

    #[tokio::test]
    async fn test_sign_up_with_empty_credentials_fails() {
        let server = setup_test_server().await;

        let response = server
            .post("/signin")
            .json(&json!({"usuario": "", "contrasena": "secreto"}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_log_in_with_wrong_password_fails() {
        let server = setup_test_server().await;
        create_administrator(&server, "beto").await;

        let response = server
            .post("/login")
            .json(&json!({"usuario": "beto", "contrasena": "equivocada"}))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(
            response.json::<Value>()["mensaje"],
            "Usuario o contraseña incorrectos"
        );

        // The stored hash is not a valid password either
        let hashed = crate::auth::hash_password(TEST_PASSWORD).unwrap();
        let response = server
            .post("/login")
            .json(&json!({"usuario": "beto", "contrasena": hashed}))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_requests_without_valid_token_are_rejected() {
        let server = setup_test_server().await;
        let (admin_id, _) = create_administrator(&server, "carla").await;

        let response = server
            .get(&format!("/usuarios/{}/restaurantes", admin_id))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert!(response.json::<Value>()["mensaje"].is_string());

        let (header, value) = bearer("not-a-token");
        let response = server
            .get(&format!("/usuarios/{}/ingredientes", admin_id))
            .add_header(header, value)
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);

        let response = server
            .post("/reporteMenu")
            .json(&json!({"recetas": []}))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_and_list_restaurants() {
        let server = setup_test_server().await;
        let (admin_id, token) = create_administrator(&server, "dora").await;
        let restaurant_id = create_restaurant(&server, &token, admin_id, "La Cazuela").await;

        let (header, value) = bearer(&token);
        let response = server
            .get(&format!("/usuarios/{}/restaurantes", admin_id))
            .add_header(header, value)
            .await;
        response.assert_status(StatusCode::OK);
        let body = response.json::<Value>();
        let restaurants = body.as_array().unwrap();
        assert_eq!(restaurants.len(), 1);
        assert_eq!(restaurants[0]["id"].as_i64().unwrap(), restaurant_id as i64);
        assert_eq!(restaurants[0]["nombre"], "La Cazuela");
        assert_eq!(restaurants[0]["servicio_sitio"], true);
        assert_eq!(restaurants[0]["administrador"].as_i64().unwrap(), admin_id as i64);

        let (header, value) = bearer(&token);
        let response = server
            .get(&format!("/usuarios/{}/restaurante/{}", admin_id, restaurant_id))
            .add_header(header, value)
            .await;
        response.assert_status(StatusCode::OK);
        assert_eq!(response.json::<Value>()["tipo_comida"], "Italiana");
    }

    #[tokio::test]
    async fn test_create_restaurant_reports_missing_fields_in_order() {
        let server = setup_test_server().await;
        let (admin_id, token) = create_administrator(&server, "elena").await;

        let mut body = restaurant_body("Sin Datos");
        let fields = body.as_object_mut().unwrap();
        fields.remove("telefono");
        fields.insert("servicio_sitio".to_string(), json!("si"));
        fields.insert("tipo_comida".to_string(), json!(""));

        let (header, value) = bearer(&token);
        let response = server
            .post(&format!("/usuarios/{}/restaurantes", admin_id))
            .add_header(header, value)
            .json(&body)
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body = response.json::<Value>();
        assert_eq!(body["mensaje"], "Campos faltantes");
        assert_eq!(
            body["campos_faltantes"],
            json!(["telefono", "servicio_sitio", "tipo_comida"])
        );
    }

    #[tokio::test]
    async fn test_create_restaurant_with_duplicate_name_fails() {
        let server = setup_test_server().await;
        let (first_admin, first_token) = create_administrator(&server, "fabio").await;
        let (second_admin, second_token) = create_administrator(&server, "gina").await;
        create_restaurant(&server, &first_token, first_admin, "El Fogón").await;

        // Names are unique across administrators
        let (header, value) = bearer(&second_token);
        let response = server
            .post(&format!("/usuarios/{}/restaurantes", second_admin))
            .add_header(header, value)
            .json(&restaurant_body("El Fogón"))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let message = response.json::<Value>()["mensaje"].as_str().unwrap().to_string();
        assert!(message.contains("El Fogón"));
    }

    #[tokio::test]
    async fn test_get_restaurant_with_unknown_ids_fails() {
        let server = setup_test_server().await;
        let (admin_id, token) = create_administrator(&server, "hugo").await;
        let restaurant_id = create_restaurant(&server, &token, admin_id, "Casa Hugo").await;

        let (header, value) = bearer(&token);
        let response = server
            .get(&format!("/usuarios/{}/restaurante/{}", 9999, restaurant_id))
            .add_header(header, value)
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.json::<Value>()["mensaje"], "No existe un usuario con ese id");

        let (header, value) = bearer(&token);
        let response = server
            .get(&format!("/usuarios/{}/restaurante/{}", admin_id, 9999))
            .add_header(header, value)
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            response.json::<Value>()["mensaje"],
            "No existe un restaurante con ese id"
        );
    }

    #[tokio::test]
    async fn test_update_ingredient_returns_new_values_under_same_id() {
        let server = setup_test_server().await;
        let (admin_id, token) = create_administrator(&server, "ines").await;
        let ingredient_id = create_ingredient(&server, &token, admin_id, "Tomate").await;

        let (header, value) = bearer(&token);
        let response = server
            .put(&format!("/ingredientes/{}", ingredient_id))
            .add_header(header, value)
            .json(&json!({
                "nombre": "Tomate chonto",
                "unidad": "kilos",
                "costo": "4200.5",
                "calorias": 18,
                "sitio": "Supermercado"
            }))
            .await;

        response.assert_status(StatusCode::OK);
        let body = response.json::<Value>();
        assert_eq!(body["id"].as_i64().unwrap(), ingredient_id as i64);
        assert_eq!(body["nombre"], "Tomate chonto");
        assert_eq!(body["unidad"], "kilos");
        assert_eq!(decimal(&body["costo"]), 4200.5);
        assert_eq!(decimal(&body["calorias"]), 18.0);

        let (header, value) = bearer(&token);
        let response = server
            .get(&format!("/ingredientes/{}", ingredient_id))
            .add_header(header, value)
            .await;
        response.assert_status(StatusCode::OK);
        assert_eq!(response.json::<Value>()["sitio"], "Supermercado");
    }

    #[tokio::test]
    async fn test_unknown_ingredient_is_not_found() {
        let server = setup_test_server().await;
        let (_, token) = create_administrator(&server, "jaime").await;

        let (header, value) = bearer(&token);
        server
            .get("/ingredientes/4242")
            .add_header(header, value)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_ingredient_in_use_is_rejected() {
        let server = setup_test_server().await;
        let (admin_id, token) = create_administrator(&server, "karen").await;
        let used = create_ingredient(&server, &token, admin_id, "Harina").await;
        let unused = create_ingredient(&server, &token, admin_id, "Azúcar").await;
        create_recipe(&server, &token, admin_id, "Pan", 4, &[(500, used)]).await;

        let (header, value) = bearer(&token);
        let response = server
            .delete(&format!("/ingredientes/{}", used))
            .add_header(header, value)
            .await;
        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(
            response.json::<Value>()["mensaje"],
            "El ingrediente se está usando en diferentes recetas"
        );

        let (header, value) = bearer(&token);
        server
            .get(&format!("/ingredientes/{}", used))
            .add_header(header, value)
            .await
            .assert_status(StatusCode::OK);

        let (header, value) = bearer(&token);
        server
            .delete(&format!("/ingredientes/{}", unused))
            .add_header(header, value)
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let (header, value) = bearer(&token);
        server
            .get(&format!("/ingredientes/{}", unused))
            .add_header(header, value)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_chef_shares_administrator_catalog() {
        let server = setup_test_server().await;
        let (admin_id, token) = create_administrator(&server, "luis").await;
        let restaurant_id = create_restaurant(&server, &token, admin_id, "Donde Luis").await;
        let (chef_id, chef_token) = create_chef(&server, &token, restaurant_id, "chef_luis").await;

        let ingredient_id = create_ingredient(&server, &chef_token, chef_id, "Cebolla").await;

        let (header, value) = bearer(&token);
        let response = server
            .get(&format!("/usuarios/{}/ingredientes", admin_id))
            .add_header(header, value)
            .await;
        response.assert_status(StatusCode::OK);
        let body = response.json::<Value>();
        let ingredients = body.as_array().unwrap();
        assert_eq!(ingredients.len(), 1);
        assert_eq!(ingredients[0]["id"].as_i64().unwrap(), ingredient_id as i64);
        assert_eq!(ingredients[0]["administrador"].as_i64().unwrap(), admin_id as i64);

        let (header, value) = bearer(&chef_token);
        let response = server
            .get(&format!("/usuarios/{}/restaurantes", chef_id))
            .add_header(header, value)
            .await;
        response.assert_status(StatusCode::OK);
        assert_eq!(response.json::<Value>().as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_chef_with_taken_username_fails() {
        let server = setup_test_server().await;
        let (admin_id, token) = create_administrator(&server, "mario").await;
        let restaurant_id = create_restaurant(&server, &token, admin_id, "Mario's").await;

        let (header, value) = bearer(&token);
        let response = server
            .post(&format!("/restaurantes/{}/chefs", restaurant_id))
            .add_header(header, value)
            .json(&json!({"nombre": "Otro", "usuario": "mario", "contrasena": "x"}))
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            response.json::<Value>()["mensaje"],
            "Ya existe un chef con el mismo usuario"
        );

        let (header, value) = bearer(&token);
        server
            .post("/restaurantes/777/chefs")
            .add_header(header, value)
            .json(&json!({"nombre": "Nadie", "usuario": "nadie", "contrasena": "x"}))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        create_chef(&server, &token, restaurant_id, "chef_mario").await;
        let (header, value) = bearer(&token);
        let response = server
            .get(&format!("/restaurantes/{}/chefs", restaurant_id))
            .add_header(header, value)
            .await;
        response.assert_status(StatusCode::OK);
        let body = response.json::<Value>();
        let chefs = body.as_array().unwrap();
        assert_eq!(chefs.len(), 1);
        assert_eq!(chefs[0]["usuario"], "chef_mario");
        assert_eq!(chefs[0]["tipo"], "Chef");
    }

    #[tokio::test]
    async fn test_recipe_embeds_ingredients() {
        let server = setup_test_server().await;
        let (admin_id, token) = create_administrator(&server, "nora").await;
        let ingredient_id = create_ingredient(&server, &token, admin_id, "Arroz").await;
        let recipe_id =
            create_recipe(&server, &token, admin_id, "Arroz blanco", 2, &[(250, ingredient_id)])
                .await;

        let (header, value) = bearer(&token);
        let response = server
            .get(&format!("/recetas/{}", recipe_id))
            .add_header(header, value)
            .await;
        response.assert_status(StatusCode::OK);
        let body = response.json::<Value>();
        assert_eq!(body["nombre"], "Arroz blanco");
        assert_eq!(body["usuario"].as_i64().unwrap(), admin_id as i64);
        let links = body["ingredientes"].as_array().unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(decimal(&links[0]["cantidad"]), 250.0);
        assert_eq!(links[0]["ingrediente"]["nombre"], "Arroz");
        assert_eq!(links[0]["ingrediente"]["costo"].as_f64().unwrap(), 1500.0);
    }

    #[tokio::test]
    async fn test_chef_lists_own_recipes_unless_all_requested() {
        let server = setup_test_server().await;
        let (admin_id, token) = create_administrator(&server, "oscar").await;
        let restaurant_id = create_restaurant(&server, &token, admin_id, "Oscar's").await;
        let (chef_id, chef_token) = create_chef(&server, &token, restaurant_id, "chef_oscar").await;
        let ingredient_id = create_ingredient(&server, &token, admin_id, "Papa").await;

        create_recipe(&server, &token, admin_id, "Puré", 2, &[(300, ingredient_id)]).await;
        create_recipe(&server, &chef_token, chef_id, "Papas fritas", 1, &[(200, ingredient_id)])
            .await;

        let (header, value) = bearer(&chef_token);
        let response = server
            .get(&format!("/usuarios/{}/recetas", chef_id))
            .add_header(header, value)
            .await;
        response.assert_status(StatusCode::OK);
        let body = response.json::<Value>();
        let own = body.as_array().unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0]["nombre"], "Papas fritas");
        assert_eq!(own[0]["administrador"].as_i64().unwrap(), admin_id as i64);

        let (header, value) = bearer(&chef_token);
        let response = server
            .get(&format!("/usuarios/{}/recetas", chef_id))
            .add_query_param("todos", "true")
            .add_header(header, value)
            .await;
        response.assert_status(StatusCode::OK);
        assert_eq!(response.json::<Value>().as_array().unwrap().len(), 2);

        let (header, value) = bearer(&token);
        let response = server
            .get(&format!("/usuarios/{}/recetas", admin_id))
            .add_header(header, value)
            .await;
        assert_eq!(response.json::<Value>().as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_edit_recipe_reconciles_ingredient_links() {
        let server = setup_test_server().await;
        let (admin_id, token) = create_administrator(&server, "paula").await;
        let flour = create_ingredient(&server, &token, admin_id, "Harina").await;
        let eggs = create_ingredient(&server, &token, admin_id, "Huevos").await;
        let milk = create_ingredient(&server, &token, admin_id, "Leche").await;
        let recipe_id =
            create_recipe(&server, &token, admin_id, "Crepes", 4, &[(200, flour), (2, eggs)]).await;

        let (header, value) = bearer(&token);
        let body = server
            .get(&format!("/recetas/{}", recipe_id))
            .add_header(header, value)
            .await
            .json::<Value>();
        let links = body["ingredientes"].as_array().unwrap();
        let flour_link = links
            .iter()
            .find(|l| l["ingrediente"]["id"].as_i64().unwrap() == flour as i64)
            .unwrap()["id"]
            .as_i64()
            .unwrap();
        let eggs_link = links
            .iter()
            .find(|l| l["ingrediente"]["id"].as_i64().unwrap() == eggs as i64)
            .unwrap()["id"]
            .as_i64()
            .unwrap();

        // Drop the flour, change the eggs, add milk
        let (header, value) = bearer(&token);
        let response = server
            .put(&format!("/recetas/{}", recipe_id))
            .add_header(header, value)
            .json(&json!({
                "nombre": "Crepes dulces",
                "duracion": 20,
                "porcion": 4,
                "preparacion": "Batir todo",
                "ingredientes": [
                    {"id": eggs_link.to_string(), "cantidad": 3, "idIngrediente": eggs.to_string()},
                    {"id": "", "cantidad": "500", "idIngrediente": milk}
                ]
            }))
            .await;

        response.assert_status(StatusCode::OK);
        let body = response.json::<Value>();
        assert_eq!(body["nombre"], "Crepes dulces");
        let links = body["ingredientes"].as_array().unwrap();
        assert_eq!(links.len(), 2);
        assert!(links.iter().all(|l| l["id"].as_i64().unwrap() != flour_link));

        let eggs_entry = links
            .iter()
            .find(|l| l["id"].as_i64().unwrap() == eggs_link)
            .unwrap();
        assert_eq!(decimal(&eggs_entry["cantidad"]), 3.0);

        let milk_entry = links
            .iter()
            .find(|l| l["ingrediente"]["id"].as_i64().unwrap() == milk as i64)
            .unwrap();
        assert_eq!(decimal(&milk_entry["cantidad"]), 500.0);
    }

    #[tokio::test]
    async fn test_edit_recipe_with_foreign_link_changes_nothing() {
        let server = setup_test_server().await;
        let (admin_id, token) = create_administrator(&server, "quique").await;
        let salt = create_ingredient(&server, &token, admin_id, "Sal").await;
        let recipe_id = create_recipe(&server, &token, admin_id, "Caldo", 2, &[(5, salt)]).await;

        let (header, value) = bearer(&token);
        let response = server
            .put(&format!("/recetas/{}", recipe_id))
            .add_header(header, value)
            .json(&json!({
                "nombre": "Caldo cambiado",
                "duracion": 10,
                "porcion": 2,
                "preparacion": "Hervir",
                "ingredientes": [{"id": 987654, "cantidad": 1, "idIngrediente": salt}]
            }))
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let (header, value) = bearer(&token);
        let body = server
            .get(&format!("/recetas/{}", recipe_id))
            .add_header(header, value)
            .await
            .json::<Value>();
        assert_eq!(body["nombre"], "Caldo");
        assert_eq!(body["ingredientes"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_report_scales_single_recipe() {
        let server = setup_test_server().await;
        let (admin_id, token) = create_administrator(&server, "rosa").await;
        let rice = create_ingredient(&server, &token, admin_id, "Arroz").await;
        let recipe_id = create_recipe(&server, &token, admin_id, "Arroz", 4, &[(200, rice)]).await;

        let (header, value) = bearer(&token);
        let response = server
            .post("/reporteMenu")
            .add_header(header, value)
            .json(&json!({"recetas": [{"personas": 10, "id": recipe_id}]}))
            .await;

        response.assert_status(StatusCode::OK);
        let body = response.json::<Value>();
        let item = &body[rice.to_string()];
        assert_eq!(item["nombre"], "Arroz");
        assert_eq!(item["unidad"], "gramos");
        assert_eq!(item["sitio"], "Plaza de mercado");
        // 10 * 200 / 4
        assert_eq!(decimal(&item["cantidad"]), 500.0);
    }

    #[tokio::test]
    async fn test_report_sums_shared_ingredient_across_recipes() {
        let server = setup_test_server().await;
        let (admin_id, token) = create_administrator(&server, "santi").await;
        let oil = create_ingredient(&server, &token, admin_id, "Aceite").await;
        let garlic = create_ingredient(&server, &token, admin_id, "Ajo").await;
        let first = create_recipe(&server, &token, admin_id, "Sofrito", 2, &[(100, oil)]).await;
        let second =
            create_recipe(&server, &token, admin_id, "Alioli", 3, &[(30, oil), (6, garlic)]).await;

        let (header, value) = bearer(&token);
        let response = server
            .post("/reporteMenu")
            .add_header(header, value)
            .json(&json!({"recetas": [
                {"personas": 3, "receta": first},
                {"personas": 5, "receta": second.to_string()}
            ]}))
            .await;

        response.assert_status(StatusCode::OK);
        let body = response.json::<Value>();
        assert_eq!(body.as_object().unwrap().len(), 2);
        // 3 * 100 / 2 + 5 * 30 / 3
        assert_eq!(decimal(&body[oil.to_string()]["cantidad"]), 200.0);
        // 5 * 6 / 3
        assert_eq!(decimal(&body[garlic.to_string()]["cantidad"]), 10.0);
    }

    #[tokio::test]
    async fn test_report_with_unknown_recipe_fails() {
        let server = setup_test_server().await;
        let (_, token) = create_administrator(&server, "tomas").await;

        let (header, value) = bearer(&token);
        server
            .post("/reporteMenu")
            .add_header(header, value)
            .json(&json!({"recetas": [{"personas": 2, "receta": 31337}]}))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_body_missing_required_key_is_a_bad_request() {
        let server = setup_test_server().await;
        let (admin_id, token) = create_administrator(&server, "ulises").await;
        let ingredient_id = create_ingredient(&server, &token, admin_id, "Sal").await;

        let (header, value) = bearer(&token);
        let response = server
            .post(&format!("/usuarios/{}/recetas", admin_id))
            .add_header(header, value)
            .json(&json!({
                "duracion": 10,
                "porcion": 2,
                "preparacion": "Sin nombre",
                "ingredientes": [{"cantidad": 1, "idIngrediente": ingredient_id}]
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body = response.json::<Value>();
        assert!(body["mensaje"].as_str().unwrap().contains("nombre"));

        let (header, value) = bearer(&token);
        let response = server
            .get(&format!("/usuarios/{}/recetas", admin_id))
            .add_header(header, value)
            .await;
        assert!(response.json::<Value>().as_array().unwrap().is_empty());

        let (header, value) = bearer(&token);
        let response = server
            .post("/reporteMenu")
            .add_header(header, value)
            .json(&json!({"recetas": [{"receta": 1}]}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(response.json::<Value>()["mensaje"].is_string());
    }

    #[tokio::test]
    async fn test_chef_sees_only_own_restaurant_menus() {
        let server = setup_test_server().await;
        let (admin_id, token) = create_administrator(&server, "ursula").await;
        let north = create_restaurant(&server, &token, admin_id, "Sede Norte").await;
        let south = create_restaurant(&server, &token, admin_id, "Sede Sur").await;
        let (chef_id, chef_token) = create_chef(&server, &token, north, "chef_norte").await;
        let ingredient_id = create_ingredient(&server, &token, admin_id, "Pollo").await;
        let recipe_id =
            create_recipe(&server, &token, admin_id, "Pollo asado", 4, &[(1000, ingredient_id)])
                .await;

        create_menu(&server, &token, admin_id, &menu_body("Menú norte", north, recipe_id, 8)).await;
        create_menu(&server, &token, admin_id, &menu_body("Menú sur", south, recipe_id, 8)).await;

        let (header, value) = bearer(&chef_token);
        let response = server
            .get(&format!("/usuarios/{}/menus", chef_id))
            .add_header(header, value)
            .await;
        response.assert_status(StatusCode::OK);
        let body = response.json::<Value>();
        let menus = body.as_array().unwrap();
        assert_eq!(menus.len(), 1);
        assert_eq!(menus[0]["nombre"], "Menú norte");
        assert_eq!(menus[0]["restaurante"].as_i64().unwrap(), north as i64);

        // Administrators have no chef menu list
        let (header, value) = bearer(&token);
        let response = server
            .get(&format!("/usuarios/{}/menus", admin_id))
            .add_header(header, value)
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.json::<Value>()["mensaje"], "El usuario no es un chef");
    }

    #[tokio::test]
    async fn test_chef_menu_is_forced_into_own_restaurant() {
        let server = setup_test_server().await;
        let (admin_id, token) = create_administrator(&server, "valeria").await;
        let own = create_restaurant(&server, &token, admin_id, "Propio").await;
        let other = create_restaurant(&server, &token, admin_id, "Ajeno").await;
        let (chef_id, chef_token) = create_chef(&server, &token, own, "chef_valeria").await;
        let ingredient_id = create_ingredient(&server, &token, admin_id, "Pasta").await;
        let recipe_id =
            create_recipe(&server, &token, admin_id, "Spaghetti", 2, &[(200, ingredient_id)]).await;

        let mut body = menu_body("Menú del chef", other, recipe_id, 4);
        body["restaurante"] = json!({"id": other});
        let menu = create_menu(&server, &chef_token, chef_id, &body).await;

        assert_eq!(menu["restaurante"].as_i64().unwrap(), own as i64);
        assert_eq!(menu["autor"].as_i64().unwrap(), chef_id as i64);
        assert_eq!(menu["autor_name"], "chef_valeria");
        assert_eq!(menu["fechaInicio"], "2024-03-01");
        let entries = menu["recetas"].as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["personas"], 4);
        assert_eq!(entries[0]["receta"].as_i64().unwrap(), recipe_id as i64);
    }

    #[tokio::test]
    async fn test_chef_author_may_move_own_menu() {
        let server = setup_test_server().await;
        let (admin_id, token) = create_administrator(&server, "vicente").await;
        let own = create_restaurant(&server, &token, admin_id, "Centro").await;
        let other = create_restaurant(&server, &token, admin_id, "Periferia").await;
        let (chef_id, chef_token) = create_chef(&server, &token, own, "chef_vicente").await;
        let ingredient_id = create_ingredient(&server, &token, admin_id, "Lomo").await;
        let recipe_id =
            create_recipe(&server, &token, admin_id, "Lomo al trapo", 4, &[(900, ingredient_id)])
                .await;
        let menu = create_menu(
            &server,
            &chef_token,
            chef_id,
            &menu_body("Menú itinerante", own, recipe_id, 8),
        )
        .await;
        assert_eq!(menu["restaurante"].as_i64().unwrap(), own as i64);

        let mut body = menu_body("Menú itinerante", other, recipe_id, 8);
        body["restaurante"] = json!({"id": other});
        let (header, value) = bearer(&chef_token);
        let response = server
            .put(&format!("/usuarios/{}/menu/{}", chef_id, menu["id"]))
            .add_header(header, value)
            .json(&body)
            .await;

        response.assert_status(StatusCode::OK);
        assert_eq!(response.json::<Value>()["restaurante"].as_i64().unwrap(), other as i64);
    }

    #[tokio::test]
    async fn test_menu_with_malformed_date_is_a_server_error() {
        let server = setup_test_server().await;
        let (admin_id, token) = create_administrator(&server, "walter").await;
        let restaurant_id = create_restaurant(&server, &token, admin_id, "Walter's").await;
        let ingredient_id = create_ingredient(&server, &token, admin_id, "Queso").await;
        let recipe_id =
            create_recipe(&server, &token, admin_id, "Fondue", 2, &[(300, ingredient_id)]).await;

        let mut body = menu_body("Menú roto", restaurant_id, recipe_id, 2);
        body["fechaInicio"] = json!("01/03/2024");

        let (header, value) = bearer(&token);
        server
            .post(&format!("/usuarios/{}/menus", admin_id))
            .add_header(header, value)
            .json(&body)
            .await
            .assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_get_and_edit_menu() {
        let server = setup_test_server().await;
        let (admin_id, token) = create_administrator(&server, "ximena").await;
        let restaurant_id = create_restaurant(&server, &token, admin_id, "Ximena's").await;
        let (chef_id, chef_token) = create_chef(&server, &token, restaurant_id, "chef_xime").await;
        let ingredient_id = create_ingredient(&server, &token, admin_id, "Carne").await;
        let first =
            create_recipe(&server, &token, admin_id, "Bistec", 1, &[(250, ingredient_id)]).await;
        let second =
            create_recipe(&server, &token, admin_id, "Estofado", 4, &[(800, ingredient_id)]).await;
        let menu = create_menu(
            &server,
            &token,
            admin_id,
            &menu_body("Menú inicial", restaurant_id, first, 10),
        )
        .await;
        let menu_id = menu["id"].as_i64().unwrap();

        let (header, value) = bearer(&token);
        server
            .get(&format!("/usuarios/{}/menu/{}", admin_id, 5555))
            .add_header(header, value)
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        // A chef of the same restaurant may edit and becomes the author
        let mut body = menu_body("Menú editado", restaurant_id, second, 6);
        body["restaurante"] = json!({"id": restaurant_id});
        let (header, value) = bearer(&chef_token);
        let response = server
            .put(&format!("/usuarios/{}/menu/{}", chef_id, menu_id))
            .add_header(header, value)
            .json(&body)
            .await;
        response.assert_status(StatusCode::OK);

        let (header, value) = bearer(&token);
        let response = server
            .get(&format!("/usuarios/{}/menu/{}", admin_id, menu_id))
            .add_header(header, value)
            .await;
        response.assert_status(StatusCode::OK);
        let body = response.json::<Value>();
        assert_eq!(body["nombre"], "Menú editado");
        assert_eq!(body["autor"].as_i64().unwrap(), chef_id as i64);
        assert_eq!(body["autor_name"], "chef_xime");
        let entries = body["recetas"].as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["receta"].as_i64().unwrap(), second as i64);
        assert_eq!(entries[0]["personas"], 6);
    }

    #[tokio::test]
    async fn test_chef_of_other_restaurant_cannot_edit_menu() {
        let server = setup_test_server().await;
        let (admin_id, token) = create_administrator(&server, "yolanda").await;
        let first = create_restaurant(&server, &token, admin_id, "Uno").await;
        let second = create_restaurant(&server, &token, admin_id, "Dos").await;
        let (outsider_id, outsider_token) = create_chef(&server, &token, second, "chef_dos").await;
        let ingredient_id = create_ingredient(&server, &token, admin_id, "Pescado").await;
        let recipe_id =
            create_recipe(&server, &token, admin_id, "Ceviche", 2, &[(400, ingredient_id)]).await;
        let menu = create_menu(
            &server,
            &token,
            admin_id,
            &menu_body("Menú del mar", first, recipe_id, 4),
        )
        .await;

        let (header, value) = bearer(&outsider_token);
        let response = server
            .put(&format!("/usuarios/{}/menu/{}", outsider_id, menu["id"]))
            .add_header(header, value)
            .json(&menu_body("Intruso", first, recipe_id, 1))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            response.json::<Value>()["mensaje"],
            "El usuario no tiene permisos para editar el menú"
        );
    }

    #[tokio::test]
    async fn test_administrator_lists_menus_of_owned_restaurant_only() {
        let server = setup_test_server().await;
        let (owner_id, owner_token) = create_administrator(&server, "zoe").await;
        let (stranger_id, stranger_token) = create_administrator(&server, "zara").await;
        let restaurant_id = create_restaurant(&server, &owner_token, owner_id, "Zoe's").await;
        let ingredient_id = create_ingredient(&server, &owner_token, owner_id, "Maíz").await;
        let recipe_id =
            create_recipe(&server, &owner_token, owner_id, "Arepa", 1, &[(100, ingredient_id)])
                .await;
        create_menu(
            &server,
            &owner_token,
            owner_id,
            &menu_body("Desayunos", restaurant_id, recipe_id, 20),
        )
        .await;

        let (header, value) = bearer(&owner_token);
        let response = server
            .get(&format!("/usuarios/{}/restaurantes/{}/menus", owner_id, restaurant_id))
            .add_header(header, value)
            .await;
        response.assert_status(StatusCode::OK);
        assert_eq!(response.json::<Value>().as_array().unwrap().len(), 1);

        let (header, value) = bearer(&stranger_token);
        server
            .get(&format!("/usuarios/{}/restaurantes/{}/menus", stranger_id, restaurant_id))
            .add_header(header, value)
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_delete_recipe_removes_menu_entries() {
        let server = setup_test_server().await;
        let (admin_id, token) = create_administrator(&server, "adrian").await;
        let restaurant_id = create_restaurant(&server, &token, admin_id, "Adrian's").await;
        let ingredient_id = create_ingredient(&server, &token, admin_id, "Lenteja").await;
        let recipe_id =
            create_recipe(&server, &token, admin_id, "Lentejas", 4, &[(500, ingredient_id)]).await;
        let menu = create_menu(
            &server,
            &token,
            admin_id,
            &menu_body("Menú económico", restaurant_id, recipe_id, 12),
        )
        .await;

        let (header, value) = bearer(&token);
        server
            .delete(&format!("/recetas/{}", recipe_id))
            .add_header(header, value)
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let (header, value) = bearer(&token);
        server
            .get(&format!("/recetas/{}", recipe_id))
            .add_header(header, value)
            .await
            .assert_status(StatusCode::NOT_FOUND);

        let (header, value) = bearer(&token);
        let body = server
            .get(&format!("/usuarios/{}/menu/{}", admin_id, menu["id"]))
            .add_header(header, value)
            .await
            .json::<Value>();
        assert!(body["recetas"].as_array().unwrap().is_empty());

        // The ingredient is free again
        let (header, value) = bearer(&token);
        server
            .delete(&format!("/ingredientes/{}", ingredient_id))
            .add_header(header, value)
            .await
            .assert_status(StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_delete_restaurant_removes_its_chefs() {
        let server = setup_test_server().await;
        let (admin_id, token) = create_administrator(&server, "beatriz").await;
        let restaurant_id = create_restaurant(&server, &token, admin_id, "Cerrado").await;
        create_chef(&server, &token, restaurant_id, "chef_cerrado").await;

        let (header, value) = bearer(&token);
        server
            .delete(&format!("/restaurantes/{}", restaurant_id))
            .add_header(header, value)
            .await
            .assert_status(StatusCode::NO_CONTENT);

        server
            .post("/login")
            .json(&json!({"usuario": "chef_cerrado", "contrasena": TEST_PASSWORD}))
            .await
            .assert_status(StatusCode::NOT_FOUND);

        let (header, value) = bearer(&token);
        server
            .delete(&format!("/restaurantes/{}", restaurant_id))
            .add_header(header, value)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_user_detail_password_change_and_delete() {
        let server = setup_test_server().await;
        let (admin_id, token) = create_administrator(&server, "camilo").await;
        create_restaurant(&server, &token, admin_id, "Camilo's").await;
        let ingredient_id = create_ingredient(&server, &token, admin_id, "Frijol").await;
        create_recipe(&server, &token, admin_id, "Frijolada", 6, &[(900, ingredient_id)]).await;

        let (header, value) = bearer(&token);
        let response = server
            .get(&format!("/usuarios/{}", admin_id))
            .add_header(header, value)
            .await;
        response.assert_status(StatusCode::OK);
        let body = response.json::<Value>();
        assert_eq!(body["usuario"], "camilo");
        assert_eq!(body["tipo"], "Administrador");
        assert_eq!(body["restaurantes"].as_array().unwrap().len(), 1);
        assert_eq!(body["recetas"].as_array().unwrap().len(), 1);

        let (header, value) = bearer(&token);
        server
            .put(&format!("/usuarios/{}", admin_id))
            .add_header(header, value)
            .json(&json!({"contrasena": "nueva-clave"}))
            .await
            .assert_status(StatusCode::OK);
        let (_, token) = log_in(&server, "camilo", "nueva-clave").await;

        let (header, value) = bearer(&token);
        server
            .delete(&format!("/usuarios/{}", admin_id))
            .add_header(header, value)
            .await
            .assert_status(StatusCode::NO_CONTENT);

        // The token is still valid but its user is gone
        let (header, value) = bearer(&token);
        server
            .get(&format!("/usuarios/{}", admin_id))
            .add_header(header, value)
            .await
            .assert_status(StatusCode::NOT_FOUND);

        let (header, value) = bearer(&token);
        server
            .get(&format!("/ingredientes/{}", ingredient_id))
            .add_header(header, value)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
