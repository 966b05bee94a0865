use std::collections::BTreeMap;

use axum::{extract::State, response::Json};
use compute::{build_purchase_report, ReportItem, ReportRequest};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;

use crate::auth::AuthenticatedUser;
use crate::error::ApiResult;
use crate::schemas::{deserialize_entity_ref, deserialize_id, ApiJson, AppState, ErrorResponse};

/// A recipe to cook for a number of people
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ReportEntry {
    #[serde(rename = "personas", deserialize_with = "deserialize_id")]
    pub servings: i32,
    /// Recipe id, also accepted under the `id` key
    #[serde(rename = "receta", alias = "id", deserialize_with = "deserialize_entity_ref")]
    pub recipe_id: i32,
}

/// Request body for the purchasing report
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ReportRequestBody {
    pub recetas: Vec<ReportEntry>,
}

/// Total quantity of one ingredient to buy
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReportItemResponse {
    pub nombre: String,
    /// Whole units, as a decimal string
    #[schema(value_type = String)]
    pub cantidad: Decimal,
    pub unidad: String,
    pub sitio: String,
}

impl From<ReportItem> for ReportItemResponse {
    fn from(item: ReportItem) -> Self {
        Self {
            nombre: item.name,
            cantidad: item.quantity,
            unidad: item.unit,
            sitio: item.site,
        }
    }
}

/// Build the shopping list for a set of recipes and serving counts
#[utoipa::path(
    post,
    path = "/reporteMenu",
    tag = "reports",
    request_body = ReportRequestBody,
    responses(
        (status = 200, description = "Ingredients to buy, keyed by ingredient id", body = BTreeMap<String, ReportItemResponse>),
        (status = 422, description = "Unknown recipe or recipe with zero portion", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip(state))]
pub async fn create_menu_report(
    State(state): State<AppState>,
    _caller: AuthenticatedUser,
    ApiJson(request): ApiJson<ReportRequestBody>,
) -> ApiResult<Json<BTreeMap<i32, ReportItemResponse>>> {
    trace!("Entering create_menu_report function");
    debug!(
        "Building purchase report for {} recipes with {} rounding",
        request.recetas.len(),
        state.report_rounding
    );

    let requests: Vec<ReportRequest> = request
        .recetas
        .iter()
        .map(|entry| ReportRequest {
            servings: entry.servings,
            recipe_id: entry.recipe_id,
        })
        .collect();

    let report = build_purchase_report(&state.db, &requests, state.report_rounding).await?;

    info!("Purchase report contains {} ingredients", report.len());
    Ok(Json(
        report
            .into_iter()
            .map(|(ingredient_id, item)| (ingredient_id, ReportItemResponse::from(item)))
            .collect(),
    ))
}
