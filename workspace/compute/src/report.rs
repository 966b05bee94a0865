use model::entities::{ingredient, recipe, recipe_ingredient};
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, instrument, trace};

use crate::error::{ComputeError, Result};

/// How scaled quantities are rounded to whole units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoundingPolicy {
    /// Sum the exact contributions and round once at the end.
    #[default]
    Final,
    /// Round the first contribution, then round every running sum.
    /// The result depends on the order of the contributions.
    PerStep,
}

impl FromStr for RoundingPolicy {
    type Err = ComputeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "final" => Ok(RoundingPolicy::Final),
            "per-step" => Ok(RoundingPolicy::PerStep),
            other => Err(ComputeError::InvalidValue(format!(
                "unknown rounding policy '{}', expected 'final' or 'per-step'",
                other
            ))),
        }
    }
}

impl fmt::Display for RoundingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundingPolicy::Final => write!(f, "final"),
            RoundingPolicy::PerStep => write!(f, "per-step"),
        }
    }
}

/// One entry of a report request: cook `recipe_id` for `servings` people.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportRequest {
    pub servings: i32,
    pub recipe_id: i32,
}

/// One ingredient link of a requested recipe, with everything needed to scale it.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportLine {
    pub recipe_id: i32,
    pub servings: Decimal,
    pub portion: Decimal,
    pub quantity: Decimal,
    pub ingredient_id: i32,
    pub ingredient_name: String,
    pub unit: String,
    pub site: String,
}

/// Aggregated quantity of one ingredient.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportItem {
    pub name: String,
    pub quantity: Decimal,
    pub unit: String,
    pub site: String,
}

/// Report items keyed by ingredient id.
pub type PurchaseReport = BTreeMap<i32, ReportItem>;

/// Scales `quantity`, defined for `portion` servings, to `servings` servings.
pub fn scale_quantity(servings: Decimal, quantity: Decimal, portion: Decimal) -> Option<Decimal> {
    servings.checked_mul(quantity)?.checked_div(portion)
}

fn round_units(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
}

/// Accumulates scaled quantities per ingredient.
pub fn aggregate<I>(lines: I, policy: RoundingPolicy) -> Result<PurchaseReport>
where
    I: IntoIterator<Item = ReportLine>,
{
    let mut report = PurchaseReport::new();

    for line in lines {
        if line.portion.is_zero() {
            return Err(ComputeError::ZeroPortion { recipe_id: line.recipe_id });
        }
        let scaled = scale_quantity(line.servings, line.quantity, line.portion).ok_or_else(|| {
            ComputeError::Decimal(format!(
                "scaling {} x {} / {} overflows",
                line.servings, line.quantity, line.portion
            ))
        })?;
        trace!(
            "Recipe {} ingredient {}: {} x {} / {} = {}",
            line.recipe_id, line.ingredient_id, line.servings, line.quantity, line.portion, scaled
        );

        match report.get_mut(&line.ingredient_id) {
            Some(item) => {
                let sum = item.quantity.checked_add(scaled).ok_or_else(|| {
                    ComputeError::Decimal(format!("sum for ingredient {} overflows", line.ingredient_id))
                })?;
                item.quantity = match policy {
                    RoundingPolicy::Final => sum,
                    RoundingPolicy::PerStep => round_units(sum),
                };
            }
            None => {
                let quantity = match policy {
                    RoundingPolicy::Final => scaled,
                    RoundingPolicy::PerStep => round_units(scaled),
                };
                report.insert(
                    line.ingredient_id,
                    ReportItem {
                        name: line.ingredient_name,
                        quantity,
                        unit: line.unit,
                        site: line.site,
                    },
                );
            }
        }
    }

    if policy == RoundingPolicy::Final {
        for item in report.values_mut() {
            item.quantity = round_units(item.quantity);
        }
    }

    Ok(report)
}

/// Loads the requested recipes with their ingredients and aggregates them.
#[instrument(skip(db, requests), fields(num_requests = requests.len(), policy = %policy))]
pub async fn build_purchase_report<C>(
    db: &C,
    requests: &[ReportRequest],
    policy: RoundingPolicy,
) -> Result<PurchaseReport>
where
    C: ConnectionTrait,
{
    let mut lines = Vec::new();

    for request in requests {
        let recipe = recipe::Entity::find_by_id(request.recipe_id)
            .one(db)
            .await?
            .ok_or(ComputeError::RecipeNotFound(request.recipe_id))?;

        let links = recipe_ingredient::Entity::find()
            .filter(recipe_ingredient::Column::RecipeId.eq(recipe.id))
            .order_by_asc(recipe_ingredient::Column::Id)
            .find_also_related(ingredient::Entity)
            .all(db)
            .await?;
        debug!("Recipe {} contributes {} ingredient links", recipe.id, links.len());

        for (link, ingredient) in links {
            let ingredient =
                ingredient.ok_or(ComputeError::IngredientNotFound(link.ingredient_id))?;
            lines.push(ReportLine {
                recipe_id: recipe.id,
                servings: Decimal::from(request.servings),
                portion: recipe.portion,
                quantity: link.quantity,
                ingredient_id: ingredient.id,
                ingredient_name: ingredient.name,
                unit: ingredient.unit,
                site: ingredient.site,
            });
        }
    }

    let report = aggregate(lines, policy)?;
    info!("Purchase report built with {} ingredients", report.len());
    Ok(report)
}
