use rust_decimal::Decimal;
use std::collections::HashSet;
use tracing::debug;

use crate::error::{ComputeError, Result};

/// Quantity and ingredient of a recipe ingredient link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkValues {
    pub quantity: Decimal,
    pub ingredient_id: i32,
}

/// An ingredient link as sent by a client editing a recipe.
/// Links without an id are new.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncomingLink {
    pub id: Option<i32>,
    pub values: LinkValues,
}

/// Changes to apply to a recipe's ingredient links.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// Existing link ids the client no longer sends.
    pub delete: Vec<i32>,
    /// Links to create.
    pub insert: Vec<LinkValues>,
    /// Existing links to overwrite.
    pub update: Vec<(i32, LinkValues)>,
}

impl ReconcilePlan {
    pub fn is_empty(&self) -> bool {
        self.delete.is_empty() && self.insert.is_empty() && self.update.is_empty()
    }
}

/// Diffs the links currently stored for `recipe_id` against the incoming ones.
///
/// Fails if an incoming id is not one of `existing_ids`.
pub fn plan_recipe_ingredients(
    recipe_id: i32,
    existing_ids: &[i32],
    incoming: &[IncomingLink],
) -> Result<ReconcilePlan> {
    let existing: HashSet<i32> = existing_ids.iter().copied().collect();
    let kept: HashSet<i32> = incoming.iter().filter_map(|link| link.id).collect();

    let mut plan = ReconcilePlan {
        delete: existing_ids
            .iter()
            .copied()
            .filter(|id| !kept.contains(id))
            .collect(),
        ..Default::default()
    };

    for link in incoming {
        match link.id {
            None => plan.insert.push(link.values),
            Some(id) if existing.contains(&id) => plan.update.push((id, link.values)),
            Some(id) => {
                return Err(ComputeError::UnknownRecipeIngredient {
                    recipe_id,
                    link_id: id,
                });
            }
        }
    }

    debug!(
        "Recipe {} ingredient plan: {} deleted, {} inserted, {} updated",
        recipe_id,
        plan.delete.len(),
        plan.insert.len(),
        plan.update.len()
    );
    Ok(plan)
}
