use thiserror::Error;

/// Error types for the compute module
#[derive(Error, Debug)]
pub enum ComputeError {
    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// A requested recipe does not exist
    #[error("Recipe {0} does not exist")]
    RecipeNotFound(i32),

    /// A recipe link points to an ingredient that does not exist
    #[error("Ingredient {0} does not exist")]
    IngredientNotFound(i32),

    /// A recipe declares zero servings, so its quantities cannot be scaled
    #[error("Recipe {recipe_id} has a portion of zero")]
    ZeroPortion { recipe_id: i32 },

    /// An edited ingredient link is not part of the recipe being edited
    #[error("Recipe ingredient {link_id} does not belong to recipe {recipe_id}")]
    UnknownRecipeIngredient { recipe_id: i32, link_id: i32 },

    /// Decimal arithmetic left the representable range
    #[error("Decimal error: {0}")]
    Decimal(String),

    /// Invalid configuration value
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

/// Type alias for Result with ComputeError
pub type Result<T> = std::result::Result<T, ComputeError>;
