//! Root of all SeaORM entity modules.
//!
//! Administrators and chefs share the `users` table and are told apart by
//! their [`user::UserRole`]. Ownership between rows is expressed with foreign
//! keys declared `ON DELETE CASCADE` in the migration, so removing an
//! administrator, restaurant, recipe or menu also removes what it owns.

pub mod ingredient;
pub mod menu;
pub mod menu_recipe;
pub mod recipe;
pub mod recipe_ingredient;
pub mod restaurant;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::ingredient::Entity as Ingredient;
    pub use super::menu::Entity as Menu;
    pub use super::menu_recipe::Entity as MenuRecipe;
    pub use super::recipe::Entity as Recipe;
    pub use super::recipe_ingredient::Entity as RecipeIngredient;
    pub use super::restaurant::Entity as Restaurant;
    pub use super::user::Entity as User;
}
