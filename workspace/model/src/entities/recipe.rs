use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

/// A recipe of an administrator's catalog.
///
/// Ingredient quantities are defined for `portion` servings.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "recipes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    /// Preparation time in minutes.
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub duration: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub portion: Decimal,
    #[sea_orm(column_type = "Text")]
    pub preparation: String,
    /// The user (administrator or chef) who wrote the recipe.
    pub author_id: Option<i32>,
    pub administrator_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id",
        on_delete = "SetNull"
    )]
    Author,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AdministratorId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Administrator,
    #[sea_orm(has_many = "super::recipe_ingredient::Entity")]
    RecipeIngredient,
    #[sea_orm(has_many = "super::menu_recipe::Entity")]
    MenuRecipe,
}

impl Related<super::recipe_ingredient::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecipeIngredient.def()
    }
}

impl Related<super::menu_recipe::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MenuRecipe.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
