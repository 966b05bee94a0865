use sea_orm::entity::prelude::*;

/// The role a user plays in the system.
///
/// Administrators own restaurants, ingredients and recipes. Chefs work in a
/// single restaurant and share the catalog of the administrator owning it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum UserRole {
    #[sea_orm(string_value = "Administrador")]
    Administrator,
    #[sea_orm(string_value = "Chef")]
    Chef,
}

impl UserRole {
    /// Name of the role as exposed over the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Administrator => "Administrador",
            UserRole::Chef => "Chef",
        }
    }
}

/// Represents a user of the system, administrator or chef.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Login name, unique across both roles.
    #[sea_orm(unique)]
    pub username: String,
    /// Hex encoded one-way hash of the password.
    pub password_hash: String,
    /// Display name.
    pub name: String,
    pub role: UserRole,
    /// Restaurant a chef works in. Always `None` for administrators.
    pub restaurant_id: Option<i32>,
}

impl Model {
    pub fn is_chef(&self) -> bool {
        self.role == UserRole::Chef
    }

    pub fn is_administrator(&self) -> bool {
        self.role == UserRole::Administrator
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// The restaurant a chef is bound to.
    #[sea_orm(
        belongs_to = "super::restaurant::Entity",
        from = "Column::RestaurantId",
        to = "super::restaurant::Column::Id",
        on_delete = "Cascade"
    )]
    Restaurant,
    #[sea_orm(has_many = "super::ingredient::Entity")]
    Ingredient,
}

impl Related<super::restaurant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Restaurant.def()
    }
}

impl Related<super::ingredient::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ingredient.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
