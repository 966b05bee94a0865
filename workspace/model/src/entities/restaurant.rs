use sea_orm::entity::prelude::*;

/// A restaurant owned by an administrator.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "restaurants")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Unique across the whole system, not only per administrator.
    #[sea_orm(unique)]
    pub name: String,
    pub address: String,
    pub phone: String,
    pub social_links: String,
    pub opening_hour: String,
    pub on_site_service: bool,
    pub delivery_service: bool,
    pub cuisine_type: String,
    pub platforms: String,
    pub administrator_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AdministratorId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Administrator,
    #[sea_orm(has_many = "super::menu::Entity")]
    Menu,
}

impl Related<super::menu::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Menu.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
