use sea_orm_migration::{prelude::*, schema::*, sea_orm::DatabaseBackend};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();

        // Users and restaurants reference each other. SQLite takes the
        // forward reference inline and cannot add constraints later; other
        // backends get the constraint once restaurants exists.
        manager.create_table(users_table(backend)).await?;

        // Create restaurants table
        manager
            .create_table(
                Table::create()
                    .table(Restaurants::Table)
                    .if_not_exists()
                    .col(pk_auto(Restaurants::Id))
                    .col(string(Restaurants::Name).unique_key())
                    .col(string(Restaurants::Address))
                    .col(string(Restaurants::Phone))
                    .col(string(Restaurants::SocialLinks))
                    .col(string(Restaurants::OpeningHour))
                    .col(boolean(Restaurants::OnSiteService))
                    .col(boolean(Restaurants::DeliveryService))
                    .col(string(Restaurants::CuisineType))
                    .col(string(Restaurants::Platforms))
                    .col(integer(Restaurants::AdministratorId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_restaurant_administrator")
                            .from(Restaurants::Table, Restaurants::AdministratorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        if backend != DatabaseBackend::Sqlite {
            manager.create_foreign_key(user_restaurant_fk()).await?;
        }

        // Create ingredients table
        manager
            .create_table(
                Table::create()
                    .table(Ingredients::Table)
                    .if_not_exists()
                    .col(pk_auto(Ingredients::Id))
                    .col(string(Ingredients::Name))
                    .col(string(Ingredients::Unit))
                    .col(decimal(Ingredients::Cost).decimal_len(19, 4))
                    .col(decimal(Ingredients::Calories).decimal_len(19, 4))
                    .col(string(Ingredients::Site))
                    .col(integer(Ingredients::AdministratorId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ingredient_administrator")
                            .from(Ingredients::Table, Ingredients::AdministratorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create recipes table
        manager
            .create_table(
                Table::create()
                    .table(Recipes::Table)
                    .if_not_exists()
                    .col(pk_auto(Recipes::Id))
                    .col(string(Recipes::Name))
                    .col(decimal(Recipes::Duration).decimal_len(19, 4))
                    .col(decimal(Recipes::Portion).decimal_len(19, 4))
                    .col(text(Recipes::Preparation))
                    .col(integer_null(Recipes::AuthorId))
                    .col(integer(Recipes::AdministratorId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_recipe_author")
                            .from(Recipes::Table, Recipes::AuthorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_recipe_administrator")
                            .from(Recipes::Table, Recipes::AdministratorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create recipe_ingredients table
        // NO ACTION is checked at the end of the statement, which lets an
        // administrator cascade remove both links and ingredients.
        manager
            .create_table(
                Table::create()
                    .table(RecipeIngredients::Table)
                    .if_not_exists()
                    .col(pk_auto(RecipeIngredients::Id))
                    .col(decimal(RecipeIngredients::Quantity).decimal_len(19, 4))
                    .col(integer(RecipeIngredients::RecipeId))
                    .col(integer(RecipeIngredients::IngredientId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_recipe_ingredient_recipe")
                            .from(RecipeIngredients::Table, RecipeIngredients::RecipeId)
                            .to(Recipes::Table, Recipes::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_recipe_ingredient_ingredient")
                            .from(RecipeIngredients::Table, RecipeIngredients::IngredientId)
                            .to(Ingredients::Table, Ingredients::Id)
                            .on_delete(ForeignKeyAction::NoAction)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create menus table
        manager
            .create_table(
                Table::create()
                    .table(Menus::Table)
                    .if_not_exists()
                    .col(pk_auto(Menus::Id))
                    .col(string(Menus::Name))
                    .col(string(Menus::Description))
                    .col(date(Menus::StartDate))
                    .col(date(Menus::EndDate))
                    .col(string(Menus::Photo))
                    .col(integer_null(Menus::AuthorId))
                    .col(string(Menus::AuthorName))
                    .col(integer(Menus::RestaurantId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_menu_author")
                            .from(Menus::Table, Menus::AuthorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_menu_restaurant")
                            .from(Menus::Table, Menus::RestaurantId)
                            .to(Restaurants::Table, Restaurants::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create menu_recipes table
        manager
            .create_table(
                Table::create()
                    .table(MenuRecipes::Table)
                    .if_not_exists()
                    .col(pk_auto(MenuRecipes::Id))
                    .col(integer(MenuRecipes::Servings))
                    .col(integer(MenuRecipes::MenuId))
                    .col(integer(MenuRecipes::RecipeId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_menu_recipe_menu")
                            .from(MenuRecipes::Table, MenuRecipes::MenuId)
                            .to(Menus::Table, Menus::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_menu_recipe_recipe")
                            .from(MenuRecipes::Table, MenuRecipes::RecipeId)
                            .to(Recipes::Table, Recipes::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        if manager.get_database_backend() != DatabaseBackend::Sqlite {
            manager
                .drop_foreign_key(
                    ForeignKey::drop()
                        .name(USER_RESTAURANT_FK)
                        .table(Users::Table)
                        .to_owned(),
                )
                .await?;
        }

        // Drop tables in reverse order of creation to respect foreign key constraints
        manager
            .drop_table(Table::drop().table(MenuRecipes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Menus::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RecipeIngredients::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Recipes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Ingredients::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Restaurants::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        Ok(())
    }
}

const USER_RESTAURANT_FK: &str = "fk_user_restaurant";

fn user_restaurant_fk() -> ForeignKeyCreateStatement {
    ForeignKey::create()
        .name(USER_RESTAURANT_FK)
        .from(Users::Table, Users::RestaurantId)
        .to(Restaurants::Table, Restaurants::Id)
        .on_delete(ForeignKeyAction::Cascade)
        .on_update(ForeignKeyAction::Cascade)
        .to_owned()
}

fn users_table(backend: DatabaseBackend) -> TableCreateStatement {
    let mut table = Table::create()
        .table(Users::Table)
        .if_not_exists()
        .col(pk_auto(Users::Id))
        .col(string(Users::Username).unique_key())
        .col(string(Users::PasswordHash))
        .col(string(Users::Name))
        .col(string_len(Users::Role, 20))
        .col(integer_null(Users::RestaurantId))
        .to_owned();
    if backend == DatabaseBackend::Sqlite {
        table.foreign_key(&mut user_restaurant_fk());
    }
    table
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    PasswordHash,
    Name,
    Role,
    RestaurantId,
}

#[derive(DeriveIden)]
enum Restaurants {
    Table,
    Id,
    Name,
    Address,
    Phone,
    SocialLinks,
    OpeningHour,
    OnSiteService,
    DeliveryService,
    CuisineType,
    Platforms,
    AdministratorId,
}

#[derive(DeriveIden)]
enum Ingredients {
    Table,
    Id,
    Name,
    Unit,
    Cost,
    Calories,
    Site,
    AdministratorId,
}

#[derive(DeriveIden)]
enum Recipes {
    Table,
    Id,
    Name,
    Duration,
    Portion,
    Preparation,
    AuthorId,
    AdministratorId,
}

#[derive(DeriveIden)]
enum RecipeIngredients {
    Table,
    Id,
    Quantity,
    RecipeId,
    IngredientId,
}

#[derive(DeriveIden)]
enum Menus {
    Table,
    Id,
    Name,
    Description,
    StartDate,
    EndDate,
    Photo,
    AuthorId,
    AuthorName,
    RestaurantId,
}

#[derive(DeriveIden)]
enum MenuRecipes {
    Table,
    Id,
    Servings,
    MenuId,
    RecipeId,
}
