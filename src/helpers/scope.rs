use model::entities::{restaurant, user};
use sea_orm::{ConnectionTrait, EntityTrait};
use tracing::{debug, trace, warn};

use crate::error::{ApiError, ApiResult};

/// Loads a user by id, failing with 422 when it does not exist.
pub async fn find_user<C: ConnectionTrait>(db: &C, user_id: i32) -> ApiResult<user::Model> {
    user::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| {
            warn!("User with ID {} not found", user_id);
            ApiError::Unprocessable("No existe un usuario con ese id".to_string())
        })
}

/// Restaurant a chef is bound to, failing with 422 when it is missing.
pub async fn chef_restaurant<C: ConnectionTrait>(
    db: &C,
    chef: &user::Model,
) -> ApiResult<restaurant::Model> {
    let restaurant_id = chef.restaurant_id.ok_or_else(|| {
        warn!("Chef {} is not bound to a restaurant", chef.id);
        ApiError::Unprocessable("El chef no pertenece a un restaurante".to_string())
    })?;

    restaurant::Entity::find_by_id(restaurant_id)
        .one(db)
        .await?
        .ok_or_else(|| {
            warn!("Restaurant {} of chef {} not found", restaurant_id, chef.id);
            ApiError::Unprocessable("No existe un restaurante con ese id".to_string())
        })
}

/// Administrator whose catalog `user` works with: itself for an
/// administrator, the owner of its restaurant for a chef.
pub async fn administrator_of<C: ConnectionTrait>(db: &C, user: &user::Model) -> ApiResult<i32> {
    if user.is_administrator() {
        return Ok(user.id);
    }

    let restaurant = chef_restaurant(db, user).await?;
    debug!(
        "Chef {} resolved to administrator {} through restaurant {}",
        user.id, restaurant.administrator_id, restaurant.id
    );
    Ok(restaurant.administrator_id)
}

/// Resolves the administrator id scoping the data visible to `user_id`.
pub async fn resolve_administrator_id<C: ConnectionTrait>(db: &C, user_id: i32) -> ApiResult<i32> {
    trace!("Resolving administrator scope for user {}", user_id);
    let user = find_user(db, user_id).await?;
    administrator_of(db, &user).await
}
