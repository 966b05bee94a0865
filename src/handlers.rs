pub mod auth;
pub mod chefs;
pub mod health;
pub mod ingredients;
pub mod menus;
pub mod recipes;
pub mod reports;
pub mod restaurants;
pub mod users;
