//! Domain computations that sit between the HTTP handlers and the database:
//! the purchasing report and the reconciliation of a recipe's ingredient
//! links during an edit.

pub mod error;
pub mod reconcile;
pub mod report;

pub use error::{ComputeError, Result};
pub use reconcile::{plan_recipe_ingredients, IncomingLink, LinkValues, ReconcilePlan};
pub use report::{
    aggregate, build_purchase_report, scale_quantity, PurchaseReport, ReportItem, ReportLine,
    ReportRequest, RoundingPolicy,
};
