//! HTTP surface for the catalog.
//!
//! Provides the JSON response wrapper, the RouteModule trait, and the
//! read-only catalog routes.

pub mod catalog;
pub mod response;
pub mod routes;

pub use catalog::{CatalogRoutes, router};
pub use response::{ApiResponse, JsonResponse};
pub use routes::RouteModule;
