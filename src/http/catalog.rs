//! Read-only catalog routes.
//!
//! | Route | Response |
//! |-------|----------|
//! | `GET /plans` | every plan |
//! | `GET /plans/available` | active plans |
//! | `GET /plans/free` | the free plan, 404 when none |
//! | `GET /plans/{id}` | plan by id or yearly id |
//! | `GET /items` | every item |
//! | `GET /items/{id}` | item by id |

use axum::{
    Router,
    extract::{Path, State},
    routing::get,
};

use super::response::{ApiResponse, JsonResponse};
use super::routes::RouteModule;
use crate::billing::{BillingError, Item, Plan, SharedCatalog};
use crate::error::SaasError;

/// Catalog routes, optionally nested under a prefix.
#[derive(Debug, Clone, Default)]
pub struct CatalogRoutes {
    prefix: Option<String>,
}

impl CatalogRoutes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Nest the routes under `prefix`, e.g. `"/billing"`.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }
}

impl RouteModule for CatalogRoutes {
    fn routes(&self) -> Router<SharedCatalog> {
        Router::new()
            .route("/plans", get(list_plans))
            .route("/plans/available", get(list_available_plans))
            .route("/plans/free", get(get_free_plan))
            .route("/plans/{id}", get(get_plan))
            .route("/items", get(list_items))
            .route("/items/{id}", get(get_item))
    }

    fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }
}

/// Build a stateless router serving the catalog routes.
pub fn router(catalog: SharedCatalog) -> Router {
    CatalogRoutes::new()
        .register(Router::new())
        .with_state(catalog)
}

async fn list_plans(State(catalog): State<SharedCatalog>) -> JsonResponse<Vec<Plan>> {
    Ok(ApiResponse::success(catalog.snapshot().plans().to_vec()))
}

async fn list_available_plans(State(catalog): State<SharedCatalog>) -> JsonResponse<Vec<Plan>> {
    let snapshot = catalog.snapshot();
    let plans = snapshot.available_plans().into_iter().cloned().collect();
    Ok(ApiResponse::success(plans))
}

async fn get_free_plan(State(catalog): State<SharedCatalog>) -> JsonResponse<Plan> {
    catalog
        .snapshot()
        .free_plan()
        .cloned()
        .map(ApiResponse::success)
        .ok_or_else(|| SaasError::not_found("No free plan is registered"))
}

async fn get_plan(
    State(catalog): State<SharedCatalog>,
    Path(id): Path<String>,
) -> JsonResponse<Plan> {
    let plan = catalog
        .snapshot()
        .find_plan(&id)
        .cloned()
        .ok_or(BillingError::PlanNotFound { plan_id: id })?;
    Ok(ApiResponse::success(plan))
}

async fn list_items(State(catalog): State<SharedCatalog>) -> JsonResponse<Vec<Item>> {
    Ok(ApiResponse::success(catalog.snapshot().items().to_vec()))
}

async fn get_item(
    State(catalog): State<SharedCatalog>,
    Path(id): Path<String>,
) -> JsonResponse<Item> {
    let item = catalog
        .snapshot()
        .find_item(&id)
        .cloned()
        .ok_or(BillingError::ItemNotFound { item_id: id })?;
    Ok(ApiResponse::success(item))
}
