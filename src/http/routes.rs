use axum::Router;

use crate::billing::SharedCatalog;

/// Trait for composable route modules
///
/// Each module contributes a group of routes that read the shared catalog.
///
/// # Example
///
/// ```ignore
/// struct PricingPage;
///
/// impl RouteModule for PricingPage {
///     fn routes(&self) -> Router<SharedCatalog> {
///         Router::new().route("/pricing", get(render_pricing))
///     }
/// }
/// ```
pub trait RouteModule {
    /// Returns a router with all routes for this module
    ///
    /// The router should NOT have state applied. Call `with_state` once on
    /// the final router.
    fn routes(&self) -> Router<SharedCatalog>
    where
        Self: Sized;

    /// Optional: specify a path prefix for all routes in this module
    fn prefix(&self) -> Option<&str> {
        None
    }

    /// Registers this module's routes into the given router
    fn register(self, router: Router<SharedCatalog>) -> Router<SharedCatalog>
    where
        Self: Sized,
    {
        let routes = self.routes();

        if let Some(prefix) = self.prefix() {
            router.nest(prefix, routes)
        } else {
            router.merge(routes)
        }
    }
}
