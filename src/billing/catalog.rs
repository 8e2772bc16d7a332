//! Catalog registry of plans, items and usage sync sources.
//!
//! A [`Catalog`] is built at startup and then read by request handlers.
//! Share it through a [`SharedCatalog`] when it must change while requests
//! are in flight.

use std::sync::{Arc, PoisonError, RwLock};

use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::features::Feature;
use super::items::{DEFAULT_CURRENCY, Item};
use super::plans::Plan;
use super::subscription::SubscriptionHandle;
use super::usage::{UsageSource, UsageSyncTable};
use crate::config::BillingConfig;
use crate::error::Result;

/// Registry of plans, items and usage sync sources.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    plans: Vec<Plan>,
    items: Vec<Item>,
    usage: UsageSyncTable,
    currency: Option<String>,
}

impl Catalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog seeded with the configured currency override.
    #[must_use]
    pub fn from_config(config: &BillingConfig) -> Self {
        let mut catalog = Self::new();
        if let Some(ref currency) = config.currency {
            catalog.set_currency(currency);
        }
        catalog
    }

    // ========================================================================
    // Plans
    // ========================================================================

    /// Append a plan and return it for decoration.
    ///
    /// Plans are never replaced. When `id` is already registered the new
    /// plan is still appended, but lookups keep returning the first one.
    pub fn register_plan(
        &mut self,
        name: impl Into<String>,
        id: impl Into<String>,
        yearly_id: Option<&str>,
    ) -> &mut Plan {
        let plan = Plan::new(name, id, yearly_id.map(str::to_string));

        if self.find_plan(plan.id()).is_some() {
            warn!(plan_id = %plan.id(), "Plan id already registered; lookups return the first match");
        }
        debug!(plan_id = %plan.id(), name = %plan.name(), "Registered plan");

        let index = self.plans.len();
        self.plans.push(plan);
        &mut self.plans[index]
    }

    /// Find the first plan whose id or yearly id equals `key`.
    #[must_use]
    pub fn find_plan(&self, key: &str) -> Option<&Plan> {
        self.plans.iter().find(|p| p.matches(key))
    }

    /// Resolve a plan value back to its registered entry.
    #[must_use]
    pub fn resolve_plan(&self, plan: &Plan) -> Option<&Plan> {
        self.find_plan(plan.id())
    }

    /// All plans in registration order.
    pub fn plans(&self) -> &[Plan] {
        &self.plans
    }

    /// Active plans in registration order.
    pub fn available_plans(&self) -> Vec<&Plan> {
        self.plans.iter().filter(|p| p.is_active()).collect()
    }

    /// The first plan marked free.
    #[must_use]
    pub fn free_plan(&self) -> Option<&Plan> {
        self.plans.iter().find(|p| p.is_free())
    }

    // ========================================================================
    // Items
    // ========================================================================

    /// Append an item.
    ///
    /// Currency is taken from `currency`, then the catalog override, then
    /// [`DEFAULT_CURRENCY`].
    pub fn register_item(
        &mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        price: Decimal,
        currency: Option<&str>,
    ) -> &Item {
        let currency = currency
            .or(self.currency.as_deref())
            .unwrap_or(DEFAULT_CURRENCY)
            .to_string();
        let item = Item::new(id, name, price, currency);
        debug!(item_id = %item.id, price = %item.price, currency = %item.currency, "Registered item");

        let index = self.items.len();
        self.items.push(item);
        &self.items[index]
    }

    /// Find the first item with `id`.
    #[must_use]
    pub fn find_item(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    // ========================================================================
    // Currency
    // ========================================================================

    /// Set the global currency override.
    pub fn set_currency(&mut self, currency: &str) {
        self.currency = Some(currency.to_ascii_uppercase());
    }

    /// The currency override, or `default` when none is set.
    #[must_use]
    pub fn currency<'a>(&'a self, default: Option<&'a str>) -> Option<&'a str> {
        self.currency.as_deref().or(default)
    }

    // ========================================================================
    // Usage sync
    // ========================================================================

    /// Register the usage source for `feature_id`, replacing any previous one.
    pub fn register_usage_sync(&mut self, feature_id: impl Into<String>, source: Arc<dyn UsageSource>) {
        self.usage.register(feature_id, source);
    }

    /// Run the usage source registered for `feature`.
    ///
    /// `Ok(None)` when nothing is registered for the feature.
    pub async fn apply_usage_sync(
        &self,
        subscription: &dyn SubscriptionHandle,
        feature: &Feature,
    ) -> Result<Option<f64>> {
        self.usage.apply(subscription, feature).await
    }

    pub fn usage_sync(&self) -> &UsageSyncTable {
        &self.usage
    }

    // ========================================================================
    // Test helpers
    // ========================================================================

    #[cfg(any(test, feature = "test-billing"))]
    pub fn clear_plans(&mut self) {
        self.plans.clear();
    }

    #[cfg(any(test, feature = "test-billing"))]
    pub fn clear_items(&mut self) {
        self.items.clear();
    }

    #[cfg(any(test, feature = "test-billing"))]
    pub fn clear_usage_sync_callbacks(&mut self) {
        self.usage.clear();
    }
}

/// A catalog shared between request handlers.
///
/// Readers take cheap snapshots. Writers clone the current catalog, apply
/// their change and swap it in, so an existing snapshot never changes.
#[derive(Clone, Debug, Default)]
pub struct SharedCatalog {
    inner: Arc<RwLock<Arc<Catalog>>>,
}

impl SharedCatalog {
    #[must_use]
    pub fn new(catalog: Catalog) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(catalog))),
        }
    }

    /// The current catalog.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Catalog> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Apply `f` to a copy of the catalog and publish the result.
    pub fn update<R>(&self, f: impl FnOnce(&mut Catalog) -> R) -> R {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = Catalog::clone(&guard);
        let result = f(&mut next);
        *guard = Arc::new(next);
        result
    }

    /// Replace the catalog wholesale.
    pub fn replace(&self, catalog: Catalog) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(catalog);
    }
}

impl From<Catalog> for SharedCatalog {
    fn from(catalog: Catalog) -> Self {
        Self::new(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::subscription::test::MockSubscription;
    use crate::billing::usage::usage_fn;

    fn create_test_catalog() -> Catalog {
        let mut catalog = Catalog::new();
        catalog
            .register_plan("Free", "price_free", None)
            .free()
            .feature(Feature::new("Projects", "projects").value(1.0));
        catalog
            .register_plan("Basic", "price_basic", None)
            .feature(Feature::new("Projects", "projects").value(5.0));
        catalog
            .register_plan("Pro", "price_pro_m", Some("price_pro_y"))
            .feature(Feature::new("Projects", "projects").unlimited());
        catalog
            .register_plan("Legacy", "price_legacy", None)
            .inactive();
        catalog
    }

    // ============ Plan registry ============

    #[test]
    fn test_find_plan_by_id_and_yearly_id() {
        let catalog = create_test_catalog();
        assert_eq!(catalog.find_plan("price_pro_m").unwrap().name(), "Pro");
        assert_eq!(catalog.find_plan("price_pro_y").unwrap().name(), "Pro");
        assert!(catalog.find_plan("price_missing").is_none());
    }

    #[test]
    fn test_resolve_plan_value() {
        let catalog = create_test_catalog();
        let copy = catalog.find_plan("price_basic").unwrap().clone();
        assert_eq!(catalog.resolve_plan(&copy).unwrap().name(), "Basic");
    }

    #[test]
    fn test_plans_keep_registration_order() {
        let catalog = create_test_catalog();
        let names: Vec<&str> = catalog.plans().iter().map(Plan::name).collect();
        assert_eq!(names, vec!["Free", "Basic", "Pro", "Legacy"]);
    }

    #[test]
    fn test_available_plans_excludes_inactive() {
        let catalog = create_test_catalog();
        let names: Vec<&str> = catalog.available_plans().into_iter().map(Plan::name).collect();
        assert_eq!(names, vec!["Free", "Basic", "Pro"]);
    }

    #[test]
    fn test_free_plan() {
        let catalog = create_test_catalog();
        assert_eq!(catalog.free_plan().unwrap().id(), "price_free");

        let mut paid_only = Catalog::new();
        paid_only.register_plan("Pro", "price_pro", None);
        assert!(paid_only.free_plan().is_none());
    }

    #[test]
    fn test_duplicate_plan_id_first_match_wins() {
        let mut catalog = Catalog::new();
        catalog.register_plan("First", "price_dup", None);
        catalog.register_plan("Second", "price_dup", None);

        assert_eq!(catalog.plans().len(), 2);
        assert_eq!(catalog.find_plan("price_dup").unwrap().name(), "First");
    }

    #[test]
    fn test_clear_plans() {
        let mut catalog = create_test_catalog();
        catalog.clear_plans();
        assert!(catalog.plans().is_empty());
        assert!(catalog.free_plan().is_none());
    }

    // ============ Items and currency ============

    #[test]
    fn test_item_defaults_to_eur() {
        let mut catalog = Catalog::new();
        let item = catalog.register_item("credits", "Credits", Decimal::new(500, 2), None);
        assert_eq!(item.currency, "EUR");
    }

    #[test]
    fn test_item_uses_currency_override() {
        let mut catalog = Catalog::new();
        catalog.set_currency("usd");
        let item = catalog.register_item("credits", "Credits", Decimal::new(500, 2), None);
        assert_eq!(item.currency, "USD");
    }

    #[test]
    fn test_explicit_item_currency_wins_over_override() {
        let mut catalog = Catalog::new();
        catalog.set_currency("USD");
        let item = catalog.register_item("credits", "Credits", Decimal::new(500, 2), Some("GBP"));
        assert_eq!(item.currency, "GBP");
    }

    #[test]
    fn test_find_item_and_clear() {
        let mut catalog = Catalog::new();
        catalog.register_item("credits", "Credits", Decimal::new(500, 2), None);
        assert_eq!(catalog.find_item("credits").unwrap().name, "Credits");
        assert!(catalog.find_item("missing").is_none());

        catalog.clear_items();
        assert!(catalog.items().is_empty());
    }

    #[test]
    fn test_currency_fallback() {
        let mut catalog = Catalog::new();
        assert_eq!(catalog.currency(None), None);
        assert_eq!(catalog.currency(Some("EUR")), Some("EUR"));

        catalog.set_currency("usd");
        assert_eq!(catalog.currency(Some("EUR")), Some("USD"));
    }

    #[test]
    fn test_from_config_seeds_currency() {
        let config = BillingConfig {
            currency: Some("chf".to_string()),
            ..BillingConfig::default()
        };
        let catalog = Catalog::from_config(&config);
        assert_eq!(catalog.currency(None), Some("CHF"));
    }

    // ============ Usage sync ============

    #[tokio::test]
    async fn test_usage_sync_passthrough() {
        let mut catalog = Catalog::new();
        catalog.register_usage_sync("projects", Arc::new(usage_fn(|_, _| Ok(7.0))));

        let sub = MockSubscription::new("sub_1");
        let projects = Feature::new("Projects", "projects");
        let seats = Feature::new("Seats", "seats");

        assert_eq!(catalog.apply_usage_sync(&sub, &projects).await.unwrap(), Some(7.0));
        assert_eq!(catalog.apply_usage_sync(&sub, &seats).await.unwrap(), None);

        catalog.clear_usage_sync_callbacks();
        assert_eq!(catalog.apply_usage_sync(&sub, &projects).await.unwrap(), None);
    }

    // ============ SharedCatalog ============

    #[test]
    fn test_shared_catalog_snapshot_isolation() {
        let shared = SharedCatalog::new(create_test_catalog());
        let before = shared.snapshot();

        shared.update(|catalog| {
            catalog.register_plan("Enterprise", "price_enterprise", None);
        });

        assert!(before.find_plan("price_enterprise").is_none());
        assert!(shared.snapshot().find_plan("price_enterprise").is_some());
    }

    #[test]
    fn test_shared_catalog_update_returns_value() {
        let shared = SharedCatalog::from(Catalog::new());
        let currency = shared.update(|catalog| {
            catalog
                .register_item("credits", "Credits", Decimal::ONE, Some("usd"))
                .currency
                .clone()
        });
        assert_eq!(currency, "USD");
    }

    #[test]
    fn test_shared_catalog_replace() {
        let shared = SharedCatalog::new(create_test_catalog());
        shared.replace(Catalog::new());
        assert!(shared.snapshot().plans().is_empty());
    }
}
