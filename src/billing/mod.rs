//! Billing catalog and subscription actions.
//!
//! Register plans, features and items on a [`Catalog`], attach usage sync
//! sources per feature, and drive subscriptions through
//! [`SubscriptionActions`] against your own [`Billable`] type.
//!
//! # Example
//!
//! ```rust,ignore
//! use saas_catalog::billing::{
//!     Catalog, Feature, HandleSubscriptions, MeteredFeature, SubscriptionActions,
//! };
//! use saas_catalog::ConfigBuilder;
//!
//! let config = ConfigBuilder::new().from_env().build()?;
//!
//! // Configure plans
//! let mut catalog = Catalog::from_config(&config.billing);
//! catalog
//!     .register_plan("Pro", "price_pro_m", Some("price_pro_y"))
//!     .feature(Feature::new("Projects", "projects").unlimited())
//!     .metered_feature(
//!         MeteredFeature::new("Build minutes", "build_minutes").metered_price("price_minutes"),
//!     );
//!
//! // Subscribe a user
//! let actions = SubscriptionActions::new(config.billing.clone());
//! let plan = catalog.find_plan("price_pro_m").unwrap();
//! let subscription = actions.subscribe_to_plan(&mut user, plan).await?;
//! ```

pub mod actions;
pub mod catalog;
pub mod error;
pub mod features;
pub mod items;
pub mod plans;
pub mod subscription;
pub mod usage;

pub use actions::{HandleSubscriptions, SubscriptionActions};
pub use catalog::{Catalog, SharedCatalog};
pub use error::BillingError;
pub use features::{Feature, MeteredFeature, UNLIMITED};
pub use items::{DEFAULT_CURRENCY, Item};
pub use plans::{BillingInterval, LimitCheckResult, Plan};
pub use subscription::{
    Billable, CheckoutDirective, CheckoutSession, NewSubscription, ProrationBehavior,
    SubscriptionHandle,
};
pub use usage::{AsyncUsageFn, UsageFn, UsageSource, UsageSyncTable, async_usage_fn, usage_fn};

#[cfg(any(test, feature = "test-billing"))]
pub use subscription::test::{MockBillable, MockSubscription, SubscriptionCall};
