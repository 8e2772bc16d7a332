//! Usage sync table.
//!
//! Maps a feature id to a [`UsageSource`] that reports how much of the
//! feature a subscription has consumed. At most one source is registered
//! per feature id; registering again replaces the previous source.
//!
//! ```rust
//! use saas_catalog::billing::{Feature, UsageSyncTable, usage_fn};
//! use std::sync::Arc;
//!
//! let mut table = UsageSyncTable::new();
//! table.register("projects", Arc::new(usage_fn(|_subscription, _feature| Ok(4.0))));
//! assert!(table.is_registered("projects"));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tracing::debug;

use super::features::Feature;
use super::subscription::SubscriptionHandle;
use crate::error::Result;

/// Reports current usage of a feature for a subscription.
#[async_trait]
#[allow(async_fn_in_trait)]
pub trait UsageSource: Send + Sync {
    async fn sync_usage(&self, subscription: &dyn SubscriptionHandle, feature: &Feature) -> Result<f64>;
}

/// [`UsageSource`] backed by a synchronous closure.
pub struct UsageFn<F>(F);

/// Wrap a synchronous closure as a [`UsageSource`].
pub fn usage_fn<F>(f: F) -> UsageFn<F>
where
    F: Fn(&dyn SubscriptionHandle, &Feature) -> Result<f64> + Send + Sync,
{
    UsageFn(f)
}

#[async_trait]
impl<F> UsageSource for UsageFn<F>
where
    F: Fn(&dyn SubscriptionHandle, &Feature) -> Result<f64> + Send + Sync,
{
    async fn sync_usage(&self, subscription: &dyn SubscriptionHandle, feature: &Feature) -> Result<f64> {
        (self.0)(subscription, feature)
    }
}

/// [`UsageSource`] backed by a closure returning a boxed future.
///
/// The closure receives owned copies of the subscription id and feature so
/// the future can be `'static`.
pub struct AsyncUsageFn<F>(F);

/// Wrap an async closure as a [`UsageSource`].
///
/// ```rust
/// use saas_catalog::billing::async_usage_fn;
///
/// let source = async_usage_fn(|subscription_id, _feature| {
///     Box::pin(async move { Ok::<_, saas_catalog::SaasError>(subscription_id.len() as f64) })
/// });
/// ```
pub fn async_usage_fn<F>(f: F) -> AsyncUsageFn<F>
where
    F: Fn(String, Feature) -> BoxFuture<'static, Result<f64>> + Send + Sync,
{
    AsyncUsageFn(f)
}

#[async_trait]
impl<F> UsageSource for AsyncUsageFn<F>
where
    F: Fn(String, Feature) -> BoxFuture<'static, Result<f64>> + Send + Sync,
{
    async fn sync_usage(&self, subscription: &dyn SubscriptionHandle, feature: &Feature) -> Result<f64> {
        (self.0)(subscription.id().to_string(), feature.clone()).await
    }
}

/// Feature id to usage source mapping.
#[derive(Clone, Default)]
pub struct UsageSyncTable {
    sources: HashMap<String, Arc<dyn UsageSource>>,
}

impl UsageSyncTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the source for `feature_id`, replacing any previous one.
    pub fn register(&mut self, feature_id: impl Into<String>, source: Arc<dyn UsageSource>) {
        let feature_id = feature_id.into();
        if self.sources.insert(feature_id.clone(), source).is_some() {
            debug!(feature_id = %feature_id, "Replaced usage sync source");
        }
    }

    /// Invoke the source registered for `feature` once.
    ///
    /// Returns `Ok(None)` when no source is registered. Source errors are
    /// returned unchanged.
    pub async fn apply(
        &self,
        subscription: &dyn SubscriptionHandle,
        feature: &Feature,
    ) -> Result<Option<f64>> {
        let Some(source) = self.sources.get(feature.id()) else {
            return Ok(None);
        };

        let usage = source.sync_usage(subscription, feature).await?;
        debug!(
            feature_id = %feature.id(),
            subscription_id = %subscription.id(),
            usage,
            "Synced feature usage"
        );
        Ok(Some(usage))
    }

    #[must_use]
    pub fn is_registered(&self, feature_id: &str) -> bool {
        self.sources.contains_key(feature_id)
    }

    pub fn feature_ids(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    #[cfg(any(test, feature = "test-billing"))]
    pub fn clear(&mut self) {
        self.sources.clear();
    }
}

impl fmt::Debug for UsageSyncTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UsageSyncTable")
            .field("feature_ids", &self.sources.keys().collect::<Vec<_>>())
            .finish()
    }
}
