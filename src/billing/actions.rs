//! Subscription actions.
//!
//! Turns catalog intent (subscribe, swap, resume, cancel, checkout) into
//! calls on the host application's [`Billable`] and [`SubscriptionHandle`].
//! [`SubscriptionActions`] is the default behaviour; implement
//! [`HandleSubscriptions`] to replace it.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tracing::{debug, info, instrument};

use super::catalog::Catalog;
use super::error::{BillingError, Result};
use super::plans::Plan;
use super::subscription::{
    Billable, CheckoutDirective, CheckoutSession, NewSubscription, ProrationBehavior,
    SubscriptionHandle,
};
use crate::config::BillingConfig;

/// Subscription lifecycle operations for a billable type.
#[async_trait]
pub trait HandleSubscriptions<B: Billable>: Send + Sync {
    /// Build the checkout directive for `plan`.
    fn prepare_checkout(
        &self,
        subscription: &B::Subscription,
        billable: &B,
        plan: &Plan,
    ) -> Result<CheckoutDirective>;

    /// Prepare a checkout and hand it to the subscription.
    async fn checkout_on_subscription(
        &self,
        subscription: &B::Subscription,
        billable: &B,
        plan: &Plan,
    ) -> Result<CheckoutSession>;

    /// Subscribe `billable` to `plan`, granting the trial when it applies.
    ///
    /// A granted trial is saved on the billable before the subscription is
    /// created. If creation then fails the trial stays consumed and no
    /// subscription exists.
    async fn subscribe_to_plan(&self, billable: &mut B, plan: &Plan) -> Result<B::Subscription>;

    /// Move an existing subscription to `plan`.
    async fn swap_to_plan(&self, subscription: &B::Subscription, billable: &B, plan: &Plan) -> Result<()>;

    async fn resume_subscription(&self, subscription: &B::Subscription, billable: &B) -> Result<()>;

    async fn cancel_subscription(&self, subscription: &B::Subscription, billable: &B) -> Result<()>;
}

/// Default subscription actions driven by [`BillingConfig`].
#[derive(Clone, Debug, Default)]
pub struct SubscriptionActions {
    config: BillingConfig,
}

impl SubscriptionActions {
    #[must_use]
    pub fn new(config: BillingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BillingConfig {
        &self.config
    }

    /// Subscribe to the plan registered under `plan_key` (id or yearly id).
    pub async fn subscribe_to_plan_id<B: Billable>(
        &self,
        catalog: &Catalog,
        billable: &mut B,
        plan_key: &str,
    ) -> Result<B::Subscription> {
        let plan = catalog
            .find_plan(plan_key)
            .ok_or_else(|| BillingError::PlanNotFound {
                plan_id: plan_key.to_string(),
            })?;
        self.subscribe_to_plan(billable, plan).await
    }

    fn redirect_url(&self) -> Result<String> {
        self.config
            .subscription_index()
            .map(String::from)
            .map_err(|e| BillingError::InvalidRedirectUrl {
                url: self.config.subscription_index_url.clone(),
                reason: e.to_string(),
            })
    }
}

/// Metered price ids of `plan`, failing on a metered feature without one.
fn metered_price_ids(plan: &Plan) -> Result<Vec<String>> {
    plan.metered_feature_list()
        .iter()
        .map(|feature| {
            feature
                .metered_id()
                .map(str::to_string)
                .ok_or_else(|| BillingError::MissingMeteredPrice {
                    plan_id: plan.id().to_string(),
                    feature_id: feature.id().to_string(),
                })
        })
        .collect()
}

#[async_trait]
impl<B: Billable> HandleSubscriptions<B> for SubscriptionActions {
    fn prepare_checkout(
        &self,
        _subscription: &B::Subscription,
        _billable: &B,
        plan: &Plan,
    ) -> Result<CheckoutDirective> {
        let url = self.redirect_url()?;
        Ok(CheckoutDirective {
            success_url: url.clone(),
            cancel_url: url,
            price_id: plan.id().to_string(),
            metered_price_ids: metered_price_ids(plan)?,
        })
    }

    #[instrument(skip_all, fields(billable_id = %billable.billable_id(), plan_id = %plan.id()))]
    async fn checkout_on_subscription(
        &self,
        subscription: &B::Subscription,
        billable: &B,
        plan: &Plan,
    ) -> Result<CheckoutSession> {
        let directive = self.prepare_checkout(subscription, billable, plan)?;
        let session = subscription.checkout(&directive).await?;
        info!(session_id = %session.id, "Created checkout session");
        Ok(session)
    }

    #[instrument(skip_all, fields(billable_id = %billable.billable_id(), plan_id = %plan.id()))]
    async fn subscribe_to_plan(&self, billable: &mut B, plan: &Plan) -> Result<B::Subscription> {
        let metered_price_ids = metered_price_ids(plan)?;

        let is_trial_plan = self.config.is_trial_plan(plan.id());
        if is_trial_plan && billable.trial_ends_at().is_some() {
            return Err(BillingError::TrialAlreadyUsed {
                billable_id: billable.billable_id().to_string(),
            });
        }
        let trial_ends_at = if is_trial_plan && self.config.trial.days > 0 {
            let days = self.config.trial.days;
            let ends_at = Duration::try_days(i64::from(days))
                .and_then(|length| Utc::now().checked_add_signed(length))
                .ok_or(BillingError::InvalidTrialLength { days })?;
            Some(ends_at)
        } else {
            None
        };
        let grant_trial = trial_ends_at.is_some();

        let payment_method = billable.default_payment_method().await?;
        if payment_method.is_none() && !grant_trial && !plan.is_free() {
            return Err(BillingError::NoPaymentMethod {
                billable_id: billable.billable_id().to_string(),
            });
        }

        if let Some(ends_at) = trial_ends_at {
            billable.set_trial_ends_at(Some(ends_at));
            billable.save().await?;
            info!(trial_ends_at = %ends_at, "Granted trial");
        }

        let mut subscription = billable
            .create_subscription(NewSubscription {
                name: plan.name().to_string(),
                price_id: plan.id().to_string(),
                metered_price_ids,
                payment_method,
            })
            .await?;

        subscription.set_price_id(plan.id());
        subscription.save().await?;

        info!(subscription_id = %subscription.id(), "Subscribed to plan");
        Ok(subscription)
    }

    #[instrument(skip_all, fields(subscription_id = %subscription.id(), plan_id = %plan.id()))]
    async fn swap_to_plan(&self, subscription: &B::Subscription, _billable: &B, plan: &Plan) -> Result<()> {
        let proration = ProrationBehavior::for_swap(self.config.prorate_on_swap);
        debug!(proration = proration.as_str(), "Swapping plan");

        subscription.swap(plan.id(), proration).await?;
        info!("Swapped plan");
        Ok(())
    }

    #[instrument(skip_all, fields(subscription_id = %subscription.id()))]
    async fn resume_subscription(&self, subscription: &B::Subscription, _billable: &B) -> Result<()> {
        subscription.resume().await?;
        info!("Resumed subscription");
        Ok(())
    }

    #[instrument(skip_all, fields(subscription_id = %subscription.id()))]
    async fn cancel_subscription(&self, subscription: &B::Subscription, _billable: &B) -> Result<()> {
        subscription.cancel().await?;
        info!("Cancelled subscription");
        Ok(())
    }
}
