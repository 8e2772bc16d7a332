//! Collaborator contracts for billable entities and their subscriptions.
//!
//! The payment provider integration lives in the host application. These
//! traits describe what the subscription actions need from it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A subscription owned by the payment provider integration.
#[async_trait]
#[allow(async_fn_in_trait)] // async_trait macro handles Send/Sync bounds
pub trait SubscriptionHandle: Send + Sync {
    /// Provider identifier of the subscription.
    fn id(&self) -> &str;

    /// Start a hosted checkout for this subscription.
    async fn checkout(&self, directive: &CheckoutDirective) -> Result<CheckoutSession>;

    /// Move the subscription to another price.
    async fn swap(&self, price_id: &str, proration: ProrationBehavior) -> Result<()>;

    /// Undo a pending cancellation.
    async fn resume(&self) -> Result<()>;

    /// Cancel the subscription. Whether it ends now or at period end is up
    /// to the provider.
    async fn cancel(&self) -> Result<()>;

    /// Record the current price id locally.
    fn set_price_id(&mut self, price_id: &str);

    /// Persist local changes.
    async fn save(&mut self) -> Result<()>;
}

/// An entity that can hold subscriptions, typically a user or a team.
#[async_trait]
#[allow(async_fn_in_trait)]
pub trait Billable: Send + Sync {
    type Subscription: SubscriptionHandle;

    fn billable_id(&self) -> &str;

    /// When the entity's trial ends. `Some` once a trial has been granted.
    fn trial_ends_at(&self) -> Option<DateTime<Utc>>;

    fn set_trial_ends_at(&mut self, ends_at: Option<DateTime<Utc>>);

    /// Persist local changes.
    async fn save(&mut self) -> Result<()>;

    /// The entity's default payment method id, if one is on file.
    async fn default_payment_method(&self) -> Result<Option<String>>;

    /// Create a subscription with the payment provider.
    async fn create_subscription(&mut self, request: NewSubscription) -> Result<Self::Subscription>;
}

/// Request to create a subscription.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSubscription {
    /// Subscription name, the plan's display name.
    pub name: String,
    /// Base price id, the plan's id.
    pub price_id: String,
    /// Metered prices attached alongside the base price.
    pub metered_price_ids: Vec<String>,
    pub payment_method: Option<String>,
}

/// What a hosted checkout should charge and where it returns to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutDirective {
    pub success_url: String,
    pub cancel_url: String,
    pub price_id: String,
    pub metered_price_ids: Vec<String>,
}

/// A checkout session created by the provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// How to handle proration on plan changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProrationBehavior {
    /// Create prorations for any changes (default).
    #[default]
    CreateProrations,
    /// Don't create prorations.
    None,
}

impl ProrationBehavior {
    /// Behavior for a plan swap given the prorate toggle.
    #[must_use]
    pub fn for_swap(prorate: bool) -> Self {
        if prorate { Self::CreateProrations } else { Self::None }
    }

    /// Convert to the provider API string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateProrations => "create_prorations",
            Self::None => "none",
        }
    }
}

/// Mock collaborators for testing.
#[cfg(any(test, feature = "test-billing"))]
pub mod test {
    use super::*;
    use crate::error::SaasError;
    use std::sync::{Arc, Mutex};

    /// A call recorded by [`MockSubscription`].
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum SubscriptionCall {
        Checkout(CheckoutDirective),
        Swap {
            price_id: String,
            proration: ProrationBehavior,
        },
        Resume,
        Cancel,
        Save,
    }

    /// Mock subscription that records every call.
    ///
    /// Clones share the same call log.
    #[derive(Clone, Debug)]
    pub struct MockSubscription {
        id: String,
        price_id: Option<String>,
        calls: Arc<Mutex<Vec<SubscriptionCall>>>,
        fail_with: Option<String>,
    }

    impl MockSubscription {
        #[must_use]
        pub fn new(id: impl Into<String>) -> Self {
            Self {
                id: id.into(),
                price_id: None,
                calls: Arc::new(Mutex::new(Vec::new())),
                fail_with: None,
            }
        }

        /// Make every provider call fail with a service unavailable error.
        #[must_use]
        pub fn failing(mut self, message: impl Into<String>) -> Self {
            self.fail_with = Some(message.into());
            self
        }

        pub fn price_id(&self) -> Option<&str> {
            self.price_id.as_deref()
        }

        pub fn calls(&self) -> Vec<SubscriptionCall> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: SubscriptionCall) -> Result<()> {
            if let Some(ref message) = self.fail_with {
                return Err(SaasError::service_unavailable(message.clone()));
            }
            self.calls.lock().unwrap().push(call);
            Ok(())
        }
    }

    #[async_trait]
    impl SubscriptionHandle for MockSubscription {
        fn id(&self) -> &str {
            &self.id
        }

        async fn checkout(&self, directive: &CheckoutDirective) -> Result<CheckoutSession> {
            self.record(SubscriptionCall::Checkout(directive.clone()))?;
            Ok(CheckoutSession {
                id: format!("cs_{}", self.id),
                url: format!("https://checkout.test/{}", self.id),
            })
        }

        async fn swap(&self, price_id: &str, proration: ProrationBehavior) -> Result<()> {
            self.record(SubscriptionCall::Swap {
                price_id: price_id.to_string(),
                proration,
            })
        }

        async fn resume(&self) -> Result<()> {
            self.record(SubscriptionCall::Resume)
        }

        async fn cancel(&self) -> Result<()> {
            self.record(SubscriptionCall::Cancel)
        }

        fn set_price_id(&mut self, price_id: &str) {
            self.price_id = Some(price_id.to_string());
        }

        async fn save(&mut self) -> Result<()> {
            self.record(SubscriptionCall::Save)
        }
    }

    /// Mock billable entity.
    #[derive(Clone, Debug, Default)]
    pub struct MockBillable {
        pub id: String,
        pub trial_ends_at: Option<DateTime<Utc>>,
        pub payment_method: Option<String>,
        /// Number of times `save` was called.
        pub saves: usize,
        /// Every subscription request received.
        pub created: Vec<NewSubscription>,
        pub fail_create: Option<String>,
    }

    impl MockBillable {
        /// A billable with a card on file and no trial history.
        #[must_use]
        pub fn new(id: impl Into<String>) -> Self {
            Self {
                id: id.into(),
                payment_method: Some("pm_card_visa".to_string()),
                ..Self::default()
            }
        }

        #[must_use]
        pub fn without_payment_method(mut self) -> Self {
            self.payment_method = None;
            self
        }

        #[must_use]
        pub fn with_trial_ends_at(mut self, ends_at: DateTime<Utc>) -> Self {
            self.trial_ends_at = Some(ends_at);
            self
        }

        /// Make `create_subscription` fail with a service unavailable error.
        #[must_use]
        pub fn failing_create(mut self, message: impl Into<String>) -> Self {
            self.fail_create = Some(message.into());
            self
        }
    }

    #[async_trait]
    impl Billable for MockBillable {
        type Subscription = MockSubscription;

        fn billable_id(&self) -> &str {
            &self.id
        }

        fn trial_ends_at(&self) -> Option<DateTime<Utc>> {
            self.trial_ends_at
        }

        fn set_trial_ends_at(&mut self, ends_at: Option<DateTime<Utc>>) {
            self.trial_ends_at = ends_at;
        }

        async fn save(&mut self) -> Result<()> {
            self.saves += 1;
            Ok(())
        }

        async fn default_payment_method(&self) -> Result<Option<String>> {
            Ok(self.payment_method.clone())
        }

        async fn create_subscription(&mut self, request: NewSubscription) -> Result<MockSubscription> {
            if let Some(ref message) = self.fail_create {
                return Err(SaasError::service_unavailable(message.clone()));
            }
            let id = format!("sub_{}_{}", self.id, self.created.len() + 1);
            self.created.push(request);
            Ok(MockSubscription::new(id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test::*;
    use super::*;

    #[test]
    fn test_proration_for_swap() {
        assert_eq!(ProrationBehavior::for_swap(true), ProrationBehavior::CreateProrations);
        assert_eq!(ProrationBehavior::for_swap(false), ProrationBehavior::None);
        assert_eq!(ProrationBehavior::None.as_str(), "none");
        assert_eq!(ProrationBehavior::default().as_str(), "create_prorations");
    }

    #[tokio::test]
    async fn test_mock_subscription_shares_call_log() {
        let sub = MockSubscription::new("sub_1");
        let observer = sub.clone();

        sub.cancel().await.unwrap();
        sub.resume().await.unwrap();

        assert_eq!(
            observer.calls(),
            vec![SubscriptionCall::Cancel, SubscriptionCall::Resume]
        );
    }

    #[tokio::test]
    async fn test_mock_subscription_failure() {
        let sub = MockSubscription::new("sub_1").failing("provider down");
        assert!(sub.cancel().await.is_err());
        assert!(sub.calls().is_empty());
    }

    #[tokio::test]
    async fn test_mock_billable_creates_subscriptions() {
        let mut billable = MockBillable::new("user_1");
        let sub = billable
            .create_subscription(NewSubscription {
                name: "Pro".to_string(),
                price_id: "price_pro".to_string(),
                metered_price_ids: vec![],
                payment_method: Some("pm_card_visa".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(sub.id(), "sub_user_1_1");
        assert_eq!(billable.created.len(), 1);
    }
}
