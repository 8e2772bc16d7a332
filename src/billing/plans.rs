//! Plan definitions.
//!
//! Plans are registered on a [`Catalog`](super::Catalog) and decorated in place:
//!
//! ```rust
//! use saas_catalog::billing::{Catalog, Feature, MeteredFeature};
//!
//! let mut catalog = Catalog::new();
//!
//! catalog
//!     .register_plan("Free", "price_free", None)
//!     .description("For hobby projects")
//!     .free()
//!     .feature(Feature::new("Projects", "projects").value(1.0));
//!
//! catalog
//!     .register_plan("Pro", "price_pro_m", Some("price_pro_y"))
//!     .feature(Feature::new("Projects", "projects").unlimited())
//!     .metered_feature(
//!         MeteredFeature::new("Build minutes", "build_minutes").metered_price("price_minutes"),
//!     );
//! ```

use serde::Serialize;

use super::features::{Feature, MeteredFeature};

/// Billing interval used to pick a plan's external price id.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingInterval {
    #[default]
    Monthly,
    Yearly,
}

/// A subscribable tier.
///
/// The `id` doubles as the external price id the subscription is created
/// with. The optional `yearly_id` is an alternate lookup key.
#[derive(Clone, Debug, Serialize)]
pub struct Plan {
    name: String,
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    yearly_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    features: Vec<Feature>,
    metered_features: Vec<MeteredFeature>,
    active: bool,
    free: bool,
}

impl Plan {
    /// Create an active, paid plan with no features.
    #[must_use]
    pub fn new(name: impl Into<String>, id: impl Into<String>, yearly_id: Option<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            yearly_id,
            description: None,
            features: Vec::new(),
            metered_features: Vec::new(),
            active: true,
            free: false,
        }
    }

    pub fn description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = Some(description.into());
        self
    }

    /// Add a feature, replacing any feature with the same id.
    pub fn feature(&mut self, feature: Feature) -> &mut Self {
        match self.features.iter_mut().find(|f| f.id() == feature.id()) {
            Some(existing) => *existing = feature,
            None => self.features.push(feature),
        }
        self
    }

    pub fn features(&mut self, features: impl IntoIterator<Item = Feature>) -> &mut Self {
        for feature in features {
            self.feature(feature);
        }
        self
    }

    /// Add a metered feature, replacing any metered feature with the same id.
    pub fn metered_feature(&mut self, feature: MeteredFeature) -> &mut Self {
        match self
            .metered_features
            .iter_mut()
            .find(|f| f.id() == feature.id())
        {
            Some(existing) => *existing = feature,
            None => self.metered_features.push(feature),
        }
        self
    }

    /// Mark the plan as free. Free plans never require payment.
    pub fn free(&mut self) -> &mut Self {
        self.free = true;
        self
    }

    /// Hide the plan from the available listing.
    pub fn inactive(&mut self) -> &mut Self {
        self.active = false;
        self
    }

    pub fn set_active(&mut self, active: bool) -> &mut Self {
        self.active = active;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn yearly_id(&self) -> Option<&str> {
        self.yearly_id.as_deref()
    }

    pub fn description_text(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn feature_list(&self) -> &[Feature] {
        &self.features
    }

    pub fn metered_feature_list(&self) -> &[MeteredFeature] {
        &self.metered_features
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[must_use]
    pub fn is_free(&self) -> bool {
        self.free
    }

    /// Whether `key` is this plan's id or yearly id.
    #[must_use]
    pub fn matches(&self, key: &str) -> bool {
        self.id == key || self.yearly_id.as_deref() == Some(key)
    }

    /// Look up a plain or metered feature by id.
    #[must_use]
    pub fn get_feature(&self, feature_id: &str) -> Option<&Feature> {
        self.features
            .iter()
            .find(|f| f.id() == feature_id)
            .or_else(|| {
                self.metered_features
                    .iter()
                    .map(MeteredFeature::as_feature)
                    .find(|f| f.id() == feature_id)
            })
    }

    #[must_use]
    pub fn get_metered_feature(&self, feature_id: &str) -> Option<&MeteredFeature> {
        self.metered_features.iter().find(|f| f.id() == feature_id)
    }

    #[must_use]
    pub fn has_feature(&self, feature_id: &str) -> bool {
        self.get_feature(feature_id).is_some()
    }

    /// External price id for the given interval.
    ///
    /// `None` for [`BillingInterval::Yearly`] when the plan has no yearly id.
    #[must_use]
    pub fn price_id_for(&self, interval: BillingInterval) -> Option<&str> {
        match interval {
            BillingInterval::Monthly => Some(&self.id),
            BillingInterval::Yearly => self.yearly_id.as_deref(),
        }
    }

    /// Check `used` against a feature's allowance.
    #[must_use]
    pub fn check_limit(&self, feature_id: &str, used: f64) -> LimitCheckResult {
        let Some(feature) = self.get_feature(feature_id) else {
            return LimitCheckResult::NotIncluded;
        };

        match feature.remaining(used) {
            None => LimitCheckResult::Unlimited,
            Some(_) if used < feature.allowance() => LimitCheckResult::WithinLimit {
                used,
                max: feature.allowance(),
            },
            Some(_) => LimitCheckResult::AtLimit {
                used,
                max: feature.allowance(),
            },
        }
    }
}

/// Result of checking usage against a plan feature.
#[derive(Clone, Debug, PartialEq)]
pub enum LimitCheckResult {
    /// The plan does not include the feature.
    NotIncluded,
    /// No limit on this feature.
    Unlimited,
    /// Usage is within the limit.
    WithinLimit { used: f64, max: f64 },
    /// Usage has reached or exceeded the limit.
    AtLimit { used: f64, max: f64 },
}

impl LimitCheckResult {
    /// Check if more usage is allowed.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Unlimited | Self::WithinLimit { .. })
    }

    #[must_use]
    pub fn is_at_limit(&self) -> bool {
        matches!(self, Self::AtLimit { .. })
    }
}
