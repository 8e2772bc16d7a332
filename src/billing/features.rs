//! Plan features and metered features.
//!
//! A [`Feature`] is a named capability with a numeric allowance. Plans carry
//! features; a [`MeteredFeature`] additionally points at an external metered
//! price that usage is billed against.
//!
//! ```rust
//! use saas_catalog::billing::{Feature, MeteredFeature};
//!
//! let projects = Feature::new("Projects", "projects")
//!     .value(10.0)
//!     .model("projects");
//!
//! let builds = MeteredFeature::new("Build minutes", "build_minutes")
//!     .metered_price("price_build_minutes")
//!     .metered_unit("minute");
//! ```

use std::fmt;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;

/// Value marking a feature as unlimited.
pub const UNLIMITED: f64 = -1.0;

/// Hook transforming a raw value into the feature's computed value.
pub type CalcFn = Arc<dyn Fn(f64) -> f64 + Send + Sync>;

/// A named capability attached to a plan.
#[derive(Clone, Serialize)]
pub struct Feature {
    name: String,
    id: String,
    value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    #[serde(skip)]
    calc: Option<CalcFn>,
}

impl Feature {
    /// Create a feature with a value of zero.
    #[must_use]
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            value: 0.0,
            model: None,
            calc: None,
        }
    }

    /// Set the allowance.
    #[must_use]
    pub fn value(mut self, value: f64) -> Self {
        self.value = value;
        self
    }

    /// Mark the feature as unlimited.
    #[must_use]
    pub fn unlimited(mut self) -> Self {
        self.value = UNLIMITED;
        self
    }

    /// Name the resource this feature counts.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Attach a computation hook used by [`Feature::calculate`].
    #[must_use]
    pub fn calc<F>(mut self, f: F) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        self.calc = Some(Arc::new(f));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn allowance(&self) -> f64 {
        self.value
    }

    pub fn model_name(&self) -> Option<&str> {
        self.model.as_deref()
    }

    #[must_use]
    pub fn is_unlimited(&self) -> bool {
        self.value < 0.0
    }

    #[must_use]
    pub fn has_calc(&self) -> bool {
        self.calc.is_some()
    }

    /// Run the computation hook over `raw`, or return `raw` when none is set.
    #[must_use]
    pub fn calculate(&self, raw: f64) -> f64 {
        match &self.calc {
            Some(calc) => calc(raw),
            None => raw,
        }
    }

    /// Allowance left after `used`, saturating at zero.
    ///
    /// `None` for unlimited features.
    #[must_use]
    pub fn remaining(&self, used: f64) -> Option<f64> {
        if self.is_unlimited() {
            None
        } else {
            Some((self.value - used).max(0.0))
        }
    }
}

impl fmt::Debug for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Feature")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("value", &self.value)
            .field("model", &self.model)
            .field("calc", &self.calc.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// A feature billed per unit against a metered external price.
#[derive(Clone, Debug, Serialize)]
pub struct MeteredFeature {
    #[serde(flatten)]
    feature: Feature,
    #[serde(skip_serializing_if = "Option::is_none")]
    metered_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metered_unit_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metered_unit: Option<String>,
}

impl MeteredFeature {
    #[must_use]
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Feature::new(name, id).into()
    }

    /// Set the external metered price id.
    #[must_use]
    pub fn metered_price(mut self, price_id: impl Into<String>) -> Self {
        self.metered_id = Some(price_id.into());
        self
    }

    /// Set the displayed per-unit price.
    #[must_use]
    pub fn metered_unit_price(mut self, price: Decimal) -> Self {
        self.metered_unit_price = Some(price);
        self
    }

    /// Set the unit label, e.g. `"minute"`.
    #[must_use]
    pub fn metered_unit(mut self, unit: impl Into<String>) -> Self {
        self.metered_unit = Some(unit.into());
        self
    }

    /// Apply a change to the underlying feature.
    #[must_use]
    pub fn with_feature(mut self, f: impl FnOnce(Feature) -> Feature) -> Self {
        self.feature = f(self.feature);
        self
    }

    pub fn id(&self) -> &str {
        self.feature.id()
    }

    pub fn as_feature(&self) -> &Feature {
        &self.feature
    }

    pub fn metered_id(&self) -> Option<&str> {
        self.metered_id.as_deref()
    }

    pub fn unit_price(&self) -> Option<Decimal> {
        self.metered_unit_price
    }

    pub fn unit(&self) -> Option<&str> {
        self.metered_unit.as_deref()
    }
}

impl From<Feature> for MeteredFeature {
    fn from(feature: Feature) -> Self {
        Self {
            feature,
            metered_id: None,
            metered_unit_price: None,
            metered_unit: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_defaults() {
        let feature = Feature::new("Seats", "seats");
        assert_eq!(feature.allowance(), 0.0);
        assert!(feature.model_name().is_none());
        assert!(!feature.is_unlimited());
        assert!(!feature.has_calc());
    }

    #[test]
    fn test_calculate_without_hook_is_identity() {
        let feature = Feature::new("Seats", "seats").value(5.0);
        assert_eq!(feature.calculate(3.5), 3.5);
    }

    #[test]
    fn test_calculate_with_hook() {
        let feature = Feature::new("Storage", "storage_gb").calc(|bytes| bytes / 1024.0);
        assert!(feature.has_calc());
        assert_eq!(feature.calculate(2048.0), 2.0);
    }

    #[test]
    fn test_remaining() {
        let feature = Feature::new("Projects", "projects").value(10.0);
        assert_eq!(feature.remaining(4.0), Some(6.0));
        assert_eq!(feature.remaining(12.0), Some(0.0));

        let unlimited = Feature::new("Projects", "projects").unlimited();
        assert!(unlimited.is_unlimited());
        assert_eq!(unlimited.remaining(1_000.0), None);
    }

    #[test]
    fn test_feature_serializes_without_hook() {
        let feature = Feature::new("Projects", "projects")
            .value(3.0)
            .model("projects")
            .calc(|v| v * 2.0);
        let json = serde_json::to_value(&feature).unwrap();
        assert_eq!(json["id"], "projects");
        assert_eq!(json["model"], "projects");
        assert!(json.get("calc").is_none());
    }

    #[test]
    fn test_metered_feature() {
        let metered = MeteredFeature::new("Build minutes", "build_minutes")
            .metered_price("price_minutes")
            .metered_unit_price(Decimal::new(5, 3))
            .metered_unit("minute")
            .with_feature(|f| f.value(500.0));

        assert_eq!(metered.id(), "build_minutes");
        assert_eq!(metered.metered_id(), Some("price_minutes"));
        assert_eq!(metered.unit_price(), Some(Decimal::new(5, 3)));
        assert_eq!(metered.unit(), Some("minute"));
        assert_eq!(metered.as_feature().allowance(), 500.0);

        let json = serde_json::to_value(&metered).unwrap();
        assert_eq!(json["id"], "build_minutes");
        assert_eq!(json["metered_id"], "price_minutes");
    }
}
