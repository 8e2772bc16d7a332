//! Billing-specific error types.
//!
//! Errors raised by the subscription actions. They convert into
//! [`SaasError`](crate::error::SaasError) for HTTP responses.

use std::fmt;

use crate::error::SaasError;

/// Billing-specific errors.
#[derive(Debug)]
pub enum BillingError {
    // Trial errors
    /// The billable entity has already consumed its trial.
    TrialAlreadyUsed { billable_id: String },

    // Catalog errors
    /// No plan is registered under the id.
    PlanNotFound { plan_id: String },
    /// No item is registered under the id.
    ItemNotFound { item_id: String },
    /// A metered feature on the plan has no metered price id.
    MissingMeteredPrice { plan_id: String, feature_id: String },

    // Payment errors
    /// A paid subscription was requested without a payment method on file.
    NoPaymentMethod { billable_id: String },

    // Checkout errors
    /// The configured redirect URL cannot be resolved.
    InvalidRedirectUrl { url: String, reason: String },

    // Trial errors
    /// The configured trial length does not fit in a timestamp.
    InvalidTrialLength { days: u32 },

    /// A collaborator call failed.
    Collaborator(SaasError),
}

impl fmt::Display for BillingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TrialAlreadyUsed { billable_id } => {
                write!(f, "Trial already used by '{}'", billable_id)
            }
            Self::PlanNotFound { plan_id } => {
                write!(f, "Plan not found: {}", plan_id)
            }
            Self::ItemNotFound { item_id } => {
                write!(f, "Item not found: {}", item_id)
            }
            Self::MissingMeteredPrice { plan_id, feature_id } => {
                write!(
                    f,
                    "Metered feature '{}' on plan '{}' has no metered price",
                    feature_id, plan_id
                )
            }
            Self::NoPaymentMethod { billable_id } => {
                write!(f, "No payment method on file for '{}'", billable_id)
            }
            Self::InvalidRedirectUrl { url, reason } => {
                write!(f, "Invalid redirect URL '{}': {}", url, reason)
            }
            Self::InvalidTrialLength { days } => {
                write!(f, "Trial length of {} days is out of range", days)
            }
            Self::Collaborator(err) => fmt::Display::fmt(err, f),
        }
    }
}

impl std::error::Error for BillingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Collaborator(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SaasError> for BillingError {
    fn from(err: SaasError) -> Self {
        Self::Collaborator(err)
    }
}

impl From<BillingError> for SaasError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::TrialAlreadyUsed { .. } => SaasError::Forbidden(err.to_string()),

            BillingError::PlanNotFound { .. } | BillingError::ItemNotFound { .. } => {
                SaasError::NotFound(err.to_string())
            }

            BillingError::NoPaymentMethod { .. } => SaasError::BadRequest(err.to_string()),

            // Misconfigured catalog or settings
            BillingError::MissingMeteredPrice { .. }
            | BillingError::InvalidRedirectUrl { .. }
            | BillingError::InvalidTrialLength { .. } => SaasError::Internal(err.to_string()),

            BillingError::Collaborator(inner) => inner,
        }
    }
}

impl BillingError {
    /// Check if this is a client error (4xx).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::TrialAlreadyUsed { .. }
            | Self::PlanNotFound { .. }
            | Self::ItemNotFound { .. }
            | Self::NoPaymentMethod { .. } => true,
            Self::Collaborator(err) => err.status_code().is_client_error(),
            _ => false,
        }
    }
}

/// Result type for subscription actions.
pub type Result<T> = std::result::Result<T, BillingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BillingError::TrialAlreadyUsed {
            billable_id: "user_1".to_string(),
        };
        assert_eq!(err.to_string(), "Trial already used by 'user_1'");

        let err = BillingError::MissingMeteredPrice {
            plan_id: "price_pro".to_string(),
            feature_id: "build_minutes".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Metered feature 'build_minutes' on plan 'price_pro' has no metered price"
        );
    }

    #[test]
    fn test_error_classification() {
        let err = BillingError::PlanNotFound {
            plan_id: "test".to_string(),
        };
        assert!(err.is_client_error());

        let err = BillingError::InvalidRedirectUrl {
            url: "/subscription".to_string(),
            reason: "relative URL without a base".to_string(),
        };
        assert!(!err.is_client_error());

        let err = BillingError::InvalidTrialLength { days: u32::MAX };
        assert!(!err.is_client_error());

        let err = BillingError::Collaborator(SaasError::bad_request("card declined"));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_convert_to_saas_error() {
        let err: SaasError = BillingError::TrialAlreadyUsed {
            billable_id: "user_1".to_string(),
        }
        .into();
        assert!(matches!(err, SaasError::Forbidden(_)));

        let err: SaasError = BillingError::NoPaymentMethod {
            billable_id: "user_1".to_string(),
        }
        .into();
        assert!(matches!(err, SaasError::BadRequest(_)));

        let err: SaasError = BillingError::ItemNotFound {
            item_id: "credits".to_string(),
        }
        .into();
        assert!(matches!(err, SaasError::NotFound(_)));
    }

    #[test]
    fn test_collaborator_error_passes_through() {
        let err: BillingError = SaasError::service_unavailable("provider down").into();
        assert!(std::error::Error::source(&err).is_some());

        let err: SaasError = err.into();
        assert!(matches!(err, SaasError::ServiceUnavailable(_)));
    }
}
