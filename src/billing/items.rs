//! One-off purchasable items.

use rust_decimal::Decimal;
use serde::Serialize;

/// Currency used when neither the item nor the catalog names one.
pub const DEFAULT_CURRENCY: &str = "EUR";

/// A one-off purchasable product.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    /// Upper-case ISO currency code.
    pub currency: String,
}

impl Item {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        price: Decimal,
        currency: impl AsRef<str>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            currency: currency.as_ref().to_ascii_uppercase(),
        }
    }

    #[must_use]
    pub fn is_free(&self) -> bool {
        self.price.is_zero()
    }
}
