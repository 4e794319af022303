//! Type conversion functions for Shopify Storefront API responses.
//!
//! This is the only place where nullable or loosely typed remote fields are
//! resolved into the strict `lookout_core` schema.

pub mod cart;
pub mod collections;
pub mod products;

use lookout_core::Money;

use crate::shopify::ShopifyError;
use crate::shopify::types::MoneyV2;

pub use cart::{convert_cart, convert_user_errors};
pub use collections::convert_collection;
pub use products::{convert_product, convert_products};

/// Parse a `MoneyV2` into exact decimal money.
pub fn convert_money(money: &MoneyV2) -> Result<Money, ShopifyError> {
    Ok(Money::parse(&money.amount, &money.currency_code)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_money_any_store_currency() {
        let money = MoneyV2 {
            amount: "1499.00".to_string(),
            currency_code: "SEK".to_string(),
        };
        let money = convert_money(&money).unwrap();
        assert_eq!(money.currency_code.code(), "SEK");
        assert_eq!(money.display(), "1499.00 SEK");
    }

    #[test]
    fn test_convert_money_invalid_amount() {
        let money = MoneyV2 {
            amount: "not-a-number".to_string(),
            currency_code: "GBP".to_string(),
        };
        assert!(matches!(
            convert_money(&money),
            Err(ShopifyError::InvalidMoney(_))
        ));
    }
}
