use std::str::FromStr;

use bigdecimal::BigDecimal;

use super::money::round_money;

pub const FREE_SHIPPING_THRESHOLD_KEY: &str = "free_shipping_threshold";
pub const SHIPPING_RATE_KEY: &str = "shipping_rate";
pub const MIN_ORDER_AMOUNT_KEY: &str = "min_order_amount";

const DEFAULT_FREE_SHIPPING_THRESHOLD: i32 = 1000;
const DEFAULT_SHIPPING_RATE: i32 = 100;
const DEFAULT_MIN_ORDER_AMOUNT: i32 = 0;

/// Store-wide checkout settings.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSettings {
    pub free_shipping_threshold: BigDecimal,
    pub shipping_rate: BigDecimal,
    pub min_order_amount: BigDecimal,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            free_shipping_threshold: BigDecimal::from(DEFAULT_FREE_SHIPPING_THRESHOLD),
            shipping_rate: BigDecimal::from(DEFAULT_SHIPPING_RATE),
            min_order_amount: BigDecimal::from(DEFAULT_MIN_ORDER_AMOUNT),
        }
    }
}

impl StoreSettings {
    /// Build settings from stored key-value pairs. Missing keys and values
    /// that do not parse as decimals keep their defaults; unknown keys are
    /// ignored. Amounts are rounded to cents.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut settings = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                FREE_SHIPPING_THRESHOLD_KEY => &mut settings.free_shipping_threshold,
                SHIPPING_RATE_KEY => &mut settings.shipping_rate,
                MIN_ORDER_AMOUNT_KEY => &mut settings.min_order_amount,
                _ => continue,
            };
            match BigDecimal::from_str(value.trim()) {
                Ok(parsed) => *slot = round_money(&parsed),
                Err(_) => log::warn!("Ignoring unparsable setting {key}={value:?}, using default"),
            }
        }
        settings
    }

    pub fn shipping_cost_for(&self, subtotal: &BigDecimal) -> BigDecimal {
        if subtotal >= &self.free_shipping_threshold {
            BigDecimal::from(0)
        } else {
            self.shipping_rate.clone()
        }
    }
}
