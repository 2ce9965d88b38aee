//! # Configuration State
//!
//! Shop-facing settings derived from [`AppConfig`] at startup.
//!
//! ## Thread Safety
//! Configuration is read-only after initialization, so no mutex needed.

use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use filamento_core::{Money, QuotationDefaults, QuotationForm};

/// Settings the screens read.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigState {
    /// Currency symbol (for display)
    pub currency_symbol: String,

    /// Currency code (ISO 4217)
    pub currency_code: String,

    /// Materials at or below this quantity are flagged `low`
    pub low_stock_threshold: f64,

    /// Values a fresh quotation form starts with
    pub quotation_defaults: QuotationDefaults,
}

impl Default for ConfigState {
    /// Chilean pesos, 200 g low-stock line, stock quotation defaults.
    fn default() -> Self {
        ConfigState {
            currency_symbol: "$".to_string(),
            currency_code: "CLP".to_string(),
            low_stock_threshold: 200.0,
            quotation_defaults: QuotationDefaults::default(),
        }
    }
}

impl From<&AppConfig> for ConfigState {
    fn from(config: &AppConfig) -> Self {
        ConfigState {
            currency_symbol: config.currency_symbol.clone(),
            currency_code: config.currency_code.clone(),
            low_stock_threshold: config.low_stock_threshold,
            quotation_defaults: config.quotation_defaults,
        }
    }
}

impl ConfigState {
    /// A quotation form seeded with the configured defaults.
    pub fn new_quotation_form(&self) -> QuotationForm {
        QuotationForm::with_defaults(&self.quotation_defaults)
    }

    /// Formats an amount the way the screens show it.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let config = ConfigState::default();
    /// assert_eq!(config.format_currency(Money::from_units(2309)), "$2.309 CLP");
    /// ```
    pub fn format_currency(&self, amount: Money) -> String {
        let grouped = amount.abs().to_string();
        let digits = grouped.trim_start_matches('$');

        format!(
            "{}{}{} {}",
            if amount.is_negative() { "-" } else { "" },
            self.currency_symbol,
            digits,
            self.currency_code
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency_positive() {
        let config = ConfigState::default();
        assert_eq!(config.format_currency(Money::from_units(2309)), "$2.309 CLP");
        assert_eq!(config.format_currency(Money::from_units(100)), "$100 CLP");
        assert_eq!(config.format_currency(Money::zero()), "$0 CLP");
    }

    #[test]
    fn test_format_currency_negative() {
        let config = ConfigState::default();
        assert_eq!(config.format_currency(Money::from_units(-25_000)), "-$25.000 CLP");
    }

    #[test]
    fn test_format_currency_custom_symbol() {
        let config = ConfigState {
            currency_symbol: "US$".to_string(),
            currency_code: "USD".to_string(),
            ..ConfigState::default()
        };
        assert_eq!(config.format_currency(Money::from_units(1_234_567)), "US$1.234.567 USD");
    }

    #[test]
    fn test_new_form_uses_defaults() {
        let config = ConfigState::default();
        let form = config.new_quotation_form();
        assert_eq!(form.machine_power, "150");
        assert_eq!(form.margin_percent, "300");
    }
}
