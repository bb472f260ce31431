// Currency conversion for displayed prices. All stored prices are EUR-equivalent;
// the rate table is a compile-time constant keyed to EUR = 1.0 (known staleness
// limitation, see DESIGN.md).

use crate::storage::{StateStore, CURRENCY_KEY};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Eur,
    Usd,
    Try,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Unknown currency code: {0}")]
pub struct ParseCurrencyError(String);

impl Currency {
    // Conversion rate relative to the EUR baseline
    pub fn rate(&self) -> f64 {
        match self {
            Currency::Eur => 1.0,
            Currency::Usd => 1.09,
            Currency::Try => 48.5,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Eur => "EUR",
            Currency::Usd => "USD",
            Currency::Try => "TRY",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Eur => "€",
            Currency::Usd => "$",
            Currency::Try => "₺",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = ParseCurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "EUR" => Ok(Currency::Eur),
            "USD" => Ok(Currency::Usd),
            "TRY" => Ok(Currency::Try),
            other => Err(ParseCurrencyError(other.to_string())),
        }
    }
}

// Convert an amount between currencies: divide by the source rate, multiply by
// the target rate, relative to the fixed EUR baseline.
pub fn convert(amount: f64, from: Currency, to: Currency) -> f64 {
    amount / from.rate() * to.rate()
}

// The guest's selected display currency, persisted as a plain string key.
// Falls back to EUR when the stored value is missing or unparseable.
pub struct CurrencySelection {
    selected: RwLock<Currency>,
    store: Arc<dyn StateStore>,
}

impl CurrencySelection {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        let selected = match store.get(CURRENCY_KEY) {
            Some(code) => code.parse().unwrap_or_else(|e| {
                warn!("Stored currency preference invalid ({}), defaulting to EUR", e);
                Currency::Eur
            }),
            None => Currency::Eur,
        };
        Self {
            selected: RwLock::new(selected),
            store,
        }
    }

    pub fn selected(&self) -> Currency {
        *self.selected.read()
    }

    pub fn select(&self, currency: Currency) {
        *self.selected.write() = currency;
        self.store.set(CURRENCY_KEY, currency.code());
    }

    // Convert an amount from its source currency into the selected display currency
    pub fn convert_from(&self, amount: f64, from: Currency) -> f64 {
        convert(amount, from, self.selected())
    }

    // Format an amount (already in the display currency) with the currency symbol,
    // rounded to the nearest whole unit, e.g. "€545"
    pub fn format(&self, amount: f64) -> String {
        format!("{}{}", self.selected().symbol(), amount.round() as i64)
    }
}
