/// Tax types for LevyLedger transfers
use crate::error::LedgerError;
use crate::Amount;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Highest tax rate, in whole percent, any direction may carry.
pub const MAX_TAX_PCT: u8 = 25;

/// Direction a transfer is classified under for taxation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxCategory {
    /// Recipient is a pool
    Sell,
    /// Sender is a pool
    Buy,
    /// Neither endpoint is a pool
    Wallet,
}

impl TaxCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaxCategory::Sell => "sell",
            TaxCategory::Buy => "buy",
            TaxCategory::Wallet => "wallet",
        }
    }
}

impl fmt::Display for TaxCategory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-direction tax rates in whole percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaxRates {
    pub buy: u8,
    pub sell: u8,
    pub wallet: u8,
}

impl TaxRates {
    pub fn new(buy: u8, sell: u8, wallet: u8) -> Result<Self, LedgerError> {
        let rates = TaxRates { buy, sell, wallet };
        rates.validate()?;
        Ok(rates)
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        for (label, rate) in [("buy", self.buy), ("sell", self.sell), ("wallet", self.wallet)] {
            if rate > MAX_TAX_PCT {
                return Err(LedgerError::Validation(format!(
                    "{} tax {}% exceeds maximum of {}%",
                    label, rate, MAX_TAX_PCT
                )));
            }
        }
        Ok(())
    }

    pub fn rate_for(&self, category: TaxCategory) -> u8 {
        match category {
            TaxCategory::Sell => self.sell,
            TaxCategory::Buy => self.buy,
            TaxCategory::Wallet => self.wallet,
        }
    }
}

/// `floor(amount * rate / 100)` without the intermediate product overflowing.
pub fn tax_amount(amount: Amount, rate_pct: u8) -> Amount {
    let rate = rate_pct as Amount;
    (amount / 100) * rate + (amount % 100) * rate / 100
}

/// Outcome of tax classification for one proposed transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxQuote {
    /// `None` when either endpoint is excluded from tax.
    pub category: Option<TaxCategory>,
    pub rate_pct: u8,
    pub tax: Amount,
    pub net: Amount,
}

impl TaxQuote {
    pub fn untaxed(amount: Amount) -> Self {
        TaxQuote {
            category: None,
            rate_pct: 0,
            tax: 0,
            net: amount,
        }
    }
}
