//! Configuration management for LevyLedger
//!
//! A token is described by a TOML file. Amounts are given in whole tokens and
//! scaled by `10^decimals`; identities are either 64 hex characters or a
//! free-form label hashed into an address.

use crate::crypto::{address_from_hex, address_from_string, Address};
use crate::error::{LedgerError, Result};
use crate::token::{TokenParams, DECIMALS};
use crate::Amount;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub token: TokenConfig,
    #[serde(default)]
    pub events: EventsConfig,
}

#[derive(Debug, Deserialize)]
pub struct TokenConfig {
    pub name: String,
    pub symbol: String,
    pub owner: String,
    pub initial_supply: u64,
    /// Defaults to the initial supply.
    #[serde(default)]
    pub max_supply: Option<u64>,
    #[serde(default)]
    pub whitelist: Vec<String>,
    #[serde(default)]
    pub buy_tax: u8,
    #[serde(default)]
    pub sell_tax: u8,
    #[serde(default)]
    pub wallet_tax: u8,
    #[serde(default)]
    pub logo_url: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub telegram: String,
    #[serde(default)]
    pub trading_locked: bool,
    #[serde(default)]
    pub mintable: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct EventsConfig {
    /// JSON-lines journal that every committed batch is appended to.
    #[serde(default)]
    pub journal_path: Option<String>,
}

impl Config {
    pub fn from_toml(config_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(config_str)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.token.owner.trim().is_empty() {
            return Err(LedgerError::Config(
                "token.owner must be set in the config file".to_string(),
            ));
        }
        if let Some(max) = self.token.max_supply {
            if self.token.initial_supply > max {
                return Err(LedgerError::Config(
                    "token.initial_supply exceeds token.max_supply".to_string(),
                ));
            }
        }
        if let Some(path) = &self.events.journal_path {
            if path.trim().is_empty() {
                return Err(LedgerError::Config(
                    "events.journal_path must not be empty when set".to_string(),
                ));
            }
        }
        Ok(())
    }
}

impl TokenConfig {
    pub fn to_params(&self) -> Result<TokenParams> {
        let initial_supply = whole_tokens(self.initial_supply)?;
        let max_supply = whole_tokens(self.max_supply.unwrap_or(self.initial_supply))?;
        let whitelist = self
            .whitelist
            .iter()
            .map(|id| resolve_identity(id))
            .collect::<Result<Vec<_>>>()?;

        Ok(
            TokenParams::new(
                &self.name,
                &self.symbol,
                initial_supply,
                max_supply,
                resolve_identity(&self.owner)?,
            )
            .with_whitelist(whitelist)
            .with_taxes(self.buy_tax, self.sell_tax, self.wallet_tax)
            .with_info(&self.logo_url, &self.website, &self.telegram)
            .trading_locked(self.trading_locked)
            .mintable(self.mintable),
        )
    }
}

/// Scale a whole-token count to base units.
pub fn whole_tokens(whole: u64) -> Result<Amount> {
    Amount::from(whole)
        .checked_mul(10u128.pow(DECIMALS as u32))
        .ok_or(LedgerError::Overflow)
}

/// 64 hex characters (optionally `0x`-prefixed) decode directly; anything
/// else is treated as a label.
pub fn resolve_identity(id: &str) -> Result<Address> {
    let trimmed = id.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    if digits.len() == 64 && digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return address_from_hex(digits);
    }
    if trimmed.is_empty() {
        return Err(LedgerError::Config("Empty identity".to_string()));
    }
    Ok(address_from_string(trimmed))
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    let config_str = fs::read_to_string(path).map_err(|e| {
        LedgerError::Config(format!("Failed to read {}: {}", path.display(), e))
    })?;
    Config::from_toml(&config_str)
}
