#![forbid(unsafe_code)]
//! Run a scripted session against a token and print the outcome.

use clap::Parser;
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::Color as TableColor;
use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use levyledger::config::{load_config, resolve_identity, whole_tokens};
use levyledger::crypto::{is_null, short_hex};
use levyledger::token::DECIMALS;
use levyledger::{Address, Amount, EventSink, JsonLinesSink, LedgerEvent, TaxToken};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Token configuration file
    #[arg(short, long, default_value = "levy.toml")]
    config: PathBuf,
    /// JSON array of operations to apply in order
    #[arg(short, long)]
    script: Option<PathBuf>,
    /// Write committed records to this new JSON-lines file
    /// (overrides events.journal_path; the file must be empty)
    #[arg(short, long)]
    journal: Option<PathBuf>,
    /// Stop at the first rejected operation
    #[arg(long)]
    strict: bool,
    /// Log ledger internals at debug level
    #[arg(short, long)]
    verbose: bool,
}

/// One scripted call. Identities are labels or hex; amounts are whole tokens.
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Op {
    Transfer { caller: String, to: String, amount: u64 },
    TransferFrom { caller: String, from: String, to: String, amount: u64 },
    Approve { caller: String, spender: String, amount: u64 },
    IncreaseAllowance { caller: String, spender: String, amount: u64 },
    DecreaseAllowance { caller: String, spender: String, amount: u64 },
    Burn { caller: String, amount: u64 },
    BurnFrom { caller: String, account: String, amount: u64 },
    Mint { caller: String, to: String, amount: u64 },
    SetTaxes { caller: String, buy: u8, sell: u8, wallet: u8 },
    UpdateWhitelist { caller: String, account: String, status: bool },
    SetExcludedFromTax { caller: String, account: String, excluded: bool },
    SetPoolAddress { caller: String, pool: String },
    RemovePoolAddress { caller: String, pool: String },
    Pause { caller: String },
    Unpause { caller: String },
    ToggleTradingLock { caller: String },
    ToggleMintable { caller: String },
    TransferOwnership { caller: String, new_owner: String },
    RenounceOwnership { caller: String },
    UpdateTokenInfo { caller: String, logo_url: String, website: String, telegram: String },
    DepositForeign { asset: String, amount: u64 },
    DepositNative { amount: u64 },
    RescueForeignAsset { caller: String, asset: String, amount: u64 },
    RescueNative { caller: String, amount: u64 },
}

/// Resolves script identities and remembers their labels for display.
#[derive(Default)]
struct Labels {
    names: HashMap<Address, String>,
}

impl Labels {
    fn resolve(&mut self, id: &str) -> Result<Address, Box<dyn std::error::Error>> {
        let addr = resolve_identity(id)?;
        self.names
            .entry(addr)
            .or_insert_with(|| id.trim().to_string());
        Ok(addr)
    }

    fn name(&self, addr: &Address) -> String {
        if is_null(addr) {
            return "∅".to_string();
        }
        match self.names.get(addr) {
            Some(label) => label.clone(),
            None => short_hex(addr),
        }
    }
}

fn format_units(amount: Amount) -> String {
    let scale = 10u128.pow(DECIMALS as u32);
    let whole = amount / scale;
    let frac = amount % scale;
    if frac == 0 {
        whole.to_string()
    } else {
        let digits = format!("{:0width$}", frac, width = DECIMALS as usize);
        format!("{}.{}", whole, digits.trim_end_matches('0'))
    }
}

fn apply(
    token: &TaxToken,
    labels: &mut Labels,
    op: &Op,
) -> Result<String, Box<dyn std::error::Error>> {
    let outcome = match op {
        Op::Transfer { caller, to, amount } => {
            let quote = token.transfer(
                &labels.resolve(caller)?,
                &labels.resolve(to)?,
                whole_tokens(*amount)?,
            )?;
            format!("net {} / tax {}", format_units(quote.net), format_units(quote.tax))
        }
        Op::TransferFrom { caller, from, to, amount } => {
            let quote = token.transfer_from(
                &labels.resolve(caller)?,
                &labels.resolve(from)?,
                &labels.resolve(to)?,
                whole_tokens(*amount)?,
            )?;
            format!("net {} / tax {}", format_units(quote.net), format_units(quote.tax))
        }
        Op::Approve { caller, spender, amount } => {
            token.approve(
                &labels.resolve(caller)?,
                &labels.resolve(spender)?,
                whole_tokens(*amount)?,
            )?;
            "approved".to_string()
        }
        Op::IncreaseAllowance { caller, spender, amount } => {
            let now = token.increase_allowance(
                &labels.resolve(caller)?,
                &labels.resolve(spender)?,
                whole_tokens(*amount)?,
            )?;
            format!("allowance {}", format_units(now))
        }
        Op::DecreaseAllowance { caller, spender, amount } => {
            let now = token.decrease_allowance(
                &labels.resolve(caller)?,
                &labels.resolve(spender)?,
                whole_tokens(*amount)?,
            )?;
            format!("allowance {}", format_units(now))
        }
        Op::Burn { caller, amount } => {
            token.burn(&labels.resolve(caller)?, whole_tokens(*amount)?)?;
            "burned".to_string()
        }
        Op::BurnFrom { caller, account, amount } => {
            token.burn_from(
                &labels.resolve(caller)?,
                &labels.resolve(account)?,
                whole_tokens(*amount)?,
            )?;
            "burned".to_string()
        }
        Op::Mint { caller, to, amount } => {
            token.mint(
                &labels.resolve(caller)?,
                &labels.resolve(to)?,
                whole_tokens(*amount)?,
            )?;
            "minted".to_string()
        }
        Op::SetTaxes { caller, buy, sell, wallet } => {
            token.set_taxes(&labels.resolve(caller)?, *buy, *sell, *wallet)?;
            format!("buy {}% / sell {}% / wallet {}%", buy, sell, wallet)
        }
        Op::UpdateWhitelist { caller, account, status } => {
            token.update_whitelist(&labels.resolve(caller)?, &labels.resolve(account)?, *status)?;
            format!("whitelisted = {}", status)
        }
        Op::SetExcludedFromTax { caller, account, excluded } => {
            token.set_excluded_from_tax(
                &labels.resolve(caller)?,
                &labels.resolve(account)?,
                *excluded,
            )?;
            format!("excluded = {}", excluded)
        }
        Op::SetPoolAddress { caller, pool } => {
            token.set_pool_address(&labels.resolve(caller)?, &labels.resolve(pool)?)?;
            "pool set".to_string()
        }
        Op::RemovePoolAddress { caller, pool } => {
            let removed =
                token.remove_pool_address(&labels.resolve(caller)?, &labels.resolve(pool)?)?;
            let outcome = if removed { "pool removed" } else { "not a pool" };
            outcome.to_string()
        }
        Op::Pause { caller } => {
            token.pause(&labels.resolve(caller)?)?;
            "paused".to_string()
        }
        Op::Unpause { caller } => {
            token.unpause(&labels.resolve(caller)?)?;
            "unpaused".to_string()
        }
        Op::ToggleTradingLock { caller } => {
            let locked = token.toggle_trading_lock(&labels.resolve(caller)?)?;
            format!("trading locked = {}", locked)
        }
        Op::ToggleMintable { caller } => {
            let mintable = token.toggle_mintable(&labels.resolve(caller)?)?;
            format!("mintable = {}", mintable)
        }
        Op::TransferOwnership { caller, new_owner } => {
            token.transfer_ownership(&labels.resolve(caller)?, &labels.resolve(new_owner)?)?;
            "ownership transferred".to_string()
        }
        Op::RenounceOwnership { caller } => {
            token.renounce_ownership(&labels.resolve(caller)?)?;
            "ownership renounced".to_string()
        }
        Op::UpdateTokenInfo { caller, logo_url, website, telegram } => {
            token.update_token_info(&labels.resolve(caller)?, logo_url, website, telegram)?;
            "info updated".to_string()
        }
        Op::DepositForeign { asset, amount } => {
            token.deposit_foreign(&labels.resolve(asset)?, whole_tokens(*amount)?)?;
            "deposited".to_string()
        }
        Op::DepositNative { amount } => {
            token.deposit_native(whole_tokens(*amount)?)?;
            "deposited".to_string()
        }
        Op::RescueForeignAsset { caller, asset, amount } => {
            token.rescue_foreign_asset(
                &labels.resolve(caller)?,
                &labels.resolve(asset)?,
                whole_tokens(*amount)?,
            )?;
            "rescued".to_string()
        }
        Op::RescueNative { caller, amount } => {
            token.rescue_native(&labels.resolve(caller)?, whole_tokens(*amount)?)?;
            "rescued".to_string()
        }
    };
    Ok(outcome)
}

fn describe(event: &LedgerEvent, labels: &Labels) -> String {
    match event {
        LedgerEvent::Transfer { from, to, amount } => format!(
            "{} → {}: {}",
            labels.name(from),
            labels.name(to),
            format_units(*amount)
        ),
        LedgerEvent::Approval { owner, spender, amount } => format!(
            "{} allows {}: {}",
            labels.name(owner),
            labels.name(spender),
            format_units(*amount)
        ),
        LedgerEvent::WhitelistUpdated { account, status } => {
            format!("{} = {}", labels.name(account), status)
        }
        LedgerEvent::TaxCollected { from, to, amount, category } => format!(
            "{} tax {} on {} → {}",
            category,
            format_units(*amount),
            labels.name(from),
            labels.name(to)
        ),
        LedgerEvent::Paused { account } | LedgerEvent::Unpaused { account } => {
            format!("by {}", labels.name(account))
        }
        LedgerEvent::OwnershipTransferred { previous, new } => {
            format!("{} → {}", labels.name(previous), labels.name(new))
        }
        LedgerEvent::TaxesUpdated { buy, sell, wallet } => {
            format!("buy {}% / sell {}% / wallet {}%", buy, sell, wallet)
        }
        LedgerEvent::TradingLockToggled { locked } => format!("locked = {}", locked),
        LedgerEvent::MintableToggled { mintable } => format!("mintable = {}", mintable),
        LedgerEvent::TaxExclusionUpdated { account, excluded } => {
            format!("{} = {}", labels.name(account), excluded)
        }
        LedgerEvent::PoolAddressSet { pool } | LedgerEvent::PoolAddressRemoved { pool } => {
            labels.name(pool)
        }
        LedgerEvent::TokenInfoUpdated { website, .. } => website.clone(),
        LedgerEvent::ForeignAssetDeposited { asset, amount } => {
            format!("{}: {}", labels.name(asset), format_units(*amount))
        }
        LedgerEvent::NativeDeposited { amount } => format_units(*amount),
        LedgerEvent::ForeignAssetRescued { asset, to, amount } => format!(
            "{} {} → {}",
            format_units(*amount),
            labels.name(asset),
            labels.name(to)
        ),
        LedgerEvent::NativeRescued { to, amount } => {
            format!("{} → {}", format_units(*amount), labels.name(to))
        }
    }
}

fn header(titles: &[&str]) -> Vec<Cell> {
    titles
        .iter()
        .map(|t| {
            Cell::new(t)
                .fg(TableColor::Cyan)
                .add_attribute(Attribute::Bold)
        })
        .collect()
}

fn format_timestamp_short(timestamp_ms: i64) -> String {
    use chrono::DateTime;

    if let Some(dt) = DateTime::from_timestamp_millis(timestamp_ms) {
        dt.format("%H:%M:%S%.3f").to_string()
    } else {
        "Invalid".to_string()
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = load_config(&cli.config)?;
    let params = config.token.to_params()?;

    let mut labels = Labels::default();
    labels.resolve(&config.token.owner)?;
    for id in &config.token.whitelist {
        labels.resolve(id)?;
    }

    let journal = cli
        .journal
        .clone()
        .or_else(|| config.events.journal_path.as_ref().map(PathBuf::from));
    let token = match &journal {
        Some(path) => {
            let sink: Box<dyn EventSink> = Box::new(JsonLinesSink::open(path)?);
            TaxToken::with_sink(params, sink)?
        }
        None => TaxToken::new(params)?,
    };

    println!(
        "{}",
        format!("🪙 {} ({})", token.name(), token.symbol())
            .bright_magenta()
            .bold()
    );
    println!("{}", format!("   ledger id {}", short_hex(&token.ledger_id())).dimmed());
    println!();

    if let Some(script_path) = &cli.script {
        let script = std::fs::read_to_string(script_path)
            .map_err(|e| format!("Failed to read {}: {}", script_path.display(), e))?;
        let ops: Vec<Op> = serde_json::from_str(&script)?;

        for (i, op) in ops.iter().enumerate() {
            match apply(&token, &mut labels, op) {
                Ok(outcome) => println!("{} {:>3} {}", "✅".green(), i, outcome),
                Err(e) => {
                    println!("{} {:>3} {}", "❌".red(), i, e.to_string().red());
                    if cli.strict {
                        return Err(e);
                    }
                }
            }
        }
        println!();
    }

    let mut balances = Table::new();
    balances
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header(&["Account", "Balance", "Flags"]));
    for (account, balance) in token.accounts() {
        let mut flags = Vec::new();
        if token.owner() == Some(account) {
            flags.push("owner");
        }
        if token.is_whitelisted(&account) {
            flags.push("whitelisted");
        }
        if token.is_pool_address(&account) {
            flags.push("pool");
        }
        if token.is_excluded_from_tax(&account) {
            flags.push("tax-free");
        }
        balances.add_row(vec![
            Cell::new(labels.name(&account)).fg(TableColor::White),
            Cell::new(format_units(balance)).fg(TableColor::Green),
            Cell::new(flags.join(", ")).fg(TableColor::Grey),
        ]);
    }
    println!("{}", balances);
    println!();

    let mut events = Table::new();
    events
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header(&["Seq", "Event", "Details", "Time", "Hash"]));
    for record in token.events() {
        let color = match record.event {
            LedgerEvent::Transfer { .. } => TableColor::Green,
            LedgerEvent::TaxCollected { .. } => TableColor::Yellow,
            LedgerEvent::Approval { .. } => TableColor::Blue,
            _ => TableColor::Magenta,
        };
        let hash = record.hash_str();
        events.add_row(vec![
            Cell::new(format!("#{}", record.seq)).fg(TableColor::White),
            Cell::new(record.event.name()).fg(color),
            Cell::new(describe(&record.event, &labels)).fg(TableColor::White),
            Cell::new(format_timestamp_short(record.timestamp)).fg(TableColor::Grey),
            Cell::new(format!("{}...", &hash[..12])).fg(TableColor::Grey),
        ]);
    }
    println!("{}", events);
    println!();

    let numbers = token.numbers();
    println!(
        "{}",
        format!(
            "📊 Supply {} / {}   Taxes buy {}% sell {}% wallet {}%",
            format_units(numbers.total_supply),
            format_units(numbers.max_supply),
            numbers.buy_tax,
            numbers.sell_tax,
            numbers.wallet_tax
        )
        .bright_blue()
    );
    println!(
        "{}",
        format!(
            "   paused: {}  trading locked: {}  mintable: {}",
            token.is_paused(),
            token.is_trading_locked(),
            token.is_mintable()
        )
        .blue()
    );
    let pools: Vec<String> = token
        .pool_addresses()
        .iter()
        .map(|pool| labels.name(pool))
        .collect();
    if !pools.is_empty() {
        println!("{}", format!("   pools: {}", pools.join(", ")).blue());
    }

    match token.verify_audit_trail() {
        Ok(()) => println!("{}", "🔗 Event chain verified".green()),
        Err(e) => println!("{}", format!("⚠️  Event chain check failed: {}", e).red()),
    }
    if let Some(path) = journal {
        println!("{}", format!("📝 Journal: {}", path.display()).dimmed());
    }

    Ok(())
}
