//! Integration tests for transfer rules, taxes and allowances

use levyledger::crypto::address_from_string;
use levyledger::token::{TaxToken, TokenParams};
use levyledger::{Address, LedgerError, LedgerEvent, TaxCategory};

fn id(label: &str) -> Address {
    address_from_string(label)
}

/// Token with a pool registered and alice holding 10_000 units
fn create_taxed_token(buy: u8, sell: u8, wallet: u8) -> Result<TaxToken, Box<dyn std::error::Error>> {
    let owner = id("owner");
    let params = TokenParams::new("Levy", "LEVY", 100_000, 100_000, owner)
        .with_taxes(buy, sell, wallet);
    let token = TaxToken::new(params)?;
    token.set_pool_address(&owner, &id("pool"))?;
    token.set_excluded_from_tax(&owner, &owner, true)?;
    token.transfer(&owner, &id("alice"), 10_000)?;
    token.set_excluded_from_tax(&owner, &owner, false)?;
    Ok(token)
}

#[test]
fn test_sell_tax_split() -> Result<(), Box<dyn std::error::Error>> {
    let token = create_taxed_token(0, 5, 0)?;
    token.update_whitelist(&id("owner"), &id("alice"), true)?;
    let owner_before = token.balance_of(&id("owner"));
    let log_before = token.events().len();

    let quote = token.transfer(&id("alice"), &id("pool"), 1_000)?;
    assert_eq!(quote.category, Some(TaxCategory::Sell));
    assert_eq!((quote.net, quote.tax), (950, 50));

    assert_eq!(token.balance_of(&id("pool")), 950);
    assert_eq!(token.balance_of(&id("owner")), owner_before + 50);
    assert_eq!(token.balance_of(&id("alice")), 9_000);

    // Tax transfer, tax record, then the net transfer
    let records = token.events();
    let emitted: Vec<&LedgerEvent> = records[log_before..].iter().map(|r| &r.event).collect();
    assert_eq!(emitted.len(), 3);
    assert_eq!(
        emitted[0],
        &LedgerEvent::Transfer {
            from: id("alice"),
            to: id("owner"),
            amount: 50,
        }
    );
    assert_eq!(
        emitted[1],
        &LedgerEvent::TaxCollected {
            from: id("alice"),
            to: id("pool"),
            amount: 50,
            category: TaxCategory::Sell,
        }
    );
    assert_eq!(
        emitted[2],
        &LedgerEvent::Transfer {
            from: id("alice"),
            to: id("pool"),
            amount: 950,
        }
    );

    Ok(())
}

#[test]
fn test_buy_and_wallet_tax() -> Result<(), Box<dyn std::error::Error>> {
    let token = create_taxed_token(3, 0, 10)?;
    token.update_whitelist(&id("owner"), &id("alice"), true)?;
    token.transfer(&id("alice"), &id("pool"), 1_000)?;

    let buy = token.transfer(&id("pool"), &id("bob"), 100)?;
    assert_eq!((buy.category, buy.tax), (Some(TaxCategory::Buy), 3));

    let wallet = token.transfer(&id("alice"), &id("bob"), 99)?;
    assert_eq!((wallet.category, wallet.tax, wallet.net), (Some(TaxCategory::Wallet), 9, 90));
    assert_eq!(token.balance_of(&id("bob")), 97 + 90);

    Ok(())
}

#[test]
fn test_exclusion_means_zero_tax() -> Result<(), Box<dyn std::error::Error>> {
    let token = create_taxed_token(25, 25, 25)?;
    token.set_excluded_from_tax(&id("owner"), &id("bob"), true)?;
    let before = token.events().len();

    let quote = token.transfer(&id("alice"), &id("bob"), 1_000)?;
    assert_eq!(quote.tax, 0);
    assert_eq!(quote.category, None);
    assert_eq!(token.balance_of(&id("bob")), 1_000);
    assert_eq!(token.events().len(), before + 1);

    Ok(())
}

#[test]
fn test_only_whitelisted_can_sell() -> Result<(), Box<dyn std::error::Error>> {
    let token = create_taxed_token(0, 0, 0)?;

    assert_eq!(
        token.transfer(&id("alice"), &id("pool"), 1),
        Err(LedgerError::SellNotAllowed)
    );
    token.update_whitelist(&id("owner"), &id("alice"), true)?;
    token.transfer(&id("alice"), &id("pool"), 1)?;

    // Removing the pool turns it back into an ordinary wallet
    assert_eq!(token.pool_addresses(), vec![id("pool")]);
    assert!(token.remove_pool_address(&id("owner"), &id("pool"))?);
    assert!(token.pool_addresses().is_empty());
    assert!(!token.remove_pool_address(&id("owner"), &id("pool"))?);
    token.update_whitelist(&id("owner"), &id("alice"), false)?;
    token.transfer(&id("alice"), &id("pool"), 1)?;

    Ok(())
}

#[test]
fn test_trading_lock() -> Result<(), Box<dyn std::error::Error>> {
    let token = create_taxed_token(0, 0, 0)?;
    let owner = id("owner");

    assert!(token.toggle_trading_lock(&owner)?);
    assert!(!token.is_sell_allowed(&id("alice")));
    assert!(token.is_sell_allowed(&owner));

    assert_eq!(
        token.transfer(&id("alice"), &id("bob"), 1),
        Err(LedgerError::TradingLocked)
    );
    // Owner on either side is exempt
    token.transfer(&id("alice"), &owner, 1)?;
    token.transfer(&owner, &id("bob"), 1)?;
    // So is a whitelisted recipient
    token.update_whitelist(&owner, &id("carol"), true)?;
    token.transfer(&id("alice"), &id("carol"), 1)?;

    assert!(!token.toggle_trading_lock(&owner)?);
    token.transfer(&id("alice"), &id("bob"), 1)?;

    Ok(())
}

#[test]
fn test_preview_matches_execution() -> Result<(), Box<dyn std::error::Error>> {
    let token = create_taxed_token(0, 0, 7)?;
    let preview = token.preview_tax(&id("alice"), &id("bob"), 1_234);
    let executed = token.transfer(&id("alice"), &id("bob"), 1_234)?;
    assert_eq!(preview, executed);
    Ok(())
}

#[test]
fn test_failed_transfer_changes_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let token = create_taxed_token(0, 0, 10)?;
    let before_events = token.events().len();
    let before_owner = token.balance_of(&id("owner"));

    let result = token.transfer(&id("alice"), &id("bob"), 10_001);
    assert_eq!(
        result,
        Err(LedgerError::InsufficientBalance {
            have: 10_000,
            need: 10_001,
        })
    );
    assert_eq!(token.balance_of(&id("alice")), 10_000);
    assert_eq!(token.balance_of(&id("owner")), before_owner);
    assert_eq!(token.events().len(), before_events);

    Ok(())
}

#[test]
fn test_approve_overwrites() -> Result<(), Box<dyn std::error::Error>> {
    let token = create_taxed_token(0, 0, 0)?;
    let (alice, spender) = (id("alice"), id("spender"));

    token.approve(&alice, &spender, 100)?;
    token.approve(&alice, &spender, 30)?;
    assert_eq!(token.allowance_of(&alice, &spender), 30);

    assert_eq!(token.increase_allowance(&alice, &spender, 20)?, 50);
    assert_eq!(token.decrease_allowance(&alice, &spender, 50)?, 0);
    assert!(matches!(
        token.decrease_allowance(&alice, &spender, 1),
        Err(LedgerError::InsufficientAllowance { .. })
    ));

    Ok(())
}

#[test]
fn test_transfer_from_spends_gross_amount() -> Result<(), Box<dyn std::error::Error>> {
    let token = create_taxed_token(0, 0, 10)?;
    let (alice, spender, bob) = (id("alice"), id("spender"), id("bob"));

    token.approve(&alice, &spender, 1_000)?;
    let quote = token.transfer_from(&spender, &alice, &bob, 1_000)?;

    assert_eq!(quote.net, 900);
    assert_eq!(token.balance_of(&bob), 900);
    assert_eq!(token.allowance_of(&alice, &spender), 0);

    // Policy failures come before allowance failures
    token.pause(&id("owner"))?;
    assert_eq!(
        token.transfer_from(&spender, &alice, &bob, 1),
        Err(LedgerError::Paused)
    );

    Ok(())
}

#[test]
fn test_burn_from() -> Result<(), Box<dyn std::error::Error>> {
    let token = create_taxed_token(0, 0, 0)?;
    let (alice, spender) = (id("alice"), id("spender"));

    assert!(matches!(
        token.burn_from(&spender, &alice, 1),
        Err(LedgerError::InsufficientAllowance { .. })
    ));

    token.approve(&alice, &spender, 400)?;
    token.burn_from(&spender, &alice, 400)?;
    assert_eq!(token.balance_of(&alice), 9_600);
    assert_eq!(token.total_supply(), 99_600);
    assert_eq!(token.allowance_of(&alice, &spender), 0);

    Ok(())
}

#[test]
fn test_supply_conserved_by_transfers() -> Result<(), Box<dyn std::error::Error>> {
    let token = create_taxed_token(5, 5, 5)?;
    token.update_whitelist(&id("owner"), &id("alice"), true)?;

    token.transfer(&id("alice"), &id("pool"), 3_333)?;
    token.transfer(&id("pool"), &id("bob"), 777)?;
    token.transfer(&id("bob"), &id("carol"), 101)?;

    let sum: u128 = token.accounts().iter().map(|(_, b)| *b).sum();
    assert_eq!(sum, token.total_supply());
    assert_eq!(token.total_supply(), 100_000);

    Ok(())
}
