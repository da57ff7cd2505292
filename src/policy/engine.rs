/// Rule evaluation and execution for taxed transfers
use crate::access::AccessControl;
use crate::crypto::{is_null, Address};
use crate::error::LedgerError;
use crate::events::LedgerEvent;
use crate::ledger::LedgerCore;
use crate::policy::types::{tax_amount, TaxCategory, TaxQuote, TaxRates};
use crate::Amount;

/// Evaluates pause, sell, trading-lock and tax rules for a proposed transfer
/// and drives [`LedgerCore`] with the outcome.
#[derive(Debug, Clone)]
pub struct TransferPolicyEngine {
    rates: TaxRates,
    tax_receiver: Address,
}

impl TransferPolicyEngine {
    pub fn new(rates: TaxRates, tax_receiver: Address) -> Self {
        Self {
            rates,
            tax_receiver,
        }
    }

    pub fn rates(&self) -> TaxRates {
        self.rates
    }

    pub fn tax_receiver(&self) -> Address {
        self.tax_receiver
    }

    pub fn set_rates(
        &mut self,
        rates: TaxRates,
        events: &mut Vec<LedgerEvent>,
    ) -> Result<(), LedgerError> {
        rates.validate()?;
        self.rates = rates;
        events.push(LedgerEvent::TaxesUpdated {
            buy: rates.buy,
            sell: rates.sell,
            wallet: rates.wallet,
        });
        Ok(())
    }

    /// Legality rules, applied in fixed order: pause, sell restriction,
    /// trading lock. A null `from` stands for minting.
    pub fn check_legality(
        &self,
        access: &AccessControl,
        from: &Address,
        to: &Address,
    ) -> Result<(), LedgerError> {
        if access.is_paused() {
            return Err(LedgerError::Paused);
        }

        if access.is_pool(to) && !(access.is_whitelisted(from) || access.is_owner(from)) {
            return Err(LedgerError::SellNotAllowed);
        }

        if access.is_trading_locked() {
            let exempt = access.is_whitelisted(from)
                || access.is_whitelisted(to)
                || access.is_owner(from)
                || access.is_owner(to)
                || is_null(from);
            if !exempt {
                return Err(LedgerError::TradingLocked);
            }
        }

        Ok(())
    }

    /// Tax classification only; no legality checks and no mutation.
    /// A transfer between two pools is a sell because the recipient is
    /// checked first.
    pub fn quote(
        &self,
        access: &AccessControl,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> TaxQuote {
        if access.is_excluded_from_tax(from) || access.is_excluded_from_tax(to) {
            return TaxQuote::untaxed(amount);
        }

        let category = if access.is_pool(to) {
            TaxCategory::Sell
        } else if access.is_pool(from) {
            TaxCategory::Buy
        } else {
            TaxCategory::Wallet
        };
        let rate_pct = self.rates.rate_for(category);
        let tax = tax_amount(amount, rate_pct);

        TaxQuote {
            category: Some(category),
            rate_pct,
            tax,
            net: amount - tax,
        }
    }

    /// Run the full pipeline: legality, classification, tax routing to the
    /// tax receiver, then the net transfer.
    pub fn execute(
        &self,
        access: &AccessControl,
        core: &mut LedgerCore,
        from: &Address,
        to: &Address,
        amount: Amount,
        events: &mut Vec<LedgerEvent>,
    ) -> Result<TaxQuote, LedgerError> {
        self.check_legality(access, from, to)?;

        if is_null(from) {
            return Err(LedgerError::ZeroAddress("transfer sender"));
        }
        if is_null(to) {
            return Err(LedgerError::ZeroAddress("transfer recipient"));
        }

        let have = core.balance_of(from);
        if have < amount {
            return Err(LedgerError::InsufficientBalance { have, need: amount });
        }

        let quote = self.quote(access, from, to, amount);

        if quote.tax > 0 {
            core.raw_transfer(from, &self.tax_receiver, quote.tax, events)?;
            if let Some(category) = quote.category {
                events.push(LedgerEvent::TaxCollected {
                    from: *from,
                    to: *to,
                    amount: quote.tax,
                    category,
                });
            }
        }

        core.raw_transfer(from, to, quote.net, events)?;
        Ok(quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{address_from_string, NULL_ADDRESS};

    struct Fixture {
        owner: Address,
        alice: Address,
        bob: Address,
        pool: Address,
        access: AccessControl,
        core: LedgerCore,
        engine: TransferPolicyEngine,
    }

    fn fixture(rates: TaxRates) -> Fixture {
        let owner = address_from_string("owner");
        let alice = address_from_string("alice");
        let bob = address_from_string("bob");
        let pool = address_from_string("pool");

        let mut access = AccessControl::new(owner, false);
        access.set_pool(&pool, &mut Vec::new()).unwrap();
        let mut core = LedgerCore::new(1_000_000);
        core.mint(&alice, 10_000, &mut Vec::new()).unwrap();
        core.mint(&pool, 10_000, &mut Vec::new()).unwrap();

        Fixture {
            owner,
            alice,
            bob,
            pool,
            access,
            core,
            engine: TransferPolicyEngine::new(rates, owner),
        }
    }

    #[test]
    fn test_sell_tax_routed_to_receiver() {
        let mut f = fixture(TaxRates::new(0, 5, 0).unwrap());
        f.access.update_whitelist(&f.alice, true, &mut Vec::new());
        let mut events = Vec::new();

        let quote = f
            .engine
            .execute(&f.access, &mut f.core, &f.alice, &f.pool, 1_000, &mut events)
            .unwrap();

        assert_eq!(quote.category, Some(TaxCategory::Sell));
        assert_eq!(quote.tax, 50);
        assert_eq!(f.core.balance_of(&f.pool), 10_950);
        assert_eq!(f.core.balance_of(&f.owner), 50);
        assert_eq!(f.core.balance_of(&f.alice), 9_000);
        assert_eq!(events.len(), 3);
        assert!(matches!(
            events[1],
            LedgerEvent::TaxCollected { amount: 50, category: TaxCategory::Sell, .. }
        ));
    }

    #[test]
    fn test_sell_requires_whitelist_or_owner() {
        let f = fixture(TaxRates::default());
        assert_eq!(
            f.engine.check_legality(&f.access, &f.alice, &f.pool),
            Err(LedgerError::SellNotAllowed)
        );
        assert!(f.engine.check_legality(&f.access, &f.owner, &f.pool).is_ok());
    }

    #[test]
    fn test_pause_precedes_other_rules() {
        let mut f = fixture(TaxRates::default());
        f.access.pause(&f.owner, &mut Vec::new()).unwrap();
        f.access.toggle_trading_lock(&mut Vec::new());
        assert_eq!(
            f.engine.check_legality(&f.access, &f.alice, &f.pool),
            Err(LedgerError::Paused)
        );
    }

    #[test]
    fn test_sell_rule_precedes_trading_lock() {
        let mut f = fixture(TaxRates::default());
        f.access.toggle_trading_lock(&mut Vec::new());
        assert_eq!(
            f.engine.check_legality(&f.access, &f.alice, &f.pool),
            Err(LedgerError::SellNotAllowed)
        );
        assert_eq!(
            f.engine.check_legality(&f.access, &f.alice, &f.bob),
            Err(LedgerError::TradingLocked)
        );
    }

    #[test]
    fn test_trading_lock_exemptions() {
        let mut f = fixture(TaxRates::default());
        f.access.toggle_trading_lock(&mut Vec::new());

        assert!(f.engine.check_legality(&f.access, &f.alice, &f.owner).is_ok());
        assert!(f.engine.check_legality(&f.access, &f.owner, &f.bob).is_ok());
        assert!(f.engine.check_legality(&f.access, &NULL_ADDRESS, &f.bob).is_ok());

        f.access.update_whitelist(&f.bob, true, &mut Vec::new());
        assert!(f.engine.check_legality(&f.access, &f.alice, &f.bob).is_ok());
    }

    #[test]
    fn test_classification_order() {
        let f = fixture(TaxRates::new(3, 7, 11).unwrap());
        let other_pool = address_from_string("pool2");
        let mut access = f.access.clone();
        access.set_pool(&other_pool, &mut Vec::new()).unwrap();

        let sell = f.engine.quote(&access, &f.alice, &f.pool, 100);
        let buy = f.engine.quote(&access, &f.pool, &f.alice, 100);
        let wallet = f.engine.quote(&access, &f.alice, &f.bob, 100);
        let pool_to_pool = f.engine.quote(&access, &other_pool, &f.pool, 100);

        assert_eq!((sell.category, sell.tax), (Some(TaxCategory::Sell), 7));
        assert_eq!((buy.category, buy.tax), (Some(TaxCategory::Buy), 3));
        assert_eq!((wallet.category, wallet.tax), (Some(TaxCategory::Wallet), 11));
        assert_eq!(pool_to_pool.category, Some(TaxCategory::Sell));
    }

    #[test]
    fn test_exclusion_zeroes_tax() {
        let mut f = fixture(TaxRates::new(25, 25, 25).unwrap());
        f.access.set_excluded(&f.bob, true, &mut Vec::new()).unwrap();

        let quote = f.engine.quote(&f.access, &f.alice, &f.bob, 1_000);
        assert_eq!(quote, TaxQuote::untaxed(1_000));

        let mut events = Vec::new();
        f.engine
            .execute(&f.access, &mut f.core, &f.alice, &f.bob, 1_000, &mut events)
            .unwrap();
        assert_eq!(f.core.balance_of(&f.bob), 1_000);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_insufficient_balance_moves_nothing() {
        let mut f = fixture(TaxRates::new(0, 0, 10).unwrap());
        let mut events = Vec::new();
        let result = f
            .engine
            .execute(&f.access, &mut f.core, &f.bob, &f.alice, 1, &mut events);

        assert_eq!(result, Err(LedgerError::InsufficientBalance { have: 0, need: 1 }));
        assert!(events.is_empty());
        assert_eq!(f.core.balance_of(&f.owner), 0);
    }

    #[test]
    fn test_null_recipient_rejected() {
        let mut f = fixture(TaxRates::default());
        let result = f.engine.execute(
            &f.access,
            &mut f.core,
            &f.alice,
            &NULL_ADDRESS,
            1,
            &mut Vec::new(),
        );
        assert!(matches!(result, Err(LedgerError::ZeroAddress(_))));
    }

    #[test]
    fn test_set_rates_validates() {
        let mut f = fixture(TaxRates::default());
        let mut events = Vec::new();
        let bad = TaxRates {
            buy: 26,
            sell: 0,
            wallet: 0,
        };
        assert!(f.engine.set_rates(bad, &mut events).is_err());
        assert_eq!(f.engine.rates(), TaxRates::default());
        assert!(events.is_empty());
    }
}
