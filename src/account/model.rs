//! Pluggable buying-power rules (spec §4.8 "Account Model").

use std::fmt::Debug;

use crate::account::internal::InternalAccount;
use crate::fx::FxRegistry;
use crate::model::amount::Amount;

/// Recomputes `internal.buying_power` from the rest of the portfolio. Implementations must be
/// pure functions of `internal`'s current state — no I/O, no hidden state beyond configuration.
pub trait AccountModel: Debug + Send + Sync {
    fn update_account(&self, internal: &mut InternalAccount);

    /// Whether this model permits a position to go short. `CashAccount` forbids it; brokers and
    /// converters consult this before accepting a short entry (spec §4.8).
    fn allows_short(&self) -> bool;
}

/// `buying_power = cash.convert(base, last_update)` (spec §4.8). Shorting is not permitted.
#[derive(Debug, Clone)]
pub struct CashAccount {
    fx: FxRegistry,
}

impl CashAccount {
    pub fn new(fx: FxRegistry) -> Self {
        Self { fx }
    }
}

impl AccountModel for CashAccount {
    fn update_account(&self, internal: &mut InternalAccount) {
        match internal
            .cash
            .convert(&internal.base_currency, internal.last_update, &self.fx)
        {
            Ok(amount) => internal.buying_power = amount,
            Err(error) => {
                tracing::warn!(%error, "CashAccount failed to convert cash balance, leaving buying power unchanged");
            }
        }
    }

    fn allows_short(&self) -> bool {
        false
    }
}

/// `buying_power = equity * leverage - |exposure|`, where `exposure` sums `|marketValue|` across
/// positions converted into the base currency (spec §4.8). Allows short positions; a maintenance
/// breach surfaces as negative buying power rather than being enforced here.
#[derive(Debug, Clone)]
pub struct MarginAccount {
    pub leverage: f64,
    fx: FxRegistry,
}

impl MarginAccount {
    pub fn new(leverage: f64, fx: FxRegistry) -> Self {
        Self { leverage, fx }
    }
}

impl AccountModel for MarginAccount {
    fn update_account(&self, internal: &mut InternalAccount) {
        let mut equity_wallet = internal.cash.clone();
        let mut exposure = 0.0;
        for position in internal.positions.values() {
            equity_wallet.deposit(position.asset.currency.clone(), position.market_value());
            match self.fx.convert(
                position.market_value().abs(),
                &position.asset.currency,
                &internal.base_currency,
                internal.last_update,
            ) {
                Ok(value) => exposure += value,
                Err(error) => {
                    tracing::warn!(%error, asset = %position.asset, "MarginAccount failed to convert position exposure");
                }
            }
        }

        let equity = match equity_wallet.convert(&internal.base_currency, internal.last_update, &self.fx) {
            Ok(amount) => amount,
            Err(error) => {
                tracing::warn!(%error, "MarginAccount failed to convert equity, leaving buying power unchanged");
                return;
            }
        };

        internal.buying_power = Amount::new(
            internal.base_currency.clone(),
            equity.value * self.leverage - exposure,
        );
    }

    fn allows_short(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::position::Position;
    use crate::fx::StaticFxTable;
    use crate::model::asset::Asset;
    use crate::model::currency::Currency;
    use crate::model::size::Size;
    use crate::model::wallet::Wallet;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn fx() -> FxRegistry {
        FxRegistry::new(Arc::new(StaticFxTable::new()))
    }

    #[test]
    fn cash_account_buying_power_equals_cash() {
        let mut internal = InternalAccount::new(
            Currency::usd(),
            Wallet::single(Currency::usd(), 99_000.0),
            Utc::now(),
        );
        let model = CashAccount::new(fx());
        model.update_account(&mut internal);
        assert_eq!(internal.buying_power.value, 99_000.0);
    }

    #[test]
    fn margin_account_long_matches_scenario_3() {
        // deposit 1_000_000 JPY, leverage 2, asset ABC(JPY) at price 1000, order +500 filled.
        let mut internal = InternalAccount::new(
            Currency::jpy(),
            Wallet::single(Currency::jpy(), 500_000.0),
            Utc::now(),
        );
        let asset = Asset::new("ABC", crate::model::asset::AssetType::Stock, Currency::jpy(), "TSE");
        internal.set_position(Position::new(asset, Size::new(dec!(500)), 1000.0, Utc::now()));

        let model = MarginAccount::new(2.0, fx());
        model.update_account(&mut internal);

        assert_eq!(internal.buying_power.value, 1_500_000.0);
    }

    #[test]
    fn margin_account_short_matches_scenario_4() {
        // deposit 20_000 USD, leverage 2, asset ABC at 200, order -50 filled.
        let mut internal = InternalAccount::new(
            Currency::usd(),
            Wallet::single(Currency::usd(), 30_000.0),
            Utc::now(),
        );
        let asset = Asset::stock("ABC");
        internal.set_position(Position::new(asset, Size::new(dec!(-50)), 200.0, Utc::now()));

        let model = MarginAccount::new(2.0, fx());
        model.update_account(&mut internal);

        assert_eq!(internal.buying_power.value, 30_000.0);
    }
}
