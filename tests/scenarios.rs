//! The six literal scenarios from spec §8, exercised against the public crate surface.

use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal_macros::dec;

use roboquant::account::model::{CashAccount, MarginAccount};
use roboquant::convert::circuit_breaker::CircuitBreaker;
use roboquant::convert::flex::FlexConverter;
use roboquant::convert::SignalConverter;
use roboquant::data::store::HistoricPriceStore;
use roboquant::engine;
use roboquant::event::{Event, PriceBarData, PriceItem};
use roboquant::execution::broker::SimBroker;
use roboquant::execution::fees::NoFee;
use roboquant::execution::pricing::NoCostPricing;
use roboquant::fx::{FxRegistry, StaticFxTable};
use roboquant::model::asset::Asset;
use roboquant::model::currency::Currency;
use roboquant::model::size::Size;
use roboquant::model::wallet::Wallet;
use roboquant::order::{Instruction, OrderStatus, SingleOrder};
use roboquant::statistic::{Journal, MemoryLogger, MetricsJournal};
use roboquant::strategy::ema_crossover::EmaCrossover;
use roboquant::strategy::random::RandomStrategy;
use roboquant::strategy::{Signal, Strategy};

fn fx() -> FxRegistry {
    FxRegistry::new(Arc::new(StaticFxTable::new()))
}

fn bar(asset: Asset, close: f64, time: chrono::DateTime<Utc>) -> PriceItem {
    PriceItem::PriceBar {
        asset,
        bar: PriceBarData {
            open: close,
            high: close,
            low: close,
            close,
            volume: 1_000.0,
            span: Duration::minutes(1),
        },
    }
}

fn broker(base_currency: Currency, deposit: f64, model: Arc<dyn roboquant::account::model::AccountModel>, time: chrono::DateTime<Utc>) -> SimBroker {
    SimBroker::new(
        base_currency.clone(),
        Wallet::single(base_currency, deposit),
        model,
        Arc::new(NoCostPricing),
        Arc::new(NoFee),
        fx(),
        time,
    )
}

/// 1. EMA flat feed: 200 flat PriceBars emit zero signals; cash/positions are unchanged.
#[test]
fn ema_flat_feed_emits_no_signals_and_leaves_account_unchanged() {
    let now = Utc::now();
    let asset = Asset::stock("ABC");
    let mut strategy = EmaCrossover::new(12, 26);
    let mut broker = broker(Currency::usd(), 1_000_000.0, Arc::new(CashAccount::new(fx())), now);

    for step in 0..200 {
        let time = now + Duration::minutes(step);
        let event = Event::new(time, vec![bar(asset.clone(), 100.0, time)]);
        let signals = strategy.create_signals(&event);
        assert!(signals.is_empty(), "flat feed must never trigger an EMA crossover");
        broker.place(vec![]);
        broker.sync(&event);
    }

    let account = broker.account();
    assert_eq!(account.cash.balance(&Currency::usd()), 1_000_000.0);
    assert!(account.positions.is_empty());
}

/// 2. Single market order: +10 TEST at 100 against a 100_000 USD CashAccount.
#[test]
fn single_market_order_fills_and_updates_cash_and_buying_power() {
    let now = Utc::now();
    let asset = Asset::stock("TEST");
    let mut broker = broker(Currency::usd(), 100_000.0, Arc::new(CashAccount::new(fx())), now);

    broker.place(vec![Instruction::Single(SingleOrder::market(asset.clone(), Size::new(dec!(10))))]);
    let account = broker.sync(&Event::new(now, vec![bar(asset.clone(), 100.0, now)]));

    let position = account.position_of(&asset).unwrap();
    assert_eq!(position.size, Size::new(dec!(10)));
    assert_eq!(position.avg_price, 100.0);

    assert_eq!(account.closed_orders.len(), 1);
    assert_eq!(account.closed_orders[0].status, OrderStatus::Completed);

    assert_eq!(account.trades.len(), 1);
    assert_eq!(account.trades[0].size, Size::new(dec!(10)));
    assert_eq!(account.trades[0].price, 100.0);

    assert_eq!(account.cash.balance(&Currency::usd()), 99_000.0);
    assert_eq!(account.buying_power.value, 99_000.0);
}

/// 3. Margin long: 1_000_000 JPY deposit, leverage 2, ABC(JPY) @ 1000, order +500.
#[test]
fn margin_long_matches_leverage_formula() {
    let now = Utc::now();
    let asset = Asset::new("ABC", roboquant::model::asset::AssetType::Stock, Currency::jpy(), "TSE");
    let mut broker = broker(Currency::jpy(), 1_000_000.0, Arc::new(MarginAccount::new(2.0, fx())), now);

    broker.place(vec![Instruction::Single(SingleOrder::market(asset.clone(), Size::new(dec!(500))))]);
    let account = broker.sync(&Event::new(now, vec![bar(asset.clone(), 1000.0, now)]));

    assert_eq!(account.cash.balance(&Currency::jpy()), 500_000.0);
    assert_eq!(account.equity_amount(&fx()).unwrap().value, 1_000_000.0);
    assert_eq!(account.buying_power.value, 1_500_000.0);
}

/// 4. Short with margin: 20_000 USD deposit, leverage 2, ABC @ 200, order -50, then flattened.
#[test]
fn short_with_margin_matches_leverage_formula_and_flattens_cleanly() {
    let now = Utc::now();
    let asset = Asset::stock("ABC");
    let model: Arc<dyn roboquant::account::model::AccountModel> = Arc::new(MarginAccount::new(2.0, fx()));
    let mut broker = broker(Currency::usd(), 20_000.0, model, now);

    broker.place(vec![Instruction::Single(SingleOrder::market(asset.clone(), Size::new(dec!(-50))))]);
    let account = broker.sync(&Event::new(now, vec![bar(asset.clone(), 200.0, now)]));

    assert_eq!(account.cash.balance(&Currency::usd()), 30_000.0);
    assert_eq!(account.equity_amount(&fx()).unwrap().value, 20_000.0);
    assert_eq!(account.buying_power.value, 30_000.0);

    let later = now + Duration::minutes(1);
    broker.place(vec![Instruction::Single(SingleOrder::market(asset.clone(), Size::new(dec!(50))))]);
    let account = broker.sync(&Event::new(later, vec![bar(asset, 200.0, later)]));

    assert_eq!(account.cash.balance(&Currency::usd()), 20_000.0);
    assert!(account.position_of(&Asset::stock("ABC")).map(|p| p.is_closed()).unwrap_or(true));
}

/// 5. Bracket order OCO: entry fills at 100, a later bar with high 111 fills the take-profit and
/// cancels the stop-loss; net pnl = 100 * (110 - 100).
#[test]
fn bracket_order_take_profit_fills_and_cancels_stop_loss() {
    let now = Utc::now();
    let asset = Asset::stock("T");
    let mut broker = broker(Currency::usd(), 100_000.0, Arc::new(CashAccount::new(fx())), now);

    broker.place(vec![Instruction::Bracket {
        entry: SingleOrder::market(asset.clone(), Size::new(dec!(100))),
        take_profit: SingleOrder::limit(asset.clone(), Size::new(dec!(-100)), 110.0),
        stop_loss: SingleOrder::stop(asset.clone(), Size::new(dec!(-100)), 90.0),
    }]);
    broker.sync(&Event::new(now, vec![bar(asset.clone(), 100.0, now)]));

    let later = now + Duration::minutes(1);
    let account = broker.sync(&Event::new(
        later,
        vec![PriceItem::PriceBar {
            asset: asset.clone(),
            bar: PriceBarData {
                open: 100.0,
                high: 111.0,
                low: 99.0,
                close: 105.0,
                volume: 1_000.0,
                span: Duration::minutes(1),
            },
        }],
    ));

    assert!(account.position_of(&asset).map(|p| p.is_closed()).unwrap_or(true));
    let pnl: f64 = account.trades.iter().map(|t| t.pnl).sum();
    assert_eq!(pnl, 100.0 * (110.0 - 100.0));

    let stop_leg = account
        .closed_orders
        .iter()
        .find(|o| matches!(o.kind, roboquant::order::OrderKind::Stop { .. }))
        .unwrap();
    assert_eq!(stop_leg.status, OrderStatus::Cancelled);
}

/// 6. Circuit breaker: 100 signals within an hour are capped at 5 placed orders.
#[test]
fn circuit_breaker_caps_orders_within_the_window() {
    let now = Utc::now();
    let asset = Asset::stock("TEST");
    let account = {
        let broker = broker(Currency::usd(), 100_000.0, Arc::new(CashAccount::new(fx())), now);
        broker.account()
    };

    let inner: Box<dyn SignalConverter> = Box::new(FlexConverter::new(fx()).unwrap());
    let mut breaker = CircuitBreaker::new(inner, 5, Duration::hours(1));

    let mut placed = 0usize;
    for minute in 0..100 {
        let time = now + Duration::seconds(minute * 30);
        let event = Event::new(time, vec![bar(asset.clone(), 100.0, time)]);
        let signal = Signal::entry(asset.clone(), 1.0);
        let instructions = breaker.convert(vec![signal], &account, &event);
        placed += instructions.len();
    }

    assert!(placed <= 5, "circuit breaker must cap placed orders at max_orders within the window");

    let after_window = now + Duration::hours(2);
    let event = Event::new(after_window, vec![bar(asset.clone(), 100.0, after_window)]);
    let instructions = breaker.convert(vec![Signal::entry(asset, 1.0)], &account, &event);
    assert!(!instructions.is_empty(), "signals must flow again once the window has elapsed");
}

/// Exercises the full [`engine::run_async`] loop end to end with a deterministic random
/// strategy, confirming the journal observes one metrics snapshot per delivered event.
#[tokio::test]
async fn run_loop_drains_the_feed_and_journals_every_step() {
    let now = Utc::now();
    let asset = Asset::stock("AAA");
    let mut store = HistoricPriceStore::new();
    for step in 0..10 {
        let time = now + Duration::minutes(step);
        store.add(time, bar(asset.clone(), 100.0 + step as f64, time));
    }

    let fx = fx();
    let broker = broker(Currency::usd(), 100_000.0, Arc::new(CashAccount::new(fx.clone())), now);
    let logger = Arc::new(MemoryLogger::new(None));
    let journal: Box<dyn Journal> = Box::new(MetricsJournal::new("scenario", fx.clone(), logger.clone()));

    let account = engine::run_async(
        Arc::new(store),
        Box::new(RandomStrategy::new(1.0, 1).unwrap()),
        Box::new(FlexConverter::new(fx).unwrap()),
        broker,
        journal,
        None,
        Some("scenario".to_string()),
    )
    .await;

    assert_eq!(account.base_currency, Currency::usd());
    let equity = logger.get_metric("account.equity", Some("scenario")).unwrap();
    assert_eq!(equity.len(), 10);
}
