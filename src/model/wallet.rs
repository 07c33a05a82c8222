use std::ops::{Add, Neg};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::fx::{FxError, FxRegistry};
use crate::model::amount::Amount;
use crate::model::currency::Currency;

/// A mapping from [`Currency`] to a held value, eg/ an account's cash balances across
/// currencies. Zero balances may be retained or pruned (see [`Wallet::prune`]) without affecting
/// equality: [`Wallet`]'s `PartialEq` compares only non-zero balances.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Wallet {
    balances: IndexMap<Currency, f64>,
}

impl Wallet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(currency: Currency, value: f64) -> Self {
        let mut wallet = Self::new();
        wallet.deposit(currency, value);
        wallet
    }

    pub fn balance(&self, currency: &Currency) -> f64 {
        self.balances.get(currency).copied().unwrap_or(0.0)
    }

    pub fn currencies(&self) -> impl Iterator<Item = &Currency> {
        self.balances.keys()
    }

    pub fn amounts(&self) -> impl Iterator<Item = Amount> + '_ {
        self.balances
            .iter()
            .map(|(ccy, value)| Amount::new(ccy.clone(), *value))
    }

    pub fn deposit(&mut self, currency: Currency, value: f64) {
        *self.balances.entry(currency).or_insert(0.0) += value;
    }

    pub fn withdraw(&mut self, currency: Currency, value: f64) {
        self.deposit(currency, -value);
    }

    /// Removes currencies whose balance is exactly zero. Never affects [`Wallet`] equality, which
    /// already ignores zero balances; this only controls the set iterated by [`Wallet::currencies`].
    pub fn prune(&mut self) {
        self.balances.retain(|_, value| *value != 0.0);
    }

    /// Converts the whole wallet into a single [`Amount`] in `to`, using `fx` at `time`.
    pub fn convert(
        &self,
        to: &Currency,
        time: DateTime<Utc>,
        fx: &FxRegistry,
    ) -> Result<Amount, FxError> {
        let mut total = 0.0;
        for (currency, value) in &self.balances {
            total += fx.convert(*value, currency, to, time)?;
        }
        Ok(Amount::new(to.clone(), total))
    }
}

impl PartialEq for Wallet {
    fn eq(&self, other: &Self) -> bool {
        let lhs: IndexMap<_, _> = self
            .balances
            .iter()
            .filter(|(_, v)| **v != 0.0)
            .collect();
        let rhs: IndexMap<_, _> = other
            .balances
            .iter()
            .filter(|(_, v)| **v != 0.0)
            .collect();
        lhs.len() == rhs.len() && lhs.iter().all(|(k, v)| rhs.get(*k) == Some(v))
    }
}

impl Add for Wallet {
    type Output = Wallet;

    fn add(mut self, rhs: Wallet) -> Wallet {
        for (currency, value) in rhs.balances {
            self.deposit(currency, value);
        }
        self
    }
}

impl Neg for Wallet {
    type Output = Wallet;

    fn neg(mut self) -> Wallet {
        for value in self.balances.values_mut() {
            *value = -*value;
        }
        self
    }
}
