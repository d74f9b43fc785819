//! In-memory host for tests: mock storage and address codec plus a bank that
//! keeps balances in a map.

use std::collections::BTreeMap;

use cosmwasm_std::testing::{MockApi, MockStorage};
use cosmwasm_std::{Addr, Coin, StdError, StdResult, Uint128};

use crate::bank::{BankKeeper, FarmingDeps, FarmingDepsMut};

#[derive(Debug, Default, Clone)]
pub struct MemoryBank {
    balances: BTreeMap<Addr, BTreeMap<String, Uint128>>,
}

impl MemoryBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint coins into an account.
    pub fn fund(&mut self, address: &Addr, coins: &[Coin]) {
        let account = self.balances.entry(address.clone()).or_default();
        for coin in coins {
            *account.entry(coin.denom.clone()).or_default() += coin.amount;
        }
    }

    pub fn amount_of(&self, address: &Addr, denom: &str) -> Uint128 {
        self.balances
            .get(address)
            .and_then(|account| account.get(denom))
            .copied()
            .unwrap_or_default()
    }
}

impl BankKeeper for MemoryBank {
    fn send_coins(&mut self, from: &Addr, to: &Addr, amount: &[Coin]) -> StdResult<()> {
        for coin in amount {
            let available = self.amount_of(from, &coin.denom);
            if available < coin.amount {
                return Err(StdError::generic_err(format!(
                    "insufficient funds: {} has {}{}, needs {}",
                    from, available, coin.denom, coin.amount
                )));
            }
        }
        for coin in amount.iter().filter(|c| !c.amount.is_zero()) {
            let sender = self.balances.entry(from.clone()).or_default();
            let left = sender.get(&coin.denom).copied().unwrap_or_default() - coin.amount;
            if left.is_zero() {
                sender.remove(&coin.denom);
            } else {
                sender.insert(coin.denom.clone(), left);
            }
            self.fund(to, std::slice::from_ref(coin));
        }
        Ok(())
    }

    fn all_balances(&self, address: &Addr) -> StdResult<Vec<Coin>> {
        Ok(self
            .balances
            .get(address)
            .map(|account| {
                account
                    .iter()
                    .filter(|(_, amount)| !amount.is_zero())
                    .map(|(denom, amount)| Coin::new(*amount, denom.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    fn balance(&self, address: &Addr, denom: &str) -> StdResult<Coin> {
        Ok(Coin::new(self.amount_of(address, denom), denom))
    }
}

/// Owned storage, api and bank, lent out as [`FarmingDepsMut`].
pub struct MockFarmingDeps {
    pub storage: MockStorage,
    pub api: MockApi,
    pub bank: MemoryBank,
}

impl MockFarmingDeps {
    pub fn as_mut(&mut self) -> FarmingDepsMut<'_> {
        FarmingDepsMut {
            storage: &mut self.storage,
            api: &self.api,
            bank: &mut self.bank,
        }
    }

    pub fn as_ref(&self) -> FarmingDeps<'_> {
        FarmingDeps {
            storage: &self.storage,
            api: &self.api,
            bank: &self.bank,
        }
    }
}

pub fn mock_farming_deps() -> MockFarmingDeps {
    MockFarmingDeps {
        storage: MockStorage::new(),
        api: MockApi::default(),
        bank: MemoryBank::new(),
    }
}
