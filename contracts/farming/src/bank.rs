use cosmwasm_std::{Addr, Api, Coin, StdResult, Storage};

/// Ledger of fungible balances. The engine never moves coins itself; every
/// custody change goes through this seam.
pub trait BankKeeper {
    fn send_coins(&mut self, from: &Addr, to: &Addr, amount: &[Coin]) -> StdResult<()>;

    fn all_balances(&self, address: &Addr) -> StdResult<Vec<Coin>>;

    fn balance(&self, address: &Addr, denom: &str) -> StdResult<Coin>;
}

/// Read-only view of the host: storage, address codec and ledger.
#[derive(Clone, Copy)]
pub struct FarmingDeps<'a> {
    pub storage: &'a dyn Storage,
    pub api: &'a dyn Api,
    pub bank: &'a dyn BankKeeper,
}

pub struct FarmingDepsMut<'a> {
    pub storage: &'a mut dyn Storage,
    pub api: &'a dyn Api,
    pub bank: &'a mut dyn BankKeeper,
}

impl<'a> FarmingDepsMut<'a> {
    pub fn as_ref(&'_ self) -> FarmingDeps<'_> {
        FarmingDeps {
            storage: self.storage,
            api: self.api,
            bank: self.bank,
        }
    }

    pub fn branch(&'_ mut self) -> FarmingDepsMut<'_> {
        FarmingDepsMut {
            storage: self.storage,
            api: self.api,
            bank: self.bank,
        }
    }
}
