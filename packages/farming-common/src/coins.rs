//! Integer and decimal coin arithmetic.
//!
//! Decimal coin lists are kept sorted by denom with no zero entries, so two
//! lists holding the same value always compare equal. Every operation is
//! checked; overflow surfaces as an error instead of wrapping.

use std::collections::BTreeSet;

use cosmwasm_std::{
    Coin, Coins, DecCoin, Decimal256, StdError, StdResult, Uint128, Uint256,
};

/// 10^18, the fixed-point scale of `Decimal256`.
const DECIMAL_FRACTIONAL: Uint256 = Uint256::from_u128(1_000_000_000_000_000_000u128);

/// Coins must be non-empty, positive and carry each denom once.
pub fn validate_coins(coins: &[Coin]) -> StdResult<()> {
    if coins.is_empty() {
        return Err(StdError::generic_err("coins must not be empty"));
    }
    let mut seen = BTreeSet::new();
    for coin in coins {
        if coin.denom.is_empty() {
            return Err(StdError::generic_err("coin denom must not be empty"));
        }
        if coin.amount.is_zero() {
            return Err(StdError::generic_err(format!(
                "coin amount must be positive: {}",
                coin
            )));
        }
        if !seen.insert(coin.denom.as_str()) {
            return Err(StdError::generic_err(format!(
                "duplicate denom {}",
                coin.denom
            )));
        }
    }
    Ok(())
}

/// Convert a `Decimal256` to `Uint128` by truncating the fractional part.
pub fn decimal256_to_uint128(d: Decimal256) -> StdResult<Uint128> {
    Ok(Uint128::try_from(d.atomics() / DECIMAL_FRACTIONAL)?)
}

pub fn amount_of(coins: &[Coin], denom: &str) -> Uint128 {
    coins
        .iter()
        .find(|c| c.denom == denom)
        .map(|c| c.amount)
        .unwrap_or_default()
}

pub fn dec_amount_of(coins: &[DecCoin], denom: &str) -> Decimal256 {
    coins
        .iter()
        .find(|c| c.denom == denom)
        .map(|c| c.amount)
        .unwrap_or_else(Decimal256::zero)
}

/// Sum two coin lists. The result is sorted and free of zero amounts.
pub fn add_coins(a: &[Coin], b: &[Coin]) -> StdResult<Vec<Coin>> {
    let mut total = Coins::default();
    for coin in a.iter().chain(b) {
        total.add(coin.clone())?;
    }
    Ok(total.into_vec())
}

/// `a - b`, failing if any denom of `b` exceeds `a`.
pub fn sub_coins(a: &[Coin], b: &[Coin]) -> StdResult<Vec<Coin>> {
    let mut total = Coins::default();
    for coin in a {
        total.add(coin.clone())?;
    }
    for coin in b {
        total.sub(coin.clone())?;
    }
    Ok(total.into_vec())
}

/// True when `balances` hold at least `required` of every denom.
pub fn is_all_gte(balances: &[Coin], required: &[Coin]) -> bool {
    required
        .iter()
        .all(|c| amount_of(balances, &c.denom) >= c.amount)
}

/// Multiply every coin by `ratio`, truncating, and drop what truncates to zero.
pub fn mul_coins_truncate(coins: &[Coin], ratio: Decimal256) -> StdResult<Vec<Coin>> {
    let mut out = Vec::with_capacity(coins.len());
    for coin in coins {
        let scaled = Decimal256::from_ratio(coin.amount, 1u128).checked_mul(ratio)?;
        let amount = decimal256_to_uint128(scaled)?;
        if !amount.is_zero() {
            out.push(Coin::new(amount, coin.denom.clone()));
        }
    }
    Ok(out)
}

/// Multiply every coin by a whole number.
pub fn mul_coins(coins: &[Coin], factor: u64) -> StdResult<Vec<Coin>> {
    coins
        .iter()
        .map(|c| {
            let amount = c.amount.checked_mul(Uint128::from(factor))?;
            Ok(Coin::new(amount, c.denom.clone()))
        })
        .collect()
}

pub fn coins_to_dec_coins(coins: &[Coin]) -> Vec<DecCoin> {
    let mut out: Vec<DecCoin> = coins
        .iter()
        .filter(|c| !c.amount.is_zero())
        .map(|c| DecCoin::new(Decimal256::from_ratio(c.amount, 1u128), c.denom.clone()))
        .collect();
    out.sort_by(|a, b| a.denom.cmp(&b.denom));
    out
}

/// Divide every coin by `divisor`, truncated to 18 fractional digits.
pub fn quo_coins(coins: &[Coin], divisor: Uint128) -> StdResult<Vec<DecCoin>> {
    let mut out = Vec::with_capacity(coins.len());
    for coin in coins {
        let amount = Decimal256::checked_from_ratio(coin.amount, divisor).map_err(|e| {
            StdError::generic_err(format!("cannot divide {} by {}: {}", coin, divisor, e))
        })?;
        if !amount.is_zero() {
            out.push(DecCoin::new(amount, coin.denom.clone()));
        }
    }
    out.sort_by(|a, b| a.denom.cmp(&b.denom));
    Ok(out)
}

pub fn add_dec_coins(a: &[DecCoin], b: &[DecCoin]) -> StdResult<Vec<DecCoin>> {
    let mut out: Vec<DecCoin> = a.to_vec();
    for coin in b {
        match out.iter_mut().find(|c| c.denom == coin.denom) {
            Some(existing) => existing.amount = existing.amount.checked_add(coin.amount)?,
            None => out.push(coin.clone()),
        }
    }
    Ok(normalize(out))
}

/// `a - b`, failing if any denom of `b` exceeds `a`.
pub fn sub_dec_coins(a: &[DecCoin], b: &[DecCoin]) -> StdResult<Vec<DecCoin>> {
    let mut out: Vec<DecCoin> = a.to_vec();
    for coin in b {
        match out.iter_mut().find(|c| c.denom == coin.denom) {
            Some(existing) => existing.amount = existing.amount.checked_sub(coin.amount)?,
            None if coin.amount.is_zero() => {}
            None => {
                return Err(StdError::generic_err(format!(
                    "cannot subtract {}{}: denom missing",
                    coin.amount, coin.denom
                )))
            }
        }
    }
    Ok(normalize(out))
}

/// `a - b` clamped at zero per denom.
pub fn sub_dec_coins_saturating(a: &[DecCoin], b: &[DecCoin]) -> Vec<DecCoin> {
    let out = a
        .iter()
        .map(|c| {
            let amount = c.amount.saturating_sub(dec_amount_of(b, &c.denom));
            DecCoin::new(amount, c.denom.clone())
        })
        .collect();
    normalize(out)
}

pub fn mul_dec_coins(coins: &[DecCoin], amount: Uint128) -> StdResult<Vec<DecCoin>> {
    let factor = Decimal256::from_ratio(amount, 1u128);
    let mut out = Vec::with_capacity(coins.len());
    for coin in coins {
        out.push(DecCoin::new(coin.amount.checked_mul(factor)?, coin.denom.clone()));
    }
    Ok(normalize(out))
}

/// Truncate decimal coins to integer coins, dropping what truncates to zero.
pub fn truncate_dec_coins(coins: &[DecCoin]) -> StdResult<Vec<Coin>> {
    let mut out = Vec::with_capacity(coins.len());
    for coin in coins {
        let amount = decimal256_to_uint128(coin.amount)?;
        if !amount.is_zero() {
            out.push(Coin::new(amount, coin.denom.clone()));
        }
    }
    Ok(out)
}

pub fn coins_to_string(coins: &[Coin]) -> String {
    coins
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn normalize(mut coins: Vec<DecCoin>) -> Vec<DecCoin> {
    coins.retain(|c| !c.amount.is_zero());
    coins.sort_by(|a, b| a.denom.cmp(&b.denom));
    coins
}
