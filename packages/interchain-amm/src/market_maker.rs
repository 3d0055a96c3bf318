use std::collections::BTreeSet;

use cosmwasm_std::{ensure, Coin, Decimal256, Uint128, Uint256};

use crate::{
    error::AmmError,
    math::{mul_ceil, mul_floor, pow, ratio},
    pool::{InterchainLiquidityPool, PoolAsset},
    slippage::{check_slippage, ensure_tolerance},
};

/// Fee rates are expressed in basis points.
pub const FEE_DENOMINATOR: u32 = 10_000;

/// Weighted constant-value pricing over a pool snapshot.
///
/// Every method is read-only and returns the proposed delta. Applying it to
/// the pool is up to the caller once the matching packet round-trip commits.
pub struct InterchainMarketMaker<'a> {
    pool: &'a InterchainLiquidityPool,
    fee_rate: u32,
}

impl<'a> InterchainMarketMaker<'a> {
    pub fn new(pool: &'a InterchainLiquidityPool, fee_rate: u32) -> Result<Self, AmmError> {
        ensure!(fee_rate < FEE_DENOMINATOR, AmmError::InvalidFee(fee_rate));
        Ok(InterchainMarketMaker { pool, fee_rate })
    }

    pub fn pool(&self) -> &InterchainLiquidityPool {
        self.pool
    }

    pub fn fee_rate(&self) -> u32 {
        self.fee_rate
    }

    fn fee(&self) -> Decimal256 {
        Decimal256::from_ratio(self.fee_rate, FEE_DENOMINATOR)
    }

    fn minus_fees(&self, amount: Uint128) -> Result<Uint128, AmmError> {
        Ok(amount.checked_multiply_ratio(FEE_DENOMINATOR - self.fee_rate, FEE_DENOMINATOR)?)
    }

    fn normalized_weight(&self, asset: &PoolAsset) -> Result<Decimal256, AmmError> {
        Ok(Decimal256::checked_from_ratio(
            asset.weight,
            self.pool.total_weight(),
        )?)
    }

    fn asset_pair(
        &self,
        denom_in: &str,
        denom_out: &str,
    ) -> Result<(&PoolAsset, &PoolAsset), AmmError> {
        ensure!(
            denom_in != denom_out,
            AmmError::InvalidDenomPair {
                denom_in: denom_in.to_string(),
                denom_out: denom_out.to_string(),
            }
        );
        Ok((self.pool.find_asset(denom_in)?, self.pool.find_asset(denom_out)?))
    }

    /// `balance(a) * weight(b) / (balance(b) * weight(a))`
    pub fn market_price(&self, denom_a: &str, denom_b: &str) -> Result<Decimal256, AmmError> {
        let asset_a = self.pool.find_asset(denom_a)?;
        let asset_b = self.pool.find_asset(denom_b)?;
        ensure!(
            !asset_b.balance.is_zero(),
            AmmError::InsufficientLiquidity {
                denom: asset_b.denom.clone(),
                requested: Uint128::zero(),
                available: asset_b.balance,
            }
        );

        let numerator = Uint256::from(asset_a.balance).checked_mul(Uint256::from(asset_b.weight))?;
        let denominator =
            Uint256::from(asset_b.balance).checked_mul(Uint256::from(asset_a.weight))?;

        Ok(Decimal256::checked_from_ratio(numerator, denominator)?)
    }

    /// Exact input: `Ao = Bo * (1 - (Bi / (Bi + Ai * (1 - fee))) ^ (Wi / Wo))`
    pub fn left_swap(&self, token_in: &Coin, denom_out: &str) -> Result<Coin, AmmError> {
        let (asset_in, asset_out) = self.asset_pair(&token_in.denom, denom_out)?;
        ensure!(
            !token_in.amount.is_zero(),
            AmmError::ZeroAmount {
                denom: token_in.denom.clone(),
            }
        );

        let amount_in = self.minus_fees(token_in.amount)?;
        let base = ratio(asset_in.balance, asset_in.balance.checked_add(amount_in)?)?;
        let exponent = Decimal256::checked_from_ratio(asset_in.weight, asset_out.weight)?;
        let factor = pow(base, exponent)?;

        let amount_out = mul_floor(asset_out.balance, Decimal256::one().checked_sub(factor)?)?;

        ensure!(
            amount_out < asset_out.balance,
            AmmError::InsufficientLiquidity {
                denom: denom_out.to_string(),
                requested: amount_out,
                available: asset_out.balance,
            }
        );
        ensure!(
            !amount_out.is_zero(),
            AmmError::ZeroOutput {
                denom: denom_out.to_string(),
            }
        );

        Ok(Coin::new(amount_out, denom_out))
    }

    /// Exact output: `Ai = Bi * ((Bo / (Bo - Ao)) ^ (Wo / Wi) - 1) / (1 - fee)`,
    /// rounded up so the pool never gives away value.
    pub fn right_swap(&self, denom_in: &str, token_out: &Coin) -> Result<Coin, AmmError> {
        let (asset_in, asset_out) = self.asset_pair(denom_in, &token_out.denom)?;
        ensure!(
            !token_out.amount.is_zero(),
            AmmError::ZeroAmount {
                denom: token_out.denom.clone(),
            }
        );
        ensure!(
            token_out.amount < asset_out.balance,
            AmmError::InsufficientLiquidity {
                denom: token_out.denom.clone(),
                requested: token_out.amount,
                available: asset_out.balance,
            }
        );

        let remaining = ratio(
            asset_out.balance.checked_sub(token_out.amount)?,
            asset_out.balance,
        )?;
        let exponent = Decimal256::checked_from_ratio(asset_out.weight, asset_in.weight)?;
        let factor = pow(remaining, exponent)?;
        let growth = Decimal256::one()
            .checked_sub(factor)?
            .checked_div(factor)?;

        let net_in = mul_ceil(asset_in.balance, growth)?.max(Uint128::one());
        let keep = Uint128::from(FEE_DENOMINATOR - self.fee_rate);
        let gross_in = net_in
            .checked_mul(Uint128::from(FEE_DENOMINATOR))?
            .checked_add(keep.checked_sub(Uint128::one())?)?
            .checked_div(keep)?;

        Ok(Coin::new(gross_in, denom_in))
    }

    /// Pool shares minted for a one-sided contribution.
    ///
    /// While the pool is not active the shares follow the genesis rule
    /// `total_balance * weight / total_weight`. Afterwards they follow the
    /// weighted-product invariant, charging the fee on the implicitly swapped
    /// part: `S * ((1 + A * (1 - fee * (1 - Wn)) / B) ^ Wn - 1)`.
    pub fn deposit_single_asset(&self, token: &Coin) -> Result<Coin, AmmError> {
        let asset = self.pool.find_asset(&token.denom)?;
        ensure!(
            !token.amount.is_zero(),
            AmmError::ZeroAmount {
                denom: token.denom.clone(),
            }
        );

        let shares = if self.pool.is_active() {
            let supply = self.pool.supply.amount;
            ensure!(
                !supply.is_zero() && !asset.balance.is_zero(),
                AmmError::InsufficientLiquidity {
                    denom: asset.denom.clone(),
                    requested: token.amount,
                    available: asset.balance,
                }
            );

            let weight = self.normalized_weight(asset)?;
            let charged = self
                .fee()
                .checked_mul(Decimal256::one().checked_sub(weight)?)?;
            let effective = mul_floor(token.amount, Decimal256::one().checked_sub(charged)?)?;

            let base = ratio(asset.balance.checked_add(effective)?, asset.balance)?;
            let growth = pow(base, weight)?.checked_sub(Decimal256::one())?;
            mul_floor(supply, growth)?
        } else {
            self.pool
                .total_balance()?
                .checked_multiply_ratio(asset.weight, self.pool.total_weight())?
        };

        ensure!(
            !shares.is_zero(),
            AmmError::ZeroOutput {
                denom: self.pool.supply.denom.clone(),
            }
        );

        Ok(Coin::new(shares, self.pool.supply.denom.clone()))
    }

    /// Pool shares minted for a contribution covering every pool asset, one
    /// coin per token in the order given. Each share coin is credited to the
    /// party that contributed the matching token.
    pub fn deposit_multi_asset(
        &self,
        tokens: &[Coin],
        tolerance_bps: u32,
    ) -> Result<Vec<Coin>, AmmError> {
        ensure_tolerance(tolerance_bps)?;
        ensure!(
            tokens.len() == self.pool.assets.len(),
            AmmError::MismatchedAssets {
                expected: self.pool.assets.len(),
                actual: tokens.len(),
            }
        );

        let mut seen = BTreeSet::new();
        let mut pairs = Vec::with_capacity(tokens.len());
        for token in tokens {
            ensure!(
                seen.insert(token.denom.as_str()),
                AmmError::DuplicateDenom(token.denom.clone())
            );
            ensure!(
                !token.amount.is_zero(),
                AmmError::ZeroAmount {
                    denom: token.denom.clone(),
                }
            );
            pairs.push((token, self.pool.find_asset(&token.denom)?));
        }

        let total_weight = self.pool.total_weight();
        let share_denom = self.pool.supply.denom.clone();

        if !self.pool.is_active() {
            let total = tokens
                .iter()
                .try_fold(Uint128::zero(), |acc, t| acc.checked_add(t.amount))?;
            return pairs
                .iter()
                .map(|(_, asset)| -> Result<Coin, AmmError> {
                    let shares = total.checked_multiply_ratio(asset.weight, total_weight)?;
                    Ok(Coin::new(shares, share_denom.clone()))
                })
                .collect();
        }

        let supply = self.pool.supply.amount;
        ensure!(
            !supply.is_zero(),
            AmmError::InsufficientShares {
                requested: Uint128::zero(),
                available: supply,
            }
        );

        // every token must keep the pool ratio it has against the first one
        let (first_token, first_asset) = pairs[0];
        for (token, asset) in pairs.iter().skip(1) {
            let expected = ratio(asset.balance, first_asset.balance)?;
            let actual = ratio(token.amount, first_token.amount)?;
            check_slippage(expected, actual, tolerance_bps)?;
        }

        pairs
            .iter()
            .map(|(token, asset)| -> Result<Coin, AmmError> {
                // S * (w / W) * (t / B)
                let numerator = Uint256::from(supply)
                    .checked_mul(Uint256::from(asset.weight))?
                    .checked_mul(Uint256::from(token.amount))?;
                let denominator =
                    Uint256::from(total_weight).checked_mul(Uint256::from(asset.balance))?;
                let shares = Uint128::try_from(numerator.checked_div(denominator)?)?;
                Ok(Coin::new(shares, share_denom.clone()))
            })
            .collect()
    }

    /// Amount of `denom_out` owed for burning `pool_token`, proportional to
    /// the share of the total supply.
    pub fn withdraw(&self, pool_token: &Coin, denom_out: &str) -> Result<Coin, AmmError> {
        self.ensure_redeemable(pool_token)?;
        let asset = self.pool.find_asset(denom_out)?;

        let amount = asset
            .balance
            .checked_multiply_ratio(pool_token.amount, self.pool.supply.amount)?;

        Ok(Coin::new(amount, denom_out))
    }

    /// One-sided exit, the inverse of [`Self::deposit_single_asset`]:
    /// `B * (1 - (1 - s / S) ^ (1 / Wn))`.
    pub fn single_withdraw(&self, pool_token: &Coin, denom_out: &str) -> Result<Coin, AmmError> {
        self.ensure_redeemable(pool_token)?;
        let asset = self.pool.find_asset(denom_out)?;

        let supply = self.pool.supply.amount;
        let remaining = ratio(supply.checked_sub(pool_token.amount)?, supply)?;
        let exponent = Decimal256::checked_from_ratio(self.pool.total_weight(), asset.weight)?;
        let factor = pow(remaining, exponent)?;

        let amount = mul_floor(asset.balance, Decimal256::one().checked_sub(factor)?)?;
        ensure!(
            amount < asset.balance,
            AmmError::InsufficientLiquidity {
                denom: denom_out.to_string(),
                requested: amount,
                available: asset.balance,
            }
        );
        ensure!(
            !amount.is_zero(),
            AmmError::ZeroOutput {
                denom: denom_out.to_string(),
            }
        );

        Ok(Coin::new(amount, denom_out))
    }

    /// Proportional exit across every pool asset, in pool asset order.
    pub fn multi_asset_withdraw(&self, pool_token: &Coin) -> Result<Vec<Coin>, AmmError> {
        self.pool
            .assets
            .iter()
            .map(|asset| self.withdraw(pool_token, &asset.denom))
            .collect()
    }

    fn ensure_redeemable(&self, pool_token: &Coin) -> Result<(), AmmError> {
        self.pool.ensure_share_denom(&pool_token.denom)?;
        ensure!(
            !pool_token.amount.is_zero(),
            AmmError::ZeroAmount {
                denom: pool_token.denom.clone(),
            }
        );
        ensure!(
            pool_token.amount <= self.pool.supply.amount,
            AmmError::InsufficientShares {
                requested: pool_token.amount,
                available: self.pool.supply.amount,
            }
        );
        Ok(())
    }
}
