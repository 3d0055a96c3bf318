use std::collections::BTreeSet;
use std::fmt;

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{ensure, Coin, Uint128};
use sha2::{Digest, Sha256};

use crate::error::AmmError;

/// Prefix shared by every pool id and therefore every pool share denom.
pub const POOL_ID_PREFIX: &str = "pool";

/// Which ledger issues an asset, seen from the chain holding the record.
#[cw_serde]
#[derive(Copy, Eq)]
pub enum PoolSide {
    Native,
    Remote,
}

impl PoolSide {
    pub fn flip(self) -> Self {
        match self {
            PoolSide::Native => PoolSide::Remote,
            PoolSide::Remote => PoolSide::Native,
        }
    }
}

#[cw_serde]
#[derive(Copy, Eq)]
pub enum PoolStatus {
    /// Record built locally, nothing sent yet
    Initial,
    /// Creation packet sent or received, waiting for the counterparty liquidity
    Initialized,
    /// Both sides funded, the pool accepts deposits, withdrawals and swaps
    Active,
    /// Creation was cancelled
    Cancelled,
}

impl fmt::Display for PoolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolStatus::Initial => write!(f, "initial"),
            PoolStatus::Initialized => write!(f, "initialized"),
            PoolStatus::Active => write!(f, "active"),
            PoolStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[cw_serde]
pub struct PoolAsset {
    pub denom: String,
    pub side: PoolSide,
    pub balance: Uint128,
    /// pool relative weight, only meaningful against the other weights
    pub weight: u32,
    /// display precision, never used in balance arithmetic
    pub decimal: u32,
}

impl PoolAsset {
    pub fn new(
        denom: impl Into<String>,
        side: PoolSide,
        balance: impl Into<Uint128>,
        weight: u32,
    ) -> Self {
        PoolAsset {
            denom: denom.into(),
            side,
            balance: balance.into(),
            weight,
            decimal: 6,
        }
    }

    pub fn with_decimal(mut self, decimal: u32) -> Self {
        self.decimal = decimal;
        self
    }
}

#[cw_serde]
pub struct InterchainLiquidityPool {
    pub id: String,
    /// address that created the pool on its native chain
    pub creator: String,
    /// address expected to provide the remote side's initial liquidity
    pub counterparty_creator: String,
    pub assets: Vec<PoolAsset>,
    /// pool share token, denom is the pool id
    pub supply: Coin,
    pub status: PoolStatus,
    /// local end of the channel this pool is bound to
    pub port: String,
    pub channel: String,
    /// remote end of the same channel
    pub counterparty_port: String,
    pub counterparty_channel: String,
}

/// Content-derived pool id, independent of the order the denoms are given in.
pub fn pool_id<S: AsRef<str>>(denoms: &[S]) -> String {
    let mut sorted: Vec<&str> = denoms.iter().map(|d| d.as_ref()).collect();
    sorted.sort_unstable();

    let mut hasher = Sha256::new();
    for denom in sorted {
        // length prefix keeps ["ab", "c"] and ["a", "bc"] apart
        hasher.update((denom.len() as u64).to_be_bytes());
        hasher.update(denom.as_bytes());
    }

    format!("{POOL_ID_PREFIX}{}", hex::encode(hasher.finalize()))
}

impl InterchainLiquidityPool {
    /// Builds a pool record in `Initial` status with an empty share supply.
    pub fn new(
        creator: impl Into<String>,
        counterparty_creator: impl Into<String>,
        assets: Vec<PoolAsset>,
        port: impl Into<String>,
        channel: impl Into<String>,
        counterparty_port: impl Into<String>,
        counterparty_channel: impl Into<String>,
    ) -> Result<Self, AmmError> {
        validate_assets(&assets)?;

        let denoms: Vec<&str> = assets.iter().map(|a| a.denom.as_str()).collect();
        let id = pool_id(&denoms);

        Ok(InterchainLiquidityPool {
            supply: Coin::new(0u128, id.clone()),
            id,
            creator: creator.into(),
            counterparty_creator: counterparty_creator.into(),
            assets,
            status: PoolStatus::Initial,
            port: port.into(),
            channel: channel.into(),
            counterparty_port: counterparty_port.into(),
            counterparty_channel: counterparty_channel.into(),
        })
    }

    /// The same pool seen from the other chain: sides are flipped and the
    /// channel ends swapped.
    pub fn mirrored(&self) -> Self {
        InterchainLiquidityPool {
            id: self.id.clone(),
            creator: self.creator.clone(),
            counterparty_creator: self.counterparty_creator.clone(),
            assets: self
                .assets
                .iter()
                .map(|asset| PoolAsset {
                    side: asset.side.flip(),
                    ..asset.clone()
                })
                .collect(),
            supply: self.supply.clone(),
            status: self.status,
            port: self.counterparty_port.clone(),
            channel: self.counterparty_channel.clone(),
            counterparty_port: self.port.clone(),
            counterparty_channel: self.channel.clone(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == PoolStatus::Active
    }

    pub fn denoms(&self) -> Vec<String> {
        self.assets.iter().map(|a| a.denom.clone()).collect()
    }

    pub fn find_asset(&self, denom: &str) -> Result<&PoolAsset, AmmError> {
        self.assets
            .iter()
            .find(|a| a.denom == denom)
            .ok_or_else(|| AmmError::AssetNotFound {
                denom: denom.to_string(),
            })
    }

    fn find_asset_mut(&mut self, denom: &str) -> Result<&mut PoolAsset, AmmError> {
        self.assets
            .iter_mut()
            .find(|a| a.denom == denom)
            .ok_or_else(|| AmmError::AssetNotFound {
                denom: denom.to_string(),
            })
    }

    /// Assets issued on the chain holding this record.
    pub fn native_assets(&self) -> impl Iterator<Item = &PoolAsset> {
        self.assets.iter().filter(|a| a.side == PoolSide::Native)
    }

    pub fn total_weight(&self) -> u64 {
        self.assets.iter().map(|a| u64::from(a.weight)).sum()
    }

    pub fn total_balance(&self) -> Result<Uint128, AmmError> {
        self.assets
            .iter()
            .try_fold(Uint128::zero(), |acc, a| Ok(acc.checked_add(a.balance)?))
    }

    pub fn add_asset(&mut self, token: &Coin) -> Result<(), AmmError> {
        let asset = self.find_asset_mut(&token.denom)?;
        asset.balance = asset.balance.checked_add(token.amount)?;
        Ok(())
    }

    pub fn subtract_asset(&mut self, token: &Coin) -> Result<(), AmmError> {
        let asset = self.find_asset_mut(&token.denom)?;
        ensure!(
            asset.balance >= token.amount,
            AmmError::InsufficientLiquidity {
                denom: token.denom.clone(),
                requested: token.amount,
                available: asset.balance,
            }
        );
        asset.balance -= token.amount;
        Ok(())
    }

    pub fn add_supply(&mut self, shares: &Coin) -> Result<(), AmmError> {
        self.ensure_share_denom(&shares.denom)?;
        self.supply.amount = self.supply.amount.checked_add(shares.amount)?;
        Ok(())
    }

    pub fn subtract_supply(&mut self, shares: &Coin) -> Result<(), AmmError> {
        self.ensure_share_denom(&shares.denom)?;
        ensure!(
            self.supply.amount >= shares.amount,
            AmmError::InsufficientShares {
                requested: shares.amount,
                available: self.supply.amount,
            }
        );
        self.supply.amount -= shares.amount;
        Ok(())
    }

    pub fn ensure_share_denom(&self, denom: &str) -> Result<(), AmmError> {
        ensure!(
            denom == self.supply.denom,
            AmmError::InvalidDenomPair {
                denom_in: denom.to_string(),
                denom_out: self.supply.denom.clone(),
            }
        );
        Ok(())
    }
}

fn validate_assets(assets: &[PoolAsset]) -> Result<(), AmmError> {
    ensure!(
        assets.len() >= 2,
        AmmError::MismatchedAssets {
            expected: 2,
            actual: assets.len(),
        }
    );

    let mut seen = BTreeSet::new();
    for asset in assets {
        ensure!(
            !asset.denom.trim().is_empty(),
            AmmError::EmptyDenom {}
        );
        ensure!(
            seen.insert(asset.denom.as_str()),
            AmmError::DuplicateDenom(asset.denom.clone())
        );
        ensure!(
            asset.weight > 0,
            AmmError::InvalidWeight {
                denom: asset.denom.clone(),
            }
        );
    }

    Ok(())
}
