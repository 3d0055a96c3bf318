use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Binary, Coin};
use interchain_amm::PoolAsset;

use crate::config::SwapConfig;

#[cw_serde]
pub struct InstantiateMsg {
    pub config: SwapConfig,
}

#[cw_serde]
pub struct MsgCreatePool {
    pub sender: String,
    /// address expected to fund the remote side of the pool
    pub counterparty_creator: String,
    pub port: String,
    pub channel: String,
    /// every pool asset with its declared initial balance, sides seen from
    /// the sender's chain
    pub liquidity: Vec<PoolAsset>,
    pub timeout_height: Option<u64>,
    pub timeout_timestamp: Option<u64>,
}

#[cw_serde]
pub struct MsgSingleAssetDeposit {
    pub pool_id: String,
    pub sender: String,
    pub token: Coin,
    pub slippage_bps: u32,
    pub timeout_height: Option<u64>,
    pub timeout_timestamp: Option<u64>,
}

#[cw_serde]
pub struct MsgMakeMultiAssetDeposit {
    pub pool_id: String,
    pub sender: String,
    /// counterparty address completing the order
    pub taker: String,
    /// one coin per pool asset, the sender pays the native ones
    pub deposits: Vec<Coin>,
    pub timeout_height: Option<u64>,
    pub timeout_timestamp: Option<u64>,
}

#[cw_serde]
pub struct MsgTakeMultiAssetDeposit {
    pub pool_id: String,
    pub order_id: u64,
    pub sender: String,
    /// secp256k1 key of the sender
    pub public_key: Binary,
    /// signature over the order sign bytes
    pub signature: Binary,
    pub slippage_bps: u32,
    pub timeout_height: Option<u64>,
    pub timeout_timestamp: Option<u64>,
}

#[cw_serde]
pub struct MsgCancelMultiAssetDeposit {
    pub pool_id: String,
    pub order_id: u64,
    pub sender: String,
}

#[cw_serde]
pub struct MsgSingleAssetWithdraw {
    pub pool_id: String,
    pub sender: String,
    pub pool_token: Coin,
    pub denom_out: String,
    pub slippage_bps: u32,
    pub timeout_height: Option<u64>,
    pub timeout_timestamp: Option<u64>,
}

#[cw_serde]
pub struct MsgMultiAssetWithdraw {
    pub pool_id: String,
    pub sender: String,
    pub counterparty_receiver: String,
    pub pool_token: Coin,
    pub slippage_bps: u32,
    pub timeout_height: Option<u64>,
    pub timeout_timestamp: Option<u64>,
}

#[cw_serde]
#[derive(Copy, Eq)]
pub enum SwapType {
    /// exact input
    Left,
    /// exact output
    Right,
}

#[cw_serde]
pub struct MsgSwap {
    pub swap_type: SwapType,
    pub pool_id: String,
    pub sender: String,
    /// counterparty address receiving `token_out`
    pub recipient: String,
    /// exact input for a left swap, spending cap for a right swap
    pub token_in: Coin,
    /// minimum acceptable output for a left swap, exact output for a right swap
    pub token_out: Coin,
    pub slippage_bps: u32,
    pub timeout_height: Option<u64>,
    pub timeout_timestamp: Option<u64>,
}

#[cw_serde]
pub struct MsgCancelPool {
    pub pool_id: String,
    pub sender: String,
    pub timeout_height: Option<u64>,
    pub timeout_timestamp: Option<u64>,
}
