//! Wire format exchanged between the two ends of a pool's channel.
//!
//! Every packet is a JSON envelope `{"type": .., "data": <base64 body>}` and
//! every acknowledgement is either `{"result": <base64>}` or
//! `{"error": "<reason>"}`.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{from_json, to_json_binary, Binary, Coin, StdResult};
use interchain_amm::InterchainLiquidityPool;
use serde::{de::DeserializeOwned, Serialize};

use crate::{error::ContractError, order::MultiAssetDepositOrder};

#[cw_serde]
#[derive(Copy, Eq)]
pub enum MessageType {
    Create,
    Deposit,
    Withdraw,
    LeftSwap,
    RightSwap,
    MakeMultiDeposit,
    TakeMultiDeposit,
    MultiWithdraw,
    Cancel,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Create => "create",
            MessageType::Deposit => "deposit",
            MessageType::Withdraw => "withdraw",
            MessageType::LeftSwap => "left_swap",
            MessageType::RightSwap => "right_swap",
            MessageType::MakeMultiDeposit => "make_multi_deposit",
            MessageType::TakeMultiDeposit => "take_multi_deposit",
            MessageType::MultiWithdraw => "multi_withdraw",
            MessageType::Cancel => "cancel",
        }
    }
}

#[cw_serde]
pub struct InterchainSwapPacketData {
    #[serde(rename = "type")]
    pub msg_type: MessageType,
    pub data: Binary,
}

impl InterchainSwapPacketData {
    pub fn new<T: Serialize>(msg_type: MessageType, body: &T) -> StdResult<Self> {
        Ok(InterchainSwapPacketData {
            msg_type,
            data: to_json_binary(body)?,
        })
    }

    pub fn encode(&self) -> StdResult<Binary> {
        to_json_binary(self)
    }

    pub fn decode(data: &Binary) -> Result<Self, ContractError> {
        from_json(data).map_err(|err| ContractError::InvalidPacket(err.to_string()))
    }

    pub fn body<T: DeserializeOwned>(&self) -> Result<T, ContractError> {
        from_json(&self.data).map_err(|err| ContractError::InvalidPacket(err.to_string()))
    }
}

#[cw_serde]
pub enum Ack {
    Result(Binary),
    Error(String),
}

impl Ack {
    pub fn success<T: Serialize>(result: &T) -> StdResult<Binary> {
        to_json_binary(&Ack::Result(to_json_binary(result)?))
    }

    pub fn fail(reason: impl Into<String>) -> StdResult<Binary> {
        to_json_binary(&Ack::Error(reason.into()))
    }

    pub fn decode(data: &Binary) -> Result<Self, ContractError> {
        from_json(data).map_err(|err| ContractError::InvalidAcknowledgement(err.to_string()))
    }

    pub fn result<T: DeserializeOwned>(data: &Binary) -> Result<T, ContractError> {
        from_json(data).map_err(|err| ContractError::InvalidAcknowledgement(err.to_string()))
    }
}

/// The pool as seen by the creator's chain.
#[cw_serde]
pub struct CreatePoolPacket {
    pub pool: InterchainLiquidityPool,
}

#[cw_serde]
pub struct DepositPacket {
    pub pool_id: String,
    pub sender: String,
    pub token: Coin,
    /// shares the sender computed against its own pool record
    pub expected_shares: Coin,
    pub tolerance_bps: u32,
}

#[cw_serde]
pub struct WithdrawPacket {
    pub pool_id: String,
    pub sender: String,
    pub pool_token: Coin,
    pub expected_out: Coin,
    pub tolerance_bps: u32,
}

/// For a left swap `token_in` is exact and `token_out` is the sender's
/// quote. For a right swap `token_out` is exact and `token_in` is the most
/// the sender is willing to pay.
#[cw_serde]
pub struct SwapPacket {
    pub pool_id: String,
    pub sender: String,
    /// receives `token_out` on the counterparty chain
    pub recipient: String,
    pub token_in: Coin,
    pub token_out: Coin,
    pub tolerance_bps: u32,
}

#[cw_serde]
pub struct MakeOrderPacket {
    pub order: MultiAssetDepositOrder,
}

#[cw_serde]
pub struct TakeOrderPacket {
    pub pool_id: String,
    pub order_id: u64,
    pub taker: String,
    pub tolerance_bps: u32,
    /// compressed secp256k1 key of the taker
    pub public_key: Binary,
    pub signature: Binary,
}

#[cw_serde]
pub struct MultiWithdrawPacket {
    pub pool_id: String,
    pub sender: String,
    /// receives the assets issued on the counterparty chain
    pub counterparty_receiver: String,
    pub pool_token: Coin,
    pub expected_outs: Vec<Coin>,
    pub tolerance_bps: u32,
}

#[cw_serde]
pub struct CancelPoolPacket {
    pub pool_id: String,
    pub sender: String,
}

#[cw_serde]
pub struct PoolAck {
    pub pool_id: String,
}

#[cw_serde]
pub struct OrderAck {
    pub pool_id: String,
    pub order_id: u64,
}

#[cw_serde]
pub struct DepositResult {
    pub pool_token: Coin,
    /// pool supply after the deposit
    pub supply: Coin,
}

#[cw_serde]
pub struct WithdrawResult {
    pub token_out: Coin,
}

#[cw_serde]
pub struct SwapResult {
    pub token_in: Coin,
    pub token_out: Coin,
}

#[cw_serde]
pub struct TakeOrderResult {
    pub maker_shares: Coin,
    pub taker_shares: Coin,
}

#[cw_serde]
pub struct MultiWithdrawResult {
    pub tokens_out: Vec<Coin>,
}
