use cosmwasm_std::StdError;
use interchain_amm::AmmError;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error(transparent)]
    Amm(#[from] AmmError),

    #[error("Denom cannot be empty")]
    EmptyDenom {},

    #[error("Amount of {denom} must be greater than zero")]
    ZeroAmount { denom: String },

    #[error("Expected {expected} entries, got {actual}")]
    MismatchedLengths { expected: usize, actual: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Pool {pool_id} not found")]
    PoolNotFound { pool_id: String },

    #[error("Pool {pool_id} already exists")]
    PoolAlreadyExists { pool_id: String },

    #[error("Pool {pool_id} is {status}")]
    PoolNotReady { pool_id: String, status: String },

    #[error("Pool status cannot move from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error("A pool needs assets issued on both chains")]
    InvalidPoolSides {},

    #[error("Asset {denom} is not issued on this chain")]
    NotNativeAsset { denom: String },

    #[error("Initial deposit must be exactly {expected}, got {actual}")]
    InvalidInitialDeposit { expected: String, actual: String },

    #[error("Maker {maker} already has a live order in pool {pool_id}")]
    OrderAlreadyPending { pool_id: String, maker: String },

    #[error("Order {order_id} not found in pool {pool_id}")]
    OrderNotFound { pool_id: String, order_id: u64 },

    #[error("Order {order_id} expired")]
    OrderExpired { order_id: u64 },

    #[error("Order {order_id} has not expired yet")]
    OrderNotExpired { order_id: u64 },

    #[error("Order {order_id} is already being taken")]
    OrderNotPending { order_id: u64 },

    #[error("Invalid signature")]
    InvalidSignature {},

    #[error("Unauthorized")]
    Unauthorized {},

    #[error("Channel {port}/{channel} not found")]
    ChannelNotFound { port: String, channel: String },

    #[error("Invalid port: expected {expected}, got {actual}")]
    InvalidPort { expected: String, actual: String },

    #[error("Invalid channel: expected {expected}, got {actual}")]
    InvalidChannel { expected: String, actual: String },

    #[error("Invalid packet: {0}")]
    InvalidPacket(String),

    #[error("Invalid acknowledgement: {0}")]
    InvalidAcknowledgement(String),

    #[error("Custody error: {0}")]
    Custody(String),
}
