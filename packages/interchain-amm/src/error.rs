use cosmwasm_std::{
    CheckedFromRatioError, CheckedMultiplyRatioError, ConversionOverflowError, DivideByZeroError,
    OverflowError, StdError, Uint128,
};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum AmmError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    Overflow(#[from] OverflowError),

    #[error("{0}")]
    DivideByZero(#[from] DivideByZeroError),

    #[error("{0}")]
    CheckedFromRatio(#[from] CheckedFromRatioError),

    #[error("{0}")]
    CheckedMultiplyRatio(#[from] CheckedMultiplyRatioError),

    #[error("{0}")]
    ConversionOverflow(#[from] ConversionOverflowError),

    #[error("Asset {denom} not found in pool")]
    AssetNotFound { denom: String },

    #[error("Insufficient liquidity of {denom}: requested {requested}, available {available}")]
    InsufficientLiquidity {
        denom: String,
        requested: Uint128,
        available: Uint128,
    },

    #[error("Insufficient pool shares: requested {requested}, available {available}")]
    InsufficientShares {
        requested: Uint128,
        available: Uint128,
    },

    #[error("Slippage exceeded: expected {expected}, got {actual}, tolerance {tolerance_bps} bps")]
    SlippageExceeded {
        expected: String,
        actual: String,
        tolerance_bps: u32,
    },

    #[error("Slippage tolerance must be between 0 and 10000 bps, got {0}")]
    InvalidSlippageTolerance(u32),

    #[error("Invalid denom pair: {denom_in} / {denom_out}")]
    InvalidDenomPair { denom_in: String, denom_out: String },

    #[error("Fee rate must be below 10000 bps, got {0}")]
    InvalidFee(u32),

    #[error("Asset {denom} must have a positive weight")]
    InvalidWeight { denom: String },

    #[error("Denom cannot be empty")]
    EmptyDenom {},

    #[error("Denom {0} appears more than once")]
    DuplicateDenom(String),

    #[error("Expected one token per pool asset ({expected}), got {actual}")]
    MismatchedAssets { expected: usize, actual: usize },

    #[error("Operation would return zero {denom}")]
    ZeroOutput { denom: String },

    #[error("Amount of {denom} must be greater than zero")]
    ZeroAmount { denom: String },
}
