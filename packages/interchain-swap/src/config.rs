use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Env, IbcTimeout, IbcTimeoutBlock, Timestamp};
use interchain_amm::FEE_DENOMINATOR;

use crate::error::ContractError;

pub const DEFAULT_PORT: &str = "interchainswap";
// 3%
pub const DEFAULT_FEE_RATE: u32 = 300;
// Default packet timeout is 600 seconds
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 600;
// Default packet timeout is 300 blocks
pub const DEFAULT_TIMEOUT_HEIGHT_OFFSET: u64 = 300;
// Multi asset deposit orders live for one day
pub const DEFAULT_ORDER_LIFETIME_SECONDS: u64 = 86_400;

#[cw_serde]
pub struct SwapConfig {
    /// port this module is bound to on the local chain
    pub port: String,
    /// swap fee in basis points
    pub fee_rate: u32,
    pub timeout_seconds: u64,
    pub timeout_height_offset: u64,
    pub order_lifetime_seconds: u64,
}

impl Default for SwapConfig {
    fn default() -> Self {
        SwapConfig {
            port: DEFAULT_PORT.to_string(),
            fee_rate: DEFAULT_FEE_RATE,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            timeout_height_offset: DEFAULT_TIMEOUT_HEIGHT_OFFSET,
            order_lifetime_seconds: DEFAULT_ORDER_LIFETIME_SECONDS,
        }
    }
}

impl SwapConfig {
    pub fn validate(&self) -> Result<(), ContractError> {
        if self.port.trim().is_empty() {
            return Err(ContractError::InvalidConfig(
                "port cannot be empty".to_string(),
            ));
        }
        if self.fee_rate >= FEE_DENOMINATOR {
            return Err(ContractError::InvalidConfig(format!(
                "fee rate must be below {FEE_DENOMINATOR} bps"
            )));
        }
        if self.timeout_seconds == 0 && self.timeout_height_offset == 0 {
            return Err(ContractError::InvalidConfig(
                "at least one of timeout seconds or timeout height offset must be set".to_string(),
            ));
        }
        if self.order_lifetime_seconds == 0 {
            return Err(ContractError::InvalidConfig(
                "order lifetime must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Packet timeout relative to the current block. Explicit values take
    /// precedence over the configured offsets.
    pub fn packet_timeout(
        &self,
        env: &Env,
        timeout_height: Option<u64>,
        timeout_timestamp: Option<u64>,
    ) -> IbcTimeout {
        let height = timeout_height.or_else(|| {
            (self.timeout_height_offset > 0)
                .then(|| env.block.height + self.timeout_height_offset)
        });
        let timestamp = match timeout_timestamp {
            Some(nanos) => Some(Timestamp::from_nanos(nanos)),
            None => (self.timeout_seconds > 0)
                .then(|| env.block.time.plus_seconds(self.timeout_seconds)),
        };

        let block = height.map(|height| IbcTimeoutBlock {
            revision: 0,
            height,
        });
        match (block, timestamp) {
            (Some(block), Some(timestamp)) => IbcTimeout::with_both(block, timestamp),
            (Some(block), None) => IbcTimeout::with_block(block),
            (None, Some(timestamp)) => IbcTimeout::with_timestamp(timestamp),
            // validate() rules this out, fall back to the default window
            (None, None) => {
                IbcTimeout::with_timestamp(env.block.time.plus_seconds(DEFAULT_TIMEOUT_SECONDS))
            }
        }
    }
}
