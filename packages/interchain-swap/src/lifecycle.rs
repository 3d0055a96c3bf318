use interchain_amm::{InterchainLiquidityPool, PoolStatus};

use crate::error::ContractError;

pub fn can_transition(from: PoolStatus, to: PoolStatus) -> bool {
    matches!(
        (from, to),
        (PoolStatus::Initial, PoolStatus::Initialized)
            | (PoolStatus::Initialized, PoolStatus::Active)
            | (PoolStatus::Initialized, PoolStatus::Cancelled)
            // a rejected or timed out cancellation
            | (PoolStatus::Cancelled, PoolStatus::Initialized)
    )
}

pub fn transition(pool: &mut InterchainLiquidityPool, to: PoolStatus) -> Result<(), ContractError> {
    if !can_transition(pool.status, to) {
        return Err(ContractError::InvalidStatusTransition {
            from: pool.status.to_string(),
            to: to.to_string(),
        });
    }
    pool.status = to;
    Ok(())
}

pub fn ensure_status(
    pool: &InterchainLiquidityPool,
    status: PoolStatus,
) -> Result<(), ContractError> {
    if pool.status != status {
        return Err(ContractError::PoolNotReady {
            pool_id: pool.id.clone(),
            status: pool.status.to_string(),
        });
    }
    Ok(())
}

/// Deposits, withdrawals, swaps and orders need both sides funded.
pub fn ensure_active(pool: &InterchainLiquidityPool) -> Result<(), ContractError> {
    ensure_status(pool, PoolStatus::Active)
}
