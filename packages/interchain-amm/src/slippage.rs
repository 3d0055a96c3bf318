use cosmwasm_std::{ensure, Decimal256};

use crate::error::AmmError;

pub const MAX_TOLERANCE_BPS: u32 = 10_000;

pub fn ensure_tolerance(tolerance_bps: u32) -> Result<(), AmmError> {
    ensure!(
        tolerance_bps <= MAX_TOLERANCE_BPS,
        AmmError::InvalidSlippageTolerance(tolerance_bps)
    );
    Ok(())
}

/// Passes when `|expected - actual| <= tolerance_bps * expected / 10000`.
///
/// A tolerance above 10000 bps is a caller bug and is reported before any
/// comparison happens.
pub fn check_slippage(
    expected: Decimal256,
    actual: Decimal256,
    tolerance_bps: u32,
) -> Result<(), AmmError> {
    ensure_tolerance(tolerance_bps)?;

    let deviation = if expected > actual {
        expected.checked_sub(actual)?
    } else {
        actual.checked_sub(expected)?
    };
    let tolerance = expected.checked_mul(Decimal256::from_ratio(
        tolerance_bps,
        MAX_TOLERANCE_BPS,
    ))?;

    ensure!(
        deviation <= tolerance,
        AmmError::SlippageExceeded {
            expected: expected.to_string(),
            actual: actual.to_string(),
            tolerance_bps,
        }
    );

    Ok(())
}
