//! Integer-only fixed point helpers.
//!
//! Every replica of both ledgers has to compute bit-identical pool deltas, so
//! fractional powers are evaluated with `Decimal256` series instead of floats:
//! `x^e = x^floor(e) * exp(frac(e) * ln(x))`.

use cosmwasm_std::{Decimal256, StdError, Uint128, Uint256};

use crate::error::AmmError;

/// ln(2) truncated to 18 decimal places.
const LN_2: Decimal256 = Decimal256::raw(693_147_180_559_945_309);

/// Upper bound on series iterations, reached only if a term never rounds to zero.
const MAX_SERIES_TERMS: u128 = 256;

pub fn int(value: u128) -> Decimal256 {
    Decimal256::from_ratio(value, 1u128)
}

pub fn ratio(numerator: Uint128, denominator: Uint128) -> Result<Decimal256, AmmError> {
    Ok(Decimal256::checked_from_ratio(numerator, denominator)?)
}

/// `amount * factor`, rounded down.
pub fn mul_floor(amount: Uint128, factor: Decimal256) -> Result<Uint128, AmmError> {
    let product = Uint256::from(amount).checked_mul(factor.atomics())?;
    let result = product.checked_div(Decimal256::one().atomics())?;
    Ok(Uint128::try_from(result)?)
}

/// `amount * factor`, rounded up.
pub fn mul_ceil(amount: Uint128, factor: Decimal256) -> Result<Uint128, AmmError> {
    let one = Decimal256::one().atomics();
    let product = Uint256::from(amount).checked_mul(factor.atomics())?;
    let result = product
        .checked_add(one.checked_sub(Uint256::one())?)?
        .checked_div(one)?;
    Ok(Uint128::try_from(result)?)
}

/// `base^exp` for `base >= 0` and `exp >= 0`.
pub fn pow(base: Decimal256, exp: Decimal256) -> Result<Decimal256, AmmError> {
    if exp.is_zero() {
        return Ok(Decimal256::one());
    }
    if base.is_zero() {
        return Ok(Decimal256::zero());
    }

    let whole = exp.floor();
    let fraction = exp.checked_sub(whole)?;

    let whole_exp = u32::try_from(Uint128::try_from(whole.to_uint_floor())?.u128())
        .map_err(|_| StdError::generic_err(format!("exponent {exp} is too large")))?;
    let integer_part = base.checked_pow(whole_exp)?;

    if fraction.is_zero() {
        return Ok(integer_part);
    }

    let fractional_part = if base >= Decimal256::one() {
        exp_non_negative(fraction.checked_mul(ln_at_least_one(base)?)?)?
    } else {
        let inverse = Decimal256::one().checked_div(base)?;
        let denominator = exp_non_negative(fraction.checked_mul(ln_at_least_one(inverse)?)?)?;
        Decimal256::one().checked_div(denominator)?
    };

    Ok(integer_part.checked_mul(fractional_part)?)
}

/// Natural logarithm for `x >= 1`.
///
/// Reduces `x = m * 2^k` with `m` in `[1, 2)` and sums
/// `ln(m) = 2 * atanh((m - 1) / (m + 1))`.
fn ln_at_least_one(x: Decimal256) -> Result<Decimal256, AmmError> {
    let two = int(2);
    let mut mantissa = x;
    let mut k: u128 = 0;
    while mantissa >= two {
        mantissa = mantissa.checked_div(two)?;
        k += 1;
    }

    let z = mantissa
        .checked_sub(Decimal256::one())?
        .checked_div(mantissa.checked_add(Decimal256::one())?)?;
    let z_squared = z.checked_mul(z)?;

    let mut sum = z;
    let mut power = z;
    let mut n: u128 = 1;
    while n < MAX_SERIES_TERMS {
        power = power.checked_mul(z_squared)?;
        let term = power.checked_div(int(2 * n + 1))?;
        if term.is_zero() {
            break;
        }
        sum = sum.checked_add(term)?;
        n += 1;
    }

    Ok(sum
        .checked_mul(two)?
        .checked_add(LN_2.checked_mul(int(k))?)?)
}

/// `e^y` for `y >= 0`, reduced to `2^n * e^r` with `r` in `[0, ln 2)`.
fn exp_non_negative(y: Decimal256) -> Result<Decimal256, AmmError> {
    let halvings = y.checked_div(LN_2)?.to_uint_floor();
    let n = u32::try_from(Uint128::try_from(halvings)?.u128())
        .map_err(|_| StdError::generic_err(format!("exponent {y} is too large")))?;
    let remainder = y.checked_sub(LN_2.checked_mul(int(n.into()))?)?;

    let mut sum = Decimal256::one();
    let mut term = Decimal256::one();
    let mut i: u128 = 1;
    while i < MAX_SERIES_TERMS {
        term = term.checked_mul(remainder)?.checked_div(int(i))?;
        if term.is_zero() {
            break;
        }
        sum = sum.checked_add(term)?;
        i += 1;
    }

    Ok(sum.checked_mul(int(2).checked_pow(n)?)?)
}
