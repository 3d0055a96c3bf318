pub mod error;
pub mod market_maker;
pub mod math;
pub mod pool;
pub mod slippage;

pub use error::AmmError;
pub use market_maker::{InterchainMarketMaker, FEE_DENOMINATOR};
pub use pool::{pool_id, InterchainLiquidityPool, PoolAsset, PoolSide, PoolStatus};
pub use slippage::{check_slippage, ensure_tolerance, MAX_TOLERANCE_BPS};
