use cosmwasm_std::{Addr, Api, CanonicalAddr, StdResult};
use sha2::{Digest, Sha256};

/// Version string mixed into every escrow address.
pub const ESCROW_VERSION: &str = "ics101-1";

/// Custody account for assets locked on the local end of `port/channel`.
///
/// `sha256(version || 0x00 || port || "/" || channel)` truncated to 20 bytes,
/// so any party can recompute it without asking the counterparty.
pub fn escrow_address(port: &str, channel: &str) -> CanonicalAddr {
    let mut hasher = Sha256::new();
    hasher.update(ESCROW_VERSION.as_bytes());
    hasher.update([0u8]);
    hasher.update(format!("{port}/{channel}").as_bytes());

    CanonicalAddr::from(&hasher.finalize()[..20])
}

pub fn escrow_addr(api: &dyn Api, port: &str, channel: &str) -> StdResult<Addr> {
    api.addr_humanize(&escrow_address(port, channel))
}
