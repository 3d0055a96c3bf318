pub mod config;
pub mod coordinator;
pub mod error;
pub mod escrow;
pub mod lifecycle;
pub mod msg;
pub mod order;
pub mod packet;
pub mod ports;
pub mod state;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::SwapConfig;
pub use coordinator::{instantiate, PacketCoordinator, EVENT_TYPE};
pub use error::ContractError;
pub use ports::{ChannelTransport, Custody, Secp256k1Verifier, SignatureVerifier};
