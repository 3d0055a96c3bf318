//! In-memory host for two coordinators sharing one channel.

pub mod builder;
pub mod mocks;
pub mod suite;

#[cfg(test)]
mod tests;

pub use builder::TwoChainSuiteBuilder;
pub use mocks::{MockBank, MockChannel, MockVerifier};
pub use suite::{ChainSuite, Side, TwoChainSuite};
