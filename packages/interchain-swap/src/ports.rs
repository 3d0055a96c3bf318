//! Capabilities the coordinator borrows from its host.

use cosmwasm_std::{Api, Binary, CanonicalAddr, Coin, IbcEndpoint, IbcTimeout};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

use crate::error::ContractError;

pub trait ChannelTransport {
    /// Queues `data` on the local end of `port/channel` and returns its sequence.
    fn send_packet(
        &mut self,
        port: &str,
        channel: &str,
        data: Binary,
        timeout: IbcTimeout,
    ) -> Result<u64, ContractError>;

    /// Remote end of an open channel, `ChannelNotFound` otherwise.
    fn counterparty(&self, port: &str, channel: &str) -> Result<IbcEndpoint, ContractError>;
}

pub trait Custody {
    fn lock(&mut self, from: &str, escrow: &str, coins: &[Coin]) -> Result<(), ContractError>;
    fn release(&mut self, escrow: &str, to: &str, coins: &[Coin]) -> Result<(), ContractError>;
    fn mint_share(&mut self, to: &str, share: &Coin) -> Result<(), ContractError>;
    fn burn_share(&mut self, from: &str, share: &Coin) -> Result<(), ContractError>;
}

pub trait SignatureVerifier {
    /// Checks `signature` over `sign_bytes`. With a `signer` the key must also
    /// derive to that local address.
    fn verify(
        &self,
        signer: Option<&str>,
        public_key: &[u8],
        sign_bytes: &[u8],
        signature: &[u8],
    ) -> Result<(), ContractError>;
}

/// Cosmos style secp256k1 verification on top of the host crypto API.
pub struct Secp256k1Verifier<'a> {
    api: &'a dyn Api,
}

impl<'a> Secp256k1Verifier<'a> {
    pub fn new(api: &'a dyn Api) -> Self {
        Secp256k1Verifier { api }
    }
}

impl SignatureVerifier for Secp256k1Verifier<'_> {
    fn verify(
        &self,
        signer: Option<&str>,
        public_key: &[u8],
        sign_bytes: &[u8],
        signature: &[u8],
    ) -> Result<(), ContractError> {
        let hash = Sha256::digest(sign_bytes);
        let valid = self
            .api
            .secp256k1_verify(&hash, signature, public_key)
            .map_err(|_| ContractError::InvalidSignature {})?;
        if !valid {
            return Err(ContractError::InvalidSignature {});
        }

        if let Some(signer) = signer {
            let derived = pubkey_to_address(self.api, public_key)?;
            if derived.as_str() != signer {
                return Err(ContractError::InvalidSignature {});
            }
        }
        Ok(())
    }
}

/// `ripemd160(sha256(pubkey))`, humanized with the chain prefix.
pub fn pubkey_to_address(api: &dyn Api, public_key: &[u8]) -> Result<String, ContractError> {
    let sha = Sha256::digest(public_key);
    let canonical = CanonicalAddr::from(Ripemd160::digest(sha).to_vec());
    Ok(api.addr_humanize(&canonical)?.to_string())
}
