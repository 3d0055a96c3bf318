use std::collections::BTreeMap;

use cosmwasm_std::{Binary, Coin, IbcEndpoint, IbcPacket, IbcTimeout, Uint128};

use crate::{
    error::ContractError,
    ports::{ChannelTransport, Custody, SignatureVerifier},
};

/// Balances keyed by (address, denom). Pool shares live here as well.
#[derive(Debug, Default)]
pub struct MockBank {
    balances: BTreeMap<(String, String), Uint128>,
}

impl MockBank {
    pub fn fund(&mut self, addr: &str, coins: &[Coin]) {
        for coin in coins {
            let balance = self
                .balances
                .entry((addr.to_string(), coin.denom.clone()))
                .or_default();
            *balance += coin.amount;
        }
    }

    pub fn balance(&self, addr: &str, denom: &str) -> Uint128 {
        self.balances
            .get(&(addr.to_string(), denom.to_string()))
            .copied()
            .unwrap_or_default()
    }

    // all or nothing
    fn debit(&mut self, addr: &str, coins: &[Coin]) -> Result<(), ContractError> {
        for coin in coins {
            let available = self.balance(addr, &coin.denom);
            if available < coin.amount {
                return Err(ContractError::Custody(format!(
                    "{addr} holds {available}{} but {coin} is required",
                    coin.denom
                )));
            }
        }
        for coin in coins {
            let key = (addr.to_string(), coin.denom.clone());
            if let Some(balance) = self.balances.get_mut(&key) {
                *balance -= coin.amount;
            }
        }
        Ok(())
    }
}

impl Custody for MockBank {
    fn lock(&mut self, from: &str, escrow: &str, coins: &[Coin]) -> Result<(), ContractError> {
        self.debit(from, coins)?;
        self.fund(escrow, coins);
        Ok(())
    }

    fn release(&mut self, escrow: &str, to: &str, coins: &[Coin]) -> Result<(), ContractError> {
        self.debit(escrow, coins)?;
        self.fund(to, coins);
        Ok(())
    }

    fn mint_share(&mut self, to: &str, share: &Coin) -> Result<(), ContractError> {
        self.fund(to, &[share.clone()]);
        Ok(())
    }

    fn burn_share(&mut self, from: &str, share: &Coin) -> Result<(), ContractError> {
        self.debit(from, &[share.clone()])
    }
}

/// One open channel end. Sent packets pile up in the outbox until relayed.
#[derive(Debug)]
pub struct MockChannel {
    pub local: IbcEndpoint,
    pub remote: IbcEndpoint,
    pub next_sequence: u64,
    pub outbox: Vec<IbcPacket>,
}

impl MockChannel {
    pub fn new(local: IbcEndpoint, remote: IbcEndpoint) -> Self {
        MockChannel {
            local,
            remote,
            next_sequence: 1,
            outbox: vec![],
        }
    }

    fn ensure_open(&self, port: &str, channel: &str) -> Result<(), ContractError> {
        if self.local.port_id != port || self.local.channel_id != channel {
            return Err(ContractError::ChannelNotFound {
                port: port.to_string(),
                channel: channel.to_string(),
            });
        }
        Ok(())
    }
}

impl ChannelTransport for MockChannel {
    fn send_packet(
        &mut self,
        port: &str,
        channel: &str,
        data: Binary,
        timeout: IbcTimeout,
    ) -> Result<u64, ContractError> {
        self.ensure_open(port, channel)?;

        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.outbox.push(IbcPacket::new(
            data,
            self.local.clone(),
            self.remote.clone(),
            sequence,
            timeout,
        ));
        Ok(sequence)
    }

    fn counterparty(&self, port: &str, channel: &str) -> Result<IbcEndpoint, ContractError> {
        self.ensure_open(port, channel)?;
        Ok(self.remote.clone())
    }
}

/// Accepts or rejects every signature without looking at it.
#[derive(Debug, Clone, Copy)]
pub struct MockVerifier {
    pub accept: bool,
}

impl SignatureVerifier for MockVerifier {
    fn verify(
        &self,
        _signer: Option<&str>,
        _public_key: &[u8],
        _sign_bytes: &[u8],
        _signature: &[u8],
    ) -> Result<(), ContractError> {
        if self.accept {
            Ok(())
        } else {
            Err(ContractError::InvalidSignature {})
        }
    }
}
