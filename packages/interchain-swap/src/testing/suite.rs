use cosmwasm_std::{
    testing::{MockApi, MockStorage},
    Addr, Binary, Coin, Env, IbcAcknowledgement, IbcBasicResponse, IbcPacket, IbcReceiveResponse,
    Uint128,
};
use interchain_amm::InterchainLiquidityPool;

use super::mocks::{MockBank, MockChannel, MockVerifier};
use crate::{
    coordinator::PacketCoordinator,
    error::ContractError,
    escrow::escrow_addr,
    packet::Ack,
    ports::{Secp256k1Verifier, SignatureVerifier},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn other(self) -> Self {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

/// Everything one chain's coordinator borrows, owned in memory.
pub struct ChainSuite {
    pub storage: MockStorage,
    pub api: MockApi,
    pub env: Env,
    pub bank: MockBank,
    pub channel: MockChannel,
    /// checks taker signatures with secp256k1 instead of accepting them
    pub verify_signatures: bool,
}

impl ChainSuite {
    pub fn addr(&self, label: &str) -> Addr {
        self.api.addr_make(label)
    }

    pub fn port(&self) -> &str {
        &self.channel.local.port_id
    }

    pub fn channel_id(&self) -> &str {
        &self.channel.local.channel_id
    }

    pub fn escrow(&self) -> Addr {
        escrow_addr(&self.api, self.port(), self.channel_id()).unwrap()
    }

    pub fn balance(&self, addr: &Addr, denom: &str) -> Uint128 {
        self.bank.balance(addr.as_str(), denom)
    }

    pub fn fund(&mut self, addr: &Addr, coins: &[Coin]) {
        self.bank.fund(addr.as_str(), coins);
    }

    pub fn advance_time(&mut self, seconds: u64) {
        self.env.block.time = self.env.block.time.plus_seconds(seconds);
        self.env.block.height += seconds / 5;
    }

    pub fn pool(&self, pool_id: &str) -> Option<InterchainLiquidityPool> {
        crate::state::POOLS.may_load(&self.storage, pool_id).unwrap()
    }

    pub fn with_coordinator<R>(&mut self, f: impl FnOnce(&mut PacketCoordinator<'_>) -> R) -> R {
        let secp = Secp256k1Verifier::new(&self.api);
        let accept_all = MockVerifier { accept: true };
        let verifier: &dyn SignatureVerifier = if self.verify_signatures {
            &secp
        } else {
            &accept_all
        };

        let mut coordinator = PacketCoordinator::new(
            &mut self.storage,
            &self.api,
            &self.env,
            &mut self.channel,
            &mut self.bank,
            verifier,
        );
        f(&mut coordinator)
    }

    pub fn take_outbox(&mut self) -> Vec<IbcPacket> {
        std::mem::take(&mut self.channel.outbox)
    }
}

/// Two chains joined by one channel, relayed by hand.
pub struct TwoChainSuite {
    pub a: ChainSuite,
    pub b: ChainSuite,
}

impl TwoChainSuite {
    pub fn chain(&mut self, side: Side) -> &mut ChainSuite {
        match side {
            Side::A => &mut self.a,
            Side::B => &mut self.b,
        }
    }

    pub fn deliver(&mut self, to: Side, packet: &IbcPacket) -> IbcReceiveResponse {
        self.chain(to)
            .with_coordinator(|c| c.on_receive(packet))
            .unwrap()
    }

    pub fn acknowledge(
        &mut self,
        at: Side,
        packet: &IbcPacket,
        ack: Binary,
    ) -> Result<IbcBasicResponse, ContractError> {
        let acknowledgement = IbcAcknowledgement::new(ack);
        self.chain(at)
            .with_coordinator(|c| c.on_acknowledge(packet, &acknowledgement))
    }

    pub fn timeout(
        &mut self,
        at: Side,
        packet: &IbcPacket,
    ) -> Result<IbcBasicResponse, ContractError> {
        self.chain(at).with_coordinator(|c| c.on_timeout(packet))
    }

    /// Delivers every packet `from` has sent and feeds the acknowledgements
    /// back. Returns the decoded acknowledgements in send order.
    pub fn relay(&mut self, from: Side) -> Vec<Ack> {
        let packets = self.chain(from).take_outbox();
        packets
            .iter()
            .map(|packet| {
                let response = self.deliver(from.other(), packet);
                let ack = response.acknowledgement.unwrap();
                self.acknowledge(from, packet, ack.clone()).unwrap();
                Ack::decode(&ack).unwrap()
            })
            .collect()
    }

    /// Asserts both records of `pool_id` agree on balances, supply and status.
    pub fn assert_pools_agree(&self, pool_id: &str) {
        let a = self.a.pool(pool_id).unwrap();
        let b = self.b.pool(pool_id).unwrap();

        assert_eq!(a.status, b.status);
        assert_eq!(a.supply, b.supply);
        assert_eq!(a.assets.len(), b.assets.len());
        for (left, right) in a.assets.iter().zip(&b.assets) {
            assert_eq!(left.denom, right.denom);
            assert_eq!(left.balance, right.balance);
            assert_eq!(left.weight, right.weight);
            assert_eq!(left.side, right.side.flip());
        }
    }
}
