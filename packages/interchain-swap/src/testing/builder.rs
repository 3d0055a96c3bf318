use cosmwasm_std::{
    testing::{mock_env, MockApi, MockStorage},
    Coin, IbcEndpoint,
};

use super::{
    mocks::{MockBank, MockChannel},
    suite::{ChainSuite, Side, TwoChainSuite},
};
use crate::{config::SwapConfig, coordinator::instantiate, msg::InstantiateMsg};

pub const PREFIX_A: &str = "osmo";
pub const PREFIX_B: &str = "cosmos";
pub const CHANNEL_A: &str = "channel-0";
pub const CHANNEL_B: &str = "channel-7";

pub struct TwoChainSuiteBuilder {
    pub config: SwapConfig,
    pub verify_signatures: bool,
    pub balances: Vec<(Side, String, Vec<Coin>)>,
}

impl Default for TwoChainSuiteBuilder {
    fn default() -> Self {
        TwoChainSuiteBuilder {
            config: SwapConfig::default(),
            verify_signatures: false,
            balances: vec![],
        }
    }
}

impl TwoChainSuiteBuilder {
    pub fn with_config(mut self, config: SwapConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_fee_rate(mut self, fee_rate: u32) -> Self {
        self.config.fee_rate = fee_rate;
        self
    }

    pub fn with_secp256k1(mut self) -> Self {
        self.verify_signatures = true;
        self
    }

    /// Funds the address `label` resolves to on `side`.
    pub fn with_balance(mut self, side: Side, label: &str, coins: Vec<Coin>) -> Self {
        self.balances.push((side, label.to_string(), coins));
        self
    }

    pub fn build(self) -> TwoChainSuite {
        let endpoint_a = IbcEndpoint {
            port_id: self.config.port.clone(),
            channel_id: CHANNEL_A.to_string(),
        };
        let endpoint_b = IbcEndpoint {
            port_id: self.config.port.clone(),
            channel_id: CHANNEL_B.to_string(),
        };

        let mut suite = TwoChainSuite {
            a: self.chain(PREFIX_A, endpoint_a.clone(), endpoint_b.clone()),
            b: self.chain(PREFIX_B, endpoint_b, endpoint_a),
        };

        for (side, label, coins) in &self.balances {
            let chain = suite.chain(*side);
            let addr = chain.addr(label);
            chain.fund(&addr, coins);
        }
        suite
    }

    fn chain(&self, prefix: &'static str, local: IbcEndpoint, remote: IbcEndpoint) -> ChainSuite {
        let mut storage = MockStorage::new();
        instantiate(
            &mut storage,
            InstantiateMsg {
                config: self.config.clone(),
            },
        )
        .unwrap();

        ChainSuite {
            storage,
            api: MockApi::default().with_prefix(prefix),
            env: mock_env(),
            bank: MockBank::default(),
            channel: MockChannel::new(local, remote),
            verify_signatures: self.verify_signatures,
        }
    }
}
