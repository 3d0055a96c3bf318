//! Drives an interchain pool through its packet round-trips.
//!
//! Local operations validate, escrow and send. The counterparty re-runs the
//! pricing against its own record in [`PacketCoordinator::on_receive`] and
//! answers with the authoritative result, which the sender commits in
//! [`PacketCoordinator::on_acknowledge`]. Error acknowledgements and timeouts
//! share a single refund path.

mod ack;
mod receive;
mod send;

use cosmwasm_std::{
    Addr, Api, Coin, Decimal256, Env, Event, IbcAcknowledgement, IbcBasicResponse, IbcPacket,
    IbcReceiveResponse, Response, StdError, Storage, Uint128,
};
use interchain_amm::{check_slippage, InterchainLiquidityPool, InterchainMarketMaker, PoolSide};
use log::{debug, info, warn};
use serde::Serialize;

use crate::{
    error::ContractError,
    escrow::escrow_addr,
    msg::InstantiateMsg,
    packet::{Ack, InterchainSwapPacketData, MessageType},
    ports::{ChannelTransport, Custody, SignatureVerifier},
    state::{PendingPacket, CONFIG, PENDING_PACKETS, POOLS, RECEIVED_PACKETS},
};

pub const EVENT_TYPE: &str = "interchain_swap";

pub fn instantiate(
    storage: &mut dyn Storage,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    msg.config.validate()?;
    CONFIG.save(storage, &msg.config)?;

    Ok(Response::new()
        .add_attribute("method", "instantiate_interchain_swap")
        .add_attribute("port", msg.config.port)
        .add_attribute("fee_rate", msg.config.fee_rate.to_string()))
}

pub struct PacketCoordinator<'a> {
    storage: &'a mut dyn Storage,
    api: &'a dyn Api,
    env: &'a Env,
    transport: &'a mut dyn ChannelTransport,
    custody: &'a mut dyn Custody,
    verifier: &'a dyn SignatureVerifier,
}

impl<'a> PacketCoordinator<'a> {
    pub fn new(
        storage: &'a mut dyn Storage,
        api: &'a dyn Api,
        env: &'a Env,
        transport: &'a mut dyn ChannelTransport,
        custody: &'a mut dyn Custody,
        verifier: &'a dyn SignatureVerifier,
    ) -> Self {
        PacketCoordinator {
            storage,
            api,
            env,
            transport,
            custody,
            verifier,
        }
    }

    pub fn pool(&self, pool_id: &str) -> Result<InterchainLiquidityPool, ContractError> {
        load_pool(self.storage, pool_id)
    }

    /// Handles an inbound packet exactly once per (destination channel,
    /// sequence). Failures become error acknowledgements and leave the local
    /// state untouched.
    pub fn on_receive(&mut self, packet: &IbcPacket) -> Result<IbcReceiveResponse, ContractError> {
        let key = (packet.dest.channel_id.as_str(), packet.sequence);
        if let Some(ack) = RECEIVED_PACKETS.may_load(self.storage, key)? {
            debug!(
                "packet {} on {} already received, replaying acknowledgement",
                packet.sequence, packet.dest.channel_id
            );
            return Ok(IbcReceiveResponse::new(ack)
                .add_attribute("method", "ibc_packet_receive")
                .add_attribute("action", "duplicate_packet"));
        }

        let (ack, event) = match self.receive(packet) {
            Ok((msg_type, ack)) => {
                info!(
                    "handled {} packet {} on {}",
                    msg_type.as_str(),
                    packet.sequence,
                    packet.dest.channel_id
                );
                let event = Event::new(EVENT_TYPE)
                    .add_attribute("action", format!("receive_{}", msg_type.as_str()))
                    .add_attribute("success", "true");
                (ack, event)
            }
            Err(err) => {
                warn!(
                    "rejecting packet {} on {}: {err}",
                    packet.sequence, packet.dest.channel_id
                );
                let event = Event::new(EVENT_TYPE)
                    .add_attribute("action", "receive_error")
                    .add_attribute("success", "false")
                    .add_attribute("error", err.to_string());
                (Ack::fail(err.to_string())?, event)
            }
        };

        RECEIVED_PACKETS.save(self.storage, key, &ack)?;

        Ok(IbcReceiveResponse::new(ack)
            .add_attribute("method", "ibc_packet_receive")
            .add_attribute("sequence", packet.sequence.to_string())
            .add_event(event))
    }

    /// Settles a dispatched packet. Only the first acknowledgement or timeout
    /// for a sequence has any effect.
    pub fn on_acknowledge(
        &mut self,
        packet: &IbcPacket,
        acknowledgement: &IbcAcknowledgement,
    ) -> Result<IbcBasicResponse, ContractError> {
        let data = InterchainSwapPacketData::decode(&packet.data)?;
        let Some(pending) = self.take_pending(packet)? else {
            return Ok(IbcBasicResponse::new()
                .add_attribute("method", "ibc_packet_ack")
                .add_attribute("action", "duplicate_acknowledgement"));
        };

        // an undecodable acknowledgement is treated like a rejection
        let outcome = Ack::decode(&acknowledgement.data)
            .unwrap_or_else(|err| Ack::Error(err.to_string()));

        match outcome {
            Ack::Result(result) => {
                info!(
                    "{} packet {} on {} acknowledged",
                    data.msg_type.as_str(),
                    packet.sequence,
                    packet.src.channel_id
                );
                self.commit(&data, &pending, &result)
            }
            Ack::Error(reason) => {
                warn!(
                    "{} packet {} on {} failed: {reason}",
                    data.msg_type.as_str(),
                    packet.sequence,
                    packet.src.channel_id
                );
                self.refund(&data, &pending, &reason)
            }
        }
    }

    pub fn on_timeout(&mut self, packet: &IbcPacket) -> Result<IbcBasicResponse, ContractError> {
        let data = InterchainSwapPacketData::decode(&packet.data)?;
        let Some(pending) = self.take_pending(packet)? else {
            return Ok(IbcBasicResponse::new()
                .add_attribute("method", "ibc_packet_timeout")
                .add_attribute("action", "duplicate_timeout"));
        };

        warn!(
            "{} packet {} on {} timed out",
            data.msg_type.as_str(),
            packet.sequence,
            packet.src.channel_id
        );
        self.refund(&data, &pending, "timeout")
    }

    fn take_pending(&mut self, packet: &IbcPacket) -> Result<Option<PendingPacket>, ContractError> {
        let key = (packet.src.channel_id.as_str(), packet.sequence);
        let pending = PENDING_PACKETS.may_load(self.storage, key)?;
        match pending {
            Some(_) => PENDING_PACKETS.remove(self.storage, key),
            None => debug!(
                "packet {} on {} already settled",
                packet.sequence, packet.src.channel_id
            ),
        }
        Ok(pending)
    }

    #[allow(clippy::too_many_arguments)]
    fn dispatch<T: Serialize>(
        &mut self,
        pool: &InterchainLiquidityPool,
        msg_type: MessageType,
        body: &T,
        sender: &str,
        refund: Vec<Coin>,
        timeout_height: Option<u64>,
        timeout_timestamp: Option<u64>,
    ) -> Result<u64, ContractError> {
        let config = CONFIG.load(self.storage)?;
        let data = InterchainSwapPacketData::new(msg_type, body)?.encode()?;
        let timeout = config.packet_timeout(self.env, timeout_height, timeout_timestamp);

        let escrow = self.escrow(pool)?.to_string();

        let sequence = self
            .transport
            .send_packet(&pool.port, &pool.channel, data, timeout)?;

        PENDING_PACKETS.save(
            self.storage,
            (pool.channel.as_str(), sequence),
            &PendingPacket {
                msg_type,
                pool_id: pool.id.clone(),
                sender: sender.to_string(),
                escrow,
                refund,
            },
        )?;

        info!(
            "sent {} packet {} for pool {} on {}/{}",
            msg_type.as_str(),
            sequence,
            pool.id,
            pool.port,
            pool.channel
        );
        Ok(sequence)
    }

    fn escrow(&self, pool: &InterchainLiquidityPool) -> Result<Addr, ContractError> {
        Ok(escrow_addr(self.api, &pool.port, &pool.channel)?)
    }

    fn market_maker<'p>(
        &self,
        pool: &'p InterchainLiquidityPool,
    ) -> Result<InterchainMarketMaker<'p>, ContractError> {
        let config = CONFIG.load(self.storage)?;
        Ok(InterchainMarketMaker::new(pool, config.fee_rate)?)
    }
}

fn load_pool(
    storage: &dyn Storage,
    pool_id: &str,
) -> Result<InterchainLiquidityPool, ContractError> {
    POOLS
        .may_load(storage, pool_id)?
        .ok_or_else(|| ContractError::PoolNotFound {
            pool_id: pool_id.to_string(),
        })
}

fn pool_event(action: &str, pool_id: &str) -> Event {
    Event::new(EVENT_TYPE)
        .add_attribute("action", action)
        .add_attribute("pool_id", pool_id)
}

fn validate_coin(coin: &Coin) -> Result<(), ContractError> {
    if coin.denom.trim().is_empty() {
        return Err(ContractError::EmptyDenom {});
    }
    if coin.amount.is_zero() {
        return Err(ContractError::ZeroAmount {
            denom: coin.denom.clone(),
        });
    }
    Ok(())
}

fn side_of(pool: &InterchainLiquidityPool, denom: &str) -> Result<PoolSide, ContractError> {
    Ok(pool.find_asset(denom)?.side)
}

fn ensure_native(pool: &InterchainLiquidityPool, denom: &str) -> Result<(), ContractError> {
    if side_of(pool, denom)? != PoolSide::Native {
        return Err(ContractError::NotNativeAsset {
            denom: denom.to_string(),
        });
    }
    Ok(())
}

/// Non-zero coins among `coins` issued on this chain.
fn native_coins(
    pool: &InterchainLiquidityPool,
    coins: &[Coin],
) -> Result<Vec<Coin>, ContractError> {
    let mut native = vec![];
    for coin in coins {
        if side_of(pool, &coin.denom)? == PoolSide::Native && !coin.amount.is_zero() {
            native.push(coin.clone());
        }
    }
    Ok(native)
}

/// Sum of the share coins minted for the tokens on `side`.
fn shares_for_side(
    pool: &InterchainLiquidityPool,
    tokens: &[Coin],
    shares: &[Coin],
    side: PoolSide,
) -> Result<Coin, ContractError> {
    let mut total = Uint128::zero();
    for (token, share) in tokens.iter().zip(shares) {
        if side_of(pool, &token.denom)? == side {
            total = total.checked_add(share.amount).map_err(StdError::from)?;
        }
    }
    Ok(Coin::new(total, pool.supply.denom.clone()))
}

fn check_amount_slippage(
    expected: &Coin,
    actual: &Coin,
    tolerance_bps: u32,
) -> Result<(), ContractError> {
    if expected.denom != actual.denom {
        return Err(ContractError::InvalidPacket(format!(
            "expected {} but computed {}",
            expected.denom, actual.denom
        )));
    }
    check_slippage(
        Decimal256::from_ratio(expected.amount, 1u128),
        Decimal256::from_ratio(actual.amount, 1u128),
        tolerance_bps,
    )?;
    Ok(())
}

fn ensure_binding(pool: &InterchainLiquidityPool, packet: &IbcPacket) -> Result<(), ContractError> {
    if packet.dest.port_id != pool.port {
        return Err(ContractError::InvalidPort {
            expected: pool.port.clone(),
            actual: packet.dest.port_id.clone(),
        });
    }
    if packet.dest.channel_id != pool.channel {
        return Err(ContractError::InvalidChannel {
            expected: pool.channel.clone(),
            actual: packet.dest.channel_id.clone(),
        });
    }
    if packet.src.port_id != pool.counterparty_port {
        return Err(ContractError::InvalidPort {
            expected: pool.counterparty_port.clone(),
            actual: packet.src.port_id.clone(),
        });
    }
    if packet.src.channel_id != pool.counterparty_channel {
        return Err(ContractError::InvalidChannel {
            expected: pool.counterparty_channel.clone(),
            actual: packet.src.channel_id.clone(),
        });
    }
    Ok(())
}
