use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Binary, Coin, Order, StdResult, Storage, Timestamp};
use cw_storage_plus::{Item, Map};
use interchain_amm::InterchainLiquidityPool;

use crate::{config::SwapConfig, order::MultiAssetDepositOrder, packet::MessageType};

pub const CONFIG: Item<SwapConfig> = Item::new("config");
pub const POOLS: Map<&str, InterchainLiquidityPool> = Map::new("pools");
// (source channel, sequence) of packets waiting for an acknowledgement
pub const PENDING_PACKETS: Map<(&str, u64), PendingPacket> = Map::new("pending_packets");
// (destination channel, sequence) of packets already handled, with their ack
pub const RECEIVED_PACKETS: Map<(&str, u64), Binary> = Map::new("received_packets");
// orders made on the counterparty chain, to be taken here
pub const INCOMING_ORDERS: Map<(&str, u64), MultiAssetDepositOrder> = Map::new("incoming_orders");
// orders made here, maker funds held in escrow
pub const OUTBOUND_ORDERS: Map<(&str, u64), MultiAssetDepositOrder> = Map::new("outbound_orders");
pub const ORDER_SEQUENCE: Item<u64> = Item::new("order_sequence");

/// Everything needed to undo a dispatched packet.
#[cw_serde]
pub struct PendingPacket {
    pub msg_type: MessageType,
    pub pool_id: String,
    pub sender: String,
    pub escrow: String,
    /// returned from escrow to the sender if the packet fails
    pub refund: Vec<Coin>,
}

pub fn next_order_id(storage: &mut dyn Storage) -> StdResult<u64> {
    let id = ORDER_SEQUENCE.may_load(storage)?.unwrap_or_default() + 1;
    ORDER_SEQUENCE.save(storage, &id)?;
    Ok(id)
}

/// Any order of `maker` in `pool_id`, expired or not.
pub fn order_of_maker(
    storage: &dyn Storage,
    orders: &Map<(&str, u64), MultiAssetDepositOrder>,
    pool_id: &str,
    maker: &str,
) -> StdResult<Option<MultiAssetDepositOrder>> {
    for item in orders.prefix(pool_id).range(storage, None, None, Order::Ascending) {
        let (_, order) = item?;
        if order.maker == maker {
            return Ok(Some(order));
        }
    }
    Ok(None)
}

/// Live order of `maker` in `pool_id`, if any.
pub fn live_order(
    storage: &dyn Storage,
    orders: &Map<(&str, u64), MultiAssetDepositOrder>,
    pool_id: &str,
    maker: &str,
    now: Timestamp,
) -> StdResult<Option<MultiAssetDepositOrder>> {
    for item in orders.prefix(pool_id).range(storage, None, None, Order::Ascending) {
        let (_, order) = item?;
        if order.maker == maker && order.is_live(now) {
            return Ok(Some(order));
        }
    }
    Ok(None)
}

/// Stale orders of `maker` in `pool_id`, replaced by a newer one.
pub fn expired_orders(
    storage: &dyn Storage,
    orders: &Map<(&str, u64), MultiAssetDepositOrder>,
    pool_id: &str,
    maker: &str,
    now: Timestamp,
) -> StdResult<Vec<u64>> {
    orders
        .prefix(pool_id)
        .range(storage, None, None, Order::Ascending)
        .filter_map(|item| match item {
            Ok((id, order)) if order.maker == maker && !order.is_live(now) => Some(Ok(id)),
            Ok(_) => None,
            Err(err) => Some(Err(err)),
        })
        .collect()
}
