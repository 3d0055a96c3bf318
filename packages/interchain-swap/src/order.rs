use cosmwasm_schema::cw_serde;
use cosmwasm_std::{to_json_vec, Binary, Coin, StdResult, Timestamp};

#[cw_serde]
#[derive(Copy, Eq)]
pub enum OrderStatus {
    Pending,
    /// TAKE packet in flight
    Taking,
}

/// Multi asset deposit proposed by a maker on one chain and completed by a
/// taker on the other.
#[cw_serde]
pub struct MultiAssetDepositOrder {
    pub id: u64,
    pub pool_id: String,
    /// address on the chain the order was made on
    pub maker: String,
    /// address on the chain the order is taken on
    pub taker: String,
    /// one coin per pool asset
    pub deposits: Vec<Coin>,
    pub public_key: Option<Binary>,
    pub signature: Option<Binary>,
    pub status: OrderStatus,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
}

/// Document the taker signs to authorise its side of an order.
#[cw_serde]
pub struct OrderSignDoc {
    pub pool_id: String,
    pub order_id: u64,
    pub maker: String,
    pub taker: String,
    pub deposits: Vec<Coin>,
}

impl MultiAssetDepositOrder {
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }

    /// An order blocks new ones from the same maker until it expires, unless
    /// a TAKE is already in flight.
    pub fn is_live(&self, now: Timestamp) -> bool {
        self.status == OrderStatus::Taking || !self.is_expired(now)
    }

    pub fn sign_bytes(&self) -> StdResult<Vec<u8>> {
        to_json_vec(&OrderSignDoc {
            pool_id: self.pool_id.clone(),
            order_id: self.id,
            maker: self.maker.clone(),
            taker: self.taker.clone(),
            deposits: self.deposits.clone(),
        })
    }
}
