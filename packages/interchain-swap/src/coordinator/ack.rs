use cosmwasm_std::{Binary, Coin, Event, IbcBasicResponse};
use interchain_amm::PoolStatus;
use log::{info, warn};

use super::{load_pool, native_coins, PacketCoordinator, EVENT_TYPE};
use crate::{
    error::ContractError,
    lifecycle::transition,
    order::OrderStatus,
    packet::{
        Ack, CancelPoolPacket, DepositPacket, DepositResult, InterchainSwapPacketData,
        MakeOrderPacket, MessageType, MultiWithdrawPacket, MultiWithdrawResult, SwapPacket,
        SwapResult, TakeOrderPacket, TakeOrderResult, WithdrawPacket, WithdrawResult,
    },
    state::{PendingPacket, INCOMING_ORDERS, OUTBOUND_ORDERS, POOLS},
};

impl PacketCoordinator<'_> {
    /// Applies the counterparty's result to the local record.
    pub(super) fn commit(
        &mut self,
        data: &InterchainSwapPacketData,
        pending: &PendingPacket,
        result: &Binary,
    ) -> Result<IbcBasicResponse, ContractError> {
        match data.msg_type {
            // nothing to settle, the records already agree
            MessageType::Create | MessageType::MakeMultiDeposit => {}
            MessageType::Deposit => self.commit_deposit(data.body()?, pending, Ack::result(result)?)?,
            MessageType::Withdraw => {
                self.commit_withdraw(data.body()?, pending, Ack::result(result)?)?
            }
            MessageType::LeftSwap | MessageType::RightSwap => {
                self.commit_swap(data.body()?, pending, Ack::result(result)?)?
            }
            MessageType::TakeMultiDeposit => {
                self.commit_take_order(data.body()?, pending, Ack::result(result)?)?
            }
            MessageType::MultiWithdraw => {
                self.commit_multi_withdraw(data.body()?, pending, Ack::result(result)?)?
            }
            MessageType::Cancel => self.commit_cancel_pool(data.body()?)?,
        }

        Ok(IbcBasicResponse::new()
            .add_attribute("method", "ibc_packet_ack")
            .add_attribute("pool_id", &pending.pool_id)
            .add_event(
                Event::new(EVENT_TYPE)
                    .add_attribute("action", format!("ack_{}", data.msg_type.as_str()))
                    .add_attribute("pool_id", &pending.pool_id)
                    .add_attribute("success", "true"),
            ))
    }

    /// Returns the escrowed funds and rolls back whatever the send path
    /// recorded optimistically.
    pub(super) fn refund(
        &mut self,
        data: &InterchainSwapPacketData,
        pending: &PendingPacket,
        reason: &str,
    ) -> Result<IbcBasicResponse, ContractError> {
        let mut release = !pending.refund.is_empty();

        match data.msg_type {
            MessageType::Create => {
                if let Some(pool) = POOLS.may_load(self.storage, &pending.pool_id)? {
                    if matches!(pool.status, PoolStatus::Initialized | PoolStatus::Cancelled) {
                        POOLS.remove(self.storage, &pool.id);
                    }
                }
            }
            MessageType::Cancel => {
                // a timed out create may already have dropped the pool
                if let Some(mut pool) = POOLS.may_load(self.storage, &pending.pool_id)? {
                    if pool.status == PoolStatus::Cancelled {
                        transition(&mut pool, PoolStatus::Initialized)?;
                        POOLS.save(self.storage, &pool.id, &pool)?;
                    }
                }
            }
            MessageType::MakeMultiDeposit => {
                let body: MakeOrderPacket = data.body()?;
                let key = (body.order.pool_id.as_str(), body.order.id);
                // cancelling the order already returned the deposit
                if OUTBOUND_ORDERS.has(self.storage, key) {
                    OUTBOUND_ORDERS.remove(self.storage, key);
                } else {
                    release = false;
                }
            }
            MessageType::TakeMultiDeposit => {
                let body: TakeOrderPacket = data.body()?;
                let key = (body.pool_id.as_str(), body.order_id);
                if let Some(mut order) = INCOMING_ORDERS.may_load(self.storage, key)? {
                    order.status = OrderStatus::Pending;
                    order.public_key = None;
                    order.signature = None;
                    INCOMING_ORDERS.save(self.storage, key, &order)?;
                }
            }
            _ => {}
        }

        if release {
            self.custody
                .release(&pending.escrow, &pending.sender, &pending.refund)?;
        }

        warn!(
            "refunded {} packet for pool {} to {}: {reason}",
            data.msg_type.as_str(),
            pending.pool_id,
            pending.sender
        );

        Ok(IbcBasicResponse::new()
            .add_attribute("method", "refund")
            .add_attribute("pool_id", &pending.pool_id)
            .add_event(
                Event::new(EVENT_TYPE)
                    .add_attribute("action", format!("refund_{}", data.msg_type.as_str()))
                    .add_attribute("pool_id", &pending.pool_id)
                    .add_attribute("success", "false")
                    .add_attribute("error", reason),
            ))
    }

    fn commit_deposit(
        &mut self,
        body: DepositPacket,
        pending: &PendingPacket,
        result: DepositResult,
    ) -> Result<(), ContractError> {
        let mut pool = load_pool(self.storage, &body.pool_id)?;
        pool.ensure_share_denom(&result.supply.denom)?;

        if pool.status == PoolStatus::Initialized {
            // the counterparty certified the supply including the creator's shares
            pool.supply = result.supply;
            transition(&mut pool, PoolStatus::Active)?;
            info!("pool {} is active", pool.id);
        } else {
            pool.add_asset(&body.token)?;
            pool.add_supply(&result.pool_token)?;
        }

        self.custody.mint_share(&pending.sender, &result.pool_token)?;
        POOLS.save(self.storage, &pool.id, &pool)?;
        Ok(())
    }

    fn commit_withdraw(
        &mut self,
        body: WithdrawPacket,
        pending: &PendingPacket,
        result: WithdrawResult,
    ) -> Result<(), ContractError> {
        let mut pool = load_pool(self.storage, &body.pool_id)?;
        pool.subtract_asset(&result.token_out)?;
        pool.subtract_supply(&body.pool_token)?;

        self.custody.burn_share(&pending.escrow, &body.pool_token)?;
        self.custody
            .release(&pending.escrow, &pending.sender, &[result.token_out])?;
        POOLS.save(self.storage, &pool.id, &pool)?;
        Ok(())
    }

    fn commit_swap(
        &mut self,
        body: SwapPacket,
        pending: &PendingPacket,
        result: SwapResult,
    ) -> Result<(), ContractError> {
        let mut pool = load_pool(self.storage, &body.pool_id)?;
        pool.add_asset(&result.token_in)?;
        pool.subtract_asset(&result.token_out)?;

        // an exact-out swap may have needed less than the escrowed cap
        let unused = body.token_in.amount.saturating_sub(result.token_in.amount);
        if !unused.is_zero() {
            self.custody.release(
                &pending.escrow,
                &pending.sender,
                &[Coin::new(unused, body.token_in.denom)],
            )?;
        }
        POOLS.save(self.storage, &pool.id, &pool)?;
        Ok(())
    }

    fn commit_take_order(
        &mut self,
        body: TakeOrderPacket,
        pending: &PendingPacket,
        result: TakeOrderResult,
    ) -> Result<(), ContractError> {
        let mut pool = load_pool(self.storage, &body.pool_id)?;
        let key = (body.pool_id.as_str(), body.order_id);
        let order = INCOMING_ORDERS
            .may_load(self.storage, key)?
            .ok_or_else(|| ContractError::OrderNotFound {
                pool_id: body.pool_id.clone(),
                order_id: body.order_id,
            })?;

        for deposit in &order.deposits {
            pool.add_asset(deposit)?;
        }
        pool.add_supply(&result.maker_shares)?;
        pool.add_supply(&result.taker_shares)?;

        self.custody.mint_share(&pending.sender, &result.taker_shares)?;
        INCOMING_ORDERS.remove(self.storage, key);
        POOLS.save(self.storage, &pool.id, &pool)?;
        Ok(())
    }

    fn commit_multi_withdraw(
        &mut self,
        body: MultiWithdrawPacket,
        pending: &PendingPacket,
        result: MultiWithdrawResult,
    ) -> Result<(), ContractError> {
        let mut pool = load_pool(self.storage, &body.pool_id)?;
        for token in &result.tokens_out {
            pool.subtract_asset(token)?;
        }
        pool.subtract_supply(&body.pool_token)?;

        let payout = native_coins(&pool, &result.tokens_out)?;
        self.custody.burn_share(&pending.escrow, &body.pool_token)?;
        if !payout.is_empty() {
            self.custody
                .release(&pending.escrow, &pending.sender, &payout)?;
        }
        POOLS.save(self.storage, &pool.id, &pool)?;
        Ok(())
    }

    fn commit_cancel_pool(&mut self, body: CancelPoolPacket) -> Result<(), ContractError> {
        let Some(pool) = POOLS.may_load(self.storage, &body.pool_id)? else {
            return Ok(());
        };
        if pool.status != PoolStatus::Cancelled {
            return Ok(());
        }

        let liquidity: Vec<Coin> = pool
            .native_assets()
            .map(|asset| Coin::new(asset.balance, asset.denom.clone()))
            .collect();
        let escrow = self.escrow(&pool)?;
        self.custody
            .release(escrow.as_str(), &pool.creator, &liquidity)?;
        POOLS.remove(self.storage, &pool.id);

        info!("pool {} cancelled, liquidity returned to {}", pool.id, pool.creator);
        Ok(())
    }
}
