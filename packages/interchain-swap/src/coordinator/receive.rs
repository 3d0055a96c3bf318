use cosmwasm_std::{Binary, Coin, IbcPacket, Uint128};
use interchain_amm::{AmmError, InterchainLiquidityPool, PoolSide, PoolStatus};

use super::{
    check_amount_slippage, ensure_binding, load_pool, native_coins, shares_for_side, side_of,
    PacketCoordinator,
};
use crate::{
    error::ContractError,
    lifecycle::{ensure_active, ensure_status, transition},
    order::OrderStatus,
    packet::{
        Ack, CancelPoolPacket, CreatePoolPacket, DepositPacket, DepositResult,
        InterchainSwapPacketData, MakeOrderPacket, MessageType, MultiWithdrawPacket,
        MultiWithdrawResult, OrderAck, PoolAck, SwapPacket, SwapResult, TakeOrderPacket,
        TakeOrderResult, WithdrawPacket, WithdrawResult,
    },
    state::{expired_orders, live_order, INCOMING_ORDERS, OUTBOUND_ORDERS, POOLS},
};

// Every handler checks and computes against a local copy first. Custody
// calls and storage writes only happen once nothing else can fail.
impl PacketCoordinator<'_> {
    pub(super) fn receive(
        &mut self,
        packet: &IbcPacket,
    ) -> Result<(MessageType, Binary), ContractError> {
        let data = InterchainSwapPacketData::decode(&packet.data)?;
        let ack = match data.msg_type {
            MessageType::Create => self.receive_create_pool(packet, data.body()?)?,
            MessageType::Deposit => self.receive_deposit(packet, data.body()?)?,
            MessageType::Withdraw => self.receive_withdraw(packet, data.body()?)?,
            MessageType::LeftSwap => self.receive_swap(packet, data.body()?, false)?,
            MessageType::RightSwap => self.receive_swap(packet, data.body()?, true)?,
            MessageType::MakeMultiDeposit => self.receive_make_order(packet, data.body()?)?,
            MessageType::TakeMultiDeposit => self.receive_take_order(packet, data.body()?)?,
            MessageType::MultiWithdraw => self.receive_multi_withdraw(packet, data.body()?)?,
            MessageType::Cancel => self.receive_cancel_pool(packet, data.body()?)?,
        };
        Ok((data.msg_type, ack))
    }

    fn receive_create_pool(
        &mut self,
        packet: &IbcPacket,
        body: CreatePoolPacket,
    ) -> Result<Binary, ContractError> {
        let announced = body.pool.mirrored();

        // rebuild from the announced parts so ids and assets are re-validated
        let mut pool = InterchainLiquidityPool::new(
            announced.creator,
            announced.counterparty_creator,
            announced.assets,
            announced.port,
            announced.channel,
            announced.counterparty_port,
            announced.counterparty_channel,
        )?;
        if pool.id != announced.id {
            return Err(ContractError::InvalidPacket(format!(
                "pool id {} does not match its assets",
                announced.id
            )));
        }
        ensure_binding(&pool, packet)?;
        if POOLS.has(self.storage, &pool.id) {
            return Err(ContractError::PoolAlreadyExists { pool_id: pool.id });
        }

        transition(&mut pool, PoolStatus::Initialized)?;
        POOLS.save(self.storage, &pool.id, &pool)?;

        Ok(Ack::success(&PoolAck { pool_id: pool.id })?)
    }

    fn receive_deposit(
        &mut self,
        packet: &IbcPacket,
        body: DepositPacket,
    ) -> Result<Binary, ContractError> {
        let mut pool = load_pool(self.storage, &body.pool_id)?;
        ensure_binding(&pool, packet)?;
        if side_of(&pool, &body.token.denom)? != PoolSide::Remote {
            return Err(ContractError::InvalidPacket(format!(
                "{} is not issued on the sending chain",
                body.token.denom
            )));
        }

        let amm = self.market_maker(&pool)?;
        let shares = amm.deposit_single_asset(&body.token)?;
        check_amount_slippage(&body.expected_shares, &shares, body.tolerance_bps)?;

        match pool.status {
            PoolStatus::Initialized => {
                // the counterparty creator's deposit activates the pool
                if body.sender != pool.counterparty_creator {
                    return Err(ContractError::Unauthorized {});
                }
                let declared = pool.find_asset(&body.token.denom)?.balance;
                if body.token.amount != declared {
                    return Err(ContractError::InvalidInitialDeposit {
                        expected: Coin::new(declared, body.token.denom.clone()).to_string(),
                        actual: body.token.to_string(),
                    });
                }

                let mut creator_shares = Uint128::zero();
                for asset in pool.native_assets() {
                    let genesis =
                        amm.deposit_single_asset(&Coin::new(asset.balance, asset.denom.clone()))?;
                    creator_shares = creator_shares
                        .checked_add(genesis.amount)
                        .map_err(AmmError::from)?;
                }
                let creator_shares = Coin::new(creator_shares, pool.id.clone());

                pool.add_supply(&creator_shares)?;
                pool.add_supply(&shares)?;
                transition(&mut pool, PoolStatus::Active)?;

                self.custody.mint_share(&pool.creator, &creator_shares)?;
            }
            PoolStatus::Active => {
                pool.add_asset(&body.token)?;
                pool.add_supply(&shares)?;
            }
            _ => ensure_active(&pool)?,
        }

        POOLS.save(self.storage, &pool.id, &pool)?;

        Ok(Ack::success(&DepositResult {
            pool_token: shares,
            supply: pool.supply,
        })?)
    }

    fn receive_withdraw(
        &mut self,
        packet: &IbcPacket,
        body: WithdrawPacket,
    ) -> Result<Binary, ContractError> {
        let mut pool = load_pool(self.storage, &body.pool_id)?;
        ensure_binding(&pool, packet)?;
        ensure_active(&pool)?;
        let denom_out = body.expected_out.denom.as_str();
        if side_of(&pool, denom_out)? != PoolSide::Remote {
            return Err(ContractError::InvalidPacket(format!(
                "{denom_out} is not issued on the sending chain"
            )));
        }

        let token_out = self
            .market_maker(&pool)?
            .single_withdraw(&body.pool_token, denom_out)?;
        check_amount_slippage(&body.expected_out, &token_out, body.tolerance_bps)?;

        pool.subtract_asset(&token_out)?;
        pool.subtract_supply(&body.pool_token)?;
        POOLS.save(self.storage, &pool.id, &pool)?;

        Ok(Ack::success(&WithdrawResult { token_out })?)
    }

    fn receive_multi_withdraw(
        &mut self,
        packet: &IbcPacket,
        body: MultiWithdrawPacket,
    ) -> Result<Binary, ContractError> {
        let mut pool = load_pool(self.storage, &body.pool_id)?;
        ensure_binding(&pool, packet)?;
        ensure_active(&pool)?;
        let receiver = self.api.addr_validate(&body.counterparty_receiver)?;

        let tokens_out = self
            .market_maker(&pool)?
            .multi_asset_withdraw(&body.pool_token)?;
        if tokens_out.len() != body.expected_outs.len() {
            return Err(ContractError::MismatchedLengths {
                expected: tokens_out.len(),
                actual: body.expected_outs.len(),
            });
        }
        for (expected, actual) in body.expected_outs.iter().zip(&tokens_out) {
            check_amount_slippage(expected, actual, body.tolerance_bps)?;
        }

        for token in &tokens_out {
            pool.subtract_asset(token)?;
        }
        pool.subtract_supply(&body.pool_token)?;

        let payout = native_coins(&pool, &tokens_out)?;
        if !payout.is_empty() {
            let escrow = self.escrow(&pool)?;
            self.custody
                .release(escrow.as_str(), receiver.as_str(), &payout)?;
        }
        POOLS.save(self.storage, &pool.id, &pool)?;

        Ok(Ack::success(&MultiWithdrawResult { tokens_out })?)
    }

    fn receive_swap(
        &mut self,
        packet: &IbcPacket,
        body: SwapPacket,
        exact_out: bool,
    ) -> Result<Binary, ContractError> {
        let mut pool = load_pool(self.storage, &body.pool_id)?;
        ensure_binding(&pool, packet)?;
        ensure_active(&pool)?;
        if side_of(&pool, &body.token_in.denom)? != PoolSide::Remote
            || side_of(&pool, &body.token_out.denom)? != PoolSide::Native
        {
            return Err(AmmError::InvalidDenomPair {
                denom_in: body.token_in.denom,
                denom_out: body.token_out.denom,
            }
            .into());
        }
        let recipient = self.api.addr_validate(&body.recipient)?;

        let amm = self.market_maker(&pool)?;
        let (token_in, token_out) = if exact_out {
            let required = amm.right_swap(&body.token_in.denom, &body.token_out)?;
            if required.amount > body.token_in.amount {
                return Err(AmmError::SlippageExceeded {
                    expected: body.token_in.amount.to_string(),
                    actual: required.amount.to_string(),
                    tolerance_bps: body.tolerance_bps,
                }
                .into());
            }
            (required, body.token_out)
        } else {
            let token_out = amm.left_swap(&body.token_in, &body.token_out.denom)?;
            check_amount_slippage(&body.token_out, &token_out, body.tolerance_bps)?;
            (body.token_in, token_out)
        };

        pool.add_asset(&token_in)?;
        pool.subtract_asset(&token_out)?;

        let escrow = self.escrow(&pool)?;
        self.custody.release(
            escrow.as_str(),
            recipient.as_str(),
            &[token_out.clone()],
        )?;
        POOLS.save(self.storage, &pool.id, &pool)?;

        Ok(Ack::success(&SwapResult {
            token_in,
            token_out,
        })?)
    }

    fn receive_make_order(
        &mut self,
        packet: &IbcPacket,
        body: MakeOrderPacket,
    ) -> Result<Binary, ContractError> {
        let mut order = body.order;
        let pool = load_pool(self.storage, &order.pool_id)?;
        ensure_binding(&pool, packet)?;
        ensure_active(&pool)?;
        if order.deposits.len() != pool.assets.len() {
            return Err(ContractError::MismatchedLengths {
                expected: pool.assets.len(),
                actual: order.deposits.len(),
            });
        }
        for deposit in &order.deposits {
            side_of(&pool, &deposit.denom)?;
        }

        let now = self.env.block.time;
        let key = (pool.id.as_str(), order.id);
        if INCOMING_ORDERS.has(self.storage, key)
            || live_order(self.storage, &INCOMING_ORDERS, &pool.id, &order.maker, now)?.is_some()
        {
            return Err(ContractError::OrderAlreadyPending {
                pool_id: pool.id.clone(),
                maker: order.maker.clone(),
            });
        }

        // an expired order from the same maker is replaced
        for stale in expired_orders(self.storage, &INCOMING_ORDERS, &pool.id, &order.maker, now)? {
            INCOMING_ORDERS.remove(self.storage, (pool.id.as_str(), stale));
        }

        order.status = OrderStatus::Pending;
        order.public_key = None;
        order.signature = None;
        INCOMING_ORDERS.save(self.storage, key, &order)?;

        Ok(Ack::success(&OrderAck {
            pool_id: pool.id.clone(),
            order_id: order.id,
        })?)
    }

    fn receive_take_order(
        &mut self,
        packet: &IbcPacket,
        body: TakeOrderPacket,
    ) -> Result<Binary, ContractError> {
        let mut pool = load_pool(self.storage, &body.pool_id)?;
        ensure_binding(&pool, packet)?;
        ensure_active(&pool)?;

        // a missing order was cancelled by its maker
        let order = OUTBOUND_ORDERS
            .may_load(self.storage, (pool.id.as_str(), body.order_id))?
            .ok_or_else(|| ContractError::OrderNotFound {
                pool_id: pool.id.clone(),
                order_id: body.order_id,
            })?;
        if order.taker != body.taker {
            return Err(ContractError::Unauthorized {});
        }
        // the taker address is foreign here, so only the signature is checked
        self.verifier.verify(
            None,
            body.public_key.as_slice(),
            &order.sign_bytes()?,
            body.signature.as_slice(),
        )?;

        let shares = self
            .market_maker(&pool)?
            .deposit_multi_asset(&order.deposits, body.tolerance_bps)?;
        let maker_shares = shares_for_side(&pool, &order.deposits, &shares, PoolSide::Native)?;
        let taker_shares = shares_for_side(&pool, &order.deposits, &shares, PoolSide::Remote)?;

        for deposit in &order.deposits {
            pool.add_asset(deposit)?;
        }
        pool.add_supply(&maker_shares)?;
        pool.add_supply(&taker_shares)?;

        self.custody.mint_share(&order.maker, &maker_shares)?;
        OUTBOUND_ORDERS.remove(self.storage, (pool.id.as_str(), order.id));
        POOLS.save(self.storage, &pool.id, &pool)?;

        Ok(Ack::success(&TakeOrderResult {
            maker_shares,
            taker_shares,
        })?)
    }

    fn receive_cancel_pool(
        &mut self,
        packet: &IbcPacket,
        body: CancelPoolPacket,
    ) -> Result<Binary, ContractError> {
        let pool = load_pool(self.storage, &body.pool_id)?;
        ensure_binding(&pool, packet)?;
        if body.sender != pool.creator {
            return Err(ContractError::Unauthorized {});
        }
        ensure_status(&pool, PoolStatus::Initialized)?;

        POOLS.remove(self.storage, &pool.id);

        Ok(Ack::success(&PoolAck { pool_id: pool.id })?)
    }
}
