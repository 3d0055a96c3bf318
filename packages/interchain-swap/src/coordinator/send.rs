use cosmwasm_std::{Coin, Response};
use interchain_amm::{
    ensure_tolerance, AmmError, InterchainLiquidityPool, PoolSide, PoolStatus, MAX_TOLERANCE_BPS,
};
use log::info;

use super::{
    ensure_native, load_pool, native_coins, pool_event, side_of, validate_coin, PacketCoordinator,
};
use crate::{
    error::ContractError,
    lifecycle::{ensure_active, ensure_status, transition},
    msg::{
        MsgCancelMultiAssetDeposit, MsgCancelPool, MsgCreatePool, MsgMakeMultiAssetDeposit,
        MsgMultiAssetWithdraw, MsgSingleAssetDeposit, MsgSingleAssetWithdraw, MsgSwap,
        MsgTakeMultiAssetDeposit, SwapType,
    },
    order::{MultiAssetDepositOrder, OrderStatus},
    packet::{
        CancelPoolPacket, CreatePoolPacket, DepositPacket, MakeOrderPacket, MessageType,
        MultiWithdrawPacket, SwapPacket, TakeOrderPacket, WithdrawPacket,
    },
    state::{next_order_id, order_of_maker, CONFIG, INCOMING_ORDERS, OUTBOUND_ORDERS, POOLS},
};

impl PacketCoordinator<'_> {
    /// Escrows the creator's native liquidity and announces the pool to the
    /// counterparty.
    pub fn create_pool(&mut self, msg: MsgCreatePool) -> Result<Response, ContractError> {
        let config = CONFIG.load(self.storage)?;
        let sender = self.api.addr_validate(&msg.sender)?;
        if msg.counterparty_creator.trim().is_empty() {
            return Err(ContractError::Unauthorized {});
        }
        if msg.port != config.port {
            return Err(ContractError::InvalidPort {
                expected: config.port,
                actual: msg.port,
            });
        }
        for asset in &msg.liquidity {
            validate_coin(&Coin::new(asset.balance, asset.denom.clone()))?;
        }

        let counterparty = self.transport.counterparty(&msg.port, &msg.channel)?;
        let mut pool = InterchainLiquidityPool::new(
            sender.as_str(),
            msg.counterparty_creator,
            msg.liquidity,
            msg.port,
            msg.channel,
            counterparty.port_id,
            counterparty.channel_id,
        )?;
        if POOLS.has(self.storage, &pool.id) {
            return Err(ContractError::PoolAlreadyExists { pool_id: pool.id });
        }

        let deposits: Vec<Coin> = pool
            .native_assets()
            .map(|asset| Coin::new(asset.balance, asset.denom.clone()))
            .collect();
        if deposits.is_empty() || deposits.len() == pool.assets.len() {
            return Err(ContractError::InvalidPoolSides {});
        }

        let escrow = self.escrow(&pool)?;
        self.custody.lock(sender.as_str(), escrow.as_str(), &deposits)?;

        transition(&mut pool, PoolStatus::Initialized)?;
        POOLS.save(self.storage, &pool.id, &pool)?;

        let sequence = self.dispatch(
            &pool,
            MessageType::Create,
            &CreatePoolPacket { pool: pool.clone() },
            sender.as_str(),
            deposits,
            msg.timeout_height,
            msg.timeout_timestamp,
        )?;

        Ok(Response::new()
            .add_attribute("action", "create_pool")
            .add_attribute("pool_id", &pool.id)
            .add_attribute("sequence", sequence.to_string())
            .add_event(pool_event("create_pool", &pool.id).add_attribute("creator", sender)))
    }

    /// Deposits a native asset. While the pool waits for its counterparty
    /// liquidity this is the counterparty creator's initial deposit, which
    /// must match the declared balance exactly.
    pub fn single_asset_deposit(
        &mut self,
        msg: MsgSingleAssetDeposit,
    ) -> Result<Response, ContractError> {
        let sender = self.api.addr_validate(&msg.sender)?;
        validate_coin(&msg.token)?;
        ensure_tolerance(msg.slippage_bps)?;

        let pool = load_pool(self.storage, &msg.pool_id)?;
        ensure_native(&pool, &msg.token.denom)?;

        match pool.status {
            PoolStatus::Initialized => {
                if sender.as_str() != pool.counterparty_creator {
                    return Err(ContractError::Unauthorized {});
                }
                let declared = pool.find_asset(&msg.token.denom)?.balance;
                if msg.token.amount != declared {
                    return Err(ContractError::InvalidInitialDeposit {
                        expected: Coin::new(declared, msg.token.denom.clone()).to_string(),
                        actual: msg.token.to_string(),
                    });
                }
            }
            PoolStatus::Active => {}
            _ => ensure_active(&pool)?,
        }

        let expected_shares = self
            .market_maker(&pool)?
            .deposit_single_asset(&msg.token)?;

        let escrow = self.escrow(&pool)?;
        self.custody
            .lock(sender.as_str(), escrow.as_str(), &[msg.token.clone()])?;

        let sequence = self.dispatch(
            &pool,
            MessageType::Deposit,
            &DepositPacket {
                pool_id: pool.id.clone(),
                sender: sender.to_string(),
                token: msg.token.clone(),
                expected_shares: expected_shares.clone(),
                tolerance_bps: msg.slippage_bps,
            },
            sender.as_str(),
            vec![msg.token.clone()],
            msg.timeout_height,
            msg.timeout_timestamp,
        )?;

        Ok(Response::new()
            .add_attribute("action", "single_asset_deposit")
            .add_attribute("pool_id", &pool.id)
            .add_attribute("sequence", sequence.to_string())
            .add_event(
                pool_event("single_asset_deposit", &pool.id)
                    .add_attribute("sender", sender)
                    .add_attribute("token", msg.token.to_string())
                    .add_attribute("expected_shares", expected_shares.to_string()),
            ))
    }

    /// Escrows the maker's native share of a multi asset deposit and sends the
    /// order to the counterparty, where the taker completes it.
    pub fn make_multi_asset_deposit(
        &mut self,
        msg: MsgMakeMultiAssetDeposit,
    ) -> Result<Response, ContractError> {
        let config = CONFIG.load(self.storage)?;
        let sender = self.api.addr_validate(&msg.sender)?;
        if msg.taker.trim().is_empty() {
            return Err(ContractError::Unauthorized {});
        }
        for deposit in &msg.deposits {
            validate_coin(deposit)?;
        }

        let pool = load_pool(self.storage, &msg.pool_id)?;
        ensure_active(&pool)?;
        if msg.deposits.len() != pool.assets.len() {
            return Err(ContractError::MismatchedLengths {
                expected: pool.assets.len(),
                actual: msg.deposits.len(),
            });
        }
        // rejects deposits no tolerance could accept
        self.market_maker(&pool)?
            .deposit_multi_asset(&msg.deposits, MAX_TOLERANCE_BPS)?;

        if order_of_maker(self.storage, &OUTBOUND_ORDERS, &pool.id, sender.as_str())?.is_some() {
            return Err(ContractError::OrderAlreadyPending {
                pool_id: pool.id,
                maker: sender.to_string(),
            });
        }

        let maker_deposits = native_coins(&pool, &msg.deposits)?;
        let order = MultiAssetDepositOrder {
            id: next_order_id(self.storage)?,
            pool_id: pool.id.clone(),
            maker: sender.to_string(),
            taker: msg.taker,
            deposits: msg.deposits,
            public_key: None,
            signature: None,
            status: OrderStatus::Pending,
            created_at: self.env.block.time,
            expires_at: self.env.block.time.plus_seconds(config.order_lifetime_seconds),
        };

        let escrow = self.escrow(&pool)?;
        self.custody
            .lock(sender.as_str(), escrow.as_str(), &maker_deposits)?;
        OUTBOUND_ORDERS.save(self.storage, (pool.id.as_str(), order.id), &order)?;

        let sequence = self.dispatch(
            &pool,
            MessageType::MakeMultiDeposit,
            &MakeOrderPacket {
                order: order.clone(),
            },
            sender.as_str(),
            maker_deposits,
            msg.timeout_height,
            msg.timeout_timestamp,
        )?;

        Ok(Response::new()
            .add_attribute("action", "make_multi_asset_deposit")
            .add_attribute("pool_id", &pool.id)
            .add_attribute("order_id", order.id.to_string())
            .add_attribute("sequence", sequence.to_string())
            .add_event(
                pool_event("make_multi_asset_deposit", &pool.id)
                    .add_attribute("order_id", order.id.to_string())
                    .add_attribute("maker", sender),
            ))
    }

    /// Completes an order made on the counterparty chain. The taker signs the
    /// order to authorise spending its native share.
    pub fn take_multi_asset_deposit(
        &mut self,
        msg: MsgTakeMultiAssetDeposit,
    ) -> Result<Response, ContractError> {
        let sender = self.api.addr_validate(&msg.sender)?;
        ensure_tolerance(msg.slippage_bps)?;

        let pool = load_pool(self.storage, &msg.pool_id)?;
        ensure_active(&pool)?;

        let mut order = INCOMING_ORDERS
            .may_load(self.storage, (pool.id.as_str(), msg.order_id))?
            .ok_or_else(|| ContractError::OrderNotFound {
                pool_id: pool.id.clone(),
                order_id: msg.order_id,
            })?;
        if order.status != OrderStatus::Pending {
            return Err(ContractError::OrderNotPending { order_id: order.id });
        }
        if order.is_expired(self.env.block.time) {
            return Err(ContractError::OrderExpired { order_id: order.id });
        }
        if order.taker != sender.as_str() {
            return Err(ContractError::Unauthorized {});
        }

        self.verifier.verify(
            Some(sender.as_str()),
            msg.public_key.as_slice(),
            &order.sign_bytes()?,
            msg.signature.as_slice(),
        )?;

        self.market_maker(&pool)?
            .deposit_multi_asset(&order.deposits, msg.slippage_bps)?;

        let taker_deposits = native_coins(&pool, &order.deposits)?;
        let escrow = self.escrow(&pool)?;
        self.custody
            .lock(sender.as_str(), escrow.as_str(), &taker_deposits)?;

        order.status = OrderStatus::Taking;
        order.public_key = Some(msg.public_key.clone());
        order.signature = Some(msg.signature.clone());
        INCOMING_ORDERS.save(self.storage, (pool.id.as_str(), order.id), &order)?;

        let sequence = self.dispatch(
            &pool,
            MessageType::TakeMultiDeposit,
            &TakeOrderPacket {
                pool_id: pool.id.clone(),
                order_id: order.id,
                taker: sender.to_string(),
                tolerance_bps: msg.slippage_bps,
                public_key: msg.public_key,
                signature: msg.signature,
            },
            sender.as_str(),
            taker_deposits,
            msg.timeout_height,
            msg.timeout_timestamp,
        )?;

        Ok(Response::new()
            .add_attribute("action", "take_multi_asset_deposit")
            .add_attribute("pool_id", &pool.id)
            .add_attribute("order_id", order.id.to_string())
            .add_attribute("sequence", sequence.to_string())
            .add_event(
                pool_event("take_multi_asset_deposit", &pool.id)
                    .add_attribute("order_id", order.id.to_string())
                    .add_attribute("taker", sender),
            ))
    }

    /// Returns the maker's escrow for an order nobody took in time.
    pub fn cancel_multi_asset_deposit(
        &mut self,
        msg: MsgCancelMultiAssetDeposit,
    ) -> Result<Response, ContractError> {
        let sender = self.api.addr_validate(&msg.sender)?;
        let pool = load_pool(self.storage, &msg.pool_id)?;

        let order = OUTBOUND_ORDERS
            .may_load(self.storage, (pool.id.as_str(), msg.order_id))?
            .ok_or_else(|| ContractError::OrderNotFound {
                pool_id: pool.id.clone(),
                order_id: msg.order_id,
            })?;
        if order.maker != sender.as_str() {
            return Err(ContractError::Unauthorized {});
        }
        if !order.is_expired(self.env.block.time) {
            return Err(ContractError::OrderNotExpired { order_id: order.id });
        }

        let refund = native_coins(&pool, &order.deposits)?;
        let escrow = self.escrow(&pool)?;
        self.custody
            .release(escrow.as_str(), sender.as_str(), &refund)?;
        OUTBOUND_ORDERS.remove(self.storage, (pool.id.as_str(), order.id));

        info!("order {} in pool {} cancelled by its maker", order.id, pool.id);

        Ok(Response::new()
            .add_attribute("action", "cancel_multi_asset_deposit")
            .add_attribute("pool_id", &pool.id)
            .add_attribute("order_id", order.id.to_string())
            .add_event(
                pool_event("cancel_multi_asset_deposit", &pool.id)
                    .add_attribute("order_id", order.id.to_string()),
            ))
    }

    /// Burns pool shares for a single native asset.
    pub fn single_asset_withdraw(
        &mut self,
        msg: MsgSingleAssetWithdraw,
    ) -> Result<Response, ContractError> {
        let sender = self.api.addr_validate(&msg.sender)?;
        validate_coin(&msg.pool_token)?;
        if msg.denom_out.trim().is_empty() {
            return Err(ContractError::EmptyDenom {});
        }
        ensure_tolerance(msg.slippage_bps)?;

        let pool = load_pool(self.storage, &msg.pool_id)?;
        ensure_active(&pool)?;
        ensure_native(&pool, &msg.denom_out)?;

        let expected_out = self
            .market_maker(&pool)?
            .single_withdraw(&msg.pool_token, &msg.denom_out)?;

        let escrow = self.escrow(&pool)?;
        self.custody
            .lock(sender.as_str(), escrow.as_str(), &[msg.pool_token.clone()])?;

        let sequence = self.dispatch(
            &pool,
            MessageType::Withdraw,
            &WithdrawPacket {
                pool_id: pool.id.clone(),
                sender: sender.to_string(),
                pool_token: msg.pool_token.clone(),
                expected_out: expected_out.clone(),
                tolerance_bps: msg.slippage_bps,
            },
            sender.as_str(),
            vec![msg.pool_token],
            msg.timeout_height,
            msg.timeout_timestamp,
        )?;

        Ok(Response::new()
            .add_attribute("action", "single_asset_withdraw")
            .add_attribute("pool_id", &pool.id)
            .add_attribute("sequence", sequence.to_string())
            .add_event(
                pool_event("single_asset_withdraw", &pool.id)
                    .add_attribute("sender", sender)
                    .add_attribute("expected_out", expected_out.to_string()),
            ))
    }

    /// Burns pool shares for every asset. Assets issued on the counterparty
    /// chain are paid there to `counterparty_receiver`.
    pub fn multi_asset_withdraw(
        &mut self,
        msg: MsgMultiAssetWithdraw,
    ) -> Result<Response, ContractError> {
        let sender = self.api.addr_validate(&msg.sender)?;
        validate_coin(&msg.pool_token)?;
        if msg.counterparty_receiver.trim().is_empty() {
            return Err(ContractError::Unauthorized {});
        }
        ensure_tolerance(msg.slippage_bps)?;

        let pool = load_pool(self.storage, &msg.pool_id)?;
        ensure_active(&pool)?;

        let expected_outs = self.market_maker(&pool)?.multi_asset_withdraw(&msg.pool_token)?;

        let escrow = self.escrow(&pool)?;
        self.custody
            .lock(sender.as_str(), escrow.as_str(), &[msg.pool_token.clone()])?;

        let sequence = self.dispatch(
            &pool,
            MessageType::MultiWithdraw,
            &MultiWithdrawPacket {
                pool_id: pool.id.clone(),
                sender: sender.to_string(),
                counterparty_receiver: msg.counterparty_receiver,
                pool_token: msg.pool_token.clone(),
                expected_outs,
                tolerance_bps: msg.slippage_bps,
            },
            sender.as_str(),
            vec![msg.pool_token],
            msg.timeout_height,
            msg.timeout_timestamp,
        )?;

        Ok(Response::new()
            .add_attribute("action", "multi_asset_withdraw")
            .add_attribute("pool_id", &pool.id)
            .add_attribute("sequence", sequence.to_string())
            .add_event(pool_event("multi_asset_withdraw", &pool.id).add_attribute("sender", sender)))
    }

    /// Swaps a native asset for one issued on the counterparty chain, paid out
    /// there to `recipient`.
    pub fn swap(&mut self, msg: MsgSwap) -> Result<Response, ContractError> {
        let sender = self.api.addr_validate(&msg.sender)?;
        validate_coin(&msg.token_in)?;
        if msg.token_out.denom.trim().is_empty() {
            return Err(ContractError::EmptyDenom {});
        }
        if msg.recipient.trim().is_empty() {
            return Err(ContractError::Unauthorized {});
        }
        ensure_tolerance(msg.slippage_bps)?;

        let pool = load_pool(self.storage, &msg.pool_id)?;
        ensure_active(&pool)?;
        ensure_native(&pool, &msg.token_in.denom)?;
        if side_of(&pool, &msg.token_out.denom)? != PoolSide::Remote {
            return Err(AmmError::InvalidDenomPair {
                denom_in: msg.token_in.denom,
                denom_out: msg.token_out.denom,
            }
            .into());
        }

        let amm = self.market_maker(&pool)?;
        let (msg_type, token_out) = match msg.swap_type {
            SwapType::Left => {
                let quote = amm.left_swap(&msg.token_in, &msg.token_out.denom)?;
                if quote.amount < msg.token_out.amount {
                    return Err(AmmError::SlippageExceeded {
                        expected: msg.token_out.amount.to_string(),
                        actual: quote.amount.to_string(),
                        tolerance_bps: msg.slippage_bps,
                    }
                    .into());
                }
                (MessageType::LeftSwap, quote)
            }
            SwapType::Right => {
                validate_coin(&msg.token_out)?;
                let required = amm.right_swap(&msg.token_in.denom, &msg.token_out)?;
                if required.amount > msg.token_in.amount {
                    return Err(AmmError::SlippageExceeded {
                        expected: msg.token_in.amount.to_string(),
                        actual: required.amount.to_string(),
                        tolerance_bps: msg.slippage_bps,
                    }
                    .into());
                }
                (MessageType::RightSwap, msg.token_out.clone())
            }
        };

        let escrow = self.escrow(&pool)?;
        self.custody
            .lock(sender.as_str(), escrow.as_str(), &[msg.token_in.clone()])?;

        let sequence = self.dispatch(
            &pool,
            msg_type,
            &SwapPacket {
                pool_id: pool.id.clone(),
                sender: sender.to_string(),
                recipient: msg.recipient,
                token_in: msg.token_in.clone(),
                token_out: token_out.clone(),
                tolerance_bps: msg.slippage_bps,
            },
            sender.as_str(),
            vec![msg.token_in.clone()],
            msg.timeout_height,
            msg.timeout_timestamp,
        )?;

        Ok(Response::new()
            .add_attribute("action", msg_type.as_str())
            .add_attribute("pool_id", &pool.id)
            .add_attribute("sequence", sequence.to_string())
            .add_event(
                pool_event(msg_type.as_str(), &pool.id)
                    .add_attribute("sender", sender)
                    .add_attribute("token_in", msg.token_in.to_string())
                    .add_attribute("token_out", token_out.to_string()),
            ))
    }

    /// Withdraws a pool that never got its counterparty liquidity. The local
    /// record stays `Cancelled` until the counterparty confirms.
    pub fn cancel_pool(&mut self, msg: MsgCancelPool) -> Result<Response, ContractError> {
        let sender = self.api.addr_validate(&msg.sender)?;
        let mut pool = load_pool(self.storage, &msg.pool_id)?;
        if pool.creator != sender.as_str() {
            return Err(ContractError::Unauthorized {});
        }
        ensure_status(&pool, PoolStatus::Initialized)?;

        transition(&mut pool, PoolStatus::Cancelled)?;
        POOLS.save(self.storage, &pool.id, &pool)?;

        let sequence = self.dispatch(
            &pool,
            MessageType::Cancel,
            &CancelPoolPacket {
                pool_id: pool.id.clone(),
                sender: sender.to_string(),
            },
            sender.as_str(),
            vec![],
            msg.timeout_height,
            msg.timeout_timestamp,
        )?;

        Ok(Response::new()
            .add_attribute("action", "cancel_pool")
            .add_attribute("pool_id", &pool.id)
            .add_attribute("sequence", sequence.to_string())
            .add_event(pool_event("cancel_pool", &pool.id)))
    }
}
