use cosmwasm_std::{coin, Binary, Coin, Uint128};
use interchain_amm::{pool_id, AmmError, InterchainMarketMaker, PoolAsset, PoolSide, PoolStatus};
use k256::ecdsa::{signature::Signer, Signature, SigningKey};

use super::{
    builder::CHANNEL_A,
    suite::{Side, TwoChainSuite},
    TwoChainSuiteBuilder,
};
use crate::{
    config::{DEFAULT_FEE_RATE, DEFAULT_ORDER_LIFETIME_SECONDS, DEFAULT_PORT},
    error::ContractError,
    msg::{
        MsgCancelMultiAssetDeposit, MsgCancelPool, MsgCreatePool, MsgMakeMultiAssetDeposit,
        MsgMultiAssetWithdraw, MsgSingleAssetDeposit, MsgSingleAssetWithdraw, MsgSwap,
        MsgTakeMultiAssetDeposit, SwapType,
    },
    order::OrderStatus,
    packet::{Ack, InterchainSwapPacketData, MessageType, TakeOrderPacket},
    ports::pubkey_to_address,
    state::{INCOMING_ORDERS, OUTBOUND_ORDERS},
};

const ATOM: &str = "uatom";
const OSMO: &str = "uosmo";
const INITIAL: u128 = 1_000_000;
const FUNDS: u128 = 10_000_000;

fn setup() -> TwoChainSuite {
    let _ = env_logger::builder().is_test(true).try_init();

    TwoChainSuiteBuilder::default()
        .with_balance(Side::A, "alice", vec![coin(FUNDS, ATOM)])
        .with_balance(Side::B, "bob", vec![coin(FUNDS, OSMO)])
        .with_balance(Side::B, "carol", vec![coin(FUNDS, OSMO)])
        .build()
}

fn has_attribute(attributes: &[cosmwasm_std::Attribute], key: &str, value: &str) -> bool {
    attributes.iter().any(|a| a.key == key && a.value == value)
}

fn create_pool(suite: &mut TwoChainSuite) -> String {
    let msg = MsgCreatePool {
        sender: suite.a.addr("alice").to_string(),
        counterparty_creator: suite.b.addr("bob").to_string(),
        port: DEFAULT_PORT.to_string(),
        channel: CHANNEL_A.to_string(),
        liquidity: vec![
            PoolAsset::new(ATOM, PoolSide::Native, INITIAL, 50),
            PoolAsset::new(OSMO, PoolSide::Remote, INITIAL, 50),
        ],
        timeout_height: None,
        timeout_timestamp: None,
    };
    suite.a.with_coordinator(|c| c.create_pool(msg)).unwrap();

    pool_id(&[ATOM, OSMO])
}

fn initial_deposit(suite: &mut TwoChainSuite, pool_id: &str) {
    let msg = MsgSingleAssetDeposit {
        pool_id: pool_id.to_string(),
        sender: suite.b.addr("bob").to_string(),
        token: coin(INITIAL, OSMO),
        slippage_bps: 0,
        timeout_height: None,
        timeout_timestamp: None,
    };
    suite.b.with_coordinator(|c| c.single_asset_deposit(msg)).unwrap();
}

fn active_pool(suite: &mut TwoChainSuite) -> String {
    let pool_id = create_pool(suite);
    suite.relay(Side::A);
    initial_deposit(suite, &pool_id);
    let acks = suite.relay(Side::B);
    assert!(matches!(acks.as_slice(), [Ack::Result(_)]));
    pool_id
}

fn left_swap(suite: &TwoChainSuite, pool_id: &str, amount: u128, min_out: Uint128) -> MsgSwap {
    MsgSwap {
        swap_type: SwapType::Left,
        pool_id: pool_id.to_string(),
        sender: suite.a.addr("alice").to_string(),
        recipient: suite.b.addr("dave").to_string(),
        token_in: coin(amount, ATOM),
        token_out: Coin::new(min_out, OSMO),
        slippage_bps: 100,
        timeout_height: None,
        timeout_timestamp: None,
    }
}

fn make_order(suite: &TwoChainSuite, pool_id: &str, taker: &str) -> MsgMakeMultiAssetDeposit {
    MsgMakeMultiAssetDeposit {
        pool_id: pool_id.to_string(),
        sender: suite.a.addr("alice").to_string(),
        taker: taker.to_string(),
        deposits: vec![coin(100_000, ATOM), coin(100_000, OSMO)],
        timeout_height: None,
        timeout_timestamp: None,
    }
}

fn take_order(
    pool_id: &str,
    sender: &str,
    public_key: Binary,
    signature: Binary,
) -> MsgTakeMultiAssetDeposit {
    MsgTakeMultiAssetDeposit {
        pool_id: pool_id.to_string(),
        order_id: 1,
        sender: sender.to_string(),
        public_key,
        signature,
        slippage_bps: 100,
        timeout_height: None,
        timeout_timestamp: None,
    }
}

#[test]
fn pool_activates_after_counterparty_deposit() {
    let mut suite = setup();
    let pool_id = create_pool(&mut suite);
    let alice = suite.a.addr("alice");
    let bob = suite.b.addr("bob");

    assert_eq!(suite.a.balance(&alice, ATOM).u128(), FUNDS - INITIAL);
    assert_eq!(suite.a.balance(&suite.a.escrow(), ATOM).u128(), INITIAL);

    let acks = suite.relay(Side::A);
    assert!(matches!(acks.as_slice(), [Ack::Result(_)]));
    assert_eq!(suite.a.pool(&pool_id).unwrap().status, PoolStatus::Initialized);
    let mirrored = suite.b.pool(&pool_id).unwrap();
    assert_eq!(mirrored.status, PoolStatus::Initialized);
    assert_eq!(mirrored.find_asset(OSMO).unwrap().side, PoolSide::Native);
    assert_eq!(mirrored.counterparty_channel, CHANNEL_A);

    initial_deposit(&mut suite, &pool_id);
    suite.relay(Side::B);

    let pool = suite.a.pool(&pool_id).unwrap();
    assert_eq!(pool.status, PoolStatus::Active);
    assert_eq!(pool.supply, coin(2 * INITIAL, &pool_id));
    suite.assert_pools_agree(&pool_id);

    // each creator holds the shares of the side it funded
    assert_eq!(suite.a.balance(&alice, &pool_id).u128(), INITIAL);
    assert_eq!(suite.b.balance(&bob, &pool_id).u128(), INITIAL);
    assert_eq!(suite.b.balance(&suite.b.escrow(), OSMO).u128(), INITIAL);
}

#[test]
fn initial_deposit_must_match_declared_liquidity() {
    let mut suite = setup();
    let pool_id = create_pool(&mut suite);
    suite.relay(Side::A);

    let short = MsgSingleAssetDeposit {
        pool_id: pool_id.clone(),
        sender: suite.b.addr("bob").to_string(),
        token: coin(INITIAL / 2, OSMO),
        slippage_bps: 0,
        timeout_height: None,
        timeout_timestamp: None,
    };
    let err = suite
        .b
        .with_coordinator(|c| c.single_asset_deposit(short))
        .unwrap_err();
    assert_eq!(
        err,
        ContractError::InvalidInitialDeposit {
            expected: "1000000uosmo".to_string(),
            actual: "500000uosmo".to_string(),
        }
    );

    let stranger = MsgSingleAssetDeposit {
        pool_id: pool_id.clone(),
        sender: suite.b.addr("carol").to_string(),
        token: coin(INITIAL, OSMO),
        slippage_bps: 0,
        timeout_height: None,
        timeout_timestamp: None,
    };
    let err = suite
        .b
        .with_coordinator(|c| c.single_asset_deposit(stranger))
        .unwrap_err();
    assert_eq!(err, ContractError::Unauthorized {});
}

#[test]
fn create_pool_is_refunded_on_timeout() {
    let mut suite = setup();
    let pool_id = create_pool(&mut suite);
    let alice = suite.a.addr("alice");

    let packets = suite.a.take_outbox();
    suite.timeout(Side::A, &packets[0]).unwrap();

    assert!(suite.a.pool(&pool_id).is_none());
    assert_eq!(suite.a.balance(&alice, ATOM).u128(), FUNDS);
    assert!(suite.a.balance(&suite.a.escrow(), ATOM).is_zero());

    // a second settlement of the same sequence is a no-op
    let res = suite.timeout(Side::A, &packets[0]).unwrap();
    assert!(has_attribute(&res.attributes, "action", "duplicate_timeout"));
    assert_eq!(suite.a.balance(&alice, ATOM).u128(), FUNDS);
}

#[test]
fn receiving_the_same_packet_twice_replays_the_acknowledgement() {
    let mut suite = setup();
    let pool_id = create_pool(&mut suite);
    let packets = suite.a.take_outbox();

    let first = suite.deliver(Side::B, &packets[0]);
    let second = suite.deliver(Side::B, &packets[0]);

    assert_eq!(first.acknowledgement, second.acknowledgement);
    assert!(has_attribute(&second.attributes, "action", "duplicate_packet"));
    assert_eq!(
        suite.b.pool(&pool_id).unwrap().status,
        PoolStatus::Initialized
    );

    let ack = first.acknowledgement.unwrap();
    suite.acknowledge(Side::A, &packets[0], ack.clone()).unwrap();
    let res = suite.acknowledge(Side::A, &packets[0], ack).unwrap();
    assert!(has_attribute(&res.attributes, "action", "duplicate_acknowledgement"));
}

#[test]
fn packet_from_an_unbound_channel_is_rejected() {
    let mut suite = setup();
    let pool_id = active_pool(&mut suite);
    let before = suite.b.pool(&pool_id).unwrap();

    let msg = left_swap(&suite, &pool_id, 20_000, Uint128::one());
    suite.a.with_coordinator(|c| c.swap(msg)).unwrap();
    let mut forged = suite.a.take_outbox().remove(0);
    forged.src.channel_id = "channel-99".to_string();

    let res = suite.deliver(Side::B, &forged);
    let ack = Ack::decode(&res.acknowledgement.unwrap()).unwrap();
    assert_eq!(
        ack,
        Ack::Error(
            ContractError::InvalidChannel {
                expected: CHANNEL_A.to_string(),
                actual: "channel-99".to_string(),
            }
            .to_string()
        )
    );
    assert_eq!(suite.b.pool(&pool_id).unwrap(), before);
}

#[test]
fn left_swap_pays_the_recipient_on_the_counterparty() {
    let mut suite = setup();
    let pool_id = active_pool(&mut suite);
    let alice = suite.a.addr("alice");
    let dave = suite.b.addr("dave");

    let pool = suite.a.pool(&pool_id).unwrap();
    let amm = InterchainMarketMaker::new(&pool, DEFAULT_FEE_RATE).unwrap();
    let quote = amm.left_swap(&coin(20_000, ATOM), OSMO).unwrap();
    let price_before = amm.market_price(ATOM, OSMO).unwrap();

    let msg = left_swap(&suite, &pool_id, 20_000, quote.amount);
    suite.a.with_coordinator(|c| c.swap(msg)).unwrap();
    let acks = suite.relay(Side::A);
    assert!(matches!(acks.as_slice(), [Ack::Result(_)]));

    assert_eq!(suite.b.balance(&dave, OSMO), quote.amount);
    assert_eq!(suite.a.balance(&alice, ATOM).u128(), FUNDS - INITIAL - 20_000);
    assert_eq!(
        suite.a.balance(&suite.a.escrow(), ATOM).u128(),
        INITIAL + 20_000
    );
    assert_eq!(
        suite.b.balance(&suite.b.escrow(), OSMO),
        Uint128::new(INITIAL) - quote.amount
    );
    suite.assert_pools_agree(&pool_id);

    let pool = suite.a.pool(&pool_id).unwrap();
    let amm = InterchainMarketMaker::new(&pool, DEFAULT_FEE_RATE).unwrap();
    assert!(amm.market_price(ATOM, OSMO).unwrap() > price_before);
}

#[test]
fn left_swap_below_the_minimum_output_is_rejected() {
    let mut suite = setup();
    let pool_id = active_pool(&mut suite);

    let pool = suite.a.pool(&pool_id).unwrap();
    let quote = InterchainMarketMaker::new(&pool, DEFAULT_FEE_RATE)
        .unwrap()
        .left_swap(&coin(20_000, ATOM), OSMO)
        .unwrap();

    let msg = left_swap(&suite, &pool_id, 20_000, quote.amount + Uint128::one());
    let err = suite.a.with_coordinator(|c| c.swap(msg)).unwrap_err();
    assert!(matches!(
        err,
        ContractError::Amm(AmmError::SlippageExceeded { .. })
    ));
    assert!(suite.a.take_outbox().is_empty());
}

#[test]
fn right_swap_returns_the_unused_cap() {
    let mut suite = setup();
    let pool_id = active_pool(&mut suite);
    let alice = suite.a.addr("alice");
    let dave = suite.b.addr("dave");

    let wanted = coin(10_000, OSMO);
    let pool = suite.a.pool(&pool_id).unwrap();
    let required = InterchainMarketMaker::new(&pool, DEFAULT_FEE_RATE)
        .unwrap()
        .right_swap(ATOM, &wanted)
        .unwrap();
    let cap = required.amount + Uint128::new(5_000);

    let msg = MsgSwap {
        swap_type: SwapType::Right,
        token_in: Coin::new(cap, ATOM),
        token_out: wanted.clone(),
        ..left_swap(&suite, &pool_id, 0, Uint128::zero())
    };
    suite.a.with_coordinator(|c| c.swap(msg)).unwrap();
    assert_eq!(
        suite.a.balance(&alice, ATOM),
        Uint128::new(FUNDS - INITIAL) - cap
    );

    suite.relay(Side::A);

    assert_eq!(suite.b.balance(&dave, OSMO), wanted.amount);
    assert_eq!(
        suite.a.balance(&alice, ATOM),
        Uint128::new(FUNDS - INITIAL) - required.amount
    );
    assert_eq!(
        suite.a.balance(&suite.a.escrow(), ATOM),
        Uint128::new(INITIAL) + required.amount
    );
    suite.assert_pools_agree(&pool_id);
}

#[test]
fn swap_rejected_by_the_counterparty_is_refunded() {
    let mut suite = setup();
    let pool_id = active_pool(&mut suite);
    let alice = suite.a.addr("alice");
    let before = suite.a.pool(&pool_id).unwrap();

    let msg = MsgSwap {
        recipient: "not-an-address".to_string(),
        ..left_swap(&suite, &pool_id, 20_000, Uint128::one())
    };
    suite.a.with_coordinator(|c| c.swap(msg)).unwrap();
    let acks = suite.relay(Side::A);

    assert!(matches!(acks.as_slice(), [Ack::Error(_)]));
    assert_eq!(suite.a.balance(&alice, ATOM).u128(), FUNDS - INITIAL);
    assert_eq!(suite.a.pool(&pool_id).unwrap(), before);
    suite.assert_pools_agree(&pool_id);
}

#[test]
fn single_asset_deposit_and_withdraw_round_trip() {
    let mut suite = setup();
    let pool_id = active_pool(&mut suite);
    let carol = suite.b.addr("carol");

    let pool = suite.b.pool(&pool_id).unwrap();
    let expected = InterchainMarketMaker::new(&pool, DEFAULT_FEE_RATE)
        .unwrap()
        .deposit_single_asset(&coin(100_000, OSMO))
        .unwrap();

    let deposit = MsgSingleAssetDeposit {
        pool_id: pool_id.clone(),
        sender: carol.to_string(),
        token: coin(100_000, OSMO),
        slippage_bps: 100,
        timeout_height: None,
        timeout_timestamp: None,
    };
    suite.b.with_coordinator(|c| c.single_asset_deposit(deposit)).unwrap();
    suite.relay(Side::B);

    assert_eq!(suite.b.balance(&carol, &pool_id), expected.amount);
    assert_eq!(
        suite.b.pool(&pool_id).unwrap().supply.amount,
        Uint128::new(2 * INITIAL) + expected.amount
    );
    suite.assert_pools_agree(&pool_id);

    let withdraw = MsgSingleAssetWithdraw {
        pool_id: pool_id.clone(),
        sender: carol.to_string(),
        pool_token: expected.clone(),
        denom_out: OSMO.to_string(),
        slippage_bps: 100,
        timeout_height: None,
        timeout_timestamp: None,
    };
    suite.b.with_coordinator(|c| c.single_asset_withdraw(withdraw)).unwrap();
    suite.relay(Side::B);

    // fees keep part of the deposit in the pool
    let returned = suite.b.balance(&carol, OSMO) - Uint128::new(FUNDS - 100_000);
    assert!(returned > Uint128::zero());
    assert!(returned < Uint128::new(100_000));
    assert!(suite.b.balance(&carol, &pool_id).is_zero());
    assert!(suite.b.balance(&suite.b.escrow(), &pool_id).is_zero());
    assert_eq!(
        suite.b.pool(&pool_id).unwrap().supply.amount,
        Uint128::new(2 * INITIAL)
    );
    suite.assert_pools_agree(&pool_id);
}

#[test]
fn multi_asset_withdraw_pays_out_on_both_chains() {
    let mut suite = setup();
    let pool_id = active_pool(&mut suite);
    let alice = suite.a.addr("alice");
    let alice_on_b = suite.b.addr("alice");

    let msg = MsgMultiAssetWithdraw {
        pool_id: pool_id.clone(),
        sender: alice.to_string(),
        counterparty_receiver: alice_on_b.to_string(),
        pool_token: coin(500_000, &pool_id),
        slippage_bps: 100,
        timeout_height: None,
        timeout_timestamp: None,
    };
    suite.a.with_coordinator(|c| c.multi_asset_withdraw(msg)).unwrap();
    suite.relay(Side::A);

    assert_eq!(
        suite.a.balance(&alice, ATOM).u128(),
        FUNDS - INITIAL + 250_000
    );
    assert_eq!(suite.b.balance(&alice_on_b, OSMO).u128(), 250_000);
    assert_eq!(suite.a.balance(&alice, &pool_id).u128(), 500_000);

    let pool = suite.a.pool(&pool_id).unwrap();
    assert_eq!(pool.supply.amount.u128(), 3 * INITIAL / 2);
    assert_eq!(pool.find_asset(ATOM).unwrap().balance.u128(), 750_000);
    suite.assert_pools_agree(&pool_id);
}

#[test]
fn multi_asset_deposit_is_made_on_one_chain_and_taken_on_the_other() {
    let mut suite = setup();
    let pool_id = active_pool(&mut suite);
    let alice = suite.a.addr("alice");
    let carol = suite.b.addr("carol");

    let pool = suite.a.pool(&pool_id).unwrap();
    let shares = InterchainMarketMaker::new(&pool, DEFAULT_FEE_RATE)
        .unwrap()
        .deposit_multi_asset(&[coin(100_000, ATOM), coin(100_000, OSMO)], 100)
        .unwrap();

    let msg = make_order(&suite, &pool_id, carol.as_str());
    suite.a.with_coordinator(|c| c.make_multi_asset_deposit(msg)).unwrap();
    suite.relay(Side::A);

    let incoming = INCOMING_ORDERS
        .load(&suite.b.storage, (pool_id.as_str(), 1))
        .unwrap();
    assert_eq!(incoming.status, OrderStatus::Pending);
    assert_eq!(incoming.maker, alice.to_string());

    // one order per maker at a time
    let again = make_order(&suite, &pool_id, carol.as_str());
    let err = suite
        .a
        .with_coordinator(|c| c.make_multi_asset_deposit(again))
        .unwrap_err();
    assert_eq!(
        err,
        ContractError::OrderAlreadyPending {
            pool_id: pool_id.clone(),
            maker: alice.to_string(),
        }
    );

    let take = take_order(&pool_id, carol.as_str(), Binary::default(), Binary::default());
    suite.b.with_coordinator(|c| c.take_multi_asset_deposit(take)).unwrap();
    assert_eq!(
        INCOMING_ORDERS
            .load(&suite.b.storage, (pool_id.as_str(), 1))
            .unwrap()
            .status,
        OrderStatus::Taking
    );
    let acks = suite.relay(Side::B);
    assert!(matches!(acks.as_slice(), [Ack::Result(_)]));

    assert_eq!(
        suite.a.balance(&alice, &pool_id),
        Uint128::new(INITIAL) + shares[0].amount
    );
    assert_eq!(suite.b.balance(&carol, &pool_id), shares[1].amount);
    assert_eq!(suite.b.balance(&carol, OSMO).u128(), FUNDS - 100_000);
    assert!(OUTBOUND_ORDERS
        .may_load(&suite.a.storage, (pool_id.as_str(), 1))
        .unwrap()
        .is_none());
    assert!(INCOMING_ORDERS
        .may_load(&suite.b.storage, (pool_id.as_str(), 1))
        .unwrap()
        .is_none());
    suite.assert_pools_agree(&pool_id);
}

#[test]
fn only_the_named_taker_can_take_an_order() {
    let mut suite = setup();
    let pool_id = active_pool(&mut suite);
    let carol = suite.b.addr("carol");
    let bob = suite.b.addr("bob");

    let msg = make_order(&suite, &pool_id, carol.as_str());
    suite.a.with_coordinator(|c| c.make_multi_asset_deposit(msg)).unwrap();
    suite.relay(Side::A);

    let take = take_order(&pool_id, bob.as_str(), Binary::default(), Binary::default());
    let err = suite
        .b
        .with_coordinator(|c| c.take_multi_asset_deposit(take))
        .unwrap_err();
    assert_eq!(err, ContractError::Unauthorized {});
}

#[test]
fn expired_order_is_cancelled_and_a_late_take_refunded() {
    let mut suite = setup();
    let pool_id = active_pool(&mut suite);
    let alice = suite.a.addr("alice");
    let carol = suite.b.addr("carol");

    let msg = make_order(&suite, &pool_id, carol.as_str());
    suite.a.with_coordinator(|c| c.make_multi_asset_deposit(msg)).unwrap();
    suite.relay(Side::A);
    assert_eq!(
        suite.a.balance(&alice, ATOM).u128(),
        FUNDS - INITIAL - 100_000
    );

    let cancel = MsgCancelMultiAssetDeposit {
        pool_id: pool_id.clone(),
        order_id: 1,
        sender: alice.to_string(),
    };
    let err = suite
        .a
        .with_coordinator(|c| c.cancel_multi_asset_deposit(cancel.clone()))
        .unwrap_err();
    assert_eq!(err, ContractError::OrderNotExpired { order_id: 1 });

    suite.a.advance_time(DEFAULT_ORDER_LIFETIME_SECONDS);
    suite
        .a
        .with_coordinator(|c| c.cancel_multi_asset_deposit(cancel))
        .unwrap();
    assert_eq!(suite.a.balance(&alice, ATOM).u128(), FUNDS - INITIAL);

    // the counterparty clock lags, so the take still goes out
    let take = take_order(&pool_id, carol.as_str(), Binary::default(), Binary::default());
    suite.b.with_coordinator(|c| c.take_multi_asset_deposit(take)).unwrap();
    let acks = suite.relay(Side::B);

    assert_eq!(
        acks,
        vec![Ack::Error(
            ContractError::OrderNotFound {
                pool_id: pool_id.clone(),
                order_id: 1,
            }
            .to_string()
        )]
    );
    assert_eq!(suite.b.balance(&carol, OSMO).u128(), FUNDS);
    let order = INCOMING_ORDERS
        .load(&suite.b.storage, (pool_id.as_str(), 1))
        .unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert!(order.signature.is_none());
    suite.assert_pools_agree(&pool_id);
}

#[test]
fn take_is_authorised_by_a_secp256k1_signature() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut suite = TwoChainSuiteBuilder::default()
        .with_secp256k1()
        .with_balance(Side::A, "alice", vec![coin(FUNDS, ATOM)])
        .with_balance(Side::B, "bob", vec![coin(FUNDS, OSMO)])
        .build();
    let pool_id = active_pool(&mut suite);

    let signing_key = SigningKey::from_slice(&[7u8; 32]).unwrap();
    let public_key = signing_key
        .verifying_key()
        .to_encoded_point(true)
        .as_bytes()
        .to_vec();
    let taker = pubkey_to_address(&suite.b.api, &public_key).unwrap();
    suite
        .b
        .fund(&cosmwasm_std::Addr::unchecked(&taker), &[coin(FUNDS, OSMO)]);

    let msg = make_order(&suite, &pool_id, &taker);
    suite.a.with_coordinator(|c| c.make_multi_asset_deposit(msg)).unwrap();
    suite.relay(Side::A);

    let order = INCOMING_ORDERS
        .load(&suite.b.storage, (pool_id.as_str(), 1))
        .unwrap();

    let forged: Signature = signing_key.sign(b"something else");
    let take = take_order(
        &pool_id,
        &taker,
        Binary::from(public_key.clone()),
        Binary::from(forged.to_bytes().to_vec()),
    );
    let err = suite
        .b
        .with_coordinator(|c| c.take_multi_asset_deposit(take))
        .unwrap_err();
    assert_eq!(err, ContractError::InvalidSignature {});

    let signature: Signature = signing_key.sign(&order.sign_bytes().unwrap());
    let take = take_order(
        &pool_id,
        &taker,
        Binary::from(public_key),
        Binary::from(signature.to_bytes().to_vec()),
    );
    suite.b.with_coordinator(|c| c.take_multi_asset_deposit(take)).unwrap();
    let acks = suite.relay(Side::B);
    assert!(matches!(acks.as_slice(), [Ack::Result(_)]));
    suite.assert_pools_agree(&pool_id);
}

#[test]
fn cancel_pool_returns_the_creator_liquidity() {
    let mut suite = setup();
    let pool_id = create_pool(&mut suite);
    let alice = suite.a.addr("alice");
    suite.relay(Side::A);

    let cancel = MsgCancelPool {
        pool_id: pool_id.clone(),
        sender: alice.to_string(),
        timeout_height: None,
        timeout_timestamp: None,
    };
    suite.a.with_coordinator(|c| c.cancel_pool(cancel)).unwrap();
    assert_eq!(suite.a.pool(&pool_id).unwrap().status, PoolStatus::Cancelled);

    suite.relay(Side::A);

    assert!(suite.a.pool(&pool_id).is_none());
    assert!(suite.b.pool(&pool_id).is_none());
    assert_eq!(suite.a.balance(&alice, ATOM).u128(), FUNDS);
}

#[test]
fn deposit_racing_a_cancellation_is_refunded() {
    let mut suite = setup();
    let pool_id = create_pool(&mut suite);
    let alice = suite.a.addr("alice");
    let bob = suite.b.addr("bob");
    suite.relay(Side::A);

    let cancel = MsgCancelPool {
        pool_id: pool_id.clone(),
        sender: alice.to_string(),
        timeout_height: None,
        timeout_timestamp: None,
    };
    suite.a.with_coordinator(|c| c.cancel_pool(cancel)).unwrap();
    initial_deposit(&mut suite, &pool_id);

    let acks = suite.relay(Side::B);
    assert!(matches!(acks.as_slice(), [Ack::Error(_)]));
    assert_eq!(suite.b.balance(&bob, OSMO).u128(), FUNDS);
    assert!(suite.b.balance(&bob, &pool_id).is_zero());

    suite.relay(Side::A);
    assert!(suite.a.pool(&pool_id).is_none());
    assert!(suite.b.pool(&pool_id).is_none());
    assert_eq!(suite.a.balance(&alice, ATOM).u128(), FUNDS);
}

#[test]
fn active_pool_cannot_be_cancelled() {
    let mut suite = setup();
    let pool_id = active_pool(&mut suite);

    let cancel = MsgCancelPool {
        pool_id: pool_id.clone(),
        sender: suite.a.addr("alice").to_string(),
        timeout_height: None,
        timeout_timestamp: None,
    };
    let err = suite.a.with_coordinator(|c| c.cancel_pool(cancel)).unwrap_err();
    assert_eq!(
        err,
        ContractError::PoolNotReady {
            pool_id,
            status: "active".to_string(),
        }
    );
}

#[test]
fn timed_out_deposit_leaves_the_pool_waiting() {
    let mut suite = setup();
    let pool_id = create_pool(&mut suite);
    let bob = suite.b.addr("bob");
    suite.relay(Side::A);

    initial_deposit(&mut suite, &pool_id);
    let packets = suite.b.take_outbox();
    suite.timeout(Side::B, &packets[0]).unwrap();

    assert_eq!(suite.b.balance(&bob, OSMO).u128(), FUNDS);
    assert!(suite.b.balance(&bob, &pool_id).is_zero());
    assert_eq!(
        suite.b.pool(&pool_id).unwrap().status,
        PoolStatus::Initialized
    );

    // the creator can still be funded afterwards
    initial_deposit(&mut suite, &pool_id);
    suite.relay(Side::B);
    suite.assert_pools_agree(&pool_id);
    assert_eq!(suite.a.pool(&pool_id).unwrap().status, PoolStatus::Active);
}

#[test]
fn timed_out_deposit_into_an_active_pool_mints_nothing() {
    let mut suite = setup();
    let pool_id = active_pool(&mut suite);
    let carol = suite.b.addr("carol");
    let before = suite.b.pool(&pool_id).unwrap();

    let msg = MsgSingleAssetDeposit {
        pool_id: pool_id.clone(),
        sender: carol.to_string(),
        token: coin(100_000, OSMO),
        slippage_bps: 100,
        timeout_height: None,
        timeout_timestamp: None,
    };
    suite.b.with_coordinator(|c| c.single_asset_deposit(msg)).unwrap();
    assert_eq!(suite.b.balance(&carol, OSMO).u128(), FUNDS - 100_000);

    let packets = suite.b.take_outbox();
    suite.timeout(Side::B, &packets[0]).unwrap();

    assert_eq!(suite.b.balance(&carol, OSMO).u128(), FUNDS);
    assert!(suite.b.balance(&carol, &pool_id).is_zero());
    let after = suite.b.pool(&pool_id).unwrap();
    assert_eq!(after.supply, before.supply);
    assert_eq!(after.assets, before.assets);
    suite.assert_pools_agree(&pool_id);
}

#[test]
fn cancelled_order_is_not_refunded_again_when_its_make_times_out() {
    let mut suite = setup();
    let pool_id = active_pool(&mut suite);
    let alice = suite.a.addr("alice");
    let carol = suite.b.addr("carol");

    let msg = make_order(&suite, &pool_id, carol.as_str());
    suite.a.with_coordinator(|c| c.make_multi_asset_deposit(msg)).unwrap();
    let packets = suite.a.take_outbox();

    suite.a.advance_time(DEFAULT_ORDER_LIFETIME_SECONDS);
    let cancel = MsgCancelMultiAssetDeposit {
        pool_id: pool_id.clone(),
        order_id: 1,
        sender: alice.to_string(),
    };
    suite
        .a
        .with_coordinator(|c| c.cancel_multi_asset_deposit(cancel))
        .unwrap();
    assert_eq!(suite.a.balance(&alice, ATOM).u128(), FUNDS - INITIAL);

    let response = suite.timeout(Side::A, &packets[0]).unwrap();
    assert!(has_attribute(&response.attributes, "method", "refund"));

    assert_eq!(suite.a.balance(&alice, ATOM).u128(), FUNDS - INITIAL);
    assert_eq!(suite.a.balance(&suite.a.escrow(), ATOM).u128(), INITIAL);
    assert_eq!(
        suite.a.pool(&pool_id).unwrap().find_asset(ATOM).unwrap().balance,
        Uint128::new(INITIAL)
    );
}

#[test]
fn cancel_timing_out_after_its_create_is_a_no_op() {
    let mut suite = setup();
    let pool_id = create_pool(&mut suite);
    let alice = suite.a.addr("alice");

    let cancel = MsgCancelPool {
        pool_id: pool_id.clone(),
        sender: alice.to_string(),
        timeout_height: None,
        timeout_timestamp: None,
    };
    suite.a.with_coordinator(|c| c.cancel_pool(cancel)).unwrap();
    let packets = suite.a.take_outbox();
    assert_eq!(packets.len(), 2);

    suite.timeout(Side::A, &packets[0]).unwrap();
    assert!(suite.a.pool(&pool_id).is_none());

    suite.timeout(Side::A, &packets[1]).unwrap();
    assert!(suite.a.pool(&pool_id).is_none());
    assert_eq!(suite.a.balance(&alice, ATOM).u128(), FUNDS);
    assert!(suite.a.balance(&suite.a.escrow(), ATOM).is_zero());
}

#[test]
fn maker_chain_rejects_a_take_with_a_tampered_signature() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut suite = TwoChainSuiteBuilder::default()
        .with_secp256k1()
        .with_balance(Side::A, "alice", vec![coin(FUNDS, ATOM)])
        .with_balance(Side::B, "bob", vec![coin(FUNDS, OSMO)])
        .build();
    let pool_id = active_pool(&mut suite);

    let signing_key = SigningKey::from_slice(&[9u8; 32]).unwrap();
    let public_key = signing_key
        .verifying_key()
        .to_encoded_point(true)
        .as_bytes()
        .to_vec();
    let taker = pubkey_to_address(&suite.b.api, &public_key).unwrap();
    let taker_addr = cosmwasm_std::Addr::unchecked(&taker);
    suite.b.fund(&taker_addr, &[coin(FUNDS, OSMO)]);

    let msg = make_order(&suite, &pool_id, &taker);
    suite.a.with_coordinator(|c| c.make_multi_asset_deposit(msg)).unwrap();
    suite.relay(Side::A);

    let order = INCOMING_ORDERS
        .load(&suite.b.storage, (pool_id.as_str(), 1))
        .unwrap();
    let signature: Signature = signing_key.sign(&order.sign_bytes().unwrap());
    let take = take_order(
        &pool_id,
        &taker,
        Binary::from(public_key),
        Binary::from(signature.to_bytes().to_vec()),
    );
    suite.b.with_coordinator(|c| c.take_multi_asset_deposit(take)).unwrap();
    assert_eq!(suite.b.balance(&taker_addr, OSMO).u128(), FUNDS - 100_000);

    // rewrite the signature while the packet is in flight
    let mut packet = suite.b.take_outbox().remove(0);
    let envelope = InterchainSwapPacketData::decode(&packet.data).unwrap();
    let mut body: TakeOrderPacket = envelope.body().unwrap();
    let forged: Signature = signing_key.sign(b"another order");
    body.signature = Binary::from(forged.to_bytes().to_vec());
    packet.data = InterchainSwapPacketData::new(MessageType::TakeMultiDeposit, &body)
        .unwrap()
        .encode()
        .unwrap();

    let response = suite.deliver(Side::A, &packet);
    let ack = response.acknowledgement.unwrap();
    assert_eq!(
        Ack::decode(&ack).unwrap(),
        Ack::Error(ContractError::InvalidSignature {}.to_string())
    );
    assert!(OUTBOUND_ORDERS
        .may_load(&suite.a.storage, (pool_id.as_str(), 1))
        .unwrap()
        .is_some());

    suite.acknowledge(Side::B, &packet, ack).unwrap();
    assert_eq!(suite.b.balance(&taker_addr, OSMO).u128(), FUNDS);
    let order = INCOMING_ORDERS
        .load(&suite.b.storage, (pool_id.as_str(), 1))
        .unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert!(order.signature.is_none());
    suite.assert_pools_agree(&pool_id);
}
