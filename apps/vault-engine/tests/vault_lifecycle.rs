//! End-to-end rounds through the service facade with simulated collaborators.

mod common;

use common::*;
use rust_decimal_macros::dec;
use vault_engine::domain::vault::services::RolloverPhase;
use vault_engine::{RolloverError, VaultError, VaultServiceError};

fn vault_error(err: VaultServiceError) -> VaultError {
    match err {
        VaultServiceError::Vault(e) | VaultServiceError::Rollover(RolloverError::Vault(e)) => e,
        other => panic!("expected vault error, got {other:?}"),
    }
}

#[tokio::test]
async fn three_rounds_with_a_losing_put() {
    // Round numbers run one ahead of the usual flat, then losing walkthrough.
    // Round 1 only prices the deposit at the unit price, so round 2 is the
    // flat round (price = 1 - management fee) and round 3 the losing one.
    let h = Harness::new();

    // Round 1: deposit and close with no option outstanding.
    h.service.deposit(&alice(), 100 * UNIT).await.unwrap();
    let close = h.service.commit_and_close(&keeper()).await.unwrap();
    assert_eq!(close.closed_round, 1);
    assert_eq!(close.price_per_share, UNIT);
    assert_eq!(close.minted_shares, 100 * UNIT);
    assert_eq!(close.fees.total(), 0);

    h.clock.advance(DELAY);
    let roll = h.service.roll_to_next_option(&keeper()).await.unwrap();
    assert_eq!(roll.round, 2);
    assert_eq!(roll.collateral, 100 * UNIT);
    assert_eq!(roll.minted_supply, 50_000);
    assert_eq!(roll.min_price, Some(dec!(19)));

    // Round 2 sells nothing and expires at the strike: collateral comes back
    // whole through the burn of the unsold supply.
    h.at_week(1);
    let close = h.service.commit_and_close(&keeper()).await.unwrap();
    assert_eq!(close.closed_round, 2);
    assert_eq!(close.fees.performance_fee, 0);
    assert_eq!(close.fees.management_fee, 38_356);
    assert_eq!(close.price_per_share, 999_616);
    let pps2 = close.price_per_share;

    assert_eq!(h.service.max_redeem(&alice()).await.unwrap(), 100 * UNIT);

    h.clock.advance(DELAY);
    let roll = h.service.roll_to_next_option(&keeper()).await.unwrap();
    assert_eq!(roll.round, 3);
    assert_eq!(roll.collateral, 100 * UNIT - 38_356);
    assert_eq!(roll.minted_supply, 49_980);

    // Round 3: the supply sells, bob joins, alice leaves, and the
    // underlying drops 10%.
    h.auction.set_fill_ratio(dec!(1));
    h.service.deposit(&bob(), 50 * UNIT).await.unwrap();
    h.service.initiate_withdraw(&alice(), 100 * UNIT).await.unwrap();
    h.protocol.set_expiry_price(dec!(1800));

    h.at_week(2);
    let close = h.service.commit_and_close(&keeper()).await.unwrap();
    assert_eq!(close.closed_round, 3);
    assert_eq!(close.fees.performance_fee, 0);
    assert!(close.fees.management_fee > 0);
    let pps3 = close.price_per_share;
    assert!(pps3 < pps2);
    assert!(pps2 < UNIT);

    let paid = h.service.complete_withdraw(&alice()).await.unwrap();
    assert_eq!(paid, 100 * pps3);
    assert!(paid < 100 * UNIT);

    let bob_view = h.service.account(&bob()).await.unwrap();
    let price = h.service.price_at(3).await.unwrap().price_per_share;
    let value = bob_view.unredeemed_shares * price / UNIT;
    assert!(value <= 50 * UNIT);
    assert!(50 * UNIT - value <= 1);

    let types = h.publisher.event_types();
    assert!(types.contains(&"SHORT_CLOSED"));
    assert!(types.contains(&"WITHDRAWAL_COMPLETED"));
}

#[tokio::test]
async fn withdrawal_keeps_the_price_of_its_round() {
    let h = Harness::new();
    h.service.deposit(&alice(), 100 * UNIT).await.unwrap();
    h.service.deposit(&bob(), 100 * UNIT).await.unwrap();
    h.close_and_roll().await;

    h.service.initiate_withdraw(&alice(), 100 * UNIT).await.unwrap();
    h.at_week(1);
    let pps2 = h.close_and_roll().await;

    // The next round sells its supply and loses money; alice completes late.
    h.auction.set_fill_ratio(dec!(1));
    h.protocol.set_expiry_price(dec!(1500));
    h.at_week(2);
    let pps3 = h.close_and_roll().await;
    assert!(pps3 < pps2);

    let paid = h.service.complete_withdraw(&alice()).await.unwrap();
    assert_eq!(paid, 100 * pps2);

    let err = h.service.complete_withdraw(&alice()).await.unwrap_err();
    assert_eq!(vault_error(err), VaultError::WithdrawalNotInitiated);
}

#[tokio::test]
async fn instant_withdrawal_matches_a_smaller_deposit() {
    let refunded = Harness::new();
    refunded.service.deposit(&alice(), 100 * UNIT).await.unwrap();
    let amount = refunded
        .service
        .withdraw_instantly(&alice(), 40 * UNIT)
        .await
        .unwrap();
    assert_eq!(amount, 40 * UNIT);

    let direct = Harness::new();
    direct.service.deposit(&alice(), 60 * UNIT).await.unwrap();

    for h in [&refunded, &direct] {
        h.service.commit_and_close(&keeper()).await.unwrap();
    }
    let left = refunded.service.account(&alice()).await.unwrap();
    let right = direct.service.account(&alice()).await.unwrap();
    assert_eq!(left.unredeemed_shares, right.unredeemed_shares);
    assert_eq!(left.vault_balance, right.vault_balance);

    let snapshot = refunded.service.snapshot().await.unwrap();
    assert_eq!(snapshot.total_supply, 60 * UNIT);
}

#[tokio::test]
async fn instant_withdrawal_is_refused_after_the_close() {
    let h = Harness::new();
    h.service.deposit(&alice(), 100 * UNIT).await.unwrap();
    h.service.commit_and_close(&keeper()).await.unwrap();

    let err = h
        .service
        .withdraw_instantly(&alice(), UNIT)
        .await
        .unwrap_err();
    assert_eq!(
        vault_error(err),
        VaultError::InvalidRound {
            receipt_round: 1,
            vault_round: 2,
        }
    );
}

#[tokio::test]
async fn first_deposit_must_mint_the_minimum_supply() {
    let h = Harness::new();

    let err = h.service.deposit(&alice(), UNIT / 100 - 1).await.unwrap_err();
    assert!(matches!(
        vault_error(err),
        VaultError::BelowMinimumSupply { .. }
    ));

    h.service.deposit(&alice(), UNIT / 100).await.unwrap();
    // Still no shares minted: every deposit is checked.
    let err = h.service.deposit(&bob(), 1).await.unwrap_err();
    assert!(matches!(
        vault_error(err),
        VaultError::BelowMinimumSupply { .. }
    ));

    h.service.commit_and_close(&keeper()).await.unwrap();
    h.service.deposit(&bob(), 1).await.unwrap();
}

#[tokio::test]
async fn max_redeem_twice_is_a_no_op() {
    let h = Harness::new();
    h.service.deposit(&alice(), 100 * UNIT).await.unwrap();
    h.service.commit_and_close(&keeper()).await.unwrap();

    assert_eq!(h.service.max_redeem(&alice()).await.unwrap(), 100 * UNIT);
    assert_eq!(h.service.max_redeem(&alice()).await.unwrap(), 0);

    let view = h.service.account(&alice()).await.unwrap();
    assert_eq!(view.held_shares, 100 * UNIT);
    assert_eq!(view.unredeemed_shares, 0);
}

#[tokio::test]
async fn rollover_follows_the_phase_machine() {
    let h = Harness::new();
    h.service.deposit(&alice(), 100 * UNIT).await.unwrap();

    assert_eq!(h.phase().await, RolloverPhase::Idle);

    let err = h.service.roll_to_next_option(&keeper()).await.unwrap_err();
    assert_eq!(vault_error(err), VaultError::NoNextOptionPending);

    h.service.commit_and_close(&keeper()).await.unwrap();
    assert_eq!(h.phase().await, RolloverPhase::ReadyDelay);

    let err = h.service.commit_and_close(&keeper()).await.unwrap_err();
    assert_eq!(vault_error(err), VaultError::NextOptionPending);
    let err = h.service.roll_to_next_option(&keeper()).await.unwrap_err();
    assert!(matches!(vault_error(err), VaultError::NotReady { .. }));

    h.clock.advance(DELAY);
    assert_eq!(h.phase().await, RolloverPhase::Committed);
    h.service.roll_to_next_option(&keeper()).await.unwrap();
    assert_eq!(h.phase().await, RolloverPhase::Active);

    // The same committed series cannot be rolled twice.
    let err = h.service.roll_to_next_option(&keeper()).await.unwrap_err();
    assert_eq!(vault_error(err), VaultError::NoNextOptionPending);

    // Closing before the option expires is refused.
    let err = h.service.commit_and_close(&keeper()).await.unwrap_err();
    assert!(matches!(
        err,
        VaultServiceError::Rollover(RolloverError::OptionNotExpired { .. })
    ));
}

#[tokio::test]
async fn failed_rollover_leaves_the_vault_untouched() {
    let h = Harness::new();
    h.service.deposit(&alice(), 100 * UNIT).await.unwrap();
    h.service.commit_and_close(&keeper()).await.unwrap();
    h.clock.advance(DELAY);

    // A zero premium is an invalid collaborator response.
    h.selector.set_premium(dec!(0));
    let before = h.service.snapshot().await.unwrap();
    let err = h.service.roll_to_next_option(&keeper()).await.unwrap_err();
    assert!(matches!(err, VaultServiceError::Rollover(_)));
    assert_eq!(h.service.snapshot().await.unwrap(), before);

    h.selector.set_premium(dec!(20));
    h.service.roll_to_next_option(&keeper()).await.unwrap();
}

#[tokio::test]
async fn auction_proceeds_and_burn_release_collateral() {
    let h = Harness::with(params(), dec!(0.6));
    h.service.deposit(&alice(), 100 * UNIT).await.unwrap();
    h.close_and_roll().await;

    let err = h.service.burn_remaining_options(&keeper()).await.unwrap_err();
    assert_eq!(vault_error(err), VaultError::AuctionNotSettled);

    let settlement = h.service.settle_auction(&keeper()).await.unwrap();
    assert_eq!(settlement.proceeds, 570_000);
    assert_eq!(settlement.unsold_supply, 20_000);

    let burn = h.service.burn_remaining_options(&keeper()).await.unwrap();
    assert_eq!(burn.burned_supply, 20_000);
    assert_eq!(burn.released_collateral, 40 * UNIT);

    let snapshot = h.service.snapshot().await.unwrap();
    assert_eq!(snapshot.locked_amount, 60 * UNIT);

    let err = h.service.burn_remaining_options(&keeper()).await.unwrap_err();
    assert_eq!(vault_error(err), VaultError::NothingToBurn);
    let err = h.service.settle_auction(&keeper()).await.unwrap_err();
    assert_eq!(vault_error(err), VaultError::AuctionAlreadySettled);

    // Premium earned is a gain: the performance fee applies to it.
    h.at_week(1);
    let close = h.service.commit_and_close(&keeper()).await.unwrap();
    assert_eq!(close.fees.performance_fee, 57_000);
    assert!(close.price_per_share > UNIT);
}

#[tokio::test]
async fn close_collects_an_auction_left_open() {
    let explicit = Harness::with(params(), dec!(1));
    let implicit = Harness::with(params(), dec!(1));
    for h in [&explicit, &implicit] {
        h.service.deposit(&alice(), 100 * UNIT).await.unwrap();
        h.close_and_roll().await;
        h.at_week(1);
    }

    let settlement = explicit.service.settle_auction(&keeper()).await.unwrap();
    assert_eq!(settlement.proceeds, 950_000);
    let expected = explicit.service.commit_and_close(&keeper()).await.unwrap();
    let close = implicit.service.commit_and_close(&keeper()).await.unwrap();

    assert_eq!(close, expected);
    assert_eq!(close.fees.performance_fee, 95_000);
    let snapshot = implicit.service.snapshot().await.unwrap();
    assert_eq!(
        snapshot.total_balance + close.fees.total(),
        100 * UNIT + 950_000
    );
    assert_eq!(
        snapshot.total_balance,
        explicit.service.snapshot().await.unwrap().total_balance
    );

    let types = implicit.publisher.event_types();
    let settled = types.iter().position(|t| *t == "AUCTION_SETTLED").unwrap();
    let closed = types.iter().position(|t| *t == "ROUND_CLOSED").unwrap();
    assert!(settled < closed);
}

#[tokio::test]
async fn unsold_supply_is_burned_before_expiry_settles() {
    let burned = Harness::with(params(), dec!(0.6));
    let kept = Harness::with(params(), dec!(0.6));
    for h in [&burned, &kept] {
        h.service.deposit(&alice(), 100 * UNIT).await.unwrap();
        h.close_and_roll().await;
        h.service.settle_auction(&keeper()).await.unwrap();
        h.protocol.set_expiry_price(dec!(1500));
        h.at_week(1);
    }
    burned.service.burn_remaining_options(&keeper()).await.unwrap();

    let expected = burned.service.commit_and_close(&keeper()).await.unwrap();
    let close = kept.service.commit_and_close(&keeper()).await.unwrap();
    assert_eq!(close, expected);

    // 30_000 options sold at 19, 20_000 burned for 40 USDC, and the sold
    // ones pay 500 each out of the remaining 60 USDC.
    let snapshot = kept.service.snapshot().await.unwrap();
    assert_eq!(
        snapshot.total_balance + close.fees.total(),
        570_000 + 40 * UNIT + 45 * UNIT
    );
    assert!(kept.publisher.event_types().contains(&"OPTIONS_BURNED"));
}

#[tokio::test]
async fn roles_are_enforced() {
    let h = Harness::new();
    h.service.deposit(&alice(), 100 * UNIT).await.unwrap();

    let err = h.service.commit_and_close(&alice()).await.unwrap_err();
    assert!(matches!(err, VaultServiceError::Unauthorized { .. }));
    // The owner may close, but only the keeper rolls.
    h.service.commit_and_close(&owner()).await.unwrap();
    h.clock.advance(DELAY);
    let err = h.service.roll_to_next_option(&owner()).await.unwrap_err();
    assert!(matches!(err, VaultServiceError::Unauthorized { .. }));

    let err = h.service.set_cap(&keeper(), UNIT).await.unwrap_err();
    assert!(matches!(err, VaultServiceError::Unauthorized { .. }));
    h.service.set_new_keeper(&owner(), bob()).await.unwrap();
    h.service.roll_to_next_option(&bob()).await.unwrap();
}

#[tokio::test]
async fn strike_override_applies_to_one_round() {
    let h = Harness::new();
    h.service.deposit(&alice(), 100 * UNIT).await.unwrap();
    h.service.set_strike_price(&owner(), dec!(2500)).await.unwrap();

    h.service.commit_and_close(&keeper()).await.unwrap();
    h.clock.advance(DELAY);
    let roll = h.service.roll_to_next_option(&keeper()).await.unwrap();
    assert_eq!(roll.minted_supply, 40_000);

    // Next round falls back to the selector.
    h.at_week(1);
    h.service.commit_and_close(&keeper()).await.unwrap();
    let snapshot = h.service.snapshot().await.unwrap();
    let next = snapshot.next_option.unwrap();
    assert_eq!(next.strike, dec!(2000));
}

#[tokio::test]
async fn full_instant_withdrawal_clears_the_deposit() {
    let h = Harness::new();
    h.service.deposit(&alice(), 100 * UNIT).await.unwrap();

    let refunded = h
        .service
        .withdraw_instantly(&alice(), 100 * UNIT)
        .await
        .unwrap();
    assert_eq!(refunded, 100 * UNIT);

    let snapshot = h.service.snapshot().await.unwrap();
    assert_eq!(snapshot.total_pending, 0);
    assert_eq!(snapshot.total_balance, 0);
    assert!(h.publisher.event_types().contains(&"INSTANT_WITHDRAWN"));
}
