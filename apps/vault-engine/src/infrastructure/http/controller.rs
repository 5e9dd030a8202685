//! HTTP Controller (Driver Adapter)
//!
//! Axum-based REST API that delegates to the vault facade.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
};

use crate::application::dto::{AccountSnapshotDto, RoundPriceDto, VaultSnapshotDto};
use crate::application::ports::{
    AuctionPort, AuctionSettlement, ClockPort, DerivativesProtocolPort, EventPublisherPort,
    StrikeSelectorPort,
};
use crate::application::services::VaultService;
use crate::application::use_cases::{BurnSummary, RollSummary};
use crate::domain::vault::CloseSummary;
use crate::error::ApiError;

use super::request::{
    AmountRequest, CallerRequest, DepositForRequest, SetAccountRequest, SetCapRequest,
    SetDiscountRequest, SetDurationRequest, SetFeeRequest, SetStrikeRequest, SharesRequest,
    parse_account,
};
use super::response::{
    AckResponse, AmountResponse, HealthResponse, RoundPricesResponse, SharesResponse,
};

/// Application state shared across handlers.
pub struct AppState<D, A, S, C, E>
where
    D: DerivativesProtocolPort,
    A: AuctionPort,
    S: StrikeSelectorPort,
    C: ClockPort,
    E: EventPublisherPort,
{
    /// Vault facade.
    pub service: Arc<VaultService<D, A, S, C, E>>,
    /// Application version.
    pub version: String,
}

impl<D, A, S, C, E> Clone for AppState<D, A, S, C, E>
where
    D: DerivativesProtocolPort,
    A: AuctionPort,
    S: StrikeSelectorPort,
    C: ClockPort,
    E: EventPublisherPort,
{
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            version: self.version.clone(),
        }
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Create the HTTP router with all endpoints.
pub fn create_router<D, A, S, C, E>(state: AppState<D, A, S, C, E>) -> Router
where
    D: DerivativesProtocolPort + 'static,
    A: AuctionPort + 'static,
    S: StrikeSelectorPort + 'static,
    C: ClockPort + 'static,
    E: EventPublisherPort + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        // Queries
        .route("/api/v1/vault", get(vault_snapshot))
        .route("/api/v1/vault/rounds", get(round_prices))
        .route("/api/v1/vault/rounds/{round}", get(price_at))
        .route("/api/v1/accounts/{account}", get(account_snapshot))
        // Depositors
        .route("/api/v1/deposit", post(deposit))
        .route("/api/v1/deposit-for", post(deposit_for))
        .route("/api/v1/withdraw-instantly", post(withdraw_instantly))
        .route("/api/v1/redeem", post(redeem))
        .route("/api/v1/max-redeem", post(max_redeem))
        .route("/api/v1/initiate-withdraw", post(initiate_withdraw))
        .route("/api/v1/complete-withdraw", post(complete_withdraw))
        // Rollover
        .route("/api/v1/rollover/commit-and-close", post(commit_and_close))
        .route("/api/v1/rollover/roll", post(roll_to_next_option))
        .route("/api/v1/rollover/settle-auction", post(settle_auction))
        .route("/api/v1/rollover/burn-remaining", post(burn_remaining_options))
        // Owner settings
        .route("/api/v1/admin/cap", post(set_cap))
        .route("/api/v1/admin/management-fee", post(set_management_fee))
        .route("/api/v1/admin/performance-fee", post(set_performance_fee))
        .route("/api/v1/admin/strike-price", post(set_strike_price))
        .route("/api/v1/admin/keeper", post(set_new_keeper))
        .route("/api/v1/admin/fee-recipient", post(set_fee_recipient))
        .route("/api/v1/admin/premium-discount", post(set_premium_discount))
        .route("/api/v1/admin/auction-duration", post(set_auction_duration))
        .with_state(state)
}

// =============================================================================
// Queries
// =============================================================================

/// Health check endpoint.
async fn health_check<D, A, S, C, E>(
    State(state): State<AppState<D, A, S, C, E>>,
) -> impl IntoResponse
where
    D: DerivativesProtocolPort,
    A: AuctionPort,
    S: StrikeSelectorPort,
    C: ClockPort,
    E: EventPublisherPort,
{
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
    })
}

async fn vault_snapshot<D, A, S, C, E>(
    State(state): State<AppState<D, A, S, C, E>>,
) -> ApiResult<VaultSnapshotDto>
where
    D: DerivativesProtocolPort,
    A: AuctionPort,
    S: StrikeSelectorPort,
    C: ClockPort,
    E: EventPublisherPort,
{
    Ok(Json(state.service.snapshot().await?))
}

async fn round_prices<D, A, S, C, E>(
    State(state): State<AppState<D, A, S, C, E>>,
) -> Json<RoundPricesResponse>
where
    D: DerivativesProtocolPort,
    A: AuctionPort,
    S: StrikeSelectorPort,
    C: ClockPort,
    E: EventPublisherPort,
{
    Json(RoundPricesResponse {
        rounds: state.service.round_prices().await,
    })
}

async fn price_at<D, A, S, C, E>(
    State(state): State<AppState<D, A, S, C, E>>,
    Path(round): Path<u64>,
) -> ApiResult<RoundPriceDto>
where
    D: DerivativesProtocolPort,
    A: AuctionPort,
    S: StrikeSelectorPort,
    C: ClockPort,
    E: EventPublisherPort,
{
    Ok(Json(state.service.price_at(round).await?))
}

async fn account_snapshot<D, A, S, C, E>(
    State(state): State<AppState<D, A, S, C, E>>,
    Path(account): Path<String>,
) -> ApiResult<AccountSnapshotDto>
where
    D: DerivativesProtocolPort,
    A: AuctionPort,
    S: StrikeSelectorPort,
    C: ClockPort,
    E: EventPublisherPort,
{
    let account = parse_account("account", &account)?;
    Ok(Json(state.service.account(&account).await?))
}

// =============================================================================
// Depositors
// =============================================================================

async fn deposit<D, A, S, C, E>(
    State(state): State<AppState<D, A, S, C, E>>,
    Json(request): Json<AmountRequest>,
) -> ApiResult<AckResponse>
where
    D: DerivativesProtocolPort,
    A: AuctionPort,
    S: StrikeSelectorPort,
    C: ClockPort,
    E: EventPublisherPort,
{
    let caller = parse_account("caller", &request.caller)?;
    state.service.deposit(&caller, request.amount).await?;
    Ok(Json(AckResponse::OK))
}

async fn deposit_for<D, A, S, C, E>(
    State(state): State<AppState<D, A, S, C, E>>,
    Json(request): Json<DepositForRequest>,
) -> ApiResult<AckResponse>
where
    D: DerivativesProtocolPort,
    A: AuctionPort,
    S: StrikeSelectorPort,
    C: ClockPort,
    E: EventPublisherPort,
{
    let caller = parse_account("caller", &request.caller)?;
    let beneficiary = parse_account("beneficiary", &request.beneficiary)?;
    state
        .service
        .deposit_for(&caller, request.amount, &beneficiary)
        .await?;
    Ok(Json(AckResponse::OK))
}

async fn withdraw_instantly<D, A, S, C, E>(
    State(state): State<AppState<D, A, S, C, E>>,
    Json(request): Json<AmountRequest>,
) -> ApiResult<AmountResponse>
where
    D: DerivativesProtocolPort,
    A: AuctionPort,
    S: StrikeSelectorPort,
    C: ClockPort,
    E: EventPublisherPort,
{
    let caller = parse_account("caller", &request.caller)?;
    let amount = state
        .service
        .withdraw_instantly(&caller, request.amount)
        .await?;
    Ok(Json(AmountResponse { amount }))
}

async fn redeem<D, A, S, C, E>(
    State(state): State<AppState<D, A, S, C, E>>,
    Json(request): Json<SharesRequest>,
) -> ApiResult<SharesResponse>
where
    D: DerivativesProtocolPort,
    A: AuctionPort,
    S: StrikeSelectorPort,
    C: ClockPort,
    E: EventPublisherPort,
{
    let caller = parse_account("caller", &request.caller)?;
    let shares = state.service.redeem(&caller, request.shares).await?;
    Ok(Json(SharesResponse { shares }))
}

async fn max_redeem<D, A, S, C, E>(
    State(state): State<AppState<D, A, S, C, E>>,
    Json(request): Json<CallerRequest>,
) -> ApiResult<SharesResponse>
where
    D: DerivativesProtocolPort,
    A: AuctionPort,
    S: StrikeSelectorPort,
    C: ClockPort,
    E: EventPublisherPort,
{
    let caller = parse_account("caller", &request.caller)?;
    let shares = state.service.max_redeem(&caller).await?;
    Ok(Json(SharesResponse { shares }))
}

async fn initiate_withdraw<D, A, S, C, E>(
    State(state): State<AppState<D, A, S, C, E>>,
    Json(request): Json<SharesRequest>,
) -> ApiResult<AckResponse>
where
    D: DerivativesProtocolPort,
    A: AuctionPort,
    S: StrikeSelectorPort,
    C: ClockPort,
    E: EventPublisherPort,
{
    let caller = parse_account("caller", &request.caller)?;
    state
        .service
        .initiate_withdraw(&caller, request.shares)
        .await?;
    Ok(Json(AckResponse::OK))
}

async fn complete_withdraw<D, A, S, C, E>(
    State(state): State<AppState<D, A, S, C, E>>,
    Json(request): Json<CallerRequest>,
) -> ApiResult<AmountResponse>
where
    D: DerivativesProtocolPort,
    A: AuctionPort,
    S: StrikeSelectorPort,
    C: ClockPort,
    E: EventPublisherPort,
{
    let caller = parse_account("caller", &request.caller)?;
    let amount = state.service.complete_withdraw(&caller).await?;
    Ok(Json(AmountResponse { amount }))
}

// =============================================================================
// Rollover
// =============================================================================

async fn commit_and_close<D, A, S, C, E>(
    State(state): State<AppState<D, A, S, C, E>>,
    Json(request): Json<CallerRequest>,
) -> ApiResult<CloseSummary>
where
    D: DerivativesProtocolPort,
    A: AuctionPort,
    S: StrikeSelectorPort,
    C: ClockPort,
    E: EventPublisherPort,
{
    let caller = parse_account("caller", &request.caller)?;
    Ok(Json(state.service.commit_and_close(&caller).await?))
}

async fn roll_to_next_option<D, A, S, C, E>(
    State(state): State<AppState<D, A, S, C, E>>,
    Json(request): Json<CallerRequest>,
) -> ApiResult<RollSummary>
where
    D: DerivativesProtocolPort,
    A: AuctionPort,
    S: StrikeSelectorPort,
    C: ClockPort,
    E: EventPublisherPort,
{
    let caller = parse_account("caller", &request.caller)?;
    Ok(Json(state.service.roll_to_next_option(&caller).await?))
}

async fn settle_auction<D, A, S, C, E>(
    State(state): State<AppState<D, A, S, C, E>>,
    Json(request): Json<CallerRequest>,
) -> ApiResult<AuctionSettlement>
where
    D: DerivativesProtocolPort,
    A: AuctionPort,
    S: StrikeSelectorPort,
    C: ClockPort,
    E: EventPublisherPort,
{
    let caller = parse_account("caller", &request.caller)?;
    Ok(Json(state.service.settle_auction(&caller).await?))
}

async fn burn_remaining_options<D, A, S, C, E>(
    State(state): State<AppState<D, A, S, C, E>>,
    Json(request): Json<CallerRequest>,
) -> ApiResult<BurnSummary>
where
    D: DerivativesProtocolPort,
    A: AuctionPort,
    S: StrikeSelectorPort,
    C: ClockPort,
    E: EventPublisherPort,
{
    let caller = parse_account("caller", &request.caller)?;
    Ok(Json(state.service.burn_remaining_options(&caller).await?))
}

// =============================================================================
// Owner settings
// =============================================================================

async fn set_cap<D, A, S, C, E>(
    State(state): State<AppState<D, A, S, C, E>>,
    Json(request): Json<SetCapRequest>,
) -> ApiResult<AckResponse>
where
    D: DerivativesProtocolPort,
    A: AuctionPort,
    S: StrikeSelectorPort,
    C: ClockPort,
    E: EventPublisherPort,
{
    let caller = parse_account("caller", &request.caller)?;
    state.service.set_cap(&caller, request.cap).await?;
    Ok(Json(AckResponse::OK))
}

async fn set_management_fee<D, A, S, C, E>(
    State(state): State<AppState<D, A, S, C, E>>,
    Json(request): Json<SetFeeRequest>,
) -> ApiResult<AckResponse>
where
    D: DerivativesProtocolPort,
    A: AuctionPort,
    S: StrikeSelectorPort,
    C: ClockPort,
    E: EventPublisherPort,
{
    let caller = parse_account("caller", &request.caller)?;
    state
        .service
        .set_management_fee(&caller, request.fee)
        .await?;
    Ok(Json(AckResponse::OK))
}

async fn set_performance_fee<D, A, S, C, E>(
    State(state): State<AppState<D, A, S, C, E>>,
    Json(request): Json<SetFeeRequest>,
) -> ApiResult<AckResponse>
where
    D: DerivativesProtocolPort,
    A: AuctionPort,
    S: StrikeSelectorPort,
    C: ClockPort,
    E: EventPublisherPort,
{
    let caller = parse_account("caller", &request.caller)?;
    state
        .service
        .set_performance_fee(&caller, request.fee)
        .await?;
    Ok(Json(AckResponse::OK))
}

async fn set_strike_price<D, A, S, C, E>(
    State(state): State<AppState<D, A, S, C, E>>,
    Json(request): Json<SetStrikeRequest>,
) -> ApiResult<AckResponse>
where
    D: DerivativesProtocolPort,
    A: AuctionPort,
    S: StrikeSelectorPort,
    C: ClockPort,
    E: EventPublisherPort,
{
    let caller = parse_account("caller", &request.caller)?;
    state
        .service
        .set_strike_price(&caller, request.strike)
        .await?;
    Ok(Json(AckResponse::OK))
}

async fn set_new_keeper<D, A, S, C, E>(
    State(state): State<AppState<D, A, S, C, E>>,
    Json(request): Json<SetAccountRequest>,
) -> ApiResult<AckResponse>
where
    D: DerivativesProtocolPort,
    A: AuctionPort,
    S: StrikeSelectorPort,
    C: ClockPort,
    E: EventPublisherPort,
{
    let caller = parse_account("caller", &request.caller)?;
    let keeper = parse_account("account", &request.account)?;
    state.service.set_new_keeper(&caller, keeper).await?;
    Ok(Json(AckResponse::OK))
}

async fn set_fee_recipient<D, A, S, C, E>(
    State(state): State<AppState<D, A, S, C, E>>,
    Json(request): Json<SetAccountRequest>,
) -> ApiResult<AckResponse>
where
    D: DerivativesProtocolPort,
    A: AuctionPort,
    S: StrikeSelectorPort,
    C: ClockPort,
    E: EventPublisherPort,
{
    let caller = parse_account("caller", &request.caller)?;
    let recipient = parse_account("account", &request.account)?;
    state.service.set_fee_recipient(&caller, recipient).await?;
    Ok(Json(AckResponse::OK))
}

async fn set_premium_discount<D, A, S, C, E>(
    State(state): State<AppState<D, A, S, C, E>>,
    Json(request): Json<SetDiscountRequest>,
) -> ApiResult<AckResponse>
where
    D: DerivativesProtocolPort,
    A: AuctionPort,
    S: StrikeSelectorPort,
    C: ClockPort,
    E: EventPublisherPort,
{
    let caller = parse_account("caller", &request.caller)?;
    state
        .service
        .set_premium_discount(&caller, request.discount)
        .await?;
    Ok(Json(AckResponse::OK))
}

async fn set_auction_duration<D, A, S, C, E>(
    State(state): State<AppState<D, A, S, C, E>>,
    Json(request): Json<SetDurationRequest>,
) -> ApiResult<AckResponse>
where
    D: DerivativesProtocolPort,
    A: AuctionPort,
    S: StrikeSelectorPort,
    C: ClockPort,
    E: EventPublisherPort,
{
    let caller = parse_account("caller", &request.caller)?;
    state
        .service
        .set_auction_duration(&caller, request.duration_secs)
        .await?;
    Ok(Json(AckResponse::OK))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::RolloverSettings;
    use crate::domain::shared::{AccountId, Rate, Timestamp};
    use crate::domain::vault::{Vault, VaultParams};
    use crate::error::ErrorResponse;
    use crate::infrastructure::auction::SimulatedAuction;
    use crate::infrastructure::clock::ManualClock;
    use crate::infrastructure::messaging::RecordingEventPublisher;
    use crate::infrastructure::protocol::SimulatedDerivativesProtocol;
    use crate::infrastructure::strike_selection::ManualStrikeSelector;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use rust_decimal_macros::dec;
    use serde::de::DeserializeOwned;
    use tower::ServiceExt;

    const UNIT: u128 = 1_000_000;

    type TestState = AppState<
        SimulatedDerivativesProtocol,
        SimulatedAuction,
        ManualStrikeSelector,
        ManualClock,
        RecordingEventPublisher,
    >;

    fn create_test_state() -> (TestState, Arc<ManualClock>, Arc<RecordingEventPublisher>) {
        let clock = Arc::new(ManualClock::new(
            Timestamp::parse("2026-01-14T12:00:00Z").unwrap(),
        ));
        let publisher = Arc::new(RecordingEventPublisher::new());
        let vault = Vault::new(VaultParams {
            asset: "USDC".to_string(),
            underlying: "WETH".to_string(),
            decimals: 6,
            is_put: true,
            cap: 1_000_000 * UNIT,
            minimum_supply: UNIT / 100,
            management_fee: Rate::fee(dec!(0.02)).unwrap(),
            performance_fee: Rate::fee(dec!(0.10)).unwrap(),
            owner: AccountId::new("owner"),
            keeper: AccountId::new("keeper"),
            fee_recipient: AccountId::new("treasury"),
            premium_discount: Rate::discount(dec!(0.95)).unwrap(),
            auction_duration_secs: 3_600,
        })
        .unwrap();
        let service = VaultService::new(
            vault,
            Arc::new(SimulatedDerivativesProtocol::new(6)),
            Arc::new(SimulatedAuction::new(dec!(1))),
            Arc::new(ManualStrikeSelector::new(dec!(2400), dec!(20))),
            Arc::clone(&clock),
            Arc::clone(&publisher),
            RolloverSettings::default(),
        );
        let state = AppState {
            service: Arc::new(service),
            version: "1.0.0-test".to_string(),
        };
        (state, clock, publisher)
    }

    async fn post_json(
        app: &Router,
        uri: &str,
        body: serde_json::Value,
    ) -> (StatusCode, axum::body::Bytes) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::to_vec(&body).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body)
    }

    async fn get_json<T: DeserializeOwned>(app: &Router, uri: &str) -> (StatusCode, T) {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn health_check_returns_ok() {
        let (state, _, _) = create_test_state();
        let app = create_router(state);

        let (status, health): (_, HealthResponse) = get_json(&app, "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(health.version, "1.0.0-test");
    }

    #[tokio::test]
    async fn deposit_then_account_view() {
        let (state, _, publisher) = create_test_state();
        let app = create_router(state);

        let (status, _) = post_json(
            &app,
            "/api/v1/deposit",
            serde_json::json!({ "caller": "alice", "amount": 10 * UNIT }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, account): (_, AccountSnapshotDto) =
            get_json(&app, "/api/v1/accounts/alice").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(account.vault_balance, 10 * UNIT);
        assert_eq!(publisher.event_types(), vec!["DEPOSITED"]);
    }

    #[tokio::test]
    async fn rejected_deposit_maps_to_error_body() {
        let (state, _, _) = create_test_state();
        let app = create_router(state);

        let (status, body) = post_json(
            &app,
            "/api/v1/deposit",
            serde_json::json!({ "caller": "alice", "amount": 0 }),
        )
        .await;
        let error: ErrorResponse = serde_json::from_slice(&body).unwrap();

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error.code, "INVALID_REQUEST");
    }

    #[tokio::test]
    async fn keeper_routes_reject_other_callers() {
        let (state, _, _) = create_test_state();
        let app = create_router(state);

        let (status, body) = post_json(
            &app,
            "/api/v1/rollover/roll",
            serde_json::json!({ "caller": "alice" }),
        )
        .await;
        let error: ErrorResponse = serde_json::from_slice(&body).unwrap();

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(error.details.get("required").map(String::as_str), Some("keeper"));
    }

    #[tokio::test]
    async fn full_round_over_http() {
        let (state, clock, _) = create_test_state();
        let app = create_router(state);

        post_json(
            &app,
            "/api/v1/deposit",
            serde_json::json!({ "caller": "alice", "amount": 100 * UNIT }),
        )
        .await;

        let (status, _) = post_json(
            &app,
            "/api/v1/rollover/commit-and-close",
            serde_json::json!({ "caller": "owner" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = post_json(
            &app,
            "/api/v1/rollover/roll",
            serde_json::json!({ "caller": "keeper" }),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.code, "NOT_READY");

        clock.advance(RolloverSettings::default().delay_secs);
        let (status, body) = post_json(
            &app,
            "/api/v1/rollover/roll",
            serde_json::json!({ "caller": "keeper" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let roll: RollSummary = serde_json::from_slice(&body).unwrap();
        assert_eq!(roll.round, 2);
        assert_eq!(roll.collateral, 100 * UNIT);

        let (status, rounds): (_, RoundPricesResponse) =
            get_json(&app, "/api/v1/vault/rounds").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(rounds.rounds.len(), 1);
        assert_eq!(rounds.rounds[0].price_per_share, UNIT);

        let (status, snapshot): (_, VaultSnapshotDto) = get_json(&app, "/api/v1/vault").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(snapshot.round, 2);
        assert_eq!(snapshot.locked_amount, 100 * UNIT);
    }

    #[tokio::test]
    async fn unknown_round_is_not_found() {
        let (state, _, _) = create_test_state();
        let app = create_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/vault/rounds/7")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn owner_can_change_fees() {
        let (state, _, _) = create_test_state();
        let service = Arc::clone(&state.service);
        let app = create_router(state);

        let (status, _) = post_json(
            &app,
            "/api/v1/admin/performance-fee",
            serde_json::json!({ "caller": "owner", "fee": "0.2" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let snapshot = service.snapshot().await.unwrap();
        assert_eq!(snapshot.performance_fee, dec!(0.2));
    }
}
