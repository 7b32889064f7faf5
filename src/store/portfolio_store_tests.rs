use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::sync::Mutex as StdMutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::errors::{Error, GatewayError, Result};
use crate::gateway::{
    HoldingRecord, PerformancePayload, PortfolioGateway, PortfolioPayload, SummaryRecord,
};
use crate::holdings::holdings_model::{Exchange, HoldingInput, HoldingPatch};
use crate::holdings::summary_aggregator::aggregate;
use crate::performance::performance_model::PerformancePoint;
use crate::quotes::{Quote, QuoteProvider};
use crate::store::portfolio_store::PortfolioStore;
use crate::store::store_model::OperationState;

// --- Mock gateway ---

#[derive(Default)]
struct MockGateway {
    portfolio: StdMutex<Option<PortfolioPayload>>,
    performance: StdMutex<Vec<PerformancePoint>>,
    fail_next_fetch: AtomicBool,
}

impl MockGateway {
    fn with_portfolio(payload: PortfolioPayload) -> Self {
        let gateway = MockGateway::default();
        *gateway.portfolio.lock().unwrap() = Some(payload);
        gateway
    }

    fn fail_next_fetch(&self) {
        self.fail_next_fetch.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl PortfolioGateway for MockGateway {
    async fn get_portfolio(&self) -> Result<PortfolioPayload> {
        if self.fail_next_fetch.swap(false, Ordering::SeqCst) {
            return Err(GatewayError::Network("connection reset".to_string()).into());
        }
        self.portfolio
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| {
                GatewayError::Status {
                    status: 404,
                    message: "no portfolio".to_string(),
                }
                .into()
            })
    }

    async fn get_performance(&self) -> Result<PerformancePayload> {
        if self.fail_next_fetch.swap(false, Ordering::SeqCst) {
            return Err(GatewayError::Timeout.into());
        }
        Ok(PerformancePayload {
            historical_value: self.performance.lock().unwrap().clone(),
        })
    }

    async fn create_holding(&self, _input: &HoldingInput) -> Result<Option<HoldingRecord>> {
        // Backend without write endpoints; the store completes market data
        Ok(None)
    }

    async fn update_holding(&self, _id: &str, _patch: &HoldingPatch) -> Result<()> {
        Ok(())
    }

    async fn delete_holding(&self, _id: &str) -> Result<()> {
        Ok(())
    }
}

// --- Deterministic quote provider ---

struct StaticQuotes(Quote);

#[async_trait]
impl QuoteProvider for StaticQuotes {
    async fn quote(&self, _symbol: &str, _reference_price: Decimal) -> Result<Quote> {
        Ok(self.0.clone())
    }
}

fn store_with(gateway: MockGateway) -> PortfolioStore {
    PortfolioStore::new(
        Arc::new(gateway),
        Arc::new(StaticQuotes(Quote {
            price: dec!(100),
            day_change_percent: dec!(1),
        })),
    )
}

fn tcs_input() -> HoldingInput {
    HoldingInput {
        symbol: "TCS".to_string(),
        name: "Tata Consultancy Services Ltd.".to_string(),
        exchange: Exchange::Nse,
        quantity: dec!(10),
        avg_cost: dec!(3000),
        sector: Some("IT".to_string()),
        current_price: Some(dec!(3200)),
        day_change_percent: Some(Decimal::ZERO),
    }
}

fn reliance_record() -> HoldingRecord {
    HoldingRecord {
        id: Some("1".to_string()),
        symbol: "RELIANCE".to_string(),
        name: "Reliance Industries Ltd.".to_string(),
        exchange: None,
        quantity: dec!(10),
        avg_cost: dec!(2500),
        sector: Some("Energy".to_string()),
        current_price: Some(dec!(2600)),
        day_change_percent: Some(dec!(0.5)),
    }
}

#[tokio::test]
async fn add_then_delete_nets_summary_to_zero() {
    let store = store_with(MockGateway::default());

    let added = store.add_holding(tcs_input()).await.unwrap();
    let snapshot = store.snapshot();
    assert_eq!(snapshot.summary.total_value, dec!(32000));
    assert_eq!(snapshot.summary.total_investment, dec!(30000));
    assert_eq!(snapshot.summary.overall_gain, dec!(2000));
    assert_eq!(snapshot.summary.overall_gain_percent.round_dp(2), dec!(6.67));
    assert_eq!(snapshot.status.add_holding.state, OperationState::Fulfilled);

    store.delete_holding(&added.id).await.unwrap();
    let snapshot = store.snapshot();
    assert!(snapshot.holdings.is_empty());
    assert_eq!(snapshot.summary.total_value, Decimal::ZERO);
    assert_eq!(snapshot.summary.total_investment, Decimal::ZERO);
    assert_eq!(snapshot.summary.overall_gain, Decimal::ZERO);
    assert_eq!(snapshot.summary.overall_gain_percent, Decimal::ZERO);
}

#[tokio::test]
async fn add_fills_market_data_from_quote_provider() {
    let store = store_with(MockGateway::default());
    let mut input = tcs_input();
    input.current_price = None;
    input.day_change_percent = None;

    let added = store.add_holding(input).await.unwrap();
    assert_eq!(added.current_price, dec!(100));
    assert_eq!(added.day_change_percent, dec!(1));
}

#[tokio::test]
async fn update_applies_summary_deltas() {
    let store = store_with(MockGateway::default());
    let mut input = tcs_input();
    input.quantity = dec!(10);
    input.avg_cost = dec!(100);
    input.current_price = Some(dec!(110));
    let added = store.add_holding(input).await.unwrap();

    let before = store.snapshot().summary;
    assert_eq!(before.total_investment, dec!(1000));
    assert_eq!(before.total_value, dec!(1100));

    let updated = store
        .update_holding(
            &added.id,
            HoldingPatch {
                quantity: Some(dec!(20)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.invested_amount, dec!(2000));
    assert_eq!(updated.current_value, dec!(2200));

    let after = store.snapshot().summary;
    assert_eq!(after.total_investment - before.total_investment, dec!(1000));
    assert_eq!(after.total_value - before.total_value, dec!(1100));
}

#[tokio::test]
async fn validation_failure_leaves_repository_unchanged() {
    let store = store_with(MockGateway::default());
    store.add_holding(tcs_input()).await.unwrap();

    let mut bad = tcs_input();
    bad.symbol = "INFY".to_string();
    bad.quantity = Decimal::ZERO;
    let err = store.add_holding(bad).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let snapshot = store.snapshot();
    assert_eq!(snapshot.holdings.len(), 1);
    assert_eq!(snapshot.status.add_holding.state, OperationState::Rejected);
    assert!(snapshot.status.add_holding.error.is_some());
}

#[tokio::test]
async fn failed_fetch_on_fresh_store_stays_empty() {
    let gateway = MockGateway::default();
    gateway.fail_next_fetch();
    let store = store_with(gateway);

    let err = store.fetch_portfolio().await.unwrap_err();
    assert!(matches!(err, Error::Gateway(_)));

    let snapshot = store.snapshot();
    assert!(snapshot.holdings.is_empty());
    assert_eq!(
        snapshot.status.fetch_portfolio.state,
        OperationState::Rejected
    );
}

#[tokio::test]
async fn fetch_failure_after_success_keeps_state() {
    let gateway = Arc::new(MockGateway::with_portfolio(PortfolioPayload {
        holdings: vec![reliance_record()],
        summary: None,
    }));
    let store = PortfolioStore::new(
        gateway.clone(),
        Arc::new(StaticQuotes(Quote {
            price: dec!(100),
            day_change_percent: dec!(1),
        })),
    );

    store.fetch_portfolio().await.unwrap();
    let good = store.snapshot();

    gateway.fail_next_fetch();
    store.fetch_portfolio().await.unwrap_err();

    let after = store.snapshot();
    // Identical published data; only the status changed
    assert_eq!(after.holdings, good.holdings);
    assert_eq!(after.summary, good.summary);
    assert_eq!(after.performance, good.performance);
    assert_eq!(after.status.fetch_portfolio.state, OperationState::Rejected);
}

#[tokio::test]
async fn fetch_recomputes_summary_ignoring_backend_block() {
    let gateway = MockGateway::with_portfolio(PortfolioPayload {
        holdings: vec![reliance_record()],
        summary: Some(SummaryRecord {
            total_value: dec!(999999),
            total_investment: dec!(1),
            day_change: None,
            day_change_percent: None,
            overall_gain: None,
            overall_gain_percent: None,
        }),
    });
    let store = store_with(gateway);
    store.fetch_portfolio().await.unwrap();

    let snapshot = store.snapshot();
    assert_eq!(snapshot.summary, aggregate(&snapshot.holdings));
    assert_eq!(snapshot.summary.total_value, dec!(26000));
    assert_eq!(snapshot.summary.total_investment, dec!(25000));
}

#[tokio::test]
async fn fetch_performance_stores_normalized_series() {
    let gateway = MockGateway::default();
    {
        let mut series = gateway.performance.lock().unwrap();
        let day = |d: u32| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
        series.push(PerformancePoint { date: day(3), value: dec!(103) });
        series.push(PerformancePoint { date: day(1), value: dec!(101) });
        series.push(PerformancePoint { date: day(1), value: dec!(150) });
    }
    let store = store_with(gateway);
    store.fetch_performance().await.unwrap();

    let snapshot = store.snapshot();
    assert_eq!(snapshot.performance.len(), 2);
    assert_eq!(snapshot.performance[0].value, dec!(150)); // last-supplied wins
    assert_eq!(
        snapshot.status.fetch_performance.state,
        OperationState::Fulfilled
    );
}

#[tokio::test]
async fn delete_unknown_id_is_rejected_without_state_change() {
    let store = store_with(MockGateway::default());
    store.add_holding(tcs_input()).await.unwrap();

    let err = store.delete_holding("ghost").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    let snapshot = store.snapshot();
    assert_eq!(snapshot.holdings.len(), 1);
    assert_eq!(
        snapshot.status.delete_holding.state,
        OperationState::Rejected
    );
}

#[tokio::test]
async fn clear_errors_resets_mutation_errors_only() {
    let gateway = MockGateway::default();
    gateway.fail_next_fetch();
    let store = store_with(gateway);

    store.fetch_performance().await.unwrap_err();
    let mut bad = tcs_input();
    bad.quantity = Decimal::ZERO;
    store.add_holding(bad).await.unwrap_err();

    store.clear_errors().await;
    let snapshot = store.snapshot();
    assert!(snapshot.status.add_holding.error.is_none());
    assert!(snapshot.status.fetch_performance.error.is_some());
}

#[tokio::test]
async fn subscribers_see_each_published_snapshot() {
    let store = store_with(MockGateway::default());
    let mut rx = store.subscribe();

    store.add_holding(tcs_input()).await.unwrap();
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow_and_update().holdings.len(), 1);
}
