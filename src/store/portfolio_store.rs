//! Command/query surface over the holding repository, summary aggregator,
//! and performance cache, synchronized with the remote gateway.
//!
//! Concurrency model: gateway calls run outside the store lock and are the
//! only suspension points; every repository mutation and snapshot publish
//! happens inside one `Mutex` acquisition, so mutating completions apply in
//! completion order without interleaving. A generation counter discards
//! completions that outlive a `clear()`, and a journal of local mutations
//! reconciles a full fetch against adds/updates/deletes that completed
//! while it was in flight.

use std::sync::Arc;

use log::{debug, warn};
use rust_decimal_macros::dec;
use tokio::sync::{watch, Mutex};
use uuid::Uuid;

use crate::allocation::{sector_allocations, SectorAllocation};
use crate::errors::{Error, Result};
use crate::gateway::{PortfolioGateway, PortfolioPayload};
use crate::holdings::holdings_model::{Holding, HoldingInput, HoldingPatch, PortfolioSummary};
use crate::holdings::holdings_repository::HoldingRepository;
use crate::holdings::summary_aggregator::{aggregate, apply_delta};
use crate::performance::performance_cache::PerformanceCache;
use crate::performance::performance_model::{PerformancePoint, RangeLabel, RangeMetrics};
use crate::quotes::QuoteProvider;
use crate::store::store_model::{OperationKind, OperationStatuses, PortfolioSnapshot};

/// A holding mutation applied locally while a portfolio fetch was in
/// flight, kept for replay on top of the fetched set.
#[derive(Debug, Clone)]
enum LocalMutation {
    Add(Holding),
    Update { id: String, patch: HoldingPatch },
    Remove(String),
}

#[derive(Debug, Clone)]
struct JournalEntry {
    seq: u64,
    mutation: LocalMutation,
}

/// Shared mutable state, owned exclusively by the store and mutated only
/// under its lock.
struct StoreInner {
    repository: HoldingRepository,
    summary: PortfolioSummary,
    performance: PerformanceCache,
    statuses: OperationStatuses,
    generation: u64,
    mutation_seq: u64,
    fetches_in_flight: usize,
    journal: Vec<JournalEntry>,
}

impl StoreInner {
    fn new() -> Self {
        StoreInner {
            repository: HoldingRepository::new(),
            summary: PortfolioSummary::zero(),
            performance: PerformanceCache::new(),
            statuses: Default::default(),
            generation: 0,
            mutation_seq: 0,
            fetches_in_flight: 0,
            journal: Vec::new(),
        }
    }

    fn record_mutation(&mut self, mutation: LocalMutation) {
        self.mutation_seq += 1;
        if self.fetches_in_flight > 0 {
            self.journal.push(JournalEntry {
                seq: self.mutation_seq,
                mutation,
            });
        }
    }

    fn apply_add(&mut self, holding: Holding) -> Result<Holding> {
        let added = self.repository.add(holding)?;
        self.summary = apply_delta(&self.summary, None, Some(&added));
        self.record_mutation(LocalMutation::Add(added.clone()));
        Ok(added)
    }

    fn apply_update(&mut self, id: &str, patch: &HoldingPatch) -> Result<Holding> {
        let (before, after) = self.repository.update(id, patch)?;
        self.summary = apply_delta(&self.summary, Some(&before), Some(&after));
        self.record_mutation(LocalMutation::Update {
            id: id.to_string(),
            patch: patch.clone(),
        });
        Ok(after)
    }

    fn apply_remove(&mut self, id: &str) -> Result<Holding> {
        let removed = self.repository.remove(id)?;
        self.summary = apply_delta(&self.summary, Some(&removed), None);
        self.record_mutation(LocalMutation::Remove(id.to_string()));
        Ok(removed)
    }

    /// Installs a fetched portfolio, then replays local mutations that
    /// completed after the fetch was issued so they are not silently
    /// dropped by the slower full refresh.
    fn apply_portfolio(&mut self, payload: PortfolioPayload, issue_seq: u64) -> Result<()> {
        let holdings: Vec<Holding> = payload
            .holdings
            .into_iter()
            .map(|record| record.into_holding(Uuid::new_v4().to_string()))
            .collect();
        self.repository.replace_all(holdings)?;

        let replays: Vec<JournalEntry> = self
            .journal
            .iter()
            .filter(|entry| entry.seq > issue_seq)
            .cloned()
            .collect();
        for entry in replays {
            let outcome = match entry.mutation {
                LocalMutation::Add(holding) => self.repository.add(holding).map(|_| ()),
                LocalMutation::Update { id, patch } => {
                    self.repository.update(&id, &patch).map(|_| ())
                }
                LocalMutation::Remove(id) => self.repository.remove(&id).map(|_| ()),
            };
            if let Err(e) = outcome {
                debug!("Skipping journal replay after fetch: {}", e);
            }
        }

        self.summary = aggregate(&self.repository.list());

        if let Some(remote) = payload.summary {
            let drift = (remote.total_value - self.summary.total_value).abs();
            if drift > dec!(0.01) {
                warn!(
                    "Backend summary total {} disagrees with recomputed total {}",
                    remote.total_value, self.summary.total_value
                );
            }
        }
        Ok(())
    }

    fn snapshot(&self) -> PortfolioSnapshot {
        PortfolioSnapshot {
            holdings: self.repository.list(),
            summary: self.summary.clone(),
            performance: self.performance.series().to_vec(),
            status: self.statuses.clone(),
        }
    }
}

/// The portfolio state manager.
///
/// Constructed with an injected gateway and quote provider; publishes a
/// consistent [`PortfolioSnapshot`] after every state change. A failed
/// command records a rejected status and leaves the previously published
/// state untouched.
pub struct PortfolioStore {
    gateway: Arc<dyn PortfolioGateway>,
    quotes: Arc<dyn QuoteProvider>,
    inner: Mutex<StoreInner>,
    publisher: watch::Sender<PortfolioSnapshot>,
}

impl PortfolioStore {
    pub fn new(gateway: Arc<dyn PortfolioGateway>, quotes: Arc<dyn QuoteProvider>) -> Self {
        let (publisher, _) = watch::channel(PortfolioSnapshot::default());
        PortfolioStore {
            gateway,
            quotes,
            inner: Mutex::new(StoreInner::new()),
            publisher,
        }
    }

    /// Last published consistent state.
    pub fn snapshot(&self) -> PortfolioSnapshot {
        self.publisher.borrow().clone()
    }

    /// Receives every published snapshot; dropping the receiver
    /// unsubscribes.
    pub fn subscribe(&self) -> watch::Receiver<PortfolioSnapshot> {
        self.publisher.subscribe()
    }

    /// Sector breakdown of the last published holding set.
    pub fn allocations(&self) -> Vec<SectorAllocation> {
        sector_allocations(&self.snapshot().holdings)
    }

    /// Range-filtered view of the cached performance series.
    pub async fn performance_range(&self, label: RangeLabel) -> Vec<PerformancePoint> {
        self.inner.lock().await.performance.range(label)
    }

    pub async fn performance_range_metrics(&self, label: RangeLabel) -> Option<RangeMetrics> {
        RangeMetrics::from_points(&self.performance_range(label).await)
    }

    /// Fetches the full portfolio and atomically replaces the holding set,
    /// reconciling against holdings mutated locally while the fetch was in
    /// flight.
    pub async fn fetch_portfolio(&self) -> Result<()> {
        let (generation, issue_seq) = {
            let mut inner = self.inner.lock().await;
            inner.statuses.set_pending(OperationKind::FetchPortfolio);
            inner.fetches_in_flight += 1;
            self.publish(&inner);
            (inner.generation, inner.mutation_seq)
        };

        let outcome = self.gateway.get_portfolio().await;

        let mut inner = self.inner.lock().await;
        if inner.generation != generation {
            debug!("Discarding stale portfolio fetch completion");
            return Err(Error::StaleGeneration);
        }
        inner.fetches_in_flight -= 1;

        let result = outcome.and_then(|payload| inner.apply_portfolio(payload, issue_seq));
        match &result {
            Ok(()) => inner.statuses.set_fulfilled(OperationKind::FetchPortfolio),
            Err(e) => inner
                .statuses
                .set_rejected(OperationKind::FetchPortfolio, e.to_string()),
        }
        if inner.fetches_in_flight == 0 {
            inner.journal.clear();
        }
        self.publish(&inner);
        result
    }

    /// Fetches the historical value series into the performance cache.
    pub async fn fetch_performance(&self) -> Result<()> {
        let generation = self.begin(OperationKind::FetchPerformance).await;

        let outcome = self.gateway.get_performance().await;

        let mut inner = self.inner.lock().await;
        if inner.generation != generation {
            debug!("Discarding stale performance fetch completion");
            return Err(Error::StaleGeneration);
        }

        let result = outcome.map(|payload| inner.performance.set_series(payload.historical_value));
        match &result {
            Ok(()) => inner.statuses.set_fulfilled(OperationKind::FetchPerformance),
            Err(e) => inner
                .statuses
                .set_rejected(OperationKind::FetchPerformance, e.to_string()),
        }
        self.publish(&inner);
        result
    }

    /// Validates and adds a holding, completing missing market data from
    /// the quote provider when the gateway supplies none.
    pub async fn add_holding(&self, input: HoldingInput) -> Result<Holding> {
        if let Err(e) = input.validate() {
            return self.reject_locally(OperationKind::AddHolding, e.into()).await;
        }
        let generation = self.begin(OperationKind::AddHolding).await;

        let outcome = self.resolve_new_holding(&input).await;

        let mut inner = self.inner.lock().await;
        if inner.generation != generation {
            debug!("Discarding stale add completion for {}", input.symbol);
            return Err(Error::StaleGeneration);
        }

        let result = outcome.and_then(|holding| inner.apply_add(holding));
        match &result {
            Ok(_) => inner.statuses.set_fulfilled(OperationKind::AddHolding),
            Err(e) => inner
                .statuses
                .set_rejected(OperationKind::AddHolding, e.to_string()),
        }
        self.publish(&inner);
        result
    }

    /// Applies a validated patch to an existing holding.
    pub async fn update_holding(&self, id: &str, patch: HoldingPatch) -> Result<Holding> {
        if let Err(e) = patch.validate() {
            return self
                .reject_locally(OperationKind::UpdateHolding, e.into())
                .await;
        }
        let generation = {
            let mut inner = self.inner.lock().await;
            if !inner.repository.contains(id) {
                let err = Error::NotFound(id.to_string());
                inner
                    .statuses
                    .set_rejected(OperationKind::UpdateHolding, err.to_string());
                self.publish(&inner);
                return Err(err);
            }
            inner.statuses.set_pending(OperationKind::UpdateHolding);
            self.publish(&inner);
            inner.generation
        };

        let outcome = self.gateway.update_holding(id, &patch).await;

        let mut inner = self.inner.lock().await;
        if inner.generation != generation {
            debug!("Discarding stale update completion for {}", id);
            return Err(Error::StaleGeneration);
        }

        let result = outcome.and_then(|_| inner.apply_update(id, &patch));
        match &result {
            Ok(_) => inner.statuses.set_fulfilled(OperationKind::UpdateHolding),
            Err(e) => inner
                .statuses
                .set_rejected(OperationKind::UpdateHolding, e.to_string()),
        }
        self.publish(&inner);
        result
    }

    /// Removes a holding. User confirmation is a UI concern; the store
    /// deletes unconditionally.
    pub async fn delete_holding(&self, id: &str) -> Result<Holding> {
        let generation = {
            let mut inner = self.inner.lock().await;
            if !inner.repository.contains(id) {
                let err = Error::NotFound(id.to_string());
                inner
                    .statuses
                    .set_rejected(OperationKind::DeleteHolding, err.to_string());
                self.publish(&inner);
                return Err(err);
            }
            inner.statuses.set_pending(OperationKind::DeleteHolding);
            self.publish(&inner);
            inner.generation
        };

        let outcome = self.gateway.delete_holding(id).await;

        let mut inner = self.inner.lock().await;
        if inner.generation != generation {
            debug!("Discarding stale delete completion for {}", id);
            return Err(Error::StaleGeneration);
        }

        let result = outcome.and_then(|_| inner.apply_remove(id));
        match &result {
            Ok(_) => inner.statuses.set_fulfilled(OperationKind::DeleteHolding),
            Err(e) => inner
                .statuses
                .set_rejected(OperationKind::DeleteHolding, e.to_string()),
        }
        self.publish(&inner);
        result
    }

    /// Session-end signal: advances the generation so in-flight completions
    /// are discarded, and resets all state.
    pub async fn clear(&self) {
        let mut inner = self.inner.lock().await;
        inner.generation += 1;
        inner.repository = HoldingRepository::new();
        inner.summary = PortfolioSummary::zero();
        inner.performance.clear();
        inner.statuses = Default::default();
        inner.fetches_in_flight = 0;
        inner.journal.clear();
        self.publish(&inner);
    }

    /// Clears the error messages of the mutation commands (add, update,
    /// delete), leaving fetch errors untouched.
    pub async fn clear_errors(&self) {
        let mut inner = self.inner.lock().await;
        inner.statuses.clear_mutation_errors();
        self.publish(&inner);
    }

    async fn begin(&self, kind: OperationKind) -> u64 {
        let mut inner = self.inner.lock().await;
        inner.statuses.set_pending(kind);
        self.publish(&inner);
        inner.generation
    }

    /// Records a rejection for an error caught before any gateway call.
    async fn reject_locally<T>(&self, kind: OperationKind, err: Error) -> Result<T> {
        let mut inner = self.inner.lock().await;
        inner.statuses.set_rejected(kind, err.to_string());
        self.publish(&inner);
        Err(err)
    }

    /// Builds the provisional holding for an add: backend record when one
    /// is returned, otherwise input plus quote-provider market data.
    async fn resolve_new_holding(&self, input: &HoldingInput) -> Result<Holding> {
        if let Some(record) = self.gateway.create_holding(input).await? {
            return Ok(record.into_holding(Uuid::new_v4().to_string()));
        }

        let (price, day_change_percent) = match (input.current_price, input.day_change_percent) {
            (Some(price), Some(day_change_percent)) => (price, day_change_percent),
            (price, day_change_percent) => {
                let quote = self.quotes.quote(&input.symbol, input.avg_cost).await?;
                (
                    price.unwrap_or(quote.price),
                    day_change_percent.unwrap_or(quote.day_change_percent),
                )
            }
        };
        Ok(Holding::from_input(
            Uuid::new_v4().to_string(),
            input.clone(),
            price,
            day_change_percent,
        ))
    }

    fn publish(&self, inner: &StoreInner) {
        self.publisher.send_replace(inner.snapshot());
    }
}
