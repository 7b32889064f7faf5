use serde::{Deserialize, Serialize};

use crate::holdings::holdings_model::{Holding, PortfolioSummary};
use crate::performance::performance_model::PerformancePoint;

/// The asynchronous commands the store tracks status for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationKind {
    FetchPortfolio,
    FetchPerformance,
    AddHolding,
    UpdateHolding,
    DeleteHolding,
}

/// Lifecycle of a command: Idle until first issued, then Pending and
/// finally Fulfilled or Rejected. Re-issuing a command re-enters Pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum OperationState {
    #[default]
    Idle,
    Pending,
    Fulfilled,
    Rejected,
}

/// Status of one command kind, with the last rejection message if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct OperationStatus {
    pub state: OperationState,
    pub error: Option<String>,
}

impl OperationStatus {
    pub fn is_pending(&self) -> bool {
        self.state == OperationState::Pending
    }
}

/// Independent status per command kind; operations of different kinds may
/// be concurrently pending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct OperationStatuses {
    pub fetch_portfolio: OperationStatus,
    pub fetch_performance: OperationStatus,
    pub add_holding: OperationStatus,
    pub update_holding: OperationStatus,
    pub delete_holding: OperationStatus,
}

impl OperationStatuses {
    pub fn status(&self, kind: OperationKind) -> &OperationStatus {
        match kind {
            OperationKind::FetchPortfolio => &self.fetch_portfolio,
            OperationKind::FetchPerformance => &self.fetch_performance,
            OperationKind::AddHolding => &self.add_holding,
            OperationKind::UpdateHolding => &self.update_holding,
            OperationKind::DeleteHolding => &self.delete_holding,
        }
    }

    fn status_mut(&mut self, kind: OperationKind) -> &mut OperationStatus {
        match kind {
            OperationKind::FetchPortfolio => &mut self.fetch_portfolio,
            OperationKind::FetchPerformance => &mut self.fetch_performance,
            OperationKind::AddHolding => &mut self.add_holding,
            OperationKind::UpdateHolding => &mut self.update_holding,
            OperationKind::DeleteHolding => &mut self.delete_holding,
        }
    }

    pub fn set_pending(&mut self, kind: OperationKind) {
        let status = self.status_mut(kind);
        status.state = OperationState::Pending;
        status.error = None;
    }

    pub fn set_fulfilled(&mut self, kind: OperationKind) {
        let status = self.status_mut(kind);
        status.state = OperationState::Fulfilled;
        status.error = None;
    }

    pub fn set_rejected(&mut self, kind: OperationKind, message: String) {
        let status = self.status_mut(kind);
        status.state = OperationState::Rejected;
        status.error = Some(message);
    }

    /// Clears the error messages of the holding-mutation commands, leaving
    /// fetch errors and all states untouched.
    pub fn clear_mutation_errors(&mut self) {
        self.add_holding.error = None;
        self.update_holding.error = None;
        self.delete_holding.error = None;
    }
}

/// Immutable published view of the store: the last consistent state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSnapshot {
    pub holdings: Vec<Holding>,
    pub summary: PortfolioSummary,
    pub performance: Vec<PerformancePoint>,
    pub status: OperationStatuses,
}
