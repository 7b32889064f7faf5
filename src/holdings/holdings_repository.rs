use log::debug;

use crate::errors::{Error, Result};
use crate::holdings::holdings_model::{Holding, HoldingPatch};

/// Authoritative, mutable set of holdings for the current session.
///
/// Keyed by holding id, preserving insertion order. Callers only ever see
/// snapshots; every mutation goes through this type so the derived
/// valuation fields can never drift from quantity/cost/price.
#[derive(Debug, Default, Clone)]
pub struct HoldingRepository {
    holdings: Vec<Holding>,
}

impl HoldingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Holding> {
        self.holdings.iter().find(|h| h.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Returns a snapshot of all holdings in insertion order.
    pub fn list(&self) -> Vec<Holding> {
        self.holdings.clone()
    }

    /// Atomically replaces the entire holding set, used after a full
    /// portfolio fetch. Validates every holding and recomputes derived
    /// values before the swap; on any failure the previous set is kept.
    pub fn replace_all(&mut self, holdings: Vec<Holding>) -> Result<()> {
        let mut incoming = holdings;
        for holding in &mut incoming {
            holding.validate().map_err(Error::Validation)?;
            holding.refresh_derived();
        }
        debug!("Replacing holding set: {} positions", incoming.len());
        self.holdings = incoming;
        Ok(())
    }

    /// Inserts a new holding, returning it with derived values computed.
    pub fn add(&mut self, holding: Holding) -> Result<Holding> {
        let mut holding = holding;
        holding.validate().map_err(Error::Validation)?;
        if self.contains(&holding.id) {
            return Err(Error::DuplicateKey(holding.id));
        }
        holding.refresh_derived();
        self.holdings.push(holding.clone());
        Ok(holding)
    }

    /// Merges a patch into an existing holding, returning the holding before
    /// and after the merge.
    pub fn update(&mut self, id: &str, patch: &HoldingPatch) -> Result<(Holding, Holding)> {
        patch.validate().map_err(Error::Validation)?;
        let holding = self
            .holdings
            .iter_mut()
            .find(|h| h.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        let before = holding.clone();
        patch.apply_to(holding);
        Ok((before, holding.clone()))
    }

    /// Removes a holding, returning it so the aggregator can subtract its
    /// contribution.
    pub fn remove(&mut self, id: &str) -> Result<Holding> {
        let index = self
            .holdings
            .iter()
            .position(|h| h.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        Ok(self.holdings.remove(index))
    }
}
