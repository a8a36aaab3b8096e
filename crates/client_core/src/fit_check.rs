//! Memoized per-card "fit check" analysis with an in-flight guard.

use std::collections::{HashMap, HashSet};

use shared::domain::{FitReport, JobId};

use crate::{deck::Card, error::AnalysisError};

#[derive(Debug, Clone, PartialEq)]
pub enum FitCheckStart {
    /// A report already exists; no request should be made.
    Cached(FitReport),
    /// A request for this card is still running.
    AlreadyRunning,
    /// The caller owns the request and must report back through `finish`.
    Started,
}

#[derive(Debug, Default)]
pub struct FitCheckCache {
    reports: HashMap<JobId, FitReport>,
    in_flight: HashSet<JobId>,
}

impl FitCheckCache {
    pub fn begin(&mut self, card_id: JobId) -> FitCheckStart {
        if let Some(report) = self.reports.get(&card_id) {
            return FitCheckStart::Cached(report.clone());
        }
        if !self.in_flight.insert(card_id) {
            return FitCheckStart::AlreadyRunning;
        }
        FitCheckStart::Started
    }

    pub fn finish(
        &mut self,
        card_id: JobId,
        result: Result<FitReport, AnalysisError>,
    ) -> Result<FitReport, AnalysisError> {
        self.in_flight.remove(&card_id);
        let report = result?;
        self.reports.insert(card_id, report.clone());
        Ok(report)
    }

    pub fn cached(&self, card_id: JobId) -> Option<&FitReport> {
        self.reports.get(&card_id)
    }

    pub fn is_running(&self, card_id: JobId) -> bool {
        self.in_flight.contains(&card_id)
    }

    /// Re-attaches memoized reports to freshly fetched cards.
    pub fn restore(&self, cards: &mut [Card]) {
        for card in cards {
            if card.fit.is_none() {
                card.fit = self.reports.get(&card.id).cloned();
            }
        }
    }
}
