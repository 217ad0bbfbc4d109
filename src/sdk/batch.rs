use serde::Serialize;
use std::fmt;

use super::geo::Coordinate;
use super::pairs::{OdPair, PairId};
use super::report::ReportRow;
use super::routing::{RouteError, RoutingProvider};

/// Geometry and endpoints of one successful route, as the map needs them.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RenderItem {
    pub pair_id: PairId,
    pub geometry: Vec<Coordinate>,
    pub origin: Coordinate,
    pub destination: Coordinate,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
}

/// A per-pair message for the caller to display.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Notice {
    pub pair_id: PairId,
    pub level: NoticeLevel,
    pub message: String,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level {
            NoticeLevel::Info => f.write_str(&self.message),
            NoticeLevel::Warning => write!(f, "[WARNING] {}", self.message),
        }
    }
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// One row per routed pair, in input order.
    pub rows: Vec<ReportRow>,
    /// Index-aligned with `rows`.
    pub items: Vec<RenderItem>,
    pub failures: Vec<(OdPair, RouteError)>,
    pub notices: Vec<Notice>,
}

impl BatchOutcome {
    /// True when nothing was routed; callers skip rendering and export.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn processed(&self) -> usize {
        self.rows.len() + self.failures.len()
    }
}

/// Routes every pair one after another and collects the outcome.
pub struct BatchAggregator<'a, P: RoutingProvider + ?Sized> {
    provider: &'a P,
}

impl<'a, P: RoutingProvider + ?Sized> BatchAggregator<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        Self { provider }
    }

    pub fn run(&self, pairs: &[OdPair]) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();

        for pair in pairs {
            match self.provider.fetch(pair) {
                Ok(result) => {
                    let row = ReportRow::new(pair, &result);
                    let message = format!(
                        "Drive time for {} is approximately {} minutes.",
                        pair.id,
                        row.formatted_drive_time()
                    );
                    log::info!("{}", message);
                    outcome.notices.push(Notice {
                        pair_id: pair.id.clone(),
                        level: NoticeLevel::Info,
                        message,
                    });
                    outcome.rows.push(row);
                    outcome.items.push(RenderItem {
                        pair_id: result.pair_id,
                        geometry: result.geometry,
                        origin: pair.origin,
                        destination: pair.destination,
                    });
                }
                Err(err) => {
                    log::warn!("{}", err);
                    outcome.notices.push(Notice {
                        pair_id: pair.id.clone(),
                        level: NoticeLevel::Warning,
                        message: err.to_string(),
                    });
                    outcome.failures.push((pair.clone(), err));
                }
            }
        }

        log::info!(
            "Batch finished: {} routed, {} failed out of {} pairs",
            outcome.rows.len(),
            outcome.failures.len(),
            pairs.len()
        );
        outcome
    }
}
