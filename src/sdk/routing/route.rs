use serde::Serialize;

use crate::sdk::geo::Coordinate;
use crate::sdk::pairs::PairId;

/// What a provider returns for one origin/destination request.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RouteSummary {
    pub duration_seconds: f64,
    pub geometry: Vec<Coordinate>,
}

impl RouteSummary {
    /// A zero-length route for identical endpoints.
    pub fn stationary(at: Coordinate) -> Self {
        Self {
            duration_seconds: 0.0,
            geometry: vec![at, at],
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RouteResult {
    pub pair_id: PairId,
    pub duration_seconds: f64,
    pub geometry: Vec<Coordinate>,
}

impl RouteResult {
    pub fn new(pair_id: PairId, summary: RouteSummary) -> Self {
        Self {
            pair_id,
            duration_seconds: summary.duration_seconds,
            geometry: summary.geometry,
        }
    }

    pub fn drive_time_minutes(&self) -> f64 {
        self.duration_seconds / 60.0
    }
}
