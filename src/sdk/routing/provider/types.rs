use serde::{Deserialize, Serialize};

use crate::sdk::geo::Coordinate;
use crate::sdk::routing::error::RoutingError;
use crate::sdk::routing::route::RouteSummary;

// --- Data Structures for the ORS GeoJSON directions endpoint ---

#[derive(Serialize)]
pub struct DirectionsRequest {
    pub coordinates: [[f64; 2]; 2],
}

impl DirectionsRequest {
    pub fn between(start: Coordinate, end: Coordinate) -> Self {
        Self {
            coordinates: [start.to_lon_lat(), end.to_lon_lat()],
        }
    }
}

#[derive(Deserialize)]
pub struct DirectionsResponse {
    #[serde(default)]
    pub features: Vec<RouteFeature>,
}
#[derive(Deserialize)]
pub struct RouteFeature {
    pub geometry: LineGeometry,
    #[serde(default)]
    pub properties: RouteProperties,
}
#[derive(Deserialize)]
pub struct LineGeometry {
    // [lon, lat] or [lon, lat, elevation]
    pub coordinates: Vec<Vec<f64>>,
}
#[derive(Deserialize, Default)]
pub struct RouteProperties {
    pub summary: Option<DirectionsSummary>,
    #[serde(default)]
    pub segments: Vec<Segment>,
}
#[derive(Deserialize, Clone, Copy)]
pub struct DirectionsSummary {
    pub duration: Option<f64>,
}
#[derive(Deserialize, Clone, Copy)]
pub struct Segment {
    #[serde(default)]
    pub duration: f64,
}

impl DirectionsResponse {
    /// Extracts the first route, checking the duration and decoding its path.
    pub fn into_summary(self) -> Result<RouteSummary, RoutingError> {
        let feature = self
            .features
            .into_iter()
            .next()
            .ok_or_else(|| RoutingError::NoRoute("No route found in success response".to_string()))?;

        let props = feature.properties;
        let duration = match props.summary {
            Some(DirectionsSummary {
                duration: Some(duration),
            }) => duration,
            _ if !props.segments.is_empty() => props.segments.iter().map(|s| s.duration).sum::<f64>(),
            _ => {
                return Err(RoutingError::MalformedResponse(
                    "route has neither summary nor segments".to_string(),
                ))
            }
        };
        if !duration.is_finite() || duration < 0.0 {
            return Err(RoutingError::MalformedResponse(format!(
                "invalid duration {duration}"
            )));
        }

        let geometry = feature
            .geometry
            .coordinates
            .iter()
            .map(|pos| match pos.as_slice() {
                [lon, lat, ..] => Coordinate::from_lon_lat(*lon, *lat)
                    .map_err(|e| RoutingError::MalformedResponse(e.to_string())),
                _ => Err(RoutingError::MalformedResponse(format!(
                    "position with {} values",
                    pos.len()
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        if geometry.len() < 2 {
            return Err(RoutingError::MalformedResponse(format!(
                "route geometry has {} points",
                geometry.len()
            )));
        }

        Ok(RouteSummary {
            duration_seconds: duration,
            geometry,
        })
    }
}
