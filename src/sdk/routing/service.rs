use super::error::{RouteError, RoutingError};
use super::route::{RouteResult, RouteSummary};
use crate::sdk::geo::Coordinate;
use crate::sdk::pairs::OdPair;

pub trait RoutingProvider: Send + Sync {
    /// Gets the drive duration and path between two points. One request, no retries.
    fn get_directions(&self, start: Coordinate, end: Coordinate)
        -> Result<RouteSummary, RoutingError>;

    /// Routes a single pair, tagging any failure with the pair's identity.
    fn fetch(&self, pair: &OdPair) -> Result<RouteResult, RouteError> {
        self.get_directions(pair.origin, pair.destination)
            .map(|summary| RouteResult::new(pair.id.clone(), summary))
            .map_err(|cause| RouteError {
                pair: pair.id.clone(),
                cause,
            })
    }
}

impl<P: RoutingProvider + ?Sized> RoutingProvider for Box<P> {
    fn get_directions(
        &self,
        start: Coordinate,
        end: Coordinate,
    ) -> Result<RouteSummary, RoutingError> {
        (**self).get_directions(start, end)
    }
}
