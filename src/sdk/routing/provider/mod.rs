pub mod local;
pub mod remote;
pub mod types;

pub use local::LocalOrsProvider;
pub use remote::RemoteOrsProvider;

use reqwest::blocking::{Client, RequestBuilder};
use std::time::Duration;

use self::types::{DirectionsRequest, DirectionsResponse};
use crate::sdk::config::{OrsConfig, RoutingSettings};
use crate::sdk::geo::Coordinate;
use crate::sdk::routing::error::RoutingError;
use crate::sdk::routing::route::RouteSummary;
use crate::sdk::routing::service::RoutingProvider;

pub const DEFAULT_PROFILE: &str = "driving-car";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

fn build_client(timeout_secs: u64) -> Result<Client, RoutingError> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?)
}

fn directions_url(base_url: &str, profile: &str) -> String {
    format!(
        "{}/v2/directions/{}/geojson",
        base_url.trim_end_matches('/'),
        profile
    )
}

/// Sends one prepared directions request and decodes the outcome.
fn send_directions(
    request: RequestBuilder,
    url: &str,
    start: Coordinate,
    end: Coordinate,
    timeout_secs: u64,
) -> Result<RouteSummary, RoutingError> {
    let body = DirectionsRequest::between(start, end);

    let response = match request.json(&body).send() {
        Ok(resp) => resp,
        Err(e) => {
            log::error!(
                "Failed to send POST request. URL: {}\nBody: {}\nError: {}",
                url,
                serde_json::to_string(&body).unwrap_or_default(),
                e
            );
            return Err(RoutingError::from_transport(e, timeout_secs));
        }
    };

    let status = response.status();
    let text = response
        .text()
        .map_err(|e| RoutingError::from_transport(e, timeout_secs))?;

    if !status.is_success() {
        let err = RoutingError::from_response(status, &text);
        if matches!(err, RoutingError::RawApiError { .. }) {
            log::error!(
                "API returned non-success status: {}. Unparseable Body: {}",
                status,
                text
            );
        }
        return Err(err);
    }

    let route_response: DirectionsResponse = serde_json::from_str(&text).map_err(|e| {
        log::error!(
            "Failed to parse DirectionsResponse. URL: {}\nError: {}. Body: {}",
            url,
            e,
            text
        );
        e
    })?;

    route_response.into_summary()
}

/// Builds the provider selected by configuration.
pub fn from_config(
    ors: &OrsConfig,
    settings: &RoutingSettings,
) -> Result<Box<dyn RoutingProvider>, RoutingError> {
    Ok(match ors {
        OrsConfig::Remote { api_key, base_url } => Box::new(RemoteOrsProvider::from_settings(
            api_key.clone(),
            base_url.clone(),
            settings,
        )?),
        OrsConfig::Local { base_url } => {
            Box::new(LocalOrsProvider::from_settings(base_url.clone(), settings)?)
        }
    })
}
