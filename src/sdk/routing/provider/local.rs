use super::{build_client, directions_url, send_directions, DEFAULT_PROFILE, DEFAULT_TIMEOUT_SECS};
use crate::sdk::config::RoutingSettings;
use crate::sdk::geo::Coordinate;
use crate::sdk::routing::error::RoutingError;
use crate::sdk::routing::route::RouteSummary;
use crate::sdk::routing::service::RoutingProvider;
use reqwest::blocking::Client;

/// Self-hosted openrouteservice instance; no credential, no pacing.
pub struct LocalOrsProvider {
    client: Client,
    base_url: String,
    profile: String,
    timeout_secs: u64,
}

impl LocalOrsProvider {
    pub fn new(base_url: String) -> Result<Self, RoutingError> {
        Ok(Self {
            client: build_client(DEFAULT_TIMEOUT_SECS)?,
            base_url,
            profile: DEFAULT_PROFILE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        })
    }

    pub fn from_settings(base_url: String, settings: &RoutingSettings) -> Result<Self, RoutingError> {
        Ok(Self {
            client: build_client(settings.timeout_secs)?,
            base_url,
            profile: settings.profile.clone(),
            timeout_secs: settings.timeout_secs,
        })
    }
}

impl RoutingProvider for LocalOrsProvider {
    fn get_directions(
        &self,
        start: Coordinate,
        end: Coordinate,
    ) -> Result<RouteSummary, RoutingError> {
        if start == end {
            return Ok(RouteSummary::stationary(start));
        }

        log::debug!(
            "[PROVIDER] Calling local get_directions for {} -> {}",
            start,
            end
        );
        let url = directions_url(&self.base_url, &self.profile);
        send_directions(self.client.post(&url), &url, start, end, self.timeout_secs)
    }
}
